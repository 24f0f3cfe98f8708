//! # 📐 offload-lp — Política ótima via programação linear
//!
//! Formula o MDP restrito do UE como um LP sobre a medida de ocupação
//! estacionária `x(s, a)`:
//!
//! ```text
//! minimizar   Σ x(s,a)·|fila(s)|
//! sujeito a   Σ x(s,a) = 1
//!             Σ_a x(j,a) = Σ_{s,a} x(s,a)·P(s,a,j)      ∀ j
//!             Σ x(s,a)·potência(s,a) ≤ η
//!             Σ x(s,a)·descartes(s,a) ≤ d_max            (opcional)
//!             x ≥ 0
//! ```
//!
//! A política é `π(a|s) = x(s,a) / Σ_a x(s,a)`. Estados sem massa
//! estacionária usam a regra work-conserving.
//!
//! ## Exemplo
//!
//! ```ignore
//! use offload_lp::OptimalPolicyFinder;
//!
//! let finder = OptimalPolicyFinder::new();
//! let optimal = finder.find_optimal_policy_for_given_eta(&config, 6)?;
//! println!("E[fila] = {:.4}", optimal.expected_queue_length);
//! ```

pub mod error;
pub mod finder;
pub mod oracle;

pub use error::{LpError, LpResult};
pub use finder::{tolerance, OptimalPolicy, OptimalPolicyFinder, MAX_PRECISION, MIN_PRECISION};
pub use oracle::{LpInstance, LpOracle, MinilpOracle, OccupationMeasure};

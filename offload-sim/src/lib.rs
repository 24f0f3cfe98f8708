//! # 🎲 offload-sim — Simulação de políticas de offloading
//!
//! Simulador semeado em tempo discreto e testador de varreduras de alpha.
//! O simulador consome qualquer [`offload_core::Policy`]: baselines
//! determinísticas e a política estocástica do LP seguem o mesmo caminho.
//!
//! ## Exemplo
//!
//! ```ignore
//! use offload_core::GreedyLocalFirstPolicy;
//! use offload_sim::Simulator;
//!
//! let simulator = Simulator::new(&config)?.with_seed(7);
//! let stats = simulator.simulate_policy(&GreedyLocalFirstPolicy, 100_000)?;
//! println!("atraso médio: {:.4}", stats.average_delay);
//! ```

pub mod error;
pub mod simulator;
pub mod sweep;

pub use error::{SimResult, SimulationError};
pub use simulator::{DEFAULT_SEED, SimulationStats, Simulator, TickRecord};
pub use sweep::{AlphaDelayResult, DEFAULT_ERROR_WINDOW, RangedAlphaTester, SweepResult};

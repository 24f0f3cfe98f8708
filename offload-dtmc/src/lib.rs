//! # 🔗 offload-dtmc — Cadeia de Markov simbólica
//!
//! Pipeline em duas fases: a estrutura (estados, ações legais e arestas
//! rotuladas por produtos de símbolos) é construída uma vez por forma do
//! espaço de estados; a resolução numérica recebe um mapeamento
//! símbolo → valor e é uma função pura sobre essa estrutura.
//!
//! ## Arquitetura
//!
//! ```text
//! ┌───────────────────────┐     ┌──────────────────────────────────┐
//! │ OffloadingSystemConfig│ ──▶ │ DtmcCreator::create()             │
//! └───────────────────────┘     │  estado × ação × 2^k resultados   │
//!                               └───────────────┬──────────────────┘
//!                                               ▼
//!                               ┌──────────────────────────────────┐
//!                               │ DiscreteTimeMarkovChain (arena)   │
//!                               └───────────────┬──────────────────┘
//!                     SymbolValues ──▶          ▼
//!                               ┌──────────────────────────────────┐
//!                               │ IndependentTransitionCalculator   │
//!                               │  Σ arestas por destino            │
//!                               └───────────────┬──────────────────┘
//!                                               ▼
//!                               ┌──────────────────────────────────┐
//!                               │ NumericTransitionTable            │
//!                               └──────────────────────────────────┘
//! ```
//!
//! ## Exemplo
//!
//! ```ignore
//! use offload_dtmc::{DtmcCreator, IndependentTransitionCalculator};
//! use offload_core::{Action, SymbolValues, UserEquipmentState};
//!
//! let chain = DtmcCreator::new(&config)?.create()?;
//! let calculator = IndependentTransitionCalculator::new(SymbolValues::from_components(config.components()), &chain)?;
//! let p = calculator.get_independent_transition_fraction(
//!     &UserEquipmentState::single_queue(2, 0, 0),
//!     &UserEquipmentState::single_queue(1, 1, 0),
//!     Action::AddToTransmissionUnit(0),
//! )?;
//! ```

pub mod chain;
pub mod error;
pub mod resolver;

pub use chain::{DiscreteTimeMarkovChain, DtmcCreator, Transition};
pub use error::{DtmcError, DtmcResult};
pub use resolver::{ActionRow, IndependentTransitionCalculator, NumericTransitionTable};

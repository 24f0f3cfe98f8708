//! # 📡 offload-core — Modelo do User Equipment
//!
//! Modelo de estados finitos de um dispositivo com recursos limitados que,
//! a cada tick, decide se processa a tarefa da fila localmente, se a entrega
//! à unidade de transmissão (offload), se faz ambos ou se não faz nada.
//!
//! ## Arquitetura
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 OffloadingSystemConfig                        │
//! │   StateConfig (forma) | Components (α, β, γ, η, P) | Env     │
//! └───────────────┬───────────────────────────┬──────────────────┘
//!                 │                           │
//!                 ▼                           ▼
//! ┌──────────────────────────┐   ┌──────────────────────────────┐
//! │  all_states()            │   │  UserEquipmentDynamics        │
//! │  (produto cartesiano)    │   │  legalidade | tick | custos   │
//! └──────────────────────────┘   └──────────────┬───────────────┘
//!                                               │
//!                 ┌─────────────────────────────┴──────┐
//!                 ▼                                    ▼
//!        ┌────────────────┐                 ┌────────────────────┐
//!        │ Symbol/Product │                 │ Policy             │
//!        │ (rótulos DTMC) │                 │ baselines | LP     │
//!        └────────────────┘                 └────────────────────┘
//! ```
//!
//! ## Exemplo
//!
//! ```
//! use offload_core::{UserEquipmentStateConfig, UserEquipmentState};
//!
//! let shape = UserEquipmentStateConfig::single_queue(5, 4, 3);
//! let states = shape.all_states().unwrap();
//! assert_eq!(states.len(), 6 * 5 * 4);
//! assert_eq!(states[0], UserEquipmentState::single_queue(0, 0, 0));
//! ```

pub mod action;
pub mod config;
pub mod error;
pub mod parallel;
pub mod policy;
pub mod state;
pub mod symbol;
pub mod transition;

pub use action::Action;
pub use config::{
    cartesian_product, EnvironmentParameters, OffloadingSystemConfig, ParameterRange,
    UserEquipmentComponentsConfig, UserEquipmentConfig, UserEquipmentStateConfig,
};
pub use error::{CoreError, CoreResult};
pub use policy::{
    baseline_policies, ActionDistribution, DeterministicPolicy, GreedyLocalFirstPolicy,
    GreedyOffloadFirstPolicy, LocalOnlyPolicy, Policy, StochasticPolicy, TransmitOnlyPolicy,
    WorkConservingPolicy,
};
pub use state::UserEquipmentState;
pub use symbol::{Symbol, SymbolProduct, SymbolValues};
pub use transition::{Outcome, StochasticEvent, TickResult, UserEquipmentDynamics};

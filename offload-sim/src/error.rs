//! Erros da simulação e das varreduras

use offload_core::CoreError;
use offload_dtmc::DtmcError;
use offload_lp::LpError;
use thiserror::Error;

pub type SimResult<T> = Result<T, SimulationError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// Uma baseline superou a política estocástica fora da janela de erro
    #[error("Baseline {baseline} delay {baseline_delay} beats stochastic delay {stochastic_delay} (window {window}) at alpha {alpha:?}")]
    BaselineDominates {
        baseline: String,
        baseline_delay: f64,
        stochastic_delay: f64,
        window: f64,
        alpha: Vec<f64>,
    },

    /// Política devolveu uma distribuição vazia ou inválida
    #[error("Policy {policy} returned an invalid distribution in state {state}")]
    InvalidPolicy { policy: String, state: String },

    #[error("Number of ticks must be positive")]
    EmptyRun,

    #[error("Invalid sweep: {0}")]
    InvalidSweep(String),

    #[error(transparent)]
    Lp(#[from] LpError),

    #[error(transparent)]
    Dtmc(#[from] DtmcError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

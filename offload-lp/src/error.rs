//! Erros do programa linear e da busca de políticas

use offload_core::CoreError;
use offload_dtmc::DtmcError;
use thiserror::Error;

pub type LpResult<T> = Result<T, LpError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LpError {
    /// Nenhuma política satisfaz as restrições
    #[error("Infeasible: {0}")]
    Infeasible(String),

    #[error("Linear program is unbounded")]
    Unbounded,

    /// Falha interna do solver
    #[error("LP solver error: {0}")]
    Solver(String),

    #[error("Precision must be in 1..=15, got {0}")]
    InvalidPrecision(u32),

    /// Tabelas de custo desalinhadas com a tabela de transições
    #[error("Malformed LP instance: {0}")]
    MalformedInstance(String),

    /// Solução do oráculo viola o orçamento
    #[error("Expected power {power} exceeds the budget eta = {eta}")]
    BudgetViolated { power: f64, eta: f64 },

    #[error(transparent)]
    Dtmc(#[from] DtmcError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

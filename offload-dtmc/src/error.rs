//! Erros da DTMC e da resolução de transições

use offload_core::{Action, CoreError, Symbol};
use thiserror::Error;

pub type DtmcResult<T> = Result<T, DtmcError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DtmcError {
    /// Um rótulo referencia um símbolo sem valor
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(Symbol),

    /// Valor de símbolo fora de [0, 1]
    #[error("Symbol {symbol} has value {value}, expected a probability in [0, 1]")]
    InvalidSymbolValue { symbol: Symbol, value: f64 },

    /// Estado que não pertence à cadeia
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Ação sem transições a partir da origem
    #[error("No transitions for action {action} from state {state}")]
    InvalidTransition { state: String, action: Action },

    /// Linha da tabela numérica não soma 1
    #[error("Transitions from {state} under {action} sum to {sum}, expected 1")]
    NotStochastic { state: String, action: Action, sum: f64 },

    #[error(transparent)]
    Core(#[from] CoreError),
}

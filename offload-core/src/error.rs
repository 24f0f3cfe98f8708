//! Erros do modelo de offloading

use thiserror::Error;

/// Resultado de operações do modelo
pub type CoreResult<T> = Result<T, CoreError>;

/// Erros de configuração e de modelagem do UE
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Capacidades ou probabilidades fora do intervalo
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Estado fora do espaço configurado
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Ação ilegal no estado
    #[error("Action {action} is not legal in state {state}")]
    InvalidAction { action: String, state: String },
}

impl CoreError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        CoreError::InvalidConfiguration(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::config("alpha must be in (0, 1]");
        assert!(err.to_string().contains("Invalid configuration"));

        let err = CoreError::InvalidAction {
            action: "AddToCpu(0)".into(),
            state: "(0, 0, 0)".into(),
        };
        assert!(err.to_string().contains("AddToCpu(0)"));
    }
}

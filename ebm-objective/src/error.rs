//! Erros do colaborador de objetivos

use ebm_bridge::BridgeError;
use thiserror::Error;

/// Resultado de operações de objetivo
pub type ObjectiveResult<T> = Result<T, ObjectiveError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ObjectiveError {
    /// Nome de objetivo não reconhecido
    #[error("Objetivo desconhecido: {0}")]
    UnknownObjective(String),

    /// Código gravado no wrapper não corresponde a nenhum objetivo
    #[error("Código de objetivo inválido: {code} (c_scores={c_scores})")]
    UnknownCode { code: u32, c_scores: usize },

    /// Parâmetro fora do domínio
    #[error("Parâmetro inválido: {0}")]
    InvalidParameter(String),

    /// Target fora do domínio do objetivo
    #[error("Target inválido no sample {index}: {value} ({reason})")]
    InvalidTarget { index: usize, value: f64, reason: &'static str },
}

impl From<ObjectiveError> for BridgeError {
    fn from(err: ObjectiveError) -> Self {
        match err {
            ObjectiveError::InvalidTarget { .. } | ObjectiveError::InvalidParameter(_) => {
                BridgeError::InvalidParameter(err.to_string())
            }
            _ => BridgeError::ObjectiveMismatch(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_bridge_error() {
        let e: BridgeError = ObjectiveError::UnknownCode { code: 9, c_scores: 1 }.into();
        assert!(matches!(e, BridgeError::ObjectiveMismatch(_)));

        let e: BridgeError = ObjectiveError::InvalidTarget { index: 3, value: -1.0, reason: "negativo" }.into();
        assert!(matches!(e, BridgeError::InvalidParameter(_)));
    }
}

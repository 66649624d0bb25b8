//! Erros da ponte

use thiserror::Error;

use crate::abi::{ErrorEbm, Status};
use crate::zone::{BridgeOp, Zone};

/// Resultado de operações da ponte
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Erros de configuração, parâmetro, recurso e internos
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    /// Nome de zona desconhecido
    #[error("Zona desconhecida: {0}")]
    UnknownZone(String),

    /// Zona não compilada/registrada ou não disponível nesta máquina
    #[error("Zona '{0}' não disponível")]
    ZoneUnavailable(Zone),

    /// Símbolo obrigatório não encontrado na tabela
    #[error("Símbolo não encontrado: {symbol}")]
    SymbolNotFound { symbol: String },

    /// Dois registros exportam o mesmo nome cru
    #[error("Símbolo duplicado: {symbol} (zonas {first} e {second})")]
    DuplicateSymbol { symbol: String, first: Zone, second: Zone },

    /// Nome exportado não corresponde ao esquema de nomes da zona
    #[error("Nome de símbolo '{actual}' não corresponde ao esperado '{expected}'")]
    SymbolNameMismatch { expected: String, actual: String },

    /// Zona já registrada por outro conjunto de exports
    #[error("Zona '{0}' já registrada")]
    ZoneAlreadyRegistered(Zone),

    /// Zona exporta uma operação que não declara
    #[error("Zona '{zone}' não declara a operação {op}")]
    UnexpectedCapability { zone: Zone, op: BridgeOp },

    /// Operação ausente na zona ligada
    #[error("Operação {op} indisponível na zona '{zone}'")]
    CapabilityAbsent { zone: Zone, op: BridgeOp },

    /// Metadados do objetivo incompatíveis com a chamada
    #[error("Objetivo incompatível: {0}")]
    ObjectiveMismatch(String),

    /// Shapes/contagens inválidos
    #[error("Parâmetro inválido: {0}")]
    InvalidParameter(String),

    /// Falha de alocação no kernel
    #[error("Memória insuficiente no kernel da zona")]
    OutOfMemory,

    /// Falha interna do kernel
    #[error("Falha interna: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Status equivalente na fronteira C
    pub fn status(&self) -> Status {
        match self {
            BridgeError::OutOfMemory => Status::OutOfMemory,
            BridgeError::InvalidParameter(_) | BridgeError::ObjectiveMismatch(_) => {
                Status::IllegalParamVal
            }
            _ => Status::UnexpectedInternal,
        }
    }

    /// Código cru equivalente
    pub fn code(&self) -> ErrorEbm {
        self.status().code()
    }

    /// Converte um status de kernel em resultado
    pub fn check(code: ErrorEbm, zone: Zone) -> BridgeResult<()> {
        match Status::from_code(code) {
            Status::Ok => Ok(()),
            Status::OutOfMemory => Err(BridgeError::OutOfMemory),
            Status::IllegalParamVal => Err(BridgeError::InvalidParameter(format!(
                "kernel da zona '{}' rejeitou os parâmetros",
                zone
            ))),
            Status::UnexpectedInternal => Err(BridgeError::Internal(format!(
                "kernel da zona '{}' devolveu {}",
                zone, code
            ))),
        }
    }

    /// Erro de configuração (binding), em oposição a erros de chamada
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            BridgeError::UnknownZone(_)
                | BridgeError::ZoneUnavailable(_)
                | BridgeError::SymbolNotFound { .. }
                | BridgeError::DuplicateSymbol { .. }
                | BridgeError::SymbolNameMismatch { .. }
                | BridgeError::ZoneAlreadyRegistered(_)
                | BridgeError::UnexpectedCapability { .. }
        )
    }
}

//! Erros de seleção, configuração e sessão

use std::path::PathBuf;

use ebm_bridge::BridgeError;
use ebm_objective::ObjectiveError;
use thiserror::Error;

/// Resultado de operações de cálculo
pub type ComputeResult<T> = Result<T, ComputeError>;

/// Erros de configuração (arquivo TOML e variáveis de ambiente)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Falha ao ler {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML inválido: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Falha ao serializar configuração: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Valor inválido para {key}: '{value}' ({reason})")]
    InvalidValue { key: String, value: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ComputeError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Objective(#[from] ObjectiveError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Nenhuma zona ligada ao binário está disponível
    #[error("Nenhuma zona disponível")]
    NoZoneAvailable,

    /// Soma dos pesos de validação não positiva
    #[error("Peso total inválido: {0}")]
    InvalidTotalWeight(f64),

    /// Zonas divergiram além da tolerância no check
    #[error("Zona '{zone}' divergiu da baseline: {detail}")]
    Divergence { zone: ebm_bridge::Zone, detail: String },
}

impl ComputeError {
    /// Erro de configuração/binding, detectado antes de qualquer rodada
    pub fn is_configuration(&self) -> bool {
        match self {
            ComputeError::Bridge(err) => err.is_configuration(),
            ComputeError::Config(_) | ComputeError::NoZoneAvailable => true,
            ComputeError::Objective(ObjectiveError::UnknownObjective(_)) => true,
            _ => false,
        }
    }
}

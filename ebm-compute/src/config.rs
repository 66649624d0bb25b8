//! # ⚙️ Configuração de zona e objetivo
//!
//! Ordem de carga: defaults → arquivo TOML → variáveis de ambiente (com
//! `.env` carregado uma vez).
//!
//! ```toml
//! [zone]
//! selection = "auto"          # "auto" | "cpu" | "simd" | "offload"
//! fallback_to_baseline = true
//!
//! [objective]
//! name = "rmse"               # "rmse" | "log_loss" | "poisson_deviance"
//! classes = 2                 # só log_loss; 2 = binário
//! ```

use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use ebm_bridge::{BridgeError, Zone};
use ebm_objective::{Objective, ObjectiveError};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Zona pedida (`auto` ou nome de zona)
pub const ENV_ZONE: &str = "EBM_ZONE";
/// Objetivo (`rmse`, `log_loss`, `log_loss[k]`, `poisson_deviance`)
pub const ENV_OBJECTIVE: &str = "EBM_OBJECTIVE";
/// Cair para a baseline quando a zona pedida não está disponível
pub const ENV_ZONE_FALLBACK: &str = "EBM_ZONE_FALLBACK";

static DOTENV_INIT: Lazy<()> = Lazy::new(|| {
    let _ = dotenv::dotenv();
});

#[inline]
fn ensure_dotenv() {
    let _ = &*DOTENV_INIT;
}

/// Política de seleção de zona
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ZoneSelection {
    /// Melhor zona disponível
    #[default]
    Auto,
    /// Zona fixa
    Explicit(Zone),
}

impl fmt::Display for ZoneSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneSelection::Auto => f.write_str("auto"),
            ZoneSelection::Explicit(zone) => write!(f, "{}", zone),
        }
    }
}

impl FromStr for ZoneSelection {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(ZoneSelection::Auto)
        } else {
            s.parse().map(ZoneSelection::Explicit)
        }
    }
}

impl TryFrom<String> for ZoneSelection {
    type Error = BridgeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ZoneSelection> for String {
    fn from(selection: ZoneSelection) -> Self {
        selection.to_string()
    }
}

/// Seção `[zone]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoneConfig {
    #[serde(default)]
    pub selection: ZoneSelection,
    #[serde(default = "default_fallback")]
    pub fallback_to_baseline: bool,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self { selection: ZoneSelection::Auto, fallback_to_baseline: default_fallback() }
    }
}

/// Seção `[objective]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectiveConfig {
    #[serde(default = "default_objective")]
    pub name: String,
    /// Número de classes (só `log_loss`)
    #[serde(default = "default_classes")]
    pub classes: usize,
}

impl Default for ObjectiveConfig {
    fn default() -> Self {
        Self { name: default_objective(), classes: default_classes() }
    }
}

fn default_fallback() -> bool {
    true
}

fn default_objective() -> String {
    "rmse".to_string()
}

fn default_classes() -> usize {
    2
}

/// Configuração completa
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComputeConfig {
    #[serde(default)]
    pub zone: ZoneConfig,
    #[serde(default)]
    pub objective: ObjectiveConfig,
}

impl ComputeConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Defaults → arquivo (se houver) → ambiente
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.with_env()?;
        config.check()?;
        tracing::debug!(zone = %config.zone.selection, objective = %config.objective.name, "configuração carregada");
        Ok(config)
    }

    /// Aplica `EBM_ZONE`, `EBM_OBJECTIVE` e `EBM_ZONE_FALLBACK`
    pub fn with_env(self) -> Result<Self, ConfigError> {
        ensure_dotenv();
        self.with_overrides(|key| env::var(key).ok())
    }

    /// Aplica overrides a partir de uma fonte chave → valor
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(value) = lookup(ENV_ZONE) {
            self.zone.selection = value
                .parse()
                .map_err(|err: BridgeError| invalid(ENV_ZONE, &value, err.to_string()))?;
        }
        if let Some(value) = lookup(ENV_OBJECTIVE) {
            let objective: Objective = value
                .parse()
                .map_err(|err: ObjectiveError| invalid(ENV_OBJECTIVE, &value, err.to_string()))?;
            self = self.with_objective(objective);
        }
        if let Some(value) = lookup(ENV_ZONE_FALLBACK) {
            self.zone.fallback_to_baseline = parse_bool(&value)
                .ok_or_else(|| invalid(ENV_ZONE_FALLBACK, &value, "esperado true/false".into()))?;
        }
        Ok(self)
    }

    /// Objetivo descrito por `[objective]`
    pub fn objective(&self) -> Result<Objective, ObjectiveError> {
        let parsed: Objective = self.objective.name.parse()?;
        let objective = match parsed {
            Objective::LogLoss { .. } if !self.objective.name.contains('[') => {
                Objective::LogLoss { classes: self.objective.classes }
            }
            other => other,
        };
        objective.validate()?;
        Ok(objective)
    }

    /// Confere que a configuração descreve um objetivo válido
    pub fn check(&self) -> Result<(), ConfigError> {
        self.objective()
            .map(|_| ())
            .map_err(|err| invalid("objective.name", &self.objective.name, err.to_string()))
    }

    /// Fixa a zona
    pub fn with_zone(mut self, zone: Zone) -> Self {
        self.zone.selection = ZoneSelection::Explicit(zone);
        self
    }

    /// Define a política de seleção
    pub fn with_selection(mut self, selection: ZoneSelection) -> Self {
        self.zone.selection = selection;
        self
    }

    /// Habilita/desabilita o fallback para a baseline
    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.zone.fallback_to_baseline = enabled;
        self
    }

    /// Define o objetivo
    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective.name = objective.name().to_string();
        self.objective.classes = match objective {
            Objective::LogLoss { classes } => classes,
            _ => default_classes(),
        };
        self
    }
}

fn invalid(key: &str, value: &str, reason: String) -> ConfigError {
    ConfigError::InvalidValue { key: key.to_string(), value: value.to_string(), reason }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ComputeConfig::from_toml_str("").unwrap();
        assert_eq!(config, ComputeConfig::default());
        assert_eq!(config.zone.selection, ZoneSelection::Auto);
        assert!(config.zone.fallback_to_baseline);
        assert_eq!(config.objective().unwrap(), Objective::Rmse);
    }

    #[test]
    fn test_parse_sections() {
        let config = ComputeConfig::from_toml_str(
            r#"
            [zone]
            selection = "simd"
            fallback_to_baseline = false

            [objective]
            name = "log_loss"
            classes = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.zone.selection, ZoneSelection::Explicit(Zone::Simd));
        assert!(!config.zone.fallback_to_baseline);
        assert_eq!(config.objective().unwrap(), Objective::LogLoss { classes: 4 });
    }

    #[test]
    fn test_rejects_unknown_zone_and_fields() {
        assert!(matches!(
            ComputeConfig::from_toml_str("[zone]\nselection = \"gpu\"\n"),
            Err(ConfigError::Parse(_))
        ));
        assert!(ComputeConfig::from_toml_str("[zone]\nselction = \"cpu\"\n").is_err());
    }

    #[test]
    fn test_overrides() {
        let config = ComputeConfig::default()
            .with_overrides(lookup(&[
                (ENV_ZONE, "offload"),
                (ENV_OBJECTIVE, "log_loss[3]"),
                (ENV_ZONE_FALLBACK, "off"),
            ]))
            .unwrap();
        assert_eq!(config.zone.selection, ZoneSelection::Explicit(Zone::Offload));
        assert!(!config.zone.fallback_to_baseline);
        assert_eq!(config.objective().unwrap(), Objective::LogLoss { classes: 3 });
    }

    #[test]
    fn test_override_errors_name_the_key() {
        let err = ComputeConfig::default().with_overrides(lookup(&[(ENV_ZONE, "gpu")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == ENV_ZONE));

        let err = ComputeConfig::default()
            .with_overrides(lookup(&[(ENV_ZONE_FALLBACK, "talvez")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_ZONE_FALLBACK));
    }

    #[test]
    fn test_check_rejects_bad_objective() {
        let mut config = ComputeConfig::default();
        config.objective.name = "tweedie".into();
        assert!(config.check().is_err());
        config.objective.name = "log_loss".into();
        config.objective.classes = 1;
        assert!(config.check().is_err());
    }

    #[test]
    fn test_from_file_and_roundtrip() {
        let config = ComputeConfig::default()
            .with_zone(Zone::Cpu)
            .with_objective(Objective::PoissonDeviance);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", config.to_toml_string().unwrap()).unwrap();

        let loaded = ComputeConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
        assert!(matches!(
            ComputeConfig::from_file(Path::new("/nao/existe.toml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_selection_display_roundtrip() {
        for s in ["auto", "cpu", "simd", "offload"] {
            assert_eq!(s.parse::<ZoneSelection>().unwrap().to_string(), s);
        }
    }
}

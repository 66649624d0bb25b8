//! # 🎯 Política de seleção de zona
//!
//! `auto` percorre [`AUTO_PREFERENCE`] e fica com a primeira zona ligada e
//! disponível. Zona explícita indisponível é erro de configuração, a menos
//! que o fallback para a baseline esteja habilitado.

use ebm_bridge::{BridgeError, SymbolTable, Zone};

use crate::config::{ZoneConfig, ZoneSelection};
use crate::error::{ComputeError, ComputeResult};

/// Ordem de preferência do modo `auto`: aceleradores primeiro
pub const AUTO_PREFERENCE: [Zone; 3] = [Zone::Offload, Zone::Simd, Zone::Cpu];

/// Seletor de zona sobre uma tabela de símbolos
#[derive(Debug, Clone, Copy)]
pub struct ZoneSelector<'a> {
    table: &'a SymbolTable,
}

impl<'a> ZoneSelector<'a> {
    pub fn new(table: &'a SymbolTable) -> Self {
        Self { table }
    }

    /// Melhor zona disponível
    pub fn best(&self) -> ComputeResult<Zone> {
        AUTO_PREFERENCE
            .into_iter()
            .find(|zone| self.table.is_available(*zone))
            .ok_or(ComputeError::NoZoneAvailable)
    }

    /// Resolve a política de `config`
    pub fn select(&self, config: &ZoneConfig) -> ComputeResult<Zone> {
        let zone = match config.selection {
            ZoneSelection::Auto => self.best()?,
            ZoneSelection::Explicit(zone) if self.table.is_available(zone) => zone,
            ZoneSelection::Explicit(zone) => {
                let baseline_ok = self.table.is_available(Zone::BASELINE);
                if config.fallback_to_baseline && zone != Zone::BASELINE && baseline_ok {
                    tracing::warn!(requested = %zone, fallback = %Zone::BASELINE, "zona indisponível, usando baseline");
                    Zone::BASELINE
                } else {
                    return Err(BridgeError::ZoneUnavailable(zone).into());
                }
            }
        };
        tracing::info!(zone = %zone, selection = %config.selection, "zona selecionada");
        Ok(zone)
    }
}

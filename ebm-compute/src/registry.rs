//! # 📇 Registro das zonas ligadas ao binário
//!
//! Cada feature de zona (`cpu`, `simd`, `offload`) liga o crate da zona e
//! registra seus símbolos. A tabela é montada uma vez e cacheada; a detecção
//! de disponibilidade também.

use std::sync::OnceLock;

use ebm_bridge::{BridgeError, BridgeOp, BridgeResult, SymbolTable, Zone, ZoneExports};
use serde::Serialize;

/// Exports das zonas habilitadas por feature
pub fn linked_exports() -> Vec<ZoneExports> {
    #[allow(unused_mut)]
    let mut exports = Vec::with_capacity(Zone::ALL.len());
    #[cfg(feature = "cpu")]
    exports.push(ebm_zone_cpu::exports().with_capability(ebm_zone_cpu::is_available));
    #[cfg(feature = "simd")]
    exports.push(ebm_zone_simd::exports().with_capability(ebm_zone_simd::is_available));
    #[cfg(feature = "offload")]
    exports.push(ebm_zone_offload::exports().with_capability(ebm_zone_offload::is_available));
    exports
}

/// Monta uma tabela a partir de um conjunto de exports
pub fn build_table(exports: impl IntoIterator<Item = ZoneExports>) -> BridgeResult<SymbolTable> {
    let mut table = SymbolTable::new();
    for zone_exports in exports {
        table.register(zone_exports)?;
    }
    Ok(table)
}

/// Tabela das zonas ligadas (com cache)
pub fn linked_zones() -> BridgeResult<&'static SymbolTable> {
    static TABLE: OnceLock<BridgeResult<SymbolTable>> = OnceLock::new();

    TABLE
        .get_or_init(|| {
            let table = build_table(linked_exports());
            match &table {
                Ok(t) => tracing::debug!(symbols = t.len(), "zonas registradas"),
                Err(err) => tracing::warn!(error = %err, "falha ao registrar zonas"),
            }
            table
        })
        .as_ref()
        .map_err(Clone::clone)
}

/// Zonas ligadas e disponíveis nesta máquina (com cache)
pub fn available_zones() -> &'static [Zone] {
    static AVAILABLE: OnceLock<Vec<Zone>> = OnceLock::new();

    AVAILABLE.get_or_init(|| match linked_zones() {
        Ok(table) => Zone::ALL.into_iter().filter(|z| table.is_available(*z)).collect(),
        Err(_) => Vec::new(),
    })
}

/// Estado de uma zona no binário
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneInfo {
    pub zone: Zone,
    pub linked: bool,
    pub available: bool,
    pub baseline: bool,
    pub finish_metric: bool,
    pub symbols: Vec<String>,
}

impl ZoneInfo {
    pub fn collect(table: &SymbolTable) -> Vec<ZoneInfo> {
        Zone::ALL
            .into_iter()
            .map(|zone| ZoneInfo {
                zone,
                linked: table.is_registered(zone),
                available: table.is_available(zone),
                baseline: zone.is_baseline(),
                finish_metric: table.resolve_finish_metric(zone).is_ok(),
                symbols: table.symbols_for(zone).into_iter().map(String::from).collect(),
            })
            .collect()
    }
}

/// Confere que a zona está ligada e declara `op`
pub fn require(table: &SymbolTable, zone: Zone, op: BridgeOp) -> BridgeResult<()> {
    if !table.is_registered(zone) {
        return Err(BridgeError::ZoneUnavailable(zone));
    }
    if !zone.supports(op) {
        return Err(BridgeError::CapabilityAbsent { zone, op });
    }
    Ok(())
}

//! # 🔗 Binding: tabela de símbolos e construção do `ObjectiveWrapper`
//!
//! Cada crate de zona entrega um [`ZoneExports`] com os símbolos que exporta.
//! O [`SymbolTable`] registra esses símbolos pelo nome cru (o mesmo nome do
//! `export_name`), recusando duplicatas e nomes fora do esquema, e o
//! [`bind`] resolve por nome exato as operações obrigatórias da zona pedida.
//!
//! ```text
//! ZoneExports(cpu) ──┐
//! ZoneExports(simd) ─┼──▶ SymbolTable ──bind(zone, descriptor)──▶ BoundObjective
//! ZoneExports(...) ──┘    nome → símbolo
//! ```

use std::collections::{BTreeMap, HashMap};

use crate::abi::{to_bool_ebm, ApplyUpdateFn, FinishMetricFn, LinkEbm, ObjectiveWrapper};
use crate::error::{BridgeError, BridgeResult};
use crate::handle::BoundObjective;
use crate::zone::{BridgeOp, Zone};

/// Ponteiro de função exportado por uma zona
#[derive(Debug, Clone, Copy)]
pub enum ZoneSymbol {
    ApplyUpdate(ApplyUpdateFn),
    FinishMetric(FinishMetricFn),
}

impl ZoneSymbol {
    pub fn op(&self) -> BridgeOp {
        match self {
            ZoneSymbol::ApplyUpdate(_) => BridgeOp::ApplyUpdate,
            ZoneSymbol::FinishMetric(_) => BridgeOp::FinishMetric,
        }
    }
}

/// Símbolo exportado com seu nome cru
#[derive(Debug, Clone, Copy)]
pub struct ExportedSymbol {
    pub name: &'static str,
    pub symbol: ZoneSymbol,
}

/// Conjunto de símbolos de uma zona compilada
#[derive(Debug, Clone)]
pub struct ZoneExports {
    zone: Zone,
    symbols: Vec<ExportedSymbol>,
    capability: fn() -> bool,
}

fn always_available() -> bool {
    true
}

impl ZoneExports {
    pub fn new(zone: Zone) -> Self {
        Self { zone, symbols: Vec::with_capacity(2), capability: always_available }
    }

    pub fn with_apply_update(mut self, name: &'static str, f: ApplyUpdateFn) -> Self {
        self.symbols.push(ExportedSymbol { name, symbol: ZoneSymbol::ApplyUpdate(f) });
        self
    }

    pub fn with_finish_metric(mut self, name: &'static str, f: FinishMetricFn) -> Self {
        self.symbols.push(ExportedSymbol { name, symbol: ZoneSymbol::FinishMetric(f) });
        self
    }

    /// Define a verificação de capacidade (CPU features, dispositivo, etc.)
    pub fn with_capability(mut self, capability: fn() -> bool) -> Self {
        self.capability = capability;
        self
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    pub fn symbols(&self) -> &[ExportedSymbol] {
        &self.symbols
    }

    pub fn is_available(&self) -> bool {
        (self.capability)()
    }
}

#[derive(Debug, Clone, Copy)]
struct RegisteredSymbol {
    zone: Zone,
    symbol: ZoneSymbol,
}

/// Registro nome → símbolo das zonas ligadas ao binário
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    symbols: HashMap<String, RegisteredSymbol>,
    capabilities: BTreeMap<Zone, fn() -> bool>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra os símbolos de uma zona.
    ///
    /// Tudo ou nada: se um símbolo for rejeitado, nenhum é inserido. Cada
    /// zona é registrada uma única vez, com todos os seus símbolos.
    pub fn register(&mut self, exports: ZoneExports) -> BridgeResult<()> {
        let zone = exports.zone;
        for exported in &exports.symbols {
            let op = exported.symbol.op();
            if !zone.supports(op) {
                tracing::warn!(zone = %zone, symbol = exported.name, "operação não declarada pela zona");
                return Err(BridgeError::UnexpectedCapability { zone, op });
            }
            let expected = zone.symbol_name(op);
            if exported.name != expected {
                tracing::warn!(zone = %zone, symbol = exported.name, %expected, "nome fora do esquema");
                return Err(BridgeError::SymbolNameMismatch {
                    expected,
                    actual: exported.name.to_string(),
                });
            }
            if let Some(existing) = self.symbols.get(exported.name) {
                tracing::warn!(symbol = exported.name, "símbolo duplicado");
                return Err(BridgeError::DuplicateSymbol {
                    symbol: exported.name.to_string(),
                    first: existing.zone,
                    second: zone,
                });
            }
        }
        if self.capabilities.contains_key(&zone) {
            tracing::warn!(zone = %zone, "zona registrada duas vezes");
            return Err(BridgeError::ZoneAlreadyRegistered(zone));
        }
        for (i, exported) in exports.symbols.iter().enumerate() {
            if exports.symbols[..i].iter().any(|prev| prev.name == exported.name) {
                return Err(BridgeError::DuplicateSymbol {
                    symbol: exported.name.to_string(),
                    first: zone,
                    second: zone,
                });
            }
        }

        for exported in exports.symbols {
            tracing::debug!(zone = %zone, symbol = exported.name, "símbolo registrado");
            self.symbols.insert(
                exported.name.to_string(),
                RegisteredSymbol { zone, symbol: exported.symbol },
            );
        }
        self.capabilities.insert(zone, exports.capability);
        Ok(())
    }

    /// Lookup por nome cru
    pub fn resolve(&self, name: &str) -> Option<ZoneSymbol> {
        self.symbols.get(name).map(|r| r.symbol)
    }

    pub fn resolve_apply_update(&self, zone: Zone) -> BridgeResult<ApplyUpdateFn> {
        let symbol = zone.symbol_name(BridgeOp::ApplyUpdate);
        match self.resolve(&symbol) {
            Some(ZoneSymbol::ApplyUpdate(f)) => Ok(f),
            _ => Err(BridgeError::SymbolNotFound { symbol }),
        }
    }

    pub fn resolve_finish_metric(&self, zone: Zone) -> BridgeResult<FinishMetricFn> {
        if !zone.supports(BridgeOp::FinishMetric) {
            return Err(BridgeError::CapabilityAbsent { zone, op: BridgeOp::FinishMetric });
        }
        let symbol = zone.symbol_name(BridgeOp::FinishMetric);
        match self.resolve(&symbol) {
            Some(ZoneSymbol::FinishMetric(f)) => Ok(f),
            _ => Err(BridgeError::SymbolNotFound { symbol }),
        }
    }

    /// Zonas com pelo menos um símbolo registrado
    pub fn zones(&self) -> impl Iterator<Item = Zone> + '_ {
        self.capabilities.keys().copied()
    }

    pub fn is_registered(&self, zone: Zone) -> bool {
        self.capabilities.contains_key(&zone)
    }

    /// Registrada e com capacidade confirmada
    pub fn is_available(&self, zone: Zone) -> bool {
        self.capabilities.get(&zone).is_some_and(|check| check())
    }

    /// Nomes registrados, ordenados
    pub fn symbol_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.symbols.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Nomes registrados para uma zona, ordenados
    pub fn symbols_for(&self, zone: Zone) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .symbols
            .iter()
            .filter(|(_, r)| r.zone == zone)
            .map(|(n, _)| n.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Metadados do objetivo que o binding grava no wrapper
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectiveDescriptor {
    pub objective: u32,
    pub link: LinkEbm,
    pub link_param: f64,
    pub c_scores: usize,
    pub maximize_metric: bool,
    pub hessian_constant: bool,
    pub gradient_constant: f64,
}

/// Liga um objetivo aos símbolos de `zone`.
///
/// Falha com [`BridgeError::SymbolNotFound`] se qualquer operação obrigatória
/// da zona não puder ser resolvida; nenhum wrapper é produzido nesse caso.
pub fn bind(table: &SymbolTable, zone: Zone, descriptor: ObjectiveDescriptor) -> BridgeResult<BoundObjective> {
    if descriptor.c_scores == 0 {
        return Err(BridgeError::ObjectiveMismatch("c_scores deve ser >= 1".into()));
    }

    let apply_update = table.resolve_apply_update(zone)?;
    tracing::debug!(zone = %zone, symbol = %zone.symbol_name(BridgeOp::ApplyUpdate), "símbolo resolvido");

    let finish_metric = if zone.supports(BridgeOp::FinishMetric) {
        let f = table.resolve_finish_metric(zone)?;
        tracing::debug!(zone = %zone, symbol = %zone.symbol_name(BridgeOp::FinishMetric), "símbolo resolvido");
        Some(f)
    } else {
        None
    };

    let wrapper = ObjectiveWrapper {
        apply_update: Some(apply_update),
        finish_metric,
        zone: zone.id(),
        objective: descriptor.objective,
        link: descriptor.link,
        link_param: descriptor.link_param,
        c_scores: descriptor.c_scores,
        maximize_metric: to_bool_ebm(descriptor.maximize_metric),
        hessian_constant: to_bool_ebm(descriptor.hessian_constant),
        gradient_constant: descriptor.gradient_constant,
    };

    tracing::info!(zone = %zone, objective = descriptor.objective, c_scores = descriptor.c_scores, "objetivo ligado");
    Ok(BoundObjective::new(zone, wrapper))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{ApplyUpdateBridge, ErrorEbm, ERROR_NONE, LINK_IDENTITY};

    unsafe extern "C" fn fake_apply(_: *const ObjectiveWrapper, data: *mut ApplyUpdateBridge) -> ErrorEbm {
        unsafe { (*data).metric_out = 42.0 };
        ERROR_NONE
    }

    unsafe extern "C" fn fake_finish(_: *const ObjectiveWrapper, sum: f64) -> f64 {
        sum * 2.0
    }

    fn descriptor() -> ObjectiveDescriptor {
        ObjectiveDescriptor {
            objective: 1,
            link: LINK_IDENTITY,
            link_param: 0.0,
            c_scores: 1,
            maximize_metric: false,
            hessian_constant: true,
            gradient_constant: 1.0,
        }
    }

    fn cpu_exports() -> ZoneExports {
        ZoneExports::new(Zone::Cpu)
            .with_apply_update("ApplyUpdate_cpu", fake_apply)
            .with_finish_metric("FinishMetric_cpu", fake_finish)
    }

    #[test]
    fn test_register_and_resolve() {
        let mut table = SymbolTable::new();
        table.register(cpu_exports()).unwrap();
        table
            .register(ZoneExports::new(Zone::Simd).with_apply_update("ApplyUpdate_simd", fake_apply))
            .unwrap();

        assert_eq!(table.len(), 3);
        assert!(table.resolve_apply_update(Zone::Simd).is_ok());
        assert!(table.resolve_finish_metric(Zone::Cpu).is_ok());
        assert_eq!(table.zones().collect::<Vec<_>>(), vec![Zone::Cpu, Zone::Simd]);
        assert_eq!(table.symbols_for(Zone::Cpu), vec!["ApplyUpdate_cpu", "FinishMetric_cpu"]);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut table = SymbolTable::new();
        table.register(cpu_exports()).unwrap();
        let err = table.register(cpu_exports()).unwrap_err();
        assert!(matches!(err, BridgeError::DuplicateSymbol { .. }));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_duplicate_within_one_zone_rejected() {
        let mut table = SymbolTable::new();
        let exports = ZoneExports::new(Zone::Simd)
            .with_apply_update("ApplyUpdate_simd", fake_apply)
            .with_apply_update("ApplyUpdate_simd", fake_apply);
        assert!(matches!(table.register(exports), Err(BridgeError::DuplicateSymbol { .. })));
        assert!(table.is_empty());
    }

    #[test]
    fn test_zone_registered_once() {
        fn never() -> bool {
            false
        }
        let mut table = SymbolTable::new();
        table
            .register(ZoneExports::new(Zone::Cpu).with_apply_update("ApplyUpdate_cpu", fake_apply))
            .unwrap();
        let second = ZoneExports::new(Zone::Cpu)
            .with_finish_metric("FinishMetric_cpu", fake_finish)
            .with_capability(never);
        assert_eq!(table.register(second), Err(BridgeError::ZoneAlreadyRegistered(Zone::Cpu)));
        assert!(table.is_available(Zone::Cpu));
        assert_eq!(table.symbol_names(), vec!["ApplyUpdate_cpu"]);
    }

    #[test]
    fn test_name_mismatch_rejected() {
        let mut table = SymbolTable::new();
        let exports = ZoneExports::new(Zone::Simd).with_apply_update("ApplyUpdate_cpu", fake_apply);
        assert!(matches!(table.register(exports), Err(BridgeError::SymbolNameMismatch { .. })));
        assert!(table.is_empty());
    }

    #[test]
    fn test_finish_metric_outside_baseline_rejected() {
        let mut table = SymbolTable::new();
        let exports = ZoneExports::new(Zone::Offload)
            .with_apply_update("ApplyUpdate_offload", fake_apply)
            .with_finish_metric("FinishMetric_offload", fake_finish);
        assert!(matches!(
            table.register(exports),
            Err(BridgeError::UnexpectedCapability { zone: Zone::Offload, op: BridgeOp::FinishMetric })
        ));
    }

    #[test]
    fn test_bind_missing_apply_update() {
        let mut table = SymbolTable::new();
        table.register(cpu_exports()).unwrap();
        let err = bind(&table, Zone::Simd, descriptor()).unwrap_err();
        assert_eq!(err, BridgeError::SymbolNotFound { symbol: "ApplyUpdate_simd".into() });
        assert!(err.is_configuration());
    }

    #[test]
    fn test_bind_baseline_requires_finish_metric() {
        let mut table = SymbolTable::new();
        table
            .register(ZoneExports::new(Zone::Cpu).with_apply_update("ApplyUpdate_cpu", fake_apply))
            .unwrap();
        let err = bind(&table, Zone::Cpu, descriptor()).unwrap_err();
        assert_eq!(err, BridgeError::SymbolNotFound { symbol: "FinishMetric_cpu".into() });
    }

    #[test]
    fn test_bind_fills_wrapper() {
        let mut table = SymbolTable::new();
        table.register(cpu_exports()).unwrap();
        let bound = bind(&table, Zone::Cpu, descriptor()).unwrap();
        let w = bound.wrapper();
        assert!(w.apply_update.is_some());
        assert!(w.finish_metric.is_some());
        assert_eq!(w.zone, Zone::Cpu.id());
        assert_eq!(w.c_scores, 1);
        assert_eq!(bound.finish_metric(3.0).unwrap(), 6.0);
    }

    #[test]
    fn test_bind_non_baseline_has_no_finish_metric() {
        let mut table = SymbolTable::new();
        table
            .register(ZoneExports::new(Zone::Simd).with_apply_update("ApplyUpdate_simd", fake_apply))
            .unwrap();
        let bound = bind(&table, Zone::Simd, descriptor()).unwrap();
        assert!(bound.wrapper().finish_metric.is_none());
        assert_eq!(
            bound.finish_metric(1.0),
            Err(BridgeError::CapabilityAbsent { zone: Zone::Simd, op: BridgeOp::FinishMetric })
        );
    }

    #[test]
    fn test_unavailable_zone_stays_registered() {
        fn never() -> bool {
            false
        }
        let mut table = SymbolTable::new();
        table
            .register(
                ZoneExports::new(Zone::Offload)
                    .with_apply_update("ApplyUpdate_offload", fake_apply)
                    .with_capability(never),
            )
            .unwrap();
        assert!(table.is_registered(Zone::Offload));
        assert!(!table.is_available(Zone::Offload));
        assert!(!table.is_available(Zone::Cpu));
    }

    #[test]
    fn test_bind_rejects_zero_scores() {
        let mut table = SymbolTable::new();
        table.register(cpu_exports()).unwrap();
        let d = ObjectiveDescriptor { c_scores: 0, ..descriptor() };
        assert!(matches!(bind(&table, Zone::Cpu, d), Err(BridgeError::ObjectiveMismatch(_))));
    }
}

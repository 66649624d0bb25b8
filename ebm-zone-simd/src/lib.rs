//! # ⚡ Zona SIMD: kernel vetorizado por lanes
//!
//! Exporta apenas `ApplyUpdate_simd`. Não há FinishMetric nesta zona: a
//! finalização da métrica pertence à zona baseline.
//!
//! Disponível quando o processador tem AVX2 (x86_64) ou NEON (aarch64); o
//! resultado da detecção é cacheado.

use std::sync::OnceLock;

use ebm_bridge::Zone;

mod kernel;

pub use kernel::LANES;

/// Identidade desta zona
pub const ZONE: Zone = Zone::Simd;

ebm_bridge::export_zone_bridge! {
    zone: ebm_bridge::Zone::Simd = "simd",
    apply_update: kernel::apply_update,
}

/// Detecta suporte a SIMD (com cache)
pub fn is_available() -> bool {
    static AVAILABLE: OnceLock<bool> = OnceLock::new();
    *AVAILABLE.get_or_init(detect_simd)
}

fn detect_simd() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        is_x86_feature_detected!("avx2")
    }
    #[cfg(target_arch = "aarch64")]
    {
        // NEON sempre presente em aarch64
        true
    }
    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebm_bridge::{bind, BridgeError, BridgeOp, SymbolTable, UpdateBuffers};
    use ebm_objective::Objective;

    fn bound(objective: Objective) -> ebm_bridge::BoundObjective {
        let mut table = SymbolTable::new();
        table.register(exports()).unwrap();
        bind(&table, ZONE, objective.descriptor().unwrap()).unwrap()
    }

    #[test]
    fn test_exports_only_apply_update() {
        let exports = exports();
        assert_eq!(exports.symbols().len(), 1);
        assert_eq!(exports.symbols()[0].name, "ApplyUpdate_simd");
        assert_eq!(exports.symbols()[0].symbol.op(), BridgeOp::ApplyUpdate);
    }

    #[test]
    fn test_no_finish_metric() {
        let obj = bound(Objective::Rmse);
        assert!(!obj.supports(BridgeOp::FinishMetric));
        assert_eq!(
            obj.finish_metric(2.5),
            Err(BridgeError::CapabilityAbsent { zone: Zone::Simd, op: BridgeOp::FinishMetric })
        );
    }

    #[test]
    fn test_tail_block() {
        // 11 samples: um bloco cheio e um parcial de 3
        let obj = bound(Objective::Rmse);
        let update = [0.5];
        let targets: Vec<f64> = (0..11).map(f64::from).collect();
        let mut scores = vec![0.0; 11];
        let mut grads = vec![0.0; 11];
        let mut buffers = UpdateBuffers::training(&update, &targets, &mut scores, &mut grads, false);
        obj.apply_update(&mut buffers).unwrap();
        assert!(scores.iter().all(|s| *s == 0.5));
        for (i, g) in grads.iter().enumerate() {
            assert_eq!(*g, 0.5 - i as f64);
        }
    }

    #[test]
    fn test_validation_metric() {
        let obj = bound(Objective::Rmse);
        let update = [1.0];
        let targets = vec![0.0; 20];
        let weights = vec![0.5; 20];
        let mut scores = vec![0.0; 20];
        let mut buffers = UpdateBuffers::validation(&update, &targets, &mut scores).with_weights(&weights);
        assert_eq!(obj.apply_update(&mut buffers).unwrap(), 10.0);
    }

    #[test]
    fn test_capability_check_is_stable() {
        assert_eq!(is_available(), is_available());
    }
}

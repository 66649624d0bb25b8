//! # 🖥️ Zona CPU: kernel escalar de referência
//!
//! Zona baseline: sempre disponível e única que exporta FinishMetric.
//!
//! | Símbolo | Operação |
//! |---------|----------|
//! | `ApplyUpdate_cpu` | update + gradientes/métrica, um sample por vez |
//! | `FinishMetric_cpu` | transformação final da métrica do objetivo |

use ebm_bridge::Zone;

mod kernel;

/// Identidade desta zona
pub const ZONE: Zone = Zone::Cpu;

ebm_bridge::export_zone_bridge! {
    zone: ebm_bridge::Zone::Cpu = "cpu",
    apply_update: kernel::apply_update,
    finish_metric: kernel::finish_metric,
}

/// A zona escalar roda em qualquer alvo
pub fn is_available() -> bool {
    true
}

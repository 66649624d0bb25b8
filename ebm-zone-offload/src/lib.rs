//! # 🛰️ Zona Offload: kernel com staging e fila de dispositivo
//!
//! Emula um acelerador: entradas mutáveis são copiadas para buffers de
//! staging, processadas em blocos de [`BLOCK_SAMPLES`] numa fila dedicada e
//! copiadas de volta. Exporta apenas `ApplyUpdate_offload`.

use ebm_bridge::Zone;

mod device;
mod kernel;

pub use kernel::BLOCK_SAMPLES;

/// Identidade desta zona
pub const ZONE: Zone = Zone::Offload;

ebm_bridge::export_zone_bridge! {
    zone: ebm_bridge::Zone::Offload = "offload",
    apply_update: kernel::apply_update,
}

/// Fila do dispositivo pôde ser criada
pub fn is_available() -> bool {
    device::queue().is_some()
}

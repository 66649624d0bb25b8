//! Fila de dispositivo emulada e buffers de staging
//!
//! A "fila" é um pool rayon dedicado, criado uma vez. Buffers de staging são
//! reservados com `try_reserve_exact`; falha de alocação vira
//! [`BridgeError::OutOfMemory`] em vez de abortar o processo.

use std::sync::OnceLock;

use ebm_bridge::{BridgeError, BridgeResult};
use rayon::{ThreadPool, ThreadPoolBuilder};

static DEVICE: OnceLock<Option<ThreadPool>> = OnceLock::new();

/// Fila do dispositivo, inicializada na primeira chamada
pub fn queue() -> Option<&'static ThreadPool> {
    DEVICE
        .get_or_init(|| {
            match ThreadPoolBuilder::new()
                .thread_name(|i| format!("ebm-offload-{}", i))
                .build()
            {
                Ok(pool) => {
                    tracing::debug!(threads = pool.current_num_threads(), "fila offload criada");
                    Some(pool)
                }
                Err(err) => {
                    tracing::warn!(error = %err, "fila offload indisponível");
                    None
                }
            }
        })
        .as_ref()
}

/// Buffer de `len` zeros no dispositivo
pub fn allocate(len: usize) -> BridgeResult<Vec<f64>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| BridgeError::OutOfMemory)?;
    buf.resize(len, 0.0);
    Ok(buf)
}

/// Copia `src` para um buffer do dispositivo
pub fn upload(src: &[f64]) -> BridgeResult<Vec<f64>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(src.len()).map_err(|_| BridgeError::OutOfMemory)?;
    buf.extend_from_slice(src);
    Ok(buf)
}

//! # 🌉 EBM-Bridge
//!
//! Fronteira de chamada fixa entre um motor de boosting genérico e kernels
//! numéricos especializados ("zonas"), compilados separadamente e ligados no
//! mesmo binário sem colisão de símbolos.
//!
//! ## Arquitetura
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Motor de boosting                            │
//! │        ObjectiveDescriptor            UpdateBuffers (por rodada)     │
//! └───────────────┬───────────────────────────────┬─────────────────────┘
//!                 ▼                               ▼
//! ┌───────────────────────────┐     ┌────────────────────────────────────┐
//! │ SymbolTable + bind()      │ ──▶ │ BoundObjective (ObjectiveWrapper)  │
//! │ nome → símbolo por zona   │     │ apply_update / finish_metric?      │
//! └───────────────────────────┘     └──────────────────┬─────────────────┘
//!                                                      │ extern "C"
//!          ┌──────────────────┬────────────────────────┼──────────────────┐
//!          ▼                  ▼                        ▼                  │
//!   ApplyUpdate_cpu     ApplyUpdate_simd      ApplyUpdate_offload         │
//!   FinishMetric_cpu                                                      │
//! ```
//!
//! ## Módulos
//!
//! - [`zone`]: identidade de zona e esquema de nomes
//! - [`abi`]: estruturas `#[repr(C)]` e códigos de status
//! - [`table`]: guards e macro de export por zona
//! - [`binding`]: registro de símbolos e binding
//! - [`handle`]: `BoundObjective` e `UpdateBuffers`
//! - [`view`]: vista validada para os kernels
//!
//! ## Princípios
//!
//! 1. **Só dados planos cruzam a fronteira**: kernel e threads ficam dentro da zona
//! 2. **Um nome por (operação, zona)**: colisão é erro de link
//! 3. **Status, nunca unwind**: toda falha vira [`ErrorEbm`]
//! 4. **Wrapper imutável**: construído no binding, emprestado depois

pub mod abi;
pub mod binding;
pub mod error;
pub mod handle;
pub mod table;
pub mod view;
pub mod zone;

pub use abi::{
    ApplyUpdateBridge, ApplyUpdateFn, BoolEbm, ErrorEbm, FinishMetricFn, LinkEbm, ObjectiveWrapper,
    Status,
};
pub use binding::{bind, ObjectiveDescriptor, SymbolTable, ZoneExports, ZoneSymbol};
pub use error::{BridgeError, BridgeResult};
pub use handle::{BoundObjective, UpdateBuffers};
pub use view::{pack_bins, ApplyUpdateView, PackedBins};
pub use zone::{BridgeOp, Zone, ZoneId};

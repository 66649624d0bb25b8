//! # 🔌 ABI: estruturas de transferência e códigos de status
//!
//! Tudo que cruza a fronteira C: dados planos, `#[repr(C)]`, sem
//! comportamento próprio. Layout fixo; nenhum campo pode ser reordenado.
//!
//! ```text
//! ┌──────────────────┐   *const ObjectiveWrapper   ┌──────────────────┐
//! │  motor / binding │ ──────────────────────────▶ │ ApplyUpdate_zone │
//! │                  │   *mut ApplyUpdateBridge    │   (kernel zona)  │
//! │                  │ ◀────────── ErrorEbm ────── │                  │
//! └──────────────────┘                             └──────────────────┘
//! ```

use std::ptr;

use crate::zone::ZoneId;

/// Código de status devolvido pela fronteira
pub type ErrorEbm = i32;

/// Booleano C
pub type BoolEbm = i32;

/// Identificador da função de link
pub type LinkEbm = i32;

pub const EBM_FALSE: BoolEbm = 0;
pub const EBM_TRUE: BoolEbm = 1;

pub const ERROR_NONE: ErrorEbm = 0;
pub const ERROR_OUT_OF_MEMORY: ErrorEbm = -1;
pub const ERROR_UNEXPECTED_INTERNAL: ErrorEbm = -2;
pub const ERROR_ILLEGAL_PARAM_VAL: ErrorEbm = -3;

pub const LINK_ERROR: LinkEbm = 0;
pub const LINK_IDENTITY: LinkEbm = 1;
pub const LINK_LOGIT: LinkEbm = 2;
pub const LINK_LOG: LinkEbm = 3;
pub const LINK_SOFTMAX: LinkEbm = 4;

/// Ponto de entrada ApplyUpdate de uma zona
pub type ApplyUpdateFn =
    unsafe extern "C" fn(wrapper: *const ObjectiveWrapper, data: *mut ApplyUpdateBridge) -> ErrorEbm;

/// Ponto de entrada FinishMetric (apenas zona baseline)
pub type FinishMetricFn =
    unsafe extern "C" fn(wrapper: *const ObjectiveWrapper, metric_sum: f64) -> f64;

#[inline]
pub const fn to_bool_ebm(b: bool) -> BoolEbm {
    if b { EBM_TRUE } else { EBM_FALSE }
}

#[inline]
pub const fn from_bool_ebm(b: BoolEbm) -> bool {
    b != EBM_FALSE
}

/// Status seguro espelhando [`ErrorEbm`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Sucesso
    Ok,
    /// Falha de alocação dentro do kernel
    OutOfMemory,
    /// Falha interna não atribuível
    UnexpectedInternal,
    /// Parâmetro ilegal (shapes/contagens)
    IllegalParamVal,
}

impl Status {
    pub const fn code(self) -> ErrorEbm {
        match self {
            Status::Ok => ERROR_NONE,
            Status::OutOfMemory => ERROR_OUT_OF_MEMORY,
            Status::UnexpectedInternal => ERROR_UNEXPECTED_INTERNAL,
            Status::IllegalParamVal => ERROR_ILLEGAL_PARAM_VAL,
        }
    }

    /// Converte um código cru. Códigos desconhecidos viram falha interna.
    pub const fn from_code(code: ErrorEbm) -> Status {
        match code {
            ERROR_NONE => Status::Ok,
            ERROR_OUT_OF_MEMORY => Status::OutOfMemory,
            ERROR_ILLEGAL_PARAM_VAL => Status::IllegalParamVal,
            _ => Status::UnexpectedInternal,
        }
    }

    pub const fn is_ok(self) -> bool {
        matches!(self, Status::Ok)
    }
}

/// Handle de objetivo ligado a uma zona.
///
/// Construído apenas pelo binding e somente-leitura depois disso. Os campos de
/// metadados vêm do colaborador de objetivo via
/// [`ObjectiveDescriptor`](crate::binding::ObjectiveDescriptor).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ObjectiveWrapper {
    pub apply_update: Option<ApplyUpdateFn>,
    /// `Some` somente na zona baseline
    pub finish_metric: Option<FinishMetricFn>,
    pub zone: ZoneId,
    /// Código do objetivo (definido pelo colaborador de objetivo)
    pub objective: u32,
    pub link: LinkEbm,
    pub link_param: f64,
    pub c_scores: usize,
    pub maximize_metric: BoolEbm,
    /// Hessiana constante (ex.: RMSE), kernels podem pular o cálculo
    pub hessian_constant: BoolEbm,
    /// Escala aplicada a todo gradiente
    pub gradient_constant: f64,
}

/// Dados de uma chamada ApplyUpdate.
///
/// Pertence ao chamador; os buffers são emprestados só durante a chamada.
#[repr(C)]
#[derive(Debug)]
pub struct ApplyUpdateBridge {
    pub c_scores: usize,
    /// Bins por palavra de 64 bits; 0 = sem feature (todo sample usa o bin 0)
    pub c_pack: i32,
    pub hessian_needed: BoolEbm,
    pub validation: BoolEbm,
    pub c_samples: usize,
    pub update_tensor_scores: *const f64,
    pub c_update_bins: usize,
    pub packed: *const u64,
    pub targets: *const f64,
    /// Nulo = peso 1
    pub weights: *const f64,
    pub sample_scores: *mut f64,
    /// Intercalado `[g, h]` por score quando `hessian_needed`
    pub gradients_and_hessians: *mut f64,
    /// Soma ponderada da métrica (validação), 0 em treino
    pub metric_out: f64,
}

impl Default for ApplyUpdateBridge {
    fn default() -> Self {
        Self {
            c_scores: 0,
            c_pack: 0,
            hessian_needed: EBM_FALSE,
            validation: EBM_FALSE,
            c_samples: 0,
            update_tensor_scores: ptr::null(),
            c_update_bins: 0,
            packed: ptr::null(),
            targets: ptr::null(),
            weights: ptr::null(),
            sample_scores: ptr::null_mut(),
            gradients_and_hessians: ptr::null_mut(),
            metric_out: 0.0,
        }
    }
}

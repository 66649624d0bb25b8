//! # 📋 Tabela de funções da ponte
//!
//! As duas operações são declaradas uma vez aqui e instanciadas uma vez por
//! zona com [`export_zone_bridge!`](crate::export_zone_bridge). Cada crate de
//! zona é uma unidade de compilação própria e exporta:
//!
//! ```text
//! ApplyUpdate_<zona>(*const ObjectiveWrapper, *mut ApplyUpdateBridge) -> ErrorEbm
//! FinishMetric_cpu(*const ObjectiveWrapper, f64) -> f64        (só baseline)
//! ```
//!
//! Os guards convertem qualquer falha do kernel (inclusive panic) em código de
//! status antes de voltar pela fronteira.

use std::panic::{self, AssertUnwindSafe};

use crate::abi::{ApplyUpdateBridge, ErrorEbm, ObjectiveWrapper, ERROR_ILLEGAL_PARAM_VAL, ERROR_NONE, ERROR_UNEXPECTED_INTERNAL};
use crate::error::BridgeResult;

/// Kernel ApplyUpdate de uma zona, já do lado seguro da fronteira
pub type ZoneApplyUpdate = fn(&ObjectiveWrapper, &mut ApplyUpdateBridge) -> BridgeResult<()>;

/// Transformação FinishMetric do lado seguro da fronteira
pub type ZoneFinishMetric = fn(&ObjectiveWrapper, f64) -> f64;

/// Executa o kernel ApplyUpdate convertendo erros e panics em [`ErrorEbm`].
///
/// # Safety
///
/// `wrapper` e `data`, quando não nulos, devem ser válidos durante a chamada.
pub unsafe fn guard_apply_update(
    wrapper: *const ObjectiveWrapper,
    data: *mut ApplyUpdateBridge,
    kernel: ZoneApplyUpdate,
) -> ErrorEbm {
    if wrapper.is_null() || data.is_null() {
        return ERROR_ILLEGAL_PARAM_VAL;
    }
    // SAFETY: não nulos, validade garantida pelo chamador
    let (wrapper, data) = unsafe { (&*wrapper, &mut *data) };

    match panic::catch_unwind(AssertUnwindSafe(|| kernel(wrapper, data))) {
        Ok(Ok(())) => ERROR_NONE,
        Ok(Err(err)) => err.code(),
        Err(_) => ERROR_UNEXPECTED_INTERNAL,
    }
}

/// Executa FinishMetric. Sem canal de status: falhas viram `NaN`.
///
/// # Safety
///
/// `wrapper`, quando não nulo, deve ser válido durante a chamada.
pub unsafe fn guard_finish_metric(
    wrapper: *const ObjectiveWrapper,
    metric_sum: f64,
    finish: ZoneFinishMetric,
) -> f64 {
    if wrapper.is_null() {
        return f64::NAN;
    }
    // SAFETY: não nulo, validade garantida pelo chamador
    let wrapper = unsafe { &*wrapper };
    panic::catch_unwind(AssertUnwindSafe(|| finish(wrapper, metric_sum))).unwrap_or(f64::NAN)
}

/// Exporta as operações da ponte para uma zona.
///
/// Gera `zoned_apply_update` (e `zoned_finish_metric` quando informado) com
/// `export_name` qualificado pela zona, mais `exports()` para o registro.
/// O literal da zona é conferido contra [`Zone::name`](crate::Zone::name) em
/// tempo de compilação.
///
/// ```ignore
/// ebm_bridge::export_zone_bridge! {
///     zone: ebm_bridge::Zone::Cpu = "cpu",
///     apply_update: crate::kernel::apply_update,
///     finish_metric: crate::kernel::finish_metric,
/// }
/// ```
#[macro_export]
macro_rules! export_zone_bridge {
    (@apply_update $zone:path, $zone_name:literal, $apply:path) => {
        const _: () = assert!(
            $crate::zone::const_str_eq($zone.name(), $zone_name),
            "literal de zona não corresponde a Zone::name()"
        );

        /// ApplyUpdate exportado com nome qualificado pela zona.
        ///
        /// # Safety
        ///
        /// `wrapper` e `data` devem ser válidos durante a chamada, com buffers
        /// do tamanho implicado pelas contagens de `data`.
        #[unsafe(export_name = $crate::zoned_c_function_name!(ApplyUpdate, $zone_name))]
        pub unsafe extern "C" fn zoned_apply_update(
            wrapper: *const $crate::abi::ObjectiveWrapper,
            data: *mut $crate::abi::ApplyUpdateBridge,
        ) -> $crate::abi::ErrorEbm {
            unsafe { $crate::table::guard_apply_update(wrapper, data, $apply) }
        }
    };

    (zone: $zone:path = $zone_name:literal, apply_update: $apply:path $(,)?) => {
        $crate::export_zone_bridge!(@apply_update $zone, $zone_name, $apply);

        /// Símbolos exportados por esta zona
        pub fn exports() -> $crate::binding::ZoneExports {
            $crate::binding::ZoneExports::new($zone).with_apply_update(
                $crate::zoned_c_function_name!(ApplyUpdate, $zone_name),
                zoned_apply_update,
            )
        }
    };

    (
        zone: $zone:path = $zone_name:literal,
        apply_update: $apply:path,
        finish_metric: $finish:path $(,)?
    ) => {
        $crate::export_zone_bridge!(@apply_update $zone, $zone_name, $apply);

        /// FinishMetric exportado com nome qualificado pela zona.
        ///
        /// # Safety
        ///
        /// `wrapper` deve ser válido durante a chamada.
        #[unsafe(export_name = $crate::zoned_c_function_name!(FinishMetric, $zone_name))]
        pub unsafe extern "C" fn zoned_finish_metric(
            wrapper: *const $crate::abi::ObjectiveWrapper,
            metric_sum: f64,
        ) -> f64 {
            unsafe { $crate::table::guard_finish_metric(wrapper, metric_sum, $finish) }
        }

        /// Símbolos exportados por esta zona
        pub fn exports() -> $crate::binding::ZoneExports {
            $crate::binding::ZoneExports::new($zone)
                .with_apply_update(
                    $crate::zoned_c_function_name!(ApplyUpdate, $zone_name),
                    zoned_apply_update,
                )
                .with_finish_metric(
                    $crate::zoned_c_function_name!(FinishMetric, $zone_name),
                    zoned_finish_metric,
                )
        }
    };
}

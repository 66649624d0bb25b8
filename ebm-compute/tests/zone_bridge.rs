//! Nomes por zona, binding e capacidades

use ebm_bridge::abi::{ERROR_ILLEGAL_PARAM_VAL, ERROR_NONE, EBM_TRUE};
use ebm_bridge::{
    bind, zoned_c_function_name, ApplyUpdateBridge, BridgeError, BridgeOp, ErrorEbm, ObjectiveWrapper, SymbolTable,
    UpdateBuffers, Zone, ZoneSymbol,
};
use ebm_compute::build_table;
use ebm_objective::Objective;
use std::collections::HashSet;

use ebm_zone_cpu as _;
use ebm_zone_offload as _;
use ebm_zone_simd as _;

#[allow(non_snake_case)]
unsafe extern "C" {
    fn ApplyUpdate_cpu(wrapper: *const ObjectiveWrapper, data: *mut ApplyUpdateBridge) -> ErrorEbm;
    fn ApplyUpdate_simd(wrapper: *const ObjectiveWrapper, data: *mut ApplyUpdateBridge) -> ErrorEbm;
    fn ApplyUpdate_offload(wrapper: *const ObjectiveWrapper, data: *mut ApplyUpdateBridge) -> ErrorEbm;
    fn FinishMetric_cpu(wrapper: *const ObjectiveWrapper, metric: f64) -> f64;
}

fn full_table() -> SymbolTable {
    build_table([ebm_zone_cpu::exports(), ebm_zone_simd::exports(), ebm_zone_offload::exports()]).unwrap()
}

#[test]
fn macro_and_runtime_names_agree() {
    assert_eq!(zoned_c_function_name!(ApplyUpdate, "cpu"), Zone::Cpu.symbol_name(BridgeOp::ApplyUpdate));
    assert_eq!(zoned_c_function_name!(ApplyUpdate, "simd"), Zone::Simd.symbol_name(BridgeOp::ApplyUpdate));
    assert_eq!(
        zoned_c_function_name!(ApplyUpdate, "offload"),
        Zone::Offload.symbol_name(BridgeOp::ApplyUpdate)
    );
    assert_eq!(zoned_c_function_name!(FinishMetric, "cpu"), Zone::Cpu.symbol_name(BridgeOp::FinishMetric));
}

#[test]
fn exported_names_are_distinct() {
    let table = full_table();
    let names = table.symbol_names();
    let unique: HashSet<&str> = names.iter().copied().collect();
    assert_eq!(unique.len(), names.len());
    assert_eq!(names.len(), 4);
    for zone in Zone::ALL {
        assert!(table.resolve(&zone.symbol_name(BridgeOp::ApplyUpdate)).is_some());
    }
}

#[test]
fn finish_metric_only_on_baseline() {
    let table = full_table();
    assert!(matches!(table.resolve("FinishMetric_cpu"), Some(ZoneSymbol::FinishMetric(_))));
    assert!(table.resolve("FinishMetric_simd").is_none());
    assert!(table.resolve("FinishMetric_offload").is_none());

    let descriptor = Objective::Rmse.descriptor().unwrap();
    let cpu = bind(&table, Zone::Cpu, descriptor).unwrap();
    assert!(cpu.supports(BridgeOp::FinishMetric));
    assert_eq!(cpu.finish_metric(10.0 / 4.0).unwrap(), 2.5_f64.sqrt());

    for zone in [Zone::Simd, Zone::Offload] {
        let bound = bind(&table, zone, descriptor).unwrap();
        assert!(bound.wrapper().finish_metric.is_none());
        assert_eq!(
            bound.finish_metric(2.5),
            Err(BridgeError::CapabilityAbsent { zone, op: BridgeOp::FinishMetric })
        );
    }
}

#[test]
fn binding_missing_zone_is_configuration_error() {
    let table = build_table([ebm_zone_cpu::exports()]).unwrap();
    let err = bind(&table, Zone::Simd, Objective::Rmse.descriptor().unwrap()).unwrap_err();
    assert_eq!(err, BridgeError::SymbolNotFound { symbol: "ApplyUpdate_simd".into() });
    assert!(err.is_configuration());
}

#[test]
fn second_copy_of_a_zone_is_rejected() {
    let mut table = full_table();
    let err = table.register(ebm_zone_simd::exports()).unwrap_err();
    assert!(matches!(err, BridgeError::DuplicateSymbol { first: Zone::Simd, second: Zone::Simd, .. }));
}

/// Chama os símbolos pelo nome C exato e compara com a chamada via binding
#[test]
fn symbols_link_by_exact_name() {
    let table = full_table();
    let descriptor = Objective::Rmse.descriptor().unwrap();
    let entries: [(Zone, unsafe extern "C" fn(*const ObjectiveWrapper, *mut ApplyUpdateBridge) -> ErrorEbm); 3] =
        [(Zone::Cpu, ApplyUpdate_cpu), (Zone::Simd, ApplyUpdate_simd), (Zone::Offload, ApplyUpdate_offload)];

    let update = [0.25, -0.5];
    let words = ebm_bridge::pack_bins(&[1, 0, 1], 8).unwrap();
    let targets = [1.0, 2.0, 3.0];

    for (zone, entry) in entries {
        let bound = bind(&table, zone, descriptor).unwrap();

        let mut via_bridge = [0.0; 3];
        let metric = bound
            .apply_update(
                &mut UpdateBuffers::validation(&update, &targets, &mut via_bridge).with_packed(&words, 8),
            )
            .unwrap();

        let mut via_symbol = [0.0; 3];
        let mut data = ApplyUpdateBridge {
            c_scores: 1,
            c_pack: 8,
            validation: EBM_TRUE,
            c_samples: 3,
            update_tensor_scores: update.as_ptr(),
            c_update_bins: 2,
            packed: words.as_ptr(),
            targets: targets.as_ptr(),
            sample_scores: via_symbol.as_mut_ptr(),
            ..Default::default()
        };
        let code = unsafe { entry(bound.wrapper(), &mut data) };
        assert_eq!(code, ERROR_NONE, "zona {}", zone);
        assert_eq!(via_symbol, via_bridge);
        assert_eq!(data.metric_out, metric);
    }

    let cpu = bind(&table, Zone::Cpu, descriptor).unwrap();
    assert_eq!(unsafe { FinishMetric_cpu(cpu.wrapper(), 2.5) }, 2.5_f64.sqrt());
}

#[test]
fn raw_failures_map_to_status_without_mutation() {
    let table = full_table();
    let descriptor = Objective::Rmse.descriptor().unwrap();
    for zone in Zone::ALL {
        let bound = bind(&table, zone, descriptor).unwrap();
        let update = [1.0];
        let targets = [0.0; 2];
        let mut scores = [3.0; 2];
        let mut grads = [7.0; 2];
        // c_pack fora do intervalo
        let mut data = ApplyUpdateBridge {
            c_scores: 1,
            c_pack: 65,
            c_samples: 2,
            update_tensor_scores: update.as_ptr(),
            c_update_bins: 1,
            targets: targets.as_ptr(),
            sample_scores: scores.as_mut_ptr(),
            gradients_and_hessians: grads.as_mut_ptr(),
            ..Default::default()
        };
        assert_eq!(unsafe { bound.apply_update_raw(&mut data) }, ERROR_ILLEGAL_PARAM_VAL);
        assert_eq!(unsafe { bound.apply_update_raw(std::ptr::null_mut()) }, ERROR_ILLEGAL_PARAM_VAL);
        assert_eq!(scores, [3.0; 2]);
        assert_eq!(grads, [7.0; 2]);
    }
}

#[test]
fn objective_mismatch_is_illegal_param() {
    let table = full_table();
    let bound = bind(&table, Zone::Cpu, Objective::Rmse.descriptor().unwrap()).unwrap();
    let mut wrapper = *bound.wrapper();
    wrapper.objective = 999;

    let update = [1.0];
    let targets = [0.0];
    let mut scores = [0.0];
    let mut data = ApplyUpdateBridge {
        c_scores: 1,
        validation: EBM_TRUE,
        c_samples: 1,
        update_tensor_scores: update.as_ptr(),
        c_update_bins: 1,
        targets: targets.as_ptr(),
        sample_scores: scores.as_mut_ptr(),
        ..Default::default()
    };
    let apply = wrapper.apply_update.unwrap();
    assert_eq!(unsafe { apply(&wrapper, &mut data) }, ERROR_ILLEGAL_PARAM_VAL);
    assert_eq!(scores, [0.0]);
}

#[test]
fn out_of_domain_targets_are_illegal_param_on_every_zone() {
    let table = full_table();
    let objective = Objective::LogLoss { classes: 3 };
    let descriptor = objective.descriptor().unwrap();
    let update = [1.0, 1.0, 1.0];

    for bad_target in [7.0, -1.0, f64::NAN, 0.5] {
        let targets = [0.0, 1.0, bad_target];
        for zone in Zone::ALL {
            let bound = bind(&table, zone, descriptor).unwrap();

            let mut scores = [0.0; 9];
            let mut grads = [2.0; 18];
            let err = bound
                .apply_update(&mut UpdateBuffers::training(&update, &targets, &mut scores, &mut grads, true))
                .unwrap_err();
            assert!(matches!(err, BridgeError::InvalidParameter(_)), "zona {}: {:?}", zone, err);
            assert_eq!(scores, [0.0; 9], "zona {}", zone);
            assert_eq!(grads, [2.0; 18], "zona {}", zone);

            let mut val_scores = [0.0; 9];
            let mut data = ApplyUpdateBridge {
                c_scores: 3,
                validation: EBM_TRUE,
                c_samples: 3,
                update_tensor_scores: update.as_ptr(),
                c_update_bins: 1,
                targets: targets.as_ptr(),
                sample_scores: val_scores.as_mut_ptr(),
                ..Default::default()
            };
            assert_eq!(unsafe { bound.apply_update_raw(&mut data) }, ERROR_ILLEGAL_PARAM_VAL, "zona {}", zone);
            assert_eq!(val_scores, [0.0; 9], "zona {}", zone);
        }
    }
}

#[test]
fn negative_poisson_target_is_illegal_param() {
    let table = full_table();
    let descriptor = Objective::PoissonDeviance.descriptor().unwrap();
    for zone in Zone::ALL {
        let bound = bind(&table, zone, descriptor).unwrap();
        let update = [0.5];
        let targets = [1.0, -2.0];
        let mut scores = [0.0; 2];
        let err = bound
            .apply_update(&mut UpdateBuffers::validation(&update, &targets, &mut scores))
            .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidParameter(_)));
        assert_eq!(scores, [0.0; 2], "zona {}", zone);
    }
}

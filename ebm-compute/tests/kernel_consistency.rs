//! Idempotência, consistência entre zonas e chamadas concorrentes

use ebm_bridge::{bind, BoundObjective, SymbolTable, UpdateBuffers, Zone};
use ebm_compute::{build_table, cross_zone_check, SyntheticProblem, METRIC_TOLERANCE};
use ebm_objective::Objective;

const OBJECTIVES: [Objective; 4] = [
    Objective::Rmse,
    Objective::BINARY_LOG_LOSS,
    Objective::LogLoss { classes: 4 },
    Objective::PoissonDeviance,
];

fn full_table() -> SymbolTable {
    build_table([ebm_zone_cpu::exports(), ebm_zone_simd::exports(), ebm_zone_offload::exports()]).unwrap()
}

fn bound(table: &SymbolTable, zone: Zone, objective: Objective) -> BoundObjective {
    bind(table, zone, objective.descriptor().unwrap()).unwrap()
}

#[test]
fn apply_update_is_idempotent_on_fresh_inputs() {
    let table = full_table();
    for objective in OBJECTIVES {
        let problem = SyntheticProblem::new(objective, 1_000).unwrap();
        for zone in Zone::ALL {
            let b = bound(&table, zone, objective);
            let first = problem.run(&b).unwrap();
            let second = problem.run(&b).unwrap();
            assert_eq!(first.scores, second.scores, "{} em {}", objective, zone);
            assert_eq!(first.gradients, second.gradients);
            assert_eq!(first.metric_sum.to_bits(), second.metric_sum.to_bits());
        }
    }
}

#[test]
fn zones_agree_with_baseline() {
    let table = full_table();
    for objective in OBJECTIVES {
        // atravessa mais de um bloco offload e deixa resto nas lanes SIMD
        let reports = cross_zone_check(&table, objective, ebm_zone_offload::BLOCK_SAMPLES + 13).unwrap();
        assert_eq!(reports[0].zone, Zone::Cpu);
        assert_eq!(reports[0].metric_rel_diff, 0.0);
        for report in &reports {
            assert_eq!(report.max_score_diff, 0.0, "{} em {}", objective, report.zone);
            assert_eq!(report.max_gradient_diff, 0.0, "{} em {}", objective, report.zone);
            assert!(
                report.metric_rel_diff <= METRIC_TOLERANCE,
                "{} em {}: {:e}",
                objective,
                report.zone,
                report.metric_rel_diff
            );
        }
    }
}

#[test]
fn validation_metric_matches_training_state() {
    // a métrica de validação reflete os scores já atualizados
    let table = full_table();
    let b = bound(&table, Zone::Simd, Objective::Rmse);
    let update = [0.5];
    let targets = vec![0.5; 9];
    let mut scores = vec![0.0; 9];
    let metric = b
        .apply_update(&mut UpdateBuffers::validation(&update, &targets, &mut scores))
        .unwrap();
    assert_eq!(metric, 0.0);
}

#[test]
fn empty_sample_set() {
    let table = full_table();
    for zone in Zone::ALL {
        let b = bound(&table, zone, Objective::Rmse);
        let update = [1.0];
        let mut scores: [f64; 0] = [];
        let metric = b
            .apply_update(&mut UpdateBuffers::validation(&update, &[], &mut scores))
            .unwrap();
        assert_eq!(metric, 0.0);
    }
}

/// Chamadas concorrentes com buffers disjuntos == chamadas sequenciais
#[test]
fn concurrent_disjoint_calls_match_sequential() {
    const SHARDS: usize = 4;
    const PER_SHARD: usize = 2_500;

    let table = full_table();
    for zone in Zone::ALL {
        let b = bound(&table, zone, Objective::BINARY_LOG_LOSS);
        let update = [0.3];
        let targets: Vec<f64> = (0..SHARDS * PER_SHARD).map(|i| (i % 2) as f64).collect();
        let initial: Vec<f64> = (0..SHARDS * PER_SHARD).map(|i| (i as f64 * 0.01).sin()).collect();

        let mut seq_scores = initial.clone();
        let mut seq_grads = vec![0.0; 2 * SHARDS * PER_SHARD];
        for ((t, s), g) in targets
            .chunks(PER_SHARD)
            .zip(seq_scores.chunks_mut(PER_SHARD))
            .zip(seq_grads.chunks_mut(2 * PER_SHARD))
        {
            b.apply_update(&mut UpdateBuffers::training(&update, t, s, g, true)).unwrap();
        }

        let mut par_scores = initial.clone();
        let mut par_grads = vec![0.0; 2 * SHARDS * PER_SHARD];
        std::thread::scope(|scope| {
            for ((t, s), g) in targets
                .chunks(PER_SHARD)
                .zip(par_scores.chunks_mut(PER_SHARD))
                .zip(par_grads.chunks_mut(2 * PER_SHARD))
            {
                let b = &b;
                let update = &update;
                scope.spawn(move || {
                    b.apply_update(&mut UpdateBuffers::training(update, t, s, g, true)).unwrap();
                });
            }
        });

        assert_eq!(par_scores, seq_scores, "zona {}", zone);
        assert_eq!(par_grads, seq_grads, "zona {}", zone);
    }
}

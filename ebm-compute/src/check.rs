//! # 🔬 Verificação cruzada entre zonas
//!
//! Roda o mesmo problema sintético (determinístico) em cada zona disponível e
//! compara com a baseline: scores e gradientes elemento a elemento, métrica
//! de validação por erro relativo.

use ebm_bridge::{bind, pack_bins, BoundObjective, SymbolTable, UpdateBuffers, Zone};
use ebm_objective::Objective;
use serde::Serialize;

use crate::error::{ComputeError, ComputeResult};

/// Tolerância relativa da métrica entre zonas
pub const METRIC_TOLERANCE: f64 = 1e-12;

/// Bins do feature sintético
const C_BINS: usize = 16;
/// 4 bits por bin
const C_PACK: usize = 16;

/// Problema sintético para uma rodada de treino e uma de validação
#[derive(Debug, Clone)]
pub struct SyntheticProblem {
    pub objective: Objective,
    pub c_samples: usize,
    pub update: Vec<f64>,
    pub packed: Vec<u64>,
    /// Bins por palavra em `packed`
    pub c_pack: usize,
    pub targets: Vec<f64>,
    pub weights: Vec<f64>,
    pub initial_scores: Vec<f64>,
}

/// Saída de uma zona sobre o problema
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneRun {
    pub scores: Vec<f64>,
    pub gradients: Vec<f64>,
    pub validation_scores: Vec<f64>,
    pub metric_sum: f64,
}

impl SyntheticProblem {
    pub fn new(objective: Objective, c_samples: usize) -> ComputeResult<Self> {
        let c_scores = objective.c_scores();
        let update = (0..C_BINS * c_scores)
            .map(|j| (j as f64 * 0.618).sin() * 0.1)
            .collect();
        let bins: Vec<usize> = (0..c_samples).map(|i| (i * 31 + 7) % C_BINS).collect();
        let packed = pack_bins(&bins, C_PACK)?;
        let targets: Vec<f64> = (0..c_samples)
            .map(|i| match objective {
                Objective::Rmse => (i as f64 * 0.37).sin() * 3.0,
                Objective::LogLoss { classes } => ((i * 7919) % classes) as f64,
                Objective::PoissonDeviance => (i % 5) as f64,
            })
            .collect();
        objective.check_targets(&targets)?;
        let weights = (0..c_samples).map(|i| 1.0 + (i % 3) as f64 * 0.5).collect();
        let initial_scores = (0..c_samples * c_scores)
            .map(|j| (j as f64 * 0.13).cos() * 0.1)
            .collect();
        Ok(Self { objective, c_samples, update, packed, c_pack: C_PACK, targets, weights, initial_scores })
    }

    /// Treino (com hessiana) seguido de validação ponderada
    pub fn run(&self, bound: &BoundObjective) -> ComputeResult<ZoneRun> {
        let c_scores = self.objective.c_scores();
        let mut scores = self.initial_scores.clone();
        let mut gradients = vec![0.0; self.c_samples * c_scores * 2];
        bound.apply_update(
            &mut UpdateBuffers::training(&self.update, &self.targets, &mut scores, &mut gradients, true)
                .with_packed(&self.packed, self.c_pack),
        )?;

        let mut validation_scores = self.initial_scores.clone();
        let metric_sum = bound.apply_update(
            &mut UpdateBuffers::validation(&self.update, &self.targets, &mut validation_scores)
                .with_packed(&self.packed, self.c_pack)
                .with_weights(&self.weights),
        )?;
        Ok(ZoneRun { scores, gradients, validation_scores, metric_sum })
    }
}

/// Divergência de uma zona em relação à baseline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneReport {
    pub zone: Zone,
    pub max_score_diff: f64,
    pub max_gradient_diff: f64,
    pub metric_sum: f64,
    pub metric_rel_diff: f64,
}

impl ZoneReport {
    pub fn is_consistent(&self) -> bool {
        self.max_score_diff == 0.0 && self.max_gradient_diff == 0.0 && self.metric_rel_diff <= METRIC_TOLERANCE
    }

    /// Converte divergência em erro
    pub fn ensure_consistent(&self) -> ComputeResult<()> {
        if self.is_consistent() {
            return Ok(());
        }
        Err(ComputeError::Divergence {
            zone: self.zone,
            detail: format!(
                "score {:e}, gradiente {:e}, métrica relativa {:e}",
                self.max_score_diff, self.max_gradient_diff, self.metric_rel_diff
            ),
        })
    }
}

fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max)
}

/// Roda o problema em todas as zonas disponíveis da tabela.
///
/// O primeiro relatório é sempre o da baseline (divergência zero).
pub fn cross_zone_check(table: &SymbolTable, objective: Objective, c_samples: usize) -> ComputeResult<Vec<ZoneReport>> {
    let problem = SyntheticProblem::new(objective, c_samples)?;
    let descriptor = objective.descriptor()?;

    let baseline = problem.run(&bind(table, Zone::BASELINE, descriptor)?)?;
    let mut reports = Vec::with_capacity(Zone::ALL.len());
    for zone in Zone::ALL.into_iter().filter(|z| table.is_available(*z)) {
        let run = if zone.is_baseline() {
            baseline.clone()
        } else {
            problem.run(&bind(table, zone, descriptor)?)?
        };
        let metric_rel_diff =
            (run.metric_sum - baseline.metric_sum).abs() / baseline.metric_sum.abs().max(f64::MIN_POSITIVE);
        let report = ZoneReport {
            zone,
            max_score_diff: max_abs_diff(&run.scores, &baseline.scores)
                .max(max_abs_diff(&run.validation_scores, &baseline.validation_scores)),
            max_gradient_diff: max_abs_diff(&run.gradients, &baseline.gradients),
            metric_sum: run.metric_sum,
            metric_rel_diff,
        };
        tracing::debug!(zone = %zone, rel = report.metric_rel_diff, "zona verificada");
        reports.push(report);
    }
    Ok(reports)
}

//! Kernel offload: upload, blocos na fila, download
//!
//! ```text
//! host scores ──upload──▶ staging ──par_chunks_mut(BLOCK)──▶ staging ──download──▶ host
//!                                   └─ métrica parcial por bloco, somada em ordem
//! ```
//!
//! Os buffers do chamador só são escritos no download, depois que todos os
//! blocos terminaram.

use ebm_bridge::{ApplyUpdateBridge, ApplyUpdateView, BridgeError, BridgeResult, ObjectiveWrapper, PackedBins};
use ebm_objective::Objective;
use rayon::prelude::*;

use crate::device;

/// Samples por bloco despachado
pub const BLOCK_SAMPLES: usize = 4096;

pub(crate) fn apply_update(wrapper: &ObjectiveWrapper, data: &mut ApplyUpdateBridge) -> BridgeResult<()> {
    let objective = Objective::from_wrapper(wrapper)?;
    // SAFETY: só é chamado pelo guard de `ApplyUpdate_offload`
    let view = unsafe { ApplyUpdateView::from_raw(wrapper, data)? };
    objective.check_targets(view.targets)?;
    let queue = device::queue().ok_or_else(|| BridgeError::Internal("fila offload indisponível".into()))?;

    let ApplyUpdateView {
        c_scores,
        hessian_needed,
        update,
        bins,
        targets,
        weights,
        sample_scores,
        gradients_and_hessians,
        ..
    } = view;
    let block = Block {
        objective,
        gradient_constant: wrapper.gradient_constant,
        c_scores,
        hessian_needed,
        update,
        bins,
        targets,
        weights,
    };

    let mut staged_scores = device::upload(sample_scores)?;
    let block_scores = BLOCK_SAMPLES * c_scores;

    data.metric_out = match gradients_and_hessians {
        Some(grads) => {
            let stride = block.stride();
            let mut staged_grads = device::allocate(grads.len())?;
            queue.install(|| {
                staged_scores
                    .par_chunks_mut(block_scores)
                    .zip(staged_grads.par_chunks_mut(BLOCK_SAMPLES * stride))
                    .enumerate()
                    .for_each(|(b, (scores, g))| block.train(b * BLOCK_SAMPLES, scores, g));
            });
            grads.copy_from_slice(&staged_grads);
            0.0
        }
        None => {
            let partials: Vec<f64> = queue.install(|| {
                staged_scores
                    .par_chunks_mut(block_scores)
                    .enumerate()
                    .map(|(b, scores)| block.validate(b * BLOCK_SAMPLES, scores))
                    .collect()
            });
            partials.iter().sum()
        }
    };
    sample_scores.copy_from_slice(&staged_scores);
    Ok(())
}

/// Entradas somente-leitura compartilhadas pelos blocos
struct Block<'a> {
    objective: Objective,
    gradient_constant: f64,
    c_scores: usize,
    hessian_needed: bool,
    update: &'a [f64],
    bins: PackedBins<'a>,
    targets: &'a [f64],
    weights: Option<&'a [f64]>,
}

impl Block<'_> {
    fn stride(&self) -> usize {
        self.c_scores * if self.hessian_needed { 2 } else { 1 }
    }

    #[inline]
    fn add_update(&self, i: usize, scores: &mut [f64]) {
        let bin = self.bins.bin(i);
        let delta = &self.update[bin * self.c_scores..(bin + 1) * self.c_scores];
        for (score, d) in scores.iter_mut().zip(delta) {
            *score += d;
        }
    }

    fn train(&self, first: usize, scores: &mut [f64], grads: &mut [f64]) {
        let stride = self.stride();
        for (j, (s, g)) in scores
            .chunks_exact_mut(self.c_scores)
            .zip(grads.chunks_exact_mut(stride))
            .enumerate()
        {
            let i = first + j;
            self.add_update(i, s);
            self.objective
                .write_gradients(s, self.targets[i], g, self.hessian_needed, self.gradient_constant);
        }
    }

    fn validate(&self, first: usize, scores: &mut [f64]) -> f64 {
        let mut metric = 0.0;
        for (j, s) in scores.chunks_exact_mut(self.c_scores).enumerate() {
            let i = first + j;
            self.add_update(i, s);
            let weight = self.weights.map_or(1.0, |w| w[i]);
            metric += weight * self.objective.sample_metric(s, self.targets[i]);
        }
        metric
    }
}

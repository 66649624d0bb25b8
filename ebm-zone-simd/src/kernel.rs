//! Kernel por lanes
//!
//! Samples processados em blocos de [`LANES`]. O update é carregado e somado
//! por bloco; a métrica é acumulada em somas parciais por lane e reduzida no
//! final. Gradientes e scores saem idênticos aos da zona escalar, só a ordem
//! de redução da métrica muda.
//!
//! Em x86_64 o loop de blocos é compilado uma segunda vez com AVX2
//! (`#[target_feature]`) e escolhido em runtime pela detecção da zona. Em
//! aarch64 NEON já faz parte do alvo base.

use ebm_bridge::{ApplyUpdateBridge, ApplyUpdateView, BridgeResult, ObjectiveWrapper};
use ebm_objective::Objective;

/// Largura do bloco (8 × f64 = um registrador AVX-512, dois AVX2)
pub const LANES: usize = 8;

pub(crate) fn apply_update(wrapper: &ObjectiveWrapper, data: &mut ApplyUpdateBridge) -> BridgeResult<()> {
    let objective = Objective::from_wrapper(wrapper)?;
    // SAFETY: só é chamado pelo guard de `ApplyUpdate_simd`
    let view = unsafe { ApplyUpdateView::from_raw(wrapper, data)? };
    objective.check_targets(view.targets)?;
    data.metric_out = dispatch(objective, wrapper.gradient_constant, view);
    Ok(())
}

fn dispatch(objective: Objective, gradient_constant: f64, view: ApplyUpdateView<'_>) -> f64 {
    #[cfg(target_arch = "x86_64")]
    {
        if crate::is_available() {
            // SAFETY: AVX2 detectado em runtime
            return unsafe { x86_avx2::run_avx2(objective, gradient_constant, view) };
        }
    }
    run(objective, gradient_constant, view)
}

#[inline(always)]
fn run(objective: Objective, gradient_constant: f64, view: ApplyUpdateView<'_>) -> f64 {
    if view.c_scores == 1 {
        run_single(objective, gradient_constant, view)
    } else {
        run_multi(objective, gradient_constant, view)
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// x86-64 AVX2
// ═════════════════════════════════════════════════════════════════════════════

#[cfg(target_arch = "x86_64")]
mod x86_avx2 {
    use super::*;

    /// Mesmo loop de blocos, gerado com AVX2 habilitado
    ///
    /// # Safety
    ///
    /// O processador precisa suportar AVX2.
    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn run_avx2(objective: Objective, gradient_constant: f64, view: ApplyUpdateView<'_>) -> f64 {
        run(objective, gradient_constant, view)
    }
}

/// Um score por sample: blocos contíguos de `LANES` scores
#[inline(always)]
fn run_single(objective: Objective, gradient_constant: f64, view: ApplyUpdateView<'_>) -> f64 {
    let ApplyUpdateView {
        hessian_needed,
        update,
        bins,
        targets,
        weights,
        sample_scores,
        mut gradients_and_hessians,
        ..
    } = view;
    let stride = if hessian_needed { 2 } else { 1 };

    let mut partial = [0.0f64; LANES];
    let mut delta = [0.0f64; LANES];
    for (block, scores) in sample_scores.chunks_mut(LANES).enumerate() {
        let base = block * LANES;
        let n = scores.len();

        for (lane, d) in delta[..n].iter_mut().enumerate() {
            *d = update[bins.bin(base + lane)];
        }
        for (score, d) in scores.iter_mut().zip(&delta[..n]) {
            *score += d;
        }

        match gradients_and_hessians.as_deref_mut() {
            Some(grads) => {
                let out = &mut grads[base * stride..(base + n) * stride];
                for (lane, (score, g)) in scores.iter().zip(out.chunks_exact_mut(stride)).enumerate() {
                    objective.write_gradients(
                        std::slice::from_ref(score),
                        targets[base + lane],
                        g,
                        hessian_needed,
                        gradient_constant,
                    );
                }
            }
            None => {
                for (lane, score) in scores.iter().enumerate() {
                    let i = base + lane;
                    let weight = weights.map_or(1.0, |w| w[i]);
                    partial[lane] += weight * objective.metric(*score, targets[i]);
                }
            }
        }
    }
    reduce(&partial)
}

/// Vários scores por sample: um sample por iteração, métrica na lane `i % LANES`
#[inline(always)]
fn run_multi(objective: Objective, gradient_constant: f64, view: ApplyUpdateView<'_>) -> f64 {
    let ApplyUpdateView {
        c_scores,
        hessian_needed,
        update,
        bins,
        targets,
        weights,
        sample_scores,
        mut gradients_and_hessians,
        ..
    } = view;
    let stride = c_scores * if hessian_needed { 2 } else { 1 };

    let mut partial = [0.0f64; LANES];
    for (i, scores) in sample_scores.chunks_exact_mut(c_scores).enumerate() {
        let bin = bins.bin(i);
        for (score, d) in scores.iter_mut().zip(&update[bin * c_scores..(bin + 1) * c_scores]) {
            *score += d;
        }
        match gradients_and_hessians.as_deref_mut() {
            Some(grads) => objective.write_gradients(
                scores,
                targets[i],
                &mut grads[i * stride..(i + 1) * stride],
                hessian_needed,
                gradient_constant,
            ),
            None => {
                let weight = weights.map_or(1.0, |w| w[i]);
                partial[i % LANES] += weight * objective.sample_metric(scores, targets[i]);
            }
        }
    }
    reduce(&partial)
}

/// Redução horizontal em árvore
#[inline]
fn reduce(partial: &[f64; LANES]) -> f64 {
    let mut half = [0.0f64; LANES / 2];
    for (h, (a, b)) in half.iter_mut().zip(partial[..LANES / 2].iter().zip(&partial[LANES / 2..])) {
        *h = a + b;
    }
    (half[0] + half[2]) + (half[1] + half[3])
}

//! Kernel escalar: um sample por vez, na ordem dos índices

use ebm_bridge::{ApplyUpdateBridge, ApplyUpdateView, BridgeResult, ObjectiveWrapper};
use ebm_objective::Objective;

pub(crate) fn apply_update(wrapper: &ObjectiveWrapper, data: &mut ApplyUpdateBridge) -> BridgeResult<()> {
    let objective = Objective::from_wrapper(wrapper)?;
    // SAFETY: só é chamado pelo guard de `ApplyUpdate_cpu`, cujo chamador
    // garante o contrato de ponteiros da fronteira
    let view = unsafe { ApplyUpdateView::from_raw(wrapper, data)? };
    // targets fora do domínio são erro de parâmetro, antes de qualquer escrita
    objective.check_targets(view.targets)?;
    data.metric_out = run(objective, wrapper.gradient_constant, view);
    Ok(())
}

pub(crate) fn finish_metric(wrapper: &ObjectiveWrapper, metric: f64) -> f64 {
    match Objective::from_wrapper(wrapper) {
        Ok(objective) => objective.finish_metric(metric),
        Err(_) => f64::NAN,
    }
}

/// Soma o update, depois escreve gradientes (treino) ou acumula a métrica
/// ponderada (validação).
fn run(objective: Objective, gradient_constant: f64, view: ApplyUpdateView<'_>) -> f64 {
    let ApplyUpdateView {
        c_scores,
        c_samples,
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

    let mut metric = 0.0;
    for i in 0..c_samples {
        let bin = bins.bin(i);
        let scores = &mut sample_scores[i * c_scores..(i + 1) * c_scores];
        for (score, delta) in scores.iter_mut().zip(&update[bin * c_scores..(bin + 1) * c_scores]) {
            *score += delta;
        }

        let target = targets[i];
        match gradients_and_hessians.as_deref_mut() {
            Some(grads) => objective.write_gradients(
                scores,
                target,
                &mut grads[i * stride..(i + 1) * stride],
                hessian_needed,
                gradient_constant,
            ),
            None => {
                let weight = weights.map_or(1.0, |w| w[i]);
                metric += weight * objective.sample_metric(scores, target);
            }
        }
    }
    metric
}

//! Termos por sample: gradiente, hessiana e métrica
//!
//! Funções puras e `#[inline]`, chamadas nos loops internos das zonas. Cada
//! zona escolhe como iterar (escalar, lanes, blocos paralelos); a matemática
//! por elemento é a mesma para todas.

/// Piso da hessiana em log loss, evita divisão por zero no passo de Newton
pub const HESSIAN_FLOOR: f64 = 1e-16;

#[inline]
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^x)` estável
#[inline]
pub fn softplus(x: f64) -> f64 {
    if x > 0.0 {
        x + (-x).exp().ln_1p()
    } else {
        x.exp().ln_1p()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  RMSE (link identidade)
// ═══════════════════════════════════════════════════════════════════════════

#[inline]
pub fn rmse_gradient(score: f64, target: f64) -> f64 {
    score - target
}

#[inline]
pub fn rmse_metric(score: f64, target: f64) -> f64 {
    let d = score - target;
    d * d
}

// ═══════════════════════════════════════════════════════════════════════════
//  Log loss binário (link logit)
// ═══════════════════════════════════════════════════════════════════════════

#[inline]
pub fn log_loss_gradient_hessian(score: f64, target: f64) -> (f64, f64) {
    let p = sigmoid(score);
    (p - target, (p * (1.0 - p)).max(HESSIAN_FLOOR))
}

/// `-[y ln p + (1-y) ln(1-p)]` com `p = sigmoid(score)`
#[inline]
pub fn log_loss_metric(score: f64, target: f64) -> f64 {
    softplus(score) - target * score
}

// ═══════════════════════════════════════════════════════════════════════════
//  Poisson deviance (link log)
// ═══════════════════════════════════════════════════════════════════════════

#[inline]
pub fn poisson_gradient_hessian(score: f64, target: f64) -> (f64, f64) {
    let mu = score.exp();
    (mu - target, mu)
}

/// `2 [y ln(y/mu) - (y - mu)]`, com `y ln y = 0` em `y = 0`
#[inline]
pub fn poisson_metric(score: f64, target: f64) -> f64 {
    let mu = score.exp();
    let ylogy = if target > 0.0 { target * (target.ln() - score) } else { 0.0 };
    2.0 * (ylogy - (target - mu))
}

// ═══════════════════════════════════════════════════════════════════════════
//  Log loss multiclasse (softmax)
// ═══════════════════════════════════════════════════════════════════════════

/// Escreve gradientes (e hessianas intercaladas) de um sample e devolve
/// `-ln p_target`.
///
/// `out` tem `scores.len()` elementos, ou `2 * scores.len()` com hessiana.
pub fn softmax_terms(scores: &[f64], target: usize, out: Option<&mut [f64]>, hessian: bool) -> f64 {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let sum_exp: f64 = scores.iter().map(|s| (s - max).exp()).sum();
    let log_sum_exp = max + sum_exp.ln();

    if let Some(out) = out {
        let stride = if hessian { 2 } else { 1 };
        for (k, &s) in scores.iter().enumerate() {
            let p = (s - log_sum_exp).exp();
            let y = if k == target { 1.0 } else { 0.0 };
            out[k * stride] = p - y;
            if hessian {
                out[k * stride + 1] = (p * (1.0 - p)).max(HESSIAN_FLOOR);
            }
        }
    }
    log_sum_exp - scores[target]
}

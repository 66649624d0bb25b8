//! Identidade do objetivo e seus metadados de fronteira

use std::fmt;
use std::str::FromStr;

use ebm_bridge::abi::{from_bool_ebm, LINK_IDENTITY, LINK_LOG, LINK_LOGIT, LINK_SOFTMAX};
use ebm_bridge::{LinkEbm, ObjectiveDescriptor, ObjectiveWrapper};
use serde::{Deserialize, Serialize};

use crate::error::{ObjectiveError, ObjectiveResult};
use crate::math;

/// Código de objetivo gravado no `ObjectiveWrapper`
pub mod codes {
    pub const RMSE: u32 = 1;
    pub const LOG_LOSS: u32 = 2;
    pub const POISSON_DEVIANCE: u32 = 3;
}

/// Objetivo de boosting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Objective {
    /// Regressão, métrica RMSE
    Rmse,
    /// Classificação; `classes == 2` usa um único score (logit)
    LogLoss { classes: usize },
    /// Regressão de contagens
    PoissonDeviance,
}

impl Objective {
    /// Log loss binário
    pub const BINARY_LOG_LOSS: Objective = Objective::LogLoss { classes: 2 };

    pub fn name(&self) -> &'static str {
        match self {
            Objective::Rmse => "rmse",
            Objective::LogLoss { .. } => "log_loss",
            Objective::PoissonDeviance => "poisson_deviance",
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            Objective::Rmse => codes::RMSE,
            Objective::LogLoss { .. } => codes::LOG_LOSS,
            Objective::PoissonDeviance => codes::POISSON_DEVIANCE,
        }
    }

    /// Scores por sample
    pub fn c_scores(&self) -> usize {
        match self {
            Objective::LogLoss { classes } if *classes > 2 => *classes,
            _ => 1,
        }
    }

    pub fn link(&self) -> LinkEbm {
        match self {
            Objective::Rmse => LINK_IDENTITY,
            Objective::LogLoss { classes } if *classes > 2 => LINK_SOFTMAX,
            Objective::LogLoss { .. } => LINK_LOGIT,
            Objective::PoissonDeviance => LINK_LOG,
        }
    }

    pub fn is_multiclass(&self) -> bool {
        self.c_scores() > 1
    }

    pub fn hessian_constant(&self) -> bool {
        matches!(self, Objective::Rmse)
    }

    /// Valida parâmetros (número de classes)
    pub fn validate(&self) -> ObjectiveResult<()> {
        match self {
            Objective::LogLoss { classes } if *classes < 2 => Err(ObjectiveError::InvalidParameter(
                format!("log_loss exige ao menos 2 classes, recebeu {}", classes),
            )),
            _ => Ok(()),
        }
    }

    /// Metadados gravados no wrapper pelo binding
    pub fn descriptor(&self) -> ObjectiveResult<ObjectiveDescriptor> {
        self.validate()?;
        Ok(ObjectiveDescriptor {
            objective: self.code(),
            link: self.link(),
            link_param: 0.0,
            c_scores: self.c_scores(),
            maximize_metric: false,
            hessian_constant: self.hessian_constant(),
            gradient_constant: 1.0,
        })
    }

    /// Reconstrói o objetivo a partir do wrapper (lado do kernel)
    pub fn from_wrapper(wrapper: &ObjectiveWrapper) -> ObjectiveResult<Objective> {
        let c_scores = wrapper.c_scores;
        let objective = match (wrapper.objective, c_scores) {
            (codes::RMSE, 1) => Objective::Rmse,
            (codes::LOG_LOSS, 1) => Objective::BINARY_LOG_LOSS,
            (codes::LOG_LOSS, n) if n > 2 => Objective::LogLoss { classes: n },
            (codes::POISSON_DEVIANCE, 1) => Objective::PoissonDeviance,
            (code, c_scores) => return Err(ObjectiveError::UnknownCode { code, c_scores }),
        };
        if objective.link() != wrapper.link {
            return Err(ObjectiveError::InvalidParameter(format!(
                "link {} não corresponde ao objetivo {}",
                wrapper.link,
                objective.name()
            )));
        }
        Ok(objective)
    }

    /// Gradiente e hessiana para objetivos de um score
    #[inline]
    pub fn gradient_hessian(&self, score: f64, target: f64) -> (f64, f64) {
        match self {
            Objective::Rmse => (math::rmse_gradient(score, target), 1.0),
            Objective::LogLoss { .. } => math::log_loss_gradient_hessian(score, target),
            Objective::PoissonDeviance => math::poisson_gradient_hessian(score, target),
        }
    }

    /// Métrica por sample para objetivos de um score
    #[inline]
    pub fn metric(&self, score: f64, target: f64) -> f64 {
        match self {
            Objective::Rmse => math::rmse_metric(score, target),
            Objective::LogLoss { .. } => math::log_loss_metric(score, target),
            Objective::PoissonDeviance => math::poisson_metric(score, target),
        }
    }

    /// Métrica de um sample com `c_scores` scores
    #[inline]
    pub fn sample_metric(&self, scores: &[f64], target: f64) -> f64 {
        if self.is_multiclass() {
            math::softmax_terms(scores, target as usize, None, false)
        } else {
            self.metric(scores[0], target)
        }
    }

    /// Escreve gradientes (e hessianas intercaladas) de um sample em `out`.
    ///
    /// `out` tem `c_scores` elementos, ou `2 * c_scores` com hessiana.
    #[inline]
    pub fn write_gradients(&self, scores: &[f64], target: f64, out: &mut [f64], hessian: bool, gradient_constant: f64) {
        if self.is_multiclass() {
            math::softmax_terms(scores, target as usize, Some(&mut *out), hessian);
        } else {
            let (g, h) = self.gradient_hessian(scores[0], target);
            out[0] = g;
            if hessian {
                out[1] = h;
            }
        }
        if gradient_constant != 1.0 {
            out.iter_mut().for_each(|v| *v *= gradient_constant);
        }
    }

    /// Transformação final de uma métrica já normalizada pelo peso total
    pub fn finish_metric(&self, metric_mean: f64) -> f64 {
        match self {
            Objective::Rmse => metric_mean.sqrt(),
            Objective::LogLoss { .. } | Objective::PoissonDeviance => metric_mean,
        }
    }

    /// Confere o domínio dos targets
    pub fn check_targets(&self, targets: &[f64]) -> ObjectiveResult<()> {
        for (index, &value) in targets.iter().enumerate() {
            if !value.is_finite() {
                return Err(ObjectiveError::InvalidTarget { index, value, reason: "não finito" });
            }
            match self {
                Objective::Rmse => {}
                Objective::LogLoss { classes } => {
                    if value < 0.0 || value.fract() != 0.0 || value as usize >= *classes {
                        return Err(ObjectiveError::InvalidTarget {
                            index,
                            value,
                            reason: "classe fora de 0..classes",
                        });
                    }
                }
                Objective::PoissonDeviance => {
                    if value < 0.0 {
                        return Err(ObjectiveError::InvalidTarget { index, value, reason: "negativo" });
                    }
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Objective::LogLoss { classes } if *classes > 2 => write!(f, "log_loss[{}]", classes),
            _ => f.write_str(self.name()),
        }
    }
}

impl FromStr for Objective {
    type Err = ObjectiveError;

    /// Aceita `rmse`, `log_loss`, `log_loss[3]` e `poisson_deviance`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if let Some(rest) = s.strip_prefix("log_loss[") {
            let classes = rest
                .strip_suffix(']')
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| ObjectiveError::UnknownObjective(s.clone()))?;
            let objective = Objective::LogLoss { classes };
            objective.validate()?;
            return Ok(objective);
        }
        match s.as_str() {
            "rmse" => Ok(Objective::Rmse),
            "log_loss" => Ok(Objective::BINARY_LOG_LOSS),
            "poisson_deviance" | "poisson" => Ok(Objective::PoissonDeviance),
            _ => Err(ObjectiveError::UnknownObjective(s)),
        }
    }
}

/// `true` se o wrapper pede maximização da métrica
pub fn maximize_metric(wrapper: &ObjectiveWrapper) -> bool {
    from_bool_ebm(wrapper.maximize_metric)
}

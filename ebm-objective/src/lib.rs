//! # 🎯 EBM-Objective
//!
//! Colaborador de objetivos consumido pelos kernels de zona: identidade do
//! objetivo, função de link, gradiente/hessiana/métrica por sample e a
//! transformação de FinishMetric. A ponte só transporta o código do objetivo
//! no `ObjectiveWrapper`; este crate dá significado a ele.
//!
//! | Objetivo | Link | Scores | FinishMetric |
//! |----------|------|--------|--------------|
//! | `rmse` | identidade | 1 | `sqrt` |
//! | `log_loss` | logit | 1 | identidade |
//! | `log_loss[k]` | softmax | k | identidade |
//! | `poisson_deviance` | log | 1 | identidade |

pub mod error;
pub mod math;
pub mod objective;

pub use error::{ObjectiveError, ObjectiveResult};
pub use objective::{codes, maximize_metric, Objective};

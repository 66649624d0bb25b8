//! # 🔁 Sessão de cálculo
//!
//! Fachada para o motor de boosting: dono do [`BoundObjective`] da zona
//! selecionada, sequencia rodadas de treino e finaliza métricas de validação
//! (normalizando pelo peso total antes do FinishMetric).
//!
//! FinishMetric só existe na baseline. Quando a zona selecionada não é a
//! baseline, a sessão liga o mesmo objetivo também à baseline e finaliza por
//! ela; se a baseline não estiver ligada, finalizar é
//! [`BridgeError::CapabilityAbsent`].

use ebm_bridge::{bind, BoundObjective, BridgeError, BridgeOp, SymbolTable, UpdateBuffers, Zone};
use ebm_objective::Objective;

use crate::config::ComputeConfig;
use crate::error::{ComputeError, ComputeResult};
use crate::registry;
use crate::selection::ZoneSelector;

#[derive(Debug, Clone)]
pub struct ComputeSession {
    objective: Objective,
    bound: BoundObjective,
    /// Binding da baseline para FinishMetric (zonas não baseline)
    finisher: Option<BoundObjective>,
    rounds: u64,
}

impl ComputeSession {
    /// Liga `objective` a `zone` na tabela informada
    pub fn new(table: &SymbolTable, zone: Zone, objective: Objective) -> ComputeResult<Self> {
        let descriptor = objective.descriptor()?;
        let bound = bind(table, zone, descriptor)?;
        let finisher = if zone.is_baseline() {
            None
        } else {
            match bind(table, Zone::BASELINE, descriptor) {
                Ok(b) => Some(b),
                Err(err) => {
                    tracing::debug!(zone = %zone, error = %err, "baseline não ligada, sem FinishMetric");
                    None
                }
            }
        };
        Ok(Self { objective, bound, finisher, rounds: 0 })
    }

    /// Seleciona a zona e o objetivo a partir da configuração
    pub fn from_config(config: &ComputeConfig) -> ComputeResult<Self> {
        let table = registry::linked_zones()?;
        let zone = ZoneSelector::new(table).select(&config.zone)?;
        let objective = config.objective()?;
        Self::new(table, zone, objective)
    }

    pub fn zone(&self) -> Zone {
        self.bound.zone()
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    pub fn bound(&self) -> &BoundObjective {
        &self.bound
    }

    /// Rodadas de treino aplicadas
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Pode finalizar métricas (baseline ligada)
    pub fn can_finish(&self) -> bool {
        self.bound.supports(BridgeOp::FinishMetric) || self.finisher.is_some()
    }

    pub fn check_targets(&self, targets: &[f64]) -> ComputeResult<()> {
        Ok(self.objective.check_targets(targets)?)
    }

    /// Aplica uma rodada de treino
    pub fn train_round(&mut self, buffers: &mut UpdateBuffers<'_>) -> ComputeResult<()> {
        if buffers.is_validation() {
            return Err(BridgeError::InvalidParameter("rodada de treino sem buffer de gradientes".into()).into());
        }
        self.bound.apply_update(buffers)?;
        self.rounds += 1;
        Ok(())
    }

    /// Aplica o update aos scores de validação e devolve a métrica finalizada
    pub fn validate(&self, buffers: &mut UpdateBuffers<'_>) -> ComputeResult<f64> {
        if !buffers.is_validation() {
            return Err(BridgeError::InvalidParameter("validação com buffer de gradientes".into()).into());
        }
        let total_weight = buffers
            .weights
            .map_or(buffers.targets.len() as f64, |w| w.iter().sum());
        // rejeitado antes da rodada: scores de validação ficam intactos
        check_total_weight(total_weight)?;
        let metric_sum = self.bound.apply_update(buffers)?;
        self.finish(metric_sum, total_weight)
    }

    /// Normaliza a soma ponderada e aplica FinishMetric
    pub fn finish(&self, metric_sum: f64, total_weight: f64) -> ComputeResult<f64> {
        check_total_weight(total_weight)?;
        let finisher = if self.bound.supports(BridgeOp::FinishMetric) {
            &self.bound
        } else {
            self.finisher.as_ref().ok_or(BridgeError::CapabilityAbsent {
                zone: self.zone(),
                op: BridgeOp::FinishMetric,
            })?
        };
        Ok(finisher.finish_metric(metric_sum / total_weight)?)
    }
}

fn check_total_weight(total_weight: f64) -> ComputeResult<()> {
    if total_weight > 0.0 && total_weight.is_finite() {
        Ok(())
    } else {
        Err(ComputeError::InvalidTotalWeight(total_weight))
    }
}

//! # 🎛️ Handle seguro sobre o `ObjectiveWrapper`
//!
//! [`BoundObjective`] é o dono do wrapper e expõe exatamente as capacidades
//! da zona ligada: apply-update sempre, finish-metric só na baseline. É
//! `Send + Sync` e somente-leitura; chamadas concorrentes com buffers
//! disjuntos não precisam de lock.

use crate::abi::{to_bool_ebm, ApplyUpdateBridge, ErrorEbm, ObjectiveWrapper, ERROR_ILLEGAL_PARAM_VAL};
use crate::error::{BridgeError, BridgeResult};
use crate::view::packed_word_count;
use crate::zone::{BridgeOp, Zone};

/// Buffers emprestados para uma chamada apply-update
#[derive(Debug)]
pub struct UpdateBuffers<'a> {
    /// `c_update_bins * c_scores`
    pub update: &'a [f64],
    /// Bins empacotados e `c_pack`; `None` = sem feature
    pub packed: Option<(&'a [u64], usize)>,
    pub targets: &'a [f64],
    pub weights: Option<&'a [f64]>,
    pub sample_scores: &'a mut [f64],
    /// `None` = validação
    pub gradients_and_hessians: Option<&'a mut [f64]>,
    pub hessian_needed: bool,
}

impl<'a> UpdateBuffers<'a> {
    /// Rodada de treino: atualiza scores e escreve gradientes (e hessianas)
    pub fn training(
        update: &'a [f64],
        targets: &'a [f64],
        sample_scores: &'a mut [f64],
        gradients_and_hessians: &'a mut [f64],
        hessian_needed: bool,
    ) -> Self {
        Self {
            update,
            packed: None,
            targets,
            weights: None,
            sample_scores,
            gradients_and_hessians: Some(gradients_and_hessians),
            hessian_needed,
        }
    }

    /// Rodada de validação: atualiza scores e acumula a métrica
    pub fn validation(update: &'a [f64], targets: &'a [f64], sample_scores: &'a mut [f64]) -> Self {
        Self {
            update,
            packed: None,
            targets,
            weights: None,
            sample_scores,
            gradients_and_hessians: None,
            hessian_needed: false,
        }
    }

    pub fn with_packed(mut self, words: &'a [u64], c_pack: usize) -> Self {
        self.packed = Some((words, c_pack));
        self
    }

    pub fn with_weights(mut self, weights: &'a [f64]) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn is_validation(&self) -> bool {
        self.gradients_and_hessians.is_none()
    }

    /// Confere comprimentos dos slices contra `c_scores`
    fn check_shapes(&self, c_scores: usize) -> BridgeResult<()> {
        let c_samples = self.targets.len();
        if self.update.is_empty() || self.update.len() % c_scores != 0 {
            return Err(invalid(format!(
                "update com {} valores não é múltiplo de c_scores={}",
                self.update.len(),
                c_scores
            )));
        }
        if self.sample_scores.len() != c_samples * c_scores {
            return Err(invalid(format!(
                "sample_scores tem {} valores, esperado {}",
                self.sample_scores.len(),
                c_samples * c_scores
            )));
        }
        if let Some(w) = self.weights {
            if w.len() != c_samples {
                return Err(invalid(format!("weights tem {} valores, esperado {}", w.len(), c_samples)));
            }
        }
        if let Some(g) = &self.gradients_and_hessians {
            let expected = c_samples * c_scores * if self.hessian_needed { 2 } else { 1 };
            if g.len() != expected {
                return Err(invalid(format!(
                    "gradients_and_hessians tem {} valores, esperado {}",
                    g.len(),
                    expected
                )));
            }
        }
        if let Some((words, c_pack)) = self.packed {
            if c_pack == 0 || c_pack > crate::view::MAX_ITEMS_PER_PACK {
                return Err(invalid(format!("c_pack inválido: {}", c_pack)));
            }
            let expected = packed_word_count(c_samples, c_pack);
            if words.len() != expected {
                return Err(invalid(format!("packed tem {} palavras, esperado {}", words.len(), expected)));
            }
        }
        Ok(())
    }

    /// Monta a estrutura de transferência apontando para os slices
    fn to_bridge(&mut self, c_scores: usize) -> ApplyUpdateBridge {
        let (packed, c_pack) = match self.packed {
            Some((words, c_pack)) => (words.as_ptr(), c_pack as i32),
            None => (std::ptr::null(), 0),
        };
        let validation = self.is_validation();
        ApplyUpdateBridge {
            c_scores,
            c_pack,
            hessian_needed: to_bool_ebm(self.hessian_needed && !validation),
            validation: to_bool_ebm(validation),
            c_samples: self.targets.len(),
            update_tensor_scores: self.update.as_ptr(),
            c_update_bins: self.update.len() / c_scores,
            packed,
            targets: self.targets.as_ptr(),
            weights: self.weights.map_or(std::ptr::null(), <[f64]>::as_ptr),
            sample_scores: self.sample_scores.as_mut_ptr(),
            gradients_and_hessians: self
                .gradients_and_hessians
                .as_deref_mut()
                .map_or(std::ptr::null_mut(), <[f64]>::as_mut_ptr),
            metric_out: 0.0,
        }
    }
}

fn invalid(msg: String) -> BridgeError {
    BridgeError::InvalidParameter(msg)
}

/// Objetivo ligado a uma zona
#[derive(Debug, Clone)]
pub struct BoundObjective {
    zone: Zone,
    wrapper: ObjectiveWrapper,
}

impl BoundObjective {
    pub(crate) fn new(zone: Zone, wrapper: ObjectiveWrapper) -> Self {
        Self { zone, wrapper }
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    /// Wrapper cru, para passar pela fronteira C
    pub fn wrapper(&self) -> &ObjectiveWrapper {
        &self.wrapper
    }

    pub fn c_scores(&self) -> usize {
        self.wrapper.c_scores
    }

    /// Verifica se a operação está disponível neste wrapper
    pub fn supports(&self, op: BridgeOp) -> bool {
        match op {
            BridgeOp::ApplyUpdate => self.wrapper.apply_update.is_some(),
            BridgeOp::FinishMetric => self.wrapper.finish_metric.is_some(),
        }
    }

    /// Aplica uma rodada pela zona ligada.
    ///
    /// Shapes são conferidos antes da chamada; nada é mutado se falharem.
    /// Devolve `metric_out` (soma ponderada em validação, 0 em treino).
    pub fn apply_update(&self, buffers: &mut UpdateBuffers<'_>) -> BridgeResult<f64> {
        buffers.check_shapes(self.wrapper.c_scores)?;
        let mut data = buffers.to_bridge(self.wrapper.c_scores);
        // SAFETY: `data` aponta para slices emprestados de `buffers`, com
        // tamanhos conferidos acima e vivos durante a chamada
        let code = unsafe { self.apply_update_raw(&mut data) };
        BridgeError::check(code, self.zone)?;
        Ok(data.metric_out)
    }

    /// Chama o ponto de entrada da zona diretamente.
    ///
    /// # Safety
    ///
    /// `data` deve satisfazer o contrato de
    /// [`ApplyUpdateView::from_raw`](crate::view::ApplyUpdateView::from_raw).
    pub unsafe fn apply_update_raw(&self, data: *mut ApplyUpdateBridge) -> ErrorEbm {
        match self.wrapper.apply_update {
            Some(f) => unsafe { f(&self.wrapper, data) },
            None => ERROR_ILLEGAL_PARAM_VAL,
        }
    }

    /// Finaliza uma métrica já normalizada pelo peso total.
    ///
    /// Fora da zona baseline devolve [`BridgeError::CapabilityAbsent`]; nunca
    /// recorre à implementação de outra zona.
    pub fn finish_metric(&self, metric_sum: f64) -> BridgeResult<f64> {
        let f = self.wrapper.finish_metric.ok_or(BridgeError::CapabilityAbsent {
            zone: self.zone,
            op: BridgeOp::FinishMetric,
        })?;
        // SAFETY: wrapper pertence a self e vive durante a chamada
        let value = unsafe { f(&self.wrapper, metric_sum) };
        if value.is_nan() && !metric_sum.is_nan() {
            return Err(BridgeError::Internal(format!(
                "FinishMetric da zona '{}' devolveu NaN",
                self.zone
            )));
        }
        Ok(value)
    }
}

//! # 🔍 Vista validada do `ApplyUpdateBridge`
//!
//! Kernels recebem ponteiros crus. Antes de tocar qualquer buffer, cada zona
//! constrói um [`ApplyUpdateView`], que confere contagens, ponteiros e bins
//! empacotados e só então expõe slices seguros. Toda falha aqui é
//! `IllegalParamVal` e acontece antes de qualquer mutação.
//!
//! ## Empacotamento de bins
//!
//! `c_pack` bins por palavra de 64 bits, `64 / c_pack` bits por bin, bin do
//! sample `i` no item `i % c_pack` da palavra `i / c_pack` (bits baixos
//! primeiro). `c_pack == 0` significa "sem feature": todo sample usa o bin 0.

use std::slice;

use crate::abi::{from_bool_ebm, ApplyUpdateBridge, ObjectiveWrapper};
use crate::error::{BridgeError, BridgeResult};

/// Máximo de bins por palavra (1 bit por bin)
pub const MAX_ITEMS_PER_PACK: usize = 64;

/// Bits por bin para um `c_pack`
#[inline]
pub const fn bits_per_item(c_pack: usize) -> usize {
    if c_pack == 0 { 0 } else { 64 / c_pack }
}

/// Palavras necessárias para `c_samples` bins
#[inline]
pub const fn packed_word_count(c_samples: usize, c_pack: usize) -> usize {
    if c_pack == 0 { 0 } else { c_samples.div_ceil(c_pack) }
}

/// Empacota índices de bin em palavras de 64 bits
pub fn pack_bins(bins: &[usize], c_pack: usize) -> BridgeResult<Vec<u64>> {
    if c_pack == 0 || c_pack > MAX_ITEMS_PER_PACK {
        return Err(BridgeError::InvalidParameter(format!(
            "c_pack fora de 1..={}: {}",
            MAX_ITEMS_PER_PACK, c_pack
        )));
    }
    let bits = bits_per_item(c_pack);
    let limit: u128 = 1u128 << bits;

    let mut words = vec![0u64; packed_word_count(bins.len(), c_pack)];
    for (i, &bin) in bins.iter().enumerate() {
        if bin as u128 >= limit {
            return Err(BridgeError::InvalidParameter(format!(
                "bin {} não cabe em {} bits",
                bin, bits
            )));
        }
        words[i / c_pack] |= (bin as u64) << ((i % c_pack) * bits);
    }
    Ok(words)
}

/// Bins empacotados de um feature
#[derive(Debug, Clone, Copy)]
pub struct PackedBins<'a> {
    words: &'a [u64],
    c_pack: usize,
    bits: usize,
    mask: u64,
}

impl<'a> PackedBins<'a> {
    /// Sem feature: todo sample no bin 0
    pub const fn none() -> Self {
        Self { words: &[], c_pack: 0, bits: 0, mask: 0 }
    }

    pub fn new(words: &'a [u64], c_pack: usize) -> Self {
        let bits = bits_per_item(c_pack);
        let mask = if bits >= 64 { u64::MAX } else if bits == 0 { 0 } else { (1u64 << bits) - 1 };
        Self { words, c_pack, bits, mask }
    }

    pub fn c_pack(&self) -> usize {
        self.c_pack
    }

    pub fn words(&self) -> &'a [u64] {
        self.words
    }

    /// Bin do sample `i`
    #[inline]
    pub fn bin(&self, i: usize) -> usize {
        if self.c_pack == 0 {
            return 0;
        }
        let word = self.words[i / self.c_pack];
        ((word >> ((i % self.c_pack) * self.bits)) & self.mask) as usize
    }

    /// Maior bin entre os primeiros `c_samples`
    pub fn max_bin(&self, c_samples: usize) -> usize {
        (0..c_samples).map(|i| self.bin(i)).max().unwrap_or(0)
    }
}

/// Vista segura de uma chamada ApplyUpdate
pub struct ApplyUpdateView<'a> {
    pub c_scores: usize,
    pub c_samples: usize,
    pub hessian_needed: bool,
    pub validation: bool,
    /// `c_update_bins * c_scores`
    pub update: &'a [f64],
    pub bins: PackedBins<'a>,
    pub targets: &'a [f64],
    pub weights: Option<&'a [f64]>,
    /// `c_samples * c_scores`
    pub sample_scores: &'a mut [f64],
    /// `None` em validação
    pub gradients_and_hessians: Option<&'a mut [f64]>,
}

impl<'a> ApplyUpdateView<'a> {
    /// Valida `data` contra `wrapper` e constrói a vista.
    ///
    /// # Safety
    ///
    /// Os ponteiros não nulos de `data` devem apontar para buffers com pelo
    /// menos os tamanhos implicados pelas contagens, vivos durante `'a`, e os
    /// buffers mutáveis não podem se sobrepor a nenhum outro buffer.
    pub unsafe fn from_raw(wrapper: &ObjectiveWrapper, data: &ApplyUpdateBridge) -> BridgeResult<Self> {
        let c_scores = data.c_scores;
        if c_scores == 0 {
            return Err(invalid("c_scores deve ser >= 1"));
        }
        if c_scores != wrapper.c_scores {
            return Err(invalid(format!(
                "c_scores {} difere do objetivo ligado ({})",
                c_scores, wrapper.c_scores
            )));
        }
        if data.c_pack < 0 || data.c_pack as usize > MAX_ITEMS_PER_PACK {
            return Err(invalid(format!("c_pack inválido: {}", data.c_pack)));
        }
        let c_pack = data.c_pack as usize;
        let c_samples = data.c_samples;
        let validation = from_bool_ebm(data.validation);
        let hessian_needed = from_bool_ebm(data.hessian_needed) && !validation;

        if data.update_tensor_scores.is_null() || data.c_update_bins == 0 {
            return Err(invalid("update_tensor_scores ausente"));
        }
        let c_update = checked(data.c_update_bins, c_scores)?;
        let c_sample_scores = checked(c_samples, c_scores)?;
        let c_grad = checked(c_sample_scores, if hessian_needed { 2 } else { 1 })?;

        if c_samples > 0 {
            if data.sample_scores.is_null() {
                return Err(invalid("sample_scores ausente"));
            }
            if data.targets.is_null() {
                return Err(invalid("targets ausente"));
            }
            if !validation && data.gradients_and_hessians.is_null() {
                return Err(invalid("gradients_and_hessians ausente em treino"));
            }
            if c_pack > 0 && data.packed.is_null() {
                return Err(invalid("packed ausente com c_pack > 0"));
            }
        }

        // SAFETY: contrato do chamador, ver doc
        let update = unsafe { slice::from_raw_parts(data.update_tensor_scores, c_update) };
        let bins = if c_pack == 0 || c_samples == 0 {
            PackedBins::none()
        } else {
            let words = unsafe { slice::from_raw_parts(data.packed, packed_word_count(c_samples, c_pack)) };
            PackedBins::new(words, c_pack)
        };
        let max_bin = bins.max_bin(c_samples);
        if max_bin >= data.c_update_bins {
            return Err(invalid(format!(
                "bin {} fora do tensor de update ({} bins)",
                max_bin, data.c_update_bins
            )));
        }

        let (targets, weights, sample_scores, gradients_and_hessians) = if c_samples == 0 {
            (<&[f64]>::default(), None, <&mut [f64]>::default(), None)
        } else {
            let targets = unsafe { slice::from_raw_parts(data.targets, c_samples) };
            let weights = if data.weights.is_null() {
                None
            } else {
                Some(unsafe { slice::from_raw_parts(data.weights, c_samples) })
            };
            let scores = unsafe { slice::from_raw_parts_mut(data.sample_scores, c_sample_scores) };
            let grads = if validation {
                None
            } else {
                Some(unsafe { slice::from_raw_parts_mut(data.gradients_and_hessians, c_grad) })
            };
            (targets, weights, scores, grads)
        };

        Ok(Self {
            c_scores,
            c_samples,
            hessian_needed,
            validation,
            update,
            bins,
            targets,
            weights,
            sample_scores,
            gradients_and_hessians,
        })
    }

    /// Peso do sample `i`
    #[inline]
    pub fn weight(&self, i: usize) -> f64 {
        self.weights.map_or(1.0, |w| w[i])
    }

    /// Elementos de gradiente por sample
    #[inline]
    pub fn gradient_stride(&self) -> usize {
        self.c_scores * if self.hessian_needed { 2 } else { 1 }
    }

    /// Fatia do update para o bin `bin`
    #[inline]
    pub fn update_for_bin(&self, bin: usize) -> &[f64] {
        &self.update[bin * self.c_scores..(bin + 1) * self.c_scores]
    }
}

fn invalid(msg: impl Into<String>) -> BridgeError {
    BridgeError::InvalidParameter(msg.into())
}

fn checked(a: usize, b: usize) -> BridgeResult<usize> {
    a.checked_mul(b)
        .ok_or_else(|| invalid(format!("overflow em {} * {}", a, b)))
}

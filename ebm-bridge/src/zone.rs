//! # 🗺️ Zonas: identidade de compilação dos kernels
//!
//! Cada zona é uma variante de kernel compilada separadamente (escalar,
//! vetorizada, offload). O nome exportado de cada operação da ponte é
//! qualificado pela zona:
//!
//! ```text
//! ApplyUpdate  + cpu      →  ApplyUpdate_cpu
//! ApplyUpdate  + simd     →  ApplyUpdate_simd
//! FinishMetric + cpu      →  FinishMetric_cpu
//! ```
//!
//! O nome é produzido duas vezes: em tempo de compilação pela macro
//! [`zoned_c_function_name!`](crate::zoned_c_function_name) (usada no
//! `export_name` dos símbolos) e em runtime por [`Zone::symbol_name`] (usado
//! no lookup). As duas formas precisam coincidir byte a byte.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BridgeError;

/// Identificador numérico estável de zona (cruza a fronteira C)
pub type ZoneId = u32;

/// Separador entre nome lógico e nome da zona
pub const ZONE_SEPARATOR: &str = "_";

/// Produz o nome de símbolo qualificado por zona em tempo de compilação.
///
/// ```
/// assert_eq!(ebm_bridge::zoned_c_function_name!(ApplyUpdate, "cpu"), "ApplyUpdate_cpu");
/// ```
#[macro_export]
macro_rules! zoned_c_function_name {
    ($function:ident, $zone:literal) => {
        concat!(stringify!($function), "_", $zone)
    };
}

/// Zona de compilação
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    /// Kernel escalar de referência (única zona com FinishMetric)
    Cpu,
    /// Kernel vetorizado por lanes
    Simd,
    /// Kernel com offload para dispositivo
    Offload,
}

impl Zone {
    /// Zona baseline
    pub const BASELINE: Zone = Zone::Cpu;

    /// Todas as zonas conhecidas, em ordem de id
    pub const ALL: [Zone; 3] = [Zone::Cpu, Zone::Simd, Zone::Offload];

    /// Nome usado no sufixo dos símbolos
    pub const fn name(self) -> &'static str {
        match self {
            Zone::Cpu => "cpu",
            Zone::Simd => "simd",
            Zone::Offload => "offload",
        }
    }

    /// Id estável gravado no `ObjectiveWrapper`
    pub const fn id(self) -> ZoneId {
        match self {
            Zone::Cpu => 0,
            Zone::Simd => 1,
            Zone::Offload => 2,
        }
    }

    /// Inverso de [`Zone::id`]
    pub const fn from_id(id: ZoneId) -> Option<Zone> {
        match id {
            0 => Some(Zone::Cpu),
            1 => Some(Zone::Simd),
            2 => Some(Zone::Offload),
            _ => None,
        }
    }

    pub const fn is_baseline(self) -> bool {
        matches!(self, Zone::Cpu)
    }

    /// Verifica se a zona declara a operação
    pub const fn supports(self, op: BridgeOp) -> bool {
        match op {
            BridgeOp::ApplyUpdate => true,
            BridgeOp::FinishMetric => self.is_baseline(),
        }
    }

    /// Operações que o binding exige resolver para esta zona
    pub fn required_ops(self) -> &'static [BridgeOp] {
        if self.is_baseline() {
            &[BridgeOp::ApplyUpdate, BridgeOp::FinishMetric]
        } else {
            &[BridgeOp::ApplyUpdate]
        }
    }

    /// Nome exportado de `op` nesta zona (espelho runtime da macro)
    pub fn symbol_name(self, op: BridgeOp) -> String {
        format!("{}{}{}", op.logical_name(), ZONE_SEPARATOR, self.name())
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Zone {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Zone::ALL
            .into_iter()
            .find(|z| z.name().eq_ignore_ascii_case(needle))
            .ok_or_else(|| BridgeError::UnknownZone(s.to_string()))
    }
}

/// Operação lógica da ponte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BridgeOp {
    /// Aplica o update de uma rodada de boosting
    ApplyUpdate,
    /// Finaliza a métrica acumulada
    FinishMetric,
}

impl BridgeOp {
    pub const ALL: [BridgeOp; 2] = [BridgeOp::ApplyUpdate, BridgeOp::FinishMetric];

    /// Nome lógico (prefixo do símbolo)
    pub const fn logical_name(self) -> &'static str {
        match self {
            BridgeOp::ApplyUpdate => "ApplyUpdate",
            BridgeOp::FinishMetric => "FinishMetric",
        }
    }
}

impl fmt::Display for BridgeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.logical_name())
    }
}

/// Igualdade de strings avaliável em `const`.
///
/// Usada pela macro de export para garantir, em tempo de compilação, que o
/// literal de zona bate com [`Zone::name`].
pub const fn const_str_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

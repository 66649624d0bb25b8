//! # 🧮 EBM-Compute
//!
//! Superfície do motor sobre a ponte por zonas: quais zonas estão ligadas ao
//! binário (features `cpu`, `simd`, `offload`), qual delas usar
//! (configuração + detecção de capacidade) e uma sessão que sequencia
//! rodadas e finaliza métricas.
//!
//! ```text
//! ComputeConfig ──▶ ZoneSelector ──▶ ComputeSession ──▶ BoundObjective ──▶ ApplyUpdate_<zona>
//!  (TOML + env)     (auto/explícito)                                       FinishMetric_cpu
//! ```
//!
//! ## Exemplo
//!
//! ```no_run
//! use ebm_compute::{ComputeConfig, ComputeSession};
//!
//! let config = ComputeConfig::load(None)?;
//! let session = ComputeSession::from_config(&config)?;
//! println!("zona: {}", session.zone());
//! # Ok::<(), ebm_compute::ComputeError>(())
//! ```

pub mod check;
pub mod config;
pub mod error;
pub mod registry;
pub mod selection;
pub mod session;

pub use check::{cross_zone_check, SyntheticProblem, ZoneReport, METRIC_TOLERANCE};
pub use config::{ComputeConfig, ObjectiveConfig, ZoneConfig, ZoneSelection};
pub use error::{ComputeError, ComputeResult, ConfigError};
pub use registry::{available_zones, build_table, linked_exports, linked_zones, ZoneInfo};
pub use selection::{ZoneSelector, AUTO_PREFERENCE};
pub use session::ComputeSession;

pub use ebm_bridge::Zone;
pub use ebm_objective::Objective;

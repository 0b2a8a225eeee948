//! On-device cycle inference and prediction.
//!
//! Turns a sparse history of daily logs into inferred period starts, an
//! average cycle length, per-day phase classification and symptom/phase
//! correlations. Every computation is a pure function of a [`LogHistory`]
//! snapshot plus [`EngineConfig`]; [`CycleEngine`] adds a fingerprint-keyed
//! cache on top.

pub mod config;
pub mod detection;
pub mod engine;
pub mod error;
pub mod history;
pub mod insights;
pub mod logging;
pub mod models;
pub mod phase;
pub mod prediction;
pub mod projection;

pub use config::EngineConfig;
pub use detection::detect_period_starts;
pub use engine::{CycleEngine, Fingerprint};
pub use error::{CycleError, Result};
pub use history::{FlowLevel, LogEntry, LogHistory};
pub use insights::{analyze_symptom_correlations, build_insights};
pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
pub use models::*;
pub use phase::classify_day;
pub use prediction::compute_cycle_stats;
pub use projection::{project_period_days, PeriodWindow};

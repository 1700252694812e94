//! Vectorised simulation of a position signal against a return series, and
//! the performance summary derived from it.

pub mod core;
pub mod metrics;
pub mod models;
pub mod report;

pub use crate::core::{SimulationError, simulate};
pub use metrics::{DEFAULT_PERIODS_PER_YEAR, evaluate};
pub use models::{CumulativeCurves, PerformanceMetrics, SimulationResult};
pub use report::{generate_json_report, generate_text_report};

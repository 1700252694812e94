//! Moving-average crossover backtester.
//!
//! The pipeline is a chain of pure functions:
//! load prices -> prepare signals -> simulate -> evaluate, and the optimiser
//! repeats it for every (short, long) window pair of a grid. [`Backtester`]
//! wraps the chain in an explicit, versioned state for callers that want the
//! step-by-step method surface.
//!
//! # Modules
//!
//! - `config` - TOML configuration with serde defaults
//! - `error` - error taxonomy (data, parameter, state)
//! - `signals` - window parameters and SMA crossover signal preparation
//! - `strategy` - one full pipeline pass for a parameter pair
//! - `backtester` - stateful facade over the pipeline
//! - `optimizer` - exhaustive grid sweep over window pairs
//! - `visualization` - chart rendering of the cumulative return curves
//! - `report` - result files

pub mod backtester;
pub mod config;
pub mod error;
pub mod optimizer;
pub mod report;
pub mod signals;
pub mod strategy;
pub mod visualization;

pub use backtester::{BacktestConfig, BacktestState, Backtester};
pub use config::AppConfig;
pub use error::{BacktestError, ParameterError, Result, StateError};
pub use optimizer::{GridPoint, OptimizationResult, ParamRange, optimize_parameters};
pub use signals::{Parameters, SignalFrame, prepare_signals};
pub use strategy::{evaluate_parameters, run_strategy};
pub use visualization::{PngChart, ResultRenderer};

pub use backtesting::{CumulativeCurves, PerformanceMetrics, SimulationResult};
pub use smalab::core::io::{DataError, PriceSeries, TableSpec};

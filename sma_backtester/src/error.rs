//! Error taxonomy.
//!
//! - [`DataError`]: missing, malformed or insufficient input
//! - [`ParameterError`]: invalid window sizes or ranges
//! - [`StateError`]: an operation called out of order
//!
//! Undefined statistics (zero variance, empty window) are not errors; they
//! come back as NaN in the metrics.

use backtesting::SimulationError;
use smalab::core::io::DataError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("{name} window must be positive")]
    ZeroWindow { name: &'static str },

    #[error("{name} window {window} exceeds series length {len}")]
    WindowTooLong {
        name: &'static str,
        window: usize,
        len: usize,
    },

    #[error("range step must be positive")]
    ZeroStep,

    #[error("range start {start} is after stop {stop}")]
    EmptyRange { start: usize, stop: usize },

    #[error("explicit range has no values")]
    NoValues,

    #[error("cannot parse range '{0}' (expected start:stop[:step] or a comma-separated list)")]
    InvalidRange(String),

    #[error("periods_per_year must be a positive number, got {0}")]
    PeriodsPerYear(f64),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("no price series loaded; call load() first")]
    NotLoaded,

    #[error("signals have not been prepared; call prepare_signals() first")]
    SignalsNotPrepared,

    #[error(
        "signals were prepared for parameter version {prepared} but the active version is {active}; call prepare_signals() again"
    )]
    StaleSignals { prepared: u64, active: u64 },

    #[error("signals are not aligned with the price series ({signals} signals, {prices} prices)")]
    Misaligned { signals: usize, prices: usize },

    #[error("no backtest results yet; call run_backtest() first")]
    NoResults,
}

impl From<SimulationError> for StateError {
    fn from(err: SimulationError) -> Self {
        match err {
            SimulationError::LengthMismatch {
                returns, positions, ..
            } => StateError::Misaligned {
                signals: positions,
                prices: returns,
            },
        }
    }
}

#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("parameter error: {0}")]
    Parameter(#[from] ParameterError),

    #[error("state error: {0}")]
    State(#[from] StateError),
}

pub type Result<T> = std::result::Result<T, BacktestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_mismatch_is_state_error() {
        let err: StateError = SimulationError::LengthMismatch {
            dates: 5,
            returns: 5,
            positions: 4,
        }
        .into();
        assert_eq!(
            err,
            StateError::Misaligned {
                signals: 4,
                prices: 5
            }
        );
    }

    #[test]
    fn test_messages() {
        let err = BacktestError::from(StateError::StaleSignals {
            prepared: 1,
            active: 2,
        });
        assert!(err.to_string().starts_with("state error: signals were prepared"));

        let err = BacktestError::from(ParameterError::ZeroWindow { name: "SMA_S" });
        assert_eq!(err.to_string(), "parameter error: SMA_S window must be positive");
    }
}

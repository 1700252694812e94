use crate::error::ParameterError;
use indicators::{Position, crossover_positions, moving_average, warmup};
use serde::{Deserialize, Serialize};
use smalab::core::io::PriceSeries;
use std::fmt;
use tracing::debug;

/// Short and long moving-average windows.
///
/// `short < long` is the usual set-up but is not required; a pair with
/// `short >= long` still produces a (mirrored) signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Parameters {
    pub short: usize,
    pub long: usize,
}

impl Parameters {
    pub fn new(short: usize, long: usize) -> Result<Self, ParameterError> {
        let params = Self { short, long };
        params.validate()?;
        Ok(params)
    }

    /// Copy with either window replaced.
    pub fn with(self, short: Option<usize>, long: Option<usize>) -> Result<Self, ParameterError> {
        Self::new(short.unwrap_or(self.short), long.unwrap_or(self.long))
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        if self.short == 0 {
            return Err(ParameterError::ZeroWindow { name: "SMA_S" });
        }
        if self.long == 0 {
            return Err(ParameterError::ZeroWindow { name: "SMA_L" });
        }
        Ok(())
    }

    /// Check both windows fit into a series of `len` observations.
    pub fn validate_for_len(&self, len: usize) -> Result<(), ParameterError> {
        self.validate()?;
        for (name, window) in [("SMA_S", self.short), ("SMA_L", self.long)] {
            if window > len {
                return Err(ParameterError::WindowTooLong { name, window, len });
            }
        }
        Ok(())
    }

    /// The longer of the two windows; it decides when the signal starts.
    pub fn max_window(&self) -> usize {
        self.short.max(self.long)
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SMA_S = {} | SMA_L = {}", self.short, self.long)
    }
}

/// Moving averages and crossover positions for one parameter pair, aligned
/// with the price series they were computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalFrame {
    pub parameters: Parameters,
    pub sma_short: Vec<f64>,
    pub sma_long: Vec<f64>,
    pub positions: Vec<Option<Position>>,
}

impl SignalFrame {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of entries where both averages, and so the position, are defined.
    pub fn defined_positions(&self) -> usize {
        self.positions.iter().filter(|p| p.is_some()).count()
    }

    /// Index of the first defined position.
    pub fn first_signal_index(&self) -> Option<usize> {
        self.positions.iter().position(Option::is_some)
    }

    /// Number of leading entries without a position.
    pub fn warmup(&self) -> usize {
        warmup(self.parameters.max_window()).min(self.len())
    }
}

/// Compute both moving averages over the closes and derive the position signal.
///
/// Always a full recomputation; nothing is reused from earlier calls.
pub fn prepare_signals(
    series: &PriceSeries,
    parameters: Parameters,
) -> Result<SignalFrame, ParameterError> {
    parameters.validate_for_len(series.len())?;

    let sma_short = moving_average(&series.closes, parameters.short);
    let sma_long = moving_average(&series.closes, parameters.long);
    let positions = crossover_positions(&sma_short, &sma_long);

    debug!(
        short = parameters.short,
        long = parameters.long,
        defined = series.len() - warmup(parameters.max_window()),
        "prepared crossover signals"
    );

    Ok(SignalFrame {
        parameters,
        sma_short,
        sma_long,
        positions,
    })
}

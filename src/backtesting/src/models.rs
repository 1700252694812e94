use chrono::NaiveDate;
use indicators::Position;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output of one simulation pass.
///
/// All vectors cover the evaluated window only: the periods whose previous
/// position is defined. Index 0 of each vector is `start_index` in the source series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Index in the source series of the first evaluated period.
    pub start_index: usize,
    /// Dates of the evaluated periods.
    pub dates: Vec<NaiveDate>,
    /// Log return of the asset in each period.
    pub market_returns: Vec<f64>,
    /// Position held through each period (decided at the previous close).
    pub positions: Vec<Position>,
    /// Signed log return of the strategy in each period.
    pub strategy_returns: Vec<f64>,
    /// Buy-and-hold growth multiple, `exp(cumsum(market_returns))`.
    pub creturns: Vec<f64>,
    /// Strategy growth multiple, `exp(cumsum(strategy_returns))`.
    pub cstrategy: Vec<f64>,
    /// Cumulative buy-and-hold return at the final observation (NaN if the window is empty).
    pub buy_and_hold_return: f64,
    /// Cumulative strategy return at the final observation (NaN if the window is empty).
    pub strategy_return: f64,
}

impl SimulationResult {
    /// Number of evaluated periods
    pub fn periods(&self) -> usize {
        self.strategy_returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategy_returns.is_empty()
    }

    /// The two growth curves, the only input a chart needs.
    pub fn curves(&self) -> CumulativeCurves<'_> {
        CumulativeCurves {
            dates: &self.dates,
            creturns: &self.creturns,
            cstrategy: &self.cstrategy,
        }
    }
}

/// Borrowed view of the buy-and-hold and strategy growth curves.
#[derive(Debug, Clone, Copy)]
pub struct CumulativeCurves<'a> {
    pub dates: &'a [NaiveDate],
    pub creturns: &'a [f64],
    pub cstrategy: &'a [f64],
}

impl CumulativeCurves<'_> {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Smallest and largest value over both curves, `None` if there are no finite values.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let (lo, hi) = self
            .creturns
            .iter()
            .chain(self.cstrategy)
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        (lo <= hi).then_some((lo, hi))
    }
}

/// Scalar summary of a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Cumulative strategy return.
    pub absolute_performance: f64,
    /// Cumulative buy-and-hold return over the same window.
    pub buy_and_hold_return: f64,
    /// Strategy minus buy-and-hold.
    pub outperformance: f64,
    /// Annualised mean/std of per-period strategy returns. NaN when undefined.
    pub risk_adjusted_ratio: f64,
    /// Number of evaluated periods.
    pub periods: usize,
    /// Number of times the applied position flipped.
    pub position_changes: usize,
}

impl fmt::Display for PerformanceMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Performance:       {:.6}", self.absolute_performance)?;
        writeln!(f, "Buy and hold:      {:.6}", self.buy_and_hold_return)?;
        writeln!(f, "Outperformance:    {:.6}", self.outperformance)?;
        writeln!(f, "Risk-adj. ratio:   {:.6}", self.risk_adjusted_ratio)?;
        writeln!(f, "Periods:           {}", self.periods)?;
        write!(f, "Position changes:  {}", self.position_changes)
    }
}

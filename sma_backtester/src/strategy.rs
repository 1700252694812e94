use crate::error::{Result, StateError};
use crate::signals::{Parameters, SignalFrame, prepare_signals};
use backtesting::{PerformanceMetrics, SimulationResult, evaluate, simulate};
use smalab::core::io::PriceSeries;

/// Simulate prepared signals against the series they were built from.
pub fn run_strategy(
    series: &PriceSeries,
    frame: &SignalFrame,
) -> std::result::Result<SimulationResult, StateError> {
    Ok(simulate(&series.dates, &series.returns, &frame.positions)?)
}

/// One full pass of the pipeline for a parameter pair.
pub fn evaluate_parameters(
    series: &PriceSeries,
    parameters: Parameters,
    periods_per_year: f64,
) -> Result<(SimulationResult, PerformanceMetrics)> {
    let frame = prepare_signals(series, parameters)?;
    let result = run_strategy(series, &frame)?;
    let metrics = evaluate(&result, periods_per_year);
    Ok((result, metrics))
}

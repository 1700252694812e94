use crate::models::SimulationResult;
use chrono::NaiveDate;
use indicators::Position;
use stats::cumulative_log_growth;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SimulationError {
    #[error("series are not aligned: {dates} dates, {returns} returns, {positions} positions")]
    LengthMismatch {
        dates: usize,
        returns: usize,
        positions: usize,
    },
}

/// Apply a position signal to a log-return series.
///
/// The position decided at the close of period `i - 1` is held through
/// period `i`, so `strategy[i] = returns[i] * position[i - 1]`. Periods whose
/// previous position is undefined are left out of the window entirely, for
/// the buy-and-hold curve as well. Both curves are therefore measured over
/// the same stretch of history.
///
/// # Arguments
/// * `dates` - Observation dates
/// * `returns` - Log returns aligned with `dates` (index 0 is ignored)
/// * `positions` - Signal aligned with `dates`, `None` where undefined
pub fn simulate(
    dates: &[NaiveDate],
    returns: &[f64],
    positions: &[Option<Position>],
) -> Result<SimulationResult, SimulationError> {
    if dates.len() != returns.len() || returns.len() != positions.len() {
        return Err(SimulationError::LengthMismatch {
            dates: dates.len(),
            returns: returns.len(),
            positions: positions.len(),
        });
    }

    let n = returns.len();
    let mut start_index = None;
    let mut window_dates = Vec::with_capacity(n);
    let mut market_returns = Vec::with_capacity(n);
    let mut applied = Vec::with_capacity(n);
    let mut strategy_returns = Vec::with_capacity(n);

    for i in 1..n {
        let Some(position) = positions[i - 1] else {
            continue;
        };
        let r = returns[i];
        if r.is_nan() {
            continue;
        }
        start_index.get_or_insert(i);
        window_dates.push(dates[i]);
        market_returns.push(r);
        applied.push(position);
        strategy_returns.push(r * position.sign());
    }

    let creturns = cumulative_log_growth(&market_returns);
    let cstrategy = cumulative_log_growth(&strategy_returns);
    let final_return = |curve: &[f64]| curve.last().map_or(f64::NAN, |g| g - 1.0);

    Ok(SimulationResult {
        start_index: start_index.unwrap_or(n),
        buy_and_hold_return: final_return(&creturns),
        strategy_return: final_return(&cstrategy),
        dates: window_dates,
        market_returns,
        positions: applied,
        strategy_returns,
        creturns,
        cstrategy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indicators::Position::*;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let first = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        first.iter_days().take(n).collect()
    }

    fn log_returns(closes: &[f64]) -> Vec<f64> {
        std::iter::once(f64::NAN)
            .chain(closes.windows(2).map(|w| (w[1] / w[0]).ln()))
            .collect()
    }

    #[test]
    fn test_signal_is_lagged_one_period() {
        let closes = [100.0, 110.0, 99.0, 108.9];
        let returns = log_returns(&closes);
        let positions = [Some(Long), Some(Short), Some(Long), Some(Short)];

        let result = simulate(&dates(4), &returns, &positions).unwrap();

        assert_eq!(result.start_index, 1);
        assert_eq!(result.positions, vec![Long, Short, Long]);
        assert!((result.strategy_returns[0] - returns[1]).abs() < 1e-12);
        assert!((result.strategy_returns[1] + returns[2]).abs() < 1e-12);
        assert!((result.strategy_returns[2] - returns[3]).abs() < 1e-12);
    }

    #[test]
    fn test_undefined_positions_shrink_the_window() {
        let closes = [10.0, 11.0, 12.0, 13.0, 14.0];
        let returns = log_returns(&closes);
        let positions = [None, None, Some(Long), Some(Long), Some(Long)];

        let result = simulate(&dates(5), &returns, &positions).unwrap();

        assert_eq!(result.start_index, 3);
        assert_eq!(result.periods(), 2);
        // buy-and-hold measured from close[2] to close[4]
        assert!((result.buy_and_hold_return - (14.0 / 12.0 - 1.0)).abs() < 1e-12);
        assert!((result.strategy_return - result.buy_and_hold_return).abs() < 1e-12);
    }

    #[test]
    fn test_short_position_inverts_log_growth() {
        let closes = [100.0, 125.0];
        let returns = log_returns(&closes);
        let positions = [Some(Short), Some(Short)];

        let result = simulate(&dates(2), &returns, &positions).unwrap();

        assert!((result.buy_and_hold_return - 0.25).abs() < 1e-12);
        assert!((result.strategy_return - (100.0 / 125.0 - 1.0)).abs() < 1e-12);
        assert!((result.cstrategy[0] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_empty_window_gives_nan() {
        let returns = log_returns(&[1.0, 2.0, 3.0]);
        let positions = [None, None, Some(Long)];

        let result = simulate(&dates(3), &returns, &positions).unwrap();

        assert!(result.is_empty());
        assert_eq!(result.start_index, 3);
        assert!(result.strategy_return.is_nan());
        assert!(result.buy_and_hold_return.is_nan());
    }

    #[test]
    fn test_length_mismatch() {
        let err = simulate(&dates(3), &[f64::NAN, 0.0], &[None, None, None]).unwrap_err();
        assert_eq!(
            err,
            SimulationError::LengthMismatch {
                dates: 3,
                returns: 2,
                positions: 3
            }
        );
    }
}

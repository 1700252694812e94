use crate::models::{PerformanceMetrics, SimulationResult};
use indicators::position_changes;
use stats::annualized_ratio;

/// Trading days per year, used to annualise daily statistics.
pub const DEFAULT_PERIODS_PER_YEAR: f64 = 252.0;

/// Summarise a simulation.
///
/// Undefined statistics (empty window, zero dispersion) come back as NaN
/// rather than as errors.
pub fn evaluate(result: &SimulationResult, periods_per_year: f64) -> PerformanceMetrics {
    PerformanceMetrics {
        absolute_performance: result.strategy_return,
        buy_and_hold_return: result.buy_and_hold_return,
        outperformance: result.strategy_return - result.buy_and_hold_return,
        risk_adjusted_ratio: annualized_ratio(&result.strategy_returns, periods_per_year),
        periods: result.periods(),
        position_changes: position_changes(&result.positions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::simulate;
    use chrono::NaiveDate;
    use indicators::Position::{self, Long, Short};

    fn run(closes: &[f64], positions: &[Option<Position>]) -> PerformanceMetrics {
        let dates: Vec<NaiveDate> = NaiveDate::from_ymd_opt(2023, 6, 1)
            .unwrap()
            .iter_days()
            .take(closes.len())
            .collect();
        let mut returns = vec![f64::NAN];
        returns.extend(closes.windows(2).map(|w| (w[1] / w[0]).ln()));
        let sim = simulate(&dates, &returns, positions).unwrap();
        evaluate(&sim, DEFAULT_PERIODS_PER_YEAR)
    }

    #[test]
    fn test_outperformance_is_difference() {
        let m = run(
            &[100.0, 105.0, 100.0, 110.0],
            &[Some(Long), Some(Short), Some(Long), Some(Long)],
        );

        assert_eq!(m.periods, 3);
        assert_eq!(m.position_changes, 2);
        assert!((m.buy_and_hold_return - 0.1).abs() < 1e-12);
        // long +5%, short the drop back to 100, long +10%
        let expected = 1.05 * (105.0 / 100.0) * 1.1 - 1.0;
        assert!((m.absolute_performance - expected).abs() < 1e-12);
        assert!((m.outperformance - (expected - 0.1)).abs() < 1e-12);
        assert!(m.risk_adjusted_ratio.is_finite());
    }

    #[test]
    fn test_ratio_annualisation() {
        let closes = [100.0, 101.0, 103.0, 102.0];
        let m = run(&closes, &[Some(Long); 4]);

        let r: Vec<f64> = closes.windows(2).map(|w| (w[1] / w[0]).ln()).collect();
        let mean = r.iter().sum::<f64>() / 3.0;
        let sd = (r.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / 2.0).sqrt();
        assert!((m.risk_adjusted_ratio - mean / sd * 252.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_constant_prices_give_nan_ratio() {
        let m = run(&[50.0; 10], &[Some(Short); 10]);

        assert_eq!(m.absolute_performance, 0.0);
        assert_eq!(m.buy_and_hold_return, 0.0);
        assert!(m.risk_adjusted_ratio.is_nan());
    }

    #[test]
    fn test_empty_window_metrics() {
        let m = run(&[1.0, 2.0], &[None, Some(Long)]);
        assert_eq!(m.periods, 0);
        assert!(m.absolute_performance.is_nan());
        assert!(m.outperformance.is_nan());
        assert!(m.risk_adjusted_ratio.is_nan());
    }
}

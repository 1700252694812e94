use crate::error::{ParameterError, Result};
use crate::signals::Parameters;
use crate::strategy::evaluate_parameters;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smalab::core::io::PriceSeries;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Window sizes to sweep.
///
/// Written as `start:stop:step` (stop inclusive, step defaults to 1) or as a
/// comma-separated list of values. In TOML either form may be a string; a
/// list may also be an array of integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RangeRepr", into = "RangeRepr")]
pub enum ParamRange {
    Stepped {
        start: usize,
        stop: usize,
        step: usize,
    },
    Values(Vec<usize>),
}

impl ParamRange {
    pub fn stepped(start: usize, stop: usize, step: usize) -> Self {
        ParamRange::Stepped { start, stop, step }
    }

    /// Window sizes in ascending order, without duplicates.
    pub fn values(&self) -> std::result::Result<Vec<usize>, ParameterError> {
        match *self {
            ParamRange::Stepped { start, stop, step } => {
                if step == 0 {
                    return Err(ParameterError::ZeroStep);
                }
                if start > stop {
                    return Err(ParameterError::EmptyRange { start, stop });
                }
                Ok((start..=stop).step_by(step).collect())
            }
            ParamRange::Values(ref values) => {
                if values.is_empty() {
                    return Err(ParameterError::NoValues);
                }
                let mut values = values.clone();
                values.sort_unstable();
                values.dedup();
                Ok(values)
            }
        }
    }

    /// Check every window of the range fits a series of `len` observations.
    ///
    /// Works from the range bounds, so an oversized stepped range is rejected
    /// without being expanded.
    pub fn validate_for_len(
        &self,
        name: &'static str,
        len: usize,
    ) -> std::result::Result<(), ParameterError> {
        let too_long = |window: usize| ParameterError::WindowTooLong { name, window, len };
        match *self {
            ParamRange::Stepped { start, stop, step } => {
                if step == 0 {
                    return Err(ParameterError::ZeroStep);
                }
                if start > stop {
                    return Err(ParameterError::EmptyRange { start, stop });
                }
                if start == 0 {
                    return Err(ParameterError::ZeroWindow { name });
                }
                let last = start + (stop - start) / step * step;
                if last > len {
                    // first window of the range above `len`; never past `last`
                    let first = if start > len {
                        start
                    } else {
                        start + ((len - start) / step + 1) * step
                    };
                    return Err(too_long(first));
                }
                Ok(())
            }
            ParamRange::Values(ref values) => {
                let min = values.iter().min().ok_or(ParameterError::NoValues)?;
                if *min == 0 {
                    return Err(ParameterError::ZeroWindow { name });
                }
                match values.iter().filter(|&&v| v > len).min() {
                    Some(&window) => Err(too_long(window)),
                    None => Ok(()),
                }
            }
        }
    }
}

impl FromStr for ParamRange {
    type Err = ParameterError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || ParameterError::InvalidRange(s.to_string());
        let parse = |v: &str| v.trim().parse::<usize>().map_err(|_| invalid());

        if s.contains(':') {
            let parts: Vec<&str> = s.split(':').collect();
            return match parts.as_slice() {
                [start, stop] => Ok(ParamRange::stepped(parse(start)?, parse(stop)?, 1)),
                [start, stop, step] => Ok(ParamRange::stepped(
                    parse(start)?,
                    parse(stop)?,
                    parse(step)?,
                )),
                _ => Err(invalid()),
            };
        }

        let values = s
            .split(',')
            .map(parse)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ParamRange::Values(values))
    }
}

impl fmt::Display for ParamRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamRange::Stepped { start, stop, step } => write!(f, "{}:{}:{}", start, stop, step),
            ParamRange::Values(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", parts.join(","))
            }
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RangeRepr {
    Text(String),
    List(Vec<usize>),
}

impl TryFrom<RangeRepr> for ParamRange {
    type Error = ParameterError;

    fn try_from(repr: RangeRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            RangeRepr::Text(text) => text.parse(),
            RangeRepr::List(values) => Ok(ParamRange::Values(values)),
        }
    }
}

impl From<ParamRange> for RangeRepr {
    fn from(range: ParamRange) -> Self {
        RangeRepr::Text(range.to_string())
    }
}

/// Outcome of one grid point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridPoint {
    pub parameters: Parameters,
    /// Cumulative strategy return
    pub performance: f64,
    pub outperformance: f64,
}

/// Every evaluated grid point plus the winner.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationResult {
    /// Grid points in sweep order: ascending short window, then ascending long window.
    pub grid: Vec<GridPoint>,
    pub best: Parameters,
    pub best_outperformance: f64,
    #[serde(skip)]
    lookup: FxHashMap<Parameters, f64>,
}

impl OptimizationResult {
    fn from_grid(grid: Vec<GridPoint>) -> Option<Self> {
        let best_idx = select_best(&grid)?;
        let best = grid[best_idx];
        let lookup = grid
            .iter()
            .map(|g| (g.parameters, g.outperformance))
            .collect();
        Some(Self {
            best: best.parameters,
            best_outperformance: best.outperformance,
            grid,
            lookup,
        })
    }

    /// Outperformance recorded for a window pair, if it was part of the grid.
    pub fn outperformance_of(&self, short: usize, long: usize) -> Option<f64> {
        self.lookup.get(&Parameters { short, long }).copied()
    }

    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }
}

/// Index of the grid point with the highest outperformance.
///
/// The first maximum in sweep order wins. A NaN never beats a number; if
/// every point is NaN the first one is returned.
fn select_best(grid: &[GridPoint]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, point) in grid.iter().enumerate() {
        let Some(b) = best else {
            best = Some(i);
            continue;
        };
        let current = grid[b].outperformance;
        let candidate = point.outperformance;
        if candidate > current || (current.is_nan() && !candidate.is_nan()) {
            best = Some(i);
        }
    }
    best
}

/// Evaluate every (short, long) pair of the two ranges and pick the best by outperformance.
///
/// Grid points are independent, so they are evaluated in parallel; the
/// winner is chosen afterwards by a sequential pass over the ordered results.
pub fn optimize_parameters(
    series: &PriceSeries,
    short_range: &ParamRange,
    long_range: &ParamRange,
    periods_per_year: f64,
) -> Result<OptimizationResult> {
    // Both axes are checked before either is expanded.
    short_range.validate_for_len("SMA_S", series.len())?;
    long_range.validate_for_len("SMA_L", series.len())?;

    let shorts = short_range.values()?;
    let longs = long_range.values()?;

    let combinations: Vec<Parameters> = shorts
        .iter()
        .flat_map(|&short| longs.iter().map(move |&long| Parameters { short, long }))
        .collect();

    info!(
        short_range = %short_range,
        long_range = %long_range,
        points = combinations.len(),
        "sweeping parameter grid"
    );

    let grid = combinations
        .par_iter()
        .map(|&parameters| -> Result<GridPoint> {
            let (_, metrics) = evaluate_parameters(series, parameters, periods_per_year)?;
            debug!(%parameters, outperformance = metrics.outperformance, "grid point");
            Ok(GridPoint {
                parameters,
                performance: metrics.absolute_performance,
                outperformance: metrics.outperformance,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let result = OptimizationResult::from_grid(grid).ok_or(ParameterError::NoValues)?;
    info!(
        best = %result.best,
        outperformance = result.best_outperformance,
        "optimisation finished"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_walk(n: usize, seed: u64) -> PriceSeries {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut price = 100.0;
        let closes: Vec<f64> = (0..n)
            .map(|_| {
                price *= 1.0 + rng.gen_range(-0.02..0.021);
                price
            })
            .collect();
        PriceSeries::from_closes("RW", NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(), &closes)
            .unwrap()
    }

    fn point(short: usize, long: usize, outperformance: f64) -> GridPoint {
        GridPoint {
            parameters: Parameters { short, long },
            performance: 0.0,
            outperformance,
        }
    }

    #[test]
    fn test_range_values() {
        assert_eq!(ParamRange::stepped(10, 20, 5).values().unwrap(), vec![10, 15, 20]);
        assert_eq!(ParamRange::stepped(10, 21, 5).values().unwrap(), vec![10, 15, 20]);
        assert_eq!(ParamRange::stepped(7, 7, 3).values().unwrap(), vec![7]);
        assert_eq!(
            ParamRange::Values(vec![20, 5, 20, 10]).values().unwrap(),
            vec![5, 10, 20]
        );
    }

    #[test]
    fn test_invalid_ranges() {
        assert_eq!(ParamRange::stepped(1, 5, 0).values(), Err(ParameterError::ZeroStep));
        assert_eq!(
            ParamRange::stepped(9, 5, 1).values(),
            Err(ParameterError::EmptyRange { start: 9, stop: 5 })
        );
        assert_eq!(ParamRange::Values(vec![]).values(), Err(ParameterError::NoValues));
    }

    #[test]
    fn test_range_parsing() {
        assert_eq!("10:50:5".parse::<ParamRange>().unwrap(), ParamRange::stepped(10, 50, 5));
        assert_eq!("10:50".parse::<ParamRange>().unwrap(), ParamRange::stepped(10, 50, 1));
        assert_eq!(
            "5, 10,20".parse::<ParamRange>().unwrap(),
            ParamRange::Values(vec![5, 10, 20])
        );
        assert!("a:b".parse::<ParamRange>().is_err());
        assert!("1:2:3:4".parse::<ParamRange>().is_err());
        assert_eq!(ParamRange::stepped(1, 9, 2).to_string(), "1:9:2");
    }

    #[test]
    fn test_select_best_first_max_wins() {
        let grid = [point(1, 5, 0.1), point(1, 6, 0.3), point(2, 5, 0.3), point(2, 6, -1.0)];
        assert_eq!(select_best(&grid), Some(1));
    }

    #[test]
    fn test_select_best_skips_nan() {
        let grid = [point(1, 5, f64::NAN), point(1, 6, -0.2), point(2, 5, f64::NAN)];
        assert_eq!(select_best(&grid), Some(1));

        let all_nan = [point(1, 5, f64::NAN), point(1, 6, f64::NAN)];
        assert_eq!(select_best(&all_nan), Some(0));
        assert_eq!(select_best(&[]), None);
    }

    #[test]
    fn test_winner_dominates_grid() {
        let series = random_walk(300, 7);
        let result = optimize_parameters(
            &series,
            &ParamRange::stepped(2, 20, 3),
            &ParamRange::stepped(20, 80, 10),
            252.0,
        )
        .unwrap();

        assert_eq!(result.len(), 7 * 7);
        for point in &result.grid {
            assert!(result.best_outperformance >= point.outperformance);
        }
        assert_eq!(
            result.outperformance_of(result.best.short, result.best.long),
            Some(result.best_outperformance)
        );
    }

    #[test]
    fn test_grid_order_and_determinism() {
        let series = random_walk(200, 11);
        let shorts = ParamRange::Values(vec![8, 3, 5]);
        let longs = ParamRange::stepped(30, 50, 10);

        let a = optimize_parameters(&series, &shorts, &longs, 252.0).unwrap();
        let b = optimize_parameters(&series, &shorts, &longs, 252.0).unwrap();

        let order: Vec<(usize, usize)> = a
            .grid
            .iter()
            .map(|g| (g.parameters.short, g.parameters.long))
            .collect();
        assert_eq!(
            order,
            vec![(3, 30), (3, 40), (3, 50), (5, 30), (5, 40), (5, 50), (8, 30), (8, 40), (8, 50)]
        );
        assert_eq!(a.best, b.best);
        assert_eq!(a.best_outperformance.to_bits(), b.best_outperformance.to_bits());
    }

    #[test]
    fn test_ties_resolve_to_first_pair() {
        // constant prices: every pair scores 0
        let series = PriceSeries::from_closes(
            "FLAT",
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            &[10.0; 40],
        )
        .unwrap();

        let result = optimize_parameters(
            &series,
            &ParamRange::stepped(2, 6, 2),
            &ParamRange::stepped(10, 20, 5),
            252.0,
        )
        .unwrap();

        assert_eq!(result.best, Parameters { short: 2, long: 10 });
        assert_eq!(result.best_outperformance, 0.0);
    }

    #[test]
    fn test_short_not_below_long_is_allowed() {
        let series = random_walk(60, 3);
        let result = optimize_parameters(
            &series,
            &ParamRange::Values(vec![10]),
            &ParamRange::Values(vec![5, 10]),
            252.0,
        )
        .unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_window_too_long_fails() {
        let series = random_walk(30, 5);
        let err = optimize_parameters(
            &series,
            &ParamRange::stepped(2, 4, 1),
            &ParamRange::stepped(20, 40, 10),
            252.0,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            crate::error::BacktestError::Parameter(ParameterError::WindowTooLong { window: 40, .. })
        ));
    }

    #[test]
    fn test_oversized_range_rejected_before_expansion() {
        let series = random_walk(30, 5);
        let err = optimize_parameters(
            &series,
            &ParamRange::stepped(1, 2, 1),
            &ParamRange::stepped(1, usize::MAX, 1),
            252.0,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            crate::error::BacktestError::Parameter(ParameterError::WindowTooLong {
                name: "SMA_L",
                window: 31,
                len: 30
            })
        ));
    }

    #[test]
    fn test_range_validate_for_len() {
        assert_eq!(ParamRange::stepped(5, 30, 5).validate_for_len("SMA_S", 30), Ok(()));
        assert_eq!(ParamRange::stepped(5, 34, 5).validate_for_len("SMA_S", 30), Ok(()));
        assert_eq!(
            ParamRange::stepped(5, 35, 5).validate_for_len("SMA_S", 30),
            Err(ParameterError::WindowTooLong { name: "SMA_S", window: 35, len: 30 })
        );
        assert_eq!(
            ParamRange::stepped(40, 90, 7).validate_for_len("SMA_L", 30),
            Err(ParameterError::WindowTooLong { name: "SMA_L", window: 40, len: 30 })
        );
        assert_eq!(
            ParamRange::Values(vec![50, 10, 31]).validate_for_len("SMA_L", 30),
            Err(ParameterError::WindowTooLong { name: "SMA_L", window: 31, len: 30 })
        );
        assert_eq!(
            ParamRange::Values(vec![3, 0]).validate_for_len("SMA_S", 30),
            Err(ParameterError::ZeroWindow { name: "SMA_S" })
        );
        assert_eq!(
            ParamRange::Values(vec![]).validate_for_len("SMA_S", 30),
            Err(ParameterError::NoValues)
        );
    }

    #[test]
    fn test_zero_window_fails() {
        let series = random_walk(30, 5);
        let err = optimize_parameters(
            &series,
            &ParamRange::stepped(0, 2, 1),
            &ParamRange::Values(vec![10]),
            252.0,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            crate::error::BacktestError::Parameter(ParameterError::ZeroWindow { .. })
        ));
    }
}

use super::DataError;
use chrono::{Days, NaiveDate};

/// A single dated close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceObservation {
    pub date: NaiveDate,
    pub close: f64,
}

/// Chronological close prices for one symbol, with log returns.
///
/// Stored column-wise. `returns` is aligned with `closes`; `returns[0]` is NaN
/// because there is no previous close to compare against.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub symbol: String,
    pub dates: Vec<NaiveDate>,
    pub closes: Vec<f64>,
    pub returns: Vec<f64>,
}

impl PriceSeries {
    /// Build a series from observations that are already in chronological order.
    ///
    /// Fails if dates are not strictly increasing, a close is not a positive
    /// finite number, or fewer than two observations are given.
    pub fn from_observations(
        symbol: impl Into<String>,
        observations: &[PriceObservation],
    ) -> Result<Self, DataError> {
        if observations.len() < 2 {
            return Err(DataError::InsufficientData {
                found: observations.len(),
            });
        }

        for obs in observations {
            if !obs.close.is_finite() {
                return Err(DataError::NonFinitePrice {
                    date: obs.date,
                    price: obs.close,
                });
            }
            if obs.close <= 0.0 {
                return Err(DataError::NonPositivePrice {
                    date: obs.date,
                    price: obs.close,
                });
            }
        }

        for pair in observations.windows(2) {
            if pair[1].date == pair[0].date {
                return Err(DataError::DuplicateDate(pair[1].date));
            }
            if pair[1].date < pair[0].date {
                return Err(DataError::Unordered {
                    previous: pair[0].date,
                    next: pair[1].date,
                });
            }
        }

        let dates: Vec<NaiveDate> = observations.iter().map(|o| o.date).collect();
        let closes: Vec<f64> = observations.iter().map(|o| o.close).collect();
        let returns = log_returns(&closes);

        Ok(Self {
            symbol: symbol.into(),
            dates,
            closes,
            returns,
        })
    }

    /// Build a series of consecutive calendar days starting at `first_date`.
    pub fn from_closes(
        symbol: impl Into<String>,
        first_date: NaiveDate,
        closes: &[f64],
    ) -> Result<Self, DataError> {
        let observations = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let days = i as u64;
                let date = first_date
                    .checked_add_days(Days::new(days))
                    .ok_or(DataError::DateOverflow {
                        first: first_date,
                        days,
                    })?;
                Ok(PriceObservation { date, close })
            })
            .collect::<Result<Vec<_>, DataError>>()?;
        Self::from_observations(symbol, &observations)
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.closes.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn observations(&self) -> impl Iterator<Item = PriceObservation> + '_ {
        self.dates
            .iter()
            .zip(&self.closes)
            .map(|(&date, &close)| PriceObservation { date, close })
    }
}

/// Log returns of consecutive closes, NaN-padded at index 0.
pub fn log_returns(closes: &[f64]) -> Vec<f64> {
    let mut returns = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return returns;
    }
    returns.push(f64::NAN);
    returns.extend(closes.windows(2).map(|w| (w[1] / w[0]).ln()));
    returns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 3, d).unwrap()
    }

    #[test]
    fn test_log_returns_aligned() {
        let returns = log_returns(&[100.0, 110.0, 99.0]);

        assert_eq!(returns.len(), 3);
        assert!(returns[0].is_nan());
        assert!((returns[1] - (1.1_f64).ln()).abs() < 1e-12);
        assert!((returns[2] - (99.0_f64 / 110.0).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_from_observations_rejects_duplicates() {
        let obs = vec![
            PriceObservation { date: day(1), close: 10.0 },
            PriceObservation { date: day(1), close: 11.0 },
        ];
        assert!(matches!(
            PriceSeries::from_observations("X", &obs),
            Err(DataError::DuplicateDate(_))
        ));
    }

    #[test]
    fn test_from_observations_rejects_unordered() {
        let obs = vec![
            PriceObservation { date: day(2), close: 10.0 },
            PriceObservation { date: day(1), close: 11.0 },
        ];
        assert!(matches!(
            PriceSeries::from_observations("X", &obs),
            Err(DataError::Unordered { .. })
        ));
    }

    #[test]
    fn test_from_observations_rejects_bad_price() {
        let obs = vec![
            PriceObservation { date: day(1), close: 10.0 },
            PriceObservation { date: day(2), close: 0.0 },
        ];
        assert!(matches!(
            PriceSeries::from_observations("X", &obs),
            Err(DataError::NonPositivePrice { .. })
        ));
    }

    #[test]
    fn test_from_observations_rejects_non_finite_price() {
        for bad in [f64::NAN, f64::INFINITY] {
            let obs = vec![
                PriceObservation { date: day(1), close: 10.0 },
                PriceObservation { date: day(2), close: bad },
            ];
            let err = PriceSeries::from_observations("X", &obs).unwrap_err();
            assert!(matches!(err, DataError::NonFinitePrice { .. }));
            assert!(err.to_string().contains("not a finite number"));
        }
    }

    #[test]
    fn test_from_closes_date_overflow() {
        let last = NaiveDate::MAX;
        let err = PriceSeries::from_closes("X", last, &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, DataError::DateOverflow { first, days: 1 } if first == last));
    }

    #[test]
    fn test_single_observation_is_insufficient() {
        let result = PriceSeries::from_closes("X", day(1), &[10.0]);
        assert!(matches!(result, Err(DataError::InsufficientData { found: 1 })));
    }

    #[test]
    fn test_from_closes_consecutive_days() {
        let series = PriceSeries::from_closes("X", day(1), &[1.0, 2.0, 4.0]).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.first_date(), Some(day(1)));
        assert_eq!(series.last_date(), Some(day(3)));
        assert!((series.returns[2] - 2.0_f64.ln()).abs() < 1e-12);
    }
}

use serde::{Deserialize, Serialize};

/// Exposure implied by the crossover signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    Long,
    Short,
}

impl Position {
    /// +1 for long, -1 for short
    pub fn sign(self) -> f64 {
        match self {
            Position::Long => 1.0,
            Position::Short => -1.0,
        }
    }
}

/// Long where the short average is strictly above the long average, short otherwise.
///
/// `None` wherever either average is still undefined (NaN).
pub fn crossover_positions(short_ma: &[f64], long_ma: &[f64]) -> Vec<Option<Position>> {
    short_ma
        .iter()
        .zip(long_ma)
        .map(|(&s, &l)| {
            if s.is_nan() || l.is_nan() {
                None
            } else if s > l {
                Some(Position::Long)
            } else {
                Some(Position::Short)
            }
        })
        .collect()
}

/// Count sign flips between consecutive positions.
pub fn position_changes(positions: &[Position]) -> usize {
    positions.windows(2).filter(|w| w[0] != w[1]).count()
}

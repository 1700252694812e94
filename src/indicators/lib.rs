//! Price-based indicators used by the crossover strategy.

pub mod trend;

pub use trend::{Position, crossover_positions, moving_average, position_changes, warmup};

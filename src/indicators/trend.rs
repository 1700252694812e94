mod crossover;
mod ma;

pub use crossover::*;
pub use ma::*;

mod error;
mod prices;
mod series;

pub use error::*;
pub use prices::*;
pub use series::*;

pub mod write;
pub use write::*;

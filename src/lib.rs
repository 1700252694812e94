//! Shared building blocks for the SMA crossover workspace.
//!
//! - `core::io` - loading dated close-price tables and writing output files

pub mod core;

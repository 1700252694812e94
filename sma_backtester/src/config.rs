//! Configuration file for the `sma_backtester` binary.
//!
//! Every section and every field is optional; command-line flags override
//! whatever the file sets. Dates are written as `"yyyy-mm-dd"` strings.

use crate::backtester::BacktestConfig;
use crate::error::{ParameterError, Result};
use crate::optimizer::ParamRange;
use crate::signals::Parameters;
use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use smalab::core::io::{DataError, TableSpec};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub strategy: StrategyConfig,
    pub optimization: OptimizationConfig,
    pub output: OutputConfig,
}

/// Which rows and columns of the price table to use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub symbol: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub date_column: String,
    pub close_column: String,
    /// Set for tables that hold several symbols
    pub symbol_column: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub short: usize,
    pub long: usize,
    /// Annualisation factor of the risk-adjusted ratio
    pub periods_per_year: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    pub short_range: ParamRange,
    pub long_range: ParamRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub output_dir: PathBuf,
    /// Write a PNG of the cumulative curves after a run
    pub chart: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        let table = TableSpec::default();
        Self {
            symbol: table.symbol,
            start: None,
            end: None,
            date_column: table.date_column,
            close_column: table.close_column,
            symbol_column: None,
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            short: 42,
            long: 252,
            periods_per_year: backtesting::DEFAULT_PERIODS_PER_YEAR,
        }
    }
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            short_range: ParamRange::stepped(10, 50, 1),
            long_range: ParamRange::stepped(100, 252, 1),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("results/"),
            chart: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: AppConfig =
            toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        smalab::core::io::write_file(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.parameters().validate()?;
        let ppy = self.strategy.periods_per_year;
        if !(ppy.is_finite() && ppy > 0.0) {
            return Err(ParameterError::PeriodsPerYear(ppy).into());
        }
        if let (Some(start), Some(end)) = (self.data.start, self.data.end) {
            if start > end {
                return Err(DataError::InvalidRange { start, end }.into());
            }
        }
        Ok(())
    }

    pub fn parameters(&self) -> Parameters {
        Parameters {
            short: self.strategy.short,
            long: self.strategy.long,
        }
    }

    pub fn table_spec(&self) -> TableSpec {
        TableSpec {
            symbol: self.data.symbol.clone(),
            start: self.data.start,
            end: self.data.end,
            date_column: self.data.date_column.clone(),
            close_column: self.data.close_column.clone(),
            symbol_column: self.data.symbol_column.clone(),
        }
    }

    pub fn backtest_config(&self, source: impl Into<PathBuf>) -> BacktestConfig {
        BacktestConfig {
            source: source.into(),
            table: self.table_spec(),
            parameters: self.parameters(),
            periods_per_year: self.strategy.periods_per_year,
        }
    }
}

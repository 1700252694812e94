//! Stateful facade over the signal / simulate / evaluate pipeline.
//!
//! Every change to the window parameters bumps a version counter. Prepared
//! signals carry the version they were built for, and [`Backtester::run_backtest`]
//! refuses to simulate signals whose version is not the active one, so results
//! can never silently mix old signals with new parameters.

use crate::error::{ParameterError, Result, StateError};
use crate::optimizer::{OptimizationResult, ParamRange, optimize_parameters};
use crate::signals::{self, Parameters, SignalFrame};
use crate::strategy::run_strategy;
use crate::visualization::ResultRenderer;
use backtesting::{DEFAULT_PERIODS_PER_YEAR, PerformanceMetrics, SimulationResult, evaluate};
use chrono::NaiveDate;
use smalab::core::io::{PriceSeries, TableSpec, read_price_table};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

/// Everything needed to load a series and run the strategy on it.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    /// CSV price table
    pub source: PathBuf,
    /// Symbol, date range and column names
    pub table: TableSpec,
    pub parameters: Parameters,
    pub periods_per_year: f64,
}

impl BacktestConfig {
    pub fn new(source: impl Into<PathBuf>, symbol: impl Into<String>, short: usize, long: usize) -> Self {
        Self {
            source: source.into(),
            table: TableSpec::for_symbol(symbol),
            parameters: Parameters { short, long },
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
        }
    }

    pub fn with_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.table.start = start;
        self.table.end = end;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), ParameterError> {
        self.parameters.validate()?;
        if !(self.periods_per_year.is_finite() && self.periods_per_year > 0.0) {
            return Err(ParameterError::PeriodsPerYear(self.periods_per_year));
        }
        Ok(())
    }
}

/// Signals stamped with the parameter version they were computed for.
#[derive(Debug, Clone)]
pub struct PreparedSignals {
    pub version: u64,
    pub frame: SignalFrame,
}

/// Outcome of the latest [`Backtester::run_backtest`].
#[derive(Debug, Clone)]
pub struct BacktestRun {
    pub parameters: Parameters,
    pub version: u64,
    pub simulation: SimulationResult,
    pub metrics: PerformanceMetrics,
}

/// Versioned pipeline state. Read-only outside this module.
#[derive(Debug, Clone)]
pub struct BacktestState {
    parameters: Parameters,
    version: u64,
    series: Option<PriceSeries>,
    signals: Option<PreparedSignals>,
    last_run: Option<BacktestRun>,
    overview: Option<OptimizationResult>,
}

impl BacktestState {
    fn new(parameters: Parameters) -> Self {
        Self {
            parameters,
            version: 0,
            series: None,
            signals: None,
            last_run: None,
            overview: None,
        }
    }

    pub fn parameters(&self) -> Parameters {
        self.parameters
    }

    /// Incremented whenever the parameters change.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn series(&self) -> Option<&PriceSeries> {
        self.series.as_ref()
    }

    pub fn signals(&self) -> Option<&PreparedSignals> {
        self.signals.as_ref()
    }

    pub fn last_run(&self) -> Option<&BacktestRun> {
        self.last_run.as_ref()
    }

    pub fn results(&self) -> Option<&SimulationResult> {
        self.last_run.as_ref().map(|run| &run.simulation)
    }

    pub fn metrics(&self) -> Option<&PerformanceMetrics> {
        self.last_run.as_ref().map(|run| &run.metrics)
    }

    /// Grid of the latest [`Backtester::optimize`] sweep.
    pub fn overview(&self) -> Option<&OptimizationResult> {
        self.overview.as_ref()
    }

    /// True when the prepared signals match the active parameters.
    pub fn signals_current(&self) -> bool {
        self.signals
            .as_ref()
            .is_some_and(|s| s.version == self.version)
    }
}

/// SMA crossover backtester for one symbol.
#[derive(Debug, Clone)]
pub struct Backtester {
    config: BacktestConfig,
    state: BacktestState,
}

impl Backtester {
    /// Validate the configuration. Nothing is read until [`load`](Self::load).
    pub fn new(config: BacktestConfig) -> Result<Self> {
        config.validate()?;
        let state = BacktestState::new(config.parameters);
        Ok(Self { config, state })
    }

    /// Construct, load the price table and prepare signals in one go.
    pub fn open(config: BacktestConfig) -> Result<Self> {
        let mut backtester = Self::new(config)?;
        backtester.load()?;
        backtester.prepare_signals()?;
        Ok(backtester)
    }

    /// Read the configured price table.
    pub fn load(&mut self) -> Result<&PriceSeries> {
        let series = read_price_table(&self.config.source, &self.config.table)?;
        Ok(self.load_series(series))
    }

    /// Use an already loaded series. Prepared signals and results are dropped.
    pub fn load_series(&mut self, series: PriceSeries) -> &PriceSeries {
        self.state.signals = None;
        self.state.last_run = None;
        self.state.overview = None;
        self.state.series.insert(series)
    }

    /// Compute moving averages and positions for the active parameters.
    pub fn prepare_signals(&mut self) -> Result<&SignalFrame> {
        let series = self.state.series.as_ref().ok_or(StateError::NotLoaded)?;
        let frame = signals::prepare_signals(series, self.state.parameters)?;
        let prepared = self.state.signals.insert(PreparedSignals {
            version: self.state.version,
            frame,
        });
        Ok(&prepared.frame)
    }

    /// Replace either window. Prepared signals become stale if a value changed.
    pub fn set_parameters(&mut self, short: Option<usize>, long: Option<usize>) -> Result<()> {
        let next = self.state.parameters.with(short, long)?;
        if next != self.state.parameters {
            self.state.parameters = next;
            self.state.version += 1;
            debug!(parameters = %next, version = self.state.version, "parameters updated");
        }
        Ok(())
    }

    /// Simulate the prepared signals and evaluate them.
    ///
    /// Fails with [`StateError`] if nothing is loaded, no signals were
    /// prepared, or the signals were prepared for older parameters.
    pub fn run_backtest(&mut self) -> Result<PerformanceMetrics> {
        let series = self.state.series.as_ref().ok_or(StateError::NotLoaded)?;
        let prepared = self
            .state
            .signals
            .as_ref()
            .ok_or(StateError::SignalsNotPrepared)?;
        if prepared.version != self.state.version {
            return Err(StateError::StaleSignals {
                prepared: prepared.version,
                active: self.state.version,
            }
            .into());
        }

        let simulation = run_strategy(series, &prepared.frame)?;
        let metrics = evaluate(&simulation, self.config.periods_per_year);

        info!(
            symbol = %series.symbol,
            parameters = %prepared.frame.parameters,
            performance = metrics.absolute_performance,
            outperformance = metrics.outperformance,
            "backtest finished"
        );

        self.state.last_run = Some(BacktestRun {
            parameters: prepared.frame.parameters,
            version: prepared.version,
            simulation,
            metrics,
        });
        Ok(metrics)
    }

    /// Hand the cumulative curves of the latest run to a renderer.
    pub fn render_results(&self, renderer: &dyn ResultRenderer) -> anyhow::Result<()> {
        let run = self.state.last_run.as_ref().ok_or(StateError::NoResults)?;
        let title = chart_title(&self.config.table.symbol, run.parameters);
        renderer.render(&title, &run.simulation.curves())
    }

    /// Sweep the grid, then adopt the best pair and rerun the backtest with it.
    pub fn optimize(
        &mut self,
        short_range: &ParamRange,
        long_range: &ParamRange,
    ) -> Result<OptimizationResult> {
        let series = self.state.series.as_ref().ok_or(StateError::NotLoaded)?;
        let result = optimize_parameters(
            series,
            short_range,
            long_range,
            self.config.periods_per_year,
        )?;

        self.set_parameters(Some(result.best.short), Some(result.best.long))?;
        self.prepare_signals()?;
        self.run_backtest()?;
        self.state.overview = Some(result.clone());
        Ok(result)
    }

    /// Chart title for the active parameters.
    pub fn title(&self) -> String {
        chart_title(&self.config.table.symbol, self.state.parameters)
    }

    pub fn parameters(&self) -> Parameters {
        self.state.parameters
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn state(&self) -> &BacktestState {
        &self.state
    }

    fn start(&self) -> Option<NaiveDate> {
        self.config
            .table
            .start
            .or_else(|| self.state.series.as_ref().and_then(PriceSeries::first_date))
    }

    fn end(&self) -> Option<NaiveDate> {
        self.config
            .table
            .end
            .or_else(|| self.state.series.as_ref().and_then(PriceSeries::last_date))
    }
}

fn chart_title(symbol: &str, parameters: Parameters) -> String {
    format!("{} | {}", symbol, parameters)
}

fn fmt_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.to_string())
}

impl fmt::Display for Backtester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SMABacktester(symbol={}, SMA_S={}, SMA_L={}, start={}, end={})",
            self.config.table.symbol,
            self.state.parameters.short,
            self.state.parameters.long,
            fmt_date(self.start()),
            fmt_date(self.end())
        )
    }
}

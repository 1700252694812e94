use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use sma_backtester::ParamRange;
use std::path::PathBuf;

/// Moving-average crossover backtester
#[derive(Parser, Debug)]
#[command(name = "sma_backtester")]
#[command(about = "Backtest and optimise a long/short SMA crossover strategy", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Backtest one (SMA_S, SMA_L) pair
    Run {
        /// CSV price table
        #[arg(short, long)]
        data: PathBuf,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Symbol to load
        #[arg(long)]
        symbol: Option<String>,

        /// Short moving-average window
        #[arg(short = 's', long)]
        short: Option<usize>,

        /// Long moving-average window
        #[arg(short = 'l', long)]
        long: Option<usize>,

        /// First date to include (yyyy-mm-dd)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last date to include (yyyy-mm-dd)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Output directory
        #[arg(short = 'D', long)]
        output_dir: Option<PathBuf>,

        /// Save a chart of the cumulative returns
        #[arg(long)]
        chart: bool,
    },

    /// Sweep a grid of window pairs and backtest the best one
    Optimize {
        /// CSV price table
        #[arg(short, long)]
        data: PathBuf,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Short windows, start:stop[:step] or a comma-separated list
        #[arg(long)]
        short_range: Option<ParamRange>,

        /// Long windows, start:stop[:step] or a comma-separated list
        #[arg(long)]
        long_range: Option<ParamRange>,

        /// Output directory
        #[arg(short = 'D', long)]
        output_dir: Option<PathBuf>,
    },
}

use anyhow::{Context, Result};
use clap::Parser;
use sma_backtester::report::{write_overview_csv, write_run_reports};
use sma_backtester::{AppConfig, Backtester, PngChart};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[path = "entrypoint_helper.rs"]
mod entrypoint_helper;

use entrypoint_helper::{Cli, Commands};

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::from_file(path),
        None => Ok(AppConfig::default()),
    }
}

fn print_metrics(backtester: &Backtester) {
    let Some(metrics) = backtester.state().metrics() else {
        return;
    };
    println!("\n=== {} ===", backtester.title());
    println!("Performance:       {:.6}", metrics.absolute_performance);
    println!("Buy and hold:      {:.6}", metrics.buy_and_hold_return);
    println!("Outperformance:    {:.6}", metrics.outperformance);
    println!("Risk-adj. ratio:   {:.6}", metrics.risk_adjusted_ratio);
    println!("Periods:           {}", metrics.periods);
    println!("Position changes:  {}", metrics.position_changes);
}

fn save_chart(backtester: &Backtester, output_dir: &Path) -> Result<PathBuf> {
    let params = backtester.parameters();
    let path = output_dir.join(format!(
        "{}_sma_{}_{}.png",
        backtester.config().table.symbol,
        params.short,
        params.long
    ));
    backtester.render_results(&PngChart::new(&path))?;
    Ok(path)
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sma_backtester=info,smalab=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            data,
            config,
            symbol,
            short,
            long,
            start,
            end,
            output_dir,
            chart,
        } => {
            let mut app = load_config(config.as_deref())?;
            if let Some(symbol) = symbol {
                app.data.symbol = symbol;
            }
            app.strategy.short = short.unwrap_or(app.strategy.short);
            app.strategy.long = long.unwrap_or(app.strategy.long);
            app.data.start = start.or(app.data.start);
            app.data.end = end.or(app.data.end);
            if let Some(dir) = output_dir {
                app.output.output_dir = dir;
            }
            app.output.chart |= chart;
            app.validate()?;

            println!("\n=== BACKTEST MODE ===");
            println!("Data file: {}", data.display());

            let mut backtester = Backtester::open(app.backtest_config(&data))
                .with_context(|| format!("preparing backtest on {}", data.display()))?;
            println!("{}", backtester);

            backtester.run_backtest()?;
            print_metrics(&backtester);

            let output_dir = &app.output.output_dir;
            for path in write_run_reports(&backtester, output_dir)? {
                println!("✓ Report saved to: {}", path.display());
            }
            if app.output.chart {
                let path = save_chart(&backtester, output_dir)?;
                println!("✓ Chart saved to: {}", path.display());
            }
        }

        Commands::Optimize {
            data,
            config,
            short_range,
            long_range,
            output_dir,
        } => {
            let mut app = load_config(config.as_deref())?;
            if let Some(range) = short_range {
                app.optimization.short_range = range;
            }
            if let Some(range) = long_range {
                app.optimization.long_range = range;
            }
            if let Some(dir) = output_dir {
                app.output.output_dir = dir;
            }
            app.validate()?;

            println!("\n=== OPTIMIZATION MODE ===");
            println!("Data file:   {}", data.display());
            println!("SMA_S range: {}", app.optimization.short_range);
            println!("SMA_L range: {}", app.optimization.long_range);

            let mut backtester = Backtester::new(app.backtest_config(&data))?;
            backtester.load()?;
            let result = backtester
                .optimize(&app.optimization.short_range, &app.optimization.long_range)?;

            println!("\n=== RESULTS ===");
            println!("Grid points evaluated: {}", result.len());
            println!(
                "Best: SMA_S = {}, SMA_L = {} (outperformance {:.6})",
                result.best.short, result.best.long, result.best_outperformance
            );
            print_metrics(&backtester);

            let output_dir = &app.output.output_dir;
            let overview = output_dir.join("optimization_overview.csv");
            write_overview_csv(&result, &overview)?;
            println!("✓ Overview saved to: {}", overview.display());
            for path in write_run_reports(&backtester, output_dir)? {
                println!("✓ Report saved to: {}", path.display());
            }
            if app.output.chart {
                let path = save_chart(&backtester, output_dir)?;
                println!("✓ Chart saved to: {}", path.display());
            }
        }
    }

    info!("done");
    println!("\n✓ Completed successfully!");
    Ok(())
}

//! Charts of the buy-and-hold and strategy growth curves.

use anyhow::{Context, bail};
use backtesting::CumulativeCurves;
use plotters::prelude::*;
use smalab::core::io::ensure_parent_dir;
use std::path::PathBuf;
use tracing::info;

/// Something that can present the result of a backtest.
pub trait ResultRenderer {
    fn render(&self, title: &str, curves: &CumulativeCurves<'_>) -> anyhow::Result<()>;
}

/// Renders both curves as a line chart into a PNG file.
#[derive(Debug, Clone)]
pub struct PngChart {
    pub path: PathBuf,
    pub size: (u32, u32),
}

impl PngChart {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size: (1200, 800),
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }
}

impl ResultRenderer for PngChart {
    fn render(&self, title: &str, curves: &CumulativeCurves<'_>) -> anyhow::Result<()> {
        let Some((lo, hi)) = curves.value_range() else {
            bail!("nothing to plot for '{}': the evaluated window is empty", title);
        };
        // flat curves still need a non-empty y range
        let pad = ((hi - lo) * 0.05).max(1e-3);

        ensure_parent_dir(&self.path)
            .with_context(|| format!("creating directory for {}", self.path.display()))?;

        let root = BitMapBackend::new(&self.path, self.size).into_drawing_area();
        root.fill(&WHITE)?;

        let n = curves.len();
        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 28).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0usize..n, (lo - pad)..(hi + pad))?;

        let dates = curves.dates;
        chart
            .configure_mesh()
            .x_labels(8)
            .x_label_formatter(&|i: &usize| {
                dates
                    .get(*i)
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default()
            })
            .y_desc("Growth of 1")
            .draw()?;

        chart
            .draw_series(LineSeries::new(
                curves.creturns.iter().enumerate().map(|(i, v)| (i, *v)),
                &BLUE,
            ))?
            .label("creturns")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

        chart
            .draw_series(LineSeries::new(
                curves.cstrategy.iter().enumerate().map(|(i, v)| (i, *v)),
                &RED,
            ))?
            .label("cstrategy")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()
            .with_context(|| format!("writing chart to {}", self.path.display()))?;
        info!(path = %self.path.display(), "chart saved");
        Ok(())
    }
}

use super::{DataError, PriceObservation, PriceSeries};
use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Which table columns to read and which slice of the history to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    /// Symbol to load. Only used for filtering when `symbol_column` is set.
    pub symbol: String,
    /// Inclusive lower bound, `None` for the start of the table
    pub start: Option<NaiveDate>,
    /// Inclusive upper bound, `None` for the end of the table
    pub end: Option<NaiveDate>,
    pub date_column: String,
    pub close_column: String,
    /// Column holding the ticker in multi-symbol tables
    pub symbol_column: Option<String>,
}

impl Default for TableSpec {
    fn default() -> Self {
        Self {
            symbol: "stock".to_string(),
            start: None,
            end: None,
            date_column: "timestamp".to_string(),
            close_column: "close".to_string(),
            symbol_column: None,
        }
    }
}

impl TableSpec {
    pub fn for_symbol(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }
}

/// Read a CSV price table (header row required) and derive log returns.
///
/// Rows are filtered to `[start, end]` and sorted by date before returns are
/// computed. Columns other than the date, close and optional symbol column
/// are ignored.
pub fn read_price_table<P: AsRef<Path>>(path: P, spec: &TableSpec) -> Result<PriceSeries, DataError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DataError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), symbol = %spec.symbol, "reading price table");
    parse_price_table(file, spec)
}

/// Same as [`read_price_table`] for any reader.
pub fn parse_price_table<R: Read>(reader: R, spec: &TableSpec) -> Result<PriceSeries, DataError> {
    if let (Some(start), Some(end)) = (spec.start, spec.end) {
        if start > end {
            return Err(DataError::InvalidRange { start, end });
        }
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let date_idx = column_index(&headers, &spec.date_column)?;
    let close_idx = column_index(&headers, &spec.close_column)?;
    let symbol_idx = spec
        .symbol_column
        .as_deref()
        .map(|name| column_index(&headers, name))
        .transpose()?;

    let mut observations = Vec::new();
    let mut n_rows = 0usize;

    for record in reader.records() {
        let record = record?;
        n_rows += 1;
        let line = record.position().map_or(0, |p| p.line());

        if let Some(idx) = symbol_idx {
            if record.get(idx) != Some(spec.symbol.as_str()) {
                continue;
            }
        }

        let raw_date = record.get(date_idx).unwrap_or_default();
        let date = parse_date(raw_date).ok_or_else(|| DataError::InvalidDate {
            line,
            value: raw_date.to_string(),
        })?;

        if !spec.contains(date) {
            continue;
        }

        let raw_close = record.get(close_idx).unwrap_or_default();
        let close = raw_close
            .parse::<f64>()
            .map_err(|_| DataError::InvalidPrice {
                line,
                value: raw_close.to_string(),
            })?;

        observations.push(PriceObservation { date, close });
    }

    observations.sort_by_key(|o| o.date);

    debug!(
        rows = n_rows,
        kept = observations.len(),
        "filtered price table to requested range"
    );

    let series = PriceSeries::from_observations(spec.symbol.clone(), &observations)?;
    info!(
        symbol = %series.symbol,
        observations = series.len(),
        first = ?series.first_date(),
        last = ?series.last_date(),
        "loaded price series"
    );
    Ok(series)
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize, DataError> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .ok_or_else(|| DataError::MissingColumn(name.to_string()))
}

/// Parse `yyyy-mm-dd`, optionally followed by a time of day which is dropped.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.date())
}

//! Tabular export of indicator series (CSV, Parquet) via Polars.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use polars::prelude::*;
use thiserror::Error;

use crate::domain::Bar;
use crate::indicators::series::INDICATOR_COLUMNS;
use crate::indicators::IndicatorSeries;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("polars: {0}")]
    Polars(#[from] PolarsError),

    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// File formats the series can be written as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Parquet,
}

/// `NaN` becomes null.
fn nullable(values: impl Iterator<Item = f64>) -> Vec<Option<f64>> {
    values.map(|v| (!v.is_nan()).then_some(v)).collect()
}

/// Convert an indicator series to a DataFrame with the payload column names.
pub fn indicators_to_dataframe(series: &IndicatorSeries) -> Result<DataFrame, ExportError> {
    let rows = series.rows();
    // NaiveDate::default() is 1970-01-01.
    let epoch = NaiveDate::default();
    let dates: Vec<i32> = rows
        .iter()
        .map(|row| (row.bar.day() - epoch).num_days() as i32)
        .collect();

    let bar_fields: [(&str, fn(&Bar) -> f64); 7] = [
        ("Open", |b| b.open),
        ("High", |b| b.high),
        ("Low", |b| b.low),
        ("Close", |b| b.close),
        ("Volume", |b| b.volume),
        ("Dividends", |b| b.dividends),
        ("Stock Splits", |b| b.splits),
    ];

    let mut columns = Vec::with_capacity(1 + bar_fields.len() + INDICATOR_COLUMNS.len());
    columns.push(Column::new("Date".into(), dates).cast(&DataType::Date)?);
    for (name, field) in bar_fields {
        columns.push(Column::new(
            name.into(),
            nullable(rows.iter().map(|row| field(&row.bar))),
        ));
    }
    for name in INDICATOR_COLUMNS {
        let values = rows
            .iter()
            .map(|row| row.value(name).unwrap_or(f64::NAN));
        columns.push(Column::new(name.into(), nullable(values)));
    }

    Ok(DataFrame::new(columns)?)
}

/// Write the series to `writer` in `format`.
pub fn write_indicators<W: Write>(
    series: &IndicatorSeries,
    format: TableFormat,
    writer: W,
) -> Result<(), ExportError> {
    let mut df = indicators_to_dataframe(series)?;
    match format {
        TableFormat::Csv => {
            CsvWriter::new(writer).include_header(true).finish(&mut df)?;
        }
        TableFormat::Parquet => {
            ParquetWriter::new(writer).finish(&mut df)?;
        }
    }
    Ok(())
}

/// Write the series to a file at `path`.
pub fn write_indicators_file(
    series: &IndicatorSeries,
    format: TableFormat,
    path: &Path,
) -> Result<(), ExportError> {
    let file = fs::File::create(path)?;
    write_indicators(series, format, file)
}

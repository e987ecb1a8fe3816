//! Per-instrument feature files as polars DataFrames.

use crate::{DataError, Result};
use malaga_traits::{Date, FeatureRow, NewsRow};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;

/// Days from 0001-01-01 (CE day 1) to the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Columns that never hold features.
const DATE_COLUMN: &str = "date";
const SYMBOL_COLUMN: &str = "symbol";

/// A feature table for one instrument: a `date` column, an optional
/// `symbol` column, and numeric feature columns.
#[derive(Debug, Clone)]
pub struct FeatureFrame {
    df: DataFrame,
}

impl FeatureFrame {
    /// Wraps an existing DataFrame.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingColumn`] without a `date` column.
    pub fn new(df: DataFrame) -> Result<Self> {
        if df.column(DATE_COLUMN).is_err() {
            return Err(DataError::MissingColumn(DATE_COLUMN.to_string()));
        }
        Ok(Self { df })
    }

    /// Reads a CSV file with a header row. ISO dates are parsed to a date
    /// column.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or lacks a `date` column.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .map_parse_options(|opts| opts.with_try_parse_dates(true))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;
        Self::new(df)
    }

    /// The wrapped DataFrame.
    pub const fn data(&self) -> &DataFrame {
        &self.df
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Names of the feature columns, in file order.
    pub fn feature_columns(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .into_iter()
            .map(|name| name.as_str())
            .filter(|name| *name != DATE_COLUMN && *name != SYMBOL_COLUMN)
            .map(str::to_string)
            .collect()
    }

    /// Row dates. Accepts a polars date column or ISO `YYYY-MM-DD` strings.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Parse`] for null or malformed dates.
    pub fn dates(&self) -> Result<Vec<Date>> {
        let column = self.df.column(DATE_COLUMN)?;
        match column.dtype() {
            DataType::Date => column
                .as_materialized_series()
                .date()?
                .into_iter()
                .map(|d: Option<i32>| {
                    d.and_then(|d| Date::from_num_days_from_ce_opt(d + UNIX_EPOCH_DAYS_FROM_CE))
                        .ok_or_else(|| DataError::Parse("null or out-of-range date".to_string()))
                })
                .collect(),
            DataType::String => column
                .as_materialized_series()
                .str()?
                .into_iter()
                .map(|s: Option<&str>| {
                    let s = s.ok_or_else(|| DataError::Parse("null date".to_string()))?;
                    let day = s.get(..10).unwrap_or(s);
                    Date::parse_from_str(day, "%Y-%m-%d")
                        .map_err(|e| DataError::Parse(format!("date '{s}': {e}")))
                })
                .collect(),
            other => Err(DataError::Parse(format!(
                "date column has unsupported type {other}"
            ))),
        }
    }

    /// Per-row symbols from the `symbol` column, or `default` throughout.
    ///
    /// # Errors
    ///
    /// Returns an error if the `symbol` column is not textual.
    pub fn symbols(&self, default: &str) -> Result<Vec<String>> {
        match self.df.column(SYMBOL_COLUMN) {
            Ok(column) => Ok(column
                .as_materialized_series()
                .str()?
                .into_iter()
                .map(|s: Option<&str>| s.unwrap_or(default).to_string())
                .collect()),
            Err(_) => Ok(vec![default.to_string(); self.height()]),
        }
    }

    /// A feature column as floats, nulls preserved.
    fn numeric(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let cast = self.df.column(name)?.cast(&DataType::Float64)?;
        Ok(cast.as_materialized_series().f64()?.into_iter().collect())
    }

    fn columns(&self) -> Result<Vec<(String, Vec<Option<f64>>)>> {
        self.feature_columns()
            .into_iter()
            .map(|name| {
                let values = self.numeric(&name)?;
                Ok((name, values))
            })
            .collect()
    }

    /// Converts to price feature rows, one per file row.
    ///
    /// Null or non-finite values become NaN and the row is kept, so later
    /// positional shifts see the full series. The count of rows holding at
    /// least one such value is returned alongside.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingColumn`] without `ret_1` and `ret_21`
    /// columns, or a parse error for bad dates.
    pub fn to_feature_rows(&self, default_symbol: &str) -> Result<(Vec<FeatureRow>, usize)> {
        let columns = self.columns()?;
        for required in [malaga_traits::RET_1, malaga_traits::RET_21] {
            if !columns.iter().any(|(name, _)| name == required) {
                return Err(DataError::MissingColumn(required.to_string()));
            }
        }

        let dates = self.dates()?;
        let symbols = self.symbols(default_symbol)?;
        let mut rows = Vec::with_capacity(dates.len());

        for (i, (date, symbol)) in dates.into_iter().zip(symbols).enumerate() {
            let features: BTreeMap<String, f64> = columns
                .iter()
                .map(|(name, values)| {
                    let value = values[i].filter(|v| v.is_finite()).unwrap_or(f64::NAN);
                    (name.clone(), value)
                })
                .collect();
            rows.push(
                FeatureRow::new(symbol, date, features)
                    .map_err(|e| DataError::Parse(e.to_string()))?,
            );
        }
        let incomplete = rows.iter().filter(|r| !r.is_complete()).count();
        Ok((rows, incomplete))
    }

    /// Converts to news rows. Null or non-finite values are left out of the
    /// row rather than dropping it.
    ///
    /// # Errors
    ///
    /// Returns a parse error for bad dates or a non-textual symbol column.
    pub fn to_news_rows(&self, default_symbol: &str) -> Result<Vec<NewsRow>> {
        let columns = self.columns()?;
        let dates = self.dates()?;
        let symbols = self.symbols(default_symbol)?;

        Ok(dates
            .into_iter()
            .zip(symbols)
            .enumerate()
            .map(|(i, (date, symbol))| NewsRow {
                symbol,
                date,
                values: columns
                    .iter()
                    .filter_map(|(name, values)| {
                        values[i]
                            .filter(|v| v.is_finite())
                            .map(|v| (name.clone(), v))
                    })
                    .collect(),
            })
            .collect())
    }
}

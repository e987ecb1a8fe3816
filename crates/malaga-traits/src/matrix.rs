//! Dense feature matrices handed to scorers.
//!
//! A [`FeatureMatrix`] pairs an `ndarray` matrix (rows × features) with the
//! [`FeatureSchema`] naming its columns. Models remember the schema they were
//! fit with and refuse to predict on anything else.

use crate::{FeatureRow, MalagaError, Result};
use derive_more::Deref;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered feature names forming the columns of a matrix.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deref, Serialize, Deserialize)]
pub struct FeatureSchema(Vec<String>);

impl FeatureSchema {
    /// Creates a schema from column names in order.
    pub const fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    /// The schema implied by a row's feature names.
    pub fn of_row(row: &FeatureRow) -> Self {
        Self(row.features().keys().cloned().collect())
    }

    /// Column names.
    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Describes how `other` differs from this schema, or `None` if equal.
    pub fn diff(&self, other: &Self) -> Option<String> {
        if self == other {
            return None;
        }
        let missing: Vec<&str> = self
            .0
            .iter()
            .filter(|name| !other.0.contains(name))
            .map(String::as_str)
            .collect();
        let extra: Vec<&str> = other
            .0
            .iter()
            .filter(|name| !self.0.contains(name))
            .map(String::as_str)
            .collect();
        Some(format!(
            "schema mismatch: missing [{}], unexpected [{}]",
            missing.join(", "),
            extra.join(", ")
        ))
    }
}

impl fmt::Display for FeatureSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Feature values laid out row-major with named columns.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    schema: FeatureSchema,
    values: Array2<f64>,
}

impl FeatureMatrix {
    /// Wraps a matrix whose columns follow `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`MalagaError::InvalidData`] if the column count differs from
    /// the schema length.
    pub fn new(schema: FeatureSchema, values: Array2<f64>) -> Result<Self> {
        if values.ncols() != schema.len() {
            return Err(MalagaError::InvalidData(format!(
                "matrix has {} columns, schema has {}",
                values.ncols(),
                schema.len()
            )));
        }
        Ok(Self { schema, values })
    }

    /// Assembles rows into a matrix, taking the schema from the first row.
    ///
    /// # Errors
    ///
    /// Returns [`MalagaError::InvalidData`] on an empty input or when any row
    /// carries a different set of feature names.
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a FeatureRow>) -> Result<Self> {
        let rows: Vec<&FeatureRow> = rows.into_iter().collect();
        let first = rows
            .first()
            .ok_or_else(|| MalagaError::InvalidData("no rows to assemble".to_string()))?;
        let schema = FeatureSchema::of_row(first);
        Self::assemble(schema, &rows).map_err(MalagaError::InvalidData)
    }

    /// Assembles rows into a matrix with a fixed, expected schema.
    ///
    /// This is the inference path: every row must carry exactly the names in
    /// `schema`. Nothing is reordered, filled or dropped.
    ///
    /// # Errors
    ///
    /// Returns [`MalagaError::Inference`] naming the first offending symbol.
    pub fn with_schema<'a>(
        schema: &FeatureSchema,
        rows: impl IntoIterator<Item = &'a FeatureRow>,
    ) -> Result<Self> {
        let rows: Vec<&FeatureRow> = rows.into_iter().collect();
        Self::assemble(schema.clone(), &rows).map_err(MalagaError::inference)
    }

    fn assemble(schema: FeatureSchema, rows: &[&FeatureRow]) -> std::result::Result<Self, String> {
        let mut values = Array2::zeros((rows.len(), schema.len()));
        for (i, row) in rows.iter().enumerate() {
            let row_schema = FeatureSchema::of_row(row);
            if let Some(diff) = schema.diff(&row_schema) {
                return Err(format!("{} on {}: {diff}", row.symbol(), row.date()));
            }
            for (j, value) in row.features().values().enumerate() {
                values[[i, j]] = *value;
            }
        }
        Ok(Self { schema, values })
    }

    /// Column names.
    pub const fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// The underlying values.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    /// Number of feature columns.
    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    /// Whether the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Date, RET_1, RET_21};

    fn row(symbol: &str, extra: &[(&'static str, f64)]) -> FeatureRow {
        let date = Date::from_ymd_opt(2024, 5, 1).unwrap();
        let mut pairs = vec![(RET_1, 0.01), (RET_21, 0.1)];
        pairs.extend_from_slice(extra);
        FeatureRow::from_pairs(symbol, date, pairs).unwrap()
    }

    #[test]
    fn test_from_rows_orders_columns_by_name() {
        let rows = vec![row("A", &[("mom", 1.0)]), row("B", &[("mom", 2.0)])];
        let matrix = FeatureMatrix::from_rows(&rows).unwrap();

        assert_eq!(matrix.nrows(), 2);
        assert_eq!(matrix.ncols(), 3);
        assert_eq!(matrix.schema().names(), &["mom", "ret_1", "ret_21"]);
        assert_eq!(matrix.values()[[1, 0]], 2.0);
    }

    #[test]
    fn test_from_rows_rejects_mixed_schemas() {
        let rows = vec![row("A", &[("mom", 1.0)]), row("B", &[])];
        let result = FeatureMatrix::from_rows(&rows);
        assert!(matches!(result, Err(MalagaError::InvalidData(_))));
    }

    #[test]
    fn test_from_rows_empty() {
        let rows: Vec<FeatureRow> = Vec::new();
        assert!(FeatureMatrix::from_rows(&rows).is_err());
    }

    #[test]
    fn test_with_schema_mismatch_is_inference_error() {
        let schema = FeatureSchema::new(vec![
            "mom".to_string(),
            "ret_1".to_string(),
            "ret_21".to_string(),
        ]);
        let rows = vec![row("A", &[("vol", 1.0)])];
        let err = FeatureMatrix::with_schema(&schema, &rows).unwrap_err();

        assert!(matches!(err, MalagaError::Inference { date: None, .. }));
        let message = err.to_string();
        assert!(message.contains("missing [mom]"));
        assert!(message.contains("unexpected [vol]"));
    }

    #[test]
    fn test_with_schema_empty_rows_is_ok() {
        let schema = FeatureSchema::new(vec!["ret_1".to_string()]);
        let rows: Vec<FeatureRow> = Vec::new();
        let matrix = FeatureMatrix::with_schema(&schema, &rows).unwrap();
        assert!(matrix.is_empty());
        assert_eq!(matrix.ncols(), 1);
    }

    #[test]
    fn test_new_checks_column_count() {
        let schema = FeatureSchema::new(vec!["x".to_string()]);
        assert!(FeatureMatrix::new(schema, Array2::zeros((2, 2))).is_err());
    }
}

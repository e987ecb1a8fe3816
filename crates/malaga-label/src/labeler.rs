//! Target construction.

use crate::join::join_news;
use malaga_traits::{
    Date, FeatureMatrix, FeatureRow, LabeledRow, MalagaError, NewsRow, Result, SnapshotBook,
    Symbol,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Labeler configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelConfig {
    /// Number of observations ahead whose `ret_21` becomes the target.
    pub horizon: usize,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self { horizon: 21 }
    }
}

/// Builds supervised-learning rows from the joined feature streams.
#[derive(Debug, Clone)]
pub struct Labeler {
    config: LabelConfig,
}

impl Labeler {
    /// Creates a labeler.
    ///
    /// # Errors
    ///
    /// Returns [`MalagaError::InvalidConfig`] for a zero horizon.
    pub fn new(config: LabelConfig) -> Result<Self> {
        if config.horizon == 0 {
            return Err(MalagaError::InvalidConfig(
                "horizon must be a positive number of periods".to_string(),
            ));
        }
        Ok(Self { config })
    }

    /// The configured horizon.
    pub const fn horizon(&self) -> usize {
        self.config.horizon
    }

    /// Joins `news` onto `prices` and attaches targets.
    ///
    /// For each instrument, rows are sorted by date and row `i` receives
    /// `ret_21` of row `i + horizon`; the final `horizon` rows have no target
    /// and are dropped. The shift runs over every observation, incomplete
    /// ones included, and never crosses instruments. Afterwards rows whose
    /// own features are incomplete or whose target is not finite are dropped.
    /// Output rows are ordered by date, then by the order instruments first
    /// appear in `prices`.
    ///
    /// # Errors
    ///
    /// - [`MalagaError::EmptyUniverse`] if `prices` is empty
    /// - [`MalagaError::Training`] if no row has a resolvable target
    pub fn label(&self, prices: &[FeatureRow], news: &[NewsRow]) -> Result<LabeledSet> {
        if prices.is_empty() {
            return Err(MalagaError::EmptyUniverse(
                "no price feature rows to label".to_string(),
            ));
        }

        let joined = join_news(prices, news);
        let horizon = self.config.horizon;

        // Group per instrument, remembering first-seen order.
        let mut order: Vec<Symbol> = Vec::new();
        let mut series: HashMap<Symbol, Vec<FeatureRow>> = HashMap::new();
        for row in joined {
            let symbol = row.symbol().to_string();
            series
                .entry(symbol)
                .or_insert_with_key(|s| {
                    order.push(s.clone());
                    Vec::new()
                })
                .push(row);
        }

        let mut labeled: Vec<(usize, LabeledRow)> = Vec::new();
        let mut dropped = 0usize;
        let mut longest = 0usize;
        for (position, symbol) in order.iter().enumerate() {
            let Some(mut rows) = series.remove(symbol) else {
                continue;
            };
            rows.sort_by_key(FeatureRow::date);
            let observed = rows.len();
            longest = longest.max(observed);

            let targets: Vec<f64> = rows.iter().skip(horizon).map(FeatureRow::ret_21).collect();
            let kept_before = labeled.len();
            for (row, target) in rows.into_iter().zip(targets) {
                if target.is_finite() && row.is_complete() {
                    labeled.push((position, LabeledRow::new(row, target)));
                }
            }
            let kept = labeled.len() - kept_before;
            dropped += observed - kept;
            debug!(%symbol, kept, "labeled instrument");
        }

        if labeled.is_empty() {
            return Err(MalagaError::Training(format!(
                "no labeled rows: horizon {horizon} exceeds the available history \
                 (longest instrument series has {longest} rows)"
            )));
        }

        labeled.sort_by(|(pa, a), (pb, b)| a.row.date().cmp(&b.row.date()).then(pa.cmp(pb)));
        let rows: Vec<LabeledRow> = labeled.into_iter().map(|(_, row)| row).collect();

        info!(
            rows = rows.len(),
            instruments = order.len(),
            horizon,
            "labels constructed"
        );

        Ok(LabeledSet {
            rows,
            horizon,
            dropped,
        })
    }
}

/// Labeled rows ready for training and simulation.
#[derive(Debug, Clone)]
pub struct LabeledSet {
    rows: Vec<LabeledRow>,
    horizon: usize,
    dropped: usize,
}

impl LabeledSet {
    /// Rows ordered by date, then instrument first-seen order.
    pub fn rows(&self) -> &[LabeledRow] {
        &self.rows
    }

    /// The horizon used to build targets.
    pub const fn horizon(&self) -> usize {
        self.horizon
    }

    /// Number of joined rows dropped for lack of a resolvable target or
    /// complete features.
    pub const fn dropped(&self) -> usize {
        self.dropped
    }

    /// Number of labeled rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows survived.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct dates, ascending.
    pub fn dates(&self) -> Vec<Date> {
        let mut dates: Vec<Date> = self.rows.iter().map(|r| r.row.date()).collect();
        dates.dedup();
        dates
    }

    /// Distinct symbols in first-seen order.
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut seen = std::collections::HashSet::new();
        self.rows
            .iter()
            .map(|r| r.row.symbol())
            .filter(|s| seen.insert(*s))
            .map(str::to_string)
            .collect()
    }

    /// Feature matrix and target vector for fitting.
    ///
    /// # Errors
    ///
    /// Returns [`MalagaError::InvalidData`] if rows disagree on feature names.
    pub fn training_data(&self) -> Result<(FeatureMatrix, Vec<f64>)> {
        let matrix = FeatureMatrix::from_rows(self.rows.iter().map(|r| &r.row))?;
        let targets = self.rows.iter().map(|r| r.target).collect();
        Ok((matrix, targets))
    }

    /// Per-date snapshots of the labeled feature rows.
    ///
    /// # Errors
    ///
    /// Propagates snapshot construction errors.
    pub fn snapshots(&self) -> Result<SnapshotBook> {
        SnapshotBook::from_rows(self.rows.iter().map(|r| r.row.clone()))
    }
}

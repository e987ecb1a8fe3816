//! Cross-sections of feature rows sharing one date.

use crate::{Date, FeatureRow, MalagaError, Result};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// All instruments' rows for a single date, at most one per instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    date: Date,
    rows: Vec<FeatureRow>,
}

impl Snapshot {
    /// Builds a snapshot, keeping the first row seen for each symbol.
    ///
    /// # Errors
    ///
    /// Returns [`MalagaError::InvalidData`] if a row belongs to another date.
    pub fn new(date: Date, rows: impl IntoIterator<Item = FeatureRow>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut kept = Vec::new();
        for row in rows {
            if row.date() != date {
                return Err(MalagaError::InvalidData(format!(
                    "row for {} dated {} in snapshot for {date}",
                    row.symbol(),
                    row.date()
                )));
            }
            if seen.insert(row.symbol().to_string()) {
                kept.push(row);
            } else {
                debug!(symbol = row.symbol(), %date, "dropping duplicate row");
            }
        }
        Ok(Self { date, rows: kept })
    }

    /// The snapshot date.
    pub const fn date(&self) -> Date {
        self.date
    }

    /// Rows in first-seen order.
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    /// Realized single-period returns by symbol, in row order.
    pub fn returns(&self) -> Vec<(&str, f64)> {
        self.rows.iter().map(|r| (r.symbol(), r.ret_1())).collect()
    }

    /// Number of instruments.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the snapshot has no instruments.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Supplies the snapshot for a simulated date.
pub trait SnapshotSource {
    /// Returns the snapshot for `date`.
    ///
    /// # Errors
    ///
    /// Returns [`MalagaError::MissingSnapshot`] when there is no data for
    /// `date`; the simulator treats that as a skipped day.
    fn snapshot(&self, date: Date) -> Result<Snapshot>;
}

/// Pre-materialized snapshots keyed by date.
#[derive(Debug, Clone, Default)]
pub struct SnapshotBook {
    snapshots: BTreeMap<Date, Snapshot>,
}

impl SnapshotBook {
    /// Groups rows by date. Within a date the first row per symbol wins.
    ///
    /// # Errors
    ///
    /// Propagates [`Snapshot::new`] errors.
    pub fn from_rows(rows: impl IntoIterator<Item = FeatureRow>) -> Result<Self> {
        let mut grouped: BTreeMap<Date, Vec<FeatureRow>> = BTreeMap::new();
        for row in rows {
            grouped.entry(row.date()).or_default().push(row);
        }
        let snapshots = grouped
            .into_iter()
            .map(|(date, rows)| Snapshot::new(date, rows).map(|s| (date, s)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(Self { snapshots })
    }

    /// Dates with data, ascending.
    pub fn dates(&self) -> Vec<Date> {
        self.snapshots.keys().copied().collect()
    }

    /// The earliest date with data.
    pub fn first_date(&self) -> Option<Date> {
        self.snapshots.keys().next().copied()
    }

    /// The latest date with data.
    pub fn last_date(&self) -> Option<Date> {
        self.snapshots.keys().next_back().copied()
    }

    /// Looks up a snapshot without the error wrapping.
    pub fn get(&self, date: Date) -> Option<&Snapshot> {
        self.snapshots.get(&date)
    }

    /// Number of dates.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether no dates are present.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl SnapshotSource for SnapshotBook {
    fn snapshot(&self, date: Date) -> Result<Snapshot> {
        self.snapshots
            .get(&date)
            .cloned()
            .ok_or(MalagaError::MissingSnapshot(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RET_1, RET_21};

    fn d(day: u32) -> Date {
        Date::from_ymd_opt(2024, 2, day).unwrap()
    }

    fn row(symbol: &str, date: Date, ret: f64) -> FeatureRow {
        FeatureRow::from_pairs(symbol, date, [(RET_1, ret), (RET_21, 0.0)]).unwrap()
    }

    #[test]
    fn test_snapshot_first_occurrence_wins() {
        let snap = Snapshot::new(
            d(1),
            vec![row("A", d(1), 0.1), row("B", d(1), 0.2), row("A", d(1), 0.9)],
        )
        .unwrap();

        assert_eq!(snap.len(), 2);
        assert_eq!(snap.returns(), vec![("A", 0.1), ("B", 0.2)]);
    }

    #[test]
    fn test_snapshot_rejects_foreign_dates() {
        let result = Snapshot::new(d(1), vec![row("A", d(2), 0.1)]);
        assert!(matches!(result, Err(MalagaError::InvalidData(_))));
    }

    #[test]
    fn test_book_groups_and_orders_dates() {
        let book = SnapshotBook::from_rows(vec![
            row("A", d(5), 0.0),
            row("A", d(1), 0.0),
            row("B", d(1), 0.0),
        ])
        .unwrap();

        assert_eq!(book.dates(), vec![d(1), d(5)]);
        assert_eq!(book.first_date(), Some(d(1)));
        assert_eq!(book.last_date(), Some(d(5)));
        assert_eq!(book.snapshot(d(1)).unwrap().len(), 2);
    }

    #[test]
    fn test_book_missing_snapshot_is_recoverable() {
        let book = SnapshotBook::from_rows(vec![row("A", d(1), 0.0)]).unwrap();
        let err = book.snapshot(d(2)).unwrap_err();
        assert!(matches!(err, MalagaError::MissingSnapshot(date) if date == d(2)));
        assert!(err.is_recoverable());
    }
}

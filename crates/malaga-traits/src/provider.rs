//! Feature provider seam.
//!
//! Feature computation lives outside this workspace. A [`FeatureProvider`]
//! hands over, per instrument, the price-derived feature rows and the
//! news-derived rows for a date range. Each instrument's outcome is an
//! explicit [`InstrumentFetch`], so "no data" is never confused with a zero.

use crate::{Date, FeatureRow, MalagaError, NewsRow, Result, Symbol};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Inclusive date bounds; an open side means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First date to include.
    pub start: Option<Date>,
    /// Last date to include.
    pub end: Option<Date>,
}

impl DateRange {
    /// A range with both bounds.
    pub const fn new(start: Date, end: Date) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// An unbounded range.
    pub const fn all() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// Whether `date` falls inside the range.
    pub fn contains(&self, date: Date) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }

    /// Checks that the start is not after the end.
    ///
    /// # Errors
    ///
    /// Returns [`MalagaError::InvalidDate`] for an inverted range.
    pub fn validate(&self) -> Result<()> {
        match (self.start, self.end) {
            (Some(s), Some(e)) if s > e => Err(MalagaError::InvalidDate(format!(
                "range start {s} is after end {e}"
            ))),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmt_side = |d: Option<Date>| d.map_or_else(|| "..".to_string(), |d| d.to_string());
        write!(f, "{} to {}", fmt_side(self.start), fmt_side(self.end))
    }
}

/// Typed marker for an instrument the provider could not serve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureGap {
    /// The instrument that has no data.
    pub symbol: Symbol,
    /// Why no data was returned.
    pub reason: String,
}

impl FeatureGap {
    /// Creates a gap marker.
    pub fn new(symbol: impl Into<Symbol>, reason: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FeatureGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.symbol, self.reason)
    }
}

/// Per-instrument fetch outcome: rows, or an explicit gap.
pub type InstrumentFetch<T> = std::result::Result<Vec<T>, FeatureGap>;

/// Everything fetched for a universe.
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    /// Price-derived rows for every instrument that had data.
    pub prices: Vec<FeatureRow>,
    /// News-derived rows; may be empty.
    pub news: Vec<NewsRow>,
    /// Instruments without price data.
    pub gaps: Vec<FeatureGap>,
}

impl FeatureSet {
    /// Distinct symbols with price rows, in first-seen order.
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut seen = std::collections::HashSet::new();
        self.prices
            .iter()
            .filter(|row| seen.insert(row.symbol()))
            .map(|row| row.symbol().to_string())
            .collect()
    }
}

/// Source of per-instrument feature streams.
///
/// Implementations must uphold the no-look-ahead contract: every feature on
/// date `t` may only use information available through `t`.
pub trait FeatureProvider: Send + Sync {
    /// Name of the provider, used in logs.
    fn name(&self) -> &str;

    /// Price-derived feature rows for one instrument. Each row carries at
    /// least `ret_1` and `ret_21`.
    fn price_features(&self, symbol: &str, range: &DateRange) -> InstrumentFetch<FeatureRow>;

    /// News-derived rows for one instrument. An instrument without news
    /// should return `Ok(vec![])`.
    fn news_features(&self, symbol: &str, range: &DateRange) -> InstrumentFetch<NewsRow>;

    /// Fetches the whole universe, one instrument per task.
    ///
    /// Instruments are fetched in parallel; results are concatenated in
    /// universe order so the output is deterministic. Price gaps are logged
    /// and collected; news gaps are logged and treated as "no news".
    ///
    /// # Errors
    ///
    /// Returns [`MalagaError::EmptyUniverse`] if the universe is empty or no
    /// instrument produced a price row.
    fn fetch_universe(&self, symbols: &[Symbol], range: &DateRange) -> Result<FeatureSet> {
        if symbols.is_empty() {
            return Err(MalagaError::EmptyUniverse(
                "no instruments configured".to_string(),
            ));
        }
        range.validate()?;

        info!(
            provider = self.name(),
            instruments = symbols.len(),
            %range,
            "fetching features"
        );

        let outcomes: Vec<(InstrumentFetch<FeatureRow>, InstrumentFetch<NewsRow>)> = symbols
            .par_iter()
            .map(|symbol| {
                (
                    self.price_features(symbol, range),
                    self.news_features(symbol, range),
                )
            })
            .collect();

        let mut set = FeatureSet::default();
        for (symbol, (prices, news)) in symbols.iter().zip(outcomes) {
            match prices {
                Ok(rows) if rows.is_empty() => {
                    warn!(%symbol, "no price rows in range");
                    set.gaps.push(FeatureGap::new(symbol.as_str(), "no rows in range"));
                }
                Ok(rows) => {
                    debug!(%symbol, rows = rows.len(), "price features");
                    set.prices.extend(rows);
                }
                Err(gap) => {
                    warn!(%gap, "price features unavailable");
                    set.gaps.push(gap);
                }
            }
            match news {
                Ok(rows) => set.news.extend(rows),
                Err(gap) => warn!(%gap, "news features unavailable, sentiment defaults to 0"),
            }
        }

        if set.prices.is_empty() {
            return Err(MalagaError::EmptyUniverse(format!(
                "no feature rows for {} instrument(s) in {range}",
                symbols.len()
            )));
        }

        info!(
            price_rows = set.prices.len(),
            news_rows = set.news.len(),
            gaps = set.gaps.len(),
            "features fetched"
        );
        Ok(set)
    }
}

//! Portfolio weights and turnover.

use crate::Selection;
use malaga_traits::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Portfolio weights keyed by symbol. Absent symbols hold zero weight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightVector(BTreeMap<Symbol, f64>);

impl WeightVector {
    /// An all-zero weight vector.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Equal weights `1/n` over the `n` selected instruments.
    ///
    /// An empty selection yields an empty vector.
    pub fn equal(selection: &Selection) -> Self {
        if selection.is_empty() {
            return Self::empty();
        }
        let weight = 1.0 / selection.len() as f64;
        Self(
            selection
                .symbols()
                .map(|s| (s.to_string(), weight))
                .collect(),
        )
    }

    /// Weight of `symbol`, zero when not held.
    pub fn get(&self, symbol: &str) -> f64 {
        self.0.get(symbol).copied().unwrap_or(0.0)
    }

    /// Held symbols with their weights, in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(s, w)| (s.as_str(), *w))
    }

    /// Number of held symbols.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of weights.
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Sum of absolute weights.
    pub fn l1_norm(&self) -> f64 {
        self.0.values().map(|w| w.abs()).sum()
    }

    /// Weighted return over the union of held and quoted symbols.
    ///
    /// A held symbol without a quote, or with a non-finite one, contributes
    /// zero.
    pub fn weighted_return<'a>(&self, returns: impl IntoIterator<Item = (&'a str, f64)>) -> f64 {
        let quotes: BTreeMap<&str, f64> = returns
            .into_iter()
            .filter(|(_, r)| r.is_finite())
            .collect();
        self.iter()
            .map(|(symbol, weight)| weight * quotes.get(symbol).copied().unwrap_or(0.0))
            .sum()
    }
}

/// L1 distance between two weight vectors over the union of their symbols.
///
/// Always non-negative; zero for identical vectors. Moving from an empty
/// vector to a fully invested one costs `1.0`.
pub fn turnover(prior: &WeightVector, current: &WeightVector) -> f64 {
    let symbols: BTreeSet<&str> = prior
        .0
        .keys()
        .chain(current.0.keys())
        .map(String::as_str)
        .collect();
    symbols
        .into_iter()
        .map(|s| (current.get(s) - prior.get(s)).abs())
        .sum()
}

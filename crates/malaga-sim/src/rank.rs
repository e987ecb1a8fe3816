//! Top-K selection.

use derive_more::Deref;
use malaga_traits::{Score, TopPick};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Ordered top-K instruments for one date, best first.
#[derive(Debug, Clone, Default, PartialEq, Deref, Serialize, Deserialize)]
pub struct Selection(Vec<Score>);

impl Selection {
    /// The selected symbols in rank order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.symbol.as_str())
    }

    /// The selection as a 1-based top-pick report.
    pub fn top_picks(&self) -> Vec<TopPick> {
        self.0
            .iter()
            .enumerate()
            .map(|(i, s)| TopPick::new(i + 1, s.symbol.clone(), s.score))
            .collect()
    }

    /// Consumes the selection, returning the scores.
    pub fn into_inner(self) -> Vec<Score> {
        self.0
    }
}

/// Selects the `k` highest-scored instruments.
///
/// Duplicate symbols keep their first occurrence. Non-finite scores are
/// dropped. The sort is stable, so ties keep input order. Fewer than `k`
/// candidates is not an error.
///
/// # Examples
///
/// ```
/// use malaga_sim::rank;
/// use malaga_traits::{Date, Score};
///
/// let d = Date::from_ymd_opt(2024, 1, 2).unwrap();
/// let scores = vec![
///     Score::new("A", d, 0.1),
///     Score::new("B", d, 0.9),
///     Score::new("C", d, 0.5),
/// ];
/// let selection = rank(&scores, 2);
/// let top: Vec<&str> = selection.symbols().collect();
/// assert_eq!(top, vec!["B", "C"]);
/// ```
pub fn rank(scores: &[Score], k: usize) -> Selection {
    let mut seen = HashSet::with_capacity(scores.len());
    let mut candidates: Vec<Score> = Vec::with_capacity(scores.len());
    let mut non_finite = 0usize;

    for score in scores {
        if !seen.insert(score.symbol.as_str()) {
            continue;
        }
        if score.score.is_finite() {
            candidates.push(score.clone());
        } else {
            non_finite += 1;
        }
    }

    if non_finite > 0 {
        debug!(non_finite, "dropping non-finite scores from ranking");
    }

    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates.truncate(k);
    Selection(candidates)
}

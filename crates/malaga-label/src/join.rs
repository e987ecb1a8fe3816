//! Left join of price features with news features.

use malaga_traits::{Date, FeatureRow, NewsRow, SENTIMENT};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// Left-joins `news` onto `prices` on (symbol, date).
///
/// - Duplicate (symbol, date) keys keep their first occurrence in both streams.
/// - Every output row carries every news field seen anywhere in `news`, plus
///   `sentiment`. Fields without a matching news row, or with a non-finite
///   value, are set to `0.0`.
/// - A news field never overwrites a price feature of the same name.
///
/// Output rows keep the order of `prices`.
pub fn join_news(prices: &[FeatureRow], news: &[NewsRow]) -> Vec<FeatureRow> {
    let mut fields: BTreeSet<&str> = news
        .iter()
        .flat_map(|n| n.values.keys().map(String::as_str))
        .collect();
    fields.insert(SENTIMENT);

    let mut by_key: HashMap<(&str, Date), &NewsRow> = HashMap::with_capacity(news.len());
    for row in news {
        by_key.entry((row.symbol.as_str(), row.date)).or_insert(row);
    }

    let mut seen: HashSet<(&str, Date)> = HashSet::with_capacity(prices.len());
    let mut joined = Vec::with_capacity(prices.len());
    let mut duplicates = 0usize;
    let mut matched = 0usize;

    for price in prices {
        let key = (price.symbol(), price.date());
        if !seen.insert(key) {
            duplicates += 1;
            continue;
        }

        let news_row = by_key.get(&key);
        if news_row.is_some() {
            matched += 1;
        }

        let mut row = price.clone();
        for field in &fields {
            let value = news_row
                .and_then(|n| n.values.get(*field))
                .copied()
                .filter(|v| v.is_finite())
                .unwrap_or(0.0);
            row.insert_if_absent(field, value);
        }
        joined.push(row);
    }

    debug!(
        rows = joined.len(),
        matched,
        duplicates,
        news_fields = fields.len(),
        "joined news onto price features"
    );
    joined
}

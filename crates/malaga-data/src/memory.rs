//! Feature provider serving prepared rows.

use malaga_traits::{
    DateRange, FeatureGap, FeatureProvider, FeatureRow, InstrumentFetch, NewsRow, Symbol,
};
use std::collections::HashMap;

/// Serves feature rows held in memory, keyed by symbol.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    prices: HashMap<Symbol, Vec<FeatureRow>>,
    news: HashMap<Symbol, Vec<NewsRow>>,
}

impl InMemoryProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds price rows, grouped by their symbol.
    #[must_use]
    pub fn with_prices(mut self, rows: impl IntoIterator<Item = FeatureRow>) -> Self {
        for row in rows {
            self.prices
                .entry(row.symbol().to_string())
                .or_default()
                .push(row);
        }
        self
    }

    /// Adds news rows, grouped by their symbol.
    #[must_use]
    pub fn with_news(mut self, rows: impl IntoIterator<Item = NewsRow>) -> Self {
        for row in rows {
            self.news.entry(row.symbol.clone()).or_default().push(row);
        }
        self
    }
}

impl FeatureProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn price_features(&self, symbol: &str, range: &DateRange) -> InstrumentFetch<FeatureRow> {
        let rows = self
            .prices
            .get(symbol)
            .ok_or_else(|| FeatureGap::new(symbol, "unknown symbol"))?;
        Ok(rows
            .iter()
            .filter(|r| range.contains(r.date()))
            .cloned()
            .collect())
    }

    fn news_features(&self, symbol: &str, range: &DateRange) -> InstrumentFetch<NewsRow> {
        Ok(self
            .news
            .get(symbol)
            .map(|rows| {
                rows.iter()
                    .filter(|r| range.contains(r.date))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use malaga_traits::{Date, RET_1, RET_21};

    fn d(day: u32) -> Date {
        Date::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn price(symbol: &str, day: u32) -> FeatureRow {
        FeatureRow::from_pairs(symbol, d(day), [(RET_1, 0.0), (RET_21, 0.0)]).unwrap()
    }

    #[test]
    fn test_serves_by_symbol_and_range() {
        let provider = InMemoryProvider::new()
            .with_prices([price("A", 2), price("A", 3), price("B", 2)])
            .with_news([NewsRow::sentiment("A", d(3), 0.5)]);

        let window = DateRange::new(d(3), d(31));
        assert_eq!(provider.price_features("A", &window).unwrap().len(), 1);
        assert_eq!(provider.news_features("A", &window).unwrap().len(), 1);
        assert!(provider.news_features("B", &window).unwrap().is_empty());
        assert!(provider.price_features("C", &window).is_err());
    }

    #[test]
    fn test_fetch_universe_preserves_order() {
        let provider = InMemoryProvider::new().with_prices([price("A", 2), price("B", 2)]);
        let set = provider
            .fetch_universe(&["B".to_string(), "A".to_string()], &DateRange::all())
            .unwrap();
        assert_eq!(set.symbols(), vec!["B".to_string(), "A".to_string()]);
    }
}

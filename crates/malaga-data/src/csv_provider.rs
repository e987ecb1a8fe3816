//! Feature provider backed by one CSV file per instrument.

use crate::FeatureFrame;
use malaga_traits::{DateRange, FeatureGap, FeatureProvider, FeatureRow, InstrumentFetch, NewsRow};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads `<prices_dir>/<SYMBOL>.csv` and, optionally,
/// `<news_dir>/<SYMBOL>.csv`.
///
/// Price files need `date`, `ret_1` and `ret_21` columns; every other column
/// except `symbol` becomes a feature. Every row is returned; a missing or
/// non-finite value (indicator warm-up) is carried as NaN so label targets
/// stay aligned with the file's observation order. A missing news file means
/// the instrument has no news.
///
/// # Examples
///
/// ```rust,no_run
/// use malaga_data::CsvFeatureProvider;
/// use malaga_traits::{DateRange, FeatureProvider};
///
/// let provider = CsvFeatureProvider::new("data/prices").with_news_dir("data/news");
/// let set = provider.fetch_universe(&["AAPL".to_string()], &DateRange::all())?;
/// # Ok::<(), malaga_traits::MalagaError>(())
/// ```
#[derive(Debug, Clone)]
pub struct CsvFeatureProvider {
    prices_dir: PathBuf,
    news_dir: Option<PathBuf>,
}

impl CsvFeatureProvider {
    /// Create a provider reading price features from `prices_dir`.
    pub fn new(prices_dir: impl Into<PathBuf>) -> Self {
        Self {
            prices_dir: prices_dir.into(),
            news_dir: None,
        }
    }

    /// Also read news features from `news_dir`.
    #[must_use]
    pub fn with_news_dir(mut self, news_dir: impl Into<PathBuf>) -> Self {
        self.news_dir = Some(news_dir.into());
        self
    }

    /// Directory holding price feature files.
    pub fn prices_dir(&self) -> &Path {
        &self.prices_dir
    }

    fn file_for(dir: &Path, symbol: &str) -> PathBuf {
        dir.join(format!("{symbol}.csv"))
    }
}

impl FeatureProvider for CsvFeatureProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn price_features(&self, symbol: &str, range: &DateRange) -> InstrumentFetch<FeatureRow> {
        let path = Self::file_for(&self.prices_dir, symbol);
        if !path.is_file() {
            return Err(FeatureGap::new(
                symbol,
                format!("no price file at {}", path.display()),
            ));
        }

        let (rows, incomplete) = FeatureFrame::read_csv(&path)
            .and_then(|frame| frame.to_feature_rows(symbol))
            .map_err(|e| FeatureGap::new(symbol, format!("{}: {e}", path.display())))?;

        if incomplete > 0 {
            debug!(%symbol, incomplete, "rows with missing feature values");
        }
        Ok(rows.into_iter().filter(|r| range.contains(r.date())).collect())
    }

    fn news_features(&self, symbol: &str, range: &DateRange) -> InstrumentFetch<NewsRow> {
        let Some(dir) = &self.news_dir else {
            return Ok(Vec::new());
        };
        let path = Self::file_for(dir, symbol);
        if !path.is_file() {
            debug!(%symbol, "no news file");
            return Ok(Vec::new());
        }

        let rows = FeatureFrame::read_csv(&path)
            .and_then(|frame| frame.to_news_rows(symbol))
            .map_err(|e| FeatureGap::new(symbol, format!("{}: {e}", path.display())))?;
        Ok(rows.into_iter().filter(|r| range.contains(r.date)).collect())
    }
}

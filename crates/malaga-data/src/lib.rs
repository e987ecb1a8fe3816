//! Data adapters for malaga.
//!
//! This crate connects the pipeline to files on disk:
//! - [`CsvFeatureProvider`] reads per-instrument price and news feature CSVs
//! - [`InMemoryProvider`] serves prepared rows
//! - [`CsvResultWriter`] and [`JsonResultWriter`] persist the top picks and
//!   the equity curve
//!
//! # Usage
//!
//! ```rust,ignore
//! use malaga_data::{CsvFeatureProvider, CsvResultWriter};
//! use malaga_traits::{DateRange, FeatureProvider, ResultWriter};
//!
//! let provider = CsvFeatureProvider::new("data/prices").with_news_dir("data/news");
//! let features = provider.fetch_universe(&symbols, &DateRange::all())?;
//!
//! let writer = CsvResultWriter::new("top_results", "1");
//! writer.write_top_picks(&picks)?;
//! ```
//!
//! # File layout
//!
//! ```text
//! prices/AAPL.csv   date,ret_1,ret_21,<feature>...
//! news/AAPL.csv     date,sentiment[,<feature>...]
//! ```

mod csv_provider;
mod error;
mod frame;
mod memory;
mod writer;

pub use csv_provider::CsvFeatureProvider;
pub use error::DataError;
pub use frame::FeatureFrame;
pub use memory::InMemoryProvider;
pub use writer::{CsvResultWriter, JsonResultWriter, equity_frame, top_picks_frame};

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

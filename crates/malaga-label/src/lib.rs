//! Label construction for malaga.
//!
//! The [`Labeler`] joins the price-derived and news-derived feature streams
//! on (instrument, date) and attaches each row's supervised-learning target:
//! the same instrument's realized `ret_21`, `horizon` observations later.
//!
//! # Example
//!
//! ```rust,ignore
//! use malaga_label::{LabelConfig, Labeler};
//!
//! let labeler = Labeler::new(LabelConfig { horizon: 21 })?;
//! let labeled = labeler.label(&features.prices, &features.news)?;
//! let book = labeled.snapshots()?;
//! ```

mod join;
mod labeler;

pub use join::join_news;
pub use labeler::{LabelConfig, LabeledSet, Labeler};

//! Ranking and portfolio simulation for malaga.
//!
//! This crate turns per-date model scores into a daily rebalanced,
//! equally weighted top-K portfolio:
//! - [`rank`] selects the top-K instruments from a day's scores
//! - [`WeightVector`] and [`turnover`] size the portfolio and its rebalancing
//! - [`PortfolioSimulator`] walks the dates and compounds equity net of costs
//! - [`SimulationSummary`] reports return, risk and IC statistics
//!
//! # Example
//!
//! ```rust,ignore
//! use malaga_sim::{CalendarPolicy, PortfolioSimulator, SimulationConfig};
//!
//! let calendar = CalendarPolicy::Observed.dates(&book.dates(), &range);
//! let mut sim = PortfolioSimulator::new(SimulationConfig::default())?;
//! sim.run(model.as_ref(), &book, &calendar)?;
//! let result = sim.finish()?;
//! println!("final equity: {:.2}", result.summary.final_equity);
//! ```

pub mod calendar;
pub mod ic;
pub mod rank;
pub mod simulator;
pub mod summary;
pub mod weights;

// Re-export main types
pub use calendar::CalendarPolicy;
pub use ic::{calculate_ic, mean_ic};
pub use rank::{Selection, rank};
pub use simulator::{
    FinalSelection, Phase, PortfolioSimulator, PortfolioState, SimulationConfig, SimulationResult,
    score_snapshot,
};
pub use summary::{SimulationSummary, max_drawdown, sharpe_ratio};
pub use weights::{WeightVector, turnover};

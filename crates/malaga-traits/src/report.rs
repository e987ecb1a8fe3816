//! Simulation outputs and the result writer seam.

use crate::{Date, Result, Symbol};
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// One entry of the final day's top list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPick {
    /// 1-based position in the selection.
    pub rank: usize,
    /// The instrument identifier.
    pub symbol: Symbol,
    /// Raw model score.
    pub score: f64,
    /// Score expressed as a percentage (`score * 100`).
    pub score_pct: f64,
}

impl TopPick {
    /// Creates a pick, deriving the percentage from the raw score.
    pub fn new(rank: usize, symbol: impl Into<Symbol>, score: f64) -> Self {
        Self {
            rank,
            symbol: symbol.into(),
            score,
            score_pct: score * 100.0,
        }
    }
}

/// What happened to the portfolio on a simulated date.
#[derive(Debug, Clone, PartialEq, Display, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    /// The portfolio was rebalanced and marked to market.
    #[display("traded")]
    Traded {
        /// Weighted realized return before costs.
        gross_return: f64,
        /// Transaction cost charged (`cost_rate * turnover`).
        cost: f64,
        /// L1 distance between consecutive weight vectors.
        turnover: f64,
        /// Net return applied to equity.
        period_return: f64,
        /// Number of instruments held.
        selected: usize,
    },
    /// No snapshot for this date; equity and holdings carried forward.
    #[display("skipped")]
    Skipped {
        /// Why the date was skipped.
        reason: String,
    },
}

impl StepStatus {
    /// Whether this date was skipped.
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    /// Net period return, `None` for skipped dates.
    pub const fn period_return(&self) -> Option<f64> {
        match self {
            Self::Traded { period_return, .. } => Some(*period_return),
            Self::Skipped { .. } => None,
        }
    }

    /// Turnover, `None` for skipped dates.
    pub const fn turnover(&self) -> Option<f64> {
        match self {
            Self::Traded { turnover, .. } => Some(*turnover),
            Self::Skipped { .. } => None,
        }
    }
}

/// Equity after processing one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    /// Simulated date.
    pub date: Date,
    /// Portfolio equity after this date.
    pub equity: f64,
    /// What happened on this date.
    #[serde(flatten)]
    pub status: StepStatus,
}

/// Persists the final top list and the equity series.
///
/// Storage format is up to the implementation.
pub trait ResultWriter {
    /// Writes the final day's selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be written.
    fn write_top_picks(&self, picks: &[TopPick]) -> Result<()>;

    /// Writes the equity series in date order.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be written.
    fn write_equity(&self, curve: &[EquityPoint]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_pick_pct() {
        let pick = TopPick::new(1, "NVDA", 0.0425);
        assert!((pick.score_pct - 4.25).abs() < 1e-12);
    }

    #[test]
    fn test_step_status_accessors() {
        let traded = StepStatus::Traded {
            gross_return: 0.015,
            cost: 0.01,
            turnover: 1.0,
            period_return: 0.005,
            selected: 2,
        };
        assert_eq!(traded.period_return(), Some(0.005));
        assert_eq!(traded.turnover(), Some(1.0));
        assert!(!traded.is_skipped());
        assert_eq!(traded.to_string(), "traded");

        let skipped = StepStatus::Skipped {
            reason: "holiday".to_string(),
        };
        assert!(skipped.is_skipped());
        assert_eq!(skipped.period_return(), None);
        assert_eq!(skipped.to_string(), "skipped");
    }

    #[test]
    fn test_equity_point_json_is_flat() {
        let point = EquityPoint {
            date: Date::from_ymd_opt(2024, 1, 2).unwrap(),
            equity: 10_050.0,
            status: StepStatus::Skipped {
                reason: "no data".to_string(),
            },
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["date"], "2024-01-02");
        assert_eq!(json["reason"], "no data");
    }
}

//! Performance summary of a finished simulation.

use crate::ic::mean_ic;
use malaga_traits::{Date, EquityPoint, StepStatus, stats::moments};
use serde::Serialize;

/// Trading periods per year used for annualization.
pub const PERIODS_PER_YEAR: f64 = 252.0;

/// Aggregate statistics over an equity curve.
///
/// Ratios that are undefined for the curve (too few traded days, zero
/// volatility) are NaN and serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    /// Starting capital.
    pub initial_equity: f64,
    /// Equity after the last simulated date.
    pub final_equity: f64,
    /// `final_equity / initial_equity - 1`.
    pub total_return: f64,
    /// Geometric annualized return over the traded days.
    pub annualized_return: f64,
    /// Sample volatility of traded-day returns, annualized.
    pub annualized_volatility: f64,
    /// Annualized Sharpe ratio with a zero risk-free rate.
    pub sharpe_ratio: f64,
    /// Largest peak-to-trough equity decline as a fraction of the peak.
    pub max_drawdown: f64,
    /// Mean turnover per traded day.
    pub avg_turnover: f64,
    /// Sum of charged transaction costs, as return fractions.
    pub total_transaction_costs: f64,
    /// Number of dates on which the portfolio traded.
    pub traded_days: usize,
    /// Number of dates recorded as skipped.
    pub skipped_days: usize,
    /// Mean daily information coefficient of scores against same-day returns.
    pub mean_ic: f64,
    /// First simulated date.
    pub first_date: Option<Date>,
    /// Last simulated date.
    pub last_date: Option<Date>,
}

impl SimulationSummary {
    /// Summarizes `curve`, which starts from `initial_equity`.
    pub fn from_curve(initial_equity: f64, curve: &[EquityPoint], ics: &[f64]) -> Self {
        let mut returns = Vec::with_capacity(curve.len());
        let mut turnover_sum = 0.0;
        let mut total_transaction_costs = 0.0;
        for point in curve {
            if let StepStatus::Traded {
                period_return,
                turnover,
                cost,
                ..
            } = &point.status
            {
                returns.push(*period_return);
                turnover_sum += turnover;
                total_transaction_costs += cost;
            }
        }

        let traded_days = returns.len();
        let final_equity = curve.last().map_or(initial_equity, |p| p.equity);
        let total_return = final_equity / initial_equity - 1.0;

        let annualized_return = if traded_days > 0 && 1.0 + total_return > 0.0 {
            (1.0 + total_return).powf(PERIODS_PER_YEAR / traded_days as f64) - 1.0
        } else {
            f64::NAN
        };

        let annualized_volatility = if traded_days > 1 {
            moments(&returns).std * PERIODS_PER_YEAR.sqrt()
        } else {
            f64::NAN
        };

        let avg_turnover = if traded_days > 0 {
            turnover_sum / traded_days as f64
        } else {
            0.0
        };

        Self {
            initial_equity,
            final_equity,
            total_return,
            annualized_return,
            annualized_volatility,
            sharpe_ratio: sharpe_ratio(&returns, PERIODS_PER_YEAR),
            max_drawdown: max_drawdown(initial_equity, curve.iter().map(|p| p.equity)),
            avg_turnover,
            total_transaction_costs,
            traded_days,
            skipped_days: curve.len() - traded_days,
            mean_ic: mean_ic(ics),
            first_date: curve.first().map(|p| p.date),
            last_date: curve.last().map(|p| p.date),
        }
    }

    /// Absolute profit over the simulated period.
    pub fn profit(&self) -> f64 {
        self.final_equity - self.initial_equity
    }
}

/// Annualized Sharpe ratio of per-period returns. NaN with fewer than two
/// finite returns or zero dispersion.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    let m = moments(returns);
    if m.n < 2 || m.std == 0.0 {
        return f64::NAN;
    }
    m.mean / m.std * periods_per_year.sqrt()
}

/// Largest decline from a running equity peak, as a fraction of that peak.
///
/// The running peak starts at `initial_equity`.
pub fn max_drawdown(initial_equity: f64, equity: impl IntoIterator<Item = f64>) -> f64 {
    let mut peak = initial_equity;
    let mut max_dd: f64 = 0.0;
    for value in equity {
        peak = peak.max(value);
        if peak > 0.0 {
            max_dd = max_dd.max((peak - value) / peak);
        }
    }
    max_dd
}

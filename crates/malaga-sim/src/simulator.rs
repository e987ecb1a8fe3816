//! The daily rebalancing portfolio simulator.

use crate::{Selection, SimulationSummary, WeightVector, calculate_ic, rank, turnover};
use derive_more::Display;
use malaga_traits::{
    Date, EquityPoint, FeatureMatrix, MalagaError, Result, Score, Snapshot, SnapshotSource,
    StepStatus, TopPick, TrainedModel,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Simulator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of instruments held each day.
    pub top_k: usize,
    /// Cost charged per unit of turnover, as a return fraction.
    pub transaction_cost: f64,
    /// Starting equity.
    pub initial_capital: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            top_k: 50,
            transaction_cost: 0.0015,
            initial_capital: 10_000.0,
        }
    }
}

impl SimulationConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MalagaError::InvalidConfig`] for a zero `top_k`, a negative
    /// or non-finite cost, or a non-positive or non-finite capital.
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(MalagaError::InvalidConfig(
                "top_k must be at least 1".to_string(),
            ));
        }
        if !self.transaction_cost.is_finite() || self.transaction_cost < 0.0 {
            return Err(MalagaError::InvalidConfig(format!(
                "transaction_cost must be finite and non-negative, got {}",
                self.transaction_cost
            )));
        }
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(MalagaError::InvalidConfig(format!(
                "initial_capital must be finite and positive, got {}",
                self.initial_capital
            )));
        }
        Ok(())
    }
}

/// Lifecycle of a [`PortfolioSimulator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Phase {
    /// Constructed, not yet started.
    #[display("uninitialized")]
    Uninitialized,
    /// Accepting dates.
    #[display("running")]
    Running,
    /// Results taken; no further dates accepted.
    #[display("finished")]
    Finished,
}

/// Mutable portfolio state carried between dates.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    /// Current equity.
    pub equity: f64,
    /// Weights held after the last traded date.
    pub weights: WeightVector,
    /// Last processed date, traded or skipped.
    pub last_date: Option<Date>,
}

impl PortfolioState {
    fn new(initial_capital: f64) -> Self {
        Self {
            equity: initial_capital,
            weights: WeightVector::empty(),
            last_date: None,
        }
    }
}

/// The last traded date's selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalSelection {
    /// Date of the selection.
    pub date: Date,
    /// Instruments held, best first, with raw scores.
    pub selection: Selection,
}

/// Everything a finished simulation produces.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// One point per simulated date, ascending.
    pub equity_curve: Vec<EquityPoint>,
    /// Selection on the last traded date, if any date traded.
    pub final_selection: Option<FinalSelection>,
    /// `final_selection` as a ranked report.
    pub top_picks: Vec<TopPick>,
    /// Aggregate performance.
    pub summary: SimulationSummary,
}

/// Walks dates in order, rebalancing into the equally weighted top-K each
/// day and compounding equity net of turnover costs.
///
/// # Example
///
/// ```
/// use malaga_sim::{PortfolioSimulator, SimulationConfig};
/// use malaga_traits::{Date, Score};
///
/// let d = Date::from_ymd_opt(2024, 1, 2).unwrap();
/// let mut sim = PortfolioSimulator::new(SimulationConfig {
///     top_k: 1,
///     transaction_cost: 0.0,
///     initial_capital: 100.0,
/// })
/// .unwrap();
/// sim.start().unwrap();
/// let point = sim
///     .step(d, &[("A", 0.1)], &[Score::new("A", d, 1.0)])
///     .unwrap();
/// assert!((point.equity - 110.0).abs() < 1e-9);
/// ```
#[derive(Debug)]
pub struct PortfolioSimulator {
    config: SimulationConfig,
    phase: Phase,
    state: PortfolioState,
    curve: Vec<EquityPoint>,
    final_selection: Option<FinalSelection>,
    ics: Vec<f64>,
}

impl PortfolioSimulator {
    /// Creates an uninitialized simulator.
    ///
    /// # Errors
    ///
    /// Returns [`MalagaError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            phase: Phase::Uninitialized,
            state: PortfolioState::new(config.initial_capital),
            curve: Vec::new(),
            final_selection: None,
            ics: Vec::new(),
        })
    }

    /// Current lifecycle phase.
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Current portfolio state.
    pub const fn state(&self) -> &PortfolioState {
        &self.state
    }

    /// Points recorded so far.
    pub fn curve(&self) -> &[EquityPoint] {
        &self.curve
    }

    /// Seeds the portfolio with the initial capital and empty weights.
    ///
    /// # Errors
    ///
    /// Returns [`MalagaError::InvalidState`] unless uninitialized.
    pub fn start(&mut self) -> Result<()> {
        if self.phase != Phase::Uninitialized {
            return Err(MalagaError::InvalidState(format!(
                "cannot start a simulator that is {}",
                self.phase
            )));
        }
        self.state = PortfolioState::new(self.config.initial_capital);
        self.phase = Phase::Running;
        debug!(
            capital = self.config.initial_capital,
            top_k = self.config.top_k,
            "simulation started"
        );
        Ok(())
    }

    fn check_date(&self, date: Date) -> Result<()> {
        if self.phase != Phase::Running {
            return Err(MalagaError::InvalidState(format!(
                "cannot process {date}: simulator is {}",
                self.phase
            )));
        }
        match self.state.last_date {
            Some(last) if date <= last => Err(MalagaError::InvalidDate(format!(
                "{date} is not after the previously processed {last}"
            ))),
            _ => Ok(()),
        }
    }

    /// Processes one traded date.
    ///
    /// Selects the top-K of `scores`, weights them equally, charges
    /// `transaction_cost * turnover` and compounds equity by the net return
    /// realized on `returns`. Instruments missing from `returns` contribute
    /// zero.
    ///
    /// # Errors
    ///
    /// - [`MalagaError::InvalidState`] unless running
    /// - [`MalagaError::InvalidDate`] if `date` is not after the last date
    pub fn step(
        &mut self,
        date: Date,
        returns: &[(&str, f64)],
        scores: &[Score],
    ) -> Result<EquityPoint> {
        self.check_date(date)?;

        let selection = rank(scores, self.config.top_k);
        let weights = WeightVector::equal(&selection);
        let turnover = turnover(&self.state.weights, &weights);
        let gross_return = weights.weighted_return(returns.iter().copied());
        let cost = self.config.transaction_cost * turnover;
        let period_return = gross_return - cost;

        self.state.equity *= 1.0 + period_return;
        if self.state.equity < 0.0 {
            warn!(%date, equity = self.state.equity, "equity is negative");
        }

        let ic = daily_ic(scores, returns);
        if ic.is_finite() {
            self.ics.push(ic);
        }

        debug!(
            %date,
            selected = selection.len(),
            turnover,
            period_return,
            equity = self.state.equity,
            "traded"
        );

        let point = EquityPoint {
            date,
            equity: self.state.equity,
            status: StepStatus::Traded {
                gross_return,
                cost,
                turnover,
                period_return,
                selected: selection.len(),
            },
        };
        self.state.weights = weights;
        self.state.last_date = Some(date);
        self.final_selection = Some(FinalSelection { date, selection });
        self.curve.push(point.clone());
        Ok(point)
    }

    /// Records `date` as skipped. Equity and holdings carry forward.
    ///
    /// # Errors
    ///
    /// Same as [`PortfolioSimulator::step`].
    pub fn skip(&mut self, date: Date, reason: impl Into<String>) -> Result<EquityPoint> {
        self.check_date(date)?;
        let reason = reason.into();
        warn!(%date, %reason, "skipping date");

        let point = EquityPoint {
            date,
            equity: self.state.equity,
            status: StepStatus::Skipped { reason },
        };
        self.state.last_date = Some(date);
        self.curve.push(point.clone());
        Ok(point)
    }

    /// Simulates every date of `calendar`, scoring each snapshot with `model`.
    ///
    /// Starts the simulator first if needed. Dates without a snapshot are
    /// skipped; every other error aborts the run.
    ///
    /// # Errors
    ///
    /// - [`MalagaError::Inference`] carrying the date if scoring fails
    /// - any non-recoverable error from `source`
    /// - the errors of [`PortfolioSimulator::step`]
    pub fn run(
        &mut self,
        model: &dyn TrainedModel,
        source: &dyn SnapshotSource,
        calendar: &[Date],
    ) -> Result<()> {
        if self.phase == Phase::Uninitialized {
            self.start()?;
        }

        for &date in calendar {
            match source.snapshot(date) {
                Ok(snapshot) if snapshot.is_empty() => {
                    self.skip(date, "empty snapshot")?;
                }
                Ok(snapshot) => {
                    let scores = score_snapshot(model, &snapshot)?;
                    self.step(date, &snapshot.returns(), &scores)?;
                }
                Err(e) if e.is_recoverable() => {
                    self.skip(date, e.to_string())?;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            dates = calendar.len(),
            model = model.name(),
            equity = self.state.equity,
            "simulation complete"
        );
        Ok(())
    }

    /// Ends the simulation and hands over its results.
    ///
    /// # Errors
    ///
    /// Returns [`MalagaError::InvalidState`] unless running.
    pub fn finish(&mut self) -> Result<SimulationResult> {
        if self.phase != Phase::Running {
            return Err(MalagaError::InvalidState(format!(
                "cannot finish a simulator that is {}",
                self.phase
            )));
        }
        self.phase = Phase::Finished;

        let equity_curve = std::mem::take(&mut self.curve);
        let final_selection = self.final_selection.take();
        let top_picks = final_selection
            .as_ref()
            .map(|f| f.selection.top_picks())
            .unwrap_or_default();
        let summary =
            SimulationSummary::from_curve(self.config.initial_capital, &equity_curve, &self.ics);

        Ok(SimulationResult {
            equity_curve,
            final_selection,
            top_picks,
            summary,
        })
    }
}

/// Scores every row of `snapshot` with `model`, in row order.
///
/// # Errors
///
/// Returns [`MalagaError::Inference`] dated with the snapshot date when the
/// rows do not match the model schema or the model misbehaves.
pub fn score_snapshot(model: &dyn TrainedModel, snapshot: &Snapshot) -> Result<Vec<Score>> {
    let date = snapshot.date();
    let features = FeatureMatrix::with_schema(model.schema(), snapshot.rows())
        .map_err(|e| e.on_date(date))?;
    let predictions = model.predict(&features).map_err(|e| e.on_date(date))?;
    if predictions.len() != snapshot.len() {
        return Err(MalagaError::Inference {
            date: Some(date),
            reason: format!(
                "model returned {} scores for {} instruments",
                predictions.len(),
                snapshot.len()
            ),
        });
    }

    Ok(snapshot
        .rows()
        .iter()
        .zip(predictions)
        .map(|(row, score)| Score::new(row.symbol(), date, score))
        .collect())
}

fn daily_ic(scores: &[Score], returns: &[(&str, f64)]) -> f64 {
    let quotes: HashMap<&str, f64> = returns.iter().copied().collect();
    let (s, r): (Vec<f64>, Vec<f64>) = scores
        .iter()
        .filter_map(|s| quotes.get(s.symbol.as_str()).map(|r| (s.score, *r)))
        .unzip();
    calculate_ic(&s, &r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use malaga_traits::{FeatureRow, FeatureSchema, RET_1, RET_21, SnapshotBook};

    fn d(day: u32) -> Date {
        Date::from_ymd_opt(2024, 7, day).unwrap()
    }

    fn scores(date: Date, pairs: &[(&str, f64)]) -> Vec<Score> {
        pairs
            .iter()
            .map(|(s, v)| Score::new(*s, date, *v))
            .collect()
    }

    fn running(top_k: usize, transaction_cost: f64, initial_capital: f64) -> PortfolioSimulator {
        let mut sim = PortfolioSimulator::new(SimulationConfig {
            top_k,
            transaction_cost,
            initial_capital,
        })
        .unwrap();
        sim.start().unwrap();
        sim
    }

    #[test]
    fn test_two_day_scenario() {
        let mut sim = running(2, 0.01, 10_000.0);
        let returns = [("A", 0.02), ("B", 0.01), ("C", -0.01)];

        let day1 = sim
            .step(d(1), &returns, &scores(d(1), &[("A", 0.9), ("B", 0.5), ("C", 0.1)]))
            .unwrap();
        let StepStatus::Traded {
            turnover,
            period_return,
            selected,
            ..
        } = day1.status
        else {
            panic!("day 1 should trade");
        };
        assert_eq!(selected, 2);
        assert_relative_eq!(turnover, 1.0);
        assert_relative_eq!(period_return, 0.005, epsilon = 1e-12);
        assert_relative_eq!(day1.equity, 10_050.0, epsilon = 1e-9);
        assert_relative_eq!(sim.state().weights.get("A"), 0.5);
        assert_relative_eq!(sim.state().weights.get("B"), 0.5);

        let day2 = sim
            .step(d(2), &returns, &scores(d(2), &[("A", 0.3), ("B", 0.8), ("C", 0.6)]))
            .unwrap();
        assert_relative_eq!(day2.status.turnover().unwrap(), 1.0);
        assert_relative_eq!(day2.status.period_return().unwrap(), -0.01, epsilon = 1e-12);
        assert_relative_eq!(day2.equity, 9_949.5, epsilon = 1e-9);

        let result = sim.finish().unwrap();
        let last = result.final_selection.unwrap();
        assert_eq!(last.date, d(2));
        assert_eq!(last.selection.symbols().collect::<Vec<_>>(), vec!["B", "C"]);
        assert_eq!(result.top_picks[0].symbol, "B");
        assert_eq!(result.equity_curve.len(), 2);
        assert_eq!(sim.phase(), Phase::Finished);
    }

    #[test]
    fn test_compounding_is_exact() {
        let rs = [0.01, -0.02, 0.003, 0.07, -0.015];
        let mut sim = running(1, 0.0, 1_000.0);
        for (i, r) in rs.iter().enumerate() {
            let date = d(1 + i as u32);
            sim.step(date, &[("A", *r)], &scores(date, &[("A", 1.0)]))
                .unwrap();
        }
        let expected = rs.iter().fold(1_000.0, |equity, r| equity * (1.0 + r));
        assert_eq!(sim.state().equity, expected);
    }

    #[test]
    fn test_empty_selection_liquidates() {
        let mut sim = running(3, 0.01, 100.0);
        sim.step(d(1), &[("A", 0.0), ("B", 0.0)], &scores(d(1), &[("A", 1.0), ("B", 0.5)]))
            .unwrap();
        let point = sim.step(d(2), &[], &[]).unwrap();
        assert_relative_eq!(point.status.turnover().unwrap(), 1.0);
        assert!(sim.state().weights.is_empty());
    }

    #[test]
    fn test_skip_keeps_equity_and_weights() {
        let mut sim = running(1, 0.0, 100.0);
        sim.step(d(1), &[("A", 0.1)], &scores(d(1), &[("A", 1.0)]))
            .unwrap();
        let skipped = sim.skip(d(2), "holiday").unwrap();
        assert!(skipped.status.is_skipped());
        assert_relative_eq!(skipped.equity, 110.0, epsilon = 1e-9);
        assert_relative_eq!(sim.state().weights.get("A"), 1.0);

        // Holding A again costs no turnover after the gap.
        let next = sim
            .step(d(3), &[("A", 0.0)], &scores(d(3), &[("A", 1.0)]))
            .unwrap();
        assert_eq!(next.status.turnover(), Some(0.0));
    }

    #[test]
    fn test_out_of_order_dates_rejected() {
        let mut sim = running(1, 0.0, 100.0);
        sim.step(d(2), &[], &[]).unwrap();
        assert!(matches!(
            sim.step(d(1), &[], &[]),
            Err(MalagaError::InvalidDate(_))
        ));
        assert!(matches!(
            sim.skip(d(2), "again"),
            Err(MalagaError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_state_machine() {
        let mut sim = PortfolioSimulator::new(SimulationConfig::default()).unwrap();
        assert_eq!(sim.phase(), Phase::Uninitialized);
        assert!(matches!(
            sim.step(d(1), &[], &[]),
            Err(MalagaError::InvalidState(_))
        ));
        assert!(sim.finish().is_err());

        sim.start().unwrap();
        assert!(matches!(sim.start(), Err(MalagaError::InvalidState(_))));
        sim.finish().unwrap();
        assert!(matches!(
            sim.skip(d(1), "late"),
            Err(MalagaError::InvalidState(_))
        ));
    }

    #[test]
    fn test_negative_equity_allowed() {
        let mut sim = running(1, 0.0, 100.0);
        let point = sim
            .step(d(1), &[("A", -1.5)], &scores(d(1), &[("A", 1.0)]))
            .unwrap();
        assert_relative_eq!(point.equity, -50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_config_validation() {
        let bad = [
            SimulationConfig {
                top_k: 0,
                ..SimulationConfig::default()
            },
            SimulationConfig {
                transaction_cost: -0.1,
                ..SimulationConfig::default()
            },
            SimulationConfig {
                initial_capital: 0.0,
                ..SimulationConfig::default()
            },
            SimulationConfig {
                initial_capital: f64::INFINITY,
                ..SimulationConfig::default()
            },
        ];
        for config in bad {
            assert!(matches!(
                PortfolioSimulator::new(config),
                Err(MalagaError::InvalidConfig(_))
            ));
        }
    }

    /// Scores each row by its `signal` feature.
    #[derive(Debug)]
    struct SignalModel {
        schema: FeatureSchema,
    }

    impl SignalModel {
        fn new(names: &[&str]) -> Self {
            Self {
                schema: FeatureSchema::new(names.iter().map(|s| s.to_string()).collect()),
            }
        }
    }

    impl TrainedModel for SignalModel {
        fn name(&self) -> &str {
            "signal"
        }

        fn schema(&self) -> &FeatureSchema {
            &self.schema
        }

        fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
            self.check_schema(features)?;
            let column = features
                .schema()
                .iter()
                .position(|n| n == "signal")
                .unwrap();
            Ok(features.values().column(column).to_vec())
        }
    }

    fn row(symbol: &str, date: Date, ret_1: f64, signal: f64) -> FeatureRow {
        FeatureRow::from_pairs(
            symbol,
            date,
            [(RET_1, ret_1), (RET_21, 0.0), ("signal", signal)],
        )
        .unwrap()
    }

    fn book() -> SnapshotBook {
        SnapshotBook::from_rows(vec![
            row("A", d(1), 0.02, 0.9),
            row("B", d(1), 0.01, 0.5),
            row("C", d(1), -0.01, 0.1),
            row("A", d(3), 0.02, 0.3),
            row("B", d(3), 0.01, 0.8),
            row("C", d(3), -0.01, 0.6),
        ])
        .unwrap()
    }

    #[test]
    fn test_run_skips_missing_dates() {
        let mut sim = PortfolioSimulator::new(SimulationConfig {
            top_k: 2,
            transaction_cost: 0.01,
            initial_capital: 10_000.0,
        })
        .unwrap();
        let model = SignalModel::new(&["ret_1", "ret_21", "signal"]);

        sim.run(&model, &book(), &[d(1), d(2), d(3)]).unwrap();
        let result = sim.finish().unwrap();

        let equity: Vec<f64> = result.equity_curve.iter().map(|p| p.equity).collect();
        assert_eq!(result.equity_curve.len(), 3);
        assert!(result.equity_curve[1].status.is_skipped());
        assert_relative_eq!(equity[0], 10_050.0, epsilon = 1e-9);
        assert_relative_eq!(equity[1], 10_050.0, epsilon = 1e-9);
        assert_relative_eq!(equity[2], 9_949.5, epsilon = 1e-9);
        assert_eq!(result.summary.skipped_days, 1);
        assert_eq!(result.summary.traded_days, 2);
    }

    #[test]
    fn test_run_schema_mismatch_carries_date() {
        let mut sim = PortfolioSimulator::new(SimulationConfig::default()).unwrap();
        let model = SignalModel::new(&["ret_1", "signal"]);

        let err = sim.run(&model, &book(), &[d(1)]).unwrap_err();
        assert!(matches!(
            err,
            MalagaError::Inference {
                date: Some(date),
                ..
            } if date == d(1)
        ));
    }
}

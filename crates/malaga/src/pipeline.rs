//! The end-to-end run: fetch, label, train, simulate.

use crate::{PipelineConfig, universe::resolve_universe};
use malaga_label::Labeler;
use malaga_sim::{FinalSelection, PortfolioSimulator, SimulationSummary};
use malaga_traits::{
    EquityPoint, FeatureGap, FeatureProvider, Result, ResultWriter, Scorer, TopPick,
};
use serde::Serialize;
use tracing::{info, warn};

/// What a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    /// Tag of the run.
    pub run_id: String,
    /// Name of the scorer that was trained.
    pub scorer: String,
    /// Number of instruments requested.
    pub universe_size: usize,
    /// Instruments the provider could not serve.
    pub gaps: Vec<FeatureGap>,
    /// Rows used for training.
    pub labeled_rows: usize,
    /// Selection on the last traded date, best first.
    pub top_picks: Vec<TopPick>,
    /// One point per simulated date.
    pub equity_curve: Vec<EquityPoint>,
    /// The selection behind `top_picks`, with its date.
    pub final_selection: Option<FinalSelection>,
    /// Aggregate performance.
    pub summary: SimulationSummary,
}

impl PipelineOutput {
    /// Persists the top picks and the equity curve.
    ///
    /// # Errors
    ///
    /// Propagates the writer's error.
    pub fn write(&self, writer: &dyn ResultWriter) -> Result<()> {
        writer.write_top_picks(&self.top_picks)?;
        writer.write_equity(&self.equity_curve)
    }
}

/// One configured run over one universe.
///
/// # Example
///
/// ```rust,ignore
/// use malaga::{Pipeline, PipelineConfig};
/// use malaga::data::CsvFeatureProvider;
///
/// let pipeline = Pipeline::new(PipelineConfig::default())?;
/// let provider = CsvFeatureProvider::new("data/prices");
/// let output = pipeline.run_configured(&provider)?;
/// println!("profit: {:.2}", output.summary.profit());
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Creates a pipeline after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns the first validation error of `config`.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration this pipeline runs with.
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs with the scorer named in the configuration.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::run`].
    pub fn run_configured(&self, provider: &dyn FeatureProvider) -> Result<PipelineOutput> {
        let scorer = self.config.scorer.build();
        self.run(provider, scorer.as_ref())
    }

    /// Fetches the universe, labels it, fits `scorer` on every labeled row,
    /// then simulates the daily top-K portfolio over the labeled dates.
    ///
    /// # Errors
    ///
    /// - [`MalagaError::EmptyUniverse`](malaga_traits::MalagaError::EmptyUniverse)
    ///   if no instrument has price data
    /// - [`MalagaError::Training`](malaga_traits::MalagaError::Training) if no
    ///   row has a target or the fit fails
    /// - [`MalagaError::Inference`](malaga_traits::MalagaError::Inference) if a
    ///   snapshot cannot be scored
    pub fn run(&self, provider: &dyn FeatureProvider, scorer: &dyn Scorer) -> Result<PipelineOutput> {
        let config = &self.config;
        let symbols = resolve_universe(&config.universe)?;
        let range = config.range();
        info!(
            run_id = %config.run_id,
            provider = provider.name(),
            instruments = symbols.len(),
            %range,
            "starting run"
        );

        let features = provider.fetch_universe(&symbols, &range)?;
        if !features.gaps.is_empty() {
            warn!(
                gaps = features.gaps.len(),
                "some instruments have no price data"
            );
        }

        let labeled = Labeler::new(config.label_config())?.label(&features.prices, &features.news)?;
        let (matrix, targets) = labeled.training_data()?;
        let model = scorer.fit(&matrix, &targets)?;
        info!(
            scorer = scorer.name(),
            rows = matrix.nrows(),
            features = matrix.ncols(),
            "model trained"
        );

        let book = labeled.snapshots()?;
        let calendar = config.calendar.dates(&book.dates(), &range);
        let mut simulator = PortfolioSimulator::new(config.simulation())?;
        simulator.run(model.as_ref(), &book, &calendar)?;
        let result = simulator.finish()?;

        info!(
            final_equity = result.summary.final_equity,
            total_return = result.summary.total_return,
            "run complete"
        );

        Ok(PipelineOutput {
            run_id: config.run_id.clone(),
            scorer: scorer.name().to_string(),
            universe_size: symbols.len(),
            gaps: features.gaps,
            labeled_rows: labeled.len(),
            top_picks: result.top_picks,
            equity_curve: result.equity_curve,
            final_selection: result.final_selection,
            summary: result.summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use malaga_data::{InMemoryProvider, JsonResultWriter};
    use malaga_sim::CalendarPolicy;
    use malaga_traits::{Date, FeatureRow, MalagaError, NewsRow, RET_1, RET_21};

    fn d(day: u32) -> Date {
        Date::from_ymd_opt(2024, 7, day).unwrap()
    }

    /// Ten weekdays, 2024-07-01 to 2024-07-12, for three instruments whose
    /// `momentum` feature lines up with their next return.
    fn provider() -> InMemoryProvider {
        let days = [1, 2, 3, 4, 5, 8, 9, 10, 11, 12];
        let instruments = [("AAA", 0.02), ("BBB", 0.0), ("CCC", -0.02)];
        let mut prices = Vec::new();
        for (i, &day) in days.iter().enumerate() {
            for (j, &(symbol, drift)) in instruments.iter().enumerate() {
                let wobble = ((i * 3 + j) % 5) as f64 * 0.001;
                prices.push(
                    FeatureRow::from_pairs(
                        symbol,
                        d(day),
                        [
                            (RET_1, drift / 10.0 + wobble),
                            (RET_21, drift + wobble * 2.0),
                            ("momentum", drift * 5.0 + wobble),
                        ],
                    )
                    .unwrap(),
                );
            }
        }
        InMemoryProvider::new()
            .with_prices(prices)
            .with_news([NewsRow::sentiment("AAA", d(2), 0.3)])
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            universe: "AAA,BBB,CCC,ZZZ".to_string(),
            horizon: 2,
            top_k: Some(2),
            transaction_cost: 0.001,
            initial_capital: 1_000.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_end_to_end() {
        let output = Pipeline::new(config())
            .unwrap()
            .run_configured(&provider())
            .unwrap();

        assert_eq!(output.universe_size, 4);
        assert_eq!(output.gaps.len(), 1);
        assert_eq!(output.gaps[0].symbol, "ZZZ");
        // Each instrument loses its last `horizon` rows.
        assert_eq!(output.labeled_rows, 3 * 8);
        assert_eq!(output.scorer, "ridge");

        assert_eq!(output.equity_curve.len(), 8);
        assert_eq!(output.equity_curve[0].date, d(1));
        assert_eq!(output.equity_curve[7].date, d(10));
        assert!(output.equity_curve.iter().all(|p| !p.status.is_skipped()));

        assert_eq!(output.top_picks.len(), 2);
        assert_eq!(output.top_picks[0].rank, 1);
        assert_eq!(output.top_picks[0].symbol, "AAA");
        let selection = output.final_selection.as_ref().unwrap();
        assert_eq!(selection.date, d(10));

        assert_eq!(output.summary.traded_days, 8);
        assert_relative_eq!(output.summary.initial_equity, 1_000.0);
        assert_relative_eq!(
            output.summary.final_equity,
            output.equity_curve[7].equity,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_weekday_calendar_records_gaps() {
        let config = PipelineConfig {
            calendar: CalendarPolicy::Weekdays,
            start: Some(d(1)),
            end: Some(d(12)),
            ..config()
        };
        let output = Pipeline::new(config).unwrap().run_configured(&provider()).unwrap();

        // Labeled dates end on the 10th; the 11th and 12th have no snapshot.
        assert_eq!(output.equity_curve.len(), 10);
        assert_eq!(output.summary.skipped_days, 2);
        assert_relative_eq!(
            output.equity_curve[9].equity,
            output.equity_curve[7].equity,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_horizon_beyond_history() {
        let config = PipelineConfig {
            horizon: 10,
            ..config()
        };
        let err = Pipeline::new(config)
            .unwrap()
            .run_configured(&provider())
            .unwrap_err();
        assert!(matches!(err, MalagaError::Training(_)));
    }

    #[test]
    fn test_empty_universe() {
        let config = PipelineConfig {
            universe: "ZZZ".to_string(),
            ..config()
        };
        let err = Pipeline::new(config)
            .unwrap()
            .run_configured(&provider())
            .unwrap_err();
        assert!(matches!(err, MalagaError::EmptyUniverse(_)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PipelineConfig {
            top_k: Some(0),
            ..config()
        };
        assert!(Pipeline::new(config).is_err());
    }

    #[test]
    fn test_write_output() {
        let output = Pipeline::new(config())
            .unwrap()
            .run_configured(&provider())
            .unwrap();
        let dir = std::env::temp_dir().join(format!("malaga-pipeline-{}", std::process::id()));
        let writer = JsonResultWriter::new(&dir, "e2e");
        output.write(&writer).unwrap();

        assert!(writer.top_picks_path().is_file());
        assert!(writer.equity_path().is_file());
        let _ = std::fs::remove_dir_all(&dir);
    }
}

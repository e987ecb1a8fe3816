//! Run command implementation.

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use malaga::data::{CsvFeatureProvider, CsvResultWriter, JsonResultWriter};
use malaga::models::ScorerConfig;
use malaga::sim::CalendarPolicy;
use malaga::{Pipeline, PipelineConfig, PipelineOutput};
use std::path::PathBuf;
use tracing::info;

/// What the run prints and which files it writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable report; CSV result files
    Text,
    /// Full output as JSON on stdout; JSON result files
    Json,
    /// CSV result files only
    Csv,
}

/// Scorer choices; each starts from its default settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ScorerArg {
    /// Closed-form ridge regression
    Ridge,
    /// Gradient-boosted decision stumps
    #[value(alias = "boosted_stumps")]
    Boosted,
}

impl From<ScorerArg> for ScorerConfig {
    fn from(arg: ScorerArg) -> Self {
        match arg {
            ScorerArg::Ridge => Self::Ridge(Default::default()),
            ScorerArg::Boosted => Self::BoostedStumps(Default::default()),
        }
    }
}

/// Which dates the simulation walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum CalendarArg {
    /// Dates with feature data
    Observed,
    /// Every weekday; dates without data are skipped
    Weekdays,
}

impl From<CalendarArg> for CalendarPolicy {
    fn from(arg: CalendarArg) -> Self {
        match arg {
            CalendarArg::Observed => Self::Observed,
            CalendarArg::Weekdays => Self::Weekdays,
        }
    }
}

#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    /// JSON config file; flags override its values
    #[arg(short, long)]
    pub(crate) config: Option<PathBuf>,

    /// Universe preset name or comma-separated tickers
    #[arg(short, long)]
    pub(crate) universe: Option<String>,

    /// Directory of per-ticker price feature CSVs
    #[arg(short, long)]
    pub(crate) prices: PathBuf,

    /// Directory of per-ticker news feature CSVs
    #[arg(short, long)]
    pub(crate) news: Option<PathBuf>,

    /// Label horizon in observations
    #[arg(short = 'H', long)]
    pub(crate) horizon: Option<usize>,

    /// Instruments held each day [default: the preset's size, or 50]
    #[arg(short = 'k', long)]
    pub(crate) top_k: Option<usize>,

    /// Transaction cost per unit of turnover
    #[arg(long)]
    pub(crate) cost: Option<f64>,

    /// Initial capital
    #[arg(long)]
    pub(crate) capital: Option<f64>,

    /// Scorer
    #[arg(short, long, value_enum)]
    pub(crate) scorer: Option<ScorerArg>,

    /// Simulation calendar
    #[arg(long, value_enum)]
    pub(crate) calendar: Option<CalendarArg>,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub(crate) start: Option<String>,

    /// End date (YYYY-MM-DD)
    #[arg(long)]
    pub(crate) end: Option<String>,

    /// Output directory for result files
    #[arg(short, long)]
    pub(crate) output: Option<PathBuf>,

    /// Run tag used in result file names
    #[arg(long)]
    pub(crate) run_id: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub(crate) format: OutputFormat,

    /// Debug logging
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

/// Parse a date string in YYYY-MM-DD format.
pub(crate) fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{date_str}', expected YYYY-MM-DD"))
}

/// Builds the run configuration: defaults or `--config`, then environment
/// overrides, then flags.
pub(crate) fn build_config(args: &RunArgs) -> Result<PipelineConfig> {
    let base = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    apply_args(base.apply_env(), args)
}

/// Applies command-line flags on top of `config`.
///
/// Without an explicit `top_k` anywhere, a preset universe brings its own
/// portfolio size through [`PipelineConfig::top_k`].
pub(crate) fn apply_args(mut config: PipelineConfig, args: &RunArgs) -> Result<PipelineConfig> {
    if let Some(universe) = &args.universe {
        config.universe = universe.clone();
    }
    if let Some(horizon) = args.horizon {
        config.horizon = horizon;
    }
    if let Some(top_k) = args.top_k {
        config.top_k = Some(top_k);
    }
    if let Some(cost) = args.cost {
        config.transaction_cost = cost;
    }
    if let Some(capital) = args.capital {
        config.initial_capital = capital;
    }
    if let Some(scorer) = args.scorer {
        config.scorer = scorer.into();
    }
    if let Some(calendar) = args.calendar {
        config.calendar = calendar.into();
    }
    if let Some(start) = &args.start {
        config.start = Some(parse_date(start)?);
    }
    if let Some(end) = &args.end {
        config.end = Some(parse_date(end)?);
    }
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    if let Some(run_id) = &args.run_id {
        config.run_id = run_id.clone();
    }
    Ok(config)
}

/// Train, simulate, write results and report.
pub(crate) fn run(args: &RunArgs) -> Result<()> {
    let config = build_config(args)?;
    let pipeline = Pipeline::new(config.clone())?;

    let mut provider = CsvFeatureProvider::new(&args.prices);
    if let Some(news) = &args.news {
        provider = provider.with_news_dir(news);
    }

    let output = pipeline.run_configured(&provider)?;

    match args.format {
        OutputFormat::Text => {
            let writer = CsvResultWriter::new(&config.output_dir, &config.run_id);
            output.write(&writer)?;
            print_report(&config, &output);
            println!("Results written to: {}", writer.top_picks_path().display());
            println!("Equity curve:       {}\n", writer.equity_path().display());
        }
        OutputFormat::Json => {
            let writer = JsonResultWriter::new(&config.output_dir, &config.run_id);
            output.write(&writer)?;
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| anyhow!("JSON serialization error: {}", e))?;
            println!("{json}");
        }
        OutputFormat::Csv => {
            let writer = CsvResultWriter::new(&config.output_dir, &config.run_id);
            output.write(&writer)?;
            println!("{}", writer.top_picks_path().display());
            println!("{}", writer.equity_path().display());
        }
    }

    info!(run_id = %config.run_id, "done");
    Ok(())
}

fn print_report(config: &PipelineConfig, output: &PipelineOutput) {
    let summary = &output.summary;

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                      Malaga Top Picks                        ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("Universe: {} ({} instruments)", config.universe, output.universe_size);
    println!("Scorer:   {}", output.scorer);
    println!("Horizon:  {} periods", config.horizon);
    println!("Top K:    {}", config.top_k());
    if !output.gaps.is_empty() {
        let missing: Vec<&str> = output.gaps.iter().map(|g| g.symbol.as_str()).collect();
        println!("No data:  {}", missing.join(", "));
    }
    println!();

    match &output.final_selection {
        Some(selection) => println!("Top instruments to buy ({}):", selection.date),
        None => println!("Top instruments to buy: none (no date traded)"),
    }
    for pick in &output.top_picks {
        println!("  {:>3}. {:<10} {:>8.2}%", pick.rank, pick.symbol, pick.score_pct);
    }
    println!();

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("SIMULATION RESULTS");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    if let (Some(first), Some(last)) = (summary.first_date, summary.last_date) {
        println!("Period:            {first} to {last}");
    }
    println!("  Final Equity:      {:>10.2}", summary.final_equity);
    println!("  Total Profit:      {:>10.2}", summary.profit());
    println!(
        "  Total Return:      {:>10.2}%",
        summary.total_return * 100.0
    );
    println!(
        "  Annualized Return: {:>10.2}%",
        summary.annualized_return * 100.0
    );
    println!("  Sharpe Ratio:      {:>10.2}", summary.sharpe_ratio);
    println!(
        "  Max Drawdown:      {:>10.2}%",
        summary.max_drawdown * 100.0
    );
    println!(
        "  Avg Turnover:      {:>10.2}%",
        summary.avg_turnover * 100.0
    );
    println!(
        "  Total Txn Costs:   {:>10.2}",
        summary.total_transaction_costs
    );
    println!(
        "  Days Traded:       {:>10} ({} skipped)",
        summary.traded_days, summary.skipped_days
    );
    println!("  Mean IC:           {:>10.4}", summary.mean_ic);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: RunArgs,
    }

    fn args(flags: &[&str]) -> RunArgs {
        let argv = ["malaga", "--prices", "data/prices"]
            .into_iter()
            .chain(flags.iter().copied());
        Wrapper::parse_from(argv).args
    }

    #[test]
    fn test_parse_date() {
        let date = parse_date("2024-01-15").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 15);
        assert!(parse_date("15/01/2024").is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let config = apply_args(
            PipelineConfig::default(),
            &args(&[
                "--horizon", "5", "--top-k", "3", "--cost", "0.002", "--scorer", "boosted",
                "--calendar", "weekdays", "--start", "2024-01-02", "--run-id", "x",
            ]),
        )
        .unwrap();
        assert_eq!(config.horizon, 5);
        assert_eq!(config.top_k(), 3);
        assert!((config.transaction_cost - 0.002).abs() < 1e-12);
        assert!(matches!(config.scorer, ScorerConfig::BoostedStumps(_)));
        assert_eq!(config.calendar, CalendarPolicy::Weekdays);
        assert_eq!(config.start, NaiveDate::from_ymd_opt(2024, 1, 2));
        assert_eq!(config.run_id, "x");
    }

    #[test]
    fn test_preset_sets_top_k() {
        let config = apply_args(PipelineConfig::default(), &args(&["--universe", "wig20"])).unwrap();
        assert_eq!(config.top_k(), 10);

        let config = apply_args(
            PipelineConfig::default(),
            &args(&["--universe", "wig20", "--top-k", "5"]),
        )
        .unwrap();
        assert_eq!(config.top_k(), 5);
    }

    #[test]
    fn test_preset_from_config_file() {
        let path = std::env::temp_dir().join(format!("malaga-run-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "universe": "wig20" }"#).unwrap();
        let path_arg = path.to_string_lossy().into_owned();

        let config = build_config(&args(&["--config", &path_arg])).unwrap();
        assert_eq!(config.universe, "wig20");
        assert_eq!(config.top_k(), 10);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_scorer_and_calendar_choices() {
        let parsed = args(&["--scorer", "boosted_stumps", "--calendar", "observed"]);
        assert_eq!(parsed.scorer, Some(ScorerArg::Boosted));
        assert_eq!(parsed.calendar, Some(CalendarArg::Observed));

        let config = apply_args(PipelineConfig::default(), &args(&["--scorer", "ridge"])).unwrap();
        assert_eq!(config.scorer, ScorerConfig::from_kind("ridge").unwrap());
    }

    #[test]
    fn test_bad_flags() {
        let argv = |flags: &[&'static str]| {
            ["malaga", "--prices", "data/prices"]
                .into_iter()
                .chain(flags.iter().copied())
                .collect::<Vec<_>>()
        };
        let err = Wrapper::try_parse_from(argv(&["--scorer", "forest"])).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
        assert!(Wrapper::try_parse_from(argv(&["--calendar", "daily"])).is_err());
        assert!(apply_args(PipelineConfig::default(), &args(&["--end", "soon"])).is_err());
    }
}

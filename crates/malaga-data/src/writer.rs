//! Result writers: CSV through polars, and JSON.

use crate::Result as DataResult;
use malaga_traits::{EquityPoint, Result, ResultWriter, TopPick};
use polars::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

fn top_picks_path(dir: &Path, run_id: &str, extension: &str) -> PathBuf {
    dir.join(format!("last_top_{run_id}.{extension}"))
}

fn equity_path(dir: &Path, run_id: &str, extension: &str) -> PathBuf {
    dir.join(format!("equity_{run_id}.{extension}"))
}

/// Top picks as a DataFrame with `rank`, `ticker`, `pred` and `pred_%`.
///
/// # Errors
///
/// Returns an error if the frame cannot be built.
pub fn top_picks_frame(picks: &[TopPick]) -> DataResult<DataFrame> {
    Ok(df![
        "rank" => picks.iter().map(|p| p.rank as u32).collect::<Vec<_>>(),
        "ticker" => picks.iter().map(|p| p.symbol.as_str()).collect::<Vec<_>>(),
        "pred" => picks.iter().map(|p| p.score).collect::<Vec<_>>(),
        "pred_%" => picks.iter().map(|p| p.score_pct).collect::<Vec<_>>(),
    ]?)
}

/// Equity curve as a DataFrame, one row per simulated date. Skipped dates
/// have null return columns.
///
/// # Errors
///
/// Returns an error if the frame cannot be built.
pub fn equity_frame(curve: &[EquityPoint]) -> DataResult<DataFrame> {
    Ok(df![
        "date" => curve.iter().map(|p| p.date.to_string()).collect::<Vec<_>>(),
        "equity" => curve.iter().map(|p| p.equity).collect::<Vec<_>>(),
        "status" => curve.iter().map(|p| p.status.to_string()).collect::<Vec<_>>(),
        "period_return" => curve.iter().map(|p| p.status.period_return()).collect::<Vec<_>>(),
        "turnover" => curve.iter().map(|p| p.status.turnover()).collect::<Vec<_>>(),
    ]?)
}

/// Writes `last_top_<run_id>.csv` and `equity_<run_id>.csv` into a
/// directory, creating it if needed.
#[derive(Debug, Clone)]
pub struct CsvResultWriter {
    dir: PathBuf,
    run_id: String,
}

impl CsvResultWriter {
    /// Create a writer for `dir`, tagging files with `run_id`.
    pub fn new(dir: impl Into<PathBuf>, run_id: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            run_id: run_id.into(),
        }
    }

    /// Path of the top-picks file.
    pub fn top_picks_path(&self) -> PathBuf {
        top_picks_path(&self.dir, &self.run_id, "csv")
    }

    /// Path of the equity file.
    pub fn equity_path(&self) -> PathBuf {
        equity_path(&self.dir, &self.run_id, "csv")
    }

    fn write_frame(&self, path: &Path, mut df: DataFrame) -> DataResult<()> {
        fs::create_dir_all(&self.dir)?;
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)?;
        info!(path = %path.display(), rows = df.height(), "wrote csv");
        Ok(())
    }
}

impl ResultWriter for CsvResultWriter {
    fn write_top_picks(&self, picks: &[TopPick]) -> Result<()> {
        Ok(self.write_frame(&self.top_picks_path(), top_picks_frame(picks)?)?)
    }

    fn write_equity(&self, curve: &[EquityPoint]) -> Result<()> {
        Ok(self.write_frame(&self.equity_path(), equity_frame(curve)?)?)
    }
}

/// Writes `last_top_<run_id>.json` and `equity_<run_id>.json` as pretty
/// printed JSON arrays.
#[derive(Debug, Clone)]
pub struct JsonResultWriter {
    dir: PathBuf,
    run_id: String,
}

impl JsonResultWriter {
    /// Create a writer for `dir`, tagging files with `run_id`.
    pub fn new(dir: impl Into<PathBuf>, run_id: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            run_id: run_id.into(),
        }
    }

    /// Path of the top-picks file.
    pub fn top_picks_path(&self) -> PathBuf {
        top_picks_path(&self.dir, &self.run_id, "json")
    }

    /// Path of the equity file.
    pub fn equity_path(&self) -> PathBuf {
        equity_path(&self.dir, &self.run_id, "json")
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> DataResult<()> {
        fs::create_dir_all(&self.dir)?;
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, value)?;
        info!(path = %path.display(), "wrote json");
        Ok(())
    }
}

impl ResultWriter for JsonResultWriter {
    fn write_top_picks(&self, picks: &[TopPick]) -> Result<()> {
        Ok(self.write_json(&self.top_picks_path(), picks)?)
    }

    fn write_equity(&self, curve: &[EquityPoint]) -> Result<()> {
        Ok(self.write_json(&self.equity_path(), curve)?)
    }
}

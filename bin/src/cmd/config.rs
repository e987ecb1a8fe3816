//! Default configuration dump.

use anyhow::Result;
use malaga::PipelineConfig;

/// Print the default configuration, ready to be saved and edited.
pub(crate) fn print_default_config() -> Result<()> {
    let json = serde_json::to_string_pretty(&PipelineConfig::default())
        .map_err(|e| anyhow::anyhow!("JSON serialization error: {}", e))?;
    println!("{json}");
    Ok(())
}

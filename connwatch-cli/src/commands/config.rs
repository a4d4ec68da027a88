//! Resolved configuration display.

use std::io::Write;

use connwatch_core::ExporterConfig;

use crate::cli::ConfigFormat;
use crate::error::CliError;

/// Renders the resolved configuration in the requested format
pub fn render_config(config: &ExporterConfig, format: ConfigFormat) -> Result<String, CliError> {
    let summary = config.summary();
    match format {
        ConfigFormat::Toml => {
            toml::to_string_pretty(&summary).map_err(|e| CliError::Serialize(e.to_string()))
        }
        ConfigFormat::Json => {
            serde_json::to_string_pretty(&summary).map_err(|e| CliError::Serialize(e.to_string()))
        }
    }
}

/// Writes the rendered configuration followed by a newline
pub fn write_config(
    out: &mut impl Write,
    config: &ExporterConfig,
    format: ConfigFormat,
) -> Result<(), CliError> {
    let text = render_config(config, format)?;
    writeln!(out, "{}", text.trim_end())?;
    out.flush()?;
    Ok(())
}

/// Config command handler
pub fn cmd_config(config: &ExporterConfig, format: ConfigFormat) -> Result<(), CliError> {
    write_config(&mut std::io::stdout().lock(), config, format)
}

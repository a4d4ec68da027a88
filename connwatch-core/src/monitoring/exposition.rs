//! Prometheus exposition output
//!
//! Renders a [`Tally`] as a three-line gauge fragment and publishes it either
//! to a textfile-collector file or to standard output.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::tally::Tally;
use crate::config::{ConfigError, ExporterConfig, OutputTarget};

/// Metric base name used when none is configured
pub const DEFAULT_METRIC_NAME: &str = "tcp_connections";

static METRIC_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z_:][a-zA-Z0-9_:]*$").expect("metric name pattern is valid")
});

/// Errors that can occur while publishing the exposition fragment
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// The metrics file could not be written or replaced
    #[error("Failed to write metrics file {}: {source}", path.display())]
    Write {
        /// Target path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Standard output could not be written
    #[error("Failed to write metrics to stdout: {0}")]
    Stdout(#[source] io::Error),
}

/// Placement of the target port in the sample line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricStyle {
    /// `tcp_connections{port="8500"} 3`
    #[default]
    PortLabel,
    /// `tcp_connections_8500 3`
    PortInName,
}

impl MetricStyle {
    /// Returns the configuration spelling
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PortLabel => "port-label",
            Self::PortInName => "port-in-name",
        }
    }
}

impl fmt::Display for MetricStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricStyle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "port-label" | "label" => Ok(Self::PortLabel),
            "port-in-name" | "name" => Ok(Self::PortInName),
            _ => Err(ConfigError::UnknownMetricStyle(s.to_string())),
        }
    }
}

/// Returns `true` if `name` matches `[a-zA-Z_:][a-zA-Z0-9_:]*`
#[must_use]
pub fn is_valid_metric_name(name: &str) -> bool {
    METRIC_NAME_RE.is_match(name)
}

/// Renders the `# HELP`, `# TYPE` and sample lines for one tally
#[must_use]
pub fn render(tally: Tally, metric_name: &str, port: u16, style: MetricStyle) -> String {
    let value = tally.sample_value();
    match style {
        MetricStyle::PortLabel => format!(
            "# HELP {metric_name} Number of open TCP connections on port {port}\n\
             # TYPE {metric_name} gauge\n\
             {metric_name}{{port=\"{port}\"}} {value}\n"
        ),
        MetricStyle::PortInName => {
            let name = format!("{metric_name}_{port}");
            format!(
                "# HELP {name} Number of open TCP connections on port {port}\n\
                 # TYPE {name} gauge\n\
                 {name} {value}\n"
            )
        }
    }
}

/// Renders a tally with the configured name, port and style
#[must_use]
pub fn render_for(tally: Tally, config: &ExporterConfig) -> String {
    render(
        tally,
        &config.metric_name,
        config.target_port,
        config.metric_style,
    )
}

/// Writes `contents` to `tmp_path` and flushes it to disk
async fn stage(tmp_path: &Path, contents: &str) -> io::Result<()> {
    let mut file = fs::File::create(tmp_path).await?;
    file.write_all(contents.as_bytes()).await?;
    file.sync_all().await
}

/// Replaces `path` with `contents`.
///
/// The fragment is written to a hidden sibling file first and renamed over
/// the target, so a collector never reads a half-written file. The sibling
/// is removed again on every failure path.
///
/// # Errors
///
/// Returns [`EmitError::Write`] if the temporary file cannot be written or
/// renamed.
pub async fn write_textfile(path: &Path, contents: &str) -> Result<(), EmitError> {
    let write_err = |source: io::Error| EmitError::Write {
        path: path.to_path_buf(),
        source,
    };

    let file_name = path
        .file_name()
        .ok_or_else(|| write_err(io::Error::new(io::ErrorKind::InvalidInput, "not a file path")))?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let result = match stage(&tmp_path, contents).await {
        Ok(()) => fs::rename(&tmp_path, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }
    Ok(())
}

/// Publishes a tally to the configured output target.
///
/// # Errors
///
/// Returns [`EmitError`] if the file or stdout cannot be written.
pub async fn emit(tally: Tally, config: &ExporterConfig) -> Result<(), EmitError> {
    let fragment = render_for(tally, config);
    match &config.output {
        OutputTarget::File(path) => write_textfile(path, &fragment).await,
        OutputTarget::Stdout => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(fragment.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(EmitError::Stdout)
        }
    }
}

//! Shared CLI helpers used across multiple commands.

use std::path::PathBuf;

use indicatif::ProgressStyle;
use soundcheck_config::{GraphConfig, get_factory_layout};

/// Parse a `key=value` string for clap's `value_parser`.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!(
            "Invalid parameter format: '{s}' (expected stage.param=value)"
        )),
    }
}

/// Load a graph by factory layout name or file path.
pub fn load_graph(name: &str) -> anyhow::Result<GraphConfig> {
    if let Some(config) = get_factory_layout(name) {
        return Ok(config);
    }

    let path = PathBuf::from(name);
    if path.exists() {
        return GraphConfig::load(&path).map_err(|e| anyhow::anyhow!("{e}"));
    }

    anyhow::bail!(
        "Graph '{name}' not found. Use 'soundcheck layouts list' to see the factory layouts."
    )
}

/// Apply `stage.param=value` overrides to a graph.
///
/// Values are stored as written; they are checked when the graph is built.
pub fn apply_params(config: &mut GraphConfig, params: &[(String, String)]) -> anyhow::Result<()> {
    for (key, value) in params {
        let Some((stage, param)) = key.split_once('.') else {
            anyhow::bail!("Parameter '{key}' must be written as stage.param");
        };
        let Some(entry) = config.stage_mut(stage) else {
            anyhow::bail!("Parameter '{key}' names unknown stage '{stage}'");
        };
        entry.params.insert(param.to_string(), value.clone());
    }
    Ok(())
}

/// Progress bar style shared by long-running commands.
pub fn progress_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-")
}

/// Running RMS and peak of a sample stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelMeter {
    sum_squares: f64,
    count: u64,
    peak: f64,
}

impl LevelMeter {
    /// Adds samples to the running totals.
    pub fn add(&mut self, samples: impl IntoIterator<Item = f64>) {
        for s in samples {
            self.sum_squares += s * s;
            self.count += 1;
            self.peak = self.peak.max(s.abs());
        }
    }

    /// RMS level of everything seen so far.
    pub fn rms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.sum_squares / self.count as f64).sqrt()
        }
    }

    /// Largest absolute sample seen so far.
    pub fn peak(&self) -> f64 {
        self.peak
    }

    /// One-line `RMS .. dB, Peak .. dB` summary.
    pub fn summary(&self) -> String {
        format!(
            "RMS {:.1} dB, Peak {:.1} dB",
            linear_to_db(self.rms()),
            linear_to_db(self.peak())
        )
    }
}

/// Converts a linear level to dB, floored at -120 dB.
pub fn linear_to_db(linear: f64) -> f64 {
    if linear <= 0.0 {
        -120.0
    } else {
        (20.0 * linear.log10()).max(-120.0)
    }
}

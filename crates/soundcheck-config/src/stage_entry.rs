//! Stage entry types.

use serde::{Deserialize, Serialize};
use soundcheck_core::InsertSpec;
use std::collections::HashMap;

/// Pre- and post-chain identifiers of a stage, as written in a graph file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InsertsConfig {
    /// Stages run before this stage's own processing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre: Vec<String>,
    /// Stages run after this stage's own processing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post: Vec<String>,
}

impl InsertsConfig {
    /// Returns true if neither chain has members.
    pub fn is_empty(&self) -> bool {
        self.pre.is_empty() && self.post.is_empty()
    }

    /// Converts to the routing core's insert spec.
    pub fn to_spec(&self) -> InsertSpec {
        InsertSpec::new()
            .with_pre(self.pre.iter().map(String::as_str))
            .with_post(self.post.iter().map(String::as_str))
    }
}

/// One node of a graph file.
///
/// # Example
///
/// ```rust
/// use soundcheck_config::StageEntry;
///
/// let entry = StageEntry::new("fft", "spectrum")
///     .with_param("size", "4096")
///     .with_param("low", "20Hz");
///
/// assert_eq!(entry.kind, "spectrum");
/// assert_eq!(entry.parse_param("low"), Some(20.0));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageEntry {
    /// Unique identifier within the graph.
    pub id: String,

    /// Stage kind name (e.g. "spectrum", "fir").
    pub kind: String,

    /// Chains wrapped around this stage.
    #[serde(default, skip_serializing_if = "InsertsConfig::is_empty")]
    pub inserts: InsertsConfig,

    /// Stage parameters as key-value pairs.
    /// Values are strings to support units ("20Hz", "-6dB", "40%").
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub params: HashMap<String, String>,
}

impl StageEntry {
    /// Create a new stage entry with no inserts or parameters.
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            inserts: InsertsConfig::default(),
            params: HashMap::new(),
        }
    }

    /// Append identifiers to the pre-chain.
    pub fn with_pre<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inserts.pre.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Append identifiers to the post-chain.
    pub fn with_post<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inserts.post.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Add a parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Get a raw parameter value.
    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Parse a parameter value with [`parse_param_value`].
    pub fn parse_param(&self, key: &str) -> Option<f64> {
        parse_param_value(self.params.get(key)?)
    }
}

/// Parse a parameter value string into an f64.
///
/// Supports various formats:
/// - Plain numbers: "0.5", "1.2", "-0.3"
/// - Percentages: "50%", "120%" (divided by 100)
/// - Decibels: "-6dB", "+3dB" (converted to linear gain)
/// - Time in ms: "100ms" (converted to seconds)
/// - Time in s: "1.5s" (kept as seconds)
/// - Frequency in Hz: "440Hz"
/// - Frequency in kHz: "1.2kHz" (converted to Hz)
pub fn parse_param_value(value: &str) -> Option<f64> {
    let value = value.trim();

    if let Some(pct) = value.strip_suffix('%') {
        return pct.trim().parse::<f64>().ok().map(|v| v / 100.0);
    }

    if let Some(db) = value
        .strip_suffix("dB")
        .or_else(|| value.strip_suffix("db"))
    {
        return db
            .trim()
            .parse::<f64>()
            .ok()
            .map(|v| 10f64.powf(v / 20.0));
    }

    if let Some(ms) = value.strip_suffix("ms") {
        return ms.trim().parse::<f64>().ok().map(|v| v / 1000.0);
    }

    if let Some(s) = value.strip_suffix('s') {
        return s.trim().parse::<f64>().ok();
    }

    if let Some(khz) = value
        .strip_suffix("kHz")
        .or_else(|| value.strip_suffix("khz"))
    {
        return khz.trim().parse::<f64>().ok().map(|v| v * 1000.0);
    }

    if let Some(hz) = value
        .strip_suffix("Hz")
        .or_else(|| value.strip_suffix("hz"))
    {
        return hz.trim().parse::<f64>().ok();
    }

    value.parse::<f64>().ok()
}

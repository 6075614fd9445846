//! Graph file format and operations.

use serde::{Deserialize, Serialize};
use soundcheck_core::BlockShape;
use std::path::Path;

use crate::error::ConfigError;
use crate::stage_entry::StageEntry;

/// Default sample rate hint for graph files.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
/// Default frames per block.
pub const DEFAULT_BLOCK_SIZE: usize = 1024;
/// Default identifier of the node blocks are fed into.
pub const DEFAULT_ENTRY: &str = "input";

/// Declarative description of a routing graph.
///
/// Stages are declared in order. A stage's inserts may only name stages
/// declared before it, so every file describes an acyclic graph.
///
/// # TOML Format
///
/// ```toml
/// name = "soundcheck"
/// sample_rate = 44100
/// block_size = 1024
/// channels = 1
/// entry = "input"
///
/// [[stages]]
/// id = "fft"
/// kind = "spectrum"
/// [stages.params]
/// size = "4096"
///
/// [[stages]]
/// id = "input"
/// kind = "input"
/// [stages.inserts]
/// post = ["fft"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphConfig {
    /// Name of the graph.
    pub name: String,

    /// Optional description of the graph.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Sample rate in Hz. Spectrum stages derive their bin range from it.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Frames per channel in every block.
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    /// Channels per block.
    #[serde(default = "default_channels")]
    pub channels: usize,

    /// Node that receives source blocks.
    #[serde(default = "default_entry")]
    pub entry: String,

    /// Stages in declaration order.
    #[serde(default)]
    pub stages: Vec<StageEntry>,
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn default_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}

fn default_channels() -> usize {
    1
}

fn default_entry() -> String {
    DEFAULT_ENTRY.to_string()
}

impl GraphConfig {
    /// Create a new graph with default settings and no stages.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
            channels: 1,
            entry: default_entry(),
            stages: Vec::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the sample rate.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the block size in frames.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the channel count.
    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    /// Set the entry node.
    pub fn with_entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = entry.into();
        self
    }

    /// Append a stage.
    pub fn with_stage(mut self, stage: StageEntry) -> Self {
        self.stages.push(stage);
        self
    }

    /// Load a graph from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a graph from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the graph to a TOML file, creating the parent directory if needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the graph to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Shape of every block routed through this graph.
    pub fn block_shape(&self) -> BlockShape {
        BlockShape::new(self.channels, self.block_size)
    }

    /// Number of declared stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if no stages are declared.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Find a stage by identifier.
    pub fn stage(&self, id: &str) -> Option<&StageEntry> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// Find a stage by identifier, mutably.
    pub fn stage_mut(&mut self, id: &str) -> Option<&mut StageEntry> {
        self.stages.iter_mut().find(|s| s.id == id)
    }

    /// Identifiers in declaration order.
    pub fn stage_ids(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.id.as_str()).collect()
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

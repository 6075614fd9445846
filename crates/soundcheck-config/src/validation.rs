//! Graph file validation.
//!
//! [`validate_graph`] checks a [`GraphConfig`] without building anything and
//! reports every problem it finds, not just the first one. Building a graph
//! runs the same checks first, so a file that validates will only fail to
//! build on resource errors.
//!
//! # Example
//!
//! ```rust
//! use soundcheck_config::{get_factory_layout, validate_graph};
//!
//! let layout = get_factory_layout("soundcheck").expect("factory layout");
//! validate_graph(&layout).expect("factory layouts are valid");
//! ```

use std::collections::HashSet;
use thiserror::Error;

use crate::build::check_params;
use crate::error::ConfigError;
use crate::graph_config::GraphConfig;
use crate::kind::StageKind;
use crate::stage_entry::StageEntry;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A graph-level setting is unusable.
    #[error("invalid setting '{setting}': {reason}")]
    InvalidSetting {
        /// Name of the setting.
        setting: &'static str,
        /// Description of the problem.
        reason: String,
    },

    /// A stage has an empty identifier.
    #[error("stage #{index} has an empty id")]
    EmptyId {
        /// Position of the stage in declaration order.
        index: usize,
    },

    /// Two stages share an identifier.
    #[error("duplicate stage id: {0}")]
    DuplicateId(String),

    /// Unknown stage kind.
    #[error("unknown kind '{kind}' for stage '{stage}'")]
    UnknownKind {
        /// Identifier of the stage.
        stage: String,
        /// The kind name that was not recognised.
        kind: String,
    },

    /// Unknown parameter name.
    #[error("unknown parameter '{param}' for {kind} stage '{stage}'")]
    UnknownParameter {
        /// Identifier of the stage.
        stage: String,
        /// Kind of the stage.
        kind: StageKind,
        /// Name of the unrecognized parameter.
        param: String,
    },

    /// Invalid parameter format.
    #[error("invalid format for parameter '{param}' of stage '{stage}': {reason}")]
    InvalidFormat {
        /// Identifier of the stage.
        stage: String,
        /// Name of the parameter.
        param: String,
        /// Description of the format error.
        reason: String,
    },

    /// Parameters parse but do not make a usable stage together.
    #[error("stage '{stage}': {reason}")]
    InvalidStage {
        /// Identifier of the stage.
        stage: String,
        /// Description of the problem.
        reason: String,
    },

    /// An insert names a stage that is not declared before the referencing stage.
    #[error("stage '{stage}' inserts '{reference}', which is not declared before it")]
    UnresolvedInsert {
        /// Identifier of the referencing stage.
        stage: String,
        /// The identifier that could not be resolved.
        reference: String,
    },

    /// The entry node is not declared.
    #[error("entry stage '{0}' is not declared")]
    MissingEntry(String),

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Flattens into a list of single errors.
    pub fn into_vec(self) -> Vec<ValidationError> {
        match self {
            ValidationError::Multiple(errors) => errors,
            other => vec![other],
        }
    }
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate a whole graph file.
///
/// Returns the single error when there is one, [`ValidationError::Multiple`]
/// when there are several.
pub fn validate_graph(config: &GraphConfig) -> ValidationResult<()> {
    let mut errors = Vec::new();

    if config.block_size == 0 {
        errors.push(ValidationError::InvalidSetting {
            setting: "block_size",
            reason: "must be at least 1".to_string(),
        });
    }
    if config.channels == 0 {
        errors.push(ValidationError::InvalidSetting {
            setting: "channels",
            reason: "must be at least 1".to_string(),
        });
    }
    if config.sample_rate == 0 {
        errors.push(ValidationError::InvalidSetting {
            setting: "sample_rate",
            reason: "must be positive".to_string(),
        });
    }

    let mut declared: HashSet<&str> = HashSet::new();
    for (index, stage) in config.stages.iter().enumerate() {
        if stage.id.is_empty() {
            errors.push(ValidationError::EmptyId { index });
        }
        for reference in stage.inserts.pre.iter().chain(&stage.inserts.post) {
            if !declared.contains(reference.as_str()) {
                errors.push(ValidationError::UnresolvedInsert {
                    stage: stage.id.clone(),
                    reference: reference.clone(),
                });
            }
        }
        if let Err(e) = validate_stage(stage, config) {
            errors.extend(e.into_vec());
        }
        if !declared.insert(stage.id.as_str()) {
            errors.push(ValidationError::DuplicateId(stage.id.clone()));
        }
    }

    if !declared.contains(config.entry.as_str()) {
        errors.push(ValidationError::MissingEntry(config.entry.clone()));
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

/// Validate one stage: its kind, parameter names and parameter values.
pub fn validate_stage(stage: &StageEntry, config: &GraphConfig) -> ValidationResult<()> {
    let Some(kind) = StageKind::from_name(&stage.kind) else {
        return Err(ValidationError::UnknownKind {
            stage: stage.id.clone(),
            kind: stage.kind.clone(),
        });
    };

    let mut errors = Vec::new();
    let mut names: Vec<&String> = stage.params.keys().collect();
    names.sort();
    for name in names {
        if !kind.params().contains(&name.as_str()) {
            errors.push(ValidationError::UnknownParameter {
                stage: stage.id.clone(),
                kind,
                param: name.clone(),
            });
        }
    }

    if let Err(e) = check_params(stage, kind, config) {
        errors.push(match e {
            ConfigError::InvalidParameter {
                stage,
                param,
                reason,
            } => ValidationError::InvalidFormat {
                stage,
                param,
                reason,
            },
            ConfigError::Spectrum { stage, source } => ValidationError::InvalidStage {
                stage,
                reason: source.to_string(),
            },
            other => ValidationError::InvalidStage {
                stage: stage.id.clone(),
                reason: other.to_string(),
            },
        });
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

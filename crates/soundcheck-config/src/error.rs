//! Error type for loading, validating and building graphs.

use std::fmt;
use std::path::PathBuf;

use soundcheck_analysis::AnalysisError;
use soundcheck_core::RouteError;
use thiserror::Error;

/// File operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    /// Reading a graph file.
    Read,
    /// Writing a graph file.
    Write,
    /// Creating the directory of a graph file.
    CreateDir,
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::CreateDir => "create directory",
        })
    }
}

/// Errors from the configuration layer.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A graph file or its directory could not be accessed.
    #[error("failed to {action} '{path}': {source}")]
    Io {
        /// What was being attempted.
        action: FileAction,
        /// Path involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid TOML for a graph.
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// The graph could not be written as TOML.
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A stage names a kind that does not exist.
    #[error("unknown stage kind: {0}")]
    UnknownKind(String),

    /// A parameter value is unusable.
    #[error("invalid parameter '{param}' for stage '{stage}': {reason}")]
    InvalidParameter {
        /// Stage holding the parameter.
        stage: String,
        /// Parameter name.
        param: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The analyser rejected a spectrum stage's settings.
    #[error("spectrum stage '{stage}': {source}")]
    Spectrum {
        /// Spectrum stage id.
        stage: String,
        /// Rejection reason.
        #[source]
        source: AnalysisError,
    },

    /// The graph failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] crate::validation::ValidationError),

    /// The core builder refused the wiring.
    #[error("routing: {0}")]
    Route(#[from] RouteError),
}

impl ConfigError {
    fn io(action: FileAction, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// Reading `path` failed.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::io(FileAction::Read, path, source)
    }

    /// Writing `path` failed.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::io(FileAction::Write, path, source)
    }

    /// Creating directory `path` failed.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::io(FileAction::CreateDir, path, source)
    }

    /// Parameter `param` of `stage` is unusable.
    pub fn invalid_param(
        stage: impl Into<String>,
        param: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            stage: stage.into(),
            param: param.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soundcheck_core::StageId;
    use std::error::Error;
    use std::path::Path;

    fn not_found() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "missing")
    }

    #[test]
    fn io_errors_name_action_and_path() {
        let cases = [
            (ConfigError::read_file("/g/a.toml", not_found()), "failed to read '/g/a.toml'"),
            (ConfigError::write_file("/g/b.toml", not_found()), "failed to write '/g/b.toml'"),
            (ConfigError::create_dir("/g", not_found()), "failed to create directory '/g'"),
        ];
        for (err, prefix) in cases {
            let msg = err.to_string();
            assert!(msg.starts_with(prefix), "got: {msg}");
            assert!(err.source().is_some());
        }
    }

    #[test]
    fn read_file_keeps_path() {
        let err = ConfigError::read_file("/some/path", not_found());
        assert!(matches!(
            err,
            ConfigError::Io { action: FileAction::Read, ref path, .. } if path == Path::new("/some/path")
        ));
    }

    #[test]
    fn invalid_parameter_display() {
        let err = ConfigError::invalid_param("fft", "size", "not an integer");
        assert_eq!(
            err.to_string(),
            "invalid parameter 'size' for stage 'fft': not an integer"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn route_error_wraps_unresolved_insert() {
        let err = ConfigError::from(RouteError::UnresolvedInsert {
            node: StageId::from("input"),
            reference: StageId::from("fft"),
        });
        let msg = err.to_string();
        assert!(msg.starts_with("routing: "), "got: {msg}");
        assert!(msg.contains("'fft'"), "got: {msg}");
    }

    #[test]
    fn spectrum_error_chains_analysis_error() {
        let err = ConfigError::Spectrum {
            stage: "fft".to_string(),
            source: AnalysisError::InvalidSize(1),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("at least 2"));
    }
}

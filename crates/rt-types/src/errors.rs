use thiserror::Error;

/// Main error type for the RagTune system
#[derive(Error, Debug)]
pub enum TuneError {
    #[error("Search space error: {0}")]
    SearchSpace(#[from] SearchSpaceError),

    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Trial error: {0}")]
    Trial(#[from] TrialError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(String),
}

/// Search-space construction errors
#[derive(Error, Debug)]
pub enum SearchSpaceError {
    #[error("Parameter '{param}' declares an empty candidate list")]
    EmptyValues { param: String },

    #[error("Parameter '{param}' is declared more than once")]
    DuplicateParam { param: String },
}

/// Artifact-store errors
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("No completed run found for pipeline '{pipeline}' with component '{component}'")]
    RunNotFound { pipeline: String, component: String },

    #[error("Run directory '{entry}' does not end in a parseable timestamp")]
    InvalidTimestamp { entry: String },

    #[error("Output rows are missing column '{column}'")]
    MissingColumn { column: String },

    #[error("Output column '{column}' is not of type {expected}")]
    ColumnType { column: String, expected: String },

    #[error("Parquet read failed: {0}")]
    Parquet(String),
}

/// Trial execution errors
#[derive(Error, Debug)]
pub enum TrialError {
    #[error("Pipeline '{pipeline}' execution failed: {message}")]
    ExecutionFailed { pipeline: String, message: String },

    #[error("Metric '{metric}' missing from trial {trial} results")]
    MissingMetric { metric: String, trial: usize },
}

/// Result type alias for RagTune operations
pub type TuneResult<T> = Result<T, TuneError>;

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::TuneError::Config(format!($($arg)*))
    };
}

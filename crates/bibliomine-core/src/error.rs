use std::path::PathBuf;

use thiserror::Error;

/// All errors that can occur in bibliomine-core.
///
/// Data-quality problems (unparseable DOI, missing year) never surface here;
/// the cleaners absorb those into absent fields. Only structural failures
/// (unreadable files, schema breaks, malformed config) are errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input file not found: {0}")]
    InputNotFound(PathBuf),

    // Field is not named `source`: thiserror reserves that name for the
    // error cause.
    #[error("required column '{column}' missing from {source_db} export")]
    MissingColumn { source_db: String, column: String },

    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn missing_column_names_source_and_column() {
        let err = PipelineError::MissingColumn {
            source_db: "scopus".to_string(),
            column: "EID".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "required column 'EID' missing from scopus export"
        );
        assert!(err.source().is_none());
    }
}

//! Error types for the clustering pipeline and the serving filter

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the library
pub type DietResult<T> = Result<T, DietError>;

/// Failures raised by the pipeline stages and the serving layer.
///
/// An insufficient number of matching foods is not an error: it is reported
/// through [`crate::serving::Recommendation::InsufficientData`].
#[derive(Debug, Error)]
pub enum DietError {
    /// Malformed input file, missing columns or unusable values. Fatal to a batch run.
    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    /// A feature column has zero variance and cannot be standardized.
    #[error("feature '{feature}' has zero variance and cannot be standardized")]
    DegenerateFeature { feature: String },

    /// Labeling requires exactly three clusters.
    #[error("expected exactly {expected} clusters, got {actual}")]
    InvalidClusterCount { expected: usize, actual: usize },

    /// A serving request carried values that cannot produce a BMI.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The serving layer was started before a pipeline run produced artifacts.
    #[error("artifact not found at {}; run the clustering pipeline first", path.display())]
    ArtifactMissing { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DietError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DietError::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable machine-readable code used in HTTP error bodies
    pub fn code(&self) -> &'static str {
        match self {
            DietError::DataIntegrity(_) => "data_integrity",
            DietError::DegenerateFeature { .. } => "degenerate_feature",
            DietError::InvalidClusterCount { .. } => "invalid_cluster_count",
            DietError::InvalidQuery(_) => "invalid_query",
            DietError::ArtifactMissing { .. } => "artifact_missing",
            DietError::Io { .. } => "io",
            DietError::Csv(_) => "csv",
            DietError::Serialization(_) => "serialization",
        }
    }
}

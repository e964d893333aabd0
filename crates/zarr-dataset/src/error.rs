//! Error types for dataset access.

use thiserror::Error;

/// Errors that can occur while opening, writing or querying a dataset.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Failed to open the dataset or one of its arrays.
    #[error("failed to open dataset: {0}")]
    OpenFailed(String),

    /// Failed to read array data.
    #[error("failed to read data: {0}")]
    ReadFailed(String),

    /// Failed to write array data or metadata.
    #[error("failed to write data: {0}")]
    WriteFailed(String),

    /// Invalid or inconsistent metadata in the store.
    #[error("invalid dataset metadata: {0}")]
    InvalidMetadata(String),

    /// A dataset definition violates the data model.
    #[error("invalid dataset definition: {0}")]
    InvalidDefinition(String),

    /// Requested variables do not exist in the dataset.
    #[error(
        "Invalid variables: {}. Available variables are: {}",
        invalid.join(", "),
        available.join(", ")
    )]
    UnknownVariables {
        invalid: Vec<String>,
        available: Vec<String>,
    },

    /// A coordinate required for selection is missing.
    #[error("coordinate not found: {0}")]
    MissingCoordinate(String),

    /// A variable does not carry a dimension required for selection.
    #[error("dimension '{dimension}' not found on variable '{variable}'")]
    MissingDimension { variable: String, dimension: String },

    /// A time string could not be parsed.
    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    /// A bucket or store path is not acceptable.
    #[error("invalid store path: {0}")]
    InvalidPath(String),

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl DatasetError {
    /// Create an OpenFailed error.
    pub fn open_failed(msg: impl Into<String>) -> Self {
        Self::OpenFailed(msg.into())
    }

    /// Create a ReadFailed error.
    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }

    /// Create a WriteFailed error.
    pub fn write_failed(msg: impl Into<String>) -> Self {
        Self::WriteFailed(msg.into())
    }

    /// Create an InvalidMetadata error.
    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }

    /// Create an InvalidDefinition error.
    pub fn invalid_definition(msg: impl Into<String>) -> Self {
        Self::InvalidDefinition(msg.into())
    }

    /// Create a Storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Whether the error was caused by the caller's input rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownVariables { .. } | Self::InvalidTime(_) | Self::InvalidPath(_)
        )
    }
}

impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for DatasetError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidMetadata(err.to_string())
    }
}

/// Result type for dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;

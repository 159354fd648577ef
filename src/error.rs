use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanPayError {
    #[error("Capture device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("Timed out waiting for a frame")]
    FrameTimeout,
    #[error("Frame read failed: {0}")]
    FrameReadError(String),
    #[error("Transaction log unavailable: {0}")]
    LogUnavailable(String),
    #[error("Corrupt transaction log at line {line}: {reason}")]
    CorruptLog { line: usize, reason: String },
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScanPayError>;

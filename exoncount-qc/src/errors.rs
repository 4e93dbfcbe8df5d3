use thiserror::Error;

#[derive(Error, Debug)]
pub enum QcError {
    #[error("Read length must be positive, got {0}")]
    InvalidReadLength(u32),

    #[error("Invalid cut-points: {0}")]
    InvalidCutPoints(String),

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),
}

use std::path::PathBuf;

use exoncount_core::GeneModelError;
use exoncount_io::IoError;
use exoncount_overlaprs::GeneIndexError;
use exoncount_qc::QcError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(
        "Sequence names used by the alignments have no match in the gene model after renaming: {}. \
         Extend the rename table or list them under ignored_sequences",
        missing.join(", ")
    )]
    NamingMismatch { missing: Vec<String> },

    #[error("Sample {sample} failed: {reason}")]
    SampleProcessing { sample: String, reason: String },

    #[error("Input files {first:?} and {second:?} both resolve to sample id {sample}")]
    DuplicateSampleIdentity {
        sample: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Gene model contains no genes")]
    EmptyGeneModel,

    #[error("No alignment files (.bam, .sam) found in {0:?}")]
    NoSamples(PathBuf),

    #[error("All {} samples failed", failed.len())]
    AllSamplesFailed { failed: Vec<(String, String)> },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    GeneModel(GeneModelError),

    #[error(transparent)]
    Input(IoError),

    #[error(transparent)]
    Qc(#[from] QcError),

    #[error(transparent)]
    Index(#[from] GeneIndexError),

    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<GeneModelError> for PipelineError {
    fn from(value: GeneModelError) -> Self {
        match value {
            GeneModelError::EmptyGeneModel => PipelineError::EmptyGeneModel,
            other => PipelineError::GeneModel(other),
        }
    }
}

impl From<IoError> for PipelineError {
    fn from(value: IoError) -> Self {
        match value {
            IoError::GeneModel(inner) => inner.into(),
            other => PipelineError::Input(other),
        }
    }
}

impl PipelineError {
    /// True for errors that abort the whole run rather than a single sample.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PipelineError::SampleProcessing { .. })
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

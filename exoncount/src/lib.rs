//! Exon-level read counting and alignment QC across many samples.
//!
//! Given a directory of alignment files (one per sample) and a gene annotation,
//! a run produces:
//!
//! - a dense gene × sample count matrix, where a read counts once for every gene
//!   whose exons it overlaps by at least one base (strand ignored)
//! - long-form frequency tables of gap count, mapping quality, binned alignment
//!   width and a secondary quality tag, one per metric across all samples
//! - a report listing every sample as succeeded or failed
//!
//! Samples are processed in parallel and independently; one bad file does not
//! stop the others.
//!
//! # Example
//!
//! ```rust,no_run
//! use exoncount::{Pipeline, PipelineConfig, output::write_outputs};
//!
//! let mut config = PipelineConfig::new("data/bam", "data/genes.gtf");
//! config.rename.insert("1".to_string(), "Chr1".to_string());
//!
//! let outcome = Pipeline::new(config).run().unwrap();
//! write_outputs(&outcome, std::path::Path::new("exoncount_out")).unwrap();
//! ```
pub mod aggregate;
pub mod cache;
pub mod config;
pub mod counting;
pub mod errors;
pub mod harmonize;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod worker;

pub use config::{ConfigError, PipelineConfig};
pub use counting::CountMode;
pub use errors::PipelineError;
pub use pipeline::{Pipeline, RunOutcome};
pub use report::{RunReport, SampleStatus};
pub use worker::{NoodlesSource, ReadSource};

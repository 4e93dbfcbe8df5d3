//! # Input utilities for exoncount.
//!
//! Everything that turns bytes on disk into core models lives here:
//!
//! - [`alignments`]: a streaming BAM/SAM reader yielding [`AlignedRead`](exoncount_core::models::AlignedRead)s
//! - [`gtf`]: a GTF loader building a [`GeneModel`](exoncount_core::models::GeneModel) from exon records
//! - [`tables`]: two-column TSV lookups (sequence renames, sample groups)
//!
pub mod alignments;
pub mod consts;
pub mod error;
pub mod gtf;
pub mod tables;

// re-expose core functions
pub use alignments::*;
pub use error::*;
pub use gtf::*;
pub use tables::*;

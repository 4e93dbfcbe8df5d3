//! Core data model for exoncount.
//!
//! This crate holds the types every other exoncount crate agrees on:
//!
//! - [`models::GenomicInterval`]: a stranded, half-open interval on a named sequence
//! - [`models::GeneModel`]: exons grouped by gene, in annotation order
//! - [`models::AlignedRead`]: one (possibly gapped) alignment, reduced to what counting needs
//! - [`models::RenameTable`]: an old→new mapping of sequence names
//!
//! All coordinates are 0-based, half-open (BED convention).
//!
//! # Example
//!
//! ```rust
//! use exoncount_core::models::{GeneModelBuilder, GenomicInterval, Strand};
//!
//! let mut builder = GeneModelBuilder::new();
//! builder.add_exon("G1", GenomicInterval::new("Chr1", 100, 200, Strand::Forward).unwrap()).unwrap();
//! builder.add_exon("G1", GenomicInterval::new("Chr1", 300, 400, Strand::Forward).unwrap()).unwrap();
//! let model = builder.build().unwrap();
//!
//! assert_eq!(model.len(), 1);
//! assert_eq!(model.gene("G1").unwrap().span(), (100, 400));
//! ```
pub mod errors;
pub mod models;
pub mod utils;

pub use errors::GeneModelError;

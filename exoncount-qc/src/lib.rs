//! Alignment quality control for exoncount.
//!
//! [`introns`] derives the global width cut-points from the gaps between exons of
//! every gene, and [`statistics`] tabulates per-sample frequency distributions
//! (gap count, mapping quality, binned width, secondary quality) against them.
pub mod errors;
pub mod histogram;
pub mod introns;
pub mod statistics;

pub use errors::QcError;
pub use histogram::Histogram;
pub use introns::{CutPoints, SummaryQuantiles};
pub use statistics::{AlignmentStatistics, Metric};

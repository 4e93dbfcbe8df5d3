//! Interval overlap queries for exoncount.
//!
//! Two layers live here:
//!
//! - [`Bits`]: a Binary Interval Search index over the intervals of one sequence,
//!   behind the [`Overlapper`] trait.
//! - [`GeneIndex`]: one [`Bits`] per sequence name holding every exon of a
//!   [`GeneModel`](exoncount_core::models::GeneModel), valued by gene position. This
//!   is what the counter asks "which genes does this read touch?".
//!
//! ## Quick Start
//!
//! ```rust
//! use exoncount_overlaprs::{Bits, Overlapper, Interval};
//!
//! let exons = vec![
//!     Interval { start: 100u32, end: 200, val: 0u32 },
//!     Interval { start: 300, end: 400, val: 0 },
//!     Interval { start: 350, end: 500, val: 1 },
//! ];
//!
//! let bits = Bits::build(exons);
//! assert_eq!(bits.find(150, 180).len(), 1);
//! assert_eq!(bits.find(360, 370).len(), 2);
//! assert_eq!(bits.find_iter(250, 260).count(), 0);
//! ```

/// Binary Interval Search implementation.
///
/// See [`Bits`] for details.
pub mod bits;

/// Per-sequence exon to gene lookup.
pub mod gene_index;

/// Core traits for overlap operations.
///
/// See [`Overlapper`] for the main trait.
pub mod traits;

// re-exports
pub use self::bits::Bits;
pub use self::gene_index::{GeneIndex, GeneIndexError};
pub use self::traits::{Interval, Overlapper};

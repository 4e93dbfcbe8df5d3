pub mod aligned_read;
pub mod gene_model;
pub mod genomic_interval;
pub mod interval;
pub mod rename;

// re-export for cleaner imports
pub use self::aligned_read::{AlignedRead, ReadFlags};
pub use self::gene_model::{Gene, GeneModel, GeneModelBuilder};
pub use self::genomic_interval::{GenomicInterval, Strand};
pub use self::interval::Interval;
pub use self::rename::RenameTable;

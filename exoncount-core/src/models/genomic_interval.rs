use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::errors::GeneModelError;

/// Strand of a feature. Counting is strand-agnostic, but the strand is kept so
/// annotation round-trips without loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Strand {
    Forward,
    Reverse,
    Unknown,
}

impl Strand {
    pub fn from_char(c: char) -> Strand {
        match c {
            '+' => Strand::Forward,
            '-' => Strand::Reverse,
            _ => Strand::Unknown,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
            Strand::Unknown => '*',
        }
    }
}

///
/// A stranded interval `[start, end)` on a named reference sequence.
///
/// Fields are private: once built, an interval never changes. Renaming the
/// sequence produces a new value (see [`GenomicInterval::with_seqname`]).
///
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GenomicInterval {
    seqname: String,
    start: u32,
    end: u32,
    strand: Strand,
}

impl GenomicInterval {
    pub fn new(
        seqname: impl Into<String>,
        start: u32,
        end: u32,
        strand: Strand,
    ) -> Result<Self, GeneModelError> {
        let seqname = seqname.into();
        if start >= end {
            return Err(GeneModelError::InvalidInterval {
                seqname,
                start,
                end,
            });
        }
        Ok(GenomicInterval {
            seqname,
            start,
            end,
            strand,
        })
    }

    pub fn seqname(&self) -> &str {
        &self.seqname
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn strand(&self) -> Strand {
        self.strand
    }

    pub fn width(&self) -> u32 {
        self.end - self.start
    }

    /// Strand-agnostic overlap of at least one base.
    pub fn overlaps(&self, other: &GenomicInterval) -> bool {
        self.seqname == other.seqname && self.start < other.end && other.start < self.end
    }

    pub fn with_seqname(&self, seqname: impl Into<String>) -> GenomicInterval {
        GenomicInterval {
            seqname: seqname.into(),
            start: self.start,
            end: self.end,
            strand: self.strand,
        }
    }
}

impl Display for GenomicInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}({})",
            self.seqname,
            self.start,
            self.end,
            self.strand.as_char()
        )
    }
}

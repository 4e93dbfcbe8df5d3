//! Per-sample overlap counting against the exon index.
use std::fmt::Display;
use std::str::FromStr;

use exoncount_core::models::AlignedRead;
use exoncount_overlaprs::GeneIndex;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

///
/// How a read touching more than one gene is counted.
///
/// - `Union`: every gene hit gets one count.
/// - `Unique`: only reads hitting exactly one gene are counted.
///
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountMode {
    #[default]
    Union,
    Unique,
}

impl FromStr for CountMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "union" => Ok(CountMode::Union),
            "unique" => Ok(CountMode::Unique),
            other => Err(ConfigError::Invalid(format!(
                "unknown count mode {:?}, expected union or unique",
                other
            ))),
        }
    }
}

impl Display for CountMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CountMode::Union => write!(f, "union"),
            CountMode::Unique => write!(f, "unique"),
        }
    }
}

/// What happened to the reads of one sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentTally {
    /// Mapped reads seen.
    pub total: u64,
    /// Reads dropped by the read filter before counting.
    pub filtered: u64,
    /// Reads that added to at least one gene.
    pub assigned: u64,
    /// Reads overlapping exons of more than one gene.
    pub ambiguous: u64,
    /// Reads overlapping no exon.
    pub no_feature: u64,
}

///
/// Accumulates one count per gene, in gene model order, for a stream of reads.
///
/// A read adds at most one to any gene no matter how many of that gene's exons
/// it overlaps.
///
pub struct GeneCounter<'a> {
    index: &'a GeneIndex,
    mode: CountMode,
    counts: Vec<u64>,
    tally: AssignmentTally,
    hits: Vec<u32>,
}

impl<'a> GeneCounter<'a> {
    pub fn new(index: &'a GeneIndex, mode: CountMode) -> Self {
        GeneCounter {
            index,
            mode,
            counts: vec![0; index.n_genes()],
            tally: AssignmentTally::default(),
            hits: Vec::new(),
        }
    }

    pub fn observe(&mut self, read: &AlignedRead) {
        self.tally.total += 1;
        self.index.genes_hit(read, &mut self.hits);

        match (self.hits.len(), self.mode) {
            (0, _) => self.tally.no_feature += 1,
            (1, _) => {
                self.counts[self.hits[0] as usize] += 1;
                self.tally.assigned += 1;
            }
            (_, CountMode::Union) => {
                for &gene in &self.hits {
                    self.counts[gene as usize] += 1;
                }
                self.tally.assigned += 1;
                self.tally.ambiguous += 1;
            }
            (_, CountMode::Unique) => self.tally.ambiguous += 1,
        }
    }

    /// Record a read the filter rejected.
    pub fn skip(&mut self) {
        self.tally.total += 1;
        self.tally.filtered += 1;
    }

    pub fn finish(self) -> (Vec<u64>, AssignmentTally) {
        (self.counts, self.tally)
    }
}

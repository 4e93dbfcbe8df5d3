//! Exon to gene lookup across every sequence of a gene model.
use std::collections::HashMap;

use exoncount_core::models::{AlignedRead, GeneModel};
use thiserror::Error;

use crate::{Bits, Interval, Overlapper};

#[derive(Debug, Error)]
pub enum GeneIndexError {
    #[error("Gene model has {0} genes, more than a u32 gene index can address")]
    TooManyGenes(usize),
}

///
/// One [`Bits`] index per sequence name, holding every exon of the model valued
/// by the position of its gene in the model (so values line up with the rows of
/// the count matrix).
///
/// Strand is not stored: overlap queries are strand-agnostic.
///
pub struct GeneIndex {
    index_maps: HashMap<String, Bits<u32, u32>>,
    n_genes: usize,
}

impl GeneIndex {
    pub fn from_model(model: &GeneModel) -> Result<Self, GeneIndexError> {
        if u32::try_from(model.len()).is_err() {
            return Err(GeneIndexError::TooManyGenes(model.len()));
        }

        let mut per_sequence: HashMap<String, Vec<Interval<u32, u32>>> = HashMap::new();
        for (position, gene) in model.genes().iter().enumerate() {
            let intervals = per_sequence.entry(gene.seqname().to_string()).or_default();
            for exon in gene.exons() {
                intervals.push(Interval::new(exon.start(), exon.end(), position as u32));
            }
        }

        let index_maps = per_sequence
            .into_iter()
            .map(|(seqname, intervals)| (seqname, Bits::build(intervals)))
            .collect();

        Ok(GeneIndex {
            index_maps,
            n_genes: model.len(),
        })
    }

    pub fn n_genes(&self) -> usize {
        self.n_genes
    }

    ///
    /// Collect into `hits` the distinct gene positions whose exons share at least
    /// one base with any aligned block of `read`. `hits` is cleared first and
    /// left sorted; pass the same buffer for every read to avoid reallocating.
    ///
    /// A read on a sequence the model does not know hits nothing.
    ///
    pub fn genes_hit(&self, read: &AlignedRead, hits: &mut Vec<u32>) {
        hits.clear();
        let Some(bits) = self.index_maps.get(&*read.seqname) else {
            return;
        };
        for &(start, end) in &read.blocks {
            if start >= end {
                continue;
            }
            hits.extend(bits.iter_find(start, end).map(|iv| iv.val));
        }
        hits.sort_unstable();
        hits.dedup();
    }
}

//! Intron-length profiling and the width cut-points derived from it.
//!
//! The gaps of a gene are the parts of its span (first exon start to last exon
//! end) that no exon covers. Gaps from every gene are pooled, summarised by five
//! quantiles, and combined with the read length into the boundaries used to bin
//! alignment widths for every sample of a run.
use std::fmt::Write as _;

use exoncount_core::models::{Gene, GeneModel};
use md5::{Digest, Md5};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::QcError;

///
/// Gaps of one gene: the complement of the union of its exons within the gene
/// span, as half-open `(start, end)` pairs in ascending order.
///
/// Overlapping and abutting exons are merged first, so a gene whose exons cover
/// its span contiguously has no gaps.
///
pub fn gene_gaps(gene: &Gene) -> Vec<(u32, u32)> {
    let mut exons: Vec<(u32, u32)> = gene.exons().iter().map(|e| (e.start(), e.end())).collect();
    exons.sort_unstable();

    let mut gaps = Vec::new();
    let mut covered_to: Option<u32> = None;
    for (start, end) in exons {
        match covered_to {
            Some(reach) if start > reach => {
                gaps.push((reach, start));
                covered_to = Some(end);
            }
            Some(reach) => covered_to = Some(reach.max(end)),
            None => covered_to = Some(end),
        }
    }
    gaps
}

///
/// Widths of every gap of every gene, computed per gene in parallel on the
/// current rayon pool. Order of the result is unspecified.
///
pub fn intron_length_pool(model: &GeneModel) -> Vec<u32> {
    model
        .genes()
        .par_iter()
        .flat_map_iter(|gene| {
            gene_gaps(gene)
                .into_iter()
                .map(|(start, end)| end - start)
        })
        .collect()
}

/// Five-number summary of a pool of lengths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryQuantiles {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl SummaryQuantiles {
    /// `None` when the pool is empty.
    pub fn from_pool(pool: &[u32]) -> Option<Self> {
        if pool.is_empty() {
            return None;
        }
        let mut sorted = pool.to_vec();
        sorted.sort_unstable();

        Some(SummaryQuantiles {
            min: sorted[0] as f64,
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1] as f64,
        })
    }

    pub fn as_array(&self) -> [f64; 5] {
        [self.min, self.q1, self.median, self.q3, self.max]
    }
}

// linear interpolation between closest ranks; `sorted` must be non-empty
fn quantile(sorted: &[u32], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = h - lo as f64;
    sorted[lo] as f64 + frac * (sorted[hi] as f64 - sorted[lo] as f64)
}

///
/// Strictly increasing bin boundaries for alignment widths, first boundary 0 and
/// last boundary `+inf`.
///
/// Bin `i` is the right-closed range `(c[i], c[i+1]]`; a width of 0 falls in the
/// first bin so that every read is binned.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutPoints {
    boundaries: Vec<f64>,
    read_length: u32,
    quantiles: Option<SummaryQuantiles>,
}

impl CutPoints {
    ///
    /// Boundaries from `0, read_length, min, Q1, median, Q3, max, +inf`, sorted and
    /// de-duplicated.
    ///
    pub fn from_pool(read_length: u32, pool: &[u32]) -> Result<Self, QcError> {
        if read_length == 0 {
            return Err(QcError::InvalidReadLength(read_length));
        }
        let quantiles = SummaryQuantiles::from_pool(pool);

        let mut boundaries = vec![0.0, read_length as f64];
        if let Some(q) = &quantiles {
            boundaries.extend(q.as_array());
        }
        boundaries.push(f64::INFINITY);
        boundaries.sort_by(f64::total_cmp);
        boundaries.dedup();

        Ok(CutPoints {
            boundaries,
            read_length,
            quantiles,
        })
    }

    /// Profile a whole gene model: pool its gaps and derive the cut-points.
    pub fn from_model(read_length: u32, model: &GeneModel) -> Result<Self, QcError> {
        let pool = intron_length_pool(model);
        log::debug!("Pooled {} gaps from {} genes", pool.len(), model.len());
        Self::from_pool(read_length, &pool)
    }

    /// Re-check the ordering invariants, e.g. after loading from a cache.
    pub fn validate(&self) -> Result<(), QcError> {
        let b = &self.boundaries;
        if b.len() < 2 {
            return Err(QcError::InvalidCutPoints(format!(
                "need at least two boundaries, got {}",
                b.len()
            )));
        }
        if b[0] != 0.0 || b[b.len() - 1] != f64::INFINITY {
            return Err(QcError::InvalidCutPoints(
                "first boundary must be 0 and last must be infinity".to_string(),
            ));
        }
        if b.windows(2).any(|w| w[0] >= w[1]) {
            return Err(QcError::InvalidCutPoints(
                "boundaries are not strictly increasing".to_string(),
            ));
        }
        Ok(())
    }

    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    pub fn read_length(&self) -> u32 {
        self.read_length
    }

    pub fn quantiles(&self) -> Option<&SummaryQuantiles> {
        self.quantiles.as_ref()
    }

    pub fn n_bins(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Index of the bin holding `width`.
    pub fn bin_of(&self, width: u32) -> usize {
        let w = width as f64;
        // first boundary that is >= w closes the bin
        let closing = self.boundaries.partition_point(|&c| c < w);
        closing.saturating_sub(1).min(self.n_bins() - 1)
    }

    /// Label of a bin in interval notation, e.g. `(100,2450]` or `(8000,Inf]`.
    pub fn label(&self, bin: usize) -> String {
        match (self.boundaries.get(bin), self.boundaries.get(bin + 1)) {
            (Some(lo), Some(hi)) => format!("({},{}]", fmt_boundary(*lo), fmt_boundary(*hi)),
            _ => format!("bin{}", bin),
        }
    }

    /// md5 over the boundaries; changes whenever binning would change.
    pub fn digest(&self) -> String {
        let mut text = String::new();
        for b in &self.boundaries {
            let _ = write!(text, "{},", fmt_boundary(*b));
        }
        let mut hasher = Md5::new();
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

fn fmt_boundary(b: f64) -> String {
    if b.is_infinite() {
        "Inf".to_string()
    } else {
        format!("{}", b)
    }
}

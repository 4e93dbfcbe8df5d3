//! Merging per-sample results into run-wide tables.
use std::collections::BTreeMap;
use std::path::PathBuf;

use exoncount_core::models::GeneModel;
use exoncount_core::utils::derive_sample_id;
use exoncount_qc::{CutPoints, Metric};
use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::counting::AssignmentTally;
use crate::errors::{PipelineError, Result};
use crate::worker::{Sample, SampleResult};

/// Group label for samples missing from the group table.
pub const MISSING_GROUP: &str = "NA";

///
/// Pair every input file with its sample id, keeping discovery order.
///
/// Two files resolving to the same id is a fatal configuration error.
///
pub fn assign_sample_ids(paths: &[PathBuf], separator: &str) -> Result<Vec<Sample>> {
    let mut seen: FxHashMap<String, PathBuf> = FxHashMap::default();
    let mut samples = Vec::with_capacity(paths.len());

    for path in paths {
        let id = derive_sample_id(path, separator);
        if let Some(first) = seen.get(&id) {
            return Err(PipelineError::DuplicateSampleIdentity {
                sample: id,
                first: first.clone(),
                second: path.clone(),
            });
        }
        seen.insert(id.clone(), path.clone());
        samples.push(Sample {
            id,
            path: path.clone(),
        });
    }

    Ok(samples)
}

///
/// Gene by sample read counts. Dense: every gene of the model has a value for
/// every sample. Rows follow gene model order, columns follow sample discovery
/// order.
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountMatrix {
    genes: Vec<String>,
    samples: Vec<String>,
    // one column per sample
    columns: Vec<Vec<u64>>,
}

impl CountMatrix {
    pub fn new(model: &GeneModel) -> Self {
        CountMatrix {
            genes: model.gene_ids().map(str::to_string).collect(),
            samples: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Append a sample column. The column must hold one count per gene.
    pub fn push_column(&mut self, sample: &str, counts: Vec<u64>) -> Result<()> {
        if counts.len() != self.genes.len() {
            return Err(PipelineError::SampleProcessing {
                sample: sample.to_string(),
                reason: format!(
                    "{} counts for a model of {} genes",
                    counts.len(),
                    self.genes.len()
                ),
            });
        }
        self.samples.push(sample.to_string());
        self.columns.push(counts);
        Ok(())
    }

    pub fn from_results(model: &GeneModel, results: &[SampleResult]) -> Result<Self> {
        let mut matrix = CountMatrix::new(model);
        for result in results {
            matrix.push_column(&result.sample, result.counts.clone())?;
        }
        Ok(matrix)
    }

    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn n_genes(&self) -> usize {
        self.genes.len()
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn get(&self, gene: usize, sample: usize) -> Option<u64> {
        self.columns.get(sample)?.get(gene).copied()
    }

    pub fn column(&self, sample: &str) -> Option<&[u64]> {
        let idx = self.samples.iter().position(|s| s == sample)?;
        Some(&self.columns[idx])
    }

    /// Counts of one gene across samples, in column order.
    pub fn row(&self, gene: usize) -> Vec<u64> {
        self.columns.iter().map(|col| col[gene]).collect()
    }
}

/// One `(value, frequency)` pair of a sample's histogram, stamped with its origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticRow {
    pub value: String,
    pub frequency: u64,
    pub sample: String,
    pub metric: Metric,
}

/// Long-form table of one metric across samples, sample-major then value-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticTable {
    pub metric: Metric,
    pub rows: Vec<StatisticRow>,
}

impl StatisticTable {
    pub fn from_results(metric: Metric, results: &[SampleResult], cut_points: &CutPoints) -> Self {
        let rows = results
            .iter()
            .flat_map(|result| {
                result
                    .statistics
                    .frequencies(metric, cut_points)
                    .into_iter()
                    .map(|(value, frequency)| StatisticRow {
                        value,
                        frequency,
                        sample: result.sample.clone(),
                        metric,
                    })
            })
            .collect();

        StatisticTable { metric, rows }
    }

    /// Sum of frequencies for one sample.
    pub fn total_for(&self, sample: &str) -> u64 {
        self.rows
            .iter()
            .filter(|r| r.sample == sample)
            .map(|r| r.frequency)
            .sum()
    }
}

/// A mapping-quality row at or above the "good" threshold, with its sample's group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodAlignmentRow {
    pub value: String,
    pub frequency: u64,
    pub sample: String,
    pub metric: Metric,
    pub group: String,
}

///
/// The rows of a mapping-quality table with value `>= min_mapq`, each labelled
/// with the group of its sample from `groups` ([`MISSING_GROUP`] when absent).
///
pub fn good_alignments(
    mapq: &StatisticTable,
    groups: &BTreeMap<String, String>,
    min_mapq: u8,
) -> Vec<GoodAlignmentRow> {
    mapq.rows
        .iter()
        .filter(|row| {
            row.value
                .parse::<i64>()
                .is_ok_and(|v| v >= i64::from(min_mapq))
        })
        .map(|row| GoodAlignmentRow {
            value: row.value.clone(),
            frequency: row.frequency,
            sample: row.sample.clone(),
            metric: row.metric,
            group: groups
                .get(&row.sample)
                .cloned()
                .unwrap_or_else(|| MISSING_GROUP.to_string()),
        })
        .collect()
}

/// Read assignment outcome of one sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentSummaryRow {
    pub sample: String,
    #[serde(flatten)]
    pub tally: AssignmentTally,
}

pub fn assignment_summary(results: &[SampleResult]) -> Vec<AssignmentSummaryRow> {
    results
        .iter()
        .map(|r| AssignmentSummaryRow {
            sample: r.sample.clone(),
            tally: r.assignment,
        })
        .collect()
}

use std::collections::{BTreeSet, HashMap};

use md5::{Digest, Md5};

use crate::errors::GeneModelError;
use crate::models::genomic_interval::GenomicInterval;
use crate::models::rename::RenameTable;

///
/// One gene: an id and its exons, all on the same sequence.
///
/// Exons are kept sorted by `(start, end)` with exact duplicates removed. They
/// may overlap each other (alternative transcripts share exonic bases).
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gene {
    id: String,
    seqname: String,
    exons: Vec<GenomicInterval>,
}

impl Gene {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn seqname(&self) -> &str {
        &self.seqname
    }

    pub fn exons(&self) -> &[GenomicInterval] {
        &self.exons
    }

    /// Bounding span `min(start)..max(end)` over the exons.
    pub fn span(&self) -> (u32, u32) {
        // genes are never built without at least one exon
        let start = self.exons.iter().map(|e| e.start()).min().unwrap_or(0);
        let end = self.exons.iter().map(|e| e.end()).max().unwrap_or(0);
        (start, end)
    }
}

///
/// Exons grouped by gene id. Genes keep the order in which they were first added;
/// that order becomes the row order of the count matrix.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneModel {
    genes: Vec<Gene>,
    index: HashMap<String, usize>,
}

impl GeneModel {
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    pub fn gene(&self, id: &str) -> Option<&Gene> {
        self.index.get(id).map(|&i| &self.genes[i])
    }

    /// Row position of a gene in the model's order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn gene_ids(&self) -> impl Iterator<Item = &str> {
        self.genes.iter().map(|g| g.id.as_str())
    }

    /// `gene id -> exons`, in model order.
    pub fn exons_by_gene(&self) -> impl Iterator<Item = (&str, &[GenomicInterval])> {
        self.genes.iter().map(|g| (g.id.as_str(), g.exons.as_slice()))
    }

    pub fn sequence_names(&self) -> BTreeSet<String> {
        self.genes.iter().map(|g| g.seqname.clone()).collect()
    }

    /// Total number of exons across genes.
    pub fn n_exons(&self) -> usize {
        self.genes.iter().map(|g| g.exons.len()).sum()
    }

    ///
    /// A copy of this model with every sequence name passed through `table`.
    ///
    /// Gene ids, order and coordinates are untouched. Callers are expected to have
    /// checked the table with [`RenameTable::check_injective`] first.
    ///
    pub fn with_renamed_sequences(&self, table: &RenameTable) -> GeneModel {
        let genes = self
            .genes
            .iter()
            .map(|g| {
                let seqname = table.apply(&g.seqname).to_string();
                Gene {
                    id: g.id.clone(),
                    exons: g.exons.iter().map(|e| e.with_seqname(&seqname)).collect(),
                    seqname,
                }
            })
            .collect();

        GeneModel {
            genes,
            index: self.index.clone(),
        }
    }

    ///
    /// Content digest of the model (ids, sequences, exon coordinates, in order).
    ///
    /// Used to version cached per-sample results.
    ///
    pub fn digest(&self) -> String {
        let mut hasher = Md5::new();
        for gene in &self.genes {
            hasher.update(gene.id.as_bytes());
            hasher.update(b"\t");
            hasher.update(gene.seqname.as_bytes());
            for exon in &gene.exons {
                hasher.update(format!("\t{}-{}", exon.start(), exon.end()));
            }
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }
}

///
/// Incremental builder for a [`GeneModel`].
///
/// ```rust
/// use exoncount_core::models::{GeneModelBuilder, GenomicInterval, Strand};
///
/// let mut builder = GeneModelBuilder::new();
/// let exon = GenomicInterval::new("1", 10, 20, Strand::Reverse).unwrap();
/// builder.add_exon("G9", exon).unwrap();
/// assert_eq!(builder.build().unwrap().len(), 1);
/// ```
///
#[derive(Debug, Default)]
pub struct GeneModelBuilder {
    genes: Vec<Gene>,
    index: HashMap<String, usize>,
}

impl GeneModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_exon(&mut self, gene_id: &str, exon: GenomicInterval) -> Result<(), GeneModelError> {
        match self.index.get(gene_id) {
            Some(&i) => {
                let gene = &mut self.genes[i];
                if gene.seqname != exon.seqname() {
                    return Err(GeneModelError::MixedSequences {
                        gene: gene_id.to_string(),
                        first: gene.seqname.clone(),
                        second: exon.seqname().to_string(),
                    });
                }
                gene.exons.push(exon);
            }
            None => {
                self.index.insert(gene_id.to_string(), self.genes.len());
                self.genes.push(Gene {
                    id: gene_id.to_string(),
                    seqname: exon.seqname().to_string(),
                    exons: vec![exon],
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn build(mut self) -> Result<GeneModel, GeneModelError> {
        if self.genes.is_empty() {
            return Err(GeneModelError::EmptyGeneModel);
        }

        for gene in self.genes.iter_mut() {
            gene.exons
                .sort_by_key(|e| (e.start(), e.end(), e.strand()));
            gene.exons
                .dedup_by(|a, b| a.start() == b.start() && a.end() == b.end());
        }

        Ok(GeneModel {
            genes: self.genes,
            index: self.index,
        })
    }
}

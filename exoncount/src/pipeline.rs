//! The run driver.
//!
//! 1. discover alignment files and derive sample ids
//! 2. load the gene model, rename its sequences and load the group table
//! 3. profile intron lengths into cut-points (first barrier)
//! 4. process every sample on a bounded pool (second barrier)
//! 5. check that every sequence reads landed on is annotated
//! 6. aggregate the successful samples
//!
//! Configuration problems surface before any sample is processed. The naming
//! check needs the sequences reads actually used, so it runs after the second
//! barrier but before anything is aggregated or written. Sample failures are
//! collected into the [`RunReport`].
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use exoncount_core::models::GeneModel;
use exoncount_core::utils::discover_files;
use exoncount_io::consts::ALIGNMENT_EXTENSIONS;
use exoncount_io::read_gene_model;
use exoncount_overlaprs::GeneIndex;
use exoncount_qc::{CutPoints, Metric};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::aggregate::{
    AssignmentSummaryRow, CountMatrix, GoodAlignmentRow, StatisticTable, assign_sample_ids,
    assignment_summary, good_alignments,
};
use crate::cache::ResultCache;
use crate::config::PipelineConfig;
use crate::errors::{PipelineError, Result};
use crate::harmonize::{check_sequence_coverage, harmonize};
use crate::report::{RunReport, SampleReport, SampleStatus};
use crate::worker::{
    NoodlesSource, ReadFilter, ReadSource, Sample, SampleResult, WorkerContext, process_sample,
};

/// Everything a successful run produces.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub matrix: CountMatrix,
    pub statistics: Vec<StatisticTable>,
    pub good_alignments: Vec<GoodAlignmentRow>,
    pub assignment: Vec<AssignmentSummaryRow>,
    pub cut_points: Arc<CutPoints>,
    pub report: RunReport,
}

impl RunOutcome {
    pub fn statistic_table(&self, metric: Metric) -> Option<&StatisticTable> {
        self.statistics.iter().find(|t| t.metric == metric)
    }
}

pub struct Pipeline<S: ReadSource> {
    config: PipelineConfig,
    source: S,
    show_progress: bool,
}

impl Pipeline<NoodlesSource> {
    pub fn new(config: PipelineConfig) -> Self {
        let source = NoodlesSource::new(config.secondary_tag.clone());
        Pipeline::with_source(config, source)
    }
}

impl<S: ReadSource> Pipeline<S> {
    pub fn with_source(config: PipelineConfig, source: S) -> Self {
        Pipeline {
            config,
            source,
            show_progress: false,
        }
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Discover inputs and derive sample ids, failing on duplicates.
    pub fn samples(&self) -> Result<Vec<Sample>> {
        let files = discover_files(&self.config.alignments, &ALIGNMENT_EXTENSIONS)?;
        if files.is_empty() {
            return Err(PipelineError::NoSamples(self.config.alignments.clone()));
        }
        assign_sample_ids(&files, &self.config.sample_separator)
    }

    ///
    /// Header sequences the renamed model does not cover. They are allowed as
    /// long as no read aligns to them, which is only known once samples ran.
    ///
    fn uncovered_header_sequences(&self, model: &GeneModel, samples: &[Sample]) -> BTreeSet<String> {
        let model_names = model.sequence_names();
        let ignored = self.config.ignored_sequence_set();
        let mut names = BTreeSet::new();
        for sample in samples {
            match self.source.sequence_names(&sample.path) {
                Ok(found) => names.extend(
                    found
                        .into_iter()
                        .filter(|n| !model_names.contains(n) && !ignored.contains(n)),
                ),
                Err(e) => log::warn!(
                    "Could not read the header of {:?} ({}); the sample will fail later",
                    sample.path,
                    e
                ),
            }
        }
        names
    }

    /// Load the gene model and rename its sequences to the alignment naming.
    pub fn prepare_model(&self, samples: &[Sample]) -> Result<GeneModel> {
        let model = read_gene_model(
            &self.config.gtf,
            &self.config.gtf_feature,
            &self.config.gtf_id_attribute,
        )?;
        if model.is_empty() {
            return Err(PipelineError::EmptyGeneModel);
        }
        log::info!(
            "Loaded {} genes ({} exons) from {:?}",
            model.len(),
            model.n_exons(),
            self.config.gtf
        );

        let table = self.config.rename_table()?;
        let renamed = harmonize(&model, &table)?;

        let uncovered = self.uncovered_header_sequences(&renamed, samples);
        if !uncovered.is_empty() {
            log::info!(
                "{} header sequence(s) are not in the gene model and must carry no reads: {}",
                uncovered.len(),
                uncovered.iter().cloned().collect::<Vec<_>>().join(", ")
            );
        }
        Ok(renamed)
    }

    fn progress_bar(&self, n: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(n as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} samples {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }

    ///
    /// Run the whole pipeline. Nothing is written to disk here except cache
    /// entries; see [`crate::output::write_outputs`].
    ///
    pub fn run(&self) -> Result<RunOutcome> {
        self.config.validate()?;

        let samples = self.samples()?;
        log::info!("Found {} samples in {:?}", samples.len(), self.config.alignments);

        let model = Arc::new(self.prepare_model(&samples)?);
        let groups = self.config.group_table()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.num_threads())
            .build()?;

        // cut-points are fixed before any sample starts
        let cut_points = Arc::new(pool.install(|| {
            CutPoints::from_model(self.config.read_length, &model)
        })?);
        log::info!(
            "Width cut-points: {}",
            cut_points
                .boundaries()
                .iter()
                .map(|b| b.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let index = GeneIndex::from_model(&model)?;

        let cache = match &self.config.cache_dir {
            Some(dir) => match ResultCache::new(
                dir,
                &model.digest(),
                &cut_points.digest(),
                &self.config.counting_fingerprint(),
            ) {
                Ok(cache) => Some(cache),
                Err(e) => {
                    log::warn!("Result cache at {:?} disabled: {}", dir, e);
                    None
                }
            },
            None => None,
        };

        let ctx = WorkerContext {
            index: &index,
            cut_points: &cut_points,
            mode: self.config.count_mode,
            filter: ReadFilter::from_config(&self.config),
            timeout: self.config.timeout_secs.map(Duration::from_secs),
        };

        let pb = self.progress_bar(samples.len());
        let outcomes: Vec<(Result<SampleResult>, bool)> = pool.install(|| {
            samples
                .par_iter()
                .map(|sample| {
                    let outcome = match cache.as_ref().and_then(|c| c.load(sample)) {
                        Some(hit) => {
                            log::debug!("Sample {}: using cached result", sample.id);
                            (Ok(hit), true)
                        }
                        None => {
                            let result = process_sample(sample, &self.source, &ctx);
                            if let (Some(cache), Ok(result)) = (&cache, &result) {
                                cache.store(sample, result);
                            }
                            (result, false)
                        }
                    };
                    pb.inc(1);
                    outcome
                })
                .collect()
        });
        pb.finish_and_clear();

        let mut results = Vec::new();
        let mut report = RunReport {
            genes: model.len(),
            gene_model_digest: model.digest(),
            cut_points: (0..cut_points.n_bins()).map(|b| cut_points.label(b)).collect(),
            samples: Vec::with_capacity(samples.len()),
        };

        for (sample, (outcome, cached)) in samples.iter().zip(outcomes) {
            let status = match outcome {
                Ok(result) => {
                    results.push(result);
                    SampleStatus::Succeeded
                }
                Err(PipelineError::SampleProcessing { reason, .. }) => {
                    SampleStatus::Failed { reason }
                }
                Err(other) => SampleStatus::Failed {
                    reason: other.to_string(),
                },
            };
            report.samples.push(SampleReport {
                sample: sample.id.clone(),
                path: sample.path.clone(),
                status,
                cached,
            });
        }

        report.log_summary();
        if results.is_empty() {
            let failed = report
                .failed()
                .into_iter()
                .map(|(s, r)| (s.to_string(), r.to_string()))
                .collect();
            return Err(PipelineError::AllSamplesFailed { failed });
        }

        let used_sequences: BTreeSet<String> = results
            .iter()
            .flat_map(|r| r.sequences.iter().cloned())
            .collect();
        check_sequence_coverage(&model, &used_sequences, &self.config.ignored_sequence_set())?;

        let matrix = CountMatrix::from_results(&model, &results)?;
        let statistics: Vec<StatisticTable> = Metric::ALL
            .iter()
            .map(|metric| StatisticTable::from_results(*metric, &results, &cut_points))
            .collect();

        let good = statistics
            .iter()
            .find(|t| t.metric == Metric::MappingQuality)
            .map(|t| good_alignments(t, &groups, self.config.min_good_mapq))
            .unwrap_or_default();

        Ok(RunOutcome {
            matrix,
            statistics,
            good_alignments: good,
            assignment: assignment_summary(&results),
            cut_points,
            report,
        })
    }
}

//! The per-sample unit of work: stream one alignment file once, counting reads
//! against the gene index and tabulating their statistics.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use exoncount_core::models::AlignedRead;
use exoncount_io::{AlignmentReader, IoError, parse_tag, sequence_names};
use exoncount_overlaprs::GeneIndex;
use exoncount_qc::{AlignmentStatistics, CutPoints};
use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::counting::{AssignmentTally, CountMode, GeneCounter};
use crate::errors::PipelineError;

// reads between deadline checks
const DEADLINE_CHECK_INTERVAL: u64 = 4096;

pub type ReadStream = Box<dyn Iterator<Item = Result<AlignedRead, IoError>>>;

/// Where reads come from. The pipeline only ever talks to this trait.
pub trait ReadSource: Send + Sync {
    /// Reference sequence names declared by the file, read without streaming records.
    fn sequence_names(&self, path: &Path) -> Result<Vec<String>, IoError>;

    /// Stream the mapped reads of `path`.
    fn open(&self, path: &Path) -> Result<ReadStream, IoError>;
}

/// BAM/SAM files decoded with noodles.
pub struct NoodlesSource {
    secondary_tag: String,
}

impl NoodlesSource {
    pub fn new(secondary_tag: impl Into<String>) -> Self {
        NoodlesSource {
            secondary_tag: secondary_tag.into(),
        }
    }
}

impl ReadSource for NoodlesSource {
    fn sequence_names(&self, path: &Path) -> Result<Vec<String>, IoError> {
        sequence_names(path)
    }

    fn open(&self, path: &Path) -> Result<ReadStream, IoError> {
        let tag = parse_tag(&self.secondary_tag)?;
        Ok(Box::new(AlignmentReader::open(path, tag)?))
    }
}

/// Which mapped reads are excluded from counting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadFilter {
    pub skip_secondary: bool,
    pub skip_supplementary: bool,
    pub skip_duplicates: bool,
    pub max_hits: Option<u32>,
}

impl ReadFilter {
    pub fn from_config(config: &PipelineConfig) -> Self {
        ReadFilter {
            skip_secondary: config.skip_secondary,
            skip_supplementary: config.skip_supplementary,
            skip_duplicates: config.skip_duplicates,
            max_hits: config.max_hits,
        }
    }

    pub fn passes(&self, read: &AlignedRead) -> bool {
        if self.skip_secondary && read.flags.secondary {
            return false;
        }
        if self.skip_supplementary && read.flags.supplementary {
            return false;
        }
        if self.skip_duplicates && read.flags.duplicate {
            return false;
        }
        match (self.max_hits, read.hits) {
            (Some(max), Some(hits)) => hits <= max,
            _ => true,
        }
    }
}

/// One input file and the sample id derived from its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub id: String,
    pub path: PathBuf,
}

/// Read-only state shared by every worker of a run.
pub struct WorkerContext<'a> {
    pub index: &'a GeneIndex,
    pub cut_points: &'a CutPoints,
    pub mode: CountMode,
    pub filter: ReadFilter,
    pub timeout: Option<Duration>,
}

/// Everything one sample contributes to the aggregated outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleResult {
    pub sample: String,
    pub counts: Vec<u64>,
    pub statistics: AlignmentStatistics,
    pub assignment: AssignmentTally,
    /// Sequence names that at least one mapped read was aligned to.
    pub sequences: BTreeSet<String>,
}

///
/// Process one sample.
///
/// Every mapped read feeds the statistics; reads passing the filter are also
/// counted. The sequences reads land on are recorded for the naming check.
/// Reads are dropped as soon as they are observed. Any read error,
/// or running past the timeout, fails the sample with
/// [`PipelineError::SampleProcessing`].
///
pub fn process_sample(
    sample: &Sample,
    source: &dyn ReadSource,
    ctx: &WorkerContext<'_>,
) -> Result<SampleResult, PipelineError> {
    let started = Instant::now();
    let deadline = ctx.timeout.map(|t| started + t);
    let fail = |reason: String| PipelineError::SampleProcessing {
        sample: sample.id.clone(),
        reason,
    };

    let reads = source
        .open(&sample.path)
        .map_err(|e| fail(e.to_string()))?;

    let mut counter = GeneCounter::new(ctx.index, ctx.mode);
    let mut statistics = AlignmentStatistics::new();
    let mut sequences: FxHashSet<Arc<str>> = FxHashSet::default();
    let mut seen: u64 = 0;

    for read in reads {
        if let Some(deadline) = deadline {
            if seen % DEADLINE_CHECK_INTERVAL == 0 && Instant::now() >= deadline {
                return Err(fail(format!(
                    "timed out after {:.1}s ({} reads processed)",
                    started.elapsed().as_secs_f64(),
                    seen
                )));
            }
        }

        let read = read.map_err(|e| fail(e.to_string()))?;
        seen += 1;

        if !sequences.contains(&read.seqname) {
            sequences.insert(Arc::clone(&read.seqname));
        }
        statistics.observe(&read, ctx.cut_points);
        if ctx.filter.passes(&read) {
            counter.observe(&read);
        } else {
            counter.skip();
        }
    }

    let (counts, assignment) = counter.finish();
    log::debug!(
        "Sample {}: {} reads, {} assigned in {:.1}s",
        sample.id,
        assignment.total,
        assignment.assigned,
        started.elapsed().as_secs_f64()
    );

    Ok(SampleResult {
        sample: sample.id.clone(),
        counts,
        statistics,
        assignment,
        sequences: sequences.iter().map(|name| name.to_string()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use exoncount_core::models::{GeneModel, GeneModelBuilder, GenomicInterval, ReadFlags, Strand};
    use exoncount_qc::Metric;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use std::collections::HashMap;

    /// Reads served from memory, keyed by file path.
    struct MemorySource {
        files: HashMap<PathBuf, Vec<Result<AlignedRead, String>>>,
    }

    impl ReadSource for MemorySource {
        fn sequence_names(&self, _path: &Path) -> Result<Vec<String>, IoError> {
            Ok(vec!["Chr1".to_string()])
        }

        fn open(&self, path: &Path) -> Result<ReadStream, IoError> {
            let reads = self
                .files
                .get(path)
                .cloned()
                .ok_or_else(|| IoError::UnsupportedFormat(path.to_path_buf()))?;
            Ok(Box::new(reads.into_iter().enumerate().map(|(i, r)| {
                r.map_err(|message| IoError::Alignment {
                    record: i as u64 + 1,
                    message,
                })
            })))
        }
    }

    #[fixture]
    fn model() -> GeneModel {
        let mut builder = GeneModelBuilder::new();
        let exon = |s, e| GenomicInterval::new("Chr1", s, e, Strand::Forward).unwrap();
        builder.add_exon("G1", exon(100, 200)).unwrap();
        builder.add_exon("G1", exon(300, 400)).unwrap();
        builder.build().unwrap()
    }

    fn sample(name: &str) -> Sample {
        Sample {
            id: name.to_string(),
            path: PathBuf::from(format!("{name}.bam")),
        }
    }

    fn source_with(name: &str, reads: Vec<Result<AlignedRead, String>>) -> MemorySource {
        MemorySource {
            files: HashMap::from([(PathBuf::from(format!("{name}.bam")), reads)]),
        }
    }

    #[rstest]
    fn test_process_sample(model: GeneModel) {
        let index = GeneIndex::from_model(&model).unwrap();
        let cut_points = CutPoints::from_pool(100, &[100]).unwrap();
        let duplicate = ReadFlags {
            duplicate: true,
            ..Default::default()
        };
        let source = source_with(
            "s1",
            vec![
                Ok(AlignedRead::new("Chr1", vec![(150, 180)]).with_mapping_quality(60)),
                Ok(AlignedRead::new("Chr1", vec![(250, 260)]).with_mapping_quality(60)),
                Ok(AlignedRead::new("Chr1", vec![(160, 170)]).with_flags(duplicate)),
                Ok(AlignedRead::new("chrEBV", vec![(10, 60)]).with_flags(duplicate)),
            ],
        );
        let ctx = WorkerContext {
            index: &index,
            cut_points: &cut_points,
            mode: CountMode::Union,
            filter: ReadFilter {
                skip_duplicates: true,
                ..Default::default()
            },
            timeout: None,
        };

        let result = process_sample(&sample("s1"), &source, &ctx).unwrap();
        assert_eq!(result.sample, "s1");
        assert_eq!(result.counts, vec![1]);
        assert_eq!(result.assignment.filtered, 2);
        assert_eq!(result.assignment.no_feature, 1);
        // the filtered read still shows up in the statistics
        assert_eq!(result.statistics.total(Metric::MappingQuality), 4);
        // filtered reads still mark their sequence as used
        assert_eq!(
            result.sequences,
            BTreeSet::from(["Chr1".to_string(), "chrEBV".to_string()])
        );
    }

    #[rstest]
    fn test_malformed_record_fails_sample(model: GeneModel) {
        let index = GeneIndex::from_model(&model).unwrap();
        let cut_points = CutPoints::from_pool(100, &[]).unwrap();
        let source = source_with(
            "bad",
            vec![
                Ok(AlignedRead::new("Chr1", vec![(150, 180)])),
                Err("truncated record".to_string()),
            ],
        );
        let ctx = WorkerContext {
            index: &index,
            cut_points: &cut_points,
            mode: CountMode::Union,
            filter: ReadFilter::default(),
            timeout: None,
        };

        let err = process_sample(&sample("bad"), &source, &ctx).unwrap_err();
        match err {
            PipelineError::SampleProcessing { sample, reason } => {
                assert_eq!(sample, "bad");
                assert!(reason.contains("truncated record"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[rstest]
    fn test_timeout_fails_sample(model: GeneModel) {
        let index = GeneIndex::from_model(&model).unwrap();
        let cut_points = CutPoints::from_pool(100, &[]).unwrap();
        let source = source_with("slow", vec![Ok(AlignedRead::new("Chr1", vec![(150, 180)]))]);
        let ctx = WorkerContext {
            index: &index,
            cut_points: &cut_points,
            mode: CountMode::Union,
            filter: ReadFilter::default(),
            timeout: Some(Duration::ZERO),
        };

        let err = process_sample(&sample("slow"), &source, &ctx).unwrap_err();
        assert!(matches!(err, PipelineError::SampleProcessing { .. }));
        assert!(err.to_string().contains("timed out"));
    }

    #[rstest]
    #[case(ReadFilter { max_hits: Some(1), ..Default::default() }, Some(2), false)]
    #[case(ReadFilter { max_hits: Some(1), ..Default::default() }, Some(1), true)]
    #[case(ReadFilter { max_hits: Some(1), ..Default::default() }, None, true)]
    #[case(ReadFilter::default(), Some(20), true)]
    fn test_max_hits(#[case] filter: ReadFilter, #[case] hits: Option<u32>, #[case] expected: bool) {
        let read = AlignedRead::new("Chr1", vec![(0, 10)]).with_hits(hits);
        assert_eq!(filter.passes(&read), expected);
    }
}

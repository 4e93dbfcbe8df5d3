use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use exoncount::output::{COUNTS_FILE, REPORT_FILE, write_outputs};
use exoncount::worker::ReadStream;
use exoncount::{
    NoodlesSource, Pipeline, PipelineConfig, PipelineError, ReadSource, RunReport, SampleStatus,
};
use exoncount_io::IoError;
use exoncount_qc::Metric;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use tempfile::{TempDir, tempdir};

const GTF: &str = "\
1\ttest\texon\t101\t200\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
1\ttest\texon\t301\t400\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
1\ttest\texon\t1001\t1500\t.\t-\t.\tgene_id \"G2\"; transcript_id \"T2\";
";

const SAM_HEADER: &str = "@HD\tVN:1.6\n@SQ\tSN:Chr1\tLN:100000\n";
const SAM_HEADER_WITH_UNPLACED: &str =
    "@HD\tVN:1.6\n@SQ\tSN:Chr1\tLN:100000\n@SQ\tSN:ChrUn\tLN:5000\n";

fn sam_record(name: &str, pos: u32, mapq: u8, cigar: &str, score: i32) -> String {
    format!("{name}\t0\tChr1\t{pos}\t{mapq}\t{cigar}\t*\t0\t0\t*\t*\tAS:i:{score}\n")
}

fn write_sam(dir: &Path, file: &str, records: &[String]) {
    let mut text = SAM_HEADER.to_string();
    for r in records {
        text.push_str(r);
    }
    fs::write(dir.join(file), text).unwrap();
}

/// Production reader that remembers how many files were opened for streaming.
struct CountingSource {
    inner: NoodlesSource,
    opens: AtomicUsize,
}

impl ReadSource for CountingSource {
    fn sequence_names(&self, path: &Path) -> Result<Vec<String>, IoError> {
        self.inner.sequence_names(path)
    }

    fn open(&self, path: &Path) -> Result<ReadStream, IoError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.inner.open(path)
    }
}

struct Fixture {
    _root: TempDir,
    config: PipelineConfig,
}

#[fixture]
fn fixture() -> Fixture {
    let root = tempdir().unwrap();
    let bam_dir = root.path().join("alignments");
    fs::create_dir_all(&bam_dir).unwrap();

    write_sam(
        &bam_dir,
        "ctrl1_S1.sam",
        &[
            // inside the first exon of G1
            sam_record("r1", 151, 60, "30M", -2),
            // inside the G1 intron
            sam_record("r2", 251, 10, "10M", -8),
            // G2
            sam_record("r3", 1101, 60, "20M", 0),
            // spliced across both G1 exons
            sam_record("r4", 191, 60, "10M100N10M", 0),
        ],
    );
    write_sam(
        &bam_dir,
        "trt1_S2.sam",
        &[sam_record("r1", 151, 40, "30M", -1)],
    );
    fs::write(bam_dir.join("bad_S3.bam"), b"definitely not bgzf").unwrap();

    let gtf = root.path().join("genes.gtf");
    fs::write(&gtf, GTF).unwrap();

    let mut config = PipelineConfig::new(bam_dir, gtf);
    config.rename.insert("1".to_string(), "Chr1".to_string());
    config.threads = Some(2);
    config.output = root.path().join("out");

    Fixture {
        _root: root,
        config,
    }
}

#[rstest]
fn test_partial_failure_keeps_good_samples(fixture: Fixture) {
    let outcome = Pipeline::new(fixture.config.clone()).run().unwrap();

    assert_eq!(outcome.matrix.samples(), &["ctrl1".to_string(), "trt1".to_string()]);
    assert_eq!(outcome.matrix.genes(), &["G1".to_string(), "G2".to_string()]);
    assert_eq!(outcome.matrix.column("ctrl1"), Some(&[2u64, 1][..]));
    assert_eq!(outcome.matrix.column("trt1"), Some(&[1u64, 0][..]));

    let report = &outcome.report;
    assert_eq!(report.samples.len(), 3);
    assert_eq!(report.succeeded(), vec!["ctrl1", "trt1"]);
    let failed = report.failed();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, "bad");
    assert!(report.is_partial());
}

#[rstest]
fn test_histogram_mass_matches_reads(fixture: Fixture) {
    let outcome = Pipeline::new(fixture.config.clone()).run().unwrap();

    let mapq = outcome.statistic_table(Metric::MappingQuality).unwrap();
    assert_eq!(mapq.total_for("ctrl1"), 4);
    assert_eq!(mapq.total_for("trt1"), 1);

    let gaps = outcome.statistic_table(Metric::GapCount).unwrap();
    let ctrl_gaps: Vec<(String, u64)> = gaps
        .rows
        .iter()
        .filter(|r| r.sample == "ctrl1")
        .map(|r| (r.value.clone(), r.frequency))
        .collect();
    assert_eq!(ctrl_gaps, vec![("0".to_string(), 3), ("1".to_string(), 1)]);

    let widths = outcome.statistic_table(Metric::WidthBin).unwrap();
    assert_eq!(widths.total_for("ctrl1"), 4);

    let secondary = outcome.statistic_table(Metric::SecondaryQuality).unwrap();
    assert_eq!(secondary.total_for("ctrl1"), 4);

    // cut-points: 0, the read length, the single 100bp intron, infinity
    assert_eq!(
        outcome.cut_points.boundaries(),
        &[0.0, 100.0, f64::INFINITY]
    );
}

#[rstest]
fn test_good_alignments_use_group_labels(fixture: Fixture) {
    let mut config = fixture.config.clone();
    let groups = config.output.with_file_name("groups.tsv");
    fs::write(&groups, "ctrl1\tcontrol\n").unwrap();
    config.groups = Some(groups);

    let outcome = Pipeline::new(config).run().unwrap();
    let rows: Vec<(&str, &str, u64, &str)> = outcome
        .good_alignments
        .iter()
        .map(|r| (r.sample.as_str(), r.value.as_str(), r.frequency, r.group.as_str()))
        .collect();
    assert_eq!(
        rows,
        vec![("ctrl1", "60", 3, "control"), ("trt1", "40", 1, "NA")]
    );
}

#[rstest]
fn test_missing_rename_is_fatal(fixture: Fixture) {
    let mut config = fixture.config.clone();
    config.rename.clear();

    match Pipeline::new(config.clone()).run() {
        Err(PipelineError::NamingMismatch { missing }) => {
            assert_eq!(missing, vec!["Chr1".to_string()])
        }
        other => panic!("unexpected: {:?}", other.map(|o| o.report)),
    }
    assert!(!config.output.exists());
}

#[rstest]
fn test_header_only_sequence_is_allowed(fixture: Fixture) {
    let dir = fixture.config.alignments.clone();
    let mut text = SAM_HEADER_WITH_UNPLACED.to_string();
    text.push_str(&sam_record("r1", 151, 60, "30M", 0));
    fs::write(dir.join("trt1_S2.sam"), &text).unwrap();

    let outcome = Pipeline::new(fixture.config.clone()).run().unwrap();
    assert_eq!(outcome.matrix.column("trt1").unwrap(), &[1, 0]);
}

#[rstest]
fn test_reads_on_unannotated_sequence_are_fatal(fixture: Fixture) {
    let dir = fixture.config.alignments.clone();
    let mut text = SAM_HEADER_WITH_UNPLACED.to_string();
    text.push_str(&sam_record("r1", 151, 60, "30M", 0));
    text.push_str("r2\t0\tChrUn\t11\t60\t20M\t*\t0\t0\t*\t*\tAS:i:0\n");
    fs::write(dir.join("trt1_S2.sam"), &text).unwrap();

    match Pipeline::new(fixture.config.clone()).run() {
        Err(PipelineError::NamingMismatch { missing }) => {
            assert_eq!(missing, vec!["ChrUn".to_string()])
        }
        other => panic!("unexpected: {:?}", other.map(|o| o.report)),
    }

    let mut config = fixture.config.clone();
    config.ignored_sequences.push("ChrUn".to_string());
    assert!(Pipeline::new(config).run().is_ok());
}

#[rstest]
fn test_bad_group_table_fails_before_samples(fixture: Fixture) {
    let mut config = fixture.config.clone();
    let groups = config.output.with_file_name("groups.tsv");
    fs::write(&groups, "a\tcontrol\nb\n").unwrap();
    config.groups = Some(groups);

    let pipeline = Pipeline::with_source(
        config,
        CountingSource {
            inner: NoodlesSource::new("AS"),
            opens: AtomicUsize::new(0),
        },
    );
    let err = pipeline.run().unwrap_err();
    assert!(matches!(err, PipelineError::Input(IoError::Table { .. })));
    assert_eq!(pipeline_opens(&pipeline), 0);
}

fn pipeline_opens(pipeline: &Pipeline<CountingSource>) -> usize {
    pipeline.source().opens.load(Ordering::SeqCst)
}

#[rstest]
fn test_duplicate_sample_ids_are_fatal(fixture: Fixture) {
    let dir = fixture.config.alignments.clone();
    fs::copy(dir.join("trt1_S2.sam"), dir.join("trt1_S9.sam")).unwrap();

    assert!(matches!(
        Pipeline::new(fixture.config.clone()).run(),
        Err(PipelineError::DuplicateSampleIdentity { .. })
    ));
}

#[rstest]
fn test_empty_gene_model_is_fatal(fixture: Fixture) {
    fs::write(&fixture.config.gtf, "# no exons\n").unwrap();
    assert!(matches!(
        Pipeline::new(fixture.config.clone()).run(),
        Err(PipelineError::EmptyGeneModel)
    ));
}

#[rstest]
fn test_all_samples_failing_is_an_error(fixture: Fixture) {
    let dir = fixture.config.alignments.clone();
    fs::remove_file(dir.join("ctrl1_S1.sam")).unwrap();
    fs::remove_file(dir.join("trt1_S2.sam")).unwrap();

    match Pipeline::new(fixture.config.clone()).run() {
        Err(PipelineError::AllSamplesFailed { failed }) => {
            assert_eq!(failed.len(), 1);
            assert_eq!(failed[0].0, "bad");
        }
        other => panic!("unexpected: {:?}", other.map(|o| o.report)),
    }
}

#[rstest]
fn test_no_inputs(fixture: Fixture) {
    let mut config = fixture.config.clone();
    let empty = config.output.with_file_name("empty");
    fs::create_dir_all(&empty).unwrap();
    config.alignments = empty;
    assert!(matches!(
        Pipeline::new(config).run(),
        Err(PipelineError::NoSamples(_))
    ));
}

#[rstest]
fn test_outputs_written(fixture: Fixture) {
    let outcome = Pipeline::new(fixture.config.clone()).run().unwrap();
    let written = write_outputs(&outcome, &fixture.config.output).unwrap();

    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    for expected in [
        "counts.tsv",
        "stats_gap_count.tsv",
        "stats_mapping_quality.tsv",
        "stats_width_bin.tsv",
        "stats_secondary_quality.tsv",
        "good_alignments.tsv",
        "assignment_summary.tsv",
        "cut_points.tsv",
        "report.json",
    ] {
        assert!(names.contains(&expected.to_string()), "missing {expected}");
    }

    let counts = fs::read_to_string(fixture.config.output.join(COUNTS_FILE)).unwrap();
    assert_eq!(counts, "gene_id\tctrl1\ttrt1\nG1\t2\t1\nG2\t1\t0\n");

    let report: RunReport =
        serde_json::from_str(&fs::read_to_string(fixture.config.output.join(REPORT_FILE)).unwrap())
            .unwrap();
    assert!(matches!(
        report.samples[0].status,
        SampleStatus::Failed { .. }
    ));
}

#[rstest]
fn test_cache_reuses_results(fixture: Fixture) {
    let mut config = fixture.config.clone();
    let cache_dir: PathBuf = config.output.with_file_name("cache");
    config.cache_dir = Some(cache_dir.clone());

    let first = Pipeline::new(config.clone()).run().unwrap();
    assert!(first.report.samples.iter().all(|s| !s.cached));
    assert!(fs::read_dir(&cache_dir).unwrap().count() >= 2);

    let second = Pipeline::new(config).run().unwrap();
    let cached: Vec<bool> = second.report.samples.iter().map(|s| s.cached).collect();
    assert_eq!(cached, vec![false, true, true]);
    assert_eq!(first.matrix, second.matrix);
}

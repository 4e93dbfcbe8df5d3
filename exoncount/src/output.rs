//! Tab-separated outputs. Nothing is quoted; every file has a header row.
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use exoncount_qc::CutPoints;

use crate::aggregate::{AssignmentSummaryRow, CountMatrix, GoodAlignmentRow, StatisticTable};
use crate::pipeline::RunOutcome;
use crate::report::RunReport;

pub const COUNTS_FILE: &str = "counts.tsv";
pub const GOOD_ALIGNMENTS_FILE: &str = "good_alignments.tsv";
pub const ASSIGNMENT_SUMMARY_FILE: &str = "assignment_summary.tsv";
pub const CUT_POINTS_FILE: &str = "cut_points.tsv";
pub const REPORT_FILE: &str = "report.json";

pub fn statistic_file_name(table: &StatisticTable) -> String {
    format!("stats_{}.tsv", table.metric)
}

pub fn write_count_matrix<W: Write>(matrix: &CountMatrix, mut out: W) -> std::io::Result<()> {
    write!(out, "gene_id")?;
    for sample in matrix.samples() {
        write!(out, "\t{}", sample)?;
    }
    writeln!(out)?;

    for (g, gene) in matrix.genes().iter().enumerate() {
        write!(out, "{}", gene)?;
        for count in matrix.row(g) {
            write!(out, "\t{}", count)?;
        }
        writeln!(out)?;
    }
    out.flush()
}

pub fn write_statistic_table<W: Write>(table: &StatisticTable, mut out: W) -> std::io::Result<()> {
    writeln!(out, "value\tfrequency\tsample\tmetric")?;
    for row in &table.rows {
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            row.value, row.frequency, row.sample, row.metric
        )?;
    }
    out.flush()
}

pub fn write_good_alignments<W: Write>(rows: &[GoodAlignmentRow], mut out: W) -> std::io::Result<()> {
    writeln!(out, "value\tfrequency\tsample\tmetric\tgroup")?;
    for row in rows {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            row.value, row.frequency, row.sample, row.metric, row.group
        )?;
    }
    out.flush()
}

pub fn write_assignment_summary<W: Write>(
    rows: &[AssignmentSummaryRow],
    mut out: W,
) -> std::io::Result<()> {
    writeln!(out, "sample\ttotal\tfiltered\tassigned\tambiguous\tno_feature")?;
    for row in rows {
        let t = &row.tally;
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}",
            row.sample, t.total, t.filtered, t.assigned, t.ambiguous, t.no_feature
        )?;
    }
    out.flush()
}

pub fn write_cut_points<W: Write>(cut_points: &CutPoints, mut out: W) -> std::io::Result<()> {
    writeln!(out, "bin\tlower\tupper\tlabel")?;
    let b = cut_points.boundaries();
    for bin in 0..cut_points.n_bins() {
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            bin,
            b[bin],
            if b[bin + 1].is_infinite() {
                "Inf".to_string()
            } else {
                b[bin + 1].to_string()
            },
            cut_points.label(bin)
        )?;
    }
    out.flush()
}

pub fn write_report(report: &RunReport, path: &Path) -> std::io::Result<()> {
    let json = report.to_json().map_err(std::io::Error::other)?;
    fs::write(path, json)
}

fn create(path: &Path) -> std::io::Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}

///
/// Write every output of a run into `dir`, creating it if needed. Returns the
/// paths written.
///
pub fn write_outputs(outcome: &RunOutcome, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let path = dir.join(COUNTS_FILE);
    write_count_matrix(&outcome.matrix, create(&path)?)?;
    written.push(path);

    for table in &outcome.statistics {
        let path = dir.join(statistic_file_name(table));
        write_statistic_table(table, create(&path)?)?;
        written.push(path);
    }

    let path = dir.join(GOOD_ALIGNMENTS_FILE);
    write_good_alignments(&outcome.good_alignments, create(&path)?)?;
    written.push(path);

    let path = dir.join(ASSIGNMENT_SUMMARY_FILE);
    write_assignment_summary(&outcome.assignment, create(&path)?)?;
    written.push(path);

    let path = dir.join(CUT_POINTS_FILE);
    write_cut_points(&outcome.cut_points, create(&path)?)?;
    written.push(path);

    let path = dir.join(REPORT_FILE);
    write_report(&outcome.report, &path)?;
    written.push(path);

    Ok(written)
}

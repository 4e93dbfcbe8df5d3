use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use exoncount_core::models::{GeneModel, GeneModelBuilder, GenomicInterval, Strand};
use flate2::read::MultiGzDecoder;

use crate::error::{IoError, Result};

///
/// Build a [`GeneModel`] from the `feature` records of a GTF file (optionally
/// gzipped), grouping them by the value of `id_attribute`.
///
/// GTF is 1-based inclusive; intervals are converted to 0-based half-open.
/// Genes keep the order in which they first appear in the file. Records of other
/// feature types, comment lines and lines with fewer than nine columns are
/// skipped, as are `feature` records lacking `id_attribute`.
///
/// # Arguments
///
/// - path: path to a `.gtf` or `.gtf.gz` file
/// - feature: feature type to collect, usually `exon`
/// - id_attribute: attribute naming the parent gene, usually `gene_id`
///
pub fn read_gene_model(path: &Path, feature: &str, id_attribute: &str) -> Result<GeneModel> {
    let file = File::open(path)?;
    let reader: Box<dyn BufRead> = if path.extension().is_some_and(|ext| ext == "gz") {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let mut builder = GeneModelBuilder::new();
    let mut missing_id = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 9 || fields[2] != feature {
            continue;
        }

        let Some(gene_id) = attribute_value(fields[8], id_attribute) else {
            missing_id += 1;
            continue;
        };

        let start = fields[3]
            .parse::<u32>()
            .map_err(|e| IoError::Gtf {
                line: line_no,
                message: format!("start {:?}: {}", fields[3], e),
            })?
            .saturating_sub(1);
        let end = fields[4].parse::<u32>().map_err(|e| IoError::Gtf {
            line: line_no,
            message: format!("end {:?}: {}", fields[4], e),
        })?;
        let strand = Strand::from_char(fields[6].chars().next().unwrap_or('.'));

        let exon = GenomicInterval::new(fields[0], start, end, strand)?;
        builder.add_exon(gene_id, exon)?;
    }

    if missing_id > 0 {
        log::warn!(
            "Skipped {} {} records without a {} attribute in {:?}",
            missing_id,
            feature,
            id_attribute,
            path
        );
    }

    Ok(builder.build()?)
}

// GTF attributes look like: gene_id "G1"; transcript_id "T1";
fn attribute_value<'a>(attributes: &'a str, key: &str) -> Option<&'a str> {
    attributes.split(';').find_map(|attr| {
        let (k, v) = attr.trim().split_once(' ')?;
        if k != key {
            return None;
        }
        let v = v.trim().trim_matches('"');
        (!v.is_empty()).then_some(v)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use exoncount_core::GeneModelError;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::tempdir;

    const GTF: &str = "\
#!genome-build test
1\ttest\tgene\t101\t400\t.\t+\t.\tgene_id \"G1\";
1\ttest\texon\t101\t200\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
1\ttest\texon\t301\t400\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
2\ttest\texon\t11\t50\t.\t-\t.\tgene_id \"G2\"; transcript_id \"T2\";
1\ttest\texon\t301\t400\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T3\";
1\ttest\texon\t501\t600\t.\t+\t.\ttranscript_id \"orphan\";
";

    #[rstest]
    fn test_read_gene_model() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("genes.gtf");
        std::fs::write(&path, GTF).unwrap();

        let model = read_gene_model(&path, "exon", "gene_id").unwrap();
        assert_eq!(model.gene_ids().collect::<Vec<_>>(), vec!["G1", "G2"]);

        let g1 = model.gene("G1").unwrap();
        let exons: Vec<(u32, u32)> = g1.exons().iter().map(|e| (e.start(), e.end())).collect();
        assert_eq!(exons, vec![(100, 200), (300, 400)]);
        assert_eq!(g1.seqname(), "1");

        let g2 = model.gene("G2").unwrap();
        assert_eq!(g2.exons()[0].strand(), Strand::Reverse);
        assert_eq!(g2.span(), (10, 50));
    }

    #[rstest]
    fn test_read_gzipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("genes.gtf.gz");
        let mut enc = flate2::write::GzEncoder::new(
            File::create(&path).unwrap(),
            flate2::Compression::default(),
        );
        enc.write_all(GTF.as_bytes()).unwrap();
        enc.finish().unwrap();

        let model = read_gene_model(&path, "exon", "gene_id").unwrap();
        assert_eq!(model.len(), 2);
    }

    #[rstest]
    fn test_bad_coordinate_reports_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.gtf");
        std::fs::write(&path, "1\tt\texon\tabc\t200\t.\t+\t.\tgene_id \"G1\";\n").unwrap();
        assert!(matches!(
            read_gene_model(&path, "exon", "gene_id"),
            Err(IoError::Gtf { line: 1, .. })
        ));
    }

    #[rstest]
    fn test_no_exons_is_empty_model() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.gtf");
        std::fs::write(&path, "#nothing here\n").unwrap();
        assert!(matches!(
            read_gene_model(&path, "exon", "gene_id"),
            Err(IoError::GeneModel(GeneModelError::EmptyGeneModel))
        ));
    }

    #[rstest]
    #[case("gene_id \"G1\"; transcript_id \"T1\";", "transcript_id", Some("T1"))]
    #[case("gene_id \"G1\";", "gene_name", None)]
    #[case("gene_id \"\";", "gene_id", None)]
    fn test_attribute_value(#[case] attrs: &str, #[case] key: &str, #[case] expected: Option<&str>) {
        assert_eq!(attribute_value(attrs, key), expected);
    }
}

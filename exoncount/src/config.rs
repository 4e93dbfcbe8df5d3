use std::collections::{BTreeMap, BTreeSet};
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use exoncount_core::models::RenameTable;
use exoncount_io::consts::{DEFAULT_SECONDARY_TAG, GTF_EXON_FEATURE, GTF_GENE_ID_ATTRIBUTE};
use exoncount_io::{parse_tag, read_group_table, read_rename_table};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::counting::CountMode;
use crate::errors::PipelineError;

pub const DEFAULT_READ_LENGTH: u32 = 100;
pub const DEFAULT_SAMPLE_SEPARATOR: &str = "_";
pub const DEFAULT_OUTPUT_DIR: &str = "exoncount_out";
pub const DEFAULT_MIN_GOOD_MAPQ: u8 = 30;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

///
/// Everything a run needs to know. Loadable from TOML; every field except
/// `alignments` and `gtf` has a default.
///
/// ```toml
/// alignments = "data/bam"
/// gtf = "data/genes.gtf.gz"
/// read_length = 76
/// count_mode = "union"
///
/// [rename]
/// "1" = "Chr1"
/// ```
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Directory holding one `.bam`/`.sam` file per sample.
    pub alignments: PathBuf,
    /// Gene annotation (GTF, optionally gzipped).
    pub gtf: PathBuf,
    #[serde(default = "default_gtf_feature")]
    pub gtf_feature: String,
    #[serde(default = "default_gtf_id_attribute")]
    pub gtf_id_attribute: String,

    /// Inline old→new sequence renames applied to the gene model.
    #[serde(default)]
    pub rename: BTreeMap<String, String>,
    /// Same, as a two-column TSV. Merged with `rename`.
    #[serde(default)]
    pub rename_table: Option<PathBuf>,
    /// Alignment sequence names that need no gene model counterpart.
    #[serde(default)]
    pub ignored_sequences: Vec<String>,

    /// Two-column TSV mapping sample id to treatment group.
    #[serde(default)]
    pub groups: Option<PathBuf>,

    #[serde(default = "default_read_length")]
    pub read_length: u32,
    #[serde(default = "default_sample_separator")]
    pub sample_separator: String,
    #[serde(default = "default_secondary_tag")]
    pub secondary_tag: String,
    #[serde(default)]
    pub count_mode: CountMode,

    #[serde(default)]
    pub skip_secondary: bool,
    #[serde(default)]
    pub skip_supplementary: bool,
    #[serde(default)]
    pub skip_duplicates: bool,
    /// Drop reads whose NH tag exceeds this.
    #[serde(default)]
    pub max_hits: Option<u32>,
    #[serde(default = "default_min_good_mapq")]
    pub min_good_mapq: u8,

    /// Worker threads; all available cores when unset.
    #[serde(default)]
    pub threads: Option<usize>,
    /// Per-sample time limit in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_gtf_feature() -> String {
    GTF_EXON_FEATURE.to_string()
}

fn default_gtf_id_attribute() -> String {
    GTF_GENE_ID_ATTRIBUTE.to_string()
}

fn default_read_length() -> u32 {
    DEFAULT_READ_LENGTH
}

fn default_sample_separator() -> String {
    DEFAULT_SAMPLE_SEPARATOR.to_string()
}

fn default_secondary_tag() -> String {
    DEFAULT_SECONDARY_TAG.to_string()
}

fn default_min_good_mapq() -> u8 {
    DEFAULT_MIN_GOOD_MAPQ
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

impl TryFrom<&Path> for PipelineConfig {
    type Error = ConfigError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let toml_str = read_to_string(path)?;
        let config: PipelineConfig = toml::from_str(&toml_str)?;
        Ok(config)
    }
}

impl PipelineConfig {
    /// A configuration with every optional field at its default.
    pub fn new(alignments: impl Into<PathBuf>, gtf: impl Into<PathBuf>) -> Self {
        PipelineConfig {
            alignments: alignments.into(),
            gtf: gtf.into(),
            gtf_feature: default_gtf_feature(),
            gtf_id_attribute: default_gtf_id_attribute(),
            rename: BTreeMap::new(),
            rename_table: None,
            ignored_sequences: Vec::new(),
            groups: None,
            read_length: DEFAULT_READ_LENGTH,
            sample_separator: default_sample_separator(),
            secondary_tag: default_secondary_tag(),
            count_mode: CountMode::default(),
            skip_secondary: false,
            skip_supplementary: false,
            skip_duplicates: false,
            max_hits: None,
            min_good_mapq: DEFAULT_MIN_GOOD_MAPQ,
            threads: None,
            timeout_secs: None,
            cache_dir: None,
            output: default_output(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.read_length == 0 {
            return Err(ConfigError::Invalid(
                "read_length must be positive".to_string(),
            ));
        }
        if self.sample_separator.is_empty() {
            return Err(ConfigError::Invalid(
                "sample_separator must not be empty".to_string(),
            ));
        }
        if parse_tag(&self.secondary_tag).is_err() {
            return Err(ConfigError::Invalid(format!(
                "secondary_tag must be two characters, got {:?}",
                self.secondary_tag
            )));
        }
        if self.threads == Some(0) {
            return Err(ConfigError::Invalid("threads must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Configured thread count, or the number of logical cores.
    pub fn num_threads(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get).max(1)
    }

    /// The rename table from `rename_table` (if any) merged with inline `rename`
    /// entries. An old name given two different targets is an error.
    pub fn rename_table(&self) -> Result<RenameTable, PipelineError> {
        let mut pairs: Vec<(String, String)> = match &self.rename_table {
            Some(path) => read_rename_table(path)?
                .iter()
                .map(|(old, new)| (old.to_string(), new.to_string()))
                .collect(),
            None => Vec::new(),
        };
        pairs.extend(self.rename.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(RenameTable::from_pairs(pairs)?)
    }

    /// Sample id to group label; empty when no group table is configured.
    pub fn group_table(&self) -> Result<BTreeMap<String, String>, PipelineError> {
        match &self.groups {
            Some(path) => Ok(read_group_table(path)?),
            None => Ok(BTreeMap::new()),
        }
    }

    pub fn ignored_sequence_set(&self) -> BTreeSet<String> {
        self.ignored_sequences.iter().cloned().collect()
    }

    ///
    /// Settings that change a sample's result for the same input file, used as
    /// part of the cache key.
    ///
    pub fn counting_fingerprint(&self) -> String {
        format!(
            "mode={};tag={};secondary={};supplementary={};duplicates={};max_hits={:?}",
            self.count_mode,
            self.secondary_tag,
            self.skip_secondary,
            self.skip_supplementary,
            self.skip_duplicates,
            self.max_hits
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::tempdir;

    #[rstest]
    fn test_try_from_toml_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exoncount.toml");
        std::fs::write(
            &path,
            r#"
alignments = "bam"
gtf = "genes.gtf"
read_length = 76
count_mode = "unique"
ignored_sequences = ["chrEBV"]

[rename]
"1" = "Chr1"
"#,
        )
        .unwrap();

        let config = PipelineConfig::try_from(path.as_path()).unwrap();
        assert_eq!(config.read_length, 76);
        assert_eq!(config.count_mode, CountMode::Unique);
        assert_eq!(config.sample_separator, "_");
        assert_eq!(config.secondary_tag, "AS");
        assert_eq!(config.min_good_mapq, 30);
        assert_eq!(config.output, PathBuf::from("exoncount_out"));
        assert_eq!(config.rename_table().unwrap().apply("1"), "Chr1");
        assert!(config.ignored_sequence_set().contains("chrEBV"));
        config.validate().unwrap();
    }

    #[rstest]
    fn test_missing_required_field() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "gtf = \"genes.gtf\"\n").unwrap();
        assert!(matches!(
            PipelineConfig::try_from(path.as_path()),
            Err(ConfigError::Toml(_))
        ));
    }

    #[rstest]
    #[case(|c: &mut PipelineConfig| c.read_length = 0)]
    #[case(|c: &mut PipelineConfig| c.secondary_tag = "ASX".to_string())]
    #[case(|c: &mut PipelineConfig| c.sample_separator = String::new())]
    #[case(|c: &mut PipelineConfig| c.threads = Some(0))]
    fn test_validate_rejects(#[case] tweak: fn(&mut PipelineConfig)) {
        let mut config = PipelineConfig::new("bam", "genes.gtf");
        tweak(&mut config);
        assert!(config.validate().is_err());
    }

    #[rstest]
    fn test_rename_sources_merge() {
        let dir = tempdir().unwrap();
        let tsv = dir.path().join("rename.tsv");
        std::fs::write(&tsv, "2\tChr2\n").unwrap();

        let mut config = PipelineConfig::new("bam", "genes.gtf");
        config.rename_table = Some(tsv);
        config.rename.insert("1".to_string(), "Chr1".to_string());
        let table = config.rename_table().unwrap();
        assert_eq!(table.len(), 2);

        config.rename.insert("2".to_string(), "chr2".to_string());
        assert!(config.rename_table().is_err());
    }

    #[rstest]
    fn test_fingerprint_tracks_mode() {
        let mut config = PipelineConfig::new("bam", "genes.gtf");
        let before = config.counting_fingerprint();
        config.count_mode = CountMode::Unique;
        assert_ne!(before, config.counting_fingerprint());
    }
}

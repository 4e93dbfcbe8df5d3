pub const BAM_EXTENSION: &str = "bam";
pub const SAM_EXTENSION: &str = "sam";
pub const ALIGNMENT_EXTENSIONS: [&str; 2] = [BAM_EXTENSION, SAM_EXTENSION];

pub const DEFAULT_SECONDARY_TAG: &str = "AS";
pub const HIT_COUNT_TAG: &str = "NH";

pub const GTF_EXON_FEATURE: &str = "exon";
pub const GTF_GENE_ID_ATTRIBUTE: &str = "gene_id";

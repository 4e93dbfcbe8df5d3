use clap::{ArgAction, Command, arg, value_parser};

pub const COUNT_CMD: &str = "count";

pub fn create_count_cli() -> Command {
    Command::new(COUNT_CMD)
        .author("Databio")
        .about("Count reads over the exons of every gene for each sample, and tabulate alignment QC metrics.")
        .arg(arg!(-c --config <config> "TOML configuration file; flags below override its values"))
        .arg(arg!(-a --alignments <alignments> "Directory with one .bam/.sam file per sample"))
        .arg(arg!(-g --gtf <gtf> "Gene annotation in GTF format (may be gzipped)"))
        .arg(arg!(-o --output <output> "Output directory [default: exoncount_out]"))
        .arg(arg!(-r --rename <rename> "Two-column TSV renaming annotation sequences to alignment sequence names"))
        .arg(arg!(--groups <groups> "Two-column TSV mapping sample ids to treatment groups"))
        .arg(arg!(-l --"read-length" <read_length> "Read length used as a width cut-point [default: 100]").value_parser(value_parser!(u32)))
        .arg(arg!(-p --threads <threads> "Number of worker threads [default: all cores]").value_parser(value_parser!(usize)))
        .arg(arg!(--separator <separator> "Sample ids are the file name up to this separator [default: _]"))
        .arg(arg!(--"secondary-tag" <tag> "Integer SAM tag tabulated as secondary quality [default: AS]"))
        .arg(arg!(-m --mode <mode> "How reads overlapping several genes count: union or unique [default: union]"))
        .arg(arg!(--"skip-secondary" "Do not count secondary alignments").action(ArgAction::SetTrue))
        .arg(arg!(--"skip-supplementary" "Do not count supplementary alignments").action(ArgAction::SetTrue))
        .arg(arg!(--"skip-duplicates" "Do not count reads flagged as duplicates").action(ArgAction::SetTrue))
        .arg(arg!(--"max-hits" <max_hits> "Do not count reads whose NH tag exceeds this").value_parser(value_parser!(u32)))
        .arg(arg!(--"min-mapq" <min_mapq> "Mapping quality threshold for good alignments [default: 30]").value_parser(value_parser!(u8)))
        .arg(arg!(--timeout <seconds> "Fail a sample that takes longer than this").value_parser(value_parser!(u64)))
        .arg(arg!(--"cache-dir" <cache_dir> "Reuse per-sample results stored here"))
        .arg(arg!(--ignore <sequence> "Alignment sequence allowed to be missing from the annotation (repeatable)").action(ArgAction::Append))
}

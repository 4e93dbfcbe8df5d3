use clap::{Command, arg, value_parser};

pub const CUTPOINTS_CMD: &str = "cutpoints";

pub fn create_cutpoints_cli() -> Command {
    Command::new(CUTPOINTS_CMD)
        .author("Databio")
        .about("Print the alignment-width cut-points derived from the intron lengths of an annotation.")
        .arg(arg!(-g --gtf <gtf> "Gene annotation in GTF format (may be gzipped)").required(true))
        .arg(
            arg!(-l --"read-length" <read_length> "Read length used as a width cut-point")
                .value_parser(value_parser!(u32))
                .default_value("100"),
        )
        .arg(arg!(-p --threads <threads> "Number of worker threads [default: all cores]").value_parser(value_parser!(usize)))
        .arg(arg!(--feature <feature> "GTF feature type holding exons").default_value("exon"))
        .arg(arg!(--"id-attribute" <attribute> "GTF attribute naming the gene").default_value("gene_id"))
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;

use exoncount::output::write_outputs;
use exoncount::{CountMode, Pipeline, PipelineConfig};

///
/// Build the run configuration: the TOML file given with `--config` (if any),
/// then every flag present on the command line on top of it.
///
pub fn config_from_matches(matches: &ArgMatches) -> Result<PipelineConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => PipelineConfig::try_from(Path::new(path))
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        None => {
            let alignments = matches
                .get_one::<String>("alignments")
                .ok_or_else(|| anyhow!("--alignments is required without --config"))?;
            let gtf = matches
                .get_one::<String>("gtf")
                .ok_or_else(|| anyhow!("--gtf is required without --config"))?;
            PipelineConfig::new(alignments, gtf)
        }
    };

    if let Some(v) = matches.get_one::<String>("alignments") {
        config.alignments = PathBuf::from(v);
    }
    if let Some(v) = matches.get_one::<String>("gtf") {
        config.gtf = PathBuf::from(v);
    }
    if let Some(v) = matches.get_one::<String>("output") {
        config.output = PathBuf::from(v);
    }
    if let Some(v) = matches.get_one::<String>("rename") {
        config.rename_table = Some(PathBuf::from(v));
    }
    if let Some(v) = matches.get_one::<String>("groups") {
        config.groups = Some(PathBuf::from(v));
    }
    if let Some(v) = matches.get_one::<u32>("read-length") {
        config.read_length = *v;
    }
    if let Some(v) = matches.get_one::<usize>("threads") {
        config.threads = Some(*v);
    }
    if let Some(v) = matches.get_one::<String>("separator") {
        config.sample_separator = v.clone();
    }
    if let Some(v) = matches.get_one::<String>("secondary-tag") {
        config.secondary_tag = v.clone();
    }
    if let Some(v) = matches.get_one::<String>("mode") {
        config.count_mode = v.parse::<CountMode>()?;
    }
    if let Some(v) = matches.get_one::<u32>("max-hits") {
        config.max_hits = Some(*v);
    }
    if let Some(v) = matches.get_one::<u8>("min-mapq") {
        config.min_good_mapq = *v;
    }
    if let Some(v) = matches.get_one::<u64>("timeout") {
        config.timeout_secs = Some(*v);
    }
    if let Some(v) = matches.get_one::<String>("cache-dir") {
        config.cache_dir = Some(PathBuf::from(v));
    }
    if let Some(values) = matches.get_many::<String>("ignore") {
        config.ignored_sequences.extend(values.cloned());
    }
    config.skip_secondary |= matches.get_flag("skip-secondary");
    config.skip_supplementary |= matches.get_flag("skip-supplementary");
    config.skip_duplicates |= matches.get_flag("skip-duplicates");

    config.validate()?;
    Ok(config)
}

pub fn run_count(matches: &ArgMatches) -> Result<()> {
    let config = config_from_matches(matches)?;
    let output = config.output.clone();
    let quiet = matches.get_flag("quiet");

    let outcome = Pipeline::new(config).show_progress(!quiet).run()?;

    let written = write_outputs(&outcome, &output)
        .with_context(|| format!("Failed to write outputs to {:?}", output))?;
    for path in &written {
        log::debug!("Wrote {:?}", path);
    }

    log::info!(
        "Counted {} genes across {} samples; results in {:?}",
        outcome.matrix.n_genes(),
        outcome.matrix.n_samples(),
        output
    );

    Ok(())
}

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;

use exoncount::output::write_cut_points;
use exoncount_io::read_gene_model;
use exoncount_qc::CutPoints;

pub fn run_cutpoints(matches: &ArgMatches) -> Result<()> {
    let gtf = matches
        .get_one::<String>("gtf")
        .expect("A path to a GTF file is required.");
    let read_length = *matches
        .get_one::<u32>("read-length")
        .expect("read-length has a default");
    let feature = matches
        .get_one::<String>("feature")
        .expect("feature has a default");
    let id_attribute = matches
        .get_one::<String>("id-attribute")
        .expect("id-attribute has a default");
    let threads = matches
        .get_one::<usize>("threads")
        .copied()
        // rayon picks the core count for 0
        .unwrap_or(0);

    let model = read_gene_model(Path::new(gtf), feature, id_attribute)
        .with_context(|| format!("Failed to read gene model from {}", gtf))?;
    log::info!("Loaded {} genes from {}", model.len(), gtf);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("Failed to build thread pool")?;
    let cut_points = pool.install(|| CutPoints::from_model(read_length, &model))?;

    match cut_points.quantiles() {
        Some(q) => log::info!(
            "Intron lengths: min {} / Q1 {} / median {} / Q3 {} / max {}",
            q.min,
            q.q1,
            q.median,
            q.q3,
            q.max
        ),
        None => log::warn!("No introns found; binning on read length only"),
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_cut_points(&cut_points, &mut handle)?;
    handle.flush()?;

    Ok(())
}


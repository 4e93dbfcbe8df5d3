//! Reconciling gene model sequence names with alignment sequence names.
use std::collections::BTreeSet;

use exoncount_core::models::{GeneModel, RenameTable};

use crate::errors::{PipelineError, Result};

///
/// Rename the sequences of `model` through `table` so that they match the naming
/// used by the alignments. The rename must keep the model's sequence names
/// distinct.
///
pub fn harmonize(model: &GeneModel, table: &RenameTable) -> Result<GeneModel> {
    let model_names = model.sequence_names();
    table.check_injective(model_names.iter().map(String::as_str))?;
    Ok(model.with_renamed_sequences(table))
}

///
/// Every sequence name that reads were aligned to, apart from those in
/// `ignored`, must exist in the (renamed) model; otherwise the run stops with
/// [`PipelineError::NamingMismatch`] listing every missing name.
///
/// Only names that carry reads are checked: a header may declare contigs the
/// annotation does not cover as long as nothing aligns to them. Model
/// sequences without reads are fine too.
///
pub fn check_sequence_coverage(
    model: &GeneModel,
    used_names: &BTreeSet<String>,
    ignored: &BTreeSet<String>,
) -> Result<()> {
    let model_names = model.sequence_names();
    let missing: Vec<String> = used_names
        .iter()
        .filter(|name| !model_names.contains(*name) && !ignored.contains(*name))
        .cloned()
        .collect();

    if !missing.is_empty() {
        return Err(PipelineError::NamingMismatch { missing });
    }

    let unused = model_names.difference(used_names).count();
    if unused > 0 {
        log::debug!("{} gene model sequence(s) carry no reads", unused);
    }
    Ok(())
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeneModelError {
    #[error("Gene model contains no genes")]
    EmptyGeneModel,

    #[error("Gene {gene} has exons on more than one sequence: {first} and {second}")]
    MixedSequences {
        gene: String,
        first: String,
        second: String,
    },

    #[error("Invalid interval {seqname}:{start}-{end}: start must be less than end")]
    InvalidInterval {
        seqname: String,
        start: u32,
        end: u32,
    },

    #[error("Rename table maps more than one sequence name onto {target}: {sources:?}")]
    RenameCollision { target: String, sources: Vec<String> },

    #[error("Rename table lists {0} more than once")]
    DuplicateRename(String),
}

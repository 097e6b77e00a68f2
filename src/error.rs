use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PileupError>;

/// Errors surfaced by the pileup cursor and its collaborators.
#[derive(Debug, Error)]
pub enum PileupError {
    #[error("unable to open alignment file {}", .path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: rust_htslib::errors::Error,
    },

    #[error("unable to locate index for alignment file {}", .path.display())]
    IndexMissing { path: PathBuf },

    #[error("unknown reference name {0}")]
    UnknownReference(String),

    #[error("invalid reference name {0}")]
    InvalidReference(String),

    /// A non-deletion observation carried a base outside A/C/G/T/N.
    /// The offending position yields no statistics record.
    #[error("unrecognized base {base} at reference {ref_id} position {pos}")]
    MalformedBase { base: char, ref_id: u32, pos: i64 },

    /// Internal precondition violation; `next`/`seek` check emptiness
    /// before dequeueing, so callers should never observe this.
    #[error("result queue is empty")]
    EmptyQueue,

    #[error(transparent)]
    Hts(#[from] rust_htslib::errors::Error),
}

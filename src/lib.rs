pub mod cli;
pub mod commands;
pub mod error;
pub mod pileup;
pub mod utils;

// Re-export the main API
pub use error::PileupError;
pub use pileup::{CursorState, PileupCursor, PositionStatistics};

//! Transfer module - main module file
//!
//! Single-file and recursive-folder transfers between a project's local tree and
//! its mirrored remote tree.

pub mod engine;
pub mod types;

// Re-export commonly used types
pub use engine::TransferEngine;
pub use types::{Direction, TransferFailure, TransferOutcome, TreeOutcome};

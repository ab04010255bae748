//! Core types for transfer results
//!
//! Single-file operations return a [`TransferOutcome`]; tree operations fold every
//! per-entry result into a [`TreeOutcome`] instead of aborting on the first error.

use std::path::PathBuf;

use crate::models::{ErrorKind, TransferError};

/// Direction of a transfer, used in log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upload,
    Download,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Download => "download",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Upload => "uploaded",
            Self::Download => "downloaded",
        }
    }
}

/// Result of one successful file transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub local_path: PathBuf,
    pub remote_path: String,
    /// Bytes copied
    pub bytes: u64,
}

/// A per-entry failure inside a tree operation
#[derive(Debug, Clone)]
pub struct TransferFailure {
    pub path: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Aggregate result of a tree operation
#[derive(Debug, Clone, Default)]
pub struct TreeOutcome {
    pub files_attempted: usize,
    pub files_succeeded: usize,
    pub directories_created: usize,
    pub bytes: u64,
    pub failures: Vec<TransferFailure>,
}

impl TreeOutcome {
    /// Fold one file result into the aggregate.
    pub fn record_file(&mut self, path: &str, result: &Result<TransferOutcome, TransferError>) {
        self.files_attempted += 1;
        match result {
            Ok(outcome) => {
                self.files_succeeded += 1;
                self.bytes += outcome.bytes;
            }
            Err(e) => self.record_failure(path, e),
        }
    }

    pub fn record_directory(&mut self) {
        self.directories_created += 1;
    }

    /// Record a failure that is not a file transfer (listing, mkdir, bad entry).
    pub fn record_failure(&mut self, path: &str, error: &TransferError) {
        self.failures.push(TransferFailure {
            path: path.to_string(),
            kind: error.kind(),
            message: error.to_string(),
        });
    }

    pub fn files_failed(&self) -> usize {
        self.files_attempted - self.files_succeeded
    }

    /// True when nothing failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

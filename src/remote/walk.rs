//! Depth-first remote tree walk
//!
//! The walker does not hold the session: each [`RemoteWalker::step`] borrows it
//! for one listing, so the caller can transfer files through the same session
//! between steps.

use super::traits::{RemoteEntry, RemoteSession};
use crate::models::TransferError;

/// A failed step: the directory that could not be listed.
#[derive(Debug)]
pub struct WalkError {
    pub path: String,
    pub error: TransferError,
}

/// Pre-order walk: the root first, then each directory's subtree before its next
/// sibling, siblings in byte-wise path order. Finite and not restartable.
pub struct RemoteWalker {
    root: Option<RemoteEntry>,
    pending: Vec<RemoteEntry>,
    expand: Option<String>,
}

impl RemoteWalker {
    /// Stat the root. Fails when the walk cannot begin.
    pub fn start(session: &mut dyn RemoteSession, root: &str) -> Result<Self, TransferError> {
        let entry = session.stat(root)?;
        Ok(Self {
            root: Some(entry),
            pending: Vec::new(),
            expand: None,
        })
    }

    /// Produce the next entry, or `None` once every reachable entry was visited.
    ///
    /// A listing failure is returned as one error step; the walk then carries on
    /// with the entries still pending.
    pub fn step(
        &mut self,
        session: &mut dyn RemoteSession,
    ) -> Option<Result<RemoteEntry, WalkError>> {
        if let Some(root) = self.root.take() {
            return Some(Ok(self.visit(root)));
        }

        if let Some(dir) = self.expand.take() {
            match session.read_dir(&dir) {
                Ok(mut children) => {
                    children.sort_by(|a, b| a.path.cmp(&b.path));
                    self.pending.extend(children.into_iter().rev());
                }
                Err(error) => return Some(Err(WalkError { path: dir, error })),
            }
        }

        let entry = self.pending.pop()?;
        Some(Ok(self.visit(entry)))
    }

    fn visit(&mut self, entry: RemoteEntry) -> RemoteEntry {
        if entry.is_dir {
            self.expand = Some(entry.path.clone());
        }
        entry
    }
}

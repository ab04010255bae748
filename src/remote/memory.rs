//! In-memory remote gateway for testing
//!
//! Holds a tiny remote filesystem shared by every session it opens, counts
//! opened and closed sessions, and allows injecting failures per path.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{RemoteEntry, RemoteGateway, RemoteSession};
use crate::configure::ProjectConfig;
use crate::models::TransferError;
use crate::path_translator::{clean_remote, remote_parent};

#[derive(Debug, Default)]
struct MemoryFs {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    failing_reads: HashSet<String>,
    failing_writes: HashSet<String>,
    failing_listings: HashSet<String>,
    refuse_connections: bool,
    opened: usize,
    closed: usize,
}

impl MemoryFs {
    fn insert_dir_all(&mut self, path: &str) {
        let mut current = clean_remote(path);
        loop {
            self.dirs.insert(current.clone());
            if current == "/" || current == "." {
                break;
            }
            current = remote_parent(&current);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    fs: Arc<Mutex<MemoryFs>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        let gateway = Self::default();
        // Filesystem root and the session's home directory
        gateway
            .state()
            .dirs
            .extend(["/".to_string(), ".".to_string()]);
        gateway
    }

    fn state(&self) -> MutexGuard<'_, MemoryFs> {
        lock(&self.fs)
    }

    /// Add a file, creating its parent directories.
    pub fn add_file(&self, path: &str, content: &[u8]) {
        let path = clean_remote(path);
        let mut fs = self.state();
        fs.insert_dir_all(&remote_parent(&path));
        fs.files.insert(path, content.to_vec());
    }

    pub fn add_dir(&self, path: &str) {
        self.state().insert_dir_all(path);
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state().files.get(&clean_remote(path)).cloned()
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.state().dirs.contains(&clean_remote(path))
    }

    /// All file paths in sorted order.
    pub fn file_paths(&self) -> Vec<String> {
        self.state().files.keys().cloned().collect()
    }

    pub fn fail_reads_for(&self, path: &str) {
        self.state().failing_reads.insert(clean_remote(path));
    }

    pub fn fail_writes_for(&self, path: &str) {
        self.state().failing_writes.insert(clean_remote(path));
    }

    pub fn fail_listing_for(&self, path: &str) {
        self.state().failing_listings.insert(clean_remote(path));
    }

    pub fn refuse_connections(&self, refuse: bool) {
        self.state().refuse_connections = refuse;
    }

    pub fn opened_sessions(&self) -> usize {
        self.state().opened
    }

    pub fn closed_sessions(&self) -> usize {
        self.state().closed
    }
}

impl RemoteGateway for MemoryGateway {
    fn open(&self, project: &ProjectConfig) -> Result<Box<dyn RemoteSession>, TransferError> {
        let mut fs = self.state();
        if fs.refuse_connections {
            return Err(TransferError::Connection {
                endpoint: project.endpoint(),
                reason: "connection refused".to_string(),
            });
        }
        fs.opened += 1;
        Ok(Box::new(MemorySession {
            fs: Arc::clone(&self.fs),
        }))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

fn lock(fs: &Mutex<MemoryFs>) -> MutexGuard<'_, MemoryFs> {
    fs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct MemorySession {
    fs: Arc<Mutex<MemoryFs>>,
}

impl RemoteSession for MemorySession {
    fn open_read(&mut self, path: &str) -> Result<Box<dyn Read + '_>, TransferError> {
        let path = clean_remote(path);
        let fs = lock(&self.fs);
        if fs.failing_reads.contains(&path) {
            return Err(TransferError::remote_io("open", &path, "permission denied"));
        }
        match fs.files.get(&path) {
            Some(content) => Ok(Box::new(Cursor::new(content.clone()))),
            None => Err(TransferError::NotFound(path)),
        }
    }

    fn create_write(&mut self, path: &str) -> Result<Box<dyn Write + '_>, TransferError> {
        let path = clean_remote(path);
        let mut fs = lock(&self.fs);
        if fs.failing_writes.contains(&path) {
            return Err(TransferError::remote_io("create", &path, "permission denied"));
        }
        if !fs.dirs.contains(&remote_parent(&path)) {
            return Err(TransferError::remote_io("create", &path, "no such directory"));
        }
        if fs.dirs.contains(&path) {
            return Err(TransferError::remote_io("create", &path, "is a directory"));
        }
        fs.files.insert(path.clone(), Vec::new());
        Ok(Box::new(MemoryWriter {
            fs: Arc::clone(&self.fs),
            path,
        }))
    }

    fn make_dir(&mut self, path: &str) -> Result<(), TransferError> {
        let path = clean_remote(path);
        let mut fs = lock(&self.fs);
        if !fs.dirs.contains(&remote_parent(&path)) {
            return Err(TransferError::remote_io("mkdir", &path, "no such directory"));
        }
        if fs.files.contains_key(&path) {
            return Err(TransferError::remote_io("mkdir", &path, "file exists"));
        }
        fs.dirs.insert(path);
        Ok(())
    }

    fn stat(&mut self, path: &str) -> Result<RemoteEntry, TransferError> {
        let path = clean_remote(path);
        let fs = lock(&self.fs);
        if fs.dirs.contains(&path) {
            return Ok(RemoteEntry {
                path,
                is_dir: true,
                size: 0,
            });
        }
        match fs.files.get(&path) {
            Some(content) => Ok(RemoteEntry {
                size: content.len() as u64,
                path,
                is_dir: false,
            }),
            None => Err(TransferError::NotFound(path)),
        }
    }

    fn read_dir(&mut self, path: &str) -> Result<Vec<RemoteEntry>, TransferError> {
        let path = clean_remote(path);
        let fs = lock(&self.fs);
        if fs.failing_listings.contains(&path) {
            return Err(TransferError::remote_io("readdir", &path, "permission denied"));
        }
        if !fs.dirs.contains(&path) {
            return Err(TransferError::NotFound(path));
        }

        let dirs = fs
            .dirs
            .iter()
            .filter(|d| *d != &path && remote_parent(d) == path)
            .map(|d| RemoteEntry {
                path: d.clone(),
                is_dir: true,
                size: 0,
            });
        let files = fs
            .files
            .iter()
            .filter(|(f, _)| remote_parent(f) == path)
            .map(|(f, content)| RemoteEntry {
                path: f.clone(),
                is_dir: false,
                size: content.len() as u64,
            });
        Ok(dirs.chain(files).collect())
    }

    fn close(&mut self) -> Result<(), TransferError> {
        lock(&self.fs).closed += 1;
        Ok(())
    }
}

struct MemoryWriter {
    fs: Arc<Mutex<MemoryFs>>,
    path: String,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut fs = lock(&self.fs);
        match fs.files.get_mut(&self.path) {
            Some(content) => {
                content.extend_from_slice(buf);
                Ok(buf.len())
            }
            None => Err(io::Error::new(io::ErrorKind::NotFound, "file removed")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

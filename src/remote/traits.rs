//! Remote session gateway traits
//!
//! Defines the primitive operations the transfer engine needs from a remote
//! endpoint, and the scoped guard that guarantees each opened session is closed
//! exactly once.

use std::io::{self, Read, Write};
use std::ops::{Deref, DerefMut};

use crate::configure::ProjectConfig;
use crate::models::{ErrorKind, TransferError};
use crate::path_translator::{clean_remote, remote_parent};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// One remote filesystem object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub path: String,
    pub is_dir: bool,
    pub size: u64,
}

/// An open, authenticated session to one project's remote endpoint.
///
/// Implementations report a missing object as [`TransferError::NotFound`] and any
/// other remote failure as [`TransferError::RemoteIo`].
pub trait RemoteSession: Send {
    /// Open an existing remote file for reading.
    fn open_read(&mut self, path: &str) -> Result<Box<dyn Read + '_>, TransferError>;

    /// Create (or truncate) a remote file. The parent directory must exist.
    fn create_write(&mut self, path: &str) -> Result<Box<dyn Write + '_>, TransferError>;

    /// Create a single directory whose parent exists.
    fn make_dir(&mut self, path: &str) -> Result<(), TransferError>;

    fn stat(&mut self, path: &str) -> Result<RemoteEntry, TransferError>;

    /// Direct children of a directory, excluding `.` and `..`.
    fn read_dir(&mut self, path: &str) -> Result<Vec<RemoteEntry>, TransferError>;

    /// Release the session. Called exactly once, by [`ScopedSession`].
    fn close(&mut self) -> Result<(), TransferError>;

    /// Create `path` and all missing ancestors. Succeeds if it already exists.
    fn make_dir_all(&mut self, path: &str) -> Result<(), TransferError> {
        let path = clean_remote(path);
        if let Ok(entry) = self.stat(&path) {
            if entry.is_dir {
                return Ok(());
            }
        }

        let mut current = if path.starts_with('/') {
            String::from("/")
        } else {
            String::new()
        };
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if !current.is_empty() && !current.ends_with('/') {
                current.push('/');
            }
            current.push_str(segment);

            match self.stat(&current) {
                Ok(entry) if entry.is_dir => continue,
                Ok(_) => {
                    return Err(TransferError::remote_io(
                        "mkdir",
                        &current,
                        "exists and is not a directory",
                    ));
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    if let Err(mkdir_err) = self.make_dir(&current) {
                        // Lost a race with another writer creating the same directory
                        match self.stat(&current) {
                            Ok(entry) if entry.is_dir => continue,
                            _ => return Err(mkdir_err),
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Write the whole of `source` to `path`, creating parent directories first.
    ///
    /// A failure partway through leaves the remote file truncated.
    fn write_file(&mut self, path: &str, source: &mut dyn Read) -> Result<u64, TransferError> {
        self.make_dir_all(&remote_parent(path))?;
        let mut sink = self.create_write(path)?;
        match copy_stream(source, &mut sink) {
            Ok(bytes) => {
                sink.flush()
                    .map_err(|e| TransferError::remote_io("write", path, e))?;
                Ok(bytes)
            }
            Err(CopyError::Read(e)) => Err(TransferError::LocalIo {
                operation: "read",
                path: path.to_string(),
                source: e,
            }),
            Err(CopyError::Write(e)) => Err(TransferError::remote_io("write", path, e)),
        }
    }
}

/// Opens sessions against a project's remote endpoint.
pub trait RemoteGateway: Send + Sync {
    /// Dial, handshake and authenticate. All failures are `Connection` errors.
    fn open(&self, project: &ProjectConfig) -> Result<Box<dyn RemoteSession>, TransferError>;

    /// Get gateway name for logging
    fn name(&self) -> &str;
}

/// Which side of a copy failed.
#[derive(Debug)]
pub enum CopyError {
    Read(io::Error),
    Write(io::Error),
}

/// Copy `reader` into `writer` until EOF, keeping read and write failures apart.
pub fn copy_stream(reader: &mut dyn Read, writer: &mut dyn Write) -> Result<u64, CopyError> {
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Read(e)),
        };
        writer.write_all(&buf[..n]).map_err(CopyError::Write)?;
        total += n as u64;
    }
}

/// A session that is closed exactly once, on every exit path.
///
/// Call [`ScopedSession::finish`] on the happy path; dropping the guard closes the
/// session otherwise.
pub struct ScopedSession {
    inner: Box<dyn RemoteSession>,
    project: String,
    closed: bool,
}

impl ScopedSession {
    pub fn open(
        gateway: &dyn RemoteGateway,
        project_name: &str,
        project: &ProjectConfig,
    ) -> Result<Self, TransferError> {
        let inner = gateway.open(project)?;
        log::debug!(
            "[{}] Opened {} session to {}",
            project_name,
            gateway.name(),
            project.endpoint()
        );
        Ok(Self {
            inner,
            project: project_name.to_string(),
            closed: false,
        })
    }

    pub fn finish(mut self) {
        self.close_once();
    }

    fn close_once(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        match self.inner.close() {
            Ok(()) => log::debug!("[{}] Session closed", self.project),
            Err(e) => log::warn!("[{}] Failed to close session: {}", self.project, e),
        }
    }
}

impl Deref for ScopedSession {
    type Target = dyn RemoteSession;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl DerefMut for ScopedSession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.as_mut()
    }
}

impl Drop for ScopedSession {
    fn drop(&mut self) {
        self.close_once();
    }
}

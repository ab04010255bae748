//! SFTP gateway over `ssh2`
//!
//! One TCP connection, SSH handshake and password authentication per opened
//! session. Host keys are not verified.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::Path;

use ssh2::{ErrorCode, FileStat, Session, Sftp};

use super::traits::{RemoteEntry, RemoteGateway, RemoteSession};
use crate::configure::ProjectConfig;
use crate::models::TransferError;
use crate::path_translator::remote_child;

// LIBSSH2_FX_NO_SUCH_FILE / LIBSSH2_FX_NO_SUCH_PATH
const FX_NO_SUCH_FILE: i32 = 2;
const FX_NO_SUCH_PATH: i32 = 10;
const DIR_MODE: i32 = 0o755;

#[derive(Debug, Clone, Copy, Default)]
pub struct SftpGateway;

impl SftpGateway {
    pub fn new() -> Self {
        Self
    }
}

impl RemoteGateway for SftpGateway {
    fn open(&self, project: &ProjectConfig) -> Result<Box<dyn RemoteSession>, TransferError> {
        let endpoint = project.endpoint();
        let connection_error = |reason: String| TransferError::Connection {
            endpoint: endpoint.clone(),
            reason,
        };

        let tcp = TcpStream::connect(&endpoint)
            .map_err(|e| connection_error(format!("failed to dial: {e}")))?;
        let mut session =
            Session::new().map_err(|e| connection_error(format!("failed to create session: {e}")))?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| connection_error(format!("handshake failed: {e}")))?;
        session
            .userauth_password(&project.sftp_user, &project.sftp_password)
            .map_err(|e| connection_error(format!("authentication failed: {e}")))?;
        if !session.authenticated() {
            return Err(connection_error("authentication failed".to_string()));
        }

        let sftp = session
            .sftp()
            .map_err(|e| connection_error(format!("failed to create SFTP client: {e}")))?;

        Ok(Box::new(SftpSession {
            session,
            sftp,
            endpoint,
        }))
    }

    fn name(&self) -> &str {
        "sftp"
    }
}

pub struct SftpSession {
    session: Session,
    sftp: Sftp,
    endpoint: String,
}

fn is_missing(err: &ssh2::Error) -> bool {
    matches!(
        err.code(),
        ErrorCode::SFTP(FX_NO_SUCH_FILE) | ErrorCode::SFTP(FX_NO_SUCH_PATH)
    )
}

fn lookup_error(operation: &'static str, path: &str, err: ssh2::Error) -> TransferError {
    if is_missing(&err) {
        TransferError::NotFound(path.to_string())
    } else {
        TransferError::remote_io(operation, path, err)
    }
}

fn entry_from_stat(path: String, stat: &FileStat) -> RemoteEntry {
    RemoteEntry {
        path,
        is_dir: stat.is_dir(),
        size: stat.size.unwrap_or(0),
    }
}

impl RemoteSession for SftpSession {
    fn open_read(&mut self, path: &str) -> Result<Box<dyn Read + '_>, TransferError> {
        let file = self
            .sftp
            .open(Path::new(path))
            .map_err(|e| lookup_error("open", path, e))?;
        Ok(Box::new(file))
    }

    fn create_write(&mut self, path: &str) -> Result<Box<dyn Write + '_>, TransferError> {
        let file = self
            .sftp
            .create(Path::new(path))
            .map_err(|e| TransferError::remote_io("create", path, e))?;
        Ok(Box::new(file))
    }

    fn make_dir(&mut self, path: &str) -> Result<(), TransferError> {
        self.sftp
            .mkdir(Path::new(path), DIR_MODE)
            .map_err(|e| TransferError::remote_io("mkdir", path, e))
    }

    fn stat(&mut self, path: &str) -> Result<RemoteEntry, TransferError> {
        let stat = self
            .sftp
            .stat(Path::new(path))
            .map_err(|e| lookup_error("stat", path, e))?;
        Ok(entry_from_stat(path.to_string(), &stat))
    }

    fn read_dir(&mut self, path: &str) -> Result<Vec<RemoteEntry>, TransferError> {
        let entries = self
            .sftp
            .readdir(Path::new(path))
            .map_err(|e| lookup_error("readdir", path, e))?;

        Ok(entries
            .into_iter()
            .filter_map(|(child, stat)| {
                let name = child.file_name()?.to_string_lossy().into_owned();
                if name == "." || name == ".." {
                    return None;
                }
                Some(entry_from_stat(remote_child(path, &name), &stat))
            })
            .collect())
    }

    fn close(&mut self) -> Result<(), TransferError> {
        self.session
            .disconnect(None, "transfer complete", None)
            .map_err(|e| TransferError::Connection {
                endpoint: self.endpoint.clone(),
                reason: format!("failed to disconnect: {e}"),
            })
    }
}

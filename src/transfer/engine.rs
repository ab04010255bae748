//! Transfer Engine
//!
//! Single-file and recursive-folder upload/download. Every operation validates its
//! inputs, opens exactly one session for its whole duration (closed on every exit
//! path), performs the work, and returns an outcome. Tree operations never abort on
//! a per-entry failure.
//!
//! All calls are blocking; the HTTP layer runs them on tokio's blocking pool.

use std::fs::{self, File};
use std::sync::Arc;

use walkdir::WalkDir;

use crate::configure::ProjectConfig;
use crate::models::TransferError;
use crate::path_translator::{self, TransferTarget};
use crate::registry::ProjectRegistry;
use crate::remote::{copy_stream, CopyError, RemoteGateway, RemoteSession, RemoteWalker, ScopedSession};
use crate::transfer::types::{Direction, TransferOutcome, TreeOutcome};

pub struct TransferEngine {
    registry: Arc<ProjectRegistry>,
    gateway: Arc<dyn RemoteGateway>,
}

impl TransferEngine {
    pub fn new(registry: Arc<ProjectRegistry>, gateway: Arc<dyn RemoteGateway>) -> Self {
        Self { registry, gateway }
    }

    pub fn registry(&self) -> &ProjectRegistry {
        &self.registry
    }

    /// Upload one local file to its mirrored remote location.
    pub fn upload_file(
        &self,
        project_name: &str,
        local_path: &str,
    ) -> Result<TransferOutcome, TransferError> {
        let project = self.validate(project_name, local_path)?;
        let target = path_translator::resolve_target(project, local_path)?;

        let metadata =
            fs::metadata(local_path).map_err(|e| TransferError::local_io("stat", local_path, e))?;
        if metadata.is_dir() {
            return Err(TransferError::Input(format!("{local_path} is a directory")));
        }

        log::info!("[{}] Uploading: {}", project_name, local_path);
        let mut session = self.open_session(project_name, project)?;
        let result = upload_target(&mut *session, &target);
        session.finish();

        log_result(project_name, Direction::Upload, local_path, &result);
        result
    }

    /// Upload every file below `local_folder`, continuing past per-file failures.
    ///
    /// The folder itself is not checked against the project root; files outside it
    /// fail individually in the path translation.
    pub fn upload_folder(
        &self,
        project_name: &str,
        local_folder: &str,
    ) -> Result<TreeOutcome, TransferError> {
        let project = self.validate(project_name, local_folder)?;
        if !path_translator::is_within_root(project, local_folder) {
            log::warn!(
                "[{}] Folder {} is outside project root {}",
                project_name,
                local_folder,
                project.local_base_path
            );
        }

        // The walk must be able to start
        fs::metadata(local_folder)
            .map_err(|e| TransferError::local_io("stat", local_folder, e))?;

        log::info!("[{}] Uploading folder: {}", project_name, local_folder);
        let mut session = self.open_session(project_name, project)?;
        let mut outcome = TreeOutcome::default();

        for entry in WalkDir::new(local_folder).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| local_folder.to_string());
                    let error = TransferError::LocalIo {
                        operation: "walk",
                        path: path.clone(),
                        source: e.into(),
                    };
                    log::warn!("[{}] Failed to walk {}: {}", project_name, path, error);
                    outcome.record_failure(&path, &error);
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }
            if entry.path_is_symlink() && fs::metadata(entry.path()).is_ok_and(|m| m.is_dir()) {
                log::debug!(
                    "[{}] Skipping link to directory: {}",
                    project_name,
                    entry.path().display()
                );
                continue;
            }

            let path = entry.path().display().to_string();
            let result = match entry.path().to_str() {
                Some(local_path) => path_translator::resolve_target(project, local_path)
                    .and_then(|target| upload_target(&mut *session, &target)),
                None => Err(TransferError::Input(format!("{path} is not valid UTF-8"))),
            };
            if let Err(e) = &result {
                log::warn!("[{}] Failed to upload {}: {}", project_name, path, e);
            }
            outcome.record_file(&path, &result);
        }

        session.finish();
        log::info!(
            "[{}] Uploaded folder {} with {} of {} files",
            project_name,
            local_folder,
            outcome.files_succeeded,
            outcome.files_attempted
        );
        Ok(outcome)
    }

    /// Download the remote counterpart of `local_path`, overwriting any local file.
    pub fn download_file(
        &self,
        project_name: &str,
        local_path: &str,
    ) -> Result<TransferOutcome, TransferError> {
        let project = self.validate(project_name, local_path)?;
        let target = path_translator::resolve_target(project, local_path)?;

        log::info!("[{}] Downloading: {}", project_name, local_path);
        let mut session = self.open_session(project_name, project)?;
        let result = download_target(&mut *session, &target);
        session.finish();

        log_result(project_name, Direction::Download, local_path, &result);
        result
    }

    /// Mirror the remote counterpart of `local_folder` into the local tree.
    ///
    /// Directories are recreated even when empty. Per-entry failures are recorded
    /// and the walk continues; only a missing remote root fails the operation.
    pub fn download_folder(
        &self,
        project_name: &str,
        local_folder: &str,
    ) -> Result<TreeOutcome, TransferError> {
        let project = self.validate(project_name, local_folder)?;
        let remote_root = path_translator::to_remote(project, local_folder)?;

        log::info!(
            "[{}] Downloading folder: {} (remote {})",
            project_name,
            local_folder,
            remote_root
        );
        let mut session = self.open_session(project_name, project)?;
        let mut walker = RemoteWalker::start(&mut *session, &remote_root).map_err(|e| {
            log::error!("[{}] Cannot walk {}: {}", project_name, remote_root, e);
            e
        })?;
        let mut outcome = TreeOutcome::default();

        while let Some(step) = walker.step(&mut *session) {
            let entry = match step {
                Ok(entry) => entry,
                Err(walk_error) => {
                    log::warn!(
                        "[{}] Error walking remote folder {}: {}",
                        project_name,
                        walk_error.path,
                        walk_error.error
                    );
                    outcome.record_failure(&walk_error.path, &walk_error.error);
                    continue;
                }
            };

            let local_path = match path_translator::to_local(project, &entry.path) {
                Ok(path) => path,
                Err(e) => {
                    log::warn!("[{}] Skipping {}: {}", project_name, entry.path, e);
                    outcome.record_failure(&entry.path, &e);
                    continue;
                }
            };
            let local_display = local_path.display().to_string();

            if entry.is_dir {
                match fs::create_dir_all(&local_path) {
                    Ok(()) => outcome.record_directory(),
                    Err(e) => {
                        let error = TransferError::local_io("mkdir", &local_display, e);
                        log::warn!(
                            "[{}] Failed to create directory {}: {}",
                            project_name,
                            local_display,
                            error
                        );
                        outcome.record_failure(&local_display, &error);
                    }
                }
                continue;
            }

            let target = TransferTarget {
                local_path,
                remote_path: entry.path,
            };
            let result = download_target(&mut *session, &target);
            if let Err(e) = &result {
                log::warn!("[{}] Failed to download {}: {}", project_name, local_display, e);
            }
            outcome.record_file(&local_display, &result);
        }

        session.finish();
        log::info!(
            "[{}] Downloaded folder {} with {} of {} files",
            project_name,
            local_folder,
            outcome.files_succeeded,
            outcome.files_attempted
        );
        Ok(outcome)
    }

    /// Shared input checks: non-empty path, registered project.
    fn validate(&self, project_name: &str, path: &str) -> Result<&ProjectConfig, TransferError> {
        if project_name.is_empty() || path.is_empty() {
            return Err(TransferError::Input(
                "project and path are required".to_string(),
            ));
        }
        self.registry.resolve(project_name).map_err(|e| {
            log::warn!("Project not registered: {}", project_name);
            e
        })
    }

    fn open_session(
        &self,
        project_name: &str,
        project: &ProjectConfig,
    ) -> Result<ScopedSession, TransferError> {
        ScopedSession::open(self.gateway.as_ref(), project_name, project).map_err(|e| {
            log::error!("[{}] {}", project_name, e);
            e
        })
    }
}

fn upload_target(
    session: &mut dyn RemoteSession,
    target: &TransferTarget,
) -> Result<TransferOutcome, TransferError> {
    let local_display = target.local_path.display().to_string();
    let mut file = File::open(&target.local_path)
        .map_err(|e| TransferError::local_io("open", &local_display, e))?;
    let bytes = session.write_file(&target.remote_path, &mut file)?;
    Ok(TransferOutcome {
        local_path: target.local_path.clone(),
        remote_path: target.remote_path.clone(),
        bytes,
    })
}

fn download_target(
    session: &mut dyn RemoteSession,
    target: &TransferTarget,
) -> Result<TransferOutcome, TransferError> {
    let local_display = target.local_path.display().to_string();
    let mut reader = session.open_read(&target.remote_path)?;

    if let Some(parent) = target.local_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            TransferError::local_io("mkdir", &parent.display().to_string(), e)
        })?;
    }
    let mut file = File::create(&target.local_path)
        .map_err(|e| TransferError::local_io("create", &local_display, e))?;

    let bytes = copy_stream(&mut reader, &mut file).map_err(|e| match e {
        CopyError::Read(e) => TransferError::remote_io("read", &target.remote_path, e),
        CopyError::Write(e) => TransferError::local_io("write", &local_display, e),
    })?;
    Ok(TransferOutcome {
        local_path: target.local_path.clone(),
        remote_path: target.remote_path.clone(),
        bytes,
    })
}

fn log_result(
    project_name: &str,
    direction: Direction,
    path: &str,
    result: &Result<TransferOutcome, TransferError>,
) {
    match result {
        Ok(outcome) => log::info!(
            "[{}] Successfully {}: {} ({} bytes)",
            project_name,
            direction.past_tense(),
            path,
            outcome.bytes
        ),
        Err(e) => log::log!(
            failure_level(e),
            "[{}] {} failed for {} [{}]: {}",
            project_name,
            direction.as_str(),
            path,
            e.error_code(),
            e
        ),
    }
}

/// User errors log at warn, the rest at error.
fn failure_level(error: &TransferError) -> log::Level {
    if error.is_user_error() {
        log::Level::Warn
    } else {
        log::Level::Error
    }
}

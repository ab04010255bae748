use std::fs;
use std::path::Path;
use std::sync::Arc;

use sftp_bridge::configure::ProjectConfig;
use sftp_bridge::models::ErrorKind;
use sftp_bridge::registry::ProjectRegistry;
use sftp_bridge::remote::MemoryGateway;
use sftp_bridge::transfer::TransferEngine;

const REMOTE_ROOT: &str = "/srv/demo";

fn project(local_root: &Path) -> ProjectConfig {
    ProjectConfig {
        local_base_path: local_root.display().to_string(),
        sftp_host: "sftp.example.com".to_string(),
        sftp_port: 22,
        sftp_user: "deploy".to_string(),
        sftp_password: "secret".to_string(),
        sftp_base_path: REMOTE_ROOT.to_string(),
    }
}

fn setup(local_root: &Path) -> (TransferEngine, MemoryGateway) {
    setup_with_remote_root(local_root, REMOTE_ROOT)
}

fn setup_with_remote_root(local_root: &Path, remote_root: &str) -> (TransferEngine, MemoryGateway) {
    let gateway = MemoryGateway::new();
    let mut demo = project(local_root);
    demo.sftp_base_path = remote_root.to_string();
    let registry = ProjectRegistry::new([("demo".to_string(), demo)]);
    let engine = TransferEngine::new(Arc::new(registry), Arc::new(gateway.clone()));
    (engine, gateway)
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_upload_file_mirrors_relative_path() {
    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("sub").join("file.txt");
    fs::create_dir_all(local.parent().unwrap()).unwrap();
    fs::write(&local, b"hello bridge").unwrap();
    let (engine, gateway) = setup(dir.path());

    let outcome = engine.upload_file("demo", path_str(&local)).unwrap();

    assert_eq!(outcome.remote_path, "/srv/demo/sub/file.txt");
    assert_eq!(outcome.bytes, 12);
    assert_eq!(gateway.file("/srv/demo/sub/file.txt").unwrap(), b"hello bridge");
    assert_eq!(gateway.opened_sessions(), 1);
    assert_eq!(gateway.closed_sessions(), 1);
}

#[test]
fn test_upload_then_download_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("data.bin");
    let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    fs::write(&local, &content).unwrap();
    let (engine, _gateway) = setup(dir.path());

    engine.upload_file("demo", path_str(&local)).unwrap();
    fs::remove_file(&local).unwrap();
    let outcome = engine.download_file("demo", path_str(&local)).unwrap();

    assert_eq!(outcome.bytes, content.len() as u64);
    assert_eq!(fs::read(&local).unwrap(), content);
}

#[test]
fn test_download_overwrites_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("notes").join("today.md");
    fs::create_dir_all(local.parent().unwrap()).unwrap();
    fs::write(&local, b"a much longer stale local version").unwrap();
    let (engine, gateway) = setup(dir.path());
    gateway.add_file("/srv/demo/notes/today.md", b"fresh");

    engine.download_file("demo", path_str(&local)).unwrap();

    assert_eq!(fs::read(&local).unwrap(), b"fresh");
}

#[test]
fn test_download_creates_missing_local_parents() {
    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("x").join("y").join("z.txt");
    let (engine, gateway) = setup(dir.path());
    gateway.add_file("/srv/demo/x/y/z.txt", b"deep");

    engine.download_file("demo", path_str(&local)).unwrap();

    assert_eq!(fs::read(&local).unwrap(), b"deep");
}

#[test]
fn test_download_missing_remote_leaves_no_local_file() {
    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("ghost.txt");
    let (engine, gateway) = setup(dir.path());

    let err = engine.download_file("demo", path_str(&local)).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!local.exists());
    assert_eq!(gateway.closed_sessions(), 1);
}

#[test]
fn test_upload_out_of_scope_opens_no_session() {
    let dir = tempfile::tempdir().unwrap();
    let other = tempfile::tempdir().unwrap();
    let local = other.path().join("file.txt");
    fs::write(&local, b"x").unwrap();
    let (engine, gateway) = setup(dir.path());

    let err = engine.upload_file("demo", path_str(&local)).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::OutOfScope);
    assert_eq!(gateway.opened_sessions(), 0);
}

#[test]
fn test_upload_missing_local_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("missing.txt");
    let (engine, gateway) = setup(dir.path());

    let err = engine.upload_file("demo", path_str(&local)).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(gateway.opened_sessions(), 0);
}

#[test]
fn test_unknown_project_is_forbidden_without_connecting() {
    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("file.txt");
    fs::write(&local, b"x").unwrap();
    let (engine, gateway) = setup(dir.path());

    for err in [
        engine.upload_file("nope", path_str(&local)).unwrap_err(),
        engine.download_file("nope", path_str(&local)).unwrap_err(),
        engine.upload_folder("nope", path_str(dir.path())).unwrap_err(),
        engine.download_folder("nope", path_str(dir.path())).unwrap_err(),
    ] {
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }
    assert_eq!(gateway.opened_sessions(), 0);
}

#[test]
fn test_connection_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("file.txt");
    fs::write(&local, b"x").unwrap();
    let (engine, gateway) = setup(dir.path());
    gateway.refuse_connections(true);

    let err = engine.upload_file("demo", path_str(&local)).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Connection);
    assert_eq!(gateway.closed_sessions(), 0);
}

#[test]
fn test_upload_folder_continues_past_failures() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("site");
    fs::create_dir_all(folder.join("css")).unwrap();
    fs::write(folder.join("index.html"), b"<html/>").unwrap();
    fs::write(folder.join("about.html"), b"<p/>").unwrap();
    fs::write(folder.join("css").join("main.css"), b"body{}").unwrap();
    let (engine, gateway) = setup(dir.path());
    gateway.fail_writes_for("/srv/demo/site/about.html");

    let outcome = engine.upload_folder("demo", path_str(&folder)).unwrap();

    assert_eq!(outcome.files_attempted, 3);
    assert_eq!(outcome.files_succeeded, 2);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].kind, ErrorKind::RemoteIo);
    assert_eq!(
        gateway.file_paths(),
        vec![
            "/srv/demo/site/css/main.css".to_string(),
            "/srv/demo/site/index.html".to_string(),
        ]
    );
    assert_eq!(gateway.opened_sessions(), 1);
    assert_eq!(gateway.closed_sessions(), 1);
}

#[test]
fn test_upload_folder_missing_root_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, gateway) = setup(dir.path());

    let err = engine
        .upload_folder("demo", path_str(&dir.path().join("absent")))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(gateway.opened_sessions(), 0);
}

#[test]
fn test_upload_folder_outside_root_fails_per_file() {
    let dir = tempfile::tempdir().unwrap();
    let other = tempfile::tempdir().unwrap();
    fs::write(other.path().join("a.txt"), b"a").unwrap();
    let (engine, gateway) = setup(dir.path());

    let outcome = engine.upload_folder("demo", path_str(other.path())).unwrap();

    assert_eq!(outcome.files_attempted, 1);
    assert_eq!(outcome.files_succeeded, 0);
    assert_eq!(outcome.failures[0].kind, ErrorKind::OutOfScope);
    assert!(gateway.file_paths().is_empty());
}

#[test]
fn test_download_folder_recreates_tree_with_empty_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("assets");
    let (engine, gateway) = setup(dir.path());
    gateway.add_file("/srv/demo/assets/logo.png", b"png");
    gateway.add_file("/srv/demo/assets/fonts/a.woff", b"woff");
    gateway.add_dir("/srv/demo/assets/empty/nested");

    let outcome = engine.download_folder("demo", path_str(&folder)).unwrap();

    assert!(outcome.is_complete());
    assert_eq!(outcome.files_succeeded, 2);
    assert_eq!(fs::read(folder.join("logo.png")).unwrap(), b"png");
    assert_eq!(fs::read(folder.join("fonts").join("a.woff")).unwrap(), b"woff");
    assert!(folder.join("empty").join("nested").is_dir());
    assert_eq!(gateway.opened_sessions(), 1);
    assert_eq!(gateway.closed_sessions(), 1);
}

#[test]
fn test_download_folder_continues_past_failures() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("logs");
    let (engine, gateway) = setup(dir.path());
    gateway.add_file("/srv/demo/logs/a.log", b"a");
    gateway.add_file("/srv/demo/logs/b.log", b"b");
    gateway.add_file("/srv/demo/logs/locked/c.log", b"c");
    gateway.fail_reads_for("/srv/demo/logs/a.log");
    gateway.fail_listing_for("/srv/demo/logs/locked");

    let outcome = engine.download_folder("demo", path_str(&folder)).unwrap();

    assert_eq!(outcome.files_attempted, 2);
    assert_eq!(outcome.files_succeeded, 1);
    assert_eq!(outcome.failures.len(), 2);
    assert!(!folder.join("a.log").exists());
    assert_eq!(fs::read(folder.join("b.log")).unwrap(), b"b");
    assert!(folder.join("locked").is_dir());
    assert_eq!(gateway.closed_sessions(), 1);
}

#[test]
fn test_download_folder_missing_remote_root_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, gateway) = setup(dir.path());

    let err = engine
        .download_folder("demo", path_str(&dir.path().join("nothing")))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(gateway.opened_sessions(), 1);
    assert_eq!(gateway.closed_sessions(), 1);
}

#[test]
fn test_folder_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("project");
    fs::create_dir_all(folder.join("src").join("bin")).unwrap();
    fs::write(folder.join("README"), b"readme").unwrap();
    fs::write(folder.join("src").join("lib.rs"), b"pub fn f() {}").unwrap();
    fs::write(folder.join("src").join("bin").join("main.rs"), b"fn main() {}").unwrap();
    let (engine, _gateway) = setup(dir.path());

    let uploaded = engine.upload_folder("demo", path_str(&folder)).unwrap();
    assert_eq!(uploaded.files_succeeded, 3);

    fs::remove_dir_all(&folder).unwrap();
    let downloaded = engine.download_folder("demo", path_str(&folder)).unwrap();

    assert!(downloaded.is_complete());
    assert_eq!(downloaded.files_succeeded, 3);
    assert_eq!(fs::read(folder.join("README")).unwrap(), b"readme");
    assert_eq!(
        fs::read(folder.join("src").join("bin").join("main.rs")).unwrap(),
        b"fn main() {}"
    );
}

#[test]
fn test_download_folder_with_relative_remote_root() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("sub");
    let (engine, gateway) = setup_with_remote_root(dir.path(), "./uploads");
    gateway.add_file("uploads/sub/a.txt", b"relative");
    gateway.add_dir("uploads/sub/empty");

    let outcome = engine.download_folder("demo", path_str(&folder)).unwrap();

    assert!(outcome.is_complete(), "{:?}", outcome.failures);
    assert_eq!(outcome.files_attempted, 1);
    assert_eq!(fs::read(folder.join("a.txt")).unwrap(), b"relative");
    assert!(folder.join("empty").is_dir());
}

#[test]
fn test_folder_round_trip_through_home_directory_root() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("top.txt"), b"top").unwrap();
    fs::write(dir.path().join("sub").join("a.txt"), b"nested").unwrap();
    let (engine, gateway) = setup_with_remote_root(dir.path(), ".");

    let uploaded = engine.upload_folder("demo", path_str(dir.path())).unwrap();
    assert_eq!(uploaded.files_succeeded, 2);
    assert_eq!(gateway.file("sub/a.txt").unwrap(), b"nested");

    fs::remove_file(dir.path().join("top.txt")).unwrap();
    fs::remove_dir_all(dir.path().join("sub")).unwrap();
    let downloaded = engine.download_folder("demo", path_str(dir.path())).unwrap();

    assert!(downloaded.is_complete(), "{:?}", downloaded.failures);
    assert_eq!(downloaded.files_succeeded, 2);
    assert_eq!(fs::read(dir.path().join("top.txt")).unwrap(), b"top");
    assert_eq!(fs::read(dir.path().join("sub").join("a.txt")).unwrap(), b"nested");
}

#[cfg(unix)]
#[test]
fn test_upload_folder_continues_past_unreadable_local_file() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("docs");
    fs::create_dir_all(&folder).unwrap();
    fs::write(folder.join("a.txt"), b"a").unwrap();
    fs::write(folder.join("c.txt"), b"c").unwrap();
    std::os::unix::fs::symlink(folder.join("gone.txt"), folder.join("b.txt")).unwrap();
    let (engine, gateway) = setup(dir.path());

    let outcome = engine.upload_folder("demo", path_str(&folder)).unwrap();

    assert_eq!(outcome.files_attempted, 3);
    assert_eq!(outcome.files_succeeded, 2);
    assert_eq!(outcome.failures.len(), 1);
    assert!(outcome.failures[0].path.ends_with("b.txt"));
    assert_eq!(
        gateway.file_paths(),
        vec![
            "/srv/demo/docs/a.txt".to_string(),
            "/srv/demo/docs/c.txt".to_string(),
        ]
    );
}

#[cfg(unix)]
#[test]
fn test_upload_folder_skips_links_to_directories() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("docs");
    fs::create_dir_all(folder.join("real")).unwrap();
    fs::write(folder.join("real").join("a.txt"), b"a").unwrap();
    std::os::unix::fs::symlink(folder.join("real"), folder.join("alias")).unwrap();
    let (engine, gateway) = setup(dir.path());

    let outcome = engine.upload_folder("demo", path_str(&folder)).unwrap();

    assert!(outcome.is_complete(), "{:?}", outcome.failures);
    assert_eq!(outcome.files_attempted, 1);
    assert_eq!(gateway.file_paths(), vec!["/srv/demo/docs/real/a.txt".to_string()]);
    assert!(gateway.file("/srv/demo/docs/alias").is_none());
}

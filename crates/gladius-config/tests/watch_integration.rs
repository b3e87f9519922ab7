//! Integration tests for live reload.
//!
//! Most tests replace files atomically (write a sibling temp file, then
//! rename it over the config).  One writes in place in two steps, the way a
//! plain `open(O_TRUNC)` + `write` editor does.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use gladius_config::{Config, ConfigChange, SetupOptions};
use tokio::sync::broadcast;
use tokio::time::{timeout, Instant};

/// Upper bound on how long a filesystem event may take to arrive.
const EVENT_DEADLINE: Duration = Duration::from_secs(10);

fn replace_file(path: &Path, contents: &str) {
    let tmp = path.with_file_name(".gladius-replace.tmp");
    std::fs::write(&tmp, contents).unwrap();
    std::fs::rename(&tmp, path).unwrap();
}

/// Waits for the first change notification matching `accept`.
async fn wait_for_change<F>(rx: &mut broadcast::Receiver<ConfigChange>, accept: F) -> ConfigChange
where
    F: Fn(&ConfigChange) -> bool,
{
    let deadline = Instant::now() + EVENT_DEADLINE;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match timeout(remaining, rx.recv()).await {
            Ok(Ok(change)) if accept(&change) => return change,
            Ok(Ok(_)) | Ok(Err(broadcast::error::RecvError::Lagged(_))) => continue,
            Ok(Err(broadcast::error::RecvError::Closed)) => panic!("change channel closed"),
            Err(_) => panic!("no matching config change within {EVENT_DEADLINE:?}"),
        }
    }
}

#[tokio::test]
async fn test_change_on_disk_is_reloaded_and_broadcast() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("node.toml");
    std::fs::write(&path, "port = 9090\n").unwrap();
    let config = Config::setup(
        SetupOptions::new("node")
            .working_dir(dir.path())
            .defaults([("port", "8080")]),
    )
    .unwrap();
    assert!(config.is_watching());
    let mut rx = config.subscribe();

    // Act
    replace_file(&path, "port = 9191\n");
    let change = wait_for_change(&mut rx, |c| c.reloaded).await;

    // Assert
    assert_eq!(change.path.file_name(), path.file_name());
    assert_eq!(config.get_string("port"), "9191");
}

#[tokio::test]
async fn test_in_place_write_is_reloaded_only_once_complete() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("node.toml");
    std::fs::write(&path, "port = 9090\nhost = \"a\"\n").unwrap();
    let config = Config::setup(
        SetupOptions::new("node")
            .working_dir(dir.path())
            .defaults([("port", "8080")]),
    )
    .unwrap();
    let mut rx = config.subscribe();

    // Act: truncate, pause, then write the new contents
    let mut file = std::fs::File::create(&path).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    file.write_all(b"port = 9191\nhost = \"b\"\n").unwrap();
    file.sync_all().unwrap();
    drop(file);
    let change = wait_for_change(&mut rx, |_| true).await;

    // Assert: the first notification already sees the finished file
    assert!(change.reloaded);
    assert_eq!(config.get_string("port"), "9191");
    assert_eq!(config.get_string("host"), "b");
}

#[tokio::test]
async fn test_broken_reload_keeps_previous_values() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("node.toml");
    std::fs::write(&path, "port = 9090\n").unwrap();
    let config = Config::setup(SetupOptions::new("node").working_dir(dir.path())).unwrap();
    let mut rx = config.subscribe();

    // Act
    replace_file(&path, "port = = broken\n");
    let change = wait_for_change(&mut rx, |c| !c.reloaded).await;

    // Assert
    assert_eq!(change.path.file_name(), path.file_name());
    assert_eq!(config.get_string("port"), "9090");
}

#[tokio::test]
async fn test_unrelated_file_does_not_trigger_change() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("node.toml"), "port = 1\n").unwrap();
    let config = Config::setup(SetupOptions::new("node").working_dir(dir.path())).unwrap();
    let mut rx = config.subscribe();

    // Act
    std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();

    // Assert
    let result = timeout(Duration::from_millis(500), rx.recv()).await;
    assert!(result.is_err(), "unexpected notification: {result:?}");
    assert_eq!(config.get_string("port"), "1");
}

#[tokio::test]
async fn test_watch_disabled_installs_no_watcher() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("node.toml"), "port = 1\n").unwrap();

    let config = Config::setup(
        SetupOptions::new("node")
            .working_dir(dir.path())
            .watch(false),
    )
    .unwrap();

    assert!(!config.is_watching());
}

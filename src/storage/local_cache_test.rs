use std::path::Path;

use super::*;
use crate::test_utils::enable_logger;
use crate::test_utils::snapshot;
use crate::ErrorKind;

fn cache_in(dir: &Path) -> LocalCache {
    LocalCache::new(dir, "http://localhost:8080", "SampleApp", "default", "application")
}

#[test]
fn test_path_is_keyed_by_identity() {
    let dir = Path::new("/tmp/apollo");

    let a = cache_in(dir);
    let b = LocalCache::new(dir, "http://localhost:8080", "SampleApp", "default", "other");

    assert_eq!(a.path().parent(), Some(dir));
    assert_ne!(a.path(), b.path());
    assert_eq!(a, cache_in(dir));
}

#[tokio::test]
async fn test_write_then_read() {
    enable_logger();
    let temp_dir = tempfile::tempdir().unwrap();
    let cache = cache_in(&temp_dir.path().join("cache"));
    let data = snapshot(&[("timeout", "100"), ("name", "apollo")]);

    cache.write(&data).await.unwrap();

    assert_eq!(cache.read().await.unwrap(), data);
}

#[tokio::test]
async fn test_read_missing_file() {
    enable_logger();
    let temp_dir = tempfile::tempdir().unwrap();
    let cache = cache_in(temp_dir.path());

    let e = cache.read().await.unwrap_err();
    assert_eq!(e.kind(), ErrorKind::NoLocalCacheFound);
}

#[tokio::test]
async fn test_read_corrupt_file() {
    enable_logger();
    let temp_dir = tempfile::tempdir().unwrap();
    let cache = cache_in(temp_dir.path());
    std::fs::write(cache.path(), b"{ not json").unwrap();

    let e = cache.read().await.unwrap_err();
    assert_eq!(e.kind(), ErrorKind::ReadLocalCacheFails);
}

#[tokio::test]
async fn test_read_rejects_non_string_values() {
    enable_logger();
    let temp_dir = tempfile::tempdir().unwrap();
    let cache = cache_in(temp_dir.path());
    std::fs::write(cache.path(), br#"{"timeout": 100}"#).unwrap();

    let e = cache.read().await.unwrap_err();
    assert_eq!(e.kind(), ErrorKind::ReadLocalCacheFails);
}

#[tokio::test]
async fn test_write_into_unwritable_dir() {
    enable_logger();
    let temp_dir = tempfile::tempdir().unwrap();
    let blocker = temp_dir.path().join("blocker");
    std::fs::write(&blocker, b"x").unwrap();
    let cache = cache_in(&blocker);

    let e = cache.write(&snapshot(&[("k", "v")])).await.unwrap_err();
    assert_eq!(e.kind(), ErrorKind::SaveLocalCacheFails);
}

use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use tokio::io::AsyncWriteExt;
use tracing::debug;
use tracing::warn;

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

pub(crate) async fn create_parent_dir_if_not_exist(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !tokio::fs::try_exists(parent).await.unwrap_or(false) {
            tokio::fs::create_dir_all(parent).await?;
            debug!("created directory {:?}", parent);
        }
    }
    Ok(())
}

/// Writes `buf` to a sibling temp file, then renames it over `path`, so
/// readers observe either the old or the new content.
pub(crate) async fn write_atomically(
    path: &Path,
    buf: &[u8],
) -> io::Result<()> {
    create_parent_dir_if_not_exist(path).await?;

    let tmp = temp_sibling(path);
    let result = write_then_rename(&tmp, path, buf).await;
    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(&tmp).await {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("failed to remove temp file {:?}: {}", tmp, e);
            }
        }
    }
    result
}

async fn write_then_rename(
    tmp: &Path,
    path: &Path,
    buf: &[u8],
) -> io::Result<()> {
    let mut file = tokio::fs::File::create(tmp).await?;
    file.write_all(buf).await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(tmp, path).await
}

fn temp_sibling(path: &Path) -> PathBuf {
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".{}.{}.tmp", std::process::id(), seq));
    path.with_file_name(name)
}

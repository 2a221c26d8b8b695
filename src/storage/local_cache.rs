use std::io;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;

use crate::utils::file_io::write_atomically;
use crate::utils::key::create_key;
use crate::CacheError;
use crate::Result;
use crate::Snapshot;

/// Snapshot file of one namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalCache {
    path: PathBuf,
}

impl LocalCache {
    /// File lives at `{dir}/{base64("host|app_id|cluster|namespace")}`
    pub fn new(
        dir: &Path,
        host: &str,
        app_id: &str,
        cluster: &str,
        namespace: &str,
    ) -> Self {
        let file_name = create_key(&[host, app_id, cluster, namespace]);
        Self {
            path: dir.join(file_name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the whole snapshot or nothing.
    pub async fn read(&self) -> Result<Snapshot> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => CacheError::NotFound {
                path: self.path.clone(),
                source: e,
            },
            _ => CacheError::Read {
                path: self.path.clone(),
                source: Box::new(e),
            },
        })?;

        let snapshot: Snapshot = serde_json::from_str(&content).map_err(|e| CacheError::Read {
            path: self.path.clone(),
            source: Box::new(e),
        })?;

        debug!("loaded {} keys from {:?}", snapshot.len(), self.path);
        Ok(snapshot)
    }

    pub async fn write(
        &self,
        snapshot: &Snapshot,
    ) -> Result<()> {
        let save_error = |source: Box<dyn std::error::Error + Send + Sync>| CacheError::Save {
            path: self.path.clone(),
            source,
        };

        let buf = serde_json::to_vec(snapshot).map_err(|e| save_error(Box::new(e)))?;
        write_atomically(&self.path, &buf)
            .await
            .map_err(|e| save_error(Box::new(e)))?;

        debug!("saved {} keys to {:?}", snapshot.len(), self.path);
        Ok(())
    }
}

//! Mirror writer: pushes engine snapshots into the external cache without
//! ever blocking the engine, and reads them back on startup.
//!
//! Writes coalesce: a pending write that is overtaken by a newer snapshot
//! gives up, including between retries, so an unreachable cache costs at most
//! one retry cycle per burst of mutations.

use crate::retry::{with_retry, RetryConfig};
use crate::snapshot::EngineSnapshot;
use amae_core::{CacheMirror, MirrorConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

pub struct MirrorWriter {
    mirror: Arc<dyn CacheMirror>,
    key: String,
    retry: RetryConfig,
    /// Highest revision written so far. Writes race; stale ones are dropped.
    written: Arc<Mutex<Option<u64>>>,
    /// Newest revision handed to `spawn_write`.
    requested: Arc<AtomicU64>,
}

impl MirrorWriter {
    pub fn new(mirror: Arc<dyn CacheMirror>, config: &MirrorConfig) -> Self {
        Self {
            mirror,
            key: config.key.clone(),
            retry: RetryConfig::from(config),
            written: Arc::new(Mutex::new(None)),
            requested: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Write `snapshot` in the background. Failures are logged, never returned.
    pub fn spawn_write(&self, snapshot: &EngineSnapshot) -> Option<JoinHandle<()>> {
        let blob = match snapshot.to_blob() {
            Ok(blob) => blob,
            Err(e) => {
                tracing::warn!("Skipping mirror write: {}", e);
                return None;
            }
        };

        let revision = snapshot.revision;
        let mirror = Arc::clone(&self.mirror);
        let key = self.key.clone();
        let retry = self.retry.clone();
        let written = Arc::clone(&self.written);
        let requested = Arc::clone(&self.requested);
        requested.fetch_max(revision, Ordering::AcqRel);

        Some(tokio::spawn(async move {
            let mut last = written.lock().await;
            if last.map_or(false, |w| w >= revision) || requested.load(Ordering::Acquire) > revision {
                tracing::trace!("Dropping stale mirror write (revision {})", revision);
                return;
            }
            let target = format!("mirror {}", mirror.name());
            let outcome = with_retry(&retry, &target, || {
                let superseded = requested.load(Ordering::Acquire) > revision;
                let write = mirror.set(&key, blob.clone());
                async move {
                    if superseded {
                        return Ok(false);
                    }
                    write.await.map(|()| true)
                }
            })
            .await;
            match outcome {
                Ok(true) => {
                    *last = Some(revision);
                    tracing::trace!("Mirrored revision {} to {}", revision, key);
                }
                Ok(false) => {
                    tracing::debug!("Mirror write of revision {} superseded", revision);
                }
                Err(e) => tracing::warn!("Mirror write of revision {} failed: {}", revision, e),
            }
        }))
    }

    /// Read back the last mirrored snapshot, if there is a usable one.
    pub async fn load(&self) -> Option<EngineSnapshot> {
        let target = format!("mirror {}", self.mirror.name());
        let blob = match with_retry(&self.retry, &target, || self.mirror.get(&self.key)).await {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                tracing::debug!("No mirrored state under {}", self.key);
                return None;
            }
            Err(e) => {
                tracing::warn!("Mirror unavailable, starting from local state: {}", e);
                return None;
            }
        };

        match EngineSnapshot::from_blob(&blob) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!("Ignoring unreadable mirrored state: {}", e);
                None
            }
        }
    }
}

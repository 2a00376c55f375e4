//! Cache mirror collaborator
//!
//! The engine can mirror its combined state into an external key/value cache
//! so other processes can read it. The mirror is optional and eventually
//! consistent; the engine works on local state alone when it is missing.

use crate::error::MirrorError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[async_trait]
pub trait CacheMirror: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, MirrorError>;
    async fn set(&self, key: &str, blob: Vec<u8>) -> Result<(), MirrorError>;

    /// Short name for log lines.
    fn name(&self) -> &str {
        "cache"
    }
}

/// Default mirror: accepts writes and forgets them.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMirror;

#[async_trait]
impl CacheMirror for NoopMirror {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, MirrorError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _blob: Vec<u8>) -> Result<(), MirrorError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "noop"
    }
}

/// In-process mirror, handy for tests and the console.
#[derive(Debug, Default)]
pub struct MemoryMirror {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheMirror for MemoryMirror {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, MirrorError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, blob: Vec<u8>) -> Result<(), MirrorError> {
        self.entries.write().await.insert(key.to_string(), blob);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// A mirror that is never reachable, for exercising degraded paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineMirror;

#[async_trait]
impl CacheMirror for OfflineMirror {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, MirrorError> {
        Err(MirrorError::Unavailable("offline".to_string()))
    }

    async fn set(&self, _key: &str, _blob: Vec<u8>) -> Result<(), MirrorError> {
        Err(MirrorError::Unavailable("offline".to_string()))
    }

    fn name(&self) -> &str {
        "offline"
    }
}

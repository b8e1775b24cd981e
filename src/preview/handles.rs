/*!
 * Local handles over fetched binary data.
 *
 * A handle is a locally addressable reference (`blob:<uuid>`) to bytes held
 * in the registry. Handles stay resolvable until they are revoked; every
 * creation must be matched by exactly one revocation, which the counters
 * make observable.
 */

use bytes::Bytes;
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

/// Reference to bytes stored in a [`BlobRegistry`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaHandle {
    /// Locally addressable identifier
    pub url: String,
    /// Size of the referenced data in bytes
    pub size: usize,
    /// Content type reported by the server
    pub content_type: Option<String>,
}

/// Registry of live handles
#[derive(Debug, Clone, Default)]
pub struct BlobRegistry {
    blobs: Arc<Mutex<HashMap<String, Bytes>>>,
    created: Arc<AtomicUsize>,
    revoked: Arc<AtomicUsize>,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle over `bytes`
    pub fn create(&self, bytes: Bytes, content_type: Option<String>) -> MediaHandle {
        let url = format!("blob:{}", Uuid::new_v4());
        let handle = MediaHandle {
            url: url.clone(),
            size: bytes.len(),
            content_type,
        };
        self.blobs.lock().insert(url, bytes);
        self.created.fetch_add(1, Ordering::SeqCst);
        debug!("Created handle {} ({} bytes)", handle.url, handle.size);
        handle
    }

    /// Revoke a handle. Returns false if it was already revoked.
    pub fn revoke(&self, handle: &MediaHandle) -> bool {
        let removed = self.blobs.lock().remove(&handle.url).is_some();
        if removed {
            self.revoked.fetch_add(1, Ordering::SeqCst);
            debug!("Revoked handle {}", handle.url);
        }
        removed
    }

    /// Bytes behind a live handle
    pub fn resolve(&self, handle: &MediaHandle) -> Option<Bytes> {
        self.blobs.lock().get(&handle.url).cloned()
    }

    pub fn is_live(&self, handle: &MediaHandle) -> bool {
        self.blobs.lock().contains_key(&handle.url)
    }

    /// Number of handles ever created
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Number of handles revoked
    pub fn revoked_count(&self) -> usize {
        self.revoked.load(Ordering::SeqCst)
    }

    /// Number of handles still live
    pub fn live_count(&self) -> usize {
        self.blobs.lock().len()
    }
}

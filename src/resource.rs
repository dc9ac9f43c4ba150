//! Revocable references to raw document bytes.
//!
//! A PDF is never transformed: the session registers its bytes with a
//! [`ResourceAllocator`] and publishes the returned URL for a viewer. The
//! session holds the handle inside a [`ResourceLease`], which revokes it when
//! dropped, so replacing or resetting a document releases the old bytes.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// URL prefix of handles issued by [`BlobStore`].
pub const BLOB_URL_PREFIX: &str = "blob:docpane/";

/// An opaque, URL-like reference to registered bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceHandle {
    url: String,
}

impl ResourceHandle {
    /// Wrap a URL issued by an allocator.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// The URL a viewer can load.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Allocates and revokes references to raw bytes.
pub trait ResourceAllocator: Send + Sync {
    /// Register bytes and return a handle to them.
    fn allocate(&self, data: Arc<[u8]>, mime_type: &str) -> Result<ResourceHandle>;

    /// Release a handle. Revoking an unknown handle does nothing.
    fn revoke(&self, handle: &ResourceHandle);

    /// Look up the bytes behind a live URL.
    ///
    /// Allocators that serve their URLs elsewhere may return `None`.
    fn resolve(&self, _url: &str) -> Option<Blob> {
        None
    }
}

/// A registered blob.
#[derive(Debug, Clone)]
pub struct Blob {
    /// Shared content
    pub data: Arc<[u8]>,
    /// MIME type given at allocation
    pub mime_type: String,
}

/// In-memory allocator issuing `blob:docpane/<uuid>` URLs.
#[derive(Debug, Default)]
pub struct BlobStore {
    blobs: Mutex<HashMap<String, Blob>>,
}

impl BlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if no handles are live.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Blob>> {
        self.blobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResourceAllocator for BlobStore {
    fn allocate(&self, data: Arc<[u8]>, mime_type: &str) -> Result<ResourceHandle> {
        if mime_type.is_empty() {
            return Err(Error::Resource("MIME type is required".into()));
        }

        let url = format!("{}{}", BLOB_URL_PREFIX, uuid::Uuid::new_v4());
        log::debug!("Allocated {} ({} bytes)", url, data.len());
        self.lock().insert(
            url.clone(),
            Blob {
                data,
                mime_type: mime_type.to_string(),
            },
        );
        Ok(ResourceHandle::new(url))
    }

    fn revoke(&self, handle: &ResourceHandle) {
        if self.lock().remove(handle.url()).is_some() {
            log::debug!("Revoked {}", handle);
        }
    }

    fn resolve(&self, url: &str) -> Option<Blob> {
        self.lock().get(url).cloned()
    }
}

/// Owns one handle and revokes it when dropped.
pub struct ResourceLease {
    handle: ResourceHandle,
    allocator: Arc<dyn ResourceAllocator>,
}

impl ResourceLease {
    /// Allocate bytes and hold the resulting handle.
    pub fn acquire(
        allocator: Arc<dyn ResourceAllocator>,
        data: Arc<[u8]>,
        mime_type: &str,
    ) -> Result<Self> {
        let handle = allocator.allocate(data, mime_type)?;
        Ok(Self { handle, allocator })
    }

    /// The held handle.
    pub fn handle(&self) -> &ResourceHandle {
        &self.handle
    }

    /// URL of the held handle.
    pub fn url(&self) -> &str {
        self.handle.url()
    }
}

impl fmt::Debug for ResourceLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceLease")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl Drop for ResourceLease {
    fn drop(&mut self) {
        self.allocator.revoke(&self.handle);
    }
}

//! Blob Handles - Transient Payload References
//!
//! A `BlobHandle` plays the role of an object URL: a named, reference-counted
//! view of a byte payload. Handles are released on drop, so every exit path
//! of an export gives its handles back.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Default)]
struct Counters {
    issued: AtomicU64,
    live: AtomicUsize,
}

/// Issues handles and tracks how many are still alive.
#[derive(Debug, Clone, Default)]
pub struct HandleTable {
    counters: Arc<Counters>,
}

impl HandleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, bytes: Arc<[u8]>, mime: &'static str) -> BlobHandle {
        let serial = self.counters.issued.fetch_add(1, Ordering::Relaxed);
        self.counters.live.fetch_add(1, Ordering::AcqRel);
        let url = format!("blob:brandkit/{}", serial);
        trace!(%url, mime, len = bytes.len(), "handle created");
        BlobHandle { url, mime, bytes, counters: Arc::clone(&self.counters) }
    }

    /// Handles created and not yet released.
    pub fn live(&self) -> usize {
        self.counters.live.load(Ordering::Acquire)
    }

    pub fn issued(&self) -> u64 {
        self.counters.issued.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
pub struct BlobHandle {
    url: String,
    mime: &'static str,
    bytes: Arc<[u8]>,
    counters: Arc<Counters>,
}

impl BlobHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }
}

impl Drop for BlobHandle {
    fn drop(&mut self) {
        self.counters.live.fetch_sub(1, Ordering::AcqRel);
        trace!(url = %self.url, "handle released");
    }
}

//! Artifact Exporter - Delivery of Finished Files
//!
//! A missing target is a silent no-op: it returns `Ok(None)` and delivers
//! nothing.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::document::VectorDocument;
use crate::error::ExportResult;
use crate::handle::HandleTable;
use crate::hashing::sha256_hex;
use crate::raster::RasterArtifact;
use crate::surface::{DeliverySink, DownloadAnchor};
use crate::templates::OutputKind;

/// Record of one delivered file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedFile {
    pub filename: String,
    pub format: OutputKind,
    pub size: [u32; 2],
    pub byte_len: usize,
    pub sha256: String,
}

pub struct Exporter<D> {
    sink: D,
    handles: HandleTable,
}

impl<D: DeliverySink> Exporter<D> {
    pub fn new(sink: D, handles: HandleTable) -> Self {
        Self { sink, handles }
    }

    pub fn sink(&self) -> &D {
        &self.sink
    }

    pub fn handles(&self) -> &HandleTable {
        &self.handles
    }

    /// Deliver the canonical SVG text of `doc`.
    pub fn export_vector(&self, doc: Option<&VectorDocument>, filename: &str) -> ExportResult<Option<ExportedFile>> {
        let Some(doc) = doc else {
            warn!(filename, "no resolved document, vector export skipped");
            return Ok(None);
        };
        let svg = doc.to_svg()?;
        self.deliver(Arc::from(svg.into_bytes()), OutputKind::Vector, doc.canvas(), filename)
            .map(Some)
    }

    /// Deliver the encoded bitmap of `artifact`.
    pub fn export_raster(&self, artifact: Option<&RasterArtifact>, filename: &str) -> ExportResult<Option<ExportedFile>> {
        let Some(artifact) = artifact else {
            warn!(filename, "no raster artifact, raster export skipped");
            return Ok(None);
        };
        self.deliver(Arc::clone(artifact.bytes()), OutputKind::Raster, artifact.size(), filename)
            .map(Some)
    }

    fn deliver(&self, bytes: Arc<[u8]>, format: OutputKind, size: [u32; 2], filename: &str) -> ExportResult<ExportedFile> {
        let sha256 = sha256_hex(&bytes);
        let byte_len = bytes.len();

        // Released when `handle` goes out of scope, whether or not the sink succeeds.
        let handle = self.handles.create(bytes, format.mime());
        let anchor = DownloadAnchor::bind(&handle, filename);
        debug!(stage = "delivering", href = anchor.href, filename);
        self.sink.trigger_download(&anchor)?;

        Ok(ExportedFile {
            filename: filename.to_string(),
            format,
            size,
            byte_len,
            sha256,
        })
    }
}

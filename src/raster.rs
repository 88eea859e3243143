//! Rasterizer - Vector Document to PNG
//!
//! Serialize -> decode -> draw -> encode. Decode and encode run on the
//! blocking pool and are the two suspension points of a raster export.

use base64::Engine;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::document::VectorDocument;
use crate::error::{ExportError, ExportResult};
use crate::handle::HandleTable;
use crate::pipeline::ExportStage;
use crate::templates::SVG_MIME;
use crate::surface::RenderingSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitmapFormat {
    Png,
}

impl BitmapFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Png => crate::templates::PNG_MIME,
        }
    }
}

/// Encoded bitmap plus its pixel dimensions. Never mutated after creation.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterArtifact {
    bytes: Arc<[u8]>,
    format: BitmapFormat,
    width: u32,
    height: u32,
}

impl RasterArtifact {
    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    pub fn format(&self) -> BitmapFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> [u32; 2] {
        [self.width, self.height]
    }

    pub fn to_data_url(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes[..]);
        format!("data:{};base64,{}", self.format.mime(), encoded)
    }
}

impl fmt::Debug for RasterArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterArtifact")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.bytes.len())
            .finish()
    }
}

pub struct Rasterizer<S> {
    surface: Arc<S>,
    handles: HandleTable,
}

impl<S: RenderingSurface> Rasterizer<S> {
    pub fn new(surface: S, handles: HandleTable) -> Self {
        Self { surface: Arc::new(surface), handles }
    }

    pub fn handles(&self) -> &HandleTable {
        &self.handles
    }

    /// Rasterize `doc` to exactly `width`x`height` pixels.
    ///
    /// The document viewport is stretched to the requested size. Keeping the
    /// aspect ratio is up to the caller.
    #[tracing::instrument(skip(self, doc), fields(template = %doc.template()))]
    pub async fn rasterize(&self, doc: &VectorDocument, width: u32, height: u32) -> ExportResult<RasterArtifact> {
        if width == 0 || height == 0 {
            return Err(ExportError::InvalidSize { width, height });
        }

        let svg = doc.to_raster_svg(width, height)?;
        let source = self.handles.create(Arc::from(svg.into_bytes()), SVG_MIME);

        debug!(stage = %ExportStage::Decoding, url = source.url());
        let surface = Arc::clone(&self.surface);
        let data = Arc::clone(source.bytes());
        let decoded = tokio::task::spawn_blocking(move || surface.decode_vector_to_image(&data)).await;
        // The decode source is only needed until decode settles.
        drop(source);
        let image = decoded.map_err(|e| ExportError::decode(e.to_string()))??;

        debug!(stage = %ExportStage::Encoding);
        let surface = Arc::clone(&self.surface);
        let bytes = tokio::task::spawn_blocking(move || {
            let canvas = surface.draw_image_to_surface(&image, width, height)?;
            surface.encode_surface_to_bytes(&canvas)
        })
        .await
        .map_err(|e| ExportError::encode(e.to_string()))??;

        if bytes.is_empty() {
            return Err(ExportError::encode("bitmap encoder produced no data"));
        }

        Ok(RasterArtifact {
            bytes: Arc::from(bytes),
            format: BitmapFormat::Png,
            width,
            height,
        })
    }
}

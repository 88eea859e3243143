//! Rendering Surface - Platform Capabilities
//!
//! The export core never touches a concrete graphics or file API. It goes
//! through two injected capabilities:
//!
//! - [`RenderingSurface`]: decode serialized SVG, draw it onto an off-screen
//!   pixel surface, encode that surface as PNG.
//! - [`DeliverySink`]: hand a finished payload to the user.
//!
//! `ResvgSurface` and `DirectorySink` are the default backends.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tracing::{debug, info};

use resvg::tiny_skia::{Pixmap, Transform};

use crate::error::{ExportError, ExportResult};
use crate::handle::BlobHandle;

pub trait RenderingSurface: Send + Sync + 'static {
    type Image: Send + 'static;
    type Canvas: Send + 'static;

    fn decode_vector_to_image(&self, data: &[u8]) -> ExportResult<Self::Image>;

    /// Draw `image` stretched to exactly `width`x`height` pixels.
    fn draw_image_to_surface(&self, image: &Self::Image, width: u32, height: u32) -> ExportResult<Self::Canvas>;

    fn encode_surface_to_bytes(&self, canvas: &Self::Canvas) -> ExportResult<Vec<u8>>;
}

/// A synthetic download action bound to one handle.
#[derive(Debug)]
pub struct DownloadAnchor<'a> {
    pub href: &'a str,
    pub download: &'a str,
    handle: &'a BlobHandle,
}

impl<'a> DownloadAnchor<'a> {
    pub fn bind(handle: &'a BlobHandle, filename: &'a str) -> Self {
        Self { href: handle.url(), download: filename, handle }
    }

    pub fn mime(&self) -> &'static str {
        self.handle.mime()
    }

    pub fn bytes(&self) -> &[u8] {
        self.handle.bytes()
    }
}

pub trait DeliverySink: Send + Sync {
    /// Called exactly once per delivered artifact.
    fn trigger_download(&self, anchor: &DownloadAnchor<'_>) -> ExportResult<()>;
}

// --- resvg backend ---

fn shared_fontdb() -> Arc<usvg::fontdb::Database> {
    static FONTDB: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTDB
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            debug!(faces = db.len(), "loaded system fonts");
            Arc::new(db)
        })
        .clone()
}

/// CPU rasterizer backed by usvg + resvg + tiny-skia.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResvgSurface;

impl RenderingSurface for ResvgSurface {
    type Image = Arc<usvg::Tree>;
    type Canvas = Pixmap;

    fn decode_vector_to_image(&self, data: &[u8]) -> ExportResult<Self::Image> {
        let mut opts = usvg::Options::default();
        opts.fontdb = shared_fontdb();
        let tree = usvg::Tree::from_data(data, &opts).map_err(|e| ExportError::decode(e.to_string()))?;
        Ok(Arc::new(tree))
    }

    fn draw_image_to_surface(&self, image: &Self::Image, width: u32, height: u32) -> ExportResult<Self::Canvas> {
        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| ExportError::encode(format!("failed to allocate {}x{} pixmap", width, height)))?;

        let size = image.size();
        let sx = width as f32 / size.width();
        let sy = height as f32 / size.height();
        resvg::render(image, Transform::from_scale(sx, sy), &mut pixmap.as_mut());
        Ok(pixmap)
    }

    fn encode_surface_to_bytes(&self, canvas: &Self::Canvas) -> ExportResult<Vec<u8>> {
        canvas.encode_png().map_err(|e| ExportError::encode(e.to_string()))
    }
}

// --- delivery backends ---

/// Writes every delivered artifact to `<dir>/<filename>`.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DeliverySink for DirectorySink {
    fn trigger_download(&self, anchor: &DownloadAnchor<'_>) -> ExportResult<()> {
        // Only the final path component is honored; filenames never escape the directory.
        let name = Path::new(anchor.download)
            .file_name()
            .ok_or_else(|| ExportError::delivery(format!("invalid filename: {:?}", anchor.download)))?;
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        fs::write(&path, anchor.bytes())?;
        info!(path = %path.display(), bytes = anchor.bytes().len(), "artifact written");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Keeps delivered artifacts in memory, in delivery order.
#[derive(Debug, Default)]
pub struct MemorySink {
    delivered: Mutex<Vec<Delivered>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A poisoned lock still holds every delivery recorded before the panic.
    fn records(&self) -> MutexGuard<'_, Vec<Delivered>> {
        self.delivered.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn delivered(&self) -> Vec<Delivered> {
        self.records().clone()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DeliverySink for MemorySink {
    fn trigger_download(&self, anchor: &DownloadAnchor<'_>) -> ExportResult<()> {
        let mut delivered = self
            .delivered
            .lock()
            .map_err(|_| ExportError::delivery("memory sink poisoned"))?;
        delivered.push(Delivered {
            filename: anchor.download.to_string(),
            mime: anchor.mime().to_string(),
            bytes: anchor.bytes().to_vec(),
        });
        Ok(())
    }
}

impl<T: DeliverySink + ?Sized> DeliverySink for Arc<T> {
    fn trigger_download(&self, anchor: &DownloadAnchor<'_>) -> ExportResult<()> {
        (**self).trigger_download(anchor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::HandleTable;

    const SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10" width="10" height="10"><rect width="10" height="10" fill="#ff0000"/></svg>"##;

    #[test]
    fn test_resvg_stretches_to_target() {
        let surface = ResvgSurface;
        let image = surface.decode_vector_to_image(SQUARE.as_bytes()).unwrap();
        let canvas = surface.draw_image_to_surface(&image, 40, 20).unwrap();
        assert_eq!((canvas.width(), canvas.height()), (40, 20));
        // Fully covered: stretched, not letterboxed.
        let corner = canvas.pixel(39, 0).unwrap();
        assert_eq!(corner.alpha(), 255);
        assert_eq!(corner.red(), 255);
    }

    #[test]
    fn test_resvg_rejects_garbage() {
        let err = ResvgSurface.decode_vector_to_image(b"<svg").unwrap_err();
        assert!(matches!(err, ExportError::Decode(_)));
    }

    #[test]
    fn test_png_signature() {
        let surface = ResvgSurface;
        let image = surface.decode_vector_to_image(SQUARE.as_bytes()).unwrap();
        let canvas = surface.draw_image_to_surface(&image, 4, 4).unwrap();
        let bytes = surface.encode_surface_to_bytes(&canvas).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_directory_sink_strips_paths() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("out"));
        let table = HandleTable::new();
        let handle = table.create(Arc::from(&b"hello"[..]), "text/plain");
        sink.trigger_download(&DownloadAnchor::bind(&handle, "../escape.txt")).unwrap();
        assert_eq!(fs::read(dir.path().join("out/escape.txt")).unwrap(), b"hello");
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[test]
    fn test_memory_sink_records() {
        let sink = MemorySink::new();
        let table = HandleTable::new();
        let handle = table.create(Arc::from(&b"<svg/>"[..]), "image/svg+xml");
        sink.trigger_download(&DownloadAnchor::bind(&handle, "a.svg")).unwrap();
        let delivered = sink.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].filename, "a.svg");
        assert_eq!(delivered[0].mime, "image/svg+xml");
    }

    #[test]
    fn test_memory_sink_survives_poisoned_lock() {
        let sink = Arc::new(MemorySink::new());
        let table = HandleTable::new();
        let handle = table.create(Arc::from(&b"<svg/>"[..]), "image/svg+xml");
        sink.trigger_download(&DownloadAnchor::bind(&handle, "a.svg")).unwrap();

        let poisoner = Arc::clone(&sink);
        let joined = std::thread::spawn(move || {
            let _guard = poisoner.delivered.lock().unwrap();
            panic!("poison the sink");
        })
        .join();
        assert!(joined.is_err());
        assert!(sink.delivered.is_poisoned());

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.delivered()[0].filename, "a.svg");
    }
}

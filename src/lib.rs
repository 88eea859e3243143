//! BrandKit Core - Channel Branding Export Engine
//!
//! Turns a theme (channel name, tagline, colors) into three branded assets:
//! a profile image, a banner and a watermark, each as SVG or PNG.
//!
//! # Pipeline
//! 1. Theme -> template renderer -> resolved SVG document
//! 2. Vector path: document -> exporter
//! 3. Raster path: document -> rasterizer -> PNG -> exporter

pub mod theme;
pub mod templates;
pub mod ids;
pub mod document;
pub mod render;
pub mod error;
pub mod hashing;
pub mod handle;
pub mod surface;
pub mod raster;
pub mod export;
pub mod pipeline;

pub use theme::{Color, Theme};
pub use templates::{OutputKind, TemplateDescriptor, TemplateId};
pub use ids::RenderId;
pub use document::VectorDocument;
pub use render::{render, render_fresh};
pub use error::{ExportError, ExportResult};
pub use hashing::{compute_manifest_hash, compute_request_hash, canonical_json};
pub use handle::{BlobHandle, HandleTable};
pub use surface::{DeliverySink, DirectorySink, MemorySink, RenderingSurface, ResvgSurface};
pub use raster::{RasterArtifact, Rasterizer};
pub use export::{ExportedFile, Exporter};
pub use pipeline::{ExportManifest, ExportPipeline, ExportRequest, ExportStage};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

//! Export Pipeline - Single Entry Point
//!
//! Every export re-renders from the theme it is given. Nothing is cached
//! between requests, so an exported file always reflects the current theme.
//!
//! Stages per request: Idle -> Rendering -> (Decoding -> Encoding) ->
//! Delivering -> Idle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ExportError, ExportResult};
use crate::export::{ExportedFile, Exporter};
use crate::handle::HandleTable;
use crate::hashing::{compute_manifest_hash, compute_request_hash};
use crate::raster::Rasterizer;
use crate::render::render_fresh;
use crate::surface::{DeliverySink, RenderingSurface};
use crate::templates::{OutputKind, TemplateDescriptor, TemplateId};
use crate::theme::Theme;
use crate::ENGINE_VERSION;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Idle,
    Rendering,
    Decoding,
    Encoding,
    Delivering,
    RenderFailed,
    Rejected,
    DecodeFailed,
    EncodeFailed,
    DeliveryFailed,
}

impl ExportStage {
    /// Terminal stage reached when an export stops with `err`.
    pub fn from_error(err: &ExportError) -> Self {
        match err {
            ExportError::Xml(_) | ExportError::Serialization(_) => Self::RenderFailed,
            ExportError::InvalidSize { .. } => Self::Rejected,
            ExportError::Decode(_) => Self::DecodeFailed,
            ExportError::Encode(_) => Self::EncodeFailed,
            ExportError::Delivery(_) => Self::DeliveryFailed,
        }
    }
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Rendering => "rendering",
            Self::Decoding => "decoding",
            Self::Encoding => "encoding",
            Self::Delivering => "delivering",
            Self::RenderFailed => "render-failed",
            Self::Rejected => "rejected",
            Self::DecodeFailed => "decode-failed",
            Self::EncodeFailed => "encode-failed",
            Self::DeliveryFailed => "delivery-failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    /// Template id or alias. Unknown ids make the request a no-op.
    pub target: String,
    pub output: OutputKind,
    #[serde(default)]
    pub filename: Option<String>,
}

impl ExportRequest {
    pub fn new(target: impl Into<String>, output: OutputKind) -> Self {
        Self { target: target.into(), output, filename: None }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub template: TemplateId,
    pub request_hash: String,
    #[serde(flatten)]
    pub file: ExportedFile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportManifest {
    pub id: String,
    pub engine_version: String,
    pub created_at: DateTime<Utc>,
    pub theme: Theme,
    pub files: Vec<ManifestEntry>,
    pub manifest_hash: String,
}

/// The export pipeline - render, rasterize and deliver
pub struct ExportPipeline<S, D> {
    rasterizer: Rasterizer<S>,
    exporter: Exporter<D>,
    handles: HandleTable,
}

impl<S: RenderingSurface, D: DeliverySink> ExportPipeline<S, D> {
    pub fn new(surface: S, sink: D) -> Self {
        let handles = HandleTable::new();
        Self {
            rasterizer: Rasterizer::new(surface, handles.clone()),
            exporter: Exporter::new(sink, handles.clone()),
            handles,
        }
    }

    /// Live payload handles across rasterizer and exporter.
    pub fn handles(&self) -> &HandleTable {
        &self.handles
    }

    pub fn sink(&self) -> &D {
        self.exporter.sink()
    }

    pub fn list_templates(&self) -> [&'static TemplateDescriptor; 3] {
        TemplateDescriptor::all()
    }

    /// Preview-size SVG for display. `None` for unknown templates.
    pub fn render_preview(&self, theme: &Theme, target: &str) -> ExportResult<Option<String>> {
        match TemplateId::parse(target) {
            Some(id) => render_fresh(id.descriptor(), theme).to_preview_svg().map(Some),
            None => Ok(None),
        }
    }

    /// Run one export request.
    ///
    /// Returns `Ok(None)` without delivering anything when the target does not
    /// name a template.
    #[tracing::instrument(skip(self, theme, request), fields(target = %request.target, output = ?request.output))]
    pub async fn export(&self, theme: &Theme, request: &ExportRequest) -> ExportResult<Option<ExportedFile>> {
        let Some(id) = TemplateId::parse(&request.target) else {
            warn!("unknown export target, nothing to do");
            return Ok(None);
        };
        let template = id.descriptor();
        let filename = request
            .filename
            .as_deref()
            .unwrap_or_else(|| template.filename(request.output));

        let result = self.run(template, theme, request.output, filename).await;
        match &result {
            Ok(_) => debug!(stage = %ExportStage::Idle, "export finished"),
            Err(e) => warn!(stage = %ExportStage::from_error(e), error = %e, "export failed"),
        }
        result
    }

    async fn run(
        &self,
        template: &TemplateDescriptor,
        theme: &Theme,
        output: OutputKind,
        filename: &str,
    ) -> ExportResult<Option<ExportedFile>> {
        debug!(stage = %ExportStage::Rendering);
        let doc = render_fresh(template, theme);

        match output {
            OutputKind::Vector => {
                debug!(stage = %ExportStage::Delivering);
                self.exporter.export_vector(Some(&doc), filename)
            }
            OutputKind::Raster => {
                let [w, h] = template.export_size;
                let artifact = self.rasterizer.rasterize(&doc, w, h).await?;
                debug!(stage = %ExportStage::Delivering);
                self.exporter.export_raster(Some(&artifact), filename)
            }
        }
    }

    /// Export every template in every requested output kind and describe the
    /// result in a manifest.
    ///
    /// Requests run concurrently and each one runs to completion. A failed
    /// request does not stop the others from delivering; the first failure is
    /// returned once all of them have finished.
    pub async fn export_all(&self, theme: &Theme, kinds: &[OutputKind]) -> ExportResult<ExportManifest> {
        self.export_templates(theme, &TemplateId::ALL, kinds).await
    }

    pub async fn export_templates(
        &self,
        theme: &Theme,
        templates: &[TemplateId],
        kinds: &[OutputKind],
    ) -> ExportResult<ExportManifest> {
        let requests: Vec<(TemplateId, ExportRequest)> = templates
            .iter()
            .flat_map(|id| kinds.iter().map(move |kind| (*id, ExportRequest::new(id.as_str(), *kind))))
            .collect();

        let outcomes = futures::future::join_all(
            requests.iter().map(|(_, request)| self.export(theme, request)),
        )
        .await;

        let failed = outcomes.iter().filter(|o| o.is_err()).count();
        let mut files = vec![];
        let mut first_error = None;
        for ((template, request), outcome) in requests.iter().zip(outcomes) {
            match outcome {
                Ok(Some(file)) => files.push(ManifestEntry {
                    template: *template,
                    request_hash: compute_request_hash(*template, request.output, theme, ENGINE_VERSION)?,
                    file,
                }),
                Ok(None) => {}
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(err) = first_error {
            warn!(failed, delivered = files.len(), "export batch incomplete");
            return Err(err);
        }

        let manifest_hash = compute_manifest_hash(ENGINE_VERSION, theme, &files)?;
        let manifest = ExportManifest {
            id: Uuid::new_v4().to_string(),
            engine_version: ENGINE_VERSION.to_string(),
            created_at: Utc::now(),
            theme: theme.clone(),
            files,
            manifest_hash,
        };

        info!(files = manifest.files.len(), hash = %manifest.manifest_hash, "export batch complete");
        Ok(manifest)
    }
}

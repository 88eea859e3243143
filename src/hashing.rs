//! Export Digests
//!
//! Every delivered payload carries its SHA-256. A manifest is summarized by a
//! digest over the theme and the payload digests it lists, so two batches
//! that delivered the same bytes for the same theme share a manifest hash.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::ExportResult;
use crate::pipeline::ManifestEntry;
use crate::templates::{OutputKind, TemplateId};
use crate::theme::Theme;

/// Lowercase hex SHA-256 of a payload.
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Compact JSON with object keys in sorted order.
///
/// `serde_json::Map` is a `BTreeMap` unless `preserve_order` is enabled, so
/// going through `Value` is enough to fix the key order.
pub fn canonical_json<T: Serialize>(value: &T) -> ExportResult<String> {
    Ok(serde_json::to_value(value)?.to_string())
}

/// Identifies what was asked for: template, output kind, theme and engine.
/// Independent of when the request ran and of the render ids it used.
pub fn compute_request_hash(
    template: TemplateId,
    output: OutputKind,
    theme: &Theme,
    engine_version: &str,
) -> ExportResult<String> {
    let mut hasher = Sha256::new();
    for part in [template.as_str(), output.as_str(), engine_version] {
        hasher.update(part.as_bytes());
        hasher.update([0]);
    }
    hasher.update(canonical_json(theme)?.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Digest over the engine, the theme and every listed file in order.
/// Manifest id and timestamp are left out.
pub fn compute_manifest_hash(
    engine_version: &str,
    theme: &Theme,
    files: &[ManifestEntry],
) -> ExportResult<String> {
    let mut hasher = Sha256::new();
    hasher.update(engine_version.as_bytes());
    hasher.update([0]);
    hasher.update(canonical_json(theme)?.as_bytes());
    for entry in files {
        hasher.update([0]);
        hasher.update(entry.template.as_str().as_bytes());
        hasher.update([0]);
        hasher.update(entry.file.filename.as_bytes());
        hasher.update([0]);
        hasher.update(entry.file.sha256.as_bytes());
    }
    Ok(format!("{:x}", hasher.finalize()))
}

//! Template System - Fixed Layouts
//!
//! Exactly three templates exist. They are defined at build time and never
//! loaded from disk.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateId {
    Profile,
    Banner,
    Watermark,
}

impl TemplateId {
    pub const ALL: [TemplateId; 3] = [TemplateId::Profile, TemplateId::Banner, TemplateId::Watermark];

    /// Lenient lookup. Unknown ids resolve to `None` rather than an error.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "profile" | "pfp" => Some(Self::Profile),
            "banner" => Some(Self::Banner),
            "watermark" | "wm" => Some(Self::Watermark),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Banner => "banner",
            Self::Watermark => "watermark",
        }
    }

    pub fn descriptor(&self) -> &'static TemplateDescriptor {
        match self {
            Self::Profile => &PROFILE,
            Self::Banner => &BANNER,
            Self::Watermark => &WATERMARK,
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown template: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Vector,
    Raster,
}

impl OutputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vector => "vector",
            Self::Raster => "raster",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Vector => SVG_MIME,
            Self::Raster => PNG_MIME,
        }
    }
}

pub const SVG_MIME: &str = "image/svg+xml;charset=utf-8";
pub const PNG_MIME: &str = "image/png";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDescriptor {
    pub id: TemplateId,
    pub name: &'static str,
    /// Intrinsic viewBox size.
    pub canvas_size: [u32; 2],
    /// Raster export size. Always the canvas size.
    pub export_size: [u32; 2],
    /// Scaled display size for on-screen previews.
    pub preview_size: [u32; 2],
    pub vector_filename: &'static str,
    pub raster_filename: &'static str,
    pub supports_guides: bool,
    /// Appended to the gradient id so ids stay distinct between templates
    /// rendered with the same render id.
    pub resource_suffix: &'static str,
}

impl TemplateDescriptor {
    pub fn all() -> [&'static TemplateDescriptor; 3] {
        [&PROFILE, &BANNER, &WATERMARK]
    }

    pub fn filename(&self, kind: OutputKind) -> &'static str {
        match kind {
            OutputKind::Vector => self.vector_filename,
            OutputKind::Raster => self.raster_filename,
        }
    }
}

pub static PROFILE: TemplateDescriptor = TemplateDescriptor {
    id: TemplateId::Profile,
    name: "Profile Image",
    canvas_size: [800, 800],
    export_size: [800, 800],
    preview_size: [400, 400],
    vector_filename: "profile.svg",
    raster_filename: "profile.png",
    supports_guides: false,
    resource_suffix: "",
};

pub static BANNER: TemplateDescriptor = TemplateDescriptor {
    id: TemplateId::Banner,
    name: "Channel Banner",
    canvas_size: [2048, 1152],
    export_size: [2048, 1152],
    preview_size: [820, 460],
    vector_filename: "banner.svg",
    raster_filename: "banner.png",
    supports_guides: true,
    resource_suffix: "-b",
};

pub static WATERMARK: TemplateDescriptor = TemplateDescriptor {
    id: TemplateId::Watermark,
    name: "Video Watermark",
    canvas_size: [300, 300],
    export_size: [300, 300],
    preview_size: [200, 200],
    vector_filename: "watermark.svg",
    raster_filename: "watermark.png",
    supports_guides: false,
    resource_suffix: "-w",
};

/// Banner safe area that stays visible on every device.
pub const BANNER_SAFE_AREA: [u32; 2] = [1235, 338];

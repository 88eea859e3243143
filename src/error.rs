//! Export Errors
//!
//! Every failure is scoped to a single export request. A missing target is
//! not an error and never appears here.

use thiserror::Error;

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Decode failed: {0}")]
    Decode(String),

    #[error("Encode failed: {0}")]
    Encode(String),

    #[error("Invalid raster size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ExportError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }
}

impl From<quick_xml::Error> for ExportError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        Self::Delivery(err.to_string())
    }
}

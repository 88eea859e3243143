//! Render identifiers
//!
//! Every render call receives its own `RenderId`. Resource ids inside the
//! document are derived from it, so two documents never collide when they
//! coexist in one SVG context.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderId(Uuid);

impl RenderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn gradient_id(&self, suffix: &str) -> String {
        format!("g-{}{}", self.0.simple(), suffix)
    }

    pub fn filter_id(&self, name: &str) -> String {
        format!("{}-{}", name, self.0.simple())
    }
}

impl Default for RenderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

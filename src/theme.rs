//! Theme - Current Branding Parameters
//!
//! Pure data. Colors are repaired on the way in, never rejected.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub const FALLBACK_COLOR: &str = "#000000";

/// A color as inserted into templates.
///
/// Normalization only guarantees the `#` prefix. The value is otherwise opaque:
/// a malformed color ends up in the document as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    pub fn normalize(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self(FALLBACK_COLOR.to_string());
        }
        if trimmed.starts_with('#') {
            Self(trimmed.to_string())
        } else {
            Self(format!("#{}", trimmed))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self(FALLBACK_COLOR.to_string())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Color {
    fn from(raw: &str) -> Self {
        Self::normalize(raw)
    }
}

impl From<String> for Color {
    fn from(raw: String) -> Self {
        Self::normalize(&raw)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Self::normalize(raw.as_deref().unwrap_or_default()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    #[serde(default = "default_primary")]
    pub primary_color: Color,
    #[serde(default = "default_secondary")]
    pub secondary_color: Color,
    #[serde(default = "default_background")]
    pub background_color: Color,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_subtitle")]
    pub subtitle: String,
    #[serde(default = "default_true")]
    pub show_guides: bool,
}

fn default_primary() -> Color { Color::normalize("#ff3d9a") }
fn default_secondary() -> Color { Color::normalize("#7a5cff") }
fn default_background() -> Color { Color::normalize("#0b0b10") }
fn default_title() -> String { "My Channel".to_string() }
fn default_subtitle() -> String { "Tagline for the channel".to_string() }
fn default_true() -> bool { true }

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_color: default_primary(),
            secondary_color: default_secondary(),
            background_color: default_background(),
            title: default_title(),
            subtitle: default_subtitle(),
            show_guides: true,
        }
    }
}

impl Theme {
    /// Two-stop gradient, primary first.
    pub fn gradient_stops(&self) -> [&Color; 2] {
        [&self.primary_color, &self.secondary_color]
    }

    /// Up to two uppercase initials taken from the title words.
    pub fn monogram(&self) -> String {
        self.title
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

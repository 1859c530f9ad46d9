//! Construction options shared by the mode facades.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// UI options passed at construction. Unknown keys are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiOptions {
    /// Zoom factor applied on top of the fit-to-width scale.
    pub zoom_level: f64,
    /// Vertical gap between stacked pages, in pixels.
    pub page_gap: f64,
    /// Show rulers around pages (designer only).
    pub has_rulers: bool,
    pub lang: String,
    /// Font configuration, passed through to plugins untouched.
    #[serde(skip_serializing_if = "Value::is_null")]
    pub font: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            zoom_level: 1.0,
            page_gap: 30.0,
            has_rulers: true,
            lang: "en".to_string(),
            font: Value::Null,
            extra: Map::new(),
        }
    }
}

impl UiOptions {
    /// Decode options from JSON, treating `null` as "all defaults".
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
    }

    /// Zoom level, falling back to 1.0 for non-positive or non-finite values.
    pub fn zoom(&self) -> f64 {
        if self.zoom_level.is_finite() && self.zoom_level > 0.0 {
            self.zoom_level
        } else {
            1.0
        }
    }
}

/// The host container the editor is mounted in, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub width: f64,
    pub height: f64,
}

impl Container {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

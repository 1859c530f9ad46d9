//! Renderer trait abstraction and scene types.

use formplate_core::inputs::InputRecord;
use formplate_core::layout::PaperLayout;
use formplate_core::plugin::{Mode, Visual};
use formplate_core::schema::{Schema, SchemaId};
use formplate_core::selection::SelectionState;
use kurbo::{Rect, Size};
use serde::Serialize;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Scene serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Where field values come from.
#[derive(Debug, Clone, Copy, Default)]
pub enum ValueSource<'a> {
    /// Every schema shows its own content.
    #[default]
    Content,
    /// Record `r` fills pages `r * pages_per_record .. (r + 1) * pages_per_record`.
    /// Missing values fall back to the schema content.
    Inputs {
        records: &'a [InputRecord],
        pages_per_record: usize,
    },
}

impl<'a> ValueSource<'a> {
    /// Record index for a layout page.
    pub fn record_index(&self, page: usize) -> usize {
        match *self {
            ValueSource::Content => 0,
            ValueSource::Inputs { pages_per_record, .. } => page / pages_per_record.max(1),
        }
    }

    /// Value shown for a schema on a layout page.
    pub fn value<'b>(&self, page: usize, schema: &'b Schema) -> &'b str
    where
        'a: 'b,
    {
        match *self {
            ValueSource::Content => &schema.content,
            ValueSource::Inputs { records, .. } => records
                .get(self.record_index(page))
                .and_then(|record| record.get(&schema.name))
                .map(String::as_str)
                .unwrap_or(&schema.content),
        }
    }
}

/// Context for a single render frame.
pub struct FrameContext<'a> {
    /// Pages to render.
    pub layout: &'a PaperLayout,
    pub mode: Mode,
    /// Zoom scale (canvas pixels per unscaled pixel).
    pub scale: f64,
    /// Gap between pages in pixels.
    pub page_gap: f64,
    pub values: ValueSource<'a>,
    /// Canvas selection (designer only).
    pub selection: Option<&'a SelectionState>,
    /// Marquee rectangle in canvas pixels.
    pub marquee: Option<Rect>,
}

impl<'a> FrameContext<'a> {
    /// Create a new frame context.
    pub fn new(layout: &'a PaperLayout, mode: Mode) -> Self {
        Self {
            layout,
            mode,
            scale: 1.0,
            page_gap: 0.0,
            values: ValueSource::Content,
            selection: None,
            marquee: None,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_page_gap(mut self, gap: f64) -> Self {
        self.page_gap = gap;
        self
    }

    pub fn with_values(mut self, values: ValueSource<'a>) -> Self {
        self.values = values;
        self
    }

    pub fn with_selection(mut self, selection: Option<&'a SelectionState>) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_marquee(mut self, marquee: Option<Rect>) -> Self {
        self.marquee = marquee;
        self
    }
}

/// One rendered field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneItem {
    /// Stable key: page and index on the page.
    pub key: String,
    /// Index of the schema on its page.
    pub index: usize,
    pub schema_id: SchemaId,
    pub schema_type: String,
    /// Field rectangle in canvas pixels.
    pub rect: Rect,
    pub visual: Visual,
    pub selected: bool,
    pub hovered: bool,
    pub editing: bool,
    /// Resize handle squares in canvas pixels.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub handles: Vec<Rect>,
}

/// One rendered page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageScene {
    pub index: usize,
    /// Unscaled page size in pixels.
    pub paper_size: Size,
    /// Page rectangle in canvas pixels.
    pub rect: Rect,
    pub background: String,
    pub items: Vec<SceneItem>,
}

/// A full frame: pages with their fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Scene {
    pub mode: Mode,
    pub scale: f64,
    pub pages: Vec<PageScene>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marquee: Option<Rect>,
}

impl Scene {
    /// Check if nothing was rendered.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Iterate all items in page order.
    pub fn items(&self) -> impl Iterator<Item = &SceneItem> {
        self.pages.iter().flat_map(|p| p.items.iter())
    }

    /// Find the first item rendered for a schema.
    pub fn item(&self, schema_id: &str) -> Option<&SceneItem> {
        self.items().find(|i| i.schema_id == schema_id)
    }

    /// Serialize the scene to JSON.
    pub fn to_json(&self) -> RenderResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Trait for rendering backends.
///
/// Implementations can paint to a GPU surface, a DOM, or keep a retained
/// scene for tests and tooling.
pub trait Renderer {
    /// Build the scene for a frame.
    fn build_scene(&mut self, ctx: &FrameContext<'_>);

    /// The last built scene.
    fn scene(&self) -> &Scene;
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    fn record(pairs: &[(&str, &str)]) -> InputRecord {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_value_source_content() {
        let schema = Schema::new("text", Point::ZERO, 1.0, 1.0).with_content("fallback");
        assert_eq!(ValueSource::Content.value(3, &schema), "fallback");
    }

    #[test]
    fn test_value_source_records_by_page() {
        let schema = Schema::new("text", Point::ZERO, 1.0, 1.0)
            .with_name("field1")
            .with_content("fallback");
        let records = vec![record(&[("field1", "a")]), record(&[("other", "b")])];
        let values = ValueSource::Inputs {
            records: &records,
            pages_per_record: 2,
        };

        assert_eq!(values.value(1, &schema), "a");
        assert_eq!(values.record_index(2), 1);
        assert_eq!(values.value(2, &schema), "fallback");
        assert_eq!(values.value(9, &schema), "fallback");
    }
}

//! Text field plugin.

use super::common_fields;
use formplate_core::plugin::{EditorKind, Mode, Plugin, PropertyField, RenderContext, Visual};
use formplate_core::schema::Schema;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use serde_json::json;

const DEFAULT_FONT_SIZE: f64 = 13.0;
const DEFAULT_LINE_HEIGHT: f64 = 1.0;
const DEFAULT_FONT_COLOR: &str = "#000000";

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    /// Get the wire name.
    pub fn name(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }

    /// Get all alignments.
    pub fn all() -> &'static [Alignment] {
        &[Alignment::Left, Alignment::Center, Alignment::Right]
    }

    /// Parse a wire name, falling back to left.
    pub fn parse(s: &str) -> Self {
        Self::all()
            .iter()
            .copied()
            .find(|a| a.name() == s)
            .unwrap_or_default()
    }
}

/// The built-in `text` plugin.
pub fn text_plugin() -> Plugin {
    let default_schema = Schema::new("text", Point::ZERO, 45.0, 10.0)
        .with_id("")
        .with_property("alignment", json!(Alignment::Left.name()))
        .with_property("fontSize", json!(DEFAULT_FONT_SIZE))
        .with_property("lineHeight", json!(DEFAULT_LINE_HEIGHT))
        .with_property("characterSpacing", json!(0.0))
        .with_property("fontColor", json!(DEFAULT_FONT_COLOR))
        .with_property("backgroundColor", json!(""));

    let alignments = Alignment::all().iter().map(|a| a.name().to_string()).collect();
    let mut panel = common_fields();
    panel.extend([
        PropertyField::new("alignment", "Text align", EditorKind::Select(alignments)),
        PropertyField::new("fontSize", "Font size", EditorKind::Number),
        PropertyField::new("lineHeight", "Line height", EditorKind::Number),
        PropertyField::new("characterSpacing", "Character spacing", EditorKind::Number),
        PropertyField::new("fontColor", "Font color", EditorKind::Color),
        PropertyField::new("backgroundColor", "Background", EditorKind::Color),
    ]);

    Plugin::new(default_schema, panel, render).with_label("Text")
}

fn render(ctx: &RenderContext<'_>) -> Visual {
    let schema = ctx.schema;

    if let Some(text) = ctx.input {
        ctx.on_change("content", json!(text));
        ctx.stop_editing();
    }

    let editable = match ctx.mode {
        Mode::Form => true,
        Mode::Designer => ctx.editing,
        Mode::Viewer => false,
    };
    let alignment = Alignment::parse(schema.string("alignment").unwrap_or_default());

    let mut visual = Visual::new("text");
    if let Some(font) = font_name(ctx) {
        visual = visual.with_attribute("fontName", json!(font));
    }
    visual
        .with_text(ctx.input.unwrap_or(ctx.value))
        .with_attribute("alignment", json!(alignment.name()))
        .with_attribute("fontSize", json!(schema.number("fontSize", DEFAULT_FONT_SIZE) * ctx.scale))
        .with_attribute("lineHeight", json!(schema.number("lineHeight", DEFAULT_LINE_HEIGHT)))
        .with_attribute("characterSpacing", json!(schema.number("characterSpacing", 0.0)))
        .with_attribute("fontColor", json!(schema.string("fontColor").unwrap_or(DEFAULT_FONT_COLOR)))
        .with_attribute("backgroundColor", json!(schema.string("backgroundColor").unwrap_or_default()))
        .editable(editable)
        .draggable(ctx.mode == Mode::Designer && !ctx.editing)
        .with_attribute("lang", json!(ctx.lang))
}

/// The schema's `fontName` if the host provides it, else the first host font.
fn font_name<'a>(ctx: &RenderContext<'a>) -> Option<&'a str> {
    let fonts = ctx.font.as_object()?;
    match ctx.schema.string("fontName") {
        Some(name) if fonts.contains_key(name) => Some(name),
        _ => fonts.keys().next().map(String::as_str),
    }
}

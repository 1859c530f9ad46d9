//! Built-in plugins.

mod image;
mod text;

pub use image::image_plugin;
pub use text::{Alignment, text_plugin};

use formplate_core::plugin::{EditorKind, PluginRegistry, PropertyField};

/// Panel entries every built-in type starts with.
pub(crate) fn common_fields() -> Vec<PropertyField> {
    vec![
        PropertyField::new("name", "Name", EditorKind::Text),
        PropertyField::new("position", "Position", EditorKind::Position),
        PropertyField::new("width", "Width", EditorKind::Number),
        PropertyField::new("height", "Height", EditorKind::Number),
    ]
}

/// Registry with the built-in `text` and `image` plugins.
///
/// Host plugins registered afterwards replace these by type.
pub fn builtin_plugins() -> PluginRegistry {
    PluginRegistry::new()
        .with("text", text_plugin())
        .with("image", image_plugin())
}

//! Plugin palette: the drag source for inserting new fields.

use formplate_core::canvas::DropPayload;
use formplate_core::plugin::PluginRegistry;
use serde::Serialize;

/// Data the host attaches to a drag started from the palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DragData {
    pub mime_type: &'static str,
    pub payload: String,
    pub effect: &'static str,
}

/// One palette entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaletteItem {
    pub plugin_type: String,
    pub label: String,
}

impl PaletteItem {
    /// Build the drag data for this entry.
    pub fn drag_data(&self) -> DragData {
        DragData {
            mime_type: "text/plain",
            payload: DropPayload::new(self.plugin_type.clone()).encode(),
            effect: "copy",
        }
    }
}

/// Lists the registered plugin types in registration order.
pub struct Palette;

impl Palette {
    pub fn items(registry: &PluginRegistry) -> Vec<PaletteItem> {
        registry
            .types()
            .filter_map(|t| {
                registry.get(t).map(|plugin| PaletteItem {
                    plugin_type: t.to_string(),
                    label: plugin.label.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formplate_render::builtin_plugins;

    #[test]
    fn test_items_and_payload() {
        let items = Palette::items(&builtin_plugins());
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].label, "Text");

        let data = items[0].drag_data();
        assert_eq!(data.mime_type, "text/plain");
        assert_eq!(data.effect, "copy");
        assert_eq!(DropPayload::decode(&data.payload).unwrap(), DropPayload::new("text"));
    }
}

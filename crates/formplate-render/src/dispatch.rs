//! Renderer dispatch: resolve a schema type to its plugin and invoke it.

use formplate_core::plugin::{Mode, PluginRegistry, PropertyChange, RenderContext, RenderFn, Visual};
use formplate_core::schema::{Schema, SchemaId};
use serde::Serialize;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// A field change reported by a plugin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaChange {
    pub id: SchemaId,
    pub key: String,
    pub value: Value,
}

/// Invokes plugin render functions and collects what they report.
///
/// Changes and stop-editing requests accumulate until taken, so a facade can
/// apply them after the frame is built.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Rc<PluginRegistry>,
    font: Value,
    lang: String,
    changes: RefCell<Vec<SchemaChange>>,
    stop_requested: Cell<bool>,
}

impl Dispatcher {
    pub fn new(registry: Rc<PluginRegistry>) -> Self {
        Self {
            registry,
            font: Value::Null,
            lang: "en".to_string(),
            changes: RefCell::new(Vec::new()),
            stop_requested: Cell::new(false),
        }
    }

    /// Font configuration handed to every plugin.
    pub fn with_font(mut self, font: Value) -> Self {
        self.font = font;
        self
    }

    /// UI language handed to every plugin.
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn registry(&self) -> &Rc<PluginRegistry> {
        &self.registry
    }

    /// Get the render function for a type, logging when none is registered.
    pub fn resolve(&self, schema_type: &str) -> Option<RenderFn> {
        let render = self.registry.get(schema_type).map(|plugin| plugin.render_fn());
        if render.is_none() {
            log::error!("Renderer for type {} not found", schema_type);
        }
        render
    }

    /// Render one schema. Unknown types render nothing.
    pub fn render_schema(&self, schema: &Schema, value: &str, mode: Mode, scale: f64, editing: bool) -> Visual {
        self.invoke(schema, value, mode, scale, editing, None)
    }

    /// Commit text typed into a schema's in-place editor.
    ///
    /// The plugin decides what to report through `on_change`.
    pub fn input(&self, schema: &Schema, value: &str, mode: Mode, text: &str) -> Visual {
        self.invoke(schema, value, mode, 1.0, true, Some(text))
    }

    /// Drain the changes reported since the last call.
    pub fn take_changes(&self) -> Vec<SchemaChange> {
        std::mem::take(&mut *self.changes.borrow_mut())
    }

    /// Check and clear whether a plugin asked to stop editing.
    pub fn take_stop_editing(&self) -> bool {
        self.stop_requested.replace(false)
    }

    fn invoke(&self, schema: &Schema, value: &str, mode: Mode, scale: f64, editing: bool, input: Option<&str>) -> Visual {
        let Some(render) = self.resolve(&schema.schema_type) else {
            return Visual::empty();
        };

        let on_change = |change: PropertyChange| {
            self.changes.borrow_mut().push(SchemaChange {
                id: schema.id.clone(),
                key: change.key,
                value: change.value,
            });
        };
        let stop_editing = || self.stop_requested.set(true);

        let ctx = RenderContext::new(schema, value, mode, &on_change, &stop_editing)
            .with_scale(scale)
            .with_editing(editing)
            .with_input(input)
            .with_font(&self.font)
            .with_lang(&self.lang);
        render(&ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formplate_core::plugin::{EditorKind, Plugin, PropertyField};
    use formplate_core::testing::{capture_logs, sample_registry, take_errors};
    use kurbo::Point;
    use serde_json::json;

    fn schema(schema_type: &str) -> Schema {
        Schema::new(schema_type, Point::ZERO, 10.0, 10.0).with_id("s1")
    }

    #[test]
    fn test_render_registered_type() {
        let dispatcher = Dispatcher::new(Rc::new(sample_registry()));
        let visual = dispatcher.render_schema(&schema("text"), "hello", Mode::Viewer, 1.0, false);
        assert_eq!(visual.element, "text");
        assert_eq!(visual.text.as_deref(), Some("hello"));
    }

    #[test]
    fn test_unknown_type_logs_and_renders_nothing() {
        capture_logs();
        let dispatcher = Dispatcher::new(Rc::new(sample_registry()));

        let visual = dispatcher.render_schema(&schema("nonexistent-type"), "", Mode::Designer, 1.0, false);

        assert!(visual.is_empty());
        assert_eq!(take_errors(), vec!["Renderer for type nonexistent-type not found".to_string()]);
    }

    #[test]
    fn test_plugins_receive_font_and_lang() {
        let locale = Plugin::new(Schema::new("locale", Point::ZERO, 1.0, 1.0), Vec::new(), |ctx| {
            Visual::new("locale")
                .with_attribute("font", ctx.font.clone())
                .with_attribute("lang", json!(ctx.lang))
        });
        let registry = Rc::new(PluginRegistry::new().with("locale", locale));

        let visual = Dispatcher::new(Rc::clone(&registry)).render_schema(&schema("locale"), "", Mode::Form, 1.0, false);
        assert_eq!(visual.attributes["font"], Value::Null);
        assert_eq!(visual.attributes["lang"], json!("en"));

        let dispatcher = Dispatcher::new(registry)
            .with_font(json!({ "Roboto": { "fallback": true } }))
            .with_lang("ja");
        let visual = dispatcher.render_schema(&schema("locale"), "", Mode::Form, 1.0, false);
        assert_eq!(visual.attributes["font"]["Roboto"]["fallback"], json!(true));
        assert_eq!(visual.attributes["lang"], json!("ja"));
    }

    #[test]
    fn test_plugin_reports_changes() {
        let echo = Plugin::new(
            Schema::new("echo", Point::ZERO, 1.0, 1.0),
            vec![PropertyField::new("content", "Content", EditorKind::Text)],
            |ctx| {
                if let Some(text) = ctx.input {
                    ctx.on_change("content", json!(text));
                    ctx.stop_editing();
                }
                Visual::new("echo")
            },
        );
        let registry = PluginRegistry::new().with("echo", echo);
        let dispatcher = Dispatcher::new(Rc::new(registry));

        dispatcher.render_schema(&schema("echo"), "", Mode::Designer, 1.0, false);
        assert!(dispatcher.take_changes().is_empty());
        assert!(!dispatcher.take_stop_editing());

        dispatcher.input(&schema("echo"), "", Mode::Designer, "typed");
        assert_eq!(
            dispatcher.take_changes(),
            vec![SchemaChange {
                id: "s1".into(),
                key: "content".into(),
                value: json!("typed")
            }]
        );
        assert!(dispatcher.take_stop_editing());
        assert!(!dispatcher.take_stop_editing());
    }
}

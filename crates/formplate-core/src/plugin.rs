//! Plugin registry: maps a schema type to its default shape, property panel
//! and render function.

use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Editable, draggable layout editing.
    #[default]
    Designer,
    /// Value editing only; fields stay in place.
    Form,
    /// Read-only preview.
    Viewer,
}

impl Mode {
    /// Get the wire name of this mode.
    pub fn name(self) -> &'static str {
        match self {
            Mode::Designer => "designer",
            Mode::Form => "form",
            Mode::Viewer => "viewer",
        }
    }
}

/// Kind of editor used for a property in the sidebar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "options", rename_all = "lowercase")]
pub enum EditorKind {
    Text,
    TextArea,
    Number,
    Position,
    Color,
    Select(Vec<String>),
    Toggle,
}

/// One entry of a plugin's property panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyField {
    pub key: String,
    pub label: String,
    pub editor: EditorKind,
}

impl PropertyField {
    pub fn new(key: impl Into<String>, label: impl Into<String>, editor: EditorKind) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            editor,
        }
    }
}

/// A single-field change emitted by a plugin or the sidebar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyChange {
    pub key: String,
    pub value: Value,
}

/// Toolkit-neutral description of one rendered field.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Visual {
    /// Element kind (e.g. "text", "image"); empty for no output.
    pub element: String,
    /// Text content, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Presentation attributes.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    /// Whether the value can be edited in place.
    pub editable: bool,
    /// Whether the field can be dragged.
    pub draggable: bool,
}

impl Visual {
    /// Create a visual for the given element kind.
    pub fn new(element: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            ..Self::default()
        }
    }

    /// No output.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if this visual renders nothing.
    pub fn is_empty(&self) -> bool {
        self.element.is_empty()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn draggable(mut self, draggable: bool) -> Self {
        self.draggable = draggable;
        self
    }
}

static NO_FONT: Value = Value::Null;

/// Context passed to a plugin's render function.
pub struct RenderContext<'a> {
    /// The schema being rendered.
    pub schema: &'a Schema,
    /// Current value (input value in form/viewer, content in designer).
    pub value: &'a str,
    /// Rendering mode.
    pub mode: Mode,
    /// Pixels per millimeter times zoom.
    pub scale: f64,
    /// Whether this schema is being edited in place.
    pub editing: bool,
    /// Text the user typed into the in-place editor, to be committed.
    pub input: Option<&'a str>,
    /// Host font configuration, as given in the options. `null` when unset.
    pub font: &'a Value,
    /// UI language code.
    pub lang: &'a str,
    on_change: &'a dyn Fn(PropertyChange),
    stop_editing: &'a dyn Fn(),
}

impl<'a> RenderContext<'a> {
    /// Create a render context.
    pub fn new(
        schema: &'a Schema,
        value: &'a str,
        mode: Mode,
        on_change: &'a dyn Fn(PropertyChange),
        stop_editing: &'a dyn Fn(),
    ) -> Self {
        Self {
            schema,
            value,
            mode,
            scale: 1.0,
            editing: false,
            input: None,
            font: &NO_FONT,
            lang: "en",
            on_change,
            stop_editing,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_editing(mut self, editing: bool) -> Self {
        self.editing = editing;
        self
    }

    pub fn with_input(mut self, input: Option<&'a str>) -> Self {
        self.input = input;
        self
    }

    pub fn with_font(mut self, font: &'a Value) -> Self {
        self.font = font;
        self
    }

    pub fn with_lang(mut self, lang: &'a str) -> Self {
        self.lang = lang;
        self
    }

    /// Report a change of one schema field.
    pub fn on_change(&self, key: impl Into<String>, value: Value) {
        (self.on_change)(PropertyChange {
            key: key.into(),
            value,
        });
    }

    /// Leave in-place editing.
    pub fn stop_editing(&self) {
        (self.stop_editing)();
    }
}

/// Render function of a plugin. The same function serves every mode.
pub type RenderFn = Rc<dyn Fn(&RenderContext<'_>) -> Visual>;

/// Registered behavior for a schema type.
#[derive(Clone)]
pub struct Plugin {
    /// Template used when a new schema of this type is inserted.
    pub default_schema: Schema,
    /// Ordered property panel.
    pub property_panel: Vec<PropertyField>,
    /// Display label for palettes.
    pub label: String,
    render: RenderFn,
}

impl Plugin {
    /// Create a plugin from its parts.
    pub fn new(
        default_schema: Schema,
        property_panel: Vec<PropertyField>,
        render: impl Fn(&RenderContext<'_>) -> Visual + 'static,
    ) -> Self {
        let label = default_schema.schema_type.clone();
        Self {
            default_schema,
            property_panel,
            label,
            render: Rc::new(render),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Invoke the render function.
    pub fn render(&self, ctx: &RenderContext<'_>) -> Visual {
        (self.render)(ctx)
    }

    /// Get a handle to the render function.
    pub fn render_fn(&self) -> RenderFn {
        Rc::clone(&self.render)
    }

    /// Check whether the panel exposes a key.
    pub fn has_property(&self, key: &str) -> bool {
        self.property_panel.iter().any(|f| f.key == key)
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("type", &self.default_schema.schema_type)
            .field("label", &self.label)
            .field("property_panel", &self.property_panel)
            .finish_non_exhaustive()
    }
}

/// Lookup table from schema type to plugin, in registration order.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, Plugin>,
    order: Vec<String>,
}

impl PluginRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin. A later registration for the same type replaces
    /// the earlier one and keeps its position.
    pub fn register(&mut self, schema_type: impl Into<String>, plugin: Plugin) -> Option<Plugin> {
        let schema_type = schema_type.into();
        let previous = self.plugins.insert(schema_type.clone(), plugin);
        if previous.is_some() {
            log::debug!("Plugin for type {} replaced", schema_type);
        } else {
            self.order.push(schema_type);
        }
        previous
    }

    /// Builder-style registration.
    pub fn with(mut self, schema_type: impl Into<String>, plugin: Plugin) -> Self {
        self.register(schema_type, plugin);
        self
    }

    /// Register every plugin of `other`, replacing existing types.
    pub fn extend(&mut self, other: PluginRegistry) {
        let PluginRegistry { mut plugins, order } = other;
        for schema_type in order {
            if let Some(plugin) = plugins.remove(&schema_type) {
                self.register(schema_type, plugin);
            }
        }
    }

    /// Look up a plugin by type.
    pub fn get(&self, schema_type: &str) -> Option<&Plugin> {
        self.plugins.get(schema_type)
    }

    /// Check if a type is registered.
    pub fn contains(&self, schema_type: &str) -> bool {
        self.plugins.contains_key(schema_type)
    }

    /// Registered types in registration order.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_plugin;
    use kurbo::Point;
    use std::cell::RefCell;

    #[test]
    fn test_register_and_lookup() {
        let registry = PluginRegistry::new()
            .with("text", sample_plugin("text"))
            .with("image", sample_plugin("image"));

        assert!(registry.contains("text"));
        assert!(!registry.contains("barcode"));
        assert_eq!(registry.types().collect::<Vec<_>>(), vec!["text", "image"]);
    }

    #[test]
    fn test_later_registration_replaces() {
        let mut registry = PluginRegistry::new().with("text", sample_plugin("text"));
        let custom = sample_plugin("text").with_label("Custom text");
        let previous = registry.register("text", custom);

        assert!(previous.is_some());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("text").unwrap().label, "Custom text");
    }

    #[test]
    fn test_extend_overrides_in_place() {
        let mut registry = PluginRegistry::new()
            .with("text", sample_plugin("text"))
            .with("image", sample_plugin("image"));
        registry.extend(
            PluginRegistry::new()
                .with("image", sample_plugin("image").with_label("Photo"))
                .with("signature", sample_plugin("signature")),
        );

        assert_eq!(
            registry.types().collect::<Vec<_>>(),
            vec!["text", "image", "signature"]
        );
        assert_eq!(registry.get("image").unwrap().label, "Photo");
    }

    #[test]
    fn test_render_context_callbacks() {
        let changes = RefCell::new(Vec::new());
        let stopped = RefCell::new(0);
        let on_change = |c: PropertyChange| changes.borrow_mut().push(c);
        let stop = || *stopped.borrow_mut() += 1;

        let schema = Schema::new("text", Point::ZERO, 10.0, 10.0);
        let ctx = RenderContext::new(&schema, "v", Mode::Form, &on_change, &stop);
        ctx.on_change("content", Value::from("new"));
        ctx.stop_editing();

        assert_eq!(changes.borrow()[0].key, "content");
        assert_eq!(*stopped.borrow(), 1);
    }

    #[test]
    fn test_visual_builder() {
        let visual = Visual::new("text").with_text("hi").editable(true);
        assert!(!visual.is_empty());
        assert!(Visual::empty().is_empty());
        assert_eq!(visual.text.as_deref(), Some("hi"));
    }
}

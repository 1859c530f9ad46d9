//! Property sidebar.
//!
//! With nothing selected it lists the fields of the current page; with a
//! selection it is an editable form over the selected schemas. Edits go
//! through [`TemplateStore::update_schema`], the same path the canvas uses.

use crate::plugin::{EditorKind, PluginRegistry};
use crate::schema::{SchemaError, SchemaId};
use crate::store::{MutationReport, TemplateStore};
use crate::template::Template;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

/// Sidebar edit errors.
#[derive(Debug, Error, PartialEq)]
pub enum SidebarError {
    #[error("Nothing is selected")]
    EmptySelection,
    #[error("Property '{0}' is not shared by the selection")]
    UnknownField(String),
    #[error("Name '{0}' is already used by another field")]
    DuplicateName(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Coordinate axis for position edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// One editable field of the panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelField {
    pub key: String,
    pub label: String,
    pub editor: EditorKind,
    /// Current value when every selected schema agrees.
    pub value: Option<Value>,
}

/// One row of the field list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListEntry {
    pub id: SchemaId,
    pub name: String,
    #[serde(rename = "type")]
    pub schema_type: String,
    /// Whether the registry can render this type.
    pub known: bool,
}

/// What the sidebar shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", content = "items", rename_all = "lowercase")]
pub enum SidebarView {
    /// Fields of the current page, back to front.
    List(Vec<ListEntry>),
    /// Property panel of the selection.
    Detail(Vec<PanelField>),
}

/// Property panel for the current selection.
#[derive(Debug, Clone, Default)]
pub struct Sidebar {
    fields: Vec<PanelField>,
}

impl Sidebar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fields of the last refresh.
    pub fn fields(&self) -> &[PanelField] {
        &self.fields
    }

    /// Rebuild the panel for a selection.
    pub fn refresh(&mut self, template: &Template, registry: &PluginRegistry, selection: &[SchemaId]) {
        self.fields = Self::build(template, registry, selection);
    }

    /// List mode when nothing is selected, detail mode otherwise.
    pub fn view(template: &Template, registry: &PluginRegistry, page: usize, selection: &[SchemaId]) -> SidebarView {
        let selected = selection.iter().any(|id| template.contains_id(id));
        if selected {
            SidebarView::Detail(Self::build(template, registry, selection))
        } else {
            SidebarView::List(Self::list(template, registry, page))
        }
    }

    /// Fields of one page in z-order.
    pub fn list(template: &Template, registry: &PluginRegistry, page: usize) -> Vec<ListEntry> {
        template
            .schemas
            .get(page)
            .into_iter()
            .flatten()
            .map(|s| ListEntry {
                id: s.id.clone(),
                name: s.name.clone(),
                schema_type: s.schema_type.clone(),
                known: registry.contains(&s.schema_type),
            })
            .collect()
    }

    /// Compute the panel for a selection.
    ///
    /// Only keys present in every selected type's panel are listed, in the
    /// order of the first selected schema's panel.
    pub fn build(template: &Template, registry: &PluginRegistry, selection: &[SchemaId]) -> Vec<PanelField> {
        let schemas: Vec<_> = selection.iter().filter_map(|id| template.get(id)).collect();
        let Some(first) = schemas.first() else {
            return Vec::new();
        };
        let Some(plugin) = registry.get(&first.schema_type) else {
            return Vec::new();
        };

        plugin
            .property_panel
            .iter()
            .filter(|field| {
                schemas.iter().all(|s| {
                    registry
                        .get(&s.schema_type)
                        .is_some_and(|p| p.has_property(&field.key))
                })
            })
            .map(|field| {
                let value = first.field(&field.key);
                let shared = schemas.iter().all(|s| s.field(&field.key) == value);
                PanelField {
                    key: field.key.clone(),
                    label: field.label.clone(),
                    editor: field.editor.clone(),
                    value: if shared { value } else { None },
                }
            })
            .collect()
    }

    /// Apply an edit of `key` to every selected schema, as one batch.
    ///
    /// Returns the updates that changed something.
    pub fn edit(
        &mut self,
        store: &mut TemplateStore,
        selection: &[SchemaId],
        key: &str,
        value: Value,
    ) -> Result<Vec<MutationReport>, SidebarError> {
        let ids = self.check(store, selection, key)?;
        if key == "name" {
            check_name(store.template(), &ids, &value)?;
        }
        let reports = store.batch(|store| {
            let mut reports = Vec::new();
            for id in &ids {
                if store.update_schema(id, key, value.clone())? {
                    reports.push(MutationReport::Update {
                        id: id.clone(),
                        key: key.to_string(),
                        value: value.clone(),
                    });
                }
            }
            Ok::<_, SidebarError>(reports)
        })?;
        self.refresh(store.template(), store.registry(), selection);
        Ok(reports)
    }

    /// Set one coordinate of `position`, keeping the other per schema.
    pub fn edit_position_axis(
        &mut self,
        store: &mut TemplateStore,
        selection: &[SchemaId],
        axis: Axis,
        value: f64,
    ) -> Result<Vec<MutationReport>, SidebarError> {
        let ids = self.check(store, selection, "position")?;
        let reports = store.batch(|store| {
            let mut reports = Vec::new();
            for id in &ids {
                let Some(current) = store.template().get(id).map(|s| s.position) else {
                    continue;
                };
                let (x, y) = match axis {
                    Axis::X => (value, current.y),
                    Axis::Y => (current.x, value),
                };
                let position = json!({ "x": x, "y": y });
                if store.update_schema(id, "position", position.clone())? {
                    reports.push(MutationReport::Update {
                        id: id.clone(),
                        key: "position".to_string(),
                        value: position,
                    });
                }
            }
            Ok::<_, SidebarError>(reports)
        })?;
        self.refresh(store.template(), store.registry(), selection);
        Ok(reports)
    }

    fn check(&self, store: &TemplateStore, selection: &[SchemaId], key: &str) -> Result<Vec<SchemaId>, SidebarError> {
        let ids: Vec<SchemaId> = selection
            .iter()
            .filter(|id| store.template().contains_id(id))
            .cloned()
            .collect();
        if ids.is_empty() {
            return Err(SidebarError::EmptySelection);
        }
        let fields = Self::build(store.template(), store.registry(), &ids);
        if !fields.iter().any(|f| f.key == key) {
            return Err(SidebarError::UnknownField(key.to_string()));
        }
        Ok(ids)
    }
}

/// Input records are keyed by name, so names must stay unique.
fn check_name(template: &Template, ids: &[SchemaId], value: &Value) -> Result<(), SidebarError> {
    let Some(name) = value.as_str() else {
        return Ok(());
    };
    let taken = ids.len() > 1 || template.iter().any(|s| s.name == name && !ids.contains(&s.id));
    if taken {
        return Err(SidebarError::DuplicateName(name.to_string()));
    }
    Ok(())
}

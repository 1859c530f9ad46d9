//! Transient selection state for the canvas.
//!
//! Nothing here is part of the template. Schemas stay pure data; the canvas
//! keeps which of them are selected, hovered or edited in place.

mod handles;

pub use handles::{
    Corner, Edge, HANDLE_HIT_TOLERANCE, HANDLE_SIZE, Handle, HandleKind, MIN_SIZE_MM, handles_for,
    hit_test_handles, resize_bounds,
};

use crate::schema::SchemaId;

/// The UI state of one schema on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldState {
    #[default]
    Normal,
    Hovered,
    Selected,
    /// Selected and edited in place.
    Editing,
}

impl FieldState {
    pub fn is_selected(self) -> bool {
        matches!(self, Self::Selected | Self::Editing)
    }
}

/// Selection set (in selection order), hover and in-place editing target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    active: Vec<SchemaId>,
    hovering: Option<SchemaId>,
    editing: Option<SchemaId>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected IDs in the order they were selected.
    pub fn active(&self) -> &[SchemaId] {
        &self.active
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.active.iter().any(|a| a == id)
    }

    /// Replace the selection with a single schema.
    pub fn select(&mut self, id: impl Into<SchemaId>) {
        self.clear();
        self.active.push(id.into());
    }

    /// Replace the selection with a list of schemas (duplicates dropped).
    pub fn select_many(&mut self, ids: impl IntoIterator<Item = SchemaId>) {
        self.clear();
        for id in ids {
            self.add(id);
        }
    }

    /// Add a schema to the selection.
    pub fn add(&mut self, id: impl Into<SchemaId>) {
        let id = id.into();
        if !self.is_selected(&id) {
            self.active.push(id);
        }
    }

    /// Remove a schema from the selection.
    pub fn deselect(&mut self, id: &str) {
        self.active.retain(|a| a != id);
        if self.editing.as_deref() == Some(id) {
            self.editing = None;
        }
    }

    /// Add the schema if absent, remove it if present.
    pub fn toggle(&mut self, id: &str) {
        if self.is_selected(id) {
            self.deselect(id);
        } else {
            self.active.push(id.to_string());
        }
    }

    /// Clear the selection and leave editing.
    pub fn clear(&mut self) {
        self.active.clear();
        self.editing = None;
    }

    pub fn hovering(&self) -> Option<&str> {
        self.hovering.as_deref()
    }

    /// Set the hovered schema. Returns true if it changed.
    pub fn set_hovering(&mut self, id: Option<SchemaId>) -> bool {
        if self.hovering == id {
            return false;
        }
        self.hovering = id;
        true
    }

    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    /// Enter in-place editing; the schema becomes the only selection.
    pub fn enter_editing(&mut self, id: impl Into<SchemaId>) {
        let id = id.into();
        self.select(id.clone());
        self.editing = Some(id);
    }

    /// Leave in-place editing, keeping the selection.
    pub fn exit_editing(&mut self) -> bool {
        self.editing.take().is_some()
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Combined state of one schema.
    pub fn state(&self, id: &str) -> FieldState {
        if self.editing.as_deref() == Some(id) {
            FieldState::Editing
        } else if self.is_selected(id) {
            FieldState::Selected
        } else if self.hovering.as_deref() == Some(id) {
            FieldState::Hovered
        } else {
            FieldState::Normal
        }
    }

    /// Drop IDs that no longer exist.
    ///
    /// Returns true if the selection changed.
    pub fn retain(&mut self, mut exists: impl FnMut(&str) -> bool) -> bool {
        let before = self.active.len();
        self.active.retain(|id| exists(id));
        if self.editing.as_deref().is_some_and(|id| !exists(id)) {
            self.editing = None;
        }
        if self.hovering.as_deref().is_some_and(|id| !exists(id)) {
            self.hovering = None;
        }
        self.active.len() != before
    }

    /// Reset everything, including hover.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

//! Canvas controller: turns pointer, keyboard and drop events into
//! selection changes and template mutations.
//!
//! The controller never edits a template directly. Every change goes through
//! [`TemplateStore`], and every handler returns the [`CanvasAction`]s the host
//! should relay.

use crate::input::{InputState, KeyEvent, Modifiers, MouseButton, PointerEvent};
use crate::layout::{MM_TO_PX, PaperFrame, frame_at};
use crate::schema::{Schema, SchemaId};
use crate::selection::{HANDLE_HIT_TOLERANCE, HandleKind, SelectionState, hit_test_handles, resize_bounds};
use crate::store::{MutationReport, TemplateStore};
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::rc::Rc;

/// Marquee drags shorter than this (pixels) count as a click.
const MARQUEE_THRESHOLD: f64 = 2.0;
/// Arrow-key nudge in millimeters.
const NUDGE_MM: f64 = 1.0;
/// Arrow-key nudge with Shift held.
const FINE_NUDGE_MM: f64 = 0.1;

/// Something the host should relay after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasAction {
    /// Selection changed; `None` when it became empty.
    Select(Option<Vec<SchemaId>>),
    /// The template changed.
    Change(MutationReport),
    /// Schemas were deleted.
    Delete(Vec<SchemaId>),
    /// Hovered schema changed.
    Hover(Option<SchemaId>),
    /// In-place editing started for a schema.
    EditStart(SchemaId),
    /// In-place editing ended.
    EditStop,
}

/// Drag-and-drop payload: serialized `{"type": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropPayload {
    #[serde(rename = "type")]
    pub plugin_type: String,
}

impl DropPayload {
    pub fn new(plugin_type: impl Into<String>) -> Self {
        Self {
            plugin_type: plugin_type.into(),
        }
    }

    /// Decode the drop text.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Encode as drop text.
    pub fn encode(&self) -> String {
        json!({ "type": self.plugin_type }).to_string()
    }
}

/// A decoded external insertion: plugin type plus pointer position in canvas
/// pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertionDescriptor {
    pub plugin_type: String,
    pub pointer: Point,
}

impl InsertionDescriptor {
    pub fn new(plugin_type: impl Into<String>, pointer: Point) -> Self {
        Self {
            plugin_type: plugin_type.into(),
            pointer,
        }
    }

    /// Build a descriptor from raw drop text.
    pub fn from_drop(text: &str, pointer: Point) -> Result<Self, serde_json::Error> {
        let payload = DropPayload::decode(text)?;
        Ok(Self::new(payload.plugin_type, pointer))
    }
}

/// Schemas being moved, with their positions when the drag started.
///
/// The pointer travel comes from [`InputState::drag_delta`].
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    pub origins: Vec<(SchemaId, usize, Point)>,
}

/// A resize handle being dragged.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeState {
    pub id: SchemaId,
    pub page: usize,
    pub handle: HandleKind,
    pub original: Rect,
}

/// Canvas interaction state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CanvasState {
    #[default]
    Idle,
    /// Rubber-band selection, in canvas pixels.
    Selecting { page: usize, start: Point, current: Point },
    Selected,
    Dragging(DragState),
    Resizing(ResizeState),
}

impl CanvasState {
    /// Check whether a gesture holds a store batch open.
    fn in_gesture(&self) -> bool {
        matches!(self, CanvasState::Dragging(_) | CanvasState::Resizing(_))
    }
}

/// Interprets events against the current page layout.
#[derive(Debug, Clone, Default)]
pub struct CanvasController {
    pub input: InputState,
    pub selection: SelectionState,
    state: CanvasState,
    frames: Vec<PaperFrame>,
    page_cursor: usize,
}

impl CanvasController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CanvasState {
        &self.state
    }

    /// Install the page frames of the current layout.
    pub fn set_frames(&mut self, frames: Vec<PaperFrame>) {
        self.frames = frames;
        if self.page_cursor >= self.frames.len() {
            self.page_cursor = self.frames.len().saturating_sub(1);
        }
    }

    pub fn frames(&self) -> &[PaperFrame] {
        &self.frames
    }

    /// Page the user is working on.
    pub fn page_cursor(&self) -> usize {
        self.page_cursor
    }

    pub fn set_page_cursor(&mut self, page: usize) {
        self.page_cursor = page.min(self.frames.len().saturating_sub(1));
    }

    /// Marquee rectangle in canvas pixels, while selecting.
    pub fn marquee(&self) -> Option<Rect> {
        match self.state {
            CanvasState::Selecting { start, current, .. } => Some(Rect::from_points(start, current)),
            _ => None,
        }
    }

    /// Abort any gesture and clear all transient state.
    pub fn reset(&mut self, store: &mut TemplateStore) {
        if self.state.in_gesture() {
            store.end_batch();
        }
        self.state = CanvasState::Idle;
        self.selection.reset();
        self.input.reset();
    }

    /// Drop selection entries whose schemas no longer exist.
    pub fn sync(&mut self, store: &TemplateStore) -> Vec<CanvasAction> {
        let template = store.template();
        if self.selection.retain(|id| template.contains_id(id)) {
            return vec![self.selection_action()];
        }
        Vec::new()
    }

    /// Dispatch a pointer event.
    pub fn handle_pointer(&mut self, store: &mut TemplateStore, event: &PointerEvent, modifiers: Modifiers) -> Vec<CanvasAction> {
        self.input.set_modifiers(modifiers);
        self.input.handle_pointer_event(event);
        match *event {
            PointerEvent::Down { position, button } => self.pointer_down(store, position, button),
            PointerEvent::Move { position } => self.pointer_move(store, position),
            PointerEvent::Up { position, button } => self.pointer_up(store, position, button),
            PointerEvent::Leave => self.pointer_leave(store),
        }
    }

    /// Dispatch a key event.
    pub fn handle_key(&mut self, store: &mut TemplateStore, event: &KeyEvent, modifiers: Modifiers) -> Vec<CanvasAction> {
        self.input.set_modifiers(modifiers);
        match event {
            KeyEvent::Pressed(key) => self.key_down(store, key),
            KeyEvent::Released(_) => Vec::new(),
        }
    }

    fn pointer_down(&mut self, store: &mut TemplateStore, position: Point, button: MouseButton) -> Vec<CanvasAction> {
        let mut actions = Vec::new();
        if button != MouseButton::Left {
            return actions;
        }
        if self.state.in_gesture() {
            store.end_batch();
            self.state = CanvasState::Selected;
        }

        let Some(frame) = frame_at(&self.frames, position).copied() else {
            self.stop_editing(&mut actions);
            self.clear_selection(&mut actions);
            return actions;
        };
        self.page_cursor = frame.index;
        let point = frame.to_mm(position);
        let template = Rc::clone(store.template());

        if let Some(editing) = self.selection.editing() {
            if template.get(editing).is_some_and(|s| s.hit_test(point, 0.0)) {
                return actions;
            }
            self.stop_editing(&mut actions);
        }

        if let Some(resize) = self.handle_under(&template, &frame, point) {
            store.begin_batch();
            self.state = CanvasState::Resizing(resize);
            return actions;
        }

        let hit = template.schemas_at_point(frame.index, point, 0.0).into_iter().next();
        let Some(id) = hit else {
            if !self.input.modifiers.toggles_selection() {
                self.clear_selection(&mut actions);
            }
            self.state = CanvasState::Selecting {
                page: frame.index,
                start: position,
                current: position,
            };
            return actions;
        };

        if self.input.is_double_click() {
            self.selection.enter_editing(id.clone());
            self.state = CanvasState::Selected;
            actions.push(CanvasAction::Select(Some(vec![id.clone()])));
            actions.push(CanvasAction::EditStart(id));
            return actions;
        }

        if self.input.modifiers.toggles_selection() {
            self.selection.toggle(&id);
            self.state = if self.selection.is_empty() {
                CanvasState::Idle
            } else {
                CanvasState::Selected
            };
            actions.push(self.selection_action());
            return actions;
        }

        if !self.selection.is_selected(&id) {
            self.selection.select(id);
            actions.push(self.selection_action());
        }

        let origins = self
            .selection
            .active()
            .iter()
            .filter_map(|id| {
                let (page, index) = template.locate(id)?;
                Some((id.clone(), page, template.schemas[page][index].position))
            })
            .collect();
        store.begin_batch();
        self.state = CanvasState::Dragging(DragState { origins });
        actions
    }

    fn pointer_move(&mut self, store: &mut TemplateStore, position: Point) -> Vec<CanvasAction> {
        let mut actions = Vec::new();
        let travel = self.input.drag_delta().unwrap_or(Vec2::ZERO);
        match self.state.clone() {
            CanvasState::Idle | CanvasState::Selected => {
                let hovered = frame_at(&self.frames, position).and_then(|frame| {
                    let point = frame.to_mm(position);
                    store
                        .template()
                        .schemas_at_point(frame.index, point, 0.0)
                        .into_iter()
                        .next()
                });
                if self.selection.set_hovering(hovered.clone()) {
                    actions.push(CanvasAction::Hover(hovered));
                }
            }
            CanvasState::Selecting { page, start, .. } => {
                self.state = CanvasState::Selecting {
                    page,
                    start,
                    current: position,
                };
            }
            CanvasState::Dragging(drag) => {
                for (id, page, origin) in &drag.origins {
                    let Some(frame) = self.frames.get(*page).copied() else {
                        continue;
                    };
                    let delta = frame.delta_to_mm(travel);
                    let Some(schema) = store.template().get(id) else {
                        continue;
                    };
                    let target = clamp_to_page(*origin + delta, schema.size(), page_size_mm(&frame));
                    update(store, id, "position", point_value(target), &mut actions);
                }
            }
            CanvasState::Resizing(resize) => {
                if let Some(frame) = self.frames.get(resize.page).copied() {
                    let delta = frame.delta_to_mm(travel);
                    let rect = resize_bounds(resize.original, resize.handle, delta);
                    update(store, &resize.id, "position", point_value(rect.origin()), &mut actions);
                    update(store, &resize.id, "width", json!(rect.width()), &mut actions);
                    update(store, &resize.id, "height", json!(rect.height()), &mut actions);
                }
            }
        }
        actions
    }

    fn pointer_up(&mut self, store: &mut TemplateStore, position: Point, button: MouseButton) -> Vec<CanvasAction> {
        let mut actions = Vec::new();
        if button != MouseButton::Left {
            return actions;
        }
        match std::mem::take(&mut self.state) {
            CanvasState::Dragging(_) | CanvasState::Resizing(_) => {
                store.end_batch();
                self.state = CanvasState::Selected;
            }
            CanvasState::Selecting { page, start, .. } => {
                let frame = self.frames.get(page).copied();
                if let Some(frame) = frame.filter(|_| (position - start).hypot() >= MARQUEE_THRESHOLD) {
                    let rect = Rect::from_points(frame.to_mm(start), frame.to_mm(position));
                    let ids = store.template().schemas_in_rect(page, rect);
                    if self.input.modifiers.toggles_selection() {
                        for id in ids {
                            self.selection.add(id);
                        }
                    } else {
                        self.selection.select_many(ids);
                    }
                    actions.push(self.selection_action());
                }
                self.state = self.resting_state();
            }
            other => self.state = other,
        }
        actions
    }

    fn pointer_leave(&mut self, store: &mut TemplateStore) -> Vec<CanvasAction> {
        let mut actions = Vec::new();
        if self.state.in_gesture() {
            store.end_batch();
        }
        if matches!(self.state, CanvasState::Dragging(_) | CanvasState::Resizing(_) | CanvasState::Selecting { .. }) {
            self.state = self.resting_state();
        }
        if self.selection.set_hovering(None) {
            actions.push(CanvasAction::Hover(None));
        }
        actions
    }

    fn key_down(&mut self, store: &mut TemplateStore, key: &str) -> Vec<CanvasAction> {
        let mut actions = Vec::new();
        if !self.input.shortcuts_enabled() {
            return actions;
        }
        if self.selection.is_editing() {
            if key == "Escape" {
                self.stop_editing(&mut actions);
            }
            return actions;
        }

        let modifiers = self.input.modifiers;
        match key {
            "Delete" | "Backspace" => {
                if self.selection.is_empty() {
                    return actions;
                }
                let ids = self.selection.active().to_vec();
                if self.state.in_gesture() {
                    store.end_batch();
                }
                let removed = store.remove_schemas(&ids);
                self.selection.clear();
                self.state = CanvasState::Idle;
                if !removed.is_empty() {
                    actions.push(CanvasAction::Delete(removed));
                }
            }
            "Escape" => {
                if self.state.in_gesture() {
                    store.end_batch();
                }
                self.selection.clear();
                self.state = CanvasState::Idle;
                actions.push(CanvasAction::Select(None));
            }
            "ArrowUp" | "ArrowDown" | "ArrowLeft" | "ArrowRight" => {
                let step = if modifiers.shift { FINE_NUDGE_MM } else { NUDGE_MM };
                let delta = match key {
                    "ArrowUp" => Vec2::new(0.0, -step),
                    "ArrowDown" => Vec2::new(0.0, step),
                    "ArrowLeft" => Vec2::new(-step, 0.0),
                    _ => Vec2::new(step, 0.0),
                };
                self.nudge(store, delta, &mut actions);
            }
            "a" | "A" if modifiers.command() => {
                let ids: Vec<SchemaId> = store
                    .template()
                    .schemas
                    .get(self.page_cursor)
                    .map(|schemas| schemas.iter().map(|s| s.id.clone()).collect())
                    .unwrap_or_default();
                self.selection.select_many(ids);
                self.state = self.resting_state();
                actions.push(self.selection_action());
            }
            _ => {}
        }
        actions
    }

    /// Insert a schema from an external drop.
    pub fn drop_insert(&mut self, store: &mut TemplateStore, descriptor: &InsertionDescriptor) -> Vec<CanvasAction> {
        let mut actions = Vec::new();
        let Some(frame) = frame_at(&self.frames, descriptor.pointer).copied() else {
            log::debug!("Drop outside of any page ignored");
            return actions;
        };
        let position = frame.to_mm(descriptor.pointer);
        let Some(schema) = store.add_schema(frame.index, &descriptor.plugin_type, position) else {
            return actions;
        };

        self.stop_editing(&mut actions);
        self.page_cursor = frame.index;
        self.selection.select(schema.id.clone());
        self.state = CanvasState::Selected;
        let id = schema.id.clone();
        actions.push(CanvasAction::Change(MutationReport::Add {
            page: frame.index,
            schema,
        }));
        actions.push(CanvasAction::Select(Some(vec![id])));
        actions
    }

    /// Leave in-place editing (the plugin's `stop_editing`).
    pub fn stop_editing_action(&mut self) -> Vec<CanvasAction> {
        let mut actions = Vec::new();
        self.stop_editing(&mut actions);
        actions
    }

    fn nudge(&mut self, store: &mut TemplateStore, delta: Vec2, actions: &mut Vec<CanvasAction>) {
        let template = Rc::clone(store.template());
        store.batch(|store| {
            for id in self.selection.active() {
                let Some((page, index)) = template.locate(id) else {
                    continue;
                };
                let schema: &Schema = &template.schemas[page][index];
                let mut target = schema.position + delta;
                if let Some(frame) = self.frames.get(page) {
                    target = clamp_to_page(target, schema.size(), page_size_mm(frame));
                }
                update(store, id, "position", point_value(target), actions);
            }
        });
    }

    fn handle_under(&self, template: &crate::template::Template, frame: &PaperFrame, point: Point) -> Option<ResizeState> {
        let [id] = self.selection.active() else {
            return None;
        };
        let (page, index) = template.locate(id)?;
        if page != frame.index {
            return None;
        }
        let bounds = template.schemas[page][index].bounds();
        let tolerance = frame.len_to_mm(HANDLE_HIT_TOLERANCE);
        let handle = hit_test_handles(bounds, point, tolerance)?;
        Some(ResizeState {
            id: id.clone(),
            page,
            handle,
            original: bounds,
        })
    }

    fn clear_selection(&mut self, actions: &mut Vec<CanvasAction>) {
        if !self.selection.is_empty() {
            self.selection.clear();
            actions.push(CanvasAction::Select(None));
        }
        self.state = CanvasState::Idle;
    }

    fn stop_editing(&mut self, actions: &mut Vec<CanvasAction>) {
        if self.selection.exit_editing() {
            actions.push(CanvasAction::EditStop);
        }
    }

    fn selection_action(&self) -> CanvasAction {
        if self.selection.is_empty() {
            CanvasAction::Select(None)
        } else {
            CanvasAction::Select(Some(self.selection.active().to_vec()))
        }
    }

    fn resting_state(&self) -> CanvasState {
        if self.selection.is_empty() {
            CanvasState::Idle
        } else {
            CanvasState::Selected
        }
    }
}

fn update(store: &mut TemplateStore, id: &str, key: &str, value: Value, actions: &mut Vec<CanvasAction>) {
    match store.update_schema(id, key, value.clone()) {
        Ok(true) => actions.push(CanvasAction::Change(MutationReport::Update {
            id: id.to_string(),
            key: key.to_string(),
            value,
        })),
        Ok(false) => {}
        Err(e) => log::warn!("Canvas update of {} on {} rejected: {}", key, id, e),
    }
}

fn point_value(point: Point) -> Value {
    json!({ "x": point.x, "y": point.y })
}

fn page_size_mm(frame: &PaperFrame) -> Size {
    frame.paper_size / MM_TO_PX
}

/// Keep a field of `size` inside the page.
fn clamp_to_page(position: Point, size: Size, page: Size) -> Point {
    Point::new(
        position.x.clamp(0.0, (page.width - size.width).max(0.0)),
        position.y.clamp(0.0, (page.height - size.height).max(0.0)),
    )
}

//! Designer facade: layout editing on the canvas with a property sidebar.

use crate::engine::{Engine, FacadeProps, FacadeResult, TemplateSource};
use crate::palette::{Palette, PaletteItem};
use formplate_core::audit::audit;
use formplate_core::canvas::{CanvasAction, CanvasController, InsertionDescriptor};
use formplate_core::input::{KeyEvent, Modifiers, PointerEvent};
use formplate_core::plugin::Mode;
use formplate_core::schema::SchemaId;
use formplate_core::sidebar::{Axis, PanelField, Sidebar, SidebarView};
use formplate_core::store::{MutationReport, ObserverId};
use formplate_core::template::Template;
use formplate_render::{Scene, ValueSource};
use kurbo::Point;
use serde_json::Value;

type TemplateCallback = Box<dyn FnMut(&Template)>;
type SelectCallback = Box<dyn FnMut(Option<&[SchemaId]>)>;

/// Template designer.
pub struct Designer {
    engine: Engine,
    canvas: CanvasController,
    sidebar: Sidebar,
    on_save_template: Vec<TemplateCallback>,
    on_select: Vec<SelectCallback>,
}

impl Designer {
    /// Create a designer. Fails on a malformed template.
    ///
    /// Input records are not used by the designer.
    pub fn new(props: FacadeProps) -> FacadeResult<Self> {
        let (engine, inputs) = Engine::new(props)?;
        if inputs.len() > 1 {
            log::debug!("Designer ignores {} input records", inputs.len());
        }
        let mut designer = Self {
            engine,
            canvas: CanvasController::new(),
            sidebar: Sidebar::new(),
            on_save_template: Vec::new(),
            on_select: Vec::new(),
        };
        designer.sync_frames();
        log::info!("Designer created with {} page(s)", designer.engine.template().page_count());
        Ok(designer)
    }

    /// Load base PDF pages.
    pub async fn load_assets(&mut self) -> FacadeResult<()> {
        self.engine.load_assets().await?;
        self.sync_frames();
        Ok(())
    }

    /// Current template. Notifies `on_save_template` subscribers.
    pub fn save_template(&mut self) -> FacadeResult<Template> {
        self.engine.check()?;
        let template = Template::clone(self.engine.template());
        audit("saveTemplate", &template);
        for callback in &mut self.on_save_template {
            callback(&template);
        }
        Ok(template)
    }

    pub fn on_save_template(&mut self, callback: impl FnMut(&Template) + 'static) -> FacadeResult<()> {
        self.engine.check()?;
        self.on_save_template.push(Box::new(callback));
        Ok(())
    }

    /// Replace the template and reset the canvas.
    pub fn update_template(&mut self, template: impl Into<TemplateSource>) -> FacadeResult<()> {
        self.engine.check()?;
        let template = template.into().into_template()?;
        let had_selection = !self.canvas.selection.is_empty();

        self.canvas.reset(&mut self.engine.store);
        self.engine.set_template(template);
        self.sync_frames();
        self.sidebar = Sidebar::new();
        if had_selection {
            self.notify_select();
        }
        Ok(())
    }

    /// Subscribe to template changes.
    pub fn on_change_template(&mut self, mut callback: impl FnMut(&Template) + 'static) -> FacadeResult<ObserverId> {
        self.engine.check()?;
        Ok(self.engine.store.subscribe(move |template| callback(&template)))
    }

    pub fn off_change_template(&mut self, id: ObserverId) -> FacadeResult<bool> {
        self.engine.check()?;
        Ok(self.engine.store.unsubscribe(id))
    }

    /// Subscribe to selection changes; `None` means nothing is selected.
    pub fn on_select(&mut self, callback: impl FnMut(Option<&[SchemaId]>) + 'static) -> FacadeResult<()> {
        self.engine.check()?;
        self.on_select.push(Box::new(callback));
        Ok(())
    }

    pub fn get_page_cursor(&self) -> FacadeResult<usize> {
        self.engine.check()?;
        Ok(self.canvas.page_cursor())
    }

    pub fn set_page_cursor(&mut self, page: usize) -> FacadeResult<()> {
        self.engine.check()?;
        self.canvas.set_page_cursor(page);
        Ok(())
    }

    pub fn selection(&self) -> FacadeResult<Vec<SchemaId>> {
        self.engine.check()?;
        Ok(self.canvas.selection.active().to_vec())
    }

    /// Select schemas programmatically. Unknown ids are skipped.
    pub fn select(&mut self, ids: Vec<SchemaId>) -> FacadeResult<()> {
        self.engine.check()?;
        let template = self.engine.template();
        let ids: Vec<_> = ids.into_iter().filter(|id| template.contains_id(id)).collect();
        self.canvas.selection.select_many(ids);
        self.notify_select();
        Ok(())
    }

    /// Mark whether a host text field holds keyboard focus.
    pub fn set_text_focus(&mut self, focused: bool) -> FacadeResult<()> {
        self.engine.check()?;
        self.canvas.input.text_focus = focused;
        Ok(())
    }

    pub fn pointer(&mut self, event: &PointerEvent, modifiers: Modifiers) -> FacadeResult<Vec<CanvasAction>> {
        self.engine.check()?;
        let actions = self.canvas.handle_pointer(&mut self.engine.store, event, modifiers);
        self.relay(&actions);
        Ok(actions)
    }

    pub fn key(&mut self, event: &KeyEvent, modifiers: Modifiers) -> FacadeResult<Vec<CanvasAction>> {
        self.engine.check()?;
        let actions = self.canvas.handle_key(&mut self.engine.store, event, modifiers);
        self.relay(&actions);
        Ok(actions)
    }

    /// Handle a drop of palette text at a canvas pixel position.
    ///
    /// Payloads that do not decode are ignored.
    pub fn handle_drop(&mut self, text: &str, pointer: Point) -> FacadeResult<Vec<CanvasAction>> {
        self.engine.check()?;
        match InsertionDescriptor::from_drop(text, pointer) {
            Ok(descriptor) => self.insert(&descriptor),
            Err(e) => {
                log::warn!("Ignoring drop with invalid payload: {}", e);
                Ok(Vec::new())
            }
        }
    }

    pub fn insert(&mut self, descriptor: &InsertionDescriptor) -> FacadeResult<Vec<CanvasAction>> {
        self.engine.check()?;
        let actions = self.canvas.drop_insert(&mut self.engine.store, descriptor);
        self.relay(&actions);
        Ok(actions)
    }

    /// Animation frame: deliver changes coalesced since the last frame.
    pub fn tick(&mut self) -> FacadeResult<()> {
        self.engine.check()?;
        self.engine.store.flush();
        Ok(())
    }

    /// Commit text typed into the field being edited in place.
    pub fn commit_input(&mut self, text: &str) -> FacadeResult<Vec<CanvasAction>> {
        self.engine.check()?;
        let Some(schema) = self.canvas.selection.editing().and_then(|id| self.engine.schema(id)) else {
            return Ok(Vec::new());
        };
        self.engine
            .renderer
            .dispatcher()
            .input(&schema, &schema.content, Mode::Designer, text);
        Ok(self.apply_plugin_changes())
    }

    /// Property panel for the current selection.
    pub fn sidebar_fields(&self) -> FacadeResult<&[PanelField]> {
        self.engine.check()?;
        Ok(self.sidebar.fields())
    }

    /// Sidebar contents: the selection's properties, or the fields of the
    /// current page when nothing is selected.
    pub fn sidebar_view(&self) -> FacadeResult<SidebarView> {
        self.engine.check()?;
        Ok(Sidebar::view(
            self.engine.template(),
            self.engine.store.registry(),
            self.canvas.page_cursor(),
            self.canvas.selection.active(),
        ))
    }

    /// Edit a property of every selected schema.
    pub fn edit_property(&mut self, key: &str, value: Value) -> FacadeResult<Vec<MutationReport>> {
        self.engine.check()?;
        let ids = self.canvas.selection.active().to_vec();
        Ok(self.sidebar.edit(&mut self.engine.store, &ids, key, value)?)
    }

    /// Edit one coordinate of the selection's positions.
    pub fn edit_position(&mut self, axis: Axis, value: f64) -> FacadeResult<Vec<MutationReport>> {
        self.engine.check()?;
        let ids = self.canvas.selection.active().to_vec();
        Ok(self
            .sidebar
            .edit_position_axis(&mut self.engine.store, &ids, axis, value)?)
    }

    /// Registered plugin types for the palette.
    pub fn palette(&self) -> FacadeResult<Vec<PaletteItem>> {
        self.engine.check()?;
        Ok(Palette::items(self.engine.store.registry()))
    }

    /// Build the scene for the current state.
    pub fn render(&mut self) -> FacadeResult<Scene> {
        self.engine.check()?;
        let layout = self.engine.layout(1, Mode::Designer);
        let scene = self.engine.render(
            &layout,
            Mode::Designer,
            ValueSource::Content,
            Some(&self.canvas.selection),
            self.canvas.marquee(),
        );
        self.apply_plugin_changes();
        Ok(scene)
    }

    /// Detach every callback and observer. Later calls fail.
    pub fn destroy(&mut self) {
        if self.engine.is_destroyed() {
            return;
        }
        self.on_save_template.clear();
        self.on_select.clear();
        self.engine.destroy();
        self.canvas.reset(&mut self.engine.store);
    }

    pub fn is_destroyed(&self) -> bool {
        self.engine.is_destroyed()
    }

    fn sync_frames(&mut self) {
        let layout = self.engine.layout(1, Mode::Designer);
        self.canvas.set_frames(self.engine.frames(&layout));
    }

    /// Apply changes plugins reported while rendering or committing input.
    fn apply_plugin_changes(&mut self) -> Vec<CanvasAction> {
        let dispatcher = self.engine.renderer.dispatcher();
        let changes = dispatcher.take_changes();
        let stop = dispatcher.take_stop_editing();

        let mut actions = Vec::new();
        self.engine.store.batch(|store| {
            for change in changes {
                match store.update_schema(&change.id, &change.key, change.value.clone()) {
                    Ok(true) => actions.push(CanvasAction::Change(MutationReport::Update {
                        id: change.id,
                        key: change.key,
                        value: change.value,
                    })),
                    Ok(false) => {}
                    Err(e) => log::warn!("Plugin change of {} rejected: {}", change.key, e),
                }
            }
        });
        if stop {
            actions.extend(self.canvas.stop_editing_action());
        }
        self.relay(&actions);
        actions
    }

    /// Forward canvas actions to selection subscribers and the sidebar.
    fn relay(&mut self, actions: &[CanvasAction]) {
        let mut refresh = false;
        for action in actions {
            match action {
                CanvasAction::Select(ids) => {
                    let ids = ids.as_deref();
                    for callback in &mut self.on_select {
                        callback(ids);
                    }
                    refresh = true;
                }
                CanvasAction::Change(_) | CanvasAction::Delete(_) => refresh = true,
                _ => {}
            }
        }
        if refresh {
            self.refresh_sidebar();
        }
    }

    fn notify_select(&mut self) {
        let active = self.canvas.selection.active();
        let ids = (!active.is_empty()).then_some(active);
        for callback in &mut self.on_select {
            callback(ids);
        }
        self.refresh_sidebar();
    }

    fn refresh_sidebar(&mut self) {
        self.sidebar.refresh(
            self.engine.template(),
            self.engine.store.registry(),
            self.canvas.selection.active(),
        );
    }
}

impl Drop for Designer {
    fn drop(&mut self) {
        self.destroy();
    }
}

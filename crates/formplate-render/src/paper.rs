//! Retained scene renderer: walks the paper layout and renders every field
//! through the dispatcher.

use crate::dispatch::Dispatcher;
use crate::renderer::{FrameContext, PageScene, Renderer, Scene, SceneItem};
use formplate_core::layout::PaperFrame;
use formplate_core::plugin::{Mode, PluginRegistry};
use formplate_core::schema::Schema;
use formplate_core::selection::{HANDLE_SIZE, handles_for};
use kurbo::Rect;
use std::cell::RefCell;
use std::rc::Rc;

/// Builds a [`Scene`] per frame.
#[derive(Debug)]
pub struct SceneRenderer {
    dispatcher: Dispatcher,
    scene: Scene,
}

impl SceneRenderer {
    pub fn new(registry: Rc<PluginRegistry>) -> Self {
        Self::with_dispatcher(Dispatcher::new(registry))
    }

    /// Use a configured dispatcher (host font, language).
    pub fn with_dispatcher(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            scene: Scene::default(),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    fn render_item(&self, ctx: &FrameContext<'_>, frame: &PaperFrame, index: usize, schema: &Schema) -> SceneItem {
        let value = ctx.values.value(frame.index, schema);
        let state = ctx.selection.map(|s| s.state(&schema.id)).unwrap_or_default();
        let editing = ctx.mode == Mode::Designer && state == formplate_core::selection::FieldState::Editing;
        let visual = self
            .dispatcher
            .render_schema(schema, value, ctx.mode, frame.scale, editing);

        let bounds = schema.bounds();
        let single = ctx.selection.is_some_and(|s| s.len() == 1);
        let handles = if ctx.mode == Mode::Designer && state.is_selected() && single && !editing {
            handles_for(bounds)
                .iter()
                .map(|h| Rect::from_center_size(frame.to_px(h.position), (HANDLE_SIZE, HANDLE_SIZE)))
                .collect()
        } else {
            Vec::new()
        };

        SceneItem {
            key: format!("{}-{}", frame.index, index),
            index,
            schema_id: schema.id.clone(),
            schema_type: schema.schema_type.clone(),
            rect: frame.rect_to_px(bounds),
            visual,
            selected: state.is_selected(),
            hovered: ctx.selection.and_then(|s| s.hovering()) == Some(schema.id.as_str()),
            editing,
            handles,
        }
    }
}

impl Renderer for SceneRenderer {
    fn build_scene(&mut self, ctx: &FrameContext<'_>) {
        let pages: RefCell<Vec<PageScene>> = RefCell::new(Vec::new());
        ctx.layout.render(
            ctx.scale,
            ctx.page_gap,
            |frame, background| {
                pages.borrow_mut().push(PageScene {
                    index: frame.index,
                    paper_size: frame.paper_size,
                    rect: frame.rect(),
                    background: background.to_string(),
                    items: Vec::new(),
                });
            },
            |frame, index, schema| {
                let item = self.render_item(ctx, frame, index, schema);
                if let Some(page) = pages.borrow_mut().last_mut() {
                    page.items.push(item);
                }
            },
        );

        self.scene = Scene {
            mode: ctx.mode,
            scale: ctx.scale,
            pages: pages.into_inner(),
            marquee: ctx.marquee,
        };
    }

    fn scene(&self) -> &Scene {
        &self.scene
    }
}

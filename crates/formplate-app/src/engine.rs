//! State shared by the Designer, Form and Viewer facades.

use crate::generator::GeneratorError;
use formplate_core::audit::audit;
use formplate_core::assets::{AssetError, AssetLoader, BlankPageLoader, PageAsset};
use formplate_core::inputs::InputRecord;
use formplate_core::layout::{PaperFrame, PaperLayout, fit_scale, ruler_origin};
use formplate_core::options::{Container, UiOptions};
use formplate_core::plugin::{Mode, PluginRegistry};
use formplate_core::schema::Schema;
use formplate_core::selection::SelectionState;
use formplate_core::sidebar::SidebarError;
use formplate_core::store::TemplateStore;
use formplate_core::template::{Template, TemplateError};
use formplate_render::{Dispatcher, FrameContext, Renderer, Scene, SceneRenderer, ValueSource, builtin_plugins};
use kurbo::{Point, Rect};
use serde_json::Value;
use std::rc::Rc;
use thiserror::Error;

/// Facade errors.
#[derive(Debug, Error)]
pub enum FacadeError {
    #[error("Instance has been destroyed")]
    Destroyed,
    #[error("Invalid template: {0}")]
    InvalidTemplate(#[from] TemplateError),
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),
    #[error("Generator error: {0}")]
    Generator(#[from] GeneratorError),
    #[error("Property edit rejected: {0}")]
    Sidebar(#[from] SidebarError),
}

/// Result type for facade operations.
pub type FacadeResult<T> = Result<T, FacadeError>;

/// A template as handed over by the host: typed, or raw JSON still to be
/// validated.
#[derive(Debug, Clone)]
pub enum TemplateSource {
    Typed(Template),
    Json(Value),
}

impl From<Template> for TemplateSource {
    fn from(template: Template) -> Self {
        TemplateSource::Typed(template)
    }
}

impl From<Value> for TemplateSource {
    fn from(value: Value) -> Self {
        TemplateSource::Json(value)
    }
}

impl TemplateSource {
    /// Validate and decode, logging a rejection once.
    pub fn into_template(self) -> FacadeResult<Template> {
        let result = match self {
            TemplateSource::Typed(mut template) => match template.validate() {
                Ok(()) => {
                    template.ensure_ids();
                    Ok(template)
                }
                Err(e) => Err(e),
            },
            TemplateSource::Json(value) => Template::from_value(value),
        };
        result.map_err(|e| {
            log::error!("Invalid template: {}", e);
            FacadeError::InvalidTemplate(e)
        })
    }
}

/// Construction options.
pub struct FacadeProps {
    pub container: Container,
    pub template: TemplateSource,
    /// Input records (form and viewer).
    pub inputs: Vec<InputRecord>,
    /// Host plugins; they replace built-ins of the same type.
    pub plugins: Option<PluginRegistry>,
    pub options: UiOptions,
    /// Loader for base PDF pages.
    pub loader: Rc<dyn AssetLoader>,
}

impl FacadeProps {
    pub fn new(template: impl Into<TemplateSource>) -> Self {
        Self {
            container: Container::default(),
            template: template.into(),
            inputs: Vec::new(),
            plugins: None,
            options: UiOptions::default(),
            loader: Rc::new(BlankPageLoader),
        }
    }

    pub fn with_container(mut self, container: Container) -> Self {
        self.container = container;
        self
    }

    pub fn with_inputs(mut self, inputs: Vec<InputRecord>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_plugins(mut self, plugins: PluginRegistry) -> Self {
        self.plugins = Some(plugins);
        self
    }

    pub fn with_options(mut self, options: UiOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_loader(mut self, loader: Rc<dyn AssetLoader>) -> Self {
        self.loader = loader;
        self
    }
}

/// Store, renderer and loaded pages behind one facade.
pub(crate) struct Engine {
    pub(crate) store: TemplateStore,
    pub(crate) renderer: SceneRenderer,
    pub(crate) options: UiOptions,
    pub(crate) container: Container,
    loader: Rc<dyn AssetLoader>,
    pages: Vec<PageAsset>,
    destroyed: bool,
}

impl Engine {
    /// Validate the template and set up the store. Returns the remaining
    /// input records.
    pub(crate) fn new(props: FacadeProps) -> FacadeResult<(Self, Vec<InputRecord>)> {
        let mut template = props.template.into_template()?;

        let mut registry = builtin_plugins();
        if let Some(plugins) = props.plugins {
            registry.extend(plugins);
        }
        let registry = Rc::new(registry);

        let pages = initial_pages(&template);
        template.ensure_pages(pages.len());
        let dispatcher = Dispatcher::new(Rc::clone(&registry))
            .with_font(props.options.font.clone())
            .with_lang(props.options.lang.clone());
        let engine = Self {
            store: TemplateStore::new(template, registry),
            renderer: SceneRenderer::with_dispatcher(dispatcher),
            options: props.options,
            container: props.container,
            loader: props.loader,
            pages,
            destroyed: false,
        };
        Ok((engine, props.inputs))
    }

    /// Fail if the facade has been destroyed.
    pub(crate) fn check(&self) -> FacadeResult<()> {
        if self.destroyed {
            return Err(FacadeError::Destroyed);
        }
        Ok(())
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Release every subscription. Idempotent.
    pub(crate) fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.store.clear_observers();
        self.pages.clear();
        self.destroyed = true;
        log::debug!("Facade destroyed");
    }

    pub(crate) fn template(&self) -> &Rc<Template> {
        self.store.template()
    }

    /// Swap in a validated template. Referenced base PDFs need another
    /// [`Engine::load_assets`].
    pub(crate) fn set_template(&mut self, mut template: Template) {
        self.pages = initial_pages(&template);
        template.ensure_pages(self.pages.len());
        audit("updateTemplate", &template);
        self.store.replace(template);
    }

    /// Load page sizes and backgrounds for the current base PDF.
    ///
    /// The future borrows the engine mutably until it completes. Dropping it
    /// abandons the load without touching the pages.
    pub(crate) async fn load_assets(&mut self) -> FacadeResult<()> {
        self.check()?;
        let template = Rc::clone(self.store.template());
        let loader = Rc::clone(&self.loader);
        let pages = loader
            .load_pages(&template.base_pdf, template.page_count())
            .await
            .map_err(|e| {
                log::error!("Failed to load base PDF: {}", e);
                e
            })?;
        log::debug!("Loaded {} page(s)", pages.len());
        self.pages = pages;

        let mut padded = Template::clone(&template);
        if padded.ensure_pages(self.pages.len()) {
            log::debug!("Template padded to {} page(s)", padded.page_count());
            self.store.replace(padded);
        }
        Ok(())
    }

    /// Page layout with one page set per record.
    pub(crate) fn layout(&self, records: usize, mode: Mode) -> PaperLayout {
        let template = self.store.template();
        let mut layout = PaperLayout::default().with_origin(self.origin(mode));
        for _ in 0..records.max(1) {
            layout.schemas_list.extend(template.schemas.iter().cloned());
            layout.page_sizes.extend(self.pages.iter().map(|p| p.size));
            layout
                .backgrounds
                .extend(self.pages.iter().map(|p| p.background.clone()));
        }
        layout
    }

    /// Top-left of the first page. Rulers only show in the designer.
    pub(crate) fn origin(&self, mode: Mode) -> Point {
        ruler_origin(mode == Mode::Designer && self.options.has_rulers)
    }

    /// Pages per record in [`Engine::layout`].
    pub(crate) fn pages_per_record(&self) -> usize {
        self.store.template().page_count().max(self.pages.len())
    }

    /// Effective render scale for the container and zoom.
    pub(crate) fn scale(&self) -> f64 {
        let sizes: Vec<_> = self.pages.iter().map(|p| p.size).collect();
        fit_scale(self.container.width, &sizes, self.options.zoom())
    }

    /// Page frames in canvas pixels for a layout.
    pub(crate) fn frames(&self, layout: &PaperLayout) -> Vec<PaperFrame> {
        layout.frames(self.scale(), self.options.page_gap)
    }

    /// Build a scene for the given mode and values.
    pub(crate) fn render(
        &mut self,
        layout: &PaperLayout,
        mode: Mode,
        values: ValueSource<'_>,
        selection: Option<&SelectionState>,
        marquee: Option<Rect>,
    ) -> Scene {
        let ctx = FrameContext::new(layout, mode)
            .with_scale(self.scale())
            .with_page_gap(self.options.page_gap)
            .with_values(values)
            .with_selection(selection)
            .with_marquee(marquee);
        self.renderer.build_scene(&ctx);
        self.renderer.scene().clone()
    }

    /// Copy of a schema by id.
    pub(crate) fn schema(&self, id: &str) -> Option<Schema> {
        self.store.template().get(id).cloned()
    }
}

fn initial_pages(template: &Template) -> Vec<PageAsset> {
    match template.base_pdf.blank_size() {
        Some(size) => vec![PageAsset::blank(size); template.page_count().max(1)],
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formplate_core::assets::MemoryAssetLoader;
    use formplate_core::layout::RULER_OFFSET;
    use formplate_core::testing::{block_on, capture_logs, sample_template, take_errors, take_logs};
    use formplate_core::template::BasePdf;
    use kurbo::Size;
    use serde_json::json;

    #[test]
    fn test_rejects_schemas_not_array() {
        capture_logs();
        let result = Engine::new(FacadeProps::new(json!({ "basePdf": "x", "schemas": {} })));
        assert!(matches!(
            result,
            Err(FacadeError::InvalidTemplate(TemplateError::SchemasNotArray))
        ));
        assert_eq!(take_errors().len(), 1);
    }

    #[test]
    fn test_rejects_schema_without_type() {
        let value = json!({
            "basePdf": { "width": 210, "height": 297 },
            "schemas": [[{ "name": "a", "position": { "x": 0, "y": 0 }, "width": 1, "height": 1 }]]
        });
        assert!(matches!(
            Engine::new(FacadeProps::new(value)),
            Err(FacadeError::InvalidTemplate(TemplateError::MissingType { page: 0, index: 0 }))
        ));
    }

    #[test]
    fn test_layout_repeats_pages_per_record() {
        let (engine, _) = Engine::new(FacadeProps::new(sample_template(1))).unwrap();
        let layout = engine.layout(3, Mode::Form);
        assert!(layout.is_consistent());
        assert_eq!(layout.page_count(), 3);
        assert_eq!(engine.pages_per_record(), 1);
    }

    #[test]
    fn test_reference_pdf_waits_for_assets() {
        let mut template = sample_template(1);
        template.base_pdf = BasePdf::Reference("data:application/pdf;base64,AAAA".to_string());
        let loader = MemoryAssetLoader::new(vec![PageAsset {
            size: Size::new(100.0, 100.0),
            background: "page-0.png".to_string(),
        }]);
        let (mut engine, _) =
            Engine::new(FacadeProps::new(template).with_loader(Rc::new(loader))).unwrap();

        assert_eq!(engine.layout(1, Mode::Viewer).page_count(), 0);
        block_on(engine.load_assets()).unwrap();
        let layout = engine.layout(1, Mode::Viewer);
        assert_eq!(layout.page_count(), 1);
        assert_eq!(layout.backgrounds, vec!["page-0.png".to_string()]);
    }

    #[test]
    fn test_empty_schemas_get_a_page() {
        let value = json!({ "basePdf": { "width": 210, "height": 297 }, "schemas": [] });
        let (engine, _) = Engine::new(FacadeProps::new(value)).unwrap();
        assert_eq!(engine.template().page_count(), 1);
        assert!(engine.layout(1, Mode::Designer).is_consistent());
    }

    #[test]
    fn test_loaded_pages_extend_template() {
        let page = PageAsset {
            size: Size::new(100.0, 100.0),
            background: String::new(),
        };
        let loader = MemoryAssetLoader::new(vec![page.clone(), page]);
        let (mut engine, _) =
            Engine::new(FacadeProps::new(sample_template(1)).with_loader(Rc::new(loader))).unwrap();
        assert_eq!(engine.template().page_count(), 1);

        block_on(engine.load_assets()).unwrap();
        assert_eq!(engine.template().page_count(), 2);
        assert_eq!(engine.template().len(), 1);
        let layout = engine.layout(2, Mode::Form);
        assert!(layout.is_consistent());
        assert_eq!(layout.page_count(), 4);
    }

    #[test]
    fn test_rulers_offset_designer_only() {
        let (engine, _) = Engine::new(FacadeProps::new(sample_template(1))).unwrap();
        assert_eq!(engine.layout(1, Mode::Designer).origin, Point::new(RULER_OFFSET, RULER_OFFSET));
        assert_eq!(engine.layout(1, Mode::Form).origin, Point::ZERO);

        let options = UiOptions {
            has_rulers: false,
            ..UiOptions::default()
        };
        let (engine, _) =
            Engine::new(FacadeProps::new(sample_template(1)).with_options(options)).unwrap();
        assert_eq!(engine.layout(1, Mode::Designer).origin, Point::ZERO);
    }

    #[test]
    fn test_set_template_is_audited() {
        capture_logs();
        let (mut engine, _) = Engine::new(FacadeProps::new(sample_template(1))).unwrap();
        take_logs();
        engine.set_template(sample_template(2));

        let entries: Vec<Value> = take_logs()
            .into_iter()
            .filter(|(level, _)| *level == log::Level::Info)
            .filter_map(|(_, message)| serde_json::from_str(&message).ok())
            .collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["action"], "updateTemplate");
        assert_eq!(entries[0]["templateHash"].as_str().map(str::len), Some(64));
    }

    #[test]
    fn test_destroyed_rejects_load() {
        let (mut engine, _) = Engine::new(FacadeProps::new(sample_template(1))).unwrap();
        engine.destroy();
        engine.destroy();
        assert!(engine.is_destroyed());
        assert!(matches!(block_on(engine.load_assets()), Err(FacadeError::Destroyed)));
    }
}

//! Viewer facade: read-only preview of filled records.

use crate::engine::{Engine, FacadeProps, FacadeResult, TemplateSource};
use crate::generator::Generator;
use formplate_core::inputs::InputRecord;
use formplate_core::plugin::Mode;
use formplate_render::{Scene, ValueSource};
use std::rc::Rc;

/// Read-only preview.
pub struct Viewer {
    engine: Engine,
    inputs: Vec<InputRecord>,
}

impl Viewer {
    pub fn new(props: FacadeProps) -> FacadeResult<Self> {
        let (engine, inputs) = Engine::new(props)?;
        Ok(Self { engine, inputs })
    }

    /// Load base PDF pages.
    pub async fn load_assets(&mut self) -> FacadeResult<()> {
        self.engine.load_assets().await
    }

    /// Replace the inputs. No change events.
    pub fn set_inputs(&mut self, inputs: Vec<InputRecord>) -> FacadeResult<()> {
        self.engine.check()?;
        self.inputs = inputs;
        Ok(())
    }

    pub fn get_inputs(&self) -> FacadeResult<&[InputRecord]> {
        self.engine.check()?;
        Ok(&self.inputs)
    }

    pub fn update_template(&mut self, template: impl Into<TemplateSource>) -> FacadeResult<()> {
        self.engine.check()?;
        let template = template.into().into_template()?;
        self.engine.set_template(template);
        Ok(())
    }

    pub fn render(&mut self) -> FacadeResult<Scene> {
        self.engine.check()?;
        let layout = self.engine.layout(self.inputs.len(), Mode::Viewer);
        let values = ValueSource::Inputs {
            records: &self.inputs,
            pages_per_record: self.engine.pages_per_record(),
        };
        Ok(self.engine.render(&layout, Mode::Viewer, values, None, None))
    }

    pub async fn generate(&self, generator: &dyn Generator) -> FacadeResult<Vec<u8>> {
        self.engine.check()?;
        let template = Rc::clone(self.engine.template());
        Ok(generator.generate(&template, &self.inputs).await?)
    }

    pub fn destroy(&mut self) {
        self.engine.destroy();
    }

    pub fn is_destroyed(&self) -> bool {
        self.engine.is_destroyed()
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FacadeError;
    use formplate_core::testing::{capture_logs, sample_template, take_logs};

    fn record(value: &str) -> InputRecord {
        [("field1".to_string(), value.to_string())].into_iter().collect()
    }

    #[test]
    fn test_read_only_render() {
        let mut viewer = Viewer::new(FacadeProps::new(sample_template(1)).with_inputs(vec![record("shown")])).unwrap();

        let scene = viewer.render().unwrap();

        let item = scene.items().next().unwrap();
        assert_eq!(item.visual.text.as_deref(), Some("shown"));
        assert!(!item.visual.editable);
        assert!(!item.visual.draggable);
    }

    #[test]
    fn test_set_and_get_inputs() {
        let mut viewer = Viewer::new(FacadeProps::new(sample_template(1))).unwrap();
        viewer.set_inputs(vec![record("a"), record("b")]).unwrap();

        assert_eq!(viewer.get_inputs().unwrap().len(), 2);
        assert_eq!(viewer.render().unwrap().pages.len(), 2);
    }

    #[test]
    fn test_empty_inputs_show_content() {
        let mut template = sample_template(1);
        template.schemas[0][0].content = "default".to_string();
        let mut viewer = Viewer::new(FacadeProps::new(template)).unwrap();

        let scene = viewer.render().unwrap();
        assert_eq!(scene.items().next().unwrap().visual.text.as_deref(), Some("default"));
    }

    #[test]
    fn test_use_after_destroy() {
        let mut viewer = Viewer::new(FacadeProps::new(sample_template(1))).unwrap();
        viewer.destroy();

        assert!(matches!(viewer.set_inputs(Vec::new()), Err(FacadeError::Destroyed)));
        assert!(matches!(viewer.get_inputs(), Err(FacadeError::Destroyed)));
        assert!(matches!(viewer.render(), Err(FacadeError::Destroyed)));
    }

    #[test]
    fn test_drop_releases_engine() {
        capture_logs();
        let viewer = Viewer::new(FacadeProps::new(sample_template(1))).unwrap();
        drop(viewer);

        let logs = take_logs();
        assert!(logs.iter().any(|(_, message)| message == "Facade destroyed"));
    }
}

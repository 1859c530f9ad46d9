//! Form facade: fill in field values, one page set per input record.

use crate::engine::{Engine, FacadeProps, FacadeResult, TemplateSource};
use crate::generator::Generator;
use formplate_core::inputs::{InputChange, InputRecord, diff_inputs, sanitize_value};
use formplate_core::plugin::Mode;
use formplate_core::template::Template;
use formplate_render::{Scene, ValueSource};

type InputCallback = Box<dyn FnMut(&InputChange)>;

/// Fillable form over a template.
pub struct Form {
    engine: Engine,
    inputs: Vec<InputRecord>,
    on_change_input: Vec<InputCallback>,
}

impl Form {
    /// Create a form. Fails on a malformed template.
    pub fn new(props: FacadeProps) -> FacadeResult<Self> {
        let (engine, inputs) = Engine::new(props)?;
        log::info!("Form created with {} record(s)", inputs.len());
        Ok(Self {
            engine,
            inputs,
            on_change_input: Vec::new(),
        })
    }

    /// Load base PDF pages.
    pub async fn load_assets(&mut self) -> FacadeResult<()> {
        self.engine.load_assets().await
    }

    /// Replace the inputs, notifying once per changed field.
    ///
    /// Keys that match no schema name are ignored.
    pub fn set_inputs(&mut self, inputs: Vec<InputRecord>) -> FacadeResult<Vec<InputChange>> {
        self.engine.check()?;
        let template = self.engine.template();
        let names = template.schema_names();
        let changes = diff_inputs(&names, &self.inputs, &inputs);
        self.inputs = inputs;
        self.notify(&changes);
        Ok(changes)
    }

    pub fn get_inputs(&self) -> FacadeResult<&[InputRecord]> {
        self.engine.check()?;
        Ok(&self.inputs)
    }

    /// Subscribe to per-field input changes.
    pub fn on_change_input(&mut self, callback: impl FnMut(&InputChange) + 'static) -> FacadeResult<()> {
        self.engine.check()?;
        self.on_change_input.push(Box::new(callback));
        Ok(())
    }

    /// A user edit of one field of one record.
    ///
    /// The value is sanitized first and compared with what the field shows:
    /// the record's value, else the schema content. Returns the change if
    /// anything changed.
    pub fn change_input(&mut self, index: usize, name: &str, value: &str) -> FacadeResult<Option<InputChange>> {
        self.engine.check()?;
        let Some(content) = self
            .engine
            .template()
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.content.clone())
        else {
            return Ok(None);
        };
        if index >= self.inputs.len() {
            self.inputs.resize_with(index + 1, InputRecord::new);
        }

        let value = sanitize_value(value);
        if self.value(index, name, &content) == value {
            return Ok(None);
        }
        self.inputs[index].insert(name.to_string(), value.clone());

        let change = InputChange {
            index,
            name: name.to_string(),
            value,
        };
        self.notify(std::slice::from_ref(&change));
        Ok(Some(change))
    }

    /// Commit text typed into a field's editor on a layout page.
    ///
    /// The plugin reports a `content` change, which becomes an input change of
    /// the record owning the page.
    pub fn commit_input(&mut self, page: usize, id: &str, text: &str) -> FacadeResult<Option<InputChange>> {
        self.engine.check()?;
        let Some(schema) = self.engine.schema(id) else {
            return Ok(None);
        };
        let index = page / self.engine.pages_per_record().max(1);
        let current = self.value(index, &schema.name, &schema.content);

        let dispatcher = self.engine.renderer.dispatcher();
        dispatcher.input(&schema, &current, Mode::Form, text);
        dispatcher.take_stop_editing();
        let changes = dispatcher.take_changes();

        let mut result = None;
        for change in changes.into_iter().filter(|c| c.key == "content") {
            if let Some(value) = change.value.as_str() {
                result = self.change_input(index, &schema.name, value)?.or(result);
            }
        }
        Ok(result)
    }

    /// Replace the template. Inputs are kept.
    pub fn update_template(&mut self, template: impl Into<TemplateSource>) -> FacadeResult<()> {
        self.engine.check()?;
        let template = template.into().into_template()?;
        self.engine.set_template(template);
        Ok(())
    }

    pub fn get_template(&self) -> FacadeResult<Template> {
        self.engine.check()?;
        Ok(Template::clone(self.engine.template()))
    }

    /// Build the scene: one page set per record.
    pub fn render(&mut self) -> FacadeResult<Scene> {
        self.engine.check()?;
        let layout = self.engine.layout(self.inputs.len(), Mode::Form);
        let values = ValueSource::Inputs {
            records: &self.inputs,
            pages_per_record: self.engine.pages_per_record(),
        };
        Ok(self.engine.render(&layout, Mode::Form, values, None, None))
    }

    /// Run the generator over the current template and inputs.
    pub async fn generate(&self, generator: &dyn Generator) -> FacadeResult<Vec<u8>> {
        self.engine.check()?;
        let template = std::rc::Rc::clone(self.engine.template());
        Ok(generator.generate(&template, &self.inputs).await?)
    }

    /// Detach every callback. Later calls fail.
    pub fn destroy(&mut self) {
        if self.engine.is_destroyed() {
            return;
        }
        self.on_change_input.clear();
        self.engine.destroy();
    }

    pub fn is_destroyed(&self) -> bool {
        self.engine.is_destroyed()
    }

    fn value(&self, index: usize, name: &str, fallback: &str) -> String {
        self.inputs
            .get(index)
            .and_then(|record| record.get(name))
            .map_or_else(|| fallback.to_string(), String::clone)
    }

    fn notify(&mut self, changes: &[InputChange]) {
        for change in changes {
            for callback in &mut self.on_change_input {
                callback(change);
            }
        }
    }
}

impl Drop for Form {
    fn drop(&mut self) {
        self.destroy();
    }
}

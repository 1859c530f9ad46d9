//! Seam for the external PDF generator.

use formplate_core::assets::BoxFuture;
use formplate_core::inputs::InputRecord;
use formplate_core::template::Template;
use thiserror::Error;

/// Generator errors.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Generation failed: {0}")]
    Failed(String),
}

/// Result type for generator operations.
pub type GeneratorResult<T> = Result<T, GeneratorError>;

/// Produces document bytes from a template and its input records.
///
/// Implemented by the host; the facades only trigger it.
pub trait Generator {
    fn generate<'a>(&'a self, template: &'a Template, inputs: &'a [InputRecord]) -> BoxFuture<'a, GeneratorResult<Vec<u8>>>;
}

/// Generator that serializes its arguments as JSON. Useful for previews and
/// tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonGenerator;

impl Generator for JsonGenerator {
    fn generate<'a>(&'a self, template: &'a Template, inputs: &'a [InputRecord]) -> BoxFuture<'a, GeneratorResult<Vec<u8>>> {
        Box::pin(async move {
            let document = serde_json::json!({
                "template": template,
                "inputs": inputs,
            });
            serde_json::to_vec_pretty(&document).map_err(|e| GeneratorError::Failed(e.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formplate_core::testing::{block_on, sample_template};

    #[test]
    fn test_json_generator() {
        let template = sample_template(1);
        let inputs = vec![[("field1".to_string(), "v".to_string())].into_iter().collect()];

        let bytes = block_on(JsonGenerator.generate(&template, &inputs)).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["inputs"][0]["field1"], "v");
        assert_eq!(value["template"]["schemas"][0][0]["name"], "field1");
    }
}

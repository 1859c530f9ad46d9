//! Image field plugin. Content is a base64 `data:` URI.

use super::common_fields;
use formplate_core::assets::decode_data_uri;
use formplate_core::plugin::{Mode, Plugin, RenderContext, Visual};
use formplate_core::schema::Schema;
use kurbo::Point;
use serde_json::json;

/// The built-in `image` plugin.
pub fn image_plugin() -> Plugin {
    let default_schema = Schema::new("image", Point::ZERO, 40.0, 40.0).with_id("");
    Plugin::new(default_schema, common_fields(), render).with_label("Image")
}

fn render(ctx: &RenderContext<'_>) -> Visual {
    let visual = Visual::new("image")
        .editable(ctx.mode == Mode::Form)
        .draggable(ctx.mode == Mode::Designer);

    if ctx.value.is_empty() {
        return visual.with_attribute("placeholder", json!(true));
    }

    match decode_data_uri(ctx.value) {
        Ok((media_type, bytes)) => visual
            .with_attribute("src", json!(ctx.value))
            .with_attribute("mediaType", json!(media_type))
            .with_attribute("byteLength", json!(bytes.len())),
        Err(e) => {
            log::debug!("Image {} has unreadable content: {}", ctx.schema.id, e);
            visual.with_attribute("error", json!(e.to_string()))
        }
    }
}

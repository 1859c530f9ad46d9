//! Schema definitions: one positioned field on a template page.

use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a schema within a template.
pub type SchemaId = String;

/// Errors raised when writing a single schema field.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("Field '{0}' cannot be changed")]
    Immutable(String),
    #[error("Invalid value for field '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

fn origin() -> Point {
    Point::ZERO
}

/// A positioned field on a page.
///
/// Units for `position`, `width` and `height` are millimeters. Properties
/// specific to a plugin type live in the open `properties` map and are
/// flattened into the same JSON object on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Unique identifier (assigned on load when missing).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: SchemaId,
    /// Field name; input records are keyed by it.
    #[serde(default)]
    pub name: String,
    /// Plugin key.
    #[serde(rename = "type", default)]
    pub schema_type: String,
    /// Default content shown when no input value is bound.
    #[serde(default)]
    pub content: String,
    /// Top-left corner on the page.
    #[serde(default = "origin")]
    pub position: Point,
    /// Width of the field.
    #[serde(default)]
    pub width: f64,
    /// Height of the field.
    #[serde(default)]
    pub height: f64,
    /// Type-specific properties.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl Schema {
    /// Create a schema of the given type with a fresh ID.
    pub fn new(schema_type: impl Into<String>, position: Point, width: f64, height: f64) -> Self {
        Self {
            id: new_schema_id(),
            name: String::new(),
            schema_type: schema_type.into(),
            content: String::new(),
            position,
            width,
            height,
            properties: Map::new(),
        }
    }

    /// Set the name (builder style).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the content (builder style).
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Set the ID (builder style).
    pub fn with_id(mut self, id: impl Into<SchemaId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set a type-specific property (builder style).
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Size of the field in millimeters.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Bounding box in page millimeters.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size())
    }

    /// Check if a point (page millimeters) lies inside the field.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }

    /// Read a field by key as JSON.
    pub fn field(&self, key: &str) -> Option<Value> {
        match key {
            "id" => Some(Value::String(self.id.clone())),
            "name" => Some(Value::String(self.name.clone())),
            "type" => Some(Value::String(self.schema_type.clone())),
            "content" => Some(Value::String(self.content.clone())),
            "position" => serde_json::to_value(self.position).ok(),
            "width" => Some(Value::from(self.width)),
            "height" => Some(Value::from(self.height)),
            _ => self.properties.get(key).cloned(),
        }
    }

    /// Write exactly one field.
    ///
    /// Returns `Ok(true)` if the stored value changed and `Ok(false)` if the
    /// new value equals the current one.
    pub fn set_field(&mut self, key: &str, value: Value) -> Result<bool, SchemaError> {
        match key {
            "id" => Err(SchemaError::Immutable(key.to_string())),
            "name" => Ok(replace(&mut self.name, expect_string(key, value)?)),
            "content" => Ok(replace(&mut self.content, expect_string(key, value)?)),
            "type" => {
                let schema_type = expect_string(key, value)?;
                if schema_type.is_empty() {
                    return Err(invalid(key, "type must not be empty"));
                }
                Ok(replace(&mut self.schema_type, schema_type))
            }
            "position" => {
                let position: Point = serde_json::from_value(value)
                    .map_err(|e| invalid(key, &e.to_string()))?;
                if !position.x.is_finite() || !position.y.is_finite() {
                    return Err(invalid(key, "coordinates must be finite"));
                }
                Ok(replace(&mut self.position, position))
            }
            "width" => Ok(replace(&mut self.width, expect_dimension(key, &value)?)),
            "height" => Ok(replace(&mut self.height, expect_dimension(key, &value)?)),
            _ => {
                if self.properties.get(key) == Some(&value) {
                    return Ok(false);
                }
                self.properties.insert(key.to_string(), value);
                Ok(true)
            }
        }
    }

    /// Read a numeric property, falling back to `default`.
    pub fn number(&self, key: &str, default: f64) -> f64 {
        self.properties.get(key).and_then(Value::as_f64).unwrap_or(default)
    }

    /// Read a string property.
    pub fn string(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// Read a boolean property, falling back to `default`.
    pub fn flag(&self, key: &str, default: bool) -> bool {
        self.properties.get(key).and_then(Value::as_bool).unwrap_or(default)
    }
}

/// Generate a fresh schema ID.
pub fn new_schema_id() -> SchemaId {
    Uuid::new_v4().to_string()
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn invalid(key: &str, reason: &str) -> SchemaError {
    SchemaError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn expect_string(key: &str, value: Value) -> Result<String, SchemaError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(invalid(key, &format!("expected string, got {}", other))),
    }
}

fn expect_dimension(key: &str, value: &Value) -> Result<f64, SchemaError> {
    let n = value
        .as_f64()
        .ok_or_else(|| invalid(key, &format!("expected number, got {}", value)))?;
    if !n.is_finite() || n < 0.0 {
        return Err(invalid(key, "must be a finite, non-negative number"));
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Schema {
        Schema::new("text", Point::new(20.0, 20.0), 100.0, 15.0)
            .with_name("field1")
            .with_content("hello")
            .with_property("fontSize", json!(13))
    }

    #[test]
    fn test_deserialize_original_shape() {
        let schema: Schema = serde_json::from_value(json!({
            "name": "field1",
            "type": "text",
            "content": "",
            "position": { "x": 20, "y": 20 },
            "width": 100,
            "height": 15,
            "alignment": "left"
        }))
        .unwrap();

        assert!(schema.id.is_empty());
        assert_eq!(schema.schema_type, "text");
        assert_eq!(schema.position, Point::new(20.0, 20.0));
        assert_eq!(schema.string("alignment"), Some("left"));
    }

    #[test]
    fn test_serialize_flattens_properties() {
        let value = serde_json::to_value(sample().with_id("a")).unwrap();
        assert_eq!(value["type"], "text");
        assert_eq!(value["fontSize"], 13);
        assert_eq!(value["position"]["x"], 20.0);
    }

    #[test]
    fn test_set_field_touches_only_target() {
        let mut schema = sample();
        let before = schema.clone();

        assert_eq!(schema.set_field("width", json!(150)), Ok(true));

        assert!((schema.width - 150.0).abs() < f64::EPSILON);
        assert_eq!(schema.height, before.height);
        assert_eq!(schema.position, before.position);
        assert_eq!(schema.content, before.content);
        assert_eq!(schema.properties, before.properties);
    }

    #[test]
    fn test_set_field_same_value_reports_unchanged() {
        let mut schema = sample();
        assert_eq!(schema.set_field("content", json!("hello")), Ok(false));
        assert_eq!(schema.set_field("fontSize", json!(13)), Ok(false));
        assert_eq!(schema.set_field("position", json!({ "x": 20.0, "y": 20.0 })), Ok(false));
    }

    #[test]
    fn test_set_field_rejects_bad_values() {
        let mut schema = sample();
        assert!(matches!(schema.set_field("id", json!("x")), Err(SchemaError::Immutable(_))));
        assert!(schema.set_field("width", json!("wide")).is_err());
        assert!(schema.set_field("height", json!(-1)).is_err());
        assert!(schema.set_field("position", json!(3)).is_err());
        assert!(schema.set_field("type", json!("")).is_err());
    }

    #[test]
    fn test_field_reads_typed_and_open_keys() {
        let schema = sample();
        assert_eq!(schema.field("name"), Some(json!("field1")));
        assert_eq!(schema.field("position"), Some(json!({ "x": 20.0, "y": 20.0 })));
        assert_eq!(schema.field("fontSize"), Some(json!(13)));
        assert_eq!(schema.field("missing"), None);
    }

    #[test]
    fn test_hit_test() {
        let schema = sample();
        assert!(schema.hit_test(Point::new(50.0, 25.0), 0.0));
        assert!(!schema.hit_test(Point::new(10.0, 10.0), 0.0));
        assert!(schema.hit_test(Point::new(19.5, 20.0), 1.0));
    }
}

//! Template document: base content plus per-page schemas.

use crate::schema::{Schema, SchemaId, new_schema_id};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Template validation and decoding errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template must be a JSON object")]
    NotAnObject,
    #[error("Template schemas must be an array")]
    SchemasNotArray,
    #[error("Template page {0} must be an array of schemas")]
    PageNotArray(usize),
    #[error("Schema {index} on page {page} has no type")]
    MissingType { page: usize, index: usize },
    #[error("Invalid template: {0}")]
    Json(#[from] serde_json::Error),
}

/// A blank base document: every page has the same size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlankPdf {
    /// Page width in millimeters.
    pub width: f64,
    /// Page height in millimeters.
    pub height: f64,
    /// Padding (top, right, bottom, left) in millimeters.
    #[serde(default)]
    pub padding: [f64; 4],
}

/// Base content the fields are laid over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BasePdf {
    /// Blank pages of a fixed size.
    Blank(BlankPdf),
    /// Reference to an existing PDF (data URI or URL).
    Reference(String),
}

impl BasePdf {
    /// A4 portrait blank pages.
    pub fn a4() -> Self {
        BasePdf::Blank(BlankPdf {
            width: 210.0,
            height: 297.0,
            padding: [0.0; 4],
        })
    }

    /// Page size when it is known without loading anything.
    pub fn blank_size(&self) -> Option<Size> {
        match self {
            BasePdf::Blank(blank) => Some(Size::new(blank.width, blank.height)),
            BasePdf::Reference(_) => None,
        }
    }
}

impl Default for BasePdf {
    fn default() -> Self {
        Self::a4()
    }
}

/// The full template document.
///
/// `schemas` is indexed by page; each inner vector is the z/tab order of the
/// fields on that page (back to front).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "basePdf")]
    pub base_pdf: BasePdf,
    pub schemas: Vec<Vec<Schema>>,
}

impl Default for Template {
    fn default() -> Self {
        Self::new(BasePdf::default())
    }
}

impl Template {
    /// Create a template with a single empty page.
    pub fn new(base_pdf: BasePdf) -> Self {
        Self {
            base_pdf,
            schemas: vec![Vec::new()],
        }
    }

    /// Validate a raw JSON document and decode it.
    ///
    /// Schemas without an ID are given one.
    pub fn from_value(value: Value) -> Result<Self, TemplateError> {
        let object = value.as_object().ok_or(TemplateError::NotAnObject)?;
        let pages = object
            .get("schemas")
            .and_then(Value::as_array)
            .ok_or(TemplateError::SchemasNotArray)?;
        for (page, schemas) in pages.iter().enumerate() {
            let schemas = schemas.as_array().ok_or(TemplateError::PageNotArray(page))?;
            for (index, schema) in schemas.iter().enumerate() {
                let has_type = schema
                    .get("type")
                    .and_then(Value::as_str)
                    .is_some_and(|t| !t.is_empty());
                if !has_type {
                    return Err(TemplateError::MissingType { page, index });
                }
            }
        }

        let mut template: Template = serde_json::from_value(value)?;
        template.ensure_ids();
        Ok(template)
    }

    /// Decode a template from JSON text.
    pub fn from_json(json: &str) -> Result<Self, TemplateError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Serialize the template to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check a typed template against the same rules as [`Template::from_value`].
    pub fn validate(&self) -> Result<(), TemplateError> {
        for (page, schemas) in self.schemas.iter().enumerate() {
            if let Some(index) = schemas.iter().position(|s| s.schema_type.is_empty()) {
                return Err(TemplateError::MissingType { page, index });
            }
        }
        Ok(())
    }

    /// Give every schema a unique ID, keeping existing unique ones.
    pub fn ensure_ids(&mut self) {
        let mut seen: HashSet<SchemaId> = HashSet::new();
        for schema in self.schemas.iter_mut().flatten() {
            if schema.id.is_empty() || seen.contains(&schema.id) {
                schema.id = new_schema_id();
            }
            seen.insert(schema.id.clone());
        }
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.schemas.len()
    }

    /// Append empty pages until there are at least `count`. Returns true if
    /// any were added.
    pub fn ensure_pages(&mut self, count: usize) -> bool {
        if self.schemas.len() >= count {
            return false;
        }
        self.schemas.resize_with(count, Vec::new);
        true
    }

    /// Check if the template has no schemas at all.
    pub fn is_empty(&self) -> bool {
        self.schemas.iter().all(Vec::is_empty)
    }

    /// Total number of schemas across pages.
    pub fn len(&self) -> usize {
        self.schemas.iter().map(Vec::len).sum()
    }

    /// Iterate all schemas in page order, then z-order.
    pub fn iter(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.iter().flatten()
    }

    /// Locate a schema by ID as `(page, index)`.
    pub fn locate(&self, id: &str) -> Option<(usize, usize)> {
        self.schemas.iter().enumerate().find_map(|(page, schemas)| {
            schemas.iter().position(|s| s.id == id).map(|index| (page, index))
        })
    }

    /// Get a schema by ID.
    pub fn get(&self, id: &str) -> Option<&Schema> {
        self.locate(id).map(|(page, index)| &self.schemas[page][index])
    }

    /// Get a mutable schema by ID.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Schema> {
        let (page, index) = self.locate(id)?;
        Some(&mut self.schemas[page][index])
    }

    /// Check whether an ID is used anywhere in the template.
    pub fn contains_id(&self, id: &str) -> bool {
        self.iter().any(|s| s.id == id)
    }

    /// Generate an ID not used by any schema in this template.
    pub fn fresh_id(&self) -> SchemaId {
        loop {
            let id = new_schema_id();
            if !self.contains_id(&id) {
                return id;
            }
        }
    }

    /// Field names in page order, then z-order (duplicates removed).
    pub fn schema_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.iter()
            .map(|s| s.name.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Find schemas on a page at a point (millimeters), front to back.
    pub fn schemas_at_point(&self, page: usize, point: Point, tolerance: f64) -> Vec<SchemaId> {
        self.schemas
            .get(page)
            .map(|schemas| {
                schemas
                    .iter()
                    .rev()
                    .filter(|s| s.hit_test(point, tolerance))
                    .map(|s| s.id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Find schemas on a page that intersect a rectangle (millimeters).
    pub fn schemas_in_rect(&self, page: usize, rect: Rect) -> Vec<SchemaId> {
        self.schemas
            .get(page)
            .map(|schemas| {
                schemas
                    .iter()
                    .filter(|s| rect.intersect(s.bounds()).area() > 0.0)
                    .map(|s| s.id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

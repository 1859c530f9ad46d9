//! Template store: single owner and writer of the canonical template.
//!
//! Every accepted mutation replaces the template with a new `Rc<Template>`
//! and notifies observers, so consumers can diff by reference.

use crate::plugin::PluginRegistry;
use crate::schema::{Schema, SchemaError, SchemaId};
use crate::template::Template;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::rc::Rc;

/// Handle returned by [`TemplateStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// A structured mutation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Mutation {
    Add {
        page: usize,
        #[serde(rename = "type")]
        plugin_type: String,
        position: Point,
    },
    Update {
        id: SchemaId,
        key: String,
        value: Value,
    },
    Remove {
        ids: Vec<SchemaId>,
    },
}

/// An applied mutation, as reported to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum MutationReport {
    Add { page: usize, schema: Schema },
    Update { id: SchemaId, key: String, value: Value },
    Remove { ids: Vec<SchemaId> },
}

impl MutationReport {
    /// Get the action name ("add", "update" or "remove").
    pub fn action(&self) -> &'static str {
        match self {
            MutationReport::Add { .. } => "add",
            MutationReport::Update { .. } => "update",
            MutationReport::Remove { .. } => "remove",
        }
    }
}

type Observer = Box<dyn FnMut(Rc<Template>)>;

/// Owns the canonical template and the observer list.
pub struct TemplateStore {
    template: Rc<Template>,
    registry: Rc<PluginRegistry>,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: u64,
    /// Nesting depth of open batches.
    batch_depth: usize,
    /// A change happened inside a batch and has not been delivered.
    pending: bool,
}

impl TemplateStore {
    /// Create a store for a template.
    pub fn new(template: Template, registry: Rc<PluginRegistry>) -> Self {
        Self {
            template: Rc::new(template),
            registry,
            observers: Vec::new(),
            next_observer: 0,
            batch_depth: 0,
            pending: false,
        }
    }

    /// Current template.
    pub fn template(&self) -> &Rc<Template> {
        &self.template
    }

    /// Plugin registry used for insertion.
    pub fn registry(&self) -> &Rc<PluginRegistry> {
        &self.registry
    }

    /// Register an observer, called once per accepted mutation (or batch).
    pub fn subscribe(&mut self, observer: impl FnMut(Rc<Template>) + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    /// Remove every observer.
    pub fn clear_observers(&mut self) {
        self.observers.clear();
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Insert a new schema cloned from the plugin's default schema.
    ///
    /// Returns `None` (and logs) if the type is not registered or the page
    /// does not exist.
    pub fn add_schema(&mut self, page: usize, plugin_type: &str, position: Point) -> Option<Schema> {
        let Some(plugin) = self.registry.get(plugin_type) else {
            log::warn!("Cannot add schema: plugin type {} is not registered", plugin_type);
            return None;
        };
        if page >= self.template.page_count() {
            log::warn!("Cannot add schema: page {} does not exist", page);
            return None;
        }

        let mut schema = plugin.default_schema.clone();
        schema.schema_type = plugin_type.to_string();
        schema.id = self.template.fresh_id();
        schema.position = position;
        if schema.name.is_empty() || self.name_taken(&schema.name, None) {
            schema.name = self.fresh_name();
        }

        let mut next = (*self.template).clone();
        next.schemas[page].push(schema.clone());
        self.commit(next);
        Some(schema)
    }

    /// Replace exactly one field of the schema with the given ID.
    ///
    /// Returns `Ok(true)` if the template changed. An unknown ID or a value
    /// equal to the current one is a no-op without notification.
    pub fn update_schema(&mut self, id: &str, key: &str, value: Value) -> Result<bool, SchemaError> {
        let Some((page, index)) = self.template.locate(id) else {
            log::warn!("Cannot update schema: id {} not found", id);
            return Ok(false);
        };

        let mut schema = self.template.schemas[page][index].clone();
        if !schema.set_field(key, value)? {
            return Ok(false);
        }

        let mut next = (*self.template).clone();
        next.schemas[page][index] = schema;
        self.commit(next);
        Ok(true)
    }

    /// Delete schemas by ID from every page. Unknown IDs are ignored.
    ///
    /// Returns the IDs that were actually removed.
    pub fn remove_schemas(&mut self, ids: &[SchemaId]) -> Vec<SchemaId> {
        let targets: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let removed: Vec<SchemaId> = self
            .template
            .iter()
            .filter(|s| targets.contains(s.id.as_str()))
            .map(|s| s.id.clone())
            .collect();
        if removed.is_empty() {
            return removed;
        }

        let mut next = (*self.template).clone();
        for schemas in &mut next.schemas {
            schemas.retain(|s| !targets.contains(s.id.as_str()));
        }
        self.commit(next);
        removed
    }

    /// Apply a mutation descriptor.
    ///
    /// Returns the report for accepted mutations and `None` for no-ops.
    pub fn apply(&mut self, mutation: Mutation) -> Result<Option<MutationReport>, SchemaError> {
        match mutation {
            Mutation::Add {
                page,
                plugin_type,
                position,
            } => Ok(self
                .add_schema(page, &plugin_type, position)
                .map(|schema| MutationReport::Add { page, schema })),
            Mutation::Update { id, key, value } => {
                let changed = self.update_schema(&id, &key, value.clone())?;
                Ok(changed.then_some(MutationReport::Update { id, key, value }))
            }
            Mutation::Remove { ids } => {
                let removed = self.remove_schemas(&ids);
                Ok((!removed.is_empty()).then_some(MutationReport::Remove { ids: removed }))
            }
        }
    }

    /// Replace the whole template and notify.
    pub fn replace(&mut self, template: Template) {
        self.commit(template);
    }

    /// Defer notifications until the matching [`TemplateStore::end_batch`].
    pub fn begin_batch(&mut self) {
        self.batch_depth += 1;
    }

    /// Close a batch; the outermost close delivers one pending notification.
    pub fn end_batch(&mut self) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth == 0 {
            self.flush();
        }
    }

    /// Deliver a pending notification now, leaving any batch open.
    pub fn flush(&mut self) {
        if self.pending {
            self.pending = false;
            self.notify();
        }
    }

    /// Check whether a batch is open.
    pub fn in_batch(&self) -> bool {
        self.batch_depth > 0
    }

    /// Run `f` inside a batch.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_batch();
        let result = f(self);
        self.end_batch();
        result
    }

    fn commit(&mut self, next: Template) {
        self.template = Rc::new(next);
        if self.batch_depth > 0 {
            self.pending = true;
        } else {
            self.notify();
        }
    }

    fn notify(&mut self) {
        let snapshot = Rc::clone(&self.template);
        for (_, observer) in &mut self.observers {
            observer(Rc::clone(&snapshot));
        }
    }

    fn name_taken(&self, name: &str, except: Option<&str>) -> bool {
        self.template
            .iter()
            .any(|s| s.name == name && Some(s.id.as_str()) != except)
    }

    fn fresh_name(&self) -> String {
        let mut n = self.template.len() + 1;
        loop {
            let name = format!("field{}", n);
            if !self.name_taken(&name, None) {
                return name;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_registry, sample_template};
    use serde_json::json;
    use std::cell::RefCell;

    fn store_with(fields: usize) -> TemplateStore {
        TemplateStore::new(sample_template(fields), Rc::new(sample_registry()))
    }

    fn counter(store: &mut TemplateStore) -> Rc<RefCell<Vec<Rc<Template>>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(move |t| sink.borrow_mut().push(t));
        seen
    }

    #[test]
    fn test_add_schema_assigns_unique_id() {
        let mut store = store_with(2);
        let seen = counter(&mut store);

        let schema = store.add_schema(0, "text", Point::new(5.0, 6.0)).unwrap();

        assert!(!schema.id.is_empty());
        assert_eq!(store.template().iter().filter(|s| s.id == schema.id).count(), 1);
        assert_eq!(schema.position, Point::new(5.0, 6.0));
        assert_eq!(schema.name, "field3");
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_add_unregistered_type_is_noop() {
        let mut store = store_with(1);
        let seen = counter(&mut store);
        let before = Rc::clone(store.template());

        assert!(store.add_schema(0, "barcode", Point::ZERO).is_none());
        assert!(store.add_schema(7, "text", Point::ZERO).is_none());

        assert!(Rc::ptr_eq(&before, store.template()));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_update_same_value_notifies_once() {
        let mut store = store_with(1);
        let seen = counter(&mut store);

        assert_eq!(store.update_schema("schema-1", "content", json!("x")), Ok(true));
        assert_eq!(store.update_schema("schema-1", "content", json!("x")), Ok(false));

        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_update_touches_only_key() {
        let mut store = store_with(2);
        let before = store.template().get("schema-1").unwrap().clone();
        let other = store.template().get("schema-2").unwrap().clone();

        store.update_schema("schema-1", "width", json!(150)).unwrap();

        let after = store.template().get("schema-1").unwrap();
        assert!((after.width - 150.0).abs() < f64::EPSILON);
        assert_eq!(after.height, before.height);
        assert_eq!(after.name, before.name);
        assert_eq!(after.position, before.position);
        assert_eq!(store.template().get("schema-2").unwrap(), &other);
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let mut store = store_with(1);
        let seen = counter(&mut store);
        assert_eq!(store.update_schema("missing", "content", json!("x")), Ok(false));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_mutation_produces_new_template_value() {
        let mut store = store_with(1);
        let before = Rc::clone(store.template());
        store.update_schema("schema-1", "content", json!("x")).unwrap();

        assert!(!Rc::ptr_eq(&before, store.template()));
        assert_eq!(before.get("schema-1").unwrap().content, "");
    }

    #[test]
    fn test_remove_ignores_unknown_ids() {
        let mut store = store_with(2);
        let seen = counter(&mut store);

        let removed = store.remove_schemas(&["schema-1".into(), "nope".into()]);
        assert_eq!(removed, vec!["schema-1".to_string()]);
        assert_eq!(store.template().len(), 1);

        assert!(store.remove_schemas(&["nope".into()]).is_empty());
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_batch_coalesces_notifications() {
        let mut store = store_with(2);
        let seen = counter(&mut store);

        store.batch(|s| {
            s.update_schema("schema-1", "width", json!(1)).unwrap();
            s.update_schema("schema-2", "width", json!(2)).unwrap();
        });
        assert_eq!(seen.borrow().len(), 1);

        store.batch(|s| {
            s.update_schema("schema-1", "width", json!(1)).unwrap();
        });
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_flush_inside_batch() {
        let mut store = store_with(1);
        let seen = counter(&mut store);

        store.begin_batch();
        store.update_schema("schema-1", "width", json!(10)).unwrap();
        store.update_schema("schema-1", "width", json!(11)).unwrap();
        store.flush();
        assert_eq!(seen.borrow().len(), 1);
        store.update_schema("schema-1", "width", json!(12)).unwrap();
        store.end_batch();
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_observers_notified_in_subscription_order() {
        let mut store = store_with(1);
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in ["a", "b", "c"] {
            let order = Rc::clone(&order);
            store.subscribe(move |_| order.borrow_mut().push(tag));
        }
        store.update_schema("schema-1", "content", json!("x")).unwrap();
        assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unsubscribe() {
        let mut store = store_with(1);
        let seen = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&seen);
        let id = store.subscribe(move |_| *sink.borrow_mut() += 1);

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.update_schema("schema-1", "content", json!("x")).unwrap();
        assert_eq!(*seen.borrow(), 0);
    }

    #[test]
    fn test_apply_reports_action() {
        let mut store = store_with(1);
        let report = store
            .apply(Mutation::Add {
                page: 0,
                plugin_type: "text".into(),
                position: Point::new(1.0, 1.0),
            })
            .unwrap()
            .unwrap();
        assert_eq!(report.action(), "add");
        assert_eq!(serde_json::to_value(&report).unwrap()["action"], "add");

        let none = store
            .apply(Mutation::Remove { ids: vec!["nope".into()] })
            .unwrap();
        assert!(none.is_none());
    }
}

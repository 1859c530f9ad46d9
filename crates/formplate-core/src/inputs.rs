//! Input records bound to schemas by name (Form and Viewer).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One data row: field name to value.
pub type InputRecord = BTreeMap<String, String>;

/// A single changed field, reported to `onChangeInput` subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputChange {
    /// Record index.
    pub index: usize,
    /// Schema name.
    pub name: String,
    /// New value.
    pub value: String,
}

/// Compute the per-field changes between two input lists.
///
/// Only keys present in `new` and matching one of `names` are considered;
/// unmatched keys are ignored. A field absent from the old record counts as
/// the empty string. Changes are reported record by record, fields in the
/// order of `names`.
pub fn diff_inputs(names: &[&str], old: &[InputRecord], new: &[InputRecord]) -> Vec<InputChange> {
    let mut changes = Vec::new();
    for (index, record) in new.iter().enumerate() {
        let previous = old.get(index);
        for &name in names {
            let Some(value) = record.get(name) else {
                continue;
            };
            let before = previous
                .and_then(|r| r.get(name))
                .map(String::as_str)
                .unwrap_or("");
            if before != value {
                changes.push(InputChange {
                    index,
                    name: name.to_string(),
                    value: value.clone(),
                });
            }
        }
    }
    changes
}

/// Strip angle brackets and surrounding whitespace from a user-entered value.
pub fn sanitize_value(value: &str) -> String {
    value.replace(['<', '>'], "").trim().to_string()
}

/// Sanitize every value of a record.
pub fn sanitize_record(record: &InputRecord) -> InputRecord {
    record
        .iter()
        .map(|(k, v)| (k.clone(), sanitize_value(v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> InputRecord {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_single_change() {
        let old = vec![record(&[("field1", "")])];
        let new = vec![record(&[("field1", "New value")])];
        let changes = diff_inputs(&["field1"], &old, &new);
        assert_eq!(
            changes,
            vec![InputChange {
                index: 0,
                name: "field1".into(),
                value: "New value".into()
            }]
        );
    }

    #[test]
    fn test_unchanged_produces_nothing() {
        let old = vec![record(&[("field1", "Initial"), ("field2", "")])];
        let new = old.clone();
        assert!(diff_inputs(&["field1", "field2"], &old, &new).is_empty());
    }

    #[test]
    fn test_changes_follow_name_order() {
        let old = vec![record(&[("field1", ""), ("field2", "")])];
        let new = vec![record(&[("field2", "Value 2"), ("field1", "Value 1")])];
        let changes = diff_inputs(&["field1", "field2"], &old, &new);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].name, "field1");
        assert_eq!(changes[1].name, "field2");
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let old = vec![record(&[("field1", "")])];
        let new = vec![record(&[("nonexistent_field", "x")])];
        assert!(diff_inputs(&["field1"], &old, &new).is_empty());
    }

    #[test]
    fn test_new_record_index() {
        let old = vec![record(&[("field1", "a")])];
        let new = vec![record(&[("field1", "a")]), record(&[("field1", "b")])];
        let changes = diff_inputs(&["field1"], &old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].index, 1);
    }

    #[test]
    fn test_sanitize() {
        let r = record(&[("a", "  <b>bold</b> ")]);
        assert_eq!(sanitize_record(&r)["a"], "bbold/b");
    }
}

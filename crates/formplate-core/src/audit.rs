//! Template fingerprints and audit entries.

use crate::template::Template;
use serde_json::json;
use sha2::{Digest, Sha256};

/// SHA-256 of the template's compact JSON, hex encoded.
pub fn hash_template(template: &Template) -> Result<String, serde_json::Error> {
    let serialized = serde_json::to_vec(template)?;
    Ok(sha256_hex(&serialized))
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Log an info-level audit entry for an action on a template.
///
/// The entry is a single JSON object: `{"action": .., "templateHash": ..}`.
/// Returns the hash that was logged.
pub fn audit(action: &str, template: &Template) -> Option<String> {
    match hash_template(template) {
        Ok(hash) => {
            log::info!("{}", json!({ "action": action, "templateHash": hash }));
            Some(hash)
        }
        Err(e) => {
            log::warn!("Cannot fingerprint template for {}: {}", action, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{capture_logs, sample_template, take_logs};
    use serde_json::Value;

    #[test]
    fn test_hash_is_hex_sha256() {
        let hash = hash_template(&sample_template(1)).unwrap();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_hash_tracks_content() {
        let template = sample_template(2);
        let mut moved = template.clone();
        moved.schemas[0][1].position.x += 1.0;

        assert_eq!(hash_template(&template).unwrap(), hash_template(&template.clone()).unwrap());
        assert_ne!(hash_template(&template).unwrap(), hash_template(&moved).unwrap());
    }

    #[test]
    fn test_audit_logs_action_and_hash() {
        capture_logs();
        let template = sample_template(1);

        let hash = audit("saveTemplate", &template);

        let logs = take_logs();
        let entries: Vec<Value> = logs
            .iter()
            .filter(|(level, _)| *level == log::Level::Info)
            .filter_map(|(_, line)| serde_json::from_str(line).ok())
            .collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["action"], "saveTemplate");
        assert_eq!(entries[0]["templateHash"].as_str(), hash.as_deref());
    }
}

//! Record cleanup before documents leave the service
//!
//! Both sanitizers work in place and are idempotent.

use quake_common::codes;
use serde_json::{json, Map, Value};

use crate::store::{Document, ID_FIELD};

/// Internal expiry timestamp
pub const EXPIRE_FIELD: &str = "expire";

/// Keys removed from human-readable records
pub const HUMAN_READABLE_HIDDEN_FIELDS: [&str; 5] = [EXPIRE_FIELD, "ver", "hop", "uid", "user-agent"];

/// Issue type shown for tsunami evaluation entries
pub const FOCUS_ISSUE_TYPE: &str = "Focus";

/// Bulletin records: `_id` becomes `id`, `expire` is dropped
pub fn sanitize_bulletin(doc: &mut Document) {
    if let Some(id) = doc.remove(ID_FIELD) {
        doc.insert("id".to_string(), id);
    }
    doc.remove(EXPIRE_FIELD);
}

/// Human-readable records
///
/// Hidden keys are dropped, `_id` is wrapped as `{"$oid": ...}` and
/// evaluation codes are reported as the bulletin codes clients know
/// (5510 → 551, 5520 → 552). Tsunami evaluations get issue type `Focus`.
pub fn sanitize_human_readable(doc: &mut Document) {
    for key in HUMAN_READABLE_HIDDEN_FIELDS {
        doc.remove(key);
    }

    if let Some(id) = doc.get_mut(ID_FIELD) {
        if !id.is_object() {
            let raw = id.take();
            *id = json!({ "$oid": raw });
        }
    }

    match doc.get("code").and_then(Value::as_i64) {
        Some(codes::QUAKE_EVALUATION) => {
            doc.insert("code".to_string(), json!(codes::QUAKE));
        }
        Some(codes::TSUNAMI_EVALUATION) => {
            doc.insert("code".to_string(), json!(codes::TSUNAMI));
            set_issue_type(doc, FOCUS_ISSUE_TYPE);
        }
        _ => {}
    }
}

fn set_issue_type(doc: &mut Document, issue_type: &str) {
    let issue = doc
        .entry("issue")
        .or_insert_with(|| Value::Object(Map::new()));
    if !issue.is_object() {
        *issue = Value::Object(Map::new());
    }
    if let Value::Object(fields) = issue {
        fields.insert("type".to_string(), json!(issue_type));
    }
}

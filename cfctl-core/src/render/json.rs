use serde_json::Value;

use crate::error::{CfctlError, Result};

/// Render a single record as pretty-printed JSON, per spec §4.7.
pub fn render_single(record: &Value) -> Result<String> {
    serde_json::to_string_pretty(record)
        .map_err(|e| CfctlError::Proto(format!("failed to render JSON: {e}")))
}

/// Render a collection as a pretty-printed `{"results": [...]}` envelope,
/// matching the shape cfctl's own RPCs return (spec §3, scenario a).
pub fn render_collection(records: &[Value]) -> Result<String> {
    let envelope = serde_json::json!({ "results": records });
    serde_json::to_string_pretty(&envelope)
        .map_err(|e| CfctlError::Proto(format!("failed to render JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_single_record_unwrapped() {
        let out = render_single(&serde_json::json!({"name": "a"})).unwrap();
        assert!(out.contains("\"name\": \"a\""));
        assert!(!out.contains("results"));
    }

    #[test]
    fn renders_collection_wrapped_in_results() {
        let records = vec![serde_json::json!({"server_id": "s-1", "name": "a"})];
        let out = render_collection(&records).unwrap();
        assert!(out.contains("\"results\""));
        assert!(out.contains("\"server_id\": \"s-1\""));
    }

    #[test]
    fn renders_empty_collection() {
        let out = render_collection(&[]).unwrap();
        assert!(out.contains("\"results\": []"));
    }
}

use serde_json::Value;

use crate::error::Result;

/// Render a single record as one YAML document, per spec §4.7.
pub fn render_single(record: &Value) -> Result<String> {
    Ok(serde_yaml::to_string(record)?)
}

/// Render a collection as one `---`-separated YAML document per item, per
/// spec §4.7.
pub fn render_collection(records: &[Value]) -> Result<String> {
    let mut docs = Vec::with_capacity(records.len());
    for record in records {
        docs.push(serde_yaml::to_string(record)?.trim_end().to_string());
    }
    Ok(docs.join("\n---\n"))
}

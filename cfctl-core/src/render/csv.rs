use serde_json::Value;

use crate::error::{CfctlError, Result};

/// Render records as CSV, using the first record's top-level keys, sorted,
/// as columns, per spec §4.7.
pub fn render(records: &[Value]) -> Result<String> {
    let columns = collect_columns(records);

    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(&columns).map_err(csv_err)?;
    for record in records {
        let row: Vec<String> = columns.iter().map(|c| cell_value(record, c)).collect();
        writer.write_record(&row).map_err(csv_err)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CfctlError::Proto(format!("failed to flush CSV writer: {e}")))?;
    String::from_utf8(bytes).map_err(|e| CfctlError::Proto(format!("CSV output is not valid UTF-8: {e}")))
}

fn collect_columns(records: &[Value]) -> Vec<String> {
    let Some(Value::Object(obj)) = records.first() else {
        return Vec::new();
    };
    let mut columns: Vec<String> = obj.keys().cloned().collect();
    columns.sort();
    columns
}

fn cell_value(record: &Value, column: &str) -> String {
    match record.get(column) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn csv_err<E: std::fmt::Display>(e: E) -> CfctlError {
    CfctlError::Proto(format!("CSV write error: {e}"))
}

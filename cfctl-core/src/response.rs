use std::cmp::Ordering;

use serde_json::Value;

/// Post-processing options applied to a record set before rendering, per
/// spec §4.6: sort by a field, cap the number of rows, and/or project down
/// to a fixed column set.
#[derive(Debug, Clone, Default)]
pub struct ResponseOptions {
    pub sort_key: Option<String>,
    pub limit: Option<usize>,
    pub columns: Option<Vec<String>>,
}

/// Apply sort, then limit, then column projection, in that order.
pub fn post_process(records: Vec<Value>, options: &ResponseOptions) -> Vec<Value> {
    let mut records = records;

    if let Some(key) = &options.sort_key {
        records.sort_by(|a, b| cmp_json(&field(a, key), &field(b, key)));
    }

    if let Some(limit) = options.limit {
        records.truncate(limit);
    }

    if let Some(columns) = &options.columns {
        records = records.iter().map(|r| project_columns(r, columns)).collect();
    }

    records
}

fn field(record: &Value, key: &str) -> Value {
    record.get(key).cloned().unwrap_or(Value::Null)
}

fn cmp_json(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64().unwrap_or(f64::NAN))
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn project_columns(record: &Value, columns: &[String]) -> Value {
    let mut map = serde_json::Map::new();
    if let Value::Object(obj) = record {
        for column in columns {
            if let Some(v) = obj.get(column) {
                map.insert(column.clone(), v.clone());
            }
        }
    }
    Value::Object(map)
}

const TABLE_HEADER_SAMPLE_SIZE: usize = 1000;

/// Header set for the interactive table when the user named no columns:
/// the sorted union of top-level keys across the first 1,000 records, per
/// spec §4.7 (wide enough that a later record's extra field still gets a
/// column, unlike a first-record-only heuristic).
pub fn table_columns(records: &[Value]) -> Vec<String> {
    let mut columns = std::collections::BTreeSet::new();
    for record in records.iter().take(TABLE_HEADER_SAMPLE_SIZE) {
        if let Some(obj) = record.as_object() {
            columns.extend(obj.keys().cloned());
        }
    }
    columns.into_iter().collect()
}

const PREFERRED_MINIMAL_FIELDS: &[&str] = &["name", "status", "state", "created_at", "finished_at"];

/// Select the `-m`/`--minimal` column set from a record's own keys: prefer
/// `name`/`status`/`state`/`created_at`/`finished_at` and any `*_id` field,
/// falling back to `{name, created_at}` intersected with what's present.
pub fn preferred_columns(records: &[Value]) -> Vec<String> {
    let Some(obj) = records.first().and_then(|r| r.as_object()) else {
        return Vec::new();
    };

    let mut selected: Vec<String> = obj
        .keys()
        .filter(|k| PREFERRED_MINIMAL_FIELDS.contains(&k.as_str()) || k.ends_with("_id"))
        .cloned()
        .collect();

    if selected.is_empty() {
        selected = obj
            .keys()
            .filter(|k| k.as_str() == "name" || k.as_str() == "created_at")
            .cloned()
            .collect();
    }

    selected
}

/// Project a collection down to its `-m`/`--minimal` columns, per spec §4.6
/// invariant 6. A no-op when no preferred column names are present.
pub fn apply_minimal(records: Vec<Value>) -> Vec<Value> {
    let columns = preferred_columns(&records);
    if columns.is_empty() {
        return records;
    }
    records.iter().map(|r| project_columns(r, &columns)).collect()
}

use tonic::metadata::MetadataMap;

/// Build request metadata carrying the active environment's bearer token.
///
/// cfctl's auth model is a single opaque token per environment (spec §3);
/// there is no custom-header facility, so this replaces the teacher's
/// general-purpose header parser.
pub fn bearer_metadata(token: Option<&str>) -> MetadataMap {
    let mut map = MetadataMap::new();
    if let Some(token) = token {
        if let Ok(value) = token.parse() {
            map.insert("token", value);
        }
    }
    map
}

/// Format a MetadataMap as a human-readable string for diagnostic logging.
pub fn metadata_to_string(md: &MetadataMap) -> String {
    if md.is_empty() {
        return "(empty)".to_string();
    }

    let mut lines: Vec<String> = Vec::new();
    for key_and_value in md.iter() {
        if let tonic::metadata::KeyAndValueRef::Ascii(key, value) = key_and_value {
            let val_str = value.to_str().unwrap_or("<non-utf8>");
            lines.push(format!("{key}: {val_str}"));
        }
    }
    lines.sort();
    lines.join("\n")
}

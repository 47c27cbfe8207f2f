pub mod csv;
pub mod json;
pub mod table;
pub mod yaml;

use crate::error::{CfctlError, Result};
use crate::fetch::FetchOutcome;
use crate::response::table_columns;

/// Output format selected via `-o`/`-y`/`-f`, per spec §4.7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderFormat {
    Json,
    Yaml,
    Csv,
    Table,
}

/// Render a static (non-interactive) report in the requested format.
pub fn render_static(format: RenderFormat, outcome: &FetchOutcome) -> Result<String> {
    match (format, outcome) {
        (RenderFormat::Json, FetchOutcome::Single(record)) => json::render_single(record),
        (RenderFormat::Json, FetchOutcome::Collection(records)) => json::render_collection(records),
        (RenderFormat::Yaml, FetchOutcome::Single(record)) => yaml::render_single(record),
        (RenderFormat::Yaml, FetchOutcome::Collection(records)) => yaml::render_collection(records),
        (RenderFormat::Csv, FetchOutcome::Collection(records)) => csv::render(records),
        (RenderFormat::Csv, FetchOutcome::Single(_)) => Err(CfctlError::Proto(
            "csv format requires a collection response".into(),
        )),
        (RenderFormat::Table, _) => Err(CfctlError::Proto(
            "table format requires the interactive renderer".into(),
        )),
    }
}

/// Copy rendered output to the system clipboard, for `-y`/`--copy`.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| CfctlError::Other(format!("clipboard unavailable: {e}").into()))?;
    clipboard
        .set_text(text.to_string())
        .map_err(|e| CfctlError::Other(format!("failed to copy to clipboard: {e}").into()))
}

/// Launch the interactive paged table, using the columns response
/// post-processing already selected, or the sorted union of top-level keys
/// across the first 1,000 records when the caller didn't name any. A
/// single-record outcome is shown as a one-row table. `rows_per_page` is
/// the validated `--rows-per-page` value (ignored when `no_paging` is set,
/// per spec §6).
pub fn render_interactive(
    outcome: FetchOutcome,
    columns: Option<Vec<String>>,
    rows_per_page: usize,
    no_paging: bool,
) -> Result<()> {
    let records = match outcome {
        FetchOutcome::Collection(records) => records,
        FetchOutcome::Single(record) => vec![record],
    };
    let columns = columns.unwrap_or_else(|| table_columns(&records));
    let page_size = if no_paging { records.len().max(1) } else { rows_per_page };
    table::TableView::new(columns, records, page_size).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_format_rejected_for_static_render() {
        let err = render_static(RenderFormat::Table, &FetchOutcome::Collection(vec![])).unwrap_err();
        assert!(matches!(err, CfctlError::Proto(_)));
    }

    #[test]
    fn csv_format_rejected_for_single_record() {
        let outcome = FetchOutcome::Single(serde_json::json!({"name": "a"}));
        let err = render_static(RenderFormat::Csv, &outcome).unwrap_err();
        assert!(matches!(err, CfctlError::Proto(_)));
    }

    #[test]
    fn json_format_dispatches_to_collection_renderer() {
        let outcome = FetchOutcome::Collection(vec![serde_json::json!({"name": "a"})]);
        let out = render_static(RenderFormat::Json, &outcome).unwrap();
        assert!(out.contains("\"results\""));
    }

    #[test]
    fn json_format_dispatches_to_single_renderer() {
        let outcome = FetchOutcome::Single(serde_json::json!({"name": "a"}));
        let out = render_static(RenderFormat::Json, &outcome).unwrap();
        assert!(!out.contains("results"));
    }
}

use std::path::PathBuf;

use cfctl_core::render::RenderFormat;
use cfctl_core::response::ResponseOptions;

use crate::cli::RawVerbArgs;

const DEFAULT_ROWS_PER_PAGE: usize = 15;

/// A verb invocation's fully validated and coerced options.
pub struct VerbOptions {
    pub parameters: Vec<String>,
    pub json_parameter: Option<String>,
    pub file_parameter: Option<PathBuf>,
    pub format: RenderFormat,
    pub copy: bool,
    pub watch: bool,
    pub response: ResponseOptions,
    pub rows_per_page: usize,
    pub no_paging: bool,
    pub minimal: bool,
}

/// Validate and coerce a verb command's raw flags.
///
/// `is_list` selects the default output format (`table` for `list`, `yaml`
/// otherwise) and whether the `list`-only flags (`-w`/`-s`/`-c`/`-r`/`-n`/
/// `--no-paging`/`-m`) are even legal on this invocation.
pub fn validate(raw: &RawVerbArgs, is_list: bool) -> Result<VerbOptions, String> {
    let format = match raw.output.as_deref() {
        None if is_list => RenderFormat::Table,
        None => RenderFormat::Yaml,
        Some("yaml") => RenderFormat::Yaml,
        Some("json") => RenderFormat::Json,
        Some("csv") => RenderFormat::Csv,
        Some("table") => RenderFormat::Table,
        Some(other) => {
            return Err(format!(
                "unknown output format '{other}' (expected yaml, json, table, or csv)"
            ))
        }
    };

    if !is_list
        && (raw.watch
            || raw.sort.is_some()
            || raw.columns.is_some()
            || raw.rows.is_some()
            || raw.no_paging
            || raw.minimal)
    {
        return Err(
            "--watch, --sort, --columns, --rows, --no-paging, and --minimal are only valid with 'list'"
                .to_string(),
        );
    }

    let rows = match &raw.rows {
        Some(s) => Some(
            s.parse::<usize>()
                .map_err(|_| format!("--rows value '{s}' is not a non-negative integer"))?,
        ),
        None => None,
    };

    let rows_per_page = match &raw.rows_per_page {
        Some(s) => s
            .parse::<usize>()
            .map_err(|_| format!("--rows-per-page value '{s}' is not a non-negative integer"))?,
        None => DEFAULT_ROWS_PER_PAGE,
    };
    if rows_per_page == 0 {
        return Err("--rows-per-page must be greater than zero".to_string());
    }

    let columns = raw.columns.as_ref().map(|csv| {
        csv.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
    });

    Ok(VerbOptions {
        parameters: raw.parameters.clone(),
        json_parameter: raw.json_parameter.clone(),
        file_parameter: raw.file_parameter.clone(),
        format,
        copy: raw.copy,
        watch: raw.watch,
        response: ResponseOptions {
            sort_key: raw.sort.clone(),
            limit: rows,
            columns,
        },
        rows_per_page,
        no_paging: raw.no_paging,
        minimal: raw.minimal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_table_for_list() {
        let opts = validate(&RawVerbArgs::default(), true).unwrap();
        assert_eq!(opts.format, RenderFormat::Table);
    }

    #[test]
    fn defaults_to_yaml_for_non_list() {
        let opts = validate(&RawVerbArgs::default(), false).unwrap();
        assert_eq!(opts.format, RenderFormat::Yaml);
    }

    #[test]
    fn rejects_unknown_output_format() {
        let raw = RawVerbArgs { output: Some("xml".into()), ..Default::default() };
        assert!(validate(&raw, true).is_err());
    }

    #[test]
    fn rejects_watch_outside_list() {
        let raw = RawVerbArgs { watch: true, ..Default::default() };
        assert!(validate(&raw, false).is_err());
    }

    #[test]
    fn rejects_non_numeric_rows() {
        let raw = RawVerbArgs { rows: Some("abc".into()), ..Default::default() };
        assert!(validate(&raw, true).is_err());
    }

    #[test]
    fn rejects_zero_rows_per_page() {
        let raw = RawVerbArgs { rows_per_page: Some("0".into()), ..Default::default() };
        assert!(validate(&raw, true).is_err());
    }

    #[test]
    fn splits_columns_on_comma() {
        let raw = RawVerbArgs { columns: Some("name, server_id".into()), ..Default::default() };
        let opts = validate(&raw, true).unwrap();
        assert_eq!(
            opts.response.columns,
            Some(vec!["name".to_string(), "server_id".to_string()])
        );
    }
}

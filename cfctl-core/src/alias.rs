use crate::error::{CfctlError, Result};
use crate::settings::Settings;

/// Register an alias command string under a service, per spec §4.3.
///
/// `command` is the verb/resource (and any fixed parameters) the alias
/// expands to, e.g. `"list Server -p region=us-east-1"`.
pub fn register(settings: &mut Settings, service: &str, alias: &str, command: &str) -> Result<()> {
    validate_alias_name(alias)?;
    if command.trim().is_empty() {
        return Err(CfctlError::InvalidAlias("alias command must not be empty".into()));
    }

    settings
        .aliases
        .entry(service.to_string())
        .or_default()
        .insert(alias.to_string(), command.to_string());
    Ok(())
}

/// Remove a previously registered alias.
pub fn remove(settings: &mut Settings, service: &str, alias: &str) -> Result<()> {
    let removed = settings.aliases.get_mut(service).and_then(|m| m.remove(alias));
    if removed.is_none() {
        return Err(CfctlError::InvalidAlias(format!(
            "no alias '{alias}' registered for service '{service}'"
        )));
    }
    Ok(())
}

/// List registered aliases for a service, sorted by name.
pub fn list(settings: &Settings, service: &str) -> Vec<(String, String)> {
    let mut entries: Vec<(String, String)> = settings
        .aliases
        .get(service)
        .map(|table| table.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}

fn validate_alias_name(alias: &str) -> Result<()> {
    if alias.is_empty() {
        return Err(CfctlError::InvalidAlias("alias name must not be empty".into()));
    }
    if !alias.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(CfctlError::InvalidAlias(format!(
            "alias '{alias}' may only contain letters, digits, '-' and '_'"
        )));
    }
    Ok(())
}

/// Rewrite argv in place of a registered alias: if the first two tokens are
/// `<service> <alias>`, splice the alias's own tokens there, keeping
/// anything the caller appended after it. Leaves argv untouched when no
/// alias matches, so ordinary `<service> <verb> <resource>` invocations are
/// unaffected.
pub fn expand_argv(settings: &Settings, argv: &[String]) -> Vec<String> {
    if argv.len() < 2 {
        return argv.to_vec();
    }

    let service = &argv[0];
    let alias = &argv[1];
    let Some(command) = settings.aliases.get(service).and_then(|table| table.get(alias)) else {
        return argv.to_vec();
    };

    let mut expanded: Vec<String> = vec![service.clone()];
    expanded.extend(command.split_whitespace().map(String::from));
    expanded.extend(argv[2..].iter().cloned());
    expanded
}

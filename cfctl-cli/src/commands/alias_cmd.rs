use cfctl_core::alias;
use cfctl_core::error::{CfctlError, Result};
use cfctl_core::settings::Settings;

use super::service_info;

/// Register a new alias, validating its `<verb> <resource>` command against
/// live reflection data first: an alias naming a resource the service
/// doesn't actually expose is rejected before it's ever saved.
pub async fn add(settings: &mut Settings, service: &str, name: &str, command: &str) -> Result<()> {
    let resource = command
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| CfctlError::InvalidAlias("alias command must be '<verb> <resource>'".into()))?;

    let endpoint_map = cfctl_core::endpoint::resolve(settings).await?;
    let endpoint = endpoint_map.get(service)?;
    let resources = service_info::resources_for_service(endpoint, service).await?;

    if !resources.iter().any(|r| r.resource == resource) {
        return Err(CfctlError::InvalidAlias(format!(
            "resource '{resource}' not found in service '{service}'"
        )));
    }

    alias::register(settings, service, name, command)?;
    settings.save()
}

pub fn list(settings: &Settings, service: &str) -> Vec<(String, String)> {
    alias::list(settings, service)
}

pub fn remove(settings: &mut Settings, service: &str, name: &str) -> Result<()> {
    alias::remove(settings, service, name)?;
    settings.save()
}

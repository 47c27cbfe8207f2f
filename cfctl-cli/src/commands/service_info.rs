use std::collections::BTreeMap;

use cfctl_core::connection::{self, ConnectionConfig};
use cfctl_core::descriptor::DescriptorSource;
use cfctl_core::error::Result;
use cfctl_core::reflection::ServerSource;

/// The verbs a service exposes for one resource, e.g. `Server: [get, list]`.
#[derive(Debug, Clone)]
pub struct ResourceVerbs {
    pub resource: String,
    pub verbs: Vec<String>,
}

/// List every resource/verb pair a service exposes, grouped by the trailing
/// name segment of each reflected service's fully-qualified name (the same
/// `.{service}.`-segment convention `reflection::discover` uses to locate a
/// single resource). Shared by the zero-arg "show me the verbs" case in
/// `main.rs` and by alias registration validation in `alias_cmd.rs`.
pub async fn resources_for_service(endpoint: &str, service: &str) -> Result<Vec<ResourceVerbs>> {
    let conn_config = ConnectionConfig::from_url(endpoint)?;
    let channel = connection::create_channel(&conn_config, endpoint).await?;
    let source = ServerSource::new(channel);

    let service_segment = format!(".{service}.");
    let matching: Vec<String> = source
        .list_services()
        .await?
        .into_iter()
        .filter(|name| name.contains(&service_segment))
        .collect();

    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for fqn in matching {
        let Some(resource) = fqn.rsplit('.').next() else {
            continue;
        };
        let symbol = source.find_symbol(&fqn).await?;
        let Some(svc) = symbol.as_service() else {
            continue;
        };
        let verbs = grouped.entry(resource.to_string()).or_default();
        verbs.extend(svc.methods().map(|m| m.name().to_string()));
    }

    Ok(grouped
        .into_iter()
        .map(|(resource, mut verbs)| {
            verbs.sort();
            verbs.dedup();
            ResourceVerbs { resource, verbs }
        })
        .collect())
}

use cfctl_core::error::{CfctlError, Result};
use cfctl_core::settings::Settings;
use tokio::task::JoinSet;

use super::service_info::{self, ResourceVerbs};

/// One row of the `api_resources` listing.
#[derive(Debug, Clone)]
pub struct ApiResource {
    pub service: String,
    pub resource: String,
    pub verbs: Vec<String>,
}

/// Fan out to every registered endpoint concurrently and collect each
/// service's resources and verbs, using one task per endpoint so a single
/// unreachable service never blocks the rest of the listing.
pub async fn run(settings: &Settings) -> Result<Vec<ApiResource>> {
    let endpoint_map = cfctl_core::endpoint::resolve(settings).await?;

    let mut tasks: JoinSet<(String, Result<Vec<ResourceVerbs>>)> = JoinSet::new();
    for (service, endpoint) in endpoint_map.endpoints.clone() {
        tasks.spawn(async move {
            let result = service_info::resources_for_service(&endpoint, &service).await;
            (service, result)
        });
    }

    let mut rows = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let (service, result) = joined
            .map_err(|e| CfctlError::Other(format!("api_resources task panicked: {e}").into()))?;
        match result {
            Ok(resources) => rows.extend(resources.into_iter().map(|rv| ApiResource {
                service: service.clone(),
                resource: rv.resource,
                verbs: rv.verbs,
            })),
            Err(e) => {
                tracing::warn!(service = %service, error = %e, "skipping unreachable service");
            }
        }
    }

    rows.sort_by(|a, b| (&a.service, &a.resource).cmp(&(&b.service, &b.resource)));
    Ok(rows)
}

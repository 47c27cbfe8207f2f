use std::collections::HashMap;
use std::fs;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::connection::{self, ConnectionConfig};
use crate::error::{CfctlError, Result};
use crate::reflection::ServerSource;
use crate::settings::{EnvironmentConfig, Settings};

const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const ENDPOINT_SERVICE: &str = "identity";
const ENDPOINT_RESOURCE: &str = "Endpoint";

/// Mapping from short service name (`inventory`) to endpoint URL,
/// cached to disk per environment with a 24h TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointMap {
    pub fetched_at: DateTime<Utc>,
    pub endpoints: HashMap<String, String>,
}

impl EndpointMap {
    fn is_fresh(&self) -> bool {
        let age = Utc::now().signed_duration_since(self.fetched_at);
        age.to_std().map(|d| d < CACHE_TTL).unwrap_or(false)
    }

    fn cache_path(environment: &str) -> Result<std::path::PathBuf> {
        Ok(Settings::cache_dir()?.join(format!("{environment}.endpoints.yml")))
    }

    fn load_from_cache(environment: &str) -> Result<Option<EndpointMap>> {
        let path = Self::cache_path(environment)?;
        match fs::read_to_string(&path) {
            Ok(contents) => {
                let map: EndpointMap = serde_yaml::from_str(&contents)?;
                Ok(Some(map))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save_to_cache(&self, environment: &str) -> Result<()> {
        let dir = Settings::cache_dir()?;
        fs::create_dir_all(&dir)?;
        let contents = serde_yaml::to_string(self)?;
        fs::write(Self::cache_path(environment)?, contents)?;
        Ok(())
    }

    pub fn get(&self, service: &str) -> Result<&str> {
        self.endpoints
            .get(service)
            .map(String::as_str)
            .ok_or_else(|| CfctlError::EndpointNotFound(service.to_string()))
    }
}

/// Resolve the identity endpoint from a configured (possibly non-identity)
/// environment endpoint, per spec §4.1 step 3.
///
/// Two forms are recognized; anything else is a configuration error rather
/// than a guessed rewrite (see the endpoint-hostname-pattern decision in
/// DESIGN.md).
pub fn derive_identity_endpoint(env: &EnvironmentConfig) -> Result<String> {
    if env.is_proxy {
        return Ok(env.endpoint.clone());
    }

    if let Some(rest) = env.endpoint.strip_prefix("grpc+ssl://") {
        // host label rewrite: <service>.api.<env>... -> identity.api.<env>...
        if let Some(dot) = rest.find('.') {
            return Ok(format!("grpc+ssl://identity.{}", &rest[dot + 1..]));
        }
    }

    if let Some(rest) = env
        .endpoint
        .strip_prefix("https://")
        .or_else(|| env.endpoint.strip_prefix("http://"))
    {
        // console hostname rewrite: <prefix>.console.<env>.<...> -> identity.api.<env>.<...>:443
        let mut labels: Vec<&str> = rest.split('.').collect();
        if let Some(pos) = labels.iter().position(|l| *l == "console") {
            labels[pos] = "api";
            labels.insert(0, "identity");
            if pos > 0 {
                labels.remove(1);
            }
            return Ok(format!("grpc+ssl://{}:443", labels.join(".")));
        }
    }

    if env.endpoint.starts_with("grpc://") {
        return Ok(env.endpoint.clone());
    }

    Err(CfctlError::ConfigMissing(format!(
        "cannot derive an identity endpoint from '{}'",
        env.endpoint
    )))
}

/// Resolve an endpoint map for the active environment, refreshing it from
/// the identity service when the on-disk cache is stale or absent.
pub async fn resolve(settings: &Settings) -> Result<EndpointMap> {
    let environment = &settings.active_environment;

    if let Some(cached) = EndpointMap::load_from_cache(environment)? {
        if cached.is_fresh() {
            tracing::debug!(environment, "endpoint cache hit");
            return Ok(cached);
        }
        tracing::debug!(environment, "endpoint cache stale, refetching");
    }

    refresh(settings).await
}

/// Force a rebuild of the endpoint map by calling `Endpoint.list`.
pub async fn refresh(settings: &Settings) -> Result<EndpointMap> {
    let active = settings.active()?;
    let identity_endpoint = derive_identity_endpoint(active)?;
    tracing::debug!(endpoint = %identity_endpoint, "resolving endpoints");

    let conn_config = ConnectionConfig::from_url(&identity_endpoint)?;
    let channel = connection::create_channel(&conn_config, &identity_endpoint)
        .await
        .map_err(|e| CfctlError::Transport(e.to_string()))?;

    let source = ServerSource::new(channel.clone());
    let service_fqn = crate::reflection::discover(&source, ENDPOINT_SERVICE, ENDPOINT_RESOURCE)
        .await
        .map_err(|_| CfctlError::EndpointsUnavailable("Endpoint service not found via reflection".into()))?;

    let method = source
        .find_symbol(&format!("{service_fqn}.list"))
        .await
        .map_err(|e| CfctlError::EndpointsUnavailable(e.to_string()))?;
    let method_desc = method
        .as_method()
        .ok_or_else(|| CfctlError::EndpointsUnavailable("list is not a method".into()))?;

    let token = active.token.as_deref();
    let envelope = crate::invoke::invoke_envelope(
        channel,
        method_desc,
        serde_json::json!({}),
        token,
    )
    .await
    .map_err(|e| CfctlError::EndpointsUnavailable(e.to_string()))?;

    let results = envelope
        .get("results")
        .and_then(|v| v.as_array())
        .ok_or_else(|| CfctlError::EndpointsUnavailable("response had no 'results' field".into()))?;

    let mut endpoints = HashMap::new();
    for record in results {
        let service = record.get("service").and_then(|v| v.as_str());
        let endpoint = record.get("endpoint").and_then(|v| v.as_str());
        if let (Some(service), Some(endpoint)) = (service, endpoint) {
            endpoints.insert(service.to_string(), endpoint.to_string());
        }
    }

    let map = EndpointMap {
        fetched_at: Utc::now(),
        endpoints,
    };
    map.save_to_cache(&settings.active_environment)?;
    Ok(map)
}

/// Used only to check TTL math precisely in tests without a wall clock.
#[allow(dead_code)]
fn fresh_cutoff() -> SystemTime {
    SystemTime::now() - CACHE_TTL
}

use serde_json::Value;

use crate::binder;
use crate::connection::{self, ConnectionConfig};
use crate::descriptor::DescriptorSource;
use crate::endpoint;
use crate::error::{CfctlError, Result};
use crate::invoke;
use crate::reflection::{self, ServerSource};
use crate::response::{self, ResponseOptions};
use crate::settings::Settings;

/// The shape of an invoked response, per spec §3's response envelope rule:
/// a top-level `results` array makes it a collection (sortable, limitable,
/// projectable, renderable as table/CSV); anything else is a single record.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Single(Value),
    Collection(Vec<Value>),
}

/// Resolve and invoke `<service> <verb> <resource>` end to end, returning
/// an outcome ready for rendering.
///
/// Mirrors the pipeline named in spec §4.9: endpoint resolution (C2),
/// reflection-based service discovery (C2), method resolution, parameter
/// binding (C5), invocation (C6), then post-processing (C7) — skipped for
/// single-record responses, per §4.9's state machine. Rendering (C8) is
/// left to the caller, since it differs for static vs. interactive output.
pub async fn dispatch(
    settings: &Settings,
    service: &str,
    verb: &str,
    resource: &str,
    params: serde_json::Value,
    response_opts: &ResponseOptions,
) -> Result<FetchOutcome> {
    let active = settings.active()?;
    let token = active.token.as_deref();

    let endpoints = endpoint::resolve(settings).await?;
    let service_endpoint = endpoints.get(service)?;

    let conn_config = ConnectionConfig::from_url(service_endpoint)?;
    let channel = connection::create_channel(&conn_config, service_endpoint).await?;

    let source = ServerSource::new(channel.clone());
    let service_fqn = reflection::discover(&source, service, resource).await?;

    let method_symbol = source.find_symbol(&format!("{service_fqn}.{verb}")).await?;
    let method_desc = method_symbol
        .as_method()
        .ok_or_else(|| CfctlError::ServiceNotFound(service.to_string(), resource.to_string()))?;

    let request = binder::bind(&method_desc.input(), params)?;
    let envelopes = invoke::invoke(channel, method_desc, request, token).await?;

    Ok(collate(envelopes, response_opts))
}

/// Turn the raw per-message responses from the invoker into a single
/// outcome, per testable property 7 (streaming collation): N>=2 messages
/// always collate into a collection of length N; a single message is a
/// collection only if it itself carries a top-level `results` array.
fn collate(mut envelopes: Vec<Value>, response_opts: &ResponseOptions) -> FetchOutcome {
    if envelopes.len() == 1 {
        match envelopes.pop().expect("len checked above") {
            Value::Object(mut obj) => match obj.remove("results") {
                Some(Value::Array(items)) => {
                    FetchOutcome::Collection(response::post_process(items, response_opts))
                }
                Some(other) => {
                    obj.insert("results".to_string(), other);
                    FetchOutcome::Single(Value::Object(obj))
                }
                None => FetchOutcome::Single(Value::Object(obj)),
            },
            other => FetchOutcome::Single(other),
        }
    } else {
        FetchOutcome::Collection(response::post_process(envelopes, response_opts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_envelope_without_results_is_a_single_record() {
        let envelopes = vec![serde_json::json!({"user_id": "u-1", "name": "a"})];
        let outcome = collate(envelopes, &ResponseOptions::default());
        assert_eq!(
            outcome,
            FetchOutcome::Single(serde_json::json!({"user_id": "u-1", "name": "a"}))
        );
    }

    #[test]
    fn single_envelope_with_results_array_is_a_collection() {
        let envelopes = vec![serde_json::json!({"results": [{"server_id": "s-1"}]})];
        let outcome = collate(envelopes, &ResponseOptions::default());
        assert_eq!(
            outcome,
            FetchOutcome::Collection(vec![serde_json::json!({"server_id": "s-1"})])
        );
    }

    #[test]
    fn multiple_streamed_messages_collate_into_a_collection() {
        let envelopes = vec![serde_json::json!({"id": "a"}), serde_json::json!({"id": "b"})];
        let outcome = collate(envelopes, &ResponseOptions::default());
        assert_eq!(
            outcome,
            FetchOutcome::Collection(vec![
                serde_json::json!({"id": "a"}),
                serde_json::json!({"id": "b"})
            ])
        );
    }
}

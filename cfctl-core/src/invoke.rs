use http::uri::PathAndQuery;
use prost_reflect::{DynamicMessage, MethodDescriptor};
use tonic::client::Grpc;
use tonic::transport::Channel;

use crate::codec::DynamicCodec;
use crate::connection;
use crate::error::{CfctlError, Result};
use crate::format::{json_formatter, Formatter, FormatOptions};
use crate::metadata;

/// Invoke a resolved method against an already-bound request message.
///
/// Unary methods yield exactly one record; server-streaming methods yield
/// one record per streamed response. Client-streaming and bidirectional
/// methods are rejected, per spec §4.6's Non-goal on multi-message RPCs.
pub async fn invoke(
    channel: Channel,
    method_desc: &MethodDescriptor,
    request: DynamicMessage,
    token: Option<&str>,
) -> Result<Vec<serde_json::Value>> {
    if method_desc.is_client_streaming() {
        return Err(CfctlError::UnsupportedMethodKind);
    }

    let request_desc = method_desc.input();
    let response_desc = method_desc.output();
    let codec = DynamicCodec::new(request_desc, response_desc);

    let service_name = method_desc.parent_service().full_name();
    let method_name = method_desc.name();
    let path: PathAndQuery = format!("/{service_name}/{method_name}")
        .parse()
        .map_err(|e| CfctlError::Proto(format!("invalid method path: {e}")))?;

    let md = metadata::bearer_metadata(token);
    let max_size = connection::max_message_size();
    let mut client = Grpc::new(channel)
        .accept_compressed(tonic::codec::CompressionEncoding::Gzip)
        .max_decoding_message_size(max_size)
        .max_encoding_message_size(max_size);
    client
        .ready()
        .await
        .map_err(|e| CfctlError::Transport(format!("service not ready: {e}")))?;

    let mut req = tonic::Request::new(request);
    *req.metadata_mut() = md;

    let formatter = json_formatter(&FormatOptions { emit_defaults: true });

    if method_desc.is_server_streaming() {
        let response = client.server_streaming(req, path, codec).await?;
        let mut stream = response.into_inner();
        let mut values = Vec::new();
        while let Some(msg) = stream.message().await? {
            values.push(message_to_json(&msg, &formatter)?);
        }
        Ok(values)
    } else {
        let response = client.unary(req, path, codec).await?;
        Ok(vec![message_to_json(response.get_ref(), &formatter)?])
    }
}

fn message_to_json(msg: &DynamicMessage, formatter: &Formatter) -> Result<serde_json::Value> {
    let text = (formatter)(msg)?;
    serde_json::from_str(&text).map_err(|e| CfctlError::Proto(format!("failed to parse formatted response: {e}")))
}

/// Invoke a unary method with bare JSON request parameters, bypassing the
/// parameter binder's unknown-field validation. Used for cfctl's own
/// bootstrap calls, such as resolving the endpoint map from `Endpoint.list`.
pub async fn invoke_envelope(
    channel: Channel,
    method_desc: &MethodDescriptor,
    params: serde_json::Value,
    token: Option<&str>,
) -> Result<serde_json::Value> {
    let options = prost_reflect::DeserializeOptions::new().deny_unknown_fields(false);
    let request = DynamicMessage::deserialize_with_options(method_desc.input(), params, &options)
        .map_err(|e| CfctlError::Proto(format!("failed to build request: {e}")))?;

    let mut values = invoke(channel, method_desc, request, token).await?;
    values
        .pop()
        .ok_or_else(|| CfctlError::Proto("empty response".into()))
}

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use prost::Message;
use prost_reflect::DescriptorPool;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::Channel;
use tonic_reflection::pb::v1;
use tonic_reflection::pb::v1::server_reflection_client::ServerReflectionClient as V1Client;
use tonic_reflection::pb::v1alpha;

use crate::descriptor::{self, DescriptorSource, SymbolDescriptor};
use crate::error::{CfctlError, Result};

const VERSION_UNKNOWN: u8 = 0;
const VERSION_V1: u8 = 1;
const VERSION_V1ALPHA: u8 = 2;

const REFLECTION_SERVICE_PREFIX: &str = "grpc.reflection.";

/// Descriptor source backed by gRPC server reflection.
///
/// Implements automatic version negotiation: tries v1 first, falls back to
/// v1alpha on an Unimplemented error.
///
/// The descriptor pool is lazily populated as symbols are queried. Since
/// prost-reflect descriptors use Arc internally and don't borrow from the
/// pool, a Mutex provides safe interior mutability.
pub struct ServerSource {
    channel: Channel,
    pool: Mutex<DescriptorPool>,
    version: AtomicU8,
}

impl ServerSource {
    pub fn new(channel: Channel) -> Self {
        ServerSource {
            channel,
            pool: Mutex::new(DescriptorPool::new()),
            version: AtomicU8::new(VERSION_UNKNOWN),
        }
    }

    async fn reflect(
        &self,
        message_request: v1::server_reflection_request::MessageRequest,
    ) -> Result<v1::server_reflection_response::MessageResponse> {
        let cached = self.version.load(Ordering::Relaxed);
        match cached {
            VERSION_V1 => return self.reflect_v1(message_request).await,
            VERSION_V1ALPHA => return self.reflect_v1alpha(message_request).await,
            _ => {}
        }

        match self.reflect_v1(message_request.clone()).await {
            Ok(resp) => {
                self.version.store(VERSION_V1, Ordering::Relaxed);
                Ok(resp)
            }
            Err(e) if is_unimplemented(&e) => {
                let resp = self.reflect_v1alpha(message_request).await?;
                self.version.store(VERSION_V1ALPHA, Ordering::Relaxed);
                Ok(resp)
            }
            Err(e) => Err(e),
        }
    }

    async fn reflect_v1(
        &self,
        message_request: v1::server_reflection_request::MessageRequest,
    ) -> Result<v1::server_reflection_response::MessageResponse> {
        let request = v1::ServerReflectionRequest {
            host: String::new(),
            message_request: Some(message_request),
        };

        let (tx, rx) = mpsc::channel(1);
        tx.send(request)
            .await
            .map_err(|_| CfctlError::Other("failed to send reflection request".into()))?;
        drop(tx);

        let mut client = V1Client::new(self.channel.clone());
        let req = tonic::Request::new(ReceiverStream::new(rx));
        let response = client
            .server_reflection_info(req)
            .await
            .map_err(map_status_error)?;

        let mut stream = response.into_inner();
        let resp = stream
            .message()
            .await
            .map_err(CfctlError::GrpcStatus)?
            .ok_or_else(|| CfctlError::Other("empty reflection response stream".into()))?;

        extract_response(resp.message_response)
    }

    async fn reflect_v1alpha(
        &self,
        message_request: v1::server_reflection_request::MessageRequest,
    ) -> Result<v1::server_reflection_response::MessageResponse> {
        let alpha_request = convert_request_to_v1alpha(message_request);

        let (tx, rx) = mpsc::channel(1);
        tx.send(alpha_request)
            .await
            .map_err(|_| CfctlError::Other("failed to send reflection request".into()))?;
        drop(tx);

        let mut client =
            v1alpha::server_reflection_client::ServerReflectionClient::new(self.channel.clone());
        let req = tonic::Request::new(ReceiverStream::new(rx));
        let response = client
            .server_reflection_info(req)
            .await
            .map_err(map_status_error)?;

        let mut stream = response.into_inner();
        let resp = stream
            .message()
            .await
            .map_err(CfctlError::GrpcStatus)?
            .ok_or_else(|| CfctlError::Other("empty reflection response stream".into()))?;

        convert_response_from_v1alpha(resp)
    }

    /// Add serialized file descriptor protos to our pool, fetching any
    /// missing dependencies (e.g., well-known types) from the server via
    /// reflection.
    async fn add_file_descriptors(&self, serialized_fds: &[Vec<u8>]) -> Result<()> {
        let new_files = {
            let pool = self
                .pool
                .lock()
                .map_err(|_| CfctlError::Other("internal lock poisoned".into()))?;
            let mut files = Vec::new();
            for bytes in serialized_fds {
                let fdp =
                    prost_types::FileDescriptorProto::decode(bytes.as_slice()).map_err(|e| {
                        CfctlError::Proto(format!("failed to decode file descriptor: {e}"))
                    })?;

                let file_name = fdp.name.as_deref().unwrap_or("");
                if pool.get_file_by_name(file_name).is_some() {
                    continue;
                }

                files.push(fdp);
            }
            files
        };

        if new_files.is_empty() {
            return Ok(());
        }

        let missing = {
            let pool = self
                .pool
                .lock()
                .map_err(|_| CfctlError::Other("internal lock poisoned".into()))?;
            let mut missing_files = Vec::new();
            let new_names: std::collections::HashSet<_> =
                new_files.iter().filter_map(|f| f.name.as_deref()).collect();
            for fdp in &new_files {
                for dep in &fdp.dependency {
                    if pool.get_file_by_name(dep).is_none() && !new_names.contains(dep.as_str()) {
                        missing_files.push(dep.clone());
                    }
                }
            }
            missing_files
        };

        for dep_name in missing {
            let msg = v1::server_reflection_request::MessageRequest::FileByFilename(dep_name);
            if let Ok(v1::server_reflection_response::MessageResponse::FileDescriptorResponse(
                fdr,
            )) = self.reflect(msg).await
            {
                Box::pin(self.add_file_descriptors(&fdr.file_descriptor_proto)).await?;
            }
        }

        let mut pool = self
            .pool
            .lock()
            .map_err(|_| CfctlError::Other("internal lock poisoned".into()))?;
        let final_files: Vec<_> = new_files
            .into_iter()
            .filter(|fdp| {
                let name = fdp.name.as_deref().unwrap_or("");
                pool.get_file_by_name(name).is_none()
            })
            .collect();
        if !final_files.is_empty() {
            let fds = prost_types::FileDescriptorSet {
                file: final_files.clone(),
            };
            match pool.add_file_descriptor_set(fds) {
                Ok(()) => {}
                Err(_) => {
                    for fdp in final_files {
                        let name = fdp.name.clone().unwrap_or_else(|| "<unknown>".into());
                        let single_fds = prost_types::FileDescriptorSet { file: vec![fdp] };
                        if let Err(e) = pool.add_file_descriptor_set(single_fds) {
                            tracing::warn!(file = %name, error = %e, "skipping file descriptor");
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn list_services_async(&self) -> Result<Vec<String>> {
        let msg = v1::server_reflection_request::MessageRequest::ListServices(String::new());
        let resp = self.reflect(msg).await?;

        match resp {
            v1::server_reflection_response::MessageResponse::ListServicesResponse(list) => {
                Ok(list.service.into_iter().map(|s| s.name).collect())
            }
            _ => Err(CfctlError::Other(
                "unexpected reflection response for list_services".into(),
            )),
        }
    }

    async fn find_symbol_async(&self, name: &str) -> Result<SymbolDescriptor> {
        {
            let pool = self
                .pool
                .lock()
                .map_err(|_| CfctlError::Other("internal lock poisoned".into()))?;
            if let Ok(sym) = descriptor::find_symbol_in_pool(&pool, name) {
                return Ok(sym);
            }
        }

        let msg =
            v1::server_reflection_request::MessageRequest::FileContainingSymbol(name.to_string());
        let resp = self.reflect(msg).await?;

        if let v1::server_reflection_response::MessageResponse::FileDescriptorResponse(fdr) = resp {
            self.add_file_descriptors(&fdr.file_descriptor_proto)
                .await?;
        }

        let pool = self
            .pool
            .lock()
            .map_err(|_| CfctlError::Other("internal lock poisoned".into()))?;
        descriptor::find_symbol_in_pool(&pool, name)
    }
}

#[async_trait]
impl DescriptorSource for ServerSource {
    async fn list_services(&self) -> Result<Vec<String>> {
        self.list_services_async().await
    }

    async fn find_symbol(&self, fully_qualified_name: &str) -> Result<SymbolDescriptor> {
        self.find_symbol_async(fully_qualified_name).await
    }

    fn descriptor_pool(&self) -> Option<&DescriptorPool> {
        // Cannot return a reference through a Mutex; callers needing the
        // pool go through find_symbol() instead.
        None
    }
}

/// Resolve the fully-qualified service name matching `<service> <resource>`
/// per spec §4.2: list all services, filter out reflection's own services,
/// then find one containing `.<service>.` as a path segment and ending in
/// `.<resource>`. Ties are broken by preferring the canonical
/// `spaceone.api.<service>.` prefix, then by descending version.
pub async fn discover(
    source: &ServerSource,
    service: &str,
    resource: &str,
) -> Result<String> {
    let services = source.list_services().await?;
    let service_segment = format!(".{service}.");
    let resource_suffix = format!(".{resource}");
    let canonical_prefix = format!("spaceone.api.{service}.");

    let mut candidates: Vec<String> = services
        .into_iter()
        .filter(|name| !name.starts_with(REFLECTION_SERVICE_PREFIX))
        .filter(|name| name.contains(&service_segment) && name.ends_with(&resource_suffix))
        .collect();

    if candidates.is_empty() {
        return Err(CfctlError::ServiceNotFound(
            service.to_string(),
            resource.to_string(),
        ));
    }

    candidates.sort_by(|a, b| {
        let a_canonical = a.starts_with(&canonical_prefix);
        let b_canonical = b.starts_with(&canonical_prefix);
        match (a_canonical, b_canonical) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => version_of(b).cmp(&version_of(a)),
        }
    });

    Ok(candidates.remove(0))
}

/// Extract a trailing version segment like `v1`/`v2` for tie-breaking;
/// unversioned names sort lowest.
fn version_of(fqn: &str) -> u32 {
    fqn.split('.')
        .find_map(|segment| segment.strip_prefix('v')?.parse::<u32>().ok())
        .unwrap_or(0)
}

fn map_status_error(status: tonic::Status) -> CfctlError {
    if status.code() == tonic::Code::Unimplemented {
        CfctlError::Transport("server does not support the reflection API".into())
    } else {
        CfctlError::GrpcStatus(status)
    }
}

fn is_unimplemented(err: &CfctlError) -> bool {
    matches!(err, CfctlError::GrpcStatus(s) if s.code() == tonic::Code::Unimplemented)
        || matches!(err, CfctlError::Transport(msg) if msg.contains("reflection API"))
}

fn extract_response(
    msg: Option<v1::server_reflection_response::MessageResponse>,
) -> Result<v1::server_reflection_response::MessageResponse> {
    let msg = msg.ok_or_else(|| CfctlError::Other("reflection response has no message".into()))?;

    if let v1::server_reflection_response::MessageResponse::ErrorResponse(ref err) = msg {
        return Err(CfctlError::Other(
            format!(
                "reflection error (code {}): {}",
                err.error_code, err.error_message
            )
            .into(),
        ));
    }

    Ok(msg)
}

fn convert_request_to_v1alpha(
    msg: v1::server_reflection_request::MessageRequest,
) -> v1alpha::ServerReflectionRequest {
    use v1::server_reflection_request::MessageRequest;
    let alpha_msg = match msg {
        MessageRequest::FileByFilename(s) => {
            v1alpha::server_reflection_request::MessageRequest::FileByFilename(s)
        }
        MessageRequest::FileContainingSymbol(s) => {
            v1alpha::server_reflection_request::MessageRequest::FileContainingSymbol(s)
        }
        MessageRequest::FileContainingExtension(ext) => {
            v1alpha::server_reflection_request::MessageRequest::FileContainingExtension(
                v1alpha::ExtensionRequest {
                    containing_type: ext.containing_type,
                    extension_number: ext.extension_number,
                },
            )
        }
        MessageRequest::AllExtensionNumbersOfType(s) => {
            v1alpha::server_reflection_request::MessageRequest::AllExtensionNumbersOfType(s)
        }
        MessageRequest::ListServices(s) => {
            v1alpha::server_reflection_request::MessageRequest::ListServices(s)
        }
    };
    v1alpha::ServerReflectionRequest {
        host: String::new(),
        message_request: Some(alpha_msg),
    }
}

fn convert_response_from_v1alpha(
    resp: v1alpha::ServerReflectionResponse,
) -> Result<v1::server_reflection_response::MessageResponse> {
    use v1alpha::server_reflection_response::MessageResponse;
    let msg =
        resp.message_response
            .ok_or_else(|| CfctlError::Other("reflection response has no message".into()))?;

    let v1_msg = match msg {
        MessageResponse::FileDescriptorResponse(fdr) => {
            v1::server_reflection_response::MessageResponse::FileDescriptorResponse(
                v1::FileDescriptorResponse {
                    file_descriptor_proto: fdr.file_descriptor_proto,
                },
            )
        }
        MessageResponse::AllExtensionNumbersResponse(ext) => {
            v1::server_reflection_response::MessageResponse::AllExtensionNumbersResponse(
                v1::ExtensionNumberResponse {
                    base_type_name: ext.base_type_name,
                    extension_number: ext.extension_number,
                },
            )
        }
        MessageResponse::ListServicesResponse(list) => {
            v1::server_reflection_response::MessageResponse::ListServicesResponse(
                v1::ListServiceResponse {
                    service: list
                        .service
                        .into_iter()
                        .map(|s| v1::ServiceResponse { name: s.name })
                        .collect(),
                },
            )
        }
        MessageResponse::ErrorResponse(err) => {
            return Err(CfctlError::Other(
                format!(
                    "reflection error (code {}): {}",
                    err.error_code, err.error_message
                )
                .into(),
            ));
        }
    };

    Ok(v1_msg)
}

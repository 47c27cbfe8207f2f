use std::time::Duration;

use tonic::transport::{Channel, ClientTlsConfig, Endpoint};

use crate::error::{CfctlError, Result};

const DEFAULT_CONNECT_TIMEOUT_SECS: f64 = 10.0;
const MAX_MSG_SIZE: usize = 10 * 1024 * 1024;

/// The URL scheme named in an environment's endpoint, per spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Plaintext gRPC, used for local development endpoints.
    Grpc,
    /// gRPC over TLS with native root verification.
    GrpcSsl,
}

/// Connection configuration for establishing a gRPC channel, derived from an
/// environment's scheme-prefixed endpoint URL.
///
/// Trimmed from the teacher's `ConnectionConfig`: cfctl's data model only
/// ever dials `grpc`/`grpc+ssl` (an `http(s)` endpoint is resolved to a
/// `grpc+ssl` identity endpoint before a channel is ever opened, per
/// `endpoint::derive_identity_endpoint`), so Unix sockets, mTLS, ALTS, and
/// SSLKEYLOGFILE support are dropped (see DESIGN.md).
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub scheme: Scheme,
    pub authority: String,
    pub connect_timeout: Option<f64>,
}

impl ConnectionConfig {
    /// Parse a scheme-prefixed endpoint URL (`grpc://host:port` or
    /// `grpc+ssl://host:port`) into a dialable configuration.
    pub fn from_url(url: &str) -> Result<ConnectionConfig> {
        if let Some(authority) = url.strip_prefix("grpc+ssl://") {
            return Ok(ConnectionConfig {
                scheme: Scheme::GrpcSsl,
                authority: authority.to_string(),
                connect_timeout: None,
            });
        }
        if let Some(authority) = url.strip_prefix("grpc://") {
            return Ok(ConnectionConfig {
                scheme: Scheme::Grpc,
                authority: authority.to_string(),
                connect_timeout: None,
            });
        }
        Err(CfctlError::ConfigMissing(format!(
            "endpoint '{url}' must use the grpc:// or grpc+ssl:// scheme"
        )))
    }
}

/// Build a tonic Channel for the given connection configuration.
///
/// `address` is accepted alongside `config` so callers can dial a URL
/// directly without re-deriving the authority; for cfctl's own endpoints
/// the two always agree.
pub async fn create_channel(config: &ConnectionConfig, address: &str) -> Result<Channel> {
    let _ = address;
    let scheme = match config.scheme {
        Scheme::Grpc => "http",
        Scheme::GrpcSsl => "https",
    };
    let uri = format!("{scheme}://{}", config.authority);

    let mut endpoint: Endpoint = Channel::from_shared(uri.clone())
        .map_err(|e| CfctlError::Transport(format!("invalid endpoint '{uri}': {e}")))?;

    let connect_timeout = config
        .connect_timeout
        .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);
    endpoint = endpoint.connect_timeout(Duration::from_secs_f64(connect_timeout));

    if config.scheme == Scheme::GrpcSsl {
        let tls = ClientTlsConfig::new().with_native_roots();
        endpoint = endpoint
            .tls_config(tls)
            .map_err(|e| CfctlError::Transport(format!("TLS configuration error: {e}")))?;
    }

    endpoint
        .connect()
        .await
        .map_err(|e| CfctlError::Transport(format!("failed to connect to {}: {e}", config.authority)))
}

/// Maximum in-bound/out-bound message size cfctl permits on any RPC.
pub fn max_message_size() -> usize {
    MAX_MSG_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_grpc_ssl_scheme() {
        let config = ConnectionConfig::from_url("grpc+ssl://identity.api.dev.example:443").unwrap();
        assert_eq!(config.scheme, Scheme::GrpcSsl);
        assert_eq!(config.authority, "identity.api.dev.example:443");
    }

    #[test]
    fn parses_plaintext_grpc_scheme() {
        let config = ConnectionConfig::from_url("grpc://localhost:50051").unwrap();
        assert_eq!(config.scheme, Scheme::Grpc);
        assert_eq!(config.authority, "localhost:50051");
    }

    #[test]
    fn rejects_unrecognized_scheme() {
        assert!(ConnectionConfig::from_url("https://console.dev.example.com").is_err());
    }
}

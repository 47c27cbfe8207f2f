use std::fmt;

/// All error types produced by the dispatch engine.
#[derive(Debug)]
pub enum CfctlError {
    /// No environment selected, or the active environment has no endpoint.
    ConfigMissing(String),

    /// The active environment has no bearer token.
    AuthMissing,

    /// The identity service's `Endpoint.list` RPC could not be used to
    /// bootstrap the endpoint map.
    EndpointsUnavailable(String),

    /// No endpoint registered for the requested service.
    EndpointNotFound(String),

    /// Reflection listed no service matching `<service> <resource>`.
    ServiceNotFound(String, String),

    /// A parameter bound to a field the target message does not have.
    UnknownField { name: String, valid: Vec<String> },

    /// The server rejected the request for a missing required field.
    MissingRequiredParameter(String),

    /// Client-streaming or bidirectional-streaming methods are not invoked.
    UnsupportedMethodKind,

    /// An alias failed registration validation.
    InvalidAlias(String),

    /// Transport-level dial/invoke failure.
    Transport(String),

    /// An I/O error (settings file, cache file, etc.).
    Io(std::io::Error),

    /// A protobuf/descriptor decoding error.
    Proto(String),

    /// A gRPC status error returned by the server.
    GrpcStatus(tonic::Status),

    /// Any other error.
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for CfctlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CfctlError::ConfigMissing(msg) => write!(f, "{msg}"),
            CfctlError::AuthMissing => write!(
                f,
                "no access token for the active environment; log in and retry"
            ),
            CfctlError::EndpointsUnavailable(msg) => {
                write!(f, "could not fetch service endpoints: {msg}")
            }
            CfctlError::EndpointNotFound(service) => {
                write!(f, "no endpoint registered for service '{service}'")
            }
            CfctlError::ServiceNotFound(service, resource) => write!(
                f,
                "no resource '{resource}' found for service '{service}'"
            ),
            CfctlError::UnknownField { name, valid } => {
                write!(f, "unknown parameter '{name}' (valid fields: {})", valid.join(", "))
            }
            CfctlError::MissingRequiredParameter(name) => {
                write!(f, "missing required parameter: {name}")
            }
            CfctlError::UnsupportedMethodKind => {
                write!(f, "client-streaming and bidirectional methods are not supported")
            }
            CfctlError::InvalidAlias(reason) => write!(f, "invalid alias: {reason}"),
            CfctlError::Transport(msg) => write!(f, "transport error: {msg}"),
            CfctlError::Io(err) => write!(f, "I/O error: {err}"),
            CfctlError::Proto(msg) => write!(f, "proto error: {msg}"),
            CfctlError::GrpcStatus(status) => {
                write!(f, "gRPC error: {} - {}", status.code(), status.message())
            }
            CfctlError::Other(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CfctlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CfctlError::Io(err) => Some(err),
            CfctlError::Other(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CfctlError {
    fn from(err: std::io::Error) -> Self {
        CfctlError::Io(err)
    }
}

impl From<tonic::Status> for CfctlError {
    fn from(status: tonic::Status) -> Self {
        CfctlError::GrpcStatus(status)
    }
}

impl From<serde_yaml::Error> for CfctlError {
    fn from(err: serde_yaml::Error) -> Self {
        CfctlError::Proto(err.to_string())
    }
}

/// Convenience type alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CfctlError>;

/// Extract a missing-required-parameter field name out of a server error
/// message of the shape `ERROR_REQUIRED_PARAMETER (key = <name>)`.
///
/// Built from the server's response to `MissingRequiredParameter`, per
/// scenario (f).
pub fn parse_missing_required_parameter(message: &str) -> Option<String> {
    let start = message.find("key = ")? + "key = ".len();
    let rest = &message[start..];
    let end = rest.find(')').unwrap_or(rest.len());
    let name = rest[..end].trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_not_found_error(err: &CfctlError) -> bool {
        match err {
            CfctlError::EndpointNotFound(_) | CfctlError::ServiceNotFound(_, _) => true,
            CfctlError::GrpcStatus(status) => status.code() == tonic::Code::NotFound,
            _ => false,
        }
    }

    #[test]
    fn not_found_error_detected() {
        let err = CfctlError::EndpointNotFound("inventory".into());
        assert!(is_not_found_error(&err));
    }

    #[test]
    fn grpc_not_found_detected() {
        let status = tonic::Status::not_found("service not found");
        let err = CfctlError::GrpcStatus(status);
        assert!(is_not_found_error(&err));
    }

    #[test]
    fn other_errors_not_detected_as_not_found() {
        let err = CfctlError::AuthMissing;
        assert!(!is_not_found_error(&err));
    }

    #[test]
    fn display_formatting() {
        let err = CfctlError::EndpointNotFound("inventory".into());
        assert_eq!(
            err.to_string(),
            "no endpoint registered for service 'inventory'"
        );
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: CfctlError = io_err.into();
        assert!(matches!(err, CfctlError::Io(_)));
    }

    #[test]
    fn extracts_missing_parameter_name() {
        let msg = "ERROR_REQUIRED_PARAMETER (key = email)";
        assert_eq!(
            parse_missing_required_parameter(msg),
            Some("email".to_string())
        );
    }

    #[test]
    fn missing_parameter_absent_returns_none() {
        assert_eq!(parse_missing_required_parameter("some other error"), None);
    }
}

use std::io;

use prost_reflect::{DynamicMessage, SerializeOptions};

use crate::error::{CfctlError, Result};

/// Options controlling response formatting.
#[derive(Debug, Clone, Default)]
pub struct FormatOptions {
    /// Include fields with default/zero values in JSON output.
    pub emit_defaults: bool,
}

/// Type alias for a response formatter function.
pub type Formatter = Box<dyn Fn(&DynamicMessage) -> Result<String>>;

/// Create a JSON response formatter.
///
/// Produces pretty-printed JSON with 2-space indentation. If `emit_defaults`
/// is true, includes fields with default/zero values.
pub fn json_formatter(options: &FormatOptions) -> Formatter {
    let serialize_options = SerializeOptions::new()
        .skip_default_fields(!options.emit_defaults)
        .stringify_64_bit_integers(true);

    Box::new(move |msg: &DynamicMessage| {
        let mut buf = Vec::new();
        let mut serializer = serde_json::Serializer::pretty(&mut buf);

        msg.serialize_with_options(&mut serializer, &serialize_options)
            .map_err(|e| CfctlError::Proto(format!("failed to format response as JSON: {e}")))?;

        let json = String::from_utf8(buf)
            .map_err(|e| CfctlError::Proto(format!("JSON output is not valid UTF-8: {e}")))?;

        Ok(normalize_json_floats(&json))
    })
}

/// Strip trailing ".0" from whole-valued JSON numbers so integral doubles
/// print the way the rest of the platform's JSON APIs render them.
fn normalize_json_floats(json: &str) -> String {
    use regex::Regex;
    use std::sync::LazyLock;

    static FLOAT_REGEX: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m): (\d+)\.0([,\s\n\r\}\]]|$)").expect("float regex"));

    FLOAT_REGEX.replace_all(json, ": $1$2").into_owned()
}

/// Map a tonic gRPC status code to its canonical name.
pub fn status_code_name(code: tonic::Code) -> &'static str {
    match code {
        tonic::Code::Ok => "OK",
        tonic::Code::Cancelled => "Canceled",
        tonic::Code::Unknown => "Unknown",
        tonic::Code::InvalidArgument => "InvalidArgument",
        tonic::Code::DeadlineExceeded => "DeadlineExceeded",
        tonic::Code::NotFound => "NotFound",
        tonic::Code::AlreadyExists => "AlreadyExists",
        tonic::Code::PermissionDenied => "PermissionDenied",
        tonic::Code::ResourceExhausted => "ResourceExhausted",
        tonic::Code::FailedPrecondition => "FailedPrecondition",
        tonic::Code::Aborted => "Aborted",
        tonic::Code::OutOfRange => "OutOfRange",
        tonic::Code::Unimplemented => "Unimplemented",
        tonic::Code::Internal => "Internal",
        tonic::Code::Unavailable => "Unavailable",
        tonic::Code::DataLoss => "DataLoss",
        tonic::Code::Unauthenticated => "Unauthenticated",
    }
}

/// Print a gRPC status to stderr in cfctl's standard error format.
pub fn print_status(status: &tonic::Status) {
    write_status(&mut io::stderr(), status);
}

/// Write a gRPC status to the given writer.
pub fn write_status(w: &mut dyn io::Write, status: &tonic::Status) {
    let _ = writeln!(w, "ERROR:");
    let _ = writeln!(w, "  Code: {}", status_code_name(status.code()));
    let _ = writeln!(w, "  Message: {}", status.message());
}

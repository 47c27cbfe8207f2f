use async_trait::async_trait;
use prost_reflect::{DescriptorPool, ExtensionDescriptor, FieldDescriptor, MessageDescriptor};

use crate::error::{CfctlError, Result};

/// Abstraction over a source of protobuf descriptors.
///
/// cfctl only ever discovers services through gRPC server reflection
/// (`reflection::ServerSource`); the trait stays separate from that
/// implementation so the invoker and binder depend on behavior, not a
/// concrete transport.
#[async_trait]
pub trait DescriptorSource: Send + Sync {
    /// Return the names of all services exposed by this source.
    async fn list_services(&self) -> Result<Vec<String>>;

    /// Find a descriptor by its fully-qualified name.
    ///
    /// The name can refer to a service, method, message, enum, field,
    /// extension, or any other protobuf element. Returns
    /// `CfctlError::Other` if the symbol does not exist.
    async fn find_symbol(&self, fully_qualified_name: &str) -> Result<SymbolDescriptor>;

    /// Return the underlying descriptor pool, if available.
    fn descriptor_pool(&self) -> Option<&DescriptorPool> {
        None
    }
}

/// A resolved protobuf symbol descriptor.
#[derive(Debug, Clone)]
pub enum SymbolDescriptor {
    Service(prost_reflect::ServiceDescriptor),
    Method(prost_reflect::MethodDescriptor),
    Message(MessageDescriptor),
    Enum(prost_reflect::EnumDescriptor),
    Field(FieldDescriptor),
    Extension(ExtensionDescriptor),
    OneOf(prost_reflect::OneofDescriptor),
    EnumValue(prost_reflect::EnumValueDescriptor),
    File(prost_reflect::FileDescriptor),
}

impl SymbolDescriptor {
    pub fn full_name(&self) -> &str {
        match self {
            SymbolDescriptor::Service(d) => d.full_name(),
            SymbolDescriptor::Method(d) => d.full_name(),
            SymbolDescriptor::Message(d) => d.full_name(),
            SymbolDescriptor::Enum(d) => d.full_name(),
            SymbolDescriptor::Field(d) => d.full_name(),
            SymbolDescriptor::Extension(d) => d.full_name(),
            SymbolDescriptor::OneOf(d) => d.full_name(),
            SymbolDescriptor::EnumValue(d) => d.full_name(),
            SymbolDescriptor::File(d) => d.name(),
        }
    }

    pub fn type_label(&self) -> &'static str {
        match self {
            SymbolDescriptor::Service(_) => "a service",
            SymbolDescriptor::Method(_) => "a method",
            SymbolDescriptor::Message(d) => {
                if d.is_map_entry() {
                    "the entry type for a map field"
                } else {
                    "a message"
                }
            }
            SymbolDescriptor::Enum(_) => "an enum",
            SymbolDescriptor::Field(d) => {
                if d.is_group() {
                    "the type of a group field"
                } else {
                    "a field"
                }
            }
            SymbolDescriptor::Extension(_) => "an extension",
            SymbolDescriptor::OneOf(_) => "a one-of",
            SymbolDescriptor::EnumValue(_) => "an enum value",
            SymbolDescriptor::File(_) => "a file",
        }
    }

    pub fn as_message(&self) -> Option<&MessageDescriptor> {
        match self {
            SymbolDescriptor::Message(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_service(&self) -> Option<&prost_reflect::ServiceDescriptor> {
        match self {
            SymbolDescriptor::Service(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&prost_reflect::MethodDescriptor> {
        match self {
            SymbolDescriptor::Method(d) => Some(d),
            _ => None,
        }
    }

    pub fn parent_file(&self) -> prost_reflect::FileDescriptor {
        match self {
            SymbolDescriptor::Service(d) => d.parent_file(),
            SymbolDescriptor::Method(d) => d.parent_service().parent_file(),
            SymbolDescriptor::Message(d) => d.parent_file(),
            SymbolDescriptor::Enum(d) => d.parent_file(),
            SymbolDescriptor::Field(d) => d.parent_message().parent_file(),
            SymbolDescriptor::Extension(d) => d.parent_file(),
            SymbolDescriptor::OneOf(d) => d.parent_message().parent_file(),
            SymbolDescriptor::EnumValue(d) => d.parent_enum().parent_file(),
            SymbolDescriptor::File(d) => d.clone(),
        }
    }
}

/// List all services from a descriptor source, sorted.
pub async fn list_services(source: &dyn DescriptorSource) -> Result<Vec<String>> {
    let mut services = source.list_services().await?;
    services.sort();
    Ok(services)
}

/// List all methods for a service, sorted.
pub async fn list_methods(source: &dyn DescriptorSource, service: &str) -> Result<Vec<String>> {
    let symbol = source.find_symbol(service).await?;
    let svc = symbol
        .as_service()
        .ok_or_else(|| CfctlError::Other(format!("Service not found: {service}").into()))?;

    let mut methods: Vec<String> = svc.methods().map(|m| m.full_name().to_string()).collect();
    methods.sort();
    Ok(methods)
}

/// Find any symbol by fully-qualified name in a descriptor pool.
///
/// Tries all top-level descriptor types (service, message, enum, extension),
/// then falls back to sub-element lookups (methods, fields, oneofs, enum
/// values) by splitting the name at the last dot and looking up the parent
/// first.
pub(crate) fn find_symbol_in_pool(pool: &DescriptorPool, name: &str) -> Result<SymbolDescriptor> {
    if let Some(svc) = pool.get_service_by_name(name) {
        return Ok(SymbolDescriptor::Service(svc));
    }
    if let Some(msg) = pool.get_message_by_name(name) {
        return Ok(SymbolDescriptor::Message(msg));
    }
    if let Some(e) = pool.get_enum_by_name(name) {
        return Ok(SymbolDescriptor::Enum(e));
    }
    if let Some(ext) = pool.get_extension_by_name(name) {
        return Ok(SymbolDescriptor::Extension(ext));
    }

    if let Some((parent_name, child_name)) = name.rsplit_once('.') {
        if let Some(svc) = pool.get_service_by_name(parent_name) {
            for method in svc.methods() {
                if method.name() == child_name {
                    return Ok(SymbolDescriptor::Method(method));
                }
            }
        }

        if let Some(msg) = pool.get_message_by_name(parent_name) {
            for field in msg.fields() {
                if field.name() == child_name {
                    return Ok(SymbolDescriptor::Field(field));
                }
            }
            for oneof in msg.oneofs() {
                if oneof.name() == child_name {
                    return Ok(SymbolDescriptor::OneOf(oneof));
                }
            }
        }

        if let Some(e) = pool.get_enum_by_name(parent_name) {
            for val in e.values() {
                if val.name() == child_name {
                    return Ok(SymbolDescriptor::EnumValue(val));
                }
            }
        }
    }

    for file in pool.files() {
        if file.name() == name {
            return Ok(SymbolDescriptor::File(file));
        }
    }

    Err(CfctlError::Other(format!("symbol not found: {name}").into()))
}

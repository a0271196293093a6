//! # Descriptor Registry
//!
//! An immutable, queryable set of file descriptors with all imports resolved. It acts as
//! the database of schema definitions for one invocation: the request and response
//! `MessageDescriptor`s handed out by the resolver are views into it.
use prost_reflect::{
    DescriptorError, DescriptorPool, EnumDescriptor, ExtensionDescriptor, FileDescriptor,
    MessageDescriptor, ServiceDescriptor,
};
use prost_types::{DescriptorProto, FileDescriptorProto, FileDescriptorSet};

/// The well-known message used to decode responses without a schema.
pub const EMPTY_MESSAGE: &str = "google.protobuf.Empty";

const EMPTY_FILE: &str = "google/protobuf/empty.proto";

#[derive(Debug, Clone)]
pub struct Registry {
    pool: DescriptorPool,
}

/// Anything a fully qualified name can point at in the registry.
#[derive(Debug, Clone)]
pub enum Symbol {
    Message(MessageDescriptor),
    Enum(EnumDescriptor),
    Service(ServiceDescriptor),
    Extension(ExtensionDescriptor),
}

impl Symbol {
    /// Returns the full_name (e.g.,`my.package.v1.MyMessage`) of the inner descriptor
    pub fn full_name(&self) -> &str {
        match self {
            Symbol::Message(v) => v.full_name(),
            Symbol::Enum(v) => v.full_name(),
            Symbol::Service(v) => v.full_name(),
            Symbol::Extension(v) => v.full_name(),
        }
    }

    /// Human-readable kind, as used in `.proto` syntax.
    pub fn kind(&self) -> &'static str {
        match self {
            Symbol::Message(_) => "message",
            Symbol::Enum(_) => "enum",
            Symbol::Service(_) => "service",
            Symbol::Extension(_) => "extension",
        }
    }
}

impl Registry {
    /// Decodes an encoded `FileDescriptorSet`, as written by `protoc -o`.
    pub fn decode(bytes: &[u8]) -> Result<Self, DescriptorError> {
        let pool = DescriptorPool::decode(bytes)?;
        Ok(Self { pool })
    }

    pub fn from_file_descriptor_set(set: FileDescriptorSet) -> Result<Self, DescriptorError> {
        let pool = DescriptorPool::from_file_descriptor_set(set)?;
        Ok(Self { pool })
    }

    /// Makes sure [`EMPTY_MESSAGE`] can be looked up, even if none of the compiled files
    /// import it.
    pub fn with_empty_message(mut self) -> Result<Self, DescriptorError> {
        if self.pool.get_message_by_name(EMPTY_MESSAGE).is_none() {
            self.pool.add_file_descriptor_proto(empty_file())?;
        }
        Ok(self)
    }

    pub fn message(&self, full_name: &str) -> Option<MessageDescriptor> {
        self.pool.get_message_by_name(full_name)
    }

    /// Looks up whatever descriptor lives at `full_name`.
    pub fn symbol(&self, full_name: &str) -> Option<Symbol> {
        let pool = &self.pool;

        if let Some(descriptor) = pool.get_message_by_name(full_name) {
            return Some(Symbol::Message(descriptor));
        }
        if let Some(descriptor) = pool.get_enum_by_name(full_name) {
            return Some(Symbol::Enum(descriptor));
        }
        if let Some(descriptor) = pool.get_service_by_name(full_name) {
            return Some(Symbol::Service(descriptor));
        }
        if let Some(descriptor) = pool.get_extension_by_name(full_name) {
            return Some(Symbol::Extension(descriptor));
        }
        None
    }

    pub fn files(&self) -> impl Iterator<Item = FileDescriptor> + '_ {
        self.pool.files()
    }
}

fn empty_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(EMPTY_FILE.to_string()),
        package: Some("google.protobuf".to_string()),
        message_type: vec![DescriptorProto {
            name: Some("Empty".to_string()),
            ..Default::default()
        }],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}

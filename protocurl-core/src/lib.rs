//! # Protocurl Core
//!
//! `protocurl-core` is the library powering the `protocurl` CLI. It sends Protobuf messages
//! over plain HTTP, using nothing but `.proto` files and human-readable text: no generated
//! code is required at any point.
//!
//! ## Pipeline
//!
//! A single invocation runs strictly in sequence:
//!
//! 1. **[`compiler`]**: Drives `protoc` over a directory of `.proto` files and loads the
//!    resulting `FileDescriptorSet` into a [`registry::Registry`].
//! 2. **[`resolver`]**: Maps a user-given type name (fully qualified, or `..Name` for a bare
//!    name) to exactly one `MessageDescriptor`.
//! 3. **[`codec`]**: Converts Protobuf text or JSON into wire-format bytes and back, using
//!    `prost_reflect::DynamicMessage`. Also offers a schema-free "raw" decode.
//! 4. **[`dispatcher`]**: Sends the bytes through `curl` or a built-in HTTP client and checks
//!    that the response status is 2XX.
//!
//! [`workflow`] ties the steps together and reports progress through a [`report::Reporter`].
//!
//! ## Executables
//!
//! External tools (`protoc`, `curl`) are looked up through an [`locator::ExecutableLocator`]
//! that callers create once and pass by reference.
//!
//! ## Re-exports
//!
//! This crate re-exports `prost-reflect` to ensure that consumers use a compatible version.
pub mod codec;
pub mod compiler;
pub mod dispatcher;
mod error;
pub mod locator;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod workflow;

pub use error::{ConfigurationError, Error};

// Re-exports
pub use prost_reflect;

/// Prefix of every temporary directory created for `protoc` or `curl`.
pub(crate) const TEMP_PREFIX: &str = "protocurl-temp-";

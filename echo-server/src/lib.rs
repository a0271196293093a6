//! # Echo Server
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide an HTTP server speaking
//! protobuf-over-HTTP, together with the `.proto` files it understands, for integration
//! testing the `protocurl` workspace.
//! It is not intended for production use.
//!
//! * [`PROTO_DIR`] points at the fixture `.proto` sources, for tests that drive `protoc`.
//! * [`file_descriptor_set`] is the same schema, built by hand, for tests that must not
//!   depend on a `protoc` being installed.
//! * [`spawn`] starts the server on an ephemeral local port.
mod descriptors;
mod server;

pub use descriptors::file_descriptor_set;
pub use server::{HAPPY_DAY_REASON, HappyDayResponse, RECEIVED_CONTENT_TYPE, spawn};

/// Directory containing the fixture `.proto` files.
pub const PROTO_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/proto");

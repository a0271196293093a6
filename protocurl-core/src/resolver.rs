//! # Message Resolver
//!
//! Maps a user-given type identifier to exactly one [`MessageDescriptor`].
//!
//! * `my.package.MyMessage` is looked up directly by its fully qualified name.
//! * `..MyMessage` searches every message of every file, nested ones included, for the
//!   bare name `MyMessage`. It succeeds only if exactly one message carries that name.
use crate::registry::{Registry, Symbol};
use prost_reflect::MessageDescriptor;
use std::{collections::BTreeSet, convert::Infallible, fmt, str::FromStr};
use tracing::debug;

/// Marks a type identifier as a bare name to be searched for.
pub const INFERRED_PREFIX: &str = "..";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeIdentifier {
    /// A fully qualified name, e.g. `my.package.MyMessage`.
    Exact(String),
    /// A bare message name, e.g. `MyMessage`, written as `..MyMessage`.
    Inferred(String),
}

impl TypeIdentifier {
    pub fn parse(value: &str) -> Self {
        match value.strip_prefix(INFERRED_PREFIX) {
            Some(name) => TypeIdentifier::Inferred(name.to_string()),
            None => TypeIdentifier::Exact(value.to_string()),
        }
    }
}

impl FromStr for TypeIdentifier {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(value))
    }
}

impl fmt::Display for TypeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeIdentifier::Exact(name) => write!(f, "{name}"),
            TypeIdentifier::Inferred(name) => write!(f, "{INFERRED_PREFIX}{name}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error(
        "I couldn't find any Protobuf message for '{0}'.\nDid you correctly include your proto files directory?\nDid you correctly specify the message type? Use '..Name' to search by the bare message name."
    )]
    NotFound(TypeIdentifier),

    #[error("'{name}' is a {kind}, not a message.")]
    NotAMessage { name: String, kind: &'static str },

    #[error(
        "Message with base name '{name}' is not unique. Found {} messages with package paths: {}.\nUse the fully qualified name instead, or select a single proto file.",
        .candidates.len(),
        .candidates.join(", ")
    )]
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },
}

/// Resolves `identifier` to the single message descriptor it designates.
pub fn resolve(
    registry: &Registry,
    identifier: &TypeIdentifier,
) -> Result<MessageDescriptor, ResolutionError> {
    match identifier {
        TypeIdentifier::Exact(name) => resolve_by_full_name(registry, identifier, name),
        TypeIdentifier::Inferred(name) => resolve_by_base_name(registry, identifier, name),
    }
}

fn resolve_by_full_name(
    registry: &Registry,
    identifier: &TypeIdentifier,
    name: &str,
) -> Result<MessageDescriptor, ResolutionError> {
    debug!("Looking up message with full name: {name}");

    match registry.symbol(name) {
        Some(Symbol::Message(descriptor)) => Ok(descriptor),
        Some(other) => Err(ResolutionError::NotAMessage {
            name: name.to_string(),
            kind: other.kind(),
        }),
        None => Err(ResolutionError::NotFound(identifier.clone())),
    }
}

fn resolve_by_base_name(
    registry: &Registry,
    identifier: &TypeIdentifier,
    name: &str,
) -> Result<MessageDescriptor, ResolutionError> {
    debug!("Searching for message with base name: {name}");

    let mut matches = Vec::new();
    for file in registry.files() {
        collect_by_name(file.messages(), name, &mut matches);
    }

    let candidates: BTreeSet<String> = matches
        .iter()
        .map(|descriptor| descriptor.full_name().to_string())
        .collect();

    debug!("Resolved message package-paths for name {name}: {candidates:?}");

    match candidates.len() {
        0 => Err(ResolutionError::NotFound(identifier.clone())),
        1 => matches
            .into_iter()
            .next()
            .ok_or_else(|| ResolutionError::NotFound(identifier.clone())),
        _ => Err(ResolutionError::Ambiguous {
            name: name.to_string(),
            candidates: candidates.into_iter().collect(),
        }),
    }
}

fn collect_by_name(
    messages: impl Iterator<Item = MessageDescriptor>,
    name: &str,
    found: &mut Vec<MessageDescriptor>,
) {
    for message in messages {
        collect_by_name(message.child_messages(), name, found);
        if message.name() == name {
            found.push(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_identifiers() {
        assert_eq!(
            TypeIdentifier::parse("happyday.Ping"),
            TypeIdentifier::Exact("happyday.Ping".to_string())
        );
        assert_eq!(
            TypeIdentifier::parse("..Ping"),
            TypeIdentifier::Inferred("Ping".to_string())
        );
        assert_eq!(TypeIdentifier::parse("..Ping").to_string(), "..Ping");
    }
}

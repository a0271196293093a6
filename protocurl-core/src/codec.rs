//! # Text/JSON <-> Protobuf Codec
//!
//! Converts between human-readable payloads and Protobuf wire format, driven purely by a
//! `MessageDescriptor`: no generated Rust structs are involved.
//!
//! ## How it works
//!
//! 1. **Encoding**:
//!    - Parses Protobuf text format or JSON into a `prost_reflect::DynamicMessage`.
//!    - Serializes it canonically: fields in field-number order and map entries sorted by
//!      key, so the same input always yields the same bytes.
//!
//! 2. **Decoding**:
//!    - Decodes the bytes into a `DynamicMessage`. Fields unknown to the descriptor are
//!      rejected.
//!    - Renders the message as multi-line text, dense JSON or pretty JSON. JSON keeps the
//!      original proto field names.
//!
//! 3. **Raw decoding**:
//!    - Decodes against `google.protobuf.Empty`, so every field is unknown, and renders the
//!      field numbers with their wire values. This is best effort: a length-delimited field
//!      may be a string, bytes or an embedded message, and there is no schema to tell.
use crate::ConfigurationError;
use prost::{
    Message,
    encoding::{WireType, encode_key, encode_varint},
};
use prost_reflect::{
    DynamicMessage, ExtensionDescriptor, FieldDescriptor, Kind, MapKey, MessageDescriptor,
    ReflectMessage, SerializeOptions, Value,
    text_format::{FormatOptions, ParseError},
};
use serde_json::ser::{Formatter, PrettyFormatter};
use std::{cmp::Ordering, fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::JsonPretty)
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFormat::Text => f.write_str("text"),
            InputFormat::Json => f.write_str("json"),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => f.write_str("text"),
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::JsonPretty => f.write_str("json:pretty"),
        }
    }
}

impl FromStr for InputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(InputFormat::Text),
            "json" => Ok(InputFormat::Json),
            other => Err(format!(
                "Unknown input format '{other}'. Expected 'text' or 'json'"
            )),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "json:pretty" => Ok(OutputFormat::JsonPretty),
            other => Err(format!(
                "Unknown output format '{other}'. Expected 'text', 'json' or 'json:pretty'"
            )),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Payload is not valid Protobuf text for '{message}': '{source}'")]
    InvalidText { message: String, source: ParseError },

    #[error("JSON payload does not match the Protobuf schema of '{message}': '{source}'")]
    InvalidJson {
        message: String,
        source: serde_json::Error,
    },

    #[error("Failed to decode Protobuf bytes as '{message}': '{source}'")]
    InvalidBinary {
        message: String,
        source: prost::DecodeError,
    },

    #[error("Protobuf bytes contain fields unknown to '{message}': {numbers:?}")]
    UnknownFields { message: String, numbers: Vec<u32> },

    #[error("Failed to render '{message}' as JSON: '{source}'")]
    Render {
        message: String,
        source: serde_json::Error,
    },
}

/// Guesses the payload format from its shape: a leading `{` means JSON.
pub fn infer_input_format(payload: &str) -> InputFormat {
    if payload.trim_start().starts_with('{') {
        InputFormat::Json
    } else {
        InputFormat::Text
    }
}

/// The format to parse `payload` with. An explicitly `pinned` format must agree with the
/// payload's shape.
pub fn resolve_input_format(
    payload: &str,
    pinned: Option<InputFormat>,
) -> Result<InputFormat, ConfigurationError> {
    let inferred = infer_input_format(payload);
    match pinned {
        Some(pinned) if pinned != inferred => {
            Err(ConfigurationError::InputFormatMismatch { pinned, inferred })
        }
        _ => Ok(inferred),
    }
}

/// Parses `payload` as a `descriptor` message and serializes it to wire format.
pub fn encode(
    descriptor: &MessageDescriptor,
    payload: &str,
    format: InputFormat,
) -> Result<Vec<u8>, CodecError> {
    let message = match format {
        InputFormat::Text => DynamicMessage::parse_text_format(descriptor.clone(), payload)
            .map_err(|source| CodecError::InvalidText {
                message: descriptor.full_name().to_string(),
                source,
            })?,
        InputFormat::Json => {
            parse_json(descriptor, payload).map_err(|source| CodecError::InvalidJson {
                message: descriptor.full_name().to_string(),
                source,
            })?
        }
    };

    let mut buf = Vec::new();
    encode_canonical(&message, &mut buf);
    Ok(buf)
}

/// Decodes wire-format `binary` as a `descriptor` message and renders it.
pub fn decode(
    descriptor: &MessageDescriptor,
    binary: &[u8],
    format: OutputFormat,
) -> Result<String, CodecError> {
    let message = decode_message(descriptor, binary)?;

    let mut unknown = Vec::new();
    collect_unknown_fields(&message, &mut unknown);
    if !unknown.is_empty() {
        return Err(CodecError::UnknownFields {
            message: descriptor.full_name().to_string(),
            numbers: unknown,
        });
    }

    match format {
        OutputFormat::Text => Ok(render_text(&message, &FormatOptions::new().pretty(true))),
        OutputFormat::Json => render_json(&message, serde_json::Serializer::new(Vec::new())),
        OutputFormat::JsonPretty => render_json(
            &message,
            serde_json::Serializer::with_formatter(Vec::new(), PrettyFormatter::with_indent(b"  ")),
        ),
    }
}

/// Schema-free decode: every field of `binary` is shown as an unknown field of `empty`,
/// which must be the `google.protobuf.Empty` descriptor.
pub fn decode_raw(empty: &MessageDescriptor, binary: &[u8]) -> Result<String, CodecError> {
    let message = decode_message(empty, binary)?;
    let options = FormatOptions::new().pretty(true).skip_unknown_fields(false);
    Ok(render_text(&message, &options))
}

fn decode_message(
    descriptor: &MessageDescriptor,
    binary: &[u8],
) -> Result<DynamicMessage, CodecError> {
    DynamicMessage::decode(descriptor.clone(), binary).map_err(|source| {
        CodecError::InvalidBinary {
            message: descriptor.full_name().to_string(),
            source,
        }
    })
}

fn parse_json(
    descriptor: &MessageDescriptor,
    payload: &str,
) -> Result<DynamicMessage, serde_json::Error> {
    let mut deserializer = serde_json::Deserializer::from_str(payload);
    let message = DynamicMessage::deserialize(descriptor.clone(), &mut deserializer)?;
    deserializer.end()?;
    Ok(message)
}

fn render_text(message: &DynamicMessage, options: &FormatOptions) -> String {
    message
        .to_text_format_with_options(options)
        .trim_end()
        .to_string()
}

fn render_json<F: Formatter>(
    message: &DynamicMessage,
    mut serializer: serde_json::Serializer<Vec<u8>, F>,
) -> Result<String, CodecError> {
    let options = SerializeOptions::new().use_proto_field_name(true);

    message
        .serialize_with_options(&mut serializer, &options)
        .map_err(|source| CodecError::Render {
            message: message.descriptor().full_name().to_string(),
            source,
        })?;

    Ok(String::from_utf8_lossy(&serializer.into_inner()).into_owned())
}

fn collect_unknown_fields(message: &DynamicMessage, numbers: &mut Vec<u32>) {
    numbers.extend(message.unknown_fields().map(|field| field.number()));

    let values = message
        .fields()
        .map(|(_, value)| value)
        .chain(message.extensions().map(|(_, value)| value));

    for value in values {
        match value {
            Value::Message(nested) => collect_unknown_fields(nested, numbers),
            Value::List(items) => items
                .iter()
                .filter_map(Value::as_message)
                .for_each(|nested| collect_unknown_fields(nested, numbers)),
            Value::Map(entries) => entries
                .values()
                .filter_map(Value::as_message)
                .for_each(|nested| collect_unknown_fields(nested, numbers)),
            _ => {}
        }
    }
}

/// A populated field or extension of a message.
enum Slot<'a> {
    Field(FieldDescriptor, &'a Value),
    Extension(ExtensionDescriptor, &'a Value),
}

impl Slot<'_> {
    fn number(&self) -> u32 {
        match self {
            Slot::Field(field, _) => field.number(),
            Slot::Extension(extension, _) => extension.number(),
        }
    }

    fn value(&self) -> &Value {
        match self {
            Slot::Field(_, value) | Slot::Extension(_, value) => value,
        }
    }

    fn is_embedded(&self) -> bool {
        match self {
            Slot::Field(field, _) => matches!(field.kind(), Kind::Message(_)) && !field.is_group(),
            Slot::Extension(extension, _) => {
                matches!(extension.kind(), Kind::Message(_)) && !extension.is_group()
            }
        }
    }

    // prost-reflect encodes a message holding only this slot.
    fn encode_alone(&self, parent: &DynamicMessage, buf: &mut Vec<u8>) {
        let mut single = DynamicMessage::new(parent.descriptor());
        match self {
            Slot::Field(field, value) => single.set_field(field, (*value).clone()),
            Slot::Extension(extension, value) => single.set_extension(extension, (*value).clone()),
        }
        buf.extend(single.encode_to_vec());
    }
}

// Embedded messages are written by hand (tag, length, payload) so that maps at any depth
// can be emitted in key order. Every other field is encoded by prost-reflect on its own.
fn encode_canonical(message: &DynamicMessage, buf: &mut Vec<u8>) {
    let mut slots: Vec<Slot<'_>> = message
        .fields()
        .map(|(field, value)| Slot::Field(field, value))
        .chain(
            message
                .extensions()
                .map(|(extension, value)| Slot::Extension(extension, value)),
        )
        .collect();
    slots.sort_by_key(|slot| slot.number());

    for slot in &slots {
        let number = slot.number();

        match (slot, slot.value()) {
            (Slot::Field(field, _), Value::Map(entries)) => {
                let Kind::Message(entry_descriptor) = field.kind() else {
                    continue;
                };

                let mut sorted: Vec<_> = entries.iter().collect();
                sorted.sort_by(|(a, _), (b, _)| compare_map_keys(a, b));

                for (key, value) in sorted {
                    let mut entry = DynamicMessage::new(entry_descriptor.clone());
                    entry.set_field_by_number(1, map_key_value(key));
                    entry.set_field_by_number(2, value.clone());
                    encode_embedded(number, &entry, buf);
                }
            }
            (_, Value::Message(nested)) if slot.is_embedded() => {
                encode_embedded(number, nested, buf)
            }
            (_, Value::List(items)) if slot.is_embedded() => items
                .iter()
                .filter_map(Value::as_message)
                .for_each(|nested| encode_embedded(number, nested, buf)),
            _ => slot.encode_alone(message, buf),
        }
    }
}

fn encode_embedded(number: u32, message: &DynamicMessage, buf: &mut Vec<u8>) {
    let mut payload = Vec::new();
    encode_canonical(message, &mut payload);

    encode_key(number, WireType::LengthDelimited, buf);
    encode_varint(payload.len() as u64, buf);
    buf.extend_from_slice(&payload);
}

// Keys of one map always share a variant.
fn compare_map_keys(a: &MapKey, b: &MapKey) -> Ordering {
    match (a, b) {
        (MapKey::Bool(a), MapKey::Bool(b)) => a.cmp(b),
        (MapKey::I32(a), MapKey::I32(b)) => a.cmp(b),
        (MapKey::I64(a), MapKey::I64(b)) => a.cmp(b),
        (MapKey::U32(a), MapKey::U32(b)) => a.cmp(b),
        (MapKey::U64(a), MapKey::U64(b)) => a.cmp(b),
        (MapKey::String(a), MapKey::String(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

fn map_key_value(key: &MapKey) -> Value {
    match key {
        MapKey::Bool(v) => Value::Bool(*v),
        MapKey::I32(v) => Value::I32(*v),
        MapKey::I64(v) => Value::I64(*v),
        MapKey::U32(v) => Value::U32(*v),
        MapKey::U64(v) => Value::U64(*v),
        MapKey::String(v) => Value::String(v.clone()),
    }
}

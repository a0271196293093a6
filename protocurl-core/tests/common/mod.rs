#![allow(dead_code)]

use http::Method;
use protocurl_core::{
    codec::OutputFormat,
    compiler::{CompileOptions, FileSelection, ProtocSource},
    dispatcher::{DispatchOptions, TransportStrategy},
    locator::ExecutableLocator,
    registry::Registry,
    report::Reporter,
    resolver::TypeIdentifier,
    workflow::RequestSpec,
};
use std::{cell::RefCell, path::PathBuf};

/// The fixture schema, without going through `protoc`.
pub fn registry() -> Registry {
    Registry::from_file_descriptor_set(echo_server::file_descriptor_set())
        .unwrap()
        .with_empty_message()
        .unwrap()
}

pub fn has_executable(name: &str) -> bool {
    let found = ExecutableLocator::new().probe(name).is_some();
    if !found {
        eprintln!("'{name}' is not on PATH, skipping.");
    }
    found
}

pub fn spec(
    url: String,
    request_type: &str,
    response_type: Option<&str>,
    payload: &str,
) -> RequestSpec {
    let mut dispatch = DispatchOptions::new(url, Method::POST);
    dispatch.strategy = TransportStrategy::ForceBuiltin;

    RequestSpec {
        compile: CompileOptions {
            proto_dir: PathBuf::from(echo_server::PROTO_DIR),
            files: FileSelection::Infer,
            protoc: ProtocSource::Global,
        },
        request_type: TypeIdentifier::parse(request_type),
        response_type: response_type.map(TypeIdentifier::parse),
        payload: payload.to_string(),
        input_format: None,
        output_format: OutputFormat::Text,
        dispatch,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Request { text: String, binary: Vec<u8> },
    ResponseReceived { headers: String, binary: Vec<u8> },
    ResponseText(String),
    ToolOutput { tool: String, stdout: String, stderr: String },
}

/// Records every reported artifact, in order.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub events: RefCell<Vec<Event>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }
}

impl Reporter for RecordingReporter {
    fn request(&self, text: &str, binary: &[u8]) {
        self.events.borrow_mut().push(Event::Request {
            text: text.to_string(),
            binary: binary.to_vec(),
        });
    }

    fn response_received(&self, headers: &str, binary: &[u8]) {
        self.events.borrow_mut().push(Event::ResponseReceived {
            headers: headers.to_string(),
            binary: binary.to_vec(),
        });
    }

    fn response_text(&self, text: &str) {
        self.events
            .borrow_mut()
            .push(Event::ResponseText(text.to_string()));
    }

    fn tool_output(&self, tool: &str, stdout: &str, stderr: &str) {
        self.events.borrow_mut().push(Event::ToolOutput {
            tool: tool.to_string(),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        });
    }
}

//! # CLI
//!
//! This module defines the command-line interface of `protocurl` using `clap`.
//!
//! Besides parsing, it resolves flags that imply or override each other (e.g. `--curl-path`
//! implies `--curl`, `-q` silences `-v`) before handing a [`RequestSpec`] to the core.
use clap::Parser;
use protocurl_core::{
    ConfigurationError,
    codec::{InputFormat, OutputFormat},
    compiler::{CompileOptions, FileSelection, ProtocSource},
    dispatcher::{DispatchOptions, TransportStrategy},
    resolver::TypeIdentifier,
    workflow::RequestSpec,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "protocurl",
    version,
    about = "Send Protobuf requests over HTTP using human-readable text and .proto files"
)]
pub struct Cli {
    /// Directory containing the .proto files
    #[arg(short = 'I', long = "proto-dir", default_value = "/proto")]
    pub proto_dir: PathBuf,

    /// Single .proto file to compile, relative to the proto directory
    #[arg(short = 'f', long = "proto-file", conflicts_with = "infer_files")]
    pub proto_file: Option<PathBuf>,

    /// Compile every .proto file found in the proto directory (default)
    #[arg(short = 'F', long = "infer-files")]
    pub infer_files: bool,

    /// Request message type (e.g. my.pkg.Request, or ..Request to search by name)
    #[arg(short = 'i', long = "request-type", value_parser = parse_type)]
    pub request_type: TypeIdentifier,

    /// Response message type. If omitted, the response is decoded without a schema
    #[arg(short = 'o', long = "response-type", value_parser = parse_type)]
    pub response_type: Option<TypeIdentifier>,

    /// URL to send the request to
    #[arg(short = 'u', long)]
    pub url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "POST", value_parser = parse_method)]
    pub method: http::Method,

    /// Request payload as Protobuf text or JSON
    #[arg(short = 'd', long = "data-text", default_value = "")]
    pub data_text: String,

    /// Payload format: text or json. Inferred from the payload when omitted
    #[arg(long = "in")]
    pub input_format: Option<InputFormat>,

    /// Output format: text, json or json:pretty
    #[arg(long = "out", default_value = "text")]
    pub output_format: OutputFormat,

    /// Additional request header ('Name: value'). Repeatable
    #[arg(short = 'H', long = "request-header", value_parser = parse_header)]
    pub request_headers: Vec<String>,

    /// Do not send the default 'Content-Type: application/x-protobuf' header
    #[arg(short = 'n', long = "no-default-headers")]
    pub no_default_headers: bool,

    /// Always use curl, failing if it cannot be found
    #[arg(long)]
    pub curl: bool,

    /// Path to the curl executable. Implies --curl
    #[arg(long = "curl-path")]
    pub curl_path: Option<PathBuf>,

    /// Additional arguments passed to curl. Implies --curl
    #[arg(short = 'C', long = "curl-args", allow_hyphen_values = true)]
    pub curl_args: Option<String>,

    /// Never use curl, only the built-in HTTP client
    #[arg(long = "no-curl")]
    pub no_curl: bool,

    /// Use the protoc found on PATH instead of the bundled one
    #[arg(long)]
    pub protoc: bool,

    /// Path to the protoc executable. Implies --protoc
    #[arg(long = "protoc-path")]
    pub protoc_path: Option<PathBuf>,

    /// Print debug logs. Implies -D
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Also show the binary request and response, and the response headers
    #[arg(short = 'D', long = "display-binary-and-http")]
    pub display_binary_and_http: bool,

    /// Only print the response text. Overrides -v and -D
    #[arg(short = 'q', long = "show-output-only")]
    pub show_output_only: bool,
}

/// What the console shows, after resolving the output flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSettings {
    pub verbose: bool,
    pub display_binary_and_http: bool,
    pub quiet: bool,
}

impl Cli {
    pub fn into_spec(self) -> Result<(RequestSpec, OutputSettings), ConfigurationError> {
        let force_curl = self.curl || self.curl_path.is_some() || self.curl_args.is_some();
        let strategy = TransportStrategy::from_flags(force_curl, self.no_curl)?;

        let protoc = match self.protoc_path {
            Some(path) => ProtocSource::Custom(path),
            None if self.protoc => ProtocSource::Global,
            None => ProtocSource::Bundled,
        };

        let files = match self.proto_file {
            Some(file) => FileSelection::Explicit(file),
            None => FileSelection::Infer,
        };

        let output = if self.show_output_only {
            OutputSettings {
                verbose: false,
                display_binary_and_http: false,
                quiet: true,
            }
        } else {
            OutputSettings {
                verbose: self.verbose,
                display_binary_and_http: self.display_binary_and_http || self.verbose,
                quiet: false,
            }
        };

        let mut dispatch = DispatchOptions::new(self.url, self.method);
        dispatch.headers = self.request_headers;
        dispatch.default_headers = !self.no_default_headers;
        dispatch.strategy = strategy;
        dispatch.curl_path = self.curl_path;
        dispatch.curl_args = self.curl_args.unwrap_or_default();

        let spec = RequestSpec {
            compile: CompileOptions {
                proto_dir: self.proto_dir,
                files,
                protoc,
            },
            request_type: self.request_type,
            response_type: self.response_type,
            payload: self.data_text,
            input_format: self.input_format,
            output_format: self.output_format,
            dispatch,
        };

        Ok((spec, output))
    }
}

fn parse_type(value: &str) -> Result<TypeIdentifier, String> {
    let identifier = TypeIdentifier::parse(value.trim());
    match &identifier {
        TypeIdentifier::Exact(name) | TypeIdentifier::Inferred(name) if name.is_empty() => {
            Err("Message type cannot be empty".to_string())
        }
        _ => Ok(identifier),
    }
}

fn parse_method(value: &str) -> Result<http::Method, String> {
    value
        .parse::<http::Method>()
        .map_err(|e| format!("Invalid HTTP method '{value}': {e}"))
}

fn parse_header(value: &str) -> Result<String, String> {
    match value.split_once(':') {
        Some((name, _)) if !name.trim().is_empty() => Ok(value.to_string()),
        _ => Err("Format must be 'Name: value'".to_string()),
    }
}

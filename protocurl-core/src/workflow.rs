//! # Workflow
//!
//! Runs one protocurl invocation end to end:
//!
//! 1. Validates the [`RequestSpec`] and selects a transport. Nothing else happens if the
//!    settings are contradictory.
//! 2. Compiles the `.proto` files into a [`Registry`].
//! 3. Resolves the request and response types, both before anything is sent.
//! 4. Encodes the payload, sends it and decodes the response.
//!
//! Intermediate artifacts are handed to a [`Reporter`] as soon as they are available.
use crate::{
    ConfigurationError, Error,
    codec::{self, InputFormat, OutputFormat},
    compiler::{self, CompileOptions},
    dispatcher::{DispatchOptions, Transport, TransportResult},
    locator::ExecutableLocator,
    registry::{EMPTY_MESSAGE, Registry},
    report::Reporter,
    resolver::{self, TypeIdentifier},
};
use tracing::debug;

/// Everything needed for one invocation.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub compile: CompileOptions,
    pub request_type: TypeIdentifier,
    /// `None` decodes the response without a schema.
    pub response_type: Option<TypeIdentifier>,
    pub payload: String,
    /// Forces the payload format instead of inferring it.
    pub input_format: Option<InputFormat>,
    pub output_format: OutputFormat,
    pub dispatch: DispatchOptions,
}

impl RequestSpec {
    pub fn is_raw_decode(&self) -> bool {
        self.response_type.is_none()
    }

    /// Checks the settings for contradictions and returns the payload's format.
    pub fn validate(&self) -> Result<InputFormat, ConfigurationError> {
        if self.is_raw_decode() && self.output_format.is_json() {
            return Err(ConfigurationError::RawDecodeRequiresText(self.output_format));
        }

        codec::resolve_input_format(&self.payload, self.input_format)
    }
}

/// The artifacts of a successful run.
#[derive(Debug, Clone)]
pub struct WorkflowOutcome {
    pub request_binary: Vec<u8>,
    /// The encoded request decoded back, in the configured output format.
    pub request_text: String,
    pub response: TransportResult,
    pub response_text: String,
}

/// Compiles the `.proto` files of `spec` and runs the request.
pub async fn run(
    spec: &RequestSpec,
    locator: &ExecutableLocator,
    reporter: &dyn Reporter,
) -> Result<WorkflowOutcome, Error> {
    let input_format = spec.validate()?;
    let transport = Transport::select(&spec.dispatch, locator)?;

    let registry =
        compiler::compile(&spec.compile, locator, reporter, spec.is_raw_decode()).await?;

    execute(spec, input_format, &transport, &registry, reporter).await
}

/// Like [`run`], using an already built registry. `spec.compile` is ignored.
///
/// For raw decoding the registry must contain `google.protobuf.Empty`, see
/// [`Registry::with_empty_message`].
pub async fn run_with_registry(
    spec: &RequestSpec,
    registry: &Registry,
    locator: &ExecutableLocator,
    reporter: &dyn Reporter,
) -> Result<WorkflowOutcome, Error> {
    let input_format = spec.validate()?;
    let transport = Transport::select(&spec.dispatch, locator)?;

    execute(spec, input_format, &transport, registry, reporter).await
}

async fn execute(
    spec: &RequestSpec,
    input_format: InputFormat,
    transport: &Transport,
    registry: &Registry,
    reporter: &dyn Reporter,
) -> Result<WorkflowOutcome, Error> {
    let request_descriptor = resolver::resolve(registry, &spec.request_type)?;
    let response_descriptor = match &spec.response_type {
        Some(identifier) => resolver::resolve(registry, identifier)?,
        None => resolver::resolve(registry, &TypeIdentifier::Exact(EMPTY_MESSAGE.to_string()))?,
    };

    debug!(
        "Request type: {}, response type: {}",
        request_descriptor.full_name(),
        response_descriptor.full_name()
    );

    let request_binary = codec::encode(&request_descriptor, &spec.payload, input_format)?;
    let request_text = codec::decode(&request_descriptor, &request_binary, spec.output_format)?;
    reporter.request(&request_text, &request_binary);

    let response = transport
        .send(&spec.dispatch, &request_binary, reporter)
        .await?;
    reporter.response_received(&response.headers, &response.body);

    let response_text = if spec.is_raw_decode() {
        codec::decode_raw(&response_descriptor, &response.body)?
    } else {
        codec::decode(&response_descriptor, &response.body, spec.output_format)?
    };
    reporter.response_text(&response_text);

    Ok(WorkflowOutcome {
        request_binary,
        request_text,
        response,
        response_text,
    })
}

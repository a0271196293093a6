use crate::{
    codec::{CodecError, InputFormat, OutputFormat},
    compiler::CompileError,
    dispatcher::TransportError,
    locator::LocateError,
    resolver::ResolutionError,
};

/// Every way an invocation can fail. All of them are terminal: nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Contradictory or unsupported combinations of settings.
///
/// These are always detected before any `protoc` run or network activity.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Both forcing curl and forcing the built-in HTTP client are active. I cannot use and not use curl at the same time.")]
    ConflictingTransport,

    #[error("curl was requested but could not be used: '{0}'")]
    CurlNotFound(#[source] LocateError),

    #[error("The built-in HTTP client only sends the default Content-Type header. Unsupported headers: {0:?}. Install curl or drop the custom headers.")]
    UnsupportedHeaders(Vec<String>),

    #[error("The built-in HTTP client only supports GET and POST, got '{0}'. Install curl to use other methods.")]
    UnsupportedMethod(http::Method),

    #[error("Additional curl arguments were given, but the built-in HTTP client is in use.")]
    CurlArgsWithoutCurl,

    #[error("Decoding without a response type only supports the 'text' output format, got '{0}'.")]
    RawDecodeRequiresText(OutputFormat),

    #[error("The payload looks like {inferred}, but the input format was explicitly set to {pinned}.")]
    InputFormatMismatch {
        pinned: InputFormat,
        inferred: InputFormat,
    },
}

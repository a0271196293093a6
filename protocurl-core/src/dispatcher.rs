//! # Request Dispatcher
//!
//! Sends an encoded request over HTTP and hands back the raw response.
//!
//! Two transports are available:
//!
//! 1. **[`Transport::Curl`]**: Delegates to an external `curl` executable. Supports any method,
//!    custom headers and additional curl arguments.
//! 2. **[`Transport::Builtin`]**: A minimal in-process client. It only sends `GET` and `POST`
//!    requests carrying the default `Content-Type` header.
//!
//! With [`TransportStrategy::Auto`], curl is used whenever it can be found on `PATH`.
//!
//! Whatever the transport, a response is only returned if its status line reports a `2XX`
//! code.
mod builtin;
mod curl;

use crate::{ConfigurationError, locator::ExecutableLocator, report::Reporter};
use http::Method;
use std::{path::PathBuf, process::ExitStatus};
use tracing::debug;

pub const CURL: &str = "curl";

pub const PROTOBUF_CONTENT_TYPE: &str = "application/x-protobuf";

/// Header prepended to every request unless disabled.
pub const DEFAULT_HEADER: &str = "Content-Type: application/x-protobuf";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportStrategy {
    /// Use curl if it is available, the built-in client otherwise.
    #[default]
    Auto,
    ForceExternal,
    ForceBuiltin,
}

impl TransportStrategy {
    pub fn from_flags(force_curl: bool, no_curl: bool) -> Result<Self, ConfigurationError> {
        match (force_curl, no_curl) {
            (true, true) => Err(ConfigurationError::ConflictingTransport),
            (true, false) => Ok(TransportStrategy::ForceExternal),
            (false, true) => Ok(TransportStrategy::ForceBuiltin),
            (false, false) => Ok(TransportStrategy::Auto),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatchOptions {
    pub url: String,
    pub method: Method,
    /// Raw `Name: value` header lines.
    pub headers: Vec<String>,
    pub default_headers: bool,
    pub strategy: TransportStrategy,
    pub curl_path: Option<PathBuf>,
    /// Additional curl arguments, split like a shell would.
    pub curl_args: String,
}

impl DispatchOptions {
    pub fn new(url: impl Into<String>, method: Method) -> Self {
        Self {
            url: url.into(),
            method,
            headers: Vec::new(),
            default_headers: true,
            strategy: TransportStrategy::Auto,
            curl_path: None,
            curl_args: String::new(),
        }
    }

    /// Every header sent with the request, the default one first.
    pub fn header_list(&self) -> Vec<String> {
        let mut headers = Vec::with_capacity(self.headers.len() + 1);
        if self.default_headers {
            headers.push(DEFAULT_HEADER.to_string());
        }
        headers.extend(self.headers.iter().cloned());
        headers
    }
}

/// The raw response of a successful request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResult {
    pub body: Vec<u8>,
    /// The status line followed by one `Name: value` line per header.
    pub headers: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to prepare temporary files for curl: '{0}'")]
    TempFiles(#[source] std::io::Error),

    #[error("Could not split the additional curl arguments '{args}': '{source}'")]
    InvalidCurlArgs {
        args: String,
        source: shell_words::ParseError,
    },

    #[error("Failed to run curl at '{path}': '{source}'")]
    Spawn {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Encountered errors while running curl. curl exited with {status}.")]
    CurlFailed { status: ExitStatus },

    #[error("curl did not write the response headers: '{0}'")]
    MissingResponse(#[source] std::io::Error),

    #[error("HTTP request failed: '{0}'")]
    Http(#[from] reqwest::Error),

    #[error("Request was not successful. Received response status {0}")]
    UnsuccessfulStatus(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Curl(PathBuf),
    Builtin,
}

impl Transport {
    /// Picks the transport for `options`, checking up front that it can honour them.
    pub fn select(
        options: &DispatchOptions,
        locator: &ExecutableLocator,
    ) -> Result<Self, ConfigurationError> {
        let transport = match options.strategy {
            TransportStrategy::ForceExternal => match &options.curl_path {
                Some(path) => Transport::Curl(ExecutableLocator::custom(path)),
                None => Transport::Curl(
                    locator
                        .find(CURL)
                        .map_err(ConfigurationError::CurlNotFound)?,
                ),
            },
            TransportStrategy::ForceBuiltin => Transport::Builtin,
            TransportStrategy::Auto => match locator.probe(CURL) {
                Some(path) => Transport::Curl(path),
                None => {
                    debug!("curl not found, falling back to the built-in HTTP client.");
                    Transport::Builtin
                }
            },
        };

        if transport == Transport::Builtin {
            builtin::check_supported(options)?;
        }

        debug!("Selected transport: {transport:?}");
        Ok(transport)
    }

    /// Sends `body` and returns the response if its status is `2XX`.
    pub async fn send(
        &self,
        options: &DispatchOptions,
        body: &[u8],
        reporter: &dyn Reporter,
    ) -> Result<TransportResult, TransportError> {
        let result = match self {
            Transport::Curl(path) => curl::send(path, options, body, reporter).await?,
            Transport::Builtin => builtin::send(options, body).await?,
        };

        validate_status(&result.headers)?;
        Ok(result)
    }
}

/// Checks that the first line of `headers` is an HTTP status line with a `2XX` code.
pub fn validate_status(headers: &str) -> Result<(), TransportError> {
    let status_line = headers.lines().next().unwrap_or_default();
    let mut tokens = status_line.split_whitespace();

    let is_success = tokens
        .next()
        .is_some_and(|version| version.starts_with("HTTP/"))
        && tokens
            .next()
            .and_then(|code| code.parse::<u16>().ok())
            .is_some_and(|code| (200..=299).contains(&code));

    if is_success {
        Ok(())
    } else {
        Err(TransportError::UnsuccessfulStatus(status_line.to_string()))
    }
}

/// Methods whose requests never carry the payload.
pub fn is_bodyless(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_2xx_status_lines() {
        assert!(validate_status("HTTP/1.1 200 OK\ncontent-type: text/plain").is_ok());
        assert!(validate_status("HTTP/2 204").is_ok());
        assert!(validate_status("HTTP/1.1 299 Whatever").is_ok());
    }

    #[test]
    fn rejects_everything_else_verbatim() {
        for line in [
            "HTTP/1.1 404 Not Found",
            "HTTP/1.1 302 Found",
            "HTTP/1.1 500 Internal Server Error",
            "garbage",
            "HTTP/1.1 abc",
            "",
        ] {
            let headers = format!("{line}\nserver: test");
            match validate_status(&headers) {
                Err(TransportError::UnsuccessfulStatus(status)) => assert_eq!(status, line),
                other => panic!("Expected an unsuccessful status for '{line}', got {other:?}"),
            }
        }
    }

    #[test]
    fn default_header_comes_first() {
        let mut options = DispatchOptions::new("http://localhost", Method::POST);
        options.headers = vec!["X-Trace: 1".to_string()];
        assert_eq!(options.header_list(), vec![DEFAULT_HEADER, "X-Trace: 1"]);

        options.default_headers = false;
        assert_eq!(options.header_list(), vec!["X-Trace: 1"]);
    }

    #[test]
    fn transport_flags_conflict() {
        assert!(matches!(
            TransportStrategy::from_flags(true, true),
            Err(ConfigurationError::ConflictingTransport)
        ));
        assert_eq!(
            TransportStrategy::from_flags(true, false).unwrap(),
            TransportStrategy::ForceExternal
        );
        assert_eq!(
            TransportStrategy::from_flags(false, true).unwrap(),
            TransportStrategy::ForceBuiltin
        );
        assert_eq!(
            TransportStrategy::from_flags(false, false).unwrap(),
            TransportStrategy::Auto
        );
    }

    #[test]
    fn get_and_head_have_no_body() {
        assert!(is_bodyless(&Method::GET));
        assert!(is_bodyless(&Method::HEAD));
        assert!(!is_bodyless(&Method::POST));
        assert!(!is_bodyless(&Method::PUT));
    }
}

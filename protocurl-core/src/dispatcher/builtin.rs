use super::{DispatchOptions, PROTOBUF_CONTENT_TYPE, TransportError, TransportResult};
use crate::ConfigurationError;
use http::{Method, header::CONTENT_TYPE};
use tracing::debug;

/// Rejects anything the built-in client cannot send.
pub(super) fn check_supported(options: &DispatchOptions) -> Result<(), ConfigurationError> {
    if options.method != Method::GET && options.method != Method::POST {
        return Err(ConfigurationError::UnsupportedMethod(options.method.clone()));
    }

    if !options.headers.is_empty() || !options.default_headers {
        return Err(ConfigurationError::UnsupportedHeaders(options.headers.clone()));
    }

    if !options.curl_args.trim().is_empty() {
        return Err(ConfigurationError::CurlArgsWithoutCurl);
    }

    Ok(())
}

pub(super) async fn send(
    options: &DispatchOptions,
    body: &[u8],
) -> Result<TransportResult, TransportError> {
    let client = reqwest::Client::builder().build()?;

    let request = if options.method == Method::GET {
        client.get(&options.url)
    } else {
        client
            .post(&options.url)
            .header(CONTENT_TYPE, PROTOBUF_CONTENT_TYPE)
            .body(body.to_vec())
    };

    debug!("Sending {} {} with the built-in HTTP client.", options.method, options.url);

    let response = request.send().await?;
    let headers = render_headers(&response);
    let body = response.bytes().await?.to_vec();

    Ok(TransportResult { body, headers })
}

// Mirrors the shape of a curl header dump: status line first, then one header per line.
fn render_headers(response: &reqwest::Response) -> String {
    let status = response.status();
    let mut text = format!(
        "{:?} {} {}",
        response.version(),
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    )
    .trim_end()
    .to_string();

    for (name, value) in response.headers() {
        text.push_str(&format!(
            "\n{name}: {}",
            String::from_utf8_lossy(value.as_bytes())
        ));
    }

    text
}

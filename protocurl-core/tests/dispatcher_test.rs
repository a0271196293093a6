use common::{Event, RecordingReporter};
use http::Method;
use protocurl_core::{
    ConfigurationError,
    dispatcher::{DEFAULT_HEADER, DispatchOptions, Transport, TransportError, TransportStrategy},
    locator::ExecutableLocator,
};
use std::path::PathBuf;

mod common;

async fn options(path: &str, method: Method, strategy: TransportStrategy) -> DispatchOptions {
    let addr = echo_server::spawn().await.unwrap();
    let mut options = DispatchOptions::new(format!("http://{addr}{path}"), method);
    options.strategy = strategy;
    options
}

#[tokio::test]
async fn test_builtin_client_rejects_custom_headers_before_sending() {
    let mut options = options("/echo", Method::POST, TransportStrategy::ForceBuiltin).await;
    options.headers = vec!["X-Trace: 1".to_string()];

    let result = Transport::select(&options, &ExecutableLocator::new());

    assert!(matches!(
        result,
        Err(ConfigurationError::UnsupportedHeaders(headers)) if headers == ["X-Trace: 1"]
    ));
}

#[tokio::test]
async fn test_builtin_client_rejects_other_methods() {
    let options = options("/echo", Method::PUT, TransportStrategy::ForceBuiltin).await;

    assert!(matches!(
        Transport::select(&options, &ExecutableLocator::new()),
        Err(ConfigurationError::UnsupportedMethod(_))
    ));
}

#[tokio::test]
async fn test_builtin_client_posts_protobuf() {
    let options = options("/echo", Method::POST, TransportStrategy::ForceBuiltin).await;
    let reporter = RecordingReporter::default();

    let transport = Transport::select(&options, &ExecutableLocator::new()).unwrap();
    assert_eq!(transport, Transport::Builtin);

    let result = transport
        .send(&options, &[0x08, 0x01], &reporter)
        .await
        .unwrap();

    assert_eq!(result.body, vec![0x08, 0x01]);
    assert!(result.headers.starts_with("HTTP/1.1 200 OK"));
    assert!(
        result
            .headers
            .contains("x-received-content-type: application/x-protobuf")
    );
    assert!(reporter.events().is_empty());
}

#[tokio::test]
async fn test_builtin_client_sends_get_without_body() {
    let options = options("/echo", Method::GET, TransportStrategy::ForceBuiltin).await;

    let transport = Transport::select(&options, &ExecutableLocator::new()).unwrap();
    let result = transport
        .send(&options, &[0x08, 0x01], &RecordingReporter::default())
        .await
        .unwrap();

    assert!(result.body.is_empty());
    assert!(result.headers.contains("x-received-content-type: none"));
}

#[tokio::test]
async fn test_builtin_client_reports_unsuccessful_status() {
    let options = options("/status/404", Method::POST, TransportStrategy::ForceBuiltin).await;

    let transport = Transport::select(&options, &ExecutableLocator::new()).unwrap();
    let result = transport
        .send(&options, &[], &RecordingReporter::default())
        .await;

    match result {
        Err(TransportError::UnsuccessfulStatus(status)) => {
            assert_eq!(status, "HTTP/1.1 404 Not Found")
        }
        other => panic!("Expected an unsuccessful status, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_custom_curl_fails_to_spawn() {
    let mut options = options("/echo", Method::POST, TransportStrategy::ForceExternal).await;
    options.curl_path = Some(PathBuf::from("/definitely/not/a/curl"));

    let transport = Transport::select(&options, &ExecutableLocator::new()).unwrap();
    let result = transport
        .send(&options, &[0x08, 0x01], &RecordingReporter::default())
        .await;

    assert!(matches!(result, Err(TransportError::Spawn { .. })));
}

#[tokio::test]
async fn test_curl_sends_any_method_and_custom_headers() {
    if !common::has_executable("curl") {
        return;
    }

    let mut options = options("/echo", Method::PUT, TransportStrategy::ForceExternal).await;
    options.headers = vec!["X-Trace: 1".to_string()];

    let transport = Transport::select(&options, &ExecutableLocator::new()).unwrap();
    assert!(matches!(transport, Transport::Curl(_)));

    let result = transport
        .send(&options, &[0x08, 0x01], &RecordingReporter::default())
        .await
        .unwrap();

    assert_eq!(result.body, vec![0x08, 0x01]);
    assert!(result.headers.starts_with("HTTP/1.1 200"));
    assert!(
        result
            .headers
            .contains("x-received-content-type: application/x-protobuf")
    );
    assert!(!result.headers.contains('\r'));
}

#[tokio::test]
async fn test_curl_honours_disabled_default_header() {
    if !common::has_executable("curl") {
        return;
    }

    let mut options = options("/echo", Method::POST, TransportStrategy::ForceExternal).await;
    options.default_headers = false;
    options.headers = vec!["Content-Type: text/plain".to_string()];
    assert!(!options.header_list().contains(&DEFAULT_HEADER.to_string()));

    let transport = Transport::select(&options, &ExecutableLocator::new()).unwrap();
    let result = transport
        .send(&options, b"hello", &RecordingReporter::default())
        .await
        .unwrap();

    assert_eq!(result.body, b"hello".to_vec());
    assert!(result.headers.contains("x-received-content-type: text/plain"));
}

#[tokio::test]
async fn test_curl_reports_unsuccessful_status() {
    if !common::has_executable("curl") {
        return;
    }

    let options = options("/status/500", Method::POST, TransportStrategy::ForceExternal).await;

    let transport = Transport::select(&options, &ExecutableLocator::new()).unwrap();
    let result = transport
        .send(&options, &[], &RecordingReporter::default())
        .await;

    match result {
        Err(TransportError::UnsuccessfulStatus(status)) => {
            assert!(status.starts_with("HTTP/1.1 500"), "status: {status}")
        }
        other => panic!("Expected an unsuccessful status, got {other:?}"),
    }
}

#[tokio::test]
async fn test_curl_output_is_relayed_before_failing() {
    if !common::has_executable("curl") {
        return;
    }

    let mut options = options("/echo", Method::POST, TransportStrategy::ForceExternal).await;
    // --show-error makes curl print the failure reason despite -s.
    options.curl_args = "--show-error --max-time 5".to_string();
    options.url = "http://127.0.0.1:1/unreachable".to_string();

    let reporter = RecordingReporter::default();
    let transport = Transport::select(&options, &ExecutableLocator::new()).unwrap();
    let result = transport.send(&options, &[0x08, 0x01], &reporter).await;

    assert!(matches!(result, Err(TransportError::CurlFailed { .. })));
    assert!(matches!(
        reporter.events().as_slice(),
        [Event::ToolOutput { tool, stderr, .. }] if tool == "curl" && !stderr.is_empty()
    ));
}

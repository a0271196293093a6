use super::{CURL, DispatchOptions, TransportError, TransportResult, is_bodyless};
use crate::{TEMP_PREFIX, report::Reporter};
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};
use tokio::process::Command;
use tracing::debug;

const REQUEST_FILE: &str = "request.bin";
const RESPONSE_FILE: &str = "response.bin";
const RESPONSE_HEADERS_FILE: &str = "response-headers.txt";

struct Exchange {
    request: PathBuf,
    response: PathBuf,
    response_headers: PathBuf,
}

impl Exchange {
    fn in_dir(dir: &Path) -> Self {
        Self {
            request: dir.join(REQUEST_FILE),
            response: dir.join(RESPONSE_FILE),
            response_headers: dir.join(RESPONSE_HEADERS_FILE),
        }
    }
}

pub(super) async fn send(
    curl: &Path,
    options: &DispatchOptions,
    body: &[u8],
    reporter: &dyn Reporter,
) -> Result<TransportResult, TransportError> {
    let tmp_dir = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempdir()
        .map_err(TransportError::TempFiles)?;
    let exchange = Exchange::in_dir(tmp_dir.path());

    let with_body = !is_bodyless(&options.method);
    if with_body {
        tokio::fs::write(&exchange.request, body)
            .await
            .map_err(TransportError::TempFiles)?;
    }

    let args = build_args(options, &exchange, with_body)?;
    debug!("Invoking curl: {} {args:?}", curl.display());

    let output = Command::new(curl)
        .args(&args)
        .output()
        .await
        .map_err(|source| TransportError::Spawn {
            path: curl.to_path_buf(),
            source,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stdout.trim().is_empty() || !stderr.trim().is_empty() {
        reporter.tool_output(CURL, &stdout, &stderr);
    }

    if !output.status.success() {
        return Err(TransportError::CurlFailed {
            status: output.status,
        });
    }

    let headers = tokio::fs::read_to_string(&exchange.response_headers)
        .await
        .map_err(TransportError::MissingResponse)?;

    // curl writes no body file at all for empty responses.
    let body = match tokio::fs::read(&exchange.response).await {
        Ok(body) => body,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(err) => return Err(TransportError::MissingResponse(err)),
    };

    Ok(TransportResult {
        body,
        headers: normalize_headers(&headers),
    })
}

fn build_args(
    options: &DispatchOptions,
    exchange: &Exchange,
    with_body: bool,
) -> Result<Vec<OsString>, TransportError> {
    let mut args: Vec<OsString> = vec![
        "-s".into(),
        "-X".into(),
        options.method.as_str().into(),
        "--output".into(),
        exchange.response.clone().into(),
        "--dump-header".into(),
        exchange.response_headers.clone().into(),
    ];

    if with_body {
        let mut data = OsString::from("@");
        data.push(&exchange.request);
        args.push("--data-binary".into());
        args.push(data);
    }

    for header in options.header_list() {
        args.push("-H".into());
        args.push(header.into());
    }

    let extra = shell_words::split(&options.curl_args).map_err(|source| {
        TransportError::InvalidCurlArgs {
            args: options.curl_args.clone(),
            source,
        }
    })?;
    args.extend(extra.into_iter().map(OsString::from));

    args.push(options.url.as_str().into());
    Ok(args)
}

fn normalize_headers(headers: &str) -> String {
    headers
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    fn exchange() -> Exchange {
        Exchange::in_dir(Path::new("/tmp/x"))
    }

    fn as_strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn post_sends_the_body_file_and_every_header() {
        let mut options = DispatchOptions::new("http://localhost:8080/api", Method::POST);
        options.headers = vec!["X-Trace: 1".to_string()];

        let args = as_strings(build_args(&options, &exchange(), true).unwrap());

        assert_eq!(
            args,
            vec![
                "-s",
                "-X",
                "POST",
                "--output",
                "/tmp/x/response.bin",
                "--dump-header",
                "/tmp/x/response-headers.txt",
                "--data-binary",
                "@/tmp/x/request.bin",
                "-H",
                "Content-Type: application/x-protobuf",
                "-H",
                "X-Trace: 1",
                "http://localhost:8080/api",
            ]
        );
    }

    #[test]
    fn extra_args_are_split_like_a_shell() {
        let mut options = DispatchOptions::new("http://localhost", Method::GET);
        options.default_headers = false;
        options.curl_args = r#"--user-agent "my agent" -v"#.to_string();

        let args = as_strings(build_args(&options, &exchange(), false).unwrap());

        assert!(!args.contains(&"--data-binary".to_string()));
        assert!(!args.contains(&"-H".to_string()));
        assert_eq!(
            &args[args.len() - 4..],
            ["--user-agent", "my agent", "-v", "http://localhost"]
        );
    }

    #[test]
    fn unbalanced_quotes_are_rejected() {
        let mut options = DispatchOptions::new("http://localhost", Method::POST);
        options.curl_args = r#"--user-agent "oops"#.to_string();

        assert!(matches!(
            build_args(&options, &exchange(), true),
            Err(TransportError::InvalidCurlArgs { .. })
        ));
    }

    #[test]
    fn header_dumps_lose_carriage_returns() {
        assert_eq!(
            normalize_headers("HTTP/1.1 200 OK\r\ncontent-length: 2\r\n\r\n"),
            "HTTP/1.1 200 OK\ncontent-length: 2"
        );
    }
}

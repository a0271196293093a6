use axum::{
    Router,
    body::Bytes,
    extract::Path,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
    routing::{any, post},
};
use prost::Message;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Response header echoing the `Content-Type` the server received (or `none`).
pub const RECEIVED_CONTENT_TYPE: &str = "x-received-content-type";

pub const HAPPY_DAY_REASON: &str = "Tuesday is a Happy Day!";

const PROTOBUF_CONTENT_TYPE: &str = "application/x-protobuf";

/// Mirror of `happyday.HappyDayResponse` from `proto/happyday.proto`.
#[derive(Clone, PartialEq, Message)]
pub struct HappyDayResponse {
    #[prost(bool, tag = "1")]
    pub is_happy_day: bool,
    #[prost(string, tag = "2")]
    pub reason: String,
}

/// Binds the server to `127.0.0.1` on a random port and serves it in a background task.
///
/// Routes:
/// * `GET|POST /echo` - replies with the request body.
/// * `POST /happy-day/verify` - replies with an encoded [`HappyDayResponse`].
/// * `ANY /status/{code}` - replies with the given status code.
pub async fn spawn() -> std::io::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let app = Router::new()
        .route("/echo", any(echo))
        .route("/happy-day/verify", post(happy_day))
        .route("/status/{code}", any(status));

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(addr)
}

async fn echo(headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let received = headers
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or(HeaderValue::from_static("none"));

    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(PROTOBUF_CONTENT_TYPE)),
            (header::HeaderName::from_static(RECEIVED_CONTENT_TYPE), received),
        ],
        body,
    )
}

async fn happy_day() -> impl IntoResponse {
    let response = HappyDayResponse {
        is_happy_day: true,
        reason: HAPPY_DAY_REASON.to_string(),
    };

    (
        [(header::CONTENT_TYPE, PROTOBUF_CONTENT_TYPE)],
        response.encode_to_vec(),
    )
}

async fn status(Path(code): Path<u16>) -> impl IntoResponse {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, "status requested by client")
}

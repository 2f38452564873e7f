//! HTTP + Server-Sent Events session transport
//!
//! `GET /sse` opens a session and streams its responses. The first event
//! names the endpoint the client posts JSON-RPC frames to. `/health` and
//! `/metrics` are served from the same listener.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use coinscope_protocol::{JsonRpcError, JsonRpcResponse, SseCodec, SseFrame, MAX_FRAME_SIZE};
use coinscope_utils::{CoinscopeError, Result};
use dashmap::DashMap;
use futures::{stream, StreamExt};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::codec::Encoder;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::mcp::{Dispatcher, Session};
use crate::observability::Metrics;

type Body = UnsyncBoxBody<Bytes, Infallible>;

pub const SSE_PATH: &str = "/sse";
pub const MESSAGES_PATH: &str = "/messages/";

const SESSION_QUEUE: usize = 32;

/// SSE transport server
#[derive(Clone)]
pub struct SseServer {
    dispatcher: Arc<Dispatcher>,
    /// Inbound queue of every open session
    sessions: Arc<DashMap<Uuid, mpsc::Sender<String>>>,
    keepalive: Duration,
}

impl SseServer {
    pub fn new(dispatcher: Arc<Dispatcher>, keepalive: Duration) -> Self {
        Self {
            dispatcher,
            sessions: Arc::new(DashMap::new()),
            keepalive,
        }
    }

    pub async fn bind(addr: &str) -> Result<TcpListener> {
        TcpListener::bind(addr)
            .await
            .map_err(|source| CoinscopeError::Bind {
                addr: addr.to_string(),
                source,
            })
    }

    /// Number of open sessions
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Accept connections until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let local_addr = listener.local_addr()?;
        info!("SSE transport listening on http://{}{}", local_addr, SSE_PATH);

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    let (stream, remote_addr) = match accept_result {
                        Ok(conn) => conn,
                        Err(e) => {
                            warn!("Accept error: {}", e);
                            continue;
                        }
                    };

                    let io = TokioIo::new(stream);
                    let server = self.clone();

                    tokio::spawn(async move {
                        let service = service_fn(move |req| {
                            let server = server.clone();
                            async move { server.handle_request(req).await }
                        });

                        if let Err(e) = http1::Builder::new()
                            .serve_connection(io, service)
                            .await
                        {
                            // Connection errors are expected when clients disconnect
                            if !e.is_incomplete_message() {
                                debug!("Connection error from {}: {}", remote_addr, e);
                            }
                        }
                    });
                }

                _ = &mut shutdown => {
                    info!("SSE transport shutting down");
                    break;
                }
            }
        }

        Ok(())
    }

    async fn handle_request(
        &self,
        req: Request<Incoming>,
    ) -> std::result::Result<Response<Body>, Infallible> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let response = match (&method, path.as_str()) {
            (&Method::GET, SSE_PATH) => self.open_session(),
            (&Method::POST, MESSAGES_PATH) | (&Method::POST, "/messages") => {
                self.post_message(req).await
            }
            (&Method::GET, "/health") => text(StatusCode::OK, "OK"),
            (&Method::GET, "/metrics") => serve_metrics(),
            _ => text(StatusCode::NOT_FOUND, "Not Found"),
        };

        Ok(response)
    }

    fn open_session(&self) -> Response<Body> {
        let id = Uuid::new_v4();
        let (inbound_tx, inbound_rx) = mpsc::channel(SESSION_QUEUE);
        let (outbound_tx, outbound_rx) = mpsc::channel(SESSION_QUEUE);

        self.sessions.insert(id, inbound_tx);

        let sessions = Arc::clone(&self.sessions);
        let session = Session::with_id(id, Arc::clone(&self.dispatcher));
        tokio::spawn(async move {
            session.run(inbound_rx, outbound_tx).await;
            sessions.remove(&id);
        });

        let endpoint = format!("{}?session_id={}", MESSAGES_PATH, id.simple());
        let mut response = Response::new(event_stream(endpoint, outbound_rx, self.keepalive));
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        response
    }

    async fn post_message(&self, req: Request<Incoming>) -> Response<Body> {
        let Some(id) = session_id(req.uri().query()) else {
            return text(StatusCode::BAD_REQUEST, "Missing or invalid session_id");
        };

        // Clone the sender so no map guard is held across the awaits below
        let Some(sender) = self.sessions.get(&id).map(|entry| entry.value().clone()) else {
            return text(StatusCode::NOT_FOUND, "Unknown session");
        };

        let frame = match read_frame(req.into_body()).await {
            Ok(frame) => frame,
            Err((status, message)) => {
                warn!(session_id = %id, %status, "Rejected posted frame: {}", message);
                return text(status, message);
            }
        };

        if sender.send(frame).await.is_err() {
            return text(StatusCode::NOT_FOUND, "Unknown session");
        }

        text(StatusCode::ACCEPTED, "Accepted")
    }
}

/// Endpoint event, then one event per response, with keep-alives in between
fn event_stream(
    endpoint: String,
    outbound: mpsc::Receiver<JsonRpcResponse>,
    keepalive: Duration,
) -> Body {
    let first = stream::once(async move { SseFrame::endpoint(endpoint) });

    let rest = stream::unfold(outbound, move |mut outbound| async move {
        match tokio::time::timeout(keepalive, outbound.recv()).await {
            Ok(Some(response)) => Some((message_frame(response), outbound)),
            Ok(None) => None,
            Err(_) => Some((SseFrame::keep_alive(), outbound)),
        }
    });

    let frames = first.chain(rest).map(|frame| {
        let mut buf = BytesMut::new();
        if let Err(e) = SseCodec::new().encode(frame, &mut buf) {
            error!("Failed to encode event: {}", e);
            buf.clear();
        }
        Ok::<_, Infallible>(Frame::data(buf.freeze()))
    });

    StreamBody::new(frames).boxed_unsync()
}

fn message_frame(response: JsonRpcResponse) -> SseFrame {
    let id = response.id.clone();
    let json = serde_json::to_string(&response)
        .ok()
        .filter(|json| json.len() <= MAX_FRAME_SIZE)
        .unwrap_or_else(|| {
            error!(?id, "Response could not be framed");
            let fallback = JsonRpcResponse::error(
                id,
                JsonRpcError::new(JsonRpcError::INTERNAL_ERROR, "Response too large"),
            );
            serde_json::to_string(&fallback).unwrap_or_default()
        });
    SseFrame::message(json)
}

/// Read a posted body as one JSON frame
async fn read_frame<B>(body: B) -> std::result::Result<String, (StatusCode, &'static str)>
where
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let bytes = match Limited::new(body, MAX_FRAME_SIZE).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return Err((StatusCode::PAYLOAD_TOO_LARGE, "Frame too large"));
        }
        Err(_) => return Err((StatusCode::BAD_REQUEST, "Failed to read body")),
    };

    let frame = String::from_utf8(bytes.to_vec())
        .map_err(|_| (StatusCode::BAD_REQUEST, "Body is not valid UTF-8"))?;

    if serde_json::from_str::<serde::de::IgnoredAny>(&frame).is_err() {
        return Err((StatusCode::BAD_REQUEST, "Body is not valid JSON"));
    }

    Ok(frame)
}

fn session_id(query: Option<&str>) -> Option<Uuid> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "session_id")
        .and_then(|(_, value)| Uuid::parse_str(&value).ok())
}

fn serve_metrics() -> Response<Body> {
    let mut response = text(StatusCode::OK, Metrics::global().to_prometheus());
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    response
}

fn text(status: StatusCode, body: impl Into<Bytes>) -> Response<Body> {
    let mut response = Response::new(Full::new(body.into()).boxed_unsync());
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

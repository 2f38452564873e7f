//! MCP session handling
//!
//! A session reads JSON-RPC frames from an inbound queue and writes exactly
//! one response for every request that carries an id. Transports own the
//! queues; the session only sees strings in and responses out.

use std::sync::Arc;

use coinscope_protocol::{
    InboundFrame, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolsListResult,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::dispatch::Dispatcher;
use crate::observability::Metrics;

/// One client session
pub struct Session {
    id: Uuid,
    dispatcher: Arc<Dispatcher>,
    initialized: bool,
}

impl Session {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self::with_id(Uuid::new_v4(), dispatcher)
    }

    pub fn with_id(id: Uuid, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            id,
            dispatcher,
            initialized: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Serve frames until the inbound queue ends or the outbound side closes
    pub async fn run(
        mut self,
        mut inbound: mpsc::Receiver<String>,
        outbound: mpsc::Sender<JsonRpcResponse>,
    ) {
        Metrics::global().record_session_opened();
        info!(session_id = %self.id, "Session opened");

        loop {
            tokio::select! {
                frame = inbound.recv() => {
                    let Some(raw) = frame else { break };
                    if let Some(response) = self.handle_frame(&raw).await {
                        if outbound.send(response).await.is_err() {
                            break;
                        }
                    }
                }
                _ = outbound.closed() => break,
            }
        }

        Metrics::global().record_session_closed();
        info!(session_id = %self.id, "Session closed");
    }

    /// Handle one raw frame
    ///
    /// Returns `None` for notifications. Malformed frames are answered with a
    /// JSON-RPC error and never end the session.
    pub async fn handle_frame(&mut self, raw: &str) -> Option<JsonRpcResponse> {
        debug!(session_id = %self.id, frame = raw, "Received frame");

        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Unparseable frame");
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    JsonRpcError::new(JsonRpcError::PARSE_ERROR, format!("Parse error: {}", e)),
                ));
            }
        };

        // An explicit `"id": null` is still a request; only an absent id marks a notification
        let id = value.get("id").cloned();
        let mut request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    id.unwrap_or(Value::Null),
                    JsonRpcError::new(
                        JsonRpcError::INVALID_REQUEST,
                        format!("Invalid request: {}", e),
                    ),
                ));
            }
        };
        request.id = id;

        self.handle_request(request).await
    }

    async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let frame = InboundFrame::classify(&request);

        if request.is_notification() {
            if let Ok(InboundFrame::Initialized) = frame {
                debug!(session_id = %self.id, "Client finished initialization");
            } else {
                debug!(session_id = %self.id, method = %request.method, "Ignoring notification");
            }
            return None;
        }
        let id = request.id.unwrap_or(Value::Null);

        let result = match frame {
            Ok(frame) => self.handle(frame).await,
            Err(e) => Err(e),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, e),
        })
    }

    async fn handle(&mut self, frame: InboundFrame) -> Result<Value, JsonRpcError> {
        debug!(session_id = %self.id, method = frame.label(), "Handling request");
        match frame {
            InboundFrame::Initialize => {
                self.initialized = true;
                info!(session_id = %self.id, "Session initialized");
                to_result(&InitializeResult::default())
            }
            InboundFrame::Initialized | InboundFrame::Ping => Ok(serde_json::json!({})),
            InboundFrame::ListTools => to_result(&ToolsListResult {
                tools: self.dispatcher.list_tools().to_vec(),
            }),
            InboundFrame::CallTool(params) => {
                info!(session_id = %self.id, tool = %params.name, "Tool call");
                let span = info_span!("tool_call", session_id = %self.id, tool = %params.name);
                let result = self
                    .dispatcher
                    .call_tool(&params.name, &params.arguments)
                    .instrument(span)
                    .await?;
                to_result(&result)
            }
            InboundFrame::Unknown(method) => Err(JsonRpcError::new(
                JsonRpcError::METHOD_NOT_FOUND,
                format!("Method not found: {}", method),
            )),
        }
    }
}

fn to_result<T: serde::Serialize>(value: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value)
        .map_err(|e| JsonRpcError::new(JsonRpcError::INTERNAL_ERROR, e.to_string()))
}

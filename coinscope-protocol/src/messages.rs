//! Inbound frame classification
//!
//! Every JSON-RPC request read from a session is sorted into one of a small
//! set of frames before the server acts on it.

use crate::jsonrpc::{JsonRpcError, JsonRpcRequest, JSONRPC_VERSION};
use crate::types::CallToolParams;

/// Frames a client may send to the server
#[derive(Debug, Clone)]
pub enum InboundFrame {
    /// `initialize` handshake
    Initialize,
    /// `notifications/initialized` (or the legacy bare `initialized`)
    Initialized,
    /// Liveness check
    Ping,
    /// `tools/list`
    ListTools,
    /// `tools/call` with parsed parameters
    CallTool(CallToolParams),
    /// Any method the server does not implement
    Unknown(String),
}

impl InboundFrame {
    /// Classify a request by method
    ///
    /// Fails with `INVALID_REQUEST` for a wrong protocol version and with
    /// `INVALID_PARAMS` when `tools/call` parameters cannot be read.
    pub fn classify(request: &JsonRpcRequest) -> Result<Self, JsonRpcError> {
        if request.jsonrpc != JSONRPC_VERSION {
            return Err(JsonRpcError::with_data(
                JsonRpcError::INVALID_REQUEST,
                "Invalid JSON-RPC version",
                serde_json::json!({"expected": JSONRPC_VERSION, "got": request.jsonrpc}),
            ));
        }

        let frame = match request.method.as_str() {
            "initialize" => InboundFrame::Initialize,
            "notifications/initialized" | "initialized" => InboundFrame::Initialized,
            "ping" => InboundFrame::Ping,
            "tools/list" => InboundFrame::ListTools,
            "tools/call" => {
                let params: CallToolParams = serde_json::from_value(request.params.clone())
                    .map_err(|e| {
                        JsonRpcError::new(
                            JsonRpcError::INVALID_PARAMS,
                            format!("Invalid tools/call params: {}", e),
                        )
                    })?;
                InboundFrame::CallTool(params)
            }
            other => InboundFrame::Unknown(other.to_string()),
        };

        Ok(frame)
    }

    /// Method name as seen on the wire, for logging
    pub fn label(&self) -> &str {
        match self {
            InboundFrame::Initialize => "initialize",
            InboundFrame::Initialized => "notifications/initialized",
            InboundFrame::Ping => "ping",
            InboundFrame::ListTools => "tools/list",
            InboundFrame::CallTool(_) => "tools/call",
            InboundFrame::Unknown(method) => method,
        }
    }
}

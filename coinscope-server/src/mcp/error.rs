//! Dispatch error types

use coinscope_protocol::JsonRpcError;

use super::validate::ValidationError;

/// Caller mistakes that reject a tool call before any upstream request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// Name absent from the registry (or disabled by the profile)
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Missing required argument: {field}")]
    MissingArgument { field: String },

    #[error("Invalid argument {field}: expected {expected}")]
    InvalidArgument {
        field: String,
        expected: &'static str,
    },

    /// `arguments` was present but not an object
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
}

impl From<ValidationError> for DispatchError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::Missing { field } => DispatchError::MissingArgument { field },
            ValidationError::WrongType { field, expected } => {
                DispatchError::InvalidArgument { field, expected }
            }
        }
    }
}

impl From<DispatchError> for JsonRpcError {
    fn from(err: DispatchError) -> Self {
        let code = match &err {
            DispatchError::UnknownTool(_) => JsonRpcError::METHOD_NOT_FOUND,
            DispatchError::MissingArgument { .. }
            | DispatchError::InvalidArgument { .. }
            | DispatchError::InvalidParams(_) => JsonRpcError::INVALID_PARAMS,
        };
        JsonRpcError::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_conversion() {
        let err: DispatchError = ValidationError::Missing {
            field: "coin_id".into(),
        }
        .into();
        assert_eq!(
            err,
            DispatchError::MissingArgument {
                field: "coin_id".into()
            }
        );
    }

    #[test]
    fn test_jsonrpc_codes() {
        let unknown: JsonRpcError = DispatchError::UnknownTool("x".into()).into();
        assert_eq!(unknown.code, JsonRpcError::METHOD_NOT_FOUND);
        assert!(unknown.message.contains("x"));

        let missing: JsonRpcError = DispatchError::MissingArgument {
            field: "coin_id".into(),
        }
        .into();
        assert_eq!(missing.code, JsonRpcError::INVALID_PARAMS);
        assert!(missing.message.contains("coin_id"));

        let params: JsonRpcError = DispatchError::InvalidParams("bad".into()).into();
        assert_eq!(params.code, JsonRpcError::INVALID_PARAMS);
    }
}

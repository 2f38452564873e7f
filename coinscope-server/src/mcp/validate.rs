//! Shallow argument validation against a tool's input schema

use coinscope_protocol::SchemaNode;
use serde_json::{Map, Value};

/// Why an argument map was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required argument: {field}")]
    Missing { field: String },

    #[error("Argument {field} must be {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },
}

/// Check required fields and declared property types
///
/// `null`, blank strings and empty arrays count as missing. Properties the
/// schema does not declare are ignored.
pub fn validate(schema: &SchemaNode, arguments: &Map<String, Value>) -> Result<(), ValidationError> {
    let SchemaNode::Object {
        properties,
        required,
        ..
    } = schema
    else {
        return Ok(());
    };

    for field in required {
        if arguments.get(field).map_or(true, is_blank) {
            return Err(ValidationError::Missing {
                field: field.clone(),
            });
        }
    }

    for (field, node) in properties {
        match arguments.get(field) {
            None | Some(Value::Null) => continue,
            Some(value) => check_type(field, node, value)?,
        }
    }

    Ok(())
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn check_type(field: &str, node: &SchemaNode, value: &Value) -> Result<(), ValidationError> {
    let wrong = |expected| ValidationError::WrongType {
        field: field.to_string(),
        expected,
    };

    match node {
        SchemaNode::String { .. } => {
            if !value.is_string() {
                return Err(wrong("a string"));
            }
        }
        SchemaNode::Array { items, .. } => {
            let Some(elements) = value.as_array() else {
                return Err(wrong("an array"));
            };
            if matches!(items.as_ref(), SchemaNode::String { .. })
                && !elements.iter().all(Value::is_string)
            {
                return Err(wrong("an array of strings"));
            }
        }
        SchemaNode::Object { .. } => {
            if !value.is_object() {
                return Err(wrong("an object"));
            }
        }
    }

    Ok(())
}

use std::fmt;

/// Error kind for codec failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Payload bytes are malformed for the codec's wire format.
    Format,
    /// A value cannot be represented in the codec's wire format.
    Value,
}

/// Codec error — returned by every `Codec` implementation.
#[derive(Debug, Clone)]
pub struct CodecError {
    pub kind: ErrorKind,
    pub message: String,
}

impl CodecError {
    pub fn format(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Format, message: msg.into() }
    }

    pub fn value(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Value, message: msg.into() }
    }

    /// Add context to the error, preserving the original ErrorKind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for CodecError {}

// ---------------------------------------------------------------------------
// From impls: wire-level error types → CodecError with correct ErrorKind
// ---------------------------------------------------------------------------

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        Self::format(e.to_string())
    }
}

impl From<std::str::Utf8Error> for CodecError {
    fn from(e: std::str::Utf8Error) -> Self {
        Self::format(e.to_string())
    }
}

impl From<base64::DecodeError> for CodecError {
    fn from(e: base64::DecodeError) -> Self {
        Self::format(e.to_string())
    }
}

/// Field-set mismatch between construction input and the record's schema.
///
/// Field lists are sorted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaValidationError {
    #[error("{record} missing required fields: {}", .fields.join(", "))]
    MissingFields { record: &'static str, fields: Vec<String> },

    #[error("{record} got unexpected fields: {}", .fields.join(", "))]
    UnexpectedFields { record: &'static str, fields: Vec<String> },

    #[error(
        "{record} missing required fields: {}; got unexpected fields: {}",
        .missing.join(", "),
        .unexpected.join(", ")
    )]
    Mismatch {
        record: &'static str,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
}

impl SchemaValidationError {
    /// Schema fields absent from the input.
    pub fn missing(&self) -> &[String] {
        match self {
            Self::MissingFields { fields, .. } => fields,
            Self::Mismatch { missing, .. } => missing,
            Self::UnexpectedFields { .. } => &[],
        }
    }

    /// Input fields outside the schema.
    pub fn unexpected(&self) -> &[String] {
        match self {
            Self::UnexpectedFields { fields, .. } => fields,
            Self::Mismatch { unexpected, .. } => unexpected,
            Self::MissingFields { .. } => &[],
        }
    }

    pub fn record(&self) -> &'static str {
        match self {
            Self::MissingFields { record, .. }
            | Self::UnexpectedFields { record, .. }
            | Self::Mismatch { record, .. } => record,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SerializationError {
    #[error("no codec registered for serializer {}", serializer_label(.serializer))]
    UnknownSerializer { serializer: Option<String> },

    #[error("serializer '{serializer}' failed to encode: {source}")]
    EncodeFailed {
        serializer: String,
        #[source]
        source: CodecError,
    },

    #[error("serializer '{serializer}' failed to decode: {source}")]
    DecodeFailed {
        serializer: String,
        #[source]
        source: CodecError,
    },
}

fn serializer_label(serializer: &Option<String>) -> String {
    match serializer {
        Some(id) => format!("'{id}'"),
        None => "(none configured)".to_string(),
    }
}

/// Umbrella error for operations that both decode and validate.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error(transparent)]
    Schema(#[from] SchemaValidationError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error("typed view conversion failed: {0}")]
    Typed(#[source] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}

impl EventError {
    /// The schema validation failure, if that is what this is.
    pub fn as_schema(&self) -> Option<&SchemaValidationError> {
        match self {
            EventError::Schema(e) => Some(e),
            _ => None,
        }
    }

    /// The serialization failure, if that is what this is.
    pub fn as_serialization(&self) -> Option<&SerializationError> {
        match self {
            EventError::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_context_keeps_kind() {
        let err = CodecError::value("NaN").with_context("field 'price'");
        assert_eq!(err.kind, ErrorKind::Value);
        assert_eq!(err.message, "field 'price': NaN");
    }

    #[test]
    fn validation_messages_list_sorted_fields() {
        let err = SchemaValidationError::MissingFields {
            record: "Order",
            fields: vec!["amount".into(), "currency".into()],
        };
        assert_eq!(err.to_string(), "Order missing required fields: amount, currency");
        assert_eq!(err.missing(), ["amount", "currency"]);
        assert!(err.unexpected().is_empty());
    }

    #[test]
    fn unknown_serializer_without_id() {
        let err = SerializationError::UnknownSerializer { serializer: None };
        assert_eq!(err.to_string(), "no codec registered for serializer (none configured)");
    }
}

use crate::error::CodecError;
use crate::record::FieldMap;

use super::Codec;

/// JSON object codec.
///
/// Encodes the mapping as one JSON object; decoding accepts only a JSON
/// object at the top level.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indented output. Decoding is unaffected.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Codec for JsonCodec {
    fn encode(&self, fields: &FieldMap) -> Result<Vec<u8>, CodecError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(fields)?
        } else {
            serde_json::to_vec(fields)?
        };
        Ok(bytes)
    }

    fn decode(&self, payload: &[u8]) -> Result<FieldMap, CodecError> {
        let text = std::str::from_utf8(payload)?;
        match serde_json::from_str(text)? {
            serde_json::Value::Object(fields) => Ok(fields),
            other => Err(CodecError::format(format!(
                "expected JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

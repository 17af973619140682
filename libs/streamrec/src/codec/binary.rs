use base64::Engine;

use crate::error::CodecError;
use crate::record::FieldMap;

use super::Codec;

/// Wraps another codec's output in standard base64.
///
/// Useful for transports that only carry text.
pub struct Base64Codec<C> {
    inner: C,
}

impl<C: Codec> Base64Codec<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: Codec> Codec for Base64Codec<C> {
    fn encode(&self, fields: &FieldMap) -> Result<Vec<u8>, CodecError> {
        let raw = self.inner.encode(fields)?;
        Ok(base64::engine::general_purpose::STANDARD
            .encode(raw)
            .into_bytes())
    }

    fn decode(&self, payload: &[u8]) -> Result<FieldMap, CodecError> {
        let raw = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| CodecError::from(e).with_context("base64"))?;
        self.inner.decode(&raw)
    }
}

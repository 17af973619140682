use std::fmt;
use std::sync::Arc;

/// Raw message handed over by the transport.
///
/// Opaque to this crate except for its payload bytes; transports attach
/// whatever else they track (headers, acks) on their own type.
pub trait Message: Send + Sync + fmt::Debug {
    /// Payload bytes, decoded by the record type's codec.
    fn value(&self) -> &[u8];

    /// Position in the partition, if the transport tracks one.
    fn offset(&self) -> Option<u64> {
        None
    }

    /// Timestamp in milliseconds (Unix epoch), if known.
    fn timestamp_ms(&self) -> Option<i64> {
        None
    }
}

/// Owned message — payload bytes plus optional position and timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMessage {
    pub value: Vec<u8>,
    pub offset: Option<u64>,
    pub ts_ms: Option<i64>,
}

impl RawMessage {
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Self {
            value: value.into(),
            offset: None,
            ts_ms: None,
        }
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_timestamp(mut self, ts_ms: i64) -> Self {
        self.ts_ms = Some(ts_ms);
        self
    }
}

impl Message for RawMessage {
    fn value(&self) -> &[u8] {
        &self.value
    }

    fn offset(&self) -> Option<u64> {
        self.offset
    }

    fn timestamp_ms(&self) -> Option<i64> {
        self.ts_ms
    }
}

/// Transport origin of a record built from a message.
#[derive(Debug, Clone)]
pub struct Request {
    pub key: String,
    pub topic: String,
    pub partition: u32,
    pub message: Arc<dyn Message>,
}

impl Request {
    pub fn new(
        key: impl Into<String>,
        topic: impl Into<String>,
        partition: u32,
        message: Arc<dyn Message>,
    ) -> Self {
        Self {
            key: key.into(),
            topic: topic.into(),
            partition,
            message,
        }
    }

    pub fn payload(&self) -> &[u8] {
        self.message.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_exposes_message_metadata() {
        let message = RawMessage::new(b"{}".to_vec()).with_offset(42).with_timestamp(1_700_000_000_000);
        let req = Request::new("k1", "orders", 3, Arc::new(message));
        assert_eq!(req.payload(), b"{}");
        assert_eq!(req.message.offset(), Some(42));
        assert_eq!(req.message.timestamp_ms(), Some(1_700_000_000_000));
        assert_eq!(req.partition, 3);
    }

    #[test]
    fn cloned_request_shares_message() {
        let req = Request::new("k", "t", 0, Arc::new(RawMessage::new("x")));
        let copy = req.clone();
        assert!(Arc::ptr_eq(&req.message, &copy.message));
    }
}

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;

use crate::codec::{self, CodecRegistry};
use crate::error::{EventError, SchemaValidationError, SerializationError};
use crate::event::Event;
use crate::request::{Message, Request};
use crate::schema::{Field, FieldSchema};

/// Flat name → value mapping — the payload contract between records and codecs.
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

/// Validated, immutable instance of record type `E`.
///
/// The field set always equals `E`'s schema exactly; values are not
/// checked against declared types.
pub struct Record<E> {
    values: FieldMap,
    schema: Arc<FieldSchema>,
    request: Option<Request>,
    _event: PhantomData<fn() -> E>,
}

impl<E: Event> Record<E> {
    /// Build from a field mapping. Fails unless the key set matches the schema.
    pub fn new(mut values: FieldMap) -> Result<Self, SchemaValidationError> {
        let schema = E::schema();
        schema.check_fields(E::NAME, values.keys().map(String::as_str))?;

        let ordered: FieldMap = schema
            .names()
            .filter_map(|name| values.remove_entry(name))
            .collect();

        Ok(Self {
            values: ordered,
            schema,
            request: None,
            _event: PhantomData,
        })
    }

    /// Build from `(name, value)` pairs. A repeated name keeps the last value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, SchemaValidationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build from a typed value that serializes to a JSON object.
    pub fn from_typed<T: Serialize>(value: &T) -> Result<Self, EventError> {
        match serde_json::to_value(value).map_err(EventError::Typed)? {
            serde_json::Value::Object(fields) => Ok(Self::new(fields)?),
            _ => Err(EventError::Typed(<serde_json::Error as serde::ser::Error>::custom(
                format!("{} does not serialize to an object", E::NAME),
            ))),
        }
    }

    /// Typed view of the field values.
    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<T, EventError> {
        serde_json::from_value(serde_json::Value::Object(self.as_mapping()))
            .map_err(EventError::Typed)
    }

    /// Decode `payload` with `E`'s codec from the process-wide registry.
    pub fn deserialize(payload: &[u8]) -> Result<Self, EventError> {
        Self::deserialize_with(&codec::global(), payload)
    }

    pub fn deserialize_with(registry: &CodecRegistry, payload: &[u8]) -> Result<Self, EventError> {
        let fields = registry.decode(serializer_id::<E>()?, payload)?;
        Ok(Self::new(fields)?)
    }

    /// Build from a transport message, validating exactly like [`Record::new`].
    pub fn from_message(
        key: impl Into<String>,
        topic: impl Into<String>,
        partition: u32,
        message: Arc<dyn Message>,
    ) -> Result<Self, EventError> {
        Self::from_message_with(&codec::global(), key, topic, partition, message)
    }

    pub fn from_message_with(
        registry: &CodecRegistry,
        key: impl Into<String>,
        topic: impl Into<String>,
        partition: u32,
        message: Arc<dyn Message>,
    ) -> Result<Self, EventError> {
        let request = Request::new(key, topic, partition, message);
        tracing::trace!(
            record = E::NAME,
            topic = %request.topic,
            partition = request.partition,
            bytes = request.payload().len(),
            "decoding message"
        );

        let mut record = Self::deserialize_with(registry, request.payload()).inspect_err(|e| {
            tracing::debug!(
                record = E::NAME,
                topic = %request.topic,
                partition = request.partition,
                error = %e,
                "rejected message"
            );
        })?;
        record.request = Some(request);
        Ok(record)
    }

    /// Encode with `E`'s codec from the process-wide registry.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializationError> {
        self.serialize_with(&codec::global())
    }

    pub fn serialize_with(&self, registry: &CodecRegistry) -> Result<Vec<u8>, SerializationError> {
        registry.encode(serializer_id::<E>()?, &self.values)
    }
}

impl<E> Record<E> {
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.values.get(name)
    }

    /// Transport origin; `None` unless built by `from_message`.
    pub fn request(&self) -> Option<&Request> {
        self.request.as_ref()
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// `(name, value)` pairs in schema order. Each call starts over.
    pub fn ordered_pairs(&self) -> OrderedPairs<'_> {
        OrderedPairs {
            fields: self.schema.fields().iter(),
            values: &self.values,
        }
    }

    /// Field values as a mapping, in schema order.
    pub fn as_mapping(&self) -> FieldMap {
        self.ordered_pairs()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    pub fn into_mapping(self) -> FieldMap {
        self.values
    }
}

fn serializer_id<E: Event>() -> Result<&'static str, SerializationError> {
    E::SERIALIZER.ok_or(SerializationError::UnknownSerializer { serializer: None })
}

impl<E> Clone for Record<E> {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
            schema: Arc::clone(&self.schema),
            request: self.request.clone(),
            _event: PhantomData,
        }
    }
}

impl<E: Event> fmt::Debug for Record<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}: ", E::NAME)?;
        for (i, (name, value)) in self.ordered_pairs().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str(">")
    }
}

impl<E> Serialize for Record<E> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.ordered_pairs() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Iterator returned by [`Record::ordered_pairs`].
#[derive(Clone)]
pub struct OrderedPairs<'a> {
    fields: std::slice::Iter<'a, Field>,
    values: &'a FieldMap,
}

impl<'a> Iterator for OrderedPairs<'a> {
    type Item = (&'a str, &'a serde_json::Value);

    fn next(&mut self) -> Option<Self::Item> {
        let field = self.fields.next()?;
        let value = self.values.get(&field.name)?;
        Some((field.name.as_str(), value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.fields.size_hint()
    }
}

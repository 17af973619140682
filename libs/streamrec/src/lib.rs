//! Typed event records for stream processing.
//!
//! A record type declares its fields once ([`schema::Declare`], usually via
//! `#[derive(Event)]`); every [`Record`] is checked against that schema when
//! built and (de)serialized through a codec looked up by name in a
//! [`codec::CodecRegistry`]. Field descriptors of two record types combine
//! into a [`join::JoinExpression`] for a downstream join operator.

pub mod codec;
pub mod config;
pub mod error;
pub mod event;
pub mod join;
pub mod record;
pub mod request;
pub mod schema;

pub use streamrec_derive::Event;

pub use codec::{Codec, CodecRegistry, CodecRegistryBuilder};
pub use error::{CodecError, EventError, SchemaValidationError, SerializationError};
pub use event::Event;
pub use join::{FieldDescriptor, FieldRef, JoinExpression};
pub use record::{FieldMap, Record};
pub use request::{Message, RawMessage, Request};
pub use schema::{Declare, Field, FieldSchema, FieldType, ScalarType, SchemaBuilder};

use std::sync::Arc;

use crate::join::FieldDescriptor;
use crate::schema::{Declare, FieldSchema, schema_of};

/// A concrete record type.
///
/// The schema comes from [`Declare`]; the codec id is bound to the type,
/// not to instances. Usually implemented with `#[derive(Event)]`:
///
/// ```ignore
/// #[derive(Event)]
/// #[event(serializer = "json")]
/// struct Order {
///     amount: i64,
///     currency: String,
/// }
/// ```
pub trait Event: Declare + Sized {
    /// Type name used in diagnostics and `Debug` output.
    const NAME: &'static str;

    /// Codec id looked up in the registry. `None` makes every
    /// (de)serialization fail with `UnknownSerializer`.
    const SERIALIZER: Option<&'static str> = None;

    fn schema() -> Arc<FieldSchema> {
        schema_of::<Self>()
    }

    /// Descriptor of one schema field, `None` if the schema lacks it.
    fn descriptor(name: &str) -> Option<FieldDescriptor<Self>> {
        Self::schema()
            .get(name)
            .map(|field| FieldDescriptor::new(field.name.clone()))
    }

    /// One descriptor per schema field, in schema order.
    fn descriptors() -> Vec<FieldDescriptor<Self>> {
        Self::schema()
            .names()
            .map(|name| FieldDescriptor::new(name.to_string()))
            .collect()
    }
}

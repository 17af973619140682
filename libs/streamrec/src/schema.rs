use std::any::TypeId;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, LazyLock, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::SchemaValidationError;

// ════════════════════════════════════════════════════════════════
//  Scalar Type
// ════════════════════════════════════════════════════════════════

/// Declared scalar types of record fields.
///
/// Declared types are schema metadata: construction checks field names
/// only, never the shape of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
    /// Fixed precision decimal.
    #[serde(rename = "decimal")]
    Decimal { precision: u8, scale: u8 },
    String,
    Bytes,
    /// Microseconds since epoch.
    Timestamp,
    /// Days since epoch.
    Date,
    Uuid,
    /// Semi-structured (nested objects, free-form values).
    Json,
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarType::Bool => write!(f, "bool"),
            ScalarType::Int32 => write!(f, "int32"),
            ScalarType::Int64 => write!(f, "int64"),
            ScalarType::Float32 => write!(f, "float32"),
            ScalarType::Float64 => write!(f, "float64"),
            ScalarType::Decimal { precision, scale } => {
                write!(f, "decimal({precision},{scale})")
            }
            ScalarType::String => write!(f, "string"),
            ScalarType::Bytes => write!(f, "bytes"),
            ScalarType::Timestamp => write!(f, "timestamp"),
            ScalarType::Date => write!(f, "date"),
            ScalarType::Uuid => write!(f, "uuid"),
            ScalarType::Json => write!(f, "json"),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Field Type
// ════════════════════════════════════════════════════════════════

/// Field type — a scalar or an array of scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Scalar(ScalarType),
    Array(ScalarType),
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::Scalar(s) => write!(f, "{s}"),
            FieldType::Array(s) => write!(f, "array<{s}>"),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Field
// ════════════════════════════════════════════════════════════════

/// One declared field of a record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable,
        }
    }

    /// Shortcut: non-nullable scalar field.
    pub fn scalar(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self::new(name, FieldType::Scalar(scalar), false)
    }

    /// Shortcut: nullable scalar field.
    pub fn scalar_nullable(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self::new(name, FieldType::Scalar(scalar), true)
    }
}

// ════════════════════════════════════════════════════════════════
//  Declaration
// ════════════════════════════════════════════════════════════════

/// A type that declares record fields.
///
/// Concrete record types implement this through [`crate::Event`]; reusable
/// base declarations implement it alone and are spliced in with
/// [`SchemaBuilder::extend`]. Usually generated by `#[derive(Event)]`.
pub trait Declare: 'static {
    fn declare(schema: &mut SchemaBuilder);
}

/// Accumulates declarations into a [`FieldSchema`].
///
/// A name declared again keeps the position of its first declaration and
/// takes the type of the latest one.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<Field>,
    index: HashMap<String, usize>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&mut self, field: Field) -> &mut Self {
        match self.index.get(&field.name) {
            Some(&pos) => {
                let slot = &mut self.fields[pos];
                slot.field_type = field.field_type;
                slot.nullable = field.nullable;
            }
            None => {
                self.index.insert(field.name.clone(), self.fields.len());
                self.fields.push(field);
            }
        }
        self
    }

    /// Shortcut: declare a non-nullable scalar field.
    pub fn scalar(&mut self, name: impl Into<String>, scalar: ScalarType) -> &mut Self {
        self.field(Field::scalar(name, scalar))
    }

    /// Splice in the declarations of `B` at the current position.
    pub fn extend<B: Declare>(&mut self) -> &mut Self {
        B::declare(self);
        self
    }

    pub fn build(self) -> FieldSchema {
        FieldSchema {
            fields: self.fields,
            index: self.index,
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  FieldSchema
// ════════════════════════════════════════════════════════════════

/// Ordered, name-unique field set of a record type.
///
/// Field order is declaration order and defines the order of
/// `Record::ordered_pairs` and of the encoded mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    fields: Vec<Field>,
    index: HashMap<String, usize>,
}

impl FieldSchema {
    /// Derive the schema of `D` without touching the process-wide cache.
    pub fn derive<D: Declare>() -> Self {
        let mut builder = SchemaBuilder::new();
        D::declare(&mut builder);
        builder.build()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.index.get(name).map(|&pos| &self.fields[pos])
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Exact name-set match of `keys` against this schema.
    pub fn check_fields<'a>(
        &self,
        record: &'static str,
        keys: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), SchemaValidationError> {
        let given: BTreeSet<&str> = keys.into_iter().collect();

        let mut missing: Vec<String> = self
            .names()
            .filter(|name| !given.contains(name))
            .map(str::to_string)
            .collect();
        missing.sort();

        // BTreeSet iteration is already sorted.
        let unexpected: Vec<String> = given
            .iter()
            .filter(|name| !self.contains(name))
            .map(|name| name.to_string())
            .collect();

        match (missing.is_empty(), unexpected.is_empty()) {
            (true, true) => Ok(()),
            (false, true) => Err(SchemaValidationError::MissingFields { record, fields: missing }),
            (true, false) => Err(SchemaValidationError::UnexpectedFields {
                record,
                fields: unexpected,
            }),
            (false, false) => Err(SchemaValidationError::Mismatch {
                record,
                missing,
                unexpected,
            }),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Process-wide cache
// ════════════════════════════════════════════════════════════════

static SCHEMAS: LazyLock<RwLock<HashMap<TypeId, Arc<FieldSchema>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Schema of `D`, derived on first use and cached by type identity.
///
/// Derivation runs outside the lock and is published whole. When two
/// threads race on first use, the first published schema is kept and the
/// other computation is dropped; both are identical.
pub fn schema_of<D: Declare>() -> Arc<FieldSchema> {
    let id = TypeId::of::<D>();
    {
        let guard = match SCHEMAS.read() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("schema cache read lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        if let Some(schema) = guard.get(&id) {
            return Arc::clone(schema);
        }
    }

    let schema = Arc::new(FieldSchema::derive::<D>());

    let mut guard = match SCHEMAS.write() {
        Ok(g) => g,
        Err(poisoned) => {
            tracing::warn!("schema cache write lock was poisoned, recovering");
            poisoned.into_inner()
        }
    };
    let published = guard.entry(id).or_insert_with(|| {
        tracing::debug!(
            record = std::any::type_name::<D>(),
            fields = schema.len(),
            "derived field schema"
        );
        schema
    });
    Arc::clone(published)
}

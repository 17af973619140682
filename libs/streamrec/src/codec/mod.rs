//! Named codecs and the registry that dispatches to them.
//!
//! A record type names its codec by string id (`Event::SERIALIZER`); the
//! registry resolves that id at (de)serialization time. Registration happens
//! on a [`CodecRegistryBuilder`] during startup; traffic only ever reads a
//! built [`CodecRegistry`].

mod binary;
mod json;

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock};

use crate::error::{CodecError, SerializationError};
use crate::record::FieldMap;

pub use binary::Base64Codec;
pub use json::JsonCodec;

/// Runtime codec — performs `bytes ↔ FieldMap`.
///
/// - `encode()` — assembles a flat name → value mapping into payload bytes.
/// - `decode()` — parses payload bytes back into a flat mapping.
pub trait Codec: Send + Sync {
    fn encode(&self, fields: &FieldMap) -> Result<Vec<u8>, CodecError>;
    fn decode(&self, payload: &[u8]) -> Result<FieldMap, CodecError>;
}

/// Mutable registration side. Last registration of an id wins.
#[derive(Clone, Default)]
pub struct CodecRegistryBuilder {
    codecs: HashMap<String, Arc<dyn Codec>>,
}

impl CodecRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: impl Into<String>, codec: impl Codec + 'static) -> &mut Self {
        self.register_arc(id, Arc::new(codec))
    }

    pub fn register_arc(&mut self, id: impl Into<String>, codec: Arc<dyn Codec>) -> &mut Self {
        let id = id.into();
        if self.codecs.insert(id.clone(), codec).is_some() {
            tracing::warn!(codec = %id, "codec re-registered, replacing previous binding");
        } else {
            tracing::debug!(codec = %id, "registered codec");
        }
        self
    }

    /// Freeze the bindings. Clone the builder first to keep registering.
    pub fn build(self) -> CodecRegistry {
        CodecRegistry {
            codecs: self.codecs,
        }
    }
}

/// Read-only id → codec lookup.
#[derive(Clone, Default)]
pub struct CodecRegistry {
    codecs: HashMap<String, Arc<dyn Codec>>,
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("codecs", &self.ids())
            .finish()
    }
}

impl CodecRegistry {
    pub fn builder() -> CodecRegistryBuilder {
        CodecRegistryBuilder::new()
    }

    /// Registry holding `"json"` and `"binary"` (base64 over JSON).
    pub fn with_builtins() -> Self {
        let mut builder = CodecRegistryBuilder::new();
        builder
            .register("json", JsonCodec::new())
            .register("binary", Base64Codec::new(JsonCodec::new()));
        builder.build()
    }

    /// Builder seeded with this registry's bindings.
    pub fn to_builder(&self) -> CodecRegistryBuilder {
        CodecRegistryBuilder {
            codecs: self.codecs.clone(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Codec>> {
        self.codecs.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.codecs.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.codecs.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn encode(&self, id: &str, fields: &FieldMap) -> Result<Vec<u8>, SerializationError> {
        self.lookup(id)?
            .encode(fields)
            .map_err(|source| SerializationError::EncodeFailed {
                serializer: id.to_string(),
                source,
            })
    }

    pub fn decode(&self, id: &str, payload: &[u8]) -> Result<FieldMap, SerializationError> {
        self.lookup(id)?
            .decode(payload)
            .map_err(|source| SerializationError::DecodeFailed {
                serializer: id.to_string(),
                source,
            })
    }

    fn lookup(&self, id: &str) -> Result<&Arc<dyn Codec>, SerializationError> {
        self.codecs
            .get(id)
            .ok_or_else(|| SerializationError::UnknownSerializer {
                serializer: Some(id.to_string()),
            })
    }
}

// ---------------------------------------------------------------------------
// Process-wide registry
// ---------------------------------------------------------------------------

static GLOBAL: LazyLock<RwLock<Arc<CodecRegistry>>> =
    LazyLock::new(|| RwLock::new(Arc::new(CodecRegistry::with_builtins())));

/// Replace the process-wide registry. Records already mid-(de)serialization
/// keep the snapshot they started with.
pub fn install(registry: CodecRegistry) {
    tracing::debug!(codecs = ?registry.ids(), "installing codec registry");
    let mut guard = match GLOBAL.write() {
        Ok(g) => g,
        Err(poisoned) => {
            tracing::warn!("codec registry write lock was poisoned, recovering");
            poisoned.into_inner()
        }
    };
    *guard = Arc::new(registry);
}

/// Snapshot of the process-wide registry. Defaults to the built-ins.
pub fn global() -> Arc<CodecRegistry> {
    let guard = match GLOBAL.read() {
        Ok(g) => g,
        Err(poisoned) => {
            tracing::warn!("codec registry read lock was poisoned, recovering");
            poisoned.into_inner()
        }
    };
    Arc::clone(&guard)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    /// Echoes a fixed payload and rejects everything on decode.
    struct Fixed(&'static [u8]);

    impl Codec for Fixed {
        fn encode(&self, _fields: &FieldMap) -> Result<Vec<u8>, CodecError> {
            Ok(self.0.to_vec())
        }

        fn decode(&self, _payload: &[u8]) -> Result<FieldMap, CodecError> {
            Err(CodecError::format("fixed codec cannot decode"))
        }
    }

    fn sample() -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("amount".into(), json!(100));
        fields
    }

    #[test]
    fn last_registration_wins() {
        let mut builder = CodecRegistry::builder();
        builder.register("x", Fixed(b"first")).register("x", Fixed(b"second"));
        let registry = builder.build();
        assert_eq!(registry.encode("x", &sample()).unwrap(), b"second");
    }

    #[test]
    fn cloned_builder_keeps_its_bindings_after_build() {
        let mut builder = CodecRegistry::builder();
        builder.register("x", Fixed(b"x"));
        let first = builder.clone().build();
        builder.register("y", Fixed(b"y"));
        let second = builder.build();
        assert_eq!(first.ids(), ["x"]);
        assert_eq!(second.ids(), ["x", "y"]);
    }

    #[test]
    fn unknown_id_is_reported() {
        let registry = CodecRegistry::with_builtins();
        let err = registry.encode("avro", &sample()).unwrap_err();
        assert!(matches!(
            err,
            SerializationError::UnknownSerializer { serializer: Some(ref id) } if id == "avro"
        ));
        let err = registry.decode("avro", b"{}").unwrap_err();
        assert!(matches!(err, SerializationError::UnknownSerializer { .. }));
    }

    #[test]
    fn codec_failure_is_wrapped_with_id() {
        let mut builder = CodecRegistry::builder();
        builder.register("fixed", Fixed(b""));
        let registry = builder.build();
        let err = registry.decode("fixed", b"...").unwrap_err();
        match err {
            SerializationError::DecodeFailed { serializer, source } => {
                assert_eq!(serializer, "fixed");
                assert_eq!(source.message, "fixed codec cannot decode");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn builtins_are_registered() {
        let registry = CodecRegistry::with_builtins();
        assert_eq!(registry.ids(), ["binary", "json"]);
    }

    #[test]
    fn to_builder_extends_without_touching_original() {
        let base = CodecRegistry::with_builtins();
        let mut builder = base.to_builder();
        builder.register("fixed", Fixed(b"f"));
        let extended = builder.build();
        assert!(extended.contains("fixed"));
        assert!(extended.contains("json"));
        assert!(!base.contains("fixed"));
    }

    #[test]
    fn global_registry_has_json() {
        assert!(global().contains("json"));
    }
}

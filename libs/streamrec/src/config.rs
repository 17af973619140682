use serde::Deserialize;

use crate::codec::{Base64Codec, CodecRegistry, JsonCodec};
use crate::error::EventError;

/// Codec setup — parsed from TOML.
///
/// ```toml
/// [[codecs]]
/// name = "json"
/// kind = "json"
///
/// [[codecs]]
/// name = "json-pretty"
/// kind = "json"
/// pretty = true
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodecsConfig {
    /// Extra or overriding bindings, applied over the built-ins in order.
    #[serde(default)]
    pub codecs: Vec<CodecConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CodecConfig {
    /// Registry id records refer to.
    pub name: String,
    pub kind: CodecKind,
    /// Indented JSON output (json and binary kinds).
    #[serde(default)]
    pub pretty: bool,
}

/// Built-in codec implementations selectable from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecKind {
    Json,
    /// Base64 over JSON.
    Binary,
}

impl CodecsConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, EventError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| EventError::Config(format!("{path}: {e}")))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EventError> {
        toml::from_str(toml_str).map_err(|e| EventError::Config(e.to_string()))
    }

    /// Built-ins plus every configured binding.
    pub fn registry(&self) -> CodecRegistry {
        let mut builder = CodecRegistry::with_builtins().to_builder();
        for codec in &self.codecs {
            let json = if codec.pretty { JsonCodec::pretty() } else { JsonCodec::new() };
            match codec.kind {
                CodecKind::Json => builder.register(codec.name.clone(), json),
                CodecKind::Binary => builder.register(codec.name.clone(), Base64Codec::new(json)),
            };
        }
        builder.build()
    }
}

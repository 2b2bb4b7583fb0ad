//! Names of the declarations the analysis recognizes.
//!
//! Marker names are fully qualified paths. The Rust source extractor resolves
//! `use` imports before comparing, so `#[JsonAttribute(...)]` after
//! `use bindgraph::JsonAttribute;` is recognized as [`JSON_ATTRIBUTE`].

/// Root marker: the type (or one of its constructors) is analyzed.
pub const COMPILED_JSON: &str = "bindgraph::CompiledJson";
/// Per-property overrides.
pub const JSON_ATTRIBUTE: &str = "bindgraph::JsonAttribute";
/// A type providing a custom reader/writer pair for another type.
pub const JSON_CONVERTER: &str = "bindgraph::JsonConverter";
/// Supertype of self-coding types.
pub const JSON_OBJECT: &str = "bindgraph::JsonObject";
/// Supertype of generated configuration types.
pub const CONFIGURATION: &str = "bindgraph::Configuration";

/// Reader/writer capability types expected on converters.
pub const READ_OBJECT: &str = "bindgraph::ReadObject";
pub const WRITE_OBJECT: &str = "bindgraph::WriteObject";
/// Reader capability expected on self-coding types.
pub const READ_JSON_OBJECT: &str = "bindgraph::ReadJsonObject";

/// Static member names holding converter or self-coding capabilities.
pub const READER_FIELD: &str = "JSON_READER";
pub const WRITER_FIELD: &str = "JSON_WRITER";

/// Keys understood on [`JSON_ATTRIBUTE`].
pub mod attribute {
    pub const NAME: &str = "name";
    pub const IGNORE: &str = "ignore";
    pub const NULLABLE: &str = "nullable";
    pub const MANDATORY: &str = "mandatory";
    pub const INDEX: &str = "index";
    pub const ALTERNATIVE_NAMES: &str = "alternative_names";
    pub const HASH_MATCH: &str = "hash_match";
    pub const TYPE_SIGNATURE: &str = "type_signature";
    pub const CONVERTER: &str = "converter";
}

/// Keys understood on [`COMPILED_JSON`](super::COMPILED_JSON).
pub mod object {
    pub const DESERIALIZE_AS: &str = "deserialize_as";
    pub const DESERIALIZE_NAME: &str = "deserialize_name";
    pub const ON_UNKNOWN: &str = "on_unknown";
    pub const TYPE_SIGNATURE: &str = "type_signature";
    pub const FORMATS: &str = "formats";
    pub const MINIFIED: &str = "minified";
}

/// Key understood on [`JSON_CONVERTER`](super::JSON_CONVERTER).
pub const TARGET: &str = "target";

//! Analysis policy.
//!
//! Options are plain serde data so embedders can keep them next to their build
//! configuration. Missing keys fall back to the defaults documented on each
//! field.
//!
//! ```json
//! {
//!   "unknownTypes": "warn",
//!   "annotationUsage": "implicit",
//!   "requireEmptyConstructor": false,
//!   "alternatives": { "ignore": ["serde::Skip"] }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::registry::{SupportKind, TypeRegistry};

/// How references to unanalyzable types are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnknownTypes {
    /// Not checked and not recorded.
    Allow,
    /// Reported as warnings.
    Warn,
    /// Reported as errors.
    #[default]
    Error,
}

/// Whether types reached implicitly must carry an explicit root declaration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnnotationUsage {
    /// Every discovered type must be declared explicitly.
    Explicit,
    #[default]
    Implicit,
    /// Implicit discovery is allowed except for types under `core_prefixes`.
    ImplicitNonCore,
}

/// Minimum level at which diagnostics are reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Error,
}

impl LogLevel {
    /// Whether a message at `level` passes this threshold.
    pub fn is_visible(self, level: LogLevel) -> bool {
        self <= level
    }
}

/// Maps a foreign declaration onto a boolean policy.
///
/// The policy applies when the declaration sets `name` to exactly `value`.
/// The first mapping whose key is present decides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerMapping {
    /// Key inside the foreign declaration holding the boolean.
    pub name: String,
    #[serde(default)]
    pub value: Option<bool>,
}

/// Foreign declarations honored in place of the native ones.
///
/// Lookups by declaration name; when a member carries several, the first
/// one in declaration order decides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlternativeMarkers {
    /// Declarations that exclude a member.
    pub ignore: IndexSet<String>,
    /// Declarations that mark a member non-nullable.
    pub non_nullable: IndexMap<String, Vec<MarkerMapping>>,
    /// Declaration name -> key holding the serialized name.
    pub alias: IndexMap<String, String>,
    /// Declarations that mark a member mandatory.
    pub mandatory: IndexMap<String, Vec<MarkerMapping>>,
    /// Declarations that select a constructor and also act as roots.
    pub constructors: IndexSet<String>,
    /// Declaration name -> key holding the array-format index.
    pub index: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisOptions {
    /// Defaults to [`UnknownTypes::Error`].
    pub unknown_types: UnknownTypes,
    /// Defaults to [`AnnotationUsage::Implicit`].
    pub annotation_usage: AnnotationUsage,
    /// Namespaces treated as core by [`AnnotationUsage::ImplicitNonCore`].
    pub core_prefixes: Vec<String>,
    /// Warnings are dropped when this is above [`LogLevel::Info`].
    pub log_level: LogLevel,
    /// Every concrete type must expose a public no-argument constructor.
    pub require_empty_constructor: bool,
    pub include_fields: bool,
    pub include_bean_methods: bool,
    pub include_exact_methods: bool,
    /// Start from [`TypeRegistry::with_builtins`].
    pub builtin_types: bool,
    pub supported_types: IndexSet<String>,
    pub container_types: IndexSet<String>,
    /// Primitive -> boxed form used when checking property converters.
    pub boxed_types: IndexMap<String, String>,
    pub alternatives: AlternativeMarkers,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            unknown_types: UnknownTypes::default(),
            annotation_usage: AnnotationUsage::default(),
            core_prefixes: vec!["std::".into(), "core::".into(), "alloc::".into()],
            log_level: LogLevel::default(),
            require_empty_constructor: false,
            include_fields: true,
            include_bean_methods: true,
            include_exact_methods: true,
            builtin_types: true,
            supported_types: IndexSet::new(),
            container_types: IndexSet::new(),
            boxed_types: IndexMap::new(),
            alternatives: AlternativeMarkers::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read analysis options from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid analysis options: {0}")]
    Parse(#[from] serde_json::Error),
}

impl AnalysisOptions {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Build the type registry described by these options.
    pub fn registry(&self) -> TypeRegistry {
        let mut registry = if self.builtin_types {
            TypeRegistry::with_builtins()
        } else {
            TypeRegistry::new()
        };
        for name in &self.supported_types {
            registry.register(name.as_str(), SupportKind::Value);
        }
        for name in &self.container_types {
            registry.register(name.as_str(), SupportKind::Container);
        }
        for (primitive, boxed) in &self.boxed_types {
            registry.register_boxed(primitive.as_str(), boxed.as_str());
        }
        registry
    }

    /// Whether `name` lives in a namespace considered core.
    pub fn is_core_type(&self, name: &str) -> bool {
        self.core_prefixes.iter().any(|prefix| name.starts_with(prefix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = AnalysisOptions::default();
        assert_eq!(options.unknown_types, UnknownTypes::Error);
        assert_eq!(options.annotation_usage, AnnotationUsage::Implicit);
        assert!(options.include_fields);
        assert!(options.include_bean_methods);
        assert!(options.include_exact_methods);
        assert!(!options.require_empty_constructor);
        assert!(options.is_core_type("std::time::Duration"));
        assert!(!options.is_core_type("app::Person"));
    }

    #[test]
    fn test_from_json_str_fills_missing_keys() {
        let options = AnalysisOptions::from_json_str(
            r#"{
                "unknownTypes": "warn",
                "annotationUsage": "implicitNonCore",
                "requireEmptyConstructor": true,
                "containerTypes": ["app::Tagged"],
                "alternatives": {
                    "ignore": ["serde::Skip"],
                    "nonNullable": { "app::NotNull": [] },
                    "alias": { "serde::Rename": "value" }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(options.unknown_types, UnknownTypes::Warn);
        assert_eq!(options.annotation_usage, AnnotationUsage::ImplicitNonCore);
        assert!(options.require_empty_constructor);
        assert!(options.include_fields);
        assert!(options.alternatives.ignore.contains("serde::Skip"));
        assert_eq!(options.alternatives.alias["serde::Rename"], "value");

        let registry = options.registry();
        assert!(registry.is_container("app::Tagged"));
        assert!(registry.is_supported("String"));
    }

    #[test]
    fn test_from_json_str_rejects_bad_values() {
        let err = AnalysisOptions::from_json_str(r#"{ "unknownTypes": "sometimes" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("invalid analysis options"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bindgraph.json");
        std::fs::write(&path, r#"{ "logLevel": "error", "builtinTypes": false }"#).unwrap();

        let options = AnalysisOptions::from_file(&path).unwrap();
        assert_eq!(options.log_level, LogLevel::Error);
        assert!(!options.registry().is_supported("String"));

        let missing = AnalysisOptions::from_file(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }

    #[test]
    fn test_log_level_visibility() {
        assert!(LogLevel::Info.is_visible(LogLevel::Info));
        assert!(LogLevel::Debug.is_visible(LogLevel::Info));
        assert!(!LogLevel::Error.is_visible(LogLevel::Info));
    }
}

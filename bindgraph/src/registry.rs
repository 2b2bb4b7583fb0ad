//! Registry of type names the analysis treats as natively supported.
//!
//! The registry tells the engine which leaf types need no metadata of their own
//! (numbers, strings, well-known library scalars) and which generic containers
//! can be encoded as long as their arguments can. Built-in mappings cover the
//! Rust prelude and the common collection crates; embedders can add their own.
//!
//! # Built-in mappings
//!
//! The following names are registered by [`TypeRegistry::with_builtins`]:
//!
//! | Kind | Names |
//! |------|-------|
//! | value | `bool`, `char`, `u8`..`u128`, `usize`, `i8`..`i128`, `isize`, `f32`, `f64`, `str`, `String`, `std::string::String` |
//! | value | `uuid::Uuid`, `bytes::Bytes`, `smol_str::SmolStr` |
//! | container | `Vec`, `Option`, `Box` and their `std::` paths |
//! | container | `std::collections::{VecDeque, BTreeMap, BTreeSet, HashMap, HashSet}` |
//! | container | `hashbrown::{HashMap, HashSet}`, `indexmap::{IndexMap, IndexSet}` |
//! | container | `thin_vec::ThinVec`, `arrayvec::ArrayVec`, `smallvec::SmallVec`, `tinyvec::TinyVec` |
//! | container | `std::sync::Arc`, `std::rc::Rc`, `triomphe::Arc` |
//!
//! # Custom mappings
//!
//! ```
//! use bindgraph::TypeRegistry;
//!
//! let mut registry = TypeRegistry::with_builtins();
//! registry.register("my_crate::Money", bindgraph::SupportKind::Value);
//! registry.register("my_crate::Tagged", bindgraph::SupportKind::Container);
//! assert!(registry.is_supported("my_crate::Money"));
//! assert!(registry.is_container("my_crate::Tagged"));
//! ```

use indexmap::IndexMap;
use serde::Serialize;

/// How a registered name participates in the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SupportKind {
    /// A leaf type encoded without further metadata.
    Value,
    /// A generic container whose arguments are analyzed separately.
    Container,
}

/// Decides whether a raw generic type name is a supported container.
///
/// The analysis consults this for raw names of generic signatures it cannot
/// otherwise resolve. [`TypeRegistry`] implements it from its registered
/// containers; any `Fn(&str) -> bool` works as well.
pub trait ContainerSupport {
    fn is_supported(&self, raw: &str) -> bool;
}

impl<F> ContainerSupport for F
where
    F: Fn(&str) -> bool,
{
    fn is_supported(&self, raw: &str) -> bool {
        self(raw)
    }
}

const PRIMITIVES: &[&str] = &[
    "bool", "char", "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16", "i32", "i64", "i128",
    "isize", "f32", "f64", "str", "String", "std::string::String",
];

const CONTAINERS: &[&str] = &[
    "Vec",
    "std::vec::Vec",
    "Option",
    "std::option::Option",
    "Box",
    "std::boxed::Box",
    "std::collections::VecDeque",
    "std::collections::BTreeMap",
    "std::collections::BTreeSet",
    "std::collections::HashMap",
    "std::collections::HashSet",
    "hashbrown::HashMap",
    "hashbrown::HashSet",
    "indexmap::IndexMap",
    "indexmap::IndexSet",
    "thin_vec::ThinVec",
    "arrayvec::ArrayVec",
    "smallvec::SmallVec",
    "tinyvec::TinyVec",
    "std::sync::Arc",
    "std::rc::Rc",
    "triomphe::Arc",
];

/// A registry of fully-qualified type name -> [`SupportKind`] associations,
/// plus the boxed forms used when validating property converters.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    mappings: IndexMap<String, SupportKind>,
    boxed: IndexMap<String, String>,
}

impl TypeRegistry {
    /// Create an empty registry with no mappings.
    pub fn new() -> Self {
        Self {
            mappings: IndexMap::new(),
            boxed: IndexMap::new(),
        }
    }

    /// Create a registry pre-populated with the built-in mappings.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtins();
        registry
    }

    /// Register all built-in mappings.
    pub fn register_builtins(&mut self) {
        for name in PRIMITIVES {
            self.register(*name, SupportKind::Value);
        }

        // Library scalars that are encoded as strings or bytes.
        self.register("uuid::Uuid", SupportKind::Value);
        self.register("bytes::Bytes", SupportKind::Value);
        self.register("smol_str::SmolStr", SupportKind::Value);

        for name in CONTAINERS {
            self.register(*name, SupportKind::Container);
        }
    }

    /// Register a name. An existing mapping for the same name is replaced.
    pub fn register(&mut self, name: impl Into<String>, kind: SupportKind) {
        self.mappings.insert(name.into(), kind);
    }

    /// Register the boxed form used for `primitive` when checking converters.
    pub fn register_boxed(&mut self, primitive: impl Into<String>, boxed: impl Into<String>) {
        self.boxed.insert(primitive.into(), boxed.into());
    }

    pub fn get(&self, name: &str) -> Option<SupportKind> {
        self.mappings.get(name).copied()
    }

    /// Check if a name is registered at all.
    pub fn contains(&self, name: &str) -> bool {
        self.mappings.contains_key(name)
    }

    /// Natively supported: any registered name, values and containers alike.
    pub fn is_supported(&self, name: &str) -> bool {
        self.contains(name.trim())
    }

    pub fn is_container(&self, name: &str) -> bool {
        self.get(name.trim()) == Some(SupportKind::Container)
    }

    /// The boxed form of `name`, or `name` itself.
    pub fn boxed_name<'n>(&'n self, name: &'n str) -> &'n str {
        self.boxed.get(name).map_or(name, String::as_str)
    }

    /// Remove a mapping.
    pub fn unregister(&mut self, name: &str) -> Option<SupportKind> {
        self.mappings.shift_remove(name)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ContainerSupport for TypeRegistry {
    fn is_supported(&self, raw: &str) -> bool {
        self.is_container(raw)
    }
}

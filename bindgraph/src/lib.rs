//! # bindgraph
//!
//! Compile-time analysis of serializable type graphs. Given the declarations
//! of a program, this crate discovers every type a JSON binding generator has
//! to handle, resolves their properties and constructors, and validates the
//! whole graph before any code is generated.
//!
//! ## Features
//!
//! - Discovery of the full type graph from root declarations (`CompiledJson`),
//!   following field types, array components and generic arguments
//! - Property extraction from public fields, bean accessors (`getX`/`setX`)
//!   and exact accessors (`x()`/`x(value)`), merged with explicit
//!   `JsonAttribute` declarations
//! - Validation of external converters and self-coding types
//! - Constructor matching for immutable types
//! - Mixin (interface and abstract class) implementation linking
//! - Deterministic output: every collection keeps insertion order
//! - Source file parsing with full `use` import resolution, so real Rust
//!   crates can be analyzed directly
//!
//! ## Quick Start
//!
//! ### Analyzing Rust sources
//!
//! ```
//! use bindgraph::{AnalysisOptions, SymbolSet, analyze_symbols};
//!
//! let mut symbols = SymbolSet::new();
//! symbols
//!     .add_source_str(
//!         "shop",
//!         r#"
//!         use bindgraph::{CompiledJson, JsonAttribute};
//!
//!         #[derive(CompiledJson)]
//!         pub struct Order {
//!             #[JsonAttribute(name = "order_id")]
//!             pub id: u64,
//!             pub lines: Vec<Line>,
//!         }
//!
//!         pub struct Line { pub sku: String, pub quantity: u32 }
//!         "#,
//!     )
//!     .unwrap();
//!
//! let result = analyze_symbols(&symbols, AnalysisOptions::default());
//! assert!(result.is_accepted());
//! assert!(result.structs["shop::Order"].attributes.contains_key("order_id"));
//! assert!(result.structs.contains_key("shop::Line"));
//! ```
//!
//! ### Describing symbols directly
//!
//! Any symbol provider can feed the analysis through the [`SymbolTable`]
//! trait; [`SymbolSet`] also has builders for describing types by hand:
//!
//! ```
//! use bindgraph::{Analysis, AnalysisOptions, ConstructorSymbol, Element, FieldSymbol, SymbolSet, TypeSymbol};
//! use bindgraph::symbols::Annotation;
//! use bindgraph::markers::COMPILED_JSON;
//!
//! let symbols = SymbolSet::new().with(
//!     TypeSymbol::class("app::Point")
//!         .public()
//!         .annotate(Annotation::new(COMPILED_JSON))
//!         .constructor(ConstructorSymbol::new().public())
//!         .field(FieldSymbol::new("x", "f64").public()),
//! );
//!
//! let mut analysis = Analysis::new(&symbols, AnalysisOptions::default());
//! analysis.process_roots(COMPILED_JSON, &[Element::ty("app::Point")]);
//! let result = analysis.analyze();
//! assert!(result.is_accepted());
//! ```
//!
//! ## Declarations
//!
//! | Declaration | Applies to | Effect |
//! |-------------|------------|--------|
//! | `CompiledJson` | types, constructors | Root of the analysis; selects the constructor |
//! | `JsonAttribute` | fields, methods, parameters | Alias, ignore, nullability, index, converter |
//! | `JsonConverter(target = T)` | types | External reader/writer pair for `T` |
//! | `JsonObject` | supertype | The type encodes itself through `JSON_READER` |
//!
//! Foreign declarations can stand in for the native ones through
//! [`AlternativeMarkers`](options::AlternativeMarkers).

mod analysis;
pub mod diagnostics;
mod extractor;
pub mod markers;
pub mod model;
pub mod options;
pub mod registry;
pub mod signature;
pub mod symbols;

pub use analysis::{Analysis, AnalysisResult, analyze_symbols};
pub use diagnostics::{Diagnostic, Severity};
pub use extractor::ExtractError;
pub use model::{
    Accessor, AttributeDescriptor, ObjectKind, OutputFormat, StructDescriptor, TypeSignature,
    UnknownBehavior,
};
pub use options::{AnalysisOptions, AnnotationUsage, ConfigError, LogLevel, UnknownTypes};
pub use registry::{ContainerSupport, SupportKind, TypeRegistry};
pub use symbols::{
    ConstructorSymbol, Element, FieldSymbol, MethodSymbol, Parameter, SymbolSet, SymbolTable,
    TypeKind, TypeSymbol,
};

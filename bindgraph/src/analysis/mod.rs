//! The analysis engine.
//!
//! An [`Analysis`] owns the graph of [`StructDescriptor`]s for one run. Roots
//! and converters are fed in with [`Analysis::process_converters`] and
//! [`Analysis::process_roots`], which discover types and resolve their
//! properties until nothing changes. [`Analysis::analyze`] then validates the
//! whole graph once and returns the [`AnalysisResult`].
//!
//! ```
//! use bindgraph::{AnalysisOptions, SymbolSet, TypeSymbol, ConstructorSymbol, FieldSymbol};
//! use bindgraph::symbols::Annotation;
//!
//! let symbols = SymbolSet::new().with(
//!     TypeSymbol::class("app::Point")
//!         .public()
//!         .annotate(Annotation::new(bindgraph::markers::COMPILED_JSON))
//!         .constructor(ConstructorSymbol::new().public())
//!         .field(FieldSymbol::new("x", "f64").public())
//!         .field(FieldSymbol::new("y", "f64").public()),
//! );
//!
//! let result = bindgraph::analyze_symbols(&symbols, AnalysisOptions::default());
//! assert!(result.is_accepted());
//! assert_eq!(result.structs["app::Point"].attributes.len(), 2);
//! ```

mod attributes;
mod constructors;
mod converter;
mod discovery;
mod extract;
mod linker;
mod unknown;
mod validate;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::markers;
use crate::model::StructDescriptor;
use crate::options::AnalysisOptions;
use crate::registry::{ContainerSupport, TypeRegistry};
use crate::symbols::{Element, SymbolTable, TypeSymbol};

pub struct Analysis<'a> {
    symbols: &'a dyn SymbolTable,
    options: AnalysisOptions,
    registry: TypeRegistry,
    container_support: Box<dyn ContainerSupport + 'a>,
    structs: IndexMap<String, StructDescriptor>,
    diagnostics: Diagnostics,
    /// Self-coding types already validated, so their errors are reported once.
    self_coding: IndexMap<String, bool>,
    configurations: Vec<String>,
}

/// The finalized graph of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// Descriptors in discovery order.
    pub structs: IndexMap<String, StructDescriptor>,
    pub diagnostics: Vec<Diagnostic>,
    /// Set when any error was recorded; generated code must not be produced.
    pub rejected: bool,
    /// Names of the configuration types found among converters.
    pub configurations: Vec<String>,
}

impl AnalysisResult {
    pub fn is_accepted(&self) -> bool {
        !self.rejected
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl<'a> Analysis<'a> {
    pub fn new(symbols: &'a dyn SymbolTable, options: AnalysisOptions) -> Self {
        let registry = options.registry();
        Self {
            symbols,
            container_support: Box::new(registry.clone()),
            diagnostics: Diagnostics::new(options.log_level),
            registry,
            options,
            structs: IndexMap::new(),
            self_coding: IndexMap::new(),
            configurations: Vec::new(),
        }
    }

    /// Replace the container-support predicate (the registry's containers by
    /// default).
    pub fn with_container_support(mut self, support: impl ContainerSupport + 'a) -> Self {
        self.container_support = Box::new(support);
        self
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    pub fn structs(&self) -> &IndexMap<String, StructDescriptor> {
        &self.structs
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.entries()
    }

    pub fn has_error(&self) -> bool {
        self.diagnostics.has_error()
    }

    /// Discover every root and resolve the reachable graph.
    ///
    /// Roots may be types or members; members contribute their owning type.
    /// Calling this again with more roots extends the same graph.
    #[tracing::instrument(level = "debug", skip(self, roots), fields(roots = roots.len()))]
    pub fn process_roots(&mut self, marker: &str, roots: &[Element]) {
        let reason = format!("{marker} requires accessible public constructor");
        for root in roots {
            self.discover(root.owner(), marker, &reason, &[]);
        }
        self.resolve_related_references();
        self.link_implementations();
    }

    /// Validate the graph and hand it out. Consumes the analysis so the
    /// finalization happens exactly once.
    pub fn analyze(mut self) -> AnalysisResult {
        let names: Vec<String> = self.structs.keys().cloned().collect();
        for name in &names {
            self.validate_struct(name);
        }
        debug!(
            structs = self.structs.len(),
            rejected = self.diagnostics.has_error(),
            "analysis finished"
        );
        AnalysisResult {
            structs: self.structs,
            rejected: self.diagnostics.has_error(),
            diagnostics: self.diagnostics.into_entries(),
            configurations: self.configurations,
        }
    }

    /// The symbol table, detached from the borrow of `self`.
    fn symbols(&self) -> &'a dyn SymbolTable {
        self.symbols
    }

    fn lookup(&self, name: &str) -> Option<&'a TypeSymbol> {
        self.symbols().lookup(name)
    }

    fn is_supported(&self, name: &str) -> bool {
        self.registry.is_supported(name)
    }

    fn is_container(&self, raw: &str) -> bool {
        self.container_support.is_supported(raw)
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// Run a whole analysis over a symbol table: converters first, then every type
/// or member marked as root, then the configured alternative constructor
/// markers.
pub fn analyze_symbols(symbols: &dyn SymbolTable, options: AnalysisOptions) -> AnalysisResult {
    let converters = symbols.elements_annotated_with(markers::JSON_CONVERTER);
    let roots = symbols.elements_annotated_with(markers::COMPILED_JSON);
    let alternatives: Vec<String> = options.alternatives.constructors.iter().cloned().collect();

    let mut analysis = Analysis::new(symbols, options);
    analysis.process_converters(&converters);
    analysis.process_roots(markers::COMPILED_JSON, &roots);
    for marker in &alternatives {
        let roots = symbols.elements_annotated_with(marker);
        if !roots.is_empty() {
            analysis.process_roots(marker, &roots);
        }
    }
    analysis.analyze()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::markers;
    use crate::symbols::{Annotation, AnnotationValue, ConstructorSymbol, MethodSymbol, Parameter};

    pub fn root() -> Annotation {
        Annotation::new(markers::COMPILED_JSON)
    }

    pub fn attr() -> Annotation {
        Annotation::new(markers::JSON_ATTRIBUTE)
    }

    pub fn alias(name: &str) -> Annotation {
        attr().with("name", AnnotationValue::Str(name.to_string()))
    }

    pub fn no_arg() -> ConstructorSymbol {
        ConstructorSymbol::new().public()
    }

    pub fn ctor(params: &[(&str, &str)]) -> ConstructorSymbol {
        params
            .iter()
            .fold(ConstructorSymbol::new().public(), |ctor, (name, ty)| {
                ctor.param(Parameter::new(*name, *ty))
            })
    }

    /// `get{Name}` returning `ty`.
    pub fn getter(property: &str, ty: &str) -> MethodSymbol {
        MethodSymbol::getter(format!("get{}", capitalize(property)), ty)
    }

    /// `set{Name}` accepting `ty`.
    pub fn setter(property: &str, ty: &str) -> MethodSymbol {
        MethodSymbol::setter(format!("set{}", capitalize(property)), ty)
    }

    fn capitalize(property: &str) -> String {
        let mut chars = property.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::model::ObjectKind;
    use crate::options::UnknownTypes;
    use crate::symbols::{FieldSymbol, SymbolSet};

    fn person() -> TypeSymbol {
        TypeSymbol::class("app::Person")
            .public()
            .annotate(root())
            .constructor(no_arg())
            .method(getter("name", "String"))
            .method(setter("name", "String"))
            .method(getter("age", "i32"))
            .method(setter("age", "i32"))
    }

    #[test]
    fn test_no_arg_constructor_with_accessor_pairs() {
        let symbols = SymbolSet::new().with(person());
        let result = analyze_symbols(&symbols, AnalysisOptions::default());

        assert!(result.is_accepted(), "{:?}", result.diagnostics);
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.structs.len(), 1);

        let info = &result.structs["app::Person"];
        assert_eq!(info.kind, ObjectKind::Class);
        let names: Vec<_> = info.attributes.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["name", "age"]);
        let selected = info.selected_constructor.as_ref().unwrap();
        assert!(selected.params.is_empty());
    }

    #[test]
    fn test_two_argument_constructor_matches_getters() {
        let symbols = SymbolSet::new().with(
            TypeSymbol::class("app::Person")
                .public()
                .annotate(root())
                .constructor(ctor(&[("name", "String"), ("age", "i32")]))
                .method(getter("name", "String"))
                .method(getter("age", "i32")),
        );
        let result = analyze_symbols(&symbols, AnalysisOptions::default());

        assert!(result.is_accepted(), "{:?}", result.diagnostics);
        assert!(result.diagnostics.is_empty());
        let info = &result.structs["app::Person"];
        assert_eq!(info.attributes.len(), 2);
        assert_eq!(
            info.selected_constructor.as_ref().unwrap().params,
            vec!["name", "age"]
        );
    }

    #[test]
    fn test_required_empty_constructor_rejects() {
        let symbols = SymbolSet::new().with(
            TypeSymbol::class("app::Person")
                .public()
                .annotate(root())
                .constructor(ctor(&[("name", "String"), ("age", "i32")]))
                .method(getter("name", "String"))
                .method(getter("age", "i32")),
        );
        let options = AnalysisOptions {
            require_empty_constructor: true,
            ..AnalysisOptions::default()
        };
        let result = analyze_symbols(&symbols, options);

        assert!(!result.is_accepted());
        assert!(
            result
                .errors()
                .any(|d| d.message.contains("does not have an empty or matching constructor"))
        );
    }

    #[test]
    fn test_discovery_is_deterministic() {
        let symbols = SymbolSet::new()
            .with(
                TypeSymbol::class("app::Order")
                    .public()
                    .annotate(root())
                    .constructor(no_arg())
                    .field(FieldSymbol::new("customer", "app::Customer").public())
                    .field(FieldSymbol::new("lines", "Vec<app::Line>").public())
                    .field(FieldSymbol::new("missing", "app::Missing").public()),
            )
            .with(
                TypeSymbol::class("app::Customer")
                    .public()
                    .constructor(no_arg())
                    .field(FieldSymbol::new("name", "String").public()),
            )
            .with(
                TypeSymbol::class("app::Line")
                    .public()
                    .constructor(no_arg())
                    .field(FieldSymbol::new("sku", "String").public()),
            );

        let first = analyze_symbols(&symbols, AnalysisOptions::default());
        let second = analyze_symbols(&symbols, AnalysisOptions::default());

        let generated = |r: &AnalysisResult| -> Vec<(String, String)> {
            r.structs
                .values()
                .map(|s| (s.type_name.clone(), s.generated_name.clone()))
                .collect()
        };
        assert_eq!(generated(&first), generated(&second));
        assert_eq!(first.diagnostics, second.diagnostics);
        assert_eq!(
            generated(&first),
            vec![
                ("app::Order".to_string(), "struct0".to_string()),
                ("app::Customer".to_string(), "struct1".to_string()),
                ("app::Line".to_string(), "struct2".to_string()),
            ]
        );
        assert_eq!(
            first.structs["app::Line"].discovery_path,
            vec!["Order", "lines"]
        );
        assert!(!first.is_accepted());
    }

    #[test]
    fn test_rediscovery_is_a_no_op() {
        let symbols = SymbolSet::new().with(person());
        let roots = vec![Element::ty("app::Person")];

        let mut analysis = Analysis::new(&symbols, AnalysisOptions::default());
        analysis.process_roots(markers::COMPILED_JSON, &roots);
        let before = analysis.structs().clone();
        analysis.process_roots(markers::COMPILED_JSON, &roots);

        assert_eq!(analysis.structs(), &before);
        assert!(analysis.diagnostics().is_empty());
    }

    #[test]
    fn test_members_resolve_to_their_owner() {
        let symbols = SymbolSet::new().with(
            TypeSymbol::class("app::Person")
                .public()
                .constructor(ctor(&[("name", "String")]).annotate(root()))
                .method(getter("name", "String")),
        );
        let result = analyze_symbols(&symbols, AnalysisOptions::default());

        assert!(result.is_accepted(), "{:?}", result.diagnostics);
        let info = &result.structs["app::Person"];
        assert!(info.source_attribute.is_some());
        assert_eq!(info.selected_constructor.as_ref().unwrap().index, 0);
    }

    #[test]
    fn test_result_serializes_to_json() {
        let symbols = SymbolSet::new().with(person());
        let options = AnalysisOptions {
            unknown_types: UnknownTypes::Warn,
            ..AnalysisOptions::default()
        };
        let json = analyze_symbols(&symbols, options).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["rejected"], false);
        assert_eq!(value["structs"]["app::Person"]["generatedName"], "struct0");
        assert_eq!(
            value["structs"]["app::Person"]["attributes"]["name"]["accessor"]["kind"],
            "readWrite"
        );
    }

    #[test]
    fn test_custom_container_support() {
        let symbols = SymbolSet::new().with(
            TypeSymbol::class("app::Bag")
                .public()
                .annotate(root())
                .constructor(no_arg())
                .field(FieldSymbol::new("items", "app::Stack<String>").public()),
        );
        let strict = analyze_symbols(&symbols, AnalysisOptions::default());
        assert!(!strict.is_accepted());

        let mut analysis = Analysis::new(&symbols, AnalysisOptions::default())
            .with_container_support(|raw: &str| raw == "app::Stack");
        analysis.process_roots(markers::COMPILED_JSON, &[Element::ty("app::Bag")]);
        let result = analysis.analyze();
        assert!(result.is_accepted(), "{:?}", result.diagnostics);
    }
}

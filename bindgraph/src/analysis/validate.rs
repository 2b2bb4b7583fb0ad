//! The final consistency pass over the completed graph.

use indexmap::IndexSet;
use tracing::trace;

use super::Analysis;
use crate::diagnostics::Diagnostic;
use crate::markers;
use crate::model::{ObjectKind, OutputFormat, StructDescriptor};
use crate::options::UnknownTypes;
use crate::symbols::{Element, TypeKind, simple_name_of};

/// Names used when describing a mixin in diagnostics.
struct MixinWording {
    what: &'static str,
    one: &'static str,
}

const INTERFACE: MixinWording = MixinWording {
    what: "interface",
    one: "implementation",
};

const ABSTRACT_CLASS: MixinWording = MixinWording {
    what: "abstract class",
    one: "concrete extension",
};

fn capitalized(what: &str) -> String {
    let mut chars = what.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl<'a> Analysis<'a> {
    fn mixin_wording(&self, name: &str) -> MixinWording {
        match self.lookup(name) {
            Some(symbol) if symbol.kind == TypeKind::Interface => INTERFACE,
            _ => ABSTRACT_CLASS,
        }
    }

    /// Run every graph-level check on one descriptor, then finalize it.
    pub(crate) fn validate_struct(&mut self, name: &str) {
        let Some(info) = self.structs.get(name).cloned() else {
            return;
        };
        trace!(name, "validating");
        let location = Element::ty(name);
        let declared_by = info.discovered_via.clone();
        let error = |message: String| {
            Diagnostic::error(message)
                .at(location.clone())
                .declared_by(declared_by.clone())
        };
        let policy = self.options.unknown_types;
        let coded_elsewhere = info.converter.is_some() || info.is_self_coding;
        let is_class = info.kind == ObjectKind::Class && !coded_elsewhere;

        if is_class
            && info.selected_constructor.is_none()
            && let Some(matching) = &info.matching_constructors
        {
            let message = if matching.is_empty() {
                format!(
                    "No matching constructors found for '{name}'. Make sure there is at least one matching constructor available."
                )
            } else {
                format!(
                    "Multiple matching constructors found for '{name}'. Declare the constructor to use with {} or an alternative constructor marker.",
                    simple_name_of(markers::COMPILED_JSON)
                )
            };
            self.report(error(message));
        }

        if policy != UnknownTypes::Allow {
            self.check_unresolved_references(&info);
            self.check_mixin_references(&info);
            if info.kind == ObjectKind::Mixin && info.implementers.is_empty() {
                let wording = self.mixin_wording(name);
                let message = format!(
                    "{} ({name}) is referenced, but it doesn't have registered implementations with {}. \
                     At least one {} of specified {} must be declared with {} or allow unknown types during analysis",
                    capitalized(wording.what),
                    simple_name_of(markers::COMPILED_JSON),
                    wording.one,
                    wording.what,
                    simple_name_of(markers::COMPILED_JSON),
                );
                self.report(self.unknown_type_diagnostic(policy, message, location.clone(), &declared_by));
            }
        }

        if is_class
            && !info.has_empty_constructor()
            && let Some(selected) = &info.selected_constructor
        {
            for param in &selected.params {
                if !info.attributes.values().any(|attr| &attr.property == param) {
                    self.report(
                        Diagnostic::error(format!(
                            "Unable to find matching property: '{param}' used in constructor. \
                             Either retain parameter names or manually create an instance via converter"
                        ))
                        .at(Element::constructor(name, selected.index))
                        .declared_by(declared_by.clone()),
                    );
                }
            }
        }

        if info.hash_collision().is_some() {
            self.report(error(format!(
                "Duplicate hash value detected. Unable to create binding for: '{name}'. \
                 Remove (or reduce) alternative_names from {} to resolve this issue.{}",
                simple_name_of(markers::JSON_ATTRIBUTE),
                info.path_description()
            )));
        }

        let mut deserialize_target = None;
        if let Some(target) = &info.deserialize_as {
            if self.structs.contains_key(target) {
                deserialize_target = Some(target.clone());
            } else {
                self.report(error(format!(
                    "Unable to find metadata for: '{target}'. Add {} declaration to target type.",
                    simple_name_of(markers::COMPILED_JSON)
                )));
            }
        } else if info.kind == ObjectKind::Mixin {
            let mut names = IndexSet::new();
            for implementer in &info.implementers {
                let Some(actual) = self.structs.get(implementer).map(|s| s.discriminator().to_string()) else {
                    continue;
                };
                if names.contains(&actual) {
                    self.report(error(format!(
                        "Duplicate deserialization name detected: '{actual}' for mixin: {name}"
                    )));
                } else if actual.contains('\\') || actual.contains('"') {
                    self.report(error(format!(
                        "Invalid deserialization name (with quotes or escape chars) detected: '{actual}' for mixin: {name}"
                    )));
                }
                names.insert(actual);
            }
        }

        if is_class && !info.has_empty_constructor() {
            if self.options.require_empty_constructor {
                self.report(error(format!(
                    "'{name}' does not have an empty or matching constructor. A public no argument constructor is required{}",
                    info.path_description()
                )));
            } else if info
                .selected_constructor
                .as_ref()
                .is_none_or(|ctor| ctor.params.len() != info.attributes.len())
            {
                self.report(error(format!(
                    "'{name}' does not have an empty or matching constructor{}",
                    info.path_description()
                )));
            }
        }

        if info.has_format(OutputFormat::Array) {
            let mut indexes = IndexSet::new();
            for attr in info.attributes.values() {
                let at = attr.accessor.element();
                if !attr.has_index() && info.has_empty_constructor() {
                    self.report(
                        Diagnostic::error(format!(
                            "When array format is used all properties must have index order defined. Property {} doesn't have index defined",
                            attr.property
                        ))
                        .at(at)
                        .declared_by(declared_by.clone()),
                    );
                } else if attr.has_index() && !indexes.insert(attr.index) {
                    self.report(
                        Diagnostic::error(format!(
                            "Duplicate index detected on {}. Index values must be distinct to be used in array format",
                            attr.property
                        ))
                        .at(at)
                        .declared_by(declared_by.clone()),
                    );
                }
            }
        }

        if let Some(info) = self.structs.get_mut(name) {
            if deserialize_target.is_some() {
                info.deserialize_target = deserialize_target;
            }
            if info.is_compact {
                info.prepare_minified_names();
            }
            info.sort_attributes();
        }
    }

    fn unknown_type_diagnostic(
        &self,
        policy: UnknownTypes,
        message: String,
        location: Element,
        declared_by: &str,
    ) -> Diagnostic {
        let diagnostic = match policy {
            UnknownTypes::Error => Diagnostic::error(message),
            _ => Diagnostic::warning(message),
        };
        diagnostic.at(location).declared_by(declared_by)
    }

    /// Re-check references that were unknown when their attribute was
    /// resolved; types discovered since then no longer count.
    fn check_unresolved_references(&mut self, info: &StructDescriptor) {
        let policy = self.options.unknown_types;
        for (id, sig) in &info.unresolved_references {
            let attr = info.attributes.get(id);
            if attr.is_some_and(|a| a.converter.is_some() || a.is_self_coding) {
                continue;
            }
            let location = attr.map_or_else(|| Element::ty(&info.type_name), |a| a.accessor.element());
            for (part, known) in self.analyze_parts(sig) {
                if known {
                    continue;
                }
                let message = if part == *sig {
                    format!(
                        "Property {id} is referencing unknown type: '{sig}'. \
                         Register custom converter, mark property as ignored or enable unknown types"
                    )
                } else {
                    format!(
                        "Property {id} is referencing unknown type: '{sig}' which has an unknown part: '{part}'. \
                         Register custom converter, mark property as ignored or enable unknown types"
                    )
                };
                let diagnostic =
                    self.unknown_type_diagnostic(policy, message, location.clone(), &info.discovered_via);
                self.report(diagnostic);
            }
        }
    }

    /// Attributes typed with a mixin that no analyzed class implements.
    fn check_mixin_references(&mut self, info: &StructDescriptor) {
        for attr in info.attributes.values() {
            if attr.converter.is_some() || attr.is_self_coding {
                continue;
            }
            for part in self.analyze_parts(&attr.declared_type).into_keys() {
                let orphan = self
                    .structs
                    .get(&part)
                    .is_some_and(|s| s.kind == ObjectKind::Mixin && s.implementers.is_empty());
                if !orphan {
                    continue;
                }
                let wording = self.mixin_wording(&part);
                let marker = simple_name_of(markers::COMPILED_JSON);
                self.report(
                    Diagnostic::error(format!(
                        "Property {} is referencing {} ({part}) which doesn't have registered implementations with {marker}. \
                         At least one {} of specified {} must be declared with {marker} or allow unknown types during analysis",
                        attr.property, wording.what, wording.one, wording.what
                    ))
                    .at(attr.accessor.element())
                    .declared_by(info.discovered_via.clone()),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use crate::analysis::analyze_symbols;
    use crate::diagnostics::Severity;
    use crate::options::{AnalysisOptions, UnknownTypes};
    use crate::symbols::{AnnotationValue, FieldSymbol, SymbolSet, TypeSymbol};

    fn with_policy(policy: UnknownTypes) -> AnalysisOptions {
        AnalysisOptions {
            unknown_types: policy,
            ..AnalysisOptions::default()
        }
    }

    fn indexed(name: &str, index: i64) -> FieldSymbol {
        FieldSymbol::new(name, "i32")
            .public()
            .annotate(attr().with("index", AnnotationValue::Int(index)))
    }

    fn array_root() -> crate::symbols::Annotation {
        root().with("formats", AnnotationValue::Str("array".into()))
    }

    #[test]
    fn test_array_format_rejects_duplicate_indexes() {
        let symbols = SymbolSet::new().with(
            TypeSymbol::class("app::Point")
                .public()
                .annotate(array_root())
                .constructor(no_arg())
                .field(indexed("x", 0))
                .field(indexed("y", 0)),
        );
        let result = analyze_symbols(&symbols, AnalysisOptions::default());

        let errors: Vec<_> = result.errors().map(|d| d.message.as_str()).collect();
        assert_eq!(
            errors,
            vec!["Duplicate index detected on y. Index values must be distinct to be used in array format"]
        );
    }

    #[test]
    fn test_array_format_requires_indexes() {
        let symbols = SymbolSet::new().with(
            TypeSymbol::class("app::Point")
                .public()
                .annotate(array_root())
                .constructor(no_arg())
                .field(indexed("x", 1))
                .field(FieldSymbol::new("y", "i32").public()),
        );
        let result = analyze_symbols(&symbols, AnalysisOptions::default());

        assert!(!result.is_accepted());
        assert!(result.errors().any(|d| d.message
            == "When array format is used all properties must have index order defined. Property y doesn't have index defined"));
    }

    #[test]
    fn test_attributes_are_sorted_by_index() {
        let symbols = SymbolSet::new().with(
            TypeSymbol::class("app::Point")
                .public()
                .annotate(array_root())
                .constructor(no_arg())
                .field(indexed("z", 2))
                .field(indexed("x", 0))
                .field(indexed("y", 1)),
        );
        let result = analyze_symbols(&symbols, AnalysisOptions::default());

        assert!(result.is_accepted(), "{:?}", result.diagnostics);
        let order: Vec<_> = result.structs["app::Point"].attributes.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["x", "y", "z"]);
    }

    fn lonely_interface() -> SymbolSet {
        SymbolSet::new().with(TypeSymbol::interface("app::Animal").public().annotate(root()))
    }

    #[test]
    fn test_mixin_without_implementers_is_rejected_when_strict() {
        let result = analyze_symbols(&lonely_interface(), AnalysisOptions::default());
        assert!(!result.is_accepted());
        let errors: Vec<_> = result.errors().map(|d| d.message.as_str()).collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Interface (app::Animal) is referenced, but it doesn't have registered implementations"));
    }

    #[test]
    fn test_mixin_without_implementers_is_tolerated_when_lenient() {
        let warn = analyze_symbols(&lonely_interface(), with_policy(UnknownTypes::Warn));
        assert!(warn.is_accepted());
        assert_eq!(warn.diagnostics.len(), 1);
        assert_eq!(warn.diagnostics[0].severity, Severity::Warning);

        let allow = analyze_symbols(&lonely_interface(), with_policy(UnknownTypes::Allow));
        assert!(allow.is_accepted());
        assert!(allow.diagnostics.is_empty());
        assert!(allow.structs["app::Animal"].implementers.is_empty());
    }

    #[test]
    fn test_interface_property_without_implementers() {
        let symbols = SymbolSet::new()
            .with(
                TypeSymbol::class("app::Owner")
                    .public()
                    .annotate(root())
                    .constructor(no_arg())
                    .field(FieldSymbol::new("pet", "app::Animal").public()),
            )
            .with(TypeSymbol::interface("app::Animal").public());
        let result = analyze_symbols(&symbols, AnalysisOptions::default());

        assert!(!result.is_accepted());
        let errors: Vec<_> = result.errors().map(|d| d.message.as_str()).collect();
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors[0].starts_with(
            "Property pet is referencing interface (app::Animal) which doesn't have registered implementations"
        ));
        assert!(errors[1].starts_with("Interface (app::Animal) is referenced"));
    }

    #[test]
    fn test_abstract_class_wording() {
        let symbols =
            SymbolSet::new().with(TypeSymbol::class("app::Shape").public().with_abstract().annotate(root()));
        let result = analyze_symbols(&symbols, AnalysisOptions::default());
        let error = result.errors().next().unwrap();
        assert!(error.message.starts_with("Abstract class (app::Shape) is referenced"));
        assert!(error.message.contains("At least one concrete extension of specified abstract class"));
    }

    #[test]
    fn test_orphan_constructor_parameter() {
        let symbols = SymbolSet::new().with(
            TypeSymbol::class("app::Person")
                .public()
                .constructor(ctor(&[("name", "String"), ("extra", "i32")]).annotate(root()))
                .method(getter("name", "String")),
        );
        let result = analyze_symbols(&symbols, AnalysisOptions::default());

        assert!(!result.is_accepted());
        let messages: Vec<_> = result.errors().map(|d| d.message.as_str()).collect();
        assert!(messages.contains(
            &"Unable to find matching property: 'extra' used in constructor. Either retain parameter names or manually create an instance via converter"
        ));
        assert!(messages.contains(&"'app::Person' does not have an empty or matching constructor"));
    }

    #[test]
    fn test_discriminators_must_be_unique_and_safe() {
        let implementer = |name: &str, discriminator: &str| {
            TypeSymbol::class(name)
                .public()
                .extends("app::Event")
                .annotate(root().with("deserialize_name", AnnotationValue::Str(discriminator.into())))
                .constructor(no_arg())
        };
        let symbols = SymbolSet::new()
            .with(TypeSymbol::interface("app::Event").public().annotate(root()))
            .with(implementer("app::Created", "event"))
            .with(implementer("app::Deleted", "event"))
            .with(implementer("app::Quoted", "say \"hi\""));
        let result = analyze_symbols(&symbols, AnalysisOptions::default());

        let errors: Vec<_> = result.errors().map(|d| d.message.as_str()).collect();
        assert_eq!(
            errors,
            vec![
                "Duplicate deserialization name detected: 'event' for mixin: app::Event",
                "Invalid deserialization name (with quotes or escape chars) detected: 'say \"hi\"' for mixin: app::Event",
            ]
        );
    }

    #[test]
    fn test_hash_collision_through_alternative_names() {
        let symbols = SymbolSet::new().with(
            TypeSymbol::class("app::User")
                .public()
                .annotate(root())
                .constructor(no_arg())
                .field(FieldSymbol::new("name", "String").public())
                .field(
                    FieldSymbol::new("nick", "String").public().annotate(attr().with(
                        "alternative_names",
                        AnnotationValue::List(vec![AnnotationValue::Str("name".into())]),
                    )),
                ),
        );
        let result = analyze_symbols(&symbols, AnalysisOptions::default());
        assert!(result.errors().any(|d| d.message.starts_with(
            "Duplicate hash value detected. Unable to create binding for: 'app::User'."
        )));
    }

    #[test]
    fn test_compact_struct_gets_minified_names() {
        let symbols = SymbolSet::new().with(
            TypeSymbol::class("app::User")
                .public()
                .annotate(root().with("minified", AnnotationValue::Bool(true)))
                .constructor(no_arg())
                .field(FieldSymbol::new("name", "String").public())
                .field(FieldSymbol::new("nick", "String").public())
                .field(FieldSymbol::new("email", "String").public().annotate(alias("mail"))),
        );
        let result = analyze_symbols(&symbols, AnalysisOptions::default());

        assert!(result.is_accepted(), "{:?}", result.diagnostics);
        let user = &result.structs["app::User"];
        assert_eq!(user.attributes["name"].minified_name.as_deref(), Some("n"));
        assert_eq!(user.attributes["nick"].minified_name.as_deref(), Some("i"));
        assert_eq!(user.attributes["mail"].minified_name, None);
    }
}

//! Type discovery and the fixed-point resolution loop.

use indexmap::IndexSet;
use tracing::{debug, trace};

use super::Analysis;
use super::constructors::candidate_constructors;
use crate::diagnostics::Diagnostic;
use crate::markers::{self, object};
use crate::model::{
    ObjectKind, OutputFormat, ResolutionState, StructDescriptor, TypeSignature, UnknownBehavior,
};
use crate::options::AnnotationUsage;
use crate::signature;
use crate::symbols::{Annotated, Annotation, Element, TypeKind, TypeSymbol};

impl<'a> Analysis<'a> {
    /// Create the descriptor for `name` unless it is already known.
    ///
    /// `reason` explains why the type is needed and prefixes every eligibility
    /// error; `path` is the chain of owners and properties that led here.
    #[tracing::instrument(level = "trace", skip(self, reason, path))]
    pub(crate) fn discover(&mut self, name: &str, discovered_by: &str, reason: &str, path: &[String]) {
        if self.structs.contains_key(name) || self.is_supported(name) {
            return;
        }
        let Some(symbol) = self.lookup(name) else {
            trace!(name, "no symbol, skipping discovery");
            return;
        };
        let is_self_coding = self.is_self_coding(symbol);
        let declaration = scan_for_declaration(symbol, discovered_by);
        let location = Element::ty(&symbol.name);

        if !symbol.modifiers.public {
            self.report(
                Diagnostic::error(format!("{reason}, therefore '{name}' must be public"))
                    .at(location)
                    .declared_by(discovered_by),
            );
            return;
        }
        if symbol.is_nested() && !symbol.modifiers.is_static {
            self.report(
                Diagnostic::error(format!(
                    "{reason}, therefore '{name}' can't be a nested member. Only static nested types are supported."
                ))
                .at(location)
                .declared_by(discovered_by),
            );
            return;
        }
        if symbol.is_unaddressable() {
            self.report(
                Diagnostic::error(format!(
                    "{reason}, but type '{name}' is defined without a namespace and cannot be accessed."
                ))
                .at(location)
                .declared_by(discovered_by),
            );
            return;
        }

        let kind = if symbol.is_abstract() {
            ObjectKind::Mixin
        } else if symbol.kind == TypeKind::Enum {
            ObjectKind::Enum
        } else {
            ObjectKind::Class
        };

        let mut on_unknown = None;
        let mut type_signature = None;
        let mut redirect = None;
        if !is_self_coding {
            match declaration {
                Some(declaration) => {
                    on_unknown = declaration
                        .get(object::ON_UNKNOWN)
                        .and_then(|v| v.as_name())
                        .and_then(UnknownBehavior::from_name);
                    type_signature = declaration
                        .get(object::TYPE_SIGNATURE)
                        .and_then(|v| v.as_name())
                        .and_then(TypeSignature::from_name);
                    if let Some(target) = declaration.get(object::DESERIALIZE_AS).and_then(|v| v.as_type()) {
                        match self.validate_redirect(symbol, target) {
                            Err(problem) => self.report(
                                Diagnostic::error(format!(
                                    "{reason}, but specified deserialize_as target: '{target}' {problem}"
                                ))
                                .at(location.clone())
                                .declared_by(discovered_by),
                            ),
                            Ok(()) if target != name => redirect = Some(target.to_string()),
                            Ok(()) => {}
                        }
                    }
                }
                None => self.check_implicit_usage(name, reason),
            }
        }

        let formats = declared_formats(declaration);
        if formats.iter().collect::<IndexSet<_>>().len() != formats.len() {
            self.report(
                Diagnostic::error(format!("Duplicate format detected on '{name}'."))
                    .at(location.clone())
                    .declared_by(discovered_by),
            );
        }

        // A redirect target is named before the type redirecting to it.
        if let Some(target) = &redirect {
            self.discover(target, discovered_by, reason, path);
        }

        let mut info = StructDescriptor::new(
            name,
            &symbol.simple_name,
            kind,
            format!("struct{}", self.structs.len()),
            discovered_by,
        );
        info.is_self_coding = is_self_coding;
        info.source_attribute = declaration.cloned();
        info.on_unknown = on_unknown;
        info.type_signature = type_signature;
        info.deserialize_as = redirect.clone();
        info.deserialize_name = declaration
            .and_then(|d| d.get(object::DESERIALIZE_NAME))
            .and_then(|v| v.as_str())
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        info.is_compact = declaration
            .and_then(|d| d.get(object::MINIFIED))
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if !formats.is_empty() {
            info.formats = formats;
        }
        info.candidate_constructors = candidate_constructors(symbol);
        info.selected_constructor = self
            .find_annotated_constructor(symbol, discovered_by)
            .or_else(|| match info.candidate_constructors.as_deref() {
                Some([only]) => Some(only.clone()),
                _ => None,
            });
        info.discovery_path = path.to_vec();
        if kind == ObjectKind::Enum {
            info.enum_constants = enum_constants(symbol);
        }

        debug!(name, generated = %info.generated_name, ?kind, "discovered type");
        self.structs.insert(name.to_string(), info);
    }

    fn check_implicit_usage(&mut self, name: &str, reason: &str) {
        let location = Element::ty(name);
        match self.options.annotation_usage {
            AnnotationUsage::Implicit => {}
            AnnotationUsage::Explicit => self.report(
                Diagnostic::error(format!(
                    "Annotation usage is set to explicit, but '{name}' is used implicitly through references. \
                     Either change usage to implicit, ignore the property referencing this type or register a custom converter for it. {reason}"
                ))
                .at(location),
            ),
            AnnotationUsage::ImplicitNonCore if self.options.is_core_type(name) => self.report(
                Diagnostic::error(format!(
                    "Annotation usage is set to non-core, but '{name}' is found in a core namespace. \
                     Either change usage to implicit, ignore the property referencing this type, register a custom converter for it or add a declaration to this type. {reason}"
                ))
                .at(location),
            ),
            AnnotationUsage::ImplicitNonCore => {}
        }
    }

    /// Why `target` cannot be used as the redirect of `source`, if it can't.
    fn validate_redirect(&self, source: &TypeSymbol, target: &str) -> Result<(), String> {
        let Some(target_symbol) = self.lookup(target) else {
            return Err("cannot be found".to_string());
        };
        if !target_symbol.modifiers.public {
            Err("must be public".to_string())
        } else if target_symbol.is_nested() && !target_symbol.modifiers.is_static {
            Err("can't be a nested member. Only public static nested types are supported".to_string())
        } else if target_symbol.is_unaddressable() {
            Err("is defined without a namespace and cannot be accessed".to_string())
        } else if target_symbol.is_abstract() {
            Err("must be a concrete type".to_string())
        } else if source.name != target_symbol.name && !source.is_abstract() {
            Err(format!(
                "can only be specified for interfaces and abstract classes. '{}' is neither interface nor abstract class",
                source.name
            ))
        } else if !self.symbols().is_assignable(&target_symbol.name, &source.name) {
            Err(format!("is not assignable to '{}'", source.name))
        } else {
            Ok(())
        }
    }

    /// Resolve properties of every known type until a full pass neither
    /// discovers a type nor selects a constructor.
    pub(crate) fn resolve_related_references(&mut self) {
        let mut iteration = 0usize;
        loop {
            let before = self.progress();
            let names: Vec<String> = self.structs.keys().cloned().collect();
            for name in &names {
                self.resolve_struct(name);
            }
            iteration += 1;
            trace!(iteration, structs = self.structs.len(), "resolution pass");
            if self.progress() == before {
                break;
            }
        }
        debug!(iterations = iteration, structs = self.structs.len(), "graph resolved");
    }

    fn progress(&self) -> (usize, usize) {
        let selected = self
            .structs
            .values()
            .filter(|s| s.selected_constructor.is_some())
            .count();
        (self.structs.len(), selected)
    }

    fn resolve_struct(&mut self, name: &str) {
        if let Some(info) = self.structs.get_mut(name)
            && (info.is_external_adapter || info.is_self_coding)
        {
            // Externally coded types have no structure of their own to resolve.
            info.state = ResolutionState::Resolved;
            return;
        }
        let Some(info) = self.structs.get(name) else {
            return;
        };
        let Some(symbol) = self.lookup(name) else {
            return;
        };
        let ctor = info
            .selected_constructor
            .as_ref()
            .and_then(|c| symbol.constructors.get(c.index));
        let has_declaration = info.source_attribute.is_some();
        let mut path = info.discovery_path.clone();
        path.push(symbol.simple_name.clone());

        if self.options.include_bean_methods {
            for (property, access) in self.bean_properties(symbol, ctor) {
                self.analyze_attribute(name, &property, access, "bean property", &mut path);
            }
        }
        if self.options.include_exact_methods {
            for (property, access) in self.exact_properties(symbol, ctor) {
                if !self.has_attribute(name, &property) || has_declaration {
                    self.analyze_attribute(name, &property, access, "exact property", &mut path);
                }
            }
        }
        if self.options.include_fields {
            for (property, access) in self.public_fields(symbol, ctor) {
                if !self.has_attribute(name, &property) || has_declaration {
                    self.analyze_attribute(name, &property, access, "field", &mut path);
                }
            }
        }

        self.match_constructor(name, symbol);
        if let Some(info) = self.structs.get_mut(name) {
            info.state = ResolutionState::Resolved;
        }
    }

    fn has_attribute(&self, name: &str, key: &str) -> bool {
        self.structs
            .get(name)
            .is_some_and(|info| info.attributes.contains_key(key))
    }

    /// Queue discovery for a type referenced by a property, directly, as an
    /// array component or as a generic argument.
    pub(crate) fn check_related_property(
        &mut self,
        signature: &str,
        discovered_by: &str,
        access: &str,
        inside: &str,
        path: &[String],
    ) {
        if self.is_supported(signature) {
            return;
        }
        let marker = crate::symbols::simple_name_of(markers::COMPILED_JSON);
        if self.lookup(signature).is_some() {
            let reason = format!(
                "{signature} is referenced as {access} from '{inside}' through {marker} declaration."
            );
            self.discover(signature, discovered_by, &reason, path);
            return;
        }
        if let Some(component) = signature::array_component(signature)
            && self.lookup(component).is_some()
        {
            let reason = format!(
                "{component} is referenced as array {access} from '{inside}' through {marker} declaration."
            );
            self.discover(component, discovered_by, &reason, path);
            return;
        }
        let Some((_, arguments)) = signature::generic_split(signature) else {
            return;
        };
        if self.is_supported(arguments) {
            return;
        }
        for part in signature::flatten_arguments(arguments) {
            if self.structs.contains_key(&part) || self.is_supported(&part) {
                continue;
            }
            let Some(symbol) = self.lookup(&part) else {
                continue;
            };
            if !symbol.type_params.is_empty() && self.is_container(&part) {
                continue;
            }
            let reason = format!(
                "{part} is referenced as collection {access} from '{inside}' through {marker} declaration."
            );
            self.discover(&part, discovered_by, &reason, path);
        }
    }
}

/// The root declaration on the type itself, or on one of its constructors.
fn scan_for_declaration<'s>(symbol: &'s TypeSymbol, marker: &str) -> Option<&'s Annotation> {
    symbol.annotation(marker).or_else(|| {
        symbol
            .constructors
            .iter()
            .find_map(|ctor| ctor.annotation(marker))
    })
}

fn declared_formats(declaration: Option<&Annotation>) -> Vec<OutputFormat> {
    let Some(value) = declaration.and_then(|d| d.get(object::FORMATS)) else {
        return Vec::new();
    };
    match value.as_list() {
        Some(values) => values
            .iter()
            .filter_map(|v| v.as_name())
            .filter_map(OutputFormat::from_name)
            .collect(),
        None => value
            .as_name()
            .and_then(OutputFormat::from_name)
            .into_iter()
            .collect(),
    }
}

/// Same-typed static fields of an enumeration.
fn enum_constants(symbol: &TypeSymbol) -> Vec<String> {
    symbol
        .fields
        .iter()
        .filter(|f| f.modifiers.is_static && signature::raw_name(&f.ty) == symbol.name)
        .map(|f| f.name.clone())
        .collect()
}

//! Classification of the parts of a type signature as known or unknown.

use indexmap::IndexMap;

use super::Analysis;
use crate::signature;

impl<'a> Analysis<'a> {
    /// Every type name inside `sig` mapped to whether the analysis can handle
    /// it: a known struct, a supported type, a supported container or a
    /// self-coding type.
    ///
    /// The raw name of a generic signature is always part of the result.
    pub(crate) fn analyze_parts(&mut self, sig: &str) -> IndexMap<String, bool> {
        let sig = sig.trim();
        if self.structs.contains_key(sig) || self.is_supported(sig) {
            return IndexMap::from([(sig.to_string(), true)]);
        }
        if let Some(component) = signature::array_component(sig) {
            return self.analyze_parts(component);
        }
        let Some((raw, arguments)) = signature::generic_split(sig) else {
            return IndexMap::from([(sig.to_string(), false)]);
        };

        let mut found = IndexMap::new();
        let raw_known = self.is_supported(raw) || self.is_container(raw);
        found.insert(raw.to_string(), raw_known);
        if self.structs.contains_key(arguments) || self.is_supported(arguments) {
            found.insert(arguments.to_string(), true);
            return found;
        }
        for part in signature::flatten_arguments(arguments) {
            if self.structs.contains_key(&part) || self.is_supported(&part) {
                found.insert(part, true);
                continue;
            }
            match self.lookup(&part) {
                Some(symbol) if symbol.type_params.is_empty() => {
                    if self.is_self_coding(symbol) {
                        found.insert(part, true);
                    } else {
                        let nested = self.analyze_parts(&symbol.name);
                        found.extend(nested);
                    }
                }
                _ => {
                    let supported = self.is_container(&part);
                    found.insert(part, supported);
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use crate::analysis::{Analysis, analyze_symbols};
    use crate::options::{AnalysisOptions, UnknownTypes};
    use crate::symbols::{FieldSymbol, SymbolSet, TypeSymbol};

    fn parts(analysis: &mut Analysis<'_>, sig: &str) -> Vec<(String, bool)> {
        analysis.analyze_parts(sig).into_iter().collect()
    }

    #[test]
    fn test_supported_and_unknown_leaves() {
        let symbols = SymbolSet::new();
        let mut analysis = Analysis::new(&symbols, AnalysisOptions::default());

        assert_eq!(parts(&mut analysis, "String"), vec![("String".to_string(), true)]);
        assert_eq!(parts(&mut analysis, "u8[]"), vec![("u8".to_string(), true)]);
        assert_eq!(
            parts(&mut analysis, "app::Thing[]"),
            vec![("app::Thing".to_string(), false)]
        );
    }

    #[test]
    fn test_generic_parts() {
        let symbols = SymbolSet::new().with(TypeSymbol::class("app::Box").public().type_param("T"));
        let mut analysis = Analysis::new(&symbols, AnalysisOptions::default());

        assert_eq!(
            parts(&mut analysis, "Vec<String>"),
            vec![("Vec".to_string(), true), ("String".to_string(), true)]
        );
        assert_eq!(
            parts(&mut analysis, "app::Wrapper<Vec<app::Thing>>"),
            vec![
                ("app::Wrapper".to_string(), false),
                ("Vec".to_string(), true),
                ("app::Thing".to_string(), false),
            ]
        );
        // A generic symbol inside the arguments is only known as a container.
        assert_eq!(
            parts(&mut analysis, "Vec<app::Box>"),
            vec![("Vec".to_string(), true), ("app::Box".to_string(), false)]
        );
    }

    #[test]
    fn test_generic_container_over_uncaptured_type() {
        let symbols = SymbolSet::new().with(
            TypeSymbol::class("app::Holder")
                .public()
                .annotate(root())
                .constructor(no_arg())
                .field(FieldSymbol::new("items", "Vec<app::Opaque>").public()),
        );

        let strict = analyze_symbols(&symbols, AnalysisOptions::default());
        assert!(!strict.is_accepted());
        let errors: Vec<_> = strict.errors().map(|d| d.message.as_str()).collect();
        assert_eq!(
            errors,
            vec![
                "Property items is referencing unknown type: 'Vec<app::Opaque>' which has an unknown part: 'app::Opaque'. Register custom converter, mark property as ignored or enable unknown types"
            ]
        );

        let warn = analyze_symbols(
            &symbols,
            AnalysisOptions {
                unknown_types: UnknownTypes::Warn,
                ..AnalysisOptions::default()
            },
        );
        assert!(warn.is_accepted());
        assert_eq!(warn.diagnostics.len(), 1);

        let permissive = analyze_symbols(
            &symbols,
            AnalysisOptions {
                unknown_types: UnknownTypes::Allow,
                ..AnalysisOptions::default()
            },
        );
        assert!(permissive.is_accepted());
        assert!(permissive.diagnostics.is_empty());
        assert!(permissive.structs["app::Holder"].unresolved_references.is_empty());
        assert!(permissive.structs["app::Holder"].attributes.contains_key("items"));
    }

    #[test]
    fn test_reference_resolved_after_discovery() {
        let symbols = SymbolSet::new()
            .with(
                TypeSymbol::class("app::Holder")
                    .public()
                    .annotate(root())
                    .constructor(no_arg())
                    .field(FieldSymbol::new("child", "app::Child").public()),
            )
            .with(TypeSymbol::class("app::Child").public().constructor(no_arg()));
        let result = analyze_symbols(&symbols, AnalysisOptions::default());

        assert!(result.is_accepted(), "{:?}", result.diagnostics);
        assert!(result.diagnostics.is_empty());
    }
}

//! Constructor candidates and selection.

use indexmap::IndexSet;
use tracing::debug;

use super::Analysis;
use crate::diagnostics::Diagnostic;
use crate::model::{ConstructorRef, ObjectKind};
use crate::symbols::{Annotated, ConstructorSymbol, Element, TypeKind, TypeSymbol};

/// Public constructors of a concrete class; `None` for kinds that are never
/// instantiated directly.
pub(crate) fn candidate_constructors(symbol: &TypeSymbol) -> Option<Vec<ConstructorRef>> {
    if symbol.kind != TypeKind::Class || symbol.is_abstract() {
        return None;
    }
    Some(
        symbol
            .constructors
            .iter()
            .enumerate()
            .filter(|(_, ctor)| ctor.modifiers.public)
            .map(|(index, ctor)| constructor_ref(index, ctor))
            .collect(),
    )
}

fn constructor_ref(index: usize, ctor: &ConstructorSymbol) -> ConstructorRef {
    ConstructorRef {
        index,
        params: ctor.params.iter().map(|p| p.name.clone()).collect(),
    }
}

impl<'a> Analysis<'a> {
    /// The constructor carrying the discovering marker or a configured
    /// alternative constructor marker. A non-public one is reported but still
    /// returned.
    pub(crate) fn find_annotated_constructor(
        &mut self,
        symbol: &TypeSymbol,
        discovered_by: &str,
    ) -> Option<ConstructorRef> {
        if symbol.kind != TypeKind::Class || symbol.is_abstract() {
            return None;
        }
        for (index, ctor) in symbol.constructors.iter().enumerate() {
            let marker = if ctor.has_annotation(discovered_by) {
                Some(discovered_by.to_string())
            } else {
                ctor.annotations
                    .iter()
                    .find(|a| self.options.alternatives.constructors.contains(&a.name))
                    .map(|a| a.name.clone())
            };
            let Some(marker) = marker else {
                continue;
            };
            if !ctor.modifiers.public {
                self.report(
                    Diagnostic::error(format!(
                        "Constructor in '{}' is declared with {marker}, but it's not public.",
                        symbol.name
                    ))
                    .at(Element::constructor(&symbol.name, index))
                    .declared_by(marker),
                );
            }
            return Some(constructor_ref(index, ctor));
        }
        None
    }

    /// Select a constructor for a class that has none yet: the single candidate
    /// whose parameter names are exactly the type's properties, else the
    /// no-argument one.
    ///
    /// Returns whether a constructor was selected.
    pub(crate) fn match_constructor(&mut self, name: &str, symbol: &'a TypeSymbol) -> bool {
        let Some(info) = self.structs.get(name) else {
            return false;
        };
        if info.kind != ObjectKind::Class
            || info.selected_constructor.is_some()
            || info.is_external_adapter
        {
            return false;
        }
        let Some(candidates) = info.candidate_constructors.clone() else {
            return false;
        };
        let empty = candidates.iter().find(|c| c.is_empty()).cloned();

        let (selected, matching) = if self.options.require_empty_constructor {
            // Matching is skipped entirely, so nothing is reported about it.
            (empty, None)
        } else {
            // Every property the type can expose with any of its candidates.
            let mut properties = self.property_names(symbol, None);
            for candidate in &candidates {
                properties.extend(self.property_names(symbol, symbol.constructors.get(candidate.index)));
            }
            let matching: Vec<ConstructorRef> = candidates
                .iter()
                .filter(|candidate| {
                    let params: IndexSet<&str> =
                        candidate.params.iter().map(String::as_str).collect();
                    !params.is_empty()
                        && params.len() == properties.len()
                        && properties.iter().all(|p| params.contains(p.as_str()))
                })
                .cloned()
                .collect();
            match matching.as_slice() {
                [only] => (Some(only.clone()), Some(matching)),
                [] => (empty, Some(matching)),
                _ => (None, Some(matching)),
            }
        };

        let Some(info) = self.structs.get_mut(name) else {
            return false;
        };
        info.matching_constructors = matching;
        match selected {
            Some(ctor) => {
                debug!(name, params = ?ctor.params, "constructor selected");
                info.selected_constructor = Some(ctor);
                true
            }
            None => false,
        }
    }

    /// Names of the properties the enabled extractors produce with `ctor`.
    fn property_names(
        &self,
        symbol: &'a TypeSymbol,
        ctor: Option<&'a ConstructorSymbol>,
    ) -> IndexSet<String> {
        let mut names = IndexSet::new();
        if self.options.include_bean_methods {
            names.extend(
                self.bean_properties(symbol, ctor)
                    .into_iter()
                    .filter(|(_, access)| !self.is_ignored(access.annotations()))
                    .map(|(name, _)| name),
            );
        }
        if self.options.include_exact_methods {
            names.extend(
                self.exact_properties(symbol, ctor)
                    .into_iter()
                    .filter(|(_, access)| !self.is_ignored(access.annotations()))
                    .map(|(name, _)| name),
            );
        }
        if self.options.include_fields {
            names.extend(
                self.public_fields(symbol, ctor)
                    .into_iter()
                    .filter(|(_, access)| !self.is_ignored(access.annotations()))
                    .map(|(name, _)| name),
            );
        }
        names
    }
}

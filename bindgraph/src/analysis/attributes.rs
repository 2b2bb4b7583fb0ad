//! Attribute resolution: turning extracted accesses into attribute descriptors.

use indexmap::IndexSet;
use tracing::trace;

use super::Analysis;
use super::extract::Access;
use crate::diagnostics::Diagnostic;
use crate::markers::{self, attribute};
use crate::model::{Accessor, AttributeDescriptor, MemberRef, TypeSignature};
use crate::options::{MarkerMapping, UnknownTypes};
use crate::signature;
use crate::symbols::{Annotation, AnnotationValue};

/// The native property declaration among `annotations`.
fn own_declaration(annotations: &[Annotation]) -> Option<&Annotation> {
    annotations.iter().find(|a| a.name == markers::JSON_ATTRIBUTE)
}

/// Evaluate a foreign boolean marker against its configured mappings.
///
/// No mappings means presence alone decides. Otherwise the first mapping
/// whose key is set on the declaration decides.
fn match_custom_boolean(annotation: &Annotation, mappings: &[MarkerMapping]) -> Option<bool> {
    if mappings.is_empty() {
        return Some(true);
    }
    mappings.iter().find_map(|mapping| {
        annotation
            .get(&mapping.name)
            .map(|value| value.as_bool().is_some_and(|v| Some(v) == mapping.value))
    })
}

fn match_custom_string<'v>(annotation: &'v Annotation, key: &str) -> Option<&'v str> {
    annotation.get(key).and_then(|v| v.as_name())
}

impl<'a> Analysis<'a> {
    /// Excluded through the native `ignore` flag, or else a foreign ignore
    /// marker.
    pub(crate) fn is_ignored(&self, annotations: &[Annotation]) -> bool {
        if let Some(declaration) = own_declaration(annotations) {
            return declaration
                .get(attribute::IGNORE)
                .and_then(AnnotationValue::as_bool)
                .unwrap_or(false);
        }
        annotations
            .iter()
            .any(|a| self.options.alternatives.ignore.contains(&a.name))
    }

    fn is_non_nullable(&self, annotations: &[Annotation], declaration: Option<&Annotation>) -> bool {
        if let Some(declaration) = declaration {
            return declaration
                .get(attribute::NULLABLE)
                .and_then(AnnotationValue::as_bool)
                .is_some_and(|nullable| !nullable);
        }
        let alternatives = &self.options.alternatives.non_nullable;
        annotations
            .iter()
            .filter_map(|a| alternatives.get(&a.name).map(|m| match_custom_boolean(a, m)))
            .flatten()
            .next()
            .unwrap_or(false)
    }

    fn is_mandatory(&self, annotations: &[Annotation], declaration: Option<&Annotation>) -> bool {
        if let Some(declaration) = declaration {
            return declaration
                .get(attribute::MANDATORY)
                .and_then(AnnotationValue::as_bool)
                .unwrap_or(false);
        }
        let alternatives = &self.options.alternatives.mandatory;
        annotations
            .iter()
            .filter_map(|a| alternatives.get(&a.name).map(|m| match_custom_boolean(a, m)))
            .flatten()
            .next()
            .unwrap_or(false)
    }

    fn name_alias(&self, annotations: &[Annotation], declaration: Option<&Annotation>) -> Option<String> {
        if let Some(declaration) = declaration {
            return declaration
                .get(attribute::NAME)
                .and_then(AnnotationValue::as_str)
                .filter(|name| !name.is_empty())
                .map(str::to_string);
        }
        let alternatives = &self.options.alternatives.alias;
        annotations
            .iter()
            .filter_map(|a| alternatives.get(&a.name).and_then(|key| match_custom_string(a, key)))
            .find(|name| !name.is_empty())
            .map(str::to_string)
    }

    fn index(&self, annotations: &[Annotation], declaration: Option<&Annotation>) -> i64 {
        if let Some(index) = declaration
            .and_then(|d| d.get(attribute::INDEX))
            .and_then(AnnotationValue::as_int)
        {
            return index;
        }
        let alternatives = &self.options.alternatives.index;
        annotations
            .iter()
            .filter_map(|a| alternatives.get(&a.name).and_then(|key| a.get(key)))
            .filter_map(AnnotationValue::as_int)
            .find(|index| *index != -1)
            .unwrap_or(-1)
    }

    /// Converter declared on the member itself.
    fn property_converter(&self, annotations: &[Annotation]) -> Option<String> {
        own_declaration(annotations)
            .and_then(|d| d.get(attribute::CONVERTER))
            .and_then(AnnotationValue::as_type)
            .filter(|converter| *converter != markers::JSON_ATTRIBUTE)
            .map(str::to_string)
    }

    /// Resolve one extracted property of `owner` and merge it into the
    /// owner's attributes, then discover the types it references.
    pub(crate) fn analyze_attribute(
        &mut self,
        owner: &str,
        property: &str,
        access: Access<'a>,
        target: &str,
        path: &mut Vec<String>,
    ) {
        let Some(accessor) = accessor_of(&access) else {
            return;
        };
        let element = accessor.element();
        let annotations = access.annotations();
        match self.structs.get(owner) {
            Some(info) if !info.claimed.contains(&element) => {}
            _ => return,
        }
        if self.is_ignored(annotations) {
            return;
        }
        path.push(property.to_string());

        let declared_type = access.declared_type().to_string();
        let converter = self.property_converter(annotations);
        let is_self_coding = match signature::array_component(&declared_type) {
            Some(_) => false,
            None => self
                .lookup(signature::raw_name(&declared_type))
                .is_some_and(|symbol| self.is_self_coding(symbol)),
        };
        let type_resolved = converter.is_some()
            || is_self_coding
            || self.is_supported(&declared_type)
            || self.structs.contains_key(&declared_type);
        let has_unknown = !type_resolved && self.analyze_parts(&declared_type).values().any(|ok| !ok);

        let declaration = access.declaration;
        let alias = self.name_alias(annotations, declaration);
        let name = alias.clone().unwrap_or_else(|| property.to_string());
        let attr = AttributeDescriptor {
            property: property.to_string(),
            id: name.clone(),
            name,
            alias,
            declared_type: declared_type.clone(),
            is_nullable: !self.is_non_nullable(annotations, declaration),
            is_mandatory: self.is_mandatory(annotations, declaration),
            index: self.index(annotations, declaration),
            alternative_names: alternative_names(annotations),
            is_full_name_match: declaration
                .and_then(|d| d.get(attribute::HASH_MATCH))
                .and_then(AnnotationValue::as_bool)
                .is_some_and(|hash_match| !hash_match),
            type_signature: declaration
                .and_then(|d| d.get(attribute::TYPE_SIGNATURE))
                .and_then(AnnotationValue::as_name)
                .and_then(TypeSignature::from_name),
            converter: converter.clone(),
            is_self_coding,
            accessor,
            has_declaration: declaration.is_some(),
            minified_name: None,
        };

        if let Some(converter) = &converter {
            let boxed = self.registry.boxed_name(&declared_type).to_string();
            let target_symbol = self.lookup(signature::raw_name(&boxed));
            self.validate_converter(converter, target_symbol, &boxed);
        }

        let Some(info) = self.structs.get(owner) else {
            path.pop();
            return;
        };
        if let Some(other) = info.attributes.get(&attr.id) {
            let other_is_field = other.accessor.is_field();
            let attr_is_field = attr.accessor.is_field();
            if other.has_declaration && !attr.has_declaration
                || !other.has_declaration && !attr.has_declaration && !other_is_field && attr_is_field
            {
                trace!(owner, property, "property shadowed by an existing attribute");
                path.pop();
                return;
            }
            // A declared attribute replaces an implicit one under the same id.
            let replaces = attr.has_declaration && !other.has_declaration;
            if other.property != attr.property || !other_is_field && !attr_is_field {
                let kind = if attr_is_field { "field" } else { "property" };
                let message = format!(
                    "Duplicate alias detected on {kind}: {} (serialized as '{}')",
                    attr.property, attr.id
                );
                let declared_by = info.discovered_via.clone();
                self.report(
                    Diagnostic::error(message)
                        .at(element.clone())
                        .declared_by(declared_by),
                );
                if !replaces {
                    if let Some(info) = self.structs.get_mut(owner) {
                        info.claimed.insert(element);
                    }
                    path.pop();
                    return;
                }
            }
        }

        let Some(info) = self.structs.get(owner) else {
            path.pop();
            return;
        };

        let record_unknown =
            !type_resolved && has_unknown && self.options.unknown_types != UnknownTypes::Allow;
        let discovered_by = info.discovered_via.clone();
        if let Some(info) = self.structs.get_mut(owner) {
            if record_unknown {
                info.unresolved_references
                    .insert(attr.id.clone(), declared_type.clone());
            } else {
                info.unresolved_references.shift_remove(&attr.id);
            }
            info.attributes.insert(attr.id.clone(), attr);
            info.claimed.insert(element);
        }

        if converter.is_none() {
            self.check_related_property(&declared_type, &discovered_by, target, owner, path);
        }
        path.pop();
    }
}

fn accessor_of(access: &Access<'_>) -> Option<Accessor> {
    let member = |owner: &str, name: &str| MemberRef::new(owner, name);
    match (access.read, access.write, access.field) {
        (Some(read), Some(write), None) => Some(Accessor::ReadWrite {
            read: member(&read.owner.name, &read.member.name),
            write: member(&write.owner.name, &write.member.name),
        }),
        (Some(read), None, None) => Some(Accessor::ReadOnly {
            read: member(&read.owner.name, &read.member.name),
            constructor_param: access.ctor_param?.name.clone(),
        }),
        (None, None, Some(field)) => Some(Accessor::Field {
            field: member(&field.owner.name, &field.member.name),
            constructor_param: access.ctor_param.map(|p| p.name.clone()),
        }),
        _ => None,
    }
}

/// Extra accepted names from the member's own declaration.
fn alternative_names(annotations: &[Annotation]) -> IndexSet<String> {
    own_declaration(annotations)
        .and_then(|d| d.get(attribute::ALTERNATIVE_NAMES))
        .map(|value| match value {
            AnnotationValue::List(values) => values
                .iter()
                .filter_map(AnnotationValue::as_name)
                .map(str::to_string)
                .collect(),
            other => other.as_name().map(str::to_string).into_iter().collect(),
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::analysis::analyze_symbols;
    use crate::options::AnalysisOptions;
    use crate::symbols::{FieldSymbol, MethodSymbol, SymbolSet, TypeSymbol};

    fn options() -> AnalysisOptions {
        AnalysisOptions::default()
    }

    #[test]
    fn test_custom_boolean_mappings() {
        let plain = Annotation::new("app::NotNull");
        assert_eq!(match_custom_boolean(&plain, &[]), Some(true));

        let mappings = vec![MarkerMapping {
            name: "value".to_string(),
            value: Some(false),
        }];
        assert_eq!(match_custom_boolean(&plain, &mappings), None);
        let set = plain.clone().with("value", AnnotationValue::Bool(false));
        assert_eq!(match_custom_boolean(&set, &mappings), Some(true));
        let other = plain.with("value", AnnotationValue::Bool(true));
        assert_eq!(match_custom_boolean(&other, &mappings), Some(false));
    }

    #[test]
    fn test_declaration_values_are_resolved() {
        let symbols = SymbolSet::new().with(
            TypeSymbol::class("app::User")
                .public()
                .annotate(root())
                .constructor(no_arg())
                .field(
                    FieldSymbol::new("userName", "String").public().annotate(
                        alias("user_name")
                            .with("nullable", AnnotationValue::Bool(false))
                            .with("mandatory", AnnotationValue::Bool(true))
                            .with("hash_match", AnnotationValue::Bool(false))
                            .with("type_signature", AnnotationValue::Str("exclude".into()))
                            .with(
                                "alternative_names",
                                AnnotationValue::List(vec![
                                    AnnotationValue::Str("login".into()),
                                    AnnotationValue::Str("user".into()),
                                ]),
                            ),
                    ),
                )
                .field(FieldSymbol::new("note", "String").public().annotate(alias(""))),
        );
        let result = analyze_symbols(&symbols, options());
        assert!(result.is_accepted(), "{:?}", result.diagnostics);

        let user = &result.structs["app::User"];
        let keys: Vec<_> = user.attributes.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["user_name", "note"]);

        let attr = &user.attributes["user_name"];
        assert_eq!(attr.property, "userName");
        assert_eq!(attr.alias.as_deref(), Some("user_name"));
        assert!(!attr.is_nullable);
        assert!(attr.is_mandatory);
        assert!(attr.is_full_name_match);
        assert_eq!(attr.type_signature, Some(TypeSignature::Exclude));
        assert_eq!(
            attr.alternative_names.iter().collect::<Vec<_>>(),
            vec!["login", "user"]
        );

        let note = &user.attributes["note"];
        assert!(note.alias.is_none());
        assert!(note.is_nullable);
        assert!(note.has_declaration);
    }

    #[test]
    fn test_alternative_markers() {
        let symbols = SymbolSet::new().with(
            TypeSymbol::class("app::User")
                .public()
                .annotate(root())
                .constructor(no_arg())
                .field(
                    FieldSymbol::new("name", "String")
                        .public()
                        .annotate(Annotation::new("ext::NotNull"))
                        .annotate(Annotation::new("ext::Rename").with("value", AnnotationValue::Str("n".into())))
                        .annotate(Annotation::new("ext::Order").with("value", AnnotationValue::Int(3))),
                )
                .field(
                    FieldSymbol::new("age", "i32")
                        .public()
                        .annotate(Annotation::new("ext::Required").with("strict", AnnotationValue::Bool(true))),
                )
                .field(
                    FieldSymbol::new("secret", "String")
                        .public()
                        .annotate(Annotation::new("ext::Skip")),
                ),
        );
        let mut options = options();
        let alternatives = &mut options.alternatives;
        alternatives.non_nullable.insert("ext::NotNull".to_string(), Vec::new());
        alternatives.alias.insert("ext::Rename".to_string(), "value".to_string());
        alternatives.index.insert("ext::Order".to_string(), "value".to_string());
        alternatives.mandatory.insert(
            "ext::Required".to_string(),
            vec![MarkerMapping {
                name: "strict".to_string(),
                value: Some(true),
            }],
        );
        alternatives.ignore.insert("ext::Skip".to_string());

        let result = analyze_symbols(&symbols, options);
        assert!(result.is_accepted(), "{:?}", result.diagnostics);

        let user = &result.structs["app::User"];
        let keys: Vec<_> = user.attributes.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["n", "age"]);
        assert!(!user.attributes["n"].is_nullable);
        assert_eq!(user.attributes["n"].index, 3);
        assert!(user.attributes["age"].is_mandatory);
        assert!(user.attributes["age"].is_nullable);
    }

    #[test]
    fn test_native_declaration_shadows_alternatives() {
        let symbols = SymbolSet::new().with(
            TypeSymbol::class("app::User")
                .public()
                .annotate(root())
                .constructor(no_arg())
                .field(
                    FieldSymbol::new("name", "String")
                        .public()
                        .annotate(attr())
                        .annotate(Annotation::new("ext::Skip")),
                ),
        );
        let mut options = options();
        options.alternatives.ignore.insert("ext::Skip".to_string());
        let result = analyze_symbols(&symbols, options);
        assert!(result.structs["app::User"].attributes.contains_key("name"));
    }

    #[test]
    fn test_duplicate_alias_is_rejected() {
        let symbols = SymbolSet::new().with(
            TypeSymbol::class("app::Item")
                .public()
                .annotate(root())
                .constructor(no_arg())
                .field(FieldSymbol::new("identifier", "String").public().annotate(alias("id")))
                .field(FieldSymbol::new("code", "String").public().annotate(alias("id"))),
        );
        let result = analyze_symbols(&symbols, options());

        assert!(!result.is_accepted());
        let errors: Vec<_> = result.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message,
            "Duplicate alias detected on field: code (serialized as 'id')"
        );
        let item = &result.structs["app::Item"];
        assert_eq!(item.attributes.len(), 1);
        assert_eq!(item.attributes["id"].property, "identifier");
    }

    #[test]
    fn test_explicit_declaration_wins() {
        let symbols = SymbolSet::new().with(
            TypeSymbol::class("app::Item")
                .public()
                .annotate(root())
                .constructor(no_arg())
                .method(getter("title", "String"))
                .method(setter("title", "String"))
                .field(FieldSymbol::new("name", "String").public().annotate(alias("title"))),
        );
        let result = analyze_symbols(&symbols, options());

        let errors: Vec<_> = result.errors().map(|d| d.message.as_str()).collect();
        assert_eq!(
            errors,
            vec!["Duplicate alias detected on field: name (serialized as 'title')"]
        );
        let item = &result.structs["app::Item"];
        assert_eq!(item.attributes.len(), 1);
        // The bean pair is resolved first and the declared field still replaces it.
        assert_eq!(item.attributes["title"].property, "name");
        assert!(item.attributes["title"].accessor.is_field());
    }

    #[test]
    fn test_declared_field_replaces_accessors_of_same_property() {
        let symbols = SymbolSet::new().with(
            TypeSymbol::class("app::Item")
                .public()
                .annotate(root())
                .constructor(no_arg())
                .method(getter("title", "String"))
                .method(setter("title", "String"))
                .field(FieldSymbol::new("title", "String").public().annotate(attr())),
        );
        let result = analyze_symbols(&symbols, options());

        assert!(result.is_accepted(), "{:?}", result.diagnostics);
        let item = &result.structs["app::Item"];
        assert_eq!(item.attributes.len(), 1);
        assert_eq!(item.attributes["title"].property, "title");
        assert!(item.attributes["title"].accessor.is_field());
    }

    #[test]
    fn test_method_wins_over_field_when_implicit() {
        let symbols = SymbolSet::new().with(
            TypeSymbol::class("app::Item")
                .public()
                .constructor(no_arg())
                .method(getter("name", "String"))
                .method(setter("name", "String"))
                .field(FieldSymbol::new("name", "String").public()),
        );
        // Not a root declaration, so fields are only analyzed for names not
        // taken yet; run it through a referencing root.
        let symbols = symbols.with(
            TypeSymbol::class("app::Box")
                .public()
                .annotate(root())
                .constructor(no_arg())
                .field(FieldSymbol::new("item", "app::Item").public()),
        );
        let result = analyze_symbols(&symbols, options());

        assert!(result.is_accepted(), "{:?}", result.diagnostics);
        let item = &result.structs["app::Item"];
        assert_eq!(item.attributes.len(), 1);
        assert!(!item.attributes["name"].accessor.is_field());
    }

    #[test]
    fn test_declared_root_reconsiders_fields_without_duplicates() {
        let symbols = SymbolSet::new().with(
            TypeSymbol::class("app::Item")
                .public()
                .annotate(root())
                .constructor(no_arg())
                .method(getter("name", "String"))
                .method(setter("name", "String"))
                .field(FieldSymbol::new("name", "String").public()),
        );
        let result = analyze_symbols(&symbols, options());

        assert!(result.is_accepted(), "{:?}", result.diagnostics);
        let item = &result.structs["app::Item"];
        assert!(!item.attributes["name"].accessor.is_field());
    }

    #[test]
    fn test_ignored_members_are_skipped() {
        let symbols = SymbolSet::new().with(
            TypeSymbol::class("app::Item")
                .public()
                .annotate(root())
                .constructor(no_arg())
                .field(
                    FieldSymbol::new("cache", "app::Unknown")
                        .public()
                        .annotate(attr().with("ignore", AnnotationValue::Bool(true))),
                ),
        );
        let result = analyze_symbols(&symbols, options());
        assert!(result.is_accepted(), "{:?}", result.diagnostics);
        assert!(result.structs["app::Item"].attributes.is_empty());
    }

    #[test]
    fn test_property_converter_is_validated() {
        let symbols = SymbolSet::new()
            .with(
                TypeSymbol::class("app::Item")
                    .public()
                    .annotate(root())
                    .constructor(no_arg())
                    .field(
                        FieldSymbol::new("when", "app::Instant").public().annotate(
                            attr().with("converter", AnnotationValue::Type("app::InstantConverter".into())),
                        ),
                    ),
            )
            .with(TypeSymbol::class("app::InstantConverter").public());
        let result = analyze_symbols(&symbols, options());

        assert!(!result.is_accepted());
        let messages: Vec<_> = result.errors().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Specified converter: 'app::InstantConverter' doesn't have a JSON_READER or JSON_WRITER field. It must have public static JSON_READER/JSON_WRITER fields for conversion."
            ]
        );
        let attr = &result.structs["app::Item"].attributes["when"];
        assert_eq!(attr.converter.as_deref(), Some("app::InstantConverter"));
        assert!(!result.structs.contains_key("app::Instant"));
    }

    #[test]
    fn test_read_only_accessor_records_constructor_param() {
        let symbols = SymbolSet::new().with(
            TypeSymbol::class("app::Item")
                .public()
                .annotate(root())
                .constructor(ctor(&[("name", "String")]))
                .method(getter("name", "String"))
                .method(MethodSymbol::getter("size", "usize")),
        );
        let result = analyze_symbols(&symbols, options());

        assert!(result.is_accepted(), "{:?}", result.diagnostics);
        let attr = &result.structs["app::Item"].attributes["name"];
        assert_eq!(
            attr.accessor,
            Accessor::ReadOnly {
                read: MemberRef::new("app::Item", "getName"),
                constructor_param: "name".to_string(),
            }
        );
    }
}

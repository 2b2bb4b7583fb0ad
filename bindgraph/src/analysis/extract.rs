//! Property extractors.
//!
//! Each extractor walks a type and its direct supertypes and yields at most
//! one [`Access`] per property name. Merging across extractors happens in the
//! attribute resolver.

use indexmap::IndexMap;

use super::Analysis;
use crate::markers;
use crate::signature;
use crate::symbols::{
    Annotated, Annotation, ConstructorSymbol, FieldSymbol, MethodSymbol, Parameter, TypeKind,
    TypeSymbol,
};

/// A member together with the type declaring it.
#[derive(Debug)]
pub(crate) struct Owned<'a, T> {
    pub owner: &'a TypeSymbol,
    pub member: &'a T,
}

impl<T> Clone for Owned<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Owned<'_, T> {}

/// How one property is reached, as found by an extractor.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Access<'a> {
    pub read: Option<Owned<'a, MethodSymbol>>,
    pub write: Option<Owned<'a, MethodSymbol>>,
    pub field: Option<Owned<'a, FieldSymbol>>,
    pub ctor_param: Option<&'a Parameter>,
    /// First property declaration found on the read, write, field or
    /// constructor parameter, in that order.
    pub declaration: Option<&'a Annotation>,
}

impl<'a> Access<'a> {
    /// Declarations on the member the property is read from.
    pub fn annotations(&self) -> &'a [Annotation] {
        match (self.field, self.read) {
            (Some(field), _) => &field.member.annotations,
            (None, Some(read)) => &read.member.annotations,
            (None, None) => &[],
        }
    }

    pub fn declared_type(&self) -> &'a str {
        match (self.field, self.read) {
            (Some(field), _) => &field.member.ty,
            (None, Some(read)) => read.member.return_type.as_deref().unwrap_or_default(),
            (None, None) => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BeanPrefix {
    Get,
    Is,
    Set,
}

/// Split a `getX`/`isX`/`setX` (or `get_x`) name into prefix and property.
fn bean_name(name: &str) -> Option<(BeanPrefix, String)> {
    let (prefix, rest) = if let Some(rest) = name.strip_prefix("get") {
        (BeanPrefix::Get, rest)
    } else if let Some(rest) = name.strip_prefix("set") {
        (BeanPrefix::Set, rest)
    } else if let Some(rest) = name.strip_prefix("is") {
        (BeanPrefix::Is, rest)
    } else {
        return None;
    };
    if let Some(snake) = rest.strip_prefix('_') {
        return (!snake.is_empty()).then(|| (prefix, snake.to_string()));
    }
    let mut chars = rest.chars();
    let first = chars.next()?;
    if !first.is_uppercase() {
        return None;
    }
    let property = if rest.chars().count() > 1 && rest.to_uppercase() == rest {
        rest.to_string()
    } else {
        first.to_lowercase().chain(chars).collect()
    };
    Some((prefix, property))
}

fn is_boolean(ty: &str) -> bool {
    matches!(ty, "bool" | "Option<bool>")
}

/// Visible, instance-level methods. Methods of public interfaces count unless
/// they are private.
fn is_accessible_method(owner: &TypeSymbol, method: &MethodSymbol) -> bool {
    let public_interface = owner.kind == TypeKind::Interface && owner.modifiers.public;
    let modifiers = &method.modifiers;
    public_interface && !modifiers.private
        || modifiers.public
            && !modifiers.is_static
            && !modifiers.is_exotic()
            && !modifiers.is_abstract
}

fn constructor_arguments(ctor: Option<&ConstructorSymbol>) -> IndexMap<&str, &Parameter> {
    ctor.map(|c| c.params.iter().map(|p| (p.name.as_str(), p)).collect())
        .unwrap_or_default()
}

fn first_declaration<'a>(candidates: [Option<&'a [Annotation]>; 4]) -> Option<&'a Annotation> {
    candidates
        .into_iter()
        .flatten()
        .find_map(|annotations| annotations.iter().find(|a| a.name == markers::JSON_ATTRIBUTE))
}

impl<'a> Analysis<'a> {
    /// The type followed by its directly declared supertypes that are known.
    pub(crate) fn type_hierarchy(&self, symbol: &'a TypeSymbol) -> Vec<&'a TypeSymbol> {
        let mut hierarchy = vec![symbol];
        for supertype in &symbol.supertypes {
            if let Some(found) = self.lookup(signature::raw_name(supertype)) {
                hierarchy.push(found);
            }
        }
        hierarchy
    }

    /// Getter/setter pairs, or getters backed by a constructor parameter.
    pub(crate) fn bean_properties(
        &self,
        symbol: &'a TypeSymbol,
        ctor: Option<&'a ConstructorSymbol>,
    ) -> IndexMap<String, Access<'a>> {
        let mut getters: IndexMap<String, Owned<'a, MethodSymbol>> = IndexMap::new();
        let mut setters: IndexMap<String, Owned<'a, MethodSymbol>> = IndexMap::new();
        for owner in self.type_hierarchy(symbol) {
            for method in owner.methods.iter().filter(|m| is_accessible_method(owner, m)) {
                let Some((prefix, property)) = bean_name(&method.name) else {
                    continue;
                };
                let member = Owned { owner, member: method };
                match (prefix, method.params.len(), method.return_type.as_deref()) {
                    (BeanPrefix::Get, 0, Some(_)) => {
                        getters.entry(property).or_insert(member);
                    }
                    (BeanPrefix::Is, 0, Some(ty)) if is_boolean(ty) => {
                        getters.entry(property).or_insert(member);
                    }
                    (BeanPrefix::Set, 1, _) => {
                        setters.insert(property, member);
                    }
                    _ => {}
                }
            }
        }
        self.pair_accessors(getters, setters, ctor)
    }

    /// Zero-argument/one-argument method pairs sharing the exact same name.
    pub(crate) fn exact_properties(
        &self,
        symbol: &'a TypeSymbol,
        ctor: Option<&'a ConstructorSymbol>,
    ) -> IndexMap<String, Access<'a>> {
        let mut getters: IndexMap<String, Owned<'a, MethodSymbol>> = IndexMap::new();
        let mut setters: IndexMap<String, Owned<'a, MethodSymbol>> = IndexMap::new();
        for owner in self.type_hierarchy(symbol) {
            for method in owner.methods.iter().filter(|m| is_accessible_method(owner, m)) {
                if bean_name(&method.name).is_some() {
                    continue;
                }
                let member = Owned { owner, member: method };
                match (method.params.len(), &method.return_type) {
                    (0, Some(_)) => {
                        getters.entry(method.name.clone()).or_insert(member);
                    }
                    (1, _) => {
                        setters.insert(method.name.clone(), member);
                    }
                    _ => {}
                }
            }
        }
        self.pair_accessors(getters, setters, ctor)
    }

    fn pair_accessors(
        &self,
        getters: IndexMap<String, Owned<'a, MethodSymbol>>,
        setters: IndexMap<String, Owned<'a, MethodSymbol>>,
        ctor: Option<&'a ConstructorSymbol>,
    ) -> IndexMap<String, Access<'a>> {
        let arguments = constructor_arguments(ctor);
        let mut result = IndexMap::new();
        for (property, getter) in getters {
            let setter = setters.get(&property).copied();
            let ctor_param = arguments.get(property.as_str()).copied();
            let return_type = getter.member.return_type.as_deref().unwrap_or_default();
            let declaration = first_declaration([
                Some(getter.member.annotations.as_slice()),
                setter.map(|s| s.member.annotations.as_slice()),
                None,
                ctor_param.map(|p| p.annotations.as_slice()),
            ]);
            let access = Access {
                read: Some(getter),
                write: None,
                field: None,
                ctor_param: None,
                declaration,
            };
            let setter_type = setter.and_then(|s| s.member.params.first()).map(|p| p.ty.as_str());
            match (setter, setter_type) {
                (Some(setter), Some(ty))
                    if ty == return_type || signature::raw_name(ty) == return_type =>
                {
                    result.insert(
                        property,
                        Access {
                            write: Some(setter),
                            ..access
                        },
                    );
                }
                _ if !self.options.require_empty_constructor
                    && ctor_param.is_some_and(|p| p.ty == return_type) =>
                {
                    result.insert(property, Access { ctor_param, ..access });
                }
                _ => {}
            }
        }
        result
    }

    /// Public instance fields. Final fields need a constructor to be written,
    /// so they are skipped when a no-argument constructor is required.
    pub(crate) fn public_fields(
        &self,
        symbol: &'a TypeSymbol,
        ctor: Option<&'a ConstructorSymbol>,
    ) -> IndexMap<String, Access<'a>> {
        let arguments = constructor_arguments(ctor);
        let require_empty = self.options.require_empty_constructor;
        let mut result = IndexMap::new();
        for owner in self.type_hierarchy(symbol) {
            for field in &owner.fields {
                let modifiers = &field.modifiers;
                if !modifiers.public
                    || modifiers.is_final && require_empty
                    || modifiers.is_static
                    || modifiers.is_exotic()
                {
                    continue;
                }
                let ctor_param = arguments.get(field.name.as_str()).copied();
                let declaration = first_declaration([
                    None,
                    None,
                    Some(field.annotations.as_slice()),
                    ctor_param.map(|p| p.annotations.as_slice()),
                ]);
                result.insert(
                    field.name.clone(),
                    Access {
                        read: None,
                        write: None,
                        field: Some(Owned { owner, member: field }),
                        ctor_param,
                        declaration,
                    },
                );
            }
        }
        result
    }
}

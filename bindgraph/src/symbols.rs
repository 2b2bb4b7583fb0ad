//! Symbol facts consumed by the analysis.
//!
//! The analysis never talks to a compiler directly. Everything it knows about
//! declared types comes through the [`SymbolTable`] trait: kinds, modifiers,
//! members, direct supertypes and the declarations (attributes) attached to
//! each of them. Declaration values are decoded once into the closed
//! [`AnnotationValue`] type so the engine can match on them exhaustively.
//!
//! [`SymbolSet`] is the in-memory implementation. It is filled either by the
//! Rust source [`extractor`](crate::extractor) or programmatically through the
//! builder methods on the symbol types, which is how the unit tests describe
//! synthetic type graphs.

use std::collections::VecDeque;
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::signature;

/// The declared kind of a type symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
}

/// Declaration modifiers shared by types and members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Modifiers {
    pub public: bool,
    pub private: bool,
    pub is_static: bool,
    pub is_final: bool,
    pub is_abstract: bool,
    pub native: bool,
    pub transient: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        public: false,
        private: false,
        is_static: false,
        is_final: false,
        is_abstract: false,
        native: false,
        transient: false,
    };

    pub const fn public() -> Self {
        Self {
            public: true,
            ..Self::NONE
        }
    }

    pub const fn private() -> Self {
        Self {
            private: true,
            ..Self::NONE
        }
    }

    /// Members that generated code can never touch (native or transient).
    pub fn is_exotic(&self) -> bool {
        self.native || self.transient
    }
}

/// A decoded declaration value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum AnnotationValue {
    Str(String),
    Bool(bool),
    Int(i64),
    /// Reference to a type by qualified name.
    Type(String),
    List(Vec<AnnotationValue>),
}

impl AnnotationValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnnotationValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AnnotationValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnnotationValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&str> {
        match self {
            AnnotationValue::Type(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AnnotationValue]> {
        match self {
            AnnotationValue::List(values) => Some(values),
            _ => None,
        }
    }

    /// Read an enumeration-like value.
    ///
    /// Accepts both `"array"` strings and bare `Array` paths; for paths only
    /// the last segment is returned.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            AnnotationValue::Str(value) => Some(value),
            AnnotationValue::Type(value) => Some(simple_name_of(value)),
            _ => None,
        }
    }
}

/// A declaration attached to a symbol, with its explicitly set values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Qualified name of the declaration type.
    pub name: String,
    pub values: IndexMap<String, AnnotationValue>,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: IndexMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: AnnotationValue) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&AnnotationValue> {
        self.values.get(key)
    }
}

/// Anything that can carry declarations.
pub trait Annotated {
    fn annotations(&self) -> &[Annotation];

    fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations().iter().find(|a| a.name == name)
    }

    fn has_annotation(&self, name: &str) -> bool {
        self.annotation(name).is_some()
    }
}

/// A method or constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub ty: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            annotations: Vec::new(),
        }
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSymbol {
    pub name: String,
    pub ty: String,
    pub modifiers: Modifiers,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl FieldSymbol {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            modifiers: Modifiers::NONE,
            annotations: Vec::new(),
        }
    }

    pub fn public(mut self) -> Self {
        self.modifiers.public = true;
        self
    }

    pub fn with_static(mut self) -> Self {
        self.modifiers.is_static = true;
        self
    }

    pub fn with_final(mut self) -> Self {
        self.modifiers.is_final = true;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSymbol {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Parameter>,
    /// `None` for methods returning nothing.
    pub return_type: Option<String>,
    pub modifiers: Modifiers,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl MethodSymbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type: None,
            modifiers: Modifiers::NONE,
            annotations: Vec::new(),
        }
    }

    /// A public zero-argument method returning `ty`.
    pub fn getter(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self::new(name).public().returns(ty)
    }

    /// A public single-argument method returning nothing.
    pub fn setter(name: impl Into<String>, ty: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(name).public().param(Parameter::new("value", ty))
    }

    pub fn returns(mut self, ty: impl Into<String>) -> Self {
        self.return_type = Some(ty.into());
        self
    }

    pub fn param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    pub fn public(mut self) -> Self {
        self.modifiers.public = true;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorSymbol {
    #[serde(default)]
    pub params: Vec<Parameter>,
    pub modifiers: Modifiers,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    /// Synthesized by the symbol provider rather than declared in source.
    #[serde(default)]
    pub implicit: bool,
}

impl ConstructorSymbol {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn public(mut self) -> Self {
        self.modifiers.public = true;
        self
    }

    pub fn param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// A declared type and everything it declares directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSymbol {
    /// Fully qualified name, the key used throughout the analysis.
    pub name: String,
    pub simple_name: String,
    pub kind: TypeKind,
    pub modifiers: Modifiers,
    /// Qualified name of the enclosing type for nested declarations.
    #[serde(default)]
    pub enclosing: Option<String>,
    #[serde(default)]
    pub type_params: Vec<String>,
    /// Direct supertypes (superclass and implemented interfaces).
    #[serde(default)]
    pub supertypes: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldSymbol>,
    #[serde(default)]
    pub methods: Vec<MethodSymbol>,
    #[serde(default)]
    pub constructors: Vec<ConstructorSymbol>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl TypeSymbol {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        let name = name.into();
        Self {
            simple_name: simple_name_of(&name).to_string(),
            name,
            kind,
            modifiers: Modifiers::NONE,
            enclosing: None,
            type_params: Vec::new(),
            supertypes: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Class)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Enum)
    }

    pub fn public(mut self) -> Self {
        self.modifiers.public = true;
        self
    }

    pub fn with_abstract(mut self) -> Self {
        self.modifiers.is_abstract = true;
        self
    }

    pub fn with_static(mut self) -> Self {
        self.modifiers.is_static = true;
        self
    }

    pub fn nested_in(mut self, enclosing: impl Into<String>) -> Self {
        self.enclosing = Some(enclosing.into());
        self
    }

    pub fn type_param(mut self, name: impl Into<String>) -> Self {
        self.type_params.push(name.into());
        self
    }

    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }

    pub fn field(mut self, field: FieldSymbol) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodSymbol) -> Self {
        self.methods.push(method);
        self
    }

    pub fn constructor(mut self, constructor: ConstructorSymbol) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn is_nested(&self) -> bool {
        self.enclosing.is_some()
    }

    /// Interfaces and abstract classes.
    pub fn is_abstract(&self) -> bool {
        self.kind == TypeKind::Interface
            || self.kind == TypeKind::Class && self.modifiers.is_abstract
    }

    /// True when the type cannot be named from generated code: it has no
    /// enclosing namespace, or it is nested in a type that has none.
    pub fn is_unaddressable(&self) -> bool {
        self.name == self.simple_name
            || self.is_nested()
                && self.modifiers.is_static
                && self
                    .enclosing
                    .as_deref()
                    .is_some_and(|outer| simple_name_of(outer) == outer)
    }

    pub(crate) fn absorb(&mut self, members: Members) {
        for supertype in members.supertypes {
            if !self.supertypes.contains(&supertype) {
                self.supertypes.push(supertype);
            }
        }
        self.fields.extend(members.fields);
        self.methods.extend(members.methods);
        if !members.constructors.is_empty() {
            self.constructors.retain(|c| !c.implicit);
            self.constructors.extend(members.constructors);
        }
    }
}

impl Annotated for TypeSymbol {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

impl Annotated for FieldSymbol {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

impl Annotated for MethodSymbol {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

impl Annotated for ConstructorSymbol {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

impl Annotated for Parameter {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

/// Members contributed to a type from outside its own declaration
/// (for example Rust `impl` blocks in another file).
#[derive(Debug, Clone, Default)]
pub(crate) struct Members {
    pub supertypes: Vec<String>,
    pub fields: Vec<FieldSymbol>,
    pub methods: Vec<MethodSymbol>,
    pub constructors: Vec<ConstructorSymbol>,
}

impl Members {
    fn extend(&mut self, other: Members) {
        self.supertypes.extend(other.supertypes);
        self.fields.extend(other.fields);
        self.methods.extend(other.methods);
        self.constructors.extend(other.constructors);
    }
}

/// A declared element: a root target or the location of a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "element", rename_all = "camelCase")]
pub enum Element {
    Type { name: String },
    Field { owner: String, name: String },
    Method { owner: String, name: String },
    Constructor { owner: String, index: usize },
}

impl Element {
    pub fn ty(name: impl Into<String>) -> Self {
        Element::Type { name: name.into() }
    }

    pub fn field(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Element::Field {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn method(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Element::Method {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn constructor(owner: impl Into<String>, index: usize) -> Self {
        Element::Constructor {
            owner: owner.into(),
            index,
        }
    }

    /// The type declaring this element (the type itself for type elements).
    pub fn owner(&self) -> &str {
        match self {
            Element::Type { name } => name,
            Element::Field { owner, .. }
            | Element::Method { owner, .. }
            | Element::Constructor { owner, .. } => owner,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Type { name } => write!(f, "{name}"),
            Element::Field { owner, name } => write!(f, "{owner}.{name}"),
            Element::Method { owner, name } => write!(f, "{owner}.{name}()"),
            Element::Constructor { owner, index } => write!(f, "{owner} constructor #{index}"),
        }
    }
}

/// Read-only query interface over declared types.
pub trait SymbolTable {
    /// Look up a type by its qualified name.
    fn lookup(&self, name: &str) -> Option<&TypeSymbol>;

    /// Every known type, in a stable order.
    fn types(&self) -> Box<dyn Iterator<Item = &TypeSymbol> + '_>;

    /// Whether a value of type `from` can be used where `to` is expected,
    /// following declared supertypes transitively.
    fn is_assignable(&self, from: &str, to: &str) -> bool {
        let target = signature::raw_name(to);
        let mut queue = VecDeque::from([signature::raw_name(from).to_string()]);
        let mut seen = IndexSet::new();
        while let Some(current) = queue.pop_front() {
            if current == target {
                return true;
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(symbol) = self.lookup(&current) {
                queue.extend(
                    symbol
                        .supertypes
                        .iter()
                        .map(|s| signature::raw_name(s).to_string()),
                );
            }
        }
        false
    }

    /// All types and members carrying a declaration named `marker`.
    fn elements_annotated_with(&self, marker: &str) -> Vec<Element> {
        let mut found = Vec::new();
        for symbol in self.types() {
            if symbol.has_annotation(marker) {
                found.push(Element::ty(&symbol.name));
            }
            for (index, ctor) in symbol.constructors.iter().enumerate() {
                if ctor.has_annotation(marker) {
                    found.push(Element::constructor(&symbol.name, index));
                }
            }
            for method in symbol.methods.iter().filter(|m| m.has_annotation(marker)) {
                found.push(Element::method(&symbol.name, &method.name));
            }
            for field in symbol.fields.iter().filter(|f| f.has_annotation(marker)) {
                found.push(Element::field(&symbol.name, &field.name));
            }
        }
        found
    }
}

/// In-memory symbol table keyed by qualified type name.
#[derive(Debug, Clone, Default)]
pub struct SymbolSet {
    types: IndexMap<String, TypeSymbol>,
    /// Members declared before their owning type was seen.
    pending: IndexMap<String, Members>,
}

impl SymbolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type, replacing any previous symbol with the same name.
    pub fn insert(&mut self, mut symbol: TypeSymbol) -> &mut Self {
        if let Some(members) = self.pending.shift_remove(&symbol.name) {
            symbol.absorb(members);
        }
        self.types.insert(symbol.name.clone(), symbol);
        self
    }

    pub fn with(mut self, symbol: TypeSymbol) -> Self {
        self.insert(symbol);
        self
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub(crate) fn merge_members(&mut self, owner: &str, members: Members) {
        match self.types.get_mut(owner) {
            Some(symbol) => symbol.absorb(members),
            None => self
                .pending
                .entry(owner.to_string())
                .or_default()
                .extend(members),
        }
    }
}

impl SymbolTable for SymbolSet {
    fn lookup(&self, name: &str) -> Option<&TypeSymbol> {
        self.types.get(name)
    }

    fn types(&self) -> Box<dyn Iterator<Item = &TypeSymbol> + '_> {
        Box::new(self.types.values())
    }
}

/// The last segment of a qualified name (`a::b::C`, `a.b.C` or `a.B$C`).
pub fn simple_name_of(name: &str) -> &str {
    let raw = signature::raw_name(name);
    let tail = raw.rsplit("::").next().unwrap_or(raw);
    let tail = tail.rsplit('.').next().unwrap_or(tail);
    tail.rsplit('$').next().unwrap_or(tail)
}

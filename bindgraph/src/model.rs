//! Descriptors produced by the analysis.
//!
//! A [`StructDescriptor`] is created the first time a type is discovered and
//! filled in by later phases. Everything here serializes to JSON so results can
//! be inspected or handed to a code generator.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::symbols::{Annotation, Element};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectKind {
    Class,
    /// Interface or abstract class, encoded through its implementations.
    Mixin,
    Enum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputFormat {
    Object,
    Array,
}

impl OutputFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "object" => Some(OutputFormat::Object),
            "array" => Some(OutputFormat::Array),
            _ => None,
        }
    }
}

/// Reaction to unknown properties while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UnknownBehavior {
    Default,
    Ignore,
    Fail,
}

impl UnknownBehavior {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "default" => Some(UnknownBehavior::Default),
            "ignore" => Some(UnknownBehavior::Ignore),
            "fail" => Some(UnknownBehavior::Fail),
            _ => None,
        }
    }
}

/// Whether a type discriminator is written for polymorphic values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeSignature {
    Default,
    Exclude,
}

impl TypeSignature {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "default" => Some(TypeSignature::Default),
            "exclude" => Some(TypeSignature::Exclude),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionState {
    #[default]
    Pending,
    Resolved,
}

/// A member of a specific type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MemberRef {
    pub owner: String,
    pub name: String,
}

impl MemberRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

/// How a property value is read and written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Accessor {
    /// Getter and setter pair.
    ReadWrite { read: MemberRef, write: MemberRef },
    /// Public field, optionally also passed through the constructor.
    #[serde(rename_all = "camelCase")]
    Field {
        field: MemberRef,
        constructor_param: Option<String>,
    },
    /// Getter whose value is written through a constructor parameter.
    #[serde(rename_all = "camelCase")]
    ReadOnly {
        read: MemberRef,
        constructor_param: String,
    },
}

impl Accessor {
    pub fn is_field(&self) -> bool {
        matches!(self, Accessor::Field { .. })
    }

    /// The member the property is read from.
    pub fn source(&self) -> &MemberRef {
        match self {
            Accessor::ReadWrite { read, .. } | Accessor::ReadOnly { read, .. } => read,
            Accessor::Field { field, .. } => field,
        }
    }

    pub fn element(&self) -> Element {
        let source = self.source();
        if self.is_field() {
            Element::field(&source.owner, &source.name)
        } else {
            Element::method(&source.owner, &source.name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDescriptor {
    /// Logical property name derived from the member.
    pub property: String,
    /// Effective serialized name, the property name unless aliased.
    pub name: String,
    /// Identity of the attribute inside its struct.
    pub id: String,
    pub alias: Option<String>,
    pub declared_type: String,
    pub is_nullable: bool,
    pub is_mandatory: bool,
    /// Array-format position, `-1` when unset.
    pub index: i64,
    pub alternative_names: IndexSet<String>,
    /// Decoding matches the full name rather than only its hash.
    pub is_full_name_match: bool,
    pub type_signature: Option<TypeSignature>,
    pub converter: Option<String>,
    /// The property type encodes itself.
    pub is_self_coding: bool,
    pub accessor: Accessor,
    pub has_declaration: bool,
    pub minified_name: Option<String>,
}

impl AttributeDescriptor {
    pub fn has_index(&self) -> bool {
        self.index >= 0
    }
}

/// A constructor of the described type, by position in its symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstructorRef {
    pub index: usize,
    pub params: Vec<String>,
}

impl ConstructorRef {
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructDescriptor {
    pub type_name: String,
    pub simple_name: String,
    pub kind: ObjectKind,
    /// Unique generated identifier (`struct{n}`), assigned at discovery.
    pub generated_name: String,
    pub source_attribute: Option<Annotation>,
    pub discovered_via: String,
    /// Encoded by an external converter rather than by generated code.
    pub is_external_adapter: bool,
    pub converter: Option<String>,
    pub is_self_coding: bool,
    /// `None` for kinds that are never instantiated directly.
    pub candidate_constructors: Option<Vec<ConstructorRef>>,
    /// Candidates whose parameters match the property names exactly.
    pub matching_constructors: Option<Vec<ConstructorRef>>,
    pub selected_constructor: Option<ConstructorRef>,
    pub attributes: IndexMap<String, AttributeDescriptor>,
    /// Attribute id -> referenced signature that could not be analyzed.
    pub unresolved_references: IndexMap<String, String>,
    pub implementers: IndexSet<String>,
    pub enum_constants: Vec<String>,
    /// Declared redirect target.
    pub deserialize_as: Option<String>,
    /// Redirect target confirmed to be analyzed.
    pub deserialize_target: Option<String>,
    pub deserialize_name: Option<String>,
    pub formats: Vec<OutputFormat>,
    pub is_compact: bool,
    pub on_unknown: Option<UnknownBehavior>,
    pub type_signature: Option<TypeSignature>,
    pub discovery_path: Vec<String>,
    pub state: ResolutionState,
    #[serde(skip)]
    pub(crate) claimed: IndexSet<Element>,
}

impl StructDescriptor {
    pub fn new(
        type_name: impl Into<String>,
        simple_name: impl Into<String>,
        kind: ObjectKind,
        generated_name: impl Into<String>,
        discovered_via: impl Into<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            simple_name: simple_name.into(),
            kind,
            generated_name: generated_name.into(),
            source_attribute: None,
            discovered_via: discovered_via.into(),
            is_external_adapter: false,
            converter: None,
            is_self_coding: false,
            candidate_constructors: None,
            matching_constructors: None,
            selected_constructor: None,
            attributes: IndexMap::new(),
            unresolved_references: IndexMap::new(),
            implementers: IndexSet::new(),
            enum_constants: Vec::new(),
            deserialize_as: None,
            deserialize_target: None,
            deserialize_name: None,
            formats: vec![OutputFormat::Object],
            is_compact: false,
            on_unknown: None,
            type_signature: None,
            discovery_path: Vec::new(),
            state: ResolutionState::Pending,
            claimed: IndexSet::new(),
        }
    }

    /// The name written as type discriminator.
    pub fn discriminator(&self) -> &str {
        self.deserialize_name.as_deref().unwrap_or(&self.type_name)
    }

    pub fn has_empty_constructor(&self) -> bool {
        self.candidate_constructors
            .as_ref()
            .is_some_and(|ctors| ctors.iter().any(ConstructorRef::is_empty))
    }

    pub fn has_format(&self, format: OutputFormat) -> bool {
        self.formats.contains(&format)
    }

    /// `, discovered through: A -> b -> C` for types reached via properties.
    pub fn path_description(&self) -> String {
        if self.discovery_path.is_empty() {
            String::new()
        } else {
            format!(", discovered through: {}", self.discovery_path.join(" -> "))
        }
    }

    /// Order attributes for output: indexed ones by index, then the rest in
    /// insertion order.
    pub fn sort_attributes(&mut self) {
        let mut entries: Vec<_> = self.attributes.drain(..).enumerate().collect();
        entries.sort_by_key(|(position, (_, attr))| match attr.has_index() {
            true => (0, attr.index, *position),
            false => (1, 0, *position),
        });
        self.attributes = entries.into_iter().map(|(_, entry)| entry).collect();
    }

    /// Assign short unique names to attributes without an explicit alias.
    ///
    /// Candidates are the single characters of the property name in order,
    /// then the first character followed by a counter.
    pub fn prepare_minified_names(&mut self) {
        let mut used: IndexSet<String> = self
            .attributes
            .values()
            .filter(|attr| attr.alias.is_some())
            .map(|attr| attr.name.clone())
            .collect();
        for attr in self.attributes.values_mut().filter(|a| a.alias.is_none()) {
            let single = attr
                .property
                .chars()
                .filter(|c| c.is_alphanumeric())
                .map(String::from)
                .find(|candidate| !used.contains(candidate));
            let minified = single.unwrap_or_else(|| {
                let first = attr.property.chars().next().unwrap_or('_');
                (0..)
                    .map(|n| format!("{first}{n}"))
                    .find(|candidate| !used.contains(candidate))
                    .unwrap_or_default()
            });
            used.insert(minified.clone());
            attr.minified_name = Some(minified);
        }
    }

    /// Two names of different attributes (serialized or alternative) that
    /// share a hash, while at least one side does not require a full name
    /// match.
    pub fn hash_collision(&self) -> Option<(&str, &str)> {
        let names: Vec<(usize, &str, bool)> = self
            .attributes
            .values()
            .enumerate()
            .flat_map(|(owner, attr)| {
                std::iter::once(attr.name.as_str())
                    .chain(attr.alternative_names.iter().map(String::as_str))
                    .map(move |name| (owner, name, attr.is_full_name_match))
            })
            .collect();
        for (i, (owner_a, a, full_a)) in names.iter().enumerate() {
            for (owner_b, b, full_b) in &names[i + 1..] {
                if owner_a != owner_b && name_hash(a) == name_hash(b) && !(*full_a && *full_b) {
                    return Some((a, b));
                }
            }
        }
        None
    }
}

/// 32-bit FNV-1a hash of a serialized name.
pub fn name_hash(name: &str) -> u32 {
    name.bytes().fold(0x811c_9dc5, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
    })
}

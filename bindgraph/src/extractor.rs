//! Symbol facts extracted from Rust source files.
//!
//! This module scans Rust sources with `syn` and fills a [`SymbolSet`], so the
//! analysis can run over real declarations instead of hand-built symbols.
//!
//! ## Mapping
//!
//! - `struct` becomes a class, `trait` an interface and `enum` an enumeration
//!   whose unit variants are public static constants
//! - `pub` items and members are public
//! - `impl` methods taking `self` are instance methods, associated functions
//!   returning `Self` are constructors, associated consts are public static
//!   final fields
//! - `impl Trait for Type` adds `Trait` to the direct supertypes of `Type`
//! - `#[derive(Default)]` declares a public no-argument constructor; a struct
//!   whose fields are all public gets an implicit constructor taking every
//!   field, which is dropped once the type declares constructor functions
//! - outer attributes become declarations: `#[Name(key = value, flag,
//!   list(a, b))]` and every `derive` entry
//!
//! ## Use-item analysis
//!
//! Names are resolved the same way for types, attribute paths and path values
//! inside attributes:
//!
//! - `use bindgraph::JsonAttribute as Json` maps `"Json"` to
//!   `"bindgraph::JsonAttribute"`
//! - `crate::`, `self::` and `super::` prefixes are rewritten against the
//!   current module
//! - types declared in the same module are qualified with the module path
//!
//! Glob imports are not tracked since they can't be resolved statically.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use syn::ext::IdentExt;
use syn::punctuated::Punctuated;
use syn::{
    Attribute, Expr, ExprArray, ExprLit, ExprPath, ExprUnary, FnArg, Generics, ImplItem, Item,
    ItemEnum, ItemImpl, ItemStruct, ItemTrait, Lit, Meta, Pat, PathArguments, ReturnType,
    Signature, TraitItem, Type, TypeParamBound, TypePath, UnOp, UseTree, Visibility,
};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::symbols::{
    Annotation, AnnotationValue, ConstructorSymbol, FieldSymbol, Members, MethodSymbol, Modifiers,
    Parameter, SymbolSet, TypeSymbol,
};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to walk source directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("failed to parse {origin}: {source}")]
    Parse { origin: String, source: syn::Error },
}

/// Modifiers of associated consts and enum variants.
const CONSTANT: Modifiers = Modifiers {
    public: true,
    is_static: true,
    is_final: true,
    ..Modifiers::NONE
};

const DEFAULT_DERIVES: [&str; 3] = ["Default", "std::default::Default", "core::default::Default"];

/// Per-module context built from `use` items and local declarations.
struct SourceContext {
    /// Module path, starting with the crate name.
    module: Vec<String>,
    /// Maps local name -> fully-qualified path.
    ///
    /// Holds plain imports, renames, type aliases and the types declared in
    /// this module. Paths may still start with `crate`, `self` or `super`;
    /// they are normalized on lookup.
    imports: HashMap<String, String>,
}

/// A function declared in an `impl` block.
enum Function {
    Method(MethodSymbol),
    Constructor(ConstructorSymbol),
}

/// Recursively flatten a `UseTree` into import entries.
fn collect_imports(tree: &UseTree, prefix: &[String], imports: &mut HashMap<String, String>) {
    match tree {
        UseTree::Path(p) => {
            let mut new_prefix = prefix.to_vec();
            new_prefix.push(p.ident.unraw().to_string());
            collect_imports(&p.tree, &new_prefix, imports);
        }
        // `use foo::bar::{self}` names the module `bar` itself
        UseTree::Name(n) if n.ident == "self" => {
            if let Some(last) = prefix.last() {
                imports.insert(last.clone(), prefix.join("::"));
            }
        }
        UseTree::Name(n) => {
            let name = n.ident.unraw().to_string();
            let full_path = make_full_path(prefix, &name);
            imports.insert(name, full_path);
        }
        UseTree::Rename(r) => {
            let alias = r.rename.unraw().to_string();
            let full_path = if r.ident == "self" {
                prefix.join("::")
            } else {
                make_full_path(prefix, &r.ident.unraw().to_string())
            };
            imports.insert(alias, full_path);
        }
        UseTree::Glob(_) => {}
        UseTree::Group(g) => {
            for item in &g.items {
                collect_imports(item, prefix, imports);
            }
        }
    }
}

/// Join prefix segments with the final name using `::`.
fn make_full_path(prefix: &[String], name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", prefix.join("::"), name)
    }
}

fn is_public(vis: &Visibility) -> bool {
    matches!(vis, Visibility::Public(_))
}

fn type_params(generics: &Generics) -> Vec<String> {
    generics
        .type_params()
        .map(|p| p.ident.unraw().to_string())
        .collect()
}

fn path_segments(path: &syn::Path) -> Vec<String> {
    path.segments
        .iter()
        .map(|s| s.ident.unraw().to_string())
        .collect()
}

/// Module path of a source file relative to the crate's source root.
/// `lib.rs`, `main.rs` and `mod.rs` name their parent module.
fn module_path(crate_name: &str, relative: &Path) -> Vec<String> {
    let mut module = vec![crate_name.to_string()];
    module.extend(
        relative
            .with_extension("")
            .iter()
            .map(|part| part.to_string_lossy().into_owned()),
    );
    if module.len() > 1
        && module
            .last()
            .is_some_and(|last| matches!(last.as_str(), "lib" | "main" | "mod"))
    {
        module.pop();
    }
    module
}

impl SourceContext {
    fn new(module: Vec<String>, items: &[Item]) -> Self {
        let mut imports = HashMap::new();
        for item in items {
            if let Item::Use(item_use) = item {
                collect_imports(&item_use.tree, &[], &mut imports);
            }
        }
        for item in items {
            let ident = match item {
                Item::Struct(item) => &item.ident,
                Item::Enum(item) => &item.ident,
                Item::Trait(item) => &item.ident,
                _ => continue,
            };
            let name = ident.unraw().to_string();
            let qualified = make_full_path(&module, &name);
            imports.entry(name).or_insert(qualified);
        }

        let mut ctx = SourceContext { module, imports };
        // `type Foo<..> = some::path::Bar<..>` maps "Foo" to "some::path::Bar"
        let aliases: Vec<(String, String)> = items
            .iter()
            .filter_map(|item| match item {
                Item::Type(item_type) => match &*item_type.ty {
                    Type::Path(TypePath { path, .. }) => Some((
                        item_type.ident.unraw().to_string(),
                        ctx.path_name(path, None),
                    )),
                    _ => None,
                },
                _ => None,
            })
            .collect();
        ctx.imports.extend(aliases);
        ctx
    }

    fn crate_name(&self) -> &str {
        self.module.first().map_or("", String::as_str)
    }

    fn qualify(&self, ident: &syn::Ident) -> String {
        make_full_path(&self.module, &ident.unraw().to_string())
    }

    /// Resolve a path through the import map and normalize relative prefixes.
    fn resolve(&self, segments: &[String]) -> String {
        let Some((first, rest)) = segments.split_first() else {
            return String::new();
        };
        let expanded: Vec<String> = match self.imports.get(first) {
            Some(full_path) => full_path
                .split("::")
                .map(str::to_string)
                .chain(rest.iter().cloned())
                .collect(),
            None => segments.to_vec(),
        };
        self.normalize(&expanded).join("::")
    }

    fn normalize(&self, segments: &[String]) -> Vec<String> {
        let mut base: Option<Vec<String>> = None;
        let mut rest = segments;
        while let Some((first, tail)) = rest.split_first() {
            match first.as_str() {
                "crate" => base = Some(vec![self.crate_name().to_string()]),
                "self" => base = Some(base.unwrap_or_else(|| self.module.clone())),
                "super" => {
                    let mut module = base.unwrap_or_else(|| self.module.clone());
                    if module.len() > 1 {
                        module.pop();
                    }
                    base = Some(module);
                }
                _ => break,
            }
            rest = tail;
        }
        match base {
            Some(mut base) => {
                base.extend(rest.iter().cloned());
                base
            }
            None => rest.to_vec(),
        }
    }

    /// Fully-qualified name of a path, without generic arguments.
    /// `Self` is replaced by `self_ty` when given.
    fn path_name(&self, path: &syn::Path, self_ty: Option<&str>) -> String {
        let segments = path_segments(path);
        if let Some(owner) = self_ty
            && let Some((first, rest)) = segments.split_first()
            && first == "Self"
        {
            return std::iter::once(owner.to_string())
                .chain(rest.iter().cloned())
                .collect::<Vec<_>>()
                .join("::");
        }
        self.resolve(&segments)
    }

    /// Render a path with its generic arguments, e.g. `Vec<app::Item>`.
    fn render_path(&self, path: &syn::Path, self_ty: Option<&str>) -> String {
        let name = self.path_name(path, self_ty);
        let arguments: Vec<String> = match path.segments.last().map(|s| &s.arguments) {
            Some(PathArguments::AngleBracketed(args)) => args
                .args
                .iter()
                .filter_map(|arg| match arg {
                    syn::GenericArgument::Type(ty) => Some(self.render_type(ty, self_ty)),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        if arguments.is_empty() {
            name
        } else {
            format!("{name}<{}>", arguments.join(","))
        }
    }

    /// Render a type signature the way the analysis reads it: references are
    /// stripped, `str` reads as `String`, arrays and slices are `T[]`.
    fn render_type(&self, ty: &Type, self_ty: Option<&str>) -> String {
        match ty {
            Type::Path(TypePath { path, .. }) => self.render_path(path, self_ty),
            Type::Reference(reference) => match self.render_type(&reference.elem, self_ty) {
                inner if inner == "str" => "String".to_string(),
                inner => inner,
            },
            Type::Array(array) => format!("{}[]", self.render_type(&array.elem, self_ty)),
            Type::Slice(slice) => format!("{}[]", self.render_type(&slice.elem, self_ty)),
            Type::Tuple(tuple) => {
                let elems: Vec<String> = tuple
                    .elems
                    .iter()
                    .map(|elem| self.render_type(elem, self_ty))
                    .collect();
                format!("({})", elems.join(","))
            }
            Type::Paren(paren) => self.render_type(&paren.elem, self_ty),
            Type::Group(group) => self.render_type(&group.elem, self_ty),
            Type::Ptr(ptr) => self.render_type(&ptr.elem, self_ty),
            Type::TraitObject(object) => self.first_bound(object.bounds.iter(), self_ty),
            Type::ImplTrait(bounds) => self.first_bound(bounds.bounds.iter(), self_ty),
            _ => "_".to_string(),
        }
    }

    fn first_bound<'b>(
        &self,
        mut bounds: impl Iterator<Item = &'b TypeParamBound>,
        self_ty: Option<&str>,
    ) -> String {
        bounds
            .find_map(|bound| match bound {
                TypeParamBound::Trait(bound) => Some(self.render_path(&bound.path, self_ty)),
                _ => None,
            })
            .unwrap_or_else(|| "_".to_string())
    }

    /// Declarations carried by outer attributes. `doc` comments and
    /// `name = value` attributes are skipped; unparsable arguments leave the
    /// declaration without values.
    fn annotations(&self, attrs: &[Attribute]) -> Vec<Annotation> {
        let mut annotations = Vec::new();
        for attr in attrs {
            if attr.path().is_ident("doc") {
                continue;
            }
            if attr.path().is_ident("derive") {
                if let Ok(paths) = attr
                    .parse_args_with(Punctuated::<syn::Path, syn::Token![,]>::parse_terminated)
                {
                    annotations.extend(paths.iter().map(|p| Annotation::new(self.path_name(p, None))));
                }
                continue;
            }
            let mut annotation = Annotation::new(self.path_name(attr.path(), None));
            match &attr.meta {
                Meta::Path(_) => {}
                Meta::List(list) => {
                    if let Ok(nested) =
                        list.parse_args_with(Punctuated::<Meta, syn::Token![,]>::parse_terminated)
                    {
                        for meta in &nested {
                            if let Some((key, value)) = self.annotation_entry(meta) {
                                annotation.values.insert(key, value);
                            }
                        }
                    }
                }
                Meta::NameValue(_) => continue,
            }
            annotations.push(annotation);
        }
        annotations
    }

    fn annotation_entry(&self, meta: &Meta) -> Option<(String, AnnotationValue)> {
        let key = meta.path().get_ident()?.unraw().to_string();
        let value = match meta {
            Meta::Path(_) => AnnotationValue::Bool(true),
            Meta::NameValue(nv) => self.annotation_value(&nv.value)?,
            Meta::List(list) => {
                let items = list
                    .parse_args_with(Punctuated::<Expr, syn::Token![,]>::parse_terminated)
                    .ok()?;
                AnnotationValue::List(
                    items
                        .iter()
                        .filter_map(|item| self.annotation_value(item))
                        .collect(),
                )
            }
        };
        Some((key, value))
    }

    fn annotation_value(&self, expr: &Expr) -> Option<AnnotationValue> {
        match expr {
            Expr::Lit(ExprLit { lit, .. }) => match lit {
                Lit::Str(s) => Some(AnnotationValue::Str(s.value())),
                Lit::Bool(b) => Some(AnnotationValue::Bool(b.value)),
                Lit::Int(i) => i.base10_parse().ok().map(AnnotationValue::Int),
                _ => None,
            },
            Expr::Unary(ExprUnary {
                op: UnOp::Neg(_),
                expr,
                ..
            }) => match self.annotation_value(expr)? {
                AnnotationValue::Int(value) => Some(AnnotationValue::Int(-value)),
                _ => None,
            },
            Expr::Path(ExprPath { path, .. }) => Some(AnnotationValue::Type(self.path_name(path, None))),
            Expr::Array(ExprArray { elems, .. }) => Some(AnnotationValue::List(
                elems
                    .iter()
                    .filter_map(|elem| self.annotation_value(elem))
                    .collect(),
            )),
            _ => None,
        }
    }

    fn parameters(&self, sig: &Signature, owner: &str) -> Vec<Parameter> {
        sig.inputs
            .iter()
            .filter_map(|arg| match arg {
                FnArg::Typed(arg) => Some(arg),
                FnArg::Receiver(_) => None,
            })
            .enumerate()
            .map(|(index, arg)| {
                let name = match &*arg.pat {
                    Pat::Ident(pat) => pat.ident.unraw().to_string(),
                    _ => format!("arg{index}"),
                };
                let mut param = Parameter::new(name, self.render_type(&arg.ty, Some(owner)));
                param.annotations = self.annotations(&arg.attrs);
                param
            })
            .collect()
    }

    fn returns_owner(&self, output: &ReturnType, owner: &str) -> bool {
        match output {
            ReturnType::Type(_, ty) => match &**ty {
                Type::Path(TypePath { path, .. }) => {
                    path.is_ident("Self") || self.path_name(path, None) == owner
                }
                _ => false,
            },
            ReturnType::Default => false,
        }
    }

    fn function(&self, attrs: &[Attribute], sig: &Signature, public: bool, owner: &str) -> Function {
        let params = self.parameters(sig, owner);
        let annotations = self.annotations(attrs);
        let modifiers = Modifiers {
            public,
            private: !public,
            ..Modifiers::NONE
        };
        if sig.receiver().is_none() && self.returns_owner(&sig.output, owner) {
            return Function::Constructor(ConstructorSymbol {
                params,
                modifiers,
                annotations,
                implicit: false,
            });
        }

        let return_type = match &sig.output {
            ReturnType::Type(_, ty) => Some(self.render_type(ty, Some(owner))).filter(|ty| ty != "()"),
            ReturnType::Default => None,
        };
        Function::Method(MethodSymbol {
            name: sig.ident.unraw().to_string(),
            params,
            return_type,
            modifiers: Modifiers {
                is_static: sig.receiver().is_none(),
                ..modifiers
            },
            annotations,
        })
    }

    fn extract_struct(&self, item: &ItemStruct) -> TypeSymbol {
        let name = self.qualify(&item.ident);
        let mut symbol = TypeSymbol::class(&name);
        symbol.modifiers.public = is_public(&item.vis);
        symbol.type_params = type_params(&item.generics);
        symbol.annotations = self.annotations(&item.attrs);

        for (index, field) in item.fields.iter().enumerate() {
            let field_name = field
                .ident
                .as_ref()
                .map_or_else(|| index.to_string(), |ident| ident.unraw().to_string());
            let mut member = FieldSymbol::new(field_name, self.render_type(&field.ty, Some(&name)));
            member.modifiers.public = is_public(&field.vis);
            member.modifiers.private = !member.modifiers.public;
            member.annotations = self.annotations(&field.attrs);
            symbol.fields.push(member);
        }

        if symbol
            .annotations
            .iter()
            .any(|a| DEFAULT_DERIVES.contains(&a.name.as_str()))
        {
            symbol.constructors.push(ConstructorSymbol::new().public());
        } else if symbol.fields.iter().all(|f| f.modifiers.public) {
            // Struct literal syntax.
            symbol.constructors.push(ConstructorSymbol {
                params: symbol
                    .fields
                    .iter()
                    .map(|f| Parameter::new(&f.name, &f.ty))
                    .collect(),
                modifiers: Modifiers::public(),
                annotations: Vec::new(),
                implicit: true,
            });
        }
        symbol
    }

    fn extract_enum(&self, item: &ItemEnum) -> TypeSymbol {
        let name = self.qualify(&item.ident);
        let mut symbol = TypeSymbol::enumeration(&name);
        symbol.modifiers.public = is_public(&item.vis);
        symbol.type_params = type_params(&item.generics);
        symbol.annotations = self.annotations(&item.attrs);
        for variant in &item.variants {
            if !matches!(variant.fields, syn::Fields::Unit) {
                continue;
            }
            let mut constant =
                FieldSymbol::new(variant.ident.unraw().to_string(), &name).with_modifiers(CONSTANT);
            constant.annotations = self.annotations(&variant.attrs);
            symbol.fields.push(constant);
        }
        symbol
    }

    fn extract_trait(&self, item: &ItemTrait) -> TypeSymbol {
        let name = self.qualify(&item.ident);
        let mut symbol = TypeSymbol::interface(&name);
        symbol.modifiers.public = is_public(&item.vis);
        symbol.type_params = type_params(&item.generics);
        symbol.annotations = self.annotations(&item.attrs);
        symbol.supertypes = item
            .supertraits
            .iter()
            .filter_map(|bound| match bound {
                TypeParamBound::Trait(bound) => Some(self.render_path(&bound.path, Some(&name))),
                _ => None,
            })
            .collect();

        for trait_item in &item.items {
            match trait_item {
                // Associated functions without `self` have no instance to bind.
                TraitItem::Fn(f) if f.sig.receiver().is_some() => {
                    if let Function::Method(mut method) =
                        self.function(&f.attrs, &f.sig, true, &name)
                    {
                        method.modifiers.is_abstract = f.default.is_none();
                        symbol.methods.push(method);
                    }
                }
                TraitItem::Const(c) => {
                    let mut constant = FieldSymbol::new(
                        c.ident.unraw().to_string(),
                        self.render_type(&c.ty, Some(&name)),
                    )
                    .with_modifiers(CONSTANT);
                    constant.annotations = self.annotations(&c.attrs);
                    symbol.fields.push(constant);
                }
                _ => {}
            }
        }
        symbol
    }

    /// Members an `impl` block contributes to its self type. Blocks for
    /// anything other than a named type are skipped.
    fn extract_impl(&self, item: &ItemImpl) -> Option<(String, Members)> {
        let Type::Path(TypePath { path, .. }) = &*item.self_ty else {
            return None;
        };
        let owner = self.path_name(path, None);
        let mut members = Members::default();
        if let Some((negative, path, _)) = &item.trait_
            && negative.is_none()
        {
            members.supertypes.push(self.render_path(path, Some(&owner)));
        }

        // Trait items are as visible as the trait itself.
        let in_trait = item.trait_.is_some();
        for impl_item in &item.items {
            match impl_item {
                ImplItem::Fn(f) => {
                    let public = in_trait || is_public(&f.vis);
                    match self.function(&f.attrs, &f.sig, public, &owner) {
                        Function::Method(method) => members.methods.push(method),
                        Function::Constructor(ctor) => members.constructors.push(ctor),
                    }
                }
                ImplItem::Const(c) => {
                    let public = in_trait || is_public(&c.vis);
                    let mut constant = FieldSymbol::new(
                        c.ident.unraw().to_string(),
                        self.render_type(&c.ty, Some(&owner)),
                    )
                    .with_modifiers(Modifiers {
                        public,
                        private: !public,
                        ..CONSTANT
                    });
                    constant.annotations = self.annotations(&c.attrs);
                    members.fields.push(constant);
                }
                _ => {}
            }
        }
        Some((owner, members))
    }
}

fn extract_items(symbols: &mut SymbolSet, module: Vec<String>, items: &[Item]) {
    let ctx = SourceContext::new(module, items);
    for item in items {
        match item {
            Item::Struct(item) => {
                symbols.insert(ctx.extract_struct(item));
            }
            Item::Enum(item) => {
                symbols.insert(ctx.extract_enum(item));
            }
            Item::Trait(item) => {
                symbols.insert(ctx.extract_trait(item));
            }
            Item::Impl(item) => {
                if let Some((owner, members)) = ctx.extract_impl(item) {
                    symbols.merge_members(&owner, members);
                }
            }
            Item::Mod(item) => {
                if let Some((_, items)) = &item.content {
                    let mut module = ctx.module.clone();
                    module.push(item.ident.unraw().to_string());
                    extract_items(symbols, module, items);
                }
            }
            _ => {}
        }
    }
}

impl SymbolSet {
    fn extract_source(
        &mut self,
        module: Vec<String>,
        origin: &str,
        source: &str,
    ) -> Result<(), ExtractError> {
        let file = syn::parse_file(source).map_err(|source| ExtractError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        let before = self.len();
        extract_items(self, module, &file.items);
        debug!(origin, types = self.len() - before, "extracted source");
        Ok(())
    }

    /// Add the declarations of Rust source code belonging to `module`
    /// (`"my_crate"` or `"my_crate::model"`).
    ///
    /// ```
    /// use bindgraph::{SymbolSet, SymbolTable};
    ///
    /// let mut symbols = SymbolSet::new();
    /// symbols
    ///     .add_source_str("shop", "pub struct Order { pub id: u64 }")
    ///     .unwrap();
    /// assert!(symbols.lookup("shop::Order").is_some());
    /// ```
    pub fn add_source_str(&mut self, module: &str, source: &str) -> Result<&mut Self, ExtractError> {
        let segments = module.split("::").map(str::to_string).collect();
        self.extract_source(segments, module, source)?;
        Ok(self)
    }

    /// Add the declarations of a single Rust source file belonging to `module`.
    pub fn add_source_file(
        &mut self,
        module: &str,
        path: impl AsRef<Path>,
    ) -> Result<&mut Self, ExtractError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let segments = module.split("::").map(str::to_string).collect();
        self.extract_source(segments, &path.display().to_string(), &source)?;
        Ok(self)
    }

    /// Add every `.rs` file below a crate's source root. Module paths follow
    /// the file layout, so `src/model/person.rs` of `my-crate` is
    /// `my_crate::model::person`.
    ///
    /// ```no_run
    /// # fn main() -> Result<(), bindgraph::ExtractError> {
    /// use bindgraph::{AnalysisOptions, SymbolSet, analyze_symbols};
    ///
    /// let mut symbols = SymbolSet::new();
    /// symbols.add_source_dir("my-crate", "src/")?;
    /// let result = analyze_symbols(&symbols, AnalysisOptions::default());
    /// for diagnostic in &result.diagnostics {
    ///     eprintln!("{diagnostic}");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn add_source_dir(
        &mut self,
        crate_name: &str,
        path: impl AsRef<Path>,
    ) -> Result<&mut Self, ExtractError> {
        let root = path.as_ref();
        let crate_name = crate_name.replace('-', "_");
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|e| e != "rs") {
                continue;
            }
            let relative = path.strip_prefix(root).unwrap_or(path);
            let source = fs::read_to_string(path).map_err(|source| ExtractError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            self.extract_source(
                module_path(&crate_name, relative),
                &path.display().to_string(),
                &source,
            )?;
        }
        Ok(self)
    }
}

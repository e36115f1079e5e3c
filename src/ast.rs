//! The parse result: one [`ModuleUnit`] per source file.
//!
//! Everything here is a shape-preserving record of the source text. Names are
//! unresolved [`QualifiedId`]s; types are syntactic [`TypeRef`]s. The
//! compiler links these into the semantic model in [`crate::schema`].

use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::rc::Rc;

use crate::files::FileId;
use crate::source::FileRange;
use crate::Symbol;

#[derive(Debug, Clone)]
pub struct Identifier {
    pub text: Symbol,
    pub range: FileRange,
}

/// A dotted name such as `render.Color`. Never empty.
///
/// Equality and hashing are component-wise on the interned text only, so
/// occurrences at different source positions compare equal.
#[derive(Debug, Clone)]
pub struct QualifiedId {
    pub components: Vec<Identifier>,
}

impl QualifiedId {
    pub fn range(&self) -> FileRange {
        let first = self.components.first().expect("qualified id is never empty");
        let last = self.components.last().expect("qualified id is never empty");
        first.range.merge(&last.range)
    }

    pub fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.components.iter().map(|component| component.text)
    }
}

impl PartialEq for QualifiedId {
    fn eq(&self, other: &Self) -> bool {
        self.symbols().eq(other.symbols())
    }
}

impl Eq for QualifiedId {}

impl Hash for QualifiedId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for symbol in self.symbols() {
            symbol.hash(state);
        }
    }
}

#[derive(Debug, Clone)]
pub struct Literal {
    pub range: FileRange,
    pub kind: LiteralKind,
}

#[derive(Debug, Clone)]
pub enum LiteralKind {
    Null,
    Bool(bool),
    Int(i64),
    String(String),
    /// A late-bound reference; its category (type, constant, enum item) is
    /// chosen when the literal is translated to a value.
    Id(QualifiedId),
    List(Vec<Literal>),
}

#[derive(Debug, Clone)]
pub struct TypeRef {
    pub range: FileRange,
    pub kind: TypeRefKind,
}

#[derive(Debug, Clone)]
pub enum TypeRefKind {
    Name(QualifiedId),
    Pointer(Box<TypeRef>),
    Array(Box<TypeRef>, Option<i64>),
    Generic(Box<TypeRef>, Vec<TypeRef>),
    /// The reflective `typename` marker.
    TypeName,
}

/// An attribute usage: `[Doc("...")]`.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub name: QualifiedId,
    pub args: Vec<Literal>,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: Identifier,
    pub ty: TypeRef,
    pub annotations: Vec<Annotation>,
    pub default: Option<Literal>,
}

#[derive(Debug, Clone)]
pub struct EnumItem {
    pub name: Identifier,
    pub value: i64,
    pub annotations: Vec<Annotation>,
}

/// The declaration kinds a custom tag may alias.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TagKind {
    Struct,
    Union,
    Enum,
    Alias,
    Constant,
}

#[derive(Debug, Clone)]
pub enum Declaration {
    Module(ModuleDecl),
    Import(ImportDecl),
    Namespace(NamespaceDecl),
    Struct(StructDecl),
    Union(UnionDecl),
    Attribute(AttributeDecl),
    Enum(EnumDecl),
    Alias(AliasDecl),
    Constant(ConstantDecl),
    CustomTag(CustomTagDecl),
}

#[derive(Debug, Clone)]
pub struct ModuleDecl {
    pub name: Identifier,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub target: Identifier,
}

#[derive(Debug, Clone)]
pub struct NamespaceDecl {
    pub name: Identifier,
    pub decls: Vec<Declaration>,
}

#[derive(Debug, Clone)]
pub struct StructDecl {
    pub name: Identifier,
    pub custom_tag: Option<Symbol>,
    pub base: Option<TypeRef>,
    pub type_params: Vec<Identifier>,
    pub fields: Vec<Field>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone)]
pub struct UnionDecl {
    pub name: Identifier,
    pub custom_tag: Option<Symbol>,
    pub type_params: Vec<Identifier>,
    pub fields: Vec<Field>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone)]
pub struct AttributeDecl {
    pub name: Identifier,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: Identifier,
    pub custom_tag: Option<Symbol>,
    pub base: Option<TypeRef>,
    pub items: Vec<EnumItem>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone)]
pub struct AliasDecl {
    pub name: Identifier,
    pub custom_tag: Option<Symbol>,
    pub target: Option<TypeRef>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone)]
pub struct ConstantDecl {
    pub name: Identifier,
    pub custom_tag: Option<Symbol>,
    pub ty: TypeRef,
    pub value: Literal,
    pub annotations: Vec<Annotation>,
}

/// `use NAME : KEYWORD ;` — registers `NAME` as an alias for one of the
/// declaration keywords, within this module and within importers.
#[derive(Debug, Clone)]
pub struct CustomTagDecl {
    pub name: Identifier,
    pub kind: TagKind,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug)]
pub struct ModuleUnit {
    pub filename: PathBuf,
    pub file_id: FileId,
    pub name: Identifier,
    pub decls: Vec<Declaration>,
}

/// Shared handle to a parsed unit; the AST is read-only once built.
pub type UnitRc = Rc<ModuleUnit>;

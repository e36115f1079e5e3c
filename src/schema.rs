//! The semantic model: the linked, interned result of compilation.
//!
//! Everything is owned by a [`Context`] and linked by typed arena indices,
//! so the import graph may be cyclic while ownership stays linear. The
//! context lives from the start of compilation until the JSON document has
//! been emitted.

use crate::arena::{define_idx, IndexVec};
use crate::source::FileRange;
use crate::Symbol;

define_idx!(ModuleId);
define_idx!(NamespaceId);
define_idx!(TypeId);
define_idx!(ConstId);

/// The schema produced from one source file; the unit of import.
#[derive(Debug)]
pub struct Module {
    pub name: Symbol,
    pub location: FileRange,
    pub root: NamespaceId,
    /// Imported modules, in declaration order, each at most once.
    pub imports: Vec<ModuleId>,
    /// Every type visible in this module — locally declared types and
    /// transitively required external types — once, in first-seen order.
    pub types: Vec<TypeId>,
    pub constants: Vec<ConstId>,
    /// Declared namespaces (the unnamed root is not listed).
    pub namespaces: Vec<NamespaceId>,
    pub annotations: Vec<Annotation>,
}

/// A named lexical scope inside a module.
#[derive(Debug)]
pub struct Namespace {
    pub name: Symbol,
    pub qualified: String,
    pub location: FileRange,
    pub owner: ModuleId,
    /// `None` for a module's root namespace.
    pub parent: Option<NamespaceId>,
    pub types: Vec<TypeId>,
    pub constants: Vec<ConstId>,
    pub namespaces: Vec<NamespaceId>,
}

#[derive(Debug)]
pub struct Type {
    pub name: Symbol,
    pub qualified: String,
    pub location: FileRange,
    pub owner: ModuleId,
    pub scope: NamespaceId,
    pub annotations: Vec<Annotation>,
    pub kind: TypeKind,
}

/// Shared payload of struct, union and attribute types.
#[derive(Debug, Default)]
pub struct Aggregate {
    pub base: Option<TypeId>,
    pub fields: Vec<Field>,
    /// Generic type-parameter placeholders, in declaration order.
    pub generics: Vec<TypeId>,
}

#[derive(Debug)]
pub enum TypeKind {
    Primitive,
    /// The reflective `typename` type (`$sapc.typeid`).
    TypeId,
    Struct(Aggregate),
    Union(Aggregate),
    Attribute(Aggregate),
    Enum { items: Vec<EnumItem> },
    /// `using Name = target;` — target is `None` for an opaque alias.
    Alias { target: Option<TypeId> },
    Pointer { to: TypeId },
    Array { of: TypeId, size: Option<i64> },
    /// A type-parameter placeholder, scoped to the declaring aggregate.
    Generic { parent: TypeId },
    /// A generic instantiated with concrete arguments.
    Specialized { base: TypeId, args: Vec<TypeId> },
}

impl TypeKind {
    pub fn as_aggregate(&self) -> Option<&Aggregate> {
        match self {
            TypeKind::Struct(aggregate)
            | TypeKind::Union(aggregate)
            | TypeKind::Attribute(aggregate) => Some(aggregate),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Field {
    pub name: Symbol,
    pub location: FileRange,
    /// `None` only after a resolution error was logged.
    pub ty: Option<TypeId>,
    pub default: Option<Value>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug)]
pub struct EnumItem {
    pub name: Symbol,
    pub location: FileRange,
    pub value: i64,
    pub annotations: Vec<Annotation>,
}

/// An attribute usage bound to its attribute type, with a fully defaulted
/// positional argument list (one entry per attribute field).
#[derive(Debug, Clone)]
pub struct Annotation {
    /// `None` only after a binding error was logged.
    pub attribute: Option<TypeId>,
    pub location: FileRange,
    pub args: Vec<Value>,
}

/// The resolved counterpart of an AST literal.
#[derive(Debug, Clone)]
pub struct Value {
    pub location: FileRange,
    pub kind: ValueKind,
}

#[derive(Debug, Clone)]
pub enum ValueKind {
    Null,
    Bool(bool),
    Int(i64),
    String(String),
    /// A type used as a value (`typename`-shaped).
    Type(TypeId),
    /// An enum item, addressed as (parent enum, item index).
    Enum(TypeId, u32),
    List(Vec<Value>),
}

#[derive(Debug)]
pub struct Constant {
    pub name: Symbol,
    pub qualified: String,
    pub location: FileRange,
    pub owner: ModuleId,
    pub scope: NamespaceId,
    /// `None` only after a resolution error was logged.
    pub ty: Option<TypeId>,
    pub value: Value,
    pub annotations: Vec<Annotation>,
}

/// Owner of every schema object for one compilation.
#[derive(Debug, Default)]
pub struct Context {
    pub modules: IndexVec<ModuleId, Module>,
    pub namespaces: IndexVec<NamespaceId, Namespace>,
    pub types: IndexVec<TypeId, Type>,
    pub constants: IndexVec<ConstId, Constant>,
}

impl Context {
    pub fn new() -> Context {
        Context::default()
    }

    /// Look up an enum item by `(enum, index)` address.
    pub fn enum_item(&self, ty: TypeId, index: u32) -> Option<&EnumItem> {
        match &self.types[ty].kind {
            TypeKind::Enum { items } => items.get(index as usize),
            _ => None,
        }
    }
}

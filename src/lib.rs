#![doc = include_str!("../README.md")]

// Supporting modules
pub mod arena;
pub mod files;
pub mod reporting;
pub mod resolver;
pub mod source;

// Data models
pub mod ast;
pub mod schema;

// Pipeline phases
pub mod compiler;
pub mod json;
pub mod lexer;
pub mod parser;
pub mod validate;

// Top level driver
mod driver;

// Public exports
pub use driver::{Compilation, Driver, Status};

/// Interned strings.
pub type Symbol = string_interner::symbol::SymbolU32;

/// String interner.
pub type Interner = string_interner::StringInterner<
    string_interner::backend::BucketBackend<Symbol>,
    std::hash::BuildHasherDefault<fxhash::FxHasher>,
>;

/// The `$schema` URL stamped into every emitted document.
pub const SCHEMA_URL: &str =
    "https://raw.githubusercontent.com/potatoengine/sapc/master/schema/sap-1.schema.json";

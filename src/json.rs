//! Deterministic JSON projection of a compiled schema.
//!
//! The document is a tree of `Serialize` structs; struct field order gives
//! the stable key order, and every list follows the schema's declaration /
//! first-seen order, so serializing the same schema twice is byte-identical.

use serde::Serialize;

use crate::files::Files;
use crate::schema::{
    Annotation, ConstId, Context, Field, ModuleId, NamespaceId, TypeId, TypeKind, Value, ValueKind,
};
use crate::source::FileRange;
use crate::{Interner, Symbol, SCHEMA_URL};

/// Project the root module into a serializable document.
pub fn project(
    ctx: &Context,
    root: ModuleId,
    files: &Files,
    interner: &Interner,
) -> Document {
    Projector {
        ctx,
        files,
        interner,
    }
    .document(root)
}

#[derive(Serialize)]
pub struct Document {
    #[serde(rename = "$schema")]
    schema: &'static str,
    module: ModuleJson,
    types: Vec<TypeJson>,
    constants: Vec<ConstantJson>,
    namespaces: Vec<NamespaceJson>,
}

#[derive(Serialize)]
struct ModuleJson {
    name: String,
    annotations: Vec<AnnotationJson>,
    imports: Vec<String>,
}

#[derive(Serialize)]
struct TypeJson {
    name: String,
    qualified: String,
    module: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,
    kind: &'static str,
    annotations: Vec<AnnotationJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    base: Option<String>,
    #[serde(rename = "typeParams", skip_serializing_if = "Option::is_none")]
    type_params: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<FieldJson>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<Vec<EnumItemJson>>,
    #[serde(rename = "refType", skip_serializing_if = "Option::is_none")]
    ref_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<i64>,
    #[serde(rename = "typeArgs", skip_serializing_if = "Option::is_none")]
    type_args: Option<Vec<String>>,
    location: LocationJson,
}

#[derive(Serialize)]
struct FieldJson {
    name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    ty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<ValueJson>,
    annotations: Vec<AnnotationJson>,
    location: LocationJson,
}

#[derive(Serialize)]
struct EnumItemJson {
    name: String,
    value: i64,
    annotations: Vec<AnnotationJson>,
    location: LocationJson,
}

#[derive(Serialize)]
struct ConstantJson {
    name: String,
    qualified: String,
    module: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    ty: Option<String>,
    value: ValueJson,
    annotations: Vec<AnnotationJson>,
    location: LocationJson,
}

#[derive(Serialize)]
struct NamespaceJson {
    name: String,
    qualified: String,
    module: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,
    types: Vec<String>,
    constants: Vec<String>,
    namespaces: Vec<String>,
    location: LocationJson,
}

#[derive(Serialize)]
struct AnnotationJson {
    #[serde(rename = "type")]
    ty: String,
    args: Vec<ValueJson>,
    location: LocationJson,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ValueJson {
    Null(()),
    Bool(bool),
    Int(i64),
    String(String),
    TypeName {
        kind: &'static str,
        #[serde(rename = "type")]
        ty: String,
    },
    Enum {
        kind: &'static str,
        #[serde(rename = "type")]
        ty: String,
        name: String,
        value: i64,
    },
    List(Vec<ValueJson>),
}

#[derive(Serialize)]
struct LocationJson {
    filename: String,
    line: usize,
    column: usize,
    #[serde(rename = "lineEnd", skip_serializing_if = "Option::is_none")]
    line_end: Option<usize>,
    #[serde(rename = "columnEnd", skip_serializing_if = "Option::is_none")]
    column_end: Option<usize>,
}

struct Projector<'a> {
    ctx: &'a Context,
    files: &'a Files,
    interner: &'a Interner,
}

impl<'a> Projector<'a> {
    fn text(&self, symbol: Symbol) -> String {
        self.interner.resolve(symbol).unwrap_or("").to_owned()
    }

    fn qualified(&self, ty: TypeId) -> String {
        self.ctx.types[ty].qualified.clone()
    }

    fn document(&self, root: ModuleId) -> Document {
        let module = &self.ctx.modules[root];
        Document {
            schema: SCHEMA_URL,
            module: ModuleJson {
                name: self.text(module.name),
                annotations: self.annotations(&module.annotations),
                imports: module
                    .imports
                    .iter()
                    .map(|&import| self.text(self.ctx.modules[import].name))
                    .collect(),
            },
            types: module.types.iter().map(|&ty| self.ty(ty)).collect(),
            constants: module
                .constants
                .iter()
                .map(|&constant| self.constant(constant))
                .collect(),
            namespaces: module
                .namespaces
                .iter()
                .map(|&ns| self.namespace(ns))
                .collect(),
        }
    }

    fn ty(&self, ty: TypeId) -> TypeJson {
        let entry = &self.ctx.types[ty];
        let mut json = TypeJson {
            name: self.text(entry.name),
            qualified: entry.qualified.clone(),
            module: self.text(self.ctx.modules[entry.owner].name),
            namespace: self.namespace_of(entry.scope),
            kind: kind_name(&entry.kind),
            annotations: self.annotations(&entry.annotations),
            base: None,
            type_params: None,
            fields: None,
            items: None,
            ref_type: None,
            size: None,
            type_args: None,
            location: self.location(entry.location),
        };

        match &entry.kind {
            TypeKind::Struct(aggregate)
            | TypeKind::Union(aggregate)
            | TypeKind::Attribute(aggregate) => {
                json.base = aggregate.base.map(|base| self.qualified(base));
                json.type_params = Some(
                    aggregate
                        .generics
                        .iter()
                        .map(|&generic| self.qualified(generic))
                        .collect(),
                );
                json.fields = Some(
                    aggregate
                        .fields
                        .iter()
                        .map(|field| self.field(field))
                        .collect(),
                );
            }
            TypeKind::Enum { items } => {
                json.items = Some(
                    items
                        .iter()
                        .map(|item| EnumItemJson {
                            name: self.text(item.name),
                            value: item.value,
                            annotations: self.annotations(&item.annotations),
                            location: self.location(item.location),
                        })
                        .collect(),
                );
            }
            TypeKind::Alias { target } => {
                json.ref_type = target.map(|target| self.qualified(target));
            }
            TypeKind::Pointer { to } => {
                json.ref_type = Some(self.qualified(*to));
            }
            TypeKind::Array { of, size } => {
                json.ref_type = Some(self.qualified(*of));
                json.size = *size;
            }
            TypeKind::Specialized { base, args } => {
                json.ref_type = Some(self.qualified(*base));
                json.type_args = Some(args.iter().map(|&arg| self.qualified(arg)).collect());
            }
            TypeKind::Primitive | TypeKind::TypeId | TypeKind::Generic { .. } => {}
        }

        json
    }

    fn field(&self, field: &Field) -> FieldJson {
        FieldJson {
            name: self.text(field.name),
            ty: field.ty.map(|ty| self.qualified(ty)),
            default: field.default.as_ref().map(|value| self.value(value)),
            annotations: self.annotations(&field.annotations),
            location: self.location(field.location),
        }
    }

    fn constant(&self, constant: ConstId) -> ConstantJson {
        let entry = &self.ctx.constants[constant];
        ConstantJson {
            name: self.text(entry.name),
            qualified: entry.qualified.clone(),
            module: self.text(self.ctx.modules[entry.owner].name),
            namespace: self.namespace_of(entry.scope),
            ty: entry.ty.map(|ty| self.qualified(ty)),
            value: self.value(&entry.value),
            annotations: self.annotations(&entry.annotations),
            location: self.location(entry.location),
        }
    }

    fn namespace(&self, ns: NamespaceId) -> NamespaceJson {
        let entry = &self.ctx.namespaces[ns];
        NamespaceJson {
            name: self.text(entry.name),
            qualified: entry.qualified.clone(),
            module: self.text(self.ctx.modules[entry.owner].name),
            namespace: entry.parent.and_then(|parent| self.namespace_of(parent)),
            types: entry.types.iter().map(|&ty| self.qualified(ty)).collect(),
            constants: entry
                .constants
                .iter()
                .map(|&constant| self.ctx.constants[constant].qualified.clone())
                .collect(),
            namespaces: entry
                .namespaces
                .iter()
                .map(|&child| self.ctx.namespaces[child].qualified.clone())
                .collect(),
            location: self.location(entry.location),
        }
    }

    /// The owning namespace's qualified name; omitted at module root.
    fn namespace_of(&self, ns: NamespaceId) -> Option<String> {
        let qualified = &self.ctx.namespaces[ns].qualified;
        if qualified.is_empty() {
            None
        } else {
            Some(qualified.clone())
        }
    }

    fn annotations(&self, annotations: &[Annotation]) -> Vec<AnnotationJson> {
        annotations
            .iter()
            .map(|annotation| AnnotationJson {
                ty: annotation
                    .attribute
                    .map(|attribute| self.qualified(attribute))
                    .unwrap_or_default(),
                args: annotation.args.iter().map(|arg| self.value(arg)).collect(),
                location: self.location(annotation.location),
            })
            .collect()
    }

    fn value(&self, value: &Value) -> ValueJson {
        match &value.kind {
            ValueKind::Null => ValueJson::Null(()),
            ValueKind::Bool(value) => ValueJson::Bool(*value),
            ValueKind::Int(value) => ValueJson::Int(*value),
            ValueKind::String(value) => ValueJson::String(value.clone()),
            ValueKind::Type(ty) => ValueJson::TypeName {
                kind: "typename",
                ty: self.qualified(*ty),
            },
            ValueKind::Enum(ty, index) => match self.ctx.enum_item(*ty, *index) {
                Some(item) => ValueJson::Enum {
                    kind: "enum",
                    ty: self.qualified(*ty),
                    name: self.text(item.name),
                    value: item.value,
                },
                None => ValueJson::Null(()),
            },
            ValueKind::List(values) => {
                ValueJson::List(values.iter().map(|value| self.value(value)).collect())
            }
        }
    }

    fn location(&self, range: FileRange) -> LocationJson {
        let (start, end) = self.files.range_bounds(range);
        LocationJson {
            filename: self.files.file_name(range.file_id()).to_owned(),
            line: start.line,
            column: start.column,
            line_end: (end.line != start.line).then_some(end.line),
            column_end: (end.column != start.column).then_some(end.column),
        }
    }
}

fn kind_name(kind: &TypeKind) -> &'static str {
    match kind {
        TypeKind::Primitive => "primitive",
        TypeKind::TypeId => "typename",
        TypeKind::Struct(_) => "struct",
        TypeKind::Union(_) => "union",
        TypeKind::Attribute(_) => "attribute",
        TypeKind::Enum { .. } => "enum",
        TypeKind::Alias { .. } => "alias",
        TypeKind::Pointer { .. } => "pointer",
        TypeKind::Array { .. } => "array",
        TypeKind::Generic { .. } => "generic",
        TypeKind::Specialized { .. } => "specialized",
    }
}

//! Schema-level validation, run against the root module after a clean
//! compile.

use std::path::Path;

use fxhash::FxHashMap;

use crate::files::Files;
use crate::reporting::{Message, ValidateMessage};
use crate::schema::{Annotation, Context, ModuleId, TypeId, TypeKind};
use crate::source::FileRange;
use crate::{Interner, Symbol};

/// Validate the root module. Returns the accumulated messages; the module
/// passes when none of them is an error.
pub fn validate(
    ctx: &Context,
    root: ModuleId,
    files: &Files,
    interner: &Interner,
) -> Vec<Message> {
    let mut validator = Validator {
        ctx,
        files,
        interner,
        messages: Vec::new(),
    };
    validator.module(root);
    validator.messages
}

struct Validator<'a> {
    ctx: &'a Context,
    files: &'a Files,
    interner: &'a Interner,
    messages: Vec<Message>,
}

impl<'a> Validator<'a> {
    fn text(&self, symbol: Symbol) -> &'a str {
        self.interner.resolve(symbol).unwrap_or("")
    }

    fn report(&mut self, message: ValidateMessage) {
        self.messages.push(message.into());
    }

    fn module(&mut self, module_id: ModuleId) {
        let module = &self.ctx.modules[module_id];
        let name = self.text(module.name).to_owned();
        let location = module.location;

        if name.is_empty() {
            self.report(ValidateMessage::MissingModuleName { range: location });
        } else {
            // module name should be the same as the file stem
            let file_name = self.files.file_name(location.file_id());
            let stem = Path::new(file_name)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            if stem != name {
                self.report(ValidateMessage::ModuleNameMismatch {
                    range: location,
                    name,
                    stem,
                });
            }
        }

        self.annotations(&module.annotations);

        for &ty in &module.types {
            // imported types are validated by their own module's run
            if self.ctx.types[ty].owner != module_id {
                continue;
            }
            self.ty(ty);
        }

        for &constant in &module.constants {
            self.annotations(&self.ctx.constants[constant].annotations);
        }
    }

    fn ty(&mut self, ty: TypeId) {
        let entry = &self.ctx.types[ty];
        self.annotations(&entry.annotations);

        match &entry.kind {
            TypeKind::Struct(aggregate) | TypeKind::Union(aggregate) => {
                self.unique_fields(ty);
                for field in &aggregate.fields {
                    self.annotations(&field.annotations);
                    // typename-typed fields are reserved for attributes
                    let Some(field_ty) = field.ty else { continue };
                    if matches!(self.ctx.types[field_ty].kind, TypeKind::TypeId) {
                        self.report(ValidateMessage::TypenameField {
                            range: field.location,
                            field: self.text(field.name).to_owned(),
                            ty: entry.qualified.clone(),
                        });
                    }
                }
            }
            TypeKind::Attribute(aggregate) => {
                self.unique_fields(ty);
                for field in &aggregate.fields {
                    self.annotations(&field.annotations);
                }
            }
            TypeKind::Enum { items } => {
                for item in items {
                    self.annotations(&item.annotations);
                }
            }
            _ => {}
        }
    }

    /// Field names are unique within an aggregate; a duplicate is reported
    /// at its own location with a note at the first occurrence.
    fn unique_fields(&mut self, ty: TypeId) {
        let entry = &self.ctx.types[ty];
        let Some(aggregate) = entry.kind.as_aggregate() else {
            return;
        };
        let mut seen: FxHashMap<Symbol, FileRange> = FxHashMap::default();
        for field in &aggregate.fields {
            match seen.get(&field.name) {
                Some(&first) => {
                    self.report(ValidateMessage::DuplicateField {
                        range: field.location,
                        name: self.text(field.name).to_owned(),
                        ty: entry.qualified.clone(),
                        first,
                    });
                }
                None => {
                    seen.insert(field.name, field.location);
                }
            }
        }
    }

    /// Every annotation's argument list must be the same length as the bound
    /// attribute's field list.
    fn annotations(&mut self, annotations: &'a [Annotation]) {
        for annotation in annotations {
            let Some(attribute) = annotation.attribute else {
                continue;
            };
            let Some(aggregate) = self.ctx.types[attribute].kind.as_aggregate() else {
                continue;
            };
            if annotation.args.len() != aggregate.fields.len() {
                self.report(ValidateMessage::AnnotationArity {
                    range: annotation.location,
                    attribute: self.ctx.types[attribute].qualified.clone(),
                    expected: aggregate.fields.len(),
                    found: annotation.args.len(),
                });
            }
        }
    }
}

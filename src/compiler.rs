//! The compiler core: translates parsed module units into the schema,
//! recursively compiling imports, interning derived types, and binding every
//! identifier to a schema object.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use fxhash::{FxHashMap, FxHashSet};

use crate::ast::{self, UnitRc};
use crate::files::Files;
use crate::parser::Parser;
use crate::reporting::{CompileMessage, Message};
use crate::resolver::ModuleResolver;
use crate::schema::{
    Aggregate, Annotation, ConstId, Constant, Context, EnumItem, Field, Module, ModuleId,
    Namespace, NamespaceId, Type, TypeId, TypeKind, Value, ValueKind,
};
use crate::source::{ByteRange, FileRange};
use crate::{lexer, Interner, Symbol};

/// What a qualified identifier resolved to.
#[derive(Debug, Copy, Clone)]
pub enum Resolve {
    Type(TypeId),
    Constant(ConstId),
    Namespace(NamespaceId),
    /// An enum item, addressed as (parent enum, item index).
    EnumItem(TypeId, u32),
}

/// Ids of the synthetic `$sapc` module's members.
struct CoreModule {
    module: ModuleId,
    typeid: TypeId,
    customtag: TypeId,
}

/// Per-in-flight-file build state. A stack of these supports recursive
/// imports without crosstalk between files.
struct State {
    unit: UnitRc,
    module: ModuleId,
    ns_stack: Vec<NamespaceId>,
    /// Foreign types already added to this module's type list.
    imported: FxHashSet<TypeId>,
    /// Successful resolutions, keyed by (type scope, id components).
    resolve_cache: FxHashMap<(Option<TypeId>, Vec<Symbol>), Resolve>,
}

pub struct Compiler<'a> {
    ctx: &'a mut Context,
    files: &'a mut Files,
    interner: &'a mut Interner,
    resolver: &'a dyn ModuleResolver,
    search_paths: Vec<PathBuf>,

    messages: Vec<Message>,
    /// Every path handed to `compile`, in compile order; feeds the
    /// dependency file.
    dependencies: Vec<PathBuf>,

    /// Parse results by resolved path; `None` records a failed parse so its
    /// diagnostics are not repeated.
    asts: FxHashMap<PathBuf, Option<UnitRc>>,
    /// Files whose parse is in flight (guards cyclic imports at parse time).
    parsing: FxHashSet<PathBuf>,
    /// Modules by resolved path; an entry is registered before the file's
    /// declarations are walked, so cyclic imports short-circuit here.
    module_map: FxHashMap<PathBuf, ModuleId>,

    state: Vec<State>,
    core: Option<CoreModule>,

    pointer_types: FxHashMap<TypeId, TypeId>,
    array_types: FxHashMap<(TypeId, Option<i64>), TypeId>,
    specialized_types: FxHashMap<(TypeId, Vec<TypeId>), TypeId>,
}

impl<'a> Compiler<'a> {
    pub fn new(
        ctx: &'a mut Context,
        files: &'a mut Files,
        interner: &'a mut Interner,
        resolver: &'a dyn ModuleResolver,
        search_paths: &[PathBuf],
    ) -> Compiler<'a> {
        Compiler {
            ctx,
            files,
            interner,
            resolver,
            search_paths: search_paths.to_vec(),
            messages: Vec::new(),
            dependencies: Vec::new(),
            asts: FxHashMap::default(),
            parsing: FxHashSet::default(),
            module_map: FxHashMap::default(),
            state: Vec::new(),
            core: None,
            pointer_types: FxHashMap::default(),
            array_types: FxHashMap::default(),
            specialized_types: FxHashMap::default(),
        }
    }

    /// Compile the file at `path` into a schema module, compiling its
    /// imports recursively. Each unique path is compiled at most once.
    pub fn compile(&mut self, path: &Path) -> Option<ModuleId> {
        if let Some(&module) = self.module_map.get(path) {
            return Some(module);
        }

        self.dependencies.push(path.to_path_buf());

        let unit = self.parse_file(path)?;

        self.ensure_core();

        let module = self.ctx.modules.next_idx();
        let empty = self.interner.get_or_intern("");
        let root = self.ctx.namespaces.push(Namespace {
            name: empty,
            qualified: String::new(),
            location: unit.name.range,
            owner: module,
            parent: None,
            types: Vec::new(),
            constants: Vec::new(),
            namespaces: Vec::new(),
        });
        self.ctx.modules.push(Module {
            name: unit.name.text,
            location: unit.name.range,
            root,
            imports: Vec::new(),
            types: Vec::new(),
            constants: Vec::new(),
            namespaces: Vec::new(),
            annotations: Vec::new(),
        });
        self.module_map.insert(path.to_path_buf(), module);

        self.state.push(State {
            unit: unit.clone(),
            module,
            ns_stack: vec![root],
            imported: FxHashSet::default(),
            resolve_cache: FxHashMap::default(),
        });
        for decl in &unit.decls {
            self.build_decl(decl);
        }
        self.state.pop();

        Some(module)
    }

    /// Consume the compiler, yielding the accumulated diagnostics and the
    /// ordered list of compiled source paths.
    pub fn finish(self) -> (Vec<Message>, Vec<PathBuf>) {
        (self.messages, self.dependencies)
    }

    pub(crate) fn report(&mut self, message: impl Into<Message>) {
        self.messages.push(message.into());
    }

    pub(crate) fn symbol_text(&self, symbol: Symbol) -> String {
        self.interner.resolve(symbol).unwrap_or("").to_owned()
    }

    fn display_qualified(&self, id: &ast::QualifiedId) -> String {
        let mut out = String::new();
        for (index, component) in id.components.iter().enumerate() {
            if index > 0 {
                out.push('.');
            }
            out.push_str(self.interner.resolve(component.text).unwrap_or(""));
        }
        out
    }

    fn display_type_ref(&self, type_ref: &ast::TypeRef) -> String {
        match &type_ref.kind {
            ast::TypeRefKind::TypeName => "typename".to_owned(),
            ast::TypeRefKind::Name(name) => self.display_qualified(name),
            ast::TypeRefKind::Pointer(inner) => format!("{}*", self.display_type_ref(inner)),
            ast::TypeRefKind::Array(inner, Some(size)) => {
                format!("{}[{size}]", self.display_type_ref(inner))
            }
            ast::TypeRefKind::Array(inner, None) => format!("{}[]", self.display_type_ref(inner)),
            ast::TypeRefKind::Generic(base, args) => {
                let args = args
                    .iter()
                    .map(|arg| self.display_type_ref(arg))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("{}<{args}>", self.display_type_ref(base))
            }
        }
    }

    // ---- parsing ----

    /// Parse the file at `path`, once; repeat requests return the cached
    /// result. A request for a file whose parse is already in flight (an
    /// import cycle) yields nothing.
    pub(crate) fn parse_file(&mut self, path: &Path) -> Option<UnitRc> {
        if let Some(cached) = self.asts.get(path) {
            return cached.clone();
        }
        if !self.parsing.insert(path.to_path_buf()) {
            return None;
        }

        let unit = self.parse_file_uncached(path);

        self.parsing.remove(path);
        self.asts.insert(path.to_path_buf(), unit.clone());
        unit
    }

    fn parse_file_uncached(&mut self, path: &Path) -> Option<UnitRc> {
        let source = match self.resolver.load(path) {
            Ok(source) => source,
            Err(error) => {
                self.report(CompileMessage::ReadFailed {
                    path: path.display().to_string(),
                    error: error.to_string(),
                });
                return None;
            }
        };
        let file_id = self.files.add(path.display().to_string(), source);
        let tokens = lexer::tokenize(
            self.files.file_source(file_id),
            file_id,
            self.interner,
            &mut self.messages,
        );
        let unit = Parser::new(self, file_id, path.to_path_buf(), tokens).parse_unit()?;
        Some(Rc::new(unit))
    }

    /// Eagerly parse an imported module during the importer's parse, so its
    /// custom tags can be harvested. Resolution failures are not reported
    /// here; the schema build of the `import` declaration reports them.
    pub(crate) fn import_unit(
        &mut self,
        target: &ast::Identifier,
        base_dir: &Path,
    ) -> Option<UnitRc> {
        let file = PathBuf::from(format!("{}.sap", self.symbol_text(target.text)));
        let path = self.resolver.resolve(&file, base_dir, &self.search_paths)?;
        self.parse_file(&path)
    }

    // ---- the core module ----

    /// Initialize the synthetic `$sapc` module once, before the first user
    /// file is compiled.
    fn ensure_core(&mut self) {
        if self.core.is_some() {
            return;
        }

        let builtin_file = self.files.add("<builtin>".to_owned(), String::new());
        let builtin = FileRange::new(builtin_file, ByteRange::new(0, 0));

        let module = self.ctx.modules.next_idx();
        let empty = self.interner.get_or_intern("");
        let root = self.ctx.namespaces.push(Namespace {
            name: empty,
            qualified: String::new(),
            location: builtin,
            owner: module,
            parent: None,
            types: Vec::new(),
            constants: Vec::new(),
            namespaces: Vec::new(),
        });
        let name = self.interner.get_or_intern("$sapc");
        self.ctx.modules.push(Module {
            name,
            location: builtin,
            root,
            imports: Vec::new(),
            types: Vec::new(),
            constants: Vec::new(),
            namespaces: Vec::new(),
            annotations: Vec::new(),
        });

        let mut string_ty = None;
        for builtin_name in ["string", "bool", "byte", "int", "float"] {
            let symbol = self.interner.get_or_intern(builtin_name);
            let ty = self.ctx.types.push(Type {
                name: symbol,
                qualified: builtin_name.to_owned(),
                location: builtin,
                owner: module,
                scope: root,
                annotations: Vec::new(),
                kind: TypeKind::Primitive,
            });
            self.ctx.modules[module].types.push(ty);
            self.ctx.namespaces[root].types.push(ty);
            if builtin_name == "string" {
                string_ty = Some(ty);
            }
        }

        // The `$`-prefixed names keep these out of identifier lookup; the
        // compiler binds them directly.
        let typeid_name = self.interner.get_or_intern("$sapc.typeid");
        let typeid = self.ctx.types.push(Type {
            name: typeid_name,
            qualified: "$sapc.typeid".to_owned(),
            location: builtin,
            owner: module,
            scope: root,
            annotations: Vec::new(),
            kind: TypeKind::TypeId,
        });
        self.ctx.modules[module].types.push(typeid);
        self.ctx.namespaces[root].types.push(typeid);

        let tag_field = Field {
            name: self.interner.get_or_intern("tag"),
            location: builtin,
            ty: string_ty,
            default: None,
            annotations: Vec::new(),
        };
        let customtag_name = self.interner.get_or_intern("$sapc.customtag");
        let customtag = self.ctx.types.push(Type {
            name: customtag_name,
            qualified: "$sapc.customtag".to_owned(),
            location: builtin,
            owner: module,
            scope: root,
            annotations: Vec::new(),
            kind: TypeKind::Attribute(Aggregate {
                base: None,
                fields: vec![tag_field],
                generics: Vec::new(),
            }),
        });
        self.ctx.modules[module].types.push(customtag);
        self.ctx.namespaces[root].types.push(customtag);

        self.core = Some(CoreModule {
            module,
            typeid,
            customtag,
        });
    }

    fn core(&self) -> &CoreModule {
        self.core.as_ref().expect("core module is initialized")
    }

    // ---- build state ----

    fn top(&self) -> &State {
        self.state.last().expect("a file build is in flight")
    }

    fn current_module(&self) -> ModuleId {
        self.top().module
    }

    fn current_ns(&self) -> NamespaceId {
        *self.top().ns_stack.last().expect("namespace stack is never empty")
    }

    fn qualify(&self, name: Symbol) -> String {
        let scope = &self.ctx.namespaces[self.current_ns()];
        let text = self.interner.resolve(name).unwrap_or("");
        if scope.qualified.is_empty() {
            text.to_owned()
        } else {
            format!("{}.{text}", scope.qualified)
        }
    }

    // ---- declaration building ----

    fn build_decl(&mut self, decl: &ast::Declaration) {
        match decl {
            ast::Declaration::Module(module_decl) => self.build_module_decl(module_decl),
            ast::Declaration::Import(import_decl) => self.build_import(import_decl),
            ast::Declaration::Namespace(ns_decl) => self.build_namespace(ns_decl),
            ast::Declaration::Struct(struct_decl) => self.build_aggregate(
                AggregateKind::Struct,
                &struct_decl.name,
                struct_decl.custom_tag,
                struct_decl.base.as_ref(),
                &struct_decl.type_params,
                &struct_decl.fields,
                &struct_decl.annotations,
            ),
            ast::Declaration::Union(union_decl) => self.build_aggregate(
                AggregateKind::Union,
                &union_decl.name,
                union_decl.custom_tag,
                None,
                &union_decl.type_params,
                &union_decl.fields,
                &union_decl.annotations,
            ),
            ast::Declaration::Attribute(attr_decl) => self.build_aggregate(
                AggregateKind::Attribute,
                &attr_decl.name,
                None,
                None,
                &[],
                &attr_decl.fields,
                &[],
            ),
            ast::Declaration::Enum(enum_decl) => self.build_enum(enum_decl),
            ast::Declaration::Alias(alias_decl) => self.build_alias(alias_decl),
            ast::Declaration::Constant(const_decl) => self.build_constant(const_decl),
            // custom tags were consumed by the parser
            ast::Declaration::CustomTag(_) => {}
        }
    }

    fn build_module_decl(&mut self, decl: &ast::ModuleDecl) {
        let module = self.current_module();
        for annotation in &decl.annotations {
            let translated = self.translate_annotation(annotation);
            self.ctx.modules[module].annotations.push(translated);
        }
    }

    fn build_import(&mut self, decl: &ast::ImportDecl) {
        let base_dir = self
            .top()
            .unit
            .filename
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let file = PathBuf::from(format!("{}.sap", self.symbol_text(decl.target.text)));
        let Some(path) = self.resolver.resolve(&file, &base_dir, &self.search_paths) else {
            let name = self.symbol_text(decl.target.text);
            self.report(CompileMessage::ModuleNotFound {
                range: decl.target.range,
                name,
            });
            return;
        };

        let Some(imported) = self.compile(&path) else {
            return;
        };

        let module = self.current_module();
        if imported != module && !self.ctx.modules[module].imports.contains(&imported) {
            self.ctx.modules[module].imports.push(imported);
        }
    }

    fn build_namespace(&mut self, decl: &ast::NamespaceDecl) {
        let module = self.current_module();
        let parent = self.current_ns();
        let qualified = self.qualify(decl.name.text);
        let ns = self.ctx.namespaces.push(Namespace {
            name: decl.name.text,
            qualified,
            location: decl.name.range,
            owner: module,
            parent: Some(parent),
            types: Vec::new(),
            constants: Vec::new(),
            namespaces: Vec::new(),
        });
        self.ctx.modules[module].namespaces.push(ns);
        self.ctx.namespaces[parent].namespaces.push(ns);

        self.state
            .last_mut()
            .expect("a file build is in flight")
            .ns_stack
            .push(ns);
        for inner in &decl.decls {
            self.build_decl(inner);
        }
        self.state
            .last_mut()
            .expect("a file build is in flight")
            .ns_stack
            .pop();
    }

    #[allow(clippy::too_many_arguments)]
    fn build_aggregate(
        &mut self,
        kind: AggregateKind,
        name: &ast::Identifier,
        custom_tag: Option<Symbol>,
        base: Option<&ast::TypeRef>,
        type_params: &[ast::Identifier],
        fields: &[ast::Field],
        annotations: &[ast::Annotation],
    ) {
        let module = self.current_module();
        let scope = self.current_ns();
        let qualified = self.qualify(name.text);

        let ty = self.ctx.types.push(Type {
            name: name.text,
            qualified: qualified.clone(),
            location: name.range,
            owner: module,
            scope,
            annotations: Vec::new(),
            kind: kind.empty(),
        });
        // visible in its own body, so self-referential fields resolve
        self.ctx.namespaces[scope].types.push(ty);

        let base_ty = base.and_then(|base| self.require_type_ref(base, Some(ty)));

        let mut translated = self.translate_annotations(annotations);
        if let Some(tag) = custom_tag {
            translated.push(self.customtag_annotation(tag, name.range));
        }
        self.ctx.types[ty].annotations = translated;

        // Build generics before fields, as fields might refer to one.
        let mut generics = Vec::new();
        for param in type_params {
            let param_qualified = format!("{qualified}.{}", self.symbol_text(param.text));
            let generic = self.ctx.types.push(Type {
                name: param.text,
                qualified: param_qualified,
                location: param.range,
                owner: module,
                scope,
                annotations: Vec::new(),
                kind: TypeKind::Generic { parent: ty },
            });
            generics.push(generic);
            self.ctx.modules[module].types.push(generic);
        }
        if let Some(aggregate) = aggregate_mut(&mut self.ctx.types[ty].kind) {
            aggregate.base = base_ty;
            aggregate.generics = generics;
        }

        for field in fields {
            let built = self.build_field(field, ty);
            if let Some(aggregate) = aggregate_mut(&mut self.ctx.types[ty].kind) {
                aggregate.fields.push(built);
            }
        }

        self.ctx.modules[module].types.push(ty);
    }

    fn build_field(&mut self, field: &ast::Field, owner: TypeId) -> Field {
        let ty = self.require_type_ref(&field.ty, Some(owner));
        let default = field
            .default
            .as_ref()
            .map(|literal| self.translate_literal(literal, ty, Some(owner)));
        let annotations = self.translate_annotations(&field.annotations);
        Field {
            name: field.name.text,
            location: field.name.range,
            ty,
            default,
            annotations,
        }
    }

    fn build_enum(&mut self, decl: &ast::EnumDecl) {
        let module = self.current_module();
        let scope = self.current_ns();
        let qualified = self.qualify(decl.name.text);

        let ty = self.ctx.types.push(Type {
            name: decl.name.text,
            qualified,
            location: decl.name.range,
            owner: module,
            scope,
            annotations: Vec::new(),
            kind: TypeKind::Enum { items: Vec::new() },
        });
        self.ctx.namespaces[scope].types.push(ty);

        // The base type is resolved for diagnostics and availability but not
        // recorded; the schema carries items only.
        if let Some(base) = &decl.base {
            let _ = self.require_type_ref(base, Some(ty));
        }

        let mut translated = self.translate_annotations(&decl.annotations);
        if let Some(tag) = decl.custom_tag {
            translated.push(self.customtag_annotation(tag, decl.name.range));
        }
        self.ctx.types[ty].annotations = translated;

        for item in &decl.items {
            let annotations = self.translate_annotations(&item.annotations);
            let built = EnumItem {
                name: item.name.text,
                location: item.name.range,
                value: item.value,
                annotations,
            };
            if let TypeKind::Enum { items } = &mut self.ctx.types[ty].kind {
                items.push(built);
            }
        }

        self.ctx.modules[module].types.push(ty);
    }

    fn build_alias(&mut self, decl: &ast::AliasDecl) {
        let module = self.current_module();
        let scope = self.current_ns();
        let qualified = self.qualify(decl.name.text);

        let ty = self.ctx.types.push(Type {
            name: decl.name.text,
            qualified,
            location: decl.name.range,
            owner: module,
            scope,
            annotations: Vec::new(),
            kind: TypeKind::Alias { target: None },
        });
        self.ctx.namespaces[scope].types.push(ty);

        let target = decl
            .target
            .as_ref()
            .and_then(|target| self.require_type_ref(target, Some(ty)));
        if let TypeKind::Alias { target: slot } = &mut self.ctx.types[ty].kind {
            *slot = target;
        }

        let mut translated = self.translate_annotations(&decl.annotations);
        if let Some(tag) = decl.custom_tag {
            translated.push(self.customtag_annotation(tag, decl.name.range));
        }
        self.ctx.types[ty].annotations = translated;

        self.ctx.modules[module].types.push(ty);
    }

    fn build_constant(&mut self, decl: &ast::ConstantDecl) {
        let module = self.current_module();
        let scope = self.current_ns();
        let qualified = self.qualify(decl.name.text);

        let ty = self.require_type_ref(&decl.ty, None);
        let value = self.translate_literal(&decl.value, ty, None);
        let mut annotations = self.translate_annotations(&decl.annotations);
        if let Some(tag) = decl.custom_tag {
            annotations.push(self.customtag_annotation(tag, decl.name.range));
        }

        let constant = self.ctx.constants.push(Constant {
            name: decl.name.text,
            qualified,
            location: decl.name.range,
            owner: module,
            scope,
            ty,
            value,
            annotations,
        });
        self.ctx.modules[module].constants.push(constant);
        self.ctx.namespaces[scope].constants.push(constant);
    }

    // ---- name resolution ----

    /// Resolve a qualified id by walking scopes from innermost to outermost.
    /// Successful resolutions are memoized per file in flight; resolving to
    /// a type makes it available in the current module.
    pub(crate) fn resolve(
        &mut self,
        id: &ast::QualifiedId,
        scope: Option<TypeId>,
    ) -> Option<Resolve> {
        let key = (scope, id.symbols().collect::<Vec<_>>());
        if let Some(&cached) = self.top().resolve_cache.get(&key) {
            return Some(cached);
        }

        let components = &id.components[..];
        let result = match scope {
            Some(ty) => self.find_from_type(components, ty),
            None => {
                let module = self.current_module();
                self.find_from_module(components, module)
            }
        };

        if let Some(resolved) = result {
            self.state
                .last_mut()
                .expect("a file build is in flight")
                .resolve_cache
                .insert(key, resolved);
            if let Resolve::Type(ty) = resolved {
                self.make_available(ty);
            }
        }
        result
    }

    /// Names local to a type: enum items and generic type parameters.
    fn find_local_type(&mut self, components: &[ast::Identifier], ty: TypeId) -> Option<Resolve> {
        if components.len() != 1 {
            return None;
        }
        let name = components[0].text;
        match &self.ctx.types[ty].kind {
            TypeKind::Enum { items } => items
                .iter()
                .position(|item| item.name == name)
                .map(|index| Resolve::EnumItem(ty, index as u32)),
            TypeKind::Struct(aggregate)
            | TypeKind::Union(aggregate)
            | TypeKind::Attribute(aggregate) => aggregate
                .generics
                .iter()
                .copied()
                .find(|&generic| self.ctx.types[generic].name == name)
                .map(Resolve::Type),
            _ => None,
        }
    }

    /// Direct children of a namespace. With components to spare, candidates
    /// are tried in turn and the longest successful walk wins, so a
    /// namespace does not shadow a same-named type.
    fn find_local_ns(&mut self, components: &[ast::Identifier], ns: NamespaceId) -> Option<Resolve> {
        let first = components[0].text;

        if components.len() == 1 {
            let namespaces = self.ctx.namespaces[ns].namespaces.clone();
            for child in namespaces {
                if self.ctx.namespaces[child].name == first {
                    return Some(Resolve::Namespace(child));
                }
            }
            let types = self.ctx.namespaces[ns].types.clone();
            for ty in types {
                if self.ctx.types[ty].name == first {
                    self.make_available(ty);
                    return Some(Resolve::Type(ty));
                }
            }
            let constants = self.ctx.namespaces[ns].constants.clone();
            for constant in constants {
                if self.ctx.constants[constant].name == first {
                    return Some(Resolve::Constant(constant));
                }
            }
            None
        } else {
            let rest = &components[1..];
            let namespaces = self.ctx.namespaces[ns].namespaces.clone();
            for child in namespaces {
                if self.ctx.namespaces[child].name == first {
                    if let Some(resolved) = self.find_local_ns(rest, child) {
                        return Some(resolved);
                    }
                }
            }
            let types = self.ctx.namespaces[ns].types.clone();
            for ty in types {
                if self.ctx.types[ty].name == first {
                    if let Some(resolved) = self.find_local_type(rest, ty) {
                        self.make_available(ty);
                        return Some(resolved);
                    }
                }
            }
            None
        }
    }

    fn find_from_type(&mut self, components: &[ast::Identifier], ty: TypeId) -> Option<Resolve> {
        if let Some(resolved) = self.find_local_type(components, ty) {
            return Some(resolved);
        }
        let scope = self.ctx.types[ty].scope;
        self.find_from_namespace(components, scope)
    }

    fn find_from_namespace(
        &mut self,
        components: &[ast::Identifier],
        ns: NamespaceId,
    ) -> Option<Resolve> {
        if let Some(resolved) = self.find_local_ns(components, ns) {
            return Some(resolved);
        }
        match self.ctx.namespaces[ns].parent {
            Some(parent) => self.find_from_namespace(components, parent),
            None => {
                let owner = self.ctx.namespaces[ns].owner;
                self.find_from_module(components, owner)
            }
        }
    }

    fn find_from_module(
        &mut self,
        components: &[ast::Identifier],
        module: ModuleId,
    ) -> Option<Resolve> {
        let root = self.ctx.modules[module].root;
        if let Some(resolved) = self.find_local_ns(components, root) {
            return Some(resolved);
        }

        let imports = self.ctx.modules[module].imports.clone();
        for import in imports {
            let import_root = self.ctx.modules[import].root;
            if let Some(resolved) = self.find_local_ns(components, import_root) {
                return Some(resolved);
            }
        }

        // primitives fall through to the core module
        if let Some(core) = &self.core {
            let core_root = self.ctx.modules[core.module].root;
            if let Some(resolved) = self.find_local_ns(components, core_root) {
                return Some(resolved);
            }
        }

        None
    }

    fn resolve_location(&self, resolved: Resolve) -> Option<FileRange> {
        match resolved {
            Resolve::Type(ty) => Some(self.ctx.types[ty].location),
            Resolve::Constant(constant) => Some(self.ctx.constants[constant].location),
            Resolve::Namespace(ns) => Some(self.ctx.namespaces[ns].location),
            Resolve::EnumItem(ty, index) => {
                self.ctx.enum_item(ty, index).map(|item| item.location)
            }
        }
    }

    // ---- type construction ----

    /// Resolve a syntactic type reference to an interned schema type,
    /// reporting failures.
    pub(crate) fn require_type_ref(
        &mut self,
        type_ref: &ast::TypeRef,
        scope: Option<TypeId>,
    ) -> Option<TypeId> {
        match &type_ref.kind {
            ast::TypeRefKind::TypeName => {
                let typeid = self.core().typeid;
                Some(self.make_available(typeid))
            }
            ast::TypeRefKind::Name(name) => match self.resolve(name, scope) {
                Some(Resolve::Type(ty)) => Some(ty),
                Some(other) => {
                    let display = self.display_qualified(name);
                    let declared = self.resolve_location(other);
                    self.report(CompileMessage::DoesNotNameType {
                        range: name.range(),
                        name: display,
                        declared,
                    });
                    None
                }
                None => {
                    let display = self.display_type_ref(type_ref);
                    self.report(CompileMessage::TypeNotFound {
                        range: type_ref.range,
                        name: display,
                    });
                    None
                }
            },
            ast::TypeRefKind::Pointer(inner) => {
                let to = self.require_type_ref(inner, scope)?;
                Some(self.pointer_type(to, type_ref.range))
            }
            ast::TypeRefKind::Array(inner, size) => {
                let of = self.require_type_ref(inner, scope)?;
                Some(self.array_type(of, *size, type_ref.range))
            }
            ast::TypeRefKind::Generic(base, args) => {
                let base_ty = self.require_type_ref(base, scope)?;
                let mut arg_tys = Vec::with_capacity(args.len());
                for arg in args {
                    arg_tys.push(self.require_type_ref(arg, scope)?);
                }
                Some(self.specialized_type(base_ty, arg_tys, type_ref.range))
            }
        }
    }

    /// Pointer-of-T, constructed lazily on first reference.
    fn pointer_type(&mut self, to: TypeId, range: FileRange) -> TypeId {
        if let Some(&existing) = self.pointer_types.get(&to) {
            return self.make_available(existing);
        }

        let module = self.current_module();
        let name_text = format!("{}*", self.symbol_text(self.ctx.types[to].name));
        let name = self.interner.get_or_intern(&name_text);
        let qualified = format!("{}*", self.ctx.types[to].qualified);
        let scope = self.ctx.types[to].scope;

        let ty = self.ctx.types.push(Type {
            name,
            qualified,
            location: range,
            owner: module,
            scope,
            annotations: Vec::new(),
            kind: TypeKind::Pointer { to },
        });
        self.ctx.modules[module].types.push(ty);
        self.pointer_types.insert(to, ty);
        ty
    }

    /// Array-of-T, keyed on (element, optional fixed size).
    fn array_type(&mut self, of: TypeId, size: Option<i64>, range: FileRange) -> TypeId {
        if let Some(&existing) = self.array_types.get(&(of, size)) {
            return self.make_available(existing);
        }

        let module = self.current_module();
        let suffix = match size {
            Some(size) => format!("[{size}]"),
            None => "[]".to_owned(),
        };
        let name_text = format!("{}{suffix}", self.symbol_text(self.ctx.types[of].name));
        let name = self.interner.get_or_intern(&name_text);
        let qualified = format!("{}{suffix}", self.ctx.types[of].qualified);
        let scope = self.ctx.types[of].scope;

        let ty = self.ctx.types.push(Type {
            name,
            qualified,
            location: range,
            owner: module,
            scope,
            annotations: Vec::new(),
            kind: TypeKind::Array { of, size },
        });
        self.ctx.modules[module].types.push(ty);
        self.array_types.insert((of, size), ty);
        ty
    }

    /// Specialization-of-G<Ts>, keyed on the base identity and the ordered
    /// argument identities.
    fn specialized_type(&mut self, base: TypeId, args: Vec<TypeId>, range: FileRange) -> TypeId {
        let key = (base, args.clone());
        if let Some(&existing) = self.specialized_types.get(&key) {
            return self.make_available(existing);
        }

        let module = self.current_module();
        let arg_list = args
            .iter()
            .map(|&arg| self.ctx.types[arg].qualified.clone())
            .collect::<Vec<_>>()
            .join(",");
        let name_text = format!(
            "{}<{arg_list}>",
            self.symbol_text(self.ctx.types[base].name)
        );
        let name = self.interner.get_or_intern(&name_text);
        let qualified = format!("{}<{arg_list}>", self.ctx.types[base].qualified);
        let scope = self.ctx.types[base].scope;

        let ty = self.ctx.types.push(Type {
            name,
            qualified,
            location: range,
            owner: module,
            scope,
            annotations: Vec::new(),
            kind: TypeKind::Specialized { base, args },
        });
        self.ctx.modules[module].types.push(ty);
        self.specialized_types.insert(key, ty);
        ty
    }

    // ---- make-available ----

    /// Add a type owned by another module — and, recursively, each of its
    /// component types — to the current module's type list, exactly once.
    pub(crate) fn make_available(&mut self, ty: TypeId) -> TypeId {
        let Some(state) = self.state.last_mut() else {
            return ty;
        };
        let module = state.module;
        if self.ctx.types[ty].owner == module {
            return ty;
        }
        if !state.imported.insert(ty) {
            return ty;
        }
        self.ctx.modules[module].types.push(ty);

        let mut deps = Vec::new();
        {
            let entry = &self.ctx.types[ty];
            collect_annotation_deps(&entry.annotations, &mut deps);
            match &entry.kind {
                TypeKind::Struct(aggregate)
                | TypeKind::Union(aggregate)
                | TypeKind::Attribute(aggregate) => {
                    if let Some(base) = aggregate.base {
                        deps.push(base);
                    }
                    deps.extend(aggregate.generics.iter().copied());
                    for field in &aggregate.fields {
                        if let Some(field_ty) = field.ty {
                            deps.push(field_ty);
                        }
                        if let Some(default) = &field.default {
                            collect_value_deps(default, &mut deps);
                        }
                        collect_annotation_deps(&field.annotations, &mut deps);
                    }
                }
                TypeKind::Enum { items } => {
                    for item in items {
                        collect_annotation_deps(&item.annotations, &mut deps);
                    }
                }
                TypeKind::Alias { target } => {
                    if let Some(target) = target {
                        deps.push(*target);
                    }
                }
                TypeKind::Pointer { to } => deps.push(*to),
                TypeKind::Array { of, .. } => deps.push(*of),
                TypeKind::Generic { parent } => deps.push(*parent),
                TypeKind::Specialized { base, args } => {
                    deps.push(*base);
                    deps.extend(args.iter().copied());
                }
                TypeKind::Primitive | TypeKind::TypeId => {}
            }
        }
        for dep in deps {
            self.make_available(dep);
        }
        ty
    }

    // ---- literal and annotation translation ----

    /// Translate an AST literal to a schema value. Identifier literals
    /// resolve first against the expected type when it is an enum, then
    /// through normal scope resolution.
    fn translate_literal(
        &mut self,
        literal: &ast::Literal,
        expected: Option<TypeId>,
        scope: Option<TypeId>,
    ) -> Value {
        let location = literal.range;
        match &literal.kind {
            ast::LiteralKind::Null => Value {
                location,
                kind: ValueKind::Null,
            },
            ast::LiteralKind::Bool(value) => Value {
                location,
                kind: ValueKind::Bool(*value),
            },
            ast::LiteralKind::Int(value) => Value {
                location,
                kind: ValueKind::Int(*value),
            },
            ast::LiteralKind::String(value) => Value {
                location,
                kind: ValueKind::String(value.clone()),
            },
            ast::LiteralKind::List(elements) => {
                let element_expected = expected.and_then(|expected| {
                    match &self.ctx.types[expected].kind {
                        TypeKind::Array { of, .. } => Some(*of),
                        _ => None,
                    }
                });
                let values = elements
                    .iter()
                    .map(|element| self.translate_literal(element, element_expected, scope))
                    .collect();
                Value {
                    location,
                    kind: ValueKind::List(values),
                }
            }
            ast::LiteralKind::Id(id) => {
                if let Some(expected_ty) = expected {
                    if id.components.len() == 1 {
                        if let TypeKind::Enum { items } = &self.ctx.types[expected_ty].kind {
                            let name = id.components[0].text;
                            if let Some(index) = items.iter().position(|item| item.name == name) {
                                self.make_available(expected_ty);
                                return Value {
                                    location,
                                    kind: ValueKind::Enum(expected_ty, index as u32),
                                };
                            }
                        }
                    }
                }

                match self.resolve(id, scope) {
                    None => {
                        let name = self.display_qualified(id);
                        self.report(CompileMessage::NameNotFound {
                            range: location,
                            name,
                        });
                        Value {
                            location,
                            kind: ValueKind::Null,
                        }
                    }
                    Some(Resolve::Type(ty)) => Value {
                        location,
                        kind: ValueKind::Type(ty),
                    },
                    Some(Resolve::EnumItem(ty, index)) => {
                        self.make_available(ty);
                        Value {
                            location,
                            kind: ValueKind::Enum(ty, index),
                        }
                    }
                    // constants are inlined by value
                    Some(Resolve::Constant(constant)) => self.ctx.constants[constant].value.clone(),
                    Some(Resolve::Namespace(ns)) => {
                        let name = self.display_qualified(id);
                        let declared = self.ctx.namespaces[ns].location;
                        self.report(CompileMessage::NamespaceAsValue {
                            range: location,
                            name,
                            declared,
                        });
                        Value {
                            location,
                            kind: ValueKind::Null,
                        }
                    }
                }
            }
        }
    }

    fn translate_annotations(&mut self, annotations: &[ast::Annotation]) -> Vec<Annotation> {
        annotations
            .iter()
            .map(|annotation| self.translate_annotation(annotation))
            .collect()
    }

    /// Bind an attribute usage: resolve the attribute, bind positional
    /// arguments, and fill missing trailing arguments from field defaults.
    fn translate_annotation(&mut self, annotation: &ast::Annotation) -> Annotation {
        let location = annotation.name.range();

        let attribute = match self.resolve(&annotation.name, None) {
            None => {
                let name = self.display_qualified(&annotation.name);
                self.report(CompileMessage::AttributeNotFound {
                    range: location,
                    name,
                });
                return Annotation {
                    attribute: None,
                    location,
                    args: Vec::new(),
                };
            }
            Some(Resolve::Type(ty)) => ty,
            Some(other) => {
                let name = self.display_qualified(&annotation.name);
                let declared = self.resolve_location(other);
                self.report(CompileMessage::DoesNotNameType {
                    range: location,
                    name,
                    declared,
                });
                return Annotation {
                    attribute: None,
                    location,
                    args: Vec::new(),
                };
            }
        };

        if !matches!(self.ctx.types[attribute].kind, TypeKind::Attribute(_)) {
            let name = self.display_qualified(&annotation.name);
            let declared = self.ctx.types[attribute].location;
            self.report(CompileMessage::NotAnAttribute {
                range: location,
                name,
                declared,
            });
            return Annotation {
                attribute: Some(attribute),
                location,
                args: Vec::new(),
            };
        }

        let params: Vec<(Symbol, Option<TypeId>, Option<Value>)> =
            match &self.ctx.types[attribute].kind {
                TypeKind::Attribute(aggregate) => aggregate
                    .fields
                    .iter()
                    .map(|field| (field.name, field.ty, field.default.clone()))
                    .collect(),
                _ => Vec::new(),
            };

        let attribute_name = self.ctx.types[attribute].qualified.clone();
        let declared = self.ctx.types[attribute].location;

        if annotation.args.len() > params.len() {
            self.report(CompileMessage::TooManyArguments {
                range: location,
                attribute: attribute_name,
                expected: params.len(),
                found: annotation.args.len(),
                declared,
            });
            return Annotation {
                attribute: Some(attribute),
                location,
                args: Vec::new(),
            };
        }

        let mut args = Vec::with_capacity(params.len());
        for (index, (param_name, param_ty, param_default)) in params.iter().enumerate() {
            if index < annotation.args.len() {
                args.push(self.translate_literal(&annotation.args[index], *param_ty, None));
            } else if let Some(default) = param_default {
                args.push(default.clone());
            } else {
                let parameter = self.symbol_text(*param_name);
                self.report(CompileMessage::MissingArgument {
                    range: location,
                    attribute: attribute_name.clone(),
                    parameter,
                    declared,
                });
                args.push(Value {
                    location,
                    kind: ValueKind::Null,
                });
            }
        }

        Annotation {
            attribute: Some(attribute),
            location,
            args,
        }
    }

    /// The synthesized `$sapc.customtag("tag")` annotation appended to
    /// custom-tagged declarations.
    fn customtag_annotation(&mut self, tag: Symbol, range: FileRange) -> Annotation {
        let customtag = self.core().customtag;
        self.make_available(customtag);
        let text = self.symbol_text(tag);
        Annotation {
            attribute: Some(customtag),
            location: range,
            args: vec![Value {
                location: range,
                kind: ValueKind::String(text),
            }],
        }
    }
}

#[derive(Debug, Copy, Clone)]
enum AggregateKind {
    Struct,
    Union,
    Attribute,
}

impl AggregateKind {
    fn empty(self) -> TypeKind {
        match self {
            AggregateKind::Struct => TypeKind::Struct(Aggregate::default()),
            AggregateKind::Union => TypeKind::Union(Aggregate::default()),
            AggregateKind::Attribute => TypeKind::Attribute(Aggregate::default()),
        }
    }
}

fn aggregate_mut(kind: &mut TypeKind) -> Option<&mut Aggregate> {
    match kind {
        TypeKind::Struct(aggregate)
        | TypeKind::Union(aggregate)
        | TypeKind::Attribute(aggregate) => Some(aggregate),
        _ => None,
    }
}

fn collect_annotation_deps(annotations: &[Annotation], deps: &mut Vec<TypeId>) {
    for annotation in annotations {
        if let Some(attribute) = annotation.attribute {
            deps.push(attribute);
        }
        for arg in &annotation.args {
            collect_value_deps(arg, deps);
        }
    }
}

fn collect_value_deps(value: &Value, deps: &mut Vec<TypeId>) {
    match &value.kind {
        ValueKind::Type(ty) => deps.push(*ty),
        ValueKind::Enum(ty, _) => deps.push(*ty),
        ValueKind::List(values) => {
            for value in values {
                collect_value_deps(value, deps);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    struct Compiled {
        ctx: Context,
        interner: Interner,
        root: Option<ModuleId>,
        messages: Vec<Message>,
        dependencies: Vec<PathBuf>,
    }

    impl Compiled {
        fn root(&self) -> ModuleId {
            self.root.expect("compilation reached the root module")
        }

        fn find_type(&self, qualified: &str) -> TypeId {
            self.ctx
                .types
                .iter_enumerated()
                .find(|(_, ty)| ty.qualified == qualified)
                .map(|(id, _)| id)
                .unwrap_or_else(|| panic!("no type named `{qualified}`"))
        }

        fn field_type(&self, aggregate: &str, field: &str) -> TypeId {
            let ty = self.find_type(aggregate);
            let aggregate = self.ctx.types[ty]
                .kind
                .as_aggregate()
                .expect("an aggregate type");
            let field = aggregate
                .fields
                .iter()
                .find(|candidate| self.interner.resolve(candidate.name) == Some(field))
                .expect("the field exists");
            field.ty.expect("the field's type resolved")
        }
    }

    fn compile(sources: &[(&str, &str)]) -> Compiled {
        let mut ctx = Context::new();
        let mut files = Files::new();
        let mut interner = Interner::new();
        let mut resolver = MemoryResolver::new();
        for (path, source) in sources {
            resolver = resolver.with(*path, *source);
        }
        let (root, messages, dependencies) = {
            let mut compiler =
                Compiler::new(&mut ctx, &mut files, &mut interner, &resolver, &[]);
            let root = compiler.compile(Path::new(sources[0].0));
            let (messages, dependencies) = compiler.finish();
            (root, messages, dependencies)
        };
        Compiled {
            ctx,
            interner,
            root,
            messages,
            dependencies,
        }
    }

    fn compile_ok(sources: &[(&str, &str)]) -> Compiled {
        let compiled = compile(sources);
        assert!(
            !Message::any_errors(&compiled.messages),
            "unexpected errors: {:?}",
            compiled.messages
        );
        compiled
    }

    use crate::resolver::MemoryResolver;

    #[test]
    fn pointer_and_array_types_are_interned() {
        let compiled = compile_ok(&[(
            "m.sap",
            "module m; struct S { int* a; int* b; int[] c; int[] d; int[4] e; }",
        )]);

        assert_eq!(compiled.field_type("S", "a"), compiled.field_type("S", "b"));
        assert_eq!(compiled.field_type("S", "c"), compiled.field_type("S", "d"));
        // a sized array is a different type from an unsized one
        assert_ne!(compiled.field_type("S", "c"), compiled.field_type("S", "e"));

        let module = &compiled.ctx.modules[compiled.root()];
        let pointers = module
            .types
            .iter()
            .filter(|&&ty| matches!(compiled.ctx.types[ty].kind, TypeKind::Pointer { .. }))
            .count();
        assert_eq!(pointers, 1);
    }

    #[test]
    fn specializations_are_interned_by_argument_tuple() {
        let compiled = compile_ok(&[(
            "m.sap",
            "module m; struct List<T> { T[] items; } struct U { List<int> a; List<int> b; List<bool> c; }",
        )]);

        assert_eq!(compiled.field_type("U", "a"), compiled.field_type("U", "b"));
        assert_ne!(compiled.field_type("U", "a"), compiled.field_type("U", "c"));

        let spec = compiled.field_type("U", "a");
        match &compiled.ctx.types[spec].kind {
            TypeKind::Specialized { base, args } => {
                assert_eq!(*base, compiled.find_type("List"));
                assert_eq!(args.len(), 1);
            }
            other => panic!("expected a specialization, got {other:?}"),
        }
        assert_eq!(compiled.ctx.types[spec].qualified, "List<int>");
    }

    #[test]
    fn generic_parameters_resolve_only_inside_their_aggregate() {
        let compiled = compile(&[(
            "m.sap",
            "module m; struct Box<T> { T value; } struct Loose { T value; }",
        )]);
        assert!(Message::any_errors(&compiled.messages));
        assert!(compiled.messages.iter().any(|message| matches!(
            message,
            Message::Compile(CompileMessage::TypeNotFound { .. })
        )));
    }

    #[test]
    fn module_type_list_is_closed_and_duplicate_free() {
        let compiled = compile_ok(&[
            ("m.sap", "module m; import lib; struct S { Wrapped w; }"),
            (
                "lib.sap",
                "module lib; struct Inner { int x; } struct Wrapped { Inner* inner; }",
            ),
        ]);

        let module = &compiled.ctx.modules[compiled.root()];

        let mut seen = FxHashSet::default();
        for &ty in &module.types {
            assert!(seen.insert(ty), "type list contains a duplicate");
        }

        // closure: every component of every listed type is itself listed
        for &ty in &module.types {
            let mut deps = Vec::new();
            let entry = &compiled.ctx.types[ty];
            collect_annotation_deps(&entry.annotations, &mut deps);
            match &entry.kind {
                TypeKind::Struct(aggregate)
                | TypeKind::Union(aggregate)
                | TypeKind::Attribute(aggregate) => {
                    if let Some(base) = aggregate.base {
                        deps.push(base);
                    }
                    deps.extend(aggregate.generics.iter().copied());
                    for field in &aggregate.fields {
                        deps.extend(field.ty);
                    }
                }
                TypeKind::Alias { target } => deps.extend(*target),
                TypeKind::Pointer { to } => deps.push(*to),
                TypeKind::Array { of, .. } => deps.push(*of),
                TypeKind::Specialized { base, args } => {
                    deps.push(*base);
                    deps.extend(args.iter().copied());
                }
                _ => {}
            }
            for dep in deps {
                assert!(
                    seen.contains(&dep),
                    "`{}` is referenced but not in the module type list",
                    compiled.ctx.types[dep].qualified
                );
            }
        }
    }

    #[test]
    fn import_cycles_terminate() {
        let compiled = compile_ok(&[
            ("a.sap", "module a; import b; struct A { B* other; }"),
            ("b.sap", "module b; import a; struct B { int x; }"),
        ]);

        let root = &compiled.ctx.modules[compiled.root()];
        assert_eq!(root.imports.len(), 1);
        assert_eq!(compiled.dependencies.len(), 2);

        let mut seen = FxHashSet::default();
        for &ty in &root.types {
            assert!(seen.insert(ty));
        }
    }

    #[test]
    fn enum_defaults_bind_to_items() {
        let compiled = compile_ok(&[(
            "m.sap",
            "module m; enum E { A, B = 3, C } struct S { E e = B; }",
        )]);

        let e = compiled.find_type("E");
        let field = compiled.field_type("S", "e");
        assert_eq!(field, e);

        let s = compiled.find_type("S");
        let aggregate = compiled.ctx.types[s].kind.as_aggregate().unwrap();
        match &aggregate.fields[0].default {
            Some(Value {
                kind: ValueKind::Enum(parent, index),
                ..
            }) => {
                assert_eq!(*parent, e);
                let item = compiled.ctx.enum_item(*parent, *index).unwrap();
                assert_eq!(compiled.interner.resolve(item.name), Some("B"));
                assert_eq!(item.value, 3);
            }
            other => panic!("expected an enum default, got {other:?}"),
        }
    }

    #[test]
    fn attribute_defaults_fill_missing_arguments() {
        let compiled = compile_ok(&[(
            "m.sap",
            "module m; attribute Doc { string text = \"tbd\"; } [Doc] struct S {}",
        )]);

        let s = compiled.find_type("S");
        let annotations = &compiled.ctx.types[s].annotations;
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].args.len(), 1);
        assert!(matches!(
            &annotations[0].args[0].kind,
            ValueKind::String(text) if text == "tbd"
        ));
    }

    #[test]
    fn missing_argument_without_default_is_an_error() {
        let compiled = compile(&[(
            "m.sap",
            "module m; attribute Doc { string text; } [Doc] struct S {}",
        )]);
        assert!(compiled.messages.iter().any(|message| matches!(
            message,
            Message::Compile(CompileMessage::MissingArgument { .. })
        )));
    }

    #[test]
    fn custom_tag_appends_core_annotation() {
        let compiled = compile_ok(&[(
            "m.sap",
            "module m; attribute Doc { string text; } [Doc(\"d\")] use entity : struct; [Doc(\"x\")] entity E {}",
        )]);

        let e = compiled.find_type("E");
        let annotations = &compiled.ctx.types[e].annotations;
        // own annotation, the use declaration's annotation, then the
        // synthesized customtag annotation
        assert_eq!(annotations.len(), 3);
        let last = annotations.last().unwrap();
        let attribute = last.attribute.expect("bound");
        assert_eq!(compiled.ctx.types[attribute].qualified, "$sapc.customtag");
        assert!(matches!(
            &last.args[0].kind,
            ValueKind::String(tag) if tag == "entity"
        ));
    }

    #[test]
    fn constants_are_inlined_by_value() {
        let compiled = compile_ok(&[(
            "m.sap",
            "module m; const int WIDTH = 640; const int DOUBLE = WIDTH;",
        )]);

        let double = compiled
            .ctx
            .constants
            .iter()
            .find(|constant| compiled.interner.resolve(constant.name) == Some("DOUBLE"))
            .expect("the constant exists");
        assert!(matches!(double.value.kind, ValueKind::Int(640)));
    }

    #[test]
    fn namespaces_nest_and_qualify() {
        let compiled = compile_ok(&[(
            "m.sap",
            "module m; namespace outer { namespace inner { struct S { int x; } } struct T { inner.S s; } }",
        )]);

        let s = compiled.find_type("outer.inner.S");
        assert_eq!(compiled.field_type("outer.T", "s"), s);

        let ns = compiled
            .ctx
            .namespaces
            .iter()
            .find(|ns| ns.qualified == "outer.inner")
            .expect("the namespace exists");
        assert_eq!(ns.types.len(), 1);
    }

    #[test]
    fn qualified_names_reach_across_imports() {
        let compiled = compile_ok(&[
            ("m.sap", "module m; import lib; struct S { ns.T t; }"),
            ("lib.sap", "module lib; namespace ns { struct T { int x; } }"),
        ]);
        let t = compiled.find_type("ns.T");
        assert_eq!(compiled.field_type("S", "t"), t);
    }

    #[test]
    fn typename_fields_use_the_core_typeid() {
        let compiled = compile_ok(&[(
            "m.sap",
            "module m; attribute Meta { typename target; }",
        )]);
        let field = compiled.field_type("Meta", "target");
        assert!(matches!(compiled.ctx.types[field].kind, TypeKind::TypeId));
        assert_eq!(compiled.ctx.types[field].qualified, "$sapc.typeid");
        // made available in the using module
        let module = &compiled.ctx.modules[compiled.root()];
        assert!(module.types.contains(&field));
    }

    #[test]
    fn resolving_twice_hits_the_cache() {
        let compiled = compile_ok(&[(
            "m.sap",
            "module m; struct A { int x; } struct B { A a; A b; }",
        )]);
        let a = compiled.find_type("A");
        assert_eq!(compiled.field_type("B", "a"), a);
        assert_eq!(compiled.field_type("B", "b"), a);
    }
}

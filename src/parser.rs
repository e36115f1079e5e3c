//! A recursive-descent parser for the `sap` language.
//!
//! Single pass, one token of lookahead, no backtracking. Produces one
//! [`ModuleUnit`] per file. The parser is created by the compiler
//! ([`crate::compiler::Compiler`]) and calls back into it on `import`, so
//! custom tags declared by imported modules are registered before any
//! declaration that uses them is parsed.

use std::path::PathBuf;

use fxhash::FxHashMap;

use crate::ast::{
    AliasDecl, Annotation, AttributeDecl, ConstantDecl, CustomTagDecl, Declaration, EnumDecl,
    EnumItem, Field, Identifier, ImportDecl, Literal, LiteralKind, ModuleDecl, ModuleUnit,
    NamespaceDecl, QualifiedId, StructDecl, TagKind, TypeRef, TypeRefKind, UnionDecl,
};
use crate::compiler::Compiler;
use crate::files::FileId;
use crate::lexer::{Token, TokenKind};
use crate::reporting::ParseMessage;
use crate::source::FileRange;
use crate::Symbol;

/// A registered custom tag: which keyword it stands for, and the
/// annotations of its `use` declaration (cloned onto every declaration the
/// tag introduces).
#[derive(Clone)]
struct CustomTag {
    kind: TagKind,
    annotations: Vec<Annotation>,
}

/// Which declarations are legal at the current nesting level.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ScopeKind {
    Module,
    Namespace,
}

pub struct Parser<'comp, 'ctx> {
    comp: &'comp mut Compiler<'ctx>,
    file_id: FileId,
    filename: PathBuf,
    tokens: Vec<Token>,
    pos: usize,
    module_name: Option<Identifier>,
    custom_tags: FxHashMap<Symbol, CustomTag>,
}

impl<'comp, 'ctx> Parser<'comp, 'ctx> {
    pub(crate) fn new(
        comp: &'comp mut Compiler<'ctx>,
        file_id: FileId,
        filename: PathBuf,
        tokens: Vec<Token>,
    ) -> Parser<'comp, 'ctx> {
        assert!(
            matches!(tokens.last(), Some(token) if token.kind == TokenKind::Eof),
            "token stream must end with Eof"
        );
        Parser {
            comp,
            file_id,
            filename,
            tokens,
            pos: 0,
            module_name: None,
            custom_tags: FxHashMap::default(),
        }
    }

    pub(crate) fn parse_unit(mut self) -> Option<ModuleUnit> {
        let start = self.peek().range;
        let decls = self.parse_scope(ScopeKind::Module, &TokenKind::Eof, start)?;

        let Some(name) = self.module_name.clone() else {
            let range = self.peek().range;
            self.report(ParseMessage::MissingModule { range });
            return None;
        };

        Some(ModuleUnit {
            filename: self.filename,
            file_id: self.file_id,
            name,
            decls,
        })
    }

    // ---- token plumbing ----

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn prev_range(&self) -> FileRange {
        self.tokens[self.pos.saturating_sub(1)].range
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn at(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            return true;
        }
        false
    }

    fn expect_token(&mut self, kind: &TokenKind) -> Option<Token> {
        if self.at(kind) {
            return Some(self.advance());
        }
        self.error_expected(kind.description())
    }

    fn expect(&mut self, kind: &TokenKind) -> Option<()> {
        self.expect_token(kind).map(|_| ())
    }

    fn expect_ident(&mut self) -> Option<Identifier> {
        if let TokenKind::Ident(text) = self.peek().kind {
            let range = self.peek().range;
            self.advance();
            return Some(Identifier { text, range });
        }
        self.error_expected("identifier")
    }

    fn expect_int(&mut self) -> Option<i64> {
        if let TokenKind::Int(value) = self.peek().kind {
            self.advance();
            return Some(value);
        }
        self.error_expected("integer literal")
    }

    fn report(&mut self, message: ParseMessage) {
        self.comp.report(message);
    }

    /// Report "expected X, found Y" at the current token. Always `None`, so
    /// callers can `return self.error_expected(...)`.
    fn error_expected<T>(&mut self, expected: &str) -> Option<T> {
        let range = self.peek().range;
        let found = self.peek().kind.description();
        self.report(ParseMessage::UnexpectedToken {
            range,
            expected: expected.to_owned(),
            found,
        });
        None
    }

    // ---- declarations ----

    fn parse_scope(
        &mut self,
        scope: ScopeKind,
        terminator: &TokenKind,
        opener: FileRange,
    ) -> Option<Vec<Declaration>> {
        let mut decls = Vec::new();

        loop {
            if self.eat(terminator) {
                break;
            }

            // stray semicolons after type bodies are tolerated
            if self.eat(&TokenKind::Semi) {
                continue;
            }

            if self.at(&TokenKind::Eof) {
                let range = self.peek().range;
                self.report(ParseMessage::UnexpectedEof { range, opener });
                return None;
            }

            if self.at(&TokenKind::Unknown) {
                let range = self.peek().range;
                self.report(ParseMessage::UnexpectedInput { range });
                return None;
            }

            if self.at(&TokenKind::KeywordImport) {
                let keyword = self.advance();
                let allowed = scope == ScopeKind::Module;
                if !allowed {
                    self.report(ParseMessage::DeclarationNotAllowed {
                        range: keyword.range,
                        what: "`import`",
                    });
                }
                let target = self.expect_ident()?;
                self.expect(&TokenKind::Semi)?;
                // Imported custom tags must be known before any use site, so
                // the imported file is parsed right away.
                self.harvest_import(&target);
                if allowed {
                    decls.push(Declaration::Import(ImportDecl { target }));
                }
                continue;
            }

            if self.at(&TokenKind::KeywordAttribute) {
                let keyword = self.advance();
                let allowed = scope == ScopeKind::Module;
                if !allowed {
                    self.report(ParseMessage::DeclarationNotAllowed {
                        range: keyword.range,
                        what: "`attribute`",
                    });
                }
                let decl = self.parse_attribute()?;
                if allowed {
                    decls.push(Declaration::Attribute(decl));
                }
                continue;
            }

            // optionally build up a list of annotations
            let annotations = self.parse_annotations()?;

            if self.at(&TokenKind::KeywordUse) {
                let keyword = self.advance();
                let allowed = scope == ScopeKind::Module;
                if !allowed {
                    self.report(ParseMessage::DeclarationNotAllowed {
                        range: keyword.range,
                        what: "`use`",
                    });
                }
                let decl = self.parse_custom_tag(annotations)?;
                self.register_custom_tag(&decl);
                if allowed {
                    decls.push(Declaration::CustomTag(decl));
                }
                continue;
            }

            if self.eat(&TokenKind::KeywordNamespace) {
                // annotations before a namespace are accepted and dropped
                let name = self.expect_ident()?;
                self.expect(&TokenKind::LBrace)?;
                let inner = self.parse_scope(ScopeKind::Namespace, &TokenKind::RBrace, name.range)?;
                decls.push(Declaration::Namespace(NamespaceDecl { name, decls: inner }));
                continue;
            }

            if self.at(&TokenKind::KeywordModule) {
                let keyword = self.advance();
                let allowed = scope == ScopeKind::Module;
                if !allowed {
                    self.report(ParseMessage::DeclarationNotAllowed {
                        range: keyword.range,
                        what: "`module`",
                    });
                }
                let name = self.expect_ident()?;
                self.expect(&TokenKind::Semi)?;
                if allowed {
                    if self.module_name.is_none() {
                        self.module_name = Some(name.clone());
                    }
                    decls.push(Declaration::Module(ModuleDecl { name, annotations }));
                }
                continue;
            }

            if self.eat(&TokenKind::KeywordConst) {
                decls.push(self.parse_constant(annotations, None)?);
                continue;
            }

            if self.eat(&TokenKind::KeywordUnion) {
                decls.push(self.parse_union(annotations, None)?);
                continue;
            }

            if self.eat(&TokenKind::KeywordUsing) {
                decls.push(self.parse_alias(annotations, None)?);
                continue;
            }

            if self.eat(&TokenKind::KeywordStruct) {
                decls.push(self.parse_struct(annotations, None)?);
                continue;
            }

            if self.eat(&TokenKind::KeywordEnum) {
                decls.push(self.parse_enum(annotations, None)?);
                continue;
            }

            // custom-tagged declaration
            if let TokenKind::Ident(tag_name) = self.peek().kind {
                let range = self.peek().range;
                let Some(tag) = self.custom_tags.get(&tag_name).cloned() else {
                    let name = self.comp.symbol_text(tag_name);
                    self.report(ParseMessage::UnknownDeclaration { range, name });
                    return None;
                };
                self.advance();

                let mut annotations = annotations;
                annotations.extend(tag.annotations.iter().cloned());
                let custom = Some(tag_name);
                let decl = match tag.kind {
                    TagKind::Struct => self.parse_struct(annotations, custom)?,
                    TagKind::Union => self.parse_union(annotations, custom)?,
                    TagKind::Enum => self.parse_enum(annotations, custom)?,
                    TagKind::Alias => self.parse_alias(annotations, custom)?,
                    TagKind::Constant => self.parse_constant(annotations, custom)?,
                };
                decls.push(decl);
                continue;
            }

            return self.error_expected("a declaration");
        }

        Some(decls)
    }

    fn parse_attribute(&mut self) -> Option<AttributeDecl> {
        let name = self.expect_ident()?;
        let mut fields = Vec::new();
        if self.eat(&TokenKind::LBrace) {
            while !self.eat(&TokenKind::RBrace) {
                if self.at(&TokenKind::Eof) {
                    let range = self.peek().range;
                    self.report(ParseMessage::UnexpectedEof {
                        range,
                        opener: name.range,
                    });
                    return None;
                }
                fields.push(self.parse_field()?);
            }
        } else {
            self.expect(&TokenKind::Semi)?;
        }
        Some(AttributeDecl { name, fields })
    }

    fn parse_custom_tag(&mut self, annotations: Vec<Annotation>) -> Option<CustomTagDecl> {
        let name = self.expect_ident()?;
        self.expect(&TokenKind::Colon)?;
        let kind = match self.peek().kind {
            TokenKind::KeywordStruct => TagKind::Struct,
            TokenKind::KeywordUnion => TagKind::Union,
            TokenKind::KeywordEnum => TagKind::Enum,
            TokenKind::KeywordUsing => TagKind::Alias,
            TokenKind::KeywordConst => TagKind::Constant,
            _ => {
                return self
                    .error_expected("one of `struct`, `union`, `enum`, `using`, `const`")
            }
        };
        self.advance();
        self.expect(&TokenKind::Semi)?;
        Some(CustomTagDecl {
            name,
            kind,
            annotations,
        })
    }

    fn parse_struct(
        &mut self,
        annotations: Vec<Annotation>,
        custom_tag: Option<Symbol>,
    ) -> Option<Declaration> {
        let name = self.expect_ident()?;
        let type_params = self.parse_type_params()?;
        let base = if self.eat(&TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let fields = self.parse_field_block(&name)?;
        Some(Declaration::Struct(StructDecl {
            name,
            custom_tag,
            base,
            type_params,
            fields,
            annotations,
        }))
    }

    fn parse_union(
        &mut self,
        annotations: Vec<Annotation>,
        custom_tag: Option<Symbol>,
    ) -> Option<Declaration> {
        let name = self.expect_ident()?;
        let type_params = self.parse_type_params()?;
        let fields = self.parse_field_block(&name)?;
        Some(Declaration::Union(UnionDecl {
            name,
            custom_tag,
            type_params,
            fields,
            annotations,
        }))
    }

    fn parse_alias(
        &mut self,
        annotations: Vec<Annotation>,
        custom_tag: Option<Symbol>,
    ) -> Option<Declaration> {
        let name = self.expect_ident()?;
        let target = if self.eat(&TokenKind::Equals) {
            Some(self.parse_type()?)
        } else {
            None
        };
        self.expect(&TokenKind::Semi)?;
        Some(Declaration::Alias(AliasDecl {
            name,
            custom_tag,
            target,
            annotations,
        }))
    }

    fn parse_enum(
        &mut self,
        annotations: Vec<Annotation>,
        custom_tag: Option<Symbol>,
    ) -> Option<Declaration> {
        let name = self.expect_ident()?;
        let base = if self.eat(&TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        self.expect(&TokenKind::LBrace)?;

        let mut items = Vec::new();
        let mut next_value = 0i64;
        loop {
            let item_annotations = self.parse_annotations()?;
            let item_name = self.expect_ident()?;
            let mut value = next_value;
            if self.eat(&TokenKind::Equals) {
                value = self.expect_int()?;
            }
            next_value = value.wrapping_add(1);
            items.push(EnumItem {
                name: item_name,
                value,
                annotations: item_annotations,
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;

        Some(Declaration::Enum(EnumDecl {
            name,
            custom_tag,
            base,
            items,
            annotations,
        }))
    }

    fn parse_constant(
        &mut self,
        annotations: Vec<Annotation>,
        custom_tag: Option<Symbol>,
    ) -> Option<Declaration> {
        let ty = self.parse_type()?;
        let name = self.expect_ident()?;
        self.expect(&TokenKind::Equals)?;
        let value = self.parse_literal()?;
        self.expect(&TokenKind::Semi)?;
        Some(Declaration::Constant(ConstantDecl {
            name,
            custom_tag,
            ty,
            value,
            annotations,
        }))
    }

    fn parse_type_params(&mut self) -> Option<Vec<Identifier>> {
        let mut params = Vec::new();
        if self.eat(&TokenKind::Lt) {
            params.push(self.expect_ident()?);
            while self.eat(&TokenKind::Comma) {
                params.push(self.expect_ident()?);
            }
            self.expect(&TokenKind::Gt)?;
        }
        Some(params)
    }

    fn parse_field_block(&mut self, name: &Identifier) -> Option<Vec<Field>> {
        self.expect(&TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while !self.eat(&TokenKind::RBrace) {
            if self.at(&TokenKind::Eof) {
                let range = self.peek().range;
                self.report(ParseMessage::UnexpectedEof {
                    range,
                    opener: name.range,
                });
                return None;
            }
            fields.push(self.parse_field()?);
        }
        Some(fields)
    }

    fn parse_field(&mut self) -> Option<Field> {
        let annotations = self.parse_annotations()?;
        let ty = self.parse_type()?;
        let name = self.expect_ident()?;
        let default = if self.eat(&TokenKind::Equals) {
            Some(self.parse_literal()?)
        } else {
            None
        };
        self.expect(&TokenKind::Semi)?;
        Some(Field {
            name,
            ty,
            annotations,
            default,
        })
    }

    // ---- types, names, literals, annotations ----

    fn parse_qualified_id(&mut self) -> Option<QualifiedId> {
        let mut components = vec![self.expect_ident()?];
        while self.eat(&TokenKind::Dot) {
            components.push(self.expect_ident()?);
        }
        Some(QualifiedId { components })
    }

    fn parse_type(&mut self) -> Option<TypeRef> {
        let mut ty = if self.at(&TokenKind::KeywordTypename) {
            let token = self.advance();
            TypeRef {
                range: token.range,
                kind: TypeRefKind::TypeName,
            }
        } else {
            let name = self.parse_qualified_id()?;
            let range = name.range();
            let mut ty = TypeRef {
                range,
                kind: TypeRefKind::Name(name),
            };
            if self.eat(&TokenKind::Lt) {
                let mut args = vec![self.parse_type()?];
                while self.eat(&TokenKind::Comma) {
                    args.push(self.parse_type()?);
                }
                let close = self.expect_token(&TokenKind::Gt)?;
                ty = TypeRef {
                    range: range.merge(&close.range),
                    kind: TypeRefKind::Generic(Box::new(ty), args),
                };
            }
            ty
        };

        if self.at(&TokenKind::Star) {
            let token = self.advance();
            ty = TypeRef {
                range: ty.range.merge(&token.range),
                kind: TypeRefKind::Pointer(Box::new(ty)),
            };
        }

        if self.eat(&TokenKind::LBracket) {
            let size = if let TokenKind::Int(size) = self.peek().kind {
                self.advance();
                Some(size)
            } else {
                None
            };
            let close = self.expect_token(&TokenKind::RBracket)?;
            ty = TypeRef {
                range: ty.range.merge(&close.range),
                kind: TypeRefKind::Array(Box::new(ty), size),
            };
        }

        Some(ty)
    }

    fn parse_literal(&mut self) -> Option<Literal> {
        let range = self.peek().range;
        match self.peek().kind.clone() {
            TokenKind::KeywordNull => {
                self.advance();
                Some(Literal {
                    range,
                    kind: LiteralKind::Null,
                })
            }
            TokenKind::KeywordTrue => {
                self.advance();
                Some(Literal {
                    range,
                    kind: LiteralKind::Bool(true),
                })
            }
            TokenKind::KeywordFalse => {
                self.advance();
                Some(Literal {
                    range,
                    kind: LiteralKind::Bool(false),
                })
            }
            TokenKind::Str(text) => {
                self.advance();
                Some(Literal {
                    range,
                    kind: LiteralKind::String(text),
                })
            }
            TokenKind::Int(value) => {
                self.advance();
                Some(Literal {
                    range,
                    kind: LiteralKind::Int(value),
                })
            }
            TokenKind::Ident(_) => {
                let id = self.parse_qualified_id()?;
                Some(Literal {
                    range: id.range(),
                    kind: LiteralKind::Id(id),
                })
            }
            TokenKind::LBrace => {
                self.advance();
                let mut values = Vec::new();
                if !self.eat(&TokenKind::RBrace) {
                    loop {
                        values.push(self.parse_literal()?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(&TokenKind::RBrace)?;
                }
                Some(Literal {
                    range: range.merge(&self.prev_range()),
                    kind: LiteralKind::List(values),
                })
            }
            _ => self.error_expected("a literal"),
        }
    }

    /// Parse any number of `[...]` annotation groups.
    fn parse_annotations(&mut self) -> Option<Vec<Annotation>> {
        let mut annotations = Vec::new();
        while self.at(&TokenKind::LBracket) {
            self.advance();
            loop {
                let name = self.parse_qualified_id()?;
                let mut args = Vec::new();
                if self.eat(&TokenKind::LParen) {
                    if !self.eat(&TokenKind::RParen) {
                        loop {
                            args.push(self.parse_literal()?);
                            if !self.eat(&TokenKind::Comma) {
                                break;
                            }
                        }
                        self.expect(&TokenKind::RParen)?;
                    }
                }
                annotations.push(Annotation { name, args });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RBracket)?;
        }
        Some(annotations)
    }

    // ---- custom tags ----

    fn register_custom_tag(&mut self, decl: &CustomTagDecl) {
        self.custom_tags
            .entry(decl.name.text)
            .or_insert_with(|| CustomTag {
                kind: decl.kind,
                annotations: decl.annotations.clone(),
            });
    }

    fn harvest_import(&mut self, target: &Identifier) {
        let base_dir = self
            .filename
            .parent()
            .map(|parent| parent.to_path_buf())
            .unwrap_or_default();
        if let Some(unit) = self.comp.import_unit(target, &base_dir) {
            for decl in &unit.decls {
                if let Declaration::CustomTag(tag) = decl {
                    self.register_custom_tag(tag);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::ast::{Declaration, LiteralKind, TypeRefKind, UnitRc};
    use crate::compiler::Compiler;
    use crate::files::Files;
    use crate::reporting::{Message, ParseMessage};
    use crate::resolver::MemoryResolver;
    use crate::schema::Context;
    use crate::Interner;

    fn parse(source: &str) -> (Option<UnitRc>, Vec<Message>, Interner) {
        let mut ctx = Context::new();
        let mut files = Files::new();
        let mut interner = Interner::new();
        let resolver = MemoryResolver::new().with("m.sap", source);
        let mut compiler = Compiler::new(&mut ctx, &mut files, &mut interner, &resolver, &[]);
        let unit = compiler.parse_file(Path::new("m.sap"));
        let (messages, _) = compiler.finish();
        (unit, messages, interner)
    }

    fn parse_ok(source: &str) -> (UnitRc, Interner) {
        let (unit, messages, interner) = parse(source);
        assert!(messages.is_empty(), "unexpected messages: {messages:?}");
        (unit.expect("parse succeeds"), interner)
    }

    #[test]
    fn minimal_module() {
        let (unit, interner) = parse_ok("module m;");
        assert_eq!(interner.resolve(unit.name.text), Some("m"));
        assert_eq!(unit.decls.len(), 1);
        assert!(matches!(unit.decls[0], Declaration::Module(_)));
    }

    #[test]
    fn missing_module_declaration_fails() {
        let (unit, messages, _) = parse("struct S {}");
        assert!(unit.is_none());
        assert!(messages
            .iter()
            .any(|message| matches!(message, Message::Parse(ParseMessage::MissingModule { .. }))));
    }

    #[test]
    fn struct_with_base_generics_and_defaults() {
        let (unit, interner) = parse_ok(
            "module m;\nstruct Pair<K, V> : Base {\n  K key;\n  V value;\n  int count = 1;\n}\n",
        );
        let decl = unit
            .decls
            .iter()
            .find_map(|decl| match decl {
                Declaration::Struct(decl) => Some(decl),
                _ => None,
            })
            .expect("a struct declaration");
        assert_eq!(interner.resolve(decl.name.text), Some("Pair"));
        assert_eq!(decl.type_params.len(), 2);
        assert!(decl.base.is_some());
        assert_eq!(decl.fields.len(), 3);
        assert!(matches!(
            decl.fields[2].default,
            Some(crate::ast::Literal {
                kind: LiteralKind::Int(1),
                ..
            })
        ));
    }

    #[test]
    fn enum_values_auto_increment() {
        let (unit, _) = parse_ok("module m; enum E { A, B = 3, C }");
        let decl = unit
            .decls
            .iter()
            .find_map(|decl| match decl {
                Declaration::Enum(decl) => Some(decl),
                _ => None,
            })
            .expect("an enum declaration");
        let values: Vec<i64> = decl.items.iter().map(|item| item.value).collect();
        assert_eq!(values, vec![0, 3, 4]);
    }

    #[test]
    fn type_suffixes_nest() {
        let (unit, _) = parse_ok("module m; struct S { int*[8] xs; List<int> ys; }");
        let decl = unit
            .decls
            .iter()
            .find_map(|decl| match decl {
                Declaration::Struct(decl) => Some(decl),
                _ => None,
            })
            .expect("a struct declaration");
        match &decl.fields[0].ty.kind {
            TypeRefKind::Array(inner, Some(8)) => {
                assert!(matches!(inner.kind, TypeRefKind::Pointer(_)));
            }
            other => panic!("expected sized array of pointer, got {other:?}"),
        }
        assert!(matches!(
            decl.fields[1].ty.kind,
            TypeRefKind::Generic(_, ref args) if args.len() == 1
        ));
    }

    #[test]
    fn import_disallowed_inside_namespace() {
        let (_, messages, _) = parse("module m; namespace n { import other; }");
        assert!(messages.iter().any(|message| matches!(
            message,
            Message::Parse(ParseMessage::DeclarationNotAllowed { what: "`import`", .. })
        )));
    }

    #[test]
    fn custom_tag_introduces_struct() {
        let (unit, interner) = parse_ok(
            "module m;\nattribute Doc { string text; }\n[Doc(\"tagged\")] use entity : struct;\nentity E { int id; }\n",
        );
        let decl = unit
            .decls
            .iter()
            .find_map(|decl| match decl {
                Declaration::Struct(decl) => Some(decl),
                _ => None,
            })
            .expect("the tagged declaration parses as a struct");
        assert_eq!(interner.resolve(decl.name.text), Some("E"));
        assert_eq!(
            decl.custom_tag.and_then(|tag| interner.resolve(tag).map(str::to_owned)),
            Some("entity".to_owned())
        );
        // the use declaration's annotations are cloned onto the struct
        assert_eq!(decl.annotations.len(), 1);
    }

    #[test]
    fn unknown_custom_tag_is_an_error() {
        let (unit, messages, _) = parse("module m; entity E {}");
        assert!(unit.is_none());
        assert!(messages.iter().any(|message| matches!(
            message,
            Message::Parse(ParseMessage::UnknownDeclaration { .. })
        )));
    }

    #[test]
    fn unexpected_eof_reports_opener() {
        let (unit, messages, _) = parse("module m; struct S {");
        assert!(unit.is_none());
        assert!(messages.iter().any(|message| matches!(
            message,
            Message::Parse(ParseMessage::UnexpectedEof { .. })
        )));
    }

    #[test]
    fn annotation_groups_accumulate() {
        let (unit, _) = parse_ok(
            "module m;\nattribute A; attribute B { int n = 0; }\n[A][B(2)] struct S {}\n",
        );
        let decl = unit
            .decls
            .iter()
            .find_map(|decl| match decl {
                Declaration::Struct(decl) => Some(decl),
                _ => None,
            })
            .expect("a struct declaration");
        assert_eq!(decl.annotations.len(), 2);
        assert!(matches!(
            decl.annotations[1].args[0].kind,
            LiteralKind::Int(2)
        ));
    }
}

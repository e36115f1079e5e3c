//! Diagnostic messages produced by the compiler phases.
//!
//! Each phase accumulates typed message values; these convert to
//! [`Diagnostic`]s to be rendered against the file database. Related
//! source locations ("declared here", "first declared here") are secondary
//! labels on the same diagnostic so they always render immediately after the
//! error they annotate.

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};

use crate::files::FileId;
use crate::source::FileRange;

#[derive(Debug, Clone)]
pub enum Message {
    Lexer(LexerMessage),
    Parse(ParseMessage),
    Compile(CompileMessage),
    Validate(ValidateMessage),
}

impl From<LexerMessage> for Message {
    fn from(message: LexerMessage) -> Self {
        Message::Lexer(message)
    }
}

impl From<ParseMessage> for Message {
    fn from(message: ParseMessage) -> Self {
        Message::Parse(message)
    }
}

impl From<CompileMessage> for Message {
    fn from(message: CompileMessage) -> Self {
        Message::Compile(message)
    }
}

impl From<ValidateMessage> for Message {
    fn from(message: ValidateMessage) -> Self {
        Message::Validate(message)
    }
}

impl Message {
    pub fn severity(&self) -> Severity {
        match self {
            Message::Validate(ValidateMessage::ModuleNameMismatch { .. }) => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity() >= Severity::Error
    }

    /// True if any message in the slice is an error (warnings don't count).
    pub fn any_errors(messages: &[Message]) -> bool {
        messages.iter().any(Message::is_error)
    }

    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        match self {
            Message::Lexer(message) => message.to_diagnostic(),
            Message::Parse(message) => message.to_diagnostic(),
            Message::Compile(message) => message.to_diagnostic(),
            Message::Validate(message) => message.to_diagnostic(),
        }
    }
}

fn primary(range: &FileRange) -> Label<FileId> {
    Label::primary(range.file_id(), *range)
}

fn secondary(range: &FileRange, message: impl Into<String>) -> Label<FileId> {
    Label::secondary(range.file_id(), *range).with_message(message)
}

#[derive(Debug, Clone)]
pub enum LexerMessage {
    UnexpectedCharacter { range: FileRange },
    UnterminatedString { range: FileRange },
    InvalidEscape { range: FileRange },
    UnterminatedComment { range: FileRange },
    BareMinus { range: FileRange },
    IntegerOverflow { range: FileRange },
}

impl LexerMessage {
    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        match self {
            LexerMessage::UnexpectedCharacter { range } => Diagnostic::error()
                .with_message("unexpected character")
                .with_labels(vec![primary(range)]),
            LexerMessage::UnterminatedString { range } => Diagnostic::error()
                .with_message("unterminated string literal")
                .with_labels(vec![primary(range).with_message("string starts here")]),
            LexerMessage::InvalidEscape { range } => Diagnostic::error()
                .with_message("invalid escape sequence")
                .with_labels(vec![primary(range)])
                .with_notes(vec![r"supported escapes are `\\` and `\n`".to_owned()]),
            LexerMessage::UnterminatedComment { range } => Diagnostic::error()
                .with_message("unterminated block comment")
                .with_labels(vec![primary(range).with_message("comment starts here")]),
            LexerMessage::BareMinus { range } => Diagnostic::error()
                .with_message("expected digits after `-`")
                .with_labels(vec![primary(range)]),
            LexerMessage::IntegerOverflow { range } => Diagnostic::error()
                .with_message("integer literal out of range")
                .with_labels(vec![primary(range)]),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ParseMessage {
    UnexpectedToken {
        range: FileRange,
        expected: String,
        found: &'static str,
    },
    UnexpectedEof {
        range: FileRange,
        opener: FileRange,
    },
    UnexpectedInput {
        range: FileRange,
    },
    DeclarationNotAllowed {
        range: FileRange,
        what: &'static str,
    },
    UnknownDeclaration {
        range: FileRange,
        name: String,
    },
    MissingModule {
        range: FileRange,
    },
}

impl ParseMessage {
    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        match self {
            ParseMessage::UnexpectedToken {
                range,
                expected,
                found,
            } => Diagnostic::error()
                .with_message(format!("expected {expected}, found {found}"))
                .with_labels(vec![primary(range).with_message(format!("expected {expected}"))]),
            ParseMessage::UnexpectedEof { range, opener } => Diagnostic::error()
                .with_message("unexpected end of file")
                .with_labels(vec![
                    primary(range),
                    secondary(opener, "unclosed scope started here"),
                ]),
            ParseMessage::UnexpectedInput { range } => Diagnostic::error()
                .with_message("unexpected input")
                .with_labels(vec![primary(range)]),
            ParseMessage::DeclarationNotAllowed { range, what } => Diagnostic::error()
                .with_message(format!("{what} declarations are not allowed here"))
                .with_labels(vec![primary(range)])
                .with_notes(vec![format!(
                    "{what} declarations may only appear at module scope"
                )]),
            ParseMessage::UnknownDeclaration { range, name } => Diagnostic::error()
                .with_message(format!("unexpected identifier `{name}`"))
                .with_labels(vec![primary(range)])
                .with_notes(vec![
                    "expected a declaration or a registered custom tag".to_owned()
                ]),
            ParseMessage::MissingModule { range } => Diagnostic::error()
                .with_message("missing module declaration")
                .with_labels(vec![primary(range)]),
        }
    }
}

#[derive(Debug, Clone)]
pub enum CompileMessage {
    ReadFailed {
        path: String,
        error: String,
    },
    ModuleNotFound {
        range: FileRange,
        name: String,
    },
    TypeNotFound {
        range: FileRange,
        name: String,
    },
    DoesNotNameType {
        range: FileRange,
        name: String,
        declared: Option<FileRange>,
    },
    AttributeNotFound {
        range: FileRange,
        name: String,
    },
    NotAnAttribute {
        range: FileRange,
        name: String,
        declared: FileRange,
    },
    TooManyArguments {
        range: FileRange,
        attribute: String,
        expected: usize,
        found: usize,
        declared: FileRange,
    },
    MissingArgument {
        range: FileRange,
        attribute: String,
        parameter: String,
        declared: FileRange,
    },
    NameNotFound {
        range: FileRange,
        name: String,
    },
    NamespaceAsValue {
        range: FileRange,
        name: String,
        declared: FileRange,
    },
}

impl CompileMessage {
    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        match self {
            CompileMessage::ReadFailed { path, error } => Diagnostic::error()
                .with_message(format!("couldn't read `{path}`: {error}")),
            CompileMessage::ModuleNotFound { range, name } => Diagnostic::error()
                .with_message(format!("module `{name}` not found"))
                .with_labels(vec![primary(range)]),
            CompileMessage::TypeNotFound { range, name } => Diagnostic::error()
                .with_message(format!("type `{name}` not found"))
                .with_labels(vec![primary(range)]),
            CompileMessage::DoesNotNameType {
                range,
                name,
                declared,
            } => {
                let mut labels = vec![primary(range)];
                if let Some(declared) = declared {
                    labels.push(secondary(declared, format!("`{name}` declared here")));
                }
                Diagnostic::error()
                    .with_message(format!("`{name}` does not name a type"))
                    .with_labels(labels)
            }
            CompileMessage::AttributeNotFound { range, name } => Diagnostic::error()
                .with_message(format!("attribute `{name}` not found"))
                .with_labels(vec![primary(range)]),
            CompileMessage::NotAnAttribute {
                range,
                name,
                declared,
            } => Diagnostic::error()
                .with_message(format!("`{name}` is not an attribute"))
                .with_labels(vec![
                    primary(range),
                    secondary(declared, format!("`{name}` declared here")),
                ]),
            CompileMessage::TooManyArguments {
                range,
                attribute,
                expected,
                found,
                declared,
            } => Diagnostic::error()
                .with_message(format!(
                    "too many arguments for attribute `{attribute}`; expected {expected}, found {found}"
                ))
                .with_labels(vec![
                    primary(range),
                    secondary(declared, "attribute declared here"),
                ]),
            CompileMessage::MissingArgument {
                range,
                attribute,
                parameter,
                declared,
            } => Diagnostic::error()
                .with_message(format!(
                    "missing argument `{parameter}` for attribute `{attribute}`"
                ))
                .with_labels(vec![
                    primary(range),
                    secondary(declared, "attribute declared here"),
                ]),
            CompileMessage::NameNotFound { range, name } => Diagnostic::error()
                .with_message(format!("`{name}` not found"))
                .with_labels(vec![primary(range)]),
            CompileMessage::NamespaceAsValue {
                range,
                name,
                declared,
            } => Diagnostic::error()
                .with_message(format!(
                    "`{name}` names a namespace; a type, constant, or enumerant is required"
                ))
                .with_labels(vec![
                    primary(range),
                    secondary(declared, "namespace declared here"),
                ]),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ValidateMessage {
    MissingModuleName {
        range: FileRange,
    },
    ModuleNameMismatch {
        range: FileRange,
        name: String,
        stem: String,
    },
    DuplicateField {
        range: FileRange,
        name: String,
        ty: String,
        first: FileRange,
    },
    AnnotationArity {
        range: FileRange,
        attribute: String,
        expected: usize,
        found: usize,
    },
    TypenameField {
        range: FileRange,
        field: String,
        ty: String,
    },
}

impl ValidateMessage {
    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        match self {
            ValidateMessage::MissingModuleName { range } => Diagnostic::error()
                .with_message("module name is missing")
                .with_labels(vec![primary(range)]),
            ValidateMessage::ModuleNameMismatch { range, name, stem } => Diagnostic::warning()
                .with_message(format!(
                    "module name `{name}` does not match filename `{stem}`"
                ))
                .with_labels(vec![primary(range)]),
            ValidateMessage::DuplicateField {
                range,
                name,
                ty,
                first,
            } => Diagnostic::error()
                .with_message(format!("duplicate field `{name}` in `{ty}`"))
                .with_labels(vec![
                    primary(range),
                    secondary(first, format!("first declaration of field `{name}`")),
                ]),
            ValidateMessage::AnnotationArity {
                range,
                attribute,
                expected,
                found,
            } => Diagnostic::error()
                .with_message(format!(
                    "annotation of `{attribute}` has {found} arguments, expected {expected}"
                ))
                .with_labels(vec![primary(range)]),
            ValidateMessage::TypenameField { range, field, ty } => Diagnostic::error()
                .with_message(format!(
                    "field `{field}` in `{ty}` uses `typename` outside an attribute"
                ))
                .with_labels(vec![primary(range)]),
        }
    }
}

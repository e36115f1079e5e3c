//! Top-level driver: owns the file database and interner, runs the
//! pipeline phases, and renders diagnostics.

use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};

use codespan_reporting::diagnostic::Severity;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{BufferedStandardStream, ColorChoice, WriteColor};

use crate::compiler::Compiler;
use crate::files::Files;
use crate::json;
use crate::reporting::Message;
use crate::resolver::ModuleResolver;
use crate::schema::{Context, ModuleId};
use crate::validate;
use crate::Interner;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Status {
    Success,
    UsageError,
    CompileError,
    WriteError,
    ValidateError,
}

impl Status {
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Success => 0,
            Status::UsageError => 1,
            Status::CompileError => 2,
            Status::WriteError => 3,
            Status::ValidateError => 4,
        }
    }
}

/// The result of one `compile` run: the schema context, the root module (if
/// compilation got that far), the compiled-file list, and the diagnostics.
pub struct Compilation {
    pub context: Context,
    pub root: Option<ModuleId>,
    pub dependencies: Vec<PathBuf>,
    pub messages: Vec<Message>,
}

pub struct Driver {
    files: Files,
    interner: Interner,
    codespan_config: term::Config,
    diagnostic_writer: RefCell<Box<dyn WriteColor>>,
    error_count: usize,
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver {
    pub fn new() -> Driver {
        Driver {
            files: Files::new(),
            interner: Interner::new(),
            codespan_config: term::Config::default(),
            diagnostic_writer: RefCell::new(Box::new(BufferedStandardStream::stderr(
                if atty::is(atty::Stream::Stderr) {
                    ColorChoice::Auto
                } else {
                    ColorChoice::Never
                },
            ))),
            error_count: 0,
        }
    }

    /// Set the writer to use when rendering diagnostics.
    pub fn set_diagnostic_writer(&mut self, stream: impl 'static + WriteColor) {
        self.diagnostic_writer = RefCell::new(Box::new(stream) as Box<dyn WriteColor>);
    }

    /// Compile `input` and everything it imports.
    pub fn compile(
        &mut self,
        resolver: &dyn ModuleResolver,
        input: &Path,
        search_paths: &[PathBuf],
    ) -> Compilation {
        let mut context = Context::new();
        let mut compiler = Compiler::new(
            &mut context,
            &mut self.files,
            &mut self.interner,
            resolver,
            search_paths,
        );
        let root = compiler.compile(input);
        let (messages, dependencies) = compiler.finish();
        Compilation {
            context,
            root,
            dependencies,
            messages,
        }
    }

    /// Validate the root module of a clean compilation.
    pub fn validate(&self, compilation: &Compilation) -> Vec<Message> {
        match compilation.root {
            Some(root) => validate::validate(
                &compilation.context,
                root,
                &self.files,
                &self.interner,
            ),
            None => Vec::new(),
        }
    }

    /// Project the root module to a JSON value.
    pub fn to_json(&self, compilation: &Compilation) -> Option<serde_json::Value> {
        let root = compilation.root?;
        let document = json::project(&compilation.context, root, &self.files, &self.interner);
        Some(serde_json::to_value(document).expect("schema projection serializes"))
    }

    /// Project the root module to pretty-printed JSON text.
    pub fn to_json_string(&self, compilation: &Compilation) -> Option<String> {
        let root = compilation.root?;
        let document = json::project(&compilation.context, root, &self.files, &self.interner);
        Some(serde_json::to_string_pretty(&document).expect("schema projection serializes"))
    }

    /// Render messages against the file database, counting errors.
    pub fn emit(&mut self, messages: &[Message]) {
        for message in messages {
            let diagnostic = message.to_diagnostic();
            {
                let mut writer = self.diagnostic_writer.borrow_mut();
                term::emit(&mut **writer, &self.codespan_config, &self.files, &diagnostic)
                    .unwrap();
                writer.flush().unwrap();
            }
            if diagnostic.severity >= Severity::Error {
                self.error_count += 1;
            }
        }
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }
}

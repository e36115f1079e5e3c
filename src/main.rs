use std::path::{Path, PathBuf};

use clap::Parser;

use sapc::reporting::Message;
use sapc::resolver::FsResolver;
use sapc::{Driver, Status};

/// Compiler for the sap interface definition language
#[derive(Parser)]
#[clap(name = "sapc", version, about)]
struct Options {
    /// Add a search path for module imports (repeatable)
    #[clap(short = 'I', value_name = "PATH")]
    search: Vec<PathBuf>,
    /// Output JSON file (defaults to stdout)
    #[clap(short = 'o', long = "output", value_name = "PATH")]
    output: Option<PathBuf>,
    /// Emit a make-style dependency file naming all compiled sources
    #[clap(short = 'd', long = "deps", value_name = "PATH")]
    deps: Option<PathBuf>,
    /// The input sap IDL file
    #[clap(value_name = "INPUT")]
    input: PathBuf,
}

fn main() {
    let options = match Options::try_parse() {
        Ok(options) => options,
        Err(error) => {
            let code = match error.kind() {
                clap::ErrorKind::DisplayHelp | clap::ErrorKind::DisplayVersion => 0,
                _ => Status::UsageError.exit_code(),
            };
            let _ = error.print();
            std::process::exit(code);
        }
    };

    std::process::exit(run(&options).exit_code());
}

fn run(options: &Options) -> Status {
    let mut driver = Driver::new();
    let resolver = FsResolver;

    let compilation = driver.compile(&resolver, &options.input, &options.search);
    driver.emit(&compilation.messages);
    if compilation.root.is_none() || Message::any_errors(&compilation.messages) {
        return Status::CompileError;
    }

    let validation = driver.validate(&compilation);
    driver.emit(&validation);
    if Message::any_errors(&validation) {
        return Status::ValidateError;
    }

    let Some(json) = driver.to_json_string(&compilation) else {
        return Status::CompileError;
    };

    match &options.output {
        Some(path) => {
            if let Err(error) = std::fs::write(path, format!("{json}\n")) {
                eprintln!("error: failed to write `{}`: {error}", path.display());
                return Status::WriteError;
            }
        }
        None => println!("{json}"),
    }

    // The dependency file's make target is the output path, so it is only
    // written when both paths were given.
    if let (Some(deps_path), Some(output_path)) = (&options.deps, &options.output) {
        let text = dependency_file(output_path, &compilation.dependencies);
        if let Err(error) = std::fs::write(deps_path, text) {
            eprintln!("error: failed to write `{}`: {error}", deps_path.display());
            return Status::WriteError;
        }
    }

    Status::Success
}

/// Make-style dependency file: one entry per compiled source, in compile
/// order, continuation-escaped.
fn dependency_file(output: &Path, dependencies: &[PathBuf]) -> String {
    use std::fmt::Write;

    let mut text = String::new();
    let _ = write!(text, "{}: ", relative(output).display());
    let count = dependencies.len();
    for (index, dep) in dependencies.iter().enumerate() {
        if index != 0 {
            text.push_str("  ");
        }
        let _ = write!(text, "{} ", relative(dep).display());
        if index + 1 != count {
            text.push('\\');
        }
        text.push('\n');
    }
    text
}

fn relative(path: &Path) -> PathBuf {
    match std::env::current_dir() {
        Ok(cwd) => path
            .strip_prefix(&cwd)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_paths_accept_attached_and_separated_forms() {
        let options =
            Options::try_parse_from(["sapc", "-Ifoo", "-I", "bar", "--", "in.sap"]).unwrap();
        assert_eq!(
            options.search,
            vec![PathBuf::from("foo"), PathBuf::from("bar")]
        );
        assert_eq!(options.input, PathBuf::from("in.sap"));
    }

    #[test]
    fn output_and_deps_options() {
        let options =
            Options::try_parse_from(["sapc", "-o", "out.json", "--deps", "out.d", "m.sap"])
                .unwrap();
        assert_eq!(options.output, Some(PathBuf::from("out.json")));
        assert_eq!(options.deps, Some(PathBuf::from("out.d")));
    }

    #[test]
    fn input_is_required() {
        assert!(Options::try_parse_from(["sapc", "-o", "out.json"]).is_err());
    }

    #[test]
    fn dependency_file_format() {
        let text = dependency_file(
            Path::new("out.json"),
            &[PathBuf::from("m.sap"), PathBuf::from("lib.sap")],
        );
        assert_eq!(text, "out.json: m.sap \\\n  lib.sap \n");
    }

    #[test]
    fn single_dependency_has_no_continuation() {
        let text = dependency_file(Path::new("out.json"), &[PathBuf::from("m.sap")]);
        assert_eq!(text, "out.json: m.sap \n");
    }
}

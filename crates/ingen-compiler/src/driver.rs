//! The generation pipeline: locate, configure, load, collect, emit, format, write.

use std::fs;
use std::path::PathBuf;

use ingen_common::config::{self, ComparabilityPolicy, ConfigError};
use tracing::{debug, info};

use crate::codegen::Emitter;
use crate::loader::{GoPathLoader, LoadError, PackageLoader};
use crate::output::{
    write_atomic, BuiltinFormatter, CommandFormatter, FormatError, Formatter, WriteError,
};
use crate::semantic::{collect, CollectOptions, Collection};

/// What to do with the generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Replace the output file in the package directory.
    #[default]
    Write,
    /// Leave the disk alone; the caller prints the text.
    Stdout,
    /// Fail if the file on disk differs from what would be written.
    Check,
}

/// One generator run. Fields left `None` fall back to `ingen.toml`, then
/// to the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Package directory, or import path under `$GOPATH/src`.
    pub package: String,
    pub output: Option<String>,
    pub method: Option<String>,
    /// Overrides the configured policy with [`ComparabilityPolicy::Strict`].
    pub strict: bool,
    /// Added to the configured exclusions.
    pub exclude: Vec<String>,
    pub format_command: Option<Vec<String>>,
    pub mode: OutputMode,
}

impl GenerateOptions {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerateReport {
    /// Go package name from the package clause.
    pub package: String,
    pub dir: PathBuf,
    pub output_path: PathBuf,
    pub collection: Collection,
    /// The formatted file contents.
    pub text: String,
    /// Whether the file on disk was replaced.
    pub written: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("no package specified")]
    MissingPackage,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("{} is out of date", .path.display())]
    Stale { path: PathBuf },
}

/// Run the generator, finding packages through `GOPATH`.
pub fn generate(options: &GenerateOptions) -> Result<GenerateReport, GenerateError> {
    generate_with(options, &GoPathLoader::from_env())
}

/// Run the generator with a specific package loader.
pub fn generate_with(
    options: &GenerateOptions,
    loader: &dyn PackageLoader,
) -> Result<GenerateReport, GenerateError> {
    let id = options.package.trim();
    if id.is_empty() {
        return Err(GenerateError::MissingPackage);
    }

    let dir = loader.locate(id)?;
    let config = config::load_config(&dir)?;

    let output = options
        .output
        .clone()
        .unwrap_or(config.generate.output);
    config::validate_output(&output)?;
    let method = options
        .method
        .clone()
        .unwrap_or(config.generate.method);
    config::validate_method(&method)?;
    let policy = if options.strict {
        ComparabilityPolicy::Strict
    } else {
        config.generate.policy
    };
    let mut exclude = config.generate.exclude;
    exclude.extend(options.exclude.iter().cloned());
    let format_command = options
        .format_command
        .clone()
        .or(config.format.command);

    let package = loader.load(&dir, &output)?;
    debug!(
        package = %package.name,
        files = package.files.len(),
        ?policy,
        "loaded package"
    );

    let collection = collect(
        &package,
        &CollectOptions {
            method: method.clone(),
            policy,
            exclude,
        },
    );
    let raw = Emitter::new(&package.name, &method).emit(&collection.types);

    let output_path = dir.join(&output);
    let text = match &format_command {
        Some(argv) => CommandFormatter::new(argv)
            .ok_or(ConfigError::EmptyFormatCommand)?
            .format(&output_path, &raw)?,
        None => BuiltinFormatter.format(&output_path, &raw)?,
    };

    let written = match options.mode {
        OutputMode::Write => {
            write_atomic(&output_path, text.as_bytes())?;
            info!(
                path = %output_path.display(),
                types = collection.types.len(),
                "wrote generated file"
            );
            true
        }
        OutputMode::Check => {
            let current = fs::read_to_string(&output_path).ok();
            if current.as_deref() != Some(text.as_str()) {
                return Err(GenerateError::Stale { path: output_path });
            }
            info!(path = %output_path.display(), "generated file is up to date");
            false
        }
        OutputMode::Stdout => false,
    };

    Ok(GenerateReport {
        package: package.name,
        dir,
        output_path,
        collection,
        text,
        written,
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn package_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        for (name, text) in files {
            fs::write(tmp.path().join(name), text).unwrap();
        }
        tmp
    }

    fn options(dir: &Path) -> GenerateOptions {
        GenerateOptions::new(dir.display().to_string())
    }

    fn run(options: &GenerateOptions) -> Result<GenerateReport, GenerateError> {
        generate_with(options, &GoPathLoader::new(Vec::new()))
    }

    #[test]
    fn empty_package_id_is_rejected() {
        let err = run(&GenerateOptions::new("  ")).unwrap_err();
        assert!(matches!(err, GenerateError::MissingPackage));
    }

    #[test]
    fn writes_default_output_file() {
        let tmp = package_dir(&[("p.go", "package p\ntype ID int\n")]);
        let report = run(&options(tmp.path())).unwrap();
        assert!(report.written);
        assert_eq!(report.package, "p");
        assert_eq!(report.output_path, tmp.path().join("type_helpers.go"));
        let on_disk = fs::read_to_string(&report.output_path).unwrap();
        assert_eq!(on_disk, report.text);
        assert!(on_disk.contains("func (v ID) In(list ...ID) bool {"));
    }

    #[test]
    fn config_file_and_flags_are_merged() {
        let tmp = package_dir(&[
            ("p.go", "package p\ntype A int\ntype B int\ntype C func()\n"),
            (
                "ingen.toml",
                "[generate]\noutput = \"helpers_gen.go\"\nmethod = \"OneOf\"\nexclude = [\"A\"]\n",
            ),
        ]);
        let mut opts = options(tmp.path());
        opts.exclude.push("B".into());
        opts.strict = true;
        let report = run(&opts).unwrap();
        assert_eq!(report.output_path, tmp.path().join("helpers_gen.go"));
        assert!(report.collection.types.is_empty());
        assert_eq!(report.collection.skipped.len(), 3);

        opts.method = Some("Among".into());
        opts.strict = false;
        let report = run(&opts).unwrap();
        assert!(report.text.contains("func (v C) Among(list ...C) bool {"));
    }

    #[test]
    fn invalid_method_flag_is_config_error() {
        let tmp = package_dir(&[("p.go", "package p\n")]);
        let mut opts = options(tmp.path());
        opts.method = Some("not valid".into());
        assert!(matches!(
            run(&opts),
            Err(GenerateError::Config(ConfigError::InvalidMethod(_)))
        ));
    }

    #[test]
    fn previous_output_is_not_parsed() {
        let tmp = package_dir(&[
            ("p.go", "package p\ntype ID int\n"),
            ("type_helpers.go", "this is not go"),
        ]);
        run(&options(tmp.path())).unwrap();
        // Running twice is stable.
        let first = fs::read_to_string(tmp.path().join("type_helpers.go")).unwrap();
        run(&options(tmp.path())).unwrap();
        let second = fs::read_to_string(tmp.path().join("type_helpers.go")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn check_mode_detects_stale_output() {
        let tmp = package_dir(&[("p.go", "package p\ntype ID int\n")]);
        let mut opts = options(tmp.path());
        opts.mode = OutputMode::Check;
        assert!(matches!(run(&opts), Err(GenerateError::Stale { .. })));

        opts.mode = OutputMode::Write;
        run(&opts).unwrap();
        opts.mode = OutputMode::Check;
        let report = run(&opts).unwrap();
        assert!(!report.written);
    }

    #[test]
    fn stdout_mode_writes_nothing() {
        let tmp = package_dir(&[("p.go", "package p\ntype ID int\n")]);
        let mut opts = options(tmp.path());
        opts.mode = OutputMode::Stdout;
        let report = run(&opts).unwrap();
        assert!(!report.written);
        assert!(!report.output_path.exists());
        assert!(report.text.starts_with("// Code generated by ingen. DO NOT EDIT."));
    }

    #[test]
    fn syntax_error_writes_nothing() {
        let tmp = package_dir(&[("p.go", "package p\ntype T struct {\n")]);
        let err = run(&options(tmp.path())).unwrap_err();
        assert!(matches!(err, GenerateError::Load(LoadError::Syntax { .. })));
        assert!(!tmp.path().join("type_helpers.go").exists());
    }

    #[test]
    fn unknown_package_is_load_error() {
        let err = run(&GenerateOptions::new("example.com/nowhere")).unwrap_err();
        assert!(matches!(err, GenerateError::Load(LoadError::NotFound { .. })));
    }
}

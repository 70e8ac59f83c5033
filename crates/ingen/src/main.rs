use std::process;

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::builder::NonEmptyStringValueParser;
use clap::{ArgAction, Parser};
use tracing::debug;

use ingen_common::Diagnostic;
use ingen_compiler::loader::LoadError;
use ingen_compiler::{generate, GenerateError, GenerateOptions, OutputMode};

/// Membership helper generator for Go.
///
/// Writes an `In` method for every comparable type declared in a package.
#[derive(Parser)]
#[command(
    name = "ingen",
    version,
    about,
    long_about = "Membership helper generator for Go.\n\nFor every type in the package whose values support ==, writes\n\n  func (v T) In(list ...T) bool\n\ninto type_helpers.go in the package directory. Settings can also be\ngiven in an ingen.toml next to the package sources.\n\nExamples:\n  ingen -p ./shapes                  Generate shapes/type_helpers.go\n  ingen -p example.com/shapes        Look the package up under $GOPATH/src\n  ingen -p ./shapes --check          Fail if the generated file is stale\n  ingen -p ./shapes --emit-types     Print the comparable types as JSON"
)]
struct Cli {
    /// Package directory, or import path under $GOPATH/src.
    #[arg(short, long, value_parser = NonEmptyStringValueParser::new())]
    package: String,

    /// Output file name inside the package directory (default: type_helpers.go).
    #[arg(short, long)]
    output: Option<String>,

    /// Name of the generated method (default: In).
    #[arg(long)]
    method: Option<String>,

    /// Treat struct fields of function type as not comparable.
    #[arg(long)]
    strict: bool,

    /// Skip a type by name. May be repeated.
    #[arg(long, value_name = "TYPE")]
    exclude: Vec<String>,

    /// Print the generated file instead of writing it.
    #[arg(long, conflicts_with_all = ["check", "emit_types"])]
    stdout: bool,

    /// Exit with an error if the generated file is missing or out of date.
    #[arg(long, conflicts_with = "emit_types")]
    check: bool,

    /// Print the comparable types as JSON instead of writing the file.
    #[arg(long = "emit-types")]
    emit_types: bool,

    /// More log output (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mode = if cli.check {
        OutputMode::Check
    } else if cli.stdout || cli.emit_types {
        OutputMode::Stdout
    } else {
        OutputMode::Write
    };
    let options = GenerateOptions {
        package: cli.package,
        output: cli.output,
        method: cli.method,
        strict: cli.strict,
        exclude: cli.exclude,
        format_command: None,
        mode,
    };
    debug!(?options, "starting");

    let report = match generate(&options) {
        Ok(report) => report,
        Err(e) => {
            report_error(&e);
            process::exit(1);
        }
    };

    if cli.emit_types {
        match serde_json::to_string_pretty(&report.collection.types) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: failed to serialize types: {e}");
                process::exit(1);
            }
        }
        return;
    }

    match mode {
        OutputMode::Stdout => print!("{}", report.text),
        OutputMode::Check => println!("{} is up to date.", report.output_path.display()),
        OutputMode::Write => println!(
            "Generated {} ({} of {} types)",
            report.output_path.display(),
            report.collection.types.len(),
            report.collection.types.len() + report.collection.skipped.len(),
        ),
    }
}

/// Install the log subscriber. Logs go to stderr so `--stdout` output stays clean.
fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

fn report_error(error: &GenerateError) {
    match error {
        GenerateError::Load(LoadError::Syntax {
            path,
            text,
            diagnostics,
        }) => {
            let file_name = path.display().to_string();
            for diag in diagnostics {
                print_diagnostic(diag, text, &file_name);
            }
            eprintln!("error: {error}");
        }
        GenerateError::MissingPackage => {
            eprintln!("error: {error}");
            eprintln!("\nUsage: ingen --package <PACKAGE>");
        }
        _ => eprintln!("error: {error}"),
    }
}

fn print_diagnostic(diag: &Diagnostic, source: &str, file_name: &str) {
    let kind = if diag.is_error() {
        ReportKind::Error
    } else {
        ReportKind::Warning
    };

    if let Some(ref span) = diag.span {
        let range = span.byte_range();
        let color = if diag.is_error() {
            Color::Red
        } else {
            Color::Yellow
        };

        let mut report = Report::build(kind, file_name, range.start)
            .with_message(&diag.message)
            .with_label(
                Label::new((file_name, range))
                    .with_message(&diag.message)
                    .with_color(color),
            );
        if let Some(ref help) = diag.help {
            report = report.with_help(help);
        }

        if let Err(e) = report
            .finish()
            .eprint((file_name, Source::from(source)))
        {
            eprintln!("error: failed to render diagnostic: {e}");
        }
    } else {
        let prefix = if diag.is_error() { "error" } else { "warning" };
        eprintln!("{}: {}", prefix, diag.message);
        if let Some(ref help) = diag.help {
            eprintln!("   = help: {}", help);
        }
        eprintln!();
    }
}

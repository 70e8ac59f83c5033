//! Formatting generated text and writing it to disk.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tempfile::NamedTempFile;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("failed to run formatter `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("formatter `{program}` failed on {}: {stderr}", .path.display())]
    Failed {
        program: String,
        path: PathBuf,
        stderr: String,
    },

    #[error("formatter `{program}` produced invalid UTF-8")]
    InvalidUtf8 { program: String },
}

#[derive(Debug, thiserror::Error)]
#[error("failed to write {}: {source}", .path.display())]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Turns raw generated text into its final form.
pub trait Formatter {
    fn format(&self, path: &Path, source: &str) -> Result<String, FormatError>;
}

/// Whitespace normalisation needing no external tools.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFormatter;

impl Formatter for BuiltinFormatter {
    fn format(&self, _path: &Path, source: &str) -> Result<String, FormatError> {
        let mut out = String::with_capacity(source.len());
        let mut blank_run = false;
        for line in source.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                if blank_run || out.is_empty() {
                    continue;
                }
                blank_run = true;
            } else {
                if blank_run {
                    out.push('\n');
                }
                blank_run = false;
                out.push_str(line);
            }
            if !blank_run {
                out.push('\n');
            }
        }
        Ok(out)
    }
}

/// Pipes the text through an external command such as `gofmt`.
#[derive(Debug, Clone)]
pub struct CommandFormatter {
    program: String,
    args: Vec<String>,
}

impl CommandFormatter {
    /// `argv[0]` is the program. Returns `None` for an empty command line.
    pub fn new(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl Formatter for CommandFormatter {
    fn format(&self, path: &Path, source: &str) -> Result<String, FormatError> {
        debug!(program = %self.program, args = ?self.args, "running formatter");
        let spawn_error = |source| FormatError::Spawn {
            program: self.program.clone(),
            source,
        };

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(source.as_bytes()).map_err(spawn_error)?;
        }
        let output = child.wait_with_output().map_err(spawn_error)?;

        if !output.status.success() {
            return Err(FormatError::Failed {
                program: self.program.clone(),
                path: path.to_path_buf(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        String::from_utf8(output.stdout).map_err(|_| FormatError::InvalidUtf8 {
            program: self.program.clone(),
        })
    }
}

/// Replace `path` with `contents` in one step: the bytes go to a temporary
/// file next to it, which is then renamed over the target.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), WriteError> {
    let wrap = |source| WriteError {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(wrap)?;
    tmp.write_all(contents).map_err(wrap)?;
    tmp.as_file().sync_all().map_err(wrap)?;
    tmp.persist(path).map_err(|e| wrap(e.error))?;
    Ok(())
}

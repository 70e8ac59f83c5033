//! Locating a Go package on disk and parsing its files.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ingen_common::Diagnostic;
use tracing::debug;
use walkdir::WalkDir;

use crate::ast::SourceFile;
use crate::constraints::BuildContext;
use crate::parser::parse_file;

/// A parsed package: the non-test `.go` files of one directory that build
/// for the target.
#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub dir: PathBuf,
    /// Sorted by file name.
    pub files: Vec<ParsedFile>,
}

#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub source: String,
    pub ast: SourceFile,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot find package \"{id}\" (searched {})", display_paths(.searched))]
    NotFound { id: String, searched: Vec<PathBuf> },

    #[error("no Go files in {}", .dir.display())]
    NoGoFiles { dir: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: {} syntax error(s)", .path.display(), .diagnostics.len())]
    Syntax {
        path: PathBuf,
        text: String,
        diagnostics: Vec<Diagnostic>,
    },

    #[error("found packages {first} and {second} in {}", .dir.display())]
    MixedPackages {
        dir: PathBuf,
        first: String,
        second: String,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "nothing".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Source of packages for the generator.
pub trait PackageLoader {
    /// Resolve a package identifier to its directory.
    fn locate(&self, id: &str) -> Result<PathBuf, LoadError>;

    /// Parse the package in `dir`, ignoring the file named `skip`.
    fn load(&self, dir: &Path, skip: &str) -> Result<Package, LoadError>;
}

/// Finds packages by path or under `$GOPATH/src`. Files whose build
/// constraints exclude them from the target are left out.
#[derive(Debug, Clone)]
pub struct GoPathLoader {
    roots: Vec<PathBuf>,
    target: BuildContext,
}

impl GoPathLoader {
    /// A loader for the host target.
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            target: BuildContext::host(),
        }
    }

    pub fn with_target(mut self, target: BuildContext) -> Self {
        self.target = target;
        self
    }

    /// Roots from `GOPATH`, or `$HOME/go` when it is unset.
    pub fn from_env() -> Self {
        let roots = match env::var_os("GOPATH") {
            Some(value) if !value.is_empty() => env::split_paths(&value)
                .filter(|p| !p.as_os_str().is_empty())
                .collect(),
            _ => env::var_os("HOME")
                .map(|home| vec![PathBuf::from(home).join("go")])
                .unwrap_or_default(),
        };
        Self::new(roots)
    }
}

impl PackageLoader for GoPathLoader {
    fn locate(&self, id: &str) -> Result<PathBuf, LoadError> {
        let direct = Path::new(id);
        if direct.is_dir() {
            return Ok(direct.to_path_buf());
        }

        let mut searched = Vec::new();
        for root in &self.roots {
            let candidate = root.join("src").join(id);
            if candidate.is_dir() {
                debug!(dir = %candidate.display(), "located package");
                return Ok(candidate);
            }
            searched.push(candidate);
        }
        Err(LoadError::NotFound {
            id: id.to_string(),
            searched,
        })
    }

    fn load(&self, dir: &Path, skip: &str) -> Result<Package, LoadError> {
        let mut sources = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| LoadError::Io {
                path: dir.to_path_buf(),
                source: io::Error::from(e),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !is_package_file(&name, skip) {
                continue;
            }
            let path = entry.path().to_path_buf();
            let text = fs::read_to_string(&path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
            if !self.target.includes(&name, &text) {
                debug!(file = %name, goos = %self.target.goos, "excluded by build constraints");
                continue;
            }
            sources.push((path, text));
        }
        Package::from_sources(dir.to_path_buf(), sources)
    }
}

/// Whether the go tool would build `name` as part of the package.
fn is_package_file(name: &str, skip: &str) -> bool {
    name.ends_with(".go")
        && !name.ends_with("_test.go")
        && !name.starts_with('.')
        && !name.starts_with('_')
        && name != skip
}

impl Package {
    /// Parse already-read files into a package. Files are sorted by name.
    pub fn from_sources(
        dir: PathBuf,
        mut sources: Vec<(PathBuf, String)>,
    ) -> Result<Self, LoadError> {
        if sources.is_empty() {
            return Err(LoadError::NoGoFiles { dir });
        }
        sources.sort_by(|a, b| a.0.file_name().cmp(&b.0.file_name()));

        let mut name: Option<String> = None;
        let mut files = Vec::with_capacity(sources.len());
        for (path, text) in sources {
            let (ast, diagnostics) = parse_file(&text, path.display().to_string());
            if diagnostics.has_errors() {
                return Err(LoadError::Syntax {
                    path,
                    text,
                    diagnostics: diagnostics.into_diagnostics(),
                });
            }
            if let Some(first) = &name {
                if *first != ast.package {
                    return Err(LoadError::MixedPackages {
                        dir,
                        first: first.clone(),
                        second: ast.package,
                    });
                }
            } else {
                name = Some(ast.package.clone());
            }
            files.push(ParsedFile {
                path,
                source: text,
                ast,
            });
        }

        Ok(Package {
            name: name.unwrap_or_default(),
            dir,
            files,
        })
    }

    /// Display name of a file, relative to the package directory.
    pub fn file_name(file: &ParsedFile) -> String {
        file.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn loads_sorted_go_files_only() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "b.go", "package shapes\ntype B int\n");
        write(tmp.path(), "a.go", "package shapes\ntype A int\n");
        write(tmp.path(), "a_test.go", "package shapes_test\n");
        write(tmp.path(), "type_helpers.go", "package shapes\n");
        write(tmp.path(), "notes.txt", "not go");
        write(tmp.path(), "_scratch.go", "package other\n");
        fs::create_dir(tmp.path().join("sub")).unwrap();
        write(&tmp.path().join("sub"), "c.go", "package sub\n");

        let pkg = GoPathLoader::new(Vec::new())
            .load(tmp.path(), "type_helpers.go")
            .unwrap();
        assert_eq!(pkg.name, "shapes");
        let names: Vec<_> = pkg.files.iter().map(Package::file_name).collect();
        assert_eq!(names, ["a.go", "b.go"]);
    }

    #[test]
    fn empty_directory_has_no_go_files() {
        let tmp = tempfile::tempdir().unwrap();
        let err = GoPathLoader::new(Vec::new())
            .load(tmp.path(), "type_helpers.go")
            .unwrap_err();
        assert!(matches!(err, LoadError::NoGoFiles { .. }));
    }

    #[test]
    fn syntax_error_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "bad.go", "package shapes\ntype T struct {\n");
        let err = GoPathLoader::new(Vec::new())
            .load(tmp.path(), "type_helpers.go")
            .unwrap_err();
        match err {
            LoadError::Syntax {
                path, diagnostics, ..
            } => {
                assert!(path.ends_with("bad.go"));
                assert!(!diagnostics.is_empty());
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn mixed_package_names() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.go", "package one\n");
        write(tmp.path(), "b.go", "package two\n");
        let err = GoPathLoader::new(Vec::new())
            .load(tmp.path(), "type_helpers.go")
            .unwrap_err();
        assert!(matches!(
            err,
            LoadError::MixedPackages { ref first, ref second, .. } if first == "one" && second == "two"
        ));
    }

    #[test]
    fn ignored_generator_script_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "gen.go", "//go:build ignore\n\npackage main\n\nfunc main() {}\n");
        write(tmp.path(), "p.go", "package p\ntype ID int\n");
        let pkg = GoPathLoader::new(Vec::new())
            .load(tmp.path(), "type_helpers.go")
            .unwrap();
        assert_eq!(pkg.name, "p");
        let names: Vec<_> = pkg.files.iter().map(Package::file_name).collect();
        assert_eq!(names, ["p.go"]);
    }

    #[test]
    fn files_for_other_targets_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "handle_unix.go", "//go:build unix\n\npackage p\ntype Handle int\n");
        write(tmp.path(), "handle_windows.go", "package p\ntype Handle uintptr\n");
        write(tmp.path(), "poll_linux_arm64.go", "package p\ntype Poller int\n");

        let loader = GoPathLoader::new(Vec::new());
        let linux = loader
            .clone()
            .with_target(BuildContext::new("linux", "amd64"))
            .load(tmp.path(), "type_helpers.go")
            .unwrap();
        let names: Vec<_> = linux.files.iter().map(Package::file_name).collect();
        assert_eq!(names, ["handle_unix.go"]);

        let windows = loader
            .with_target(BuildContext::new("windows", "amd64"))
            .load(tmp.path(), "type_helpers.go")
            .unwrap();
        let names: Vec<_> = windows.files.iter().map(Package::file_name).collect();
        assert_eq!(names, ["handle_windows.go"]);
    }

    #[test]
    fn package_excluded_entirely_has_no_go_files() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "tools.go", "//go:build tools\n\npackage tools\n");
        let err = GoPathLoader::new(Vec::new())
            .load(tmp.path(), "type_helpers.go")
            .unwrap_err();
        assert!(matches!(err, LoadError::NoGoFiles { .. }));
    }

    #[test]
    fn locate_prefers_first_gopath_entry() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        for root in [first.path(), second.path()] {
            fs::create_dir_all(root.join("src/example.com/shapes")).unwrap();
        }
        let loader = GoPathLoader::new(vec![first.path().into(), second.path().into()]);
        let dir = loader.locate("example.com/shapes").unwrap();
        assert!(dir.starts_with(first.path()));
    }

    #[test]
    fn locate_accepts_directory_path() {
        let tmp = tempfile::tempdir().unwrap();
        let id = tmp.path().display().to_string();
        let dir = GoPathLoader::new(Vec::new()).locate(&id).unwrap();
        assert_eq!(dir, tmp.path());
    }

    #[test]
    fn locate_reports_searched_paths() {
        let root = tempfile::tempdir().unwrap();
        let loader = GoPathLoader::new(vec![root.path().into()]);
        let err = loader.locate("example.com/missing").unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("cannot find package \"example.com/missing\""));
        assert!(message.contains("example.com/missing"));
    }
}

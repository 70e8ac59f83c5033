use ingen_common::Span;

use super::types::TypeExpr;

// ============================================================================
// Source file (top-level)
// ============================================================================

/// One parsed `.go` file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub package: String,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
    pub span: Span,
}

impl SourceFile {
    /// Package-level type specs in source order, grouped ones flattened.
    pub fn type_specs(&self) -> impl Iterator<Item = &TypeSpec> {
        self.decls.iter().flat_map(|decl| match decl {
            Decl::Type(group) => group.specs.iter(),
            _ => [].iter(),
        })
    }

    /// Whether `name` may refer to an import of this file.
    ///
    /// Outside the standard library the package clause of the imported
    /// code decides its name, so any qualifier is accepted once the file has
    /// an unaliased import whose name is only a guess.
    pub fn imports_package(&self, name: &str) -> bool {
        self.imports.iter().any(|import| {
            import.local_name().as_deref() == Some(name) || !import.has_known_name()
        })
    }

    pub fn has_dot_import(&self) -> bool {
        self.imports.iter().any(|import| import.alias.as_deref() == Some("."))
    }
}

// ============================================================================
// Imports
// ============================================================================

/// `import alias "path"`
#[derive(Debug, Clone)]
pub struct ImportSpec {
    /// `Some(".")` for dot imports, `Some("_")` for blank imports.
    pub alias: Option<String>,
    pub path: String,
    pub span: Span,
}

impl ImportSpec {
    /// Identifier the file uses to refer to the package. `None` for dot and
    /// blank imports.
    pub fn local_name(&self) -> Option<String> {
        match self.alias.as_deref() {
            Some("." | "_") => None,
            Some(alias) => Some(alias.to_string()),
            None => Some(assumed_name(&self.path).to_string()),
        }
    }

    /// Whether the package name follows from the path alone: aliased,
    /// standard library, or a last element that is a plain identifier.
    pub fn has_known_name(&self) -> bool {
        if self.alias.is_some() {
            return true;
        }
        let standard = self
            .path
            .split('/')
            .next()
            .is_some_and(|first| !first.contains('.'));
        standard || last_element(&self.path) == assumed_name(&self.path)
    }
}

fn last_element(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Conventional package name for an import path, as `goimports` assumes it:
/// a trailing `/vN` major version is skipped, a `go-` prefix is dropped and
/// the name ends at the first character that cannot appear in an identifier.
/// `github.com/jackc/pgx/v5` is `pgx`, `gopkg.in/yaml.v3` is `yaml` and
/// `github.com/mattn/go-sqlite3` is `sqlite3`.
fn assumed_name(path: &str) -> &str {
    let mut base = last_element(path);
    if is_major_version(base) {
        if let Some((dir, _)) = path.rsplit_once('/') {
            base = last_element(dir);
        }
    }
    let base = base.strip_prefix("go-").unwrap_or(base);
    let end = base
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(base.len());
    &base[..end]
}

fn is_major_version(element: &str) -> bool {
    element
        .strip_prefix('v')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Clone)]
pub enum Decl {
    Type(TypeDecl),
    Func(FuncDecl),
    /// `var` or `const`; contents are skipped.
    Value(ValueDecl),
}

/// `type T ...` or a parenthesised group `type ( ... )`.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub specs: Vec<TypeSpec>,
    pub span: Span,
}

/// A single type specification inside a `type` declaration.
///
/// ```go
/// type Pair[K comparable, V any] struct { Key K; Value V }
/// type Celsius = float64
/// ```
#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    /// `type A = B`
    pub is_alias: bool,
    pub ty: TypeExpr,
    pub span: Span,
}

impl TypeSpec {
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    pub fn type_param_names(&self) -> Vec<String> {
        self.type_params.iter().map(|p| p.name.clone()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct TypeParam {
    pub name: String,
    pub constraint: TypeExpr,
}

/// A function or method declaration. Only the header is recorded.
#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub name: String,
    /// Base type name of the receiver for methods: `T` for `(v *T)` or `(v T[K])`.
    pub receiver: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Var,
    Const,
}

#[derive(Debug, Clone)]
pub struct ValueDecl {
    pub kind: ValueKind,
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn import(alias: Option<&str>, path: &str) -> ImportSpec {
        ImportSpec {
            alias: alias.map(str::to_string),
            path: path.to_string(),
            span: Span::synthetic(),
        }
    }

    #[test]
    fn import_local_names() {
        assert_eq!(import(None, "fmt").local_name().as_deref(), Some("fmt"));
        assert_eq!(
            import(None, "net/http").local_name().as_deref(),
            Some("http")
        );
        assert_eq!(
            import(None, "gopkg.in/yaml.v3").local_name().as_deref(),
            Some("yaml")
        );
        assert_eq!(
            import(Some("pb"), "example.com/api/v1").local_name().as_deref(),
            Some("pb")
        );
        assert_eq!(import(Some("."), "math").local_name(), None);
        assert_eq!(import(Some("_"), "embed").local_name(), None);
    }

    #[test]
    fn import_names_follow_module_conventions() {
        let name = |path| import(None, path).local_name().unwrap();
        assert_eq!(name("github.com/jackc/pgx/v5"), "pgx");
        assert_eq!(name("github.com/mattn/go-sqlite3"), "sqlite3");
        assert_eq!(name("github.com/nats-io/nats.go"), "nats");
        assert_eq!(name("github.com/example/client-go"), "client");
        assert_eq!(name("example.com/v2"), "example");
    }

    #[test]
    fn known_and_guessed_import_names() {
        assert!(import(None, "net/http").has_known_name());
        assert!(import(None, "github.com/google/uuid").has_known_name());
        assert!(import(Some("sq"), "github.com/mattn/go-sqlite3").has_known_name());
        assert!(!import(None, "github.com/mattn/go-sqlite3").has_known_name());
        assert!(!import(None, "github.com/jackc/pgx/v5").has_known_name());
    }

    #[test]
    fn guessed_import_accepts_any_qualifier() {
        let file = |imports| SourceFile {
            package: "p".into(),
            imports,
            decls: Vec::new(),
            span: Span::synthetic(),
        };
        let std_only = file(vec![import(None, "time")]);
        assert!(std_only.imports_package("time"));
        assert!(!std_only.imports_package("json"));

        let third_party = file(vec![import(None, "time"), import(None, "github.com/lib/pq-go")]);
        assert!(third_party.imports_package("pq"));
        assert!(third_party.imports_package("postgres"));
    }
}

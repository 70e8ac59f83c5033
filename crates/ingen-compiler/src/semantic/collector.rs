use std::collections::HashSet;
use std::fmt;

use ingen_common::{ComparabilityPolicy, Span};
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::ast::visitor::Visitor;
use crate::ast::*;
use crate::loader::Package;

use super::comparable::{Analyzer, Rejection};
use super::resolver::{ResolveError, Resolver};

/// What the collector needs to know beyond the package itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectOptions {
    /// Name of the generated method; types already declaring it are skipped.
    pub method: String,
    pub policy: ComparabilityPolicy,
    pub exclude: Vec<String>,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            method: ingen_common::config::DEFAULT_METHOD.to_string(),
            policy: ComparabilityPolicy::default(),
            exclude: Vec::new(),
        }
    }
}

/// A declaration judged comparable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparableType {
    pub name: String,
    /// Type parameter names, repeated on the generated receiver.
    pub type_params: Vec<String>,
    #[serde(rename = "location", serialize_with = "serialize_display")]
    pub span: Span,
}

/// A declaration that gets no method, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub name: String,
    pub span: Span,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// `type _ T` declares nothing a method can be attached to.
    Blank,
    Alias,
    Excluded,
    MethodExists(String),
    Unresolved(ResolveError),
    Incomparable(Rejection),
}

/// Result of collecting a package, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    pub types: Vec<ComparableType>,
    pub skipped: Vec<Skipped>,
}

impl Collection {
    pub fn names(&self) -> Vec<&str> {
        self.types.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Collect the comparable declarations of `package`.
///
/// Files are visited sorted by name, declarations in source order.
pub fn collect(package: &Package, options: &CollectOptions) -> Collection {
    let mut files: Vec<_> = package.files.iter().collect();
    files.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));

    let mut index = MethodIndex {
        method: &options.method,
        receivers: HashSet::new(),
    };
    for file in &files {
        index.visit_file(&file.ast);
    }

    let mut collector = Collector {
        resolver: Resolver::new(package),
        analyzer: Analyzer::new(options.policy),
        options,
        has_method: index.receivers,
        current: None,
        collection: Collection::default(),
    };
    for file in files {
        collector.current = Some(&file.ast);
        collector.visit_file(&file.ast);
    }
    collector.collection
}

struct Collector<'a> {
    resolver: Resolver<'a>,
    analyzer: Analyzer,
    options: &'a CollectOptions,
    has_method: HashSet<String>,
    current: Option<&'a SourceFile>,
    collection: Collection,
}

impl Collector<'_> {
    fn classify(&mut self, spec: &TypeSpec, file: &SourceFile) -> Result<(), SkipReason> {
        if spec.name == "_" {
            return Err(SkipReason::Blank);
        }
        if spec.is_alias {
            return Err(SkipReason::Alias);
        }
        if self.options.exclude.iter().any(|name| *name == spec.name) {
            return Err(SkipReason::Excluded);
        }
        if self.has_method.contains(&spec.name) {
            return Err(SkipReason::MethodExists(self.options.method.clone()));
        }
        let shape = self
            .resolver
            .resolve_declaration(spec, file)
            .map_err(SkipReason::Unresolved)?;
        match self.analyzer.explain(&shape) {
            Some(rejection) => Err(SkipReason::Incomparable(rejection)),
            None => Ok(()),
        }
    }
}

impl Visitor for Collector<'_> {
    fn visit_type_spec(&mut self, spec: &TypeSpec) {
        let Some(file) = self.current else {
            return;
        };
        match self.classify(spec, file) {
            Ok(()) => {
                debug!(name = %spec.name, "comparable");
                self.collection.types.push(ComparableType {
                    name: spec.name.clone(),
                    type_params: spec.type_param_names(),
                    span: spec.span.clone(),
                });
            }
            Err(reason) => {
                debug!(name = %spec.name, ty = %spec.ty.display(), %reason, "skipping declaration");
                self.collection.skipped.push(Skipped {
                    name: spec.name.clone(),
                    span: spec.span.clone(),
                    reason,
                });
            }
        }
    }
}

/// Receiver base names of methods called `method`.
struct MethodIndex<'m> {
    method: &'m str,
    receivers: HashSet<String>,
}

impl Visitor for MethodIndex<'_> {
    fn visit_type_spec(&mut self, _spec: &TypeSpec) {}

    fn visit_func_decl(&mut self, func: &FuncDecl) {
        if func.name == self.method {
            if let Some(receiver) = &func.receiver {
                self.receivers.insert(receiver.clone());
            }
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Blank => write!(f, "blank type name"),
            SkipReason::Alias => write!(f, "alias declaration"),
            SkipReason::Excluded => write!(f, "excluded by configuration"),
            SkipReason::MethodExists(method) => write!(f, "already has a method named {method}"),
            SkipReason::Unresolved(err) => write!(f, "{err}"),
            SkipReason::Incomparable(rejection) => write!(f, "not comparable: {rejection}"),
        }
    }
}

fn serialize_display<T: fmt::Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use super::*;

    fn package(files: &[(&str, &str)]) -> Package {
        let sources = files
            .iter()
            .map(|(name, text)| (PathBuf::from(name), text.to_string()))
            .collect();
        Package::from_sources(PathBuf::from("."), sources).unwrap()
    }

    fn names(collection: &Collection) -> Vec<&str> {
        collection.names()
    }

    #[test]
    fn collects_comparable_in_declaration_order() {
        let pkg = package(&[(
            "shapes.go",
            "package shapes\n\ntype Zeta int\ntype Grid [4]float64\ntype Bag struct { Items []string }\ntype (\n\tAlpha string\n\tLookup map[string]int\n)\n",
        )]);
        let collection = collect(&pkg, &CollectOptions::default());
        assert_eq!(names(&collection), ["Zeta", "Grid", "Alpha"]);
        let skipped: Vec<_> = collection.skipped.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(skipped, ["Bag", "Lookup"]);
    }

    #[test]
    fn files_are_visited_by_name() {
        let pkg = package(&[
            ("b.go", "package p\ntype B1 int\ntype B2 int\n"),
            ("a.go", "package p\ntype A1 int\n"),
        ]);
        assert_eq!(names(&collect(&pkg, &CollectOptions::default())), ["A1", "B1", "B2"]);
    }

    #[test]
    fn unresolved_declarations_are_skipped() {
        let pkg = package(&[(
            "p.go",
            "package p\ntype Good int\ntype Bad struct { x Missing }\ntype AlsoGood bool\n",
        )]);
        let collection = collect(&pkg, &CollectOptions::default());
        assert_eq!(names(&collection), ["Good", "AlsoGood"]);
        assert!(matches!(
            collection.skipped[0].reason,
            SkipReason::Unresolved(ResolveError::UndefinedType { .. })
        ));
    }

    #[test]
    fn blank_type_names_are_skipped() {
        let pkg = package(&[("p.go", "package p\ntype _ int\ntype ID int\n")]);
        let collection = collect(&pkg, &CollectOptions::default());
        assert_eq!(names(&collection), ["ID"]);
        assert_eq!(collection.skipped[0].reason, SkipReason::Blank);
    }

    #[test]
    fn versioned_and_prefixed_imports_are_external() {
        let pkg = package(&[
            (
                "conn.go",
                "package p\n\nimport \"github.com/jackc/pgx/v5\"\n\ntype Conn struct {\n\tID  int\n\tCfg pgx.ConnConfig\n}\n",
            ),
            (
                "errs.go",
                "package p\n\nimport \"github.com/mattn/go-sqlite3\"\n\ntype E struct{ Code sqlite3.ErrNo }\n",
            ),
        ]);
        let collection = collect(&pkg, &CollectOptions::default());
        assert_eq!(names(&collection), ["Conn", "E"]);
        assert!(collection.skipped.is_empty());
    }

    #[test]
    fn aliases_excluded_and_existing_methods_are_skipped() {
        let pkg = package(&[(
            "p.go",
            "package p\ntype Celsius float64\ntype Temp = Celsius\ntype Scratch int\ntype Known int\n\nfunc (k *Known) In(list ...Known) bool { return false }\nfunc (c Celsius) String() string { return \"\" }\n",
        )]);
        let options = CollectOptions {
            exclude: vec!["Scratch".into()],
            ..CollectOptions::default()
        };
        let collection = collect(&pkg, &options);
        assert_eq!(names(&collection), ["Celsius"]);
        let reasons: Vec<_> = collection.skipped.iter().map(|s| s.reason.to_string()).collect();
        assert_eq!(
            reasons,
            [
                "alias declaration",
                "excluded by configuration",
                "already has a method named In",
            ]
        );
    }

    #[test]
    fn custom_method_name_changes_existing_check() {
        let pkg = package(&[(
            "p.go",
            "package p\ntype Known int\nfunc (k Known) In(list ...Known) bool { return false }\n",
        )]);
        let options = CollectOptions {
            method: "OneOf".into(),
            ..CollectOptions::default()
        };
        assert_eq!(names(&collect(&pkg, &options)), ["Known"]);
    }

    #[test]
    fn strict_policy_skips_function_fields() {
        let pkg = package(&[(
            "p.go",
            "package p\ntype Handler struct {\n\tName string\n\tRun func()\n}\n",
        )]);
        assert_eq!(names(&collect(&pkg, &CollectOptions::default())), ["Handler"]);
        let strict = CollectOptions {
            policy: ComparabilityPolicy::Strict,
            ..CollectOptions::default()
        };
        let collection = collect(&pkg, &strict);
        assert!(collection.types.is_empty());
        assert_eq!(
            collection.skipped[0].reason.to_string(),
            "not comparable: Run: funcs are not comparable"
        );
    }

    #[test]
    fn generic_types_keep_parameter_names() {
        let pkg = package(&[(
            "p.go",
            "package p\ntype Pair[K comparable, V any] struct {\n\tKey K\n\tValue V\n}\ntype List[T any] struct { items []T }\n",
        )]);
        let collection = collect(&pkg, &CollectOptions::default());
        assert_eq!(collection.types.len(), 1);
        assert_eq!(collection.types[0].name, "Pair");
        assert_eq!(collection.types[0].type_params, ["K", "V"]);
    }

    #[test]
    fn function_local_types_are_ignored() {
        let pkg = package(&[(
            "p.go",
            "package p\nfunc f() {\n\ttype local int\n\t_ = local(1)\n}\ntype Top int\n",
        )]);
        assert_eq!(names(&collect(&pkg, &CollectOptions::default())), ["Top"]);
    }

    #[test]
    fn collection_is_deterministic() {
        let pkg = package(&[
            ("x.go", "package p\ntype X struct { A, B int }\ntype Y [2]X\n"),
            ("w.go", "package p\ntype W map[int]X\ntype V struct { W W }\ntype U struct { X X }\n"),
        ]);
        let first = collect(&pkg, &CollectOptions::default());
        let second = collect(&pkg, &CollectOptions::default());
        assert_eq!(first, second);
        assert_eq!(names(&first), ["U", "X", "Y"]);
    }

    #[test]
    fn serializes_with_location() {
        let ty = ComparableType {
            name: "Point".into(),
            type_params: Vec::new(),
            span: Span::synthetic(),
        };
        let json = serde_json::to_string(&ty).unwrap();
        assert_eq!(json, r#"{"name":"Point","type_params":[],"location":":0:0"}"#);
    }
}

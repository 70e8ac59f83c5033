use std::collections::HashMap;

use ingen_common::Span;

use crate::ast::visitor::{walk_type_expr, Visitor};
use crate::ast::*;
use crate::loader::Package;

use super::shape::{ArrayLen, FieldShape, OpaqueKind, TypeShape};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("{span}: undefined: {name}")]
    UndefinedType { name: String, span: Span },

    #[error("{span}: undefined package {package} in {package}.{name}")]
    UnknownPackage {
        package: String,
        name: String,
        span: Span,
    },

    #[error("{span}: invalid recursive type {name}")]
    InvalidRecursiveType { name: String, span: Span },

    #[error("{span}: {name} expects {expected} type argument(s), found {found}")]
    TypeArgumentCount {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("{span}: {name} is not a generic type")]
    NotGeneric { name: String, span: Span },
}

/// A package-level type declaration and the file it appears in.
#[derive(Clone, Copy)]
struct DeclEntry<'a> {
    spec: &'a TypeSpec,
    file: &'a SourceFile,
}

/// Names visible while resolving one declaration body.
struct Scope<'s> {
    file: &'s SourceFile,
    /// Type parameters bound to the shapes they stand for.
    params: HashMap<String, TypeShape>,
}

/// Turns declarations of a package into [`TypeShape`]s.
///
/// Lookup order for an unqualified name is: type parameters of the
/// enclosing declaration, package-level declarations, predeclared types.
/// Shapes of non-generic declarations are memoised.
pub struct Resolver<'a> {
    decls: HashMap<&'a str, DeclEntry<'a>>,
    /// Declarations currently being resolved, innermost last.
    in_progress: Vec<String>,
    cache: HashMap<String, TypeShape>,
}

impl<'a> Resolver<'a> {
    pub fn new(package: &'a Package) -> Self {
        let mut decls = HashMap::new();
        for parsed in &package.files {
            for spec in parsed.ast.type_specs() {
                // Redeclarations are a compile error in Go; keep the first.
                decls.entry(spec.name.as_str()).or_insert(DeclEntry {
                    spec,
                    file: &parsed.ast,
                });
            }
        }
        Self {
            decls,
            in_progress: Vec::new(),
            cache: HashMap::new(),
        }
    }

    /// Resolve the shape of a declaration. Type parameters of a generic
    /// declaration stay abstract.
    pub fn resolve_declaration(
        &mut self,
        spec: &TypeSpec,
        file: &SourceFile,
    ) -> Result<TypeShape, ResolveError> {
        let args = spec
            .type_params
            .iter()
            .map(|p| TypeShape::Opaque(OpaqueKind::TypeParam(p.name.clone())))
            .collect();
        self.instantiate(spec, file, args, false)
    }

    /// Resolve `spec` with its type parameters bound to `args`.
    fn instantiate(
        &mut self,
        spec: &TypeSpec,
        file: &SourceFile,
        args: Vec<TypeShape>,
        indirect: bool,
    ) -> Result<TypeShape, ResolveError> {
        let memoise = !spec.is_generic();
        if memoise {
            if let Some(shape) = self.cache.get(&spec.name) {
                return Ok(shape.clone());
            }
        }

        let scope = Scope {
            file,
            params: spec.type_param_names().into_iter().zip(args).collect(),
        };
        self.in_progress.push(spec.name.clone());
        let underlying = self.resolve_type(&spec.ty, &scope, indirect);
        self.in_progress.pop();
        let underlying = underlying?;

        let shape = if spec.is_alias {
            underlying
        } else {
            TypeShape::named(spec.name.clone(), underlying)
        };
        // A shape that refers back to an enclosing declaration only holds in
        // that context.
        if memoise && !mentions_recursion(&shape) {
            self.cache.insert(spec.name.clone(), shape.clone());
        }
        Ok(shape)
    }

    /// `indirect` is set once the walk has passed through a slice or map,
    /// which may legally refer back to a declaration being resolved.
    fn resolve_type(
        &mut self,
        ty: &TypeExpr,
        scope: &Scope<'_>,
        indirect: bool,
    ) -> Result<TypeShape, ResolveError> {
        match &ty.kind {
            TypeExprKind::Name {
                package,
                name,
                args,
            } => self.resolve_name(package.as_deref(), name, args, &ty.span, scope, indirect),
            TypeExprKind::Array { len, elem } => {
                let len = match len.value {
                    Some(n) => ArrayLen::Known(n),
                    None => ArrayLen::Symbolic(len.text.clone()),
                };
                Ok(TypeShape::Array {
                    len,
                    elem: Box::new(self.resolve_type(elem, scope, indirect)?),
                })
            }
            TypeExprKind::Slice(elem) => {
                Ok(TypeShape::sequence(self.resolve_type(elem, scope, true)?))
            }
            TypeExprKind::Map { key, value } => Ok(TypeShape::mapping(
                self.resolve_type(key, scope, true)?,
                self.resolve_type(value, scope, true)?,
            )),
            TypeExprKind::Pointer(elem) => {
                self.check_names(elem, scope)?;
                Ok(TypeShape::Opaque(OpaqueKind::Pointer))
            }
            TypeExprKind::Chan { elem, .. } => {
                self.check_names(elem, scope)?;
                Ok(TypeShape::Opaque(OpaqueKind::Channel))
            }
            TypeExprKind::Func => Ok(TypeShape::Opaque(OpaqueKind::Function)),
            TypeExprKind::Interface | TypeExprKind::Union(_) => {
                Ok(TypeShape::Opaque(OpaqueKind::Interface))
            }
            TypeExprKind::Struct(fields) => {
                let mut shapes = Vec::new();
                for field in fields {
                    let shape = self.resolve_type(&field.ty, scope, indirect)?;
                    for name in field.field_names() {
                        shapes.push(FieldShape {
                            name,
                            shape: shape.clone(),
                        });
                    }
                }
                Ok(TypeShape::Struct(shapes))
            }
            TypeExprKind::Paren(inner) => self.resolve_type(inner, scope, indirect),
        }
    }

    fn resolve_name(
        &mut self,
        package: Option<&str>,
        name: &str,
        args: &[TypeExpr],
        span: &Span,
        scope: &Scope<'_>,
        indirect: bool,
    ) -> Result<TypeShape, ResolveError> {
        if let Some(package) = package {
            if !scope.file.imports_package(package) {
                return Err(ResolveError::UnknownPackage {
                    package: package.to_string(),
                    name: name.to_string(),
                    span: span.clone(),
                });
            }
            for arg in args {
                self.check_names(arg, scope)?;
            }
            return Ok(TypeShape::Opaque(OpaqueKind::External {
                package: Some(package.to_string()),
                name: name.to_string(),
            }));
        }

        if args.is_empty() {
            if let Some(shape) = scope.params.get(name) {
                return Ok(shape.clone());
            }
        }

        if let Some(entry) = self.decls.get(name).copied() {
            if self.in_progress.iter().any(|n| n == name) {
                if indirect {
                    return Ok(TypeShape::Opaque(OpaqueKind::Recursive(name.to_string())));
                }
                return Err(ResolveError::InvalidRecursiveType {
                    name: name.to_string(),
                    span: span.clone(),
                });
            }

            let expected = entry.spec.type_params.len();
            if expected == 0 && !args.is_empty() {
                return Err(ResolveError::NotGeneric {
                    name: name.to_string(),
                    span: span.clone(),
                });
            }
            if expected != args.len() {
                return Err(ResolveError::TypeArgumentCount {
                    name: name.to_string(),
                    expected,
                    found: args.len(),
                    span: span.clone(),
                });
            }

            let mut arg_shapes = Vec::with_capacity(args.len());
            for arg in args {
                arg_shapes.push(self.resolve_type(arg, scope, indirect)?);
            }
            return self.instantiate(entry.spec, entry.file, arg_shapes, indirect);
        }

        if let Some(shape) = TypeShape::predeclared(name) {
            if !args.is_empty() {
                return Err(ResolveError::NotGeneric {
                    name: name.to_string(),
                    span: span.clone(),
                });
            }
            return Ok(shape);
        }

        // Dot imports make any unknown name a candidate from another package.
        if scope.file.has_dot_import() {
            return Ok(TypeShape::Opaque(OpaqueKind::External {
                package: None,
                name: name.to_string(),
            }));
        }

        Err(ResolveError::UndefinedType {
            name: name.to_string(),
            span: span.clone(),
        })
    }

    /// Check that every name mentioned in `ty` exists, without resolving
    /// its structure. Used below pointers and channels.
    fn check_names(&self, ty: &TypeExpr, scope: &Scope<'_>) -> Result<(), ResolveError> {
        let mut checker = NameChecker {
            resolver: self,
            scope,
            error: None,
        };
        checker.visit_type_expr(ty);
        match checker.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn name_exists(&self, name: &str, scope: &Scope<'_>) -> bool {
        scope.params.contains_key(name)
            || self.decls.contains_key(name)
            || TypeShape::predeclared(name).is_some()
            || scope.file.has_dot_import()
    }
}

/// Visits the type names below an indirection and records the first one
/// that does not exist.
struct NameChecker<'r, 'a, 's> {
    resolver: &'r Resolver<'a>,
    scope: &'r Scope<'s>,
    error: Option<ResolveError>,
}

impl Visitor for NameChecker<'_, '_, '_> {
    fn visit_type_expr(&mut self, ty: &TypeExpr) {
        if self.error.is_some() {
            return;
        }
        if let TypeExprKind::Name { package, name, .. } = &ty.kind {
            match package {
                Some(package) if !self.scope.file.imports_package(package) => {
                    self.error = Some(ResolveError::UnknownPackage {
                        package: package.clone(),
                        name: name.clone(),
                        span: ty.span.clone(),
                    });
                    return;
                }
                None if !self.resolver.name_exists(name, self.scope) => {
                    self.error = Some(ResolveError::UndefinedType {
                        name: name.clone(),
                        span: ty.span.clone(),
                    });
                    return;
                }
                _ => {}
            }
        }
        walk_type_expr(self, ty);
    }
}

fn mentions_recursion(shape: &TypeShape) -> bool {
    match shape {
        TypeShape::Opaque(kind) => matches!(kind, OpaqueKind::Recursive(_)),
        TypeShape::NamedAlias { underlying, .. } => mentions_recursion(underlying),
        TypeShape::Array { elem, .. } | TypeShape::Sequence(elem) => mentions_recursion(elem),
        TypeShape::Mapping { key, value } => mentions_recursion(key) || mentions_recursion(value),
        TypeShape::Struct(fields) => fields.iter().any(|f| mentions_recursion(&f.shape)),
    }
}

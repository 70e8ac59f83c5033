use super::nodes::*;
use super::types::{TypeExpr, TypeExprKind};

/// Visitor trait for walking a parsed file.
///
/// Default implementations walk children; override specific methods
/// to add behavior at particular node types.
pub trait Visitor {
    fn visit_file(&mut self, file: &SourceFile) {
        for decl in &file.decls {
            self.visit_decl(decl);
        }
    }

    fn visit_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Type(group) => self.visit_type_decl(group),
            Decl::Func(func) => self.visit_func_decl(func),
            Decl::Value(_) => {}
        }
    }

    fn visit_type_decl(&mut self, decl: &TypeDecl) {
        for spec in &decl.specs {
            self.visit_type_spec(spec);
        }
    }

    fn visit_type_spec(&mut self, spec: &TypeSpec) {
        for param in &spec.type_params {
            self.visit_type_expr(&param.constraint);
        }
        self.visit_type_expr(&spec.ty);
    }

    fn visit_func_decl(&mut self, _func: &FuncDecl) {}

    fn visit_type_expr(&mut self, ty: &TypeExpr) {
        walk_type_expr(self, ty);
    }
}

/// Visit the direct children of `ty`.
pub fn walk_type_expr<V: Visitor + ?Sized>(visitor: &mut V, ty: &TypeExpr) {
    match &ty.kind {
        TypeExprKind::Name { args, .. } => {
            for arg in args {
                visitor.visit_type_expr(arg);
            }
        }
        TypeExprKind::Array { elem, .. }
        | TypeExprKind::Slice(elem)
        | TypeExprKind::Pointer(elem)
        | TypeExprKind::Chan { elem, .. }
        | TypeExprKind::Paren(elem) => visitor.visit_type_expr(elem),
        TypeExprKind::Map { key, value } => {
            visitor.visit_type_expr(key);
            visitor.visit_type_expr(value);
        }
        TypeExprKind::Struct(fields) => {
            for field in fields {
                visitor.visit_type_expr(&field.ty);
            }
        }
        TypeExprKind::Union(terms) => {
            for term in terms {
                visitor.visit_type_expr(&term.ty);
            }
        }
        TypeExprKind::Func | TypeExprKind::Interface => {}
    }
}

pub mod nodes;
pub mod types;
pub mod visitor;

pub use nodes::*;
pub use types::{ArrayLength, ChanDir, FieldDecl, TypeExpr, TypeExprKind, UnionTerm};

pub mod collector;
pub mod comparable;
pub mod resolver;
pub mod shape;

pub use collector::{collect, CollectOptions, Collection, ComparableType, SkipReason, Skipped};
pub use comparable::{is_comparable, Analyzer, RejectReason, Rejection};
pub use resolver::{ResolveError, Resolver};
pub use shape::{ArrayLen, BasicKind, FieldShape, OpaqueKind, TypeShape};

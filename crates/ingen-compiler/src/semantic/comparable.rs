use std::fmt;

use ingen_common::ComparabilityPolicy;

use super::shape::{OpaqueKind, TypeShape};

/// Decides whether values of a shape support `==`.
///
/// Pure: the answer depends on the shape and the policy only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Analyzer {
    policy: ComparabilityPolicy,
}

/// Why a shape is not comparable, and where inside it the offending part sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Field and element selectors leading to the offending shape, e.g. `Inner.Tags`.
    pub path: String,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Sequence,
    Mapping,
    Function,
}

impl Analyzer {
    pub fn new(policy: ComparabilityPolicy) -> Self {
        Self { policy }
    }

    pub fn is_comparable(&self, shape: &TypeShape) -> bool {
        match shape {
            TypeShape::Sequence(_) | TypeShape::Mapping { .. } => false,
            TypeShape::Array { elem, .. } => self.is_comparable(elem),
            TypeShape::NamedAlias { underlying, .. } => self.is_comparable(underlying),
            TypeShape::Struct(fields) => fields.iter().all(|f| self.is_comparable(&f.shape)),
            TypeShape::Opaque(kind) => self.opaque_is_comparable(kind),
        }
    }

    /// Like [`Analyzer::is_comparable`], but reports the first offending part.
    /// Returns `None` exactly when the shape is comparable.
    pub fn explain(&self, shape: &TypeShape) -> Option<Rejection> {
        self.explain_at(shape, String::new())
    }

    fn explain_at(&self, shape: &TypeShape, path: String) -> Option<Rejection> {
        let reason = match shape {
            TypeShape::Sequence(_) => RejectReason::Sequence,
            TypeShape::Mapping { .. } => RejectReason::Mapping,
            TypeShape::Array { elem, .. } => return self.explain_at(elem, join(&path, "[]")),
            TypeShape::NamedAlias { underlying, .. } => return self.explain_at(underlying, path),
            TypeShape::Struct(fields) => {
                return fields
                    .iter()
                    .find_map(|f| self.explain_at(&f.shape, join(&path, &f.name)));
            }
            TypeShape::Opaque(kind) if !self.opaque_is_comparable(kind) => RejectReason::Function,
            TypeShape::Opaque(_) => return None,
        };
        Some(Rejection { path, reason })
    }

    fn opaque_is_comparable(&self, kind: &OpaqueKind) -> bool {
        !matches!(
            (self.policy, kind),
            (ComparabilityPolicy::Strict, OpaqueKind::Function)
        )
    }
}

/// Comparability under the default, permissive policy.
pub fn is_comparable(shape: &TypeShape) -> bool {
    Analyzer::default().is_comparable(shape)
}

fn join(path: &str, segment: &str) -> String {
    match (path.is_empty(), segment) {
        (true, _) => segment.to_string(),
        (false, "[]") => format!("{path}[]"),
        (false, _) => format!("{path}.{segment}"),
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Sequence => write!(f, "slices are not comparable"),
            RejectReason::Mapping => write!(f, "maps are not comparable"),
            RejectReason::Function => write!(f, "funcs are not comparable"),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.reason)
        } else {
            write!(f, "{}: {}", self.path, self.reason)
        }
    }
}

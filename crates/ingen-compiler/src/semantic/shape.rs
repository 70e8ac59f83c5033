use std::fmt;

/// Structural shape of a declared type, as far as equality is concerned.
///
/// Separate from the AST `TypeExpr` so the analysis can reason about
/// types without caring about spans, syntax or names of the declarations
/// that produced them. Method sets and interface satisfaction are not
/// modelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    /// A named type standing over its underlying shape.
    NamedAlias {
        name: String,
        underlying: Box<TypeShape>,
    },

    /// `[N]T`
    Array { len: ArrayLen, elem: Box<TypeShape> },

    /// `struct { ... }`
    Struct(Vec<FieldShape>),

    /// `[]T`, a dynamically sized container.
    Sequence(Box<TypeShape>),

    /// `map[K]V`
    Mapping {
        key: Box<TypeShape>,
        value: Box<TypeShape>,
    },

    /// Everything whose structure the analysis does not look into.
    Opaque(OpaqueKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldShape {
    pub name: String,
    pub shape: TypeShape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayLen {
    Known(u64),
    /// A constant expression left unevaluated, e.g. `N*2`.
    Symbolic(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpaqueKind {
    Basic(BasicKind),
    Pointer,
    Channel,
    Function,
    Interface,
    /// A type parameter of the enclosing generic declaration.
    TypeParam(String),
    /// A type declared in another package.
    External { package: Option<String>, name: String },
    /// A reference back to a declaration that is still being resolved,
    /// reached through a slice or map.
    Recursive(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicKind {
    Bool,
    String,
    Integer,
    Float,
    Complex,
}

impl TypeShape {
    pub fn named(name: impl Into<String>, underlying: TypeShape) -> Self {
        TypeShape::NamedAlias {
            name: name.into(),
            underlying: Box::new(underlying),
        }
    }

    pub fn array(len: u64, elem: TypeShape) -> Self {
        TypeShape::Array {
            len: ArrayLen::Known(len),
            elem: Box::new(elem),
        }
    }

    pub fn sequence(elem: TypeShape) -> Self {
        TypeShape::Sequence(Box::new(elem))
    }

    pub fn mapping(key: TypeShape, value: TypeShape) -> Self {
        TypeShape::Mapping {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn basic(kind: BasicKind) -> Self {
        TypeShape::Opaque(OpaqueKind::Basic(kind))
    }

    /// Shape of a predeclared identifier, if `name` is one.
    pub fn predeclared(name: &str) -> Option<Self> {
        let kind = match name {
            "bool" => OpaqueKind::Basic(BasicKind::Bool),
            "string" => OpaqueKind::Basic(BasicKind::String),
            "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16"
            | "uint32" | "uint64" | "uintptr" | "byte" | "rune" => {
                OpaqueKind::Basic(BasicKind::Integer)
            }
            "float32" | "float64" => OpaqueKind::Basic(BasicKind::Float),
            "complex64" | "complex128" => OpaqueKind::Basic(BasicKind::Complex),
            "error" | "any" | "comparable" => OpaqueKind::Interface,
            _ => return None,
        };
        Some(TypeShape::Opaque(kind))
    }
}

impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeShape::NamedAlias { name, .. } => write!(f, "{name}"),
            TypeShape::Array { len, elem } => write!(f, "[{len}]{elem}"),
            TypeShape::Struct(fields) => {
                write!(f, "struct{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{} {}", field.name, field.shape)?;
                }
                write!(f, "}}")
            }
            TypeShape::Sequence(elem) => write!(f, "[]{elem}"),
            TypeShape::Mapping { key, value } => write!(f, "map[{key}]{value}"),
            TypeShape::Opaque(kind) => write!(f, "{kind}"),
        }
    }
}

impl fmt::Display for ArrayLen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayLen::Known(n) => write!(f, "{n}"),
            ArrayLen::Symbolic(text) => write!(f, "{text}"),
        }
    }
}

impl fmt::Display for OpaqueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpaqueKind::Basic(BasicKind::Bool) => write!(f, "bool"),
            OpaqueKind::Basic(BasicKind::String) => write!(f, "string"),
            OpaqueKind::Basic(BasicKind::Integer) => write!(f, "integer"),
            OpaqueKind::Basic(BasicKind::Float) => write!(f, "float"),
            OpaqueKind::Basic(BasicKind::Complex) => write!(f, "complex"),
            OpaqueKind::Pointer => write!(f, "pointer"),
            OpaqueKind::Channel => write!(f, "chan"),
            OpaqueKind::Function => write!(f, "func"),
            OpaqueKind::Interface => write!(f, "interface"),
            OpaqueKind::TypeParam(name) => write!(f, "{name}"),
            OpaqueKind::External {
                package: Some(package),
                name,
            } => write!(f, "{package}.{name}"),
            OpaqueKind::External {
                package: None,
                name,
            } => write!(f, "{name}"),
            OpaqueKind::Recursive(name) => write!(f, "{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predeclared_names() {
        assert_eq!(
            TypeShape::predeclared("byte"),
            Some(TypeShape::basic(BasicKind::Integer))
        );
        assert_eq!(
            TypeShape::predeclared("error"),
            Some(TypeShape::Opaque(OpaqueKind::Interface))
        );
        assert_eq!(TypeShape::predeclared("Point"), None);
    }

    #[test]
    fn display_is_compact() {
        let shape = TypeShape::Struct(vec![
            FieldShape {
                name: "Tags".into(),
                shape: TypeShape::sequence(TypeShape::basic(BasicKind::String)),
            },
            FieldShape {
                name: "Grid".into(),
                shape: TypeShape::array(3, TypeShape::basic(BasicKind::Float)),
            },
        ]);
        assert_eq!(shape.to_string(), "struct{Tags []string; Grid [3]float}");
    }
}

use ingen_common::Span;

/// A type expression as written in the source, e.g. `map[string][]Point`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExprKind {
    /// `Name`, `pkg.Name`, `Name[A, B]`
    Name {
        package: Option<String>,
        name: String,
        args: Vec<TypeExpr>,
    },

    /// `[N]T`
    Array {
        len: ArrayLength,
        elem: Box<TypeExpr>,
    },

    /// `[]T`
    Slice(Box<TypeExpr>),

    /// `map[K]V`
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },

    /// `*T`
    Pointer(Box<TypeExpr>),

    /// `chan T`, `chan<- T`, `<-chan T`
    Chan { dir: ChanDir, elem: Box<TypeExpr> },

    /// `func(...) ...`. Parameters and results are not modelled.
    Func,

    /// `interface { ... }`. Members are not modelled.
    Interface,

    /// `struct { ... }`
    Struct(Vec<FieldDecl>),

    /// `(T)`
    Paren(Box<TypeExpr>),

    /// `~int | ~string`, only in type parameter constraints.
    Union(Vec<UnionTerm>),
}

/// Length of an array type. The text is kept for rendering; the value is
/// known only for plain integer literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayLength {
    pub text: String,
    pub value: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// One line of a struct body: `A, B int` or an embedded `*pkg.T`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    /// Empty for embedded fields.
    pub names: Vec<String>,
    pub ty: TypeExpr,
    pub tag: Option<String>,
    pub span: Span,
}

impl FieldDecl {
    pub fn is_embedded(&self) -> bool {
        self.names.is_empty()
    }

    /// Field names as seen by selectors. An embedded field is named after its
    /// type, without package qualifier or type arguments.
    pub fn field_names(&self) -> Vec<String> {
        if !self.is_embedded() {
            return self.names.clone();
        }
        let mut ty = &self.ty;
        loop {
            match &ty.kind {
                TypeExprKind::Pointer(inner) | TypeExprKind::Paren(inner) => ty = inner,
                TypeExprKind::Name { name, .. } => return vec![name.clone()],
                _ => return vec!["_".to_string()],
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionTerm {
    pub tilde: bool,
    pub ty: TypeExpr,
}

impl TypeExpr {
    pub fn new(kind: TypeExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Render back to compact Go syntax. Used in log messages.
    pub fn display(&self) -> String {
        match &self.kind {
            TypeExprKind::Name {
                package,
                name,
                args,
            } => {
                let mut out = match package {
                    Some(pkg) => format!("{pkg}.{name}"),
                    None => name.clone(),
                };
                if !args.is_empty() {
                    let args: Vec<_> = args.iter().map(TypeExpr::display).collect();
                    out.push_str(&format!("[{}]", args.join(", ")));
                }
                out
            }
            TypeExprKind::Array { len, elem } => format!("[{}]{}", len.text, elem.display()),
            TypeExprKind::Slice(elem) => format!("[]{}", elem.display()),
            TypeExprKind::Map { key, value } => {
                format!("map[{}]{}", key.display(), value.display())
            }
            TypeExprKind::Pointer(elem) => format!("*{}", elem.display()),
            TypeExprKind::Chan { dir, elem } => match dir {
                ChanDir::Both => format!("chan {}", elem.display()),
                ChanDir::Send => format!("chan<- {}", elem.display()),
                ChanDir::Recv => format!("<-chan {}", elem.display()),
            },
            TypeExprKind::Func => "func(...)".to_string(),
            TypeExprKind::Interface => "interface{...}".to_string(),
            TypeExprKind::Struct(fields) => {
                if fields.is_empty() {
                    "struct{}".to_string()
                } else {
                    "struct{...}".to_string()
                }
            }
            TypeExprKind::Paren(inner) => format!("({})", inner.display()),
            TypeExprKind::Union(terms) => {
                let terms: Vec<_> = terms
                    .iter()
                    .map(|t| {
                        if t.tilde {
                            format!("~{}", t.ty.display())
                        } else {
                            t.ty.display()
                        }
                    })
                    .collect();
                terms.join(" | ")
            }
        }
    }
}

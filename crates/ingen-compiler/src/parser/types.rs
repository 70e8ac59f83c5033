use crate::ast::*;
use crate::lexer::token::TokenKind;

use super::Parser;

impl Parser {
    /// Parse a type expression.
    pub(super) fn parse_type(&mut self) -> Option<TypeExpr> {
        let start = self.current_span();
        let kind = match self.peek() {
            TokenKind::Identifier => return self.parse_type_name(),
            TokenKind::LeftBracket => return self.parse_array_or_slice(),
            TokenKind::Map => {
                self.advance();
                self.expect(TokenKind::LeftBracket, "'['")?;
                let key = self.parse_type()?;
                self.expect(TokenKind::RightBracket, "']'")?;
                let value = self.parse_type()?;
                TypeExprKind::Map {
                    key: Box::new(key),
                    value: Box::new(value),
                }
            }
            TokenKind::Chan => {
                self.advance();
                let dir = if self.eat(TokenKind::Arrow) {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                let elem = self.parse_type()?;
                TypeExprKind::Chan {
                    dir,
                    elem: Box::new(elem),
                }
            }
            TokenKind::Arrow => {
                self.advance();
                self.expect(TokenKind::Chan, "'chan'")?;
                let elem = self.parse_type()?;
                TypeExprKind::Chan {
                    dir: ChanDir::Recv,
                    elem: Box::new(elem),
                }
            }
            TokenKind::Star => {
                self.advance();
                TypeExprKind::Pointer(Box::new(self.parse_type()?))
            }
            TokenKind::Func => {
                self.advance();
                self.skip_signature()?;
                TypeExprKind::Func
            }
            TokenKind::Interface => {
                self.advance();
                if self.peek() != TokenKind::LeftBrace {
                    self.expect(TokenKind::LeftBrace, "'{'")?;
                }
                self.skip_group()?;
                TypeExprKind::Interface
            }
            TokenKind::Struct => {
                self.advance();
                TypeExprKind::Struct(self.parse_struct_fields()?)
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_type()?;
                self.expect(TokenKind::RightParen, "')'")?;
                TypeExprKind::Paren(Box::new(inner))
            }
            _ => {
                let found = super::describe(self.current());
                self.diagnostics
                    .error(format!("expected type, found {found}"), start);
                return None;
            }
        };
        let span = start.to(&self.previous_span());
        Some(TypeExpr::new(kind, span))
    }

    /// Parse `Name`, `pkg.Name`, optionally followed by `[TypeArgs]`.
    pub(super) fn parse_type_name(&mut self) -> Option<TypeExpr> {
        let start = self.current_span();
        let first = self.expect_ident()?;
        let (package, name) = if self.eat(TokenKind::Period) {
            (Some(first), self.expect_ident()?)
        } else {
            (None, first)
        };

        let mut args = Vec::new();
        if self.eat(TokenKind::LeftBracket) {
            loop {
                args.push(self.parse_type()?);
                if !self.eat(TokenKind::Comma) || self.peek() == TokenKind::RightBracket {
                    break;
                }
            }
            self.expect(TokenKind::RightBracket, "']'")?;
        }

        let span = start.to(&self.previous_span());
        Some(TypeExpr::new(
            TypeExprKind::Name {
                package,
                name,
                args,
            },
            span,
        ))
    }

    /// Parse `[]T` or `[N]T`.
    fn parse_array_or_slice(&mut self) -> Option<TypeExpr> {
        let start = self.current_span();
        self.advance(); // consume '['

        if self.eat(TokenKind::RightBracket) {
            let elem = self.parse_type()?;
            let span = start.to(&self.previous_span());
            return Some(TypeExpr::new(TypeExprKind::Slice(Box::new(elem)), span));
        }
        if self.peek() == TokenKind::Ellipsis {
            let span = self.current_span();
            self.diagnostics.error(
                "invalid use of [...] array outside of a composite literal",
                span,
            );
            return None;
        }

        let len = self.parse_array_length()?;
        self.expect(TokenKind::RightBracket, "']'")?;
        let elem = self.parse_type()?;
        let span = start.to(&self.previous_span());
        Some(TypeExpr::new(
            TypeExprKind::Array {
                len,
                elem: Box::new(elem),
            },
            span,
        ))
    }

    /// Collect the constant expression between `[` and `]`. Only plain
    /// integer literals are evaluated.
    fn parse_array_length(&mut self) -> Option<ArrayLength> {
        let start = self.pos;
        let mut depth = 0usize;
        let mut text = String::new();
        loop {
            match self.peek() {
                TokenKind::RightBracket if depth == 0 => break,
                TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace => {
                    depth += 1;
                }
                TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace => {
                    depth = depth.saturating_sub(1);
                }
                TokenKind::Eof | TokenKind::Semicolon => {
                    let found = super::describe(self.current());
                    let span = self.current_span();
                    self.diagnostics
                        .error(format!("expected ']', found {found}"), span);
                    return None;
                }
                _ => {}
            }
            text.push_str(&self.advance().lexeme);
        }

        if text.is_empty() {
            let span = self.current_span();
            self.diagnostics.error("expected array length", span);
            return None;
        }
        let single_int =
            self.pos == start + 1 && self.tokens[start].kind == TokenKind::IntLiteral;
        let value = if single_int {
            parse_int_literal(&text)
        } else {
            None
        };
        Some(ArrayLength { text, value })
    }

    /// Parse a type parameter constraint: a type, or a union of `~T` terms.
    pub(super) fn parse_constraint(&mut self) -> Option<TypeExpr> {
        let start = self.current_span();
        let mut terms = Vec::new();
        loop {
            let tilde = self.eat(TokenKind::Tilde);
            let ty = self.parse_type()?;
            terms.push(UnionTerm { tilde, ty });
            if !self.eat(TokenKind::Pipe) {
                break;
            }
        }
        if terms.len() == 1 && !terms[0].tilde {
            return terms.pop().map(|term| term.ty);
        }
        let span = start.to(&self.previous_span());
        Some(TypeExpr::new(TypeExprKind::Union(terms), span))
    }

    /// Skip a function signature: parameters and an optional result.
    fn skip_signature(&mut self) -> Option<()> {
        if self.peek() != TokenKind::LeftParen {
            self.expect(TokenKind::LeftParen, "'('")?;
        }
        self.skip_group()?;
        match self.peek() {
            TokenKind::LeftParen => self.skip_group(),
            kind if starts_type(kind) => self.parse_type().map(|_| ()),
            _ => Some(()),
        }
    }

    // ========================================================================
    // struct bodies
    // ========================================================================

    /// Parse `{ FieldDecl; ... }`.
    fn parse_struct_fields(&mut self) -> Option<Vec<FieldDecl>> {
        self.expect(TokenKind::LeftBrace, "'{'")?;
        let mut fields = Vec::new();
        while self.peek() != TokenKind::RightBrace && !self.is_at_end() {
            if self.eat(TokenKind::Semicolon) {
                continue;
            }
            fields.push(self.parse_field_decl()?);
            if self.peek() != TokenKind::RightBrace {
                self.end_statement()?;
            }
        }
        self.expect(TokenKind::RightBrace, "'}'")?;
        Some(fields)
    }

    /// Parse `A, B T "tag"` or an embedded `[*]pkg.T[Args] "tag"`.
    fn parse_field_decl(&mut self) -> Option<FieldDecl> {
        let start = self.current_span();
        let (names, ty) = match self.peek() {
            TokenKind::Star => {
                self.advance();
                let inner = self.parse_type_name()?;
                let span = start.to(&inner.span);
                (Vec::new(), TypeExpr::new(TypeExprKind::Pointer(Box::new(inner)), span))
            }
            TokenKind::Identifier if self.field_is_embedded() => {
                (Vec::new(), self.parse_type_name()?)
            }
            TokenKind::Identifier => {
                let mut names = vec![self.expect_ident()?];
                while self.eat(TokenKind::Comma) {
                    names.push(self.expect_ident()?);
                }
                (names, self.parse_type()?)
            }
            _ => {
                let found = super::describe(self.current());
                self.diagnostics.error(
                    format!("expected field name or embedded type, found {found}"),
                    start,
                );
                return None;
            }
        };

        let tag = if self.peek() == TokenKind::StringLiteral {
            Some(self.advance().string_value())
        } else {
            None
        };
        let span = start.to(&self.previous_span());
        Some(FieldDecl {
            names,
            ty,
            tag,
            span,
        })
    }

    /// Decide whether the identifier at the cursor starts an embedded field.
    /// `T`, `pkg.T` and `List[int]` are embedded; `a [4]int` declares `a`.
    fn field_is_embedded(&self) -> bool {
        match self.peek_at(1) {
            TokenKind::Semicolon
            | TokenKind::RightBrace
            | TokenKind::StringLiteral
            | TokenKind::Period => true,
            TokenKind::LeftBracket => matches!(
                self.kind_after_group(1),
                TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::StringLiteral
            ),
            _ => false,
        }
    }
}

fn starts_type(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Identifier
            | TokenKind::LeftBracket
            | TokenKind::Map
            | TokenKind::Chan
            | TokenKind::Arrow
            | TokenKind::Star
            | TokenKind::Func
            | TokenKind::Interface
            | TokenKind::Struct
    )
}

/// Value of a Go integer literal, if it fits in a `u64`.
fn parse_int_literal(text: &str) -> Option<u64> {
    let digits: String = text
        .chars()
        .filter(|c| *c != '_')
        .collect::<String>()
        .to_ascii_lowercase();
    let (body, radix) = if let Some(rest) = digits.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = digits.strip_prefix("0b") {
        (rest, 2)
    } else if let Some(rest) = digits.strip_prefix("0o") {
        (rest, 8)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (&digits[1..], 8)
    } else {
        (digits.as_str(), 10)
    };
    u64::from_str_radix(body, radix).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    /// Parse `type T <source>` and return the type expression.
    fn parse_ty(source: &str) -> TypeExpr {
        let file_source = format!("package p\ntype T {source}\n");
        let (tokens, lex_diags) = Lexer::new(file_source.as_str(), "test.go").tokenize();
        assert!(!lex_diags.has_errors(), "{:?}", lex_diags.diagnostics());
        let (file, diags) = Parser::new(tokens).parse();
        assert!(!diags.has_errors(), "{:?}", diags.diagnostics());
        let spec = file.type_specs().next().expect("one spec");
        spec.ty.clone()
    }

    fn struct_fields(ty: &TypeExpr) -> &[FieldDecl] {
        match &ty.kind {
            TypeExprKind::Struct(fields) => fields,
            other => panic!("expected struct, got {other:?}"),
        }
    }

    #[test]
    fn named_and_qualified() {
        assert_eq!(parse_ty("int").display(), "int");
        match parse_ty("time.Duration").kind {
            TypeExprKind::Name { package, name, args } => {
                assert_eq!(package.as_deref(), Some("time"));
                assert_eq!(name, "Duration");
                assert!(args.is_empty());
            }
            other => panic!("expected name, got {other:?}"),
        }
    }

    #[test]
    fn generic_instantiation() {
        assert_eq!(
            parse_ty("Pair[string, []int]").display(),
            "Pair[string, []int]"
        );
    }

    #[test]
    fn composite_types() {
        assert_eq!(parse_ty("[]*Node").display(), "[]*Node");
        assert_eq!(parse_ty("map[string][2]int").display(), "map[string][2]int");
        assert_eq!(parse_ty("chan<- int").display(), "chan<- int");
        assert_eq!(parse_ty("<-chan int").display(), "<-chan int");
        assert_eq!(parse_ty("chan struct{}").display(), "chan struct{}");
        assert_eq!(parse_ty("(int)").display(), "(int)");
    }

    #[test]
    fn array_length_values() {
        let cases = [("[4]int", Some(4)), ("[0x10]int", Some(16)), ("[1_000]int", Some(1000)), ("[010]int", Some(8)), ("[N]int", None), ("[2*N]int", None)];
        for (source, expected) in cases {
            match parse_ty(source).kind {
                TypeExprKind::Array { len, .. } => assert_eq!(len.value, expected, "{source}"),
                other => panic!("expected array for {source}, got {other:?}"),
            }
        }
    }

    #[test]
    fn func_and_interface_types_are_opaque() {
        assert_eq!(parse_ty("func(a, b int) (string, error)").kind, TypeExprKind::Func);
        assert_eq!(parse_ty("func() error").kind, TypeExprKind::Func);
        assert_eq!(parse_ty("func()").kind, TypeExprKind::Func);
        assert_eq!(
            parse_ty("interface {\n\tString() string\n\tio.Reader\n}").kind,
            TypeExprKind::Interface
        );
    }

    #[test]
    fn struct_fields_with_tags_and_groups() {
        let ty = parse_ty(
            "struct {\n\tX, Y int `json:\"x\"`\n\tName string\n\tOnChange func(int)\n\tTags []string\n}",
        );
        let fields = struct_fields(&ty);
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0].names, ["X", "Y"]);
        assert_eq!(fields[0].tag.as_deref(), Some("json:\"x\""));
        assert_eq!(fields[2].ty.kind, TypeExprKind::Func);
        assert_eq!(fields[3].ty.display(), "[]string");
    }

    #[test]
    fn embedded_fields() {
        let ty = parse_ty(
            "struct {\n\tBase\n\t*Node\n\tsync.Mutex\n\tList[int]\n\tdata [4]int\n\tLabel `tag`\n}",
        );
        let fields = struct_fields(&ty);
        let embedded: Vec<_> = fields.iter().map(FieldDecl::is_embedded).collect();
        assert_eq!(embedded, [true, true, true, true, false, true]);
        let names: Vec<_> = fields.iter().flat_map(FieldDecl::field_names).collect();
        assert_eq!(names, ["Base", "Node", "Mutex", "List", "data", "Label"]);
    }

    #[test]
    fn single_line_struct() {
        let ty = parse_ty("struct{ A int; B string }");
        assert_eq!(struct_fields(&ty).len(), 2);
    }

    #[test]
    fn ellipsis_array_is_error() {
        let (tokens, _) = Lexer::new("package p\ntype T [...]int\n", "t.go").tokenize();
        let (_, diags) = Parser::new(tokens).parse();
        assert_eq!(
            diags.diagnostics()[0].message,
            "invalid use of [...] array outside of a composite literal"
        );
    }

    #[test]
    fn int_literal_forms() {
        assert_eq!(parse_int_literal("42"), Some(42));
        assert_eq!(parse_int_literal("0b101"), Some(5));
        assert_eq!(parse_int_literal("0o17"), Some(15));
        assert_eq!(parse_int_literal("0XFF"), Some(255));
        assert_eq!(parse_int_literal("0"), Some(0));
        assert_eq!(parse_int_literal("99999999999999999999999"), None);
    }
}

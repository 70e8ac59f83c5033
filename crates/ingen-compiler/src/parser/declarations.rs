use crate::ast::*;
use crate::lexer::token::TokenKind;

use super::Parser;

impl Parser {
    // ========================================================================
    // Package clause and imports
    // ========================================================================

    /// Parse `package name`.
    pub(super) fn parse_package_clause(&mut self) -> Option<String> {
        while self.eat(TokenKind::Semicolon) {}
        self.expect(TokenKind::Package, "package clause")?;
        let name = self.expect_ident()?;
        if name == "_" {
            let span = self.previous_span();
            self.diagnostics.error("invalid package name _", span);
        }
        self.end_statement()?;
        Some(name)
    }

    /// Parse every leading `import` declaration.
    pub(super) fn parse_imports(&mut self) -> Vec<ImportSpec> {
        let mut imports = Vec::new();
        loop {
            while self.eat(TokenKind::Semicolon) {}
            if self.peek() != TokenKind::Import {
                return imports;
            }
            if self.parse_import_decl(&mut imports).is_none() {
                self.synchronize();
            }
        }
    }

    /// Parse `import "path"` or `import ( ... )`.
    fn parse_import_decl(&mut self, imports: &mut Vec<ImportSpec>) -> Option<()> {
        self.advance(); // consume 'import'
        if self.eat(TokenKind::LeftParen) {
            while self.peek() != TokenKind::RightParen && !self.is_at_end() {
                if self.eat(TokenKind::Semicolon) {
                    continue;
                }
                imports.push(self.parse_import_spec()?);
                self.end_statement()?;
            }
            self.expect(TokenKind::RightParen, "')'")?;
        } else {
            imports.push(self.parse_import_spec()?);
        }
        self.end_statement()
    }

    /// Parse `[alias | . | _] "path"`.
    fn parse_import_spec(&mut self) -> Option<ImportSpec> {
        let start = self.current_span();
        let alias = match self.peek() {
            TokenKind::Identifier => Some(self.advance().lexeme.clone()),
            TokenKind::Period => {
                self.advance();
                Some(".".to_string())
            }
            _ => None,
        };
        let path = self
            .expect(TokenKind::StringLiteral, "import path")?
            .string_value();
        if path.is_empty() {
            let span = self.previous_span();
            self.diagnostics.error("invalid import path \"\"", span);
        }
        let span = start.to(&self.previous_span());
        Some(ImportSpec { alias, path, span })
    }

    // ========================================================================
    // Top-level declarations
    // ========================================================================

    pub(super) fn parse_declaration(&mut self) -> Option<Decl> {
        match self.peek() {
            TokenKind::Type => self.parse_type_decl(),
            TokenKind::Func => self.parse_func_decl(),
            TokenKind::Var => self.parse_value_decl(ValueKind::Var),
            TokenKind::Const => self.parse_value_decl(ValueKind::Const),
            TokenKind::Import => {
                let span = self.current_span();
                self.diagnostics
                    .error("imports must appear before other declarations", span);
                None
            }
            _ => {
                let found = super::describe(self.current());
                let span = self.current_span();
                self.diagnostics
                    .error(format!("expected declaration, found {found}"), span);
                None
            }
        }
    }

    // ========================================================================
    // type declarations
    // ========================================================================

    /// Parse `type Spec` or `type ( Spec; Spec; ... )`.
    fn parse_type_decl(&mut self) -> Option<Decl> {
        let start = self.current_span();
        self.advance(); // consume 'type'

        let mut specs = Vec::new();
        if self.eat(TokenKind::LeftParen) {
            while self.peek() != TokenKind::RightParen && !self.is_at_end() {
                if self.eat(TokenKind::Semicolon) {
                    continue;
                }
                match self.parse_type_spec() {
                    Some(spec) => {
                        specs.push(spec);
                        if self.end_statement().is_none() {
                            self.skip_to_terminator();
                        }
                    }
                    None => self.skip_to_terminator(),
                }
            }
            self.expect(TokenKind::RightParen, "')'")?;
        } else {
            specs.push(self.parse_type_spec()?);
        }
        self.end_statement()?;

        let span = start.to(&self.previous_span());
        Some(Decl::Type(TypeDecl { specs, span }))
    }

    /// Parse `Name [TypeParams] [=] Type`.
    fn parse_type_spec(&mut self) -> Option<TypeSpec> {
        let start = self.current_span();
        let name = self.expect_ident()?;

        let type_params = if self.peek() == TokenKind::LeftBracket && self.starts_type_params() {
            self.parse_type_params()?
        } else {
            Vec::new()
        };

        let is_alias = self.eat(TokenKind::Assign);
        let ty = self.parse_type()?;
        let span = start.to(&self.previous_span());

        Some(TypeSpec {
            name,
            type_params,
            is_alias,
            ty,
            span,
        })
    }

    /// Whether the `[` after a type name opens a type parameter list rather
    /// than an array length. `type A [N]int` is an array; `type A[T any] ...`
    /// is generic. `[P *C]` is read as an array length, as Go does.
    fn starts_type_params(&self) -> bool {
        self.peek_at(1) == TokenKind::Identifier
            && matches!(
                self.peek_at(2),
                TokenKind::Identifier
                    | TokenKind::Comma
                    | TokenKind::Interface
                    | TokenKind::Tilde
                    | TokenKind::LeftBracket
                    | TokenKind::Func
                    | TokenKind::Map
                    | TokenKind::Chan
                    | TokenKind::Struct
            )
    }

    /// Parse `[K comparable, V any]` or `[A, B Number]`.
    fn parse_type_params(&mut self) -> Option<Vec<TypeParam>> {
        self.expect(TokenKind::LeftBracket, "'['")?;
        let mut params = Vec::new();
        loop {
            let mut names = vec![self.expect_ident()?];
            while self.eat(TokenKind::Comma) {
                names.push(self.expect_ident()?);
            }
            let constraint = self.parse_constraint()?;
            params.extend(names.into_iter().map(|name| TypeParam {
                name,
                constraint: constraint.clone(),
            }));
            if !self.eat(TokenKind::Comma) || self.peek() == TokenKind::RightBracket {
                break;
            }
        }
        self.expect(TokenKind::RightBracket, "']'")?;
        Some(params)
    }

    // ========================================================================
    // func / var / const (headers only)
    // ========================================================================

    /// Parse `func [(recv)] Name ...`, skipping signature and body.
    fn parse_func_decl(&mut self) -> Option<Decl> {
        let start = self.current_span();
        self.advance(); // consume 'func'

        let receiver = if self.peek() == TokenKind::LeftParen {
            self.parse_receiver()?
        } else {
            None
        };
        let name = self.expect_ident()?;
        self.skip_to_terminator();
        let span = start.to(&self.previous_span());
        self.end_statement()?;

        Some(Decl::Func(FuncDecl {
            name,
            receiver,
            span,
        }))
    }

    /// Parse a receiver list and return its base type name: the last
    /// identifier directly inside the parentheses.
    fn parse_receiver(&mut self) -> Option<Option<String>> {
        self.advance(); // consume '('
        let mut depth = 0usize;
        let mut base = None;
        loop {
            match self.peek() {
                TokenKind::RightParen if depth == 0 => {
                    self.advance();
                    return Some(base);
                }
                TokenKind::Identifier if depth == 0 => {
                    base = Some(self.current().lexeme.clone());
                }
                TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace => {
                    depth += 1;
                }
                TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace => {
                    depth = depth.saturating_sub(1);
                }
                TokenKind::Eof => {
                    let span = self.current_span();
                    self.diagnostics.error("unclosed receiver list", span);
                    return None;
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// Parse `var ...` / `const ...`, skipping the contents.
    fn parse_value_decl(&mut self, kind: ValueKind) -> Option<Decl> {
        let start = self.current_span();
        self.advance(); // consume 'var' / 'const'
        self.skip_to_terminator();
        let span = start.to(&self.previous_span());
        self.end_statement()?;
        Some(Decl::Value(ValueDecl { kind, span }))
    }
}

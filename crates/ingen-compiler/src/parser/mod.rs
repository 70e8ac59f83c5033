mod declarations;
mod types;

use std::sync::Arc;

use ingen_common::{DiagnosticBag, Span};

use crate::ast::*;
use crate::lexer::token::{Token, TokenKind};
use crate::lexer::Lexer;

/// Lex and parse one Go source file.
pub fn parse_file(source: &str, file: impl Into<Arc<str>>) -> (SourceFile, DiagnosticBag) {
    let (tokens, mut diagnostics) = Lexer::new(source, file).tokenize();
    let (ast, parse_diags) = Parser::new(tokens).parse();
    diagnostics.absorb(parse_diags);
    (ast, diagnostics)
}

/// Recursive descent parser for the declaration level of Go files.
///
/// Type declarations are parsed in full. Function, variable and constant
/// declarations are recorded by header only and their bodies skipped.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: DiagnosticBag,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let span = tokens
                .last()
                .map(|t| t.span.clone())
                .unwrap_or_else(Span::synthetic);
            tokens.push(Token::eof(span));
        }
        Self {
            tokens,
            pos: 0,
            diagnostics: DiagnosticBag::new(),
        }
    }

    /// Parse the token stream into a `SourceFile`.
    pub fn parse(mut self) -> (SourceFile, DiagnosticBag) {
        let start = self.current_span();
        let package = self.parse_package_clause().unwrap_or_default();
        let imports = self.parse_imports();

        let mut decls = Vec::new();
        while !self.is_at_end() {
            if self.eat(TokenKind::Semicolon) {
                continue;
            }
            match self.parse_declaration() {
                Some(decl) => decls.push(decl),
                None => self.synchronize(),
            }
        }

        let span = start.to(&self.current_span());
        let file = SourceFile {
            package,
            imports,
            decls,
            span,
        };
        (file, self.diagnostics)
    }

    // ========================================================================
    // Token manipulation helpers
    // ========================================================================

    fn peek(&self) -> TokenKind {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1)]
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.pos += 1;
        }
        self.previous()
    }

    /// Consume a token of the expected kind, or report an error.
    fn expect(&mut self, kind: TokenKind, what: &str) -> Option<&Token> {
        if self.peek() == kind {
            return Some(self.advance());
        }
        let found = describe(self.current());
        let span = self.current_span();
        self.diagnostics
            .error(format!("expected {what}, found {found}"), span);
        None
    }

    fn expect_ident(&mut self) -> Option<String> {
        self.expect(TokenKind::Identifier, "identifier")
            .map(|t| t.lexeme.clone())
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn is_at_end(&self) -> bool {
        self.peek() == TokenKind::Eof
    }

    fn current_span(&self) -> Span {
        self.current().span.clone()
    }

    fn previous_span(&self) -> Span {
        self.previous().span.clone()
    }

    /// Require the end of a declaration or spec: `;`, or a closing
    /// delimiter which Go lets stand in for one.
    fn end_statement(&mut self) -> Option<()> {
        if self.eat(TokenKind::Semicolon)
            || matches!(
                self.peek(),
                TokenKind::RightParen | TokenKind::RightBrace | TokenKind::Eof
            )
        {
            return Some(());
        }
        let found = describe(self.current());
        let span = self.current_span();
        self.diagnostics
            .error(format!("expected ';' or newline, found {found}"), span);
        None
    }

    /// Consume a bracketed group starting at the current opener, through its
    /// matching closer.
    fn skip_group(&mut self) -> Option<()> {
        let start = self.current_span();
        let mut depth = 0usize;
        loop {
            match self.peek() {
                TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace => {
                    depth += 1;
                }
                TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.advance();
                        return Some(());
                    }
                }
                TokenKind::Eof => {
                    self.diagnostics.error("unclosed delimiter", start);
                    return None;
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// Skip to the `;` that ends the current declaration, staying inside the
    /// enclosing group. The terminator itself is not consumed.
    fn skip_to_terminator(&mut self) {
        let mut depth = 0usize;
        while !self.is_at_end() {
            match self.peek() {
                TokenKind::Semicolon if depth == 0 => return,
                TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace => {
                    depth += 1;
                }
                TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// Kind of the token right after the group opened at `pos + offset`.
    fn kind_after_group(&self, offset: usize) -> TokenKind {
        let mut depth = 0usize;
        let mut index = self.pos + offset;
        while let Some(token) = self.tokens.get(index) {
            match token.kind {
                TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace => {
                    depth += 1;
                }
                TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return self
                            .tokens
                            .get(index + 1)
                            .map_or(TokenKind::Eof, |t| t.kind);
                    }
                }
                TokenKind::Eof => return TokenKind::Eof,
                _ => {}
            }
            index += 1;
        }
        TokenKind::Eof
    }

    /// Error recovery: skip to the start of the next top-level declaration.
    fn synchronize(&mut self) {
        self.advance();
        let mut depth = 0usize;
        while !self.is_at_end() {
            if depth == 0 && self.previous().kind == TokenKind::Semicolon {
                return;
            }
            match self.peek() {
                TokenKind::Type | TokenKind::Func | TokenKind::Var | TokenKind::Const
                    if depth == 0 =>
                {
                    return;
                }
                TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace => {
                    depth += 1;
                }
                TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace => {
                    depth = depth.saturating_sub(1);
                }
                _ => {}
            }
            self.advance();
        }
    }
}

/// How a token is named in error messages.
fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::Eof => "end of file".to_string(),
        TokenKind::Semicolon if token.lexeme == "\n" => "newline".to_string(),
        _ => format!("'{}'", token.lexeme),
    }
}

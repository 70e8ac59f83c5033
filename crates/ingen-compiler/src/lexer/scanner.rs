use std::sync::Arc;

use ingen_common::{DiagnosticBag, Position};

use super::cursor::Cursor;
use super::token::{Token, TokenKind};

/// Hand-written lexer for Go source files.
///
/// Produces the full Go token set, including semicolons inserted at line
/// ends, so the parser can rely on `;` terminating every declaration.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    diagnostics: DiagnosticBag,
    last: Option<TokenKind>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str, file: impl Into<Arc<str>>) -> Self {
        Self {
            cursor: Cursor::new(source, file),
            diagnostics: DiagnosticBag::new(),
            last: None,
        }
    }

    /// Tokenize the whole file. The last token is always `Eof`.
    pub fn tokenize(mut self) -> (Vec<Token>, DiagnosticBag) {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        (tokens, self.diagnostics)
    }

    fn next_token(&mut self) -> Token {
        if let Some(at) = self.skip_trivia() {
            let span = self.cursor.span_from(at);
            return self.finish(Token::new(TokenKind::Semicolon, "\n", span));
        }

        let Some(ch) = self.cursor.peek() else {
            return self.end_of_input();
        };
        let start = self.cursor.position();
        self.cursor.advance();

        let kind = match ch {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '~' => TokenKind::Tilde,
            ':' => self.pick('=', TokenKind::Define, TokenKind::Colon),
            '.' => {
                if self.cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
                    return self.scan_number(start, '.');
                }
                if self.cursor.peek() == Some('.') && self.cursor.peek_second() == Some('.') {
                    self.cursor.advance();
                    self.cursor.advance();
                    TokenKind::Ellipsis
                } else {
                    TokenKind::Period
                }
            }
            '+' => self.arithmetic('+', TokenKind::PlusPlus, TokenKind::Plus),
            '-' => self.arithmetic('-', TokenKind::MinusMinus, TokenKind::Minus),
            '*' => self.pick('=', TokenKind::AssignOp, TokenKind::Star),
            '/' => self.pick('=', TokenKind::AssignOp, TokenKind::Slash),
            '%' => self.pick('=', TokenKind::AssignOp, TokenKind::Percent),
            '^' => self.pick('=', TokenKind::AssignOp, TokenKind::Caret),
            '=' => self.pick('=', TokenKind::EqualEqual, TokenKind::Assign),
            '!' => self.pick('=', TokenKind::BangEqual, TokenKind::Bang),
            '&' => {
                if self.cursor.eat('&') {
                    TokenKind::AmpAmp
                } else if self.cursor.eat('^') {
                    self.pick('=', TokenKind::AssignOp, TokenKind::AmpCaret)
                } else {
                    self.pick('=', TokenKind::AssignOp, TokenKind::Amp)
                }
            }
            '|' => {
                if self.cursor.eat('|') {
                    TokenKind::PipePipe
                } else {
                    self.pick('=', TokenKind::AssignOp, TokenKind::Pipe)
                }
            }
            '<' => {
                if self.cursor.eat('-') {
                    TokenKind::Arrow
                } else if self.cursor.eat('<') {
                    self.pick('=', TokenKind::AssignOp, TokenKind::ShiftLeft)
                } else {
                    self.pick('=', TokenKind::LessEqual, TokenKind::Less)
                }
            }
            '>' => {
                if self.cursor.eat('>') {
                    self.pick('=', TokenKind::AssignOp, TokenKind::ShiftRight)
                } else {
                    self.pick('=', TokenKind::GreaterEqual, TokenKind::Greater)
                }
            }
            '"' => return self.scan_string(start),
            '`' => return self.scan_raw_string(start),
            '\'' => return self.scan_rune(start),
            c if c.is_ascii_digit() => return self.scan_number(start, c),
            c if is_ident_start(c) => return self.scan_identifier(start),
            other => {
                let span = self.cursor.span_from(start);
                self.diagnostics
                    .error(format!("invalid character {other:?} in source"), span);
                TokenKind::Error
            }
        };
        self.make(kind, start)
    }

    fn make(&mut self, kind: TokenKind, start: Position) -> Token {
        let token = Token::new(kind, self.cursor.text_from(start), self.cursor.span_from(start));
        self.finish(token)
    }

    fn finish(&mut self, token: Token) -> Token {
        self.last = Some(token.kind);
        token
    }

    fn end_of_input(&mut self) -> Token {
        let at = self.cursor.position();
        let span = self.cursor.span_from(at);
        if self.needs_semicolon() {
            return self.finish(Token::new(TokenKind::Semicolon, "\n", span));
        }
        self.finish(Token::eof(span))
    }

    fn needs_semicolon(&self) -> bool {
        self.last.is_some_and(TokenKind::ends_statement)
    }

    /// `then` if the next character is `next`, otherwise `otherwise`.
    fn pick(&mut self, next: char, then: TokenKind, otherwise: TokenKind) -> TokenKind {
        if self.cursor.eat(next) {
            then
        } else {
            otherwise
        }
    }

    /// `+`/`-` family: doubled, compound assignment, or plain.
    fn arithmetic(&mut self, ch: char, doubled: TokenKind, plain: TokenKind) -> TokenKind {
        if self.cursor.eat(ch) {
            doubled
        } else {
            self.pick('=', TokenKind::AssignOp, plain)
        }
    }

    // ---------------------------------------------------------------
    // Whitespace & comments
    // ---------------------------------------------------------------

    /// Skip whitespace and comments. Returns the position of a line break
    /// that terminates the current statement, if one was crossed.
    fn skip_trivia(&mut self) -> Option<Position> {
        loop {
            match self.cursor.peek() {
                Some(' ' | '\t' | '\r') => {
                    self.cursor.advance();
                }
                Some('\n') => {
                    let at = self.cursor.position();
                    self.cursor.advance();
                    if self.needs_semicolon() {
                        return Some(at);
                    }
                }
                Some('/') if self.cursor.peek_second() == Some('/') => {
                    self.cursor.eat_while(|c| c != '\n');
                }
                Some('/') if self.cursor.peek_second() == Some('*') => {
                    let at = self.cursor.position();
                    if self.skip_block_comment() && self.needs_semicolon() {
                        return Some(at);
                    }
                }
                _ => return None,
            }
        }
    }

    /// Skip a `/* */` comment. Go block comments do not nest. Returns whether
    /// the comment contained a line break.
    fn skip_block_comment(&mut self) -> bool {
        let start = self.cursor.position();
        self.cursor.advance();
        self.cursor.advance();
        let mut multiline = false;
        loop {
            match self.cursor.advance() {
                Some('*') if self.cursor.peek() == Some('/') => {
                    self.cursor.advance();
                    return multiline;
                }
                Some('\n') => multiline = true,
                Some(_) => {}
                None => {
                    let span = self.cursor.span_from(start);
                    self.diagnostics.error("comment not terminated", span);
                    return multiline;
                }
            }
        }
    }

    // ---------------------------------------------------------------
    // Literals
    // ---------------------------------------------------------------

    fn scan_identifier(&mut self, start: Position) -> Token {
        self.cursor
            .eat_while(|c| c.is_alphanumeric() || c == '_');
        let text = self.cursor.text_from(start);
        let kind = TokenKind::keyword_from_str(text).unwrap_or(TokenKind::Identifier);
        self.make(kind, start)
    }

    /// Scan a numeric literal whose first character (`first`) is consumed.
    fn scan_number(&mut self, start: Position, first: char) -> Token {
        let mut kind = TokenKind::IntLiteral;
        let prefix = if first == '0' {
            self.cursor
                .peek()
                .map(|c| c.to_ascii_lowercase())
                .filter(|c| matches!(c, 'x' | 'b' | 'o'))
        } else {
            None
        };

        if let Some(prefix) = prefix {
            self.cursor.advance();
            let digits = self.cursor.position();
            match prefix {
                'x' => {
                    self.cursor.eat_while(|c| c.is_ascii_hexdigit() || c == '_');
                    if self.cursor.eat('.') {
                        kind = TokenKind::FloatLiteral;
                        self.cursor.eat_while(|c| c.is_ascii_hexdigit() || c == '_');
                    }
                    if matches!(self.cursor.peek(), Some('p' | 'P')) {
                        kind = TokenKind::FloatLiteral;
                        self.scan_exponent(start);
                    }
                }
                'b' => self.cursor.eat_while(|c| matches!(c, '0' | '1' | '_')),
                _ => self.cursor.eat_while(|c| matches!(c, '0'..='7' | '_')),
            }
            if self.cursor.text_from(digits).trim_matches(['_', '.']).is_empty() {
                let span = self.cursor.span_from(start);
                self.diagnostics
                    .error(format!("0{prefix} literal has no digits"), span);
            }
        } else {
            if first == '.' {
                kind = TokenKind::FloatLiteral;
            } else {
                self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
                if self.cursor.eat('.') {
                    kind = TokenKind::FloatLiteral;
                }
            }
            if kind == TokenKind::FloatLiteral {
                self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
            }
            if matches!(self.cursor.peek(), Some('e' | 'E')) {
                kind = TokenKind::FloatLiteral;
                self.scan_exponent(start);
            }
        }

        if self.cursor.eat('i') {
            kind = TokenKind::ImaginaryLiteral;
        }
        if self.cursor.peek().is_some_and(is_ident_start) {
            self.cursor.eat_while(|c| c.is_alphanumeric() || c == '_');
            let span = self.cursor.span_from(start);
            self.diagnostics.error(
                format!("invalid numeric literal '{}'", self.cursor.text_from(start)),
                span,
            );
        }
        self.make(kind, start)
    }

    /// Exponent after a mantissa; the cursor is on `e`/`E`/`p`/`P`.
    fn scan_exponent(&mut self, start: Position) {
        self.cursor.advance();
        if !self.cursor.eat('+') {
            self.cursor.eat('-');
        }
        let digits = self.cursor.position();
        self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
        if self.cursor.position() == digits {
            let span = self.cursor.span_from(start);
            self.diagnostics.error("exponent has no digits", span);
        }
    }

    fn scan_string(&mut self, start: Position) -> Token {
        loop {
            match self.cursor.peek() {
                Some('"') => {
                    self.cursor.advance();
                    break;
                }
                Some('\\') => {
                    self.cursor.advance();
                    self.scan_escape('"', start);
                }
                Some('\n') | None => {
                    let span = self.cursor.span_from(start);
                    self.diagnostics.error("string literal not terminated", span);
                    break;
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
        self.make(TokenKind::StringLiteral, start)
    }

    fn scan_raw_string(&mut self, start: Position) -> Token {
        loop {
            match self.cursor.advance() {
                Some('`') => break,
                Some(_) => {}
                None => {
                    let span = self.cursor.span_from(start);
                    self.diagnostics
                        .error("raw string literal not terminated", span);
                    break;
                }
            }
        }
        self.make(TokenKind::StringLiteral, start)
    }

    fn scan_rune(&mut self, start: Position) -> Token {
        let mut chars = 0usize;
        loop {
            match self.cursor.peek() {
                Some('\'') => {
                    self.cursor.advance();
                    break;
                }
                Some('\\') => {
                    self.cursor.advance();
                    self.scan_escape('\'', start);
                    chars += 1;
                }
                Some('\n') | None => {
                    let span = self.cursor.span_from(start);
                    self.diagnostics.error("rune literal not terminated", span);
                    return self.make(TokenKind::RuneLiteral, start);
                }
                Some(_) => {
                    self.cursor.advance();
                    chars += 1;
                }
            }
        }
        if chars != 1 {
            let span = self.cursor.span_from(start);
            self.diagnostics
                .error("rune literal must contain exactly one character", span);
        }
        self.make(TokenKind::RuneLiteral, start)
    }

    /// Validate an escape sequence; the backslash is already consumed.
    fn scan_escape(&mut self, quote: char, literal_start: Position) {
        let (count, radix) = match self.cursor.peek() {
            Some(c) if c == quote => {
                self.cursor.advance();
                return;
            }
            Some('a' | 'b' | 'f' | 'n' | 'r' | 't' | 'v' | '\\') => {
                self.cursor.advance();
                return;
            }
            Some('0'..='7') => (3, 8),
            Some('x') => {
                self.cursor.advance();
                (2, 16)
            }
            Some('u') => {
                self.cursor.advance();
                (4, 16)
            }
            Some('U') => {
                self.cursor.advance();
                (8, 16)
            }
            Some('\n') | None => return,
            Some(other) => {
                self.cursor.advance();
                let span = self.cursor.span_from(literal_start);
                self.diagnostics
                    .error(format!("unknown escape sequence '\\{other}'"), span);
                return;
            }
        };
        for _ in 0..count {
            if self.cursor.peek().is_some_and(|c| c.is_digit(radix)) {
                self.cursor.advance();
            } else {
                let span = self.cursor.span_from(literal_start);
                self.diagnostics
                    .error("escape sequence is too short", span);
                return;
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

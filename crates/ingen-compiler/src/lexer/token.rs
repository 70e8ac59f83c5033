use std::fmt;

use ingen_common::Span;

/// A single token produced by the lexer.
///
/// `lexeme` is the exact source text, except for semicolons inserted at line
/// ends, whose lexeme is `"\n"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }

    pub fn eof(span: Span) -> Self {
        Self::new(TokenKind::Eof, "", span)
    }

    /// Value of a string literal token with the quotes removed and simple
    /// escapes decoded. Raw strings are returned verbatim.
    pub fn string_value(&self) -> String {
        let text = self.lexeme.as_str();
        if let Some(raw) = text.strip_prefix('`').and_then(|t| t.strip_suffix('`')) {
            return raw.replace('\r', "");
        }
        let inner = text
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .unwrap_or(text);
        let mut value = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(ch) = chars.next() {
            if ch != '\\' {
                value.push(ch);
                continue;
            }
            match chars.next() {
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some('r') => value.push('\r'),
                Some(other) => value.push(other),
                None => {}
            }
        }
        value
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.kind, self.lexeme.escape_debug())
    }
}

/// Token kinds of the Go language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // === Literals ===
    IntLiteral,
    FloatLiteral,
    ImaginaryLiteral,
    RuneLiteral,
    StringLiteral,

    Identifier,

    // === Keywords ===
    Break,
    Case,
    Chan,
    Const,
    Continue,
    Default,
    Defer,
    Else,
    Fallthrough,
    For,
    Func,
    Go,
    Goto,
    If,
    Import,
    Interface,
    Map,
    Package,
    Range,
    Return,
    Select,
    Struct,
    Switch,
    Type,
    Var,

    // === Operators ===
    Plus,           // +
    Minus,          // -
    Star,           // *
    Slash,          // /
    Percent,        // %
    Amp,            // &
    Pipe,           // |
    Caret,          // ^
    ShiftLeft,      // <<
    ShiftRight,     // >>
    AmpCaret,       // &^
    AssignOp,       // += -= *= /= %= &= |= ^= <<= >>= &^=
    AmpAmp,         // &&
    PipePipe,       // ||
    Arrow,          // <-
    PlusPlus,       // ++
    MinusMinus,     // --
    EqualEqual,     // ==
    Less,           // <
    Greater,        // >
    Assign,         // =
    Bang,           // !
    Tilde,          // ~
    BangEqual,      // !=
    LessEqual,      // <=
    GreaterEqual,   // >=
    Define,         // :=
    Ellipsis,       // ...

    // === Delimiters ===
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
    Period,
    Semicolon,
    Colon,

    /// Unrecognised input; a diagnostic has been reported.
    Error,
    Eof,
}

impl TokenKind {
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        let kind = match s {
            "break" => TokenKind::Break,
            "case" => TokenKind::Case,
            "chan" => TokenKind::Chan,
            "const" => TokenKind::Const,
            "continue" => TokenKind::Continue,
            "default" => TokenKind::Default,
            "defer" => TokenKind::Defer,
            "else" => TokenKind::Else,
            "fallthrough" => TokenKind::Fallthrough,
            "for" => TokenKind::For,
            "func" => TokenKind::Func,
            "go" => TokenKind::Go,
            "goto" => TokenKind::Goto,
            "if" => TokenKind::If,
            "import" => TokenKind::Import,
            "interface" => TokenKind::Interface,
            "map" => TokenKind::Map,
            "package" => TokenKind::Package,
            "range" => TokenKind::Range,
            "return" => TokenKind::Return,
            "select" => TokenKind::Select,
            "struct" => TokenKind::Struct,
            "switch" => TokenKind::Switch,
            "type" => TokenKind::Type,
            "var" => TokenKind::Var,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether a line break directly after this token ends the statement.
    pub fn ends_statement(self) -> bool {
        matches!(
            self,
            TokenKind::Identifier
                | TokenKind::IntLiteral
                | TokenKind::FloatLiteral
                | TokenKind::ImaginaryLiteral
                | TokenKind::RuneLiteral
                | TokenKind::StringLiteral
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Fallthrough
                | TokenKind::Return
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
                | TokenKind::RightParen
                | TokenKind::RightBracket
                | TokenKind::RightBrace
        )
    }
}

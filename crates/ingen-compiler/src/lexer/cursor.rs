use std::str::Chars;
use std::sync::Arc;

use ingen_common::{Position, Span};

const BOM: char = '\u{feff}';

/// Character reader over one source file.
///
/// Keeps the line/column/offset of the next unread character so the scanner
/// can stamp spans without recomputing them.
pub struct Cursor<'src> {
    source: &'src str,
    file: Arc<str>,
    chars: Chars<'src>,
    pos: Position,
}

impl<'src> Cursor<'src> {
    /// A leading byte order mark is skipped; Go permits one as the first
    /// character of a file.
    pub fn new(source: &'src str, file: impl Into<Arc<str>>) -> Self {
        let body = source.strip_prefix(BOM).unwrap_or(source);
        let skipped = (source.len() - body.len()) as u32;
        Self {
            source,
            file: file.into(),
            chars: body.chars(),
            pos: Position::new(1, 1, skipped),
        }
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    pub fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next()
    }

    pub fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        self.pos.offset += ch.len_utf8() as u32;
        if ch == '\n' {
            self.pos.line += 1;
            self.pos.column = 1;
        } else {
            self.pos.column += 1;
        }
        Some(ch)
    }

    /// Consume the next character if it equals `expected`.
    pub fn eat(&mut self, expected: char) -> bool {
        let matched = self.peek() == Some(expected);
        if matched {
            self.advance();
        }
        matched
    }

    pub fn eat_while(&mut self, mut predicate: impl FnMut(char) -> bool) {
        while self.peek().is_some_and(&mut predicate) {
            self.advance();
        }
    }

    pub fn is_eof(&self) -> bool {
        self.chars.as_str().is_empty()
    }

    /// Source text from byte offset `start` up to the cursor.
    pub fn text_from(&self, start: Position) -> &'src str {
        &self.source[start.offset as usize..self.pos.offset as usize]
    }

    pub fn span_from(&self, start: Position) -> Span {
        Span::new(Arc::clone(&self.file), start, self.pos)
    }
}

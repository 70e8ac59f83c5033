//! Build constraints: which files of a directory the go tool would compile
//! for a given target.

use tracing::debug;

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js",
    "linux", "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips",
    "mipsle", "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le",
    "riscv", "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

/// Target operating system and architecture, in Go's spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub goos: String,
    pub goarch: String,
}

impl BuildContext {
    pub fn new(goos: impl Into<String>, goarch: impl Into<String>) -> Self {
        Self {
            goos: goos.into(),
            goarch: goarch.into(),
        }
    }

    /// The machine ingen runs on.
    pub fn host() -> Self {
        let goos = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        let goarch = match std::env::consts::ARCH {
            "x86_64" => "amd64",
            "x86" => "386",
            "aarch64" => "arm64",
            "powerpc64" => "ppc64",
            "loongarch64" => "loong64",
            other => other,
        };
        Self::new(goos, goarch)
    }

    /// Whether the file should be part of the package: its name suffix and
    /// its header constraints both match.
    pub fn includes(&self, file_name: &str, source: &str) -> bool {
        self.matches_file_name(file_name) && self.matches_header(source)
    }

    /// `name_GOOS.go`, `name_GOARCH.go` and `name_GOOS_GOARCH.go` only
    /// build on the named target. `_test` is ignored before the check.
    pub fn matches_file_name(&self, file_name: &str) -> bool {
        let stem = file_name.strip_suffix(".go").unwrap_or(file_name);
        let stem = stem.strip_suffix("_test").unwrap_or(stem);
        // The first element is the base name, never a constraint.
        let parts: Vec<&str> = stem.split('_').skip(1).collect();
        match parts.as_slice() {
            [.., os, arch] if KNOWN_OS.contains(os) && KNOWN_ARCH.contains(arch) => {
                self.tag(os) && self.tag(arch)
            }
            [.., last] if KNOWN_OS.contains(last) || KNOWN_ARCH.contains(last) => self.tag(last),
            _ => true,
        }
    }

    /// Evaluate the `//go:build` line of the file header, or its
    /// `// +build` lines when there is none.
    pub fn matches_header(&self, source: &str) -> bool {
        let header = header_comments(source);
        let mut plus_lines = Vec::new();
        for line in &header {
            if let Some(expr) = line.strip_prefix("//go:build") {
                if expr.is_empty() || expr.starts_with(is_blank) {
                    return match parse_expr(expr) {
                        Ok(expr) => expr.eval(&|tag: &str| self.tag(tag)),
                        // The go tool refuses such a file.
                        Err(err) => {
                            debug!(%err, "excluding file");
                            false
                        }
                    };
                }
            }
            if let Some(rest) = line.strip_prefix("//") {
                if let Some(options) = rest.trim_start().strip_prefix("+build") {
                    if options.is_empty() || options.starts_with(is_blank) {
                        plus_lines.push(options);
                    }
                }
            }
        }
        plus_lines.iter().all(|line| self.plus_line(line))
    }

    /// One `// +build` line: space-separated options are alternatives, each a
    /// comma-separated conjunction of possibly negated tags.
    fn plus_line(&self, line: &str) -> bool {
        line.split_whitespace().any(|option| {
            option.split(',').all(|term| match term.strip_prefix('!') {
                Some(tag) => !tag.starts_with('!') && !self.tag(tag),
                None => self.tag(term),
            })
        })
    }

    /// Whether a single build tag is satisfied. Unknown tags, `ignore` and
    /// `cgo` among them, are not.
    fn tag(&self, tag: &str) -> bool {
        if tag == self.goos || tag == self.goarch || tag == "gc" {
            return true;
        }
        if tag == "unix" {
            return UNIX_OS.contains(&self.goos.as_str());
        }
        match self.goos.as_str() {
            "android" if tag == "linux" => return true,
            "illumos" if tag == "solaris" => return true,
            "ios" if tag == "darwin" => return true,
            _ => {}
        }
        // Release tags: every go1.N names a version this code may be built with.
        tag.strip_prefix("go1.")
            .is_some_and(|minor| !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit()))
    }
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Line comments before the package clause, up to the last blank line.
/// A constraint directly attached to the package clause is documentation.
fn header_comments(source: &str) -> Vec<&str> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let mut header = Vec::new();
    let mut pending = Vec::new();
    for line in source.lines() {
        let line = line.trim();
        if line.is_empty() {
            header.append(&mut pending);
        } else if line.starts_with("//") {
            pending.push(line);
        } else {
            break;
        }
    }
    header
}

/// A `//go:build` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Tag(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    fn eval(&self, tag: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Expr::Tag(name) => tag(name),
            Expr::Not(inner) => !inner.eval(tag),
            Expr::And(a, b) => a.eval(tag) && b.eval(tag),
            Expr::Or(a, b) => a.eval(tag) || b.eval(tag),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid build constraint: {0}")]
struct SyntaxError(String);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tok<'a> {
    Tag(&'a str),
    Not,
    And,
    Or,
    Open,
    Close,
}

fn tokenize(text: &str) -> Result<Vec<Tok<'_>>, SyntaxError> {
    let mut toks = Vec::new();
    let mut rest = text.trim_start();
    while let Some(c) = rest.chars().next() {
        let (tok, len) = match c {
            '!' => (Tok::Not, 1),
            '(' => (Tok::Open, 1),
            ')' => (Tok::Close, 1),
            '&' if rest.starts_with("&&") => (Tok::And, 2),
            '|' if rest.starts_with("||") => (Tok::Or, 2),
            c if c.is_alphanumeric() || c == '_' || c == '.' => {
                let len = rest
                    .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
                    .unwrap_or(rest.len());
                (Tok::Tag(&rest[..len]), len)
            }
            other => return Err(SyntaxError(format!("unexpected {other:?}"))),
        };
        toks.push(tok);
        rest = rest[len..].trim_start();
    }
    Ok(toks)
}

/// Precedence climbing over `||`, `&&`, `!` and parentheses.
struct ExprParser<'a> {
    toks: Vec<Tok<'a>>,
    pos: usize,
}

fn parse_expr(text: &str) -> Result<Expr, SyntaxError> {
    let mut parser = ExprParser {
        toks: tokenize(text)?,
        pos: 0,
    };
    let expr = parser.or()?;
    match parser.toks.get(parser.pos) {
        None => Ok(expr),
        Some(tok) => Err(SyntaxError(format!("unexpected {tok:?}"))),
    }
}

impl<'a> ExprParser<'a> {
    fn eat(&mut self, tok: &Tok<'_>) -> bool {
        let matched = self.toks.get(self.pos) == Some(tok);
        if matched {
            self.pos += 1;
        }
        matched
    }

    fn or(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.and()?;
        while self.eat(&Tok::Or) {
            left = Expr::Or(Box::new(left), Box::new(self.and()?));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.not()?;
        while self.eat(&Tok::And) {
            left = Expr::And(Box::new(left), Box::new(self.not()?));
        }
        Ok(left)
    }

    fn not(&mut self) -> Result<Expr, SyntaxError> {
        if self.eat(&Tok::Not) {
            return Ok(Expr::Not(Box::new(self.not()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Expr, SyntaxError> {
        match self.toks.get(self.pos).cloned() {
            Some(Tok::Open) => {
                self.pos += 1;
                let inner = self.or()?;
                if !self.eat(&Tok::Close) {
                    return Err(SyntaxError("missing )".into()));
                }
                Ok(inner)
            }
            Some(Tok::Tag(name)) => {
                self.pos += 1;
                Ok(Expr::Tag(name.to_string()))
            }
            Some(tok) => Err(SyntaxError(format!("unexpected {tok:?}"))),
            None => Err(SyntaxError("unexpected end of expression".into())),
        }
    }
}

//! Tokenizer for schema sources.
//!
//! Newlines are not tokens. Instead a comma is inserted at the end of a
//! line whose last token could end an expression, so fields and list
//! elements may be separated either way.

use crate::error::SyntaxError;

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    /// Identifier, including `#Definition` and `_hidden` forms.
    Ident(String),
    /// Decoded string literal.
    Str(String),
    /// Integer literal.
    Int(i128),
    /// Floating-point literal.
    Float(f64),
    /// `_`
    Top,
    /// `_|_`
    Bottom,
    LBrace,
    RBrace,
    LBrack,
    RBrack,
    LParen,
    RParen,
    Colon,
    /// An explicit comma, or one inserted at a line end.
    Comma,
    Question,
    Bang,
    Amp,
    Pipe,
    Star,
    Minus,
    Ellipsis,
    Ge,
    Gt,
    Le,
    Lt,
    Ne,
    Match,
    NotMatch,
    Eof,
}

impl Tok {
    /// Whether a newline after this token terminates the current element.
    fn ends_element(&self) -> bool {
        matches!(
            self,
            Tok::Ident(_)
                | Tok::Str(_)
                | Tok::Int(_)
                | Tok::Float(_)
                | Tok::Top
                | Tok::Bottom
                | Tok::RBrace
                | Tok::RBrack
                | Tok::RParen
                | Tok::Ellipsis
        )
    }

    /// Short rendering for parse error messages.
    pub fn describe(&self) -> String {
        match self {
            Tok::Ident(s) => format!("identifier {s}"),
            Tok::Str(_) => "string literal".to_string(),
            Tok::Int(_) | Tok::Float(_) => "number literal".to_string(),
            Tok::Eof => "EOF".to_string(),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Tok::Top => "_",
            Tok::Bottom => "_|_",
            Tok::LBrace => "{",
            Tok::RBrace => "}",
            Tok::LBrack => "[",
            Tok::RBrack => "]",
            Tok::LParen => "(",
            Tok::RParen => ")",
            Tok::Colon => ":",
            Tok::Comma => ",",
            Tok::Question => "?",
            Tok::Bang => "!",
            Tok::Amp => "&",
            Tok::Pipe => "|",
            Tok::Star => "*",
            Tok::Minus => "-",
            Tok::Ellipsis => "...",
            Tok::Ge => ">=",
            Tok::Gt => ">",
            Tok::Le => "<=",
            Tok::Lt => "<",
            Tok::Ne => "!=",
            Tok::Match => "=~",
            Tok::NotMatch => "!~",
            _ => "?",
        }
    }
}

/// A token with its 1-based start position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub line: u32,
    pub column: u32,
}

/// Tokenize `src` completely.
///
/// # Errors
///
/// Returns the first lexical error (unterminated string, stray character,
/// malformed number).
pub fn tokenize(src: &str) -> Result<Vec<Token>, SyntaxError> {
    Lexer::new(src).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    out: Vec<Token>,
}

impl Lexer {
    fn new(src: &str) -> Self {
        Self {
            chars: src.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            out: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, line: u32, column: u32, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            line,
            column,
            message: message.into(),
        }
    }

    fn push(&mut self, tok: Tok, line: u32, column: u32) {
        self.out.push(Token { tok, line, column });
    }

    fn insert_comma(&mut self) {
        if let Some(last) = self.out.last() {
            if last.tok.ends_element() {
                let (line, column) = (self.line, self.column);
                self.push(Tok::Comma, line, column);
            }
        }
    }

    fn run(mut self) -> Result<Vec<Token>, SyntaxError> {
        while let Some(c) = self.peek() {
            let (line, column) = (self.line, self.column);
            match c {
                '\n' => {
                    self.insert_comma();
                    self.bump();
                }
                c if c.is_whitespace() => {
                    self.bump();
                }
                '/' if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                '"' => {
                    let s = self.string(line, column)?;
                    self.push(Tok::Str(s), line, column);
                }
                '#' if self.peek_at(1) == Some('"') => {
                    let s = self.raw_string(line, column)?;
                    self.push(Tok::Str(s), line, column);
                }
                c if c.is_ascii_digit() => {
                    let tok = self.number(line, column)?;
                    self.push(tok, line, column);
                }
                '.' if self.peek_at(1) == Some('.') && self.peek_at(2) == Some('.') => {
                    self.bump();
                    self.bump();
                    self.bump();
                    self.push(Tok::Ellipsis, line, column);
                }
                '_' if self.peek_at(1) == Some('|') && self.peek_at(2) == Some('_') => {
                    self.bump();
                    self.bump();
                    self.bump();
                    self.push(Tok::Bottom, line, column);
                }
                c if is_ident_start(c) => {
                    let ident = self.ident();
                    let tok = if ident == "_" { Tok::Top } else { Tok::Ident(ident) };
                    self.push(tok, line, column);
                }
                _ => {
                    let tok = self.operator(line, column)?;
                    self.push(tok, line, column);
                }
            }
        }
        self.insert_comma();
        let (line, column) = (self.line, self.column);
        self.push(Tok::Eof, line, column);
        Ok(self.out)
    }

    fn operator(&mut self, line: u32, column: u32) -> Result<Tok, SyntaxError> {
        let c = self.bump().unwrap_or('\0');
        let next = self.peek();
        let two = |lexer: &mut Self, tok: Tok| {
            lexer.bump();
            tok
        };
        let tok = match (c, next) {
            ('>', Some('=')) => two(self, Tok::Ge),
            ('<', Some('=')) => two(self, Tok::Le),
            ('!', Some('=')) => two(self, Tok::Ne),
            ('!', Some('~')) => two(self, Tok::NotMatch),
            ('=', Some('~')) => two(self, Tok::Match),
            ('>', _) => Tok::Gt,
            ('<', _) => Tok::Lt,
            ('!', _) => Tok::Bang,
            ('{', _) => Tok::LBrace,
            ('}', _) => Tok::RBrace,
            ('[', _) => Tok::LBrack,
            (']', _) => Tok::RBrack,
            ('(', _) => Tok::LParen,
            (')', _) => Tok::RParen,
            (':', _) => Tok::Colon,
            (',', _) => Tok::Comma,
            ('?', _) => Tok::Question,
            ('&', _) => Tok::Amp,
            ('|', _) => Tok::Pipe,
            ('*', _) => Tok::Star,
            ('-', _) => Tok::Minus,
            (other, _) => {
                return Err(self.error(line, column, format!("illegal character {other:?}")));
            }
        };
        Ok(tok)
    }

    fn ident(&mut self) -> String {
        let mut s = String::new();
        if let Some(c) = self.bump() {
            s.push(c);
        }
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        s
    }

    fn number(&mut self, line: u32, column: u32) -> Result<Tok, SyntaxError> {
        let mut text = String::new();
        let radix = match (self.peek(), self.peek_at(1)) {
            (Some('0'), Some('x' | 'X')) => 16,
            (Some('0'), Some('o' | 'O')) => 8,
            (Some('0'), Some('b' | 'B')) => 2,
            _ => 10,
        };
        if radix != 10 {
            self.bump();
            self.bump();
            while let Some(c) = self.peek() {
                if c == '_' {
                    self.bump();
                } else if c.is_digit(radix) {
                    text.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
            return i128::from_str_radix(&text, radix)
                .map(Tok::Int)
                .map_err(|e| self.error(line, column, format!("invalid number literal: {e}")));
        }

        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => text.push(c),
                '_' => {}
                '.' if !is_float && self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => {
                    is_float = true;
                    text.push(c);
                }
                'e' | 'E' => {
                    is_float = true;
                    text.push(c);
                    self.bump();
                    if let Some(sign @ ('+' | '-')) = self.peek() {
                        text.push(sign);
                        self.bump();
                    }
                    continue;
                }
                _ => break,
            }
            self.bump();
        }

        if is_float {
            text.parse::<f64>()
                .map(Tok::Float)
                .map_err(|e| self.error(line, column, format!("invalid number literal: {e}")))
        } else {
            text.parse::<i128>()
                .map(Tok::Int)
                .map_err(|e| self.error(line, column, format!("invalid number literal: {e}")))
        }
    }

    fn string(&mut self, line: u32, column: u32) -> Result<String, SyntaxError> {
        self.bump();
        let mut s = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(self.error(line, column, "string literal not terminated"));
                }
                Some('"') => return Ok(s),
                Some('\\') => {
                    let (el, ec) = (self.line, self.column);
                    let escaped = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('/') => '/',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some('u') => self.unicode_escape(el, ec)?,
                        Some(other) => {
                            return Err(self.error(el, ec, format!("unknown escape sequence \\{other}")));
                        }
                        None => {
                            return Err(self.error(line, column, "string literal not terminated"));
                        }
                    };
                    s.push(escaped);
                }
                Some(c) => s.push(c),
            }
        }
    }

    fn unicode_escape(&mut self, line: u32, column: u32) -> Result<char, SyntaxError> {
        let mut hex = String::new();
        for _ in 0..4 {
            match self.bump() {
                Some(c) if c.is_ascii_hexdigit() => hex.push(c),
                _ => return Err(self.error(line, column, "invalid unicode escape")),
            }
        }
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error(line, column, "invalid unicode escape"))
    }

    /// `#"..."#`: no escape processing, so regular expressions need no
    /// doubled backslashes.
    fn raw_string(&mut self, line: u32, column: u32) -> Result<String, SyntaxError> {
        self.bump();
        self.bump();
        let mut s = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(self.error(line, column, "string literal not terminated"));
                }
                Some('"') if self.peek() == Some('#') => {
                    self.bump();
                    return Ok(s);
                }
                Some(c) => s.push(c),
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '#' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

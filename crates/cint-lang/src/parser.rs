//! Recursive-descent parser over the token stream.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! file    = [ "package" ident "," ] { decl "," }
//! decl    = label { label } ":" ( expr | decl )  |  "[" expr "]" ":" expr  |  "..."
//! label   = (ident | string) [ "?" | "!" ]
//! expr    = conj { "|" conj }
//! conj    = unary { "&" unary }
//! unary   = ( "*" | "-" | ">=" | ">" | "<=" | "<" | "!=" | "=~" | "!~" ) unary | primary
//! primary = literal | ident | "(" expr ")" | struct | list
//! ```

use crate::ast::{
    Decl, Expr, FieldDecl, File, LabelName, ListLit, PatternDecl, Presence, Span, StructLit,
    UnaryOp,
};
use crate::error::SyntaxError;
use crate::lexer::{Tok, Token};

/// Parse a token stream into a [`File`].
///
/// # Errors
///
/// Returns the first grammar error with its position.
pub fn parse(tokens: Vec<Token>) -> Result<File, SyntaxError> {
    let mut p = Parser { tokens, pos: 0 };
    p.file()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Tok {
        self.tokens
            .get(self.pos)
            .map_or(&Tok::Eof, |t| &t.tok)
    }

    fn peek_at(&self, offset: usize) -> &Tok {
        self.tokens
            .get(self.pos + offset)
            .map_or(&Tok::Eof, |t| &t.tok)
    }

    fn span(&self) -> Span {
        self.tokens.get(self.pos).map_or(
            Span { line: 0, column: 0 },
            |t| Span {
                line: t.line,
                column: t.column,
            },
        )
    }

    fn next(&mut self) -> Tok {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        let span = self.span();
        SyntaxError {
            line: span.line,
            column: span.column,
            message: message.into(),
        }
    }

    fn expect(&mut self, want: &Tok, context: &str) -> Result<(), SyntaxError> {
        if self.peek() == want {
            self.next();
            Ok(())
        } else {
            Err(self.error(format!(
                "expected {} {context}, found {}",
                want.describe(),
                self.peek().describe()
            )))
        }
    }

    fn skip_commas(&mut self) {
        while *self.peek() == Tok::Comma {
            self.next();
        }
    }

    fn file(&mut self) -> Result<File, SyntaxError> {
        let span = self.span();
        self.skip_commas();

        let mut package = None;
        if matches!(self.peek(), Tok::Ident(s) if s == "package")
            && matches!(self.peek_at(1), Tok::Ident(_))
        {
            self.next();
            match self.next() {
                Tok::Ident(name) => package = Some(name),
                other => {
                    return Err(self.error(format!(
                        "expected package name, found {}",
                        other.describe()
                    )));
                }
            }
            self.skip_commas();
        }

        if matches!(self.peek(), Tok::Ident(s) if s == "import")
            && matches!(self.peek_at(1), Tok::Str(_) | Tok::LParen)
        {
            return Err(self.error("imports are not supported"));
        }

        let decls = self.decls(&Tok::Eof)?;
        Ok(File {
            package,
            body: StructLit { decls, span },
        })
    }

    /// Declarations up to (not including) `end`.
    fn decls(&mut self, end: &Tok) -> Result<Vec<Decl>, SyntaxError> {
        let mut decls = Vec::new();
        loop {
            self.skip_commas();
            if self.peek() == end {
                return Ok(decls);
            }
            if *self.peek() == Tok::Eof {
                return Err(self.error(format!(
                    "expected {} to close struct, found EOF",
                    end.describe()
                )));
            }
            decls.push(self.decl()?);
            match self.peek() {
                Tok::Comma => {}
                t if t == end => {}
                other => {
                    return Err(self.error(format!(
                        "expected ',' or newline after declaration, found {}",
                        other.describe()
                    )));
                }
            }
        }
    }

    fn decl(&mut self) -> Result<Decl, SyntaxError> {
        let span = self.span();
        match self.peek() {
            Tok::Ellipsis => {
                self.next();
                Ok(Decl::Ellipsis(span))
            }
            Tok::LBrack => {
                self.next();
                let label = self.expr()?;
                self.expect(&Tok::RBrack, "after pattern constraint label")?;
                self.expect(&Tok::Colon, "after pattern constraint")?;
                let value = self.expr()?;
                Ok(Decl::Pattern(PatternDecl { label, value, span }))
            }
            _ => self.field().map(Decl::Field),
        }
    }

    /// `a: b?: c: expr` nests as `a: { b?: { c: expr } }`.
    fn field(&mut self) -> Result<FieldDecl, SyntaxError> {
        let span = self.span();
        let label = match self.next() {
            Tok::Ident(name) => LabelName::Ident(name),
            Tok::Str(name) => LabelName::Quoted(name),
            other => {
                self.pos = self.pos.saturating_sub(1);
                return Err(self.error(format!("expected label, found {}", other.describe())));
            }
        };
        let presence = match self.peek() {
            Tok::Question => {
                self.next();
                Presence::Optional
            }
            Tok::Bang => {
                self.next();
                Presence::Required
            }
            _ => Presence::Regular,
        };
        self.expect(&Tok::Colon, "after label")?;

        let is_nested_label = matches!(self.peek(), Tok::Ident(_) | Tok::Str(_))
            && matches!(self.peek_at(1), Tok::Colon | Tok::Question | Tok::Bang)
            && !matches!(self.peek_at(1), Tok::Bang if *self.peek_at(2) != Tok::Colon);
        let value = if is_nested_label || self.pattern_label_follows() {
            let inner_span = self.span();
            let inner = self.decl()?;
            Expr::Struct(StructLit {
                decls: vec![inner],
                span: inner_span,
            })
        } else {
            self.expr()?
        };

        Ok(FieldDecl {
            label,
            presence,
            value,
            span,
        })
    }

    /// `[` ... `]` followed by `:` is a pattern label, not a list literal.
    fn pattern_label_follows(&self) -> bool {
        if *self.peek() != Tok::LBrack {
            return false;
        }
        let mut depth = 0usize;
        let mut offset = 0;
        loop {
            match self.peek_at(offset) {
                Tok::LBrack => depth += 1,
                Tok::RBrack => {
                    depth -= 1;
                    if depth == 0 {
                        return *self.peek_at(offset + 1) == Tok::Colon;
                    }
                }
                Tok::Eof => return false,
                _ => {}
            }
            offset += 1;
        }
    }

    fn expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut alternatives = vec![self.alternative()?];
        while *self.peek() == Tok::Pipe {
            self.next();
            alternatives.push(self.alternative()?);
        }
        if alternatives.len() == 1 {
            let (expr, is_default) = alternatives.remove(0);
            return Ok(if is_default {
                Expr::Default(Box::new(expr))
            } else {
                expr
            });
        }
        Ok(Expr::Or(alternatives))
    }

    /// One disjunct, with its default marker stripped.
    fn alternative(&mut self) -> Result<(Expr, bool), SyntaxError> {
        let is_default = *self.peek() == Tok::Star;
        if is_default {
            self.next();
        }
        Ok((self.conjunction()?, is_default))
    }

    fn conjunction(&mut self) -> Result<Expr, SyntaxError> {
        let mut parts = vec![self.unary()?];
        while *self.peek() == Tok::Amp {
            self.next();
            parts.push(self.unary()?);
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            Expr::And(parts)
        })
    }

    fn unary(&mut self) -> Result<Expr, SyntaxError> {
        let span = self.span();
        let op = match self.peek() {
            Tok::Minus => UnaryOp::Neg,
            Tok::Ge => UnaryOp::Ge,
            Tok::Gt => UnaryOp::Gt,
            Tok::Le => UnaryOp::Le,
            Tok::Lt => UnaryOp::Lt,
            Tok::Ne => UnaryOp::Ne,
            Tok::Match => UnaryOp::Match,
            Tok::NotMatch => UnaryOp::NotMatch,
            Tok::Star => {
                self.next();
                return Ok(Expr::Default(Box::new(self.unary()?)));
            }
            _ => return self.primary(),
        };
        self.next();
        let operand = self.unary()?;
        Ok(Expr::Unary(op, Box::new(operand), span))
    }

    fn primary(&mut self) -> Result<Expr, SyntaxError> {
        let span = self.span();
        match self.next() {
            Tok::Top => Ok(Expr::Top),
            Tok::Bottom => Ok(Expr::Bottom(span)),
            Tok::Int(n) => Ok(Expr::Int(n)),
            Tok::Float(x) => Ok(Expr::Float(x)),
            Tok::Str(s) => Ok(Expr::Str(s)),
            Tok::Ident(name) => Ok(match name.as_str() {
                "null" => Expr::Null,
                "true" => Expr::Bool(true),
                "false" => Expr::Bool(false),
                _ => Expr::Ident(name, span),
            }),
            Tok::LParen => {
                let inner = self.expr()?;
                self.expect(&Tok::RParen, "to close parenthesized expression")?;
                Ok(inner)
            }
            Tok::LBrace => {
                let decls = self.decls(&Tok::RBrace)?;
                self.next();
                Ok(Expr::Struct(StructLit { decls, span }))
            }
            Tok::LBrack => self.list(span),
            other => {
                self.pos = self.pos.saturating_sub(1);
                Err(self.error(format!(
                    "expected expression, found {}",
                    other.describe()
                )))
            }
        }
    }

    fn list(&mut self, span: Span) -> Result<Expr, SyntaxError> {
        let mut elements = Vec::new();
        let mut tail = None;
        loop {
            self.skip_commas();
            match self.peek() {
                Tok::RBrack => {
                    self.next();
                    break;
                }
                Tok::Ellipsis => {
                    self.next();
                    tail = Some(Box::new(if matches!(self.peek(), Tok::RBrack | Tok::Comma) {
                        Expr::Top
                    } else {
                        self.expr()?
                    }));
                    self.skip_commas();
                    self.expect(&Tok::RBrack, "after list tail")?;
                    break;
                }
                Tok::Eof => return Err(self.error("expected ']' to close list, found EOF")),
                _ => {
                    elements.push(self.expr()?);
                    if !matches!(self.peek(), Tok::Comma | Tok::RBrack) {
                        return Err(self.error(format!(
                            "expected ',' or ']' in list, found {}",
                            self.peek().describe()
                        )));
                    }
                }
            }
        }
        Ok(Expr::List(ListLit {
            elements,
            tail,
            span,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_src(src: &str) -> Result<File, SyntaxError> {
        parse(tokenize(src)?)
    }

    fn only_field(file: &File) -> &FieldDecl {
        match &file.body.decls[..] {
            [Decl::Field(f)] => f,
            other => panic!("expected one field, got {other:?}"),
        }
    }

    #[test]
    fn test_definition_with_fields() {
        let file = parse_src(
            r#"
            #Config: {
                name: string
                replicas?: int & >=1 & <=10
            }
            "#,
        )
        .unwrap();
        let def = only_field(&file);
        assert_eq!(def.label, LabelName::Ident("#Config".into()));
        let Expr::Struct(body) = &def.value else {
            panic!("expected struct");
        };
        assert_eq!(body.decls.len(), 2);
        let Decl::Field(replicas) = &body.decls[1] else {
            panic!("expected field");
        };
        assert_eq!(replicas.presence, Presence::Optional);
        assert!(matches!(&replicas.value, Expr::And(parts) if parts.len() == 3));
    }

    #[test]
    fn test_disjunction_with_default() {
        let file = parse_src(r#"env: *"dev" | "prod""#).unwrap();
        let Expr::Or(alts) = &only_field(&file).value else {
            panic!("expected disjunction");
        };
        assert_eq!(alts.len(), 2);
        assert!(alts[0].1);
        assert!(!alts[1].1);
    }

    #[test]
    fn test_nested_label_shorthand() {
        let file = parse_src("a: b?: c: int").unwrap();
        let Expr::Struct(inner) = &only_field(&file).value else {
            panic!("expected struct");
        };
        let Decl::Field(b) = &inner.decls[0] else {
            panic!("expected field");
        };
        assert_eq!(b.label, LabelName::Ident("b".into()));
        assert_eq!(b.presence, Presence::Optional);
    }

    #[test]
    fn test_pattern_constraint_and_ellipsis() {
        let file = parse_src("labels: {[string]: string, ...}").unwrap();
        let Expr::Struct(body) = &only_field(&file).value else {
            panic!("expected struct");
        };
        assert!(matches!(body.decls[0], Decl::Pattern(_)));
        assert!(matches!(body.decls[1], Decl::Ellipsis(_)));
    }

    #[test]
    fn test_pattern_label_shorthand() {
        let file = parse_src("labels?: [string]: string\ntags: [string]").unwrap();
        let [Decl::Field(labels), Decl::Field(tags)] = &file.body.decls[..] else {
            panic!("expected two fields");
        };
        assert_eq!(labels.presence, Presence::Optional);
        let Expr::Struct(inner) = &labels.value else {
            panic!("expected struct");
        };
        assert!(matches!(&inner.decls[..], [Decl::Pattern(_)]));
        assert!(matches!(&tags.value, Expr::List(list) if list.elements.len() == 1));
    }

    #[test]
    fn test_list_with_tail() {
        let file = parse_src("ports: [...int]").unwrap();
        let Expr::List(list) = &only_field(&file).value else {
            panic!("expected list");
        };
        assert!(list.elements.is_empty());
        assert!(list.tail.is_some());
    }

    #[test]
    fn test_package_clause_is_recorded() {
        let file = parse_src("package app\n\n#Config: {}").unwrap();
        assert_eq!(file.package.as_deref(), Some("app"));
    }

    #[test]
    fn test_quoted_labels() {
        let file = parse_src(r#""x-key": string"#).unwrap();
        assert_eq!(only_field(&file).label, LabelName::Quoted("x-key".into()));
    }

    #[test]
    fn test_unterminated_struct_is_an_error() {
        let err = parse_src("#Config: {invalid syntax").unwrap_err();
        assert!(err.message.contains("expected"), "{}", err.message);
    }

    #[test]
    fn test_imports_are_rejected() {
        let err = parse_src("import \"strings\"").unwrap_err();
        assert!(err.message.contains("imports are not supported"));
    }

    #[test]
    fn test_missing_colon() {
        let err = parse_src("a int").unwrap_err();
        assert!(err.message.contains("':'"), "{}", err.message);
    }
}

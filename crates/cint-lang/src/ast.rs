//! Syntax tree produced by the parser.

pub use crate::value::Presence;

/// Line/column of a syntax node (file is bound later by the compiler).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

/// A parsed schema file.
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub package: Option<String>,
    pub body: StructLit,
}

/// `{ decls }`, or the implicit top-level struct of a file.
#[derive(Debug, Clone, PartialEq)]
pub struct StructLit {
    pub decls: Vec<Decl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    /// `label: expr`, `label?: expr`, `label!: expr`.
    Field(FieldDecl),
    /// `[labelExpr]: expr`
    Pattern(PatternDecl),
    /// `...`
    Ellipsis(Span),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub label: LabelName,
    pub presence: Presence,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternDecl {
    pub label: Expr,
    pub value: Expr,
    pub span: Span,
}

/// A field label as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelName {
    /// Bare identifier, `#Definition` or `_hidden`; referable by name.
    Ident(String),
    /// `"quoted"`; never referable.
    Quoted(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Ge,
    Gt,
    Le,
    Lt,
    Ne,
    Match,
    NotMatch,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Ge => ">=",
            UnaryOp::Gt => ">",
            UnaryOp::Le => "<=",
            UnaryOp::Lt => "<",
            UnaryOp::Ne => "!=",
            UnaryOp::Match => "=~",
            UnaryOp::NotMatch => "!~",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Top,
    Bottom(Span),
    Null,
    Bool(bool),
    Int(i128),
    Float(f64),
    Str(String),
    Ident(String, Span),
    Struct(StructLit),
    List(ListLit),
    Unary(UnaryOp, Box<Expr>, Span),
    /// `a & b & ...`
    And(Vec<Expr>),
    /// `a | *b | ...`; the flag marks default alternatives.
    Or(Vec<(Expr, bool)>),
    /// `*expr` outside a disjunction.
    Default(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListLit {
    pub elements: Vec<Expr>,
    /// `...T` after the last element; `...` alone is `Some(Top)`.
    pub tail: Option<Box<Expr>>,
    pub span: Span,
}

//! # Evaluation
//!
//! Compiles a parsed [`File`] into a [`Value`]. References resolve
//! lexically through the chain of enclosing struct literals; each field is
//! evaluated once per declaring struct and memoized, and a reference back
//! into a field still being evaluated is a structural cycle.
//!
//! Every struct reached through a definition label (`#Name`) is closed
//! unless it declares `...`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::{Decl, Expr, File, LabelName, ListLit, Span, StructLit, UnaryOp};
use crate::context::Context;
use crate::error::CompileError;
use crate::pos::Pos;
use crate::unify::{apply_patterns, disjunction, meet};
use crate::value::{
    quote, Bound, CmpOp, Element, Field, Kinds, Label, LabelKind, ListValue, Pattern,
    PatternConstraint, Presence, StructValue, Value,
};

/// One enclosing struct literal.
#[derive(Clone, Copy)]
struct Frame<'a> {
    lit: &'a StructLit,
    in_def: bool,
}

type FieldKey = (usize, String);

pub(crate) struct Compiler<'a> {
    ctx: &'a Context,
    file: Arc<str>,
    done: HashMap<FieldKey, Field>,
    in_progress: Vec<FieldKey>,
}

fn label_of(name: &LabelName) -> Label {
    match name {
        LabelName::Ident(ident) => Label::from_ident(ident),
        LabelName::Quoted(s) => Label::regular(s.clone()),
    }
}

fn declares(lit: &StructLit, name: &str) -> bool {
    lit.decls.iter().any(|d| {
        matches!(d, Decl::Field(fd) if matches!(&fd.label, LabelName::Ident(n) if n == name))
    })
}

impl<'a> Compiler<'a> {
    pub(crate) fn new(ctx: &'a Context, file: Arc<str>) -> Self {
        Self {
            ctx,
            file,
            done: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    pub(crate) fn compile_file(&mut self, file: &'a File) -> Result<Value, CompileError> {
        self.eval_struct(&file.body, &[], false)
    }

    fn pos(&self, span: Span) -> Pos {
        Pos::schema(self.file.clone(), span.line, span.column)
    }

    fn error(&self, span: Span, message: impl Into<String>) -> CompileError {
        CompileError::new(self.pos(span), message)
    }

    fn eval_struct(
        &mut self,
        lit: &'a StructLit,
        outer: &[Frame<'a>],
        in_def: bool,
    ) -> Result<Value, CompileError> {
        let mut frames = outer.to_vec();
        frames.push(Frame { lit, in_def });

        let mut s = StructValue::default();
        let mut open = false;
        for decl in &lit.decls {
            match decl {
                Decl::Field(fd) => {
                    let label = label_of(&fd.label);
                    if s.field(label.name()).is_none() {
                        let field = self.eval_field(&label, &frames)?;
                        s.fields.push(field);
                    }
                }
                Decl::Pattern(pd) => {
                    let label = self.eval_expr(&pd.label, &frames, in_def)?;
                    if label.kinds().intersect(Kinds::STRING).is_empty() {
                        return Err(self.error(pd.span, format!("invalid label constraint {label}")));
                    }
                    let value = self.eval_expr(&pd.value, &frames, in_def)?;
                    s.patterns.push(PatternConstraint {
                        label,
                        value,
                        positions: vec![self.pos(pd.span)],
                    });
                }
                Decl::Ellipsis(_) => open = true,
            }
        }
        s.closed = in_def && !open;

        let patterns = s.patterns.clone();
        for field in &mut s.fields {
            apply_patterns(field, &patterns);
        }
        Ok(Value::Struct(s))
    }

    /// Evaluate every declaration of `label` in the innermost frame.
    fn eval_field(&mut self, label: &Label, frames: &[Frame<'a>]) -> Result<Field, CompileError> {
        let Some(frame) = frames.last().copied() else {
            return Err(CompileError::new(
                Pos::schema(self.file.clone(), 0, 0),
                "field outside of any struct",
            ));
        };
        let key = (frame.lit as *const StructLit as usize, label.name().to_string());
        if let Some(field) = self.done.get(&key) {
            return Ok(field.clone());
        }

        let decls: Vec<_> = frame
            .lit
            .decls
            .iter()
            .filter_map(|d| match d {
                Decl::Field(fd) if label_of(&fd.label).name() == label.name() => Some(fd),
                _ => None,
            })
            .collect();

        if self.in_progress.contains(&key) {
            let span = decls.first().map_or(frame.lit.span, |fd| fd.span);
            return Err(self.error(span, format!("structural cycle in field {}", label.segment())));
        }
        self.in_progress.push(key.clone());

        let in_def = frame.in_def || label.kind() == LabelKind::Definition;
        let mut value = Value::Top;
        let mut presence: Option<Presence> = None;
        let mut positions = Vec::with_capacity(decls.len());
        for fd in decls {
            let v = self.eval_expr(&fd.value, frames, in_def)?;
            value = meet(&value, &v);
            presence = Some(presence.map_or(fd.presence, |p| p.meet(fd.presence)));
            positions.push(self.pos(fd.span));
        }

        self.in_progress.pop();
        let field = Field {
            label: label.clone(),
            value,
            presence: presence.unwrap_or(Presence::Regular),
            positions,
        };
        self.done.insert(key, field.clone());
        Ok(field)
    }

    fn resolve(&mut self, name: &str, span: Span, frames: &[Frame<'a>]) -> Result<Value, CompileError> {
        for idx in (0..frames.len()).rev() {
            if declares(frames[idx].lit, name) {
                let field = self.eval_field(&Label::from_ident(name), &frames[..=idx])?;
                return Ok(field.value);
            }
        }
        if let Some(kinds) = Kinds::from_name(name) {
            return Ok(Value::Kind(kinds));
        }
        Err(self.error(span, format!("reference {} not found", quote(name))))
    }

    fn eval_expr(
        &mut self,
        expr: &'a Expr,
        frames: &[Frame<'a>],
        in_def: bool,
    ) -> Result<Value, CompileError> {
        match expr {
            Expr::Top => Ok(Value::Top),
            Expr::Bottom(_) => Ok(Value::bottom("explicit error (_|_ literal) in source")),
            Expr::Null => Ok(Value::Null),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Float(x) => Ok(Value::Float(*x)),
            Expr::Str(s) => Ok(Value::String(s.clone())),
            Expr::Ident(name, span) => self.resolve(name, *span, frames),
            Expr::Struct(lit) => self.eval_struct(lit, frames, in_def),
            Expr::List(list) => self.eval_list(list, frames, in_def),
            Expr::Unary(op, operand, span) => {
                let v = self.eval_expr(operand, frames, in_def)?;
                self.eval_unary(*op, v, *span)
            }
            Expr::And(parts) => {
                let mut acc = Value::Top;
                for part in parts {
                    let v = self.eval_expr(part, frames, in_def)?;
                    acc = meet(&acc, &v);
                }
                Ok(acc)
            }
            Expr::Or(alternatives) => {
                let mut evaluated = Vec::with_capacity(alternatives.len());
                for (alt, marked) in alternatives {
                    evaluated.push((self.eval_expr(alt, frames, in_def)?, *marked));
                }
                Ok(disjunction(evaluated))
            }
            Expr::Default(inner) => self.eval_expr(inner, frames, in_def),
        }
    }

    fn eval_list(
        &mut self,
        list: &'a ListLit,
        frames: &[Frame<'a>],
        in_def: bool,
    ) -> Result<Value, CompileError> {
        let mut elements = Vec::with_capacity(list.elements.len());
        for e in &list.elements {
            elements.push(Element {
                value: self.eval_expr(e, frames, in_def)?,
                positions: Vec::new(),
            });
        }
        let tail = match &list.tail {
            Some(t) => Some(Box::new(self.eval_expr(t, frames, in_def)?)),
            None => None,
        };
        Ok(Value::List(ListValue { elements, tail }))
    }

    fn eval_unary(&self, op: UnaryOp, operand: Value, span: Span) -> Result<Value, CompileError> {
        let cmp = match op {
            UnaryOp::Neg => {
                return match operand {
                    Value::Int(n) => Ok(Value::Int(-n)),
                    Value::Float(x) => Ok(Value::Float(-x)),
                    other => Err(self.error(span, format!("invalid operand {other} for unary -"))),
                };
            }
            UnaryOp::Ne => {
                if !operand.is_atom() {
                    return Err(self.error(span, format!("invalid operand {operand} for !=")));
                }
                return Ok(Value::Bound(Bound::NotEqual(Box::new(operand))));
            }
            UnaryOp::Match | UnaryOp::NotMatch => {
                let Value::String(source) = operand else {
                    return Err(self.error(
                        span,
                        format!("invalid operand {operand} for {}: expected a string", op.symbol()),
                    ));
                };
                let regex = self.ctx.regex(&source).map_err(|e| {
                    self.error(span, format!("invalid regular expression {}: {e}", quote(&source)))
                })?;
                let pattern = Pattern::new(source, regex);
                return Ok(Value::Bound(if op == UnaryOp::Match {
                    Bound::Match(pattern)
                } else {
                    Bound::NotMatch(pattern)
                }));
            }
            UnaryOp::Ge => CmpOp::Ge,
            UnaryOp::Gt => CmpOp::Gt,
            UnaryOp::Le => CmpOp::Le,
            UnaryOp::Lt => CmpOp::Lt,
        };
        match operand {
            Value::Int(_) | Value::Float(_) | Value::String(_) => {
                Ok(Value::Bound(Bound::Compare(cmp, Box::new(operand))))
            }
            other => Err(self.error(
                span,
                format!(
                    "invalid operand {other} for {}: bound must be a concrete number or string",
                    op.symbol()
                ),
            )),
        }
    }
}

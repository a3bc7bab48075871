//! # Value Model
//!
//! Every schema expression and every decoded document evaluates to a
//! [`Value`]. Values form a lattice: [`Value::Top`] admits everything,
//! [`Value::Bottom`] admits nothing and carries the reason, and
//! unification (see [`crate::unify`]) computes the greatest lower bound.
//!
//! Concrete values (`null`, booleans, numbers, strings, and structs or
//! lists whose members are concrete) are what documents contain. Kinds,
//! bounds, conjunctions of those, and unresolved disjunctions are
//! constraints that only a concrete value can satisfy.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::ValidationFailure;
use crate::pos::Pos;

/// A set of basic kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Kinds(u8);

impl Kinds {
    pub const NONE: Self = Self(0);
    pub const NULL: Self = Self(1);
    pub const BOOL: Self = Self(1 << 1);
    pub const INT: Self = Self(1 << 2);
    pub const FLOAT: Self = Self(1 << 3);
    pub const STRING: Self = Self(1 << 4);
    pub const STRUCT: Self = Self(1 << 5);
    pub const LIST: Self = Self(1 << 6);
    pub const NUMBER: Self = Self(Self::INT.0 | Self::FLOAT.0);
    pub const ALL: Self = Self(0x7f);

    pub fn intersect(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every kind in `other` is also in `self`.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// The kind named by a predeclared identifier.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "null" => Some(Self::NULL),
            "bool" => Some(Self::BOOL),
            "int" => Some(Self::INT),
            "float" => Some(Self::FLOAT),
            "number" => Some(Self::NUMBER),
            "string" => Some(Self::STRING),
            _ => None,
        }
    }
}

impl fmt::Display for Kinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::ALL {
            return f.write_str("_");
        }
        if self.is_empty() {
            return f.write_str("_|_");
        }
        let mut names = Vec::new();
        if self.contains(Self::NULL) {
            names.push("null");
        }
        if self.contains(Self::BOOL) {
            names.push("bool");
        }
        if self.contains(Self::NUMBER) {
            names.push("number");
        } else if self.contains(Self::INT) {
            names.push("int");
        } else if self.contains(Self::FLOAT) {
            names.push("float");
        }
        if self.contains(Self::STRING) {
            names.push("string");
        }
        if self.contains(Self::STRUCT) {
            names.push("struct");
        }
        if self.contains(Self::LIST) {
            names.push("list");
        }
        f.write_str(&names.join("|"))
    }
}

/// Whether a field must, may, or must eventually be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Written `label?:`. Checked only if something else makes it regular.
    Optional,
    /// Written `label:`. Must be concrete.
    Regular,
    /// Written `label!:`. Must be supplied by a regular declaration.
    Required,
}

impl Presence {
    pub(crate) fn meet(self, other: Self) -> Self {
        use Presence::{Optional, Regular, Required};
        match (self, other) {
            (Regular, _) | (_, Regular) => Regular,
            (Required, _) | (_, Required) => Required,
            (Optional, Optional) => Optional,
        }
    }
}

/// How a label may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    /// Data field.
    Regular,
    /// `#Name`, a schema definition, never data.
    Definition,
    /// `_name`, schema-private, never data.
    Hidden,
}

/// A struct field label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label {
    name: String,
    kind: LabelKind,
}

impl Label {
    /// A data label, as produced by document keys and quoted schema labels.
    pub fn regular(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: LabelKind::Regular,
        }
    }

    /// Classify a bare schema identifier.
    pub(crate) fn from_ident(name: &str) -> Self {
        let kind = if name.starts_with('#') {
            LabelKind::Definition
        } else if name.starts_with('_') {
            LabelKind::Hidden
        } else {
            LabelKind::Regular
        };
        Self {
            name: name.to_string(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> LabelKind {
        self.kind
    }

    pub fn is_regular(&self) -> bool {
        self.kind == LabelKind::Regular
    }

    /// How the label appears in a violation path: identifiers verbatim,
    /// anything else quoted.
    pub fn segment(&self) -> String {
        if self.kind != LabelKind::Regular || is_plain_identifier(&self.name) {
            self.name.clone()
        } else {
            quote(&self.name)
        }
    }
}

fn is_plain_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// A compiled regular expression remembered with its source text.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Arc<Regex>,
}

impl Pattern {
    pub(crate) fn new(source: String, regex: Arc<Regex>) -> Self {
        Self { source, regex }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, s: &str) -> bool {
        self.regex.is_match(s)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Ordering comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Ge,
    Gt,
    Le,
    Lt,
}

impl CmpOp {
    fn symbol(self) -> &'static str {
        match self {
            CmpOp::Ge => ">=",
            CmpOp::Gt => ">",
            CmpOp::Le => "<=",
            CmpOp::Lt => "<",
        }
    }

    fn holds(self, ord: Ordering) -> bool {
        match self {
            CmpOp::Ge => ord != Ordering::Less,
            CmpOp::Gt => ord == Ordering::Greater,
            CmpOp::Le => ord != Ordering::Greater,
            CmpOp::Lt => ord == Ordering::Less,
        }
    }
}

/// A unary constraint on scalar values.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    /// `>=x`, `>x`, `<=x`, `<x` with a number or string operand.
    Compare(CmpOp, Box<Value>),
    /// `!=x`
    NotEqual(Box<Value>),
    /// `=~"re"`
    Match(Pattern),
    /// `!~"re"`
    NotMatch(Pattern),
}

impl Bound {
    pub fn kinds(&self) -> Kinds {
        match self {
            Bound::Compare(_, operand) => match operand.as_ref() {
                Value::Int(_) | Value::Float(_) => Kinds::NUMBER,
                other => other.kinds(),
            },
            Bound::NotEqual(_) => Kinds::ALL,
            Bound::Match(_) | Bound::NotMatch(_) => Kinds::STRING,
        }
    }

    /// Whether the concrete scalar `v` satisfies the bound.
    pub fn admits(&self, v: &Value) -> bool {
        match self {
            Bound::Compare(op, operand) => {
                compare_scalars(v, operand).is_some_and(|ord| op.holds(ord))
            }
            Bound::NotEqual(operand) => v != operand.as_ref(),
            Bound::Match(p) => matches!(v, Value::String(s) if p.is_match(s)),
            Bound::NotMatch(p) => matches!(v, Value::String(s) if !p.is_match(s)),
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Compare(op, operand) => write!(f, "{}{operand}", op.symbol()),
            Bound::NotEqual(operand) => write!(f, "!={operand}"),
            Bound::Match(p) => write!(f, "=~{}", quote(p.source())),
            Bound::NotMatch(p) => write!(f, "!~{}", quote(p.source())),
        }
    }
}

/// Order two scalars of compatible kinds. Ints compare exactly; mixed
/// int/float comparisons go through `f64`.
pub(crate) fn compare_scalars(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            a.as_f64()?.partial_cmp(&b.as_f64()?)
        }
        _ => None,
    }
}

/// One alternative of a disjunction.
#[derive(Debug, Clone, PartialEq)]
pub struct Alternative {
    pub value: Value,
    /// Marked with `*`.
    pub default: bool,
}

/// `a | b | ...` with at least two surviving alternatives.
#[derive(Debug, Clone, PartialEq)]
pub struct Disjunction {
    pub alternatives: Vec<Alternative>,
    /// Whether any alternative was ever marked as a default.
    pub has_defaults: bool,
}

impl Disjunction {
    /// The value a concrete evaluation settles on: the single default, or
    /// nothing if zero or several defaults remain.
    pub fn default_value(&self) -> Option<&Value> {
        if !self.has_defaults {
            return None;
        }
        let mut defaults = self.alternatives.iter().filter(|a| a.default);
        match (defaults.next(), defaults.next()) {
            (Some(only), None) => Some(&only.value),
            _ => None,
        }
    }
}

/// A struct field with every position that declared it.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub label: Label,
    pub value: Value,
    pub presence: Presence,
    pub positions: Vec<Pos>,
}

/// `[label]: value`, applied to every field whose label matches.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternConstraint {
    pub label: Value,
    pub value: Value,
    pub positions: Vec<Pos>,
}

/// A struct value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructValue {
    pub fields: Vec<Field>,
    pub patterns: Vec<PatternConstraint>,
    /// Closed structs reject regular fields they neither declare nor match
    /// by pattern.
    pub closed: bool,
}

impl StructValue {
    /// Look up a field by label name (`#Config`, `name`).
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.label.name() == name)
    }

    pub(crate) fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.label.name() == name)
    }

    /// Whether a field labelled `label` may be added by unification.
    pub fn allows(&self, label: &Label) -> bool {
        !self.closed
            || !label.is_regular()
            || self.field(label.name()).is_some()
            || self
                .patterns
                .iter()
                .any(|p| crate::unify::admits(&p.label, &Value::String(label.name().to_string())))
    }
}

/// A list element with its positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub value: Value,
    pub positions: Vec<Pos>,
}

/// A list value. Without a tail its length is fixed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListValue {
    pub elements: Vec<Element>,
    /// `...T`: any number of further elements, each unified with `T`.
    pub tail: Option<Box<Value>>,
}

/// A node of the value lattice.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `_`: admits everything.
    Top,
    /// `_|_`: admits nothing; carries the conflict message.
    Bottom(String),
    Null,
    Bool(bool),
    Int(i128),
    Float(f64),
    String(String),
    /// A basic type such as `int` or `string`.
    Kind(Kinds),
    Bound(Bound),
    /// Two or more non-concrete scalar constraints (kinds and bounds).
    Conjunction(Vec<Value>),
    Disjunction(Disjunction),
    Struct(StructValue),
    List(ListValue),
}

impl Value {
    /// A conflict.
    pub fn bottom(message: impl Into<String>) -> Self {
        Value::Bottom(message.into())
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, Value::Bottom(_))
    }

    /// True for `null`, booleans, numbers and strings.
    pub fn is_atom(&self) -> bool {
        matches!(
            self,
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::String(_)
        )
    }

    /// The kinds of concrete value this value admits.
    pub fn kinds(&self) -> Kinds {
        match self {
            Value::Top => Kinds::ALL,
            Value::Bottom(_) => Kinds::NONE,
            Value::Null => Kinds::NULL,
            Value::Bool(_) => Kinds::BOOL,
            Value::Int(_) => Kinds::INT,
            Value::Float(_) => Kinds::FLOAT,
            Value::String(_) => Kinds::STRING,
            Value::Kind(k) => *k,
            Value::Bound(b) => b.kinds(),
            Value::Conjunction(parts) => parts
                .iter()
                .fold(Kinds::ALL, |acc, p| acc.intersect(p.kinds())),
            Value::Disjunction(d) => d.alternatives.iter().fold(Kinds::NONE, |acc, a| {
                Kinds(acc.0 | a.value.kinds().0)
            }),
            Value::Struct(_) => Kinds::STRUCT,
            Value::List(_) => Kinds::LIST,
        }
    }

    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Look up a top-level field of a struct value by label name.
    ///
    /// The returned [`Instance`] remembers the path to the field so that
    /// violations found beneath it are reported from the root.
    pub fn lookup(&self, name: &str) -> Option<Instance<'_>> {
        let Value::Struct(s) = self else {
            return None;
        };
        s.field(name).map(|f| Instance {
            path: vec![f.label.segment()],
            value: &f.value,
            positions: &f.positions,
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Top => f.write_str("_"),
            Value::Bottom(_) => f.write_str("_|_"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => {
                if x.is_finite() && x.fract() == 0.0 {
                    write!(f, "{x:.1}")
                } else {
                    write!(f, "{x}")
                }
            }
            Value::String(s) => f.write_str(&quote(s)),
            Value::Kind(k) => write!(f, "{k}"),
            Value::Bound(b) => write!(f, "{b}"),
            Value::Conjunction(parts) => {
                let rendered: Vec<String> = parts.iter().map(ToString::to_string).collect();
                f.write_str(&rendered.join(" & "))
            }
            Value::Disjunction(d) => {
                let rendered: Vec<String> = d
                    .alternatives
                    .iter()
                    .map(|a| {
                        if a.default && d.has_defaults {
                            format!("*{}", a.value)
                        } else {
                            a.value.to_string()
                        }
                    })
                    .collect();
                f.write_str(&rendered.join(" | "))
            }
            Value::Struct(_) => f.write_str("{...}"),
            Value::List(_) => f.write_str("[...]"),
        }
    }
}

/// Quote a string the way it is written in schema source.
pub(crate) fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// A named sub-value of a compiled schema, with its path from the root.
#[derive(Debug, Clone)]
pub struct Instance<'a> {
    path: Vec<String>,
    value: &'a Value,
    positions: &'a [Pos],
}

impl<'a> Instance<'a> {
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// Where the sub-value was declared.
    pub fn positions(&self) -> &'a [Pos] {
        self.positions
    }

    /// Check that the sub-value on its own is concrete.
    ///
    /// # Errors
    ///
    /// Returns every violation found beneath the instance.
    pub fn validate_concrete(&self) -> Result<(), ValidationFailure> {
        crate::concrete::validate(self.value, &self.path, self.positions)
    }
}

/// The transient result of unifying a definition with a document.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedValue {
    pub(crate) path: Vec<String>,
    pub(crate) value: Value,
    pub(crate) positions: Vec<Pos>,
}

impl UnifiedValue {
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Demand full concreteness: every reachable regular field must
    /// resolve to a concrete, conflict-free value.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationFailure`] listing one violation per conflict
    /// or unresolved field.
    pub fn validate_concrete(&self) -> Result<(), ValidationFailure> {
        crate::concrete::validate(&self.value, &self.path, &self.positions)
    }
}

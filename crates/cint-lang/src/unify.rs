//! # Unification
//!
//! [`meet`] computes the greatest lower bound of two values. Conflicts
//! never abort: they are recorded as [`Value::Bottom`] at the node where
//! they arise, so a single pass over a document can surface every
//! independent violation.

use crate::error::Violation;
use crate::pos::merge_positions;
use crate::value::{
    Alternative, Disjunction, Element, Field, Instance, Kinds, ListValue, PatternConstraint,
    Presence, StructValue, UnifiedValue, Value,
};

static TOP: Value = Value::Top;

/// Unify a schema definition with a document value.
pub(crate) fn unify_instance(definition: &Instance<'_>, document: &Value) -> UnifiedValue {
    UnifiedValue {
        path: definition.path().to_vec(),
        value: meet(definition.value(), document),
        positions: definition.positions().to_vec(),
    }
}

/// Whether `constraint` admits the concrete value `v`.
pub(crate) fn admits(constraint: &Value, v: &Value) -> bool {
    !meet(constraint, v).is_bottom()
}

/// The meet of `a` and `b`.
pub(crate) fn meet(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Bottom(_), _) => return a.clone(),
        (_, Value::Bottom(_)) => return b.clone(),
        (Value::Top, _) => return b.clone(),
        (_, Value::Top) => return a.clone(),
        (Value::Disjunction(d), other) | (other, Value::Disjunction(d)) => {
            return meet_disjunction(d, other);
        }
        _ => {}
    }

    let (ka, kb) = (a.kinds(), b.kinds());
    if ka.intersect(kb).is_empty() {
        return Value::bottom(format!(
            "conflicting values {a} and {b} (mismatched types {ka} and {kb})"
        ));
    }

    match (a, b) {
        (Value::Struct(x), Value::Struct(y)) => Value::Struct(meet_structs(x, y)),
        (Value::List(x), Value::List(y)) => meet_lists(x, y),
        // Only `!=` constraints share a kind with structs and lists, and a
        // scalar operand never equals a composite.
        (Value::Struct(_) | Value::List(_), _) => a.clone(),
        (_, Value::Struct(_) | Value::List(_)) => b.clone(),
        _ if a.is_atom() && b.is_atom() => meet_atoms(a, b),
        _ if a.is_atom() => constrain(b, a),
        _ if b.is_atom() => constrain(a, b),
        _ => meet_constraints(a, b),
    }
}

fn meet_atoms(a: &Value, b: &Value) -> Value {
    if a == b {
        a.clone()
    } else {
        Value::bottom(format!("conflicting values {a} and {b}"))
    }
}

/// Apply a non-concrete scalar constraint to a concrete atom.
fn constrain(constraint: &Value, atom: &Value) -> Value {
    match constraint {
        Value::Kind(_) => atom.clone(),
        Value::Bound(bound) => {
            if bound.admits(atom) {
                atom.clone()
            } else {
                Value::bottom(format!("invalid value {atom} (out of bound {bound})"))
            }
        }
        Value::Conjunction(parts) => {
            for part in parts {
                let checked = constrain(part, atom);
                if checked.is_bottom() {
                    return checked;
                }
            }
            atom.clone()
        }
        other => meet(other, atom),
    }
}

/// Combine kinds and bounds into one conjunction, kind first.
fn meet_constraints(a: &Value, b: &Value) -> Value {
    let mut kind = None;
    let mut bounds: Vec<Value> = Vec::new();
    for side in [a, b] {
        let parts = match side {
            Value::Conjunction(parts) => parts.as_slice(),
            other => std::slice::from_ref(other),
        };
        for part in parts {
            match part {
                Value::Kind(k) => {
                    kind = Some(kind.map_or(*k, |acc: Kinds| acc.intersect(*k)));
                }
                other if !bounds.contains(other) => bounds.push(other.clone()),
                _ => {}
            }
        }
    }

    let mut parts = Vec::with_capacity(bounds.len() + 1);
    if let Some(k) = kind {
        parts.push(Value::Kind(k));
    }
    parts.extend(bounds);
    if parts.len() == 1 {
        parts.remove(0)
    } else {
        Value::Conjunction(parts)
    }
}

/// Distribute `other` over every alternative of `d`.
fn meet_disjunction(d: &Disjunction, other: &Value) -> Value {
    let mut alternatives = Vec::new();
    let mut errors = Vec::new();
    let mut has_defaults = d.has_defaults;

    for alt in &d.alternatives {
        let outer_default = alt.default || !d.has_defaults;
        let value = meet(&alt.value, other);
        if let Some(message) = first_conflict(&value) {
            errors.push(message);
            continue;
        }
        match value {
            Value::Disjunction(inner) => {
                has_defaults |= inner.has_defaults;
                for inner_alt in inner.alternatives {
                    let inner_default = inner_alt.default || !inner.has_defaults;
                    push_alternative(
                        &mut alternatives,
                        inner_alt.value,
                        outer_default && inner_default,
                    );
                }
            }
            value => push_alternative(&mut alternatives, value, outer_default),
        }
    }

    finish_disjunction(alternatives, has_defaults, errors)
}

/// Build a disjunction from evaluated alternatives (flag = marked `*`).
pub(crate) fn disjunction(alternatives: Vec<(Value, bool)>) -> Value {
    let has_defaults = alternatives.iter().any(|(_, marked)| *marked);
    let mut out = Vec::new();
    let mut errors = Vec::new();
    let mut nested_defaults = false;

    for (value, marked) in alternatives {
        let outer_default = marked || !has_defaults;
        if let Some(message) = first_conflict(&value) {
            errors.push(message);
            continue;
        }
        match value {
            Value::Disjunction(inner) => {
                nested_defaults |= inner.has_defaults;
                for inner_alt in inner.alternatives {
                    let inner_default = inner_alt.default || !inner.has_defaults;
                    push_alternative(&mut out, inner_alt.value, outer_default && inner_default);
                }
            }
            value => push_alternative(&mut out, value, outer_default),
        }
    }

    finish_disjunction(out, has_defaults || nested_defaults, errors)
}

/// The first conflict that eliminates `value` as a disjunct: the value
/// itself, or any data field or list element below it. Rendered with the
/// path to the conflicting node.
fn first_conflict(value: &Value) -> Option<String> {
    let mut path = Vec::new();
    let message = find_conflict(value, &mut path)?;
    Some(Violation::new(path, Vec::new(), message).to_string())
}

fn find_conflict<'v>(value: &'v Value, path: &mut Vec<String>) -> Option<&'v str> {
    match value {
        Value::Bottom(message) => Some(message.as_str()),
        Value::Struct(s) => {
            let data = s
                .fields
                .iter()
                .filter(|f| f.label.is_regular() && f.presence == Presence::Regular);
            for field in data {
                path.push(field.label.segment());
                if let Some(message) = find_conflict(&field.value, path) {
                    return Some(message);
                }
                path.pop();
            }
            None
        }
        Value::List(list) => {
            for (i, element) in list.elements.iter().enumerate() {
                path.push(format!("[{i}]"));
                if let Some(message) = find_conflict(&element.value, path) {
                    return Some(message);
                }
                path.pop();
            }
            None
        }
        _ => None,
    }
}

fn push_alternative(alternatives: &mut Vec<Alternative>, value: Value, default: bool) {
    if let Some(existing) = alternatives.iter_mut().find(|a| a.value == value) {
        existing.default |= default;
    } else {
        alternatives.push(Alternative { value, default });
    }
}

fn finish_disjunction(
    mut alternatives: Vec<Alternative>,
    has_defaults: bool,
    errors: Vec<String>,
) -> Value {
    match alternatives.len() {
        0 => Value::bottom(match errors.len() {
            0 => "empty disjunction".to_string(),
            1 => errors.into_iter().next().unwrap_or_default(),
            n => format!("{n} errors in empty disjunction: {}", errors.join("; ")),
        }),
        1 => alternatives.remove(0).value,
        _ => {
            let has_defaults = has_defaults && alternatives.iter().any(|a| a.default);
            Value::Disjunction(Disjunction {
                alternatives,
                has_defaults,
            })
        }
    }
}

fn meet_structs(x: &StructValue, y: &StructValue) -> StructValue {
    let mut fields = Vec::with_capacity(x.fields.len() + y.fields.len());

    for fx in &x.fields {
        let field = match y.field(fx.label.name()) {
            Some(fy) => Field {
                label: fx.label.clone(),
                value: meet(&fx.value, &fy.value),
                presence: fx.presence.meet(fy.presence),
                positions: merge_positions(&fx.positions, &fy.positions),
            },
            None => admit_field(fx, y),
        };
        fields.push(field);
    }
    for fy in &y.fields {
        if x.field(fy.label.name()).is_none() {
            fields.push(admit_field(fy, x));
        }
    }

    let mut patterns = x.patterns.clone();
    for p in &y.patterns {
        if !patterns.contains(p) {
            patterns.push(p.clone());
        }
    }

    StructValue {
        fields,
        patterns,
        closed: x.closed || y.closed,
    }
}

/// A field present on one side only: rejected if the other side is closed
/// to it, otherwise constrained by the other side's patterns.
fn admit_field(field: &Field, other: &StructValue) -> Field {
    let mut field = field.clone();
    if !other.allows(&field.label) {
        field.value = Value::bottom("field not allowed");
        return field;
    }
    apply_patterns(&mut field, &other.patterns);
    field
}

/// Unify `field` with every pattern whose label constraint admits its name.
pub(crate) fn apply_patterns(field: &mut Field, patterns: &[PatternConstraint]) {
    if !field.label.is_regular() {
        return;
    }
    let label = Value::String(field.label.name().to_string());
    for pattern in patterns {
        if admits(&pattern.label, &label) {
            field.value = meet(&field.value, &pattern.value);
            field.positions = merge_positions(&field.positions, &pattern.positions);
        }
    }
}

fn meet_lists(x: &ListValue, y: &ListValue) -> Value {
    let (lx, ly) = (x.elements.len(), y.elements.len());
    if (lx < ly && x.tail.is_none()) || (ly < lx && y.tail.is_none()) {
        return Value::bottom(format!("incompatible list lengths ({lx} and {ly})"));
    }

    let elements = (0..lx.max(ly))
        .map(|i| {
            let (vx, px) = element_at(x, i);
            let (vy, py) = element_at(y, i);
            Element {
                value: meet(vx, vy),
                positions: merge_positions(px, py),
            }
        })
        .collect();

    let tail = match (&x.tail, &y.tail) {
        (Some(tx), Some(ty)) => Some(Box::new(meet(tx, ty))),
        _ => None,
    };

    Value::List(ListValue { elements, tail })
}

fn element_at(list: &ListValue, i: usize) -> (&Value, &[crate::pos::Pos]) {
    match list.elements.get(i) {
        Some(e) => (&e.value, &e.positions),
        None => (list.tail.as_deref().unwrap_or(&TOP), &[]),
    }
}

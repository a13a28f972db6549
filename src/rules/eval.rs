use std::cmp::Ordering;

use serde_json::Value;

use super::context::RuleContext;
use super::parser::{Expr, Op, Operand};

pub fn evaluate(expr: &Expr, ctx: &RuleContext<'_>) -> bool {
    match expr {
        Expr::And(l, r) => evaluate(l, ctx) && evaluate(r, ctx),
        Expr::Or(l, r) => evaluate(l, ctx) || evaluate(r, ctx),
        Expr::Compare { left, op, right } => compare(&resolve(left, ctx), *op, &resolve(right, ctx)),
    }
}

fn resolve(operand: &Operand, ctx: &RuleContext<'_>) -> Value {
    match operand {
        Operand::Literal(value) => value.clone(),
        Operand::Auth(field) => ctx.auth.field(field),
        Operand::Data(field) => ctx.data.get(field).cloned().unwrap_or(Value::Null),
        Operand::Field(field) => ctx.record.get(field).cloned().unwrap_or(Value::Null),
    }
}

fn compare(left: &Value, op: Op, right: &Value) -> bool {
    // multi-value fields match when any element does
    if let Value::Array(items) = left {
        return match op {
            Op::Neq | Op::NotLike => !items.iter().any(|v| compare(v, negate(op), right)),
            _ => items.iter().any(|v| compare(v, op, right)),
        };
    }
    if let Value::Array(items) = right {
        return match op {
            Op::Neq | Op::NotLike => !items.iter().any(|v| compare(left, negate(op), v)),
            _ => items.iter().any(|v| compare(left, op, v)),
        };
    }

    match op {
        Op::Eq => loose_eq(left, right),
        Op::Neq => !loose_eq(left, right),
        Op::Like => contains(left, right),
        Op::NotLike => !contains(left, right),
        Op::Gt => order(left, right) == Some(Ordering::Greater),
        Op::Gte => matches!(order(left, right), Some(Ordering::Greater | Ordering::Equal)),
        Op::Lt => order(left, right) == Some(Ordering::Less),
        Op::Lte => matches!(order(left, right), Some(Ordering::Less | Ordering::Equal)),
    }
}

fn negate(op: Op) -> Op {
    match op {
        Op::Neq => Op::Eq,
        Op::NotLike => Op::Like,
        other => other,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Bool(a), Value::Bool(b)) => a == b,
        _ => as_text(left) == as_text(right),
    }
}

fn contains(left: &Value, right: &Value) -> bool {
    as_text(left).to_lowercase().contains(&as_text(right).to_lowercase())
}

fn order(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        _ => Some(as_text(left).cmp(&as_text(right))),
    }
}

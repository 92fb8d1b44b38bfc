// SPDX-License-Identifier: Apache-2.0

use regex::Regex;
use std::borrow::Cow;
use std::cmp::Ordering;

use crate::model::{Level, LogEvent};

/// An event field addressable from a filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Field {
    Level,
    Logger,
    Message,
    Thread,
    Ndc,
    Timestamp,
    Property(String),
}

impl Field {
    /// Resolve a field name, case-insensitively. Property lookups use the
    /// `prop.<key>` form; the key keeps its case.
    pub(crate) fn resolve(name: &str) -> Option<Field> {
        if let Some(key) = name
            .strip_prefix("prop.")
            .or_else(|| name.strip_prefix("PROP."))
        {
            if key.is_empty() {
                return None;
            }
            return Some(Field::Property(key.to_string()));
        }
        match name.to_ascii_lowercase().as_str() {
            "level" => Some(Field::Level),
            "logger" => Some(Field::Logger),
            "message" | "msg" => Some(Field::Message),
            "thread" => Some(Field::Thread),
            "ndc" => Some(Field::Ndc),
            "timestamp" => Some(Field::Timestamp),
            _ => None,
        }
    }

    fn value<'a>(&self, event: &'a LogEvent) -> Option<Cow<'a, str>> {
        match self {
            Field::Level => Some(Cow::Borrowed(event.level.as_str())),
            Field::Logger => Some(Cow::Borrowed(event.logger.as_str())),
            Field::Message => Some(Cow::Borrowed(event.message.as_str())),
            Field::Thread => event.thread.as_deref().map(Cow::Borrowed),
            Field::Ndc => event.ndc.as_deref().map(Cow::Borrowed),
            Field::Timestamp => Some(Cow::Owned(event.timestamp_millis().to_string())),
            Field::Property(key) => event.property(key).map(Cow::Borrowed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn apply(self, ord: Ordering) -> bool {
        match self {
            CmpOp::Eq => ord == Ordering::Equal,
            CmpOp::Ne => ord != Ordering::Equal,
            CmpOp::Lt => ord == Ordering::Less,
            CmpOp::Le => ord != Ordering::Greater,
            CmpOp::Gt => ord == Ordering::Greater,
            CmpOp::Ge => ord != Ordering::Less,
        }
    }
}

#[derive(Debug)]
pub(crate) enum Expr {
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Compare {
        field: Field,
        op: CmpOp,
        value: String,
    },
    Like {
        field: Field,
        pattern: Regex,
    },
    Exists(Field),
}

impl Expr {
    pub(crate) fn evaluate(&self, event: &LogEvent) -> bool {
        match self {
            Expr::And(a, b) => a.evaluate(event) && b.evaluate(event),
            Expr::Or(a, b) => a.evaluate(event) || b.evaluate(event),
            Expr::Not(inner) => !inner.evaluate(event),
            Expr::Exists(field) => field.value(event).is_some(),
            Expr::Like { field, pattern } => field
                .value(event)
                .map(|value| pattern.is_match(&value))
                .unwrap_or(false),
            Expr::Compare { field, op, value } => compare(field, *op, value, event),
        }
    }
}

fn compare(field: &Field, op: CmpOp, value: &str, event: &LogEvent) -> bool {
    match field {
        Field::Level => match level_rank(value) {
            Some(rank) => op.apply(i64::from(event.level.rank()).cmp(&rank)),
            None => false,
        },
        Field::Timestamp => match value.parse::<i64>() {
            Ok(millis) => op.apply(event.timestamp_millis().cmp(&millis)),
            Err(_) => false,
        },
        _ => match field.value(event) {
            Some(actual) => op.apply(actual.as_ref().cmp(value)),
            None => false,
        },
    }
}

/// Level operands are either level names or integer ranks.
fn level_rank(value: &str) -> Option<i64> {
    if let Some(level) = Level::parse(value) {
        return Some(i64::from(level.rank()));
    }
    value.parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_resolution() {
        assert_eq!(Field::resolve("LEVEL"), Some(Field::Level));
        assert_eq!(Field::resolve("Msg"), Some(Field::Message));
        assert_eq!(
            Field::resolve("prop.hostname"),
            Some(Field::Property("hostname".to_string()))
        );
        assert_eq!(
            Field::resolve("prop.CamelKey"),
            Some(Field::Property("CamelKey".to_string()))
        );
        assert_eq!(Field::resolve("prop."), None);
        assert_eq!(Field::resolve("unknown"), None);
    }

    #[test]
    fn test_cmp_op_apply() {
        assert!(CmpOp::Le.apply(Ordering::Equal));
        assert!(CmpOp::Le.apply(Ordering::Less));
        assert!(!CmpOp::Le.apply(Ordering::Greater));
        assert!(CmpOp::Ne.apply(Ordering::Less));
        assert!(!CmpOp::Eq.apply(Ordering::Less));
    }

    #[test]
    fn test_level_rank_forms() {
        assert_eq!(level_rank("WARN"), Some(3));
        assert_eq!(level_rank("warn"), Some(3));
        assert_eq!(level_rank("4"), Some(4));
        assert_eq!(level_rank("nonsense"), None);
    }
}

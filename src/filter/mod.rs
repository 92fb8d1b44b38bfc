// SPDX-License-Identifier: Apache-2.0

//! Boolean filter expressions over log events.
//!
//! The expression language is a small infix grammar:
//!
//! ```text
//! level >= WARN && logger like '^com\.example\.' && !(prop.hostname == 'dev')
//! ```
//!
//! Fields: `level`, `logger`, `message` (alias `msg`), `thread`, `ndc`,
//! `timestamp`, and `prop.<key>` for event properties. Comparisons use
//! `==`/`=`, `!=`, `<`, `<=`, `>`, `>=`; `like` matches a regex anywhere in
//! the field; `exists <field>` tests field presence. Boolean operators are
//! `&&`/`and`, `||`/`or`, `!`/`not` and parentheses; keywords are
//! case-insensitive. `level` compares by severity rank, `timestamp` by
//! epoch milliseconds, everything else lexicographically. A comparison on a
//! field the event does not carry is false.

mod ast;
mod lexer;
mod parser;

use thiserror::Error;

use crate::model::LogEvent;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected token: {0}")]
    UnexpectedToken(String),

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("invalid like pattern: {0}")]
    InvalidPattern(String),
}

/// A compiled filter expression.
pub struct FilterRule {
    expr: ast::Expr,
}

impl FilterRule {
    /// Compile a filter expression.
    pub fn parse(input: &str) -> Result<FilterRule, FilterError> {
        let tokens = lexer::tokenize(input)?;
        let expr = parser::parse(&tokens)?;
        Ok(FilterRule { expr })
    }

    /// Evaluate the expression against an event.
    pub fn matches(&self, event: &LogEvent) -> bool {
        self.expr.evaluate(event)
    }
}

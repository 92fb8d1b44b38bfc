// SPDX-License-Identifier: Apache-2.0

use regex::Regex;

use super::ast::{CmpOp, Expr, Field};
use super::lexer::Token;
use super::FilterError;

/// Recursive-descent parser over the token stream.
///
/// ```text
/// expr    := and_expr ( OR and_expr )*
/// and_expr:= unary ( AND unary )*
/// unary   := NOT unary | primary
/// primary := '(' expr ')' | EXISTS field | field cmp_op value | field LIKE pattern
/// ```
pub(crate) fn parse(tokens: &[Token]) -> Result<Expr, FilterError> {
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.or_expr()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(FilterError::UnexpectedToken(format!("{:?}", token))),
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn or_expr(&mut self) -> Result<Expr, FilterError> {
        let mut left = self.and_expr()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.next();
            let right = self.and_expr()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr, FilterError> {
        let mut left = self.unary()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.next();
            let right = self.unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, FilterError> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.next();
            let inner = self.unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, FilterError> {
        match self.next() {
            Some(Token::LParen) => {
                let expr = self.or_expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(expr),
                    Some(token) => Err(FilterError::UnexpectedToken(format!("{:?}", token))),
                    None => Err(FilterError::UnexpectedEnd),
                }
            }
            Some(Token::Ident(word)) if word.eq_ignore_ascii_case("exists") => {
                let field = self.field()?;
                Ok(Expr::Exists(field))
            }
            Some(Token::Ident(name)) => {
                let field =
                    Field::resolve(name).ok_or_else(|| FilterError::UnknownField(name.clone()))?;
                self.comparison(field)
            }
            Some(token) => Err(FilterError::UnexpectedToken(format!("{:?}", token))),
            None => Err(FilterError::UnexpectedEnd),
        }
    }

    fn comparison(&mut self, field: Field) -> Result<Expr, FilterError> {
        match self.next() {
            Some(Token::Ident(word)) if word.eq_ignore_ascii_case("like") => {
                let pattern = self.value()?;
                let pattern = Regex::new(&pattern)
                    .map_err(|e| FilterError::InvalidPattern(e.to_string()))?;
                Ok(Expr::Like { field, pattern })
            }
            Some(token) => {
                let op = match token {
                    Token::Eq => CmpOp::Eq,
                    Token::Ne => CmpOp::Ne,
                    Token::Lt => CmpOp::Lt,
                    Token::Le => CmpOp::Le,
                    Token::Gt => CmpOp::Gt,
                    Token::Ge => CmpOp::Ge,
                    other => {
                        return Err(FilterError::UnexpectedToken(format!("{:?}", other)));
                    }
                };
                let value = self.value()?;
                Ok(Expr::Compare { field, op, value })
            }
            None => Err(FilterError::UnexpectedEnd),
        }
    }

    fn field(&mut self) -> Result<Field, FilterError> {
        match self.next() {
            Some(Token::Ident(name)) => {
                Field::resolve(name).ok_or_else(|| FilterError::UnknownField(name.clone()))
            }
            Some(token) => Err(FilterError::UnexpectedToken(format!("{:?}", token))),
            None => Err(FilterError::UnexpectedEnd),
        }
    }

    fn value(&mut self) -> Result<String, FilterError> {
        match self.next() {
            Some(Token::Ident(word)) => Ok(word.clone()),
            Some(Token::Str(value)) => Ok(value.clone()),
            Some(token) => Err(FilterError::UnexpectedToken(format!("{:?}", token))),
            None => Err(FilterError::UnexpectedEnd),
        }
    }
}

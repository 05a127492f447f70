//! Rule DSL parser.
//!
//! Recursive descent parser for the rule grammar. Converts text to an
//! [`Expr`] tree with error messages carrying the character offset.
//!
//! ```text
//! or         := and (("|" | "or") and)*
//! and        := not (("&" | "and") not)*
//! not        := "not" not | comparison
//! comparison := additive (cmp additive)?        cmp: > < == >= <= !=
//! additive   := term (("+" | "-") term)*
//! term       := unary (("*" | "/") unary)*
//! unary      := "-" unary | primary
//! primary    := number | string | "true" | "false"
//!             | NAME "(" [or ("," or)*] ")" | NAME | "(" or ")"
//! ```
//!
//! The symbolic and keyword spellings of the boolean operators share one
//! precedence level below comparison, so `a > 1 & b < 2` groups as
//! `(a > 1) & (b < 2)`.

use crate::domain::error::ParseError;
use crate::domain::rule::{ArithOp, CompareOp, Expr, Literal, LogicalOp};

/// Deepest tree the parser builds. Brackets, call arguments and prefix
/// operators count one level each, and so does every link of a `+ -` or `* /`
/// chain, so the tree is rejected while it is being built.
///
/// Evaluation depth is bounded separately by the configured recursion limit.
pub const MAX_NESTING: usize = 1024;

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            position: self.pos,
        }
    }

    fn expect_char(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(ch) => Err(self.error(format!("expected '{}', found '{}'", expected, ch))),
            None => Err(self.error(format!("expected '{}', found end of input", expected))),
        }
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        let remaining = self.remaining();
        remaining.starts_with(keyword)
            && !remaining[keyword.len()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric() || c == '_')
    }

    fn consume_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    fn consume_exact(&mut self, s: &str) -> bool {
        if self.remaining().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn peek_word(&self) -> &'a str {
        let remaining = self.remaining();
        let end = remaining
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
            .map(|(i, _)| i)
            .unwrap_or(remaining.len());
        &remaining[..end]
    }

    fn descend(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.error(format!(
                "expression nested deeper than {} levels",
                MAX_NESTING
            )));
        }
        Ok(())
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let mut has_dot = false;
        let mut digits = 0;

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.advance();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        if digits == 0 {
            return Err(ParseError {
                message: "expected number".to_string(),
                position: start,
            });
        }

        let num_str = &self.input[start..self.pos];
        num_str.parse::<f64>().map_err(|_| ParseError {
            message: format!("invalid number: {}", num_str),
            position: start,
        })
    }

    fn parse_string(&mut self, quote: char) -> Result<String, ParseError> {
        let start = self.pos;
        self.advance();
        let body_start = self.pos;
        while let Some(ch) = self.advance() {
            if ch == quote {
                return Ok(self.input[body_start..self.pos - 1].to_string());
            }
        }
        Err(ParseError {
            message: "unterminated string literal".to_string(),
            position: start,
        })
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        self.descend()?;
        let first = self.parse_and()?;
        let mut operands = vec![first];
        loop {
            self.skip_whitespace();
            if self.consume_exact("|") || self.consume_keyword("or") || self.consume_keyword("OR")
            {
                operands.push(self.parse_and()?);
            } else {
                break;
            }
        }
        self.depth -= 1;
        Ok(fold_logical(LogicalOp::Or, operands))
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_not()?;
        let mut operands = vec![first];
        loop {
            self.skip_whitespace();
            if self.consume_exact("&")
                || self.consume_keyword("and")
                || self.consume_keyword("AND")
            {
                operands.push(self.parse_not()?);
            } else {
                break;
            }
        }
        Ok(fold_logical(LogicalOp::And, operands))
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        self.skip_whitespace();
        if self.consume_keyword("not") || self.consume_keyword("NOT") {
            self.descend()?;
            let operand = self.parse_not()?;
            self.depth -= 1;
            return Ok(Expr::Logical {
                op: LogicalOp::Not,
                operands: vec![operand],
            });
        }
        self.parse_comparison()
    }

    fn peek_compare_op(&mut self) -> Result<Option<CompareOp>, ParseError> {
        self.skip_whitespace();
        let op = if self.consume_exact(">=") {
            CompareOp::Ge
        } else if self.consume_exact("<=") {
            CompareOp::Le
        } else if self.consume_exact("==") {
            CompareOp::Eq
        } else if self.consume_exact("!=") {
            CompareOp::Ne
        } else if self.consume_exact(">") {
            CompareOp::Gt
        } else if self.consume_exact("<") {
            CompareOp::Lt
        } else if self.peek() == Some('=') {
            return Err(self.error("expected '==', found '='"));
        } else {
            return Ok(None);
        };
        Ok(Some(op))
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_additive()?;
        let Some(op) = self.peek_compare_op()? else {
            return Ok(lhs);
        };
        let rhs = self.parse_additive()?;

        let before_next = self.pos;
        if self.peek_compare_op()?.is_some() {
            return Err(ParseError {
                message: "chained comparisons are not supported; combine with '&'".to_string(),
                position: before_next,
            });
        }
        self.pos = before_next;

        Ok(Expr::Comparison {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_term()?;
        let mut links = 0;
        loop {
            self.skip_whitespace();
            let op = match self.peek() {
                Some('+') => ArithOp::Add,
                Some('-') => ArithOp::Sub,
                _ => break,
            };
            self.advance();
            self.descend()?;
            links += 1;
            let rhs = self.parse_term()?;
            lhs = Expr::Arithmetic {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        self.depth -= links;
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        let mut links = 0;
        loop {
            self.skip_whitespace();
            let op = match self.peek() {
                Some('*') => ArithOp::Mul,
                Some('/') => ArithOp::Div,
                _ => break,
            };
            self.advance();
            self.descend()?;
            links += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Arithmetic {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        self.depth -= links;
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        self.skip_whitespace();
        if self.peek() != Some('-') {
            return self.parse_primary();
        }
        self.advance();
        self.skip_whitespace();
        if self.peek().is_some_and(|c| c.is_ascii_digit() || c == '.') {
            let value = self.parse_number()?;
            return Ok(Expr::number(-value));
        }
        self.descend()?;
        let operand = self.parse_unary()?;
        self.depth -= 1;
        Ok(Expr::Arithmetic {
            op: ArithOp::Sub,
            lhs: Box::new(Expr::number(0.0)),
            rhs: Box::new(operand),
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('(') => {
                self.advance();
                let inner = self.parse_or()?;
                self.expect_char(')')?;
                Ok(inner)
            }
            Some(ch) if ch.is_ascii_digit() || ch == '.' => Ok(Expr::number(self.parse_number()?)),
            Some(quote @ ('\'' | '"')) => {
                Ok(Expr::Constant(Literal::Str(self.parse_string(quote)?)))
            }
            Some(ch) if ch.is_alphabetic() || ch == '_' => self.parse_name(),
            Some(ch) => Err(self.error(format!("unexpected character '{}'", ch))),
        }
    }

    fn parse_name(&mut self) -> Result<Expr, ParseError> {
        let word = self.peek_word();
        match word {
            "and" | "or" | "AND" | "OR" => {
                return Err(self.error(format!("expected operand, found '{}'", word)));
            }
            "true" | "True" => {
                self.pos += word.len();
                return Ok(Expr::Constant(Literal::Bool(true)));
            }
            "false" | "False" => {
                self.pos += word.len();
                return Ok(Expr::Constant(Literal::Bool(false)));
            }
            _ => {}
        }
        self.pos += word.len();

        self.skip_whitespace();
        if self.peek() != Some('(') {
            return Ok(Expr::variable(word));
        }
        self.advance();

        let mut args = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(')') {
            self.advance();
            return Ok(Expr::call(word, args));
        }
        loop {
            args.push(self.parse_or()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.advance();
                }
                Some(')') => {
                    self.advance();
                    break;
                }
                Some(ch) => {
                    return Err(self.error(format!("expected ',' or ')', found '{}'", ch)));
                }
                None => return Err(self.error("expected ')', found end of input")),
            }
        }
        Ok(Expr::call(word, args))
    }

    fn parse(&mut self) -> Result<Expr, ParseError> {
        self.skip_whitespace();
        if self.pos == self.input.len() {
            return Err(self.error("empty rule"));
        }
        let expr = self.parse_or()?;
        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(self.error(format!(
                "unexpected input after expression: '{}'",
                self.remaining()
            )));
        }
        Ok(expr)
    }
}

fn fold_logical(op: LogicalOp, mut operands: Vec<Expr>) -> Expr {
    if operands.len() == 1 {
        operands.remove(0)
    } else {
        Expr::Logical { op, operands }
    }
}

pub fn parse(input: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(input);
    parser.parse()
}

/// Syntax-only check of a rule string. Never touches data, never fails.
///
/// Returns `(true, "syntax ok")` or `(false, <reason>)`.
pub fn validate_syntax(rule: &str) -> (bool, String) {
    if rule.trim().is_empty() {
        return (false, "empty rule".to_string());
    }
    match parse(rule) {
        Ok(_) => (true, "syntax ok".to_string()),
        Err(e) => (false, format!("syntax error: {}", e)),
    }
}

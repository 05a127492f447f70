//! Rule expression AST.
//!
//! - `Expr`: one node of a parsed rule
//! - `Literal`: constant payloads (numbers, booleans, quoted strings)
//! - `ArithOp`, `CompareOp`, `LogicalOp`: operator kinds
//!
//! `Display` renders a normalised form of the expression. Two rules that
//! differ only in whitespace or redundant parentheses render identically,
//! which is what the evaluator caches key on.

use std::fmt;

/// Name of the built-in lookback function.
pub const REF: &str = "REF";

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Bool(bool),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Gt,
    Lt,
    Eq,
    Ge,
    Le,
    Ne,
}

/// `&`/`and`, `|`/`or` and `not` all map here; there is no bitwise variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(Literal),
    Variable(String),
    Arithmetic {
        op: ArithOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Comparison {
        op: CompareOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `Not` always carries exactly one operand; `And`/`Or` at least two.
    Logical {
        op: LogicalOp,
        operands: Vec<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn number(value: f64) -> Self {
        Expr::Constant(Literal::Number(value))
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expr::Variable(name.into())
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.into(),
            args,
        }
    }

    pub fn is_ref_call(&self) -> bool {
        matches!(self, Expr::Call { name, .. } if name.eq_ignore_ascii_case(REF))
    }

    fn is_compound(&self) -> bool {
        matches!(
            self,
            Expr::Arithmetic { .. } | Expr::Comparison { .. } | Expr::Logical { .. }
        )
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        };
        f.write_str(s)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Eq => "==",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::Ne => "!=",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(v) => write!(f, "{}", v),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Str(s) => write!(f, "'{}'", s),
        }
    }
}

struct Operand<'a>(&'a Expr);

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_compound() {
            write!(f, "({})", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(lit) => write!(f, "{}", lit),
            Expr::Variable(name) => f.write_str(name),
            Expr::Arithmetic { op, lhs, rhs } => {
                write!(f, "{} {} {}", Operand(lhs), op, Operand(rhs))
            }
            Expr::Comparison { op, lhs, rhs } => {
                write!(f, "{} {} {}", Operand(lhs), op, Operand(rhs))
            }
            Expr::Logical {
                op: LogicalOp::Not,
                operands,
            } => {
                f.write_str("not")?;
                for operand in operands {
                    write!(f, " {}", Operand(operand))?;
                }
                Ok(())
            }
            Expr::Logical { op, operands } => {
                let sep = if *op == LogicalOp::And { " & " } else { " | " };
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    write!(f, "{}", Operand(operand))?;
                }
                Ok(())
            }
            Expr::Call { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sma(col: &str, n: f64) -> Expr {
        Expr::call("SMA", vec![Expr::variable(col), Expr::number(n)])
    }

    #[test]
    fn display_call() {
        assert_eq!(sma("close", 5.0).to_string(), "SMA(close,5)");
    }

    #[test]
    fn display_parenthesises_compound_operands() {
        let e = Expr::Logical {
            op: LogicalOp::And,
            operands: vec![
                Expr::Comparison {
                    op: CompareOp::Gt,
                    lhs: Box::new(sma("close", 5.0)),
                    rhs: Box::new(sma("close", 20.0)),
                },
                Expr::Comparison {
                    op: CompareOp::Lt,
                    lhs: Box::new(Expr::call(
                        "RSI",
                        vec![Expr::variable("close"), Expr::number(14.0)],
                    )),
                    rhs: Box::new(Expr::number(30.0)),
                },
            ],
        };
        assert_eq!(
            e.to_string(),
            "(SMA(close,5) > SMA(close,20)) & (RSI(close,14) < 30)"
        );
    }

    #[test]
    fn display_not_and_literals() {
        let e = Expr::Logical {
            op: LogicalOp::Not,
            operands: vec![Expr::Constant(Literal::Bool(true))],
        };
        assert_eq!(e.to_string(), "not true");
        assert_eq!(
            Expr::Constant(Literal::Str("close".into())).to_string(),
            "'close'"
        );
        assert_eq!(Expr::number(0.5).to_string(), "0.5");
    }

    #[test]
    fn ref_detection_is_case_insensitive() {
        assert!(Expr::call("REF", vec![]).is_ref_call());
        assert!(Expr::call("ref", vec![]).is_ref_call());
        assert!(!sma("close", 5.0).is_ref_call());
        assert!(!Expr::variable("REF").is_ref_call());
    }
}

//! Restricted arithmetic evaluator for legacy formula shapes.
//!
//! Grammar (numbers, named variables, `+ - * /`, parentheses, unary sign):
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := ('+' | '-') unary | atom
//! atom   := NUMBER | IDENT | '(' expr ')'
//! ```
//!
//! Nothing else is accepted. Identifiers resolve through a caller-supplied
//! lookup and are the only way a formula can observe the outside world.

use crate::errors::{CalcError, CalcResult};

/// Longest formula text accepted
pub const MAX_FORMULA_LEN: usize = 512;

/// Deepest parenthesis / unary nesting accepted
pub const MAX_DEPTH: usize = 32;

/// Parsed expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Var(String),
    Neg(Box<Expr>),
    Binary(Box<Expr>, BinOp, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(char),
    LParen,
    RParen,
}

fn tokenize(src: &str) -> CalcResult<Vec<(usize, Token)>> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '+' | '-' | '*' | '/' => {
                tokens.push((i, Token::Op(c)));
                i += 1;
            }
            '(' => {
                tokens.push((i, Token::LParen));
                i += 1;
            }
            ')' => {
                tokens.push((i, Token::RParen));
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| CalcError::formula(src, start, format!("invalid number '{}'", text)))?;
                tokens.push((start, Token::Number(value)));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push((start, Token::Ident(chars[start..i].iter().collect())));
            }
            other => {
                return Err(CalcError::formula(src, i, format!("unexpected character '{}'", other)));
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<(usize, Token)>,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(p, _)| *p)
            .unwrap_or_else(|| self.src.chars().count())
    }

    fn error(&self, reason: impl Into<String>) -> CalcError {
        CalcError::formula(self.src, self.offset(), reason)
    }

    fn enter(&mut self) -> CalcResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error("expression nested too deeply"));
        }
        Ok(())
    }

    fn expr(&mut self) -> CalcResult<Expr> {
        let mut lhs = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            let op = if *op == '+' { BinOp::Add } else { BinOp::Sub };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> CalcResult<Expr> {
        let mut lhs = self.unary()?;
        while let Some(Token::Op(op @ ('*' | '/'))) = self.peek() {
            let op = if *op == '*' { BinOp::Mul } else { BinOp::Div };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> CalcResult<Expr> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.pos += 1;
                self.enter()?;
                let inner = self.unary()?;
                self.depth -= 1;
                Ok(Expr::Neg(Box::new(inner)))
            }
            Some(Token::Op('+')) => {
                self.pos += 1;
                self.enter()?;
                let inner = self.unary()?;
                self.depth -= 1;
                Ok(inner)
            }
            _ => self.atom(),
        }
    }

    fn atom(&mut self) -> CalcResult<Expr> {
        match self.peek().cloned() {
            Some(Token::Number(n)) => {
                self.pos += 1;
                Ok(Expr::Number(n))
            }
            Some(Token::Ident(name)) => {
                self.pos += 1;
                Ok(Expr::Var(name))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                self.enter()?;
                let inner = self.expr()?;
                if self.peek() != Some(&Token::RParen) {
                    return Err(self.error("expected ')'"));
                }
                self.pos += 1;
                self.depth -= 1;
                Ok(inner)
            }
            Some(_) => Err(self.error("expected a number, variable or '('")),
            None => Err(self.error("unexpected end of formula")),
        }
    }
}

/// Parse formula text into an expression tree.
pub fn parse(src: &str) -> CalcResult<Expr> {
    if src.len() > MAX_FORMULA_LEN {
        return Err(CalcError::formula(
            truncate(src),
            MAX_FORMULA_LEN,
            format!("formula longer than {} characters", MAX_FORMULA_LEN),
        ));
    }
    let tokens = tokenize(src)?;
    if tokens.is_empty() {
        return Err(CalcError::formula(src, 0, "formula is empty"));
    }

    let mut parser = Parser {
        src,
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(expr)
}

fn truncate(src: &str) -> String {
    src.chars().take(32).collect::<String>() + "…"
}

impl Expr {
    /// Evaluate against a variable lookup. Unknown names are an error.
    pub fn eval<F>(&self, lookup: &F) -> Result<f64, String>
    where
        F: Fn(&str) -> Option<f64>,
    {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::Var(name) => lookup(name).ok_or_else(|| format!("unknown variable '{}'", name)),
            Expr::Neg(inner) => Ok(-inner.eval(lookup)?),
            Expr::Binary(lhs, op, rhs) => {
                let a = lhs.eval(lookup)?;
                let b = rhs.eval(lookup)?;
                Ok(match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => a / b,
                })
            }
        }
    }
}

/// Parse and evaluate in one step. A non-finite result (e.g. division by
/// zero) is reported as an error.
pub fn evaluate<F>(src: &str, lookup: F) -> CalcResult<f64>
where
    F: Fn(&str) -> Option<f64>,
{
    let expr = parse(src)?;
    let value = expr
        .eval(&lookup)
        .map_err(|reason| CalcError::formula(src, 0, reason))?;
    if !value.is_finite() {
        return Err(CalcError::formula(src, 0, "result is not a finite number"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(name: &str) -> Option<f64> {
        match name {
            "A" => Some(1000.0),
            "B" => Some(500.0),
            "d" => Some(10.0),
            _ => None,
        }
    }

    #[test]
    fn test_precedence() {
        assert_eq!(evaluate("2 + 3 * 4", vars).unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4", vars).unwrap(), 20.0);
        assert_eq!(evaluate("10 - 4 - 3", vars).unwrap(), 3.0);
        assert_eq!(evaluate("24 / 4 / 2", vars).unwrap(), 3.0);
    }

    #[test]
    fn test_variables() {
        assert_eq!(evaluate("2*(A+B) + 14*d", vars).unwrap(), 3140.0);
    }

    #[test]
    fn test_unary_sign() {
        assert_eq!(evaluate("-A + 2*A", vars).unwrap(), 1000.0);
        assert_eq!(evaluate("+3 - -2", vars).unwrap(), 5.0);
    }

    #[test]
    fn test_decimal_numbers() {
        assert!((evaluate("0.5 * A + .25", vars).unwrap() - 500.25).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_variable() {
        let err = evaluate("A + C", vars).unwrap_err();
        assert!(matches!(err, CalcError::FormulaError { ref reason, .. } if reason.contains("'C'")));
    }

    #[test]
    fn test_rejects_code() {
        assert!(evaluate("alert(1)", vars).is_err());
        assert!(evaluate("A; process.exit()", vars).is_err());
        assert!(evaluate("A ** 2", vars).is_err());
        assert!(evaluate("`A`", vars).is_err());
    }

    #[test]
    fn test_malformed() {
        assert!(parse("").is_err());
        assert!(parse("A +").is_err());
        assert!(parse("(A + B").is_err());
        assert!(parse("A B").is_err());
        assert!(parse("1.2.3").is_err());
    }

    #[test]
    fn test_error_position() {
        match parse("A + $").unwrap_err() {
            CalcError::FormulaError { position, .. } => assert_eq!(position, 4),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_division_by_zero() {
        assert!(evaluate("A / (d - 10)", vars).is_err());
    }

    #[test]
    fn test_depth_limit() {
        let deep = format!("{}1{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert!(parse(&deep).is_err());
        let ok = format!("{}1{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert_eq!(evaluate(&ok, vars).unwrap(), 1.0);
    }

    #[test]
    fn test_length_limit() {
        let long = "1+".repeat(MAX_FORMULA_LEN) + "1";
        assert!(parse(&long).is_err());
    }
}

//! A small arithmetic language in one variable, `x`.
//!
//! ```text
//! expr    := term (("+" | "-") term)*
//! term    := unary (("*" | "/") unary)*
//! unary   := "-" unary | power
//! power   := primary ("^" unary)?          right-associative
//! primary := number | "x" | "pi" | "e" | func "(" expr ")" | "(" expr ")"
//! func    := sin cos tan asin acos atan sqrt abs ln log exp floor ceil
//! ```
//!
//! There is no other name lookup, so parsing a function string can never
//! reach anything but these operations. Input length and nesting depth are
//! bounded so parsing and evaluation stay within a small, fixed stack.

use std::fmt;

use thiserror::Error;

/// Longest accepted function string, in characters.
pub const MAX_LEN: usize = 4096;
/// Deepest accepted nesting of parentheses, calls, signs and exponents.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at column {column}")]
pub struct ExprError {
    /// 1-based character column.
    pub column: usize,
    pub message: String,
}

// ── AST ───────────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sqrt,
    Abs,
    Ln,
    Log,
    Exp,
    Floor,
    Ceil,
}

impl Func {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sin"   => Self::Sin,
            "cos"   => Self::Cos,
            "tan"   => Self::Tan,
            "asin"  => Self::Asin,
            "acos"  => Self::Acos,
            "atan"  => Self::Atan,
            "sqrt"  => Self::Sqrt,
            "abs"   => Self::Abs,
            "ln"    => Self::Ln,
            "log"   => Self::Log,
            "exp"   => Self::Exp,
            "floor" => Self::Floor,
            "ceil"  => Self::Ceil,
            _ => return None,
        })
    }

    fn apply(self, v: f64) -> f64 {
        match self {
            Self::Sin => v.sin(),
            Self::Cos => v.cos(),
            Self::Tan => v.tan(),
            Self::Asin => v.asin(),
            Self::Acos => v.acos(),
            Self::Atan => v.atan(),
            Self::Sqrt => v.sqrt(),
            Self::Abs => v.abs(),
            Self::Ln => v.ln(),
            Self::Log => v.log10(),
            Self::Exp => v.exp(),
            Self::Floor => v.floor(),
            Self::Ceil => v.ceil(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    X,
    Neg(Box<Expr>),
    Call(Func, Box<Expr>),
    Bin(BinOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Parses a whole function string.
    pub fn parse(src: &str) -> Result<Self, ExprError> {
        let chars: Vec<char> = src.chars().collect();
        if chars.len() > MAX_LEN {
            return Err(ExprError {
                column: MAX_LEN + 1,
                message: format!("expression longer than {MAX_LEN} characters"),
            });
        }
        let mut p = ExprParser { chars, pos: 0, depth: 0 };
        let expr = p.expr()?;
        p.skip_ws();
        if p.pos < p.chars.len() {
            return Err(p.error(format!("unexpected `{}`", p.chars[p.pos])));
        }
        Ok(expr)
    }

    /// Value at `x`. Domain errors produce NaN or infinities, never panics.
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            Expr::Num(v) => *v,
            Expr::X => x,
            Expr::Neg(e) => -e.eval(x),
            Expr::Call(f, arg) => f.apply(arg.eval(x)),
            Expr::Bin(op, a, b) => {
                let (a, b) = (a.eval(x), b.eval(x));
                match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => a / b,
                    BinOp::Pow => a.powf(b),
                }
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Num(v) => write!(f, "{v}"),
            Expr::X => f.write_str("x"),
            Expr::Neg(e) => write!(f, "(-{e})"),
            Expr::Call(func, arg) => write!(f, "{}({arg})", format!("{func:?}").to_lowercase()),
            Expr::Bin(op, a, b) => {
                let sym = match op {
                    BinOp::Add => "+",
                    BinOp::Sub => "-",
                    BinOp::Mul => "*",
                    BinOp::Div => "/",
                    BinOp::Pow => "^",
                };
                write!(f, "({a} {sym} {b})")
            }
        }
    }
}

// ── Parser ────────────────────────────────────────────────────────────────

struct ExprParser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl ExprParser {
    fn error(&self, message: impl Into<String>) -> ExprError {
        ExprError { column: self.pos + 1, message: message.into() }
    }

    fn skip_ws(&mut self) {
        while self.chars.get(self.pos).is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some('+') => BinOp::Add,
                Some('-') => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn term(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some('*') => BinOp::Mul,
                Some('/') => BinOp::Div,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(rhs));
        }
    }

    /// Every nested construct recurses through here, so this is where depth
    /// is counted.
    fn unary(&mut self) -> Result<Expr, ExprError> {
        if self.depth == MAX_DEPTH {
            return Err(self.error(format!("expression nested deeper than {MAX_DEPTH} levels")));
        }
        self.depth += 1;
        let parsed = if self.eat('-') { self.unary().map(|e| Expr::Neg(Box::new(e))) } else { self.power() };
        self.depth -= 1;
        parsed
    }

    fn power(&mut self) -> Result<Expr, ExprError> {
        let base = self.primary()?;
        if self.eat('^') {
            let exponent = self.unary()?;
            return Ok(Expr::Bin(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        match self.peek() {
            None => Err(self.error("unexpected end of expression")),
            Some('(') => {
                self.pos += 1;
                let inner = self.expr()?;
                if !self.eat(')') {
                    return Err(self.error("expected `)`"));
                }
                Ok(inner)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) if c.is_ascii_alphabetic() => self.ident(),
            Some(c) => Err(self.error(format!("unexpected `{c}`"))),
        }
    }

    fn number(&mut self) -> Result<Expr, ExprError> {
        let start = self.pos;
        while self.chars.get(self.pos).is_some_and(|c| c.is_ascii_digit() || *c == '.') {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<f64>()
            .map(Expr::Num)
            .map_err(|_| ExprError { column: start + 1, message: format!("invalid number `{text}`") })
    }

    fn ident(&mut self) -> Result<Expr, ExprError> {
        let start = self.pos;
        while self.chars.get(self.pos).is_some_and(|c| c.is_ascii_alphanumeric()) {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        match name.as_str() {
            "x" => Ok(Expr::X),
            "pi" => Ok(Expr::Num(std::f64::consts::PI)),
            "e" => Ok(Expr::Num(std::f64::consts::E)),
            _ => {
                let Some(func) = Func::from_name(&name) else {
                    return Err(ExprError { column: start + 1, message: format!("unknown identifier `{name}`") });
                };
                if !self.eat('(') {
                    return Err(self.error(format!("expected `(` after `{name}`")));
                }
                let arg = self.expr()?;
                if !self.eat(')') {
                    return Err(self.error("expected `)`"));
                }
                Ok(Expr::Call(func, Box::new(arg)))
            }
        }
    }
}

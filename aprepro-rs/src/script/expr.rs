//! Expression lexer, AST, and parser.
//!
//! The text between `{` and `}` is parsed into an [`Expr`] tree which
//! [`eval`](super::eval) then evaluates against an engine.
//!
//! Operator precedence (lowest → highest):
//!   assign  →  ternary  →  or  →  and  →  relational  →  concat  →
//!   additive  →  multiplicative  →  unary  →  power  →  postfix  →  primary
//!
//! | Form | Meaning |
//! |------|---------|
//! | `a = b`, `a += b`, `a ^= b` … | assignment (right associative) |
//! | `c ? x : y` | conditional |
//! | `a // b` | string concatenation |
//! | `a ^ b`, `a ** b` | power (right associative, binds tighter than unary minus) |
//! | `++a`, `a--` | increment / decrement |
//! | `m[i,j]` | array element |

use super::value::Value;
use crate::error::EvalError;

// ── Token ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(f64),
    Str(String),
    Ident(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Power, // ^ or **
    Concat, // //
    Bang,
    Inc, // ++
    Dec, // --

    // Comparison
    Eq, // ==
    Ne, // !=
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    And, // &&
    Or,  // ||

    // Assignment
    Assign,      // =
    PlusAssign,  // +=
    MinusAssign, // -=
    StarAssign,  // *=
    SlashAssign, // /=
    PowerAssign, // ^= or **=

    // Misc
    Question,
    Colon,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    /// Unrecognised input byte, reported by the parser.
    Unknown(char),
    Eof,
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Lexer { src, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn eat(&mut self, ch: u8) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.pos += 1;
        }
    }

    fn skip_digits(&mut self) {
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
    }

    fn read_number(&mut self, start: usize) -> Token {
        self.skip_digits();
        if self.peek() == Some(b'.') {
            self.pos += 1;
            self.skip_digits();
        }
        // Only take the exponent when digits follow, so `2e` stays `2` `e`.
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let mark = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if matches!(self.peek(), Some(b'0'..=b'9')) {
                self.skip_digits();
            } else {
                self.pos = mark;
            }
        }
        Token::Number(self.src[start..self.pos].parse().unwrap_or(0.0))
    }

    fn read_string(&mut self, quote: u8) -> Token {
        let mut s = String::new();
        let mut chars = self.src[self.pos..].char_indices();
        let mut end = self.src.len() - self.pos;
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, 'n')) => s.push('\n'),
                    Some((_, 't')) => s.push('\t'),
                    Some((_, c)) => s.push(c),
                    None => break,
                },
                c if c as u32 == quote as u32 => {
                    end = i + 1;
                    break;
                }
                c => s.push(c),
            }
        }
        self.pos += end;
        Token::Str(s)
    }

    fn read_ident(&mut self, start: usize) -> Token {
        while matches!(
            self.peek(),
            Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_')
        ) {
            self.pos += 1;
        }
        Token::Ident(self.src[start..self.pos].to_owned())
    }

    fn next_token(&mut self) -> Token {
        self.skip_ws();
        let start = self.pos;
        let ch = match self.advance() {
            None => return Token::Eof,
            Some(c) => c,
        };

        match ch {
            b'0'..=b'9' => self.read_number(start),
            b'.' if matches!(self.peek(), Some(b'0'..=b'9')) => self.read_number(start),
            b'"' => self.read_string(b'"'),
            b'\'' => self.read_string(b'\''),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.read_ident(start),
            b'+' => {
                if self.eat(b'+') {
                    Token::Inc
                } else if self.eat(b'=') {
                    Token::PlusAssign
                } else {
                    Token::Plus
                }
            }
            b'-' => {
                if self.eat(b'-') {
                    Token::Dec
                } else if self.eat(b'=') {
                    Token::MinusAssign
                } else {
                    Token::Minus
                }
            }
            b'*' => {
                if self.peek() == Some(b'*') {
                    self.pos += 1;
                    if self.eat(b'=') {
                        Token::PowerAssign
                    } else {
                        Token::Power
                    }
                } else if self.eat(b'=') {
                    Token::StarAssign
                } else {
                    Token::Star
                }
            }
            b'/' => {
                if self.eat(b'/') {
                    Token::Concat
                } else if self.eat(b'=') {
                    Token::SlashAssign
                } else {
                    Token::Slash
                }
            }
            b'%' => Token::Percent,
            b'^' => {
                if self.eat(b'=') {
                    Token::PowerAssign
                } else {
                    Token::Power
                }
            }
            b'!' => {
                if self.eat(b'=') {
                    Token::Ne
                } else {
                    Token::Bang
                }
            }
            b'&' if self.eat(b'&') => Token::And,
            b'|' if self.eat(b'|') => Token::Or,
            b'<' => {
                if self.eat(b'=') {
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            b'>' => {
                if self.eat(b'=') {
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            b'=' => {
                if self.eat(b'=') {
                    Token::Eq
                } else {
                    Token::Assign
                }
            }
            b'?' => Token::Question,
            b':' => Token::Colon,
            b',' => Token::Comma,
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b'[' => Token::LBracket,
            b']' => Token::RBracket,
            _ => {
                // Step back and take the whole (possibly multi-byte) char.
                let c = self.src[start..].chars().next().unwrap_or('?');
                self.pos = start + c.len_utf8();
                Token::Unknown(c)
            }
        }
    }

    fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let t = self.next_token();
            let done = matches!(t, Token::Eof);
            tokens.push(t);
            if done {
                break;
            }
        }
        tokens
    }
}

// ── AST ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Pow => "^",
            BinOp::Concat => "//",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl AssignOp {
    /// The binary operator a compound assignment applies.
    pub fn binop(self) -> Option<BinOp> {
        match self {
            AssignOp::Set => None,
            AssignOp::Add => Some(BinOp::Add),
            AssignOp::Sub => Some(BinOp::Sub),
            AssignOp::Mul => Some(BinOp::Mul),
            AssignOp::Div => Some(BinOp::Div),
            AssignOp::Pow => Some(BinOp::Pow),
        }
    }
}

/// Left-hand side of an assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Var(String),
    Element {
        name: String,
        row: Box<Expr>,
        col: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Var(String),
    Index {
        array: Box<Expr>,
        row: Box<Expr>,
        col: Box<Expr>,
    },
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
    Assign(Target, AssignOp, Box<Expr>),
    /// `++x` / `x--`: `delta` is +1 or -1.
    Step {
        name: String,
        delta: f64,
        prefix: bool,
    },
    Call(String, Vec<Expr>),
}

// ── Parser ────────────────────────────────────────────────────────────────────

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens.get(self.pos).cloned().unwrap_or(Token::Eof);
        self.pos += 1;
        t
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<(), EvalError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(malformed(format!("expected {what}, found {}", describe(self.peek()))))
        }
    }

    // ── Grammar ───────────────────────────────────────────────────────────────

    fn parse_assign(&mut self) -> Result<Expr, EvalError> {
        let lhs = self.parse_ternary()?;
        let op = match self.peek() {
            Token::Assign => AssignOp::Set,
            Token::PlusAssign => AssignOp::Add,
            Token::MinusAssign => AssignOp::Sub,
            Token::StarAssign => AssignOp::Mul,
            Token::SlashAssign => AssignOp::Div,
            Token::PowerAssign => AssignOp::Pow,
            _ => return Ok(lhs),
        };
        let target = match lhs {
            Expr::Var(name) => Target::Var(name),
            Expr::Index { array, row, col } => match *array {
                Expr::Var(name) => Target::Element { name, row, col },
                _ => return Err(malformed("only a named array element can be assigned")),
            },
            _ => return Err(malformed("left side of assignment is not a variable")),
        };
        self.pos += 1;
        let rhs = self.parse_assign()?;
        Ok(Expr::Assign(target, op, Box::new(rhs)))
    }

    fn parse_ternary(&mut self) -> Result<Expr, EvalError> {
        let cond = self.parse_or()?;
        if self.eat(&Token::Question) {
            let then = self.parse_assign()?;
            self.expect(&Token::Colon, "':' in conditional")?;
            let else_ = self.parse_assign()?;
            Ok(Expr::Ternary(Box::new(cond), Box::new(then), Box::new(else_)))
        } else {
            Ok(cond)
        }
    }

    fn parse_or(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::Or) {
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_relational()?;
        while self.eat(&Token::And) {
            let rhs = self.parse_relational()?;
            lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_concat()?;
        loop {
            let op = match self.peek() {
                Token::Eq => BinOp::Eq,
                Token::Ne => BinOp::Ne,
                Token::Lt => BinOp::Lt,
                Token::Le => BinOp::Le,
                Token::Gt => BinOp::Gt,
                Token::Ge => BinOp::Ge,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_concat()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_concat(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_additive()?;
        while self.eat(&Token::Concat) {
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary(BinOp::Concat, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::Percent => BinOp::Rem,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        let op = match self.peek() {
            Token::Minus => UnaryOp::Neg,
            Token::Plus => UnaryOp::Plus,
            Token::Bang => UnaryOp::Not,
            Token::Inc | Token::Dec => {
                let delta = if self.advance() == Token::Inc { 1.0 } else { -1.0 };
                return match self.advance() {
                    Token::Ident(name) => Ok(Expr::Step { name, delta, prefix: true }),
                    other => Err(malformed(format!(
                        "increment needs a variable, found {}",
                        describe(&other)
                    ))),
                };
            }
            _ => return self.parse_power(),
        };
        self.pos += 1;
        Ok(Expr::Unary(op, Box::new(self.parse_unary()?)))
    }

    fn parse_power(&mut self) -> Result<Expr, EvalError> {
        let base = self.parse_postfix()?;
        if self.eat(&Token::Power) {
            // Right associative; the exponent may carry its own sign.
            let exp = self.parse_unary()?;
            Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exp)))
        } else {
            Ok(base)
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Token::LBracket => {
                    self.pos += 1;
                    let row = self.parse_assign()?;
                    self.expect(&Token::Comma, "',' between array indices")?;
                    let col = self.parse_assign()?;
                    self.expect(&Token::RBracket, "']'")?;
                    expr = Expr::Index {
                        array: Box::new(expr),
                        row: Box::new(row),
                        col: Box::new(col),
                    };
                }
                Token::Inc | Token::Dec => {
                    let Expr::Var(name) = expr else {
                        return Err(malformed("increment needs a variable"));
                    };
                    let delta = if self.advance() == Token::Inc { 1.0 } else { -1.0 };
                    expr = Expr::Step { name, delta, prefix: false };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        let tok = self.advance();
        match tok {
            Token::Number(x) => Ok(Expr::Literal(Value::Scalar(x))),
            Token::Str(s) => Ok(Expr::Literal(Value::Text(s))),
            Token::Ident(name) => {
                if self.eat(&Token::LParen) {
                    let mut args = Vec::new();
                    if self.peek() != &Token::RParen {
                        args.push(self.parse_assign()?);
                        while self.eat(&Token::Comma) {
                            args.push(self.parse_assign()?);
                        }
                    }
                    self.expect(&Token::RParen, &format!("')' after arguments to {name}"))?;
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Var(name))
                }
            }
            Token::LParen => {
                let inner = self.parse_assign()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            other => Err(malformed(format!("unexpected {}", describe(&other)))),
        }
    }
}

fn malformed(msg: impl Into<String>) -> EvalError {
    EvalError::MalformedExpression(msg.into())
}

fn describe(tok: &Token) -> String {
    match tok {
        Token::Number(x) => format!("number {x}"),
        Token::Str(s) => format!("string \"{s}\""),
        Token::Ident(s) => format!("'{s}'"),
        Token::Unknown(c) => format!("character '{c}'"),
        Token::Eof => "end of expression".to_owned(),
        other => format!("{other:?}"),
    }
}

/// Parse the text of one `{…}` region into an AST.
pub fn parse_expr(src: &str) -> Result<Expr, EvalError> {
    let tokens = Lexer::new(src).tokenize();
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_assign()?;
    match parser.peek() {
        Token::Eof => Ok(expr),
        other => Err(malformed(format!("unexpected {} after expression", describe(other)))),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

use crate::{error::RuntimeError, symbol::SymbolTable};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    fn precedence(self) -> u8 {
        match self {
            Op::Mul | Op::Div => 2,
            Op::Add | Op::Sub => 1,
        }
    }

    fn apply(self, x: f64, y: f64) -> f64 {
        match self {
            Op::Add => x + y,
            Op::Sub => x - y,
            Op::Mul => x * y,
            // IEEE division; no divide-by-zero trap beyond what f64 does.
            Op::Div => x / y,
        }
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Op::Add => write!(f, "+"),
            Op::Sub => write!(f, "-"),
            Op::Mul => write!(f, "*"),
            Op::Div => write!(f, "/"),
        }
    }
}

/// Postfix token. Operands stay textual; they resolve against the symbol
/// table only at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Operand(String),
    Op(Op),
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Operand(text) => write!(f, "{}", text),
            Token::Op(op) => write!(f, "{}", op),
        }
    }
}

enum Pending {
    Op(Op),
    LParen,
}

fn malformed(expr: &str) -> RuntimeError {
    RuntimeError::MalformedExpression(expr.into())
}

/// Infix to postfix via shunting-yard. A `-` at the start of the
/// expression, or right after `(` or another operator, is unary: it is
/// rewritten as `0 - x` by pushing an implicit `0` operand and stacking
/// the operator directly, without the usual pop loop. That direct push is
/// what makes `4 - -2` come out as `4 0 2 - -`.
pub fn to_postfix(expr: &str) -> Result<Vec<Token>, RuntimeError> {
    let mut postfix = Vec::new();
    let mut pending: Vec<Pending> = Vec::new();
    let mut word = String::new();
    let mut been_space = false;
    let mut prev: Option<char> = None;
    for c in expr.chars() {
        if c.is_whitespace() {
            been_space = true;
            continue;
        }
        if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
            if !word.is_empty() && been_space {
                return Err(malformed(expr));
            }
            been_space = false;
            word.push(c);
            prev = Some(c);
            continue;
        }
        been_space = false;
        if !word.is_empty() {
            postfix.push(Token::Operand(std::mem::take(&mut word)));
        }
        match c {
            '+' | '-' | '*' | '/' => {
                let unary = c == '-' && matches!(prev, None | Some('(' | '+' | '-' | '*' | '/'));
                let op = match c {
                    '+' => Op::Add,
                    '-' => Op::Sub,
                    '*' => Op::Mul,
                    _ => Op::Div,
                };
                if unary {
                    postfix.push(Token::Operand("0".into()));
                    pending.push(Pending::Op(Op::Sub));
                } else {
                    while let Some(Pending::Op(top)) = pending.last() {
                        if top.precedence() >= op.precedence() {
                            postfix.push(Token::Op(*top));
                            pending.pop();
                        } else {
                            break;
                        }
                    }
                    pending.push(Pending::Op(op));
                }
            }
            '(' => pending.push(Pending::LParen),
            ')' => loop {
                match pending.pop() {
                    Some(Pending::Op(op)) => postfix.push(Token::Op(op)),
                    Some(Pending::LParen) => break,
                    None => return Err(malformed(expr)),
                }
            },
            _ => return Err(malformed(expr)),
        }
        prev = Some(c);
    }
    if !word.is_empty() {
        postfix.push(Token::Operand(word));
    }
    while let Some(top) = pending.pop() {
        match top {
            Pending::Op(op) => postfix.push(Token::Op(op)),
            Pending::LParen => return Err(malformed(expr)),
        }
    }
    Ok(postfix)
}

fn resolve(operand: &str, vars: &SymbolTable) -> Result<f64, RuntimeError> {
    if let Ok(n) = operand.parse() {
        return Ok(n);
    }
    vars.get(operand)?
        .as_number()
        .ok_or_else(|| RuntimeError::NotNumeric(operand.into()))
}

/// Evaluates a postfix sequence against the symbol table. Underflow or a
/// leftover stack depth other than one is a malformed expression.
pub fn eval_postfix(
    postfix: &[Token],
    expr: &str,
    vars: &SymbolTable,
) -> Result<f64, RuntimeError> {
    let mut stack = Vec::new();
    for token in postfix {
        match token {
            Token::Operand(text) => stack.push(resolve(text, vars)?),
            Token::Op(op) => {
                let y = stack.pop().ok_or_else(|| malformed(expr))?;
                let x = stack.pop().ok_or_else(|| malformed(expr))?;
                stack.push(op.apply(x, y));
            }
        }
    }
    if stack.len() != 1 {
        return Err(malformed(expr));
    }
    Ok(stack[0])
}

pub fn eval(expr: &str, vars: &SymbolTable) -> Result<f64, RuntimeError> {
    eval_postfix(&to_postfix(expr)?, expr, vars)
}

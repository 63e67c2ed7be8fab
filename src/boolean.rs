use crate::{
    error::RuntimeError,
    symbol::{SymbolTable, Value},
};
use thiserror::Error;

/// Explicit failure signal of the boolean evaluator, distinct from a
/// valid `false`: unbalanced parens, unknown tokens, stack underflow and
/// unresolved identifiers all end up here.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct Indeterminate(pub String);

impl From<Indeterminate> for RuntimeError {
    fn from(err: Indeterminate) -> Self {
        RuntimeError::Indeterminate(err.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    And,
    Or,
    Not,
    LParen,
    RParen,
    Cmp(Cmp),
    True,
    False,
    Num(f64),
    Ident(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cmp {
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

// Comparisons are consumed immediately; NOT binds tighter than AND,
// which binds tighter than OR.
fn precedence(tok: &Tok) -> u8 {
    match tok {
        Tok::Cmp(_) => 4,
        Tok::Not => 3,
        Tok::And => 2,
        Tok::Or => 1,
        _ => 0,
    }
}

fn tokenize(expr: &str) -> Option<Vec<Tok>> {
    let chars: Vec<char> = expr.chars().collect();
    let mut toks = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        let tok = match c {
            '&' => Tok::And,
            '|' => Tok::Or,
            '!' => Tok::Not,
            '(' => Tok::LParen,
            ')' => Tok::RParen,
            '<' => match chars.get(i + 1) {
                Some('=') => {
                    i += 1;
                    Tok::Cmp(Cmp::Le)
                }
                Some('>') => {
                    i += 1;
                    Tok::Cmp(Cmp::Ne)
                }
                _ => Tok::Cmp(Cmp::Lt),
            },
            '>' => match chars.get(i + 1) {
                Some('=') => {
                    i += 1;
                    Tok::Cmp(Cmp::Ge)
                }
                _ => Tok::Cmp(Cmp::Gt),
            },
            '=' => match chars.get(i + 1) {
                Some('=') => {
                    i += 1;
                    Tok::Cmp(Cmp::Eq)
                }
                _ => return None,
            },
            '-' if chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())
                && !matches!(toks.last(), Some(Tok::Num(_) | Tok::Ident(_) | Tok::RParen)) =>
            {
                let mut word = String::from('-');
                while let Some(&c) = chars.get(i + 1) {
                    if !c.is_ascii_digit() && c != '.' {
                        break;
                    }
                    word.push(c);
                    i += 1;
                }
                Tok::Num(word.parse().ok()?)
            }
            c if c.is_ascii_digit() => {
                let mut word = String::from(c);
                while let Some(&c) = chars.get(i + 1) {
                    if !c.is_ascii_digit() && c != '.' {
                        break;
                    }
                    word.push(c);
                    i += 1;
                }
                Tok::Num(word.parse().ok()?)
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = String::from(c);
                while let Some(&c) = chars.get(i + 1) {
                    if !c.is_ascii_alphanumeric() && c != '_' {
                        break;
                    }
                    word.push(c);
                    i += 1;
                }
                match word.as_str() {
                    "TRUE" => Tok::True,
                    "FALSE" => Tok::False,
                    _ => Tok::Ident(word),
                }
            }
            _ => return None,
        };
        toks.push(tok);
        i += 1;
    }
    Some(toks)
}

fn to_postfix(toks: Vec<Tok>) -> Option<Vec<Tok>> {
    let mut postfix = Vec::new();
    let mut pending: Vec<Tok> = Vec::new();
    for tok in toks {
        match tok {
            Tok::True | Tok::False | Tok::Num(_) | Tok::Ident(_) => postfix.push(tok),
            Tok::LParen => pending.push(tok),
            Tok::RParen => loop {
                match pending.pop()? {
                    Tok::LParen => break,
                    op => postfix.push(op),
                }
            },
            // NOT is right-associative: equal precedence stays stacked.
            Tok::Not => {
                while let Some(top) = pending.last() {
                    if *top != Tok::LParen && precedence(top) > precedence(&tok) {
                        postfix.push(pending.pop().unwrap());
                    } else {
                        break;
                    }
                }
                pending.push(tok);
            }
            Tok::And | Tok::Or | Tok::Cmp(_) => {
                while let Some(top) = pending.last() {
                    if *top != Tok::LParen && precedence(top) >= precedence(&tok) {
                        postfix.push(pending.pop().unwrap());
                    } else {
                        break;
                    }
                }
                pending.push(tok);
            }
        }
    }
    while let Some(top) = pending.pop() {
        if top == Tok::LParen {
            return None;
        }
        postfix.push(top);
    }
    Some(postfix)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Operand {
    Num(f64),
    Bool(bool),
    Ch(char),
}

fn compare(op: Cmp, x: Operand, y: Operand) -> Option<bool> {
    match (x, y) {
        (Operand::Num(x), Operand::Num(y)) => Some(match op {
            Cmp::Lt => x < y,
            Cmp::Gt => x > y,
            Cmp::Le => x <= y,
            Cmp::Ge => x >= y,
            Cmp::Eq => x == y,
            Cmp::Ne => x != y,
        }),
        (Operand::Ch(x), Operand::Ch(y)) => Some(match op {
            Cmp::Lt => x < y,
            Cmp::Gt => x > y,
            Cmp::Le => x <= y,
            Cmp::Ge => x >= y,
            Cmp::Eq => x == y,
            Cmp::Ne => x != y,
        }),
        (Operand::Bool(x), Operand::Bool(y)) => match op {
            Cmp::Eq => Some(x == y),
            Cmp::Ne => Some(x != y),
            _ => None,
        },
        _ => None,
    }
}

fn eval_postfix(postfix: &[Tok], vars: &SymbolTable) -> Option<bool> {
    let mut stack: Vec<Operand> = Vec::new();
    for tok in postfix {
        match tok {
            Tok::True => stack.push(Operand::Bool(true)),
            Tok::False => stack.push(Operand::Bool(false)),
            Tok::Num(n) => stack.push(Operand::Num(*n)),
            Tok::Ident(name) => stack.push(match vars.get(name).ok()? {
                Value::Int(n) => Operand::Num(*n as f64),
                Value::Float(n) => Operand::Num(*n),
                Value::Bool(b) => Operand::Bool(*b),
                Value::Char(c) => Operand::Ch(*c),
            }),
            Tok::Not => {
                let x = stack.pop()?;
                match x {
                    Operand::Bool(b) => stack.push(Operand::Bool(!b)),
                    _ => return None,
                }
            }
            Tok::And | Tok::Or => {
                let y = stack.pop()?;
                let x = stack.pop()?;
                match (x, y) {
                    (Operand::Bool(x), Operand::Bool(y)) => stack.push(Operand::Bool(
                        if matches!(tok, Tok::And) { x && y } else { x || y },
                    )),
                    _ => return None,
                }
            }
            Tok::Cmp(op) => {
                let y = stack.pop()?;
                let x = stack.pop()?;
                stack.push(Operand::Bool(compare(*op, x, y)?));
            }
            Tok::LParen | Tok::RParen => return None,
        }
    }
    match stack[..] {
        [Operand::Bool(b)] => Some(b),
        _ => None,
    }
}

/// Evaluates a logical/relational expression. Keyword operators are
/// rewritten textually (`AND`→`&`, `OR`→`|`, `NOT`→`!`) before
/// tokenizing, the way the language defines them.
pub fn eval(expr: &str, vars: &SymbolTable) -> Result<bool, Indeterminate> {
    let rewritten = expr.replace("AND", "&").replace("OR", "|").replace("NOT", "!");
    tokenize(&rewritten)
        .and_then(to_postfix)
        .and_then(|postfix| eval_postfix(&postfix, vars))
        .ok_or_else(|| Indeterminate(expr.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Ty;

    fn vars() -> SymbolTable {
        let mut vars = SymbolTable::new();
        vars.declare("i", Ty::Int).unwrap();
        vars.set("i", Value::Int(2)).unwrap();
        vars.declare("x", Ty::Float).unwrap();
        vars.set("x", Value::Float(1.5)).unwrap();
        vars.declare("ok", Ty::Bool).unwrap();
        vars.set("ok", Value::Bool(true)).unwrap();
        vars.declare("c", Ty::Char).unwrap();
        vars.set("c", Value::Char('m')).unwrap();
        vars
    }

    fn eval_ok(expr: &str) -> bool {
        eval(expr, &vars()).unwrap()
    }

    #[test]
    fn not_binds_before_or() {
        assert!(eval_ok("NOT TRUE OR TRUE"));
        assert!(!eval_ok("NOT (TRUE OR TRUE)"));
    }

    #[test]
    fn and_binds_before_or() {
        assert!(eval_ok("TRUE OR TRUE AND FALSE"));
        assert!(!eval_ok("(TRUE OR TRUE) AND FALSE"));
    }

    #[test]
    fn comparisons_bind_tightest() {
        assert!(eval_ok("1 < 2 AND 3 <> 4"));
        assert!(eval_ok("i == 2 OR i > 100"));
        assert!(!eval_ok("NOT i <= 2"));
    }

    #[test]
    fn typed_operands() {
        assert!(eval_ok("x >= 1.5"));
        assert!(eval_ok("ok == TRUE"));
        assert!(eval_ok("c == c"));
        assert!(eval_ok("i > -3"));
    }

    #[test]
    fn indeterminate_is_not_false() {
        assert!(matches!(eval("(1 < 2", &vars()), Err(Indeterminate(_))));
        assert!(matches!(eval("1 <", &vars()), Err(Indeterminate(_))));
        assert!(matches!(eval("1 = 2", &vars()), Err(Indeterminate(_))));
        assert!(matches!(eval("1 $ 2", &vars()), Err(Indeterminate(_))));
        assert!(matches!(eval("nope == 1", &vars()), Err(Indeterminate(_))));
        assert!(matches!(eval("ok < TRUE", &vars()), Err(Indeterminate(_))));
        assert!(matches!(eval("1 < 2 3", &vars()), Err(Indeterminate(_))));
        assert!(matches!(eval("NOT 5", &vars()), Err(Indeterminate(_))));
    }
}

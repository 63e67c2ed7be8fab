use crate::{
    arith, boolean,
    error::RuntimeError,
    program::{BlockId, Instruction, Program},
    symbol::{SymbolTable, Ty, Value},
};
use std::io::{BufRead, Write};

/// Structures nothing, evaluates everything: walks the instruction list,
/// recursing into nested blocks, and is the symbol table's only writer.
pub struct Interpreter<'a> {
    vars: SymbolTable,
    blocks: &'a [Vec<Instruction>],
    input: &'a mut dyn BufRead,
    output: &'a mut dyn Write,
}

/// Runs a structured program to completion, returning the final symbol
/// table snapshot. Fail-fast: the first runtime error unwinds through
/// every enclosing block.
pub fn run(
    program: &Program,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<SymbolTable, RuntimeError> {
    let mut interpreter = Interpreter {
        vars: SymbolTable::new(),
        blocks: &program.blocks,
        input,
        output,
    };
    interpreter.run_body(&program.body)?;
    Ok(interpreter.vars)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    NotStarted,
    Started,
    Finished,
}

impl<'a> Interpreter<'a> {
    fn run_block(&mut self, id: BlockId) -> Result<(), RuntimeError> {
        let blocks = self.blocks;
        self.run_body(&blocks[id])
    }

    /// Every instruction list, top-level or nested, carries its own
    /// Start/Stop pair; all of them share one symbol table.
    fn run_body(&mut self, body: &[Instruction]) -> Result<(), RuntimeError> {
        let mut phase = Phase::NotStarted;
        let mut decls_open = true;
        let mut i = 0;
        while i < body.len() {
            match &body[i] {
                Instruction::Start => match phase {
                    Phase::NotStarted => phase = Phase::Started,
                    Phase::Started => return Err(RuntimeError::AlreadyStarted),
                    Phase::Finished => return Err(RuntimeError::AlreadyFinished),
                },
                Instruction::Stop => match phase {
                    Phase::Started => phase = Phase::Finished,
                    _ => return Err(RuntimeError::NotStarted),
                },
                instruction => {
                    match phase {
                        Phase::Started => {}
                        Phase::NotStarted => return Err(RuntimeError::NotStarted),
                        Phase::Finished => return Err(RuntimeError::AlreadyFinished),
                    }
                    match instruction {
                        Instruction::Declare { name, ty, init } => {
                            if !decls_open {
                                return Err(RuntimeError::LateDeclaration(name.clone()));
                            }
                            self.vars.declare(name, *ty)?;
                            if let Some(expr) = init {
                                if let Err(err) = self.assign(name, expr) {
                                    self.vars.remove(name);
                                    return Err(err);
                                }
                            }
                        }
                        Instruction::Assign { target, expr } => {
                            decls_open = false;
                            self.assign(target, expr)?;
                        }
                        Instruction::Input { name } => {
                            decls_open = false;
                            self.read_into(name)?;
                        }
                        Instruction::Output { template } => {
                            decls_open = false;
                            let text = self.render(template)?;
                            writeln!(self.output, "{}", text)?;
                        }
                        Instruction::Increment { target, by } => {
                            decls_open = false;
                            match self.vars.get_mut(target)? {
                                Value::Int(n) => *n += by,
                                Value::Float(n) => *n += *by as f64,
                                _ => return Err(RuntimeError::NotNumeric(target.clone())),
                            }
                        }
                        Instruction::SignAssign {
                            target,
                            source,
                            negate,
                        } => {
                            decls_open = false;
                            let n = self
                                .vars
                                .get(source)?
                                .as_number()
                                .ok_or_else(|| RuntimeError::NotNumeric(source.clone()))?;
                            let n = if *negate { -n } else { n.abs() };
                            self.store_number(target, n)?;
                        }
                        Instruction::If { cond, block } => {
                            decls_open = false;
                            let else_block = match body.get(i + 1) {
                                Some(Instruction::Else { block }) => {
                                    i += 1;
                                    Some(*block)
                                }
                                _ => None,
                            };
                            if boolean::eval(cond, &self.vars)? {
                                self.run_block(*block)?;
                            } else if let Some(block) = else_block {
                                self.run_block(block)?;
                            }
                        }
                        Instruction::While { cond, block } => {
                            decls_open = false;
                            while boolean::eval(cond, &self.vars)? {
                                self.run_block(*block)?;
                            }
                        }
                        // A stray Else never survives structuring, and the
                        // If dispatch above consumes the attached one.
                        Instruction::Else { .. } => unreachable!(),
                        Instruction::Start | Instruction::Stop => unreachable!(),
                    }
                }
            }
            i += 1;
        }
        if phase == Phase::Started {
            return Err(RuntimeError::MissingStop);
        }
        Ok(())
    }

    /// Single assignment path, shared by `Assign` instructions and
    /// declaration initializers. The right-hand side is interpreted per
    /// the target's declared type.
    fn assign(&mut self, target: &str, expr: &str) -> Result<(), RuntimeError> {
        match self.vars.get(target)?.ty() {
            Ty::Int | Ty::Float => {
                let n = arith::eval(expr, &self.vars)?;
                self.store_number(target, n)?;
            }
            Ty::Bool => {
                let value = match expr {
                    "\"TRUE\"" => true,
                    "\"FALSE\"" => false,
                    _ => boolean::eval(expr, &self.vars)?,
                };
                self.vars.set(target, Value::Bool(value))?;
            }
            Ty::Char => {
                let mut chars = expr.chars();
                match (chars.next(), chars.next(), chars.next(), chars.next()) {
                    (Some('\''), Some(c), Some('\''), None) => {
                        self.vars.set(target, Value::Char(c))?;
                    }
                    _ => return Err(RuntimeError::BadCharLiteral(expr.into())),
                }
            }
        }
        Ok(())
    }

    /// Stores a numeric result, truncating toward the target's declared
    /// numeric kind.
    fn store_number(&mut self, target: &str, n: f64) -> Result<(), RuntimeError> {
        let value = match self.vars.get(target)?.ty() {
            Ty::Int => Value::Int(n as i64),
            Ty::Float => Value::Float(n),
            _ => return Err(RuntimeError::NotNumeric(target.into())),
        };
        self.vars.set(target, value)
    }

    /// Blocks for one line from the line source and coerces it to the
    /// variable's declared type. End-of-input is an error distinct from
    /// a blank line.
    fn read_into(&mut self, name: &str) -> Result<(), RuntimeError> {
        let ty = self.vars.get(name)?.ty();
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(RuntimeError::UnexpectedEof);
        }
        let text = line.trim();
        let bad_input = || RuntimeError::BadInput {
            name: name.into(),
            text: text.into(),
        };
        let value = match ty {
            Ty::Int => Value::Int(text.parse().map_err(|_| bad_input())?),
            Ty::Float => Value::Float(text.parse().map_err(|_| bad_input())?),
            Ty::Bool => match text {
                "TRUE" => Value::Bool(true),
                "FALSE" => Value::Bool(false),
                _ => return Err(bad_input()),
            },
            Ty::Char => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Value::Char(c),
                    _ => return Err(bad_input()),
                }
            }
        };
        self.vars.set(name, value)
    }

    /// Renders an OUTPUT template left to right: quoted literals (with
    /// `#` as newline and `[c]` as a one-character escape), identifier
    /// substitutions, parenthesized expressions, and `&` as a
    /// non-printing joiner.
    fn render(&self, template: &str) -> Result<String, RuntimeError> {
        let chars: Vec<char> = template.chars().collect();
        let mut out = String::new();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if c.is_whitespace() || c == '&' {
                i += 1;
            } else if c == '"' {
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(RuntimeError::MalformedOutput(template.into())),
                        Some('"') => {
                            i += 1;
                            break;
                        }
                        Some('#') => {
                            out.push('\n');
                            i += 1;
                        }
                        Some('[') => {
                            match (chars.get(i + 1), chars.get(i + 2)) {
                                (Some(&c), Some(']')) => out.push(c),
                                _ => return Err(RuntimeError::BadEscape(template.into())),
                            }
                            i += 3;
                        }
                        Some(']') => return Err(RuntimeError::BadEscape(template.into())),
                        Some(&c) => {
                            out.push(c);
                            i += 1;
                        }
                    }
                }
            } else if c == '(' {
                let from = i;
                let mut depth = 0;
                while i < chars.len() {
                    match chars[i] {
                        '(' => depth += 1,
                        ')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    i += 1;
                }
                if depth != 0 {
                    return Err(RuntimeError::MalformedOutput(template.into()));
                }
                let expr: String = chars[from..=i].iter().collect();
                i += 1;
                if is_boolean(&expr) {
                    let flag = boolean::eval(&expr, &self.vars)?;
                    out.push_str(if flag { "TRUE" } else { "FALSE" });
                } else {
                    let n = arith::eval(&expr, &self.vars)?;
                    out.push_str(&n.to_string());
                }
            } else if c.is_ascii_alphanumeric() || c == '_' {
                let from = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let name: String = chars[from..i].iter().collect();
                out.push_str(&self.vars.get(&name)?.to_string());
            } else {
                return Err(RuntimeError::MalformedOutput(template.into()));
            }
        }
        Ok(out)
    }
}

/// A parenthesized OUTPUT segment goes to the boolean evaluator when it
/// carries any relational/logical operator, otherwise to the arithmetic
/// one. The two `&` contexts (joiner vs AND) never meet: the joiner
/// lives between segments, the operator inside parentheses.
fn is_boolean(expr: &str) -> bool {
    ["<", ">", "=", "&", "|", "!", "AND", "OR", "NOT"]
        .iter()
        .any(|op| expr.contains(op))
}

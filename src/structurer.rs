use crate::{
    classifier::{self, Kind, Rule},
    error::SyntaxError,
    program::{Instruction, Program},
    symbol::Ty,
};
use pest::iterators::Pair;

/// Structures the whole source into a program, or fails with the first
/// structuring error. Nothing from a failed pass is ever executed.
pub fn structure(src: &str) -> Result<Program, SyntaxError> {
    let lines: Vec<&str> = src.lines().collect();
    let mut structurer = Structurer { blocks: Vec::new() };
    let (body, next) = structurer.block(&lines, 0, 0)?;
    if let Some(at) = significant(&lines, next) {
        return Err(SyntaxError::AfterStop { line: at + 1 });
    }
    Ok(Program {
        body,
        blocks: structurer.blocks,
    })
}

/// Index of the next line that is neither blank nor a comment.
fn significant(lines: &[&str], mut at: usize) -> Option<usize> {
    while at < lines.len() {
        let line = lines[at].trim();
        if !line.is_empty() && !matches!(classifier::classify(line), Some((Kind::Comment, _))) {
            return Some(at);
        }
        at += 1;
    }
    None
}

struct Structurer {
    blocks: Vec<Vec<Instruction>>,
}

impl Structurer {
    fn add(&mut self, block: Vec<Instruction>) -> usize {
        self.blocks.push(block);
        self.blocks.len() - 1
    }

    /// Consumes one START/STOP-bracketed body beginning at `at` and
    /// returns it together with the first unconsumed line index. Nested
    /// IF/WHILE bodies are extracted by recursion into the block arena.
    fn block(
        &mut self,
        lines: &[&str],
        mut at: usize,
        depth: usize,
    ) -> Result<(Vec<Instruction>, usize), SyntaxError> {
        let mut body = Vec::new();
        let mut started = false;
        let mut start_line = at;
        while at < lines.len() {
            let line = lines[at].trim();
            if line.is_empty() {
                at += 1;
                continue;
            }
            let (kind, pair) =
                classifier::classify(line).ok_or(SyntaxError::Unrecognized { line: at + 1 })?;
            match kind {
                Kind::Comment => {}
                Kind::Start => {
                    if started {
                        return Err(SyntaxError::DuplicateStart { line: at + 1 });
                    }
                    started = true;
                    start_line = at;
                    body.push(Instruction::Start);
                }
                Kind::Stop => {
                    if !started {
                        return Err(SyntaxError::StopBeforeStart { line: at + 1 });
                    }
                    body.push(Instruction::Stop);
                    return Ok((body, at + 1));
                }
                _ if !started => return Err(SyntaxError::BeforeStart { line: at + 1 }),
                Kind::Else => return Err(SyntaxError::StrayElse { line: at + 1 }),
                Kind::If | Kind::While => {
                    let cond = condition(pair);
                    let (block, next) = self.block(lines, at + 1, depth + 1)?;
                    let id = self.add(block);
                    at = next;
                    if kind == Kind::While {
                        body.push(Instruction::While { cond, block: id });
                    } else {
                        body.push(Instruction::If { cond, block: id });
                        if let Some(else_at) = significant(lines, at) {
                            if matches!(
                                classifier::classify(lines[else_at].trim()),
                                Some((Kind::Else, _))
                            ) {
                                let (block, next) = self.block(lines, else_at + 1, depth + 1)?;
                                let id = self.add(block);
                                body.push(Instruction::Else { block: id });
                                at = next;
                            }
                        }
                    }
                    continue;
                }
                Kind::Declaration => {
                    if depth > 0 {
                        return Err(SyntaxError::DeclarationInBlock { line: at + 1 });
                    }
                    self.declaration(pair, at, &mut body)?;
                }
                Kind::Assignment => {
                    let mut pairs = pair.into_inner();
                    let target = name(pairs.next().unwrap(), at)?;
                    let expr = pairs.next().unwrap().as_str().trim().to_string();
                    body.push(Instruction::Assign { target, expr });
                }
                Kind::UnarySign => {
                    let mut pairs = pair.into_inner();
                    let target = name(pairs.next().unwrap(), at)?;
                    let negate = pairs.next().unwrap().as_str() == "-";
                    let source = name(pairs.next().unwrap(), at)?;
                    body.push(Instruction::SignAssign {
                        target,
                        source,
                        negate,
                    });
                }
                Kind::UnaryIncrement => {
                    let mut target = None;
                    let mut by = 0;
                    for inner in pair.into_inner() {
                        match inner.as_rule() {
                            Rule::ident => target = Some(name(inner, at)?),
                            Rule::inc_op => by = if inner.as_str() == "++" { 1 } else { -1 },
                            Rule::EOI => (),
                            _ => unreachable!(),
                        }
                    }
                    body.push(Instruction::Increment {
                        target: target.unwrap(),
                        by,
                    });
                }
                Kind::Input => {
                    for inner in pair.into_inner() {
                        if inner.as_rule() == Rule::ident {
                            body.push(Instruction::Input {
                                name: name(inner, at)?,
                            });
                        }
                    }
                }
                Kind::Output => {
                    let template = pair.into_inner().next().unwrap().as_str().trim().to_string();
                    body.push(Instruction::Output { template });
                }
            }
            at += 1;
        }
        Err(if started {
            SyntaxError::UnterminatedBlock {
                line: start_line + 1,
            }
        } else {
            SyntaxError::MissingStart
        })
    }

    /// `VAR a, b = init, c AS TYPE` becomes one `Declare` per name, each
    /// carrying its own initializer text.
    fn declaration(
        &mut self,
        pair: Pair<Rule>,
        at: usize,
        body: &mut Vec<Instruction>,
    ) -> Result<(), SyntaxError> {
        let pairs: Vec<_> = pair.into_inner().collect();
        let ty = pairs.iter().find(|inner| inner.as_rule() == Rule::ty).unwrap();
        let ty = match ty.as_str() {
            "INT" => Ty::Int,
            "FLOAT" => Ty::Float,
            "BOOL" => Ty::Bool,
            "CHAR" => Ty::Char,
            _ => unreachable!(),
        };
        for item in pairs {
            if item.as_rule() != Rule::dec_item {
                continue;
            }
            let mut inner = item.into_inner();
            let name = name(inner.next().unwrap(), at)?;
            let init = inner.next().map(|init| init.as_str().trim().to_string());
            body.push(Instruction::Declare { name, ty, init });
        }
        Ok(())
    }
}

fn condition(pair: Pair<Rule>) -> String {
    pair.into_inner()
        .find(|inner| inner.as_rule() == Rule::paren)
        .unwrap()
        .as_str()
        .to_string()
}

fn name(pair: Pair<Rule>, at: usize) -> Result<String, SyntaxError> {
    let name = pair.as_str();
    if classifier::is_reserved(name) {
        return Err(SyntaxError::ReservedWord {
            line: at + 1,
            name: name.into(),
        });
    }
    Ok(name.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_program() {
        let program = structure(
            "START\n\
             VAR a, b = 2 + 3 AS INT\n\
             a = b * 2\n\
             OUTPUT: a\n\
             STOP",
        )
        .unwrap();
        assert!(program.blocks.is_empty());
        assert_eq!(
            program.body,
            vec![
                Instruction::Start,
                Instruction::Declare {
                    name: "a".into(),
                    ty: Ty::Int,
                    init: None,
                },
                Instruction::Declare {
                    name: "b".into(),
                    ty: Ty::Int,
                    init: Some("2 + 3".into()),
                },
                Instruction::Assign {
                    target: "a".into(),
                    expr: "b * 2".into(),
                },
                Instruction::Output {
                    template: "a".into()
                },
                Instruction::Stop,
            ]
        );
    }

    #[test]
    fn nested_blocks_go_to_the_arena() {
        let program = structure(
            "START\n\
             VAR i = 0 AS INT\n\
             WHILE (i < 3)\n\
             START\n\
             IF (i == 1)\n\
             START\n\
             OUTPUT: i\n\
             STOP\n\
             i++\n\
             STOP\n\
             STOP",
        )
        .unwrap();
        assert_eq!(program.blocks.len(), 2);
        // Inner IF body is registered before the enclosing WHILE body.
        assert!(matches!(
            program.body[2],
            Instruction::While { block: 1, .. }
        ));
        assert!(matches!(
            program.blocks[1][1],
            Instruction::If { block: 0, .. }
        ));
        assert_eq!(program.blocks[0].len(), 3);
    }

    #[test]
    fn else_attaches_to_the_preceding_if() {
        let program = structure(
            "START\n\
             VAR n = 1 AS INT\n\
             IF (n > 0)\n\
             START\n\
             OUTPUT: \"pos\"\n\
             STOP\n\
             ELSE\n\
             START\n\
             OUTPUT: \"neg\"\n\
             STOP\n\
             STOP",
        )
        .unwrap();
        assert!(matches!(program.body[2], Instruction::If { block: 0, .. }));
        assert!(matches!(program.body[3], Instruction::Else { block: 1 }));
    }

    #[test]
    fn condition_text_is_verbatim() {
        let program = structure(
            "START\n\
             VAR i = 0 AS INT\n\
             WHILE (i < 3 AND NOT (i == 2))\n\
             START\n\
             i++\n\
             STOP\n\
             STOP",
        )
        .unwrap();
        assert!(matches!(
            &program.body[2],
            Instruction::While { cond, .. } if cond == "(i < 3 AND NOT (i == 2))"
        ));
    }

    #[test]
    fn comments_and_blank_lines_vanish() {
        let program = structure("\n* banner\nSTART\n* body note\n\nSTOP\n* trailing\n").unwrap();
        assert_eq!(program.body, vec![Instruction::Start, Instruction::Stop]);
    }

    #[test]
    fn structuring_errors() {
        assert!(matches!(
            structure("a = 5\nSTART\nSTOP"),
            Err(SyntaxError::BeforeStart { line: 1 })
        ));
        assert!(matches!(
            structure("START\nSTART\nSTOP"),
            Err(SyntaxError::DuplicateStart { line: 2 })
        ));
        assert!(matches!(
            structure("STOP"),
            Err(SyntaxError::StopBeforeStart { line: 1 })
        ));
        assert!(matches!(
            structure("START\nSTOP\nOUTPUT: \"late\""),
            Err(SyntaxError::AfterStop { line: 3 })
        ));
        assert!(matches!(
            structure("START\nELSE\nSTOP"),
            Err(SyntaxError::StrayElse { line: 2 })
        ));
        assert!(matches!(
            structure("START\nwhat is this\nSTOP"),
            Err(SyntaxError::Unrecognized { line: 2 })
        ));
        assert!(matches!(structure(""), Err(SyntaxError::MissingStart)));
        assert!(matches!(
            structure("START\nVAR i = 0 AS INT"),
            Err(SyntaxError::UnterminatedBlock { line: 1 })
        ));
    }

    #[test]
    fn unterminated_nested_block() {
        assert!(matches!(
            structure("START\nVAR i = 0 AS INT\nWHILE (i < 3)\nSTART\ni++\nSTOP"),
            Err(SyntaxError::UnterminatedBlock { .. })
        ));
    }

    #[test]
    fn declarations_are_top_level_only() {
        assert!(matches!(
            structure(
                "START\nIF (1 < 2)\nSTART\nVAR x AS INT\nSTOP\nSTOP"
            ),
            Err(SyntaxError::DeclarationInBlock { line: 4 })
        ));
    }

    #[test]
    fn reserved_words_are_not_identifiers() {
        assert!(matches!(
            structure("START\nVAR WHILE AS INT\nSTOP"),
            Err(SyntaxError::ReservedWord { .. })
        ));
        assert!(matches!(
            structure("START\nINPUT: STOP, a\nSTOP"),
            Err(SyntaxError::ReservedWord { .. })
        ));
    }
}

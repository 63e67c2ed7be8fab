use crate::symbol::Ty;

/// Index into [`Program::blocks`]. Ids are minted by the structurer in
/// a single monotonic sequence, so an id always names an existing,
/// immutable body by the time execution begins.
pub type BlockId = usize;

/// One flat instruction. Operand text (expressions, templates) is kept
/// verbatim and resolved lazily by the executor; structuring only
/// validates shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Start,
    Stop,
    Declare {
        name: String,
        ty: Ty,
        init: Option<String>,
    },
    Assign {
        target: String,
        expr: String,
    },
    Input {
        name: String,
    },
    Output {
        template: String,
    },
    /// `x++` / `x--`, in either prefix or postfix position.
    Increment {
        target: String,
        by: i64,
    },
    /// `x = +y` stores `abs(y)`, `x = -y` stores `-y`.
    SignAssign {
        target: String,
        source: String,
        negate: bool,
    },
    If {
        cond: String,
        block: BlockId,
    },
    /// Emitted only directly after an `If`; the executor consumes it as
    /// part of the `If` dispatch.
    Else {
        block: BlockId,
    },
    While {
        cond: String,
        block: BlockId,
    },
}

/// A structured run: the top-level body plus the arena of every nested
/// block body, each bracketed by its own Start/Stop pair.
#[derive(Debug, Default, PartialEq)]
pub struct Program {
    pub body: Vec<Instruction>,
    pub blocks: Vec<Vec<Instruction>>,
}

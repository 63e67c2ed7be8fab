use std::io;
use thiserror::Error;

/// Structuring (compile-time) failures. No instruction from a failed
/// structuring pass is ever executed.
#[derive(Error, Debug)]
pub enum SyntaxError {
    #[error("line {line}: unrecognized statement")]
    Unrecognized { line: usize },
    #[error("line {line}: statement before START")]
    BeforeStart { line: usize },
    #[error("line {line}: duplicate START")]
    DuplicateStart { line: usize },
    #[error("line {line}: STOP without START")]
    StopBeforeStart { line: usize },
    #[error("line {line}: statement after top-level STOP")]
    AfterStop { line: usize },
    #[error("line {line}: ELSE without a preceding IF")]
    StrayElse { line: usize },
    #[error("line {line}: VAR declaration inside a control block")]
    DeclarationInBlock { line: usize },
    #[error("line {line}: {name} is a reserved word")]
    ReservedWord { line: usize, name: String },
    #[error("block started at line {line} has no matching STOP")]
    UnterminatedBlock { line: usize },
    #[error("program has no START")]
    MissingStart,
}

/// Execution failures. Each one aborts the current instruction list and
/// unwinds through every enclosing IF/WHILE frame; the symbol table keeps
/// whatever happened strictly before the failing instruction.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("variable {0} is already declared")]
    Redeclared(String),
    #[error("variable {0} is not declared")]
    NotDeclared(String),
    #[error("VAR declaration after an executable statement: {0}")]
    LateDeclaration(String),
    #[error("variable {0} is not numeric")]
    NotNumeric(String),
    #[error("malformed expression: {0}")]
    MalformedExpression(String),
    #[error("indeterminate condition: {0}")]
    Indeterminate(String),
    #[error("invalid CHAR literal: {0}")]
    BadCharLiteral(String),
    #[error("invalid escape sequence in output: {0}")]
    BadEscape(String),
    #[error("malformed output template: {0}")]
    MalformedOutput(String),
    #[error("cannot read {text:?} into {name}")]
    BadInput { name: String, text: String },
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("duplicate START")]
    AlreadyStarted,
    #[error("statement outside START/STOP")]
    NotStarted,
    #[error("statement after STOP")]
    AlreadyFinished,
    #[error("missing STOP")]
    MissingStop,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The single outcome of the public entry point: callers only need to
/// tell a failed compile from a failed run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("compile error: {0}")]
    Compile(#[from] SyntaxError),
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

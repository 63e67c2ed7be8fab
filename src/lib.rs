#[macro_use]
extern crate pest_derive;

pub mod arith;
pub mod boolean;
pub mod classifier;
pub mod error;
pub mod exec;
pub mod program;
pub mod structurer;
pub mod symbol;

pub use error::Error;

use std::io::{BufRead, Write};
use symbol::SymbolTable;

/// Structures and runs a source text. `input` serves the INPUT
/// instructions one line at a time; `output` receives one line per
/// OUTPUT instruction. On success the final symbol table is returned.
pub fn run(
    src: &str,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<SymbolTable, Error> {
    let program = structurer::structure(src)?;
    Ok(exec::run(&program, input, output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RuntimeError, SyntaxError};
    use std::{fs, io::Cursor, path::PathBuf};

    fn run_sample(file_name: &str, input: &str) -> (Result<SymbolTable, Error>, String) {
        let src = fs::read_to_string(["samples", file_name].iter().collect::<PathBuf>()).unwrap();
        let mut input = Cursor::new(input.to_string());
        let mut output = Vec::new();
        let result = run(&src, &mut input, &mut output);
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_arith_sample() {
        let (result, output) = run_sample("arith.cfpl", "");
        assert!(result.is_ok());
        assert_eq!(output, "11\nw\n");
    }

    #[test]
    fn test_loop_sample() {
        let (result, output) = run_sample("loop.cfpl", "");
        let vars = result.unwrap();
        assert_eq!(vars.get("i").unwrap().to_string(), "3");
        assert_eq!(output, "3\n");
    }

    #[test]
    fn test_branch_sample() {
        assert_eq!(run_sample("branch.cfpl", "5\n").1, "positive\n");
        assert_eq!(run_sample("branch.cfpl", "0\n").1, "not positive\n");
    }

    #[test]
    fn test_redeclare_sample() {
        let (result, _) = run_sample("redeclare.cfpl", "");
        assert!(matches!(
            result,
            Err(Error::Runtime(RuntimeError::Redeclared(_)))
        ));
    }

    #[test]
    fn test_unterminated_sample() {
        let (result, _) = run_sample("unterminated.cfpl", "");
        assert!(matches!(
            result,
            Err(Error::Compile(SyntaxError::UnterminatedBlock { .. }))
        ));
    }
}

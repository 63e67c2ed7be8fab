use anyhow::Result;
use clap::Parser;
use std::{fs, io};

/// CFPL pseudocode interpreter
#[derive(Parser, Debug)]
struct Args {
    file_name: String,
    /// Dump the symbol table after a successful run
    #[arg(long)]
    dump: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let src = fs::read_to_string(&args.file_name)?;
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    let vars = cfpl::run(&src, &mut input, &mut output)?;
    if args.dump {
        print!("{}", vars);
    }
    Ok(())
}

//! Command-line front end for the s-expression preprocessor.
//!
//! Reads standard input, expands every `__sexpr (...)` expression and writes
//! the result to standard output. Set `RUST_LOG=debug` to see each expansion
//! on standard error.

use anyhow::Context;
use clap::Command;
use std::io::{self, BufWriter, Read, Write};

fn main() -> anyhow::Result<()> {
    Command::new("sexprpp")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Expands marker-tagged s-expressions from standard input into call syntax")
        .get_matches();

    env_logger::init();

    let mut input = Vec::new();
    io::stdin()
        .lock()
        .read_to_end(&mut input)
        .context("failed to read standard input")?;

    let mut output = BufWriter::new(io::stdout().lock());
    let summary = sexprpp::preprocess(&input, &mut output)?;
    output.flush().context("failed to write standard output")?;

    log::info!(
        "expanded {} expression(s) in {} byte(s) of input",
        summary.expansions,
        input.len()
    );
    Ok(())
}

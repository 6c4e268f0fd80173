//! Binary surface: the clap definition and the read-eval-print loop.
//!
//! Thin on purpose. Everything with behavior lives behind
//! [`normalize`](crate::console::normalize::normalize) and
//! [`dispatch`](crate::console::dispatch::dispatch); this module just moves
//! lines in and lines out.

use std::io::{self, BufRead, Write};

use clap::Parser;

use crate::console::dispatch::{self, Flow};
use crate::console::normalize;
use crate::core::error::KardexError;
use crate::core::store::FileStore;

pub const PROMPT: &str = "(kardex) ";

#[derive(Parser, Debug)]
#[clap(
    name = "kardex",
    version = env!("CARGO_PKG_VERSION"),
    about = "Interactive shell for creating, inspecting, mutating, and destroying typed records, persisted as a single JSON document."
)]
pub struct Cli {}

/// Runs the interpreter loop over `input`, writing prompts and command
/// output to `output`.
///
/// Recoverable errors print their diagnostic and the loop continues; fatal
/// ones (store corruption, failed save) propagate to the caller. Returns
/// cleanly on `quit`, `eof`, or end of input.
pub fn run_loop(
    store: &mut FileStore,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<(), KardexError> {
    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            // Ctrl-D at the prompt: behave like an explicit `eof`.
            writeln!(output)?;
            return Ok(());
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = normalize::normalize(line).and_then(|cmd| dispatch::dispatch(store, cmd));
        match reply {
            Ok(reply) => {
                for out in &reply.lines {
                    writeln!(output, "{out}")?;
                }
                if reply.flow == Flow::Stopped {
                    return Ok(());
                }
            }
            Err(e) if !e.is_fatal() => writeln!(output, "{e}")?,
            Err(e) => return Err(e),
        }
    }
}

/// Entry point for the binary: open the store in the working directory and
/// loop over stdin.
pub fn run() -> Result<(), KardexError> {
    let _cli = Cli::parse();
    let mut store = FileStore::open(crate::core::schemas::STORAGE_FILE_NAME)?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_loop(&mut store, &mut stdin.lock(), &mut stdout.lock())
}

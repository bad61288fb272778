//! `pegc` — command-line driver for the `pegc_core` PEG compiler.
//!
//! Thin front end mirroring `radlr-cli`'s own `clap`-derive structure:
//! read a grammar source file, drive the grammar-text reader
//! (`frontend`) to populate a `Tree`, then call `pegc_core::compile`.

mod frontend;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use pegc_core::{compile_to_path, Diagnostics, PegConfig};

#[derive(Parser)]
#[command(name = "pegc")]
#[command(about = "Compile a peg/leg grammar into a self-contained Rust parser", long_about = None)]
#[command(version)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Compile a grammar file into Rust parser source.
  Build {
    /// Path to the grammar source file.
    grammar_file: PathBuf,

    /// Where to write the generated Rust source.
    #[arg(short, long, default_value = "parser.rs")]
    output: PathBuf,

    /// Inline single-use rule bodies at the call site.
    #[arg(long)]
    inline: bool,

    /// Rewrite disjoint alternates into a FIRST-set dispatched switch.
    #[arg(long)]
    switch: bool,
  },
  /// Parse and analyze a grammar file, reporting diagnostics only.
  Check {
    /// Path to the grammar source file.
    grammar_file: PathBuf,

    #[arg(long)]
    inline: bool,

    #[arg(long)]
    switch: bool,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let result = match cli.command {
    Commands::Build { grammar_file, output, inline, switch } => {
      cmd_build(&grammar_file, &output, PegConfig { inline, switch })
    }
    Commands::Check { grammar_file, inline, switch } => {
      cmd_check(&grammar_file, PegConfig { inline, switch })
    }
  };

  match result {
    Ok(had_diagnostics) => {
      if had_diagnostics {
        ExitCode::FAILURE
      } else {
        ExitCode::SUCCESS
      }
    }
    Err(message) => {
      eprintln!("pegc: {message}");
      ExitCode::FAILURE
    }
  }
}

/// Returns `Ok(true)` if any diagnostic was raised (still a successful
/// compile: diagnostics are non-fatal per the core's error model).
fn cmd_build(grammar_file: &PathBuf, output: &PathBuf, config: PegConfig) -> Result<bool, String> {
  let mut builder = read_grammar(grammar_file, config)?;
  let mut diagnostics = Diagnostics::new();

  compile_to_path(&mut builder.tree, &mut diagnostics, output)
    .map_err(|e| format!("{}: {e}", grammar_file.display()))?;

  diagnostics.print_stderr();
  println!("wrote {}", output.display());
  Ok(!diagnostics.is_empty())
}

fn cmd_check(grammar_file: &PathBuf, config: PegConfig) -> Result<bool, String> {
  let mut builder = read_grammar(grammar_file, config)?;
  let mut diagnostics = Diagnostics::new();
  let mut sink = Vec::new();

  pegc_core::compile(&mut builder.tree, &mut diagnostics, &mut sink)
    .map_err(|e| format!("{}: {e}", grammar_file.display()))?;

  diagnostics.print_stderr();
  if diagnostics.is_empty() {
    println!("ok: {}", grammar_file.display());
  }
  Ok(!diagnostics.is_empty())
}

fn read_grammar(path: &PathBuf, config: PegConfig) -> Result<pegc_core::Builder, String> {
  let source = fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
  frontend::read_grammar(&source, config).map_err(|e| format!("{}: {e}", path.display()))
}

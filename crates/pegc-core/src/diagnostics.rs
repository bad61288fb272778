//! A small compile-time diagnostics sink, in the spirit of a `Journal`/
//! `Report` pair but cut down to what §6.4 and §7 actually need:
//! an append-only list of plain-text lines produced by the semantic
//! passes, rendered to any `io::Write` (stderr by default) rather than
//! an interactive event journal.

use std::io::{self, Write};

/// One diagnostic raised by a semantic pass. Structural and semantic
/// errors (§7) are all non-fatal: they're recorded here and compilation
/// continues.
#[derive(Debug, Clone)]
pub enum Diagnostic {
  UndefinedReference { rule: String },
  UnusedRule { rule: String },
  PossibleLeftRecursion { rule: String },
  IllegalNodeType { type_name: String },
  Other(String),
}

impl std::fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Diagnostic::UndefinedReference { rule } => {
        write!(f, "rule '{rule}' used but not defined")
      }
      Diagnostic::UnusedRule { rule } => write!(f, "rule '{rule}' defined but not used"),
      Diagnostic::PossibleLeftRecursion { rule } => {
        write!(f, "possible infinite left recursion in rule '{rule}'")
      }
      Diagnostic::IllegalNodeType { type_name } => write!(f, "illegal node type: {type_name}"),
      Diagnostic::Other(msg) => f.write_str(msg),
    }
  }
}

/// Accumulates diagnostics raised during a single `Compile` run.
#[derive(Debug, Default)]
pub struct Diagnostics {
  entries: Vec<Diagnostic>,
}

impl Diagnostics {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, diagnostic: Diagnostic) {
    self.entries.push(diagnostic);
  }

  pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
    self.entries.extend(diagnostics);
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
    self.entries.iter()
  }

  /// Writes one line per diagnostic to `out`, matching the original's
  /// `fmt.Fprintf(os.Stderr, ...)` plain-text convention.
  pub fn write_to(&self, mut out: impl Write) -> io::Result<()> {
    for entry in &self.entries {
      writeln!(out, "{entry}")?;
    }
    Ok(())
  }

  pub fn print_stderr(&self) {
    let _ = self.write_to(io::stderr());
  }
}

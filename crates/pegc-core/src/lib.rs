//! # pegc_core
//!
//! Grammar IR, semantic analysis, and code generation for the `pegc` PEG
//! compiler (see `SPEC_FULL.md` §1 for the core this crate covers). A
//! front-end (out of scope here, see `pegc-cli`'s `frontend` module for
//! a minimal one) populates a [`Tree`] through the [`Builder`] API
//! (component A); [`compile::run_passes`] runs the semantic-analysis
//! pipeline (components C-G) over it; [`codegen::generate`] walks the
//! linked, optimized IR and emits the text of a self-contained Rust
//! recursive-descent parser (components H-I).

pub mod codegen;
pub mod compile;
pub mod diagnostics;
pub mod ir;
pub mod types;

use std::fs::File;
use std::io::Write;
use std::path::Path;

pub use diagnostics::{Diagnostic, Diagnostics};
pub use ir::{Builder, Tree};
pub use types::{PegConfig, PegcError, PegcResult};

/// Runs every semantic pass (§2 SYSTEM OVERVIEW's documented order) and
/// writes the emitted parser source to `out`. This is §6.2's
/// `Compile(outputPath)`, generalized over any `io::Write` rather than
/// only a file path — `compile_to_path` below is the file-path-specific
/// convenience the original's operation actually exposes.
pub fn compile(tree: &mut Tree, diagnostics: &mut Diagnostics, out: &mut impl Write) -> PegcResult<()> {
  compile::run_passes(tree, diagnostics);
  let source = codegen::generate(tree, diagnostics);
  out.write_all(source.as_bytes())?;
  Ok(())
}

/// §6.2 `Compile(outputPath)` verbatim: opens `path`, runs every pass,
/// and writes the emitted parser text. I/O failures abort the operation
/// (§7); structural/semantic diagnostics are non-fatal and are left in
/// `diagnostics` for the caller to report (§6.4).
pub fn compile_to_path(
  tree: &mut Tree,
  diagnostics: &mut Diagnostics,
  path: impl AsRef<Path>,
) -> PegcResult<()> {
  let mut file = File::create(path)?;
  compile(tree, diagnostics, &mut file)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn compile_emits_rule_enum_and_a_matching_function() {
    let mut b = Builder::new(PegConfig::default());
    b.add_rule("S");
    b.add_character("x");
    b.add_expression().unwrap();
    let mut tree = b.tree;

    let mut diagnostics = Diagnostics::new();
    let mut out = Vec::new();
    compile(&mut tree, &mut diagnostics, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("enum Rule"));
    assert!(text.contains("RuleS"));
    assert!(text.contains("fn rule_S"));
  }

  #[test]
  fn compile_reports_left_recursion_without_aborting() {
    let mut b = Builder::new(PegConfig::default());
    b.add_rule("L");
    b.add_name("L");
    b.add_character("x");
    b.add_sequence().unwrap();
    b.add_character("x");
    b.add_alternate().unwrap();
    b.add_expression().unwrap();
    let mut tree = b.tree;

    let mut diagnostics = Diagnostics::new();
    let mut out = Vec::new();
    compile(&mut tree, &mut diagnostics, &mut out).unwrap();

    assert!(diagnostics
      .iter()
      .any(|d| matches!(d, Diagnostic::PossibleLeftRecursion { rule } if rule == "L")));
  }
}

//! The semantic-analysis pipeline (§2 SYSTEM OVERVIEW, §4.C-§4.G):
//! variable rewriting, linking, reachability/left-recursion, and the
//! alternate optimizer, run in the documented order over one `Tree`.

mod left_recursion;
mod link;
mod optimize;
mod reachability;
mod variables;

pub use left_recursion::check_left_recursion;
pub use link::link;
pub use optimize::optimize_alternates;
pub use reachability::compute_reachability;
pub use variables::rewrite_variables;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::ir::Tree;

/// Runs every semantic pass in the order §2's data-flow diagram
/// specifies: `C -> D -> (E and F, independent) -> G`.
///
/// E and F are logically independent DFS walks over the now-linked IR
/// (§5 CONCURRENCY & RESOURCE MODEL): each reads the same immutable
/// `Tree` and writes only to its own disjoint output (a use-count map,
/// a diagnostics list), so the source's "simple fork-join over two
/// independent DFS walks" is a literal `std::thread::scope` here rather
/// than a single-threaded simulation of one. Nothing after this point
/// (`optimize_alternates`) may run until both finish, since the
/// optimizer does not itself need `rules_count`, but a future reader
/// relying on it (e.g. `inline`, §4.H) does.
pub fn run_passes(tree: &mut Tree, diagnostics: &mut Diagnostics) {
  rewrite_variables(tree);
  link(tree);

  let (rules_count, left_recursion_diagnostics) = {
    let tree_ref: &Tree = tree;
    std::thread::scope(|scope| {
      let reachability = scope.spawn(|| compute_reachability(tree_ref));
      let left_recursion = scope.spawn(|| check_left_recursion(tree_ref));
      (
        reachability.join().expect("reachability pass panicked"),
        left_recursion.join().expect("left-recursion pass panicked"),
      )
    })
  };
  tree.rules_count = rules_count;
  diagnostics.extend(left_recursion_diagnostics);

  report_reference_diagnostics(tree, diagnostics);

  optimize_alternates(tree);
}

/// §6.4's "used but not defined" / "defined but not used" diagnostics:
/// a rule present in `rule_names` but absent from `rules_count` is
/// unreachable from the grammar root. A rule that was referenced but had
/// no definition anywhere in the grammar got a synthetic `Nil` body from
/// the linker (§4.D); `tree.undefined_rules` names exactly those, the
/// way the original tells the two apart by testing a rule's body for
/// `TypeNil` at emission time.
fn report_reference_diagnostics(tree: &Tree, diagnostics: &mut Diagnostics) {
  for name in &tree.rule_names {
    if !tree.rules_count.contains_key(name) {
      diagnostics.push(Diagnostic::UnusedRule { rule: name.clone() });
    }
  }
  for name in &tree.undefined_rules {
    diagnostics.push(Diagnostic::UndefinedReference { rule: name.clone() });
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ir::Builder;
  use crate::types::PegConfig;

  #[test]
  fn run_passes_populates_use_counts_and_flags_unused_rule() {
    let mut b = Builder::new(PegConfig::default());
    b.add_rule("S");
    b.add_character("x");
    b.add_expression().unwrap();
    b.add_rule("Unused");
    b.add_character("y");
    b.add_expression().unwrap();
    let mut tree = b.tree;

    let mut diagnostics = Diagnostics::new();
    run_passes(&mut tree, &mut diagnostics);

    assert!(!tree.rules_count.contains_key("Unused"));
    assert!(diagnostics
      .iter()
      .any(|d| matches!(d, Diagnostic::UnusedRule { rule } if rule == "Unused")));
  }

  #[test]
  fn run_passes_flags_undefined_reference() {
    let mut b = Builder::new(PegConfig::default());
    b.add_rule("S");
    b.add_name("Missing");
    b.add_expression().unwrap();
    let mut tree = b.tree;

    let mut diagnostics = Diagnostics::new();
    run_passes(&mut tree, &mut diagnostics);

    assert!(diagnostics
      .iter()
      .any(|d| matches!(d, Diagnostic::UndefinedReference { rule } if rule == "Missing")));
  }
}

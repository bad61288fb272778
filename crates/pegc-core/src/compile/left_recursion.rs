//! Component F: left-recursion detection (§4.F).
//!
//! A depth-first walk with a per-rule `reached` flag, set on entry and
//! cleared on exit, used purely to catch cycles on the current call
//! path (it is not a visited-once memo — the same rule can be re-walked
//! from a sibling path). Each call returns whether the sub-expression is
//! guaranteed to consume at least one input character.
//!
//! Pure with respect to `Tree`: takes `&Tree` and returns the
//! diagnostics it raised rather than writing into a passed-in sink, so
//! §5's fork-join can run this pass and reachability (§4.E) concurrently
//! over one shared immutable `&Tree` borrow.

use std::collections::HashSet;

use crate::diagnostics::Diagnostic;
use crate::ir::{NodeId, NodeKind, Tree};

pub fn check_left_recursion(tree: &Tree) -> Vec<Diagnostic> {
  let mut on_stack: HashSet<NodeId> = HashSet::new();
  let mut diagnostics = Vec::new();
  for rule_id in tree.declarations.clone() {
    consumes_rule(tree, rule_id, &mut on_stack, &mut diagnostics);
  }
  diagnostics
}

fn consumes_rule(
  tree: &Tree,
  rule_id: NodeId,
  on_stack: &mut HashSet<NodeId>,
  diagnostics: &mut Vec<Diagnostic>,
) -> bool {
  if on_stack.contains(&rule_id) {
    diagnostics.push(Diagnostic::PossibleLeftRecursion { rule: tree.arena[rule_id].text.clone() });
    return false;
  }
  on_stack.insert(rule_id);
  let body = tree.arena[rule_id].children[0];
  let rule_name = tree.arena[rule_id].text.clone();
  let result = consumes_expr(tree, body, on_stack, diagnostics, &rule_name);
  on_stack.remove(&rule_id);
  result
}

fn consumes_expr(
  tree: &Tree,
  id: NodeId,
  on_stack: &mut HashSet<NodeId>,
  diagnostics: &mut Vec<Diagnostic>,
  enclosing_rule: &str,
) -> bool {
  match tree.arena[id].kind {
    NodeKind::Alternate => tree.arena[id]
      .children
      .clone()
      .iter()
      .all(|&c| consumes_expr(tree, c, on_stack, diagnostics, enclosing_rule)),
    NodeKind::Sequence => tree.arena[id]
      .children
      .clone()
      .iter()
      .any(|&c| consumes_expr(tree, c, on_stack, diagnostics, enclosing_rule)),
    NodeKind::Name => {
      let name = tree.arena[id].text.clone();
      match tree.rules.get(&name).copied() {
        Some(rule_id) => consumes_rule(tree, rule_id, on_stack, diagnostics),
        None => false,
      }
    }
    NodeKind::Plus => {
      let child = tree.arena[id].children[0];
      let child_consumes = consumes_expr(tree, child, on_stack, diagnostics, enclosing_rule);
      if !child_consumes {
        diagnostics
          .push(Diagnostic::PossibleLeftRecursion { rule: enclosing_rule.to_string() });
      }
      child_consumes
    }
    NodeKind::Push | NodeKind::ImplicitPush => {
      let child = tree.arena[id].children[0];
      consumes_expr(tree, child, on_stack, diagnostics, enclosing_rule)
    }
    NodeKind::Character | NodeKind::String => !tree.arena[id].text.is_empty(),
    NodeKind::Dot | NodeKind::Range => true,
    _ => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::compile::link::link;
  use crate::ir::Builder;
  use crate::types::PegConfig;

  #[test]
  fn direct_left_recursion_is_reported() {
    let mut b = Builder::new(PegConfig::default());
    b.add_rule("L");
    b.add_name("L");
    b.add_character("x");
    b.add_sequence().unwrap();
    b.add_character("x");
    b.add_alternate().unwrap();
    b.add_expression().unwrap();
    let mut tree = b.tree;
    link(&mut tree);

    let diags = check_left_recursion(&tree);
    assert!(diags
      .iter()
      .any(|d| matches!(d, Diagnostic::PossibleLeftRecursion { rule } if rule == "L")));
  }

  #[test]
  fn non_left_recursive_rule_is_silent() {
    let mut b = Builder::new(PegConfig::default());
    b.add_rule("S");
    b.add_character("x");
    b.add_expression().unwrap();
    let mut tree = b.tree;
    link(&mut tree);

    let diags = check_left_recursion(&tree);
    assert!(diags.is_empty());
  }

  #[test]
  fn plus_of_non_consuming_expression_is_flagged() {
    let mut b = Builder::new(PegConfig::default());
    b.add_rule("S");
    b.add_nil();
    b.add_plus().unwrap();
    b.add_expression().unwrap();
    let mut tree = b.tree;
    link(&mut tree);

    let diags = check_left_recursion(&tree);
    assert!(!diags.is_empty());
  }
}

//! Component E: reachability and use counting (§4.E).
//!
//! The original tool starts from the first entry in the top-level
//! declaration list and treats it as the grammar root; per the Design
//! Notes this is flagged as a positional assumption re-implementations
//! should make explicit, but this build preserves the existing behavior
//! (see DESIGN.md).
//!
//! Pure with respect to `Tree`: takes `&Tree` and returns the computed
//! use-count map rather than writing into `tree.rules_count` in place.
//! This is what lets §5's fork-join run this pass and the left-recursion
//! pass concurrently over one shared immutable `&Tree` borrow (see
//! `compile::run_passes`).

use std::collections::{HashMap, HashSet};

use crate::ir::{NodeId, NodeKind, Tree};

pub fn compute_reachability(tree: &Tree) -> HashMap<String, u32> {
  let mut rules_count = HashMap::new();
  let mut reached: HashSet<NodeId> = HashSet::new();
  if let Some(&root) = tree.declarations.first() {
    walk_rule(tree, root, &mut reached, &mut rules_count);
  }
  rules_count
}

/// Increments the visited rule's own use count on every visit (even a
/// repeat visit through a later `Name`), then descends into its body
/// only the first time it is reached — matching the original's
/// `countRules` `TypeRule` case, where the increment happens before the
/// `ruleReached` guard. This is also how the grammar root accumulates a
/// count of its own: the very first call is made directly on the root
/// rule node, not on one of its references.
fn walk_rule(
  tree: &Tree,
  rule_id: NodeId,
  reached: &mut HashSet<NodeId>,
  rules_count: &mut HashMap<String, u32>,
) {
  let name = tree.arena[rule_id].text.clone();
  *rules_count.entry(name).or_insert(0) += 1;
  if !reached.insert(rule_id) {
    return;
  }
  let body = tree.arena[rule_id].children[0];
  walk_expr(tree, body, reached, rules_count);
}

fn walk_expr(
  tree: &Tree,
  id: NodeId,
  reached: &mut HashSet<NodeId>,
  rules_count: &mut HashMap<String, u32>,
) {
  match tree.arena[id].kind {
    NodeKind::Sequence | NodeKind::Alternate | NodeKind::UnorderedAlternate => {
      for child in tree.arena[id].children.clone() {
        walk_expr(tree, child, reached, rules_count);
      }
    }
    NodeKind::PeekFor
    | NodeKind::PeekNot
    | NodeKind::Query
    | NodeKind::Star
    | NodeKind::Plus
    | NodeKind::Push
    | NodeKind::ImplicitPush => {
      // The rule-copy trailing child of an ImplicitPush is inert label
      // data, never traversed.
      if let Some(&child) = tree.arena[id].children.first() {
        walk_expr(tree, child, reached, rules_count);
      }
    }
    NodeKind::Name => {
      let name = tree.arena[id].text.clone();
      if let Some(&referenced) = tree.rules.get(&name) {
        walk_rule(tree, referenced, reached, rules_count);
      }
    }
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::compile::link::link;
  use crate::ir::Builder;
  use crate::types::PegConfig;

  #[test]
  fn reachable_rule_has_use_count() {
    let mut b = Builder::new(PegConfig::default());
    b.add_rule("S");
    b.add_name("T");
    b.add_expression().unwrap();
    b.add_rule("T");
    b.add_character("x");
    b.add_expression().unwrap();
    let mut tree = b.tree;
    link(&mut tree);
    let rules_count = compute_reachability(&tree);

    assert_eq!(*rules_count.get("T").unwrap(), 1);
  }

  #[test]
  fn root_rule_counts_itself() {
    let mut b = Builder::new(PegConfig::default());
    b.add_rule("S");
    b.add_character("x");
    b.add_expression().unwrap();
    let mut tree = b.tree;
    link(&mut tree);
    let rules_count = compute_reachability(&tree);

    assert_eq!(*rules_count.get("S").unwrap(), 1);
  }

  #[test]
  fn unreachable_rule_absent_from_use_counts() {
    let mut b = Builder::new(PegConfig::default());
    b.add_rule("S");
    b.add_character("x");
    b.add_expression().unwrap();
    b.add_rule("Unused");
    b.add_character("y");
    b.add_expression().unwrap();
    let mut tree = b.tree;
    link(&mut tree);
    let rules_count = compute_reachability(&tree);

    assert!(!rules_count.contains_key("Unused"));
  }
}

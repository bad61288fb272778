//! Component D: the linker (§4.D). Two sub-passes over the top-level
//! declaration list.
//!
//! The first pass registers every user rule and wraps its expression in
//! an `ImplicitPush` (§3 invariant: every `Rule`'s sole child is an
//! `ImplicitPush` whose first child is the user expression and whose
//! second is a copy of the rule node). Header metadata extraction
//! (`Package`→`PackageName`, `Leg`→`StructName`/`StructVariables`) has
//! already happened at the builder layer (§6.1: headers are routed to
//! tree fields directly), so this pass only has to do the
//! registration/wrapping half of what §4.D describes.
//!
//! The second pass, `link`, walks each rule's (now-wrapped) body and
//! creates synthetic rules for actions, captures, and forward references.

use crate::ir::{NodeId, NodeKind, Tree};

pub fn link(tree: &mut Tree) {
  let rule_ids: Vec<NodeId> = tree.declarations.clone();

  for &rule_id in &rule_ids {
    let name = tree.arena[rule_id].text.clone();
    tree.rules.entry(name).or_insert(rule_id);
    wrap_implicit_push(tree, rule_id);
  }

  for rule_id in rule_ids {
    let body = tree.arena[rule_id].children[0];
    link_node(tree, body, rule_id);
  }
}

fn wrap_implicit_push(tree: &mut Tree, rule_id: NodeId) {
  let expr = tree.arena[rule_id].children[0];
  let rule_copy = tree.arena.clone_node(rule_id);
  let implicit_push = tree.arena.alloc(NodeKind::ImplicitPush);
  tree.arena[implicit_push].children = vec![expr, rule_copy];
  tree.arena[rule_id].children = vec![implicit_push];
}

/// Creates a synthetic rule `name <- <nil>` if `name` is not already
/// registered, wrapping it the same way a user rule would be. Returns
/// whether the rule was newly created, so callers can tell a fresh
/// synthetic binding apart from one that already existed.
fn ensure_empty_rule(tree: &mut Tree, name: &str) -> (NodeId, bool) {
  if let Some(&existing) = tree.rules.get(name) {
    return (existing, false);
  }
  let nil = tree.arena.alloc(NodeKind::Nil);
  let rule_id = tree.arena.alloc(NodeKind::Rule);
  tree.arena[rule_id].text = name.to_string();
  tree.arena[rule_id].id = tree.alloc_rule_id();
  tree.arena[rule_id].children = vec![nil];
  wrap_implicit_push(tree, rule_id);
  tree.rules.insert(name.to_string(), rule_id);
  tree.rule_names.push(name.to_string());
  tree.declarations.push(rule_id);
  (rule_id, true)
}

fn link_node(tree: &mut Tree, id: NodeId, enclosing_rule: NodeId) {
  match tree.arena[id].kind {
    NodeKind::Sequence | NodeKind::Alternate | NodeKind::UnorderedAlternate => {
      for child in tree.arena[id].children.clone() {
        link_node(tree, child, enclosing_rule);
      }
    }
    NodeKind::PeekFor | NodeKind::PeekNot | NodeKind::Query | NodeKind::Star | NodeKind::Plus => {
      if let Some(&child) = tree.arena[id].children.first() {
        link_node(tree, child, enclosing_rule);
      }
    }
    NodeKind::ImplicitPush => {
      // Only the user-expression child is live IR; the trailing
      // rule-copy is inert data for the emitter, never re-linked.
      if let Some(&child) = tree.arena[id].children.first() {
        link_node(tree, child, enclosing_rule);
      }
    }
    NodeKind::Push => {
      ensure_empty_rule(tree, "PegText");
      // `ensure_empty_rule` is a conservative stand-in for "PegText is
      // created once": it's a no-op on every call after the first since
      // it checks `tree.rules` first. PegText is a legitimate capture
      // marker, never an undefined reference, so its creation flag is
      // discarded here.
      let original_child = tree.arena[id].children[0];
      let rule_copy = tree.arena.clone_node(enclosing_rule);
      let implicit_push = tree.arena.alloc(NodeKind::ImplicitPush);
      tree.arena[implicit_push].children = vec![original_child, rule_copy];
      tree.arena[id].children = vec![implicit_push];
      link_node(tree, original_child, enclosing_rule);
    }
    NodeKind::Name => {
      let name = tree.arena[id].text.clone();
      let (_, created) = ensure_empty_rule(tree, &name);
      if created {
        tree.undefined_rules.push(name);
      }
    }
    NodeKind::Action => {
      let action_id = tree.next_action_id();
      let action_copy_for_table = tree.arena.clone_node(id);
      tree.actions.push(action_copy_for_table);

      let synthetic_name = format!("Action{action_id}");
      tree.arena[id].kind = NodeKind::Name;
      tree.arena[id].text = synthetic_name.clone();
      tree.arena[id].children.clear();

      let action_copy_for_body = tree.arena.clone_node(action_copy_for_table);
      let rule_id = tree.arena.alloc(NodeKind::Rule);
      tree.arena[rule_id].text = synthetic_name.clone();
      tree.arena[rule_id].id = tree.alloc_rule_id();
      let rule_copy = tree.arena.clone_node(rule_id);
      let implicit_push = tree.arena.alloc(NodeKind::ImplicitPush);
      tree.arena[implicit_push].children = vec![action_copy_for_body, rule_copy];
      tree.arena[rule_id].children = vec![implicit_push];

      tree.rules.insert(synthetic_name.clone(), rule_id);
      tree.rule_names.push(synthetic_name);
      tree.declarations.push(rule_id);
    }
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ir::Builder;
  use crate::types::PegConfig;

  #[test]
  fn every_rule_gets_implicit_push_wrapper() {
    let mut b = Builder::new(PegConfig::default());
    b.add_rule("S");
    b.add_character("x");
    b.add_expression().unwrap();
    let mut tree = b.tree;
    link(&mut tree);

    let rule = tree.declarations[0];
    let top = tree.arena[rule].children[0];
    assert_eq!(tree.arena[top].kind, NodeKind::ImplicitPush);
    let rule_copy = tree.arena[top].children[1];
    assert_eq!(tree.arena[rule_copy].text, "S");
  }

  #[test]
  fn undefined_name_creates_synthetic_empty_rule() {
    let mut b = Builder::new(PegConfig::default());
    b.add_rule("S");
    b.add_name("Undefined");
    b.add_expression().unwrap();
    let mut tree = b.tree;
    link(&mut tree);

    assert!(tree.rules.contains_key("Undefined"));
    let synthetic = tree.rules["Undefined"];
    let push_wrapper = tree.arena[synthetic].children[0];
    let expr = tree.arena[push_wrapper].children[0];
    assert_eq!(tree.arena[expr].kind, NodeKind::Nil);
    assert_eq!(tree.undefined_rules, vec!["Undefined".to_string()]);
  }

  #[test]
  fn peg_text_synthetic_rule_is_not_flagged_undefined() {
    let mut b = Builder::new(PegConfig::default());
    b.add_rule("S");
    b.add_character("x");
    b.add_push().unwrap();
    b.add_expression().unwrap();
    let mut tree = b.tree;
    link(&mut tree);

    assert!(tree.rules.contains_key("PegText"));
    assert!(!tree.undefined_rules.iter().any(|r| r == "PegText"));
  }

  #[test]
  fn action_becomes_name_reference_to_synthetic_rule() {
    let mut b = Builder::new(PegConfig::default());
    b.add_rule("A");
    b.add_character("a");
    b.add_action("$$ = 1");
    b.add_sequence().unwrap();
    b.add_expression().unwrap();
    let mut tree = b.tree;
    link(&mut tree);

    assert!(tree.rules.contains_key("Action0"));
    assert_eq!(tree.actions.len(), 1);

    let rule = tree.declarations[0];
    let push_wrapper = tree.arena[rule].children[0];
    let seq = tree.arena[push_wrapper].children[0];
    let action_ref = tree.arena[seq].children[1];
    assert_eq!(tree.arena[action_ref].kind, NodeKind::Name);
    assert_eq!(tree.arena[action_ref].text, "Action0");
  }

  #[test]
  fn push_creates_peg_text_rule_once() {
    let mut b = Builder::new(PegConfig::default());
    b.add_rule("S");
    b.add_character("x");
    b.add_push().unwrap();
    b.add_character("y");
    b.add_push().unwrap();
    b.add_sequence().unwrap();
    b.add_expression().unwrap();
    let mut tree = b.tree;
    link(&mut tree);

    assert!(tree.rules.contains_key("PegText"));
    assert_eq!(tree.rule_names.iter().filter(|n| n.as_str() == "PegText").count(), 1);
  }
}

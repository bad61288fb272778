//! Component G: the alternate optimizer (§4.G), active only when
//! `tree.config.switch` is set.
//!
//! Computes `(consumes, first)` over 256 byte values for every
//! sub-expression and, on alternatives whose children have pairwise
//! disjoint FIRST sets, rewrites the ordered `Alternate` into a
//! switch-dispatched `UnorderedAlternate` in place.
//!
//! The pass runs twice with a fresh cache each time: the first pass
//! exists purely to populate best-effort FIRST sets for every rule so
//! mutually-referencing rules resolve to something other than "unknown"
//! on the second pass, which performs the actual rewriting (Design
//! Notes: "re-implementations should make this explicit by splitting the
//! pass into an analysis traversal and a distinct rewrite traversal" —
//! here both traversals share one function, gated by `rewrite: bool`,
//! which is the direct translation of the original's `firstPass` guard).

use std::collections::HashMap;

use crate::ir::{CharSet, NodeId, NodeKind, Tree};
use crate::types::PegConfig;

#[derive(Debug, Clone, Copy)]
struct RuleFirst {
  consumes: bool,
  first: CharSet,
}

/// `None` while a rule is on the current call stack (cyclic re-entry);
/// `Some` once its body has been fully analyzed.
type Cache = HashMap<NodeId, Option<RuleFirst>>;

pub fn optimize_alternates(tree: &mut Tree) {
  if !tree.config.switch {
    return;
  }

  let mut first_pass_cache: Cache = HashMap::new();
  for rule_id in tree.declarations.clone() {
    analyze_rule(tree, rule_id, &mut first_pass_cache, false);
  }

  let mut second_pass_cache: Cache = HashMap::new();
  for rule_id in tree.declarations.clone() {
    analyze_rule(tree, rule_id, &mut second_pass_cache, true);
  }
}

fn analyze_rule(tree: &mut Tree, rule_id: NodeId, cache: &mut Cache, rewrite: bool) -> RuleFirst {
  let body = tree.arena[rule_id].children[0];
  let result = analyze_expr(tree, body, cache, rewrite);
  cache.insert(rule_id, Some(result));
  result
}

/// Memoized lookup used by `Name`/`Rule` references: unlike
/// `analyze_rule`, this respects an existing cache entry instead of
/// always re-descending, and treats cyclic re-entry as "unknown" (empty,
/// non-consuming) rather than recursing forever.
fn rule_first(tree: &mut Tree, rule_id: NodeId, cache: &mut Cache, rewrite: bool) -> RuleFirst {
  match cache.get(&rule_id) {
    Some(Some(cached)) => return *cached,
    Some(None) => return RuleFirst { consumes: false, first: CharSet::new() },
    None => {}
  }
  cache.insert(rule_id, None);
  analyze_rule(tree, rule_id, cache, rewrite)
}

fn analyze_expr(tree: &mut Tree, id: NodeId, cache: &mut Cache, rewrite: bool) -> RuleFirst {
  match tree.arena[id].kind {
    NodeKind::Dot => RuleFirst {
      consumes: true,
      first: CharSet::single(PegConfig::END_SYMBOL as u8).complement(),
    },
    NodeKind::Character | NodeKind::String => {
      let text = tree.arena[id].text.clone();
      match text.as_bytes().first() {
        Some(&b) => RuleFirst { consumes: true, first: CharSet::single(b) },
        None => RuleFirst { consumes: false, first: CharSet::new() },
      }
    }
    NodeKind::Range => {
      let lo = tree.arena[tree.arena[id].children[0]].text.as_bytes().first().copied().unwrap_or(0);
      let hi = tree.arena[tree.arena[id].children[1]].text.as_bytes().first().copied().unwrap_or(0);
      RuleFirst { consumes: true, first: CharSet::range(lo, hi) }
    }
    NodeKind::Name => {
      let name = tree.arena[id].text.clone();
      match tree.rules.get(&name).copied() {
        Some(rule_id) => rule_first(tree, rule_id, cache, rewrite),
        None => RuleFirst { consumes: false, first: CharSet::new() },
      }
    }
    NodeKind::Alternate => analyze_alternate(tree, id, cache, rewrite),
    NodeKind::UnorderedAlternate => {
      // Already rewritten (e.g. re-analysis in the second pass touching
      // a node the first pass rewrote). Treat like an ordinary
      // alternate for FIRST-set purposes without rewriting again.
      let mut consumes_all = true;
      let mut first = CharSet::new();
      for child in tree.arena[id].children.clone() {
        let r = analyze_expr(tree, child, cache, false);
        consumes_all &= r.consumes;
        first.union(&r.first);
      }
      RuleFirst { consumes: consumes_all, first }
    }
    NodeKind::Sequence => analyze_sequence(tree, id, cache, rewrite),
    NodeKind::PeekFor | NodeKind::PeekNot => {
      if let Some(&child) = tree.arena[id].children.first() {
        analyze_expr(tree, child, cache, rewrite);
      }
      RuleFirst { consumes: false, first: CharSet::new() }
    }
    NodeKind::Query | NodeKind::Star => {
      let child = tree.arena[id].children[0];
      let r = analyze_expr(tree, child, cache, rewrite);
      RuleFirst { consumes: false, first: r.first }
    }
    NodeKind::Plus | NodeKind::Push | NodeKind::ImplicitPush => {
      let child = tree.arena[id].children[0];
      analyze_expr(tree, child, cache, rewrite)
    }
    _ => RuleFirst { consumes: false, first: CharSet::new() },
  }
}

fn analyze_sequence(tree: &mut Tree, id: NodeId, cache: &mut Cache, rewrite: bool) -> RuleFirst {
  let children = tree.arena[id].children.clone();
  let mut first = CharSet::new();
  let mut consumes = false;
  let mut stopped = false;
  for child in &children {
    let r = analyze_expr(tree, *child, cache, rewrite);
    if !stopped {
      first.union(&r.first);
      if r.consumes {
        consumes = true;
        stopped = true;
      }
    }
  }
  RuleFirst { consumes, first }
}

fn analyze_alternate(tree: &mut Tree, id: NodeId, cache: &mut Cache, rewrite: bool) -> RuleFirst {
  let children = tree.arena[id].children.clone();
  let mut child_results = Vec::with_capacity(children.len());
  let mut consumes_all = true;
  let mut union_first = CharSet::new();
  for &child in &children {
    let r = analyze_expr(tree, child, cache, rewrite);
    consumes_all &= r.consumes;
    union_first.union(&r.first);
    child_results.push(r);
  }

  if rewrite {
    rewrite_if_disjoint(tree, id, &children, &child_results);
  }

  RuleFirst { consumes: consumes_all, first: union_first }
}

fn rewrite_if_disjoint(
  tree: &mut Tree,
  alt_id: NodeId,
  children: &[NodeId],
  results: &[RuleFirst],
) {
  let n = children.len();
  let intersecting: Vec<bool> = (0..n)
    .map(|i| (0..n).any(|j| j != i && results[i].first.intersects(&results[j].first)))
    .collect();

  let non_intersecting: Vec<usize> = (0..n).filter(|&i| !intersecting[i]).collect();
  if non_intersecting.is_empty() {
    return;
  }
  let intersecting_idx: Vec<usize> = (0..n).filter(|&i| intersecting[i]).collect();

  // Build Sequence(PeekFor(class), original_expr) per non-colliding
  // alternative, tagging a Nil-bodied one (the grammar's catch-all
  // branch) so it sorts last as the switch default.
  let mut nil_bodied: Option<(NodeId, CharSet)> = None;
  let mut sequences: Vec<(NodeId, CharSet)> = Vec::new();

  for &i in &non_intersecting {
    let expr = children[i];
    let set = results[i].first;
    let class_leaf = tree.arena.alloc(NodeKind::Nil);
    tree.arena[class_leaf].char_class = Some(set);
    let peek = tree.arena.alloc(NodeKind::PeekFor);
    tree.arena[peek].children = vec![class_leaf];
    let seq = tree.arena.alloc(NodeKind::Sequence);
    tree.arena[seq].children = vec![peek, expr];

    if tree.arena[expr].kind == NodeKind::Nil {
      nil_bodied = Some((seq, set));
    } else {
      sequences.push((seq, set));
    }
  }

  // Largest FIRST set sorts last.
  sequences.sort_by_key(|(_, set)| set.len());

  let mut ordered: Vec<NodeId> = sequences.into_iter().map(|(id, _)| id).collect();

  if !intersecting_idx.is_empty() {
    let sibling = tree.arena.alloc(NodeKind::Alternate);
    tree.arena[sibling].children = intersecting_idx.iter().map(|&i| children[i]).collect();
    ordered.push(sibling);
  }

  if let Some((seq, _)) = nil_bodied {
    ordered.push(seq);
  }

  tree.arena[alt_id].kind = NodeKind::UnorderedAlternate;
  tree.arena[alt_id].children = ordered;
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::compile::link::link;
  use crate::ir::Builder;

  fn config_switch() -> PegConfig {
    PegConfig { switch: true, ..PegConfig::default() }
  }

  #[test]
  fn disjoint_alternatives_become_unordered() {
    let mut b = Builder::new(config_switch());
    b.add_rule("S");
    b.add_character("a");
    b.add_character("b");
    b.add_alternate().unwrap();
    b.add_expression().unwrap();
    let mut tree = b.tree;
    link(&mut tree);
    optimize_alternates(&mut tree);

    let rule = tree.declarations[0];
    let push = tree.arena[rule].children[0];
    let expr = tree.arena[push].children[0];
    assert_eq!(tree.arena[expr].kind, NodeKind::UnorderedAlternate);
  }

  #[test]
  fn intersecting_alternatives_stay_ordered() {
    let mut b = Builder::new(config_switch());
    b.add_rule("S");
    // 'a' / 'a' 'b'
    b.add_character("a");
    b.add_character("a");
    b.add_character("b");
    b.add_sequence().unwrap();
    b.add_alternate().unwrap();
    b.add_expression().unwrap();
    let mut tree = b.tree;
    link(&mut tree);
    optimize_alternates(&mut tree);

    let rule = tree.declarations[0];
    let push = tree.arena[rule].children[0];
    let expr = tree.arena[push].children[0];
    assert_eq!(tree.arena[expr].kind, NodeKind::Alternate);
  }

  #[test]
  fn switch_disabled_leaves_alternate_untouched() {
    let mut b = Builder::new(PegConfig::default());
    b.add_rule("S");
    b.add_character("a");
    b.add_character("b");
    b.add_alternate().unwrap();
    b.add_expression().unwrap();
    let mut tree = b.tree;
    link(&mut tree);
    optimize_alternates(&mut tree);

    let rule = tree.declarations[0];
    let push = tree.arena[rule].children[0];
    let expr = tree.arena[push].children[0];
    assert_eq!(tree.arena[expr].kind, NodeKind::Alternate);
  }
}

//! Component C: variable-scope resolution and action-body rewriting
//! (§4.C). Runs before linking, directly over each top-level rule's raw
//! expression tree (the `ImplicitPush` wrapper from §4.D has not been
//! added yet).

use regex::Regex;

use crate::ir::{NodeId, NodeKind, Tree};

pub fn rewrite_variables(tree: &mut Tree) {
  let yy_type = tree.yy_stype.clone().unwrap_or_else(|| "YYSTYPE".to_string());
  let ident_re = Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").expect("static regex");

  let rule_ids: Vec<NodeId> = tree.declarations.clone();
  for rule_id in rule_ids {
    let Some(&expr) = tree.arena[rule_id].children.first() else { continue };

    let mut scope: Vec<String> = Vec::new();
    let mut count: i32 = 0;
    let mut has_yy = false;
    count_pass(tree, expr, &mut scope, &mut count, &mut has_yy, &yy_type);

    // `scope` is now the complete, final variable stack for this rule.
    // The original resets `var_stack` once before both traversals and
    // never clears it between them (leg.go:1024-1028), so the bind pass
    // computes depths against the same, fully-built stack the count pass
    // left behind rather than rebuilding a second one incrementally —
    // otherwise the capture depth recorded on each `Name` (used by
    // `capture_variable` at codegen time) and the depth substituted into
    // an action body can disagree once a rule binds more than one
    // variable, swapping values at runtime.
    bind_pass(tree, expr, &scope, &ident_re);

    let rule = &mut tree.arena[rule_id];
    rule.has_variable = count;
    rule.has_yy = has_yy;
    if count > 0 {
      tree.has_variable = true;
    }
  }
}

fn children_of(tree: &Tree, id: NodeId) -> Vec<NodeId> {
  tree.arena[id].children.clone()
}

/// `traverse_var_cnt`: pushes newly bound variable names onto `scope`,
/// counts distinct bindings, and rewrites `$$`/`YYSTYPE` in action
/// bodies in place.
fn count_pass(
  tree: &mut Tree,
  id: NodeId,
  scope: &mut Vec<String>,
  count: &mut i32,
  has_yy: &mut bool,
  yy_type: &str,
) {
  match tree.arena[id].kind {
    NodeKind::Sequence | NodeKind::Alternate | NodeKind::UnorderedAlternate => {
      for child in children_of(tree, id) {
        count_pass(tree, child, scope, count, has_yy, yy_type);
      }
    }
    NodeKind::PeekFor
    | NodeKind::PeekNot
    | NodeKind::Query
    | NodeKind::Star
    | NodeKind::Plus
    | NodeKind::Push
    | NodeKind::ImplicitPush => {
      if let Some(&child) = tree.arena[id].children.first() {
        count_pass(tree, child, scope, count, has_yy, yy_type);
      }
    }
    NodeKind::Name => {
      if let Some(&child) = tree.arena[id].children.first() {
        if tree.arena[child].kind == NodeKind::Variable {
          let name = tree.arena[child].text.clone();
          if !scope.contains(&name) {
            scope.push(name);
            *count += 1;
          }
        }
      }
    }
    NodeKind::Action => {
      let node = &mut tree.arena[id];
      if node.text.contains("$$") {
        *has_yy = true;
      }
      node.text = node.text.replace("$$", "yy").replace("YYSTYPE", yy_type);
    }
    _ => {}
  }
}

/// `traverse_var_replace`: same traversal shape as `count_pass`, over the
/// same, already-complete `scope` it built — recording each bound
/// `Name`'s stack-relative depth and rewriting action-body identifiers
/// that refer to an in-scope variable, both computed as `len(scope) -
/// idx - 1` against that one fixed stack, so a capture depth and the
/// action-body index that reads it always agree.
fn bind_pass(tree: &mut Tree, id: NodeId, scope: &[String], ident_re: &Regex) {
  match tree.arena[id].kind {
    NodeKind::Sequence | NodeKind::Alternate | NodeKind::UnorderedAlternate => {
      for child in children_of(tree, id) {
        bind_pass(tree, child, scope, ident_re);
      }
    }
    NodeKind::PeekFor
    | NodeKind::PeekNot
    | NodeKind::Query
    | NodeKind::Star
    | NodeKind::Plus
    | NodeKind::Push
    | NodeKind::ImplicitPush => {
      if let Some(&child) = tree.arena[id].children.first() {
        bind_pass(tree, child, scope, ident_re);
      }
    }
    NodeKind::Name => {
      if let Some(&child) = tree.arena[id].children.first() {
        if tree.arena[child].kind == NodeKind::Variable {
          let name = tree.arena[child].text.clone();
          if let Some(idx) = scope.iter().position(|s| s == &name) {
            let depth = scope.len() - idx - 1;
            tree.arena[id].has_variable = depth as i32;
          }
        }
      }
    }
    NodeKind::Action => {
      let body = tree.arena[id].text.clone();
      let rewritten = ident_re.replace_all(&body, |caps: &regex::Captures| {
        let ident = &caps[0];
        match scope.iter().position(|s| s == ident) {
          Some(idx) => {
            let depth = scope.len() - idx - 1;
            format!("stack[stack_idx-{depth}]")
          }
          None => ident.to_string(),
        }
      });
      tree.arena[id].text = rewritten.into_owned();
    }
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ir::Builder;
  use crate::types::PegConfig;

  fn build_rule(body: impl FnOnce(&mut Builder)) -> Tree {
    let mut b = Builder::new(PegConfig::default());
    b.add_rule("R");
    body(&mut b);
    b.add_expression().unwrap();
    b.tree
  }

  #[test]
  fn action_dollar_dollar_and_yystype_are_substituted() {
    let mut tree = build_rule(|b| {
      b.add_character("a");
      b.add_action("$$ = 1; var x YYSTYPE");
      b.add_sequence().unwrap();
    });
    rewrite_variables(&mut tree);
    let rule = tree.declarations[0];
    let expr = tree.arena[rule].children[0];
    let action = tree.arena[expr].children[1];
    let text = &tree.arena[action].text;
    assert!(!text.contains("$$"));
    assert!(!text.contains("YYSTYPE"));
    assert!(text.contains("yy = 1"));
    assert_eq!(tree.arena[rule].has_yy, true);
  }

  #[test]
  fn bound_identifier_is_rewritten_to_stack_access() {
    let mut tree = build_rule(|b| {
      b.add_variable("n");
      b.add_name("N");
      b.add_action("printf(\"%d\", n)");
      b.add_sequence().unwrap();
    });
    rewrite_variables(&mut tree);
    let rule = tree.declarations[0];
    let expr = tree.arena[rule].children[0];
    let action = tree.arena[expr].children[1];
    let text = &tree.arena[action].text;
    assert!(text.contains("stack[stack_idx-0]"));
    assert_eq!(tree.arena[rule].has_variable, 1);
  }

  #[test]
  fn two_bound_identifiers_keep_capture_depth_and_stack_index_in_sync() {
    let mut tree = build_rule(|b| {
      b.add_variable("n");
      b.add_name("N");
      b.add_variable("m");
      b.add_name("M");
      b.add_action("printf(\"%d %d\", n, m)");
      b.add_sequence().unwrap();
    });
    rewrite_variables(&mut tree);
    let rule = tree.declarations[0];
    let expr = tree.arena[rule].children[0];
    let children = &tree.arena[expr].children;
    let name_n = children[0];
    let name_m = children[1];
    let action = children[2];
    let text = &tree.arena[action].text;

    let depth_n = tree.arena[name_n].has_variable;
    let depth_m = tree.arena[name_m].has_variable;
    assert_eq!(depth_n, 1, "first-bound variable sits deeper on the stack");
    assert_eq!(depth_m, 0, "second-bound variable sits on top");
    assert!(text.contains(&format!("stack[stack_idx-{depth_n}]")));
    assert!(text.contains(&format!("stack[stack_idx-{depth_m}]")));
    assert_eq!(tree.arena[rule].has_variable, 2);
  }
}

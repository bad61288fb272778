//! Component H: the recursive emitter (§4.H).
//!
//! Every combinator compiles to a Rust **block expression** of type
//! `bool`: `{ <statements>; <trailing bool> }`. Sequencing is ordinary
//! Rust `&&`/`||` short-circuiting and `if`/`else`/`loop`, not a
//! goto/label translation — see `labels.rs` and DESIGN.md for why the
//! original's `goto`-based control flow collapses into structured Rust
//! control flow here instead of literal labeled blocks.
//!
//! `ko`/"jump to the failure label" in the original's terms is, in this
//! translation, simply "this block expression evaluates to `false`";
//! callers (`Sequence`, `Alternate`, rule bodies) decide what to do with
//! that boolean the same way the original's label would have.

use crate::ir::{CharSet, NodeId, NodeKind, Tree};
use crate::types::PegConfig;

pub struct EmitCtx<'a> {
  pub tree: &'a Tree,
  pub config: &'a PegConfig,
}

/// Renders a single character literal for use in generated source,
/// escaping the handful of characters Rust char literals care about.
fn char_lit(c: char) -> String {
  match c {
    '\'' => "'\\''".to_string(),
    '\\' => "'\\\\'".to_string(),
    '\n' => "'\\n'".to_string(),
    '\t' => "'\\t'".to_string(),
    '\r' => "'\\r'".to_string(),
    _ => format!("'{c}'"),
  }
}

fn str_lit(s: &str) -> String {
  format!("{:?}", s)
}

fn first_char(text: &str) -> char {
  text.chars().next().unwrap_or('\0')
}

/// Renders a `CharSet` as a Rust OR-pattern of byte literals, e.g.
/// `0x61 | 0x41`, suitable for a `match` arm guard.
fn charset_pattern(set: &CharSet) -> String {
  let bytes: Vec<String> = set.iter_bytes().map(|b| format!("0x{b:02x}")).collect();
  if bytes.is_empty() {
    "_never_matches_".to_string()
  } else {
    bytes.join(" | ")
  }
}

/// Compiles a node to a boolean Rust block-expression string.
pub fn compile_expr(ctx: &EmitCtx, id: NodeId) -> String {
  let tree = ctx.tree;
  match tree.arena[id].kind {
    NodeKind::Dot => "self.match_dot()".to_string(),
    NodeKind::Character => {
      let c = first_char(&tree.arena[id].text);
      format!("self.match_char({})", char_lit(c))
    }
    NodeKind::String => format!("self.match_string({})", str_lit(&tree.arena[id].text)),
    NodeKind::Range => {
      let lo = first_char(&tree.arena[tree.arena[id].children[0]].text);
      let hi = first_char(&tree.arena[tree.arena[id].children[1]].text);
      format!("self.match_range({}, {})", char_lit(lo), char_lit(hi))
    }
    NodeKind::Predicate => format!("({})", tree.arena[id].text),
    NodeKind::Commit | NodeKind::Nil => "true".to_string(),
    NodeKind::Action => "true".to_string(),
    NodeKind::Variable => "true".to_string(),
    NodeKind::Name => compile_name(ctx, id),
    NodeKind::Sequence => compile_sequence(ctx, id),
    NodeKind::Alternate => compile_alternate(ctx, &tree.arena[id].children),
    NodeKind::UnorderedAlternate => compile_unordered_alternate(ctx, id),
    NodeKind::PeekFor => {
      let child = tree.arena[id].children[0];
      let inner = compile_expr(ctx, child);
      format!("{{ let __save = self.position; let __ok = {inner}; self.position = __save; __ok }}")
    }
    NodeKind::PeekNot => {
      let child = tree.arena[id].children[0];
      let inner = compile_expr(ctx, child);
      format!("{{ let __save = self.position; let __ok = {inner}; self.position = __save; !__ok }}")
    }
    NodeKind::Query => {
      let child = tree.arena[id].children[0];
      let inner = compile_expr(ctx, child);
      format!("{{ let __save = self.position; if !({inner}) {{ self.position = __save; }} true }}")
    }
    NodeKind::Star => {
      let child = tree.arena[id].children[0];
      let inner = compile_expr(ctx, child);
      format!(
        "{{ loop {{ let __save = self.position; if !({inner}) {{ self.position = __save; break; }} }} true }}"
      )
    }
    NodeKind::Plus => {
      let child = tree.arena[id].children[0];
      let inner = compile_expr(ctx, child);
      format!(
        "{{ if !({inner}) {{ false }} else {{ loop {{ let __save = self.position; if !({inner}) {{ self.position = __save; break; }} }} true }} }}"
      )
    }
    NodeKind::Push => {
      // D always gives Push a single ImplicitPush child; delegate.
      let child = tree.arena[id].children[0];
      compile_expr(ctx, child)
    }
    NodeKind::ImplicitPush => compile_implicit_push(ctx, id),
    NodeKind::Rule | NodeKind::Package | NodeKind::State | NodeKind::Leg => "true".to_string(),
  }
}

fn compile_name(ctx: &EmitCtx, id: NodeId) -> String {
  let tree = ctx.tree;
  let name = tree.arena[id].text.clone();
  let depth_binding = tree.arena[id].children.first().and_then(|&c| {
    if tree.arena[c].kind == NodeKind::Variable {
      Some(tree.arena[id].has_variable)
    } else {
      None
    }
  });

  let call = if tree.undefined_rules.iter().any(|r| r == &name) {
    // Same failing slot `write_rule_methods` emits for this rule's own
    // body; the inline path must not bypass it by inlining the `Nil`
    // body as `true`.
    "false".to_string()
  } else if ctx.config.inline
    && tree.rules_count.get(&name).copied().unwrap_or(0) == 1
    && tree.rules.contains_key(&name)
  {
    let rule_id = tree.rules[&name];
    let body = tree.arena[rule_id].children[0];
    format!("({})", compile_expr(ctx, body))
  } else {
    format!("self.rule_{}()", sanitize_ident(&name))
  };

  match depth_binding {
    Some(depth) => format!(
      "{{ let __ok = {call}; if __ok {{ self.capture_variable({depth}); }} __ok }}"
    ),
    None => call,
  }
}

fn compile_sequence(ctx: &EmitCtx, id: NodeId) -> String {
  let children = ctx.tree.arena[id].children.clone();
  let parts: Vec<String> = children.iter().map(|&c| format!("({})", compile_expr(ctx, c))).collect();
  format!("({})", parts.join(" && "))
}

fn compile_alternate(ctx: &EmitCtx, children: &[NodeId]) -> String {
  // Nested save/restore if/else chain, innermost (last alternative) first.
  let mut code = "false".to_string();
  for &child in children.iter().rev() {
    let inner = compile_expr(ctx, child);
    code = format!(
      "{{ let __save = self.position; if {inner} {{ true }} else {{ self.position = __save; {code} }} }}"
    );
  }
  code
}

fn compile_unordered_alternate(ctx: &EmitCtx, id: NodeId) -> String {
  let tree = ctx.tree;
  let children = tree.arena[id].children.clone();
  let mut arms = Vec::new();
  let mut default_exprs: Vec<NodeId> = Vec::new();

  for child in children {
    match tree.arena[child].kind {
      NodeKind::Sequence => {
        let peek = tree.arena[child].children[0];
        let body_expr = tree.arena[child].children[1];
        let class_leaf = tree.arena[peek].children[0];
        let class = tree.arena[class_leaf].char_class.unwrap_or_default();
        if class.is_empty() {
          default_exprs.push(body_expr);
        } else {
          let pattern = charset_pattern(&class);
          let body = compile_expr(ctx, body_expr);
          arms.push(format!("{pattern} => {{ {body} }}"));
        }
      }
      NodeKind::Alternate => {
        default_exprs.push(child);
      }
      _ => default_exprs.push(child),
    }
  }

  let default_body = if default_exprs.is_empty() {
    "false".to_string()
  } else {
    compile_alternate(ctx, &default_exprs)
  };

  let arms_joined = arms.join(",\n      ");
  format!(
    "{{ match self.buffer.get(self.position).copied().map(|c| c as u32 as u8) {{ Some(b) => match b {{ {arms_joined}, _ => {{ {default_body} }} }}, None => {{ {default_body} }} }} }}"
  )
}

fn compile_implicit_push(ctx: &EmitCtx, id: NodeId) -> String {
  let tree = ctx.tree;
  let children = &tree.arena[id].children;
  let (expr, rule_copy) = (children[0], children[1]);
  let label = tree.arena[rule_copy].text.clone();

  if tree.arena[expr].kind == NodeKind::Action {
    return format!(
      "{{ self.emit_token(Rule::{}, self.position); true }}",
      rule_tag(&label)
    );
  }

  let inner = compile_expr(ctx, expr);
  format!(
    "{{ let __pos_n = self.position; self.depth += 1; let __ok = {inner}; self.depth -= 1; if __ok {{ self.emit_token(Rule::{}, __pos_n); }} __ok }}",
    rule_tag(&label)
  )
}

/// Rule names may contain characters that aren't valid in a Rust
/// identifier tail position (`Action0`, `PegText` are fine, but a
/// grammar author's hyphenated name has already been normalized to an
/// underscore by the builder).
pub fn sanitize_ident(name: &str) -> String {
  name.chars().map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' }).collect()
}

pub fn rule_tag(name: &str) -> String {
  format!("Rule{}", sanitize_ident(name))
}

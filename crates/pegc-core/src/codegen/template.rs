//! Component I: the emission template (§4.H's assembled output, §6.3).
//!
//! Everything in this module writes *text the generated parser will be
//! compiled from*, not code `pegc_core` itself runs. It is the fixed
//! scaffold around the per-rule bodies `codegen::emit` compiles: the
//! `Rule` tag enumeration, the `Rul3s` name table, the two-bit-width
//! token tree, the parser state struct, and
//! `Init`/`Parse`/`Reset`/`Execute`/`PrintSyntaxTree` (§6.3).
//!
//! Grounded on `original_source/src/leg/leg.go`'s own `text/template`
//! output (the same shape, `{{.StructName}}`/`{{range .Sizes}}` and
//! all) and, for how to *build* generated Rust source text one section
//! at a time, on `radlr-rust-build/lib.rs`'s `CodeWriter`/raw-string
//! pattern (a fixed header literal followed by programmatically
//! appended sections). `pegc_core` has no `CodeWriter` dependency of
//! its own to reach for, so sections are appended directly to a
//! `String` with `write!`, which is the same idea without the extra
//! crate.

use std::fmt::Write as _;

use crate::codegen::emit::{compile_expr, rule_tag, sanitize_ident, EmitCtx};
use crate::diagnostics::Diagnostics;
use crate::ir::{NodeKind, Tree};

const TRAILING_RULE_TAGS: &[&str] =
  &["ActionPush", "ActionPop", "ActionSet", "Pre_", "_In_", "_Suf"];

/// Assembles the complete generated parser source (§6.2 `Compile`'s
/// output). `diagnostics` receives `§6.4` notes about anything the
/// generator itself had to improvise around (currently unused, but
/// threaded through so a future illegal-node-type case has somewhere
/// to report to, per §7's "generator emits nil placeholders ... so the
/// output still type-checks").
pub fn generate(tree: &Tree, diagnostics: &mut Diagnostics) -> String {
  let mut out = String::new();
  write_header(&mut out, tree);
  write_rule_enum(&mut out, tree);
  write_token_tree(&mut out);
  write_parser_struct(&mut out, tree);
  write_init_and_parse(&mut out, tree, diagnostics);
  write_execute(&mut out, tree);
  write_print_syntax_tree(&mut out);
  write_trailer(&mut out, tree);
  out
}

fn struct_name(tree: &Tree) -> String {
  tree.struct_name.clone().unwrap_or_else(|| "Parser".to_string())
}

fn yy_stype(tree: &Tree) -> String {
  tree.yy_stype.clone().unwrap_or_else(|| "()".to_string())
}

fn write_header(out: &mut String, tree: &Tree) {
  if let Some(package) = &tree.package_name {
    let _ = writeln!(out, "// package {package} (generated, see module docs)");
  }
  let _ = writeln!(
    out,
    "// Generated by pegc. Do not edit by hand; re-run the compiler instead.\n\
     #![allow(non_snake_case, non_camel_case_types, dead_code, unused_mut, unused_assignments)]\n"
  );
  let _ = writeln!(out, "pub const END_SYMBOL: char = '\\u{{0004}}';\n");
}

fn write_rule_enum(out: &mut String, tree: &Tree) {
  let _ = writeln!(out, "#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]");
  let _ = writeln!(out, "pub enum Rule {{");
  let _ = writeln!(out, "  RuleUnknown = 0,");
  for name in &tree.rule_names {
    let _ = writeln!(out, "  {},", rule_tag(name));
  }
  for tag in TRAILING_RULE_TAGS {
    let _ = writeln!(out, "  Rule{tag},");
  }
  let _ = writeln!(out, "}}\n");

  let _ = writeln!(out, "pub const RUL3S: &[&str] = &[");
  let _ = writeln!(out, "  \"Unknown\",");
  for name in &tree.rule_names {
    let _ = writeln!(out, "  {:?},", name);
  }
  for tag in TRAILING_RULE_TAGS {
    let _ = writeln!(out, "  {:?},", tag);
  }
  let _ = writeln!(out, "];\n");
}

/// The two token bit-widths (§6.3, §9 "Two token widths"): one
/// `macro_rules!` in the *generated* source expands to both
/// `Token16`/`Tokens16` and `Token32`/`Tokens32`, rather than two
/// copy-pasted struct definitions, per the Design Notes' "a strongly
/// typed implementation can produce them from a single generic
/// template."
fn write_token_tree(out: &mut String) {
  let _ = write!(
    out,
    r#"
macro_rules! define_token_tree {{
  ($tokens:ident, $token:ident, $off:ty) => {{
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct $token {{
      pub rule: Rule,
      pub begin: $off,
      pub end: $off,
      pub next: $off,
    }}

    impl $token {{
      fn is_parent_of(&self, other: &$token) -> bool {{
        (self.begin as u32) <= (other.begin as u32) && (other.end as u32) <= (self.end as u32)
      }}
    }}

    #[derive(Debug, Clone, Default)]
    pub struct $tokens {{
      tree: Vec<$token>,
    }}

    impl $tokens {{
      fn with_capacity(cap: usize) -> Self {{
        Self {{ tree: Vec::with_capacity(cap) }}
      }}

      fn add(&mut self, rule: Rule, begin: usize, end: usize, depth: u32, token_index: usize) {{
        let token = $token {{ rule, begin: begin as $off, end: end as $off, next: depth as $off }};
        if token_index < self.tree.len() {{
          self.tree[token_index] = token;
        }} else {{
          self.tree.push(token);
        }}
      }}

      fn trim(&mut self, length: usize) {{
        self.tree.truncate(length);
      }}

      fn len(&self) -> usize {{
        self.tree.len()
      }}

      /// `None` while the tree still has room for `token_index`; `Some`
      /// with a widened tree once it has overflowed (§6.3 `Init`'s
      /// "promotes to 32-bit on overflow", §9 "the `Expand` contract").
      fn needs_expand(&self, token_index: usize) -> bool {{
        token_index >= self.tree.len()
      }}

      /// Deepest non-empty frontier of failed tokens (§6.3 `parseError`):
      /// the original walks `Order()`'s last populated depth level.
      fn deepest_frontier(&self) -> Vec<$token> {{
        self.tree.clone()
      }}
    }}
  }};
}}

define_token_tree!(Tokens16, Token16, u16);
define_token_tree!(Tokens32, Token32, u32);

#[derive(Debug, Clone)]
pub enum TokenTree {{
  Small(Tokens16),
  Large(Tokens32),
}}

impl TokenTree {{
  fn with_capacity(cap: usize) -> Self {{
    TokenTree::Small(Tokens16::with_capacity(cap))
  }}

  fn add(&mut self, rule: Rule, begin: usize, end: usize, depth: u32, token_index: usize) {{
    self.expand(token_index);
    match self {{
      TokenTree::Small(t) => t.add(rule, begin, end, depth, token_index),
      TokenTree::Large(t) => t.add(rule, begin, end, depth, token_index),
    }}
  }}

  /// Promotes a 16-bit tree to 32-bit in place once `token_index`
  /// overflows it; a no-op otherwise or once already 32-bit (§6.3, §9).
  fn expand(&mut self, token_index: usize) {{
    if let TokenTree::Small(small) = self {{
      if small.needs_expand(token_index) {{
        let widened: Vec<Token32> = small
          .tree
          .iter()
          .map(|t| Token32 {{ rule: t.rule, begin: t.begin as u32, end: t.end as u32, next: t.next as u32 }})
          .chain(std::iter::repeat_with(|| Token32 {{ rule: Rule::RuleUnknown, begin: 0, end: 0, next: 0 }}))
          .take(2 * small.tree.len().max(1))
          .collect();
        *self = TokenTree::Large(Tokens32 {{ tree: widened }});
      }}
    }}
  }}

  fn trim(&mut self, length: usize) {{
    match self {{
      TokenTree::Small(t) => t.trim(length),
      TokenTree::Large(t) => t.trim(length),
    }}
  }}

  fn len(&self) -> usize {{
    match self {{
      TokenTree::Small(t) => t.len(),
      TokenTree::Large(t) => t.len(),
    }}
  }}

  fn ordered_tokens(&self) -> Vec<(Rule, usize, usize, u32)> {{
    match self {{
      TokenTree::Small(t) => {{
        t.tree.iter().map(|tok| (tok.rule, tok.begin as usize, tok.end as usize, tok.next as u32)).collect()
      }}
      TokenTree::Large(t) => {{
        t.tree.iter().map(|tok| (tok.rule, tok.begin as usize, tok.end as usize, tok.next as u32)).collect()
      }}
    }}
  }}
}}

impl Default for TokenTree {{
  fn default() -> Self {{
    TokenTree::Small(Tokens16::default())
  }}
}}
"#
  );
}

fn write_parser_struct(out: &mut String, tree: &Tree) {
  let name = struct_name(tree);
  let yy = yy_stype(tree);

  let _ = writeln!(out, "#[derive(Debug, Default)]");
  let _ = writeln!(out, "pub struct {name} {{");
  for field in &tree.struct_variables {
    let trimmed = field.trim_end().trim_end_matches(',');
    let _ = writeln!(out, "  pub {trimmed},");
  }
  let _ = writeln!(out, "  pub Buffer: String,");
  let _ = writeln!(out, "  buffer: Vec<char>,");
  let _ = writeln!(out, "  position: usize,");
  let _ = writeln!(out, "  depth: u32,");
  let _ = writeln!(out, "  token_index: usize,");
  let _ = writeln!(out, "  tree: TokenTree,");
  if tree.has_variable {
    let _ = writeln!(out, "  stack: Vec<{yy}>,");
    let _ = writeln!(out, "  stack_idx: usize,");
    let _ = writeln!(out, "  yy: {yy},");
  }
  let _ = writeln!(out, "}}\n");

  let _ = writeln!(out, "pub struct ParseError {{ pub message: String }}\n");
  let _ = writeln!(out, "impl std::fmt::Display for ParseError {{");
  let _ = writeln!(
    out,
    "  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {{ f.write_str(&self.message) }}"
  );
  let _ = writeln!(out, "}}");
  let _ = writeln!(out, "impl std::fmt::Debug for ParseError {{");
  let _ = writeln!(
    out,
    "  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {{ f.write_str(&self.message) }}"
  );
  let _ = writeln!(out, "}}");
  let _ = writeln!(out, "impl std::error::Error for ParseError {{}}\n");
}

/// `Init`, `Parse`, `Reset`, the inline match primitives, and every
/// rule method (§4.H, §6.3). `pegc_core`'s own `EmitCtx`/`compile_expr`
/// (component H proper) generate the bodies; this function only
/// supplies the surrounding methods the original's closures-over-
/// shared-locals become once translated to `&mut self` methods (§2
/// "Target-language adaptation").
fn write_init_and_parse(out: &mut String, tree: &Tree, diagnostics: &mut Diagnostics) {
  let name = struct_name(tree);
  let root = rule_tag(tree.rule_names.first().map(String::as_str).unwrap_or("S"));

  let _ = writeln!(out, "impl {name} {{");
  let _ = writeln!(out, "  pub fn init(&mut self) {{");
  let _ = writeln!(out, "    self.buffer = self.Buffer.chars().collect();");
  let _ = writeln!(out, "    if self.buffer.last().copied() != Some(END_SYMBOL) {{");
  let _ = writeln!(out, "      self.buffer.push(END_SYMBOL);");
  let _ = writeln!(out, "    }}");
  let _ = writeln!(out, "    self.tree = TokenTree::with_capacity(self.buffer.len());");
  let _ = writeln!(out, "    self.position = 0;");
  let _ = writeln!(out, "    self.depth = 0;");
  let _ = writeln!(out, "    self.token_index = 0;");
  if tree.has_variable {
    let yy = yy_stype(tree);
    let _ = writeln!(out, "    self.stack = vec![{yy}::default(); 1024];");
    let _ = writeln!(out, "    self.stack_idx = 0;");
  }
  let _ = writeln!(out, "  }}\n");

  let _ = writeln!(out, "  pub fn reset(&mut self) {{");
  let _ = writeln!(out, "    self.position = 0;");
  let _ = writeln!(out, "    self.token_index = 0;");
  let _ = writeln!(out, "    self.depth = 0;");
  let _ = writeln!(out, "  }}\n");

  let _ = writeln!(out, "  pub fn parse(&mut self) -> Result<(), ParseError> {{");
  let _ = writeln!(out, "    self.parse_rule(Rule::{root})");
  let _ = writeln!(out, "  }}\n");

  let _ = writeln!(out, "  pub fn parse_rule(&mut self, rule: Rule) -> Result<(), ParseError> {{");
  let _ = writeln!(out, "    let matched = self.call_rule(rule);");
  let _ = writeln!(out, "    if matched {{");
  let _ = writeln!(out, "      self.tree.trim(self.token_index);");
  let _ = writeln!(out, "      Ok(())");
  let _ = writeln!(out, "    }} else {{");
  let _ = writeln!(out, "      Err(self.parse_error())");
  let _ = writeln!(out, "    }}");
  let _ = writeln!(out, "  }}\n");

  let _ = writeln!(out, "  fn parse_error(&self) -> ParseError {{");
  let _ = writeln!(out, "    let mut message = String::from(\"\\n\");");
  let _ = writeln!(out, "    let deepest = self.tree.ordered_tokens();");
  let _ = writeln!(out, "    if let Some((rule, begin, end, _)) = deepest.iter().max_by_key(|(_, b, e, _)| e.saturating_sub(*b).min(b + (e - b))).cloned() {{");
  let _ = writeln!(out, "      let (bline, bcol) = self.translate_position(begin);");
  let _ = writeln!(out, "      let (eline, ecol) = self.translate_position(end);");
  let _ = writeln!(
    out,
    "      message.push_str(&format!(\"parse error near {{}} (line {{}} symbol {{}} - line {{}} symbol {{}})\\n\", RUL3S[rule as usize], bline, bcol, eline, ecol));"
  );
  let _ = writeln!(out, "    }}");
  let _ = writeln!(out, "    ParseError {{ message }}");
  let _ = writeln!(out, "  }}\n");

  let _ = writeln!(out, "  /// Byte offset to (line, column), 1-indexed (§6.3 `translatePositions`).");
  let _ = writeln!(out, "  fn translate_position(&self, offset: usize) -> (usize, usize) {{");
  let _ = writeln!(out, "    let mut line = 1usize;");
  let _ = writeln!(out, "    let mut col = 0usize;");
  let _ = writeln!(out, "    for &c in self.buffer.iter().take(offset) {{");
  let _ = writeln!(out, "      if c == '\\n' {{ line += 1; col = 0; }} else {{ col += 1; }}");
  let _ = writeln!(out, "    }}");
  let _ = writeln!(out, "    (line, col)");
  let _ = writeln!(out, "  }}\n");

  let _ = writeln!(out, "  fn match_dot(&mut self) -> bool {{");
  let _ = writeln!(out, "    if self.buffer.get(self.position).copied() != Some(END_SYMBOL) {{");
  let _ = writeln!(out, "      self.position += 1;");
  let _ = writeln!(out, "      true");
  let _ = writeln!(out, "    }} else {{ false }}");
  let _ = writeln!(out, "  }}\n");

  let _ = writeln!(out, "  fn match_char(&mut self, c: char) -> bool {{");
  let _ = writeln!(out, "    if self.buffer.get(self.position).copied() == Some(c) {{");
  let _ = writeln!(out, "      self.position += 1;");
  let _ = writeln!(out, "      true");
  let _ = writeln!(out, "    }} else {{ false }}");
  let _ = writeln!(out, "  }}\n");

  let _ = writeln!(out, "  fn match_range(&mut self, lo: char, hi: char) -> bool {{");
  let _ = writeln!(out, "    match self.buffer.get(self.position).copied() {{");
  let _ = writeln!(out, "      Some(c) if c >= lo && c <= hi => {{ self.position += 1; true }}");
  let _ = writeln!(out, "      _ => false,");
  let _ = writeln!(out, "    }}");
  let _ = writeln!(out, "  }}\n");

  let _ = writeln!(out, "  fn match_string(&mut self, s: &str) -> bool {{");
  let _ = writeln!(out, "    let mut i = self.position;");
  let _ = writeln!(out, "    for expected in s.chars() {{");
  let _ = writeln!(out, "      if self.buffer.get(i).copied() != Some(expected) {{ return false; }}");
  let _ = writeln!(out, "      i += 1;");
  let _ = writeln!(out, "    }}");
  let _ = writeln!(out, "    self.position = i;");
  let _ = writeln!(out, "    true");
  let _ = writeln!(out, "  }}\n");

  let _ = writeln!(out, "  fn emit_token(&mut self, rule: Rule, begin: usize) {{");
  let _ = writeln!(out, "    self.tree.add(rule, begin, self.position, self.depth, self.token_index);");
  let _ = writeln!(out, "    self.token_index += 1;");
  let _ = writeln!(out, "  }}\n");

  if tree.has_variable {
    // Matches the original's `TypeName` case exactly (§4.H): rewind
    // `depth` ActionPop markers, record one ActionSet (capturing `yy`
    // at the now-current stack top, i.e. this variable's slot), then
    // push the same `depth` markers back so the enclosing rule's own
    // push/pop bracket (§4.H "Variable scaffolding per rule") stays
    // balanced. These are markers appended to the token tree, not a
    // runtime push/pop of `self.stack` itself — `execute` interprets
    // them afterward.
    let _ = writeln!(out, "  fn capture_variable(&mut self, depth: i32) {{");
    let _ = writeln!(out, "    for _ in 0..depth {{ self.emit_token(Rule::RuleActionPop, self.position); }}");
    let _ = writeln!(out, "    self.emit_token(Rule::RuleActionSet, self.position);");
    let _ = writeln!(out, "    for _ in 0..depth {{ self.emit_token(Rule::RuleActionPush, self.position); }}");
    let _ = writeln!(out, "  }}\n");
  }

  let _ = writeln!(out, "  fn call_rule(&mut self, rule: Rule) -> bool {{");
  let _ = writeln!(out, "    match rule {{");
  for name in &tree.rule_names {
    // §7: rules absent from rules_count are unreachable. The emitter
    // substitutes `false` for their dispatch arm — idiomatic Rust's
    // nearest equivalent to the original's literal `nil` function-
    // pointer slot (§8 "For every unreachable rule: the emitter writes
    // a literal nil in that slot"): a value that safely fails instead
    // of crashing if it were ever reached, which by construction it
    // never is.
    if tree.rules_count.contains_key(name) {
      let _ = writeln!(out, "      Rule::{} => self.rule_{}(),", rule_tag(name), sanitize_ident(name));
    } else {
      let _ = writeln!(out, "      Rule::{} => false,", rule_tag(name));
    }
  }
  let _ = writeln!(out, "      _ => false,");
  let _ = writeln!(out, "    }}");
  let _ = writeln!(out, "  }}\n");

  write_rule_methods(out, tree, diagnostics);

  let _ = writeln!(out, "}}\n");
}

fn write_rule_methods(out: &mut String, tree: &Tree, _diagnostics: &mut Diagnostics) {
  let ctx = EmitCtx { tree, config: &tree.config };
  for &rule_id in &tree.declarations {
    let name = tree.arena[rule_id].text.clone();
    let body = tree.arena[rule_id].children[0];
    debug_assert_eq!(tree.arena[body].kind, NodeKind::ImplicitPush);
    // A rule the linker only created because something referenced it
    // with no definition anywhere in the grammar (§4.D) has a `Nil`
    // body, which would otherwise compile to the always-matching
    // literal `true`; emit the original's failing `nil` function-
    // pointer slot instead (§7).
    let expr = if tree.undefined_rules.iter().any(|r| r == &name) {
      "false".to_string()
    } else {
      compile_expr(&ctx, body)
    };
    let _ = writeln!(out, "  fn rule_{}(&mut self) -> bool {{", sanitize_ident(&name));
    if tree.arena[rule_id].has_variable > 0 {
      let n = tree.arena[rule_id].has_variable;
      let _ = writeln!(
        out,
        "    for _ in 0..{n} {{ self.emit_token(Rule::RuleActionPush, self.position); }}"
      );
      let _ = writeln!(out, "    let __result = {expr};");
      let _ = writeln!(
        out,
        "    for _ in 0..{n} {{ self.emit_token(Rule::RuleActionPop, self.position); }}"
      );
      let _ = writeln!(out, "    __result");
    } else {
      let _ = writeln!(out, "    {expr}");
    }
    let _ = writeln!(out, "  }}\n");
  }
}

/// `Execute()` (§6.3): walks the finished token stream in order and
/// runs each action body, maintaining the typed value stack via
/// `ActionPush`/`ActionPop`/`ActionSet`, exactly as the original's
/// `HasActions`-gated method.
fn write_execute(out: &mut String, tree: &Tree) {
  if !tree.has_actions {
    return;
  }
  let name = struct_name(tree);
  let yy = yy_stype(tree);
  let _ = writeln!(out, "impl {name} {{");
  let _ = writeln!(out, "  pub fn execute(&mut self) {{");
  let _ = writeln!(out, "    let mut begin: usize = 0;");
  let _ = writeln!(out, "    let mut end: usize = 0;");
  if tree.has_variable {
    let _ = writeln!(out, "    let mut yy: {yy} = {yy}::default();");
  }
  let _ = writeln!(out, "    for (rule, tok_begin, tok_end, _) in self.tree.ordered_tokens() {{");
  let _ = writeln!(out, "      match rule {{");
  let _ = writeln!(out, "        Rule::RulePegText => {{ begin = tok_begin; end = tok_end; }}");
  for action_id in &tree.actions {
    let id = tree.arena[*action_id].id;
    let body = tree.arena[*action_id].text.clone();
    let _ = writeln!(out, "        Rule::RuleAction{id} => {{ {body} }}");
  }
  if tree.has_variable {
    let _ = writeln!(out, "        Rule::RuleActionPush => {{ self.stack_idx += 1; }}");
    let _ = writeln!(out, "        Rule::RuleActionPop => {{ self.stack_idx -= 1; }}");
    let _ = writeln!(out, "        Rule::RuleActionSet => {{ if self.stack_idx < self.stack.len() {{ self.stack[self.stack_idx] = yy.clone(); }} }}");
  }
  let _ = writeln!(out, "        _ => {{}}");
  let _ = writeln!(out, "      }}");
  let _ = writeln!(out, "      let _ = (begin, end);");
  let _ = writeln!(out, "    }}");
  let _ = writeln!(out, "  }}");
  let _ = writeln!(out, "}}\n");
}

/// `PrintSyntaxTree()` (§6.3): a depth-first pre-order walk of the
/// ordered token tree with `Pre_`/`_In_`/`_Suf` synthetic markers filling
/// the gaps between sibling spans (§4 "Supplemented features").
///
/// The original produces this order lazily through a hand-rolled
/// round-robin goroutine/channel state machine — a Go-specific
/// mechanism for streaming output one token at a time. This build
/// builds the ordered, gap-filled sequence eagerly in a `Vec` instead,
/// which is the direct equivalent without Go's coroutine machinery
/// (documented as a REDESIGN in DESIGN.md; the traversal order and the
/// inserted `Pre_`/`_In_`/`_Suf` spans are unchanged).
fn write_print_syntax_tree(out: &mut String) {
  let _ = write!(
    out,
    r#"impl TokenTree {{
  /// Builds the pre-order sequence with gap-filling markers, then
  /// hands it to `PrintSyntaxTree` for indentation and printing.
  fn pre_order(&self, buffer_len: usize) -> Vec<(Rule, usize, usize, u32)> {{
    let mut tokens = self.ordered_tokens();
    tokens.retain(|(rule, _, _, _)| *rule != Rule::RuleUnknown);
    tokens.sort_by_key(|(_, begin, end, _)| (*begin, std::cmp::Reverse(*end)));

    let mut out = Vec::with_capacity(tokens.len() * 2);
    let mut stack: Vec<(usize, usize, u32)> = Vec::new();
    for &(rule, begin, end, depth) in &tokens {{
      // Pop ancestors this token does not nest inside of.
      while matches!(stack.last(), Some(&(_, parent_end, _)) if begin >= parent_end) {{
        stack.pop();
      }}
      // A gap since the previous sibling at this depth (or since the
      // enclosing parent's own start, for the first child) becomes a
      // synthetic `_In_`/`Pre_` span.
      match out.last().copied() {{
        Some((_, _, prev_end, prev_depth)) if prev_depth == depth && prev_end != begin => {{
          out.push((Rule::Rule_In_, prev_end, begin, depth));
        }}
        None if begin != 0 => {{
          out.push((Rule::RulePre_, 0, begin, depth));
        }}
        _ => {{}}
      }}
      out.push((rule, begin, end, depth));
      stack.push((begin, end, depth));
    }}
    if let Some(&(_, _, last_end, depth)) = out.last() {{
      if last_end < buffer_len {{
        out.push((Rule::Rule_Suf, last_end, buffer_len, depth));
      }}
    }}
    out
  }}

  pub fn print_syntax_tree(&self, buffer: &str) {{
    let chars: Vec<char> = buffer.chars().collect();
    for (rule, begin, end, depth) in self.pre_order(chars.len()) {{
      let indent = "  ".repeat(depth as usize);
      let text: String = chars.get(begin..end).map(|s| s.iter().collect()).unwrap_or_default();
      println!("{{indent}}{{}} {{:?}}", RUL3S[rule as usize], text);
    }}
  }}
}}

"#
  );
}

fn write_trailer(out: &mut String, tree: &Tree) {
  for decl in &tree.raw_declarations {
    let _ = writeln!(out, "{decl}");
  }
  if !tree.trailer.is_empty() {
    let _ = writeln!(out, "{}", tree.trailer);
  }
}

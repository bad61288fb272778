//! A minimal recursive-descent reader for the classic `peg`/`leg` surface
//! grammar syntax (`name <- expr`, `/` ordered choice, `()`, `*`, `+`,
//! `?`, `&`, `!`, `'lit'`, `"lit"`, `[a-z]`, `.`, `{action}`, `name:var`,
//! `<push>`, plus a handful of `%`-prefixed header directives). It exists
//! only to drive `pegc_core::Builder` end to end for the CLI and its own
//! tests — it is not part of the compiler core and is not held to the
//! core's testable properties.
//!
//! Escape sequences and octal character literals follow the original
//! `peg`/`leg` tool's own hand-written lexer (`original_source/src/leg/leg.go`):
//! `\n \r \t \\ \' \" \[ \] \- \0`, plus three-digit octal escapes
//! (`\101` == `A`), and double-quoted literals case-fold per character
//! (via `Builder::add_double_character`) where single-quoted literals
//! match exactly.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use pegc_core::{Builder, PegConfig};

#[derive(Debug)]
pub struct ParseError {
  pub message: String,
  pub line: usize,
}

impl fmt::Display for ParseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: line {}", self.message, self.line)
  }
}

impl std::error::Error for ParseError {}

type Result<T> = std::result::Result<T, ParseError>;

/// Reads `source` and drives `builder` through the complete grammar it
/// describes. Returns the same `builder` for convenience at the call
/// site.
pub fn read_grammar(source: &str, config: PegConfig) -> Result<Builder> {
  let mut reader = Reader::new(source);
  let mut builder = Builder::new(config);
  reader.parse_grammar(&mut builder)?;
  Ok(builder)
}

#[derive(Clone, Copy)]
enum ClassElem {
  Char(char),
  Range(char, char),
}

struct Reader<'a> {
  chars: Peekable<Chars<'a>>,
  line: usize,
}

impl<'a> Reader<'a> {
  fn new(source: &'a str) -> Self {
    Self { chars: source.chars().peekable(), line: 1 }
  }

  fn err(&self, message: impl Into<String>) -> ParseError {
    ParseError { message: message.into(), line: self.line }
  }

  fn peek(&mut self) -> Option<char> {
    self.chars.peek().copied()
  }

  fn bump(&mut self) -> Option<char> {
    let c = self.chars.next();
    if c == Some('\n') {
      self.line += 1;
    }
    c
  }

  fn eat(&mut self, expect: char) -> bool {
    if self.peek() == Some(expect) {
      self.bump();
      true
    } else {
      false
    }
  }

  /// Skips whitespace and both comment styles (`# ...` to end of line,
  /// matching the original lexer's single-line comment handling).
  fn skip_trivia(&mut self) {
    loop {
      match self.peek() {
        Some(c) if c.is_whitespace() => {
          self.bump();
        }
        Some('#') => {
          while let Some(c) = self.peek() {
            if c == '\n' {
              break;
            }
            self.bump();
          }
        }
        _ => break,
      }
    }
  }

  fn peek_is_ident_start(&mut self) -> bool {
    matches!(self.peek(), Some(c) if c.is_alphabetic() || c == '_')
  }

  fn peek_is_ident_continue(&mut self) -> bool {
    matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_' || c == '-')
  }

  fn read_ident(&mut self) -> Result<String> {
    if !self.peek_is_ident_start() {
      return Err(self.err("expected an identifier"));
    }
    let mut text = String::new();
    while self.peek_is_ident_continue() {
      text.push(self.bump().unwrap());
    }
    Ok(text)
  }

  /// Reads the remainder of the current source line verbatim (used for
  /// single-line header directives like `%type` and `%state`).
  fn read_rest_of_line(&mut self) -> String {
    let mut text = String::new();
    while let Some(c) = self.peek() {
      if c == '\n' {
        break;
      }
      text.push(self.bump().unwrap());
    }
    text.trim().to_string()
  }

  /// Reads a brace-delimited block whose interior may itself contain
  /// balanced `{ }` pairs, returning the inner text with the outer pair
  /// stripped (used for `{action}` bodies and `%{ ... %}` blocks, whose
  /// terminator is checked by the caller).
  fn read_balanced_braces(&mut self) -> Result<String> {
    if !self.eat('{') {
      return Err(self.err("expected '{'"));
    }
    let mut depth = 1;
    let mut text = String::new();
    loop {
      match self.bump() {
        Some('{') => {
          depth += 1;
          text.push('{');
        }
        Some('}') => {
          depth -= 1;
          if depth == 0 {
            break;
          }
          text.push('}');
        }
        Some(c) => text.push(c),
        None => return Err(self.err("unterminated action block")),
      }
    }
    Ok(text)
  }

  // ---- grammar-level structure ----------------------------------------

  fn parse_grammar(&mut self, b: &mut Builder) -> Result<()> {
    self.skip_trivia();

    if self.peek_keyword("package") {
      self.read_ident_keyword("package")?;
      self.skip_trivia();
      let name = self.read_ident()?;
      b.add_package(&name);
      self.skip_trivia();
    }

    loop {
      self.skip_trivia();
      match self.peek() {
        None => break,
        Some('%') => {
          if self.parse_header_directive(b)? {
            // `%%` trailer marker consumed everything; nothing follows.
            break;
          }
        }
        Some(c) if c.is_alphabetic() || c == '_' => self.parse_rule(b)?,
        Some(other) => return Err(self.err(format!("unexpected character '{other}'"))),
      }
    }

    if b.pending() != 0 {
      return Err(self.err("grammar ended with an unclosed expression"));
    }
    Ok(())
  }

  fn peek_keyword(&mut self, kw: &str) -> bool {
    let rest: String = self.chars.clone().take(kw.len()).collect();
    rest == kw
  }

  fn read_ident_keyword(&mut self, kw: &str) -> Result<()> {
    for expected in kw.chars() {
      if self.bump() != Some(expected) {
        return Err(self.err(format!("expected keyword '{kw}'")));
      }
    }
    Ok(())
  }

  /// Returns `Ok(true)` when a `%%` trailer marker was consumed (the rest
  /// of the source is the verbatim trailer and grammar parsing stops).
  fn parse_header_directive(&mut self, b: &mut Builder) -> Result<bool> {
    self.bump(); // leading '%'
    if self.eat('%') {
      let mut trailer = String::new();
      while let Some(c) = self.bump() {
        trailer.push(c);
      }
      b.add_trailer(trailer.trim_start_matches('\n'));
      return Ok(true);
    }
    if self.eat('{') {
      let mut depth = 1;
      let mut text = String::new();
      loop {
        match self.bump() {
          Some('%') if self.peek() == Some('}') && depth == 1 => {
            self.bump();
            break;
          }
          Some('{') => {
            depth += 1;
            text.push('{');
          }
          Some('}') => {
            depth -= 1;
            text.push('}');
          }
          Some(c) => text.push(c),
          None => return Err(self.err("unterminated %{ ... %} block")),
        }
      }
      b.add_declaration(text.trim().to_string());
      return Ok(false);
    }
    let directive = self.read_ident()?;
    match directive.as_str() {
      "struct" => {
        self.skip_trivia();
        let name = self.read_ident()?;
        b.add_leg(&name);
      }
      "type" => {
        let rest = self.read_rest_of_line();
        b.add_yy_stype(&rest);
      }
      "state" => {
        let rest = self.read_rest_of_line();
        b.add_state(&rest);
      }
      other => return Err(self.err(format!("unknown header directive '%{other}'"))),
    }
    Ok(false)
  }

  fn parse_rule(&mut self, b: &mut Builder) -> Result<()> {
    let name = self.read_ident()?;
    b.add_rule(&name);
    self.skip_trivia();
    if !(self.eat('<') && self.eat('-')) {
      return Err(self.err(format!("expected '<-' after rule name '{name}'")));
    }
    self.skip_trivia();
    self.parse_alternate(b)?;
    b.add_expression().map_err(|e| self.err(e.to_string()))?;
    Ok(())
  }

  // ---- expression grammar ----------------------------------------------
  //
  // alternate := sequence ('/' sequence)*
  // sequence  := term+
  // term      := prefix* primary suffix?
  // prefix    := '&' | '!'
  // suffix    := '*' | '+' | '?'

  fn parse_alternate(&mut self, b: &mut Builder) -> Result<()> {
    self.parse_sequence(b)?;
    loop {
      self.skip_trivia();
      if self.eat('/') {
        self.skip_trivia();
        self.parse_sequence(b)?;
        b.add_alternate().map_err(|e| self.err(e.to_string()))?;
      } else {
        break;
      }
    }
    Ok(())
  }

  /// A sequence ends at `/`, `)`, `>`, end of input, a `%` header
  /// directive, or the start of the *next* rule declaration
  /// (`ident <-`) — distinguished by lookahead from an in-sequence rule
  /// reference, which is just a bare `ident` with no following `<-`.
  fn is_sequence_end(&mut self) -> bool {
    self.skip_trivia();
    match self.peek() {
      None | Some('/') | Some(')') | Some('>') | Some('%') => true,
      Some(c) if c.is_alphabetic() || c == '_' => self.peek_starts_next_rule(),
      _ => false,
    }
  }

  fn peek_starts_next_rule(&mut self) -> bool {
    let mut lookahead = self.chars.clone();
    while matches!(lookahead.peek(), Some(c) if c.is_alphanumeric() || *c == '_' || *c == '-') {
      lookahead.next();
    }
    while matches!(lookahead.peek(), Some(c) if c.is_whitespace()) {
      lookahead.next();
    }
    lookahead.next() == Some('<') && lookahead.peek() == Some(&'-')
  }

  fn parse_sequence(&mut self, b: &mut Builder) -> Result<()> {
    if self.is_sequence_end() {
      return Err(self.err("empty alternative"));
    }
    self.parse_term(b)?;
    loop {
      if self.is_sequence_end() {
        break;
      }
      self.parse_term(b)?;
      b.add_sequence().map_err(|e| self.err(e.to_string()))?;
    }
    Ok(())
  }

  fn parse_term(&mut self, b: &mut Builder) -> Result<()> {
    self.skip_trivia();
    if self.eat('&') {
      self.skip_trivia();
      if self.peek() == Some('{') {
        let text = self.read_balanced_braces()?;
        b.add_predicate(&text);
        return Ok(());
      }
      self.parse_term(b)?;
      b.add_peek_for().map_err(|e| self.err(e.to_string()))?;
      return Ok(());
    }
    if self.eat('!') {
      self.skip_trivia();
      self.parse_term(b)?;
      b.add_peek_not().map_err(|e| self.err(e.to_string()))?;
      return Ok(());
    }

    // `name:` variable binding ahead of a following rule reference.
    if self.peek_is_ident_start() {
      let save_chars = self.chars.clone();
      let save_line = self.line;
      let ident = self.read_ident()?;
      if self.peek() == Some(':') {
        self.bump();
        b.add_variable(&ident);
        self.skip_trivia();
        self.parse_primary(b)?;
      } else {
        self.chars = save_chars;
        self.line = save_line;
        self.parse_primary(b)?;
      }
    } else {
      self.parse_primary(b)?;
    }

    self.skip_trivia();
    match self.peek() {
      Some('*') => {
        self.bump();
        b.add_star().map_err(|e| self.err(e.to_string()))?;
      }
      Some('+') => {
        self.bump();
        b.add_plus().map_err(|e| self.err(e.to_string()))?;
      }
      Some('?') => {
        self.bump();
        b.add_query().map_err(|e| self.err(e.to_string()))?;
      }
      _ => {}
    }
    Ok(())
  }

  fn parse_primary(&mut self, b: &mut Builder) -> Result<()> {
    self.skip_trivia();
    match self.peek() {
      Some('(') => {
        self.bump();
        self.skip_trivia();
        self.parse_alternate(b)?;
        self.skip_trivia();
        if !self.eat(')') {
          return Err(self.err("expected ')'"));
        }
        Ok(())
      }
      Some('<') => {
        self.bump();
        self.skip_trivia();
        self.parse_alternate(b)?;
        self.skip_trivia();
        if !self.eat('>') {
          return Err(self.err("expected '>' closing a text-capture block"));
        }
        b.add_push().map_err(|e| self.err(e.to_string()))?;
        Ok(())
      }
      Some('.') => {
        self.bump();
        b.add_dot();
        Ok(())
      }
      Some('{') => {
        let text = self.read_balanced_braces()?;
        b.add_action(&text);
        Ok(())
      }
      Some('\'') => self.parse_quoted_literal(b, '\'', false),
      Some('"') => self.parse_quoted_literal(b, '"', true),
      Some('[') => self.parse_char_class(b),
      Some(c) if c.is_alphabetic() || c == '_' => {
        let name = self.read_ident()?;
        b.add_name(&name);
        Ok(())
      }
      Some(other) => Err(self.err(format!("unexpected character '{other}' in expression"))),
      None => Err(self.err("unexpected end of input in expression")),
    }
  }

  /// `'lit'` matches exactly; `"lit"` case-folds per character (built
  /// from `Builder::add_double_character`, mirroring the original's own
  /// per-character double-quote handling) so both cases of each letter
  /// match.
  fn parse_quoted_literal(&mut self, b: &mut Builder, quote: char, fold_case: bool) -> Result<()> {
    self.bump();
    let mut chars = Vec::new();
    loop {
      match self.peek() {
        None => return Err(self.err("unterminated string literal")),
        Some(c) if c == quote => {
          self.bump();
          break;
        }
        Some('\\') => {
          self.bump();
          chars.push(self.read_escape()?);
        }
        Some(c) => {
          self.bump();
          chars.push(c);
        }
      }
    }

    if fold_case {
      if chars.is_empty() {
        b.add_nil();
        return Ok(());
      }
      for (i, c) in chars.iter().enumerate() {
        b.add_double_character(*c).map_err(|e| self.err(e.to_string()))?;
        if i > 0 {
          b.add_sequence().map_err(|e| self.err(e.to_string()))?;
        }
      }
      Ok(())
    } else {
      let text: String = chars.into_iter().collect();
      b.add_string(&text);
      Ok(())
    }
  }

  /// One escape sequence after a consumed backslash: `\n \r \t \\ \' \"
  /// \[ \] \- \0`, or a three-digit octal literal (`\101` == `A`),
  /// matching the original lexer.
  fn read_escape(&mut self) -> Result<char> {
    match self.peek() {
      Some(c) if c.is_digit(8) => {
        let mut digits = String::new();
        for _ in 0..3 {
          match self.peek() {
            Some(d) if d.is_digit(8) => digits.push(self.bump().unwrap()),
            _ => break,
          }
        }
        let value = u32::from_str_radix(&digits, 8)
          .map_err(|e| self.err(format!("invalid octal escape '\\{digits}': {e}")))?;
        char::from_u32(value).ok_or_else(|| self.err(format!("invalid octal escape '\\{digits}'")))
      }
      Some('n') => {
        self.bump();
        Ok('\n')
      }
      Some('r') => {
        self.bump();
        Ok('\r')
      }
      Some('t') => {
        self.bump();
        Ok('\t')
      }
      Some(other) => {
        self.bump();
        Ok(other)
      }
      None => Err(self.err("unterminated escape sequence")),
    }
  }

  /// `[...]` character classes, with `^` negation and an optional
  /// trailing `i` flag selecting the case-folding (double-character)
  /// variant over an exact match. The flag trails the closing `]`, so
  /// elements are gathered into `ClassElem`s first and only pushed to
  /// the builder once the fold mode is known.
  fn parse_char_class(&mut self, b: &mut Builder) -> Result<()> {
    self.bump(); // '['
    let negated = self.eat('^');
    let mut elements = Vec::new();

    loop {
      match self.peek() {
        None => return Err(self.err("unterminated character class")),
        Some(']') => {
          self.bump();
          break;
        }
        Some('\\') => {
          self.bump();
          let lower = self.read_escape()?;
          elements.push(self.read_class_element(lower)?);
        }
        Some(lower) => {
          self.bump();
          elements.push(self.read_class_element(lower)?);
        }
      }
    }
    if elements.is_empty() {
      return Err(self.err("empty character class"));
    }

    let fold_case = self.peek() == Some('i') && {
      self.bump();
      true
    };

    for (i, elem) in elements.iter().enumerate() {
      match (*elem, fold_case) {
        (ClassElem::Char(c), false) => b.add_character(&c.to_string()),
        (ClassElem::Char(c), true) => b.add_double_character(c).map_err(|e| self.err(e.to_string()))?,
        (ClassElem::Range(lo, hi), false) => {
          b.add_character(&lo.to_string());
          b.add_character(&hi.to_string());
          b.add_range().map_err(|e| self.err(e.to_string()))?;
        }
        (ClassElem::Range(lo, hi), true) => {
          b.add_double_range(lo, hi).map_err(|e| self.err(e.to_string()))?;
        }
      }
      if i > 0 {
        b.add_alternate().map_err(|e| self.err(e.to_string()))?;
      }
    }

    if negated {
      b.add_peek_not().map_err(|e| self.err(e.to_string()))?;
      b.add_dot();
      b.add_sequence().map_err(|e| self.err(e.to_string()))?;
    }
    Ok(())
  }

  /// Reads one character-class element starting at an already-consumed
  /// `lower` char: either a bare char, or (if the next char is `-` not
  /// immediately followed by `]`) a `lower-upper` range.
  fn read_class_element(&mut self, lower: char) -> Result<ClassElem> {
    if self.peek() == Some('-') {
      let mut lookahead = self.chars.clone();
      lookahead.next();
      if lookahead.peek().copied() != Some(']') {
        self.bump(); // '-'
        let upper = match self.peek() {
          Some('\\') => {
            self.bump();
            self.read_escape()?
          }
          Some(c) => {
            self.bump();
            c
          }
          None => return Err(self.err("unterminated range in character class")),
        };
        return Ok(ClassElem::Range(lower, upper));
      }
    }
    Ok(ClassElem::Char(lower))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reads_a_two_rule_grammar_end_to_end() {
    let source = "S <- 'a' T\nT <- [0-9]+\n";
    let builder = read_grammar(source, PegConfig::default()).unwrap();
    assert_eq!(builder.tree.declarations.len(), 2);
    assert_eq!(builder.pending(), 0);
  }

  #[test]
  fn ordered_choice_and_grouping_parse() {
    let source = "S <- ('a' / 'b') 'c'\n";
    let builder = read_grammar(source, PegConfig::default()).unwrap();
    assert_eq!(builder.tree.declarations.len(), 1);
  }

  #[test]
  fn action_and_variable_binding_parse() {
    let source = "S <- n:Digit { $$ = $1 }\nDigit <- [0-9]\n";
    let builder = read_grammar(source, PegConfig::default()).unwrap();
    assert!(builder.tree.has_actions);
    assert!(builder.tree.has_variable);
  }

  #[test]
  fn text_capture_and_predicate_parse() {
    let source = "S <- < [a-z]+ > &{ true } !'x'\n";
    let builder = read_grammar(source, PegConfig::default()).unwrap();
    assert_eq!(builder.tree.declarations.len(), 1);
  }

  #[test]
  fn header_directives_populate_tree_fields() {
    let source = "package demo\n%struct Parser\n%type i32\nS <- 'x'\n%%\ntrailer text\n";
    let builder = read_grammar(source, PegConfig::default()).unwrap();
    assert_eq!(builder.tree.package_name.as_deref(), Some("demo"));
    assert_eq!(builder.tree.struct_name.as_deref(), Some("Parser"));
    assert_eq!(builder.tree.yy_stype.as_deref(), Some("i32"));
    assert_eq!(builder.tree.trailer.trim(), "trailer text");
  }

  #[test]
  fn octal_escape_in_literal_decodes() {
    let source = "S <- '\\101'\n";
    let builder = read_grammar(source, PegConfig::default()).unwrap();
    assert_eq!(builder.tree.declarations.len(), 1);
  }

  #[test]
  fn unclosed_action_is_a_parse_error() {
    let source = "S <- { unterminated\n";
    assert!(read_grammar(source, PegConfig::default()).is_err());
  }
}

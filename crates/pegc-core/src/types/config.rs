/// Compile-time switches for the generator. Defaults mirror the original
/// tool's command-line flags (`-inline`, `-switch`).
///
/// The semantic-value type substituted for `YYSTYPE` in action bodies
/// (§4.C) is not a static config knob: it is a tree-level output set by
/// the front-end through `Builder::add_yy_stype` (§4.A, `AddYYSType`),
/// since the grammar source itself declares it.
#[derive(Debug, Clone)]
pub struct PegConfig {
  /// Inline a referenced rule's body at the call site when the referee
  /// has exactly one static use. See §4.H.
  pub inline: bool,
  /// Enable the FIRST-set alternate optimizer (§4.G). When false the
  /// optimizer pass is skipped entirely and `Alternate` nodes are emitted
  /// as ordered, backtracking choices.
  pub switch: bool,
}

impl PegConfig {
  /// The sentinel rune appended to the input buffer to mark end-of-input.
  pub const END_SYMBOL: char = '\u{0004}';
  /// Token-tree offset widths the generator must support, in promotion
  /// order.
  pub const TOKEN_SIZES: [u32; 2] = [16, 32];
}

impl Default for PegConfig {
  fn default() -> Self {
    Self { inline: false, switch: false }
  }
}

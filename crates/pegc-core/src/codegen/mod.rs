//! The code generator (§4.H, component H) and its emission template
//! (§4.I, component I). `emit` compiles individual IR nodes to Rust
//! expression text; `labels` allocates the (here, mostly vestigial —
//! see its module doc) label names; `template` assembles the full
//! output file around the generated rule bodies.

mod emit;
mod labels;
mod template;

pub use emit::{compile_expr, sanitize_ident, EmitCtx};
pub use labels::LabelAllocator;
pub use template::generate;

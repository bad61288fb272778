mod builder;
mod char_set;
mod node;

pub use builder::{Builder, Tree};
pub use char_set::CharSet;
pub use node::{Arena, Node, NodeId, NodeKind, RuleMap};

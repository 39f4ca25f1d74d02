mod command;
mod cursor;
mod evaluate;
mod inline;
mod links;
mod lookup;
mod node;
mod parser;

pub use evaluate::{EvalNode, Rendered, evaluate};
pub use links::{LinkRef, extract_links};
pub use lookup::Lookup;
pub use node::{AttrValue, Node, NodeId, NodeKind, Tree};
pub use parser::parse;

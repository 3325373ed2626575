mod document;
mod error;

pub use document::{Document, ElementData, Node, NodeId, NodeKind};
pub use error::TreeError;

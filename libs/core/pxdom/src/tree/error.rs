use super::NodeId;

// -----------------------------------------------------------------------------
// TreeError
// -----------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error)]
pub enum TreeError {
    #[error("node {node} is not an element")]
    NotAnElement { node: NodeId },
    #[error("node {node} is not a text node")]
    NotAText { node: NodeId },
    #[error("node {node} is already attached to a parent")]
    AlreadyAttached { node: NodeId },
    #[error("node {node} cannot be inserted into itself")]
    SelfInsertion { node: NodeId },
}

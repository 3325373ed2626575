use crate::tree::NodeId;

// -----------------------------------------------------------------------------
// MutationKind
// -----------------------------------------------------------------------------
/// The kind of a recorded mutation.
///
/// Attribute changes are deliberately not modeled; only structural inserts
/// and text replacements feed the rewriting pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// A child node was inserted under the target element.
    ChildList,
    /// The content of the target text node was replaced.
    CharacterData,
}

// -----------------------------------------------------------------------------
// MutationRecord
// -----------------------------------------------------------------------------
/// A single entry of the document's mutation journal.
///
/// For [`MutationKind::ChildList`] the target is the parent that received
/// the insertion; for [`MutationKind::CharacterData`] it is the text node
/// whose content changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutationRecord {
    pub kind: MutationKind,
    pub target: NodeId,
}

//! The display tree as seen by the loader.
//!
//! The [`Document`] trait is the only way discovery and the controller touch
//! the page, so the rest of the crate is independent of any particular tree.
//! [`PageTree`] is the in-memory implementation used by the CLI and tests.
//!
//! Picture data never lives on the nodes themselves; the controller keys its
//! own table by [`NodeId`].

mod tree;

pub use tree::PageTree;

use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PageError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("node {0} is already attached")]
    AlreadyAttached(NodeId),
}

/// Stable identity of an element within one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element operations the loader needs from a page.
///
/// Mirrors the handful of DOM calls a browser page offers: read the root
/// classification, list images, walk to parents, move nodes and write
/// attributes and inline styles.
pub trait Document {
    /// Class list of the page root (the `body` element).
    fn root_class(&self) -> String;

    /// Every attached `img` element, in document order.
    fn images(&self) -> Vec<NodeId>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Lower-case tag name.
    fn tag_name(&self, node: NodeId) -> Option<String>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Create a detached element.
    fn create_element(&mut self, tag: &str) -> NodeId;

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), PageError>;

    /// Attach `node` to `parent` immediately before `reference`.
    fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: NodeId,
    ) -> Result<(), PageError>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), PageError>;

    /// Set one inline style property, e.g. `max-height`.
    fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<(), PageError>;

    /// Convenience for the `class` attribute.
    fn class_name(&self, node: NodeId) -> String {
        self.attribute(node, "class").unwrap_or_default()
    }
}

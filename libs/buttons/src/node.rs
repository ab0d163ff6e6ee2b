use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A node of the binary protocol's side-channel metadata.
///
/// Attributes are kept sorted so two trees with the same content serialize identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryNode {
    pub tag: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<BinaryNode>>,
}

impl BinaryNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: BTreeMap::new(),
            content: None,
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: BinaryNode) -> Self {
        self.content.get_or_insert_with(Vec::new).push(child);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    pub fn children(&self) -> &[BinaryNode] {
        self.content.as_deref().unwrap_or(&[])
    }

    /// Number of levels in the tree, counting this node.
    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(BinaryNode::depth)
            .max()
            .unwrap_or(0)
    }
}

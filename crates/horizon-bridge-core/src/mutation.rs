//! Host tree mutations produced by a renderer commit.
//!
//! A commit is an ordered list of [`Mutation`]s. Each variant carries only the
//! fields it needs; the host tree matches on them exhaustively when applying
//! a batch.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::node::InstanceId;

/// A single change to the host tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    /// Materialize a new element (and its subtree) under `parent`.
    ///
    /// With `before` set the element is placed in front of that sibling,
    /// otherwise it is appended.
    Insert {
        /// The node that receives the new child.
        parent: InstanceId,
        /// Sibling to insert in front of.
        before: Option<InstanceId>,
        /// The element to create.
        element: HostElement,
    },
    /// Change attributes or text of an existing node in place.
    Update {
        /// The node to update.
        id: InstanceId,
        /// Attributes to set. Existing keys keep their position.
        #[serde(default)]
        set_attributes: Vec<(String, Value)>,
        /// Attribute keys to drop.
        #[serde(default)]
        remove_attributes: Vec<String>,
        /// Change to the text payload.
        #[serde(default)]
        text: TextUpdate,
    },
    /// Relocate an existing node, keeping its identity and subtree.
    Move {
        /// The node to move.
        id: InstanceId,
        /// The new parent.
        parent: InstanceId,
        /// Sibling to move in front of, or `None` to append.
        before: Option<InstanceId>,
    },
    /// Destroy a node and its whole subtree.
    Remove {
        /// The node to remove.
        id: InstanceId,
    },
}

impl Mutation {
    /// Append `element` to `parent`.
    pub fn append(parent: InstanceId, element: HostElement) -> Self {
        Self::Insert {
            parent,
            before: None,
            element,
        }
    }

    /// Insert `element` under `parent` in front of `before`.
    pub fn insert_before(parent: InstanceId, before: InstanceId, element: HostElement) -> Self {
        Self::Insert {
            parent,
            before: Some(before),
            element,
        }
    }

    /// Set a single attribute on `id`.
    pub fn set_attribute(id: InstanceId, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Update {
            id,
            set_attributes: vec![(key.into(), value.into())],
            remove_attributes: Vec::new(),
            text: TextUpdate::Keep,
        }
    }

    /// Replace the text payload of `id`.
    pub fn set_text(id: InstanceId, text: impl Into<String>) -> Self {
        Self::Update {
            id,
            set_attributes: Vec::new(),
            remove_attributes: Vec::new(),
            text: TextUpdate::Set(text.into()),
        }
    }

    /// Remove `id` and its subtree.
    pub fn remove(id: InstanceId) -> Self {
        Self::Remove { id }
    }

    /// Short operation name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "insert",
            Self::Update { .. } => "update",
            Self::Move { .. } => "move",
            Self::Remove { .. } => "remove",
        }
    }
}

/// How an [`Mutation::Update`] changes a node's text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextUpdate {
    /// Leave the text as is.
    #[default]
    Keep,
    /// Replace the text.
    Set(String),
    /// Drop the text payload.
    Clear,
}

/// Description of an element to materialize in the host tree.
///
/// This is also the element type the scripted test renderer mounts.
///
/// ```
/// use horizon_bridge_core::{HostElement, InstanceId};
///
/// let view = HostElement::new(InstanceId::new(1), "view")
///     .attr("class", "page")
///     .child(HostElement::new(InstanceId::new(2), "text").text("hello"));
/// assert_eq!(view.children.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostElement {
    /// Identity assigned by the renderer.
    pub id: InstanceId,
    /// Host component tag, e.g. `view` or `cover-view`.
    pub tag: String,
    /// Attributes in declaration order.
    #[serde(default)]
    pub attributes: Vec<(String, Value)>,
    /// Optional text payload.
    #[serde(default)]
    pub text: Option<String>,
    /// Child elements in render order.
    #[serde(default)]
    pub children: Vec<HostElement>,
}

impl HostElement {
    /// Create an element with no attributes, text or children.
    pub fn new(id: InstanceId, tag: impl Into<String>) -> Self {
        Self {
            id,
            tag: tag.into(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Add an attribute.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Set the text payload.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Append a child element.
    pub fn child(mut self, child: HostElement) -> Self {
        self.children.push(child);
        self
    }

    /// Number of elements in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        let mut len = 0;
        let mut stack = vec![self];
        while let Some(element) = stack.pop() {
            len += 1;
            stack.extend(&element.children);
        }
        len
    }

    /// Number of levels in this subtree; a leaf has height 1.
    pub fn height(&self) -> usize {
        let mut height: usize = 0;
        let mut stack = vec![(self, 1)];
        while let Some((element, level)) = stack.pop() {
            height = height.max(level);
            stack.extend(element.children.iter().map(|c| (c, level + 1)));
        }
        height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_builder() {
        let el = HostElement::new(InstanceId::new(1), "view")
            .attr("class", "a")
            .text("hi")
            .child(HostElement::new(InstanceId::new(2), "text"))
            .child(HostElement::new(InstanceId::new(3), "image"));

        assert_eq!(el.attributes, vec![("class".to_string(), Value::from("a"))]);
        assert_eq!(el.text.as_deref(), Some("hi"));
        assert_eq!(el.subtree_len(), 3);
        assert_eq!(el.height(), 2);
    }

    #[test]
    fn test_deep_element_measures() {
        let mut chain = HostElement::new(InstanceId::new(10_000), "view");
        for raw in (1..10_000).rev() {
            chain = HostElement::new(InstanceId::new(raw), "view").child(chain);
        }
        assert_eq!(chain.subtree_len(), 10_000);
        assert_eq!(chain.height(), 10_000);

        // Unwind by hand; the derived drop recurses per level.
        let mut next = Some(chain);
        while let Some(mut element) = next {
            next = element.children.pop();
        }
    }

    #[test]
    fn test_mutation_serde_shape() {
        let m = Mutation::remove(InstanceId::new(7));
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json, serde_json::json!({ "op": "remove", "id": 7 }));

        let back: Mutation = serde_json::from_value(serde_json::json!({
            "op": "update",
            "id": 3,
            "set_attributes": [["hidden", true]]
        }))
        .unwrap();
        assert_eq!(back, Mutation::set_attribute(InstanceId::new(3), "hidden", true));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Mutation::remove(InstanceId::new(1)).kind(), "remove");
        assert_eq!(Mutation::set_text(InstanceId::new(1), "x").kind(), "update");
    }
}

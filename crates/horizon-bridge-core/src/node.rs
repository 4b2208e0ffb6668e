//! Host node tree for Horizon Bridge.
//!
//! Provides the tree the host runtime paints from:
//! - Renderer-assigned identities ([`InstanceId`]) mapped onto arena storage
//! - Parent-child ownership with cascade destruction
//! - Atomic application of mutation batches, undone step by step on failure
//! - A nesting limit ([`MAX_DEPTH`]) below the container
//! - Owned, serializable snapshots ([`HostNode`])
//!
//! # Key Types
//!
//! - [`HostTree`] - Arena holding the live tree, owned by the adaptor
//! - [`HostNode`] - Snapshot of one node and its subtree
//! - [`InstanceId`] - Stable identity of a rendered element
//!
//! Parent links are arena keys used for lookup only. A node is owned by the
//! child list of its parent, and removing a node destroys its whole subtree.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use slotmap::{new_key_type, SlotMap};

use crate::error::TreeError;
use crate::logging::targets;
use crate::mutation::{HostElement, Mutation, TextUpdate};

/// Result type for tree operations.
pub type TreeResult<T> = std::result::Result<T, TreeError>;

/// Stable identity of a rendered element, assigned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Reserved identity of the container node.
    pub const CONTAINER: InstanceId = InstanceId(0);

    /// Create an id from a raw value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw u64 value of this id.
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Whether this is the container id.
    pub fn is_container(self) -> bool {
        self == Self::CONTAINER
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tag of the container sentinel.
pub const CONTAINER_TAG: &str = "#container";

/// Deepest level a node may occupy below the container.
///
/// Inserts and moves that would nest deeper fail with
/// [`TreeError::TooDeep`], so snapshots and their derived trait impls stay
/// within a thread's stack.
pub const MAX_DEPTH: usize = 512;

/// Owned snapshot of a host node and its subtree.
///
/// This is what [`crate::AdaptorInstance::container`] returns and what the
/// host runtime receives as render data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostNode {
    /// Identity of the node.
    pub id: InstanceId,
    /// Host component tag.
    pub tag: String,
    /// Attributes in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<(String, Value)>,
    /// Text payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Children in render order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<HostNode>,
}

impl HostNode {
    /// The empty container, as seen for a null root.
    pub fn empty_container() -> Self {
        Self {
            id: InstanceId::CONTAINER,
            tag: CONTAINER_TAG.to_string(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Whether this node has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Look up an attribute value.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Find a node in this subtree by id.
    pub fn find(&self, id: InstanceId) -> Option<&HostNode> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.id == id {
                return Some(node);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Ids of the direct children, in order.
    pub fn child_ids(&self) -> Vec<InstanceId> {
        self.children.iter().map(|c| c.id).collect()
    }

    /// Number of descendants (not counting `self`).
    pub fn descendant_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&HostNode> = self.children.iter().collect();
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(&node.children);
        }
        count
    }
}

new_key_type! {
    /// Arena key of a node inside a [`HostTree`].
    struct NodeKey;
}

/// How to revert one applied mutation.
#[derive(Debug)]
enum Undo {
    /// Detach and free the inserted subtree.
    Insert { key: NodeKey },
    /// Restore the previous attributes and text.
    Update {
        key: NodeKey,
        attributes: Vec<(String, Value)>,
        text: Option<String>,
    },
    /// Put the node back at its old place.
    Move {
        key: NodeKey,
        parent: NodeKey,
        position: usize,
    },
    /// Re-attach and re-index the removed subtree.
    Remove {
        key: NodeKey,
        parent: NodeKey,
        position: usize,
    },
}

/// Internal data stored in the arena for each node.
#[derive(Debug, Clone)]
struct NodeData {
    id: InstanceId,
    tag: String,
    attributes: Vec<(String, Value)>,
    text: Option<String>,
    /// Lookup-only back reference.
    parent: Option<NodeKey>,
    /// Owned children.
    children: Vec<NodeKey>,
}

impl NodeData {
    fn new(id: InstanceId, tag: String) -> Self {
        Self {
            id,
            tag,
            attributes: Vec::new(),
            text: None,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// The live host tree.
///
/// Uses arena storage via SlotMap plus an index from renderer identities to
/// arena keys. The container node always exists.
#[derive(Debug, Clone)]
pub struct HostTree {
    nodes: SlotMap<NodeKey, NodeData>,
    index: HashMap<InstanceId, NodeKey>,
    container: NodeKey,
}

impl Default for HostTree {
    fn default() -> Self {
        Self::new()
    }
}

impl HostTree {
    /// Create a tree holding only the empty container.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let container = nodes.insert(NodeData::new(
            InstanceId::CONTAINER,
            CONTAINER_TAG.to_string(),
        ));
        let mut index = HashMap::new();
        index.insert(InstanceId::CONTAINER, container);
        Self {
            nodes,
            index,
            container,
        }
    }

    /// Whether a node with this id is in the tree.
    pub fn contains(&self, id: InstanceId) -> bool {
        self.index.contains_key(&id)
    }

    /// Number of nodes, not counting the container.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Whether the container has no descendants.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parent of a node. The container has no parent.
    pub fn parent(&self, id: InstanceId) -> TreeResult<Option<InstanceId>> {
        let data = self.data(id)?;
        Ok(data.parent.map(|p| self.nodes[p].id))
    }

    /// Direct children of a node, in order.
    pub fn children(&self, id: InstanceId) -> TreeResult<Vec<InstanceId>> {
        let data = self.data(id)?;
        Ok(data.children.iter().map(|&c| self.nodes[c].id).collect())
    }

    /// Tag of a node.
    pub fn tag(&self, id: InstanceId) -> TreeResult<&str> {
        self.data(id).map(|d| d.tag.as_str())
    }

    /// Attribute names of a node, in order.
    pub fn attribute_names(&self, id: InstanceId) -> TreeResult<Vec<&str>> {
        let data = self.data(id)?;
        Ok(data.attributes.iter().map(|(k, _)| k.as_str()).collect())
    }

    /// Snapshot of the whole tree from the container down.
    pub fn snapshot(&self) -> HostNode {
        self.snapshot_key(self.container)
    }

    /// Snapshot of the subtree rooted at `id`.
    pub fn snapshot_node(&self, id: InstanceId) -> TreeResult<HostNode> {
        let key = self.key(id)?;
        Ok(self.snapshot_key(key))
    }

    fn snapshot_key(&self, key: NodeKey) -> HostNode {
        // Each frame holds a node and the snapshots of its children so far.
        let mut stack = vec![(key, Vec::new())];
        loop {
            let Some((current, children)) = stack.last_mut() else {
                return HostNode::empty_container();
            };
            let data = &self.nodes[*current];
            if let Some(&next) = data.children.get(children.len()) {
                stack.push((next, Vec::new()));
                continue;
            }
            let node = HostNode {
                id: data.id,
                tag: data.tag.clone(),
                attributes: data.attributes.clone(),
                text: data.text.clone(),
                children: std::mem::take(children),
            };
            stack.pop();
            match stack.last_mut() {
                Some((_, siblings)) => siblings.push(node),
                None => return node,
            }
        }
    }

    /// Apply a batch of mutations atomically.
    ///
    /// Every mutation checks its preconditions before touching the tree and
    /// records how to undo itself. If one fails, the recorded steps are
    /// undone in reverse and the tree is left as it was. The cost is
    /// proportional to the batch, not to the tree.
    #[tracing::instrument(skip_all, target = "horizon_bridge_core::node", level = "trace")]
    pub fn apply_batch(&mut self, mutations: &[Mutation]) -> TreeResult<()> {
        let mut journal = Vec::with_capacity(mutations.len());
        for mutation in mutations {
            match self.apply(mutation) {
                Ok(undo) => journal.push(undo),
                Err(err) => {
                    tracing::debug!(target: targets::NODE, op = mutation.kind(), %err, undone = journal.len(), "mutation batch rejected");
                    self.roll_back(journal);
                    return Err(err);
                }
            }
        }
        self.release(journal);
        tracing::trace!(target: targets::NODE, count = mutations.len(), nodes = self.len(), "mutation batch applied");
        Ok(())
    }

    /// Apply one mutation in place.
    ///
    /// A failing mutation leaves the tree unchanged.
    fn apply(&mut self, mutation: &Mutation) -> TreeResult<Undo> {
        match mutation {
            Mutation::Insert {
                parent,
                before,
                element,
            } => self.insert(*parent, *before, element),
            Mutation::Update {
                id,
                set_attributes,
                remove_attributes,
                text,
            } => self.update(*id, set_attributes, remove_attributes, text),
            Mutation::Move { id, parent, before } => self.move_node(*id, *parent, *before),
            Mutation::Remove { id } => self.remove(*id),
        }
    }

    /// Undo applied mutations, newest first.
    fn roll_back(&mut self, journal: Vec<Undo>) {
        for undo in journal.into_iter().rev() {
            match undo {
                Undo::Insert { key } => {
                    self.detach(key);
                    self.free_subtree(key);
                }
                Undo::Update {
                    key,
                    attributes,
                    text,
                } => {
                    let data = &mut self.nodes[key];
                    data.attributes = attributes;
                    data.text = text;
                }
                Undo::Move {
                    key,
                    parent,
                    position,
                } => {
                    self.detach(key);
                    self.attach(key, parent, position);
                }
                Undo::Remove {
                    key,
                    parent,
                    position,
                } => {
                    self.attach(key, parent, position);
                    self.index_subtree(key);
                }
            }
        }
    }

    /// Free the arena entries of subtrees removed by a committed batch.
    fn release(&mut self, journal: Vec<Undo>) {
        for undo in journal {
            if let Undo::Remove { key, .. } = undo {
                self.free_subtree(key);
            }
        }
    }

    fn insert(
        &mut self,
        parent: InstanceId,
        before: Option<InstanceId>,
        element: &HostElement,
    ) -> TreeResult<Undo> {
        let parent_key = self.key(parent)?;
        let position = self.position_in(parent_key, before)?;
        self.check_new_ids(element)?;
        let depth = self.depth(parent_key) + element.height();
        if depth > MAX_DEPTH {
            return Err(TreeError::TooDeep {
                id: element.id,
                depth,
            });
        }

        let key = self.materialize(element);
        self.attach(key, parent_key, position);
        Ok(Undo::Insert { key })
    }

    /// Fail if any id in `element` is already in the tree or repeats.
    fn check_new_ids(&self, element: &HostElement) -> TreeResult<()> {
        let mut seen = HashSet::new();
        let mut stack = vec![element];
        while let Some(current) = stack.pop() {
            if self.index.contains_key(&current.id) || !seen.insert(current.id) {
                return Err(TreeError::DuplicateNode(current.id));
            }
            stack.extend(&current.children);
        }
        Ok(())
    }

    /// Create arena entries for `element` and its children, returning the
    /// detached subtree root. Ids must already be checked.
    fn materialize(&mut self, element: &HostElement) -> NodeKey {
        let root = self.create(element);
        let mut stack = vec![(element, root)];
        while let Some((current, key)) = stack.pop() {
            for child in &current.children {
                let child_key = self.create(child);
                let end = self.nodes[key].children.len();
                self.attach(child_key, key, end);
                stack.push((child, child_key));
            }
        }
        root
    }

    fn create(&mut self, element: &HostElement) -> NodeKey {
        let mut data = NodeData::new(element.id, element.tag.clone());
        data.attributes = element.attributes.clone();
        data.text = element.text.clone();
        let key = self.nodes.insert(data);
        self.index.insert(element.id, key);
        key
    }

    fn update(
        &mut self,
        id: InstanceId,
        set_attributes: &[(String, Value)],
        remove_attributes: &[String],
        text: &TextUpdate,
    ) -> TreeResult<Undo> {
        if id.is_container() {
            return Err(TreeError::ContainerImmutable);
        }
        let key = self.key(id)?;
        let data = &mut self.nodes[key];
        let undo = Undo::Update {
            key,
            attributes: data.attributes.clone(),
            text: data.text.clone(),
        };

        for (name, value) in set_attributes {
            match data.attributes.iter_mut().find(|(k, _)| k == name) {
                Some((_, existing)) => *existing = value.clone(),
                None => data.attributes.push((name.clone(), value.clone())),
            }
        }
        data.attributes
            .retain(|(k, _)| !remove_attributes.iter().any(|r| r == k));

        match text {
            TextUpdate::Keep => {}
            TextUpdate::Set(t) => data.text = Some(t.clone()),
            TextUpdate::Clear => data.text = None,
        }
        Ok(undo)
    }

    fn move_node(
        &mut self,
        id: InstanceId,
        parent: InstanceId,
        before: Option<InstanceId>,
    ) -> TreeResult<Undo> {
        if id.is_container() {
            return Err(TreeError::ContainerImmutable);
        }
        let key = self.key(id)?;
        let parent_key = self.key(parent)?;
        if self.is_ancestor_of(key, parent_key) {
            return Err(TreeError::CircularParentage(id));
        }
        if before == Some(id) {
            return Err(TreeError::UnknownNode(id));
        }
        let mut position = self.position_in(parent_key, before)?;
        let depth = self.depth(parent_key) + self.subtree_height(key);
        if depth > MAX_DEPTH {
            return Err(TreeError::TooDeep { id, depth });
        }
        let (old_parent, old_position) = self.location(key).ok_or(TreeError::UnknownNode(id))?;

        if old_parent == parent_key && old_position < position {
            position -= 1;
        }
        self.detach(key);
        self.attach(key, parent_key, position);
        Ok(Undo::Move {
            key,
            parent: old_parent,
            position: old_position,
        })
    }

    /// Unlink a node and its descendants from the tree and the id index.
    ///
    /// The arena entries stay until the batch commits so the removal can be
    /// undone.
    fn remove(&mut self, id: InstanceId) -> TreeResult<Undo> {
        if id.is_container() {
            return Err(TreeError::ContainerImmutable);
        }
        let key = self.key(id)?;
        let (parent, position) = self.location(key).ok_or(TreeError::UnknownNode(id))?;
        self.detach(key);
        self.unindex_subtree(key);
        Ok(Undo::Remove {
            key,
            parent,
            position,
        })
    }

    fn index_subtree(&mut self, key: NodeKey) {
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            let data = &self.nodes[current];
            self.index.insert(data.id, current);
            stack.extend(data.children.iter().copied());
        }
    }

    fn unindex_subtree(&mut self, key: NodeKey) {
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            let data = &self.nodes[current];
            if self.index.get(&data.id) == Some(&current) {
                self.index.remove(&data.id);
            }
            stack.extend(data.children.iter().copied());
        }
    }

    /// Drop the arena entries of a detached subtree.
    ///
    /// Index entries are only dropped while they still point into the
    /// subtree; a later insert in the same batch may have reused the id.
    fn free_subtree(&mut self, key: NodeKey) {
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(data) = self.nodes.remove(current) {
                if self.index.get(&data.id) == Some(&current) {
                    self.index.remove(&data.id);
                }
                stack.extend(data.children);
            }
        }
    }

    /// Remove every node except the container.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Index in `parent`'s children at which to insert, given an optional
    /// `before` sibling.
    fn position_in(&self, parent: NodeKey, before: Option<InstanceId>) -> TreeResult<usize> {
        let children = &self.nodes[parent].children;
        match before {
            None => Ok(children.len()),
            Some(sibling) => {
                let sibling_key = self.key(sibling)?;
                children
                    .iter()
                    .position(|&c| c == sibling_key)
                    .ok_or(TreeError::UnknownNode(sibling))
            }
        }
    }

    fn attach(&mut self, key: NodeKey, parent: NodeKey, position: usize) {
        self.nodes[parent].children.insert(position, key);
        self.nodes[key].parent = Some(parent);
    }

    fn detach(&mut self, key: NodeKey) {
        if let Some(parent) = self.nodes[key].parent.take() {
            self.nodes[parent].children.retain(|&c| c != key);
        }
    }

    /// Parent of `key` and its index among the parent's children.
    fn location(&self, key: NodeKey) -> Option<(NodeKey, usize)> {
        let parent = self.nodes[key].parent?;
        let position = self.nodes[parent].children.iter().position(|&c| c == key)?;
        Some((parent, position))
    }

    /// Number of edges between `key` and the container.
    fn depth(&self, key: NodeKey) -> usize {
        let mut depth = 0;
        let mut current = self.nodes[key].parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.nodes[parent].parent;
        }
        depth
    }

    /// Number of levels in the subtree at `key`; a leaf has height 1.
    fn subtree_height(&self, key: NodeKey) -> usize {
        let mut height: usize = 0;
        let mut stack = vec![(key, 1)];
        while let Some((current, level)) = stack.pop() {
            height = height.max(level);
            stack.extend(self.nodes[current].children.iter().map(|&c| (c, level + 1)));
        }
        height
    }

    /// Check if `potential_ancestor` is `key` or one of its ancestors.
    fn is_ancestor_of(&self, potential_ancestor: NodeKey, key: NodeKey) -> bool {
        let mut current = Some(key);
        while let Some(current_key) = current {
            if current_key == potential_ancestor {
                return true;
            }
            current = self.nodes.get(current_key).and_then(|d| d.parent);
        }
        false
    }

    fn key(&self, id: InstanceId) -> TreeResult<NodeKey> {
        self.index
            .get(&id)
            .copied()
            .ok_or(TreeError::UnknownNode(id))
    }

    fn data(&self, id: InstanceId) -> TreeResult<&NodeData> {
        let key = self.key(id)?;
        Ok(&self.nodes[key])
    }
}

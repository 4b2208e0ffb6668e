//! Per-render-pass buffer of pending host tree mutations.
//!
//! Every commit from the renderer becomes an [`UpdateEntry`] keyed by its
//! [`RenderId`]. Entries start [`UpdateState::Pending`] and move to
//! [`UpdateState::Resolved`] exactly once. Only the last
//! [`RESOLVED_HISTORY`] resolved ids are remembered.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{AdaptorError, Result};
use crate::logging::targets;
use crate::mutation::Mutation;

/// Number of resolved render ids an [`UpdateQueue`] remembers.
pub const RESOLVED_HISTORY: usize = 256;

/// Opaque identifier of one render pass.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderId(String);

impl RenderId {
    /// Create a render id from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RenderId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RenderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Hands out distinct render ids (`render-1`, `render-2`, ...).
#[derive(Debug)]
pub struct RenderIdGenerator {
    next: AtomicU64,
}

impl Default for RenderIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderIdGenerator {
    /// Create a generator starting at `render-1`.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Produce the next id.
    pub fn next_id(&self) -> RenderId {
        RenderId(format!("render-{}", self.next.fetch_add(1, Ordering::Relaxed)))
    }
}

/// Resolution state of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    /// Buffered, not yet visible in the host tree.
    Pending,
    /// Applied to the host tree.
    Resolved,
}

/// One committed render pass.
#[derive(Debug, Clone)]
pub struct UpdateEntry {
    render_id: RenderId,
    mutations: Vec<Mutation>,
    state: UpdateState,
}

impl UpdateEntry {
    fn new(render_id: RenderId, mutations: Vec<Mutation>) -> Self {
        Self {
            render_id,
            mutations,
            state: UpdateState::Pending,
        }
    }

    /// The render id.
    pub fn render_id(&self) -> &RenderId {
        &self.render_id
    }

    /// The buffered mutations, in commit order.
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    /// Current state.
    pub fn state(&self) -> UpdateState {
        self.state
    }
}

/// Ordered buffer of committed render passes.
///
/// Pending entries are kept in commit order. The most recent
/// [`RESOLVED_HISTORY`] resolved ids are remembered, so committing under one
/// of them fails with [`AdaptorError::DuplicateRenderId`] and
/// [`state`](Self::state) reports it resolved. Older ids are forgotten and
/// may be committed again. Resolving an id that is not pending always fails.
#[derive(Debug, Default)]
pub struct UpdateQueue {
    pending: VecDeque<UpdateEntry>,
    resolved: HashSet<RenderId>,
    resolved_window: VecDeque<RenderId>,
}

impl UpdateQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a commit as pending.
    ///
    /// Fails if the id is pending or among the recently resolved ids.
    pub fn enqueue(&mut self, render_id: RenderId, mutations: Vec<Mutation>) -> Result<()> {
        if self.state(&render_id).is_some() {
            return Err(AdaptorError::DuplicateRenderId(render_id));
        }
        tracing::trace!(target: targets::QUEUE, %render_id, mutations = mutations.len(), "enqueued update");
        self.pending.push_back(UpdateEntry::new(render_id, mutations));
        Ok(())
    }

    /// The pending entry for `render_id`.
    ///
    /// Fails with [`AdaptorError::UnknownRenderId`] if the id is unknown or
    /// already resolved.
    pub fn pending_entry(&self, render_id: &RenderId) -> Result<&UpdateEntry> {
        self.pending
            .iter()
            .find(|e| &e.render_id == render_id)
            .ok_or_else(|| AdaptorError::UnknownRenderId(render_id.clone()))
    }

    /// The oldest pending entry.
    pub fn oldest_pending(&self) -> Result<&UpdateEntry> {
        self.pending.front().ok_or(AdaptorError::NoPendingUpdate)
    }

    /// Mark a pending entry resolved and drop its buffered mutations.
    pub fn mark_resolved(&mut self, render_id: &RenderId) -> Result<UpdateEntry> {
        let position = self
            .pending
            .iter()
            .position(|e| &e.render_id == render_id)
            .ok_or_else(|| AdaptorError::UnknownRenderId(render_id.clone()))?;
        let mut entry = self
            .pending
            .remove(position)
            .ok_or_else(|| AdaptorError::UnknownRenderId(render_id.clone()))?;
        entry.state = UpdateState::Resolved;
        self.remember_resolved(entry.render_id.clone());
        tracing::trace!(target: targets::QUEUE, %render_id, "resolved update");
        Ok(entry)
    }

    fn remember_resolved(&mut self, render_id: RenderId) {
        if self.resolved_window.len() == RESOLVED_HISTORY {
            if let Some(oldest) = self.resolved_window.pop_front() {
                self.resolved.remove(&oldest);
            }
        }
        self.resolved.insert(render_id.clone());
        self.resolved_window.push_back(render_id);
    }

    /// State of a render id, or `None` if it was never committed or has
    /// left the resolved window.
    pub fn state(&self, render_id: &RenderId) -> Option<UpdateState> {
        if self.resolved.contains(render_id) {
            Some(UpdateState::Resolved)
        } else if self.pending.iter().any(|e| &e.render_id == render_id) {
            Some(UpdateState::Pending)
        } else {
            None
        }
    }

    /// Pending render ids in commit order.
    pub fn pending_ids(&self) -> Vec<RenderId> {
        self.pending.iter().map(|e| e.render_id.clone()).collect()
    }

    /// Whether any entry is pending.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of pending entries.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Drop all entries and history.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.resolved.clear();
        self.resolved_window.clear();
    }
}

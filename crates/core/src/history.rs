//! Linear undo/redo over store snapshots
//!
//! Two unbounded stacks of full store states: `past` (oldest first) and
//! `future` (most-recently-undone first). The unit of undo is a whole store
//! snapshot, not a per-field diff, and the history is strictly linear - any
//! new mutation after an undo clears the redo stack.
//!
//! Snapshots entering the stacks come from [`AnnotationStore::snapshot`],
//! the explicit structural deep copy; nothing here serializes state to copy
//! it.

use crate::store::AnnotationStore;
use std::collections::VecDeque;

/// Undo/redo stacks for one editing session
#[derive(Debug, Default)]
pub struct History {
    past: Vec<AnnotationStore>,
    future: VecDeque<AnnotationStore>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the state captured immediately before a mutation
    ///
    /// Called exactly once per state-changing store operation; no-op store
    /// operations must not reach here. Clears the redo stack.
    pub fn record(&mut self, state_before: AnnotationStore) {
        self.past.push(state_before);
        self.future.clear();
    }

    /// Step back one state
    ///
    /// Pops the most recent past state, parks a snapshot of `current` at the
    /// front of the redo stack, and returns the popped state as the new
    /// current state. `None` when there is nothing to undo.
    pub fn undo(&mut self, current: &AnnotationStore) -> Option<AnnotationStore> {
        let restored = self.past.pop()?;
        self.future.push_front(current.snapshot());
        Some(restored)
    }

    /// Step forward one undone state; symmetric to [`History::undo`]
    pub fn redo(&mut self, current: &AnnotationStore) -> Option<AnnotationStore> {
        let restored = self.future.pop_front()?;
        self.past.push(current.snapshot());
        Some(restored)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Drop both stacks (document switch)
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    pub fn past_depth(&self) -> usize {
        self.past.len()
    }

    pub fn future_depth(&self) -> usize {
        self.future.len()
    }
}

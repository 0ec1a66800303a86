// Undo/redo history module for the editor.
// Every entry is a full copy of the canvas; index 0 is always the blank baseline.

use crate::Canvas;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
pub struct History {
    states: Vec<Canvas>,
    current_index: usize,
    max_states: Option<usize>,
}

impl History {
    pub fn new(baseline: Canvas) -> Self {
        Self {
            states: vec![baseline],
            current_index: 0,
            max_states: None,
        }
    }

    /// Cap the number of stored snapshots. The baseline is never evicted;
    /// once full, the oldest snapshot after it goes first. Limits below 2
    /// are raised to 2 so there is always something to undo to.
    pub fn with_limit(mut self, max_states: Option<usize>) -> Self {
        self.max_states = max_states.map(|m| m.max(2));
        self.enforce_limit();
        self
    }

    /// Drop everything and start over from `baseline`.
    pub fn reset(&mut self, baseline: Canvas) {
        debug!(discarded = self.states.len(), "resetting history");
        self.states.clear();
        self.states.push(baseline);
        self.current_index = 0;
    }

    /// Record a new state after the cursor, pruning any redo branch.
    pub fn push(&mut self, state: Canvas) {
        let pruned = self.states.len() - 1 - self.current_index;
        if pruned > 0 {
            debug!(pruned, "discarding redo branch");
            self.states.truncate(self.current_index + 1);
        }

        self.states.push(state);
        self.current_index = self.states.len() - 1;
        self.enforce_limit();
        trace!(
            len = self.states.len(),
            cursor = self.current_index,
            "history push"
        );
    }

    fn enforce_limit(&mut self) {
        let Some(max) = self.max_states else {
            return;
        };
        while self.states.len() > max {
            self.states.remove(1);
            self.current_index = self.current_index.saturating_sub(1);
        }
    }

    /// Step back one entry and return the state to show, if there is one.
    pub fn undo(&mut self) -> Option<&Canvas> {
        if !self.can_undo() {
            return None;
        }
        self.current_index -= 1;
        debug!(cursor = self.current_index, "undo");
        Some(&self.states[self.current_index])
    }

    /// Step forward one entry and return the state to show, if there is one.
    pub fn redo(&mut self) -> Option<&Canvas> {
        if !self.can_redo() {
            return None;
        }
        self.current_index += 1;
        debug!(cursor = self.current_index, "redo");
        Some(&self.states[self.current_index])
    }

    pub fn can_undo(&self) -> bool {
        self.current_index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current_index + 1 < self.states.len()
    }

    pub fn current(&self) -> &Canvas {
        &self.states[self.current_index]
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    // Never empty: the baseline is always there.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.states.len()
    }
}

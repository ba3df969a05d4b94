use std::collections::VecDeque;

use crate::canvas::labels::LabelRegistry;
use crate::canvas::raster::LabelRaster;

/// Default number of undoable actions kept.
pub const UNDO_DEPTH: usize = 10;

/// Raster and label table captured before a single user action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub raster: LabelRaster,
    pub registry: LabelRegistry,
}

/// Bounded undo stack. The oldest snapshot is dropped once `capacity` is exceeded.
pub struct UndoHistory {
    undo_stack: VecDeque<Snapshot>,
    capacity: usize,
}

impl UndoHistory {
    /// Create an empty history holding at most `capacity` snapshots.
    pub fn new(capacity: usize) -> Self {
        Self {
            undo_stack: VecDeque::with_capacity(capacity.max(1)),
            capacity,
        }
    }

    /// Record the state that the next action is about to change.
    pub fn push(&mut self, snapshot: Snapshot) {
        if self.capacity == 0 {
            return;
        }
        self.undo_stack.push_back(snapshot);
        while self.undo_stack.len() > self.capacity {
            self.undo_stack.pop_front();
        }
    }

    /// Take the most recent snapshot, if any.
    pub fn pop(&mut self) -> Option<Snapshot> {
        self.undo_stack.pop_back()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
    }

    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(UNDO_DEPTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(marker: u8) -> Snapshot {
        let mut raster = LabelRaster::new(1, 1);
        raster.set(0, 0, marker);
        Snapshot {
            raster,
            registry: LabelRegistry::new(),
        }
    }

    #[test]
    fn oldest_entry_is_evicted() {
        let mut history = UndoHistory::new(3);
        for marker in 1..=5 {
            history.push(snapshot(marker));
        }
        assert_eq!(history.len(), 3);
        let popped: Vec<u8> = std::iter::from_fn(|| history.pop())
            .map(|s| s.raster.cells()[0])
            .collect();
        assert_eq!(popped, vec![5, 4, 3]);
        assert!(history.pop().is_none());
    }

    #[test]
    fn zero_capacity_records_nothing() {
        let mut history = UndoHistory::new(0);
        history.push(snapshot(1));
        assert!(history.is_empty());
    }
}

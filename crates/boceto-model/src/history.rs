//! Bounded undo/redo log of sketch snapshots.

use crate::HISTORY_MAX;
use crate::sketch::Sketch;

/// An ordered sequence of sketch snapshots with a cursor.
///
/// `sketches[index]` is the currently displayed state. The log is bounded to
/// [`HISTORY_MAX`] entries; when the bound is exceeded the oldest entries are
/// dropped from the front, never the tail.
#[derive(Debug, Clone)]
pub struct SketchHistory {
    index: usize,
    sketches: Vec<Sketch>,
}

impl SketchHistory {
    /// Starts a history at the given initial state.
    pub fn new(initial: Sketch) -> Self {
        Self {
            index: 0,
            sketches: vec![initial],
        }
    }

    /// The currently displayed snapshot.
    pub fn current(&self) -> &Sketch {
        &self.sketches[self.index]
    }

    /// Number of retained snapshots.
    pub fn len(&self) -> usize {
        self.sketches.len()
    }

    /// Always false: a history holds at least its initial state.
    pub fn is_empty(&self) -> bool {
        self.sketches.is_empty()
    }

    /// Cursor position within the retained snapshots.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Records a new snapshot at the cursor.
    ///
    /// No-op when `state` is structurally identical to the current snapshot,
    /// so re-renders without edits never pollute the log. Otherwise entries
    /// after the cursor are discarded (a new edit after undo forks the
    /// timeline), the state is appended, and the front is trimmed to the
    /// bound.
    pub fn record(&mut self, state: Sketch) {
        if state == self.sketches[self.index] {
            return;
        }

        self.sketches.truncate(self.index + 1);
        self.sketches.push(state);
        self.index = self.sketches.len() - 1;

        if self.sketches.len() > HISTORY_MAX {
            let excess = self.sketches.len() - HISTORY_MAX;
            self.sketches.drain(..excess);
            self.index -= excess;
        }
    }

    /// Moves the cursor one snapshot back and returns the new current state.
    /// No-op at the oldest entry.
    pub fn undo(&mut self) -> &Sketch {
        self.index = self.index.saturating_sub(1);
        self.current()
    }

    /// Moves the cursor one snapshot forward and returns the new current
    /// state. No-op at the newest entry.
    pub fn redo(&mut self) -> &Sketch {
        self.index = (self.index + 1).min(self.sketches.len() - 1);
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Sketch {
        Sketch::new(name)
    }

    #[test]
    fn record_skips_unchanged_state() {
        let mut history = SketchHistory::new(named("a"));
        history.record(named("a"));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn record_appends_and_advances() {
        let mut history = SketchHistory::new(named("a"));
        history.record(named("b"));
        history.record(named("c"));
        assert_eq!(history.len(), 3);
        assert_eq!(history.current().name, "c");
    }

    #[test]
    fn undo_and_redo_clamp_at_bounds() {
        let mut history = SketchHistory::new(named("a"));
        history.record(named("b"));

        assert_eq!(history.undo().name, "a");
        assert_eq!(history.undo().name, "a");
        assert_eq!(history.redo().name, "b");
        assert_eq!(history.redo().name, "b");
    }

    #[test]
    fn edit_after_undo_discards_redo_branch() {
        let mut history = SketchHistory::new(named("a"));
        history.record(named("b"));
        history.record(named("c"));

        history.undo();
        history.record(named("d"));

        assert_eq!(history.len(), 3);
        assert_eq!(history.current().name, "d");
        // "c" is gone: redo stays on "d".
        assert_eq!(history.redo().name, "d");
    }

    #[test]
    fn bound_drops_oldest_entries() {
        let mut history = SketchHistory::new(named("s0"));
        for i in 1..=crate::HISTORY_MAX + 5 {
            history.record(named(&format!("s{i}")));
        }

        assert_eq!(history.len(), crate::HISTORY_MAX);
        let newest = format!("s{}", crate::HISTORY_MAX + 5);
        assert_eq!(history.current().name, newest);

        // The retained window is the most recent entries, in order.
        let mut cursor = history.clone();
        for _ in 0..crate::HISTORY_MAX {
            cursor.undo();
        }
        assert_eq!(cursor.current().name, "s6");
    }
}

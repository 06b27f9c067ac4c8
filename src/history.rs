//! Bounded window of recently executed steps.

use std::collections::VecDeque;

use crate::instruction::MoveStep;

/// Number of steps the window retains.
pub const HISTORY_CAPACITY: usize = 10;

/// FIFO window of the last executed [`MoveStep`]s, most recent last.
///
/// Owned by the driving loop for the duration of one experiment run; mutated
/// only by [`push`](MoveHistory::push) and by the correction pass's
/// [`rewrite_all`](MoveHistory::rewrite_all). Never persisted.
#[derive(Clone, Debug, Default)]
pub struct MoveHistory {
    entries: VecDeque<MoveStep>,
}

impl MoveHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step, evicting the oldest entry once the window is full.
    pub fn push(&mut self, step: MoveStep) {
        self.entries.push_back(step);
        while self.entries.len() > HISTORY_CAPACITY {
            self.entries.pop_front();
        }
    }

    /// Number of entries equal to `step`.
    pub fn count(&self, step: MoveStep) -> usize {
        self.entries.iter().filter(|&&s| s == step).count()
    }

    /// Rewrite every entry equal to `from` into `to`, in place.
    /// Returns how many entries were rewritten.
    pub fn rewrite_all(&mut self, from: MoveStep, to: MoveStep) -> usize {
        let mut rewritten = 0;
        for entry in self.entries.iter_mut() {
            if *entry == from {
                *entry = to;
                rewritten += 1;
            }
        }
        rewritten
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest-first iteration over the window.
    pub fn iter(&self) -> impl Iterator<Item = &MoveStep> {
        self.entries.iter()
    }
}

impl FromIterator<MoveStep> for MoveHistory {
    fn from_iter<I: IntoIterator<Item = MoveStep>>(iter: I) -> Self {
        let mut history = MoveHistory::new();
        for step in iter {
            history.push(step);
        }
        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eviction_keeps_most_recent_ten() {
        let mut history = MoveHistory::new();
        for _ in 0..HISTORY_CAPACITY {
            history.push(MoveStep::Forward);
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);

        history.push(MoveStep::Left);
        assert_eq!(history.len(), HISTORY_CAPACITY);
        // Oldest evicted, newest at the back.
        assert_eq!(history.iter().last(), Some(&MoveStep::Left));
        assert_eq!(history.count(MoveStep::Forward), HISTORY_CAPACITY - 1);
    }

    #[test]
    fn test_rewrite_all_counts_only_rewritten() {
        let mut history: MoveHistory = [
            MoveStep::Forward,
            MoveStep::Backward,
            MoveStep::Forward,
            MoveStep::Left,
        ]
        .into_iter()
        .collect();

        let rewritten = history.rewrite_all(MoveStep::Forward, MoveStep::Backward);
        assert_eq!(rewritten, 2);
        assert_eq!(history.count(MoveStep::Backward), 3);
        assert_eq!(history.count(MoveStep::Forward), 0);
        assert_eq!(history.count(MoveStep::Left), 1);
    }
}

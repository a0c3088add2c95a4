//! Edge detector: classifies effective-value transitions per binding

/// Classification of the current cycle relative to the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Unchanged,
    /// false -> true
    Rose,
    /// true -> false
    Fell,
}

/// Tracks the previous effective boolean for one binding.
///
/// The very first observation compares equal to itself, so a binding whose
/// switch is already ON at startup produces `Unchanged`, not a spurious
/// trigger.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeDetector {
    last: Option<bool>,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Classifies `current` against the stored value and always updates the
    /// stored value, so repeated identical snapshots can never re-trigger.
    pub fn observe(&mut self, current: bool) -> Edge {
        let edge = match self.last {
            None => Edge::Unchanged,
            Some(last) if last == current => Edge::Unchanged,
            Some(false) => Edge::Rose,
            Some(true) => Edge::Fell,
        };
        self.last = Some(current);
        edge
    }

    /// Last observed effective value, if any cycle has run yet.
    pub fn last(&self) -> Option<bool> {
        self.last
    }
}

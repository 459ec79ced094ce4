use crate::pta::element::PointerId;
use crate::pta::pts::PointsToSet;
use std::collections::VecDeque;

/// Pending propagations: objects still to be added to a pointer.
#[derive(Debug, Default)]
pub struct WorkList {
    entries: VecDeque<(PointerId, PointsToSet)>,
}

impl WorkList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, ptr: PointerId, delta: PointsToSet) {
        if !delta.is_empty() {
            self.entries.push_back((ptr, delta));
        }
    }

    pub fn pop(&mut self) -> Option<(PointerId, PointsToSet)> {
        self.entries.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pta::arena::Idx;

    #[test]
    fn fifo_without_empty_deltas() {
        let mut wl = WorkList::new();
        wl.push(Idx::new(0), PointsToSet::new());
        assert!(wl.is_empty());
        wl.push(Idx::new(1), PointsToSet::singleton(Idx::new(0)));
        wl.push(Idx::new(2), PointsToSet::singleton(Idx::new(1)));
        assert_eq!(wl.len(), 2);
        assert_eq!(wl.pop().map(|(p, _)| p), Some(Idx::new(1)));
        assert_eq!(wl.pop().map(|(p, _)| p), Some(Idx::new(2)));
        assert!(wl.pop().is_none());
    }
}

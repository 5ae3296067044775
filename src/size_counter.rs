use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

/// Logical entry count of a leader board.
///
/// Kept apart from the two indices so `size` is O(1) and never reflects a
/// half-applied mutation of either container. Writers only touch it while
/// holding the board's mutation lock; readers never lock.
#[derive(Debug, Default)]
pub(crate) struct SizeCounter {
    count: AtomicUsize,
}

impl SizeCounter {
    pub(crate) fn new() -> SizeCounter {
        SizeCounter {
            count: AtomicUsize::new(0),
        }
    }
    pub(crate) fn get(&self) -> usize {
        self.count.load(AtomicOrdering::SeqCst)
    }
    pub(crate) fn increment(&self) -> usize {
        self.count.fetch_add(1, AtomicOrdering::SeqCst) + 1
    }
    pub(crate) fn decrement(&self) -> usize {
        let previous = self.count.fetch_sub(1, AtomicOrdering::SeqCst);
        debug_assert_ne!(previous, 0, "size counter underflow");
        previous.wrapping_sub(1)
    }
}

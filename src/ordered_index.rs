use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt::{Debug, Error, Formatter};
use std::iter::FusedIterator;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::thread::yield_now;

use parking_lot::{Mutex, RwLock};
use tracing::trace;

use crate::config::LeaderBoardConfig;

#[derive(Debug, Clone)]
struct XorShift {
    state: u64,
}

impl XorShift {
    fn new(seed: u64) -> XorShift {
        XorShift { state: seed }
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        if x == 0 {
            x = 1;
        }
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

/// A key slot, padded with sentinels at both ends of every level.
#[derive(Debug)]
enum Slot<K> {
    Head,
    Entry(K),
    Tail,
}

impl<K> Slot<K> {
    fn as_borrowed<Q>(&self) -> Slot<&Q>
    where
        Q: Ord + ?Sized,
        K: Borrow<Q>,
    {
        match self {
            Slot::Head => Slot::Head,
            Slot::Entry(key) => Slot::Entry(key.borrow()),
            Slot::Tail => Slot::Tail,
        }
    }
    fn sentinel_order(&self) -> u8 {
        match self {
            Slot::Head => 0,
            Slot::Entry(_) => 1,
            Slot::Tail => 2,
        }
    }
}

impl<K: Ord> Ord for Slot<K> {
    fn cmp(&self, other: &Slot<K>) -> Ordering {
        match (self, other) {
            (Slot::Entry(key1), Slot::Entry(key2)) => key1.cmp(key2),
            _ => self.sentinel_order().cmp(&other.sentinel_order()),
        }
    }
}

impl<K: Ord> PartialOrd for Slot<K> {
    fn partial_cmp(&self, other: &Slot<K>) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord> PartialEq for Slot<K> {
    fn eq(&self, other: &Slot<K>) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K: Ord> Eq for Slot<K> {}

struct Node<K> {
    key: Slot<K>,
    forward: Vec<RwLock<Link<K>>>,

    // The RwLock guards on `forward` cannot be held across the hand-over-hand
    // walk, so each level carries its own spin flag for the writer that owns
    // the link.
    locks: Vec<AtomicBool>,
}

struct Link<K> {
    node: Arc<Node<K>>,
}

impl<K> Clone for Link<K> {
    fn clone(&self) -> Link<K> {
        Link {
            node: Arc::clone(&self.node),
        }
    }
}

impl<K> Link<K> {
    fn forward(&self, level: usize) -> Link<K> {
        self.node.forward[level].read().clone()
    }
    fn set_forward(&mut self, level: usize, link: &Link<K>) {
        let mut yield_yet = false;
        loop {
            if !yield_yet {
                yield_yet = true;
            } else {
                yield_now();
            }
            let node = self.node.as_ref();
            if node.locks.len() > level && node.locks[level].load(AtomicOrdering::SeqCst) {
                continue;
            }
            debug_assert_ne!(level, node.forward.len());
            *node.forward[level].write() = link.clone();
            break;
        }
    }
    fn locked_set_forward(&mut self, level: usize, link: &Link<K>) {
        let node = self.node.as_ref();
        debug_assert_ne!(level, node.forward.len());
        debug_assert!(node.locks[level].load(AtomicOrdering::SeqCst));
        *node.forward[level].write() = link.clone();
    }
    fn key(&self) -> &Slot<K> {
        &self.node.key
    }
    fn is_tail(&self) -> bool {
        matches!(self.node.key, Slot::Tail)
    }
    fn lock(&mut self, level: usize) {
        let mut yield_yet = false;
        loop {
            if !yield_yet {
                yield_yet = true;
            } else {
                yield_now();
            }
            let result = self.node.locks[level].compare_exchange(
                false,
                true,
                AtomicOrdering::SeqCst,
                AtomicOrdering::SeqCst,
            );
            if result.is_ok() {
                break;
            }
        }
    }
    fn unlock(&mut self, level: usize) {
        let result = self.node.locks[level].compare_exchange(
            true,
            false,
            AtomicOrdering::SeqCst,
            AtomicOrdering::SeqCst,
        );
        debug_assert!(result.is_ok());
    }
    fn level(&self) -> usize {
        self.node.forward.len() - 1
    }
}

impl<K: Ord> Link<K> {
    /// Walk level `i` from `self` and return the last node before `target`,
    /// with its level-`i` lock held.
    fn lock_before<Q>(&self, target: &Slot<&Q>, i: usize) -> Link<K>
    where
        Q: Ord + ?Sized,
        K: Borrow<Q>,
    {
        debug_assert!(self.level() >= i);
        debug_assert!(&self.key().as_borrowed() < target);
        let mut x = self.clone();
        let mut y = self.forward(i);
        while &y.key().as_borrowed() < target {
            x = y;
            y = x.forward(i);
        }

        x.lock(i);
        y = x.forward(i);
        while &y.key().as_borrowed() < target {
            x.unlock(i);
            x = y;
            x.lock(i);
            y = x.forward(i);
        }
        x // still locked
    }
}

/// A concurrent skip-list set kept in ascending key order.
///
/// The structure follows William Pugh's ["Concurrent Maintenance of Skip
/// Lists"]: writers lock one level of one node at a time, hand over hand,
/// so inserts and removals of different keys may run in parallel and
/// readers never block. Every method takes `&self`; share it across threads
/// behind an [`Arc`].
///
/// Position lookups ([`position_of`](OrderedIndex::position_of)) walk the
/// bottom level and cost O(n).
///
/// ```
/// use leaderboard::OrderedIndex;
///
/// let index: OrderedIndex<u32> = OrderedIndex::from([5_u32, 1, 3]);
/// assert_eq!(index.position_of(1), Some(3));
/// assert_eq!(index.range_inclusive(&2, &5), vec![3, 5]);
/// assert_eq!(index.remove(&3), Some(3));
/// assert_eq!(index.iter().collect::<Vec<_>>(), vec![1, 5]);
/// ```
///
/// ["Concurrent Maintenance of Skip Lists"]: https://15721.courses.cs.cmu.edu/spring2018/papers/08-oltpindexes1/pugh-skiplists-cacm1990.pdf
pub struct OrderedIndex<K> {
    head: Link<K>,
    max_level: usize,
    level_probability: f64,
    rng: Mutex<XorShift>,

    // Highest level known to be in use. Guarded by its own spin flag, as in
    // the paper.
    level_hint: AtomicUsize,
    level_hint_lock: AtomicBool,
}

impl<K: Ord> OrderedIndex<K> {
    /// Create an empty index with the default configuration.
    pub fn new() -> OrderedIndex<K> {
        Self::with_config(&LeaderBoardConfig::default())
    }

    /// Create an empty index using the level settings of `config`.
    pub fn with_config(config: &LeaderBoardConfig) -> OrderedIndex<K> {
        let max_level = config.max_level().max(1);
        let tail = Link {
            node: Arc::new(Node {
                key: Slot::Tail,
                forward: Vec::new(),
                locks: Vec::new(),
            }),
        };
        let head = Link {
            node: Arc::new(Node {
                key: Slot::Head,
                forward: (0..max_level + 1)
                    .map(|_i| RwLock::new(tail.clone()))
                    .collect(),
                locks: (0..max_level + 1)
                    .map(|_i| AtomicBool::new(false))
                    .collect(),
            }),
        };
        OrderedIndex {
            head,
            max_level,
            level_probability: config.level_probability(),
            rng: Mutex::new(XorShift::new(config.seed())),
            level_hint: AtomicUsize::new(0),
            level_hint_lock: AtomicBool::new(false),
        }
    }

    /// Look up the stored key equal to `key`.
    ///
    /// Note that the `Ord` implementation of `Q` must match that of `K`.
    pub fn get<Q>(&self, key: &Q) -> Option<K>
    where
        Q: Ord + ?Sized,
        K: Borrow<Q> + Clone,
    {
        let target = Slot::Entry(key);
        let mut x = self.head.clone();
        let mut y = x.clone();
        for i in (0..self.level_hint() + 1).rev() {
            y = x.forward(i);
            while y.key().as_borrowed() < target {
                x = y;
                y = x.forward(i);
            }
        }
        match y.key() {
            Slot::Entry(found) if <K as Borrow<Q>>::borrow(found) == key => Some(found.clone()),
            _ => None,
        }
    }

    /// Check whether a key equal to `key` is stored.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        Q: Ord + ?Sized,
        K: Borrow<Q> + Clone,
    {
        self.get(key).is_some()
    }

    /// Insert `key`.
    ///
    /// Returns `false`, leaving the index untouched, if an equal key is
    /// already present. Callers replacing an entry must remove the old key
    /// first.
    pub fn insert(&self, key: K) -> bool {
        let target = Slot::Entry(key);
        let mut updates = Vec::new();
        let mut x = self.head.clone();
        let big_l = self.level_hint();
        for i in (0..big_l + 1).rev() {
            let mut y = x.forward(i);
            while y.key() < &target {
                x = y;
                y = x.forward(i);
            }
            updates.push(x.clone());
        }
        updates.reverse();
        let mut x = x.lock_before(&target.as_borrowed::<K>(), 0);
        if x.forward(0).key() == &target {
            x.unlock(0);
            return false;
        }

        let new_level = self.random_level();
        let successor = x.forward(0);
        // The new node starts with its level-0 lock held, so a remover that
        // finds it at level 0 waits until every level is linked.
        let mut y = Link {
            node: Arc::new(Node {
                key: target,
                forward: (0..new_level + 1)
                    .map(|_i| RwLock::new(successor.clone()))
                    .collect(),
                locks: (0..new_level + 1)
                    .map(|i| AtomicBool::new(i == 0))
                    .collect(),
            }),
        };
        for i in 0..new_level + 1 {
            if i == 0 {
                y.locked_set_forward(0, &x.forward(0));
            } else {
                let update = updates.get(i).unwrap_or(&self.head);
                x = update.lock_before(&y.key().as_borrowed::<K>(), i);
                y.set_forward(i, &x.forward(i));
            }
            x.locked_set_forward(i, &y);
            x.unlock(i);
        }
        y.unlock(0);
        trace!(level = new_level, "ordered index insert");

        self.raise_level_hint();
        true
    }

    /// Remove the key equal to `key`, returning the stored key.
    ///
    /// Note that the `Ord` implementation of `Q` must match that of `K`.
    pub fn remove<Q>(&self, key: &Q) -> Option<K>
    where
        Q: Ord + ?Sized,
        K: Borrow<Q> + Clone,
    {
        let target = Slot::Entry(key);
        let mut updates = Vec::new();
        let mut x = self.head.clone();
        let big_l = self.level_hint();
        for i in (0..big_l + 1).rev() {
            let mut y = x.forward(i);
            while y.key().as_borrowed() < target {
                x = y;
                y = x.forward(i);
            }
            updates.push(x.clone());
        }
        updates.reverse();
        let mut y = x;
        loop {
            y = y.forward(0);
            if y.key().as_borrowed() > target {
                return None;
            }
            if y.key().as_borrowed() != target {
                continue;
            }
            // The level-0 lock is held from here until the node is unlinked,
            // so a second remover of the same key sees it as garbage.
            y.lock(0);
            // A removed node links back to its old predecessor.
            let is_garbage = y.key() > y.forward(0).key();
            if !is_garbage {
                break;
            }
            y.unlock(0);
        }
        for i in (0..y.level() + 1).rev() {
            let update = updates.get(i).unwrap_or(&self.head);
            let mut x = update.lock_before(&target, i);
            debug_assert!(Arc::ptr_eq(&x.forward(i).node, &y.node));
            if i != 0 {
                y.lock(i);
            }
            x.locked_set_forward(i, &y.forward(i));
            y.locked_set_forward(i, &x);
            x.unlock(i);
            y.unlock(i);
        }
        trace!(level = y.level(), "ordered index remove");

        self.lower_level_hint();
        match y.key() {
            Slot::Entry(removed) => Some(removed.clone()),
            _ => None,
        }
    }

    /// Get an iterator over the keys in ascending order.
    ///
    /// The iterator owns its position, so it does not borrow the index.
    /// It is weakly consistent: keys inserted or removed while it runs may
    /// or may not be seen, but it never yields a key twice or out of order.
    pub fn iter(&self) -> Scanner<K> {
        Scanner::new(self.head.clone())
    }

    /// Iterate from the first key that is not less than `low`.
    pub fn scan_from<Q>(&self, low: &Q) -> Scanner<K>
    where
        Q: Ord + ?Sized,
        K: Borrow<Q>,
    {
        let target = Slot::Entry(low);
        let mut x = self.head.clone();
        for i in (0..self.level_hint() + 1).rev() {
            let mut y = x.forward(i);
            while y.key().as_borrowed() < target {
                x = y;
                y = x.forward(i);
            }
        }
        Scanner::new(x.forward(0))
    }

    /// Every key `k` with `low <= k <= high`, in ascending order.
    pub fn range_inclusive(&self, low: &K, high: &K) -> Vec<K>
    where
        K: Clone,
    {
        self.scan_from(low).through(high.clone()).collect()
    }

    /// The key at the 0-indexed `index` in ascending order.
    pub fn position_of(&self, index: usize) -> Option<K>
    where
        K: Clone,
    {
        self.iter().nth(index)
    }

    /// The smallest key.
    pub fn first(&self) -> Option<K>
    where
        K: Clone,
    {
        self.iter().next()
    }

    /// The largest key.
    pub fn last(&self) -> Option<K>
    where
        K: Clone,
    {
        self.iter().last()
    }

    /// Check whether the index holds no keys.
    pub fn is_empty(&self) -> bool {
        self.head.forward(0).is_tail()
    }

    fn level_hint(&self) -> usize {
        self.level_hint.load(AtomicOrdering::SeqCst)
    }
    fn set_level_hint(&self, level_hint: usize) {
        debug_assert!(self.level_hint_lock.load(AtomicOrdering::SeqCst));
        self.level_hint.swap(level_hint, AtomicOrdering::SeqCst);
    }
    fn is_level_hint_locked(&self) -> bool {
        self.level_hint_lock.load(AtomicOrdering::SeqCst)
    }
    fn lock_level_hint(&self) {
        let mut yield_yet = false;
        loop {
            if !yield_yet {
                yield_yet = true;
            } else {
                yield_now();
            }
            let result = self.level_hint_lock.compare_exchange(
                false,
                true,
                AtomicOrdering::SeqCst,
                AtomicOrdering::SeqCst,
            );
            if result.is_ok() {
                break;
            }
        }
    }
    fn unlock_level_hint(&self) {
        let result = self.level_hint_lock.compare_exchange(
            true,
            false,
            AtomicOrdering::SeqCst,
            AtomicOrdering::SeqCst,
        );
        debug_assert!(result.is_ok());
    }
    fn raise_level_hint(&self) {
        let big_l = self.level_hint();
        if big_l < self.max_level
            && !self.head.forward(big_l + 1).is_tail()
            && !self.is_level_hint_locked()
        {
            self.lock_level_hint();
            let mut level_hint = self.level_hint();
            while level_hint < self.max_level && !self.head.forward(level_hint + 1).is_tail() {
                level_hint += 1;
            }
            self.set_level_hint(level_hint);
            self.unlock_level_hint();
        }
    }
    fn lower_level_hint(&self) {
        let big_l = self.level_hint();
        if big_l > 0 && self.head.forward(big_l).is_tail() && !self.is_level_hint_locked() {
            self.lock_level_hint();
            let mut level_hint = self.level_hint();
            while level_hint > 0 && self.head.forward(level_hint).is_tail() {
                level_hint -= 1;
            }
            self.set_level_hint(level_hint);
            self.unlock_level_hint();
        }
    }
    fn random_level(&self) -> usize {
        let threshold = self.level_probability * 10_000.0;
        let mut rng = self.rng.lock();
        let mut lvl = 0;
        while ((rng.next_u64() % 10_000) as f64) < threshold && lvl < self.max_level - 1 {
            lvl += 1;
        }
        lvl
    }
}

impl<K> Drop for OrderedIndex<K> {
    fn drop(&mut self) {
        // Dropping the chain node by node would recurse once per key, so
        // point every link at the tail before the nodes are released.
        let mut nodes = Vec::new();
        let mut cursor = self.head.forward(0);
        while !cursor.is_tail() {
            let next = cursor.forward(0);
            nodes.push(cursor);
            cursor = next;
        }
        for link in nodes.iter().chain(std::iter::once(&self.head)) {
            for forward in &link.node.forward {
                *forward.write() = cursor.clone();
            }
        }
    }
}

impl<K: Ord> Default for OrderedIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone + Debug> Debug for OrderedIndex<K> {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K: Ord + Clone> IntoIterator for &OrderedIndex<K> {
    type Item = K;
    type IntoIter = Scanner<K>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<KEY, K> FromIterator<KEY> for OrderedIndex<K>
where
    KEY: Into<K>,
    K: Ord,
{
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = KEY>,
    {
        let index = Self::new();
        for key in iter {
            index.insert(key.into());
        }
        index
    }
}

impl<KEY, K, const N: usize> From<[KEY; N]> for OrderedIndex<K>
where
    KEY: Into<K>,
    K: Ord,
{
    fn from(keys: [KEY; N]) -> Self {
        keys.into_iter().collect()
    }
}

/// Ascending iterator over an [`OrderedIndex`].
pub struct Scanner<K> {
    cursor: Link<K>,
    through: Option<K>,
    last: Option<K>,
    done: bool,
}

impl<K> Scanner<K> {
    fn new(cursor: Link<K>) -> Self {
        Self {
            cursor,
            through: None,
            last: None,
            done: false,
        }
    }

    /// Stop after the last key less than or equal to `key`.
    pub fn through(self, key: K) -> Self {
        Self {
            through: Some(key),
            ..self
        }
    }
}

impl<K: Ord + Clone> Iterator for Scanner<K> {
    type Item = K;
    fn next(&mut self) -> Option<K> {
        loop {
            if self.done {
                return None;
            }
            let key = match self.cursor.key() {
                Slot::Head => None,
                Slot::Entry(key) => Some(key.clone()),
                Slot::Tail => {
                    self.done = true;
                    return None;
                }
            };
            self.cursor = self.cursor.forward(0);
            let Some(key) = key else {
                continue;
            };
            // Back links left by a concurrent removal lead to keys already
            // yielded.
            if self.last.as_ref().is_some_and(|last| &key <= last) {
                continue;
            }
            if self.through.as_ref().is_some_and(|end| &key > end) {
                self.done = true;
                return None;
            }
            self.last = Some(key.clone());
            return Some(key);
        }
    }
}

impl<K: Ord + Clone> FusedIterator for Scanner<K> {}

#[cfg(test)]
mod test {
    use std::sync::Barrier;
    use std::thread::spawn;

    use super::*;

    #[test]
    fn test_xor_shift_randomness() {
        // The XorShift RNG is not cryptographically secure, but it should be
        // good enough for picking levels.

        let seeds = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9];
        for seed in seeds {
            let mut rng = XorShift::new(seed);
            let mut even_count = 0;
            let mut odd_count = 0;
            for _ in 0..1000 {
                let num = rng.next_u64();
                if num % 2 == 0 {
                    even_count += 1;
                } else {
                    odd_count += 1;
                }
            }
            let diff = i32::abs(even_count - odd_count);
            assert!(
                diff < 100,
                "Seed: {}, even: {}, odd: {}",
                seed,
                even_count,
                odd_count
            );
        }
    }

    #[test]
    fn test_slot_sentinels_bound_every_key() {
        assert!(Slot::Head < Slot::Entry(i32::MIN));
        assert!(Slot::Entry(i32::MAX) < Slot::Tail);
        assert!(Slot::<i32>::Head < Slot::Tail);
        assert_eq!(Slot::Entry(3), Slot::Entry(3));
    }

    #[test]
    fn test_ordered_index_end_to_end() {
        let index: OrderedIndex<i32> = OrderedIndex::new();
        assert!(index.is_empty());
        let top = 1_000;
        for k in (0..top).filter(|k| k % 2 == 0) {
            assert!(!index.contains(&k));
            assert!(index.insert(k));
            assert!(index.contains(&k));
        }
        for k in (0..top).filter(|k| k % 2 == 1) {
            assert!(index.get(&k).is_none());
            assert!(index.insert(k));
            assert_eq!(index.get(&k), Some(k));
        }
        for k in 0..top {
            assert!(!index.insert(k), "duplicate insert of {k} accepted");
        }
        assert_eq!(index.iter().count(), top as usize);
        assert_eq!(index.first(), Some(0));
        assert_eq!(index.last(), Some(top - 1));

        for k in 0..top {
            assert!(index.contains(&k));
            assert_eq!(index.remove(&k), Some(k));
            assert!(!index.contains(&k));
            assert_eq!(index.remove(&k), None);
        }
        assert!(index.is_empty());
    }

    #[test]
    fn test_position_of_walks_in_order() {
        let index: OrderedIndex<u32> = (0..50_u32).rev().collect();
        for i in 0..50 {
            assert_eq!(index.position_of(i), Some(i as u32));
        }
        assert_eq!(index.position_of(50), None);
    }

    #[test]
    fn test_range_inclusive_keeps_both_bounds() {
        let index: OrderedIndex<u32> = (0..20_u32).map(|i| i * 2).collect();
        assert_eq!(index.range_inclusive(&4, &10), vec![4, 6, 8, 10]);
        assert_eq!(index.range_inclusive(&5, &9), vec![6, 8]);
        assert_eq!(index.range_inclusive(&10, &10), vec![10]);
        assert_eq!(index.range_inclusive(&10, &4), Vec::<u32>::new());
        assert_eq!(index.range_inclusive(&37, &1_000), vec![38]);
    }

    #[test]
    fn test_custom_level_settings() {
        let config = LeaderBoardConfig::new()
            .with_max_level(1)
            .with_level_probability(0.9)
            .with_seed(7);
        let index: OrderedIndex<u32> = OrderedIndex::with_config(&config);
        for i in (0..200).rev() {
            assert!(index.insert(i));
        }
        assert_eq!(index.iter().collect::<Vec<_>>(), (0..200_u32).collect::<Vec<_>>());
    }

    #[test]
    fn test_long_chain_drops() {
        let index: OrderedIndex<u32> = (0..200_000_u32).collect();
        assert_eq!(index.first(), Some(0));
        drop(index);
    }

    fn drain_disjoint_ranges(num_workers: usize, num_entries_per_worker: usize) {
        let index: Arc<OrderedIndex<usize>> = Arc::new(OrderedIndex::new());
        let mut handles = Vec::new();
        for worker_idx in 0..num_workers {
            let index = Arc::clone(&index);
            handles.push(spawn(move || {
                let start_idx = worker_idx * num_entries_per_worker;
                let mid_idx = start_idx + num_entries_per_worker / 2;
                let end_idx = start_idx + num_entries_per_worker;
                for i in mid_idx..end_idx {
                    index.insert(i);
                }
                for i in start_idx..mid_idx {
                    index.insert(i);
                }
                for i in start_idx..end_idx {
                    assert!(index.contains(&i));
                    assert!(index.remove(&i).is_some());
                }
            }));
        }
        for handle in handles {
            assert!(handle.join().is_ok());
        }
        assert!(index.is_empty());
    }

    #[test]
    fn test_disjoint_writers_drain_index() {
        let max_num_threads = 16;
        let mut num_threads = 1;
        let total_entries = 1_000;
        while num_threads <= max_num_threads {
            drain_disjoint_ranges(num_threads, total_entries / num_threads);
            num_threads *= 2;
        }
    }

    /// Every worker runs `op` over the same keys, all starting together.
    /// Returns how many calls reported success.
    fn race_on_shared_keys<F>(index: &Arc<OrderedIndex<u32>>, keys: u32, op: F) -> usize
    where
        F: Fn(&OrderedIndex<u32>, u32) -> bool + Send + Sync + Copy + 'static,
    {
        const WORKERS: usize = 4;
        let barrier = Arc::new(Barrier::new(WORKERS));
        let successes = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..WORKERS)
            .map(|_| {
                let index = Arc::clone(index);
                let barrier = Arc::clone(&barrier);
                let successes = Arc::clone(&successes);
                spawn(move || {
                    barrier.wait();
                    for key in 0..keys {
                        if op(&index, key) {
                            successes.fetch_add(1, AtomicOrdering::SeqCst);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().is_ok());
        }
        successes.load(AtomicOrdering::SeqCst)
    }

    #[test]
    fn test_overlapping_writers_apply_each_key_once() {
        let keys = 200;
        for round in 0..100 {
            let index: Arc<OrderedIndex<u32>> = Arc::new(OrderedIndex::new());
            let inserted = race_on_shared_keys(&index, keys, |index, key| index.insert(key));
            assert_eq!(inserted, keys as usize, "round {round}");
            assert_eq!(index.iter().collect::<Vec<_>>(), (0..keys).collect::<Vec<_>>());

            let removed = race_on_shared_keys(&index, keys, |index, key| index.remove(&key).is_some());
            assert_eq!(removed, keys as usize, "round {round}");
            assert!(index.is_empty(), "round {round}");
            assert_eq!(index.iter().count(), 0);
            for key in 0..keys {
                assert!(!index.contains(&key));
            }
        }
    }

    #[test]
    fn test_mixed_writers_keep_order() {
        let index: Arc<OrderedIndex<u32>> = Arc::new(OrderedIndex::new());
        let handles: Vec<_> = (0..4_u32)
            .map(|worker| {
                let index = Arc::clone(&index);
                spawn(move || {
                    for round in 0..2_000_u32 {
                        let key = (round * 7 + worker) % 64;
                        if (round + worker) % 2 == 0 {
                            index.insert(key);
                        } else {
                            index.remove(&key);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().is_ok());
        }

        let keys: Vec<u32> = index.iter().collect();
        assert!(keys.windows(2).all(|pair| pair[0] < pair[1]), "{keys:?}");
        for key in 0..64 {
            assert_eq!(index.contains(&key), keys.contains(&key), "key {key}");
        }
        for key in &keys {
            assert_eq!(index.remove(key), Some(*key));
        }
        assert!(index.is_empty());
    }

    #[test]
    fn test_scanner_bounds() {
        let top = 100;
        let mut keys: Vec<String> = (0..top).map(|i| i.to_string()).collect();
        keys.sort();
        let sorted_keys = keys;

        let index: OrderedIndex<String> = OrderedIndex::new();
        for i in 0..top {
            let s = i.to_string();
            index.insert(s.clone());
            assert_eq!(index.get(s.as_str()), Some(s));
        }

        for (i, key) in index.iter().enumerate() {
            assert_eq!(sorted_keys[i], key);
        }

        let mut count = 0;
        for key in index.scan_from("25").through(String::from("75")) {
            count += 1;
            assert!("25" <= key.as_str());
            assert!("75" >= key.as_str());
        }
        let index_25 = sorted_keys.iter().position(|r| r == "25").unwrap();
        let index_75 = sorted_keys.iter().position(|r| r == "75").unwrap();
        assert_eq!(count, index_75 - index_25 + 1);
    }
}

use std::borrow::Borrow;
use std::fmt::{Debug, Error, Formatter};
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::config::LeaderBoardConfig;
use crate::error::{LeaderBoardError, Result};
use crate::identity_index::IdentityIndex;
use crate::ordered_index::OrderedIndex;
use crate::rankable::{RankKey, Rankable};
use crate::size_counter::SizeCounter;

/// A thread-safe ranked collection of [`Rankable`] entities.
///
/// Entities are kept in two indices at once: an id map for O(1) lookups and
/// an [`OrderedIndex`] sorted by rank (ties broken by the id's string form)
/// for window queries.
///
/// # Consistency
///
/// `add`, `remove` and the window queries ([`get_range`](Self::get_range),
/// [`get_top`](Self::get_top), [`snapshot`](Self::snapshot)) are serialized
/// by a single lock, so every window sees both indices in agreement.
///
/// [`get_by_id`](Self::get_by_id) and [`size`](Self::size) do not take that
/// lock. Each reads one structure that is safe on its own, so a caller may
/// see a `size` and a `get_by_id` from different points of the same
/// in-flight `add`. Neither ever observes an id that was never added or was
/// fully removed before the call began.
pub struct LeaderBoard<E: Rankable> {
    write_lock: Mutex<()>,
    ordered: OrderedIndex<RankKey<E>>,
    identities: IdentityIndex<E>,
    size: SizeCounter,
}

impl<E: Rankable> LeaderBoard<E> {
    /// Create an empty leader board.
    pub fn new() -> LeaderBoard<E> {
        Self::with_config(&LeaderBoardConfig::default())
    }

    /// Create an empty leader board with the given tuning.
    pub fn with_config(config: &LeaderBoardConfig) -> LeaderBoard<E> {
        LeaderBoard {
            write_lock: Mutex::new(()),
            ordered: OrderedIndex::with_config(config),
            identities: IdentityIndex::with_capacity(config.capacity()),
            size: SizeCounter::new(),
        }
    }

    /// Add an entity, replacing any entity stored under the same id.
    ///
    /// A replaced entity's old ordering entry is evicted before the new one
    /// goes in, so a rank change never leaves a stale duplicate behind.
    /// Returns the replaced entity.
    pub fn add<T: Into<Arc<E>>>(&self, entity: T) -> Option<Arc<E>> {
        let entity = entity.into();
        let _guard = self.write_lock.lock();
        let id = entity.id().clone();
        let previous = self.identities.get(&id);
        match &previous {
            Some(previous) => {
                self.ordered.remove(&RankKey::new(Arc::clone(previous)));
                debug!(id = %id, "leader board update");
            }
            None => {
                let size = self.size.increment();
                debug!(id = %id, size, "leader board insert");
            }
        }
        let inserted = self.ordered.insert(RankKey::new(Arc::clone(&entity)));
        debug_assert!(inserted, "ordering key collided with a live entity");
        self.identities.put(id, entity);
        previous
    }

    /// Look up an entity by id without taking the board lock.
    pub fn get_by_id<Q>(&self, id: &Q) -> Option<Arc<E>>
    where
        E::Id: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.identities.get(id)
    }

    /// Check whether an entity with this id is on the board.
    pub fn contains<Q>(&self, id: &Q) -> bool
    where
        E::Id: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.identities.contains(id)
    }

    /// Remove the entity with this id, returning it if it was present.
    pub fn remove<Q>(&self, id: &Q) -> Option<Arc<E>>
    where
        E::Id: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let _guard = self.write_lock.lock();
        let removed = self.identities.remove(id)?;
        self.ordered.remove(&RankKey::new(Arc::clone(&removed)));
        let size = self.size.decrement();
        debug!(id = %removed.id(), size, "leader board remove");
        Some(removed)
    }

    /// Number of entities on the board. O(1) and lock-free.
    pub fn size(&self) -> usize {
        self.size.get()
    }

    /// Check whether the board is empty.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// The entities at 1-indexed positions `from..=to` in ascending order.
    ///
    /// `from` is clamped into `1..=size` and `to` is lowered to `size`, but
    /// `to` is never raised. An empty board yields an empty result.
    ///
    /// # Errors
    ///
    /// [`LeaderBoardError::RangeOutOfBounds`] if `to < from`, or if `to`
    /// still points before the first position after clamping (for example
    /// `get_range(0, 0)` on a non-empty board).
    pub fn get_range(&self, from: i64, to: i64) -> Result<Vec<Arc<E>>> {
        let _guard = self.write_lock.lock();
        if to < from {
            return Err(LeaderBoardError::RangeOutOfBounds { from, to });
        }
        let size = i64::try_from(self.size.get()).unwrap_or(i64::MAX);
        if size == 0 {
            return Ok(Vec::new());
        }
        let mut first = from;
        let mut last = to;
        if first < 1 {
            first = 1;
        }
        if first > size {
            first = size;
        }
        if last > size {
            last = size;
        }
        trace!(from, to, first, last, size, "resolving rank window");

        let out_of_bounds = LeaderBoardError::RangeOutOfBounds { from, to };
        let (Some(low), Some(high)) = (
            self.key_at(first - 1, out_of_bounds)?,
            self.key_at(last.saturating_sub(1), out_of_bounds)?,
        ) else {
            // Writers hold the board lock too, so `size` matches the
            // ordered index and both positions exist.
            debug_assert!(false, "board size {size} disagrees with the ordered index");
            return Ok(Vec::new());
        };
        Ok(self
            .ordered
            .range_inclusive(&low, &high)
            .into_iter()
            .map(RankKey::into_entity)
            .collect())
    }

    /// The first `n` entities in ascending order; same as `get_range(1, n)`.
    ///
    /// # Errors
    ///
    /// [`LeaderBoardError::RangeOutOfBounds`] if `n < 1` on a non-empty
    /// board.
    pub fn get_top(&self, n: i64) -> Result<Vec<Arc<E>>> {
        self.get_range(1, n)
    }

    /// Every entity in ascending order, read under the board lock.
    pub fn snapshot(&self) -> Vec<Arc<E>> {
        let _guard = self.write_lock.lock();
        self.ordered.iter().map(RankKey::into_entity).collect()
    }

    // Linear walk; a negative position is a caller error.
    fn key_at(&self, index: i64, out_of_bounds: LeaderBoardError) -> Result<Option<RankKey<E>>> {
        let index = usize::try_from(index).map_err(|_| out_of_bounds)?;
        Ok(self.ordered.position_of(index))
    }
}

impl<E: Rankable> Default for LeaderBoard<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Rankable> Debug for LeaderBoard<E> {
    fn fmt(&self, f: &mut Formatter) -> std::result::Result<(), Error> {
        f.debug_struct("LeaderBoard")
            .field("size", &self.size())
            .finish_non_exhaustive()
    }
}

impl<E: Rankable> IntoIterator for &LeaderBoard<E> {
    type Item = Arc<E>;
    type IntoIter = std::vec::IntoIter<Arc<E>>;
    fn into_iter(self) -> Self::IntoIter {
        self.snapshot().into_iter()
    }
}

impl<E: Rankable> FromIterator<E> for LeaderBoard<E> {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = E>,
    {
        let board = Self::new();
        for entity in iter {
            board.add(entity);
        }
        board
    }
}

impl<E: Rankable> Extend<E> for LeaderBoard<E> {
    fn extend<T>(&mut self, iter: T)
    where
        T: IntoIterator<Item = E>,
    {
        for entity in iter {
            self.add(entity);
        }
    }
}

impl<E: Rankable, const N: usize> From<[E; N]> for LeaderBoard<E> {
    fn from(entities: [E; N]) -> Self {
        entities.into_iter().collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::rankable::Scored;

    type Board = LeaderBoard<Scored<u32, String>>;

    fn board_of_ten() -> Board {
        (0..10).map(|i| Scored::new(i, i.to_string())).collect()
    }

    fn ranks(entities: &[Arc<Scored<u32, String>>]) -> Vec<&str> {
        entities.iter().map(|e| e.rank().as_str()).collect()
    }

    #[test]
    fn test_add_counts_new_ids_only() {
        let board = board_of_ten();
        assert_eq!(board.size(), 10);
        assert!(board.add(Scored::new(3, "33".to_string())).is_some());
        assert_eq!(board.size(), 10);
        assert!(board.add(Scored::new(30, "33".to_string())).is_none());
        assert_eq!(board.size(), 11);
    }

    #[test]
    fn test_update_evicts_stale_ordering_entry() {
        let board = board_of_ten();
        board.add(Scored::new(0, "190".to_string()));
        board.add(Scored::new(0, "778".to_string()));
        let all = board.get_range(1, 10).unwrap();
        assert_eq!(
            ranks(&all),
            vec!["1", "2", "3", "4", "5", "6", "7", "778", "8", "9"]
        );
        assert_eq!(all.iter().filter(|e| *e.id() == 0).count(), 1);
    }

    #[test]
    fn test_window_clamping() {
        let board = board_of_ten();
        assert_eq!(
            ranks(&board.get_range(5, 12).unwrap()),
            vec!["4", "5", "6", "7", "8", "9"]
        );
        assert_eq!(ranks(&board.get_range(-3, 2).unwrap()), vec!["0", "1"]);
        assert_eq!(ranks(&board.get_range(20, 30).unwrap()), vec!["9"]);
        assert_eq!(ranks(&board.get_range(4, 4).unwrap()), vec!["3"]);
    }

    #[test]
    fn test_window_errors() {
        let board = board_of_ten();
        assert_eq!(
            board.get_range(6, 4).unwrap_err(),
            LeaderBoardError::RangeOutOfBounds { from: 6, to: 4 }
        );
        assert_eq!(
            board.get_range(0, 0).unwrap_err(),
            LeaderBoardError::RangeOutOfBounds { from: 0, to: 0 }
        );
        assert!(board.get_range(-5, -3).is_err());
        assert!(board.get_range(-3, -5).is_err());
        assert!(board.get_top(0).is_err());
    }

    #[test]
    fn test_empty_board() {
        let board = Board::new();
        assert!(board.is_empty());
        assert!(board.get_range(1, 10).unwrap().is_empty());
        assert!(board.get_range(0, 0).unwrap().is_empty());
        assert!(board.get_range(2, 1).is_err());
        assert!(board.remove(&1).is_none());
        assert!(board.snapshot().is_empty());
    }

    #[test]
    fn test_remove() {
        let board = board_of_ten();
        let removed = board.remove(&2).unwrap();
        assert_eq!(removed.rank(), "2");
        assert_eq!(board.size(), 9);
        assert!(!board.contains(&2));
        assert!(board.remove(&2).is_none());
        assert_eq!(board.size(), 9);
        assert!(!ranks(&board.snapshot()).contains(&"2"));
    }

    #[test]
    fn test_extend_and_debug() {
        let mut board: Board = Board::from([Scored::new(1, "b".to_string())]);
        board.extend([Scored::new(2, "a".to_string())]);
        assert_eq!(ranks(&board.snapshot()), vec!["a", "b"]);
        assert_eq!(format!("{board:?}"), "LeaderBoard { size: 2, .. }");
    }
}

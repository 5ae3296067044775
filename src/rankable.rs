use std::cmp::Ordering;
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::Hash;
use std::sync::Arc;

/// An entity that can be placed on a [`LeaderBoard`](crate::LeaderBoard).
///
/// Implementors expose a stable identifier and a totally ordered rank value.
/// Neither may change while the entity is stored; a new rank goes through
/// [`LeaderBoard::add`](crate::LeaderBoard::add) with the same id so the stale
/// ordering entry can be evicted.
///
/// ```
/// use leaderboard::Rankable;
///
/// struct Player {
///     name: String,
///     points: u64,
/// }
///
/// impl Rankable for Player {
///     type Id = String;
///     type Rank = u64;
///
///     fn id(&self) -> &String {
///         &self.name
///     }
///     fn rank(&self) -> &u64 {
///         &self.points
///     }
/// }
/// ```
pub trait Rankable {
    /// Identifier type. Its `Display` form breaks ties between equal ranks.
    type Id: Hash + Eq + Clone + Display;
    /// Primary ordering value.
    type Rank: Ord;

    /// The identifier of this entity.
    fn id(&self) -> &Self::Id;
    /// The rank value of this entity.
    fn rank(&self) -> &Self::Rank;
}

/// The key an entity is stored under in the ordered index.
///
/// Keys compare by rank first and then by the lexicographic order of the
/// id's string form, which makes the order strict as long as ids are unique.
pub struct RankKey<E> {
    entity: Arc<E>,
    tie_break: Arc<str>,
}

impl<E: Rankable> RankKey<E> {
    /// Build the ordering key for an entity.
    pub fn new(entity: Arc<E>) -> RankKey<E> {
        let tie_break = Arc::from(entity.id().to_string());
        RankKey { entity, tie_break }
    }
}

impl<E> RankKey<E> {
    /// The entity behind this key.
    pub fn entity(&self) -> &Arc<E> {
        &self.entity
    }
    /// Consume the key and return the entity.
    pub fn into_entity(self) -> Arc<E> {
        self.entity
    }
    /// The string form of the id used to break rank ties.
    pub fn tie_break(&self) -> &str {
        &self.tie_break
    }
}

impl<E> Clone for RankKey<E> {
    fn clone(&self) -> RankKey<E> {
        RankKey {
            entity: Arc::clone(&self.entity),
            tie_break: Arc::clone(&self.tie_break),
        }
    }
}

impl<E: Rankable> Ord for RankKey<E> {
    fn cmp(&self, other: &RankKey<E>) -> Ordering {
        self.entity
            .rank()
            .cmp(other.entity.rank())
            .then_with(|| self.tie_break.cmp(&other.tie_break))
    }
}

impl<E: Rankable> PartialOrd for RankKey<E> {
    fn partial_cmp(&self, other: &RankKey<E>) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E: Rankable> PartialEq for RankKey<E> {
    fn eq(&self, other: &RankKey<E>) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<E: Rankable> Eq for RankKey<E> {}

impl<E: Debug> Debug for RankKey<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RankKey").field(&self.entity).finish()
    }
}

/// A plain id/rank pair, for callers without an entity type of their own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scored<I, R> {
    id: I,
    rank: R,
}

impl<I, R> Scored<I, R> {
    /// Create a new entry.
    pub fn new(id: I, rank: R) -> Scored<I, R> {
        Scored { id, rank }
    }
    /// Split the entry into its id and rank.
    pub fn into_parts(self) -> (I, R) {
        (self.id, self.rank)
    }
}

impl<I, R> Rankable for Scored<I, R>
where
    I: Hash + Eq + Clone + Display,
    R: Ord,
{
    type Id = I;
    type Rank = R;

    fn id(&self) -> &I {
        &self.id
    }
    fn rank(&self) -> &R {
        &self.rank
    }
}

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;

use crate::rankable::Rankable;

/// Id to entity map backing O(1) point lookups.
///
/// Every operation is safe to call from any thread without external
/// locking. It gives no ordering guarantees.
pub(crate) struct IdentityIndex<E: Rankable> {
    entries: DashMap<E::Id, Arc<E>>,
}

impl<E: Rankable> IdentityIndex<E> {
    pub(crate) fn with_capacity(capacity: usize) -> IdentityIndex<E> {
        IdentityIndex {
            entries: DashMap::with_capacity(capacity),
        }
    }

    pub(crate) fn get<Q>(&self, id: &Q) -> Option<Arc<E>>
    where
        E::Id: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub(crate) fn contains<Q>(&self, id: &Q) -> bool
    where
        E::Id: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(id)
    }

    /// Store `entity` under `id`, returning whatever was there before.
    pub(crate) fn put(&self, id: E::Id, entity: Arc<E>) -> Option<Arc<E>> {
        self.entries.insert(id, entity)
    }

    pub(crate) fn remove<Q>(&self, id: &Q) -> Option<Arc<E>>
    where
        E::Id: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.remove(id).map(|(_, entity)| entity)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::rankable::Scored;

    #[test]
    fn test_put_get_remove() {
        let index: IdentityIndex<Scored<String, u32>> = IdentityIndex::with_capacity(4);
        assert!(index.get("a").is_none());

        let first = Arc::new(Scored::new("a".to_string(), 1));
        assert!(index.put("a".to_string(), first).is_none());
        assert!(index.contains("a"));
        assert_eq!(*index.get("a").unwrap().rank(), 1);

        let second = Arc::new(Scored::new("a".to_string(), 2));
        let previous = index.put("a".to_string(), second).unwrap();
        assert_eq!(*previous.rank(), 1);
        assert_eq!(*index.get("a").unwrap().rank(), 2);

        assert_eq!(*index.remove("a").unwrap().rank(), 2);
        assert!(index.remove("a").is_none());
        assert!(!index.contains("a"));
    }
}

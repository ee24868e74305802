//! In-memory `EntityStore` backed by a `BTreeMap` and an id counter.

use std::collections::BTreeMap;

use crate::{Entity, EntityStore, StoreError};

/// Process-local store. One instance per owning component; never global.
#[derive(Debug, Clone)]
pub struct InMemoryStore<T: Entity> {
    /// id → entity
    rows: BTreeMap<u64, T>,
    /// Next id handed out to `save(id == 0)`. Starts at 1.
    next_id: u64,
}

impl<T: Entity> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T: Entity> InMemoryStore<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Entity> EntityStore<T> for InMemoryStore<T> {
    fn save(&mut self, mut entity: T) -> Result<T, StoreError> {
        let id = entity.id();
        if id == 0 {
            entity.set_id(self.next_id);
            self.next_id += 1;
        } else {
            if self.rows.contains_key(&id) {
                return Err(StoreError::DuplicateId {
                    entity: T::NAME,
                    id,
                });
            }
            if id >= self.next_id {
                self.next_id = id.saturating_add(1);
            }
        }

        self.rows.insert(entity.id(), entity.clone());
        Ok(entity)
    }

    fn find_by_id(&self, id: u64) -> Option<T> {
        self.rows.get(&id).cloned()
    }

    fn find_all(&self) -> Vec<T> {
        self.rows.values().cloned().collect()
    }

    fn update(&mut self, entity: T) -> Result<T, StoreError> {
        let id = entity.id();
        match self.rows.get_mut(&id) {
            Some(slot) => {
                *slot = entity.clone();
                Ok(entity)
            }
            None => Err(StoreError::NotFound {
                entity: T::NAME,
                id,
            }),
        }
    }

    fn delete(&mut self, id: u64) -> Result<(), StoreError> {
        match self.rows.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound {
                entity: T::NAME,
                id,
            }),
        }
    }

    fn exists_by_id(&self, id: u64) -> bool {
        self.rows.contains_key(&id)
    }

    fn find_by<P>(&self, predicate: P) -> Vec<T>
    where
        P: Fn(&T) -> bool,
    {
        self.rows
            .values()
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }

    fn find_one_by<P>(&self, predicate: P) -> Option<T>
    where
        P: Fn(&T) -> bool,
    {
        self.rows.values().find(|e| predicate(e)).cloned()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Gizmo {
        id: u64,
        tag: &'static str,
    }

    impl Entity for Gizmo {
        const NAME: &'static str = "Gizmo";

        fn id(&self) -> u64 {
            self.id
        }

        fn set_id(&mut self, id: u64) {
            self.id = id;
        }
    }

    fn gizmo(id: u64, tag: &'static str) -> Gizmo {
        Gizmo { id, tag }
    }

    #[test]
    fn zero_id_is_assigned_from_counter() {
        let mut s = InMemoryStore::new();
        let a = s.save(gizmo(0, "a")).unwrap();
        let b = s.save(gizmo(0, "b")).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
    }

    #[test]
    fn explicit_id_bumps_counter_past_it() {
        let mut s = InMemoryStore::new();
        s.save(gizmo(10, "ten")).unwrap();
        let next = s.save(gizmo(0, "next")).unwrap();
        assert_eq!(next.id, 11);
    }

    #[test]
    fn explicit_id_below_counter_leaves_counter_alone() {
        let mut s = InMemoryStore::new();
        s.save(gizmo(0, "a")).unwrap();
        s.save(gizmo(0, "b")).unwrap();
        s.delete(1).unwrap();
        s.save(gizmo(1, "again")).unwrap();
        let auto = s.save(gizmo(0, "auto")).unwrap();
        assert_eq!(auto.id, 3);
    }

    #[test]
    fn duplicate_explicit_id_is_rejected() {
        let mut s = InMemoryStore::new();
        s.save(gizmo(4, "x")).unwrap();
        let err = s.save(gizmo(4, "y")).unwrap_err();
        assert_eq!(
            err,
            StoreError::DuplicateId {
                entity: "Gizmo",
                id: 4
            }
        );
        // Original row untouched.
        assert_eq!(s.find_by_id(4).unwrap().tag, "x");
    }

    #[test]
    fn update_and_delete_unknown_ids_fail() {
        let mut s: InMemoryStore<Gizmo> = InMemoryStore::new();
        assert!(matches!(
            s.update(gizmo(9, "z")),
            Err(StoreError::NotFound { id: 9, .. })
        ));
        assert!(matches!(s.delete(9), Err(StoreError::NotFound { id: 9, .. })));
    }

    #[test]
    fn enumeration_is_ascending_by_id() {
        let mut s = InMemoryStore::new();
        s.save(gizmo(5, "five")).unwrap();
        s.save(gizmo(2, "two")).unwrap();
        s.save(gizmo(9, "nine")).unwrap();
        let ids: Vec<u64> = s.find_all().iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
        assert_eq!(s.find_one_by(|g| g.id > 3).unwrap().tag, "five");
        assert_eq!(s.find_by(|g| g.id != 5).len(), 2);
    }
}

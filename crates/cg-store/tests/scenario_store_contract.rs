//! Scenario: generic store contract as the repositories use it.
//!
//! GREEN when:
//! - save / find / update / delete work through a generic `EntityStore` bound
//! - ids assigned to `0` never collide with caller-chosen ids
//! - a failed save leaves the store unchanged

use cg_store::{Entity, EntityStore, InMemoryStore, StoreError};

#[derive(Debug, Clone, PartialEq)]
struct Badge {
    id: u64,
    holder: String,
}

impl Entity for Badge {
    const NAME: &'static str = "Badge";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

fn badge(id: u64, holder: &str) -> Badge {
    Badge {
        id,
        holder: holder.to_string(),
    }
}

/// Exercise the contract through a generic bound, the way components hold it.
fn register_all<S: EntityStore<Badge>>(store: &mut S, holders: &[&str]) -> Vec<u64> {
    holders
        .iter()
        .map(|h| store.save(badge(0, h)).unwrap().id)
        .collect()
}

#[test]
fn scenario_mixed_explicit_and_assigned_ids_never_collide() {
    let mut store = InMemoryStore::new();
    store.save(badge(3, "explicit")).unwrap();

    let ids = register_all(&mut store, &["a", "b", "c"]);
    assert_eq!(ids, vec![4, 5, 6]);
    assert_eq!(store.len(), 4);
    assert!(store.exists_by_id(3));
}

#[test]
fn scenario_failed_save_leaves_store_unchanged() {
    let mut store = InMemoryStore::new();
    store.save(badge(1, "first")).unwrap();

    let err = store.save(badge(1, "second")).unwrap_err();
    assert!(matches!(err, StoreError::DuplicateId { id: 1, .. }));
    assert_eq!(store.len(), 1);
    assert_eq!(store.find_by_id(1).unwrap().holder, "first");
}

#[test]
fn scenario_update_then_delete() {
    let mut store = InMemoryStore::new();
    let mut b = store.save(badge(0, "before")).unwrap();

    b.holder = "after".to_string();
    store.update(b.clone()).unwrap();
    assert_eq!(store.find_by_id(b.id).unwrap().holder, "after");

    store.delete(b.id).unwrap();
    assert!(!store.exists_by_id(b.id));
    assert!(store.is_empty());
    assert!(store.find_one_by(|x| x.holder == "after").is_none());
}

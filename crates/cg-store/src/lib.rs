//! cg-store
//!
//! Generic entity store contract consumed by every repository in the
//! workspace, plus the in-memory implementation used in-process.
//!
//! # Id assignment
//!
//! ```text
//! save(id == 0)         → next counter value, counter += 1
//! save(id  > 0, free)   → stored as-is, counter bumped past it
//! save(id  > 0, taken)  → StoreError::DuplicateId
//! ```
//!
//! # Enumeration order
//! `find_all`, `find_by` and `find_one_by` walk entities in ascending id
//! order. Callers that implement "first match" policies (first-fit lane
//! selection) rely on this order.
//!
//! # Thread-safety
//! `InMemoryStore` is not `Sync`-guarded. Owners wrap it in a lock together
//! with whatever other state must change atomically with it.

mod memory;

pub use memory::InMemoryStore;

/// A record with a numeric identity that a store can assign.
pub trait Entity: Clone {
    /// Human-readable entity name used in error messages.
    const NAME: &'static str;

    fn id(&self) -> u64;
    fn set_id(&mut self, id: u64);
}

/// Store failures. Owners convert these into their own error taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A caller-supplied id is already present.
    DuplicateId { entity: &'static str, id: u64 },
    /// `update` / `delete` on an id that was never saved.
    NotFound { entity: &'static str, id: u64 },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::DuplicateId { entity, id } => {
                write!(f, "STORE_DUPLICATE_ID: {entity} with id {id} already exists")
            }
            StoreError::NotFound { entity, id } => {
                write!(f, "STORE_NOT_FOUND: {entity} with id {id} not found")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Key-value contract over entities keyed by a positive `u64` id.
pub trait EntityStore<T: Entity> {
    /// Persist a new entity. See the module docs for id assignment.
    fn save(&mut self, entity: T) -> Result<T, StoreError>;

    fn find_by_id(&self, id: u64) -> Option<T>;

    /// All entities in ascending id order.
    fn find_all(&self) -> Vec<T>;

    /// Replace an existing entity.
    fn update(&mut self, entity: T) -> Result<T, StoreError>;

    fn delete(&mut self, id: u64) -> Result<(), StoreError>;

    fn exists_by_id(&self, id: u64) -> bool;

    fn find_by<P>(&self, predicate: P) -> Vec<T>
    where
        P: Fn(&T) -> bool;

    fn find_one_by<P>(&self, predicate: P) -> Option<T>
    where
        P: Fn(&T) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

use std::sync::{Arc, Mutex};

use dashmap::DashMap;

use tessera_core::tile::TileId;

/// Lazily created lock per tile id. Locks for different tiles never contend.
///
/// An entry lives only while some caller holds a lease on it, so the map
/// tracks tiles in flight rather than every tile ever touched.
#[derive(Debug, Default)]
pub struct TileLocks {
    locks: DashMap<TileId, Arc<Mutex<()>>>,
}

/// Shared handle on one tile's lock. Dropping the last lease removes the
/// entry from its [`TileLocks`].
#[derive(Debug)]
pub struct TileLease<'a> {
    locks: &'a TileLocks,
    id: TileId,
    lock: Arc<Mutex<()>>,
}

impl TileLease<'_> {
    /// Lock this for the duration of one read-modify-write. The guard must
    /// be dropped before the lease.
    pub fn mutex(&self) -> &Mutex<()> {
        &self.lock
    }
}

impl Drop for TileLease<'_> {
    fn drop(&mut self) {
        // The map and this lease are the only owners left.
        self.locks
            .locks
            .remove_if(&self.id, |_, lock| Arc::strong_count(lock) == 2);
    }
}

impl TileLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// A lease on the lock guarding `id`.
    pub fn lock_for(&self, id: &TileId) -> TileLease<'_> {
        let lock = match self.locks.get(id) {
            Some(lock) => Arc::clone(lock.value()),
            None => Arc::clone(self.locks.entry(id.clone()).or_default().value()),
        };
        TileLease {
            locks: self,
            id: id.clone(),
            lock,
        }
    }

    /// Tiles with at least one outstanding lease.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_id_shares_one_lock() {
        let locks = TileLocks::new();
        let a = locks.lock_for(&TileId::new("t"));
        let b = locks.lock_for(&TileId::new("t"));
        assert!(std::ptr::eq(a.mutex(), b.mutex()));
        let c = locks.lock_for(&TileId::new("u"));
        assert!(!std::ptr::eq(a.mutex(), c.mutex()));
        assert_eq!(locks.len(), 2);
    }

    #[test]
    fn entry_is_released_with_the_last_lease() {
        let locks = TileLocks::new();
        let a = locks.lock_for(&TileId::new("t"));
        let b = locks.lock_for(&TileId::new("t"));
        {
            let _guard = a.mutex().lock().unwrap();
        }
        drop(a);
        assert_eq!(locks.len(), 1);
        drop(b);
        assert!(locks.is_empty());
    }

    #[test]
    fn churn_over_many_tiles_leaves_no_entries() {
        let locks = TileLocks::new();
        for i in 0..1_000 {
            let lease = locks.lock_for(&TileId::new(format!("t-{i}")));
            let _guard = lease.mutex().lock().unwrap();
        }
        assert!(locks.is_empty());
    }
}

//! Memoized cost matrices.
//!
//! Entries are keyed on the exact coordinates of every planning point, in
//! order, plus the provider's `cache_key()`. Moving, reordering, adding or
//! removing a point, or reconfiguring the provider, therefore misses the
//! cache. Labels are not part of the key since they do not affect cost.
//!
//! Each key has its own slot lock held for the duration of a build, so
//! concurrent requests for the same key wait for one build instead of
//! issuing duplicate provider calls. Failed builds are not cached and their
//! slot is dropped unless another request is already retrying it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use tracing::debug;

use crate::error::MatrixBuildError;
use crate::matrix::{CostMatrix, CostMatrixBuilder};
use crate::traits::CostProvider;
use crate::waypoint::Point;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    coordinates: Vec<(u64, u64)>,
    provider: String,
}

impl CacheKey {
    fn new<P: CostProvider + ?Sized>(points: &[Point], provider: &P) -> Self {
        Self {
            coordinates: points
                .iter()
                .map(|point| (point.latitude.to_bits(), point.longitude.to_bits()))
                .collect(),
            provider: provider.cache_key(),
        }
    }
}

type Slot = Arc<Mutex<Option<Arc<CostMatrix>>>>;

#[derive(Debug, Default)]
pub struct MatrixCache {
    entries: Mutex<HashMap<CacheKey, Slot>>,
}

impl MatrixCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached matrix for `points` and `provider`, building it on a miss.
    pub fn get_or_build<P>(
        &self,
        points: &[Point],
        provider: &P,
        builder: &CostMatrixBuilder,
    ) -> Result<Arc<CostMatrix>, MatrixBuildError>
    where
        P: CostProvider + ?Sized,
    {
        let key = CacheKey::new(points, provider);
        let slot = lock(&self.entries).entry(key.clone()).or_default().clone();

        let mut entry = lock(&slot);
        if let Some(matrix) = entry.as_ref() {
            debug!(stops = points.len(), "cost matrix cache hit");
            return Ok(Arc::clone(matrix));
        }

        match builder.build(points, provider) {
            Ok(matrix) => {
                let matrix = Arc::new(matrix);
                *entry = Some(Arc::clone(&matrix));
                Ok(matrix)
            }
            Err(err) => {
                drop(entry);
                self.evict_if_empty(&key, &slot);
                Err(err)
            }
        }
    }

    fn evict_if_empty(&self, key: &CacheKey, slot: &Slot) {
        let mut entries = lock(&self.entries);
        if !entries.get(key).is_some_and(|current| Arc::ptr_eq(current, slot)) {
            return;
        }
        // A locked slot means another request is building it.
        let empty = match slot.try_lock() {
            Ok(guard) => guard.is_none(),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().is_none(),
            Err(TryLockError::WouldBlock) => false,
        };
        if empty {
            entries.remove(key);
        }
    }

    /// Number of completed entries.
    pub fn len(&self) -> usize {
        lock(&self.entries)
            .values()
            .filter(|slot| lock(slot).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn invalidate_all(&self) {
        lock(&self.entries).clear();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

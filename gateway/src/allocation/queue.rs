//! Locked FIFO silos backing the stateful allocation strategies.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// One or more FIFO silos behind a single mutex.
///
/// The mutex is only held for the duration of a push/pop and never across
/// an `.await`. Silo lengths are mirrored into atomics so diagnostic reads
/// do not contend with allocation; those reads may be momentarily stale.
#[derive(Debug)]
pub struct AllocationQueue<T> {
    silos: Mutex<Vec<VecDeque<T>>>,
    lengths: RwLock<Vec<Arc<AtomicUsize>>>,
}

impl<T> Default for AllocationQueue<T> {
    fn default() -> Self {
        Self::with_silos(1)
    }
}

impl<T> AllocationQueue<T> {
    /// Queue with `count` empty silos.
    pub fn with_silos(count: usize) -> Self {
        Self {
            silos: Mutex::new((0..count).map(|_| VecDeque::new()).collect()),
            lengths: RwLock::new((0..count).map(|_| Arc::new(AtomicUsize::new(0))).collect()),
        }
    }

    /// Append an empty silo and return its index.
    pub fn add_silo(&self) -> usize {
        let mut silos = self.lock();
        silos.push(VecDeque::new());
        self.lengths
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(AtomicUsize::new(0)));
        silos.len() - 1
    }

    pub fn silo_count(&self) -> usize {
        self.lengths.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Append `items` to the back of `silo`. Returns `false` if the silo does
    /// not exist.
    pub fn put(&self, silo: usize, items: impl IntoIterator<Item = T>) -> bool {
        self.update(silo, |queue| queue.extend(items)).is_some()
    }

    /// Remove and return the head of `silo`.
    pub fn pop(&self, silo: usize) -> Option<T> {
        self.update(silo, |queue| queue.pop_front()).flatten()
    }

    /// Queued length of `silo`, read without taking the silo lock.
    pub fn len(&self, silo: usize) -> usize {
        self.lengths
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(silo)
            .map(|len| len.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, silo: usize) -> bool {
        self.len(silo) == 0
    }

    /// Run `f` against `silo` while holding the lock, then refresh its length
    /// mirror. Returns `None` if the silo does not exist.
    pub fn update<R>(&self, silo: usize, f: impl FnOnce(&mut VecDeque<T>) -> R) -> Option<R> {
        let mut silos = self.lock();
        let queue = silos.get_mut(silo)?;
        let result = f(queue);
        let len = queue.len();

        // Stored under the silo lock so mirror writes follow queue order.
        if let Some(mirror) = self
            .lengths
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(silo)
        {
            mirror.store(len, Ordering::Relaxed);
        }
        Some(result)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<VecDeque<T>>> {
        // A panic while holding the lock leaves the deques intact.
        self.silos.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> AllocationQueue<T> {
    /// Up to `limit` items from the head of `silo`, without removing them.
    pub fn peek(&self, silo: usize, limit: usize) -> Vec<T> {
        self.lock()
            .get(silo)
            .map(|queue| queue.iter().take(limit).cloned().collect())
            .unwrap_or_default()
    }
}

//! Explicit read-through caches.
//!
//! Services consult a cache before hitting a repository, and invalidate the
//! affected keys right after the write that changes the cached result.
//! Loads go through [`read_through`], which drops a loaded value when the key
//! was invalidated while the load was in flight.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;
use uuid::Uuid;

use crate::categories::repo_types::Category;
use crate::recipes::repo_types::Recipe;
use crate::users::repo_types::User;

/// Key for caches that hold one global list.
pub const ALL: &str = "all";

/// Snapshot of how many times a key has been invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation {
    epoch: u64,
    key: u64,
}

pub trait Cache<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Option<V>;
    fn put(&self, key: K, value: V);
    fn invalidate(&self, key: &K);
    fn invalidate_all(&self);
    /// Current generation of `key`; any invalidation covering it moves it on.
    fn generation(&self, key: &K) -> Generation;
    /// Stores `value` only if `key` is still at `seen`. Returns whether it was stored.
    fn put_if_current(&self, key: K, seen: Generation, value: V) -> bool;
}

/// Returns the cached value for `key`, or runs `load` and caches its result
/// unless a write invalidated `key` in the meantime.
pub async fn read_through<K, V, E, F, Fut>(
    cache: &dyn Cache<K, V>,
    key: K,
    load: F,
) -> Result<V, E>
where
    V: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>>,
{
    if let Some(hit) = cache.get(&key) {
        return Ok(hit);
    }
    let seen = cache.generation(&key);
    let fresh = load().await?;
    cache.put_if_current(key, seen, fresh.clone());
    Ok(fresh)
}

struct Slots<K, V> {
    entries: HashMap<K, V>,
    generations: HashMap<K, u64>,
    epoch: u64,
}

impl<K: Eq + Hash, V> Slots<K, V> {
    fn generation(&self, key: &K) -> Generation {
        Generation {
            epoch: self.epoch,
            key: self.generations.get(key).copied().unwrap_or(0),
        }
    }
}

pub struct MemoryCache<K, V> {
    name: &'static str,
    slots: RwLock<Slots<K, V>>,
}

impl<K, V> MemoryCache<K, V> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: RwLock::new(Slots {
                entries: HashMap::new(),
                generations: HashMap::new(),
                epoch: 0,
            }),
        }
    }
}

impl<K, V> Cache<K, V> for MemoryCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + std::fmt::Debug,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<V> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let hit = slots.entries.get(key).cloned();
        debug!(cache = self.name, ?key, hit = hit.is_some(), "cache lookup");
        hit
    }

    fn put(&self, key: K, value: V) {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .insert(key, value);
    }

    fn invalidate(&self, key: &K) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.entries.remove(key);
        *slots.generations.entry(key.clone()).or_insert(0) += 1;
    }

    fn invalidate_all(&self) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.entries.clear();
        slots.generations.clear();
        slots.epoch += 1;
    }

    fn generation(&self, key: &K) -> Generation {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .generation(key)
    }

    fn put_if_current(&self, key: K, seen: Generation, value: V) -> bool {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        if slots.generation(&key) != seen {
            debug!(cache = self.name, ?key, "stale load discarded");
            return false;
        }
        slots.entries.insert(key, value);
        true
    }
}

/// Caches owned by one running instance. Built at startup, cleared on shutdown.
#[derive(Clone)]
pub struct Caches {
    pub categories: Arc<dyn Cache<&'static str, Vec<Category>>>,
    pub users: Arc<dyn Cache<&'static str, Vec<User>>>,
    /// Favorited, non-deleted recipes keyed by user id.
    pub favorites: Arc<dyn Cache<Uuid, Vec<Recipe>>>,
    /// Non-deleted authored recipes keyed by author id.
    pub user_recipes: Arc<dyn Cache<Uuid, Vec<Recipe>>>,
}

impl Caches {
    pub fn in_memory() -> Self {
        Self {
            categories: Arc::new(MemoryCache::new("categories")),
            users: Arc::new(MemoryCache::new("users")),
            favorites: Arc::new(MemoryCache::new("user_favorites")),
            user_recipes: Arc::new(MemoryCache::new("user_recipes")),
        }
    }

    pub fn clear(&self) {
        self.categories.invalidate_all();
        self.users.invalidate_all();
        self.favorites.invalidate_all();
        self.user_recipes.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_invalidate() {
        let cache: MemoryCache<Uuid, Vec<u32>> = MemoryCache::new("test");
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(cache.get(&a).is_none());

        cache.put(a, vec![1, 2]);
        cache.put(b, vec![3]);
        assert_eq!(cache.get(&a), Some(vec![1, 2]));

        cache.invalidate(&a);
        assert!(cache.get(&a).is_none());
        assert_eq!(cache.get(&b), Some(vec![3]));

        cache.invalidate_all();
        assert!(cache.get(&b).is_none());
    }

    #[test]
    fn put_if_current_rejects_invalidated_generation() {
        let cache: MemoryCache<Uuid, Vec<u32>> = MemoryCache::new("test");
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let seen_a = cache.generation(&a);
        let seen_b = cache.generation(&b);
        cache.invalidate(&a);
        assert!(!cache.put_if_current(a, seen_a, vec![1]));
        assert!(cache.get(&a).is_none());
        assert!(cache.put_if_current(b, seen_b, vec![2]));

        let seen_b = cache.generation(&b);
        cache.invalidate_all();
        assert!(!cache.put_if_current(b, seen_b, vec![3]));
        assert!(cache.get(&b).is_none());
    }

    #[tokio::test]
    async fn read_through_drops_value_invalidated_during_load() {
        let cache: Arc<dyn Cache<Uuid, Vec<u32>>> = Arc::new(MemoryCache::new("test"));
        let key = Uuid::new_v4();

        let loaded: Result<_, ()> = read_through(cache.as_ref(), key, || async {
            // a write commits and invalidates while the old snapshot is in flight
            cache.invalidate(&key);
            Ok(vec![1])
        })
        .await;
        assert_eq!(loaded, Ok(vec![1]));
        assert!(cache.get(&key).is_none());

        let reloaded: Result<_, ()> =
            read_through(cache.as_ref(), key, || async { Ok(vec![1, 2]) }).await;
        assert_eq!(reloaded, Ok(vec![1, 2]));
        assert_eq!(cache.get(&key), Some(vec![1, 2]));

        let hit: Result<_, ()> =
            read_through(cache.as_ref(), key, || async { Ok(vec![9]) }).await;
        assert_eq!(hit, Ok(vec![1, 2]));
    }

    #[test]
    fn clear_empties_every_cache() {
        let caches = Caches::in_memory();
        caches.categories.put(ALL, Vec::new());
        caches.favorites.put(Uuid::new_v4(), Vec::new());
        caches.clear();
        assert!(caches.categories.get(&ALL).is_none());
    }
}

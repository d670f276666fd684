use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash, Hasher};

use parking_lot::Mutex;

/// In-memory extendible hash table.
///
/// The directory holds `2^global_depth` slots, each referring to a bucket of
/// at most `bucket_size` entries. A full bucket is split in two; when the
/// splitting bucket already discriminates on every directory bit, the
/// directory doubles first. Lookups touch exactly one bucket.
///
/// Buckets are stored in an arena and the directory stores arena indices, so
/// several slots can share one bucket while their low bits do not yet differ.
/// A bucket at local depth `d` is referenced from `2^(global_depth - d)`
/// slots.
///
/// The hasher is a type parameter like `HashMap`'s, so callers that need a
/// particular routing (tests, page tables keyed by small integers) can pin
/// the hash function. All operations serialize on one internal latch.
pub struct ExtendibleHashTable<K, V, S = RandomState> {
    bucket_size: usize,
    hasher: S,
    inner: Mutex<Directory<K, V>>,
}

struct Directory<K, V> {
    global_depth: u32,
    num_buckets: usize,
    /// slot index -> arena index into `buckets`
    slots: Vec<usize>,
    buckets: Vec<Bucket<K, V>>,
}

struct Bucket<K, V> {
    local_depth: u32,
    items: Vec<(K, V)>,
}

impl<K, V> Bucket<K, V> {
    fn new(local_depth: u32) -> Self {
        Self {
            local_depth,
            items: Vec::new(),
        }
    }
}

impl<K, V, S> ExtendibleHashTable<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Create a table whose buckets hold at most `bucket_size` entries.
    pub fn new(bucket_size: usize) -> Self {
        Self::with_hasher(bucket_size, S::default())
    }
}

impl<K, V, S> ExtendibleHashTable<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Create a table routing keys through the given hasher.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_size` is zero.
    pub fn with_hasher(bucket_size: usize, hasher: S) -> Self {
        assert!(bucket_size > 0, "bucket size must be at least 1");
        Self {
            bucket_size,
            hasher,
            inner: Mutex::new(Directory {
                global_depth: 0,
                num_buckets: 1,
                slots: vec![0],
                buckets: vec![Bucket::new(0)],
            }),
        }
    }

    /// Look up the value stored under `key`.
    pub fn find(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let hash = self.hash_key(key);
        let dir = self.inner.lock();
        let slot = slot_of(hash, dir.global_depth);
        let bucket_id = dir.slots[slot];
        let bucket = &dir.buckets[bucket_id];
        bucket
            .items
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// Insert `value` under `key`, overwriting any existing entry. Never
    /// fails: full buckets split, and the directory grows as needed.
    pub fn insert(&self, key: K, value: V) {
        let hash = self.hash_key(&key);
        let mut dir = self.inner.lock();
        // Split spills displaced entries onto a work list instead of
        // recursing; a skewed key set can force several rounds.
        let mut pending = vec![(hash, key, value)];
        while let Some((hash, key, value)) = pending.pop() {
            loop {
                let slot = slot_of(hash, dir.global_depth);
                let bucket_id = dir.slots[slot];
                let bucket = &mut dir.buckets[bucket_id];
                if let Some(entry) = bucket.items.iter_mut().find(|(k, _)| *k == key) {
                    entry.1 = value;
                    break;
                }
                if bucket.items.len() < self.bucket_size {
                    bucket.items.push((key, value));
                    break;
                }
                let displaced = split(&mut dir, slot);
                pending.extend(
                    displaced
                        .into_iter()
                        .map(|(k, v)| (self.hash_key(&k), k, v)),
                );
            }
        }
    }

    /// Remove the entry under `key`, reporting whether it existed. Splits
    /// are never undone, so depths and bucket counts stay put.
    pub fn remove(&self, key: &K) -> bool {
        let hash = self.hash_key(key);
        let mut dir = self.inner.lock();
        let slot = slot_of(hash, dir.global_depth);
        let bucket_id = dir.slots[slot];
        let bucket = &mut dir.buckets[bucket_id];
        if let Some(pos) = bucket.items.iter().position(|(k, _)| k == key) {
            bucket.items.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn global_depth(&self) -> u32 {
        self.inner.lock().global_depth
    }

    /// Local depth of the bucket referenced by directory slot `dir_index`.
    ///
    /// # Panics
    ///
    /// Panics if `dir_index` is outside the current directory.
    pub fn local_depth(&self, dir_index: usize) -> u32 {
        let dir = self.inner.lock();
        let bucket_id = dir.slots[dir_index];
        dir.buckets[bucket_id].local_depth
    }

    /// Number of distinct buckets referenced from the directory.
    pub fn num_buckets(&self) -> usize {
        self.inner.lock().num_buckets
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.inner.lock().buckets.iter().map(|b| b.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn hash_key(&self, key: &K) -> u64 {
        let mut state = self.hasher.build_hasher();
        key.hash(&mut state);
        state.finish()
    }
}

fn slot_of(hash: u64, global_depth: u32) -> usize {
    (hash & ((1u64 << global_depth) - 1)) as usize
}

/// Split the bucket referenced by directory slot `slot`, returning its
/// drained entries for re-insertion by the caller.
///
/// The bucket's local depth grows by one; if that exceeds the global depth,
/// the directory doubles first (every new slot aliases its old twin). A
/// fresh bucket takes over the half of the reference set whose new
/// discriminating bit differs from `slot`'s.
fn split<K, V>(dir: &mut Directory<K, V>, slot: usize) -> Vec<(K, V)> {
    let bucket_id = dir.slots[slot];
    let displaced = std::mem::take(&mut dir.buckets[bucket_id].items);
    dir.buckets[bucket_id].local_depth += 1;
    let local_depth = dir.buckets[bucket_id].local_depth;

    if local_depth > dir.global_depth {
        dir.slots.extend_from_within(..);
        dir.global_depth += 1;
    }

    let new_id = dir.buckets.len();
    dir.buckets.push(Bucket::new(local_depth));
    dir.num_buckets += 1;

    let mask = (1usize << local_depth) - 1;
    let pattern = (slot ^ (1 << (local_depth - 1))) & mask;
    for s in 0..dir.slots.len() {
        if s & mask == pattern {
            dir.slots[s] = new_id;
        }
    }

    displaced
}

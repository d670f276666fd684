use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use crate::common::types::FrameId;

/// Per-frame bookkeeping. Frames with fewer than K recorded accesses sit in
/// the history list; once the K-th access lands they move to the cache list.
struct FrameEntry {
    access_count: usize,
    evictable: bool,
}

struct ReplacerInner {
    /// Frames with access_count < K, tail = most recently accessed.
    history: VecDeque<FrameId>,
    /// Frames with access_count >= K, tail = most recently accessed.
    cache: VecDeque<FrameId>,
    entries: HashMap<FrameId, FrameEntry>,
    evictable_count: usize,
}

/// LRU-K page replacement policy.
///
/// Approximates "largest backward K-distance": frames that never reached K
/// accesses are evicted before frames that did, and within each class the
/// least recently accessed frame goes first. Eviction skips frames whose
/// pin holders marked them non-evictable.
///
/// All operations take an internal latch, so a replacer can be shared
/// directly as well as consulted under the buffer pool's latch.
pub struct LruKReplacer {
    num_frames: usize,
    k: usize,
    inner: Mutex<ReplacerInner>,
}

impl LruKReplacer {
    /// Track up to `num_frames` frames with LRU-`k` ordering.
    ///
    /// # Panics
    ///
    /// Panics if `k` is zero.
    pub fn new(num_frames: usize, k: usize) -> Self {
        assert!(k > 0, "LRU-K requires k >= 1");
        Self {
            num_frames,
            k,
            inner: Mutex::new(ReplacerInner {
                history: VecDeque::with_capacity(num_frames),
                cache: VecDeque::with_capacity(num_frames),
                entries: HashMap::with_capacity(num_frames),
                evictable_count: 0,
            }),
        }
    }

    /// Record an access to `frame_id`, creating a tracked entry on first
    /// sight. New and still-cold frames (fewer than K accesses) re-enter the
    /// history tail; the K-th access promotes the frame to the cache list.
    ///
    /// # Panics
    ///
    /// Panics if `frame_id` is outside `[0, num_frames)`.
    pub fn record_access(&self, frame_id: FrameId) {
        self.check_bounds(frame_id);
        let mut inner = self.inner.lock();
        let inner = &mut *inner;
        if let Some(entry) = inner.entries.get_mut(&frame_id) {
            entry.access_count += 1;
            let count = entry.access_count;
            if count == self.k {
                remove_from(&mut inner.history, frame_id);
                inner.cache.push_back(frame_id);
            } else if count > self.k {
                remove_from(&mut inner.cache, frame_id);
                inner.cache.push_back(frame_id);
            } else {
                remove_from(&mut inner.history, frame_id);
                inner.history.push_back(frame_id);
            }
        } else {
            inner.entries.insert(
                frame_id,
                FrameEntry {
                    access_count: 1,
                    evictable: false,
                },
            );
            // At k == 1 the first access already satisfies count >= k
            if self.k == 1 {
                inner.cache.push_back(frame_id);
            } else {
                inner.history.push_back(frame_id);
            }
        }
    }

    /// Mark a tracked frame evictable or not. Untracked (in-range) frames
    /// and unchanged flags are no-ops.
    ///
    /// # Panics
    ///
    /// Panics if `frame_id` is outside `[0, num_frames)`.
    pub fn set_evictable(&self, frame_id: FrameId, evictable: bool) {
        self.check_bounds(frame_id);
        let mut inner = self.inner.lock();
        let inner = &mut *inner;
        let entry = match inner.entries.get_mut(&frame_id) {
            Some(entry) => entry,
            None => return,
        };
        if entry.evictable == evictable {
            return;
        }
        entry.evictable = evictable;
        if evictable {
            inner.evictable_count += 1;
        } else {
            inner.evictable_count -= 1;
        }
    }

    /// Choose a victim and stop tracking it. The history list is scanned
    /// head to tail first; the cache list is consulted only when no history
    /// frame is evictable. Returns None when nothing can be evicted.
    pub fn evict(&self) -> Option<FrameId> {
        let mut inner = self.inner.lock();
        let inner = &mut *inner;
        let frame_id = take_victim(&mut inner.history, &mut inner.entries)
            .or_else(|| take_victim(&mut inner.cache, &mut inner.entries))?;
        inner.evictable_count -= 1;
        Some(frame_id)
    }

    /// Forcibly stop tracking a frame. Untracked frames are a no-op.
    ///
    /// # Panics
    ///
    /// Panics if the frame is tracked but not evictable.
    pub fn remove(&self, frame_id: FrameId) {
        let mut inner = self.inner.lock();
        let inner = &mut *inner;
        let (evictable, in_cache) = match inner.entries.get(&frame_id) {
            Some(entry) => (entry.evictable, entry.access_count >= self.k),
            None => return,
        };
        if !evictable {
            panic!("cannot remove non-evictable frame {}", frame_id);
        }
        if in_cache {
            remove_from(&mut inner.cache, frame_id);
        } else {
            remove_from(&mut inner.history, frame_id);
        }
        inner.entries.remove(&frame_id);
        inner.evictable_count -= 1;
    }

    /// Number of tracked frames currently marked evictable.
    pub fn size(&self) -> usize {
        self.inner.lock().evictable_count
    }

    fn check_bounds(&self, frame_id: FrameId) {
        if frame_id as usize >= self.num_frames {
            panic!(
                "frame id {} out of range (replacer tracks {} frames)",
                frame_id, self.num_frames
            );
        }
    }
}

fn remove_from(list: &mut VecDeque<FrameId>, frame_id: FrameId) {
    if let Some(pos) = list.iter().position(|&id| id == frame_id) {
        list.remove(pos);
    }
}

/// Pop the first evictable frame off `list`, dropping its entry.
fn take_victim(
    list: &mut VecDeque<FrameId>,
    entries: &mut HashMap<FrameId, FrameEntry>,
) -> Option<FrameId> {
    let pos = list
        .iter()
        .position(|id| entries.get(id).map_or(false, |e| e.evictable))?;
    let frame_id = list.remove(pos)?;
    entries.remove(&frame_id);
    Some(frame_id)
}

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use log::error;
use parking_lot::{Mutex, RwLock};

use crate::common::types::{Page, PageId, PagePtr, FrameId, INVALID_PAGE_ID};
use crate::index::hash::ExtendibleHashTable;
use crate::storage::buffer::config::BufferPoolConfig;
use crate::storage::buffer::error::BufferPoolError;
use crate::storage::buffer::replacer::LruKReplacer;
use crate::storage::disk::DiskManager;

/// One slot of the pool. The frame identity is fixed; the page occupying it
/// changes over the pool's lifetime. All fields are guarded by the pool
/// latch; the page bytes behind `page` are additionally shared with pin
/// holders through their own lock.
struct Frame {
    page: PagePtr,
    page_id: PageId,
    pin_count: u32,
    is_dirty: bool,
}

impl Frame {
    fn new() -> Self {
        Self {
            page: Arc::new(RwLock::new(Page::new(INVALID_PAGE_ID))),
            page_id: INVALID_PAGE_ID,
            pin_count: 0,
            is_dirty: false,
        }
    }
}

/// Everything the pool mutates, behind one latch.
struct PoolInner {
    frames: Vec<Frame>,
    page_table: ExtendibleHashTable<PageId, FrameId>,
    free_list: VecDeque<FrameId>,
    replacer: LruKReplacer,
}

/// The buffer pool mediates between fixed-size on-disk pages and callers
/// that read or mutate them. It owns a fixed array of frames, a page table
/// mapping resident page IDs to frames, a free list, and an LRU-K replacer
/// choosing eviction victims among unpinned frames.
///
/// Every public operation takes the pool latch for its full duration,
/// including disk reads and write-backs, so operations from different
/// threads are linearizable. A page returned by `new_page` or `fetch_page`
/// stays pinned (and so resident) until a matching `unpin_page`.
pub struct BufferPoolManager {
    pool_size: usize,
    disk_manager: Arc<DiskManager>,
    inner: Mutex<PoolInner>,
}

impl BufferPoolManager {
    /// Create a pool of `pool_size` frames over the database file at
    /// `db_path`, with default replacer and page-table parameters.
    pub fn new(pool_size: usize, db_path: impl AsRef<Path>) -> Result<Self, BufferPoolError> {
        Self::with_config(BufferPoolConfig::new(pool_size), db_path)
    }

    pub fn with_config(
        config: BufferPoolConfig,
        db_path: impl AsRef<Path>,
    ) -> Result<Self, BufferPoolError> {
        config
            .validate()
            .map_err(|msg| BufferPoolError::InvalidConfig(msg.to_string()))?;

        let disk_manager = Arc::new(DiskManager::new(db_path)?);
        let mut frames = Vec::with_capacity(config.pool_size);
        let mut free_list = VecDeque::with_capacity(config.pool_size);

        for i in 0..config.pool_size {
            frames.push(Frame::new());
            free_list.push_back(i as FrameId);
        }

        Ok(Self {
            pool_size: config.pool_size,
            disk_manager,
            inner: Mutex::new(PoolInner {
                frames,
                page_table: ExtendibleHashTable::new(config.bucket_size),
                free_list,
                replacer: LruKReplacer::new(config.pool_size, config.replacer_k),
            }),
        })
    }

    /// Create a new page, pinned and marked dirty, in a zeroed frame.
    /// Fails with `NoFreeFrames` when every frame is pinned.
    pub fn new_page(&self) -> Result<(PagePtr, PageId), BufferPoolError> {
        let mut inner = self.inner.lock();
        let frame_id = self.acquire_frame(&mut inner)?;
        let page_id = match self.disk_manager.allocate_page() {
            Ok(page_id) => page_id,
            Err(e) => {
                release_frame(&mut inner, frame_id);
                return Err(e.into());
            }
        };

        let frame = &mut inner.frames[frame_id as usize];
        {
            let mut page = frame.page.write();
            page.reset();
            page.page_id = page_id;
        }
        frame.page_id = page_id;
        frame.pin_count = 1;
        frame.is_dirty = true;

        inner.page_table.insert(page_id, frame_id);
        inner.replacer.record_access(frame_id);
        inner.replacer.set_evictable(frame_id, false);

        Ok((inner.frames[frame_id as usize].page.clone(), page_id))
    }

    /// Fetch a page, reading it from disk if it is not resident. The pin
    /// count is incremented either way. Fails with `NoFreeFrames` when the
    /// page is absent and every frame is pinned.
    pub fn fetch_page(&self, page_id: PageId) -> Result<PagePtr, BufferPoolError> {
        if page_id == INVALID_PAGE_ID {
            return Err(BufferPoolError::InvalidPageId(page_id));
        }

        let mut inner = self.inner.lock();

        if let Some(frame_id) = inner.page_table.find(&page_id) {
            inner.replacer.record_access(frame_id);
            inner.replacer.set_evictable(frame_id, false);
            let frame = &mut inner.frames[frame_id as usize];
            frame.pin_count += 1;
            return Ok(frame.page.clone());
        }

        let frame_id = self.acquire_frame(&mut inner)?;

        let read_result = {
            let frame = &mut inner.frames[frame_id as usize];
            let mut page = frame.page.write();
            page.reset();
            self.disk_manager.read_page(page_id, &mut page)
        };
        if let Err(e) = read_result {
            // The frame was detached from its old page already; hand it to
            // the free list rather than losing it.
            release_frame(&mut inner, frame_id);
            return Err(e.into());
        }

        let frame = &mut inner.frames[frame_id as usize];
        frame.page_id = page_id;
        frame.pin_count = 1;
        frame.is_dirty = false;

        inner.page_table.insert(page_id, frame_id);
        inner.replacer.record_access(frame_id);
        inner.replacer.set_evictable(frame_id, false);

        Ok(inner.frames[frame_id as usize].page.clone())
    }

    /// Drop one pin on a page. `is_dirty` is sticky: once a pin holder
    /// reports a modification, only a flush clears the flag. When the pin
    /// count reaches zero the frame becomes evictable.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> Result<(), BufferPoolError> {
        let mut inner = self.inner.lock();
        let frame_id = inner
            .page_table
            .find(&page_id)
            .ok_or(BufferPoolError::PageNotFound(page_id))?;

        let frame = &mut inner.frames[frame_id as usize];
        if frame.pin_count == 0 {
            return Err(BufferPoolError::PageNotPinned(page_id));
        }
        frame.pin_count -= 1;
        frame.is_dirty |= is_dirty;
        let unpinned = frame.pin_count == 0;

        if unpinned {
            inner.replacer.set_evictable(frame_id, true);
        }
        Ok(())
    }

    /// Write a resident page back to disk, clearing its dirty flag. The
    /// write happens whether or not the page is dirty.
    pub fn flush_page(&self, page_id: PageId) -> Result<(), BufferPoolError> {
        let mut inner = self.inner.lock();
        let frame_id = inner
            .page_table
            .find(&page_id)
            .ok_or(BufferPoolError::PageNotFound(page_id))?;

        let frame = &mut inner.frames[frame_id as usize];
        {
            let page = frame.page.read();
            self.disk_manager.write_page(&page)?;
        }
        frame.is_dirty = false;
        Ok(())
    }

    /// Write every resident page back to disk. Frames holding no page are
    /// skipped.
    pub fn flush_all_pages(&self) -> Result<(), BufferPoolError> {
        let mut inner = self.inner.lock();
        for frame in inner.frames.iter_mut() {
            if frame.page_id == INVALID_PAGE_ID {
                continue;
            }
            {
                let page = frame.page.read();
                self.disk_manager.write_page(&page)?;
            }
            frame.is_dirty = false;
        }
        Ok(())
    }

    /// Remove a page from the pool and retire its ID. A page that is not
    /// resident is already gone (`Ok`); a pinned page cannot be deleted.
    /// The on-disk bytes are left in place and the frame returns to the
    /// free list without a write-back.
    pub fn delete_page(&self, page_id: PageId) -> Result<(), BufferPoolError> {
        let mut inner = self.inner.lock();
        let frame_id = match inner.page_table.find(&page_id) {
            Some(frame_id) => frame_id,
            None => return Ok(()),
        };
        if inner.frames[frame_id as usize].pin_count > 0 {
            return Err(BufferPoolError::PagePinned(page_id));
        }

        inner.page_table.remove(&page_id);
        {
            let frame = &mut inner.frames[frame_id as usize];
            let mut page = frame.page.write();
            page.reset();
            page.page_id = INVALID_PAGE_ID;
            drop(page);
            frame.page_id = INVALID_PAGE_ID;
            frame.pin_count = 0;
            frame.is_dirty = false;
        }
        inner.replacer.remove(frame_id);
        inner.free_list.push_back(frame_id);
        self.disk_manager.deallocate_page(page_id);
        Ok(())
    }

    /// Number of frames in the pool.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Number of frames currently holding no page.
    pub fn free_frame_count(&self) -> usize {
        self.inner.lock().free_list.len()
    }

    /// The disk collaborator backing this pool.
    pub fn disk_manager(&self) -> &Arc<DiskManager> {
        &self.disk_manager
    }

    /// Produce a frame ready to receive a page: the free-list head if any,
    /// otherwise an eviction victim. A dirty victim is written back before
    /// its page-table entry is dropped; if that write fails the eviction is
    /// abandoned and the victim goes back to the replacer untouched.
    fn acquire_frame(&self, inner: &mut PoolInner) -> Result<FrameId, BufferPoolError> {
        if let Some(frame_id) = inner.free_list.pop_front() {
            return Ok(frame_id);
        }

        let frame_id = match inner.replacer.evict() {
            Some(frame_id) => frame_id,
            None => return Err(BufferPoolError::NoFreeFrames),
        };

        let (is_dirty, old_page_id, page_ptr) = {
            let frame = &inner.frames[frame_id as usize];
            (frame.is_dirty, frame.page_id, frame.page.clone())
        };

        if is_dirty {
            let write_result = {
                let page = page_ptr.read();
                self.disk_manager.write_page(&page)
            };
            if let Err(e) = write_result {
                error!(
                    "write-back of page {} failed during eviction of frame {}: {}",
                    old_page_id, frame_id, e
                );
                inner.replacer.record_access(frame_id);
                inner.replacer.set_evictable(frame_id, true);
                return Err(e.into());
            }
            inner.frames[frame_id as usize].is_dirty = false;
        }

        if old_page_id != INVALID_PAGE_ID {
            inner.page_table.remove(&old_page_id);
        }

        Ok(frame_id)
    }
}

/// Return a frame holding no page to the free list.
fn release_frame(inner: &mut PoolInner, frame_id: FrameId) {
    let frame = &mut inner.frames[frame_id as usize];
    frame.page.write().page_id = INVALID_PAGE_ID;
    frame.page_id = INVALID_PAGE_ID;
    frame.pin_count = 0;
    frame.is_dirty = false;
    inner.free_list.push_back(frame_id);
}

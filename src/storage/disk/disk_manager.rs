use std::fs::{File, OpenOptions};
use std::io::{Read, Write, Seek, SeekFrom};
use std::path::Path;
use log::debug;
use parking_lot::Mutex;
use thiserror::Error;

use crate::common::types::{Page, PageId, INVALID_PAGE_ID, PAGE_SIZE};

#[derive(Error, Debug)]
pub enum DiskManagerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid page ID: {0}")]
    InvalidPageId(PageId),
}

/// File handle plus the allocation high-water mark, updated together under
/// one lock.
struct DiskState {
    file: File,
    num_pages: PageId,
}

/// DiskManager is responsible for handling the actual disk I/O operations.
/// Page `n` lives at byte offset `(n - 1) * PAGE_SIZE`; page 0 is the
/// invalid sentinel and is rejected everywhere.
pub struct DiskManager {
    state: Mutex<DiskState>,
    freed_pages: Mutex<Vec<PageId>>,
}

impl DiskManager {
    /// Open (or create) the database file at `db_path`. An existing file's
    /// length seeds the allocation counter, so IDs keep growing across
    /// reopens.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, DiskManagerError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(db_path)?;
        let num_pages = (file.metadata()?.len() / PAGE_SIZE as u64) as PageId;

        Ok(Self {
            state: Mutex::new(DiskState { file, num_pages }),
            freed_pages: Mutex::new(Vec::new()),
        })
    }

    /// Read a page from disk. A page that was never allocated or written
    /// reads back as all zeroes.
    pub fn read_page(&self, page_id: PageId, page: &mut Page) -> Result<(), DiskManagerError> {
        if page_id == INVALID_PAGE_ID {
            return Err(DiskManagerError::InvalidPageId(page_id));
        }

        let mut state = self.state.lock();
        page.page_id = page_id;

        if page_id > state.num_pages {
            page.reset();
            return Ok(());
        }

        state.file.seek(SeekFrom::Start(offset_of(page_id)))?;
        state.file.read_exact(&mut page.data)?;
        Ok(())
    }

    /// Write a page to disk.
    pub fn write_page(&self, page: &Page) -> Result<(), DiskManagerError> {
        if page.page_id == INVALID_PAGE_ID {
            return Err(DiskManagerError::InvalidPageId(page.page_id));
        }

        let mut state = self.state.lock();
        state.file.seek(SeekFrom::Start(offset_of(page.page_id)))?;
        state.file.write_all(&page.data)?;
        state.file.flush()?;
        Ok(())
    }

    /// Allocate a new page and return its ID. IDs are monotonically
    /// increasing; the first allocated page is 1. The file is extended to
    /// cover the new page, which therefore reads as zeroes until written.
    pub fn allocate_page(&self) -> Result<PageId, DiskManagerError> {
        let mut state = self.state.lock();
        state.num_pages += 1;
        let page_id = state.num_pages;
        state.file.set_len(offset_of(page_id) + PAGE_SIZE as u64)?;
        Ok(page_id)
    }

    /// Retire a page ID. Bookkeeping only: the ID is never handed out again
    /// and the page bytes stay on disk.
    pub fn deallocate_page(&self, page_id: PageId) {
        debug!("deallocating page {}", page_id);
        self.freed_pages.lock().push(page_id);
    }

    /// Number of page IDs retired through `deallocate_page`.
    pub fn deallocated_count(&self) -> usize {
        self.freed_pages.lock().len()
    }
}

/// Byte offset of a page in the database file.
fn offset_of(page_id: PageId) -> u64 {
    (page_id as u64 - 1) * PAGE_SIZE as u64
}

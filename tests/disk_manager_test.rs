use anyhow::Result;

use herondb::common::types::{Page, INVALID_PAGE_ID};
use herondb::storage::disk::{DiskManager, DiskManagerError};

mod common;
use common::create_temp_db_file;

#[test]
fn test_allocate_is_monotonic() -> Result<()> {
    let (_file, path) = create_temp_db_file()?;
    let disk_manager = DiskManager::new(path)?;

    let first = disk_manager.allocate_page()?;
    let second = disk_manager.allocate_page()?;
    let third = disk_manager.allocate_page()?;

    assert_eq!(first, 1);
    assert!(second > first);
    assert!(third > second);

    Ok(())
}

#[test]
fn test_write_read_round_trip() -> Result<()> {
    let (_file, path) = create_temp_db_file()?;
    let disk_manager = DiskManager::new(path)?;

    let page_id = disk_manager.allocate_page()?;
    let mut page = Page::new(page_id);
    page.data[0..5].copy_from_slice(b"hello");
    disk_manager.write_page(&page)?;

    let mut read_back = Page::new(INVALID_PAGE_ID);
    disk_manager.read_page(page_id, &mut read_back)?;
    assert_eq!(read_back.page_id, page_id);
    assert_eq!(&read_back.data[0..5], b"hello");

    Ok(())
}

#[test]
fn test_never_written_page_reads_zeroed() -> Result<()> {
    let (_file, path) = create_temp_db_file()?;
    let disk_manager = DiskManager::new(path)?;

    let mut page = Page::new(INVALID_PAGE_ID);
    page.data[0] = 0xFF;
    disk_manager.read_page(99, &mut page)?;

    assert_eq!(page.page_id, 99);
    assert!(page.data.iter().all(|&b| b == 0));

    Ok(())
}

#[test]
fn test_invalid_page_id_rejected() -> Result<()> {
    let (_file, path) = create_temp_db_file()?;
    let disk_manager = DiskManager::new(path)?;

    let mut page = Page::new(INVALID_PAGE_ID);
    assert!(matches!(
        disk_manager.read_page(INVALID_PAGE_ID, &mut page),
        Err(DiskManagerError::InvalidPageId(_))
    ));
    assert!(matches!(
        disk_manager.write_page(&page),
        Err(DiskManagerError::InvalidPageId(_))
    ));

    Ok(())
}

#[test]
fn test_deallocate_is_bookkeeping_only() -> Result<()> {
    let (_file, path) = create_temp_db_file()?;
    let disk_manager = DiskManager::new(path)?;

    let page_id = disk_manager.allocate_page()?;
    let mut page = Page::new(page_id);
    page.data[0..4].copy_from_slice(b"data");
    disk_manager.write_page(&page)?;

    disk_manager.deallocate_page(page_id);
    assert_eq!(disk_manager.deallocated_count(), 1);

    // The bytes are still there and the ID is not handed out again
    let mut read_back = Page::new(INVALID_PAGE_ID);
    disk_manager.read_page(page_id, &mut read_back)?;
    assert_eq!(&read_back.data[0..4], b"data");
    assert!(disk_manager.allocate_page()? > page_id);

    Ok(())
}

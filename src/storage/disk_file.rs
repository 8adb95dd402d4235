//! Disk file - a [`PagedFile`] backed by one OS file.
//!
//! The [`DiskFile`] handles all direct file operations:
//! - Reading and writing pages
//! - Allocating new pages, reusing disposed ones first
//! - Managing the database file

use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use parking_lot::Mutex;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;
use crate::storage::PagedFile;

/// A paged file on disk.
///
/// # File Layout
/// Pages are laid out sequentially:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// # Free pages
/// Disposed page numbers go on an in-memory free list and are handed out
/// again, lowest first, by `allocate_page`. The list is not persisted: a
/// reopened file treats every page below its length as allocated.
///
/// # Durability
/// All writes are followed by `fsync()`.
pub struct DiskFile {
    inner: Mutex<DiskFileInner>,
}

struct DiskFileInner {
    file: File,
    /// Number of pages in the file, including disposed ones.
    page_count: u32,
    /// Disposed page numbers awaiting reuse.
    free_pages: BTreeSet<PageId>,
}

impl DiskFileInner {
    fn check_allocated(&self, page_no: PageId) -> Result<()> {
        if page_no.0 >= self.page_count || self.free_pages.contains(&page_no) {
            return Err(Error::InvalidPage(page_no));
        }
        Ok(())
    }

    fn write_at(&mut self, page_no: PageId, bytes: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(page_no.byte_offset()))?;
        self.file.write_all(bytes)?;
        self.file.sync_all()?;
        Ok(())
    }
}

/// Number of whole pages in a file of `file_size` bytes.
///
/// Page numbers are `u32`, so a longer file can't be addressed.
fn page_count_for(file_size: u64) -> Result<u32> {
    let pages = file_size / PAGE_SIZE as u64;
    u32::try_from(pages).map_err(|_| Error::InvalidPage(PageId::INVALID))
}

impl DiskFile {
    /// Create a new database file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        Ok(Self::from_parts(file, 0))
    }

    /// Open an existing database file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        let file_size = file.metadata()?.len();
        let page_count = page_count_for(file_size)?;

        Ok(Self::from_parts(file, page_count))
    }

    /// Open an existing database file, or create if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    fn from_parts(file: File, page_count: u32) -> Self {
        Self {
            inner: Mutex::new(DiskFileInner {
                file,
                page_count,
                free_pages: BTreeSet::new(),
            }),
        }
    }

    /// Number of pages in the file, including disposed ones.
    pub fn page_count(&self) -> u32 {
        self.inner.lock().page_count
    }

    /// Number of disposed pages waiting to be reused.
    pub fn free_page_count(&self) -> usize {
        self.inner.lock().free_pages.len()
    }

    /// Total size of the file in bytes.
    pub fn file_size(&self) -> u64 {
        u64::from(self.page_count()) * PAGE_SIZE as u64
    }
}

impl PagedFile for DiskFile {
    fn read_page(&self, page_no: PageId, page: &mut Page) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.check_allocated(page_no)?;

        inner.file.seek(SeekFrom::Start(page_no.byte_offset()))?;
        inner.file.read_exact(page.as_mut_slice())?;
        Ok(())
    }

    fn write_page(&self, page_no: PageId, page: &Page) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.check_allocated(page_no)?;
        inner.write_at(page_no, page.as_slice())
    }

    fn allocate_page(&self) -> Result<PageId> {
        let mut inner = self.inner.lock();
        let zeros = [0u8; PAGE_SIZE];

        if let Some(page_no) = inner.free_pages.first().copied() {
            inner.write_at(page_no, &zeros)?;
            inner.free_pages.remove(&page_no);
            return Ok(page_no);
        }

        let page_no = PageId::new(inner.page_count);
        if !page_no.is_valid() {
            return Err(Error::InvalidPage(page_no));
        }
        inner.write_at(page_no, &zeros)?;
        inner.page_count += 1;
        Ok(page_no)
    }

    fn dispose_page(&self, page_no: PageId) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.check_allocated(page_no)?;
        inner.free_pages.insert(page_no);
        Ok(())
    }
}

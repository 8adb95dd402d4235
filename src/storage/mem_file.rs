//! In-memory paged file for testing.

use std::collections::{BTreeSet, HashMap};

use parking_lot::Mutex;

use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;
use crate::storage::PagedFile;

/// An in-memory [`PagedFile`].
///
/// Besides storing pages, it records every call made against it and can be
/// told to fail reads, writes, or allocations. Tests use it to check exactly
/// which I/O the buffer manager performs and how it reacts to failures.
///
/// Nothing is persistent - all data is lost when dropped.
#[derive(Default)]
pub struct MemFile {
    inner: Mutex<MemFileInner>,
}

#[derive(Default)]
struct MemFileInner {
    pages: HashMap<PageId, Box<Page>>,
    next_page_no: u32,
    free_pages: BTreeSet<PageId>,
    /// Page numbers passed to successful `write_page` calls, in order.
    write_log: Vec<PageId>,
    reads: usize,
    allocations: usize,
    disposals: usize,
    fail_reads: bool,
    fail_writes: bool,
    fail_allocations: bool,
}

fn injected(op: &str) -> Error {
    Error::Io(std::io::Error::other(format!("injected {op} failure")))
}

impl MemFile {
    /// Creates a new empty file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a file with pages `0..count` already allocated and zeroed.
    ///
    /// Setup allocations are not counted.
    pub fn with_pages(count: u32) -> Self {
        let file = Self::new();
        {
            let mut inner = file.inner.lock();
            for page_no in 0..count {
                inner.pages.insert(PageId::new(page_no), Box::new(Page::new()));
            }
            inner.next_page_no = count;
        }
        file
    }

    /// Overwrites the stored bytes of an allocated page without counting a write.
    pub fn put(&self, page_no: PageId, bytes: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock();
        let page = inner
            .pages
            .get_mut(&page_no)
            .ok_or(Error::InvalidPage(page_no))?;
        page.as_mut_slice()[..bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// The first `len` stored bytes of a page, if it is allocated.
    pub fn bytes(&self, page_no: PageId, len: usize) -> Option<Vec<u8>> {
        let inner = self.inner.lock();
        inner.pages.get(&page_no).map(|p| p.as_slice()[..len].to_vec())
    }

    /// Whether `page_no` is currently allocated.
    pub fn contains(&self, page_no: PageId) -> bool {
        self.inner.lock().pages.contains_key(&page_no)
    }

    /// Every page number successfully written, in call order.
    pub fn write_log(&self) -> Vec<PageId> {
        self.inner.lock().write_log.clone()
    }

    /// Number of successful writes of `page_no`.
    pub fn writes_of(&self, page_no: PageId) -> usize {
        self.inner
            .lock()
            .write_log
            .iter()
            .filter(|&&p| p == page_no)
            .count()
    }

    /// Total successful writes.
    pub fn write_count(&self) -> usize {
        self.inner.lock().write_log.len()
    }

    /// Total successful reads.
    pub fn read_count(&self) -> usize {
        self.inner.lock().reads
    }

    /// Total successful allocations.
    pub fn allocation_count(&self) -> usize {
        self.inner.lock().allocations
    }

    /// Total successful disposals.
    pub fn disposal_count(&self) -> usize {
        self.inner.lock().disposals
    }

    /// Make subsequent reads fail with an I/O error.
    pub fn fail_reads(&self, fail: bool) {
        self.inner.lock().fail_reads = fail;
    }

    /// Make subsequent writes fail with an I/O error.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }

    /// Make subsequent allocations fail with an I/O error.
    pub fn fail_allocations(&self, fail: bool) {
        self.inner.lock().fail_allocations = fail;
    }
}

impl PagedFile for MemFile {
    fn read_page(&self, page_no: PageId, page: &mut Page) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.fail_reads {
            return Err(injected("read"));
        }
        let stored = inner.pages.get(&page_no).ok_or(Error::InvalidPage(page_no))?;
        page.copy_from(stored);
        inner.reads += 1;
        Ok(())
    }

    fn write_page(&self, page_no: PageId, page: &Page) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.fail_writes {
            return Err(injected("write"));
        }
        let stored = inner
            .pages
            .get_mut(&page_no)
            .ok_or(Error::InvalidPage(page_no))?;
        stored.copy_from(page);
        inner.write_log.push(page_no);
        Ok(())
    }

    fn allocate_page(&self) -> Result<PageId> {
        let mut inner = self.inner.lock();
        if inner.fail_allocations {
            return Err(injected("allocate"));
        }

        let page_no = match inner.free_pages.pop_first() {
            Some(page_no) => page_no,
            None => {
                let page_no = PageId::new(inner.next_page_no);
                inner.next_page_no += 1;
                page_no
            }
        };
        inner.pages.insert(page_no, Box::new(Page::new()));
        inner.allocations += 1;
        Ok(page_no)
    }

    fn dispose_page(&self, page_no: PageId) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.pages.remove(&page_no).is_none() {
            return Err(Error::InvalidPage(page_no));
        }
        inner.free_pages.insert(page_no);
        inner.disposals += 1;
        Ok(())
    }
}

//! Page table - maps cached pages to the frames holding them.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::common::{Error, FileId, FrameId, PageId, Result};

/// One page-table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    file: FileId,
    page_no: PageId,
    frame_id: FrameId,
}

/// Fixed-size chained hash table from `(FileId, PageId)` to `FrameId`.
///
/// The bucket count is chosen once from the pool capacity (see
/// [`page_table_buckets`](crate::common::config::page_table_buckets)) and
/// never grows: the table can never hold more entries than there are frames.
///
/// Each key maps to at most one frame. Inserting a present key or removing
/// an absent one is an `Error::PageTable`.
#[derive(Debug)]
pub struct PageTable {
    buckets: Vec<Vec<Entry>>,
    len: usize,
}

impl PageTable {
    /// Create an empty table with `bucket_count` buckets (at least one).
    pub fn new(bucket_count: usize) -> Self {
        Self {
            buckets: vec![Vec::new(); bucket_count.max(1)],
            len: 0,
        }
    }

    fn bucket(&self, file: FileId, page_no: PageId) -> usize {
        let mut hasher = DefaultHasher::new();
        file.hash(&mut hasher);
        page_no.hash(&mut hasher);
        (hasher.finish() % self.buckets.len() as u64) as usize
    }

    /// Frame holding `page_no` of `file`, if cached.
    pub fn lookup(&self, file: FileId, page_no: PageId) -> Option<FrameId> {
        self.buckets[self.bucket(file, page_no)]
            .iter()
            .find(|e| e.file == file && e.page_no == page_no)
            .map(|e| e.frame_id)
    }

    /// Map `page_no` of `file` to `frame_id`.
    ///
    /// # Errors
    /// `Error::PageTable` if the page already has an entry.
    pub fn insert(&mut self, file: FileId, page_no: PageId, frame_id: FrameId) -> Result<()> {
        let idx = self.bucket(file, page_no);
        let bucket = &mut self.buckets[idx];

        if bucket.iter().any(|e| e.file == file && e.page_no == page_no) {
            return Err(Error::PageTable { file, page_no });
        }

        bucket.push(Entry {
            file,
            page_no,
            frame_id,
        });
        self.len += 1;
        Ok(())
    }

    /// Remove the entry for `page_no` of `file`, returning its frame.
    ///
    /// # Errors
    /// `Error::PageTable` if there is no such entry.
    pub fn remove(&mut self, file: FileId, page_no: PageId) -> Result<FrameId> {
        let idx = self.bucket(file, page_no);
        let bucket = &mut self.buckets[idx];

        let pos = bucket
            .iter()
            .position(|e| e.file == file && e.page_no == page_no)
            .ok_or(Error::PageTable { file, page_no })?;

        self.len -= 1;
        Ok(bucket.swap_remove(pos).frame_id)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// All entries, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (FileId, PageId, FrameId)> + '_ {
        self.buckets
            .iter()
            .flatten()
            .map(|e| (e.file, e.page_no, e.frame_id))
    }
}

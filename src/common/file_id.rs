//! File identifier type.

use std::fmt;
use std::sync::Arc;

/// Identifies an open file handle.
///
/// Two handles are the same file iff they share one `Arc` allocation, so the
/// id is that allocation's address. Every cached frame keeps a clone of the
/// `Arc`, which keeps the address from being reused while the buffer pool
/// still refers to it.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use clockpool::common::FileId;
///
/// let a = Arc::new(1u8);
/// let b = Arc::clone(&a);
/// let c = Arc::new(1u8);
/// assert_eq!(FileId::of(&a), FileId::of(&b));
/// assert_ne!(FileId::of(&a), FileId::of(&c));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(usize);

impl FileId {
    /// The id of the file behind `handle`.
    #[inline]
    pub fn of<F: ?Sized>(handle: &Arc<F>) -> Self {
        FileId(Arc::as_ptr(handle) as *const () as usize)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File({:#x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named {
        fn name(&self) -> &str;
    }

    struct Plain;

    impl Named for Plain {
        fn name(&self) -> &str {
            "plain"
        }
    }

    #[test]
    fn test_file_id_through_trait_object() {
        let concrete = Arc::new(Plain);
        let erased: Arc<dyn Named> = concrete.clone();

        assert_eq!(erased.name(), "plain");
        assert_eq!(FileId::of(&concrete), FileId::of(&erased));
    }

    #[test]
    fn test_file_id_distinct_allocations() {
        let a: Arc<dyn Named> = Arc::new(Plain);
        let b: Arc<dyn Named> = Arc::new(Plain);
        // Zero-sized values still get distinct `Arc` allocations (the counts live there).
        assert_ne!(FileId::of(&a), FileId::of(&b));
    }

    #[test]
    fn test_file_id_display() {
        let a = Arc::new(0u32);
        assert!(format!("{}", FileId::of(&a)).starts_with("File(0x"));
    }
}

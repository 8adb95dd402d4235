//! Page buffers.
//!
//! This module contains [`Page`], the raw 4KB data container. The buffer
//! pool copies bytes in and out of pages but defines no layout inside them.

#[allow(clippy::module_inception)]
mod page;

pub use page::Page;

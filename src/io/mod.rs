//! File access implementations for the loader's I/O seam.

pub mod disk;
pub mod memory;

pub use disk::DiskFileAccess;
pub use memory::MemoryFileAccess;

//! User-visible constants for the mapping syscalls.

/// Pages may be read.
pub const PROT_READ: u32 = 0x1;
/// Pages may be written.
pub const PROT_WRITE: u32 = 0x2;

/// Stores reach the backing file on unmap.
pub const MAP_SHARED: u32 = 0x01;
/// Stores stay private to the process.
pub const MAP_PRIVATE: u32 = 0x02;

//! Memory-mapped file support for an xv6-style teaching kernel.
//!
//! The crate hosts the kernel side of `mmap`/`munmap`: a ring allocator for
//! the fixed per-process mapping window, the mapping table, and the map/unmap
//! engine with write-back for shared writable mappings. The collaborators the
//! engine needs (page table, file objects, process record) are modeled
//! in-memory, so the whole subsystem runs under the host test harness.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod mm;
pub mod posix;
pub mod process;
pub mod sync;
pub mod syscalls;
pub mod vfs;

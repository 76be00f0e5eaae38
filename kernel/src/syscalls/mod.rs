//! System-call entry points for the mapping subsystem.

pub mod memory;


pub use memory::{sys_mmap, sys_munmap};

//! Memory management syscalls.
//!
//! Mostly argument checking, since user code is not trusted; the real work
//! happens in `mm::mmap` under the process lock.

use log::warn;

use crate::mm::{self, MapError};
use crate::process::Process;
use crate::sync::Sleeplock;

/// Check that `args` holds at least `n` raw argument words.
fn extract_args(args: &[u64], n: usize) -> Result<&[u64], MapError> {
    if args.len() < n {
        return Err(MapError::BadArgs);
    }
    Ok(&args[..n])
}

/// `mmap(hint, length, prot, flags, fd, offset)`: map a byte range of an
/// open file, returning the chosen address or -1. The placement hint is
/// ignored; the kernel always picks the slot in the mapping window.
pub fn sys_mmap(p: &Sleeplock<Process>, args: &[u64]) -> i64 {
    match do_mmap(p, args) {
        Ok(va) => va as i64,
        Err(e) => {
            warn!("mmap: {}", e);
            -1
        }
    }
}

fn do_mmap(p: &Sleeplock<Process>, args: &[u64]) -> Result<usize, MapError> {
    let args = extract_args(args, 6)?;
    let length = usize::try_from(args[1]).map_err(|_| MapError::BadArgs)?;
    let prot = u32::try_from(args[2]).map_err(|_| MapError::BadArgs)?;
    let flags = u32::try_from(args[3]).map_err(|_| MapError::BadArgs)?;
    let fd = usize::try_from(args[4]).map_err(|_| MapError::BadArgs)?;
    let offset = args[5];

    let mut p = p.lock();
    mm::mmap(&mut p, length, prot, flags, fd, offset)
}

/// `munmap(addr, length)`: release a range that lines up with the edge of a
/// live mapping. Returns 0 on success, -1 on failure.
pub fn sys_munmap(p: &Sleeplock<Process>, args: &[u64]) -> i64 {
    match do_munmap(p, args) {
        Ok(()) => 0,
        Err(e) => {
            warn!("munmap: {}", e);
            -1
        }
    }
}

fn do_munmap(p: &Sleeplock<Process>, args: &[u64]) -> Result<(), MapError> {
    let args = extract_args(args, 2)?;
    let addr = usize::try_from(args[0]).map_err(|_| MapError::BadArgs)?;
    let length = usize::try_from(args[1]).map_err(|_| MapError::BadArgs)?;

    let mut p = p.lock();
    mm::munmap(&mut p, addr, length)
}

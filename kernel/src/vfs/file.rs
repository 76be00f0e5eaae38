//! Open file handle.

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec;

use super::{FsError, Inode};
use crate::mm::vm::PageTable;
use crate::sync::{Mutex, Sleeplock};

/// Open file handle. Handles are shared by reference count: `dup` clones the
/// `Arc`, dropping the last clone closes the file.
pub struct File {
    pub readable: bool,
    pub writable: bool,
    /// Read/write cursor in bytes.
    off: Mutex<u64>,
    pub inode: Arc<Sleeplock<Inode>>,
}

impl File {
    pub fn open(inode: Inode, readable: bool, writable: bool) -> Arc<Self> {
        Arc::new(Self {
            readable,
            writable,
            off: Mutex::new(0),
            inode: Arc::new(Sleeplock::new(inode)),
        })
    }

    /// Take another reference to the handle.
    pub fn dup(self: &Arc<Self>) -> Arc<Self> {
        Arc::clone(self)
    }

    pub fn offset(&self) -> u64 {
        *self.off.lock()
    }

    pub fn seek(&self, off: u64) {
        *self.off.lock() = off;
    }

    /// Read `n` bytes at the cursor into user memory at `dst_va`.
    pub fn read(&self, pt: &mut PageTable, dst_va: usize, n: usize) -> Result<usize, FsError> {
        let mut off = self.off.lock();
        let mut buf = vec![0u8; n];
        let got = self.inode.lock().read_at(&mut buf, *off);
        pt.copyout(dst_va, &buf[..got])
            .map_err(|_| FsError::BadAddress)?;
        *off += got as u64;
        Ok(got)
    }

    /// Write `n` bytes from user memory at `src_va` at the cursor.
    pub fn write(&self, pt: &PageTable, src_va: usize, n: usize) -> Result<usize, FsError> {
        let mut off = self.off.lock();
        let written = write_inode(&self.inode, pt, src_va, n, *off)?;
        *off += written as u64;
        Ok(written)
    }

    /// Write `n` bytes from user memory at `src_va` at byte `off`, leaving
    /// the cursor alone.
    pub fn write_at(
        &self,
        pt: &PageTable,
        src_va: usize,
        n: usize,
        off: u64,
    ) -> Result<usize, FsError> {
        write_inode(&self.inode, pt, src_va, n, off)
    }
}

fn write_inode(
    inode: &Sleeplock<Inode>,
    pt: &PageTable,
    src_va: usize,
    n: usize,
    off: u64,
) -> Result<usize, FsError> {
    let mut buf = vec![0u8; n];
    pt.copyin(&mut buf, src_va).map_err(|_| FsError::BadAddress)?;
    Ok(inode.lock().write_at(&buf, off))
}

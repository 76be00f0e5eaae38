//! Virtual memory model backing the mapping subsystem.
//!
//! A page table here is a sparse map from virtual page numbers to owned
//! frames. It exposes the page-granular primitives the map/unmap engine
//! relies on (`translate`, `unmap_pages`) plus the user-memory movers
//! (`copyin`/`copyout`) the file layer uses for transfers.

extern crate alloc;

use alloc::boxed::Box;
use hashbrown::HashMap;

use super::{page_round_down, PAGE_SHIFT, PAGE_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmError {
    AlreadyMapped,
    NotMapped,
}

/// One physical page frame. Freshly allocated frames are zeroed.
pub struct Frame(Box<[u8; PAGE_SIZE]>);

impl Frame {
    pub fn alloc() -> Self {
        Frame(Box::new([0; PAGE_SIZE]))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0[..]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0[..]
    }
}

/// Sparse per-process page table.
pub struct PageTable {
    pages: HashMap<usize, Frame>,
}

impl PageTable {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
        }
    }

    /// Install `frame` at page-aligned `va`.
    pub fn map_page(&mut self, va: usize, frame: Frame) -> Result<(), VmError> {
        let vpn = va >> PAGE_SHIFT;
        if self.pages.contains_key(&vpn) {
            return Err(VmError::AlreadyMapped);
        }
        self.pages.insert(vpn, frame);
        Ok(())
    }

    /// Remove the page holding `va`, returning its frame.
    pub fn unmap_page(&mut self, va: usize) -> Option<Frame> {
        self.pages.remove(&(va >> PAGE_SHIFT))
    }

    /// Translate a virtual address; `None` if the page is not mapped.
    pub fn translate(&self, va: usize) -> Option<usize> {
        let frame = self.pages.get(&(va >> PAGE_SHIFT))?;
        Some(frame.0.as_ptr() as usize | (va & (PAGE_SIZE - 1)))
    }

    /// Remove `npages` page entries starting at the page holding `va`,
    /// freeing the backing frames unless `do_free` is false (a frame owned
    /// elsewhere stays allocated).
    pub fn unmap_pages(&mut self, va: usize, npages: usize, do_free: bool) {
        let start = page_round_down(va);
        for i in 0..npages {
            if let Some(frame) = self.unmap_page(start + i * PAGE_SIZE) {
                if !do_free {
                    core::mem::forget(frame);
                }
            }
        }
    }

    /// Copy `dst.len()` bytes out of user memory at `src_va`.
    pub fn copyin(&self, dst: &mut [u8], mut src_va: usize) -> Result<(), VmError> {
        let mut copied = 0;
        while copied < dst.len() {
            let off = src_va & (PAGE_SIZE - 1);
            let n = (PAGE_SIZE - off).min(dst.len() - copied);
            let frame = self
                .pages
                .get(&(src_va >> PAGE_SHIFT))
                .ok_or(VmError::NotMapped)?;
            dst[copied..copied + n].copy_from_slice(&frame.0[off..off + n]);
            copied += n;
            src_va += n;
        }
        Ok(())
    }

    /// Copy `src` into user memory at `dst_va`.
    pub fn copyout(&mut self, mut dst_va: usize, src: &[u8]) -> Result<(), VmError> {
        let mut copied = 0;
        while copied < src.len() {
            let off = dst_va & (PAGE_SIZE - 1);
            let n = (PAGE_SIZE - off).min(src.len() - copied);
            let frame = self
                .pages
                .get_mut(&(dst_va >> PAGE_SHIFT))
                .ok_or(VmError::NotMapped)?;
            frame.0[off..off + n].copy_from_slice(&src[copied..copied + n]);
            copied += n;
            dst_va += n;
        }
        Ok(())
    }
}

impl Default for PageTable {
    fn default() -> Self {
        Self::new()
    }
}

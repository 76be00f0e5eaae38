//! The map and unmap operations.
//!
//! `mmap` polices the request against the file's capabilities, reserves a run
//! of pages in the mapping window, seeds the pages with file content, and
//! records the mapping. `munmap` strips pages off one edge of a live mapping,
//! writing shared writable pages back to the file before their page-table
//! entries go away. Carving a hole out of the middle of a mapping is not
//! supported; a request must line up with a mapping's low or high boundary.

use core::fmt;

use log::warn;

use super::mapping::{MapBacking, Mapping, Prot, Share};
use super::region::Reservation;
use super::vm::Frame;
use super::{page_round_down, window_addr, window_page, PAGE_SIZE};
use crate::process::Process;

/// Why a map or unmap request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapError {
    /// Argument fetch or shape invalid.
    BadArgs,
    /// The mapping window cannot host the requested pages.
    NoSpace,
    /// No free slot in the mapping table.
    TooManyMaps,
    /// Descriptor not open.
    BadFd,
    /// Empty protection set.
    BadProt,
    /// The file lacks a capability the protection requires.
    Perm,
    /// The range does not line up with a live mapping's edge.
    NotEdge,
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            MapError::BadArgs => "bad arguments",
            MapError::NoSpace => "no space in mapping window",
            MapError::TooManyMaps => "too many mappings",
            MapError::BadFd => "bad file descriptor",
            MapError::BadProt => "empty protection",
            MapError::Perm => "permission denied",
            MapError::NotEdge => "range is not a mapping edge",
        };
        f.write_str(msg)
    }
}

/// Map `length` bytes of the open file `fd`, starting at file byte `offset`,
/// into the process's mapping window. Returns the chosen page-aligned
/// address.
pub fn mmap(
    p: &mut Process,
    length: usize,
    prot: u32,
    flags: u32,
    fd: usize,
    offset: u64,
) -> Result<usize, MapError> {
    if length == 0 {
        return Err(MapError::BadArgs);
    }
    let prot = Prot::from_bits(prot).ok_or(MapError::BadArgs)?;
    let share = Share::from_raw(flags).ok_or(MapError::BadArgs)?;

    if p.region.is_full() {
        return Err(MapError::NoSpace);
    }
    let npages = length.div_ceil(PAGE_SIZE);

    let slot = p.maps.alloc_slot()?;
    let file = p.fd_get(fd).cloned().ok_or(MapError::BadFd)?;

    if prot.is_empty() {
        return Err(MapError::BadProt);
    }
    if prot.contains(Prot::READ) && !file.readable {
        return Err(MapError::Perm);
    }
    // Private writable mappings never reach the file, so only shared ones
    // need it writable.
    if prot.contains(Prot::WRITE) && share == Share::Shared && !file.writable {
        return Err(MapError::Perm);
    }

    let Reservation { start_page, .. } = p.region.reserve(npages)?;
    let start = window_addr(start_page);

    // Seed every page with the file bytes behind it; anything past the end
    // of the file stays zero.
    {
        let inode = file.inode.lock();
        for i in 0..npages {
            let mut frame = Frame::alloc();
            inode.read_at(frame.as_mut_slice(), offset + (i * PAGE_SIZE) as u64);
            if p.pagetable.map_page(start + i * PAGE_SIZE, frame).is_err() {
                panic!("mmap: window page {} already mapped", start_page + i);
            }
        }
    }

    p.maps.install(
        slot,
        Mapping {
            backing: MapBacking::File { file, offset },
            prot,
            share,
            start,
            end: start + length,
        },
    );
    Ok(start)
}

/// Unmap `length` bytes starting at `addr`. The range must begin at some
/// live mapping's `start` or finish at some live mapping's `end`.
pub fn munmap(p: &mut Process, addr: usize, length: usize) -> Result<(), MapError> {
    if length == 0 {
        return Err(MapError::BadArgs);
    }
    let end = addr.checked_add(length).ok_or(MapError::BadArgs)?;

    if let Some(idx) = p.maps.find_by_start(addr) {
        unmap_head(p, idx, addr, end)
    } else if let Some(idx) = p.maps.find_by_end(end) {
        unmap_tail(p, idx, addr, end)
    } else {
        Err(MapError::NotEdge)
    }
}

/// Strip pages off the low-address side of mapping `idx`, one page-bounded
/// chunk per step.
fn unmap_head(p: &mut Process, idx: usize, mut addr: usize, end: usize) -> Result<(), MapError> {
    while addr < end {
        let Some(m) = p.maps.get_mut(idx) else {
            panic!("munmap: live mapping slot {} lost", idx);
        };
        let next_page = page_round_down(addr) + PAGE_SIZE;
        let boundary = next_page.min(m.end).min(end);

        // A page absent from the page table is not an error; skip it.
        if p.pagetable.translate(addr).is_some() {
            if m.prot.contains(Prot::WRITE) && m.share == Share::Shared {
                if let MapBacking::File { file, offset } = &m.backing {
                    // Flush before the page-table entry goes away.
                    if let Err(e) = file.write_at(&p.pagetable, addr, boundary - addr, *offset) {
                        warn!("munmap: write-back failed at {:#x}: {:?}", addr, e);
                    }
                }
            }
            if boundary == m.end || boundary == next_page {
                p.pagetable.unmap_pages(page_round_down(addr), 1, true);
                p.region.clear_full();
            }
        }

        if boundary == m.end {
            // Fully drained: the slot's file reference goes with the mapping,
            // then the ring rewinds.
            drop(p.maps.remove(idx));
            let successor = p.maps.find_by_start(next_page).is_some();
            p.region.drain_head(window_page(next_page), successor);
            return Ok(());
        }
        m.trim_start(boundary - addr);
        p.region.release_head(1);
        addr = next_page;
    }
    Ok(())
}

/// Strip pages off the high-address side of mapping `idx`, walking down from
/// the top of the range.
fn unmap_tail(p: &mut Process, idx: usize, addr: usize, mut end: usize) -> Result<(), MapError> {
    while end > addr {
        let Some(m) = p.maps.get_mut(idx) else {
            panic!("munmap: live mapping slot {} lost", idx);
        };
        let prev_page = page_round_down(end - 1);
        let boundary = m.start.max(prev_page).max(addr);

        if p.pagetable.translate(boundary).is_some() {
            if m.prot.contains(Prot::WRITE) && m.share == Share::Shared {
                if let MapBacking::File { file, offset } = &m.backing {
                    let off = *offset + (boundary - m.start) as u64;
                    if let Err(e) = file.write_at(&p.pagetable, boundary, end - boundary, off) {
                        warn!("munmap: write-back failed at {:#x}: {:?}", boundary, e);
                    }
                }
            }
            if boundary == m.start || boundary == prev_page {
                p.pagetable.unmap_pages(prev_page, 1, true);
                p.region.clear_full();
            }
        }

        if boundary == m.start {
            drop(p.maps.remove(idx));
            p.region
                .recompute_tail(p.maps.iter().map(|m| m.end_page()));
            return Ok(());
        }
        m.end = boundary;
        p.region.release_tail(1);
        end = boundary;
    }
    Ok(())
}

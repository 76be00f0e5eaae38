//! Per-process mapping table.

extern crate alloc;

use alloc::sync::Arc;
use bitflags::bitflags;
use static_assertions::const_assert;

use super::mmap::MapError;
use super::{page_round_up, window_page};
use crate::posix::{MAP_PRIVATE, MAP_SHARED, PROT_READ, PROT_WRITE};
use crate::vfs::File;

/// Maximum number of live mappings per process.
pub const MAX_MAPS: usize = 16;

bitflags! {
    /// Page protection requested for a mapping.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Prot: u32 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
    }
}

const_assert!(Prot::READ.bits() == PROT_READ);
const_assert!(Prot::WRITE.bits() == PROT_WRITE);

/// Visibility of stores made through a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Share {
    /// Stores reach the backing file when the range is unmapped.
    Shared,
    /// Stores stay private to the process.
    Private,
}

impl Share {
    pub fn from_raw(flags: u32) -> Option<Self> {
        match flags {
            MAP_SHARED => Some(Self::Shared),
            MAP_PRIVATE => Some(Self::Private),
            _ => None,
        }
    }
}

/// What a mapping is backed by.
pub enum MapBacking {
    /// A byte range of an open file. `offset` is the file position that
    /// corresponds to `Mapping::start` and advances as the head is trimmed.
    File { file: Arc<File>, offset: u64 },
    /// Pages with no backing object.
    Anonymous,
}

/// One live mapping: a contiguous byte range of the address space tied to
/// its backing. `start` is page-aligned at creation; `end` stays byte-exact
/// so a final partial page is never flushed past the mapped length.
pub struct Mapping {
    pub backing: MapBacking,
    pub prot: Prot,
    pub share: Share,
    pub start: usize,
    pub end: usize,
}

impl Mapping {
    /// Trim `delta` bytes off the low edge, keeping the file offset in step.
    pub fn trim_start(&mut self, delta: usize) {
        self.start += delta;
        if let MapBacking::File { offset, .. } = &mut self.backing {
            *offset += delta as u64;
        }
    }

    /// Window page just past this mapping's last byte.
    pub fn end_page(&self) -> usize {
        window_page(page_round_up(self.end))
    }
}

/// Fixed-size table of a process's live mappings.
pub struct MapTable {
    slots: [Option<Mapping>; MAX_MAPS],
}

impl MapTable {
    pub const fn new() -> Self {
        Self {
            slots: [const { None }; MAX_MAPS],
        }
    }

    /// Index of the first empty slot.
    pub fn alloc_slot(&self) -> Result<usize, MapError> {
        self.slots
            .iter()
            .position(|s| s.is_none())
            .ok_or(MapError::TooManyMaps)
    }

    pub fn install(&mut self, idx: usize, m: Mapping) {
        self.slots[idx] = Some(m);
    }

    pub fn get(&self, idx: usize) -> Option<&Mapping> {
        self.slots[idx].as_ref()
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Mapping> {
        self.slots[idx].as_mut()
    }

    /// Mark the slot empty, handing the mapping (and with it the file
    /// reference) back to the caller.
    pub fn remove(&mut self, idx: usize) -> Option<Mapping> {
        self.slots[idx].take()
    }

    pub fn find_by_start(&self, va: usize) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|m| m.start == va))
    }

    pub fn find_by_end(&self, va: usize) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|m| m.end == va))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mapping> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }
}

impl Default for MapTable {
    fn default() -> Self {
        Self::new()
    }
}

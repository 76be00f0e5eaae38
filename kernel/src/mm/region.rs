//! Ring allocator for the per-process mapping window.
//!
//! The window is a fixed run of `MMAP_PAGES` pages at `MMAP_BASE`. Space is
//! carved from `tail` forward; unmap gives space back only at the edges of a
//! mapping, so the `head`/`tail` bookkeeping never has to coalesce interior
//! holes. `full` disambiguates the two meanings of `head == tail`.

use super::mmap::MapError;
use super::MMAP_PAGES;

/// A successful reservation: the first page of the run, and whether the
/// allocator discarded the tail-to-end remainder to place the run at page 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub start_page: usize,
    pub wrapped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapRegion {
    head: usize,
    tail: usize,
    full: bool,
}

impl MapRegion {
    pub const fn new() -> Self {
        Self {
            head: 0,
            tail: 0,
            full: false,
        }
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn tail(&self) -> usize {
        self.tail
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail && !self.full
    }

    /// Reserve a contiguous run of `npages`.
    ///
    /// Placement prefers the run `[tail, MMAP_PAGES)`; when that is too short
    /// but a prefix `[0, head)` fits, the remainder at the end of the window
    /// is skipped and the reservation wraps to page 0.
    pub fn reserve(&mut self, npages: usize) -> Result<Reservation, MapError> {
        if self.full {
            return Err(MapError::NoSpace);
        }
        let (start_page, wrapped) = if self.head == self.tail {
            if npages <= MMAP_PAGES {
                (self.tail, false)
            } else {
                return Err(MapError::NoSpace);
            }
        } else if self.tail > self.head {
            if MMAP_PAGES - self.tail >= npages {
                (self.tail, false)
            } else if self.head >= npages {
                (0, true)
            } else {
                return Err(MapError::NoSpace);
            }
        } else if self.head - self.tail >= npages {
            (self.tail, false)
        } else {
            return Err(MapError::NoSpace);
        };
        self.tail = (start_page + npages) % MMAP_PAGES;
        if self.tail == self.head {
            self.full = true;
        }
        Ok(Reservation {
            start_page,
            wrapped,
        })
    }

    /// Give back `npages` at the low-address edge of the live run.
    pub fn release_head(&mut self, npages: usize) {
        self.head = (self.head + npages) % MMAP_PAGES;
        self.full = false;
    }

    /// Give back `npages` at the high-address edge of the newest reservation.
    pub fn release_tail(&mut self, npages: usize) {
        self.tail = (self.tail + MMAP_PAGES - npages % MMAP_PAGES) % MMAP_PAGES;
        self.full = false;
    }

    pub fn clear_full(&mut self) {
        self.full = false;
    }

    /// Point `tail` just past the highest-ending live mapping; with nothing
    /// left the window rewinds to page 0.
    pub fn recompute_tail(&mut self, end_pages: impl Iterator<Item = usize>) {
        self.tail = end_pages.max().unwrap_or(0) % MMAP_PAGES;
    }

    /// Bookkeeping for a fully drained head-edge unmap whose pages end at
    /// window page `next_page`. When another mapping begins right there the
    /// head lands on it; otherwise the drained run was the whole chain up to
    /// `tail` and the ring rewinds.
    pub fn drain_head(&mut self, next_page: usize, has_successor: bool) {
        if has_successor {
            self.head = next_page % MMAP_PAGES;
        } else {
            if self.tail == next_page % MMAP_PAGES {
                self.tail = 0;
            }
            self.head = 0;
        }
        self.full = false;
    }
}

impl Default for MapRegion {
    fn default() -> Self {
        Self::new()
    }
}

//! Process record: address space, descriptor table, and mapping state.

extern crate alloc;

use alloc::sync::Arc;

use crate::mm::vm::PageTable;
use crate::mm::{MapRegion, MapTable};
use crate::vfs::File;

/// Maximum number of open files per process.
pub const NOFILE: usize = 16;

/// Process ID type
pub type Pid = usize;

/// The slice of a process this subsystem touches. The mapping window state
/// lives inside the record and is mutated only under the process lock.
pub struct Process {
    pub pid: Pid,
    pub pagetable: PageTable,
    pub ofile: [Option<Arc<File>>; NOFILE],
    pub region: MapRegion,
    pub maps: MapTable,
}

impl Process {
    pub fn new(pid: Pid) -> Self {
        Self {
            pid,
            pagetable: PageTable::new(),
            ofile: [const { None }; NOFILE],
            region: MapRegion::new(),
            maps: MapTable::new(),
        }
    }

    /// Install a file in the first free descriptor slot.
    pub fn fd_install(&mut self, file: Arc<File>) -> Option<usize> {
        let fd = self.ofile.iter().position(|s| s.is_none())?;
        self.ofile[fd] = Some(file);
        Some(fd)
    }

    pub fn fd_get(&self, fd: usize) -> Option<&Arc<File>> {
        self.ofile.get(fd).and_then(|f| f.as_ref())
    }

    /// Drop the descriptor's file reference.
    pub fn fd_close(&mut self, fd: usize) -> Option<Arc<File>> {
        self.ofile.get_mut(fd).and_then(|f| f.take())
    }
}

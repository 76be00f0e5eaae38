//! File layer tests.

use super::{File, FsError, Inode};
use crate::mm::vm::{Frame, PageTable};
use crate::mm::PAGE_SIZE;

fn user_page(bytes: &[u8]) -> (PageTable, usize) {
    let mut pt = PageTable::new();
    let va = PAGE_SIZE;
    let mut frame = Frame::alloc();
    frame.as_mut_slice()[..bytes.len()].copy_from_slice(bytes);
    pt.map_page(va, frame).unwrap();
    (pt, va)
}

#[test]
fn inode_reads_stop_at_the_end() {
    let ino = Inode::from_bytes(b"hello");
    let mut buf = [0u8; 8];
    assert_eq!(ino.read_at(&mut buf, 0), 5);
    assert_eq!(&buf[..5], b"hello");
    assert_eq!(ino.read_at(&mut buf, 5), 0);
    assert_eq!(ino.read_at(&mut buf, 64), 0);
}

#[test]
fn inode_write_zero_extends() {
    let mut ino = Inode::new();
    assert_eq!(ino.write_at(b"ab", 4), 2);
    assert_eq!(ino.len(), 6);
    let mut buf = [0xffu8; 6];
    ino.read_at(&mut buf, 0);
    assert_eq!(&buf, b"\0\0\0\0ab");
}

#[test]
fn cursor_write_advances_positioned_write_does_not() {
    let (pt, va) = user_page(b"abcdefgh");
    let file = File::open(Inode::new(), true, true);
    assert_eq!(file.write(&pt, va, 4).unwrap(), 4);
    assert_eq!(file.offset(), 4);
    assert_eq!(file.write_at(&pt, va + 4, 4, 100).unwrap(), 4);
    assert_eq!(file.offset(), 4);
    let ino = file.inode.lock();
    assert_eq!(ino.len(), 104);
    let mut buf = [0u8; 4];
    ino.read_at(&mut buf, 100);
    assert_eq!(&buf, b"efgh");
}

#[test]
fn read_copies_into_user_memory() {
    let (mut pt, va) = user_page(&[0u8; 8]);
    let file = File::open(Inode::from_bytes(b"wxyz"), true, false);
    assert_eq!(file.read(&mut pt, va, 8).unwrap(), 4);
    assert_eq!(file.offset(), 4);
    let mut buf = [0u8; 4];
    pt.copyin(&mut buf, va).unwrap();
    assert_eq!(&buf, b"wxyz");
}

#[test]
fn transfers_through_unmapped_addresses_fail() {
    let pt = PageTable::new();
    let file = File::open(Inode::from_bytes(b"data"), true, true);
    assert_eq!(file.write(&pt, 0x7000, 4), Err(FsError::BadAddress));
}

#[test]
fn dup_shares_one_handle() {
    let file = File::open(Inode::new(), true, true);
    let d = file.dup();
    d.seek(9);
    assert_eq!(file.offset(), 9);
    assert_eq!(std::sync::Arc::strong_count(&file), 2);
}

//! Synchronization primitives.
//!
//! `Mutex` is the spin mutex used for short critical sections. `Sleeplock`
//! guards state held across blocking operations, such as the file write
//! during unmap write-back.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

pub use spin::Mutex;

/// A lock that may be held across blocking operations.
pub struct Sleeplock<T: ?Sized> {
    locked: AtomicBool,
    data: UnsafeCell<T>,
}

unsafe impl<T: ?Sized + Send> Sync for Sleeplock<T> {}
unsafe impl<T: ?Sized + Send> Send for Sleeplock<T> {}

impl<T> Sleeplock<T> {
    pub const fn new(data: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            data: UnsafeCell::new(data),
        }
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: ?Sized> Sleeplock<T> {
    /// Acquire the lock. Waiters park on the scheduler in a full kernel;
    /// the host model spins with a hint instead.
    pub fn lock(&self) -> SleeplockGuard<'_, T> {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            core::hint::spin_loop();
        }
        SleeplockGuard { lock: self }
    }

    pub fn try_lock(&self) -> Option<SleeplockGuard<'_, T>> {
        if self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(SleeplockGuard { lock: self })
        } else {
            None
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

pub struct SleeplockGuard<'a, T: ?Sized> {
    lock: &'a Sleeplock<T>,
}

impl<T: ?Sized> Deref for SleeplockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T: ?Sized> DerefMut for SleeplockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T: ?Sized> Drop for SleeplockGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}

//! The recursive reader-writer lock discipline (spec §5).
//!
//! A plain `parking_lot::RwLock` is not reentrant: a thread that calls
//! `write()` twice deadlocks against itself. REDESIGN FLAGS calls for
//! tracking the owning thread and a depth counter behind a simple mutex
//! instead of hand-rolling that into the lock itself, so that's what
//! [`RegistryLock`] does — a `parking_lot::RwLock<()>` provides the real
//! blocking/exclusion semantics, a `Mutex` + `ThreadId` + depth counter
//! recognizes when the calling thread already owns the writer side, and a
//! `Condvar` lets the common family's worker thread wait for the lock to
//! become free without busy-polling.

use std::cell::UnsafeCell;
use std::thread::ThreadId;

use parking_lot::{Condvar, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Which side of the lock to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Shared access.
    Read,
    /// Exclusive access.
    Write,
}

struct Owner {
    thread: ThreadId,
    depth: u32,
}

/// A reader-writer lock whose writer side can be acquired recursively by
/// the thread that already holds it (spec §5, P6).
pub struct RegistryLock<T> {
    rw: RwLock<()>,
    data: UnsafeCell<T>,
    owner: Mutex<Option<Owner>>,
    released: Condvar,
}

// SAFETY: access to `data` is only ever granted through a `LockGuard`,
// which either holds a real `parking_lot` guard or (in the reentrant
// case) relies on the calling thread already holding the writer side via
// an outer `LockGuard` further up its own call stack.
unsafe impl<T: Send> Sync for RegistryLock<T> {}

impl<T> RegistryLock<T> {
    pub fn new(value: T) -> Self {
        RegistryLock {
            rw: RwLock::new(()),
            data: UnsafeCell::new(value),
            owner: Mutex::new(None),
            released: Condvar::new(),
        }
    }

    /// Acquire the lock in `mode`, recursing transparently if this thread
    /// already holds the writer side.
    pub fn lock(&self, mode: LockMode) -> LockGuard<'_, T> {
        let tid = std::thread::current().id();
        {
            let mut owner = self.owner.lock();
            if let Some(o) = owner.as_mut() {
                if o.thread == tid {
                    o.depth += 1;
                    return LockGuard::Reentrant {
                        lock: self,
                        data: self.data.get(),
                    };
                }
            }
        }
        match mode {
            LockMode::Read => {
                let guard = self.rw.read();
                LockGuard::Read {
                    _guard: guard,
                    data: unsafe { &*self.data.get() },
                }
            }
            LockMode::Write => {
                let guard = self.rw.write();
                *self.owner.lock() = Some(Owner { thread: tid, depth: 1 });
                LockGuard::Write {
                    lock: self,
                    _guard: Some(guard),
                    data: self.data.get(),
                }
            }
        }
    }

    /// Release a reader guard and reacquire as writer (spec §5
    /// `lock_upgrade`). Not ABA-free: another writer may run in between,
    /// so callers must restart any pattern-scan state after upgrading.
    pub fn upgrade<'a>(&'a self, guard: LockGuard<'a, T>) -> LockGuard<'a, T> {
        drop(guard);
        self.lock(LockMode::Write)
    }

    /// Block until the writer lock is free of any holder (used by the
    /// worker thread to wait out a reload in progress).
    pub fn wait_until_released(&self) {
        let mut owner = self.owner.lock();
        while owner.is_some() {
            self.released.wait(&mut owner);
        }
    }
}

/// RAII guard returned by [`RegistryLock::lock`].
pub enum LockGuard<'a, T> {
    /// A genuine shared-lock hold.
    Read {
        _guard: RwLockReadGuard<'a, ()>,
        data: &'a T,
    },
    /// A genuine exclusive-lock hold (outermost acquisition).
    Write {
        lock: &'a RegistryLock<T>,
        _guard: Option<RwLockWriteGuard<'a, ()>>,
        data: *mut T,
    },
    /// A recursive call from the thread that already holds the writer
    /// lock further up its own call stack.
    Reentrant {
        lock: &'a RegistryLock<T>,
        data: *mut T,
    },
}

impl<T> std::ops::Deref for LockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self {
            LockGuard::Read { data, .. } => data,
            LockGuard::Write { data, .. } => unsafe { &**data },
            LockGuard::Reentrant { data, .. } => unsafe { &**data },
        }
    }
}

impl<T> std::ops::DerefMut for LockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match self {
            LockGuard::Read { .. } => panic!("cannot mutate through a reader lock"),
            LockGuard::Write { data, .. } => unsafe { &mut **data },
            LockGuard::Reentrant { data, .. } => unsafe { &mut **data },
        }
    }
}

impl<T> Drop for LockGuard<'_, T> {
    fn drop(&mut self) {
        match self {
            LockGuard::Write { lock, _guard, .. } => {
                let mut owner = lock.owner.lock();
                if let Some(o) = owner.as_mut() {
                    o.depth -= 1;
                    if o.depth == 0 {
                        *owner = None;
                        drop(owner);
                        // Drop the real writer guard last, after bookkeeping
                        // is cleared, so a woken waiter never observes a
                        // cleared owner while the rwlock is still held.
                        _guard.take();
                        lock.released.notify_all();
                    }
                }
            }
            LockGuard::Reentrant { lock, .. } => {
                let mut owner = lock.owner.lock();
                if let Some(o) = owner.as_mut() {
                    o.depth -= 1;
                }
            }
            LockGuard::Read { .. } => {}
        }
    }
}

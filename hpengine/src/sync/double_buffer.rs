/// DoubleBuffer: two copies of a state with READ and WRITE roles.
///
/// `update()` replays the pending commands into the WRITE copy and swaps
/// roles, but only when no reader holds the read lock; it never waits for
/// a reader. Both locks are reentrant so a thread that is reading may call
/// `update()` (which then refuses) or start a nested read.

use std::cell::Cell;
use std::ops::Deref;
use std::sync::Arc;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard, RwLockReadGuard};
use crate::error::{Error, Result};
use super::{Command, CommandFlush, Slot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Roles {
    read: usize,
    write: usize,
}

/// Two-slot buffer with refusing updates.
pub struct DoubleBuffer<T> {
    slots: [Slot<T>; 2],
    /// Guards role exchange; holds the current roles
    swap_lock: ReentrantMutex<Cell<Roles>>,
    /// Held for the lifetime of every read guard
    read_lock: ReentrantMutex<()>,
}

/// RAII read bracket. Dropping it ends the read.
pub struct DoubleReadGuard<'a, T> {
    // Field order matters: the state lock is released before the read lock.
    state: RwLockReadGuard<'a, T>,
    _read: ReentrantMutexGuard<'a, ()>,
}

impl<T> Deref for DoubleReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.state
    }
}

impl<T> DoubleBuffer<T> {
    /// Create from the initial READ and WRITE states (slot 0 and slot 1).
    pub fn new(read: T, write: T) -> Self {
        Self {
            slots: [Slot::new(read), Slot::new(write)],
            swap_lock: ReentrantMutex::new(Cell::new(Roles { read: 0, write: 1 })),
            read_lock: ReentrantMutex::new(()),
        }
    }

    /// Record a command for both copies.
    pub fn add_command<F>(&self, command: F)
    where
        F: Fn(&mut T) -> Result<()> + Send + Sync + 'static,
    {
        self.add_shared_command(Arc::new(command));
    }

    /// Record an already shared command for both copies.
    pub fn add_shared_command(&self, command: Command<T>) {
        for slot in &self.slots {
            slot.push(Arc::clone(&command));
        }
    }

    /// Replay pending commands into the WRITE copy and swap roles.
    ///
    /// Returns `false` without touching either copy while any reader
    /// (including the calling thread) holds a read guard.
    pub fn update(&self) -> bool {
        let roles = self.swap_lock.lock();
        if self.read_lock.is_locked() {
            crate::engine_trace!("hpengine::DoubleBuffer", "Update refused: read in progress");
            return false;
        }

        let flush: CommandFlush = self.slots[roles.get().write].flush();
        if !flush.is_clean() {
            crate::engine_warn!("hpengine::DoubleBuffer",
                "{} of {} commands failed during update", flush.failed, flush.total());
        }
        self.swap();
        true
    }

    /// Exchange READ and WRITE roles unconditionally.
    pub fn swap(&self) {
        let roles = self.swap_lock.lock();
        let current = roles.get();
        roles.set(Roles { read: current.write, write: current.read });
    }

    /// Begin a read of the READ copy.
    pub fn start_read(&self) -> DoubleReadGuard<'_, T> {
        let roles = self.swap_lock.lock();
        let read = self.read_lock.lock();
        let state = self.slots[roles.get().read].state.read_recursive();
        DoubleReadGuard { state, _read: read }
    }

    /// End a read. Equivalent to dropping the guard.
    pub fn stop_read(&self, guard: DoubleReadGuard<'_, T>) {
        drop(guard);
    }

    /// Whether some thread is currently reading.
    pub fn is_reading(&self) -> bool {
        self.read_lock.is_locked()
    }

    /// Slot index currently in the READ role.
    pub fn read_slot(&self) -> usize {
        self.swap_lock.lock().get().read
    }

    /// Slot index currently in the WRITE role.
    pub fn write_slot(&self) -> usize {
        self.swap_lock.lock().get().write
    }
}

impl<T: Default> Default for DoubleBuffer<T> {
    fn default() -> Self {
        Self::new(T::default(), T::default())
    }
}

impl<T> TryFrom<Vec<T>> for DoubleBuffer<T> {
    type Error = Error;

    /// Build from exactly two states: `[read, write]`.
    fn try_from(states: Vec<T>) -> Result<Self> {
        let count = states.len();
        let [read, write]: [T; 2] = states.try_into()
            .map_err(|_| crate::engine_err!("hpengine::DoubleBuffer",
                "DoubleBuffer needs exactly 2 states, got {}", count))?;
        Ok(Self::new(read, write))
    }
}

#[cfg(test)]
#[path = "double_buffer_tests.rs"]
mod tests;

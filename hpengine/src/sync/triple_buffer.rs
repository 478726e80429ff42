/// TripleBuffer: three copies of a state rotating through READ, WRITE and
/// STAGING roles.
///
/// The producer only ever touches the WRITE copy: `update()` replays pending
/// commands into it and exchanges WRITE with STAGING. The consumer only
/// ever touches the READ copy: when its outermost read guard drops, READ is
/// exchanged with STAGING unless `SwapPolicy::should_not_swap` refuses
/// (stale staging). A copy therefore never goes from READ to WRITE
/// directly, and neither side waits for the other beyond an index swap.
///
/// Lock order: swap lock (read side) → staging lock (role indices).

use std::cell::Cell;
use std::ops::Deref;
use std::sync::Arc;
use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard, RwLockReadGuard};
use crate::error::{Error, Result};
use super::{Command, CommandFlush, Slot};

/// Decides whether the reader may adopt the staging copy.
pub trait SwapPolicy {
    /// Return `true` to keep the current READ copy instead of `staging`.
    fn should_not_swap(_staging: &Self, _read: &Self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Roles {
    read: usize,
    write: usize,
    staging: usize,
}

/// Three-slot buffer with non-blocking producer and consumer.
pub struct TripleBuffer<T: SwapPolicy> {
    slots: [Slot<T>; 3],
    /// Read-side lock; holds the read nesting depth of the owning thread
    swap_lock: ReentrantMutex<Cell<usize>>,
    /// Guards role exchange; holds the current roles
    staging_lock: ReentrantMutex<Cell<Roles>>,
    /// Serializes producers
    update_lock: Mutex<()>,
}

/// RAII read bracket. Dropping the outermost guard rotates READ ↔ STAGING.
pub struct TripleReadGuard<'a, T: SwapPolicy> {
    buffer: &'a TripleBuffer<T>,
    state: Option<RwLockReadGuard<'a, T>>,
    depth: Option<ReentrantMutexGuard<'a, Cell<usize>>>,
}

impl<T: SwapPolicy> Deref for TripleReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.state {
            Some(state) => state,
            None => unreachable!("read state is only released on drop"),
        }
    }
}

impl<T: SwapPolicy> Drop for TripleReadGuard<'_, T> {
    fn drop(&mut self) {
        // Release the READ copy before it can change role.
        self.state.take();
        if let Some(depth) = self.depth.take() {
            let remaining = depth.get().saturating_sub(1);
            depth.set(remaining);
            if remaining == 0 {
                self.buffer.swap();
            }
        }
    }
}

impl<T: SwapPolicy> TripleBuffer<T> {
    /// Create from the initial READ, WRITE and STAGING states (slots 0, 1, 2).
    pub fn new(read: T, write: T, staging: T) -> Self {
        Self {
            slots: [Slot::new(read), Slot::new(write), Slot::new(staging)],
            swap_lock: ReentrantMutex::new(Cell::new(0)),
            staging_lock: ReentrantMutex::new(Cell::new(Roles { read: 0, write: 1, staging: 2 })),
            update_lock: Mutex::new(()),
        }
    }

    /// Record a command for all three copies.
    pub fn add_command<F>(&self, command: F)
    where
        F: Fn(&mut T) -> Result<()> + Send + Sync + 'static,
    {
        self.add_shared_command(Arc::new(command));
    }

    /// Record an already shared command for all three copies.
    pub fn add_shared_command(&self, command: Command<T>) {
        for slot in &self.slots {
            slot.push(Arc::clone(&command));
        }
    }

    /// Record a command for every copy that does not already have it
    /// pending.
    ///
    /// Meant for a command that reads its input at replay time (for example
    /// from a shared "latest value" cell): re-recording it each frame keeps
    /// at most one pending instance per copy, however long the reader stalls.
    pub fn add_coalesced_command(&self, command: &Command<T>) -> usize {
        self.slots.iter().filter(|slot| slot.push_unique(command)).count()
    }

    /// Replay pending commands into the WRITE copy, then exchange WRITE and
    /// STAGING. Never touches the READ copy.
    pub fn update(&self) -> CommandFlush {
        let _producer = self.update_lock.lock();
        let write = self.staging_lock.lock().get().write;

        let flush = self.slots[write].flush();
        if !flush.is_clean() {
            crate::engine_warn!("hpengine::TripleBuffer",
                "{} of {} commands failed during update", flush.failed, flush.total());
        }

        self.swap_staging();
        flush
    }

    /// Exchange WRITE and STAGING unconditionally.
    fn swap_staging(&self) {
        let roles = self.staging_lock.lock();
        let current = roles.get();
        roles.set(Roles { write: current.staging, staging: current.write, ..current });
    }

    /// Exchange READ and STAGING unless the policy refuses.
    fn swap(&self) -> bool {
        let _reader = self.swap_lock.lock();
        let roles = self.staging_lock.lock();
        let current = roles.get();

        let refused = {
            let staging = self.slots[current.staging].state.read_recursive();
            let read = self.slots[current.read].state.read_recursive();
            T::should_not_swap(&staging, &read)
        };
        if refused {
            crate::engine_trace!("hpengine::TripleBuffer", "Swap refused: staging is stale");
            return false;
        }

        roles.set(Roles { read: current.staging, staging: current.read, ..current });
        true
    }

    /// Begin a read of the READ copy.
    ///
    /// Blocks only while another thread is reading or a role exchange is
    /// in progress. Nested reads on the same thread share the READ copy;
    /// the rotation happens when the outermost guard drops.
    pub fn start_read(&self) -> TripleReadGuard<'_, T> {
        let depth = self.swap_lock.lock();
        depth.set(depth.get() + 1);
        let read = self.staging_lock.lock().get().read;
        let state = self.slots[read].state.read_recursive();
        TripleReadGuard {
            buffer: self,
            state: Some(state),
            depth: Some(depth),
        }
    }

    /// End a read. Equivalent to dropping the guard.
    pub fn stop_read(&self, guard: TripleReadGuard<'_, T>) {
        drop(guard);
    }

    /// Slot index currently in the READ role.
    pub fn read_slot(&self) -> usize {
        self.staging_lock.lock().get().read
    }

    /// Slot index currently in the WRITE role.
    pub fn write_slot(&self) -> usize {
        self.staging_lock.lock().get().write
    }

    /// Slot index currently in the STAGING role.
    pub fn staging_slot(&self) -> usize {
        self.staging_lock.lock().get().staging
    }

    /// Commands waiting in each slot's queue, indexed by slot.
    pub fn pending_commands(&self) -> [usize; 3] {
        [self.slots[0].pending(), self.slots[1].pending(), self.slots[2].pending()]
    }
}

impl<T: SwapPolicy + Default> Default for TripleBuffer<T> {
    fn default() -> Self {
        Self::new(T::default(), T::default(), T::default())
    }
}

impl<T: SwapPolicy> TryFrom<Vec<T>> for TripleBuffer<T> {
    type Error = Error;

    /// Build from exactly three states: `[read, write, staging]`.
    fn try_from(states: Vec<T>) -> Result<Self> {
        let count = states.len();
        let [read, write, staging]: [T; 3] = states.try_into()
            .map_err(|_| crate::engine_err!("hpengine::TripleBuffer",
                "TripleBuffer needs exactly 3 states, got {}", count))?;
        Ok(Self::new(read, write, staging))
    }
}

#[cfg(test)]
#[path = "triple_buffer_tests.rs"]
mod tests;

//! State handoff between the simulation and render threads
//!
//! A multi-buffer keeps several copies of a state, each with its own
//! command queue. Producers record a command once; it is queued for every
//! copy and replayed into a copy when that copy takes the WRITE role. Roles
//! rotate, copies never move.

mod command_queue;
mod double_buffer;
mod triple_buffer;

pub use command_queue::{Command, CommandFlush, CommandQueue};
pub use double_buffer::{DoubleBuffer, DoubleReadGuard};
pub use triple_buffer::{SwapPolicy, TripleBuffer, TripleReadGuard};

use std::sync::Arc;
use parking_lot::{Mutex, RwLock};

/// One buffered copy: the state and the commands it has not replayed yet.
pub(crate) struct Slot<T> {
    state: RwLock<T>,
    queue: Mutex<CommandQueue<T>>,
}

impl<T> Slot<T> {
    pub(crate) fn new(state: T) -> Self {
        Self {
            state: RwLock::new(state),
            queue: Mutex::new(CommandQueue::new()),
        }
    }

    pub(crate) fn push(&self, command: Command<T>) {
        self.queue.lock().push(command);
    }

    pub(crate) fn push_unique(&self, command: &Command<T>) -> bool {
        self.queue.lock().push_unique(Arc::clone(command))
    }

    pub(crate) fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Replay pending commands into the state.
    ///
    /// The queue is taken before the state is locked. Commands pushed
    /// meanwhile wait for the next flush.
    pub(crate) fn flush(&self) -> CommandFlush {
        let mut pending = std::mem::take(&mut *self.queue.lock());
        let mut state = self.state.write();
        pending.execute_all(&mut state)
    }
}

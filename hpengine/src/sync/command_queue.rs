/// Deferred mutation commands.
///
/// A command is a closure over `&mut T`. The same command is recorded into
/// every slot of a multi-buffer and each copy of the state replays the same
/// history, so commands are reference counted.

use std::sync::Arc;
use crate::error::Result;

/// A deferred mutation of a buffered state.
pub type Command<T> = Arc<dyn Fn(&mut T) -> Result<()> + Send + Sync>;

/// Outcome of draining a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandFlush {
    /// Commands that returned Ok
    pub executed: usize,
    /// Commands that returned an error (logged, execution continued)
    pub failed: usize,
}

impl CommandFlush {
    /// Total number of commands drained.
    pub fn total(&self) -> usize {
        self.executed + self.failed
    }

    /// No command failed.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// FIFO of deferred commands for one buffer slot.
pub struct CommandQueue<T> {
    commands: Vec<Command<T>>,
}

impl<T> CommandQueue<T> {
    /// Empty queue.
    pub fn new() -> Self {
        Self { commands: Vec::new() }
    }

    /// Append a command.
    pub fn push(&mut self, command: Command<T>) {
        self.commands.push(command);
    }

    /// Append a command unless this same command is already pending.
    ///
    /// Returns whether it was appended. A command queued earlier keeps its
    /// position.
    pub fn push_unique(&mut self, command: Command<T>) -> bool {
        if self.commands.iter().any(|pending| Arc::ptr_eq(pending, &command)) {
            return false;
        }
        self.commands.push(command);
        true
    }

    /// Number of pending commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Drop pending commands without running them.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Run every pending command in FIFO order, then clear the queue.
    ///
    /// A failing command is logged and counted; the remaining commands
    /// still run against the same state.
    pub fn execute_all(&mut self, state: &mut T) -> CommandFlush {
        let mut flush = CommandFlush::default();
        let total = self.commands.len();

        for (index, command) in self.commands.drain(..).enumerate() {
            match (*command)(state) {
                Ok(()) => flush.executed += 1,
                Err(e) => {
                    crate::engine_error!("hpengine::CommandQueue",
                        "Command {}/{} failed: {}", index + 1, total, e);
                    flush.failed += 1;
                }
            }
        }

        if flush.failed > 0 {
            crate::engine_warn!("hpengine::CommandQueue",
                "Flush finished with {} failed of {} commands", flush.failed, total);
        }
        flush
    }
}

impl<T> Default for CommandQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

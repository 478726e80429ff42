/// Drawing strategies.
///
/// A Drawer turns the published `RenderState` into backend work. It runs on
/// the render thread inside the read bracket, so the state it sees stays
/// fixed for the whole call. GPU submission lives behind this trait.

use crate::error::Result;
use super::render_state::RenderState;

/// Strategy for drawing one frame.
pub trait Drawer: Send {
    /// Draw every batch of `state`.
    fn draw(&mut self, state: &RenderState) -> Result<()>;
}

/// Reference drawer that records what it was handed instead of drawing.
///
/// Each instanced run (consecutive batches with the same material and
/// mesh) counts as one draw call. The per-frame cycle history is only kept
/// when created with `with_history()`.
#[derive(Debug, Default, Clone)]
pub struct StatsDrawer {
    frames: u64,
    last_cycle: Option<i64>,
    last_batches: usize,
    last_draw_calls: usize,
    last_lights: usize,
    total_batches: u64,
    history: Option<Vec<i64>>,
}

impl StatsDrawer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drawer that also records the cycle of every frame.
    pub fn with_history() -> Self {
        Self { history: Some(Vec::new()), ..Self::default() }
    }

    /// Frames drawn so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Cycle of the most recent frame.
    pub fn last_cycle(&self) -> Option<i64> {
        self.last_cycle
    }

    /// Batch count of the most recent frame.
    pub fn last_batches(&self) -> usize {
        self.last_batches
    }

    /// Instanced draw calls of the most recent frame.
    pub fn last_draw_calls(&self) -> usize {
        self.last_draw_calls
    }

    /// Light count of the most recent frame.
    pub fn last_lights(&self) -> usize {
        self.last_lights
    }

    /// Batches drawn across all frames.
    pub fn total_batches(&self) -> u64 {
        self.total_batches
    }

    /// Cycle of every frame drawn, in order. Empty without history.
    pub fn cycles(&self) -> &[i64] {
        self.history.as_deref().unwrap_or(&[])
    }
}

impl Drawer for StatsDrawer {
    fn draw(&mut self, state: &RenderState) -> Result<()> {
        self.frames += 1;
        self.last_cycle = Some(state.cycle);
        self.last_batches = state.batches.len();
        self.last_draw_calls = state.instanced_runs().len();
        self.last_lights = state.lights.count();
        self.total_batches += state.batches.len() as u64;
        if let Some(history) = &mut self.history {
            history.push(state.cycle);
        }
        Ok(())
    }
}

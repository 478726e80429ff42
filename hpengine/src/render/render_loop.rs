/// RenderLoop: render-thread side of the frame handoff.
///
/// Every frame is bracketed by a read of the triple buffer: the guard is
/// taken, the drawer runs against the READ copy, and dropping the guard lets
/// the buffer adopt the newest staged state for the next frame.

use std::sync::Arc;
use crate::error::Result;
use crate::sync::TripleBuffer;
use super::drawer::Drawer;
use super::render_state::RenderState;

/// What one `render_frame()` call drew.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Cycle of the state that was drawn
    pub cycle: i64,
    /// Batches submitted
    pub batches: usize,
    /// Instanced draw calls
    pub draw_calls: usize,
    /// Lights submitted
    pub lights: usize,
    /// The same cycle was already drawn by the previous frame
    pub repeated: bool,
}

/// Drives a `Drawer` from the render thread.
pub struct RenderLoop<D: Drawer> {
    buffer: Arc<TripleBuffer<RenderState>>,
    drawer: D,
    frames: u64,
    last_cycle: Option<i64>,
}

impl<D: Drawer> RenderLoop<D> {
    pub fn new(buffer: Arc<TripleBuffer<RenderState>>, drawer: D) -> Self {
        Self {
            buffer,
            drawer,
            frames: 0,
            last_cycle: None,
        }
    }

    /// Draw the current READ state.
    ///
    /// The read bracket is released even when the drawer fails.
    pub fn render_frame(&mut self) -> Result<FrameStats> {
        let state = self.buffer.start_read();

        let stats = FrameStats {
            cycle: state.cycle,
            batches: state.batches.len(),
            draw_calls: state.instanced_runs().len(),
            lights: state.lights.count(),
            repeated: self.last_cycle == Some(state.cycle),
        };

        if let Err(error) = self.drawer.draw(&state) {
            crate::engine_error!("hpengine::RenderLoop",
                "Drawer failed on cycle {}: {}", stats.cycle, error);
            return Err(error);
        }
        drop(state);

        self.frames += 1;
        self.last_cycle = Some(stats.cycle);
        crate::engine_trace!("hpengine::RenderLoop",
            "Frame {} drew cycle {} ({} batches, {} draw calls)",
            self.frames, stats.cycle, stats.batches, stats.draw_calls);
        Ok(stats)
    }

    /// Frames drawn successfully.
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Cycle of the last frame drawn.
    pub fn last_cycle(&self) -> Option<i64> {
        self.last_cycle
    }

    pub fn drawer(&self) -> &D {
        &self.drawer
    }

    pub fn drawer_mut(&mut self) -> &mut D {
        &mut self.drawer
    }

    /// Shared handle to the buffer this loop reads from.
    pub fn buffer(&self) -> &Arc<TripleBuffer<RenderState>> {
        &self.buffer
    }

    /// Stop the loop and hand back the drawer.
    pub fn into_drawer(self) -> D {
        self.drawer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::render::StatsDrawer;

    struct FailingDrawer;

    impl Drawer for FailingDrawer {
        fn draw(&mut self, _state: &RenderState) -> Result<()> {
            Err(Error::BackendError("device lost".to_string()))
        }
    }

    fn publish(buffer: &TripleBuffer<RenderState>, cycle: i64) {
        buffer.add_command(move |state: &mut RenderState| {
            state.cycle = cycle;
            Ok(())
        });
        buffer.update();
    }

    #[test]
    fn test_first_frame_draws_initial_state() {
        let buffer = Arc::new(TripleBuffer::<RenderState>::default());
        let mut render_loop = RenderLoop::new(buffer, StatsDrawer::new());

        let stats = render_loop.render_frame().unwrap();

        assert_eq!(stats.cycle, 0);
        assert!(!stats.repeated);
        assert_eq!(render_loop.frames_rendered(), 1);
        assert_eq!(render_loop.drawer().frames(), 1);
    }

    #[test]
    fn test_published_state_reaches_drawer() {
        let buffer = Arc::new(TripleBuffer::<RenderState>::default());
        let mut render_loop = RenderLoop::new(Arc::clone(&buffer), StatsDrawer::with_history());

        publish(&buffer, 1);
        render_loop.render_frame().unwrap();
        let stats = render_loop.render_frame().unwrap();

        assert_eq!(stats.cycle, 1);
        assert_eq!(render_loop.drawer().cycles(), &[0, 1]);
    }

    #[test]
    fn test_repeated_cycle_is_flagged() {
        let buffer = Arc::new(TripleBuffer::<RenderState>::default());
        let mut render_loop = RenderLoop::new(Arc::clone(&buffer), StatsDrawer::new());

        publish(&buffer, 1);
        render_loop.render_frame().unwrap();
        assert!(!render_loop.render_frame().unwrap().repeated);
        // Nothing new was published
        assert!(render_loop.render_frame().unwrap().repeated);
        assert_eq!(render_loop.last_cycle(), Some(1));
    }

    #[test]
    fn test_failing_drawer_releases_read() {
        let buffer = Arc::new(TripleBuffer::<RenderState>::default());
        let mut render_loop = RenderLoop::new(Arc::clone(&buffer), FailingDrawer);

        publish(&buffer, 1);
        assert!(matches!(render_loop.render_frame(), Err(Error::BackendError(_))));
        assert_eq!(render_loop.frames_rendered(), 0);

        // The bracket was closed: the staged state was adopted.
        assert_eq!(buffer.start_read().cycle, 1);
    }
}

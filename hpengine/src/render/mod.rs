//! Render-thread side: the published frame snapshot, drawing strategies and
//! the loop that brackets each frame with a triple-buffer read.

mod render_state;
mod drawer;
mod render_loop;

pub use render_state::{
    DrawBatch, LightState, PointLightState, RenderState, sort_batches,
};
pub use drawer::{Drawer, StatsDrawer};
pub use render_loop::{FrameStats, RenderLoop};

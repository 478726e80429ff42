//! Integration tests for the simulation → render handoff
//!
//! A simulation thread ticks and publishes through the triple buffer while
//! a render thread draws whatever is current. No GPU required.
//!
//! Run with: cargo test --test frame_handoff_integration_tests

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use hpengine::glam::Vec3;
use hpengine::hpengine::{EngineConfig, EngineContext, RenderLoop, Result, Simulation};
use hpengine::hpengine::render::{Drawer, RenderState};
use hpengine::hpengine::scene::{
    AABB, BehaviorParams, Entity, MaterialHandle, MeshHandle, Renderable, Transform,
};

// ============================================================================
// TEST DRAWER
// ============================================================================

/// Checks every frame it is handed is internally consistent.
#[derive(Default)]
struct ConsistencyDrawer {
    cycles: Vec<i64>,
    torn_frames: usize,
    batches_seen: usize,
}

impl Drawer for ConsistencyDrawer {
    fn draw(&mut self, state: &RenderState) -> Result<()> {
        self.cycles.push(state.cycle);
        self.batches_seen += state.batches.len();

        if state.instance_count() != state.batches.len() {
            self.torn_frames += 1;
            return Ok(());
        }

        // Every entity moves with the same velocity: one frame must show
        // them all at the same depth.
        let depth = state.batches.first().map(|b| b.transform.w_axis.z);
        let torn = state.batches.iter().enumerate().any(|(i, batch)| {
            Some(batch.transform.w_axis.z) != depth || state.instance(i) != Some(batch.transform)
        });
        if torn {
            self.torn_frames += 1;
        }
        Ok(())
    }
}

fn populated_simulation(context: &EngineContext, count: usize) -> Simulation {
    let mut sim = Simulation::new(context).unwrap();
    let params = BehaviorParams::new().with("velocity_z", -1.0);

    for i in 0..count {
        let at = Vec3::new(i as f32 - count as f32 * 0.5, 0.0, -50.0);
        let world = sim.world_mut();
        let key = world.spawn(Entity::new(format!("box{}", i), Transform::from_translation(at),
            AABB::from_center_size(Vec3::ZERO, 0.5)));
        world.set_renderable(key, Renderable::new(MeshHandle(i as u32 % 3), MaterialHandle(1)));
        context.attach_behavior(world, key, "linear_motion", &params).unwrap();
    }
    sim
}

// ============================================================================
// HANDOFF TESTS
// ============================================================================

#[test]
fn test_integration_render_never_sees_torn_or_older_frames() {
    const TICKS: i64 = 2_000;
    const ENTITIES: usize = 16;

    let context = EngineContext::new(EngineConfig::default()).unwrap();
    let mut sim = populated_simulation(&context, ENTITIES);
    let buffer = sim.render_buffer();
    let done = Arc::new(AtomicBool::new(false));

    let render = {
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut render_loop = RenderLoop::new(buffer, ConsistencyDrawer::default());
            loop {
                let stats = render_loop.render_frame().unwrap();
                if done.load(Ordering::Acquire) && stats.cycle == TICKS {
                    break;
                }
            }
            render_loop.into_drawer()
        })
    };

    for _ in 0..TICKS {
        sim.tick(0.01);
    }
    done.store(true, Ordering::Release);

    let drawer = render.join().unwrap();
    assert_eq!(drawer.torn_frames, 0);
    assert!(drawer.cycles.windows(2).all(|w| w[0] <= w[1]), "cycle regressed");
    assert_eq!(drawer.cycles.last(), Some(&TICKS));
    assert!(drawer.batches_seen > 0);
}

#[test]
fn test_integration_spawn_and_despawn_while_rendering() {
    const TICKS: i64 = 500;

    let context = EngineContext::new(EngineConfig::default()).unwrap();
    let mut sim = Simulation::new(&context).unwrap();
    let buffer = sim.render_buffer();
    let done = Arc::new(AtomicBool::new(false));

    let render = {
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut render_loop = RenderLoop::new(buffer, ConsistencyDrawer::default());
            while !done.load(Ordering::Acquire) {
                render_loop.render_frame().unwrap();
            }
            render_loop.render_frame().unwrap();
            render_loop.render_frame().unwrap()
        })
    };

    let mut live = Vec::new();
    for tick in 0..TICKS {
        let world = sim.world_mut();
        let key = world.spawn(Entity::new("spark", Transform::from_translation(Vec3::new(0.0, 0.0, -30.0)),
            AABB::from_center_size(Vec3::ZERO, 1.0)));
        world.set_renderable(key, Renderable::new(MeshHandle(0), MaterialHandle(0)));
        live.push(key);
        if tick % 3 == 0 {
            let oldest = live.remove(0);
            world.despawn(oldest);
        }
        sim.tick(0.01);
    }
    done.store(true, Ordering::Release);

    let last = render.join().unwrap();
    assert_eq!(last.cycle, TICKS);
    assert_eq!(last.batches, live.len());
    assert_eq!(sim.octree().entity_count(), live.len());
}

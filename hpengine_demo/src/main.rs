//! HPEngine demo
//!
//! Runs the simulation and the render loop on two threads for a few
//! seconds, then prints what each side did.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use glam::Vec3;
use hpengine::hpengine::{Engine, EngineConfig, EngineContext, RenderLoop, Result, Simulation};
use hpengine::hpengine::log::LogSeverity;
use hpengine::hpengine::render::StatsDrawer;
use hpengine::hpengine::scene::{
    AABB, BehaviorParams, DirectionalLight, Entity, MaterialHandle, MeshHandle, PointLight,
    Renderable, Transform,
};

const RUN_TIME: Duration = Duration::from_secs(3);
const TICK: Duration = Duration::from_millis(16);

fn build_scene(context: &EngineContext, sim: &mut Simulation) -> Result<()> {
    let world = sim.world_mut();
    world.set_directional_light(Some(DirectionalLight::default()));

    let spin = BehaviorParams::new().with("speed", 1.5);
    let bob = BehaviorParams::new().with("amplitude", 2.0).with("frequency", 0.5);

    for x in -10i32..10 {
        for z in 1..20 {
            let at = Vec3::new(x as f32 * 6.0, 0.0, -(z as f32) * 6.0);
            let key = world.spawn(Entity::new(
                format!("crate_{}_{}", x, z),
                Transform::from_translation(at),
                AABB::from_center_size(Vec3::ZERO, 2.0),
            ));
            let material = ((x + z) % 4).unsigned_abs();
            world.set_renderable(key, Renderable::new(MeshHandle(z as u32 % 3), MaterialHandle(material)));

            let behavior = if (x + z) % 2 == 0 { ("spin", &spin) } else { ("oscillate", &bob) };
            context.attach_behavior(world, key, behavior.0, behavior.1)?;
        }
    }

    for i in 0..8 {
        let at = Vec3::new(i as f32 * 15.0 - 60.0, 10.0, -40.0);
        let key = world.spawn(Entity::new(format!("lamp_{}", i), Transform::from_translation(at),
            AABB::from_center_size(Vec3::ZERO, 0.5)));
        world.set_point_light(key, PointLight { radius: 20.0, ..PointLight::default() });
    }

    // Something behind the camera, culled every frame
    let hidden = world.spawn(Entity::new("behind", Transform::from_translation(Vec3::new(0.0, 0.0, 50.0)),
        AABB::from_center_size(Vec3::ZERO, 2.0)));
    world.set_renderable(hidden, Renderable::new(MeshHandle(0), MaterialHandle(0)));

    Ok(())
}

fn main() -> Result<()> {
    Engine::set_min_severity(LogSeverity::Info);

    let context = EngineContext::new(EngineConfig::default())?;
    let mut sim = Simulation::new(&context)?;
    build_scene(&context, &mut sim)?;

    let running = Arc::new(AtomicBool::new(true));

    let render = {
        let buffer = sim.render_buffer();
        let running = Arc::clone(&running);
        thread::Builder::new()
            .name("render".to_string())
            .spawn(move || -> Result<(u64, StatsDrawer)> {
                let mut render_loop = RenderLoop::new(buffer, StatsDrawer::new());
                let mut repeated = 0u64;
                while running.load(Ordering::Acquire) {
                    if render_loop.render_frame()?.repeated {
                        repeated += 1;
                        thread::sleep(Duration::from_millis(1));
                    }
                }
                Ok((repeated, render_loop.into_drawer()))
            })
            .map_err(|e| hpengine::hpengine::Error::InitializationFailed(format!("render thread: {}", e)))?
    };

    let start = Instant::now();
    let mut last = None;
    while start.elapsed() < RUN_TIME {
        let tick_start = Instant::now();
        last = Some(sim.tick(TICK.as_secs_f32()));
        if let Some(rest) = TICK.checked_sub(tick_start.elapsed()) {
            thread::sleep(rest);
        }
    }
    running.store(false, Ordering::Release);

    let (repeated, drawer) = match render.join() {
        Ok(result) => result?,
        Err(_) => {
            return Err(hpengine::hpengine::Error::BackendError("render thread panicked".to_string()));
        }
    };

    if let Some(stats) = last {
        println!("simulation: {} ticks, last tick {} visible / {} lights, {} collapsed subtrees",
            stats.cycle, stats.visible, stats.lights, stats.collapsed);
    }
    println!("octree: {} entities, {} occupied nodes, depth {}",
        sim.octree().entity_count(),
        sim.octree().occupied_node_bounds().len(),
        sim.octree().current_deepness());
    println!("render: {} frames ({} repeated), last cycle {:?}, {} draw calls for {} batches",
        drawer.frames(), repeated, drawer.last_cycle(), drawer.last_draw_calls(), drawer.last_batches());

    Ok(())
}

//! Tower Stack headless demo
//!
//! Usage: `tower-stack [mode] [config.json]`
//!
//! Plays one autopiloted run in the chosen mode and logs the outcome. Set
//! `RUST_LOG=debug` to follow every placement.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    env_logger::init();
    demo::run(std::env::args().skip(1).collect())
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use anyhow::Context;

    use tower_stack::geometry::Geometry;
    use tower_stack::render::{RenderScene, Renderer};
    use tower_stack::sim::modes::spiral_drop::center_distance;
    use tower_stack::sim::{Motion, Stack};
    use tower_stack::{Engine, EngineConfig, GameMode, GamePhase, LoopControl, angular_distance};

    /// Simulated time cap for one demo run
    const MAX_FRAMES: u32 = 60 * 180;

    /// Renderer that only reports what it would draw
    #[derive(Default)]
    struct LogRenderer {
        frames: u64,
        last_count: usize,
    }

    impl Renderer for LogRenderer {
        fn submit(&mut self, scene: &RenderScene) -> anyhow::Result<()> {
            self.frames += 1;
            if scene.len() != self.last_count {
                let triangles: usize = scene
                    .iter()
                    .map(|(_, mesh)| match &mesh.geometry {
                        Geometry::Box { .. } => 12,
                        Geometry::Band(_) => mesh.geometry.mesh().len() / 3,
                    })
                    .sum();
                log::debug!(
                    "frame {}: {} meshes, {} triangles",
                    self.frames,
                    scene.len(),
                    triangles
                );
                self.last_count = scene.len();
            }
            Ok(())
        }
    }

    /// Decide whether the autopilot should place the active element now
    fn should_place(mode: GameMode, stack: &Stack) -> bool {
        if stack.len() == 1 {
            return true;
        }
        match mode {
            GameMode::Physics => match stack.rings.as_slice() {
                [.., previous, current] => angular_distance(current.angle, previous.angle) < 0.12,
                _ => false,
            },
            GameMode::Classic | GameMode::SwingArc | GameMode::SpiralDrop => {
                let [.., previous, current] = stack.pieces.as_slice() else {
                    return false;
                };
                match current.motion {
                    Motion::Slide { axis, .. } => {
                        (axis.get(current.position) - axis.get(previous.position)).abs() < 0.4
                    }
                    Motion::Swing { angle, .. } => {
                        let delta = angle - previous.motion.phase_angle();
                        delta.cos() > 0.97
                    }
                    Motion::Spiral { target_y, .. } => {
                        current.position.y <= target_y
                            || center_distance(current.position, previous.position) < 0.5
                    }
                    Motion::Still => true,
                }
            }
        }
    }

    pub fn run(args: Vec<String>) -> anyhow::Result<()> {
        let mode = match args.first() {
            Some(name) => GameMode::from_name(name)
                .with_context(|| format!("unknown mode '{}'", name))?,
            None => GameMode::Classic,
        };
        let config = match args.get(1) {
            Some(path) => EngineConfig::load(path),
            None => EngineConfig::default(),
        };

        log::info!("Tower Stack (native) starting in {} mode", mode.name());
        let dt = config.fixed_dt;
        let mut engine = Engine::new(config, Box::new(LogRenderer::default()));
        engine.select_mode(mode);
        engine.start_game();

        let mut frames = 0;
        while frames < MAX_FRAMES {
            if engine.frame(dt)? == LoopControl::Stopped {
                break;
            }
            frames += 1;

            match engine.phase() {
                GamePhase::Playing if engine.stack().has_active() => {
                    if should_place(engine.mode(), engine.stack()) {
                        engine.place_active_piece();
                    }
                }
                GamePhase::Over if engine.falling_count() == 0 => break,
                _ => {}
            }
        }

        let snapshot = engine.snapshot();
        log::info!(
            "Finished after {:.1}s: {}",
            frames as f32 * dt,
            serde_json::to_string(&snapshot)?
        );
        println!(
            "{} mode: score {}, height {}, phase {:?}",
            mode.name(),
            snapshot.score,
            snapshot.tower_height,
            snapshot.phase
        );

        engine.dispose();
        Ok(())
    }
}

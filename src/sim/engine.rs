//! Run-level state machine and fixed-step loop
//!
//! ready → playing → over. The engine owns the render scene, the physics world
//! and the stack; UI code drives it through the entry points and reads back a
//! [`HudSnapshot`].

use anyhow::Context;

use super::falling::mesh_transform;
use super::modes::{Opening, Placement};
use super::state::{GameMode, GamePhase, HudSnapshot, Stack};
use super::timer::{TimedEvent, TimerQueue};
use super::world::World;
use crate::config::EngineConfig;
use crate::consts::FIRST_PLACEMENT_SCORE;
use crate::render::{NullRenderer, RenderScene, Renderer};

/// Whether the host should keep calling [`Engine::frame`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stopped,
}

pub struct Engine {
    mode: GameMode,
    phase: GamePhase,
    score: u32,
    tower_height: u32,
    stack: Stack,
    world: World,
    timers: TimerQueue,
    /// Bumped on every reset; deferred spawns from older runs are dropped
    run: u64,
    accumulator: f32,
    renderer: Box<dyn Renderer>,
    disposed: bool,
}

impl Engine {
    pub fn new(config: EngineConfig, renderer: Box<dyn Renderer>) -> Self {
        log::info!("Tower engine created with seed {}", config.seed);
        Self {
            mode: GameMode::default(),
            phase: GamePhase::Ready,
            score: 0,
            tower_height: 0,
            stack: Stack::default(),
            world: World::new(config),
            timers: TimerQueue::new(),
            run: 0,
            accumulator: 0.0,
            renderer,
            disposed: false,
        }
    }

    /// Engine that renders nothing
    pub fn headless(config: EngineConfig) -> Self {
        Self::new(config, Box::new(NullRenderer::default()))
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn tower_height(&self) -> u32 {
        self.tower_height
    }

    pub fn snapshot(&self) -> HudSnapshot {
        HudSnapshot {
            score: self.score,
            tower_height: self.tower_height,
            phase: self.phase,
            mode: self.mode,
        }
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    pub fn scene(&self) -> &RenderScene {
        &self.world.scene
    }

    pub fn config(&self) -> &EngineConfig {
        &self.world.config
    }

    pub fn falling_count(&self) -> usize {
        self.world.falling.len()
    }

    /// Deferred events still waiting to fire
    pub fn pending_events(&self) -> usize {
        self.timers.len()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Begin a run; only valid from `Ready`
    pub fn start_game(&mut self) -> bool {
        if self.disposed || self.phase != GamePhase::Ready {
            return false;
        }
        self.reset_run();
        self.phase = GamePhase::Playing;

        match self.mode.strategy().begin_run(&mut self.stack, &mut self.world) {
            Opening::Spawned => {}
            Opening::Deferred { delay_ms } => self.schedule_spawn(delay_ms),
        }
        self.tower_height = self.stack.len() as u32;

        log::info!("Started {} run", self.mode.name());
        true
    }

    /// Resolve the active element; returns false when nothing was placed
    pub fn place_active_piece(&mut self) -> bool {
        if self.disposed || self.phase != GamePhase::Playing || !self.stack.has_active() {
            return false;
        }

        let placement = if self.stack.len() == 1 {
            self.stack.settle_active();
            Placement::Landed {
                points: FIRST_PLACEMENT_SCORE,
                debris: 0,
                topple: false,
            }
        } else {
            self.mode
                .strategy()
                .evaluate_placement(&mut self.stack, &mut self.world)
        };

        match placement {
            Placement::Ignored => false,
            Placement::Missed => {
                self.end_run("missed");
                true
            }
            Placement::Landed {
                points,
                debris,
                topple,
            } => {
                self.score = self.score.saturating_add(points);
                self.tower_height = self.stack.len() as u32;
                log::debug!(
                    "Placed level {} for {} points ({} fragments)",
                    self.tower_height,
                    points,
                    debris
                );
                if topple {
                    self.end_run("too small to continue");
                } else {
                    self.schedule_spawn(self.world.config.settle_delay_ms);
                }
                true
            }
        }
    }

    /// Clear everything and return to `Ready` from any phase
    pub fn restart_game(&mut self) {
        if self.disposed {
            return;
        }
        self.reset_run();
        self.phase = GamePhase::Ready;
        log::info!("Restarted {} mode", self.mode.name());
    }

    /// Switch rule sets; always clears the current run
    pub fn select_mode(&mut self, mode: GameMode) {
        if self.disposed {
            return;
        }
        self.reset_run();
        self.mode = mode;
        self.phase = GamePhase::Ready;
        log::info!("Selected {} mode", mode.name());
    }

    /// Single-button control: start, place or restart depending on phase
    pub fn primary_action(&mut self) {
        match self.phase {
            GamePhase::Ready => {
                self.start_game();
            }
            GamePhase::Playing => {
                self.place_active_piece();
            }
            GamePhase::Over => self.restart_game(),
        }
    }

    /// Advance by wall-clock `dt` in fixed ticks, then submit the scene
    pub fn frame(&mut self, dt: f32) -> anyhow::Result<LoopControl> {
        if self.disposed {
            return Ok(LoopControl::Stopped);
        }

        let fixed_dt = self.world.config.fixed_dt;
        // Non-finite frame times are dropped so the accumulator stays usable
        let dt = if dt.is_finite() { dt.clamp(0.0, 0.1) } else { 0.0 };
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= fixed_dt && substeps < self.world.config.max_substeps {
            self.tick()?;
            self.accumulator -= fixed_dt;
            substeps += 1;
        }

        self.renderer
            .submit(&self.world.scene)
            .context("renderer rejected frame")?;
        Ok(LoopControl::Continue)
    }

    /// One fixed step: physics, body sync, active element, timed events
    pub fn tick(&mut self) -> anyhow::Result<()> {
        if self.disposed {
            return Ok(());
        }
        let world = &mut self.world;
        world.physics.step();
        world
            .falling
            .sync_and_cull(&mut world.scene, &mut world.physics, world.config.cull_depth)?;
        self.sync_placed()?;

        if self.phase == GamePhase::Playing {
            let dt = self.world.config.fixed_dt;
            self.mode
                .strategy()
                .advance(&mut self.stack, &mut self.world, dt);
        }

        for event in self.timers.advance() {
            self.fire(event);
        }
        Ok(())
    }

    /// Stop the loop and release every resource; safe to call repeatedly
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.timers.cancel_all();
        self.stack.clear();
        self.world.release_all();
        log::info!("Tower engine disposed");
    }

    /// Copy physics poses onto placed elements that own a body
    fn sync_placed(&mut self) -> anyhow::Result<()> {
        let placed = self
            .stack
            .pieces
            .iter()
            .filter(|p| !p.is_moving)
            .map(|p| p.entity)
            .chain(
                self.stack
                    .rings
                    .iter()
                    .filter(|r| !r.is_moving)
                    .map(|r| r.entity),
            );

        for entity in placed {
            let Some(attachment) = entity.body else {
                continue;
            };
            let pose = self
                .world
                .physics
                .pose(attachment.body)
                .with_context(|| format!("placed element {:?} lost its body", entity.mesh))?;
            self.world
                .scene
                .set_transform(entity.mesh, mesh_transform(pose, attachment.offset));
        }
        Ok(())
    }

    fn schedule_spawn(&mut self, delay_ms: u32) {
        let ticks = self.world.config.ticks_for_ms(delay_ms);
        self.timers
            .schedule(ticks, TimedEvent::SpawnNext { run: self.run });
    }

    fn fire(&mut self, event: TimedEvent) {
        match event {
            TimedEvent::SpawnNext { run } => {
                if run != self.run || self.phase != GamePhase::Playing {
                    log::debug!("Dropping stale spawn for run {}", run);
                    return;
                }
                self.mode
                    .strategy()
                    .spawn_next(&mut self.stack, &mut self.world);
                self.tower_height = self.stack.len() as u32;
            }
        }
    }

    fn end_run(&mut self, reason: &str) {
        self.phase = GamePhase::Over;
        log::info!(
            "Run over ({}): score {}, height {}",
            reason,
            self.score,
            self.tower_height
        );
    }

    /// Full clear: stack, debris, pending events and counters
    fn reset_run(&mut self) {
        self.timers.cancel_all();
        self.run += 1;
        self.world.clear_run(&mut self.stack);
        self.score = 0;
        self.tower_height = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::PIECE_HEIGHT;
    use crate::geometry::Geometry;
    use crate::sim::state::Motion;
    use std::f32::consts::PI;

    fn engine(mode: GameMode) -> Engine {
        let mut engine = Engine::headless(EngineConfig::with_seed(42));
        engine.select_mode(mode);
        engine
    }

    /// Run ticks until the stack grows to `len`
    fn wait_for_spawn(engine: &mut Engine, len: usize) {
        for _ in 0..120 {
            if engine.stack.len() >= len && engine.stack.has_active() {
                return;
            }
            engine.tick().expect("tick succeeds");
        }
        panic!("no spawn after 120 ticks");
    }

    fn align_classic(engine: &mut Engine) {
        let n = engine.stack.pieces.len();
        let previous = engine.stack.pieces[n - 2].position;
        let piece = &mut engine.stack.pieces[n - 1];
        if let Motion::Slide { axis, .. } = piece.motion {
            axis.set(&mut piece.position, axis.get(previous));
        }
    }

    #[test]
    fn test_first_classic_placement_scores_ten() {
        let mut engine = engine(GameMode::Classic);
        assert!(engine.start_game());
        assert_eq!(engine.phase(), GamePhase::Playing);

        assert!(engine.place_active_piece());
        assert_eq!(engine.score(), 10);
        assert_eq!(engine.tower_height(), 1);
        assert_eq!(engine.phase(), GamePhase::Playing);
        assert_eq!(engine.pending_events(), 1);
    }

    #[test]
    fn test_next_piece_spawns_after_settle_delay() {
        let mut engine = engine(GameMode::Classic);
        engine.start_game();
        engine.place_active_piece();

        for _ in 0..11 {
            engine.tick().expect("tick succeeds");
        }
        assert_eq!(engine.stack.len(), 1);
        engine.tick().expect("tick succeeds");
        assert_eq!(engine.stack.len(), 2);
        assert_eq!(engine.tower_height(), 2);
    }

    #[test]
    fn test_exact_width_offset_ends_run() {
        let mut engine = engine(GameMode::Classic);
        engine.start_game();
        engine.place_active_piece();
        wait_for_spawn(&mut engine, 2);

        engine.stack.pieces[1].position.x = 10.0;
        assert!(engine.place_active_piece());
        assert_eq!(engine.phase(), GamePhase::Over);
        assert_eq!(engine.falling_count(), 1);
        assert_eq!(engine.score(), 10);
        assert_eq!(engine.stack.len(), 1);
    }

    #[test]
    fn test_perfect_classic_stacking_is_deterministic() {
        let mut engine = engine(GameMode::Classic);
        engine.start_game();
        engine.place_active_piece();
        for level in 2..=6 {
            wait_for_spawn(&mut engine, level);
            align_classic(&mut engine);
            assert!(engine.place_active_piece());
        }
        assert_eq!(engine.score(), 10 + 5 * 10);
        assert_eq!(engine.tower_height(), 6);
        assert_eq!(engine.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_aligned_ring_scores_fifteen() {
        let mut engine = engine(GameMode::Physics);
        engine.start_game();
        assert_eq!(engine.tower_height(), 1);
        assert!(!engine.place_active_piece());

        wait_for_spawn(&mut engine, 2);
        engine.stack.rings[1].angle = engine.stack.rings[0].angle;
        assert!(engine.place_active_piece());
        assert_eq!(engine.score(), 15);
        assert_eq!(engine.falling_count(), 0);
        assert_eq!(engine.tower_height(), 2);
    }

    #[test]
    fn test_ring_base_stays_put() {
        let mut engine = engine(GameMode::Physics);
        engine.start_game();
        let base = engine.stack.rings[0].entity.mesh;
        let before = engine.scene().get(base).expect("base mesh").transform.position;
        for _ in 0..60 {
            engine.tick().expect("tick succeeds");
        }
        let after = engine.scene().get(base).expect("base mesh").transform.position;
        assert!((before - after).length() < 1e-3);
    }

    #[test]
    fn test_spiral_zero_distance_keeps_footprint() {
        let mut engine = engine(GameMode::SpiralDrop);
        engine.start_game();
        engine.place_active_piece();
        wait_for_spawn(&mut engine, 2);

        let piece = &mut engine.stack.pieces[1];
        piece.position.x = 0.0;
        piece.position.z = 0.0;
        assert!(engine.place_active_piece());
        assert_eq!(engine.score(), 30);

        wait_for_spawn(&mut engine, 3);
        let next = &engine.stack.pieces[2];
        assert_eq!((next.width, next.depth), (10.0, 10.0));
    }

    #[test]
    fn test_swing_quarter_phase_misses() {
        let mut engine = engine(GameMode::SwingArc);
        engine.start_game();
        engine.place_active_piece();
        wait_for_spawn(&mut engine, 2);

        if let Motion::Swing { ref mut angle, .. } = engine.stack.pieces[1].motion {
            *angle = PI / 2.0;
        }
        engine.place_active_piece();
        assert_eq!(engine.phase(), GamePhase::Over);
        assert_eq!(engine.falling_count(), 1);
    }

    #[test]
    fn test_restart_from_every_phase() {
        let mut engine = engine(GameMode::Classic);

        engine.restart_game();
        assert_eq!(engine.snapshot().phase, GamePhase::Ready);

        engine.start_game();
        engine.place_active_piece();
        engine.restart_game();
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.tower_height(), 0);
        assert!(engine.stack.is_empty());

        engine.start_game();
        engine.place_active_piece();
        wait_for_spawn(&mut engine, 2);
        engine.stack.pieces[1].position.x = 20.0;
        engine.place_active_piece();
        assert_eq!(engine.phase(), GamePhase::Over);
        engine.restart_game();
        assert_eq!(engine.phase(), GamePhase::Ready);
        assert_eq!(engine.falling_count(), 0);
        assert!(engine.stack.is_empty());
        assert_eq!(engine.pending_events(), 0);
    }

    #[test]
    fn test_stale_spawn_is_dropped_after_restart() {
        let mut engine = engine(GameMode::Classic);
        engine.start_game();
        engine.place_active_piece();
        engine.restart_game();
        engine.start_game();

        for _ in 0..30 {
            engine.tick().expect("tick succeeds");
        }
        assert_eq!(engine.stack.len(), 1);
    }

    #[test]
    fn test_start_only_from_ready() {
        let mut engine = engine(GameMode::Classic);
        assert!(engine.start_game());
        assert!(!engine.start_game());
        assert_eq!(engine.stack.len(), 1);
    }

    #[test]
    fn test_mode_switch_clears_run() {
        let mut engine = engine(GameMode::Classic);
        engine.start_game();
        engine.place_active_piece();
        engine.select_mode(GameMode::Physics);
        assert_eq!(engine.mode(), GameMode::Physics);
        assert_eq!(engine.phase(), GamePhase::Ready);
        assert!(engine.stack.is_empty());
        assert_eq!(engine.score(), 0);
        // Only the ground is left
        assert_eq!(engine.scene().len(), 1);
    }

    #[test]
    fn test_primary_action_cycles_phases() {
        let mut engine = engine(GameMode::Classic);
        engine.primary_action();
        assert_eq!(engine.phase(), GamePhase::Playing);
        engine.primary_action();
        assert_eq!(engine.score(), 10);
        wait_for_spawn(&mut engine, 2);
        engine.stack.pieces[1].position.x = -15.0;
        engine.primary_action();
        assert_eq!(engine.phase(), GamePhase::Over);
        engine.primary_action();
        assert_eq!(engine.phase(), GamePhase::Ready);
    }

    #[test]
    fn test_frame_runs_fixed_ticks() {
        let mut engine = engine(GameMode::Classic);
        engine.start_game();
        engine.place_active_piece();

        let dt = engine.config().fixed_dt;
        for _ in 0..12 {
            assert_eq!(engine.frame(dt).expect("frame"), LoopControl::Continue);
        }
        assert_eq!(engine.stack.len(), 2);
    }

    #[test]
    fn test_non_finite_frame_does_not_stall_the_loop() {
        let mut engine = engine(GameMode::Classic);
        engine.start_game();
        engine.place_active_piece();

        engine.frame(f32::NAN).expect("frame");
        engine.frame(f32::INFINITY).expect("frame");
        let dt = engine.config().fixed_dt;
        for _ in 0..12 {
            engine.frame(dt).expect("frame");
        }
        assert!(engine.accumulator.is_finite());
        assert_eq!(engine.stack.len(), 2);
    }

    #[test]
    fn test_classic_miss_releases_exact_footprint() {
        let mut engine = engine(GameMode::Classic);
        engine.start_game();
        engine.place_active_piece();
        wait_for_spawn(&mut engine, 2);

        let missed = engine.stack.pieces[1].clone();
        engine.stack.pieces[1].position.x = 11.0;
        assert!(engine.place_active_piece());
        assert_eq!(engine.phase(), GamePhase::Over);

        let falling: Vec<_> = engine.world.falling.iter().collect();
        assert_eq!(falling.len(), 1);
        assert_eq!(falling[0].mesh, missed.entity.mesh);

        let mesh = engine.scene().get(missed.entity.mesh).expect("released mesh");
        match mesh.geometry {
            Geometry::Box { width, depth, .. } => {
                assert_eq!((width, depth), (missed.width, missed.depth));
            }
            _ => panic!("classic blocks are boxes"),
        }
        let size = engine
            .world
            .physics
            .collider_size(falling[0].body)
            .expect("falling body");
        assert!((size.x - missed.width).abs() < 1e-4);
        assert!((size.z - missed.depth).abs() < 1e-4);
        assert!((size.y - PIECE_HEIGHT).abs() < 1e-4);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut engine = engine(GameMode::Physics);
        engine.start_game();
        engine.dispose();
        engine.dispose();

        assert!(engine.is_disposed());
        assert!(engine.scene().is_empty());
        assert_eq!(engine.frame(0.016).expect("frame"), LoopControl::Stopped);
        assert!(!engine.start_game());
        assert!(!engine.place_active_piece());
        engine.restart_game();
        engine.select_mode(GameMode::Classic);
        assert_eq!(engine.mode(), GameMode::Physics);
    }

    struct FailingRenderer;

    impl Renderer for FailingRenderer {
        fn submit(&mut self, _scene: &RenderScene) -> anyhow::Result<()> {
            anyhow::bail!("surface lost")
        }
    }

    #[test]
    fn test_renderer_failure_propagates() {
        let mut engine = Engine::new(EngineConfig::default(), Box::new(FailingRenderer));
        let err = engine.frame(0.016).expect_err("renderer fails");
        assert!(format!("{:#}", err).contains("surface lost"));
    }
}

//! Headless application loop.
//!
//! Drives a [`World`] with the [`SimulationClock`] at a synthetic frame
//! rate, feeding it input from an [`InputSource`] and handing each rendered
//! frame to a [`Presenter`].

use anyhow::{Context, Result};
use ironclad_gameplay::{
    EffectSink, EntityKind, Frame, Impact, InputFrame, InputSource, Intent, Presenter, ScriptedInput, World,
};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::timing::SimulationClock;

/// Input script used when `run.autopilot` is set.
///
/// Drives forward continuously, fires twice a second and turns right
/// every three seconds of frames.
#[derive(Debug, Default, Clone)]
pub struct Autopilot {
    frame: u64,
}

impl InputSource for Autopilot {
    fn poll(&mut self) -> InputFrame {
        self.frame += 1;
        let mut pressed = Vec::new();
        if self.frame % 30 == 0 {
            pressed.push(Intent::Fire);
        }
        if self.frame % 180 == 0 {
            pressed.push(Intent::TurnRight);
        }
        InputFrame::new(&[Intent::MoveForward], &pressed)
    }
}

/// Presenter that logs a one-line summary every few frames.
#[derive(Debug, Default)]
pub struct LogPresenter {
    every: u64,
    frames: u64,
}

impl LogPresenter {
    /// Logs every `every` frames; zero disables logging.
    #[must_use]
    pub const fn new(every: u64) -> Self {
        Self { every, frames: 0 }
    }

    /// Frames presented so far.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }
}

impl Presenter for LogPresenter {
    fn present(&mut self, frame: &Frame) {
        self.frames += 1;
        if self.every > 0 && self.frames % self.every == 0 {
            info!(
                "frame {} tick {}: {} chunks, {} entities",
                self.frames,
                frame.tick,
                frame.chunks.len(),
                frame.entities.len()
            );
        }
    }
}

/// Effect sink that counts impacts and logs them at debug level.
#[derive(Debug, Default)]
pub struct ImpactCounter {
    count: u64,
}

impl EffectSink for ImpactCounter {
    fn impact(&mut self, impact: Impact) {
        self.count += 1;
        debug!("Impact at ({}, {}) magnitude {}", impact.x, impact.y, impact.magnitude);
    }
}

/// Outcome of a headless run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Frames rendered
    pub frames: u64,
    /// Simulation ticks run
    pub ticks: u64,
    /// Entities removed over the run
    pub removed: u64,
    /// Impacts reported
    pub impacts: u64,
    /// Whether the player survived
    pub player_alive: bool,
    /// Chunks baked over the run
    pub chunk_bakes: u64,
}

/// The headless application.
pub struct HeadlessApp {
    config: EngineConfig,
    world: World,
    clock: SimulationClock,
    input: Box<dyn InputSource>,
    presenter: Box<dyn Presenter>,
    effects: ImpactCounter,
}

impl HeadlessApp {
    /// Builds the world, seeds the starting enemies and mines and picks the
    /// input source from the config.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate().context("invalid configuration")?;
        let mut world = World::new(config.to_world_config()).context("failed to create world")?;
        let clock = SimulationClock::new(config.clock_settings()).context("failed to create clock")?;

        for _ in 0..config.run.enemies {
            world.spawn_near_player(EntityKind::EnemyTank);
        }
        for _ in 0..config.run.landmines {
            world.spawn_near_player(EntityKind::Landmine);
        }
        info!(
            "World seed {} ready with {} entities",
            config.world.seed,
            world.entities().len()
        );

        let input: Box<dyn InputSource> = if config.run.autopilot {
            Box::new(Autopilot::default())
        } else {
            Box::new(ScriptedInput::default())
        };
        let presenter = Box::new(LogPresenter::new(config.run.log_every));

        Ok(Self {
            config,
            world,
            clock,
            input,
            presenter,
            effects: ImpactCounter::default(),
        })
    }

    /// Replaces the input source.
    #[must_use]
    pub fn with_input(mut self, input: Box<dyn InputSource>) -> Self {
        self.input = input;
        self
    }

    /// Replaces the presenter.
    #[must_use]
    pub fn with_presenter(mut self, presenter: Box<dyn Presenter>) -> Self {
        self.presenter = presenter;
        self
    }

    /// Simulation being driven.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Runs until the requested ticks have run, the player dies or the frame cap
    /// is reached.
    pub fn run(&mut self) -> RunSummary {
        let mut summary = RunSummary::default();
        let frame_dt = self.config.run.frame_dt;
        let fixed_dt = self.clock.fixed_dt();

        while summary.ticks < self.config.run.ticks && summary.frames < self.config.run.max_frames {
            let input = self.input.poll();
            if input.active(Intent::Pause) {
                self.clock.toggle_pause();
            }

            let steps = self.clock.advance(frame_dt);
            for step in 0..steps {
                // Edge-triggered intents fire on the first step of a frame only.
                let step_input = if step == 0 { input } else { input.held_only() };
                let report = self.world.update(fixed_dt, &step_input, &mut self.effects);
                summary.ticks += 1;
                summary.removed += report.removed.len() as u64;
                if self.world.player().is_none() || summary.ticks >= self.config.run.ticks {
                    break;
                }
            }

            let frame = self.world.render();
            self.presenter.present(&frame);
            summary.frames += 1;

            if self.world.player().is_none() {
                info!("Player destroyed at tick {}", self.world.tick());
                break;
            }
        }

        summary.impacts = self.effects.count;
        summary.player_alive = self.world.player().is_some();
        summary.chunk_bakes = self.world.chunks().stats().bakes;
        info!(
            "Run finished: {} ticks, {} frames, {} removed, {} impacts, fps {:.1}",
            summary.ticks,
            summary.frames,
            summary.removed,
            summary.impacts,
            self.clock.fps()
        );
        summary
    }
}

/// Builds and runs the headless app from a config.
pub fn run(config: EngineConfig) -> Result<RunSummary> {
    let mut app = HeadlessApp::new(config)?;
    Ok(app.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironclad_gameplay::FrameRecorder;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct SharedRecorder(Rc<RefCell<FrameRecorder>>);

    impl Presenter for SharedRecorder {
        fn present(&mut self, frame: &Frame) {
            self.0.borrow_mut().present(frame);
        }
    }

    fn quick_config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.world.chunk_size_cells = 32;
        config.run.ticks = 30;
        config.run.enemies = 0;
        config.run.landmines = 0;
        config.run.log_every = 0;
        config
    }

    #[test]
    fn test_runs_requested_ticks() {
        let summary = run(quick_config()).expect("valid config");
        assert_eq!(summary.ticks, 30);
        assert_eq!(summary.frames, 30);
        assert!(summary.player_alive);
        assert!(summary.chunk_bakes >= 9);
    }

    #[test]
    fn test_starting_population() {
        let mut config = quick_config();
        config.run.enemies = 3;
        config.run.landmines = 2;
        let app = HeadlessApp::new(config).expect("valid");
        let count = |kind: EntityKind| app.world().entities().iter_by_kind(kind).count();
        assert_eq!(count(EntityKind::EnemyTank), 3);
        assert_eq!(count(EntityKind::Landmine), 2);
        assert_eq!(count(EntityKind::PlayerTank), 1);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let mut config = quick_config();
        config.simulation.tick_rate = 0.0;
        assert!(HeadlessApp::new(config).is_err());
    }

    #[test]
    fn test_pause_skips_updates_but_keeps_rendering() {
        let mut config = quick_config();
        config.run.ticks = 5;
        config.run.max_frames = 20;
        let pause = InputFrame::new(&[], &[Intent::Pause]);
        let input = ScriptedInput::new([pause]);

        let recorder = SharedRecorder::default();
        let mut app = HeadlessApp::new(config)
            .expect("valid")
            .with_input(Box::new(input))
            .with_presenter(Box::new(recorder.clone()));
        let summary = app.run();

        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.frames, 20);
        let recorder = recorder.0.borrow();
        assert!(recorder.frames().iter().all(|f| f.tick == 0));
    }

    #[test]
    fn test_autopilot_fires_and_moves() {
        let mut config = quick_config();
        config.run.ticks = 61;
        let mut app = HeadlessApp::new(config).expect("valid");
        let start = app.world().player().expect("alive").position();
        app.run();
        let player = app.world().player().expect("alive");
        assert!(player.position().y > start.y);
        assert!(app.world().entities().len() >= 2);
    }

    #[test]
    fn test_autopilot_script() {
        let mut pilot = Autopilot::default();
        let frames: Vec<_> = (0..180).map(|_| pilot.poll()).collect();
        assert!(frames.iter().all(|f| f.active(Intent::MoveForward)));
        assert_eq!(frames.iter().filter(|f| f.active(Intent::Fire)).count(), 6);
        assert_eq!(frames.iter().filter(|f| f.active(Intent::TurnRight)).count(), 1);
    }
}

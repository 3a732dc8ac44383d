//! Simulation clock.
//!
//! Turns variable frame deltas into a whole number of fixed simulation
//! steps, independent of how often frames are drawn.

use ironclad_common::ConfigError;
use std::collections::VecDeque;
use std::time::Instant;
use tracing::debug;

/// Frames averaged for the FPS readout.
const FPS_SAMPLES: usize = 120;

/// Clock tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockSettings {
    /// Fixed steps per simulated second
    pub tick_rate: f64,
    /// Cap on steps run for one frame
    pub max_steps_per_frame: u32,
    /// Cap on a single frame delta, in seconds
    pub max_frame_dt: f64,
    /// Simulation speed multiplier
    pub time_scale: f64,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_steps_per_frame: 10,
            max_frame_dt: 0.25,
            time_scale: 1.0,
        }
    }
}

impl ClockSettings {
    /// Rejects non-positive or non-finite values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_positive("tick_rate", self.tick_rate)?;
        ConfigError::require_nonzero("max_steps_per_frame", self.max_steps_per_frame)?;
        ConfigError::require_positive("max_frame_dt", self.max_frame_dt)?;
        ConfigError::require_positive("time_scale", self.time_scale)?;
        Ok(())
    }
}

/// Fixed-timestep clock with pause, time scale and a rolling FPS average.
#[derive(Debug)]
pub struct SimulationClock {
    /// Seconds per fixed step
    fixed_dt: f64,
    /// Maximum delta accepted per frame
    max_dt: f64,
    /// Maximum steps per frame
    max_steps: u32,
    /// Simulation speed multiplier
    time_scale: f64,
    /// Unsimulated time carried between frames
    accumulator: f64,
    /// Whether stepping is suspended
    paused: bool,
    /// Start of the previous real-time frame
    last_frame: Option<Instant>,
    /// Recent clamped frame deltas
    frame_times: VecDeque<f64>,
    /// Steps handed out so far
    total_steps: u64,
}

impl SimulationClock {
    /// Creates a clock from validated settings.
    pub fn new(settings: ClockSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            fixed_dt: 1.0 / settings.tick_rate,
            max_dt: settings.max_frame_dt,
            max_steps: settings.max_steps_per_frame,
            time_scale: settings.time_scale,
            accumulator: 0.0,
            paused: false,
            last_frame: None,
            frame_times: VecDeque::with_capacity(FPS_SAMPLES),
            total_steps: 0,
        })
    }

    /// Seconds of simulated time per step.
    #[must_use]
    pub const fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    /// Steps handed out since creation.
    #[must_use]
    pub const fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Fraction of a step left in the accumulator, for render interpolation.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.accumulator / self.fixed_dt
    }

    /// Current speed multiplier.
    #[must_use]
    pub const fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Changes the speed multiplier.
    pub fn set_time_scale(&mut self, scale: f64) -> Result<(), ConfigError> {
        self.time_scale = ConfigError::require_positive("time_scale", scale)?;
        Ok(())
    }

    /// Feeds one frame delta and returns how many fixed steps to run.
    ///
    /// The delta is clamped to the maximum frame delta and at most
    /// `max_steps_per_frame` steps are returned. If the accumulator is still
    /// more than two steps behind afterwards it is dropped. While paused no
    /// time accumulates and zero is returned.
    pub fn advance(&mut self, frame_dt: f64) -> u32 {
        let dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, self.max_dt)
        } else {
            0.0
        };

        self.frame_times.push_back(dt);
        if self.frame_times.len() > FPS_SAMPLES {
            self.frame_times.pop_front();
        }

        if self.paused {
            return 0;
        }

        self.accumulator += dt * self.time_scale;
        let mut steps = 0;
        while self.accumulator >= self.fixed_dt && steps < self.max_steps {
            self.accumulator -= self.fixed_dt;
            steps += 1;
        }

        if self.accumulator > self.fixed_dt * 2.0 {
            debug!("Simulation behind by {:.3}s, dropping backlog", self.accumulator);
            self.accumulator = 0.0;
        }

        self.total_steps += u64::from(steps);
        steps
    }

    /// Measures real time since the previous call and advances by it.
    ///
    /// The first call after creation or resume measures zero.
    pub fn tick_realtime(&mut self) -> u32 {
        let now = Instant::now();
        let dt = self
            .last_frame
            .map_or(0.0, |last| now.duration_since(last).as_secs_f64());
        self.last_frame = Some(now);
        self.advance(dt)
    }

    /// Returns whether stepping is suspended.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Suspends stepping. Rendering continues from the last committed tick.
    pub fn pause(&mut self) {
        if !self.paused {
            debug!("Simulation paused at step {}", self.total_steps);
        }
        self.paused = true;
    }

    /// Resumes stepping without replaying the paused interval.
    pub fn resume(&mut self) {
        if self.paused {
            debug!("Simulation resumed at step {}", self.total_steps);
        }
        self.paused = false;
        self.accumulator = 0.0;
        self.last_frame = None;
    }

    /// Flips between paused and running.
    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Frames per second averaged over recent frames.
    #[must_use]
    pub fn fps(&self) -> f64 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        let avg = self.frame_times.iter().sum::<f64>() / self.frame_times.len() as f64;
        if avg > 0.0 {
            1.0 / avg
        } else {
            0.0
        }
    }

    /// Clears accumulated time and FPS history.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.last_frame = None;
        self.frame_times.clear();
    }
}

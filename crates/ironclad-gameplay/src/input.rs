//! Player intents and the input-source seam.
//!
//! Movement reads level-triggered state (held this tick); turning, firing,
//! pausing and debug spawning read edge-triggered state (pressed this tick).

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A discrete player intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    /// Rotate a quarter turn counter-clockwise
    TurnLeft,
    /// Rotate a quarter turn clockwise
    TurnRight,
    /// Drive along the facing
    MoveForward,
    /// Reverse against the facing
    MoveBackward,
    /// Fire a projectile
    Fire,
    /// Toggle pause
    Pause,
    /// Spawn an enemy or landmine in the player's chunk
    SpawnNearby,
}

/// How an intent is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Fires once on key-down.
    Edge,
    /// Active while held.
    Level,
}

impl Intent {
    /// Every intent.
    pub const ALL: [Self; 7] = [
        Self::TurnLeft,
        Self::TurnRight,
        Self::MoveForward,
        Self::MoveBackward,
        Self::Fire,
        Self::Pause,
        Self::SpawnNearby,
    ];

    /// Trigger mode this intent is read with.
    #[must_use]
    pub const fn trigger(self) -> Trigger {
        match self {
            Self::MoveForward | Self::MoveBackward => Trigger::Level,
            _ => Trigger::Edge,
        }
    }

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Snapshot of input for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputFrame {
    held: u8,
    pressed: u8,
}

impl InputFrame {
    /// No input.
    pub const EMPTY: Self = Self { held: 0, pressed: 0 };

    /// Builds a frame from held and freshly pressed intents.
    #[must_use]
    pub fn new(held: &[Intent], pressed: &[Intent]) -> Self {
        let mut frame = Self::EMPTY;
        for intent in held {
            frame.held |= intent.bit();
        }
        for intent in pressed {
            frame.pressed |= intent.bit();
            frame.held |= intent.bit();
        }
        frame
    }

    /// Key is down this tick.
    #[must_use]
    pub const fn is_held(&self, intent: Intent) -> bool {
        self.held & intent.bit() != 0
    }

    /// Key went down this tick.
    #[must_use]
    pub const fn was_pressed(&self, intent: Intent) -> bool {
        self.pressed & intent.bit() != 0
    }

    /// Reads an intent with its own trigger mode.
    #[must_use]
    pub const fn active(&self, intent: Intent) -> bool {
        match intent.trigger() {
            Trigger::Edge => self.was_pressed(intent),
            Trigger::Level => self.is_held(intent),
        }
    }

    /// Same frame with edge state cleared, for extra fixed steps in one frame.
    #[must_use]
    pub const fn held_only(&self) -> Self {
        Self {
            held: self.held,
            pressed: 0,
        }
    }
}

/// Source of per-frame input.
pub trait InputSource {
    /// Input for the next frame.
    fn poll(&mut self) -> InputFrame;
}

/// Replays a fixed script, then reports no input.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: VecDeque<InputFrame>,
}

impl ScriptedInput {
    /// Creates a source from a list of frames.
    #[must_use]
    pub fn new(frames: impl IntoIterator<Item = InputFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Appends `count` copies of a frame.
    pub fn push_repeat(&mut self, frame: InputFrame, count: usize) {
        self.frames.extend(std::iter::repeat(frame).take(count));
    }

    /// Frames left to replay.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> InputFrame {
        self.frames.pop_front().unwrap_or(InputFrame::EMPTY)
    }
}

//! Outbound effect reporting.
//!
//! The simulation only tells the effect layer that something happened; it
//! never reads anything back.

use serde::{Deserialize, Serialize};

/// An explosion or impact at a world-space pixel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Impact {
    /// World x in pixels.
    pub x: i32,
    /// World y in pixels.
    pub y: i32,
    /// Visual magnitude (radius in pixels).
    pub magnitude: f64,
}

/// Receiver for impact notifications.
pub trait EffectSink {
    /// Called once per impact. Must not block.
    fn impact(&mut self, impact: Impact);
}

/// Discards every impact.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEffects;

impl EffectSink for NullEffects {
    fn impact(&mut self, _impact: Impact) {}
}

/// Records impacts in arrival order.
#[derive(Debug, Default, Clone)]
pub struct ImpactLog {
    impacts: Vec<Impact>,
}

impl ImpactLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded impacts.
    #[must_use]
    pub fn impacts(&self) -> &[Impact] {
        &self.impacts
    }

    /// Removes and returns everything recorded so far.
    pub fn drain(&mut self) -> Vec<Impact> {
        std::mem::take(&mut self.impacts)
    }
}

impl EffectSink for ImpactLog {
    fn impact(&mut self, impact: Impact) {
        self.impacts.push(impact);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_records_in_order() {
        let mut log = ImpactLog::new();
        log.impact(Impact { x: 1, y: 2, magnitude: 25.0 });
        log.impact(Impact { x: 3, y: 4, magnitude: 50.0 });
        assert_eq!(log.impacts().len(), 2);
        assert_eq!(log.impacts()[1].x, 3);

        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert!(log.impacts().is_empty());
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Motion system that flies crows toward the defended boundary.
//!
//! The world never integrates positions itself. This system reacts to
//! [`Event::TimeAdvanced`] by reporting a new horizontal position for every
//! flying crow, which the world feeds to its boundary check.

use std::time::Duration;

use crow_defence_core::{Command, CrowView, Event, WavePhase};

/// Pure system that reacts to world events and emits position reports.
#[derive(Debug)]
pub struct Movement {
    speed: f32,
}

impl Movement {
    /// Creates a movement system flying crows at `speed` units per second.
    #[must_use]
    pub const fn new(speed: f32) -> Self {
        Self { speed }
    }

    /// Consumes world events and the crow view to emit movement commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        wave_phase: WavePhase,
        crow_view: &CrowView,
        out: &mut Vec<Command>,
    ) {
        if wave_phase == WavePhase::GameOver {
            return;
        }

        let elapsed = events
            .iter()
            .filter_map(|event| match event {
                Event::TimeAdvanced { dt } => Some(*dt),
                _ => None,
            })
            .fold(Duration::ZERO, Duration::saturating_add);
        if elapsed.is_zero() {
            return;
        }

        let distance = self.speed * elapsed.as_secs_f32();
        for crow in crow_view.flying() {
            out.push(Command::UpdateCrowPosition {
                crow: crow.id,
                x: crow.x - distance,
            });
        }
    }
}

impl Default for Movement {
    fn default() -> Self {
        Self::new(180.0)
    }
}

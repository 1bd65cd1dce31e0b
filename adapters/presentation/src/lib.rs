#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Presentation seam for Crow Defence.
//!
//! Sprites, parallax, particles and audio all live behind [`Presentation`].
//! The core never waits on a hook; every call is fire-and-forget. The
//! [`Session`] type wires the world and its systems together and forwards the
//! resulting event stream to a presentation implementation.

mod session;

pub use self::session::Session;

use crow_defence_core::{
    CrowId, Event, Problem, RemovalCause, SessionSummary, WaveBonus, WaveNumber, WaveStartError,
};

/// Receiver of the events the core emits for display.
///
/// Every hook defaults to a no-op so adapters only implement what they draw.
pub trait Presentation {
    /// A crow entered the arena at `(x, lane)`.
    fn on_enemy_spawned(&mut self, crow: CrowId, problem: Problem, x: f32, lane: f32) {
        let _ = (crow, problem, x, lane);
    }

    /// A submitted answer struck `crow`.
    fn on_enemy_hit(&mut self, crow: CrowId) {
        let _ = crow;
    }

    /// The hit animation of `crow` finished and it started to fall.
    fn on_enemy_falling(&mut self, crow: CrowId) {
        let _ = crow;
    }

    /// `crow` left the registry.
    fn on_enemy_removed(&mut self, crow: CrowId, cause: RemovalCause) {
        let _ = (crow, cause);
    }

    /// A new wave began.
    fn on_wave_started(&mut self, wave: WaveNumber, quota: u32) {
        let _ = (wave, quota);
    }

    /// A wave was cleared. The adapter must eventually send
    /// `Command::AcknowledgeCompletion` once its bonus display is finished.
    fn on_wave_completed(
        &mut self,
        wave: WaveNumber,
        bonus: WaveBonus,
        total_score: u64,
        perfect_streak: u32,
    ) {
        let _ = (wave, bonus, total_score, perfect_streak);
    }

    /// A request to start a wave was refused.
    fn on_wave_start_rejected(&mut self, reason: WaveStartError) {
        let _ = reason;
    }

    /// A crow breached the boundary.
    fn on_game_over(&mut self, summary: SessionSummary) {
        let _ = summary;
    }

    /// The pending answer changed.
    fn on_input_changed(&mut self, text: &str) {
        let _ = text;
    }

    /// An input mutation succeeded; adapters usually play a key click.
    fn on_feedback(&mut self) {}

    /// A submit was evaluated.
    fn on_answer_submitted(&mut self, value: Option<u32>, matched: u32) {
        let _ = (value, matched);
    }

    /// The session was rebuilt after a restart.
    fn on_session_restarted(&mut self) {}
}

/// Forwards every presentation-relevant event to the matching hook.
///
/// Scheduling events (`TimeAdvanced`, `SpawnDue`) are internal and skipped.
pub fn dispatch<P>(events: &[Event], presentation: &mut P)
where
    P: Presentation + ?Sized,
{
    for event in events {
        match event {
            Event::TimeAdvanced { .. } | Event::SpawnDue { .. } => {}
            Event::CrowSpawned {
                crow,
                problem,
                x,
                lane,
            } => presentation.on_enemy_spawned(*crow, *problem, *x, *lane),
            Event::CrowHit { crow } => presentation.on_enemy_hit(*crow),
            Event::CrowFalling { crow } => presentation.on_enemy_falling(*crow),
            Event::CrowRemoved { crow, cause } => presentation.on_enemy_removed(*crow, *cause),
            Event::WaveStarted { wave, quota } => presentation.on_wave_started(*wave, *quota),
            Event::WaveCompleted {
                wave,
                bonus,
                total_score,
                perfect_streak,
            } => presentation.on_wave_completed(*wave, *bonus, *total_score, *perfect_streak),
            Event::WaveStartRejected { reason } => presentation.on_wave_start_rejected(*reason),
            Event::InputChanged { text } => presentation.on_input_changed(text),
            Event::InputFeedback => presentation.on_feedback(),
            Event::AnswerSubmitted { value, matched } => {
                presentation.on_answer_submitted(*value, *matched)
            }
            Event::GameOver { summary } => presentation.on_game_over(*summary),
            Event::SessionRestarted => presentation.on_session_restarted(),
        }
    }
}

/// Presentation that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct Headless;

impl Presentation for Headless {}

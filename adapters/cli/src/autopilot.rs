//! Scripted player that drives a session from the command line.

use std::time::Duration;

use crow_defence_core::{
    CrowId, CrowView, Digit, Problem, RemovalCause, SessionSummary, WaveBonus, WaveNumber,
    WavePhase, WaveStartError,
};
use crow_defence_presentation::{Presentation, Session};
use crow_defence_world::query;
use tracing::{debug, info, warn};

use crate::settings::{AutopilotSettings, Settings};

/// Answer that no problem can have, since operands start at one.
const WRONG_ANSWER: u32 = 0;

/// Presentation that narrates the session through `tracing` and keeps the
/// tallies the driver loop needs.
#[derive(Debug, Default)]
pub(crate) struct Console {
    waves_cleared: u32,
    game_over: Option<SessionSummary>,
}

impl Presentation for Console {
    fn on_enemy_spawned(&mut self, crow: CrowId, problem: Problem, x: f32, lane: f32) {
        debug!(crow = crow.get(), %problem, x, lane, "crow spawned");
    }

    fn on_enemy_hit(&mut self, crow: CrowId) {
        debug!(crow = crow.get(), "crow hit");
    }

    fn on_enemy_removed(&mut self, crow: CrowId, cause: RemovalCause) {
        match cause {
            RemovalCause::Defeated => debug!(crow = crow.get(), "crow defeated"),
            RemovalCause::Breached => warn!(crow = crow.get(), "crow breached the boundary"),
        }
    }

    fn on_wave_completed(
        &mut self,
        wave: WaveNumber,
        bonus: WaveBonus,
        total_score: u64,
        perfect_streak: u32,
    ) {
        self.waves_cleared += 1;
        println!(
            "wave {wave} cleared: +{} (time {}, perfect {}, wave {}), score {total_score}, streak {perfect_streak}",
            bonus.total(),
            bonus.time,
            bonus.perfect,
            bonus.wave,
        );
    }

    fn on_wave_start_rejected(&mut self, reason: WaveStartError) {
        debug!(%reason, "wave start rejected");
    }

    fn on_game_over(&mut self, summary: SessionSummary) {
        self.game_over = Some(summary);
    }

    fn on_answer_submitted(&mut self, value: Option<u32>, matched: u32) {
        debug!(?value, matched, "answer submitted");
    }
}

/// Chooses what to type each step.
#[derive(Debug)]
pub(crate) struct Autopilot {
    answers: bool,
    miss_every: u32,
    reach: f32,
    submits: u32,
}

impl Autopilot {
    /// Creates an autopilot that only targets crows at or left of `reach`.
    pub(crate) fn new(settings: &AutopilotSettings, reach: f32) -> Self {
        Self {
            answers: !settings.no_answer,
            miss_every: settings.miss_every,
            reach,
            submits: 0,
        }
    }

    /// Returns the value to submit this step, if any.
    ///
    /// Targets the flying crow closest to the boundary. Every `miss_every`th
    /// submit is replaced with a value that matches nothing.
    pub(crate) fn choose(&mut self, view: &CrowView) -> Option<u32> {
        if !self.answers {
            return None;
        }
        let target = view
            .flying()
            .filter(|crow| crow.x <= self.reach)
            .min_by(|a, b| a.x.total_cmp(&b.x))?;

        self.submits += 1;
        if self.miss_every > 0 && self.submits % self.miss_every == 0 {
            Some(WRONG_ANSWER)
        } else {
            Some(target.problem.answer())
        }
    }
}

/// How a run ended.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Outcome {
    pub(crate) waves_cleared: u32,
    pub(crate) game_over: bool,
    pub(crate) elapsed: Duration,
    pub(crate) summary: SessionSummary,
}

/// Plays until the requested number of waves is cleared or a crow breaks through.
pub(crate) fn run(settings: &Settings, seed: u64) -> Outcome {
    let mut session = Session::new(settings.session.clone(), seed);
    let mut console = Console::default();
    let mut pilot = Autopilot::new(&settings.autopilot, settings.session.arena_width);
    let step = Duration::from_millis(settings.autopilot.tick_ms);
    let target = settings.autopilot.waves;

    info!(seed, waves = target, "autopilot engaged");
    session.start_next_wave(&mut console);

    while console.game_over.is_none() && console.waves_cleared < target {
        session.tick(step, &mut console);

        if let Some(value) = pilot.choose(&query::crow_view(session.world())) {
            for digit in value.to_string().chars().filter_map(Digit::from_char) {
                session.press_digit(digit, &mut console);
            }
            session.submit(&mut console);
        }

        if query::wave_phase(session.world()) == WavePhase::Completing
            && console.waves_cleared < target
        {
            session.acknowledge_completion(&mut console);
            session.start_next_wave(&mut console);
        }
    }

    Outcome {
        waves_cleared: console.waves_cleared,
        game_over: console.game_over.is_some(),
        elapsed: query::clock(session.world()),
        summary: query::summary(session.world()),
    }
}

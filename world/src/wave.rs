//! Wave lifecycle and scoring state.

use std::time::Duration;

use crow_defence_core::{perfect_bonus, time_bonus, WaveBonus, WaveNumber, WavePhase};

use crate::scheduler::SpawnTimer;

/// Running totals shown to the player.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ScoreBoard {
    pub(crate) total_score: u64,
    pub(crate) perfect_streak: u32,
    /// Incremented when a crow spawns, mirroring the cabinet's on-screen tally.
    pub(crate) enemies_defeated: u32,
    /// Incremented when a crow finishes its defeat sequence.
    pub(crate) confirmed_defeats: u32,
}

/// State of the current wave and the handle of its spawn timer.
#[derive(Debug)]
pub(crate) struct WaveSession {
    phase: WavePhase,
    number: WaveNumber,
    quota: u32,
    remaining_to_spawn: u32,
    /// Spawns announced by the timer that have not been fulfilled yet.
    outstanding_spawns: u32,
    missed_submissions: u32,
    started_at: Duration,
    spawn_timer: Option<SpawnTimer>,
    scoreboard: ScoreBoard,
}

impl WaveSession {
    pub(crate) fn new() -> Self {
        Self {
            phase: WavePhase::Idle,
            number: WaveNumber::default(),
            quota: 0,
            remaining_to_spawn: 0,
            outstanding_spawns: 0,
            missed_submissions: 0,
            started_at: Duration::ZERO,
            spawn_timer: None,
            scoreboard: ScoreBoard::default(),
        }
    }

    pub(crate) fn phase(&self) -> WavePhase {
        self.phase
    }

    pub(crate) fn number(&self) -> WaveNumber {
        self.number
    }

    pub(crate) fn quota(&self) -> u32 {
        self.quota
    }

    pub(crate) fn remaining_to_spawn(&self) -> u32 {
        self.remaining_to_spawn
    }

    pub(crate) fn missed_submissions(&self) -> u32 {
        self.missed_submissions
    }

    pub(crate) fn scoreboard(&self) -> &ScoreBoard {
        &self.scoreboard
    }

    pub(crate) fn is_spawning(&self) -> bool {
        self.phase == WavePhase::Spawning
    }

    pub(crate) fn timer_armed(&self) -> bool {
        self.spawn_timer.is_some()
    }

    /// Starts the next wave at `now`, replacing any previous spawn timer.
    pub(crate) fn begin(&mut self, now: Duration, spawn_interval: Duration) {
        self.cancel_timer();
        self.number = self.number.next();
        self.quota = self.number.quota();
        self.remaining_to_spawn = self.quota;
        self.outstanding_spawns = 0;
        self.missed_submissions = 0;
        self.started_at = now;
        self.phase = WavePhase::Spawning;
        self.spawn_timer = Some(SpawnTimer::new(spawn_interval));
    }

    pub(crate) fn cancel_timer(&mut self) {
        self.spawn_timer = None;
    }

    /// Advances the spawn timer and returns how many spawns it announces.
    ///
    /// Announcements never exceed the quota still unclaimed by earlier ones.
    pub(crate) fn advance_timer(&mut self, dt: Duration) -> TimerOutcome {
        let Some(timer) = self.spawn_timer.as_mut() else {
            return TimerOutcome::Idle;
        };

        let fires = timer.advance(dt);
        if fires == 0 {
            return TimerOutcome::Idle;
        }

        if !self.is_spawning() || self.remaining_to_spawn == 0 {
            self.cancel_timer();
            return TimerOutcome::FiredWhileInactive;
        }

        let unclaimed = self
            .remaining_to_spawn
            .saturating_sub(self.outstanding_spawns);
        let announced = fires.min(unclaimed);
        self.outstanding_spawns += announced;
        TimerOutcome::SpawnsDue(announced)
    }

    /// Accounts for a crow that entered the arena.
    pub(crate) fn record_spawn(&mut self) {
        self.remaining_to_spawn = self.remaining_to_spawn.saturating_sub(1);
        self.outstanding_spawns = self.outstanding_spawns.saturating_sub(1);
        self.scoreboard.enemies_defeated = self.scoreboard.enemies_defeated.saturating_add(1);
        if self.remaining_to_spawn == 0 {
            self.cancel_timer();
        }
    }

    pub(crate) fn record_miss(&mut self) {
        if self.is_spawning() {
            self.missed_submissions = self.missed_submissions.saturating_add(1);
        }
    }

    pub(crate) fn record_defeat(&mut self) {
        self.scoreboard.confirmed_defeats = self.scoreboard.confirmed_defeats.saturating_add(1);
    }

    /// Closes the wave if nothing is left to spawn or fight.
    ///
    /// Only the `Spawning -> Completing` transition awards bonuses, so repeated
    /// calls after completion are no-ops.
    pub(crate) fn try_complete(&mut self, now: Duration, live_crows: usize) -> Option<WaveBonus> {
        if !self.is_spawning() || live_crows > 0 || self.remaining_to_spawn > 0 {
            return None;
        }

        self.cancel_timer();
        self.phase = WavePhase::Completing;

        let elapsed = now.saturating_sub(self.started_at);
        let perfect = if self.missed_submissions == 0 {
            self.scoreboard.perfect_streak = self.scoreboard.perfect_streak.saturating_add(1);
            perfect_bonus(self.scoreboard.perfect_streak)
        } else {
            self.scoreboard.perfect_streak = 0;
            0
        };
        let bonus = WaveBonus {
            time: time_bonus(elapsed),
            perfect,
            wave: self.number.bonus(),
        };
        self.scoreboard.total_score = self.scoreboard.total_score.saturating_add(bonus.total());
        Some(bonus)
    }

    /// Returns to `Idle` once the presentation acknowledged completion.
    pub(crate) fn acknowledge(&mut self) -> bool {
        if self.phase != WavePhase::Completing {
            return false;
        }
        self.phase = WavePhase::Idle;
        true
    }

    /// Drops the unspawned quota while leaving the spawn timer armed.
    #[cfg(test)]
    pub(crate) fn exhaust_quota(&mut self) {
        self.remaining_to_spawn = 0;
    }

    /// Enters the terminal phase. Returns `false` if it was already entered.
    pub(crate) fn end(&mut self) -> bool {
        if self.phase == WavePhase::GameOver {
            return false;
        }
        self.cancel_timer();
        self.phase = WavePhase::GameOver;
        true
    }
}

/// Result of advancing the spawn timer for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TimerOutcome {
    /// No period elapsed, or no timer is armed.
    Idle,
    /// The timer fired outside an active wave and cancelled itself.
    FiredWhileInactive,
    /// This many spawns should be produced.
    SpawnsDue(u32),
}

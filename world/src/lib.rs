#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state management for Crow Defence.
//!
//! The world owns every crow, the pending answer, the wave session with its
//! spawn timer, and the queue of deferred defeat-sequence tasks. All mutation
//! flows through [`apply`]; adapters and systems observe the outcome through
//! the emitted [`Event`] stream and the read-only [`query`] module.

mod crows;
mod input;
mod scheduler;
mod wave;

use std::time::Duration;

use crow_defence_core::{
    Anomaly, Command, CrowId, CrowPhase, Event, Problem, RemovalCause, SessionConfig,
    SessionSummary, WavePhase, WaveStartError, WELCOME_BANNER,
};
use tracing::{debug, info};

use self::{
    crows::CrowRegistry,
    input::InputBuffer,
    scheduler::{Scheduler, TaskKind},
    wave::{TimerOutcome, WaveSession},
};

/// Represents the authoritative Crow Defence session state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: SessionConfig,
    clock: Duration,
    crows: CrowRegistry,
    input: InputBuffer,
    wave: WaveSession,
    scheduler: Scheduler,
}

impl World {
    /// Creates a new session using the default cabinet tuning.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    /// Creates a new session using the provided tuning.
    #[must_use]
    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            banner: WELCOME_BANNER,
            input: InputBuffer::new(config.input_capacity),
            config,
            clock: Duration::ZERO,
            crows: CrowRegistry::new(),
            wave: WaveSession::new(),
            scheduler: Scheduler::default(),
        }
    }

    fn is_over(&self) -> bool {
        self.wave.phase() == WavePhase::GameOver
    }

    fn start_next_wave(&mut self, out_events: &mut Vec<Event>) {
        let rejection = match self.wave.phase() {
            WavePhase::Idle => None,
            WavePhase::Spawning => Some(WaveStartError::WaveInProgress),
            WavePhase::Completing => Some(WaveStartError::AwaitingAcknowledgement),
            WavePhase::GameOver => Some(WaveStartError::SessionOver),
        };
        if let Some(reason) = rejection {
            debug!(%reason, "wave start rejected");
            out_events.push(Event::WaveStartRejected { reason });
            return;
        }

        self.wave.begin(self.clock, self.config.spawn_interval());
        info!(
            wave = self.wave.number().get(),
            quota = self.wave.quota(),
            "wave started"
        );
        out_events.push(Event::WaveStarted {
            wave: self.wave.number(),
            quota: self.wave.quota(),
        });
    }

    fn advance_clock(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.clock = self.clock.saturating_add(dt);
        if self.is_over() {
            return;
        }
        out_events.push(Event::TimeAdvanced { dt });

        match self.wave.advance_timer(dt) {
            TimerOutcome::Idle => {}
            TimerOutcome::FiredWhileInactive => {
                debug!(anomaly = %Anomaly::SpawnWhileInactive, "spawn timer cancelled");
                self.evaluate_completion(self.clock, out_events);
            }
            TimerOutcome::SpawnsDue(count) => {
                for _ in 0..count {
                    out_events.push(Event::SpawnDue {
                        wave: self.wave.number(),
                    });
                }
            }
        }

        self.run_due_tasks(out_events);
    }

    fn run_due_tasks(&mut self, out_events: &mut Vec<Event>) {
        while let Some(task) = self.scheduler.pop_due(self.clock) {
            match task.kind {
                TaskKind::HitAnimationEnded => self.begin_fall(task.crow, task.due, out_events),
                TaskKind::FallCheck => self.check_fall(task.crow, task.due, out_events),
            }
        }
    }

    fn begin_fall(&mut self, crow_id: CrowId, now: Duration, out_events: &mut Vec<Event>) {
        let Some(crow) = self.crows.get_mut(crow_id) else {
            return;
        };
        if !crow.transition(CrowPhase::Falling) {
            return;
        }
        crow.falling_since = Some(now);
        out_events.push(Event::CrowFalling { crow: crow_id });
        self.scheduler.schedule(
            now.saturating_add(self.config.fall_check_interval()),
            crow_id,
            TaskKind::FallCheck,
        );
    }

    fn check_fall(&mut self, crow_id: CrowId, now: Duration, out_events: &mut Vec<Event>) {
        let fall_speed = self.config.fall_speed;
        let Some(crow) = self.crows.get_mut(crow_id) else {
            return;
        };
        if crow.phase() != CrowPhase::Falling {
            return;
        }

        let since = crow.falling_since.unwrap_or(now);
        crow.drop = fall_speed * now.saturating_sub(since).as_secs_f32();
        if crow.drop <= self.config.fall_distance(crow.lane) {
            self.scheduler.schedule(
                now.saturating_add(self.config.fall_check_interval()),
                crow_id,
                TaskKind::FallCheck,
            );
            return;
        }

        if crow.transition(CrowPhase::Removed) {
            let _ = self.crows.remove(crow_id);
            self.wave.record_defeat();
            out_events.push(Event::CrowRemoved {
                crow: crow_id,
                cause: RemovalCause::Defeated,
            });
            self.evaluate_completion(now, out_events);
        }
    }

    /// Closes the wave if it is finished, timing the bonus at `at`.
    fn evaluate_completion(&mut self, at: Duration, out_events: &mut Vec<Event>) {
        let Some(bonus) = self.wave.try_complete(at, self.crows.live_count()) else {
            return;
        };

        let scoreboard = self.wave.scoreboard();
        info!(
            wave = self.wave.number().get(),
            time_bonus = bonus.time,
            perfect_bonus = bonus.perfect,
            wave_bonus = bonus.wave,
            total_score = scoreboard.total_score,
            "wave completed"
        );
        out_events.push(Event::WaveCompleted {
            wave: self.wave.number(),
            bonus,
            total_score: scoreboard.total_score,
            perfect_streak: scoreboard.perfect_streak,
        });
    }

    fn spawn_crow(&mut self, problem: Problem, lane: f32, out_events: &mut Vec<Event>) {
        if !self.wave.is_spawning() || self.wave.remaining_to_spawn() == 0 {
            debug!(anomaly = %Anomaly::SpawnWhileInactive, "spawn request dropped");
            self.wave.cancel_timer();
            self.evaluate_completion(self.clock, out_events);
            return;
        }

        let x = self.config.spawn_x();
        let crow = self.crows.insert(problem, x, lane);
        self.wave.record_spawn();
        out_events.push(Event::CrowSpawned {
            crow,
            problem,
            x,
            lane,
        });
    }

    fn submit(&mut self, out_events: &mut Vec<Event>) {
        let parsed = self.input.parse();
        self.input.clear();
        out_events.push(Event::InputChanged {
            text: String::new(),
        });

        let value = match parsed {
            Ok(value) => value,
            Err(anomaly) => {
                debug!(%anomaly, "submit matched nothing");
                self.wave.record_miss();
                out_events.push(Event::AnswerSubmitted {
                    value: None,
                    matched: 0,
                });
                return;
            }
        };

        let hit_done = self.clock.saturating_add(self.config.hit_animation());
        let mut matched = 0;
        let struck: Vec<CrowId> = self
            .crows
            .iter()
            .filter(|crow| crow.phase() == CrowPhase::Flying && crow.problem().answer() == value)
            .map(|crow| crow.id)
            .collect();
        for crow_id in struck {
            let Some(crow) = self.crows.get_mut(crow_id) else {
                continue;
            };
            if crow.transition(CrowPhase::Hit) {
                matched += 1;
                out_events.push(Event::CrowHit { crow: crow_id });
                self.scheduler
                    .schedule(hit_done, crow_id, TaskKind::HitAnimationEnded);
            }
        }

        if matched == 0 {
            self.wave.record_miss();
        }
        out_events.push(Event::AnswerSubmitted {
            value: Some(value),
            matched,
        });
    }

    fn update_position(&mut self, crow_id: CrowId, x: f32, out_events: &mut Vec<Event>) {
        if let Some(crow) = self.crows.get_mut(crow_id) {
            if crow.phase() == CrowPhase::Flying {
                crow.x = x;
            }
        }
        self.scan_boundary(out_events);
    }

    /// Ends the session when any flying crow sits at or past the boundary.
    fn scan_boundary(&mut self, out_events: &mut Vec<Event>) {
        let boundary = self.config.boundary_x;
        let breached: Vec<CrowId> = self
            .crows
            .iter()
            .filter(|crow| crow.phase() == CrowPhase::Flying && crow.x <= boundary)
            .map(|crow| crow.id)
            .collect();

        for crow_id in breached {
            let _ = self.crows.remove(crow_id);
            out_events.push(Event::CrowRemoved {
                crow: crow_id,
                cause: RemovalCause::Breached,
            });
            self.trigger_game_over(out_events);
        }
    }

    fn trigger_game_over(&mut self, out_events: &mut Vec<Event>) {
        if !self.wave.end() {
            debug!(anomaly = %Anomaly::DuplicateGameOver, "game over already latched");
            return;
        }

        self.scheduler.clear();
        let summary = self.summary();
        info!(
            final_score = summary.final_score,
            enemies_defeated = summary.enemies_defeated,
            confirmed_defeats = summary.confirmed_defeats,
            "game over"
        );
        out_events.push(Event::GameOver { summary });
    }

    fn summary(&self) -> SessionSummary {
        let scoreboard = self.wave.scoreboard();
        SessionSummary {
            final_score: scoreboard.total_score,
            enemies_defeated: scoreboard.enemies_defeated,
            confirmed_defeats: scoreboard.confirmed_defeats,
            wave: self.wave.number(),
        }
    }

    fn emit_input(&self, out_events: &mut Vec<Event>) {
        out_events.push(Event::InputChanged {
            text: self.input.text().to_owned(),
        });
        out_events.push(Event::InputFeedback);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    if world.is_over() {
        match command {
            Command::Restart | Command::Tick { .. } | Command::StartNextWave => {}
            Command::UpdateCrowPosition { .. } => {
                debug!(anomaly = %Anomaly::DuplicateGameOver, "position ignored after game over");
                return;
            }
            other => {
                debug!(command = ?other, "command ignored after game over");
                return;
            }
        }
    }

    match command {
        Command::StartNextWave => world.start_next_wave(out_events),
        Command::AcknowledgeCompletion => {
            if !world.wave.acknowledge() {
                debug!(phase = ?world.wave.phase(), "acknowledgement ignored");
            }
        }
        Command::PressDigit { digit } => {
            if world.input.append(digit) {
                world.emit_input(out_events);
            }
        }
        Command::PressDelete => {
            if world.input.delete_last() {
                world.emit_input(out_events);
            }
        }
        Command::ClearInput => {
            world.input.clear();
            world.emit_input(out_events);
        }
        Command::Submit => world.submit(out_events),
        Command::Tick { dt } => world.advance_clock(dt, out_events),
        Command::SpawnCrow { problem, lane } => world.spawn_crow(problem, lane, out_events),
        Command::UpdateCrowPosition { crow, x } => world.update_position(crow, x, out_events),
        Command::Restart => {
            *world = World::with_config(world.config.clone());
            info!("session restarted");
            out_events.push(Event::SessionRestarted);
            out_events.push(Event::InputChanged {
                text: String::new(),
            });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use crow_defence_core::{
        CrowId, CrowSnapshot, CrowView, SessionConfig, SessionSummary, WaveNumber, WavePhase,
    };

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the session tuning.
    #[must_use]
    pub fn config(world: &World) -> &SessionConfig {
        &world.config
    }

    /// Session time accumulated from ticks.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Current phase of the wave state machine.
    #[must_use]
    pub fn wave_phase(world: &World) -> WavePhase {
        world.wave.phase()
    }

    /// Number of the current (or most recent) wave.
    #[must_use]
    pub fn wave_number(world: &World) -> WaveNumber {
        world.wave.number()
    }

    /// Spawn quota of the current wave.
    #[must_use]
    pub fn quota(world: &World) -> u32 {
        world.wave.quota()
    }

    /// Crows the current wave has yet to spawn.
    #[must_use]
    pub fn remaining_to_spawn(world: &World) -> u32 {
        world.wave.remaining_to_spawn()
    }

    /// Submits in the current wave that struck no crow.
    #[must_use]
    pub fn missed_submissions(world: &World) -> u32 {
        world.wave.missed_submissions()
    }

    /// Reports whether the spawn timer handle is currently held.
    #[must_use]
    pub fn spawn_timer_armed(world: &World) -> bool {
        world.wave.timer_armed()
    }

    /// Number of deferred defeat-sequence tasks waiting to run.
    #[must_use]
    pub fn pending_tasks(world: &World) -> usize {
        world.scheduler.len()
    }

    /// Total score accumulated so far.
    #[must_use]
    pub fn total_score(world: &World) -> u64 {
        world.wave.scoreboard().total_score
    }

    /// Consecutive completed waves without a missed submit.
    #[must_use]
    pub fn perfect_streak(world: &World) -> u32 {
        world.wave.scoreboard().perfect_streak
    }

    /// Snapshot of the scoreboard in summary form.
    #[must_use]
    pub fn summary(world: &World) -> SessionSummary {
        world.summary()
    }

    /// Text of the pending answer.
    #[must_use]
    pub fn input_text(world: &World) -> &str {
        world.input.text()
    }

    /// Captures a snapshot of a single crow, if it is still registered.
    #[must_use]
    pub fn crow(world: &World, id: CrowId) -> Option<CrowSnapshot> {
        world.crows.get(id).map(|crow| crow.snapshot())
    }

    /// Captures a read-only view of the crows in the registry.
    #[must_use]
    pub fn crow_view(world: &World) -> CrowView {
        CrowView::from_snapshots(world.crows.iter().map(|crow| crow.snapshot()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crow_defence_core::Digit;

    fn spawn(world: &mut World, problem: Problem) -> CrowId {
        let mut events = Vec::new();
        apply(
            world,
            Command::SpawnCrow {
                problem,
                lane: 400.0,
            },
            &mut events,
        );
        events
            .iter()
            .find_map(|event| match event {
                Event::CrowSpawned { crow, .. } => Some(*crow),
                _ => None,
            })
            .expect("crow spawned")
    }

    #[test]
    fn new_world_is_idle() {
        let world = World::new();
        assert_eq!(query::wave_phase(&world), WavePhase::Idle);
        assert_eq!(query::wave_number(&world).get(), 0);
        assert!(query::crow_view(&world).is_empty());
        assert_eq!(query::welcome_banner(&world), WELCOME_BANNER);
    }

    #[test]
    fn spawn_outside_wave_is_dropped() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnCrow {
                problem: Problem::new(2, 2),
                lane: 300.0,
            },
            &mut events,
        );
        assert!(events.is_empty());
        assert!(query::crow_view(&world).is_empty());
    }

    #[test]
    fn spawned_crow_starts_beyond_right_edge() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::StartNextWave, &mut events);
        let crow = spawn(&mut world, Problem::new(3, 4));

        let snapshot = query::crow(&world, crow).expect("registered");
        assert_eq!(snapshot.phase, CrowPhase::Flying);
        assert_eq!(snapshot.x, query::config(&world).spawn_x());
        assert_eq!(query::remaining_to_spawn(&world), 2);
        assert_eq!(query::summary(&world).enemies_defeated, 1);
    }

    #[test]
    fn digit_beyond_capacity_emits_nothing() {
        let config = SessionConfig {
            input_capacity: 2,
            ..SessionConfig::default()
        };
        let mut world = World::with_config(config);
        let mut events = Vec::new();
        let five = Digit::new(5).expect("digit");
        for _ in 0..3 {
            apply(&mut world, Command::PressDigit { digit: five }, &mut events);
        }
        assert_eq!(query::input_text(&world), "55");
        let changes = events
            .iter()
            .filter(|event| matches!(event, Event::InputChanged { .. }))
            .count();
        assert_eq!(changes, 2);
    }

    #[test]
    fn timer_firing_with_no_quota_left_completes_the_wave() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::StartNextWave, &mut events);
        world.wave.exhaust_quota();
        assert!(query::spawn_timer_armed(&world));

        events.clear();
        let dt = query::config(&world).spawn_interval();
        apply(&mut world, Command::Tick { dt }, &mut events);

        assert!(!query::spawn_timer_armed(&world));
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::SpawnDue { .. })));
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::WaveCompleted { .. })));
        assert_eq!(query::wave_phase(&world), WavePhase::Completing);
    }

    #[test]
    fn hit_crow_ignores_position_updates() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::StartNextWave, &mut events);
        let crow = spawn(&mut world, Problem::new(1, 1));
        apply(
            &mut world,
            Command::PressDigit {
                digit: Digit::new(1).expect("digit"),
            },
            &mut events,
        );
        apply(&mut world, Command::Submit, &mut events);
        apply(
            &mut world,
            Command::UpdateCrowPosition { crow, x: -10.0 },
            &mut events,
        );

        assert_eq!(query::wave_phase(&world), WavePhase::Spawning);
        let snapshot = query::crow(&world, crow).expect("still registered");
        assert_eq!(snapshot.phase, CrowPhase::Hit);
        assert_eq!(snapshot.x, query::config(&world).spawn_x());
    }
}

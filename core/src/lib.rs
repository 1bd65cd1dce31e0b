#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Crow Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing player input and collaborator reports, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that systems and the presentation layer react to. Systems consume event
//! streams, query immutable snapshots, and respond exclusively with new
//! command batches.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Crow Defence.";

/// Number of crows added to the spawn quota for every wave.
pub const QUOTA_PER_WAVE: u32 = 3;

/// Upper bound on the number of crows a single wave may spawn.
pub const QUOTA_CAP: u32 = 50;

/// Time bonus awarded for a wave completed instantly.
pub const TIME_BONUS_CEILING: u32 = 300;

/// Points awarded per consecutive perfect wave.
pub const PERFECT_BONUS_PER_STREAK: u32 = 100;

/// Points awarded per wave number on completion.
pub const WAVE_BONUS_PER_WAVE: u32 = 50;

/// Smallest operand a multiplication problem may carry.
pub const MIN_OPERAND: u8 = 1;

/// Largest operand a multiplication problem may carry.
pub const MAX_OPERAND: u8 = 9;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Requests that the next wave begins.
    StartNextWave,
    /// Signals that the presentation finished displaying a wave's bonuses.
    AcknowledgeCompletion,
    /// Appends a digit to the pending answer.
    PressDigit {
        /// Digit the player pressed.
        digit: Digit,
    },
    /// Removes the most recently entered digit.
    PressDelete,
    /// Empties the pending answer.
    ClearInput,
    /// Commits the pending answer against every flying crow.
    Submit,
    /// Advances the session clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that a new crow carrying `problem` enters the arena.
    SpawnCrow {
        /// Multiplication fact the crow carries.
        problem: Problem,
        /// Vertical lane the crow flies along.
        lane: f32,
    },
    /// Reports the horizontal position of a crow after motion was integrated.
    UpdateCrowPosition {
        /// Identifier of the crow that moved.
        crow: CrowId,
        /// New horizontal position measured in arena units.
        x: f32,
    },
    /// Discards the current session and starts over from wave zero.
    Restart,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the session clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the spawn timer fired and a crow should be produced.
    SpawnDue {
        /// Wave the spawn belongs to.
        wave: WaveNumber,
    },
    /// Confirms that a crow entered the arena.
    CrowSpawned {
        /// Identifier assigned to the crow.
        crow: CrowId,
        /// Problem the crow carries.
        problem: Problem,
        /// Horizontal position the crow starts from.
        x: f32,
        /// Vertical lane the crow flies along.
        lane: f32,
    },
    /// Confirms that a submitted answer struck a crow.
    CrowHit {
        /// Identifier of the crow that was struck.
        crow: CrowId,
    },
    /// Announces that a struck crow finished its hit animation and started to fall.
    CrowFalling {
        /// Identifier of the falling crow.
        crow: CrowId,
    },
    /// Confirms that a crow left the registry.
    CrowRemoved {
        /// Identifier of the removed crow.
        crow: CrowId,
        /// Reason the crow was removed.
        cause: RemovalCause,
    },
    /// Announces that a new wave became active.
    WaveStarted {
        /// Number of the wave that started.
        wave: WaveNumber,
        /// Number of crows the wave will spawn.
        quota: u32,
    },
    /// Reports the bonuses awarded when a wave was cleared.
    WaveCompleted {
        /// Number of the wave that completed.
        wave: WaveNumber,
        /// Breakdown of the awarded bonuses.
        bonus: WaveBonus,
        /// Score after the bonus was applied.
        total_score: u64,
        /// Perfect streak after the wave was evaluated.
        perfect_streak: u32,
    },
    /// Reports that a wave start request was rejected.
    WaveStartRejected {
        /// Specific reason the request failed.
        reason: WaveStartError,
    },
    /// Carries the pending answer text after it changed.
    InputChanged {
        /// Current content of the input buffer.
        text: String,
    },
    /// Requests the feedback cue played on every successful input mutation.
    InputFeedback,
    /// Reports the outcome of a submit.
    AnswerSubmitted {
        /// Parsed answer, or `None` when the buffer held no number.
        value: Option<u32>,
        /// Number of crows the answer struck.
        matched: u32,
    },
    /// Announces that a crow breached the boundary and the session ended.
    GameOver {
        /// Terminal summary of the session.
        summary: SessionSummary,
    },
    /// Confirms that the session was rebuilt from scratch.
    SessionRestarted,
}

/// Single decimal digit entered by the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digit(u8);

impl Digit {
    /// Creates a digit from its numeric value, rejecting values above nine.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value <= 9 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Creates a digit from an ASCII character in `'0'..='9'`.
    #[must_use]
    pub fn from_char(character: char) -> Option<Self> {
        character
            .to_digit(10)
            .and_then(|value| u8::try_from(value).ok())
            .and_then(Self::new)
    }

    /// Numeric value of the digit.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// ASCII character representing the digit.
    #[must_use]
    pub const fn as_char(&self) -> char {
        (b'0' + self.0) as char
    }
}

/// Unique identifier assigned to a crow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CrowId(u32);

impl CrowId {
    /// Creates a new crow identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Ordinal of a wave; zero means no wave has started yet.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct WaveNumber(u32);

impl WaveNumber {
    /// Creates a wave number wrapper.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the underlying wave ordinal.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the wave that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Number of crows the wave spawns: `min(wave * 3, 50)`.
    #[must_use]
    pub const fn quota(self) -> u32 {
        let quota = self.0.saturating_mul(QUOTA_PER_WAVE);
        if quota < QUOTA_CAP {
            quota
        } else {
            QUOTA_CAP
        }
    }

    /// Bonus awarded for clearing the wave.
    #[must_use]
    pub const fn bonus(self) -> u32 {
        self.0.saturating_mul(WAVE_BONUS_PER_WAVE)
    }
}

impl fmt::Display for WaveNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Single-digit multiplication fact carried by a crow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Problem {
    left: u8,
    right: u8,
}

impl Problem {
    /// Creates a problem from its two operands.
    #[must_use]
    pub const fn new(left: u8, right: u8) -> Self {
        Self { left, right }
    }

    /// First operand.
    #[must_use]
    pub const fn left(&self) -> u8 {
        self.left
    }

    /// Second operand.
    #[must_use]
    pub const fn right(&self) -> u8 {
        self.right
    }

    /// Product of the two operands.
    #[must_use]
    pub const fn answer(&self) -> u32 {
        self.left as u32 * self.right as u32
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}=?", self.left, self.right)
    }
}

/// Lifecycle phase of a crow.
///
/// Phases only ever move forward along `Flying -> Hit -> Falling -> Removed`.
/// A crow that breaches the boundary leaves the registry directly and never
/// enters `Removed` through this table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrowPhase {
    /// Advancing toward the boundary and eligible to be struck.
    Flying,
    /// Struck by an answer and playing its hit animation.
    Hit,
    /// Dropping out of the arena.
    Falling,
    /// Off-screen; terminal.
    Removed,
}

impl CrowPhase {
    /// Returns the phase that follows this one, or `None` for the terminal phase.
    #[must_use]
    pub const fn successor(self) -> Option<Self> {
        match self {
            Self::Flying => Some(Self::Hit),
            Self::Hit => Some(Self::Falling),
            Self::Falling => Some(Self::Removed),
            Self::Removed => None,
        }
    }

    /// Reports whether `next` is the single legal successor of this phase.
    #[must_use]
    pub fn permits(self, next: Self) -> bool {
        self.successor() == Some(next)
    }

    /// Reports whether the crow still counts toward wave completion.
    #[must_use]
    pub const fn is_live(self) -> bool {
        !matches!(self, Self::Removed)
    }
}

/// Phase of the wave session state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WavePhase {
    /// Waiting for the player to start the next wave.
    Idle,
    /// Spawning crows and/or holding live crows.
    Spawning,
    /// Bonuses computed; awaiting acknowledgement from the presentation.
    Completing,
    /// A crow breached the boundary. Terminal until restart.
    GameOver,
}

/// Reason a crow left the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalCause {
    /// The crow was struck and fell out of the arena.
    Defeated,
    /// The crow reached the boundary.
    Breached,
}

/// Breakdown of bonuses awarded when a wave completes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaveBonus {
    /// Reward for clearing the wave quickly.
    pub time: u32,
    /// Reward for clearing the wave without a missed submit.
    pub perfect: u32,
    /// Reward scaled by the wave number.
    pub wave: u32,
}

impl WaveBonus {
    /// Sum of all bonus components.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.time as u64 + self.perfect as u64 + self.wave as u64
    }
}

/// Computes `max(0, floor(300 - elapsed_seconds * 10))` without floating point.
#[must_use]
pub fn time_bonus(elapsed: Duration) -> u32 {
    const TENTH_OF_SECOND_NANOS: u128 = 100_000_000;
    let tenths = elapsed.as_nanos().div_ceil(TENTH_OF_SECOND_NANOS);
    let ceiling = u128::from(TIME_BONUS_CEILING);
    let bonus = ceiling.saturating_sub(tenths);
    u32::try_from(bonus).unwrap_or(0)
}

/// Computes the perfect-wave bonus for the provided streak length.
#[must_use]
pub const fn perfect_bonus(streak: u32) -> u32 {
    streak.saturating_mul(PERFECT_BONUS_PER_STREAK)
}

/// Terminal summary exposed once the session is over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Score at the moment the session ended.
    pub final_score: u64,
    /// Crows counted when they spawned, matching the scoreboard shown to players.
    pub enemies_defeated: u32,
    /// Crows that completed their defeat sequence.
    pub confirmed_defeats: u32,
    /// Wave that was active when the session ended.
    pub wave: WaveNumber,
}

/// Reasons a wave start request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum WaveStartError {
    /// A wave is already spawning or holding live crows.
    #[error("a wave is already in progress")]
    WaveInProgress,
    /// The previous wave's bonuses have not been acknowledged yet.
    #[error("the previous wave has not been acknowledged")]
    AwaitingAcknowledgement,
    /// A crow breached the boundary; only a restart is accepted.
    #[error("the session is over")]
    SessionOver,
}

/// Anomalies the world absorbs instead of surfacing to the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum Anomaly {
    /// The submitted buffer was empty or did not hold a number.
    #[error("submitted input is not a number")]
    InvalidInput,
    /// The spawn timer fired while no wave was spawning.
    #[error("spawn timer fired while the wave was inactive")]
    SpawnWhileInactive,
    /// A second boundary breach was observed after the session ended.
    #[error("game over already triggered")]
    DuplicateGameOver,
}

/// Immutable representation of a single crow's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct CrowSnapshot {
    /// Unique identifier assigned to the crow.
    pub id: CrowId,
    /// Problem the crow carries.
    pub problem: Problem,
    /// Current lifecycle phase.
    pub phase: CrowPhase,
    /// Horizontal position measured in arena units.
    pub x: f32,
    /// Vertical lane the crow was spawned on.
    pub lane: f32,
    /// Distance the crow has dropped since it started falling.
    pub drop: f32,
}

/// Read-only snapshot describing all crows in the registry.
#[derive(Clone, Debug, Default)]
pub struct CrowView {
    snapshots: Vec<CrowSnapshot>,
}

impl CrowView {
    /// Creates a new crow view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<CrowSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured crow snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &CrowSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over crows that are still flying toward the boundary.
    pub fn flying(&self) -> impl Iterator<Item = &CrowSnapshot> {
        self.snapshots
            .iter()
            .filter(|snapshot| snapshot.phase == CrowPhase::Flying)
    }

    /// Number of crows captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no crows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<CrowSnapshot> {
        self.snapshots
    }
}

/// Tunable parameters of a session.
///
/// Defaults reproduce the arcade cabinet timings: a crow every two seconds,
/// 180 units per second of flight across a 1920x1080 arena, a half-second hit
/// animation and a 500 units per second fall polled every 100 ms.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Period of the spawn timer in milliseconds.
    pub spawn_interval_ms: u64,
    /// Horizontal flight speed in arena units per second.
    pub crow_speed: f32,
    /// Width of the arena in arena units.
    pub arena_width: f32,
    /// Height of the arena in arena units.
    pub arena_height: f32,
    /// Distance beyond the right edge at which crows appear.
    pub spawn_margin: f32,
    /// Minimum distance between a lane and the top or bottom edge.
    pub lane_margin: f32,
    /// Horizontal position of the defended boundary.
    pub boundary_x: f32,
    /// Duration of the hit animation in milliseconds.
    pub hit_animation_ms: u64,
    /// Fall speed in arena units per second.
    pub fall_speed: f32,
    /// Period of the off-screen check for falling crows in milliseconds.
    pub fall_check_interval_ms: u64,
    /// Distance below the arena a falling crow must pass to be removed.
    pub fall_clearance: f32,
    /// Maximum number of digits the input buffer holds.
    pub input_capacity: usize,
}

impl SessionConfig {
    /// Period of the spawn timer.
    #[must_use]
    pub const fn spawn_interval(&self) -> Duration {
        Duration::from_millis(self.spawn_interval_ms)
    }

    /// Duration of the hit animation.
    #[must_use]
    pub const fn hit_animation(&self) -> Duration {
        Duration::from_millis(self.hit_animation_ms)
    }

    /// Period of the off-screen check for falling crows.
    #[must_use]
    pub const fn fall_check_interval(&self) -> Duration {
        Duration::from_millis(self.fall_check_interval_ms)
    }

    /// Horizontal position at which new crows appear.
    #[must_use]
    pub fn spawn_x(&self) -> f32 {
        self.arena_width + self.spawn_margin
    }

    /// Inclusive range of lanes crows may be spawned on.
    ///
    /// Collapses to the arena's vertical centre when the margins overlap.
    #[must_use]
    pub fn lane_range(&self) -> (f32, f32) {
        let low = self.lane_margin;
        let high = self.arena_height - self.lane_margin;
        if high < low {
            let centre = self.arena_height / 2.0;
            (centre, centre)
        } else {
            (low, high)
        }
    }

    /// Distance a crow on `lane` must fall before it is off-screen.
    #[must_use]
    pub fn fall_distance(&self, lane: f32) -> f32 {
        (self.arena_height + self.fall_clearance - lane).max(0.0)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            spawn_interval_ms: 2_000,
            crow_speed: 180.0,
            arena_width: 1_920.0,
            arena_height: 1_080.0,
            spawn_margin: 50.0,
            lane_margin: 200.0,
            boundary_x: 0.0,
            hit_animation_ms: 500,
            fall_speed: 500.0,
            fall_check_interval_ms: 100,
            fall_clearance: 100.0,
            input_capacity: 8,
        }
    }
}

//! Event loop that threads commands through the world and its systems.

use std::{collections::VecDeque, time::Duration};

use crow_defence_core::{Command, Digit, Event, SessionConfig};
use crow_defence_system_movement::Movement;
use crow_defence_system_spawning::{Config as SpawningConfig, Spawning};
use crow_defence_world::{self as world, query, World};

use crate::{dispatch, Presentation};

/// A playable session: the authoritative world plus the systems that feed it.
///
/// Each public method corresponds to one call the input layer may make. The
/// command is applied, the resulting events are shown to the presentation,
/// and any commands the systems produce in response are applied in turn until
/// the world settles.
#[derive(Debug)]
pub struct Session {
    world: World,
    spawning: Spawning,
    movement: Movement,
}

impl Session {
    /// Creates a session with the provided tuning and random seed.
    #[must_use]
    pub fn new(config: SessionConfig, seed: u64) -> Self {
        let movement = Movement::new(config.crow_speed);
        Self {
            world: World::with_config(config),
            spawning: Spawning::new(SpawningConfig::new(seed)),
            movement,
        }
    }

    /// Read-only access to the authoritative world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Starts the next wave.
    pub fn start_next_wave<P: Presentation + ?Sized>(&mut self, presentation: &mut P) {
        self.execute(Command::StartNextWave, presentation);
    }

    /// Signals that the wave completion display finished.
    pub fn acknowledge_completion<P: Presentation + ?Sized>(&mut self, presentation: &mut P) {
        self.execute(Command::AcknowledgeCompletion, presentation);
    }

    /// Appends a digit to the pending answer.
    pub fn press_digit<P: Presentation + ?Sized>(&mut self, digit: Digit, presentation: &mut P) {
        self.execute(Command::PressDigit { digit }, presentation);
    }

    /// Removes the last digit of the pending answer.
    pub fn press_delete<P: Presentation + ?Sized>(&mut self, presentation: &mut P) {
        self.execute(Command::PressDelete, presentation);
    }

    /// Empties the pending answer.
    pub fn clear_input<P: Presentation + ?Sized>(&mut self, presentation: &mut P) {
        self.execute(Command::ClearInput, presentation);
    }

    /// Commits the pending answer.
    pub fn submit<P: Presentation + ?Sized>(&mut self, presentation: &mut P) {
        self.execute(Command::Submit, presentation);
    }

    /// Advances timers and motion by `dt`.
    pub fn tick<P: Presentation + ?Sized>(&mut self, dt: Duration, presentation: &mut P) {
        self.execute(Command::Tick { dt }, presentation);
    }

    /// Throws the session away and starts from wave zero.
    pub fn restart<P: Presentation + ?Sized>(&mut self, presentation: &mut P) {
        self.execute(Command::Restart, presentation);
    }

    /// Applies `command` and every command the systems derive from it.
    pub fn execute<P: Presentation + ?Sized>(&mut self, command: Command, presentation: &mut P) {
        let mut pending = VecDeque::from([command]);
        let mut events: Vec<Event> = Vec::new();
        let mut derived: Vec<Command> = Vec::new();

        while let Some(command) = pending.pop_front() {
            events.clear();
            world::apply(&mut self.world, command, &mut events);
            if events.is_empty() {
                continue;
            }
            dispatch(&events, presentation);

            derived.clear();
            let wave_phase = query::wave_phase(&self.world);
            self.movement.handle(
                &events,
                wave_phase,
                &query::crow_view(&self.world),
                &mut derived,
            );
            self.spawning.handle(
                &events,
                wave_phase,
                query::config(&self.world).lane_range(),
                &mut derived,
            );
            pending.extend(derived.drain(..));
        }
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawning system that turns spawn timer announcements into crows.

use crow_defence_core::{Command, Event, WavePhase};
use crow_defence_system_problem_generation::ProblemGenerator;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Pure system that answers every [`Event::SpawnDue`] with a spawn command.
#[derive(Debug)]
pub struct Spawning {
    generator: ProblemGenerator,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            generator: ProblemGenerator::from_seed(config.rng_seed),
        }
    }

    /// Consumes events and the current wave phase to emit spawn commands.
    ///
    /// `lanes` is the inclusive vertical range crows may fly along.
    pub fn handle(
        &mut self,
        events: &[Event],
        wave_phase: WavePhase,
        lanes: (f32, f32),
        out: &mut Vec<Command>,
    ) {
        if wave_phase != WavePhase::Spawning {
            return;
        }

        for event in events {
            if let Event::SpawnDue { .. } = event {
                let problem = self.generator.generate();
                let lane = self.generator.sample_between(lanes.0, lanes.1);
                out.push(Command::SpawnCrow { problem, lane });
            }
        }
    }
}

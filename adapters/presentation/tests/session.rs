use std::{collections::BTreeSet, time::Duration};

use crow_defence_core::{
    CrowId, Digit, Problem, RemovalCause, SessionConfig, SessionSummary, WaveBonus, WaveNumber,
    WavePhase,
};
use crow_defence_presentation::{Headless, Presentation, Session};
use crow_defence_world::query;

const STEP: Duration = Duration::from_millis(50);

#[derive(Debug, Default, PartialEq)]
struct Transcript {
    lines: Vec<String>,
    completions: Vec<(WaveNumber, WaveBonus)>,
    game_over: Option<SessionSummary>,
    clicks: u32,
}

impl Presentation for Transcript {
    fn on_enemy_spawned(&mut self, crow: CrowId, problem: Problem, _x: f32, lane: f32) {
        self.lines
            .push(format!("spawn {} {problem} {lane:.3}", crow.get()));
    }

    fn on_enemy_hit(&mut self, crow: CrowId) {
        self.lines.push(format!("hit {}", crow.get()));
    }

    fn on_enemy_removed(&mut self, crow: CrowId, cause: RemovalCause) {
        self.lines.push(format!("removed {} {cause:?}", crow.get()));
    }

    fn on_wave_completed(
        &mut self,
        wave: WaveNumber,
        bonus: WaveBonus,
        _total_score: u64,
        _perfect_streak: u32,
    ) {
        self.completions.push((wave, bonus));
    }

    fn on_game_over(&mut self, summary: SessionSummary) {
        assert!(self.game_over.is_none(), "game over reported twice");
        self.game_over = Some(summary);
    }

    fn on_feedback(&mut self) {
        self.clicks += 1;
    }
}

fn answer_everything<P: Presentation>(session: &mut Session, presentation: &mut P) {
    // Identical answers strike every matching crow at once; repeating one would be a miss.
    let answers: BTreeSet<u32> = query::crow_view(session.world())
        .flying()
        .map(|crow| crow.problem.answer())
        .collect();
    for answer in answers {
        for character in answer.to_string().chars() {
            let digit = Digit::from_char(character).expect("digit");
            session.press_digit(digit, presentation);
        }
        session.submit(presentation);
    }
}

/// Plays `waves` waves, answering every crow as soon as it appears.
fn play(seed: u64, waves: u32) -> Transcript {
    let mut session = Session::new(SessionConfig::default(), seed);
    let mut transcript = Transcript::default();

    session.start_next_wave(&mut transcript);
    for _ in 0..20_000 {
        session.tick(STEP, &mut transcript);
        answer_everything(&mut session, &mut transcript);
        if query::wave_phase(session.world()) == WavePhase::Completing {
            if transcript.completions.len() as u32 >= waves {
                break;
            }
            session.acknowledge_completion(&mut transcript);
            session.start_next_wave(&mut transcript);
        }
    }
    transcript
}

#[test]
fn attentive_player_clears_waves_with_perfect_bonuses() {
    let transcript = play(7, 3);

    assert!(transcript.game_over.is_none());
    let waves: Vec<u32> = transcript
        .completions
        .iter()
        .map(|(wave, _)| wave.get())
        .collect();
    assert_eq!(waves, vec![1, 2, 3]);
    for (index, (wave, bonus)) in transcript.completions.iter().enumerate() {
        assert_eq!(bonus.perfect, 100 * (index as u32 + 1));
        assert_eq!(bonus.wave, 50 * wave.get());
    }

    let spawned = transcript
        .lines
        .iter()
        .filter(|line| line.starts_with("spawn"))
        .count();
    assert_eq!(spawned, 3 + 6 + 9);
}

#[test]
fn same_seed_replays_identically() {
    let first = play(42, 2);
    let second = play(42, 2);
    assert_eq!(first, second);

    let other = play(43, 2);
    assert_ne!(first.lines, other.lines);
}

#[test]
fn idle_player_loses_to_first_crow() {
    let mut session = Session::new(SessionConfig::default(), 1);
    let mut transcript = Transcript::default();
    session.start_next_wave(&mut transcript);

    while transcript.game_over.is_none() {
        assert!(query::clock(session.world()) < Duration::from_secs(20));
        session.tick(STEP, &mut transcript);
    }

    let summary = transcript.game_over.expect("game over");
    assert_eq!(summary.final_score, 0);
    assert_eq!(summary.confirmed_defeats, 0);
    assert_eq!(summary.wave, WaveNumber::new(1));
    assert!(transcript.lines.contains(&"removed 0 Breached".to_owned()));

    // A crow starting 1970 units out at 180 units/s needs just under 11 s.
    let clock = query::clock(session.world());
    assert!(clock > Duration::from_millis(12_900));
    assert!(clock < Duration::from_millis(13_100));

    let frozen = transcript.lines.len();
    for _ in 0..100 {
        session.tick(STEP, &mut transcript);
    }
    assert_eq!(transcript.lines.len(), frozen);
    assert_eq!(query::wave_phase(session.world()), WavePhase::GameOver);
}

#[test]
fn restart_returns_to_wave_zero() {
    let mut session = Session::new(SessionConfig::default(), 9);
    let mut presentation = Headless;
    session.start_next_wave(&mut presentation);
    for _ in 0..100 {
        session.tick(STEP, &mut presentation);
    }
    assert!(!query::crow_view(session.world()).is_empty());

    session.restart(&mut presentation);
    assert_eq!(query::wave_phase(session.world()), WavePhase::Idle);
    assert_eq!(query::wave_number(session.world()).get(), 0);
    assert!(query::crow_view(session.world()).is_empty());
    assert_eq!(query::clock(session.world()), Duration::ZERO);
}

#[test]
fn input_edits_reach_presentation() {
    let mut session = Session::new(SessionConfig::default(), 0);
    let mut transcript = Transcript::default();
    let four = Digit::new(4).expect("digit");

    session.press_digit(four, &mut transcript);
    session.press_digit(four, &mut transcript);
    session.press_delete(&mut transcript);
    assert_eq!(query::input_text(session.world()), "4");
    session.clear_input(&mut transcript);
    assert_eq!(query::input_text(session.world()), "");
    assert_eq!(transcript.clicks, 4);
}

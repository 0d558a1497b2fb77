//! Scoring and level progression.
//!
//! The game state is the single writer for score and level counters; all
//! mutation happens synchronously inside the tick's resolution phase, so UI
//! collaborators can read it freely between ticks.

use hecs::World;
use log::info;
use serde::{Deserialize, Serialize};

use crate::components::PlayerFish;
use crate::events::{EventSink, GameEvent};
use crate::systems::spawning::FishSpawner;

/// Seconds between level-complete and the next wave
const LEVEL_TRANSITION_SECONDS: f32 = 3.0;

/// Global score, level, and difficulty state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub score: i32,
    pub level: u32,
    pub target_score: i32,
    pub difficulty_multiplier: f32,
    pub game_over: bool,
    /// Set when the score target is crossed; consumed by the progression
    /// system exactly once
    pending_level_complete: bool,
    /// Countdown to the next level's wave, if a transition is running
    level_transition: Option<f32>,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            score: 0,
            level: 1,
            target_score: 1000,
            difficulty_multiplier: 1.0,
            game_over: false,
            pending_level_complete: false,
            level_transition: None,
        }
    }

    /// Add points scaled by the difficulty multiplier (rounded to nearest).
    /// Crossing the score target arms the level-complete step; the flag can
    /// only be armed once per level.
    pub fn add_score(&mut self, points: i32) {
        if self.game_over {
            return;
        }
        self.score += (points as f32 * self.difficulty_multiplier).round() as i32;

        if self.score >= self.target_score
            && !self.pending_level_complete
            && self.level_transition.is_none()
        {
            self.pending_level_complete = true;
        }
    }

    pub fn level_complete_pending(&self) -> bool {
        self.pending_level_complete
    }

    /// Advance to the next level: bank the stud bonus, raise the targets,
    /// and start the transition countdown. The new score target is set here
    /// (not when the wave spawns) so the completion cannot re-fire while the
    /// transition runs.
    pub fn complete_level(&mut self, stud_bonus: i32) -> u32 {
        let finished = self.level;
        self.pending_level_complete = false;
        self.score += stud_bonus;
        self.level += 1;
        self.target_score = 1000 * self.level as i32;
        self.difficulty_multiplier = 1.0 + (self.level - 1) as f32 * 0.2;
        self.level_transition = Some(LEVEL_TRANSITION_SECONDS);
        finished
    }

    /// Count down a running level transition; returns true on the tick the
    /// countdown elapses (time to spawn the next wave)
    pub fn tick_transition(&mut self, delta_seconds: f32) -> bool {
        match self.level_transition.as_mut() {
            Some(remaining) => {
                *remaining -= delta_seconds;
                if *remaining <= 0.0 {
                    self.level_transition = None;
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    }

    /// Per-level player size target, exposed for collaborators that poll it
    pub fn size_target(&self) -> i32 {
        50 + self.level as i32 * 25
    }

    /// Mark the run as over; returns false if it already was (the game-over
    /// path must fire exactly once)
    pub fn set_game_over(&mut self) -> bool {
        if self.game_over {
            false
        } else {
            self.game_over = true;
            true
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive pending level completions and transition countdowns
pub fn progression_system(
    world: &mut World,
    state: &mut GameState,
    spawner: &mut FishSpawner,
    sink: &mut dyn EventSink,
    delta_seconds: f32,
) {
    if state.game_over {
        return;
    }

    if state.level_complete_pending() {
        let stud_bonus = world
            .query::<&PlayerFish>()
            .iter()
            .next()
            .map(|(_, p)| p.studs * 10)
            .unwrap_or(0);

        let finished = state.complete_level(stud_bonus);
        info!("level {} complete, score {}", finished, state.score);
        sink.notify(GameEvent::LevelComplete {
            level: finished,
            score: state.score,
        });
    }

    if state.tick_transition(delta_seconds) {
        let mut rng = rand::thread_rng();
        spawner.spawn_wave(world, state.level, sink, &mut rng);
        info!("level {} started", state.level);
        sink.notify(GameEvent::LevelStart { level: state.level });
    }
}

//! Outbound notification boundary.
//!
//! The simulation never talks to a HUD, camera, or audio device directly; it
//! emits `GameEvent`s into an injected `EventSink`. The default `EventLog`
//! just collects them so a host (or a test) can drain the stream after each
//! tick.

use serde::{Deserialize, Serialize};

use crate::components::{FishTier, PowerUpKind, Vec3};

/// Everything the simulation tells the outside world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// The running score changed (HUD update)
    ScoreChanged { score: i32 },
    /// A stud was collected; hosts render a floating popup at the position
    StudCollected { position: Vec3, value: i32 },
    /// A loose brick was absorbed by the player
    BrickCollected { value: i32 },
    /// A fish was consumed
    FishEaten {
        position: Vec3,
        size: i32,
        by_player: bool,
    },
    /// Feedback impulse for the host camera
    CameraShake { duration: f32, magnitude: f32 },
    /// The player crossed a growth threshold
    PlayerGrew { new_size: i32, tier: FishTier },
    /// The player was bitten by a larger fish
    PlayerDamaged { parts_lost: i32, remaining_size: i32 },
    /// A power-up was picked up
    PowerUpCollected { kind: PowerUpKind },
    /// A timed power-up ran out
    PowerUpExpired { kind: PowerUpKind },
    /// A new level began
    LevelStart { level: u32 },
    /// The score target was reached; fires exactly once per level
    LevelComplete { level: u32, score: i32 },
    /// A boss entered the reef
    BossSpawned { position: Vec3 },
    /// The player died; fires exactly once
    GameOver { score: i32, level: u32 },
}

/// Receives simulation events; injected at engine construction
pub trait EventSink {
    fn notify(&mut self, event: GameEvent);
}

/// Default sink - an in-memory event stream
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    pub events: Vec<GameEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain and return everything collected since the last call
    pub fn take(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn contains(&self, predicate: impl Fn(&GameEvent) -> bool) -> bool {
        self.events.iter().any(predicate)
    }

    pub fn count(&self, predicate: impl Fn(&GameEvent) -> bool) -> usize {
        self.events.iter().filter(|e| predicate(e)).count()
    }

    /// Serialize the collected stream, e.g. for a host-side bridge
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.events)
    }
}

impl EventSink for EventLog {
    fn notify(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}

/// Sink used inside the engine tick: always records into the engine's log,
/// and forwards to an external sink when one was injected
pub struct FanoutSink<'a> {
    pub log: &'a mut EventLog,
    pub external: Option<&'a mut (dyn EventSink + 'static)>,
}

impl EventSink for FanoutSink<'_> {
    fn notify(&mut self, event: GameEvent) {
        if let Some(external) = self.external.as_mut() {
            external.notify(event.clone());
        }
        self.log.notify(event);
    }
}

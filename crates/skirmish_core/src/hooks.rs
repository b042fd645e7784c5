//! Notifications from the simulation to its host.
//!
//! Sound, telemetry and UI refreshes hang off [`EngineHooks`], which is
//! handed to the engine at construction. Hooks observe; they cannot change
//! the simulation.

use std::sync::{Arc, Mutex};

use crate::abilities::AbilityKind;
use crate::archetypes::Archetype;
use crate::components::{Unit, UnitId};
use crate::factions::Faction;
use crate::math::Fixed;
use crate::snapshot::MatchSnapshot;
use crate::world::MatchPhase;

/// Receiver for engine events. Every method defaults to doing nothing.
pub trait EngineHooks: Send {
    /// A unit left the production queue.
    fn on_unit_spawned(&mut self, _unit: &Unit) {}

    /// A unit entered its death sequence.
    fn on_unit_killed(&mut self, _victim: &Unit, _killer: Faction) {}

    /// An ability was cast.
    fn on_ability_cast(&mut self, _faction: Faction, _ability: AbilityKind, _x: Fixed) {}

    /// A tower fired at a unit.
    fn on_tower_fired(&mut self, _faction: Faction, _target: UnitId) {}

    /// A base structure took damage.
    fn on_base_hit(&mut self, _faction: Faction, _damage: u32) {}

    /// Periodic state snapshot for render/UI refresh.
    fn on_snapshot(&mut self, _snapshot: &MatchSnapshot) {}

    /// The match reached a terminal phase.
    fn on_match_end(&mut self, _phase: MatchPhase) {}
}

/// Hooks that ignore everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl EngineHooks for NoopHooks {}

/// One recorded hook call.
#[derive(Debug, Clone, PartialEq)]
pub enum HookEvent {
    /// See [`EngineHooks::on_unit_spawned`].
    UnitSpawned {
        /// Spawned unit.
        id: UnitId,
        /// Its faction.
        faction: Faction,
        /// Its archetype.
        archetype: Archetype,
    },
    /// See [`EngineHooks::on_unit_killed`].
    UnitKilled {
        /// Victim id.
        id: UnitId,
        /// Faction credited with the kill.
        killer: Faction,
    },
    /// See [`EngineHooks::on_ability_cast`].
    AbilityCast {
        /// Caster.
        faction: Faction,
        /// Ability.
        ability: AbilityKind,
    },
    /// See [`EngineHooks::on_tower_fired`].
    TowerFired {
        /// Tower owner.
        faction: Faction,
        /// Target.
        target: UnitId,
    },
    /// See [`EngineHooks::on_base_hit`].
    BaseHit {
        /// Owner of the damaged base.
        faction: Faction,
        /// Damage dealt.
        damage: u32,
    },
    /// See [`EngineHooks::on_snapshot`].
    Snapshot {
        /// Frame of the snapshot.
        frame: u64,
    },
    /// See [`EngineHooks::on_match_end`].
    MatchEnded(MatchPhase),
}

/// Hooks that record every call, for tests.
///
/// Clone the recorder before handing it to the engine; all clones share
/// one event log.
#[derive(Debug, Clone, Default)]
pub struct RecordingHooks {
    events: Arc<Mutex<Vec<HookEvent>>>,
}

impl RecordingHooks {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<HookEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Count events matching a predicate.
    #[must_use]
    pub fn count(&self, predicate: impl Fn(&HookEvent) -> bool) -> usize {
        self.events
            .lock()
            .map(|e| e.iter().filter(|ev| predicate(ev)).count())
            .unwrap_or(0)
    }

    fn record(&self, event: HookEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl EngineHooks for RecordingHooks {
    fn on_unit_spawned(&mut self, unit: &Unit) {
        self.record(HookEvent::UnitSpawned {
            id: unit.id,
            faction: unit.faction,
            archetype: unit.archetype,
        });
    }

    fn on_unit_killed(&mut self, victim: &Unit, killer: Faction) {
        self.record(HookEvent::UnitKilled {
            id: victim.id,
            killer,
        });
    }

    fn on_ability_cast(&mut self, faction: Faction, ability: AbilityKind, _x: Fixed) {
        self.record(HookEvent::AbilityCast { faction, ability });
    }

    fn on_tower_fired(&mut self, faction: Faction, target: UnitId) {
        self.record(HookEvent::TowerFired { faction, target });
    }

    fn on_base_hit(&mut self, faction: Faction, damage: u32) {
        self.record(HookEvent::BaseHit { faction, damage });
    }

    fn on_snapshot(&mut self, snapshot: &MatchSnapshot) {
        self.record(HookEvent::Snapshot {
            frame: snapshot.frame,
        });
    }

    fn on_match_end(&mut self, phase: MatchPhase) {
        self.record(HookEvent::MatchEnded(phase));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::calculate_stats;
    use crate::math::fx;

    #[test]
    fn test_recording_clones_share_log() {
        let recorder = RecordingHooks::new();
        let mut boxed: Box<dyn EngineHooks> = Box::new(recorder.clone());

        let unit = Unit::new(
            3,
            Faction::Player,
            Archetype::Archer,
            fx(100),
            calculate_stats(Archetype::Archer, 0),
        );
        boxed.on_unit_spawned(&unit);
        boxed.on_base_hit(Faction::Opponent, 14);

        assert_eq!(recorder.events().len(), 2);
        assert_eq!(
            recorder.count(|e| matches!(e, HookEvent::BaseHit { damage: 14, .. })),
            1
        );
    }

    #[test]
    fn test_noop_hooks_accept_everything() {
        let mut hooks = NoopHooks;
        hooks.on_match_end(MatchPhase::Victory);
        hooks.on_tower_fired(Faction::Player, 1);
    }
}

//! Test fixtures and helpers.
//!
//! Pre-built engines and scripted command runs for consistent testing.

use fixed::types::I32F32;
use skirmish_core::prelude::*;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// A started single-player engine with the opposing AI switched off, so a
/// test fully controls both sides.
///
/// # Panics
///
/// Panics if `config` is invalid.
#[must_use]
pub fn quiet_engine(config: MatchConfig) -> GameEngine {
    quiet_engine_with_hooks(config, Box::new(NoopHooks))
}

/// Like [`quiet_engine`] with caller-provided hooks.
///
/// # Panics
///
/// Panics if `config` is invalid.
#[must_use]
pub fn quiet_engine_with_hooks(config: MatchConfig, hooks: Box<dyn EngineHooks>) -> GameEngine {
    let mut engine = GameEngine::new(config, MatchMode::SinglePlayer, hooks)
        .expect("fixture config must be valid")
        .with_ai(None);
    let _ = engine.start();
    engine
}

/// A started single-player engine with the default AI opponent.
///
/// # Panics
///
/// Panics if `config` is invalid.
#[must_use]
pub fn ai_engine(config: MatchConfig) -> GameEngine {
    let mut engine = GameEngine::new(config, MatchMode::SinglePlayer, Box::new(NoopHooks))
        .expect("fixture config must be valid");
    let _ = engine.start();
    engine
}

/// A started peer-synchronized engine for `local_id`.
///
/// # Panics
///
/// Panics if `config` is invalid.
#[must_use]
pub fn peer_engine(config: MatchConfig, local_id: &str) -> GameEngine {
    let mode = MatchMode::PeerSynced {
        local_id: local_id.to_string(),
    };
    let mut engine =
        GameEngine::new(config, mode, Box::new(NoopHooks)).expect("fixture config must be valid");
    let _ = engine.start();
    engine
}

/// Give a faction extra gold.
pub fn grant_gold(engine: &mut GameEngine, faction: Faction, amount: u32) {
    engine.world_mut().treasuries[faction].credit(amount);
}

/// Place a level-0 unit directly on the lane.
pub fn place_unit(engine: &mut GameEngine, faction: Faction, archetype: Archetype, x: i32) -> UnitId {
    engine.world_mut().spawn_unit(faction, archetype, fx(x), 0)
}

/// Advance `frames` updates.
pub fn run_frames(engine: &mut GameEngine, frames: u64) {
    for _ in 0..frames {
        engine.update();
    }
}

/// A command to issue at a given frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptedCommand {
    /// Frame at which the command is issued (before that frame's update).
    pub frame: u64,
    /// Issuing faction.
    pub faction: Faction,
    /// The command.
    pub command: Command,
}

impl ScriptedCommand {
    /// Script entry.
    #[must_use]
    pub const fn new(frame: u64, faction: Faction, command: Command) -> Self {
        Self {
            frame,
            faction,
            command,
        }
    }
}

/// Run `frames` updates, issuing scripted commands as their frame comes up.
///
/// Returns the outcome of every scripted command in script order.
pub fn run_script(engine: &mut GameEngine, script: &[ScriptedCommand], frames: u64) -> Vec<CommandOutcome> {
    let mut ordered: Vec<(usize, &ScriptedCommand)> = script.iter().enumerate().collect();
    ordered.sort_by_key(|(i, entry)| (entry.frame, *i));

    let mut outcomes = vec![CommandOutcome::Rejected(Rejection::NothingToDo); script.len()];
    let mut next = ordered.into_iter().peekable();
    for _ in 0..frames {
        let frame = engine.frame();
        while let Some((index, entry)) = next.next_if(|(_, entry)| entry.frame <= frame) {
            outcomes[index] = engine.apply_command(entry.faction, entry.command);
        }
        engine.update();
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_engine_is_running_without_ai() {
        let engine = quiet_engine(MatchConfig::default());
        assert_eq!(engine.phase(), MatchPhase::Running);
        assert!(engine.ai().is_none());
    }

    #[test]
    fn test_run_script_issues_in_frame_order() {
        let mut engine = quiet_engine(MatchConfig::default());
        let script = [
            ScriptedCommand::new(10, Faction::Player, Command::QueueUnit(Archetype::Miner)),
            ScriptedCommand::new(0, Faction::Player, Command::QueueUnit(Archetype::Swordsman)),
        ];
        let outcomes = run_script(&mut engine, &script, 20);
        assert!(outcomes[1].is_applied());
        assert!(outcomes[0].is_applied());
        assert_eq!(engine.world().treasuries[Faction::Player].gold(), 50);
    }
}

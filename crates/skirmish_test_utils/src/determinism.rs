//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a match produces identical
//! results given identical seeds and inputs.
//!
//! # Testing Strategy
//!
//! Peer-synchronized matches, save/resume and headless verification all
//! rely on the engine being fully deterministic. Sources of
//! non-determinism include:
//!
//! - **Floating-point math**: lane positions use fixed-point arithmetic via
//!   [`skirmish_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: entities live in id-sorted vectors and
//!   upgrade tables are `BTreeMap`s.
//!
//! - **System randomness**: every random draw goes through the engine's
//!   seeded [`skirmish_core::random::RandomSource`].
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual subsystems (inline in `skirmish_core`)
//! 2. **Property tests**: random command scripts still replay identically
//! 3. **Integration tests**: full bot-vs-bot matches are reproducible
//! 4. **Parallel tests**: running N matches on threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use skirmish_core::engine::GameEngine;

use crate::fixtures::{run_script, ScriptedCommand};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of frames simulated.
    pub frames: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic match).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the match was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Match is non-deterministic!\n\
                 Runs: {}\n\
                 Frames: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.frames,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `frames` - Number of frames to simulate per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance by one frame
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```
/// use skirmish_test_utils::determinism::verify_determinism;
/// use skirmish_test_utils::fixtures::ai_engine;
/// use skirmish_core::config::MatchConfig;
///
/// let result = verify_determinism(
///     3,
///     200,
///     || ai_engine(MatchConfig::default()),
///     |engine| engine.update(),
///     |engine| engine.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    frames: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..frames {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        frames,
    }
}

/// Run the same command script against engines from `setup` twice and
/// compare the final state hashes.
pub fn verify_script_determinism<F>(setup: F, script: &[ScriptedCommand], frames: u64) -> DeterminismResult
where
    F: Fn() -> GameEngine,
{
    let mut result = verify_determinism(
        2,
        1,
        || {
            let mut engine = setup();
            let _ = run_script(&mut engine, script, frames);
            engine
        },
        |_| {},
        GameEngine::state_hash,
    );
    result.frames = frames;
    result
}

/// Run N matches on separate threads and collect final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling or
/// memory layout differences.
pub fn run_parallel_matches<F>(setup: F, matches: usize, frames: u64) -> DeterminismResult
where
    F: Fn() -> GameEngine + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..matches)
            .map(|_| {
                s.spawn(|| {
                    let mut engine = setup();
                    for _ in 0..frames {
                        engine.update();
                    }
                    engine.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("match thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        frames,
    }
}

/// Compare two runs frame-by-frame, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs are deterministic, `Some(frame)` if they diverge at
/// that frame.
pub fn find_first_divergence<F>(setup: F, frames: u64) -> Option<u64>
where
    F: Fn() -> GameEngine,
{
    let mut a = setup();
    let mut b = setup();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for frame in 1..=frames {
        a.update();
        b.update();

        if a.state_hash() != b.state_hash() {
            tracing::warn!(frame, "Matches diverged");
            return Some(frame);
        }
    }

    None
}

/// Verify that saving and loading mid-match resumes identically.
///
/// Runs `before` frames, saves, restores into a fresh engine from `setup`,
/// then runs both for `after` frames and compares hashes.
pub fn verify_save_load_determinism<F>(setup: F, before: u64, after: u64) -> bool
where
    F: Fn() -> GameEngine,
{
    let mut original = setup();
    for _ in 0..before {
        original.update();
    }

    let Ok(bytes) = original.save_state() else {
        return false;
    };
    let mut restored = setup();
    if restored.load_state(&bytes).is_err() || restored.state_hash() != original.state_hash() {
        return false;
    }

    for _ in 0..after {
        original.update();
        restored.update();
    }
    original.state_hash() == restored.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for simulation testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing.
pub mod strategies {
    use proptest::prelude::*;
    use skirmish_core::abilities::AbilityKind;
    use skirmish_core::archetypes::Archetype;
    use skirmish_core::command::Command;
    use skirmish_core::factions::Faction;
    use skirmish_core::math::{fx, Fixed};
    use skirmish_core::orders::Strategy as ArmyStrategy;

    use crate::fixtures::ScriptedCommand;

    /// Any archetype.
    pub fn arb_archetype() -> impl Strategy<Value = Archetype> {
        proptest::sample::select(Archetype::ALL.to_vec())
    }

    /// Any archetype that fights.
    pub fn arb_combat_archetype() -> impl Strategy<Value = Archetype> {
        proptest::sample::select(Archetype::COMBAT.to_vec())
    }

    /// Any ability.
    pub fn arb_ability() -> impl Strategy<Value = AbilityKind> {
        proptest::sample::select(AbilityKind::ALL.to_vec())
    }

    /// Any faction.
    pub fn arb_faction() -> impl Strategy<Value = Faction> {
        proptest::sample::select(Faction::ALL.to_vec())
    }

    /// Upgrade levels in the range the game offers.
    pub fn arb_level() -> impl Strategy<Value = u32> {
        0u32..=20
    }

    /// A position on the default lane.
    pub fn arb_lane_x() -> impl Strategy<Value = Fixed> {
        (0i32..=3000).prop_map(fx)
    }

    /// Any army strategy.
    pub fn arb_strategy() -> impl Strategy<Value = ArmyStrategy> {
        prop_oneof![
            Just(ArmyStrategy::Attack),
            Just(ArmyStrategy::Defend),
            Just(ArmyStrategy::Mass),
            Just(ArmyStrategy::Retreat),
        ]
    }

    /// Any command, including out-of-range values the engine must reject.
    pub fn arb_command() -> impl Strategy<Value = Command> {
        prop_oneof![
            arb_archetype().prop_map(Command::QueueUnit),
            arb_archetype().prop_map(Command::DismissUnit),
            Just(Command::BuyTower),
            (arb_ability(), (-100i32..=3100).prop_map(fx))
                .prop_map(|(ability, x)| Command::CastAbility { ability, x }),
            arb_lane_x().prop_map(Command::SetRallyPoint),
            arb_lane_x().prop_map(Command::SetPatrolPoint),
            Just(Command::ClearRallyPoint),
            Just(Command::CancelPatrol),
            arb_lane_x().prop_map(Command::SetVanguardPoint),
            (-20i32..=80).prop_map(Command::SetVanguardPercentage),
            arb_strategy().prop_map(Command::SetStrategy),
        ]
    }

    /// A script of commands spread over the first `frames` frames.
    pub fn arb_script(max_len: usize, frames: u64) -> impl Strategy<Value = Vec<ScriptedCommand>> {
        proptest::collection::vec(
            (0..frames.max(1), arb_faction(), arb_command())
                .prop_map(|(frame, faction, command)| ScriptedCommand::new(frame, faction, command)),
            0..max_len,
        )
    }
}

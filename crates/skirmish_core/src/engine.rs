//! The match engine.
//!
//! [`GameEngine`] owns one [`World`] together with the services it runs
//! against: the injected [`EngineHooks`], the [`RandomSource`], the
//! opposing-side AI in single-player matches and the [`RemoteBridge`] in
//! peer-synchronized ones. Hosts call [`GameEngine::update`] once per
//! frame and feed input through the command surface.
//!
//! # Tick order
//!
//! While the match runs, every update executes the subsystems in a fixed
//! order:
//!
//! 1. Frame counter and screen-shake decay
//! 2. Ability timers
//! 3. Opposing AI (single-player only)
//! 4. Production queues
//! 5. Hazards
//! 6. Units (including death sequencing and removal)
//! 7. Projectiles
//! 8. Particles
//! 9. Ability effects (scheduled barrage shells, storms)
//! 10. Towers
//! 11. Passive income
//! 12. Lifecycle check
//!
//! Once the match is decided only particles keep moving.
//!
//! # Example
//!
//! ```
//! use skirmish_core::prelude::*;
//!
//! let mut engine = GameEngine::new(
//!     MatchConfig::default(),
//!     MatchMode::SinglePlayer,
//!     Box::new(NoopHooks),
//! )
//! .unwrap();
//! let _ = engine.start();
//! assert!(engine.queue_unit(Archetype::Miner).is_applied());
//! for _ in 0..120 {
//!     engine.update();
//! }
//! assert_eq!(engine.snapshot().player.population_used, 1);
//! ```

use serde::{Deserialize, Serialize};

use crate::abilities::{cast_ability, update_abilities, AbilityKind};
use crate::ai::OpposingAi;
use crate::archetypes::Archetype;
use crate::bridge::{BridgeOutcome, RemoteAction, RemoteBridge};
use crate::combat::max_base_hp;
use crate::command::Command;
use crate::components::{Particle, ParticleKind};
use crate::config::MatchConfig;
use crate::defense::{buy_tower, update_towers, Structure};
use crate::economy::{passive_income, session_upgrade_cost};
use crate::error::{CommandOutcome, GameError, Rejection, Result};
use crate::factions::Faction;
use crate::hazards::update_hazards;
use crate::hooks::EngineHooks;
use crate::math::{fx, ratio, Fixed};
use crate::production::{dismiss_unit, queue_unit, update_production};
use crate::projectiles::update_projectiles;
use crate::random::{RandomSource, SeededRandom};
use crate::snapshot::MatchSnapshot;
use crate::units::update_units;
use crate::upgrades::{PermanentUpgrades, UpgradeKind, UpgradeState};
use crate::world::{MatchPhase, World};

/// Frames between firework bursts after a victory.
const FIREWORK_INTERVAL: u64 = 20;
/// Particles per firework burst.
const FIREWORK_PARTICLES: usize = 8;
/// Lifetime of a firework particle.
const FIREWORK_LIFE: u32 = 60;

/// Who controls the opposing faction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMode {
    /// The built-in AI drives the opponent.
    SinglePlayer,
    /// A remote peer drives the opponent through replicated actions.
    PeerSynced {
        /// This peer's id, used to drop echoes.
        local_id: String,
    },
}

impl MatchMode {
    /// Whether a remote peer drives the opponent.
    #[must_use]
    pub const fn is_peer_synced(&self) -> bool {
        matches!(self, Self::PeerSynced { .. })
    }
}

/// On-disk form of a running match.
#[derive(Serialize, Deserialize)]
struct SavedMatch {
    world: World,
    seed: u64,
    draws: u64,
    ai: Option<OpposingAi>,
    bridge: Option<RemoteBridge>,
    aftermath_frames: u64,
}

/// A single match and everything needed to advance it.
pub struct GameEngine {
    world: World,
    mode: MatchMode,
    hooks: Box<dyn EngineHooks>,
    random: Box<dyn RandomSource>,
    ai: Option<OpposingAi>,
    bridge: Option<RemoteBridge>,
    aftermath_frames: u64,
}

impl std::fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameEngine")
            .field("mode", &self.mode)
            .field("frame", &self.world.frame)
            .field("phase", &self.world.phase)
            .field("ai", &self.ai)
            .finish_non_exhaustive()
    }
}

impl GameEngine {
    /// Create a match that has not started yet.
    ///
    /// The random source is seeded from `config.seed`. In single-player
    /// matches the opponent is driven by an [`OpposingAi`] at
    /// `config.opponent_elo`.
    pub fn new(config: MatchConfig, mode: MatchMode, hooks: Box<dyn EngineHooks>) -> Result<Self> {
        config.validate()?;
        let random = Box::new(SeededRandom::from_seed(config.seed));
        let (ai, bridge) = match &mode {
            MatchMode::SinglePlayer => (Some(OpposingAi::new(Faction::Opponent, config.opponent_elo)), None),
            MatchMode::PeerSynced { local_id } => (None, Some(RemoteBridge::new(local_id.clone()))),
        };
        tracing::info!(?mode, seed = config.seed, "Match created");
        Ok(Self {
            world: World::new(config),
            mode,
            hooks,
            random,
            ai,
            bridge,
            aftermath_frames: 0,
        })
    }

    /// Start from a faction's permanent upgrade levels.
    ///
    /// The base is rebuilt at full health for the upgraded maximum.
    #[must_use]
    pub fn with_upgrades(mut self, faction: Faction, permanent: &PermanentUpgrades) -> Self {
        self.world.upgrades[faction] = UpgradeState::from_permanent(permanent);
        let level = self.world.upgrades[faction].level(UpgradeKind::BaseHp);
        self.world.structures[faction] = Structure::new(max_base_hp(self.world.config.base_hp, level));
        self
    }

    /// Replace the random source.
    #[must_use]
    pub fn with_random(mut self, random: Box<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Replace (or remove, with `None`) the opposing AI.
    #[must_use]
    pub fn with_ai(mut self, ai: Option<OpposingAi>) -> Self {
        self.ai = ai;
        self
    }

    // --- lifecycle ---

    /// Begin the match.
    pub fn start(&mut self) -> CommandOutcome {
        if self.world.phase != MatchPhase::NotStarted {
            return Rejection::NothingToDo.into();
        }
        self.world.phase = MatchPhase::Running;
        tracing::info!(mode = ?self.mode, "Match started");
        CommandOutcome::Applied
    }

    /// Pause or resume. Unavailable when a remote peer shares the match.
    pub fn toggle_pause(&mut self) -> CommandOutcome {
        if self.mode.is_peer_synced() {
            return Rejection::Unavailable.into();
        }
        self.world.phase = match self.world.phase {
            MatchPhase::Running => MatchPhase::Paused,
            MatchPhase::Paused => MatchPhase::Running,
            _ => return Rejection::NotRunning.into(),
        };
        tracing::debug!(phase = ?self.world.phase, frame = self.world.frame, "Pause toggled");
        CommandOutcome::Applied
    }

    /// Advance one frame.
    pub fn update(&mut self) {
        match self.world.phase {
            MatchPhase::Running => self.step(),
            MatchPhase::Victory | MatchPhase::Defeat => self.update_aftermath(),
            MatchPhase::NotStarted | MatchPhase::Paused => {}
        }
    }

    fn step(&mut self) {
        self.world.frame += 1;
        self.world.decay_shake();

        for (_, timers) in self.world.abilities.timers.iter_mut() {
            timers.tick();
        }

        if let Some(mut ai) = self.ai.take() {
            for command in ai.think(&self.world, self.random.as_mut()) {
                let _ = self.dispatch(ai.faction, command, false);
            }
            self.ai = Some(ai);
        }

        let hooks = self.hooks.as_mut();
        let random = self.random.as_mut();
        let world = &mut self.world;
        update_production(world, hooks, random);
        update_hazards(world, hooks);
        update_units(world, hooks);
        update_projectiles(world, hooks);
        world.registry.update_particles();
        update_abilities(world);
        update_towers(world, hooks);
        pay_passive_income(world);

        self.check_lifecycle();

        if tracing::enabled!(tracing::Level::TRACE) {
            tracing::trace!(frame = self.world.frame, hash = self.world.state_hash(), "Tick");
        }
        let interval = u64::from(self.world.config.snapshot_interval.max(1));
        if self.world.frame % interval == 0 {
            let snapshot = MatchSnapshot::capture(&self.world);
            self.hooks.on_snapshot(&snapshot);
        }
    }

    fn check_lifecycle(&mut self) {
        let outcome = if self.world.structures[Faction::Player].is_destroyed() {
            MatchPhase::Defeat
        } else if self.world.structures[Faction::Opponent].is_destroyed() {
            MatchPhase::Victory
        } else {
            return;
        };
        self.world.phase = outcome;
        tracing::info!(
            ?outcome,
            frame = self.world.frame,
            player_kills = self.world.stats[Faction::Player].kills,
            opponent_kills = self.world.stats[Faction::Opponent].kills,
            "Match ended"
        );
        self.hooks.on_match_end(outcome);
        if outcome == MatchPhase::Victory {
            self.launch_fireworks();
        }
    }

    fn update_aftermath(&mut self) {
        self.aftermath_frames += 1;
        self.world.registry.update_particles();
        if self.world.phase == MatchPhase::Victory && self.aftermath_frames % FIREWORK_INTERVAL == 0 {
            self.launch_fireworks();
        }
    }

    fn launch_fireworks(&mut self) {
        let center = self.world.base_x(Faction::Opponent);
        for _ in 0..FIREWORK_PARTICLES {
            let x = center + fx(self.random.range_inclusive(-200, 200));
            let y = fx(self.random.range_inclusive(120, 300));
            let vx = ratio(self.random.range_inclusive(-20, 20), 10);
            let vy = ratio(self.random.range_inclusive(-10, 20), 10);
            self.world.registry.push_particle(Particle {
                x,
                y,
                vx,
                vy,
                life: FIREWORK_LIFE,
                kind: ParticleKind::Firework,
            });
        }
    }

    // --- command surface ---

    /// Apply a command on behalf of a faction.
    ///
    /// Successful local spawns, casts and tower purchases are replicated in
    /// peer-synchronized matches.
    pub fn apply_command(&mut self, faction: Faction, command: Command) -> CommandOutcome {
        let replicate = faction == Faction::Player && self.mode.is_peer_synced();
        self.dispatch(faction, command, replicate)
    }

    fn dispatch(&mut self, faction: Faction, command: Command, replicate: bool) -> CommandOutcome {
        let outcome = match command {
            Command::QueueUnit(archetype) => queue_unit(&mut self.world, faction, archetype),
            Command::DismissUnit(archetype) => dismiss_unit(&mut self.world, faction, archetype),
            Command::BuyTower => buy_tower(&mut self.world, faction),
            Command::CastAbility { ability, x } => cast_ability(
                &mut self.world,
                self.hooks.as_mut(),
                self.random.as_mut(),
                faction,
                ability,
                x,
            ),
            _ => self.apply_order(faction, command),
        };
        match outcome {
            CommandOutcome::Applied => {
                if replicate {
                    if let Some(bridge) = self.bridge.as_mut() {
                        bridge.record(&command, self.world.frame);
                    }
                }
            }
            CommandOutcome::Rejected(reason) => {
                tracing::debug!(%faction, command = command.label(), %reason, "Command rejected");
            }
        }
        outcome
    }

    fn apply_order(&mut self, faction: Faction, command: Command) -> CommandOutcome {
        if self.world.phase.is_terminal() {
            return Rejection::NotRunning.into();
        }
        if let Command::SetRallyPoint(x) | Command::SetPatrolPoint(x) | Command::SetVanguardPoint(x) = command {
            if !self.world.on_lane(x) {
                return Rejection::OutOfBounds.into();
            }
        }
        let orders = &mut self.world.orders[faction];
        match command {
            Command::SetRallyPoint(x) => orders.set_rally_point(x),
            Command::SetPatrolPoint(x) => {
                if !orders.set_patrol_point(x) {
                    return Rejection::NoRallyPoint.into();
                }
            }
            Command::ClearRallyPoint => orders.clear_rally_point(),
            Command::CancelPatrol => {
                if !orders.cancel_patrol() {
                    return Rejection::NothingToDo.into();
                }
            }
            Command::SetVanguardPoint(x) => orders.vanguard_point = Some(x),
            Command::SetVanguardPercentage(percent) => {
                let applied = orders.set_vanguard_percent(percent);
                tracing::debug!(%faction, requested = percent, applied, "Vanguard share set");
            }
            Command::SetStrategy(strategy) => orders.strategy = strategy,
            Command::QueueUnit(_) | Command::DismissUnit(_) | Command::BuyTower | Command::CastAbility { .. } => {
                return Rejection::NothingToDo.into();
            }
        }
        CommandOutcome::Applied
    }

    /// Queue a unit for the local player.
    pub fn queue_unit(&mut self, archetype: Archetype) -> CommandOutcome {
        self.apply_command(Faction::Player, Command::QueueUnit(archetype))
    }

    /// Dismiss the local player's latest queued unit of an archetype.
    pub fn dismiss_unit(&mut self, archetype: Archetype) -> CommandOutcome {
        self.apply_command(Faction::Player, Command::DismissUnit(archetype))
    }

    /// Buy a tower for the local player.
    pub fn buy_tower(&mut self) -> CommandOutcome {
        self.apply_command(Faction::Player, Command::BuyTower)
    }

    /// Cast a barrage for the local player.
    pub fn use_ability_barrage(&mut self, x: Fixed) -> CommandOutcome {
        self.cast(AbilityKind::Barrage, x)
    }

    /// Cast a chain strike for the local player.
    pub fn use_ability_chain(&mut self, x: Fixed) -> CommandOutcome {
        self.cast(AbilityKind::ChainStrike, x)
    }

    /// Cast a freeze for the local player.
    pub fn use_ability_freeze(&mut self, x: Fixed) -> CommandOutcome {
        self.cast(AbilityKind::Freeze, x)
    }

    fn cast(&mut self, ability: AbilityKind, x: Fixed) -> CommandOutcome {
        self.apply_command(Faction::Player, Command::CastAbility { ability, x })
    }

    /// Set the local rally point.
    pub fn set_rally_point(&mut self, x: Fixed) -> CommandOutcome {
        self.apply_command(Faction::Player, Command::SetRallyPoint(x))
    }

    /// Set the local patrol point.
    pub fn set_patrol_point(&mut self, x: Fixed) -> CommandOutcome {
        self.apply_command(Faction::Player, Command::SetPatrolPoint(x))
    }

    /// Clear the local rally point.
    pub fn clear_rally_point(&mut self) -> CommandOutcome {
        self.apply_command(Faction::Player, Command::ClearRallyPoint)
    }

    /// Stop the local patrol.
    pub fn cancel_patrol(&mut self) -> CommandOutcome {
        self.apply_command(Faction::Player, Command::CancelPatrol)
    }

    /// Set the local vanguard point.
    pub fn set_vanguard_point(&mut self, x: Fixed) -> CommandOutcome {
        self.apply_command(Faction::Player, Command::SetVanguardPoint(x))
    }

    /// Set the local vanguard share in percent.
    pub fn set_vanguard_percentage(&mut self, percent: i32) -> CommandOutcome {
        self.apply_command(Faction::Player, Command::SetVanguardPercentage(percent))
    }

    // --- upgrades ---

    /// Buy the next level of a session-only upgrade with gold.
    pub fn purchase_session_upgrade(&mut self, faction: Faction, kind: UpgradeKind) -> CommandOutcome {
        let level = self.world.upgrades[faction].level(kind);
        let Some(cost) = session_upgrade_cost(kind, level) else {
            return Rejection::Unavailable.into();
        };
        if !self.world.phase.is_running() {
            return Rejection::NotRunning.into();
        }
        if !self.world.charge(faction, cost) {
            return Rejection::InsufficientGold.into();
        }
        self.world.upgrades[faction].set(kind, level + 1);
        tracing::debug!(%faction, ?kind, level = level + 1, cost, "Session upgrade purchased");
        CommandOutcome::Applied
    }

    /// Set an upgrade level directly.
    ///
    /// Raising base HP keeps the damage already taken: the current HP moves
    /// by the same amount as the maximum.
    pub fn set_upgrade_level(&mut self, faction: Faction, kind: UpgradeKind, level: u32) {
        self.world.upgrades[faction].set(kind, level);
        if kind == UpgradeKind::BaseHp {
            let max = max_base_hp(self.world.config.base_hp, level);
            self.world.structures[faction].rescale(max);
        }
    }

    // --- remote peers ---

    /// Drain actions waiting to be sent to the remote peer.
    pub fn take_outgoing_actions(&mut self) -> Vec<RemoteAction> {
        self.bridge
            .as_mut()
            .map(RemoteBridge::take_outgoing)
            .unwrap_or_default()
    }

    /// Apply an action received from the remote peer to the opposing
    /// faction. Remote actions are never replicated back.
    pub fn apply_remote_action(&mut self, action: &RemoteAction) -> BridgeOutcome {
        let lane_length = self.world.config.lane_length;
        let Some(bridge) = self.bridge.as_mut() else {
            return BridgeOutcome::Rejected(Rejection::Unavailable);
        };
        let command = match bridge.accept(action, lane_length) {
            Ok(command) => command,
            Err(dropped) => return dropped,
        };
        match self.dispatch(Faction::Opponent, command, false) {
            CommandOutcome::Applied => BridgeOutcome::Applied,
            CommandOutcome::Rejected(reason) => BridgeOutcome::Rejected(reason),
        }
    }

    // --- state ---

    /// The match state.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// The match state, mutably. Meant for hosts setting up scenarios.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Who drives the opponent.
    #[must_use]
    pub const fn mode(&self) -> &MatchMode {
        &self.mode
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> MatchPhase {
        self.world.phase
    }

    /// Frames simulated.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.world.frame
    }

    /// The opposing AI, if one drives the opponent.
    #[must_use]
    pub const fn ai(&self) -> Option<&OpposingAi> {
        self.ai.as_ref()
    }

    /// Capture a snapshot of the current state.
    #[must_use]
    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot::capture(&self.world)
    }

    /// Hash of the deterministic state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.world.state_hash()
    }

    /// Serialize the match so it can be resumed later.
    ///
    /// Outgoing actions not yet taken are not saved.
    pub fn save_state(&self) -> Result<Vec<u8>> {
        let saved = SavedMatch {
            world: self.world.clone(),
            seed: self.world.config.seed,
            draws: self.random.draws(),
            ai: self.ai.clone(),
            bridge: self.bridge.clone(),
            aftermath_frames: self.aftermath_frames,
        };
        bincode::serialize(&saved).map_err(|e| GameError::Serialization(format!("Failed to save match: {e}")))
    }

    /// Resume a match saved with [`GameEngine::save_state`].
    ///
    /// The random source is restored to the saved position of the seeded
    /// stream; hooks and mode are kept.
    pub fn load_state(&mut self, bytes: &[u8]) -> Result<()> {
        let saved: SavedMatch = bincode::deserialize(bytes)
            .map_err(|e| GameError::Serialization(format!("Failed to load match: {e}")))?;
        saved.world.config.validate()?;
        self.world = saved.world;
        self.random = Box::new(SeededRandom::resume(saved.seed, saved.draws));
        self.ai = saved.ai;
        self.bridge = saved.bridge;
        self.aftermath_frames = saved.aftermath_frames;
        tracing::info!(frame = self.world.frame, "Match restored");
        Ok(())
    }
}

fn pay_passive_income(world: &mut World) {
    let interval = u64::from(world.config.passive_gold_interval.max(1));
    if world.frame % interval != 0 {
        return;
    }
    for faction in Faction::ALL {
        let level = world.upgrades[faction].level(UpgradeKind::PassiveGold);
        let income = passive_income(&world.config, level);
        world.treasuries[faction].credit(income);
    }
}

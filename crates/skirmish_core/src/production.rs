//! Per-faction production queues.
//!
//! Each faction has one strict FIFO lane: only the head item counts down,
//! and when it reaches zero it pops and becomes a live unit. Items behind
//! the head wait untouched.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::archetypes::Archetype;
use crate::combat::production_frames;
use crate::error::{CommandOutcome, Rejection};
use crate::factions::Faction;
use crate::hooks::EngineHooks;
use crate::random::RandomSource;
use crate::upgrades::UpgradeKind;
use crate::world::World;

/// Visual vertical spread of spawned units.
pub const SPAWN_Y_SPREAD: i32 = 12;

/// An order waiting to become a unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpawnQueueItem {
    /// The archetype being produced.
    pub archetype: Archetype,
    /// Total production time in frames.
    pub total_frames: u32,
    /// Frames left before the unit spawns.
    pub remaining_frames: u32,
    /// Owning faction.
    pub faction: Faction,
}

impl SpawnQueueItem {
    /// Create a new item that has not started counting down.
    #[must_use]
    pub const fn new(archetype: Archetype, total_frames: u32, faction: Faction) -> Self {
        Self {
            archetype,
            total_frames,
            remaining_frames: total_frames,
            faction,
        }
    }

    /// Progress as a percentage (0-100).
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.total_frames == 0 {
            100
        } else {
            (self.total_frames - self.remaining_frames) * 100 / self.total_frames
        }
    }

    /// Count down one frame.
    pub fn tick(&mut self) {
        self.remaining_frames = self.remaining_frames.saturating_sub(1);
    }

    /// Whether the countdown has finished.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.remaining_frames == 0
    }
}

/// One faction's production queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SpawnQueue {
    items: VecDeque<SpawnQueueItem>,
}

impl SpawnQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append an item at the back.
    pub fn push(&mut self, item: SpawnQueueItem) {
        self.items.push_back(item);
    }

    /// The item currently in production.
    #[must_use]
    pub fn current(&self) -> Option<&SpawnQueueItem> {
        self.items.front()
    }

    /// Iterate items front to back.
    pub fn iter(&self) -> impl Iterator<Item = &SpawnQueueItem> {
        self.items.iter()
    }

    /// Remove the most recently queued item of an archetype.
    pub fn remove_latest(&mut self, archetype: Archetype) -> Option<SpawnQueueItem> {
        let pos = self.items.iter().rposition(|item| item.archetype == archetype)?;
        self.items.remove(pos)
    }

    /// Population reserved by queued items.
    #[must_use]
    pub fn reserved_population(&self) -> u32 {
        self.items.iter().map(|item| item.archetype.population()).sum()
    }

    /// Advance the head item by one frame.
    ///
    /// Returns the finished item when its countdown completes; the next
    /// item starts counting on the following frame.
    pub fn advance(&mut self) -> Option<SpawnQueueItem> {
        let head = self.items.front_mut()?;
        head.tick();
        if head.is_complete() {
            self.items.pop_front()
        } else {
            None
        }
    }
}

/// Queue a unit for production.
///
/// Rejected while the match is not running, when the population (living
/// plus queued) would exceed the cap, and when the local player cannot
/// afford it.
pub fn queue_unit(world: &mut World, faction: Faction, archetype: Archetype) -> CommandOutcome {
    if !world.phase.is_running() {
        return Rejection::NotRunning.into();
    }
    let used = world.registry.population_used(faction);
    if used + archetype.population() > world.population_cap(faction) {
        return Rejection::PopulationCap.into();
    }
    if !world.charge(faction, archetype.cost()) {
        return Rejection::InsufficientGold.into();
    }

    let frames = production_frames(
        archetype.profile().spawn_frames,
        world.upgrades[faction].level(UpgradeKind::SpawnSpeed),
    );
    world
        .registry
        .queue_mut(faction)
        .push(SpawnQueueItem::new(archetype, frames, faction));
    tracing::debug!(%faction, archetype = archetype.name(), frames, "Unit queued");
    CommandOutcome::Applied
}

/// Cancel the most recently queued unit of an archetype and refund it.
///
/// Allowed while paused; a finished match keeps its queues as they were.
pub fn dismiss_unit(world: &mut World, faction: Faction, archetype: Archetype) -> CommandOutcome {
    if world.phase.is_terminal() {
        return Rejection::NotRunning.into();
    }
    let Some(item) = world.registry.queue_mut(faction).remove_latest(archetype) else {
        return Rejection::NothingToDo.into();
    };
    world.treasuries[faction].refund(item.archetype.cost());
    tracing::debug!(%faction, archetype = archetype.name(), "Unit dismissed");
    CommandOutcome::Applied
}

/// Advance both queues one frame and spawn finished units at their base.
pub fn update_production(world: &mut World, hooks: &mut dyn EngineHooks, random: &mut dyn RandomSource) {
    for faction in Faction::ALL {
        let Some(item) = world.registry.queue_mut(faction).advance() else {
            continue;
        };
        let level = world.upgrades[faction].unit_level(item.archetype);
        let base = world.base_x(faction);
        let id = world.spawn_unit(faction, item.archetype, base, level);
        world.stats[faction].units_spawned += 1;
        if let Some(unit) = world.registry.unit_mut(id) {
            unit.y_offset = random.range_inclusive(-SPAWN_Y_SPREAD, SPAWN_Y_SPREAD);
            hooks.on_unit_spawned(unit);
        }
        tracing::debug!(%faction, id, archetype = item.archetype.name(), level, "Unit spawned");
    }
}

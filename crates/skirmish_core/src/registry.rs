//! Storage for every live entity of a match.
//!
//! Units are kept in a `Vec` ordered by id. Ids are handed out
//! monotonically, so insertion keeps the order and lookups use binary
//! search; iteration is therefore always in deterministic id order.

use serde::{Deserialize, Serialize};

use crate::archetypes::Archetype;
use crate::components::{Hazard, HazardId, Particle, Projectile, ProjectileId, Unit, UnitId};
use crate::factions::{Faction, PerFaction};
use crate::production::SpawnQueue;

/// Owns units, projectiles, particles, hazards and spawn queues.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRegistry {
    units: Vec<Unit>,
    projectiles: Vec<Projectile>,
    particles: Vec<Particle>,
    hazards: Vec<Hazard>,
    queues: PerFaction<SpawnQueue>,
    next_unit_id: UnitId,
    next_projectile_id: ProjectileId,
    next_hazard_id: HazardId,
}

impl EntityRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_unit_id: 1,
            next_projectile_id: 1,
            next_hazard_id: 1,
            ..Self::default()
        }
    }

    // --- units ---

    /// Insert a unit, assigning it a fresh id.
    pub fn insert_unit(&mut self, mut unit: Unit) -> UnitId {
        let id = self.next_unit_id;
        self.next_unit_id += 1;
        unit.id = id;
        self.units.push(unit);
        id
    }

    /// Look up a unit by id.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units
            .binary_search_by_key(&id, |u| u.id)
            .ok()
            .map(|idx| &self.units[idx])
    }

    /// Look up a unit mutably by id.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        match self.units.binary_search_by_key(&id, |u| u.id) {
            Ok(idx) => Some(&mut self.units[idx]),
            Err(_) => None,
        }
    }

    /// Look up a unit by id only if it is alive.
    #[must_use]
    pub fn living_unit(&self, id: UnitId) -> Option<&Unit> {
        self.unit(id).filter(|u| u.is_alive())
    }

    /// All units in id order.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// All units mutably, in id order.
    pub fn units_mut(&mut self) -> &mut [Unit] {
        &mut self.units
    }

    /// Living units of a faction.
    pub fn living_units(&self, faction: Faction) -> impl Iterator<Item = &Unit> {
        self.units
            .iter()
            .filter(move |u| u.faction == faction && u.is_alive())
    }

    /// Ids of every unit, in order.
    #[must_use]
    pub fn unit_ids(&self) -> Vec<UnitId> {
        self.units.iter().map(|u| u.id).collect()
    }

    /// Remove every unit for which `keep` returns false.
    pub fn retain_units(&mut self, keep: impl FnMut(&Unit) -> bool) {
        self.units.retain(keep);
    }

    /// Number of units, living or dying.
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Living units of a faction per archetype.
    #[must_use]
    pub fn population_counts(&self, faction: Faction) -> Vec<(Archetype, u32)> {
        Archetype::ALL
            .into_iter()
            .map(|archetype| {
                let count = self
                    .living_units(faction)
                    .filter(|u| u.archetype == archetype)
                    .count() as u32;
                (archetype, count)
            })
            .collect()
    }

    /// Population used by living and queued units of a faction.
    #[must_use]
    pub fn population_used(&self, faction: Faction) -> u32 {
        let living: u32 = self
            .living_units(faction)
            .map(|u| u.archetype.population())
            .sum();
        living + self.queues[faction].reserved_population()
    }

    // --- projectiles ---

    /// Insert a projectile, assigning it a fresh id.
    pub fn insert_projectile(&mut self, mut projectile: Projectile) -> ProjectileId {
        let id = self.next_projectile_id;
        self.next_projectile_id += 1;
        projectile.id = id;
        self.projectiles.push(projectile);
        id
    }

    /// All projectiles in id order.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Take every projectile out, leaving the list empty.
    ///
    /// Used by the projectile pass so it can mutate units while walking
    /// projectiles; survivors are put back with [`Self::restore_projectiles`].
    pub fn take_projectiles(&mut self) -> Vec<Projectile> {
        std::mem::take(&mut self.projectiles)
    }

    /// Put projectiles back, keeping ones spawned in the meantime.
    pub fn restore_projectiles(&mut self, mut survivors: Vec<Projectile>) {
        survivors.append(&mut self.projectiles);
        survivors.sort_by_key(|p| p.id);
        self.projectiles = survivors;
    }

    /// Remove every projectile for which `keep` returns false.
    pub fn retain_projectiles(&mut self, keep: impl FnMut(&Projectile) -> bool) {
        self.projectiles.retain(keep);
    }

    // --- particles ---

    /// Add a cosmetic particle.
    pub fn push_particle(&mut self, particle: Particle) {
        self.particles.push(particle);
    }

    /// All particles.
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Age every particle by one frame and drop expired ones.
    pub fn update_particles(&mut self) {
        for particle in &mut self.particles {
            particle.x += particle.vx;
            particle.y += particle.vy;
            particle.life = particle.life.saturating_sub(1);
        }
        self.particles.retain(|p| p.life > 0);
    }

    // --- hazards ---

    /// Insert a hazard, assigning it a fresh id.
    pub fn insert_hazard(&mut self, mut hazard: Hazard) -> HazardId {
        let id = self.next_hazard_id;
        self.next_hazard_id += 1;
        hazard.id = id;
        self.hazards.push(hazard);
        id
    }

    /// All hazards in id order.
    #[must_use]
    pub fn hazards(&self) -> &[Hazard] {
        &self.hazards
    }

    /// All hazards mutably.
    pub fn hazards_mut(&mut self) -> &mut [Hazard] {
        &mut self.hazards
    }

    /// Remove every hazard for which `keep` returns false.
    pub fn retain_hazards(&mut self, keep: impl FnMut(&Hazard) -> bool) {
        self.hazards.retain(keep);
    }

    // --- queues ---

    /// A faction's spawn queue.
    #[must_use]
    pub fn queue(&self, faction: Faction) -> &SpawnQueue {
        &self.queues[faction]
    }

    /// A faction's spawn queue, mutably.
    pub fn queue_mut(&mut self, faction: Faction) -> &mut SpawnQueue {
        &mut self.queues[faction]
    }
}

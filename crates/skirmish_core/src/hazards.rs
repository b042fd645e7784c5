//! Persistent area effects.
//!
//! A hazard pulses damage on the first frame of every pulse window, then
//! counts down. It is removed on the frame its countdown reaches zero.

use crate::components::UnitId;
use crate::hooks::EngineHooks;
use crate::math::scale_percent;
use crate::world::World;

/// Frames between damage pulses.
pub const HAZARD_PULSE_FRAMES: u32 = 30;

/// Pulse and age every hazard.
pub fn update_hazards(world: &mut World, hooks: &mut dyn EngineHooks) {
    let hazards = world.registry.hazards().to_vec();
    for hazard in &hazards {
        if hazard.remaining == 0 || hazard.remaining % HAZARD_PULSE_FRAMES != 0 {
            continue;
        }
        let victims: Vec<(UnitId, u32)> = world
            .registry
            .living_units(hazard.faction.opponent())
            .filter(|u| hazard.contains(u.x))
            .map(|u| (u.id, scale_percent(u.stats.max_hp, hazard.damage_percent).max(1)))
            .collect();
        for (id, damage) in victims {
            world.damage_unit(hooks, id, damage, hazard.faction);
        }
    }

    for hazard in world.registry.hazards_mut() {
        hazard.remaining = hazard.remaining.saturating_sub(1);
    }
    world.registry.retain_hazards(|h| h.remaining > 0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetypes::Archetype;
    use crate::components::Hazard;
    use crate::config::MatchConfig;
    use crate::factions::Faction;
    use crate::hooks::NoopHooks;
    use crate::math::fx;

    fn hazard(remaining: u32) -> Hazard {
        Hazard {
            id: 0,
            x: fx(1000),
            half_width: fx(80),
            remaining,
            duration: remaining,
            damage_percent: 3,
            slow_percent: 50,
            faction: Faction::Player,
        }
    }

    #[test]
    fn test_removed_exactly_when_countdown_hits_zero() {
        let mut world = World::new(MatchConfig::default());
        world.registry.insert_hazard(hazard(5));

        for expected in (1..5).rev() {
            update_hazards(&mut world, &mut NoopHooks);
            assert_eq!(world.registry.hazards()[0].remaining, expected);
        }
        update_hazards(&mut world, &mut NoopHooks);
        assert!(world.registry.hazards().is_empty());
    }

    #[test]
    fn test_pulses_percentage_of_max_hp() {
        let mut world = World::new(MatchConfig::default());
        let inside = world.spawn_unit(Faction::Opponent, Archetype::Hero, fx(1050), 0);
        let outside = world.spawn_unit(Faction::Opponent, Archetype::Hero, fx(1200), 0);
        let friendly = world.spawn_unit(Faction::Player, Archetype::Hero, fx(1000), 0);
        world.registry.insert_hazard(hazard(60));

        for _ in 0..60 {
            update_hazards(&mut world, &mut NoopHooks);
        }
        assert_eq!(world.registry.unit(inside).unwrap().stats.hp, 900 - 27 * 2);
        assert_eq!(world.registry.unit(outside).unwrap().stats.hp, 900);
        assert_eq!(world.registry.unit(friendly).unwrap().stats.hp, 900);
    }
}

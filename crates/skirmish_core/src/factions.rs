//! The two sides of a skirmish.

use serde::{Deserialize, Serialize};

/// One of the two simulation sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Faction {
    /// The local player, based at the low end of the lane.
    Player,
    /// The opposing side (AI or remote peer), based at the high end.
    Opponent,
}

impl Faction {
    /// Both factions in a fixed order.
    pub const ALL: [Self; 2] = [Self::Player, Self::Opponent];

    /// The other faction.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Opponent,
            Self::Opponent => Self::Player,
        }
    }

    /// Direction this faction's units advance along the lane (+1 or -1).
    #[must_use]
    pub const fn direction(self) -> i32 {
        match self {
            Self::Player => 1,
            Self::Opponent => -1,
        }
    }

    /// Short name for logs and reports.
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Opponent => "opponent",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Player => 0,
            Self::Opponent => 1,
        }
    }
}

impl std::fmt::Display for Faction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A value held once per faction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PerFaction<T> {
    values: [T; 2],
}

impl<T> PerFaction<T> {
    /// Build from explicit player/opponent values.
    pub fn new(player: T, opponent: T) -> Self {
        Self {
            values: [player, opponent],
        }
    }

    /// Build both values from a constructor.
    pub fn from_fn(mut f: impl FnMut(Faction) -> T) -> Self {
        Self::new(f(Faction::Player), f(Faction::Opponent))
    }

    /// Iterate `(faction, value)` pairs in [`Faction::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Faction, &T)> {
        Faction::ALL.into_iter().zip(self.values.iter())
    }

    /// Iterate `(faction, value)` pairs mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Faction, &mut T)> {
        Faction::ALL.into_iter().zip(self.values.iter_mut())
    }
}

impl<T> std::ops::Index<Faction> for PerFaction<T> {
    type Output = T;

    fn index(&self, faction: Faction) -> &T {
        &self.values[faction.index()]
    }
}

impl<T> std::ops::IndexMut<Faction> for PerFaction<T> {
    fn index_mut(&mut self, faction: Faction) -> &mut T {
        &mut self.values[faction.index()]
    }
}

//! Reactors as seen by the engine: read-only snapshots of world state.

use crate::fixed::Ticks;
use crate::id::{CompoundId, ReactorId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A room-local tile position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev (chessboard) distance to another position.
    pub fn chebyshev_distance(&self, other: &Position) -> u32 {
        (self.x - other.x)
            .unsigned_abs()
            .max((self.y - other.y).unsigned_abs())
    }

    /// Whether `other` is within `range` tiles, diagonals included.
    pub fn in_range(&self, other: &Position, range: u32) -> bool {
        self.chebyshev_distance(other) <= range
    }
}

// ---------------------------------------------------------------------------
// Reactor
// ---------------------------------------------------------------------------

/// A snapshot of one reactor taken at the start of a tick.
///
/// The world owns reactors; the engine only reads these snapshots and issues
/// actions by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reactor {
    pub id: ReactorId,
    pub position: Position,
    /// Compound currently loaded, `None` when empty.
    pub compound: Option<CompoundId>,
    /// Quantity of `compound` loaded.
    pub amount: u32,
    /// Ticks until the reactor can act again.
    pub cooldown: Ticks,
}

impl Reactor {
    /// An empty, ready reactor.
    pub fn new(id: ReactorId, position: Position) -> Self {
        Self {
            id,
            position,
            compound: None,
            amount: 0,
            cooldown: 0,
        }
    }

    /// Builder-style helper to set the loaded compound.
    pub fn loaded(mut self, compound: CompoundId, amount: u32) -> Self {
        if amount > 0 {
            self.compound = Some(compound);
            self.amount = amount;
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.amount == 0
    }

    pub fn is_ready(&self) -> bool {
        self.cooldown == 0
    }

    /// Quantity of `compound` held, zero if the reactor holds something else.
    pub fn holds(&self, compound: CompoundId) -> u32 {
        match self.compound {
            Some(c) if c == compound => self.amount,
            _ => 0,
        }
    }

    /// The compound actually present, ignoring stale labels on empty reactors.
    pub fn content(&self) -> Option<CompoundId> {
        if self.amount > 0 { self.compound } else { None }
    }

    pub fn free_capacity(&self, capacity: u32) -> u32 {
        capacity.saturating_sub(self.amount)
    }

    /// Whether `batch` units of `compound` fit: the reactor must be empty or
    /// already hold the same compound.
    pub fn can_accept(&self, compound: CompoundId, batch: u32, capacity: u32) -> bool {
        let compatible = match self.content() {
            None => true,
            Some(c) => c == compound,
        };
        compatible && self.free_capacity(capacity) >= batch
    }

    pub fn in_range_of(&self, other: &Reactor, range: u32) -> bool {
        self.position.in_range(&other.position, range)
    }
}

/// Index a reactor snapshot by id.
pub fn index_reactors(reactors: &[Reactor]) -> BTreeMap<ReactorId, &Reactor> {
    reactors.iter().map(|r| (r.id, r)).collect()
}

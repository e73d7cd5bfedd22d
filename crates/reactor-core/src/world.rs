//! The boundary between the engine and the world it orchestrates.
//!
//! The engine never moves material or creates reactors. Everything it knows
//! about a room comes through [`LabWorld`], and everything it does to a room
//! goes back through the two action primitives.

use crate::fixed::Ticks;
use crate::id::{CompoundId, ReactorId, RoomName};
use crate::reactor::Reactor;

/// Why a reactor action was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// The acting reactor has not finished its previous action.
    #[error("{0} is cooling down")]
    Cooldown(ReactorId),
    #[error("{0} does not exist")]
    NotFound(ReactorId),
    #[error("{0} is out of range")]
    OutOfRange(ReactorId),
    /// The loaded compounds do not form a known reaction in this orientation.
    #[error("invalid reagents")]
    InvalidReagents,
    #[error("{0} does not hold enough material")]
    NotEnoughResources(ReactorId),
    #[error("{0} has no room for the result")]
    Full(ReactorId),
}

impl ActionError {
    pub fn is_cooldown(&self) -> bool {
        matches!(self, ActionError::Cooldown(_))
    }
}

/// Queries and commands the engine needs from the surrounding simulation.
pub trait LabWorld {
    /// Current simulation tick.
    fn tick(&self) -> Ticks;

    /// Every reactor in the room, or `None` if the room is not visible.
    fn reactors(&self, room: &RoomName) -> Option<Vec<Reactor>>;

    /// Quantity of `compound` held outside reactors (storage plus portable
    /// stock).
    fn external_stock(&self, room: &RoomName, compound: CompoundId) -> u32;

    /// Combine the contents of `in1` and `in2` into `output`.
    fn react(&mut self, output: ReactorId, in1: ReactorId, in2: ReactorId)
    -> Result<(), ActionError>;

    /// Split the compound in `source`, sending its first reagent to `into_a`
    /// and its second reagent to `into_b`.
    fn reverse_react(
        &mut self,
        source: ReactorId,
        into_a: ReactorId,
        into_b: ReactorId,
    ) -> Result<(), ActionError>;
}

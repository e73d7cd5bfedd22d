//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`. [`SimWorld`] is
//! a small in-memory simulation of rooms, reactors and storage that
//! implements [`LabWorld`], so the engine can be driven end to end without a
//! real game.

use crate::engine::{LabEngine, RoomOutcome};
use crate::fixed::Ticks;
use crate::id::{CompoundId, ReactorId, RoomName};
use crate::oracle::{WorkReason, assign_inputs};
use crate::order::{Order, OrderKind};
use crate::reaction::{ReactionGraph, ReactionGraphBuilder};
use crate::reactor::{Position, Reactor};
use crate::world::{ActionError, LabWorld};
use std::collections::BTreeMap;

// ===========================================================================
// Fixtures
// ===========================================================================

/// The room most tests run in.
pub fn room() -> RoomName {
    RoomName::from("W1N1")
}

pub fn reactor_id(n: u32) -> ReactorId {
    ReactorId(n)
}

/// A small graph with a three-level chain:
///
/// ```text
/// H + O   -> OH
/// Z + K   -> ZK
/// U + L   -> UL
/// ZK + UL -> G
/// G + H   -> GH
/// GH + OH -> GH2O
/// ```
pub fn sample_graph() -> ReactionGraph {
    let mut b = ReactionGraphBuilder::new();
    b.reaction("H", "O", "OH")
        .reaction("Z", "K", "ZK")
        .reaction("U", "L", "UL")
        .reaction("ZK", "UL", "G")
        .reaction("G", "H", "GH")
        .reaction("GH", "OH", "GH2O");
    b.build().unwrap()
}

/// Three reactors where only reactor 3 is in range of both others:
/// one group `{1, 2 -> 3}`.
pub fn triangle_world(graph: &ReactionGraph) -> SimWorld {
    let mut world = SimWorld::new(graph.clone());
    let room = room();
    world.add_reactor(&room, reactor_id(1), Position::new(10, 10));
    world.add_reactor(&room, reactor_id(2), Position::new(12, 10));
    world.add_reactor(&room, reactor_id(3), Position::new(11, 11));
    world
}

/// Ten reactors packed around a central pair: the usual base lab cluster.
pub fn cluster_world(graph: &ReactionGraph) -> SimWorld {
    let mut world = SimWorld::new(graph.clone());
    let room = room();
    let positions = [
        (20, 20),
        (21, 20),
        (19, 19),
        (20, 19),
        (21, 19),
        (22, 19),
        (19, 21),
        (20, 21),
        (21, 21),
        (22, 21),
    ];
    for (i, (x, y)) in positions.into_iter().enumerate() {
        world.add_reactor(&room, reactor_id(i as u32 + 1), Position::new(x, y));
    }
    world
}

// ===========================================================================
// SimWorld
// ===========================================================================

#[derive(Debug, Clone, Default)]
struct SimRoom {
    reactors: BTreeMap<ReactorId, Reactor>,
    stock: BTreeMap<CompoundId, u32>,
    hidden: bool,
}

/// In-memory rooms with reactors and storage.
///
/// Reactions follow the graph in its registered orientation only: `react`
/// wants reagent A in `in1`, and `reverse_react` sends reagent A to
/// `into_a`. Anything else is refused with [`ActionError::InvalidReagents`],
/// which exercises the engine's swapped retry.
#[derive(Debug, Clone)]
pub struct SimWorld {
    graph: ReactionGraph,
    rooms: BTreeMap<RoomName, SimRoom>,
    tick: Ticks,
    pub capacity: u32,
    pub range: u32,
    /// Units consumed from each input and produced per reaction.
    pub batch: u32,
    /// Cooldown applied to the acting reactor after a reaction.
    pub reaction_cooldown: Ticks,
}

impl SimWorld {
    pub fn new(graph: ReactionGraph) -> Self {
        Self {
            graph,
            rooms: BTreeMap::new(),
            tick: 0,
            capacity: 3000,
            range: 2,
            batch: 5,
            reaction_cooldown: 5,
        }
    }

    pub fn graph(&self) -> &ReactionGraph {
        &self.graph
    }

    /// Compound id by name. Panics on unknown names.
    pub fn compound(&self, name: &str) -> CompoundId {
        self.graph.compound_id(name).unwrap()
    }

    // -- Clock --

    pub fn advance_tick(&mut self) {
        self.tick += 1;
        for room in self.rooms.values_mut() {
            for reactor in room.reactors.values_mut() {
                reactor.cooldown = reactor.cooldown.saturating_sub(1);
            }
        }
    }

    pub fn advance_ticks(&mut self, n: Ticks) {
        for _ in 0..n {
            self.advance_tick();
        }
    }

    // -- Layout of rooms --

    pub fn add_room(&mut self, room: &RoomName) {
        self.rooms.entry(room.clone()).or_default();
    }

    pub fn add_reactor(&mut self, room: &RoomName, id: ReactorId, position: Position) {
        self.rooms
            .entry(room.clone())
            .or_default()
            .reactors
            .insert(id, Reactor::new(id, position));
    }

    pub fn remove_reactor(&mut self, room: &RoomName, id: ReactorId) {
        if let Some(r) = self.rooms.get_mut(room) {
            r.reactors.remove(&id);
        }
    }

    pub fn move_reactor(&mut self, room: &RoomName, id: ReactorId, position: Position) {
        if let Some(reactor) = self.reactor_mut(room, id) {
            reactor.position = position;
        }
    }

    pub fn set_visible(&mut self, room: &RoomName, visible: bool) {
        if let Some(r) = self.rooms.get_mut(room) {
            r.hidden = !visible;
        }
    }

    pub fn reactor(&self, room: &RoomName, id: ReactorId) -> Option<&Reactor> {
        self.rooms.get(room)?.reactors.get(&id)
    }

    fn reactor_mut(&mut self, room: &RoomName, id: ReactorId) -> Option<&mut Reactor> {
        self.rooms.get_mut(room)?.reactors.get_mut(&id)
    }

    // -- Material --

    pub fn stock(&self, room: &RoomName, compound: CompoundId) -> u32 {
        self.rooms
            .get(room)
            .and_then(|r| r.stock.get(&compound).copied())
            .unwrap_or(0)
    }

    pub fn set_stock(&mut self, room: &RoomName, compound: CompoundId, amount: u32) {
        self.rooms
            .entry(room.clone())
            .or_default()
            .stock
            .insert(compound, amount);
    }

    /// Put material straight into a reactor, replacing anything else.
    pub fn load(&mut self, room: &RoomName, id: ReactorId, compound: CompoundId, amount: u32) {
        let capacity = self.capacity;
        if let Some(reactor) = self.reactor_mut(room, id) {
            let base = reactor.holds(compound);
            reactor.compound = Some(compound);
            reactor.amount = (base + amount).min(capacity);
        }
    }

    /// Move up to `amount` from storage into a reactor. Returns the quantity
    /// moved.
    pub fn stock_reactor(
        &mut self,
        room: &RoomName,
        id: ReactorId,
        compound: CompoundId,
        amount: u32,
    ) -> u32 {
        let capacity = self.capacity;
        let available = self.stock(room, compound);
        let Some(reactor) = self.reactor_mut(room, id) else {
            return 0;
        };
        if reactor.content().is_some_and(|c| c != compound) {
            return 0;
        }
        let moved = amount.min(available).min(reactor.free_capacity(capacity));
        if moved == 0 {
            return 0;
        }
        reactor.compound = Some(compound);
        reactor.amount += moved;
        self.set_stock(room, compound, available - moved);
        moved
    }

    /// Empty a reactor into storage. Returns what was moved.
    pub fn unload(&mut self, room: &RoomName, id: ReactorId) -> Option<(CompoundId, u32)> {
        let reactor = self.reactor_mut(room, id)?;
        let compound = reactor.content()?;
        let amount = reactor.amount;
        reactor.compound = None;
        reactor.amount = 0;
        let held = self.stock(room, compound);
        self.set_stock(room, compound, held + amount);
        Some((compound, amount))
    }

    fn room_of(&self, id: ReactorId) -> Option<RoomName> {
        self.rooms
            .iter()
            .find(|(_, r)| r.reactors.contains_key(&id))
            .map(|(name, _)| name.clone())
    }

    fn ready(&self, room: &SimRoom, id: ReactorId) -> Result<Reactor, ActionError> {
        let reactor = room.reactors.get(&id).ok_or(ActionError::NotFound(id))?;
        if !reactor.is_ready() {
            return Err(ActionError::Cooldown(id));
        }
        Ok(reactor.clone())
    }

    fn peer(&self, room: &SimRoom, actor: &Reactor, id: ReactorId) -> Result<Reactor, ActionError> {
        let peer = room.reactors.get(&id).ok_or(ActionError::NotFound(id))?;
        if !peer.in_range_of(actor, self.range) {
            return Err(ActionError::OutOfRange(id));
        }
        Ok(peer.clone())
    }

    fn put(&mut self, room: &RoomName, id: ReactorId, compound: CompoundId, delta: i64) {
        if let Some(reactor) = self.reactor_mut(room, id) {
            let amount = (i64::from(reactor.amount) + delta).max(0) as u32;
            reactor.compound = (amount > 0).then_some(compound);
            reactor.amount = amount;
        }
    }
}

impl LabWorld for SimWorld {
    fn tick(&self) -> Ticks {
        self.tick
    }

    fn reactors(&self, room: &RoomName) -> Option<Vec<Reactor>> {
        let r = self.rooms.get(room).filter(|r| !r.hidden)?;
        Some(r.reactors.values().cloned().collect())
    }

    fn external_stock(&self, room: &RoomName, compound: CompoundId) -> u32 {
        self.stock(room, compound)
    }

    fn react(&mut self, output: ReactorId, in1: ReactorId, in2: ReactorId) -> Result<(), ActionError> {
        let room_name = self.room_of(output).ok_or(ActionError::NotFound(output))?;
        let room = &self.rooms[&room_name];
        let out = self.ready(room, output)?;
        let a = self.peer(room, &out, in1)?;
        let b = self.peer(room, &out, in2)?;
        let (Some(ca), Some(cb)) = (a.content(), b.content()) else {
            return Err(ActionError::InvalidReagents);
        };
        let product = self
            .graph
            .reactions()
            .iter()
            .find(|r| r.reagents == (ca, cb))
            .map(|r| r.product)
            .ok_or(ActionError::InvalidReagents)?;
        if a.amount < self.batch {
            return Err(ActionError::NotEnoughResources(in1));
        }
        if b.amount < self.batch {
            return Err(ActionError::NotEnoughResources(in2));
        }
        if !out.can_accept(product, self.batch, self.capacity) {
            return Err(ActionError::Full(output));
        }

        let batch = i64::from(self.batch);
        self.put(&room_name, in1, ca, -batch);
        self.put(&room_name, in2, cb, -batch);
        self.put(&room_name, output, product, batch);
        let cooldown = self.reaction_cooldown;
        if let Some(r) = self.reactor_mut(&room_name, output) {
            r.cooldown = cooldown;
        }
        Ok(())
    }

    fn reverse_react(
        &mut self,
        source: ReactorId,
        into_a: ReactorId,
        into_b: ReactorId,
    ) -> Result<(), ActionError> {
        let room_name = self.room_of(source).ok_or(ActionError::NotFound(source))?;
        let room = &self.rooms[&room_name];
        let src = self.ready(room, source)?;
        let a = self.peer(room, &src, into_a)?;
        let b = self.peer(room, &src, into_b)?;
        let compound = src.content().ok_or(ActionError::NotEnoughResources(source))?;
        let (ra, rb) = self
            .graph
            .find_direct_reagents(compound)
            .ok_or(ActionError::InvalidReagents)?;
        if src.amount < self.batch {
            return Err(ActionError::NotEnoughResources(source));
        }
        if a.content().is_some_and(|c| c != ra) || b.content().is_some_and(|c| c != rb) {
            return Err(ActionError::InvalidReagents);
        }
        if !a.can_accept(ra, self.batch, self.capacity) {
            return Err(ActionError::Full(into_a));
        }
        if !b.can_accept(rb, self.batch, self.capacity) {
            return Err(ActionError::Full(into_b));
        }

        let batch = i64::from(self.batch);
        self.put(&room_name, source, compound, -batch);
        self.put(&room_name, into_a, ra, batch);
        self.put(&room_name, into_b, rb, batch);
        let cooldown = self.reaction_cooldown;
        if let Some(r) = self.reactor_mut(&room_name, source) {
            r.cooldown = cooldown;
        }
        Ok(())
    }
}

// ===========================================================================
// Logistics stand-in
// ===========================================================================

/// Quantity a courier moves into a reactor per visit.
pub const COURIER_LOAD: u32 = 1000;

/// Service the room's first work reason the way a logistics agent would,
/// reporting deliveries back to the engine. Returns the reason serviced.
pub fn service_room(
    engine: &mut LabEngine,
    world: &mut SimWorld,
    room: &RoomName,
) -> Option<WorkReason> {
    let reason = engine.work_needed(&*world, room)?;
    let order = engine.active_order(room)?;
    match reason {
        WorkReason::PreEvacuation | WorkReason::Evacuation => {
            let ids: Vec<ReactorId> = world
                .reactors(room)
                .unwrap_or_default()
                .iter()
                .map(|r| r.id)
                .collect();
            for id in ids {
                unload_and_report(engine, world, room, &order, id);
            }
        }
        WorkReason::BlockingMaterial(id) | WorkReason::Unload(id) => {
            unload_and_report(engine, world, room, &order, id);
        }
        WorkReason::Restock(id) => match order.kind {
            OrderKind::Production => {
                let layout = engine.get_layout(&*world, room)?;
                let reactors = world.reactors(room)?;
                let group = layout.groups.iter().find(|g| g.is_input(id))?;
                let in1 = reactors.iter().find(|r| r.id == group.in1)?;
                let in2 = reactors.iter().find(|r| r.id == group.in2)?;
                let (_, reagent) = assign_inputs(in1, in2, order.reagents()?)
                    .into_iter()
                    .find(|(r, _)| r.id == id)?;
                world.stock_reactor(room, id, reagent, COURIER_LOAD);
            }
            OrderKind::Breakdown => {
                let moved = world.stock_reactor(room, id, order.compound, COURIER_LOAD);
                engine.record_delivery(room, order.compound, moved);
            }
        },
    }
    Some(reason)
}

fn unload_and_report(
    engine: &mut LabEngine,
    world: &mut SimWorld,
    room: &RoomName,
    order: &Order,
    id: ReactorId,
) {
    if let Some((compound, amount)) = world.unload(room, id)
        && order.kind == OrderKind::Production
    {
        engine.record_delivery(room, compound, amount);
    }
}

/// Alternate courier visits and engine passes, one tick at a time, until
/// the room has nothing left to do or `max_ticks` elapse. Returns the orders
/// completed, in completion order.
pub fn drive_room(
    engine: &mut LabEngine,
    world: &mut SimWorld,
    room: &RoomName,
    max_ticks: Ticks,
) -> Vec<Order> {
    let mut completed = Vec::new();
    for _ in 0..max_ticks {
        if engine.room_state(room).is_none_or(|s| s.is_idle()) {
            break;
        }
        service_room(engine, world, room);
        if let Some(summary) = engine.run(world) {
            for (name, outcome) in summary.outcomes {
                if let RoomOutcome::Completed(order) = outcome
                    && &name == room
                {
                    completed.push(order);
                }
            }
        }
        world.advance_tick();
    }
    completed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn react_respects_orientation_and_cooldown() {
        let mut world = triangle_world(&sample_graph());
        let (h, o, oh) = (world.compound("H"), world.compound("O"), world.compound("OH"));
        let room = room();
        world.load(&room, reactor_id(1), h, 100);
        world.load(&room, reactor_id(2), o, 100);

        assert_eq!(
            world.react(reactor_id(3), reactor_id(2), reactor_id(1)),
            Err(ActionError::InvalidReagents)
        );
        assert_eq!(world.react(reactor_id(3), reactor_id(1), reactor_id(2)), Ok(()));
        assert_eq!(world.reactor(&room, reactor_id(3)).unwrap().holds(oh), 5);
        assert_eq!(world.reactor(&room, reactor_id(1)).unwrap().amount, 95);
        assert_eq!(
            world.react(reactor_id(3), reactor_id(1), reactor_id(2)),
            Err(ActionError::Cooldown(reactor_id(3)))
        );
        world.advance_ticks(5);
        assert!(world.react(reactor_id(3), reactor_id(1), reactor_id(2)).is_ok());
    }

    #[test]
    fn reverse_react_splits_into_reagents() {
        let mut world = triangle_world(&sample_graph());
        let (h, o, oh) = (world.compound("H"), world.compound("O"), world.compound("OH"));
        let room = room();
        world.load(&room, reactor_id(3), oh, 7);

        assert!(world.reverse_react(reactor_id(3), reactor_id(1), reactor_id(2)).is_ok());
        assert_eq!(world.reactor(&room, reactor_id(1)).unwrap().holds(h), 5);
        assert_eq!(world.reactor(&room, reactor_id(2)).unwrap().holds(o), 5);
        assert_eq!(world.reactor(&room, reactor_id(3)).unwrap().holds(oh), 2);
    }

    #[test]
    fn storage_moves_in_and_out() {
        let mut world = triangle_world(&sample_graph());
        let h = world.compound("H");
        let room = room();
        world.set_stock(&room, h, 50);
        assert_eq!(world.stock_reactor(&room, reactor_id(1), h, 80), 50);
        assert_eq!(world.stock(&room, h), 0);
        assert_eq!(world.unload(&room, reactor_id(1)), Some((h, 50)));
        assert_eq!(world.stock(&room, h), 50);
        assert_eq!(world.unload(&room, reactor_id(1)), None);
    }

    #[test]
    fn hidden_room_has_no_reactors() {
        let mut world = triangle_world(&sample_graph());
        world.set_visible(&room(), false);
        assert!(world.reactors(&room()).is_none());
    }
}

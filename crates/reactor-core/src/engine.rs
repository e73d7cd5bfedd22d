//! The orchestration engine: owns the reaction graph, the layout resolver and
//! the durable store, and drives every room's active order.
//!
//! # Architecture
//!
//! The `LabEngine` owns:
//! - A [`ReactionGraph`] (static, shared by every room)
//! - A [`LabConfig`]
//! - A [`LabStore`] holding each room's [`RoomOrderState`] and layouts
//! - A [`LayoutResolver`] with its in-memory layout cache
//!
//! # Per-room pipeline
//!
//! Each `run_room()` call, for a room with an active order:
//! 1. **Repair** -- normalize fields an older record may lack
//! 2. **Timeout** -- drop the order if it outlived `stale_order_timeout`
//! 3. **Pre-evacuation** -- wait until every reactor is empty
//! 4. **Layout** -- resolve the production layout or breakdown group
//! 5. **Verdict** -- complete, evacuate, or resume the order
//! 6. **Execute** -- issue this tick's reactor actions
//! 7. **Re-check** -- complete the order if the actions finished it
//!
//! The engine never blocks; a room that has to wait simply reports why and
//! is looked at again on a later tick.

use crate::completion::{BreakdownPools, Verdict, breakdown_verdict, production_verdict};
use crate::config::LabConfig;
use crate::execution::{StepReport, run_breakdown, run_production};
use crate::fixed::{Ticks, scale_ceil};
use crate::id::{CompoundId, RoomName};
use crate::layout::{Group, Layout, LayoutResolver};
use crate::oracle::{WorkContext, WorkReason, work_needed};
use crate::order::{Order, OrderKind, OrderPhase, RoomOrderState};
use crate::reaction::ReactionGraph;
use crate::reactor::Reactor;
use crate::store::{LabStore, MemoryStore};
use crate::world::LabWorld;
use std::fmt;

// ---------------------------------------------------------------------------
// Errors and results
// ---------------------------------------------------------------------------

/// Why an order could not be created. Nothing is queued when these occur.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("no reaction path to {0}")]
    NoReactionPath(String),
    #[error("{0} cannot be broken down")]
    NotDecomposable(String),
    #[error("unknown compound {0:?}")]
    UnknownCompound(CompoundId),
    #[error("room {0} is not visible")]
    NoVisibility(RoomName),
    #[error("room {0} has no reactors")]
    NoReactors(RoomName),
    #[error("order amount must be positive")]
    ZeroAmount,
}

/// Confirmation that an order was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    pub room: RoomName,
    pub kind: OrderKind,
    /// Name of the requested compound.
    pub compound: String,
    pub amount: u32,
    /// Orders queued, prerequisites included.
    pub steps: usize,
    /// Whether the first of them became the room's active order.
    pub activated: bool,
}

impl fmt::Display for OrderReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.kind {
            OrderKind::Production => "produce",
            OrderKind::Breakdown => "break down",
        };
        write!(f, "{}: {verb} {} {}", self.room, self.amount, self.compound)?;
        if self.steps > 1 {
            write!(f, " ({} steps)", self.steps)?;
        }
        if !self.activated {
            f.write_str(", queued")?;
        }
        Ok(())
    }
}

/// What happened to one room this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomOutcome {
    /// No active order.
    Idle,
    /// The room could not be observed.
    NoVisibility,
    /// The active order is waiting for its reactors to be emptied.
    Blocked,
    /// No valid layout could be formed from the room's reactors.
    NoLayout,
    /// The order ran a step and remains active.
    Ran(StepReport),
    /// The order finished and was removed.
    Completed(Order),
    /// The order exceeded the stale order timeout and was dropped.
    TimedOut(Order),
}

/// Result of a throttled pass over every room.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub tick: Ticks,
    pub outcomes: Vec<(RoomName, RoomOutcome)>,
}

impl RunSummary {
    pub fn completed(&self) -> impl Iterator<Item = (&RoomName, &Order)> {
        self.outcomes.iter().filter_map(|(room, outcome)| match outcome {
            RoomOutcome::Completed(order) => Some((room, order)),
            _ => None,
        })
    }

    pub fn reactions(&self) -> u32 {
        self.outcomes
            .iter()
            .map(|(_, outcome)| match outcome {
                RoomOutcome::Ran(report) => report.reactions,
                _ => 0,
            })
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Drives lab orders for every room.
#[derive(Debug)]
pub struct LabEngine<S: LabStore = MemoryStore> {
    graph: ReactionGraph,
    config: LabConfig,
    store: S,
    layouts: LayoutResolver,
    last_run: Option<Ticks>,
}

impl LabEngine<MemoryStore> {
    /// An engine backed by a fresh in-memory store.
    pub fn new(graph: ReactionGraph, config: LabConfig) -> Self {
        Self::with_store(graph, config, MemoryStore::new())
    }
}

impl<S: LabStore> LabEngine<S> {
    pub fn with_store(graph: ReactionGraph, config: LabConfig, store: S) -> Self {
        let layouts = LayoutResolver::new(&config);
        Self {
            graph,
            config,
            store,
            layouts,
            last_run: None,
        }
    }

    pub fn graph(&self) -> &ReactionGraph {
        &self.graph
    }

    pub fn config(&self) -> &LabConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn layouts(&self) -> &LayoutResolver {
        &self.layouts
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // -----------------------------------------------------------------------
    // Order intake
    // -----------------------------------------------------------------------

    /// Queue production of `amount` of `product` in `room`, preceded by any
    /// prerequisite syntheses whose reagents are short in storage.
    ///
    /// Prerequisite steps are sized with the configured headroom; the final
    /// step gets exactly `amount`.
    pub fn start_order<W: LabWorld>(
        &mut self,
        world: &W,
        room: &RoomName,
        product: CompoundId,
        amount: u32,
    ) -> Result<OrderReceipt, OrderError> {
        self.check_request(world, room, product, amount)?;
        let name = self.graph.display_name(product);

        let chain = self.graph.build_reaction_chain(
            product,
            |c| world.external_stock(room, c),
            self.config.sufficiency_threshold,
        );
        if chain.is_empty() {
            return Err(OrderError::NoReactionPath(name));
        }

        let now = world.tick();
        let headroom = self.config.headroom();
        let last = chain.len() - 1;
        let orders: Vec<Order> = chain
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let step_amount = if i == last {
                    amount
                } else {
                    scale_ceil(amount, headroom)
                };
                Order::from_step(step, step_amount, now)
            })
            .collect();

        let steps = orders.len();
        let activated = self.enqueue(room, orders, now);
        tracing::info!(room = %room, compound = %name, amount, steps, activated, "production order queued");
        Ok(OrderReceipt {
            room: room.clone(),
            kind: OrderKind::Production,
            compound: name,
            amount,
            steps,
            activated,
        })
    }

    /// Queue breakdown of `amount` of `compound` into its two reagents.
    pub fn start_breakdown_order<W: LabWorld>(
        &mut self,
        world: &W,
        room: &RoomName,
        compound: CompoundId,
        amount: u32,
    ) -> Result<OrderReceipt, OrderError> {
        self.check_request(world, room, compound, amount)?;
        let name = self.graph.display_name(compound);
        let Some(reagents) = self.graph.find_direct_reagents(compound) else {
            return Err(OrderError::NotDecomposable(name));
        };

        let now = world.tick();
        let activated = self.enqueue(room, [Order::breakdown(compound, reagents, amount, now)], now);
        tracing::info!(room = %room, compound = %name, amount, activated, "breakdown order queued");
        Ok(OrderReceipt {
            room: room.clone(),
            kind: OrderKind::Breakdown,
            compound: name,
            amount,
            steps: 1,
            activated,
        })
    }

    fn check_request<W: LabWorld>(
        &self,
        world: &W,
        room: &RoomName,
        compound: CompoundId,
        amount: u32,
    ) -> Result<(), OrderError> {
        if amount == 0 {
            return Err(OrderError::ZeroAmount);
        }
        if !self.graph.contains(compound) {
            return Err(OrderError::UnknownCompound(compound));
        }
        match world.reactors(room) {
            None => Err(OrderError::NoVisibility(room.clone())),
            Some(reactors) if reactors.is_empty() => Err(OrderError::NoReactors(room.clone())),
            Some(_) => Ok(()),
        }
    }

    fn enqueue(&mut self, room: &RoomName, orders: impl IntoIterator<Item = Order>, now: Ticks) -> bool {
        let mut state = self.store.room_state(room).unwrap_or_default();
        let activated = state.enqueue(orders, now);
        self.store.put_room_state(room, state);
        self.layouts.invalidate(room);
        activated
    }

    // -----------------------------------------------------------------------
    // External reports and queries
    // -----------------------------------------------------------------------

    /// Apply a delivery report to the room's active order. Returns `true` if
    /// the order changed.
    pub fn record_delivery(&mut self, room: &RoomName, compound: CompoundId, amount: u32) -> bool {
        let Some(mut state) = self.store.room_state(room) else {
            return false;
        };
        let applied = state
            .active
            .as_mut()
            .is_some_and(|order| order.record_delivery(compound, amount));
        if applied {
            self.store.put_room_state(room, state);
        }
        applied
    }

    /// Drop the active order and everything queued behind it. Returns how
    /// many orders were dropped.
    pub fn cancel(&mut self, room: &RoomName) -> usize {
        let Some(mut state) = self.store.room_state(room) else {
            return 0;
        };
        let dropped = state.cancel();
        self.store.put_room_state(room, state);
        self.layouts.invalidate(room);
        if dropped > 0 {
            tracing::info!(room = %room, dropped, "orders cancelled");
        }
        dropped
    }

    pub fn room_state(&self, room: &RoomName) -> Option<RoomOrderState> {
        self.store.room_state(room)
    }

    pub fn active_order(&self, room: &RoomName) -> Option<Order> {
        self.store.room_state(room)?.active
    }

    /// The room's production layout, resolved through the cache tiers.
    pub fn get_layout<W: LabWorld>(&mut self, world: &W, room: &RoomName) -> Option<Layout> {
        let reactors = world.reactors(room)?;
        self.layouts.resolve(room, &reactors, &mut self.store, world.tick())
    }

    /// The room's breakdown group, resolved through the cache tiers.
    pub fn get_breakdown_layout<W: LabWorld>(&mut self, world: &W, room: &RoomName) -> Option<Group> {
        let reactors = world.reactors(room)?;
        self.layouts
            .resolve_breakdown(room, &reactors, &mut self.store, world.tick())
    }

    /// Forget the room's cached layouts; `full_clear` also deletes the
    /// persisted ones.
    pub fn clear_room_cache(&mut self, room: &RoomName, full_clear: bool) {
        self.layouts.clear_room(room, &mut self.store, full_clear);
    }

    pub fn labs_need_work<W: LabWorld>(&mut self, world: &W, room: &RoomName) -> bool {
        self.work_needed(world, room).is_some()
    }

    /// Why the room's reactors need a logistics visit, if they do.
    pub fn work_needed<W: LabWorld>(&mut self, world: &W, room: &RoomName) -> Option<WorkReason> {
        let mut order = self.active_order(room)?;
        order.repair(&self.graph);
        let reactors = world.reactors(room)?;
        let now = world.tick();

        let (layout, breakdown) = match (order.phase, order.kind) {
            (OrderPhase::Running, OrderKind::Production) => (
                self.layouts.resolve(room, &reactors, &mut self.store, now),
                None,
            ),
            (OrderPhase::Running, OrderKind::Breakdown) => (
                None,
                self.layouts
                    .resolve_breakdown(room, &reactors, &mut self.store, now),
            ),
            _ => (None, None),
        };
        let ctx = WorkContext {
            layout: layout.as_ref(),
            breakdown: breakdown.as_ref(),
            reactors: &reactors,
            config: &self.config,
        };
        work_needed(&order, &ctx, |c| world.external_stock(room, c))
    }

    // -----------------------------------------------------------------------
    // Tick driving
    // -----------------------------------------------------------------------

    /// Run every room with an order record, at most once per `run_interval`
    /// ticks. Returns `None` when throttled.
    pub fn run<W: LabWorld>(&mut self, world: &mut W) -> Option<RunSummary> {
        let now = world.tick();
        if let Some(last) = self.last_run
            && now.saturating_sub(last) < self.config.run_interval
        {
            return None;
        }
        self.last_run = Some(now);
        if self.layouts.sweep(now) {
            tracing::trace!(tick = now, "layout cache swept");
        }

        let mut summary = RunSummary {
            tick: now,
            outcomes: Vec::new(),
        };
        for room in self.store.rooms() {
            let outcome = self.run_room(world, &room);
            summary.outcomes.push((room, outcome));
        }
        Some(summary)
    }

    /// Advance one room's active order by one step.
    pub fn run_room<W: LabWorld>(&mut self, world: &mut W, room: &RoomName) -> RoomOutcome {
        let now = world.tick();
        let Some(mut state) = self.store.room_state(room) else {
            return RoomOutcome::Idle;
        };
        if state.active.is_none() && !state.promote_next(now) {
            return RoomOutcome::Idle;
        }
        let Some(mut order) = state.active.take() else {
            return RoomOutcome::Idle;
        };

        if order.repair(&self.graph) {
            tracing::debug!(room = %room, compound = %self.graph.display_name(order.compound), "repaired active order");
        }

        if let Some(limit) = self.config.stale_order_timeout
            && order.age(now) > limit
        {
            tracing::warn!(
                room = %room,
                compound = %self.graph.display_name(order.compound),
                age = order.age(now),
                "active order timed out, dropping"
            );
            self.finish(room, state, now);
            return RoomOutcome::TimedOut(order);
        }

        let Some(reactors) = world.reactors(room) else {
            self.park(room, state, order);
            return RoomOutcome::NoVisibility;
        };

        let outcome = match order.kind {
            OrderKind::Production => self.step_production(world, room, &mut order, &reactors, now),
            OrderKind::Breakdown => self.step_breakdown(world, room, &mut order, &reactors, now),
        };
        match outcome {
            Step::Done => {
                tracing::info!(room = %room, compound = %self.graph.display_name(order.compound), amount = order.amount, "order complete");
                self.finish(room, state, now);
                RoomOutcome::Completed(order)
            }
            Step::Blocked => {
                self.park(room, state, order);
                RoomOutcome::Blocked
            }
            Step::NoLayout => {
                tracing::debug!(room = %room, "no valid layout");
                self.park(room, state, order);
                RoomOutcome::NoLayout
            }
            Step::Ran(report) => {
                self.park(room, state, order);
                RoomOutcome::Ran(report)
            }
        }
    }

    fn step_production<W: LabWorld>(
        &mut self,
        world: &mut W,
        room: &RoomName,
        order: &mut Order,
        reactors: &[Reactor],
        now: Ticks,
    ) -> Step {
        let layout = self.layouts.resolve(room, reactors, &mut self.store, now);
        let verdict = production_verdict(order, layout.as_ref(), reactors);
        if matches!(verdict, Verdict::Complete | Verdict::ForceComplete) {
            return Step::Done;
        }
        if self.awaiting_empty_reactors(room, order, reactors) {
            return Step::Blocked;
        }
        let Some(layout) = layout else {
            return Step::NoLayout;
        };
        if verdict == Verdict::Evacuate {
            tracing::debug!(room = %room, "delivery complete, evacuating");
            order.phase = OrderPhase::Evacuating;
        }

        let report = run_production(world, room, order, &layout, reactors);
        let after = world.reactors(room).unwrap_or_else(|| reactors.to_vec());
        if production_verdict(order, Some(&layout), &after) == Verdict::Complete {
            return Step::Done;
        }
        Step::Ran(report)
    }

    fn step_breakdown<W: LabWorld>(
        &mut self,
        world: &mut W,
        room: &RoomName,
        order: &mut Order,
        reactors: &[Reactor],
        now: Ticks,
    ) -> Step {
        let group = self
            .layouts
            .resolve_breakdown(room, reactors, &mut self.store, now);
        let min_batch = self.config.min_batch;
        let pools = BreakdownPools::measure(
            order,
            group.as_ref(),
            reactors,
            world.external_stock(room, order.compound),
            min_batch,
        );
        let can_resume = order
            .last_restart
            .is_none_or(|at| now.saturating_sub(at) >= self.config.restart_cooldown);

        let verdict = breakdown_verdict(order, &pools, min_batch, can_resume);
        match verdict {
            Verdict::ForceComplete => {
                tracing::warn!(room = %room, compound = %self.graph.display_name(order.compound), "no material left anywhere, force-completing breakdown");
                return Step::Done;
            }
            Verdict::Complete => return Step::Done,
            _ => {}
        }
        if self.awaiting_empty_reactors(room, order, reactors) {
            return Step::Blocked;
        }
        let Some(group) = group else {
            return Step::NoLayout;
        };
        match verdict {
            Verdict::Evacuate => {
                tracing::debug!(room = %room, "breakdown reactions complete, evacuating");
                order.phase = OrderPhase::Evacuating;
            }
            Verdict::Resume => {
                tracing::info!(room = %room, processable = pools.processable_in_labs, "compound reappeared, restarting breakdown");
                order.phase = OrderPhase::Running;
                order.last_restart = Some(now);
            }
            _ => {}
        }

        let report = run_breakdown(world, room, order, &group, reactors, &self.config);
        let after = world.reactors(room).unwrap_or_else(|| reactors.to_vec());
        let pools = BreakdownPools::measure(
            order,
            Some(&group),
            &after,
            world.external_stock(room, order.compound),
            min_batch,
        );
        if matches!(
            breakdown_verdict(order, &pools, min_batch, false),
            Verdict::Complete | Verdict::ForceComplete
        ) {
            return Step::Done;
        }
        Step::Ran(report)
    }

    /// Pre-evacuation gate. Holds the order while any reactor has content,
    /// then moves it to running. Returns `true` while still waiting.
    fn awaiting_empty_reactors(&self, room: &RoomName, order: &mut Order, reactors: &[Reactor]) -> bool {
        if order.phase != OrderPhase::PreEvacuation {
            return false;
        }
        if let Some(busy) = reactors.iter().find(|r| !r.is_empty()) {
            tracing::debug!(room = %room, reactor = %busy.id, "waiting for reactors to empty");
            return true;
        }
        tracing::info!(room = %room, compound = %self.graph.display_name(order.compound), "reactors empty, order running");
        order.phase = OrderPhase::Running;
        false
    }

    /// Put the order back as active and persist the room.
    fn park(&mut self, room: &RoomName, mut state: RoomOrderState, order: Order) {
        state.active = Some(order);
        self.store.put_room_state(room, state);
    }

    /// Activate the next queued order and persist the room.
    fn finish(&mut self, room: &RoomName, mut state: RoomOrderState, now: Ticks) {
        self.layouts.invalidate(room);
        if state.promote_next(now)
            && let Some(next) = &state.active
        {
            tracing::info!(room = %room, compound = %self.graph.display_name(next.compound), "next order activated");
        }
        self.store.put_room_state(room, state);
    }
}

/// Internal result of one kind-specific step.
enum Step {
    Done,
    Blocked,
    NoLayout,
    Ran(StepReport),
}

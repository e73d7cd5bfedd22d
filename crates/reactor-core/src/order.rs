//! Orders and the per-room order queue.
//!
//! Each room has at most one active [`Order`] and a FIFO queue behind it.
//! Orders are long-lived persisted records, so every field added after the
//! first schema carries a serde default and [`Order::repair`] normalizes
//! whatever an older record left behind.

use crate::fixed::Ticks;
use crate::id::CompoundId;
use crate::reaction::{ChainStep, ReactionGraph};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// Kind and phase
// ---------------------------------------------------------------------------

/// Direction of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    /// Combine two reagents into a product.
    #[default]
    Production,
    /// Split a compound back into its two reagents.
    Breakdown,
}

/// Lifecycle phase of an active order. A completed order is removed, so it
/// has no phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderPhase {
    /// Waiting for every reactor in the room to be emptied.
    PreEvacuation,
    /// Reacting.
    #[default]
    Running,
    /// Reaction work is done; leftover material is draining out.
    Evacuating,
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

fn unset_remaining() -> u32 {
    u32::MAX
}

/// A production or breakdown request for one compound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default)]
    pub kind: OrderKind,

    /// Product to make, or compound to break down.
    pub compound: CompoundId,

    #[serde(default)]
    pub reagent_a: Option<CompoundId>,

    #[serde(default)]
    pub reagent_b: Option<CompoundId>,

    pub amount: u32,

    /// Quantity still to be delivered. Only [`Order::record_delivery`]
    /// lowers it.
    #[serde(default = "unset_remaining")]
    pub remaining: u32,

    /// Total compound reported delivered to a breakdown order. Informational;
    /// never drives completion.
    #[serde(default)]
    pub compound_delivered: u32,

    #[serde(default, rename = "createdAtTick")]
    pub created_at: Ticks,

    #[serde(default, rename = "activatedAtTick")]
    pub activated_at: Option<Ticks>,

    #[serde(default)]
    pub phase: OrderPhase,

    #[serde(default, rename = "lastBreakdownRestartTick")]
    pub last_restart: Option<Ticks>,
}

impl Order {
    fn new(
        kind: OrderKind,
        compound: CompoundId,
        reagents: (CompoundId, CompoundId),
        amount: u32,
        now: Ticks,
    ) -> Self {
        Self {
            kind,
            compound,
            reagent_a: Some(reagents.0),
            reagent_b: Some(reagents.1),
            amount,
            remaining: amount,
            compound_delivered: 0,
            created_at: now,
            activated_at: None,
            phase: OrderPhase::Running,
            last_restart: None,
        }
    }

    pub fn production(
        product: CompoundId,
        reagents: (CompoundId, CompoundId),
        amount: u32,
        now: Ticks,
    ) -> Self {
        Self::new(OrderKind::Production, product, reagents, amount, now)
    }

    pub fn breakdown(
        compound: CompoundId,
        reagents: (CompoundId, CompoundId),
        amount: u32,
        now: Ticks,
    ) -> Self {
        Self::new(OrderKind::Breakdown, compound, reagents, amount, now)
    }

    /// Production order for one chain step.
    pub fn from_step(step: &ChainStep, amount: u32, now: Ticks) -> Self {
        Self::production(step.product, step.reagents, amount, now)
    }

    pub fn reagents(&self) -> Option<(CompoundId, CompoundId)> {
        Some((self.reagent_a?, self.reagent_b?))
    }

    /// Whether `compound` belongs in this order's reactors.
    pub fn involves(&self, compound: CompoundId) -> bool {
        self.compound == compound
            || self.reagent_a == Some(compound)
            || self.reagent_b == Some(compound)
    }

    pub fn is_delivered(&self) -> bool {
        self.remaining == 0
    }

    /// Make this the active order; it must wait for empty reactors first.
    pub fn activate(&mut self, now: Ticks) {
        self.phase = OrderPhase::PreEvacuation;
        self.activated_at = Some(now);
    }

    /// Ticks this order has been active (or alive, for records that predate
    /// activation stamps).
    pub fn age(&self, now: Ticks) -> Ticks {
        now.saturating_sub(self.activated_at.unwrap_or(self.created_at))
    }

    /// Apply a delivery report. Returns `true` if the order changed.
    pub fn record_delivery(&mut self, compound: CompoundId, amount: u32) -> bool {
        if compound != self.compound || amount == 0 {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(amount);
        if self.kind == OrderKind::Breakdown {
            self.compound_delivered = self.compound_delivered.saturating_add(amount);
        }
        true
    }

    /// Normalize fields an older record may lack. Returns `true` if anything
    /// was changed.
    pub fn repair(&mut self, graph: &ReactionGraph) -> bool {
        let mut repaired = false;
        if self.reagents().is_none()
            && let Some((a, b)) = graph.find_direct_reagents(self.compound)
        {
            self.reagent_a = Some(a);
            self.reagent_b = Some(b);
            repaired = true;
        }
        if self.remaining > self.amount {
            self.remaining = self.amount;
            repaired = true;
        }
        repaired
    }
}

// ---------------------------------------------------------------------------
// RoomOrderState
// ---------------------------------------------------------------------------

/// One room's active order and the FIFO queue behind it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomOrderState {
    #[serde(default)]
    pub active: Option<Order>,
    #[serde(default)]
    pub queue: VecDeque<Order>,
}

impl RoomOrderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.queue.is_empty()
    }

    /// Append orders. If nothing is active, the first one is activated.
    /// Returns `true` if an order was activated.
    pub fn enqueue(&mut self, orders: impl IntoIterator<Item = Order>, now: Ticks) -> bool {
        self.queue.extend(orders);
        if self.active.is_none() {
            return self.promote_next(now);
        }
        false
    }

    /// Activate the next queued order if nothing is active.
    pub fn promote_next(&mut self, now: Ticks) -> bool {
        if self.active.is_some() {
            return false;
        }
        match self.queue.pop_front() {
            Some(mut next) => {
                next.activate(now);
                self.active = Some(next);
                true
            }
            None => false,
        }
    }

    /// Remove the active order and activate the next one.
    pub fn finish_active(&mut self, now: Ticks) -> Option<Order> {
        let finished = self.active.take();
        self.promote_next(now);
        finished
    }

    /// Drop the active order and the whole queue. Returns how many orders
    /// were dropped.
    pub fn cancel(&mut self) -> usize {
        let dropped = self.queue.len() + usize::from(self.active.is_some());
        self.active = None;
        self.queue.clear();
        dropped
    }
}

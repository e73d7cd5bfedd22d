//! Per-tick reactor actions for the active order.
//!
//! Both drivers work from the reactor snapshot taken at the start of the
//! tick and issue at most one action per acting reactor. Refusals are not
//! errors here: a cooling reactor simply waits, and any other refusal is
//! retried once with the inputs swapped.

use crate::config::LabConfig;
use crate::id::{ReactorId, RoomName};
use crate::layout::{Group, Layout};
use crate::order::{Order, OrderPhase};
use crate::reactor::{Reactor, index_reactors};
use crate::world::{ActionError, LabWorld};

/// What one execution step did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Actions the world accepted.
    pub reactions: u32,
    /// Actions refused because a reactor was cooling down.
    pub cooldowns: u32,
    /// Actions refused in both orientations.
    pub failures: u32,
}

impl StepReport {
    fn record(&mut self, outcome: Result<(), ActionError>) {
        match outcome {
            Ok(()) => self.reactions += 1,
            Err(e) if e.is_cooldown() => self.cooldowns += 1,
            Err(_) => self.failures += 1,
        }
    }
}

/// Try `action(a, b)`, then `action(b, a)` unless the first attempt failed
/// on cooldown.
fn with_swap_retry<F>(a: ReactorId, b: ReactorId, mut action: F) -> Result<(), ActionError>
where
    F: FnMut(ReactorId, ReactorId) -> Result<(), ActionError>,
{
    match action(a, b) {
        Err(e) if !e.is_cooldown() => {
            tracing::trace!(error = %e, "action refused, retrying swapped");
            action(b, a)
        }
        outcome => outcome,
    }
}

// ---------------------------------------------------------------------------
// Production
// ---------------------------------------------------------------------------

/// One production step.
///
/// Switches the order to evacuating once the outputs hold enough product to
/// cover what is still owed. Reacts only while running; an evacuating order
/// stays evacuating until it completes.
pub fn run_production<W: LabWorld>(
    world: &mut W,
    room: &RoomName,
    order: &mut Order,
    layout: &Layout,
    reactors: &[Reactor],
) -> StepReport {
    let mut report = StepReport::default();
    let index = index_reactors(reactors);
    let out_stock: u32 = layout
        .outputs()
        .filter_map(|id| index.get(&id))
        .map(|r| r.holds(order.compound))
        .sum();

    match order.phase {
        OrderPhase::Running if out_stock >= order.remaining => {
            tracing::debug!(room = %room, out_stock, remaining = order.remaining, "outputs cover the order, evacuating");
            order.phase = OrderPhase::Evacuating;
            return report;
        }
        OrderPhase::Running => {}
        _ => return report,
    }

    for group in &layout.groups {
        for output in &group.outputs {
            let Some(reactor) = index.get(output) else {
                continue;
            };
            if !reactor.is_ready() {
                continue;
            }
            let outcome = with_swap_retry(group.in1, group.in2, |a, b| world.react(*output, a, b));
            if let Err(e) = &outcome {
                tracing::trace!(room = %room, output = %output, error = %e, "reaction refused");
            }
            report.record(outcome);
        }
    }
    report
}

// ---------------------------------------------------------------------------
// Breakdown
// ---------------------------------------------------------------------------

/// Whether a breakdown input can take the next batch of reagent.
fn input_accepts(input: &Reactor, order: &Order, config: &LabConfig) -> bool {
    let compatible = match input.content() {
        None => true,
        Some(c) => order.reagent_a == Some(c) || order.reagent_b == Some(c),
    };
    compatible && input.free_capacity(config.reactor_capacity) >= config.min_batch
}

/// One breakdown step: every ready reactor holding at least a batch of the
/// compound, in range of both breakdown inputs, splits it into them. Stops
/// once either input has no room left for another batch.
pub fn run_breakdown<W: LabWorld>(
    world: &mut W,
    room: &RoomName,
    order: &Order,
    group: &Group,
    reactors: &[Reactor],
    config: &LabConfig,
) -> StepReport {
    let mut report = StepReport::default();
    if order.phase != OrderPhase::Running {
        return report;
    }
    let index = index_reactors(reactors);
    let (Some(in1), Some(in2)) = (index.get(&group.in1), index.get(&group.in2)) else {
        return report;
    };
    if !input_accepts(in1, order, config) || !input_accepts(in2, order, config) {
        tracing::trace!(room = %room, "breakdown inputs full");
        return report;
    }

    let range = config.interaction_range;
    let sources = reactors.iter().filter(|r| {
        !group.is_input(r.id)
            && r.is_ready()
            && r.holds(order.compound) >= config.min_batch
            && r.in_range_of(in1, range)
            && r.in_range_of(in2, range)
    });
    let mut free1 = in1.free_capacity(config.reactor_capacity);
    let mut free2 = in2.free_capacity(config.reactor_capacity);
    for source in sources {
        if free1 < config.min_batch || free2 < config.min_batch {
            tracing::trace!(room = %room, "breakdown inputs filled this tick");
            break;
        }
        let outcome = with_swap_retry(group.in1, group.in2, |a, b| {
            world.reverse_react(source.id, a, b)
        });
        if let Err(e) = &outcome {
            tracing::trace!(room = %room, source = %source.id, error = %e, "breakdown refused");
        }
        if outcome.is_ok() {
            free1 = free1.saturating_sub(config.min_batch);
            free2 = free2.saturating_sub(config.min_batch);
        }
        report.record(outcome);
    }
    report
}

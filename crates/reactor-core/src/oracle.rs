//! Whether a room's reactors need a logistics visit.
//!
//! Stateless: the answer is re-derived from the active order, the resolved
//! layout and the live reactor snapshot every time it is asked. The first
//! applicable reason wins, checked in this order: pending evacuation,
//! blocking material, restock, unload.

use crate::config::LabConfig;
use crate::id::{CompoundId, ReactorId};
use crate::layout::{Group, Layout};
use crate::order::{Order, OrderKind, OrderPhase};
use crate::reactor::{Reactor, index_reactors};
use std::fmt;

/// Why a room needs work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkReason {
    /// A new order is waiting for every reactor to be emptied.
    PreEvacuation,
    /// The active order is draining its leftovers.
    Evacuation,
    /// A reactor holds a compound the active order does not use.
    BlockingMaterial(ReactorId),
    /// A reactor can take more of a compound that is available in storage.
    Restock(ReactorId),
    /// A reactor holds enough finished material to be worth unloading.
    Unload(ReactorId),
}

impl fmt::Display for WorkReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkReason::PreEvacuation => f.write_str("pre-evacuation"),
            WorkReason::Evacuation => f.write_str("evacuation"),
            WorkReason::BlockingMaterial(id) => write!(f, "blocking material in {id}"),
            WorkReason::Restock(id) => write!(f, "restock {id}"),
            WorkReason::Unload(id) => write!(f, "unload {id}"),
        }
    }
}

/// Pair each production input with the reagent it should hold.
///
/// `in1` takes reagent A and `in2` reagent B, unless the reactors already
/// hold them the other way round.
pub fn assign_inputs<'a>(
    in1: &'a Reactor,
    in2: &'a Reactor,
    (a, b): (CompoundId, CompoundId),
) -> [(&'a Reactor, CompoundId); 2] {
    let swapped = in1.content() == Some(b) || in2.content() == Some(a);
    if swapped && a != b {
        [(in1, b), (in2, a)]
    } else {
        [(in1, a), (in2, b)]
    }
}

/// Everything the oracle looks at besides the order itself.
#[derive(Debug, Clone, Copy)]
pub struct WorkContext<'a> {
    pub layout: Option<&'a Layout>,
    pub breakdown: Option<&'a Group>,
    pub reactors: &'a [Reactor],
    pub config: &'a LabConfig,
}

/// First reason the room needs work, or `None`.
pub fn work_needed<F>(order: &Order, ctx: &WorkContext<'_>, stock: F) -> Option<WorkReason>
where
    F: Fn(CompoundId) -> u32,
{
    match order.phase {
        OrderPhase::PreEvacuation => return Some(WorkReason::PreEvacuation),
        OrderPhase::Evacuating => return Some(WorkReason::Evacuation),
        OrderPhase::Running => {}
    }

    if let Some(blocked) = ctx
        .reactors
        .iter()
        .find(|r| r.content().is_some_and(|c| !order.involves(c)))
    {
        return Some(WorkReason::BlockingMaterial(blocked.id));
    }

    match order.kind {
        OrderKind::Production => production_work(order, ctx, &stock),
        OrderKind::Breakdown => breakdown_work(order, ctx, &stock),
    }
}

fn needs_restock<F>(reactor: &Reactor, compound: CompoundId, config: &LabConfig, stock: &F) -> bool
where
    F: Fn(CompoundId) -> u32,
{
    reactor.holds(compound) < config.stock_threshold
        && reactor.can_accept(compound, config.min_batch, config.reactor_capacity)
        && stock(compound) >= config.min_batch
}

fn production_work<F>(order: &Order, ctx: &WorkContext<'_>, stock: &F) -> Option<WorkReason>
where
    F: Fn(CompoundId) -> u32,
{
    let layout = ctx.layout?;
    let reagents = order.reagents()?;
    let index = index_reactors(ctx.reactors);

    for group in &layout.groups {
        let (Some(in1), Some(in2)) = (index.get(&group.in1), index.get(&group.in2)) else {
            continue;
        };
        for (input, reagent) in assign_inputs(in1, in2, reagents) {
            if needs_restock(input, reagent, ctx.config, stock) {
                return Some(WorkReason::Restock(input.id));
            }
        }
    }

    layout
        .outputs()
        .filter_map(|id| index.get(&id))
        .find(|r| r.holds(order.compound) >= ctx.config.evacuation_threshold)
        .map(|r| WorkReason::Unload(r.id))
}

fn breakdown_work<F>(order: &Order, ctx: &WorkContext<'_>, stock: &F) -> Option<WorkReason>
where
    F: Fn(CompoundId) -> u32,
{
    let group = ctx.breakdown?;
    let index = index_reactors(ctx.reactors);
    let (in1, in2) = (index.get(&group.in1)?, index.get(&group.in2)?);
    let range = ctx.config.interaction_range;

    if let Some(source) = ctx.reactors.iter().find(|r| {
        !group.is_input(r.id)
            && r.in_range_of(in1, range)
            && r.in_range_of(in2, range)
            && needs_restock(r, order.compound, ctx.config, stock)
    }) {
        return Some(WorkReason::Restock(source.id));
    }

    let (a, b) = order.reagents()?;
    [*in1, *in2]
        .into_iter()
        .find(|r| r.holds(a).max(r.holds(b)) >= ctx.config.evacuation_threshold)
        .map(|r| WorkReason::Unload(r.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactor::Position;

    const H: CompoundId = CompoundId(0);
    const O: CompoundId = CompoundId(1);
    const OH: CompoundId = CompoundId(2);
    const JUNK: CompoundId = CompoundId(9);

    fn reactor(id: u32, x: i32, y: i32) -> Reactor {
        Reactor::new(ReactorId(id), Position::new(x, y))
    }

    fn group() -> Group {
        Group {
            in1: ReactorId(1),
            in2: ReactorId(2),
            outputs: vec![ReactorId(3)],
        }
    }

    fn layout() -> Layout {
        Layout {
            groups: vec![group()],
        }
    }

    fn triangle() -> Vec<Reactor> {
        vec![reactor(1, 10, 10), reactor(2, 12, 10), reactor(3, 11, 11)]
    }

    fn running(kind: OrderKind) -> Order {
        let mut order = match kind {
            OrderKind::Production => Order::production(OH, (H, O), 1000, 0),
            OrderKind::Breakdown => Order::breakdown(OH, (H, O), 1000, 0),
        };
        order.phase = OrderPhase::Running;
        order
    }

    fn ask(order: &Order, reactors: &[Reactor], stock: impl Fn(CompoundId) -> u32) -> Option<WorkReason> {
        let config = LabConfig::default();
        let layout = layout();
        let group = group();
        let ctx = WorkContext {
            layout: Some(&layout),
            breakdown: Some(&group),
            reactors,
            config: &config,
        };
        work_needed(order, &ctx, stock)
    }

    #[test]
    fn waiting_phases_always_need_work() {
        let mut order = running(OrderKind::Production);
        order.phase = OrderPhase::PreEvacuation;
        assert_eq!(ask(&order, &triangle(), |_| 0), Some(WorkReason::PreEvacuation));
        order.phase = OrderPhase::Evacuating;
        assert_eq!(ask(&order, &triangle(), |_| 0), Some(WorkReason::Evacuation));
    }

    #[test]
    fn foreign_compound_blocks() {
        let mut reactors = triangle();
        reactors[2] = reactors[2].clone().loaded(JUNK, 10);
        assert_eq!(
            ask(&running(OrderKind::Production), &reactors, |_| 0),
            Some(WorkReason::BlockingMaterial(ReactorId(3)))
        );
    }

    #[test]
    fn empty_input_with_stock_needs_restock() {
        let order = running(OrderKind::Production);
        assert_eq!(
            ask(&order, &triangle(), |c| if c == O { 500 } else { 0 }),
            Some(WorkReason::Restock(ReactorId(2)))
        );
        assert_eq!(ask(&order, &triangle(), |_| 4), None);
    }

    #[test]
    fn well_stocked_inputs_need_nothing() {
        let mut reactors = triangle();
        reactors[0] = reactors[0].clone().loaded(H, 1000);
        reactors[1] = reactors[1].clone().loaded(O, 1200);
        assert_eq!(ask(&running(OrderKind::Production), &reactors, |_| 5000), None);
    }

    #[test]
    fn swapped_inputs_are_restocked_with_what_they_hold() {
        let mut reactors = triangle();
        reactors[0] = reactors[0].clone().loaded(O, 1500);
        reactors[1] = reactors[1].clone().loaded(H, 200);
        assert_eq!(
            ask(&running(OrderKind::Production), &reactors, |c| if c == H { 100 } else { 0 }),
            Some(WorkReason::Restock(ReactorId(2)))
        );
    }

    #[test]
    fn full_output_needs_unload() {
        let mut reactors = triangle();
        reactors[0] = reactors[0].clone().loaded(H, 1000);
        reactors[1] = reactors[1].clone().loaded(O, 1000);
        reactors[2] = reactors[2].clone().loaded(OH, 1000);
        assert_eq!(
            ask(&running(OrderKind::Production), &reactors, |_| 0),
            Some(WorkReason::Unload(ReactorId(3)))
        );
    }

    #[test]
    fn breakdown_source_is_restocked_from_storage() {
        let order = running(OrderKind::Breakdown);
        assert_eq!(
            ask(&order, &triangle(), |c| if c == OH { 300 } else { 0 }),
            Some(WorkReason::Restock(ReactorId(3)))
        );
        assert_eq!(ask(&order, &triangle(), |_| 0), None);
    }

    #[test]
    fn breakdown_input_full_of_reagent_needs_unload() {
        let mut reactors = triangle();
        reactors[1] = reactors[1].clone().loaded(O, 1400);
        assert_eq!(
            ask(&running(OrderKind::Breakdown), &reactors, |_| 0),
            Some(WorkReason::Unload(ReactorId(2)))
        );
    }

    #[test]
    fn assign_inputs_follows_existing_contents() {
        let in1 = reactor(1, 0, 0).loaded(O, 10);
        let in2 = reactor(2, 1, 0);
        let [(r1, c1), (r2, c2)] = assign_inputs(&in1, &in2, (H, O));
        assert_eq!((r1.id, c1, r2.id, c2), (ReactorId(1), O, ReactorId(2), H));

        let empty = reactor(1, 0, 0);
        let [(_, c1), (_, c2)] = assign_inputs(&empty, &in2, (H, O));
        assert_eq!((c1, c2), (H, O));
    }
}

//! Completion rules for active orders.
//!
//! Production is judged on two signals: delivery bookkeeping and whether any
//! output still holds product. Breakdown is judged on three pools of
//! material that have to agree: external storage, reactor contents, and
//! reagents sitting in the breakdown inputs.

use crate::layout::{Group, Layout};
use crate::order::{Order, OrderPhase};
use crate::reactor::{Reactor, index_reactors};

/// What the state machine should do with the active order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Keep going in the current phase.
    Continue,
    /// Stop reacting and let material drain.
    Evacuate,
    /// An evacuating order has work again; resume reacting.
    Resume,
    /// Done. Remove the order.
    Complete,
    /// Nothing is left anywhere, yet delivery was never fully reported.
    ForceComplete,
}

// ---------------------------------------------------------------------------
// Production
// ---------------------------------------------------------------------------

/// Total product held by the layout's output reactors.
pub fn product_in_outputs(order: &Order, layout: Option<&Layout>, reactors: &[Reactor]) -> u32 {
    let Some(layout) = layout else {
        return 0;
    };
    let index = index_reactors(reactors);
    layout
        .outputs()
        .filter_map(|id| index.get(&id))
        .map(|r| r.holds(order.compound))
        .sum()
}

pub fn production_verdict(order: &Order, layout: Option<&Layout>, reactors: &[Reactor]) -> Verdict {
    if !order.is_delivered() {
        return Verdict::Continue;
    }
    if product_in_outputs(order, layout, reactors) == 0 {
        Verdict::Complete
    } else if order.phase == OrderPhase::Evacuating {
        Verdict::Continue
    } else {
        Verdict::Evacuate
    }
}

// ---------------------------------------------------------------------------
// Breakdown
// ---------------------------------------------------------------------------

/// The three pools a breakdown order is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BreakdownPools {
    /// Compound held outside reactors.
    pub in_storage: u32,
    /// Compound held by any reactor.
    pub in_labs: u32,
    /// Compound held by reactors with at least a minimum batch.
    pub processable_in_labs: u32,
    /// Either reagent held by the breakdown inputs.
    pub reagents_in_inputs: u32,
}

impl BreakdownPools {
    pub fn measure(
        order: &Order,
        group: Option<&Group>,
        reactors: &[Reactor],
        in_storage: u32,
        min_batch: u32,
    ) -> Self {
        let in_labs = reactors.iter().map(|r| r.holds(order.compound)).sum();
        let processable_in_labs = reactors
            .iter()
            .map(|r| r.holds(order.compound))
            .filter(|&held| held >= min_batch)
            .sum();
        let reagents_in_inputs = match (group, order.reagents()) {
            (Some(group), Some((a, b))) => reactors
                .iter()
                .filter(|r| group.is_input(r.id))
                .map(|r| r.holds(a) + if a == b { 0 } else { r.holds(b) })
                .sum(),
            _ => 0,
        };
        Self {
            in_storage,
            in_labs,
            processable_in_labs,
            reagents_in_inputs,
        }
    }

    /// Nothing left anywhere: no compound in storage or reactors, and no
    /// reagent worth moving out of the inputs.
    pub fn is_exhausted(&self, min_batch: u32) -> bool {
        self.in_storage + self.in_labs == 0 && self.reagents_in_inputs < min_batch
    }
}

/// Breakdown verdict. `can_resume` gates the evacuating → running restart.
pub fn breakdown_verdict(
    order: &Order,
    pools: &BreakdownPools,
    min_batch: u32,
    can_resume: bool,
) -> Verdict {
    let delivery_complete = order.is_delivered() || pools.in_storage < min_batch;
    let reactions_complete = pools.processable_in_labs == 0;
    let evacuation_complete = pools.reagents_in_inputs < min_batch;

    if delivery_complete && reactions_complete && evacuation_complete {
        if !order.is_delivered() && pools.is_exhausted(min_batch) {
            return Verdict::ForceComplete;
        }
        return Verdict::Complete;
    }
    match order.phase {
        OrderPhase::Evacuating if !reactions_complete && can_resume => Verdict::Resume,
        OrderPhase::Evacuating => Verdict::Continue,
        _ if delivery_complete && reactions_complete => Verdict::Evacuate,
        _ => Verdict::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{CompoundId, ReactorId};
    use crate::reactor::Position;

    const H: CompoundId = CompoundId(0);
    const O: CompoundId = CompoundId(1);
    const OH: CompoundId = CompoundId(2);

    fn reactor(id: u32) -> Reactor {
        Reactor::new(ReactorId(id), Position::new(id as i32, 0))
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

    // -----------------------------------------------------------------------
    // Production
    // -----------------------------------------------------------------------

    #[test]
    fn undelivered_production_continues() {
        let order = Order::production(OH, (H, O), 5000, 0);
        let reactors = vec![reactor(1), reactor(2), reactor(3)];
        assert_eq!(
            production_verdict(&order, Some(&layout()), &reactors),
            Verdict::Continue
        );
    }

    #[test]
    fn delivered_with_product_in_outputs_evacuates() {
        let mut order = Order::production(OH, (H, O), 5000, 0);
        order.record_delivery(OH, 5000);
        assert_eq!(order.remaining, 0);
        let reactors = vec![reactor(1), reactor(2), reactor(3).loaded(OH, 200)];
        assert_eq!(
            production_verdict(&order, Some(&layout()), &reactors),
            Verdict::Evacuate
        );
        order.phase = OrderPhase::Evacuating;
        assert_eq!(
            production_verdict(&order, Some(&layout()), &reactors),
            Verdict::Continue
        );
    }

    #[test]
    fn delivered_with_empty_outputs_completes() {
        let mut order = Order::production(OH, (H, O), 100, 0);
        order.record_delivery(OH, 100);
        let reactors = vec![reactor(1).loaded(H, 50), reactor(2), reactor(3)];
        assert_eq!(
            production_verdict(&order, Some(&layout()), &reactors),
            Verdict::Complete
        );
    }

    #[test]
    fn product_outside_outputs_is_not_counted() {
        let order = Order::production(OH, (H, O), 100, 0);
        let reactors = vec![reactor(1).loaded(OH, 70), reactor(2), reactor(3).loaded(OH, 30)];
        assert_eq!(product_in_outputs(&order, Some(&layout()), &reactors), 30);
        assert_eq!(product_in_outputs(&order, None, &reactors), 0);
    }

    // -----------------------------------------------------------------------
    // Breakdown
    // -----------------------------------------------------------------------

    fn breakdown() -> Order {
        Order::breakdown(OH, (H, O), 300, 0)
    }

    #[test]
    fn pools_are_measured_from_reactors() {
        let reactors = vec![
            reactor(1).loaded(H, 40),
            reactor(2).loaded(O, 35),
            reactor(3).loaded(OH, 100),
            reactor(4).loaded(OH, 3),
        ];
        let pools = BreakdownPools::measure(&breakdown(), Some(&group()), &reactors, 500, 5);
        assert_eq!(
            pools,
            BreakdownPools {
                in_storage: 500,
                in_labs: 103,
                processable_in_labs: 100,
                reagents_in_inputs: 75,
            }
        );
    }

    #[test]
    fn nothing_anywhere_force_completes() {
        let order = breakdown();
        let pools = BreakdownPools {
            reagents_in_inputs: 4,
            ..Default::default()
        };
        assert_eq!(breakdown_verdict(&order, &pools, 5, true), Verdict::ForceComplete);
    }

    #[test]
    fn fully_delivered_and_drained_completes_normally() {
        let mut order = breakdown();
        order.record_delivery(OH, 300);
        let pools = BreakdownPools::default();
        assert_eq!(breakdown_verdict(&order, &pools, 5, true), Verdict::Complete);
    }

    #[test]
    fn reagents_left_in_inputs_block_completion() {
        let mut order = breakdown();
        order.record_delivery(OH, 300);
        let pools = BreakdownPools {
            reagents_in_inputs: 200,
            ..Default::default()
        };
        assert_eq!(breakdown_verdict(&order, &pools, 5, true), Verdict::Evacuate);
    }

    #[test]
    fn all_three_flags_complete() {
        let mut order = breakdown();
        order.record_delivery(OH, 300);
        let pools = BreakdownPools {
            in_storage: 800,
            in_labs: 2,
            reagents_in_inputs: 3,
            ..Default::default()
        };
        assert_eq!(breakdown_verdict(&order, &pools, 5, true), Verdict::Complete);
    }

    #[test]
    fn processable_compound_blocks_completion() {
        let mut order = breakdown();
        order.record_delivery(OH, 300);
        let pools = BreakdownPools {
            in_labs: 5,
            processable_in_labs: 5,
            ..Default::default()
        };
        assert_eq!(breakdown_verdict(&order, &pools, 5, true), Verdict::Continue);
    }

    #[test]
    fn empty_storage_counts_as_delivered() {
        let order = breakdown();
        let pools = BreakdownPools {
            in_storage: 4,
            reagents_in_inputs: 50,
            ..Default::default()
        };
        assert_eq!(breakdown_verdict(&order, &pools, 5, true), Verdict::Evacuate);
    }

    #[test]
    fn evacuating_order_resumes_when_compound_reappears() {
        let mut order = breakdown();
        order.phase = OrderPhase::Evacuating;
        let pools = BreakdownPools {
            in_storage: 100,
            in_labs: 40,
            processable_in_labs: 40,
            reagents_in_inputs: 20,
        };
        assert_eq!(breakdown_verdict(&order, &pools, 5, true), Verdict::Resume);
        assert_eq!(breakdown_verdict(&order, &pools, 5, false), Verdict::Continue);
    }
}

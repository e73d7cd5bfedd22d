//! Breakdown: reverse reactions split a tier-3 boost into its reagents.
//!
//! The first half shows a normal breakdown. The second shows the restart:
//! compound that arrives after the order started evacuating sends it back
//! to running.
//!
//! Run with: `cargo run -p reactor-examples --example breakdown`

use reactor_core::config::LabConfig;
use reactor_core::engine::{LabEngine, RoomOutcome};
use reactor_core::order::OrderPhase;
use reactor_core::test_utils::*;
use reactor_core::world::LabWorld;
use reactor_data::standard_reaction_graph;
use reactor_examples::{init_tracing, print_orders, print_reactors, print_stock};

fn main() {
    init_tracing();

    let graph = standard_reaction_graph().unwrap();
    let mut world = triangle_world(&graph);
    let mut engine = LabEngine::new(graph, LabConfig::default());
    let room = room();
    let xgh2o = world.compound("XGH2O");

    // --- Scenario 1: steady breakdown ---

    println!("=== Scenario 1: break down 100 XGH2O ===\n");
    world.set_stock(&room, xgh2o, 100);
    let receipt = engine.start_breakdown_order(&world, &room, xgh2o, 100).unwrap();
    println!("  {receipt}");
    println!(
        "  group: {:?}",
        engine.get_breakdown_layout(&world, &room).unwrap()
    );

    let done = drive_room(&mut engine, &mut world, &room, 2_000);
    for order in &done {
        println!(
            "  finished at tick {}: {} delivered",
            world.tick(),
            order.compound_delivered
        );
    }
    print_stock(&world, &room, &["XGH2O", "GH2O", "X"]);

    // --- Scenario 2: late delivery ---

    println!("\n=== Scenario 2: compound arrives during evacuation ===\n");
    world.set_stock(&room, xgh2o, 10);
    engine.start_breakdown_order(&world, &room, xgh2o, 10).unwrap();

    let source = reactor_id(3);
    let mut injected = false;
    for _ in 0..100 {
        let outcome = engine.run_room(&mut world, &room);
        if let RoomOutcome::Completed(order) = outcome {
            println!("  tick {:>3}: done, {} delivered", world.tick(), order.compound_delivered);
            break;
        }
        let Some(order) = engine.active_order(&room) else {
            break;
        };
        println!("  tick {:>3}: {:?}", world.tick(), order.phase);
        if order.phase == OrderPhase::Evacuating && !injected {
            world.set_stock(&room, xgh2o, 10);
            let moved = world.stock_reactor(&room, source, xgh2o, 10);
            engine.record_delivery(&room, xgh2o, moved);
            println!("  tick {:>3}: {moved} XGH2O dropped into {source}", world.tick());
            injected = true;
        } else {
            service_room(&mut engine, &mut world, &room);
        }
        world.advance_ticks(3);
    }
    print_reactors(&engine, &world, &room);
    print_orders(&engine, &room);
}

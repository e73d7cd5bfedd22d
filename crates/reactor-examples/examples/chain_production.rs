//! Chain production: a tier-2 boost from raw minerals.
//!
//! Ten reactors form one group of two inputs and eight outputs. Ordering
//! GH2O with only base minerals in storage expands into six syntheses
//! (ZK, UL, G, GH, OH, GH2O), which run back to back while a simulated
//! courier restocks inputs and empties outputs.
//!
//! Run with: `cargo run -p reactor-examples --example chain_production`

use reactor_core::config::LabConfig;
use reactor_core::engine::{LabEngine, RoomOutcome};
use reactor_core::test_utils::*;
use reactor_core::world::LabWorld;
use reactor_data::standard_reaction_graph;
use reactor_examples::{init_tracing, print_orders, print_reactors, print_stock};

fn main() {
    init_tracing();

    let graph = standard_reaction_graph().unwrap();
    let mut world = cluster_world(&graph);
    let mut engine = LabEngine::new(graph, LabConfig::default());
    let room = room();

    for name in ["H", "O", "U", "L", "K", "Z"] {
        let id = world.compound(name);
        world.set_stock(&room, id, 3_000);
    }

    // --- Layout ---

    println!("=== Layout ===\n");
    let layout = engine.get_layout(&world, &room).unwrap();
    for group in &layout.groups {
        let outputs: Vec<String> = group.outputs.iter().map(|id| id.to_string()).collect();
        println!("  inputs {} + {} -> [{}]", group.in1, group.in2, outputs.join(", "));
    }
    print_reactors(&engine, &world, &room);

    // --- Order ---

    println!("\n=== Order ===\n");
    let gh2o = world.compound("GH2O");
    let receipt = engine.start_order(&world, &room, gh2o, 200).unwrap();
    println!("  {receipt}");
    print_orders(&engine, &room);

    // --- Run ---

    println!("\n=== Run ===\n");
    let mut ticks = 0;
    while engine.room_state(&room).is_some_and(|s| !s.is_idle()) && ticks < 10_000 {
        service_room(&mut engine, &mut world, &room);
        if let Some(summary) = engine.run(&mut world) {
            for (_, outcome) in &summary.outcomes {
                if let RoomOutcome::Completed(order) = outcome {
                    println!(
                        "  tick {:>4}: finished {} {}",
                        summary.tick,
                        order.amount,
                        engine.graph().display_name(order.compound)
                    );
                }
            }
        }
        world.advance_tick();
        ticks += 1;
    }

    tracing::info!(ticks = world.tick(), "demo finished");
    println!("\n=== Result after {} ticks ===\n", world.tick());
    print_stock(&world, &room, &["ZK", "UL", "G", "GH", "OH", "GH2O"]);
    print_orders(&engine, &room);
}

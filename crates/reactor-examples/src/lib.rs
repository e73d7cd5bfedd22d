//! Shared helpers for the reactor demos.
//!
//! Run a demo with: `cargo run -p reactor-examples --example chain_production`
//! and raise verbosity with `RUST_LOG=reactor_core=debug`.

use reactor_core::engine::LabEngine;
use reactor_core::id::RoomName;
use reactor_core::test_utils::SimWorld;
use reactor_core::world::LabWorld;
use tracing_subscriber::EnvFilter;

/// Install a formatting subscriber filtered by `RUST_LOG`, defaulting to
/// `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Print storage levels for the named compounds.
pub fn print_stock(world: &SimWorld, room: &RoomName, names: &[&str]) {
    let line: Vec<String> = names
        .iter()
        .map(|name| format!("{name}={}", world.stock(room, world.compound(name))))
        .collect();
    println!("  storage: {}", line.join(" "));
}

/// Print every reactor's position and contents.
pub fn print_reactors(engine: &LabEngine, world: &SimWorld, room: &RoomName) {
    for reactor in world.reactors(room).unwrap_or_default() {
        let content = match reactor.content() {
            Some(compound) => format!(
                "{} {}",
                reactor.amount,
                engine.graph().display_name(compound)
            ),
            None => "empty".to_string(),
        };
        println!(
            "  {} at ({}, {}): {content}",
            reactor.id, reactor.position.x, reactor.position.y
        );
    }
}

/// Print the room's active order and queue length.
pub fn print_orders(engine: &LabEngine, room: &RoomName) {
    let Some(state) = engine.room_state(room) else {
        println!("  no orders");
        return;
    };
    match &state.active {
        Some(order) => println!(
            "  active: {:?} {} {}, {:?}, {} remaining",
            order.kind,
            order.amount,
            engine.graph().display_name(order.compound),
            order.phase,
            order.remaining
        ),
        None => println!("  active: none"),
    }
    println!("  queued: {}", state.queue.len());
}

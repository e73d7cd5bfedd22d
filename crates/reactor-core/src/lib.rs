//! Reactor Core -- orchestration engine for spatially constrained chemical
//! reactors.
//!
//! A room owns a fixed set of reactors, external storage, and one queue of
//! orders. The engine decides which reactors feed and which receive, expands
//! a requested compound into the syntheses needed to reach it, drives the
//! per-tick reactions, and decides when an order is finished by comparing
//! three pools of material: storage, reactor contents, and what logistics
//! reported as delivered.
//!
//! # Order lifecycle
//!
//! ```text
//! queued -> PreEvacuation -> Running -> Evacuating -> (removed)
//!                               ^            |
//!                               +------------+  (breakdown restart / shortfall)
//! ```
//!
//! # Key Types
//!
//! - [`engine::LabEngine`] -- Facade: order intake, tick driving, queries.
//! - [`reaction::ReactionGraph`] -- Immutable reagent-pair -> product graph
//!   and the dependency resolver.
//! - [`layout::LayoutResolver`] -- Greedy group selection with an in-memory
//!   cache and persisted, periodically revalidated layouts.
//! - [`order::RoomOrderState`] -- One active order and a FIFO queue per room.
//! - [`world::LabWorld`] -- What the engine needs from the game world.
//! - [`store::LabStore`] -- Durable room records; [`store::MemoryStore`] ships.
//! - [`serialize`] -- Versioned store snapshots via bitcode.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for amount scaling.

pub mod completion;
pub mod config;
pub mod engine;
pub mod execution;
pub mod fixed;
pub mod id;
pub mod layout;
pub mod oracle;
pub mod order;
pub mod reaction;
pub mod reactor;
pub mod serialize;
pub mod store;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

//! Durable per-room state: order queues and persisted layouts.
//!
//! [`LabStore`] is the seam to whatever survives a restart. [`MemoryStore`]
//! is the shipped implementation; it is plain serde data, so it can be
//! snapshotted with [`crate::serialize`] or mirrored as JSON.

use crate::id::RoomName;
use crate::layout::{StoredBreakdownLayout, StoredLayout};
use crate::order::RoomOrderState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read/write access to persisted room records.
///
/// Reads return owned values: the engine loads a record, works on it for the
/// tick, and writes it back.
pub trait LabStore {
    fn room_state(&self, room: &RoomName) -> Option<RoomOrderState>;
    fn put_room_state(&mut self, room: &RoomName, state: RoomOrderState);

    /// Rooms with an order record, in a stable order.
    fn rooms(&self) -> Vec<RoomName>;

    fn layout(&self, room: &RoomName) -> Option<StoredLayout>;
    fn put_layout(&mut self, room: &RoomName, layout: StoredLayout);
    fn remove_layout(&mut self, room: &RoomName);

    fn breakdown_layout(&self, room: &RoomName) -> Option<StoredBreakdownLayout>;
    fn put_breakdown_layout(&mut self, room: &RoomName, layout: StoredBreakdownLayout);
    fn remove_breakdown_layout(&mut self, room: &RoomName);
}

/// Everything persisted for one room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRecord {
    #[serde(default)]
    pub orders: Option<RoomOrderState>,
    #[serde(default)]
    pub layout: Option<StoredLayout>,
    #[serde(default)]
    pub breakdown_layout: Option<StoredBreakdownLayout>,
}

impl RoomRecord {
    fn is_empty(&self) -> bool {
        self.orders.is_none() && self.layout.is_none() && self.breakdown_layout.is_none()
    }
}

/// In-process store keyed by room name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStore {
    rooms: BTreeMap<RoomName, RoomRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, room: &RoomName) -> Option<&RoomRecord> {
        self.rooms.get(room)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn record_mut(&mut self, room: &RoomName) -> &mut RoomRecord {
        self.rooms.entry(room.clone()).or_default()
    }

    fn prune(&mut self, room: &RoomName) {
        if self.rooms.get(room).is_some_and(RoomRecord::is_empty) {
            self.rooms.remove(room);
        }
    }
}

impl LabStore for MemoryStore {
    fn room_state(&self, room: &RoomName) -> Option<RoomOrderState> {
        self.rooms.get(room)?.orders.clone()
    }

    fn put_room_state(&mut self, room: &RoomName, state: RoomOrderState) {
        self.record_mut(room).orders = Some(state);
    }

    fn rooms(&self) -> Vec<RoomName> {
        self.rooms
            .iter()
            .filter(|(_, record)| record.orders.is_some())
            .map(|(room, _)| room.clone())
            .collect()
    }

    fn layout(&self, room: &RoomName) -> Option<StoredLayout> {
        self.rooms.get(room)?.layout.clone()
    }

    fn put_layout(&mut self, room: &RoomName, layout: StoredLayout) {
        self.record_mut(room).layout = Some(layout);
    }

    fn remove_layout(&mut self, room: &RoomName) {
        if let Some(record) = self.rooms.get_mut(room) {
            record.layout = None;
        }
        self.prune(room);
    }

    fn breakdown_layout(&self, room: &RoomName) -> Option<StoredBreakdownLayout> {
        self.rooms.get(room)?.breakdown_layout.clone()
    }

    fn put_breakdown_layout(&mut self, room: &RoomName, layout: StoredBreakdownLayout) {
        self.record_mut(room).breakdown_layout = Some(layout);
    }

    fn remove_breakdown_layout(&mut self, room: &RoomName) {
        if let Some(record) = self.rooms.get_mut(room) {
            record.breakdown_layout = None;
        }
        self.prune(room);
    }
}

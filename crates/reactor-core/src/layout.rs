//! Reactor layouts: which reactors feed and which receive.
//!
//! A production layout partitions a room's reactors into disjoint
//! [`Group`]s of two inputs plus every output in range of both. A breakdown
//! layout is a single group chosen the same way but independently, so it may
//! share reactors with the production layout.
//!
//! # Caching
//!
//! [`LayoutResolver`] answers from three tiers, in order:
//!
//! 1. the in-memory [`LayoutCache`], cleared wholesale by its
//!    [`ExpiryPolicy`] every `layout_cache_ttl` ticks;
//! 2. the layout persisted in the [`LabStore`], trusted for
//!    `layout_revalidation_window` ticks and rechecked against live positions
//!    after that;
//! 3. a fresh greedy computation, which is persisted and cached.

use crate::config::LabConfig;
use crate::fixed::Ticks;
use crate::id::{ReactorId, RoomName};
use crate::reactor::{Reactor, index_reactors};
use crate::store::LabStore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Two input reactors and the outputs in range of both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    #[serde(rename = "in1Id")]
    pub in1: ReactorId,
    #[serde(rename = "in2Id")]
    pub in2: ReactorId,
    #[serde(rename = "outIds")]
    pub outputs: Vec<ReactorId>,
}

impl Group {
    pub fn inputs(&self) -> [ReactorId; 2] {
        [self.in1, self.in2]
    }

    pub fn is_input(&self, id: ReactorId) -> bool {
        self.in1 == id || self.in2 == id
    }

    /// Every reactor in the group, inputs first.
    pub fn members(&self) -> impl Iterator<Item = ReactorId> + '_ {
        self.inputs().into_iter().chain(self.outputs.iter().copied())
    }
}

/// A set of disjoint production groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub groups: Vec<Group>,
}

impl Layout {
    pub fn outputs(&self) -> impl Iterator<Item = ReactorId> + '_ {
        self.groups.iter().flat_map(|g| g.outputs.iter().copied())
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Persisted form of a production layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredLayout {
    pub groups: Vec<Group>,
    #[serde(rename = "validatedAtTick")]
    pub validated_at: Ticks,
}

/// Persisted form of a breakdown layout, under its own keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBreakdownLayout {
    #[serde(rename = "breakdownIn1Id")]
    pub in1: ReactorId,
    #[serde(rename = "breakdownIn2Id")]
    pub in2: ReactorId,
    #[serde(rename = "breakdownOutIds")]
    pub outputs: Vec<ReactorId>,
    #[serde(rename = "breakdownValidatedAtTick")]
    pub validated_at: Ticks,
}

impl StoredBreakdownLayout {
    pub fn new(group: &Group, validated_at: Ticks) -> Self {
        Self {
            in1: group.in1,
            in2: group.in2,
            outputs: group.outputs.clone(),
            validated_at,
        }
    }

    pub fn group(&self) -> Group {
        Group {
            in1: self.in1,
            in2: self.in2,
            outputs: self.outputs.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Greedy selection
// ---------------------------------------------------------------------------

/// Greedily extract up to `max_groups` disjoint groups.
///
/// Each round scans every pair of unused reactors in ascending id order and
/// keeps the pair with the most unused reactors in range of both; only a
/// strictly larger count displaces the incumbent, so ties go to the lowest
/// ids. Stops early when the best pair has no outputs.
pub fn select_groups(reactors: &[Reactor], range: u32, max_groups: usize) -> Vec<Group> {
    let mut sorted: Vec<&Reactor> = reactors.iter().collect();
    sorted.sort_by_key(|r| r.id);

    let mut used: BTreeSet<ReactorId> = BTreeSet::new();
    let mut groups = Vec::new();

    while groups.len() < max_groups {
        let mut best: Option<(ReactorId, ReactorId, Vec<ReactorId>)> = None;

        for (i, a) in sorted.iter().enumerate() {
            if used.contains(&a.id) {
                continue;
            }
            for b in sorted.iter().skip(i + 1) {
                if used.contains(&b.id) {
                    continue;
                }
                let outputs: Vec<ReactorId> = sorted
                    .iter()
                    .filter(|r| r.id != a.id && r.id != b.id && !used.contains(&r.id))
                    .filter(|r| r.in_range_of(a, range) && r.in_range_of(b, range))
                    .map(|r| r.id)
                    .collect();
                if best
                    .as_ref()
                    .is_none_or(|(_, _, incumbent)| outputs.len() > incumbent.len())
                {
                    best = Some((a.id, b.id, outputs));
                }
            }
        }

        match best {
            Some((in1, in2, outputs)) if !outputs.is_empty() => {
                used.insert(in1);
                used.insert(in2);
                used.extend(outputs.iter().copied());
                groups.push(Group { in1, in2, outputs });
            }
            _ => break,
        }
    }

    groups
}

/// Best production layout for the given reactors, or `None` with fewer than
/// three reactors or no valid group.
pub fn compute_best_layout(reactors: &[Reactor], range: u32) -> Option<Layout> {
    if reactors.len() < LabConfig::MIN_GROUP_SIZE {
        return None;
    }
    let groups = select_groups(reactors, range, reactors.len() / LabConfig::MIN_GROUP_SIZE);
    if groups.is_empty() {
        None
    } else {
        Some(Layout { groups })
    }
}

/// Single best group for breakdown.
pub fn compute_breakdown_group(reactors: &[Reactor], range: u32) -> Option<Group> {
    if reactors.len() < LabConfig::MIN_GROUP_SIZE {
        return None;
    }
    select_groups(reactors, range, 1).into_iter().next()
}

/// Recheck stored groups against live reactors.
///
/// Groups whose inputs vanished are dropped; outputs that vanished or left
/// the range of either input are dropped; groups left without outputs are
/// dropped.
pub fn revalidate_groups(groups: &[Group], reactors: &[Reactor], range: u32) -> Vec<Group> {
    let index = index_reactors(reactors);
    groups
        .iter()
        .filter_map(|group| {
            let in1 = index.get(&group.in1)?;
            let in2 = index.get(&group.in2)?;
            let outputs: Vec<ReactorId> = group
                .outputs
                .iter()
                .filter(|id| {
                    index
                        .get(id)
                        .is_some_and(|r| r.in_range_of(in1, range) && r.in_range_of(in2, range))
                })
                .copied()
                .collect();
            (!outputs.is_empty()).then(|| Group {
                in1: group.in1,
                in2: group.in2,
                outputs,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Expiry and cache
// ---------------------------------------------------------------------------

/// A staleness window measured in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    pub window: Ticks,
}

impl ExpiryPolicy {
    pub const fn new(window: Ticks) -> Self {
        Self { window }
    }

    /// Whether something stamped at `stamped_at` is still fresh at `now`.
    pub fn is_fresh(&self, stamped_at: Ticks, now: Ticks) -> bool {
        now.saturating_sub(stamped_at) < self.window
    }
}

/// In-memory layouts, cleared wholesale once the memory policy lapses.
#[derive(Debug, Clone)]
pub struct LayoutCache {
    production: BTreeMap<RoomName, Layout>,
    breakdown: BTreeMap<RoomName, Group>,
    cleared_at: Ticks,
    policy: ExpiryPolicy,
}

impl LayoutCache {
    pub fn new(policy: ExpiryPolicy) -> Self {
        Self {
            production: BTreeMap::new(),
            breakdown: BTreeMap::new(),
            cleared_at: 0,
            policy,
        }
    }

    /// Drop every entry if the memory window has lapsed. Returns `true` when
    /// a clear happened.
    pub fn sweep(&mut self, now: Ticks) -> bool {
        if self.policy.is_fresh(self.cleared_at, now) {
            return false;
        }
        self.clear();
        self.cleared_at = now;
        true
    }

    pub fn production(&self, room: &RoomName) -> Option<&Layout> {
        self.production.get(room)
    }

    pub fn breakdown(&self, room: &RoomName) -> Option<&Group> {
        self.breakdown.get(room)
    }

    pub fn insert_production(&mut self, room: &RoomName, layout: Layout) {
        self.production.insert(room.clone(), layout);
    }

    pub fn insert_breakdown(&mut self, room: &RoomName, group: Group) {
        self.breakdown.insert(room.clone(), group);
    }

    /// Forget both layouts of one room.
    pub fn invalidate(&mut self, room: &RoomName) {
        self.production.remove(room);
        self.breakdown.remove(room);
    }

    pub fn clear(&mut self) {
        self.production.clear();
        self.breakdown.clear();
    }

    pub fn len(&self) -> usize {
        self.production.len() + self.breakdown.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// LayoutResolver
// ---------------------------------------------------------------------------

/// Resolves production and breakdown layouts through the cache tiers.
#[derive(Debug, Clone)]
pub struct LayoutResolver {
    cache: LayoutCache,
    revalidation: ExpiryPolicy,
    range: u32,
}

impl LayoutResolver {
    pub fn new(config: &LabConfig) -> Self {
        Self {
            cache: LayoutCache::new(ExpiryPolicy::new(config.layout_cache_ttl)),
            revalidation: ExpiryPolicy::new(config.layout_revalidation_window),
            range: config.interaction_range,
        }
    }

    pub fn cache(&self) -> &LayoutCache {
        &self.cache
    }

    /// Apply the memory expiry policy.
    pub fn sweep(&mut self, now: Ticks) -> bool {
        self.cache.sweep(now)
    }

    pub fn invalidate(&mut self, room: &RoomName) {
        self.cache.invalidate(room);
    }

    /// Forget a room's layouts; a full clear also deletes the persisted ones.
    pub fn clear_room<S: LabStore>(&mut self, room: &RoomName, store: &mut S, full_clear: bool) {
        self.cache.invalidate(room);
        if full_clear {
            store.remove_layout(room);
            store.remove_breakdown_layout(room);
        }
    }

    /// Production layout: memory, then persisted, then recomputed.
    pub fn resolve<S: LabStore>(
        &mut self,
        room: &RoomName,
        reactors: &[Reactor],
        store: &mut S,
        now: Ticks,
    ) -> Option<Layout> {
        self.cache.sweep(now);
        if reactors.len() < LabConfig::MIN_GROUP_SIZE {
            return None;
        }
        if let Some(layout) = self.cache.production(room) {
            return Some(layout.clone());
        }
        if let Some(stored) = store.layout(room)
            && let Some(layout) = self.validate_stored(room, &stored, reactors, store, now)
        {
            self.cache.insert_production(room, layout.clone());
            return Some(layout);
        }
        self.compute(room, reactors, store, now)
    }

    /// Trust a recently validated layout; otherwise recheck every group
    /// against live positions and persist the survivors.
    pub fn validate_stored<S: LabStore>(
        &self,
        room: &RoomName,
        stored: &StoredLayout,
        reactors: &[Reactor],
        store: &mut S,
        now: Ticks,
    ) -> Option<Layout> {
        if self.revalidation.is_fresh(stored.validated_at, now) {
            return (!stored.groups.is_empty()).then(|| Layout {
                groups: stored.groups.clone(),
            });
        }
        let groups = revalidate_groups(&stored.groups, reactors, self.range);
        if groups.is_empty() {
            tracing::debug!(room = %room, "stored layout no longer valid");
            return None;
        }
        if groups.len() != stored.groups.len() {
            tracing::debug!(
                room = %room,
                kept = groups.len(),
                dropped = stored.groups.len() - groups.len(),
                "stored layout revalidated with losses"
            );
        }
        store.put_layout(
            room,
            StoredLayout {
                groups: groups.clone(),
                validated_at: now,
            },
        );
        Some(Layout { groups })
    }

    /// Recompute the production layout from scratch and persist it.
    pub fn compute<S: LabStore>(
        &mut self,
        room: &RoomName,
        reactors: &[Reactor],
        store: &mut S,
        now: Ticks,
    ) -> Option<Layout> {
        let layout = compute_best_layout(reactors, self.range)?;
        tracing::debug!(room = %room, groups = layout.groups.len(), "computed production layout");
        store.put_layout(
            room,
            StoredLayout {
                groups: layout.groups.clone(),
                validated_at: now,
            },
        );
        self.cache.insert_production(room, layout.clone());
        Some(layout)
    }

    /// Breakdown group: memory, then persisted, then recomputed.
    pub fn resolve_breakdown<S: LabStore>(
        &mut self,
        room: &RoomName,
        reactors: &[Reactor],
        store: &mut S,
        now: Ticks,
    ) -> Option<Group> {
        self.cache.sweep(now);
        if reactors.len() < LabConfig::MIN_GROUP_SIZE {
            return None;
        }
        if let Some(group) = self.cache.breakdown(room) {
            return Some(group.clone());
        }
        if let Some(stored) = store.breakdown_layout(room) {
            let group = if self.revalidation.is_fresh(stored.validated_at, now) {
                Some(stored.group())
            } else {
                let survivor = revalidate_groups(&[stored.group()], reactors, self.range)
                    .into_iter()
                    .next();
                if let Some(group) = &survivor {
                    store.put_breakdown_layout(room, StoredBreakdownLayout::new(group, now));
                }
                survivor
            };
            if let Some(group) = group.filter(|g| !g.outputs.is_empty()) {
                self.cache.insert_breakdown(room, group.clone());
                return Some(group);
            }
        }
        self.compute_breakdown(room, reactors, store, now)
    }

    /// Recompute the breakdown group from scratch and persist it.
    pub fn compute_breakdown<S: LabStore>(
        &mut self,
        room: &RoomName,
        reactors: &[Reactor],
        store: &mut S,
        now: Ticks,
    ) -> Option<Group> {
        let group = compute_breakdown_group(reactors, self.range)?;
        tracing::debug!(room = %room, outputs = group.outputs.len(), "computed breakdown layout");
        store.put_breakdown_layout(room, StoredBreakdownLayout::new(&group, now));
        self.cache.insert_breakdown(room, group.clone());
        Some(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactor::Position;
    use crate::store::MemoryStore;

    fn reactor(id: u32, x: i32, y: i32) -> Reactor {
        Reactor::new(ReactorId(id), Position::new(x, y))
    }

    fn room() -> RoomName {
        RoomName::from("W1N1")
    }

    /// Classic 10-reactor cluster: two columns of three around a centre row.
    fn cluster() -> Vec<Reactor> {
        vec![
            reactor(1, 20, 20),
            reactor(2, 21, 20),
            reactor(3, 19, 19),
            reactor(4, 20, 19),
            reactor(5, 21, 19),
            reactor(6, 22, 19),
            reactor(7, 19, 21),
            reactor(8, 20, 21),
            reactor(9, 21, 21),
            reactor(10, 22, 21),
        ]
    }

    fn assert_valid(layout: &Layout, reactors: &[Reactor]) {
        let index = index_reactors(reactors);
        let mut seen = BTreeSet::new();
        for group in &layout.groups {
            for id in group.members() {
                assert!(seen.insert(id), "{id} used twice");
            }
            for out in &group.outputs {
                let out = index[out];
                assert!(out.in_range_of(index[&group.in1], 2));
                assert!(out.in_range_of(index[&group.in2], 2));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Greedy selection
    // -----------------------------------------------------------------------

    #[test]
    fn fewer_than_three_reactors_has_no_layout() {
        let reactors = vec![reactor(1, 0, 0), reactor(2, 1, 0)];
        assert!(compute_best_layout(&reactors, 2).is_none());
        assert!(compute_breakdown_group(&reactors, 2).is_none());
    }

    #[test]
    fn triangle_forms_one_group() {
        let reactors = vec![reactor(1, 10, 10), reactor(2, 12, 10), reactor(3, 11, 11)];
        let layout = compute_best_layout(&reactors, 2).unwrap();
        assert_eq!(
            layout.groups,
            vec![Group {
                in1: ReactorId(1),
                in2: ReactorId(2),
                outputs: vec![ReactorId(3)],
            }]
        );
    }

    #[test]
    fn spread_out_reactors_have_no_layout() {
        let reactors = vec![reactor(1, 0, 0), reactor(2, 10, 0), reactor(3, 20, 0)];
        assert!(compute_best_layout(&reactors, 2).is_none());
    }

    #[test]
    fn cluster_uses_central_pair_first() {
        let reactors = cluster();
        let layout = compute_best_layout(&reactors, 2).unwrap();
        assert_valid(&layout, &reactors);
        let first = &layout.groups[0];
        assert_eq!((first.in1, first.in2), (ReactorId(1), ReactorId(2)));
        assert_eq!(first.outputs.len(), 8);
        assert_eq!(layout.groups.len(), 1);
    }

    #[test]
    fn group_count_never_exceeds_a_third() {
        let reactors: Vec<Reactor> = (0..7).map(|i| reactor(i, i as i32, 0)).collect();
        let layout = compute_best_layout(&reactors, 2).unwrap();
        assert!(layout.groups.len() <= 2);
        assert_valid(&layout, &reactors);
    }

    #[test]
    fn selection_is_independent_of_input_order() {
        let mut reversed = cluster();
        reversed.reverse();
        assert_eq!(
            compute_best_layout(&cluster(), 2),
            compute_best_layout(&reversed, 2)
        );
    }

    #[test]
    fn breakdown_group_matches_best_first_group() {
        let reactors = cluster();
        let group = compute_breakdown_group(&reactors, 2).unwrap();
        let layout = compute_best_layout(&reactors, 2).unwrap();
        assert_eq!(group, layout.groups[0]);
    }

    // -----------------------------------------------------------------------
    // Revalidation
    // -----------------------------------------------------------------------

    #[test]
    fn moved_output_is_dropped() {
        let stored = vec![Group {
            in1: ReactorId(1),
            in2: ReactorId(2),
            outputs: vec![ReactorId(3), ReactorId(4)],
        }];
        let reactors = vec![
            reactor(1, 10, 10),
            reactor(2, 12, 10),
            reactor(3, 11, 11),
            reactor(4, 15, 15),
        ];
        let groups = revalidate_groups(&stored, &reactors, 2);
        assert_eq!(groups[0].outputs, vec![ReactorId(3)]);
    }

    #[test]
    fn group_without_outputs_is_dropped() {
        let stored = vec![Group {
            in1: ReactorId(1),
            in2: ReactorId(2),
            outputs: vec![ReactorId(3)],
        }];
        let reactors = vec![reactor(1, 10, 10), reactor(2, 12, 10), reactor(3, 30, 30)];
        assert!(revalidate_groups(&stored, &reactors, 2).is_empty());
    }

    #[test]
    fn missing_input_drops_group() {
        let stored = vec![Group {
            in1: ReactorId(1),
            in2: ReactorId(9),
            outputs: vec![ReactorId(3)],
        }];
        let reactors = vec![reactor(1, 10, 10), reactor(3, 11, 11), reactor(4, 12, 12)];
        assert!(revalidate_groups(&stored, &reactors, 2).is_empty());
    }

    // -----------------------------------------------------------------------
    // Expiry and cache
    // -----------------------------------------------------------------------

    #[test]
    fn expiry_window_is_exclusive() {
        let policy = ExpiryPolicy::new(50);
        assert!(policy.is_fresh(100, 149));
        assert!(!policy.is_fresh(100, 150));
        assert!(policy.is_fresh(100, 90));
    }

    #[test]
    fn cache_sweeps_every_window() {
        let mut cache = LayoutCache::new(ExpiryPolicy::new(10));
        cache.insert_production(&room(), Layout::default());
        assert!(!cache.sweep(5));
        assert_eq!(cache.len(), 1);
        assert!(cache.sweep(10));
        assert!(cache.is_empty());
        cache.insert_production(&room(), Layout::default());
        assert!(!cache.sweep(19));
        assert!(cache.sweep(20));
    }

    // -----------------------------------------------------------------------
    // Resolver tiers
    // -----------------------------------------------------------------------

    #[test]
    fn resolve_computes_and_persists() {
        let mut resolver = LayoutResolver::new(&LabConfig::default());
        let mut store = MemoryStore::new();
        let reactors = vec![reactor(1, 10, 10), reactor(2, 12, 10), reactor(3, 11, 11)];
        let layout = resolver.resolve(&room(), &reactors, &mut store, 7).unwrap();
        let stored = store.layout(&room()).unwrap();
        assert_eq!(stored.groups, layout.groups);
        assert_eq!(stored.validated_at, 7);
        assert!(resolver.cache().production(&room()).is_some());
    }

    #[test]
    fn fresh_stored_layout_is_trusted_without_check() {
        let mut resolver = LayoutResolver::new(&LabConfig::default());
        let mut store = MemoryStore::new();
        let stale_looking = Group {
            in1: ReactorId(1),
            in2: ReactorId(2),
            outputs: vec![ReactorId(3)],
        };
        store.put_layout(
            &room(),
            StoredLayout {
                groups: vec![stale_looking.clone()],
                validated_at: 100,
            },
        );
        // Reactor 3 is far away, but the record is only 20 ticks old.
        let reactors = vec![reactor(1, 10, 10), reactor(2, 12, 10), reactor(3, 40, 40)];
        let layout = resolver.resolve(&room(), &reactors, &mut store, 120).unwrap();
        assert_eq!(layout.groups, vec![stale_looking]);
    }

    #[test]
    fn old_stored_layout_is_revalidated() {
        let mut resolver = LayoutResolver::new(&LabConfig::default());
        let mut store = MemoryStore::new();
        store.put_layout(
            &room(),
            StoredLayout {
                groups: vec![Group {
                    in1: ReactorId(1),
                    in2: ReactorId(2),
                    outputs: vec![ReactorId(3), ReactorId(4)],
                }],
                validated_at: 100,
            },
        );
        let reactors = vec![
            reactor(1, 10, 10),
            reactor(2, 12, 10),
            reactor(3, 11, 11),
            reactor(4, 30, 30),
        ];
        let layout = resolver.resolve(&room(), &reactors, &mut store, 160).unwrap();
        assert_eq!(layout.groups[0].outputs, vec![ReactorId(3)]);
        assert_eq!(store.layout(&room()).unwrap().validated_at, 160);
    }

    #[test]
    fn fully_invalid_stored_layout_is_recomputed() {
        let mut resolver = LayoutResolver::new(&LabConfig::default());
        let mut store = MemoryStore::new();
        store.put_layout(
            &room(),
            StoredLayout {
                groups: vec![Group {
                    in1: ReactorId(7),
                    in2: ReactorId(8),
                    outputs: vec![ReactorId(9)],
                }],
                validated_at: 0,
            },
        );
        let reactors = vec![reactor(1, 10, 10), reactor(2, 12, 10), reactor(3, 11, 11)];
        let layout = resolver.resolve(&room(), &reactors, &mut store, 60).unwrap();
        assert_eq!(layout.groups[0].in1, ReactorId(1));
    }

    #[test]
    fn resolve_with_too_few_reactors_ignores_stored_layout() {
        let mut resolver = LayoutResolver::new(&LabConfig::default());
        let mut store = MemoryStore::new();
        store.put_layout(
            &room(),
            StoredLayout {
                groups: vec![Group {
                    in1: ReactorId(1),
                    in2: ReactorId(2),
                    outputs: vec![ReactorId(3)],
                }],
                validated_at: 0,
            },
        );
        let reactors = vec![reactor(1, 10, 10), reactor(2, 12, 10)];
        assert!(resolver.resolve(&room(), &reactors, &mut store, 1).is_none());
        assert!(resolver.resolve_breakdown(&room(), &reactors, &mut store, 1).is_none());
    }

    #[test]
    fn breakdown_layout_persists_under_its_own_record() {
        let mut resolver = LayoutResolver::new(&LabConfig::default());
        let mut store = MemoryStore::new();
        let reactors = cluster();
        let group = resolver
            .resolve_breakdown(&room(), &reactors, &mut store, 3)
            .unwrap();
        let stored = store.breakdown_layout(&room()).unwrap();
        assert_eq!(stored.group(), group);
        assert_eq!(stored.validated_at, 3);
        assert!(store.layout(&room()).is_none());
    }

    #[test]
    fn breakdown_and_production_may_share_reactors() {
        let mut resolver = LayoutResolver::new(&LabConfig::default());
        let mut store = MemoryStore::new();
        let reactors = cluster();
        let production = resolver.resolve(&room(), &reactors, &mut store, 0).unwrap();
        let breakdown = resolver
            .resolve_breakdown(&room(), &reactors, &mut store, 0)
            .unwrap();
        let shared = breakdown
            .members()
            .filter(|id| production.groups.iter().any(|g| g.members().any(|m| m == *id)))
            .count();
        assert_eq!(shared, breakdown.members().count());
    }

    #[test]
    fn full_clear_removes_persisted_layouts() {
        let mut resolver = LayoutResolver::new(&LabConfig::default());
        let mut store = MemoryStore::new();
        let reactors = cluster();
        resolver.resolve(&room(), &reactors, &mut store, 0);
        resolver.resolve_breakdown(&room(), &reactors, &mut store, 0);

        resolver.clear_room(&room(), &mut store, false);
        assert!(resolver.cache().is_empty());
        assert!(store.layout(&room()).is_some());

        resolver.clear_room(&room(), &mut store, true);
        assert!(store.layout(&room()).is_none());
        assert!(store.breakdown_layout(&room()).is_none());
    }

    #[test]
    fn stored_layout_uses_persisted_key_names() {
        let stored = StoredLayout {
            groups: vec![Group {
                in1: ReactorId(1),
                in2: ReactorId(2),
                outputs: vec![ReactorId(3)],
            }],
            validated_at: 42,
        };
        let json = serde_json::to_string(&stored).unwrap();
        assert!(json.contains("\"in1Id\":1"), "got: {json}");
        assert!(json.contains("\"outIds\":[3]"), "got: {json}");
        assert!(json.contains("\"validatedAtTick\":42"), "got: {json}");

        let breakdown = StoredBreakdownLayout::new(&stored.groups[0], 42);
        let json = serde_json::to_string(&breakdown).unwrap();
        assert!(json.contains("\"breakdownIn1Id\":1"), "got: {json}");
    }
}

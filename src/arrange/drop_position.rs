//! Geometry-to-structure mapping for an in-flight drag.
//!
//! Given where the dragged card currently sits over a stage, this module
//! answers two questions: between which cards would it land (the flat
//! [`DropSlot`]), and what structural edit does that imply (the
//! [`DropDescriptor`]). The slot is a pure function of the card's center,
//! the stage width and the stage's list with the dragged card already
//! removed; the descriptor additionally consults the pre-removal list,
//! because a singleton left behind by the removal must still count as the
//! parallel group it was a moment ago.

use egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::layout::{self, StageMetrics};
use crate::domain::group::{GroupedList, SlotInfo, TaskGroup};
use crate::domain::item::StageItem;

/// Flat insertion target: a slot index in `0..=N` (`N` = append) plus
/// whether the card would join a parallel group there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropSlot {
    pub index: usize,
    pub is_parallel: bool,
}

/// Structural insertion target against the post-removal list.
///
/// Sequential drops insert a new singleton group before `group_index`
/// (`group_index == len` appends); parallel drops insert into the group at
/// `group_index`, at member position `item_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropDescriptor {
    pub group_index: usize,
    pub item_index: usize,
    pub is_parallel: bool,
}

/// Dragged-card geometry relative to a candidate stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropQuery {
    /// Card center, relative to the stage content origin.
    pub center: Pos2,
    /// Card footprint.
    pub item_size: Vec2,
    /// Stage content width; the midline splits sequential-leaning from
    /// parallel-leaning.
    pub stage_width: f32,
}

/// True when the singleton that `item_id` now sits in only looks sequential
/// because the dragged card was removed from beside it.
fn was_parallel_before<T>(before_removal: &GroupedList<T>, dragged_id: Uuid, item_id: Uuid) -> bool {
    before_removal
        .groups()
        .iter()
        .find(|group| group.contains(item_id))
        .is_some_and(|group| group.is_parallel() && group.contains(dragged_id))
}

fn vertical_bucket(center_y: f32, spans: &[layout::ItemSpan], half_gap: f32) -> usize {
    let n = spans.len();
    if n == 0 {
        return 0;
    }
    if center_y <= spans[0].bottom + half_gap {
        return 0;
    }
    if center_y > spans[n - 1].bottom + half_gap {
        return n;
    }
    // The boundaries are strictly increasing, so the first one at or past
    // the center is the unique bucket.
    for ix in 1..n {
        if center_y <= spans[ix].bottom + half_gap {
            return ix;
        }
    }
    n
}

/// Map the dragged card's position over a stage to a flat insertion slot.
///
/// Vertically, slot boundaries sit half a gap under each card. Horizontally,
/// the stage midline decides leaning: at or left of it the card breaks out
/// sequentially wherever the structure allows, strictly right of it the
/// card joins an adjacent parallel group when one is eligible. A slot
/// strictly inside a parallel group always joins it, whatever the pointer's
/// horizontal position.
pub fn drop_slot<T>(
    query: &DropQuery,
    after_removal: &GroupedList<T>,
    before_removal: &GroupedList<T>,
    dragged_id: Uuid,
    metrics: &StageMetrics,
) -> DropSlot {
    let spans = layout::item_spans(after_removal, metrics);
    let index = vertical_bucket(query.center.y, &spans, metrics.item_gap * 0.5);

    let infos = after_removal.slot_infos();
    let prev = index.checked_sub(1).and_then(|ix| infos.get(ix));
    let next = infos.get(index);

    let is_parallel = match (prev, next) {
        // Between two members of the same parallel group: the card cannot
        // split them, it joins.
        (Some(p), Some(nx)) if p.group_index == nx.group_index && p.group_len > 1 => true,
        _ if query.center.x <= query.stage_width * 0.5 => false,
        _ => boundary_join_target(prev, next, before_removal, dragged_id).is_some(),
    };

    DropSlot { index, is_parallel }
}

/// Which neighbor group a parallel-leaning drop at a boundary slot joins.
///
/// The ladder encodes shipped behavior and is ordered deliberately: a
/// singleton below the slot that was parallel until the dragged card left it
/// wins over a full parallel group above the slot, so dragging the bottom
/// member of a parallel group upward rejoins its own group rather than the
/// one above. Returns the joined group's index and the member position.
fn boundary_join_target<T>(
    prev: Option<&SlotInfo>,
    next: Option<&SlotInfo>,
    before_removal: &GroupedList<T>,
    dragged_id: Uuid,
) -> Option<(usize, usize)> {
    if let Some(nx) = next
        && nx.group_len == 1
        && was_parallel_before(before_removal, dragged_id, nx.id)
    {
        return Some((nx.group_index, 0));
    }
    if let Some(p) = prev
        && p.group_len > 1
    {
        return Some((p.group_index, p.group_len));
    }
    if next.is_none()
        && let Some(p) = prev
        && p.group_len == 1
        && was_parallel_before(before_removal, dragged_id, p.id)
    {
        return Some((p.group_index, 1));
    }
    if let Some(nx) = next
        && nx.group_len > 1
    {
        return Some((nx.group_index, 0));
    }
    None
}

/// Convert a flat slot into structural coordinates.
///
/// Needs both lists: slot arithmetic runs against the post-removal list,
/// while the shrunk-by-removal cases are only visible in the pre-removal
/// one. Neither can be derived from the other here.
pub fn descriptor_for_slot<T>(
    slot: DropSlot,
    after_removal: &GroupedList<T>,
    before_removal: &GroupedList<T>,
    dragged_id: Uuid,
) -> DropDescriptor {
    let infos = after_removal.slot_infos();
    let index = slot.index.min(infos.len());
    let group_count = after_removal.len();
    let prev = index.checked_sub(1).and_then(|ix| infos.get(ix));
    let next = infos.get(index);

    if slot.is_parallel {
        if let (Some(p), Some(nx)) = (prev, next)
            && p.group_index == nx.group_index
        {
            return DropDescriptor {
                group_index: nx.group_index,
                item_index: nx.index_in_group,
                is_parallel: true,
            };
        }
        if let Some((group_index, item_index)) =
            boundary_join_target(prev, next, before_removal, dragged_id)
        {
            return DropDescriptor {
                group_index,
                item_index,
                is_parallel: true,
            };
        }
        // A parallel slot with no joinable neighbor cannot happen for slots
        // produced by `drop_slot`; degrade to a sequential insert.
    }

    let group_index = next.map_or(group_count, |nx| {
        nx.group_index + usize::from(nx.index_in_group != 0)
    });
    DropDescriptor {
        group_index,
        item_index: 0,
        is_parallel: false,
    }
}

/// Full resolution: slot plus descriptor in one call.
pub fn drop_target<T>(
    query: &DropQuery,
    after_removal: &GroupedList<T>,
    before_removal: &GroupedList<T>,
    dragged_id: Uuid,
    metrics: &StageMetrics,
) -> (DropSlot, DropDescriptor) {
    let slot = drop_slot(query, after_removal, before_removal, dragged_id, metrics);
    let descriptor = descriptor_for_slot(slot, after_removal, before_removal, dragged_id);
    (slot, descriptor)
}

/// Apply a descriptor: a new list with the item inserted. Out-of-range
/// coordinates clamp rather than fail, keeping the commit path total.
pub fn insert_at<T: Clone>(
    list: &GroupedList<T>,
    item: StageItem<T>,
    descriptor: &DropDescriptor,
) -> GroupedList<T> {
    let mut groups = list.groups().to_vec();
    if descriptor.is_parallel && descriptor.group_index < groups.len() {
        let members = &mut groups[descriptor.group_index].items;
        let slot = descriptor.item_index.min(members.len());
        members.insert(slot, item);
    } else {
        let group_index = descriptor.group_index.min(groups.len());
        groups.insert(group_index, TaskGroup::singleton(item));
    }
    GroupedList::from_groups(groups)
}

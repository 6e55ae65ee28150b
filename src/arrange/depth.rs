//! Grouping depth of a same-stage drop, projected from the drag offset.
//!
//! While a card is dragged inside its own stage, nothing crosses a stage
//! boundary and the horizontal signal is relative: how far the card has
//! moved from where it started. Rounding that projected indent gives the
//! depth the user is asking for; the structure around the hovered slot then
//! decides whether the stage can honor it, with the same edge/middle
//! distinctions the cross-stage drop calculator applies to absolute
//! coordinates.

use uuid::Uuid;

use crate::domain::group::GroupedList;

/// Depth the drag offset is asking for: the card's projected indent,
/// rounded to the nearest indent step and clamped to `0..=1`.
///
/// The offset is taken from the card's depth-0 anchor, so a card that
/// starts indented and moves straight down keeps asking for depth 1.
pub fn desired_depth(original_depth: u8, drag_dx: f32, indent_unit: f32) -> u8 {
    let original = original_depth.min(1);
    if indent_unit <= 0.0 {
        return original;
    }
    let projected = f32::from(original) * indent_unit + drag_dx;
    (projected / indent_unit).round().clamp(0.0, 1.0) as u8
}

/// Depth a drop would produce with the card over the slot of `hovered_index`
/// (a flat index into `list`, which still contains the dragged card).
///
/// A slot between two members of a parallel group forces depth 1. A slot at
/// the edge of a parallel group, or merely adjacent to one (the shrunk
/// remainder of the dragged card's own group counts), honors the offset.
/// Anywhere else the drop is sequential.
pub fn project_drop_depth<T>(
    list: &GroupedList<T>,
    dragged_id: Uuid,
    hovered_index: usize,
    desired: u8,
) -> u8 {
    let infos = list.slot_infos();
    if infos.is_empty() {
        return 0;
    }
    let Some(dragged_ix) = infos.iter().position(|slot| slot.id == dragged_id) else {
        return 0;
    };
    let desired = desired.min(1);
    let hovered_ix = hovered_index.min(infos.len() - 1);
    let dragged = infos[dragged_ix];

    // Group length as it will be once the dragged card has left its group.
    let len_without_dragged = |group_index: usize, group_len: usize| {
        group_len - usize::from(group_index == dragged.group_index)
    };

    if hovered_ix == dragged_ix {
        // Dragging in place: only the horizontal offset can change anything.
        let in_parallel = dragged.group_len > 1;
        let interior = in_parallel
            && dragged.index_in_group > 0
            && dragged.index_in_group + 1 < dragged.group_len;
        if interior {
            return 1;
        }
        if in_parallel {
            return desired;
        }
        // A lone card can only indent when a parallel group sits right
        // above it.
        let follows_parallel = dragged.group_index > 0
            && list.groups()[dragged.group_index - 1].is_parallel();
        if desired == 1 && follows_parallel {
            return 1;
        }
        return 0;
    }

    // Dragging up lands the card above the hovered slot, dragging down
    // below it; the relevant neighbors differ accordingly.
    let (above, below) = if hovered_ix < dragged_ix {
        (hovered_ix.checked_sub(1).map(|ix| infos[ix]), Some(infos[hovered_ix]))
    } else {
        (Some(infos[hovered_ix]), infos.get(hovered_ix + 1).copied())
    };
    let above = above.filter(|slot| slot.id != dragged_id);
    let below = below.filter(|slot| slot.id != dragged_id);

    // Landing between two members of one parallel group: forced depth 1.
    if let (Some(a), Some(b)) = (above, below)
        && a.group_index == b.group_index
        && len_without_dragged(a.group_index, a.group_len) > 1
    {
        return 1;
    }

    let neighbor_allows = [above, below].into_iter().flatten().any(|slot| {
        let remaining = len_without_dragged(slot.group_index, slot.group_len);
        // A parallel neighbor, or the shrunk remainder of the dragged
        // card's own group.
        remaining > 1 || (slot.group_index == dragged.group_index && remaining == 1)
    });

    if desired == 1 && neighbor_allows { 1 } else { 0 }
}

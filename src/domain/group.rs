use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::item::StageItem;

/// A contiguous run of items sharing one stage slot.
///
/// A group of one is sequential; a group of two or more is parallel and its
/// members are rendered indented, as concurrent siblings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskGroup<T> {
    pub(crate) items: Vec<StageItem<T>>,
}

impl<T> TaskGroup<T> {
    pub fn new(items: impl Into<Vec<StageItem<T>>>) -> Self {
        Self {
            items: items.into(),
        }
    }

    pub fn singleton(item: StageItem<T>) -> Self {
        Self { items: vec![item] }
    }

    pub fn items(&self) -> &[StageItem<T>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_parallel(&self) -> bool {
        self.items.len() > 1
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.items.iter().any(|item| item.id == id)
    }
}

/// An ordered sequence of groups: the canonical arrangement of one stage.
///
/// Invariants: no group is empty, and item ids are unique across the list.
/// Construction filters empty groups; every edit operation returns a new
/// list that upholds both.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GroupedList<T> {
    pub(crate) groups: Vec<TaskGroup<T>>,
}

/// One entry of the flat-with-depth view of a [`GroupedList`].
///
/// Depth is 1 exactly when the owning group is parallel. Derived on demand,
/// never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedItem<T> {
    pub item: StageItem<T>,
    pub group_index: usize,
    pub index_in_group: usize,
    pub depth: u8,
}

/// Structural coordinates of one flat slot, without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SlotInfo {
    pub id: Uuid,
    pub group_index: usize,
    pub index_in_group: usize,
    pub group_len: usize,
}

impl<T> GroupedList<T> {
    pub fn new() -> Self {
        Self { groups: Vec::new() }
    }

    /// Build a list from groups, dropping any empty ones.
    pub fn from_groups(groups: impl Into<Vec<TaskGroup<T>>>) -> Self {
        let mut groups: Vec<TaskGroup<T>> = groups.into();
        groups.retain(|group| !group.is_empty());
        Self { groups }
    }

    pub fn groups(&self) -> &[TaskGroup<T>] {
        &self.groups
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of items across all groups.
    pub fn item_count(&self) -> usize {
        self.groups.iter().map(TaskGroup::len).sum()
    }

    /// `(group_index, index_in_group)` of the item, if present.
    pub fn position_of(&self, id: Uuid) -> Option<(usize, usize)> {
        self.groups.iter().enumerate().find_map(|(gi, group)| {
            group
                .items
                .iter()
                .position(|item| item.id == id)
                .map(|ii| (gi, ii))
        })
    }

    pub fn item(&self, id: Uuid) -> Option<&StageItem<T>> {
        self.groups
            .iter()
            .find_map(|group| group.items.iter().find(|item| item.id == id))
    }

    /// Grouping depth of the item: 1 inside a parallel group, else 0.
    pub fn depth_of(&self, id: Uuid) -> Option<u8> {
        self.groups
            .iter()
            .find(|group| group.contains(id))
            .map(|group| u8::from(group.is_parallel()))
    }

    pub(crate) fn slot_infos(&self) -> Vec<SlotInfo> {
        let mut infos = Vec::with_capacity(self.item_count());
        for (group_index, group) in self.groups.iter().enumerate() {
            for (index_in_group, item) in group.items.iter().enumerate() {
                infos.push(SlotInfo {
                    id: item.id,
                    group_index,
                    index_in_group,
                    group_len: group.len(),
                });
            }
        }
        infos
    }
}

impl<T: Clone> GroupedList<T> {
    /// Project the list into its flat-with-depth form, walking groups in
    /// order. Every member of a parallel group carries depth 1.
    pub fn flatten(&self) -> Vec<FlattenedItem<T>> {
        let mut flat = Vec::with_capacity(self.item_count());
        for (group_index, group) in self.groups.iter().enumerate() {
            let depth = u8::from(group.is_parallel());
            for (index_in_group, item) in group.items.iter().enumerate() {
                flat.push(FlattenedItem {
                    item: item.clone(),
                    group_index,
                    index_in_group,
                    depth,
                });
            }
        }
        flat
    }

    /// Fold a flattened sequence back into groups.
    ///
    /// A new group starts whenever the depth changes in either direction,
    /// and whenever two consecutive depth-1 entries came from different
    /// original groups. Depth-0 entries are always their own singleton
    /// group. `rebuild(flatten(list)) == list` for every valid list.
    pub fn rebuild(flattened: Vec<FlattenedItem<T>>) -> Self {
        let mut groups: Vec<TaskGroup<T>> = Vec::new();
        let mut current: Vec<StageItem<T>> = Vec::new();
        let mut current_key: Option<(u8, usize)> = None;

        for entry in flattened {
            let continues = match current_key {
                Some((depth, group_index)) => {
                    depth == 1 && entry.depth == 1 && entry.group_index == group_index
                }
                None => false,
            };
            if !continues && !current.is_empty() {
                groups.push(TaskGroup {
                    items: std::mem::take(&mut current),
                });
            }
            current_key = Some((entry.depth, entry.group_index));
            current.push(entry.item);
        }
        if !current.is_empty() {
            groups.push(TaskGroup { items: current });
        }

        Self { groups }
    }

    /// Copy of the list with the item removed and any emptied group dropped,
    /// together with the removed item.
    pub fn without_item(&self, id: Uuid) -> (Self, Option<StageItem<T>>) {
        let mut removed = None;
        let mut groups = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            match group.items.iter().position(|item| item.id == id) {
                Some(ii) if removed.is_none() => {
                    let mut items = group.items.clone();
                    removed = Some(items.remove(ii));
                    if !items.is_empty() {
                        groups.push(TaskGroup { items });
                    }
                }
                _ => groups.push(group.clone()),
            }
        }
        (Self { groups }, removed)
    }
}

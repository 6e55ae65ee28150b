//! Structural edits on a [`GroupedList`].
//!
//! Every operation is total: an out-of-range index or an impossible edit is
//! an explicit no-op that hands back `Cow::Borrowed(self)`, so callers can
//! tell "nothing changed" apart from a real edit without paying for a clone.
//! No operation mutates its input, and none ever returns an empty group.

use std::borrow::Cow;

use super::group::{GroupedList, TaskGroup};

impl<T: Clone> GroupedList<T> {
    /// Swap the group with its predecessor. No-op at the first group.
    pub fn move_group_up(&self, group_index: usize) -> Cow<'_, Self> {
        if group_index == 0 || group_index >= self.groups.len() {
            return Cow::Borrowed(self);
        }
        let mut groups = self.groups.clone();
        groups.swap(group_index - 1, group_index);
        Cow::Owned(Self { groups })
    }

    /// Swap the group with its successor. No-op at the last group.
    pub fn move_group_down(&self, group_index: usize) -> Cow<'_, Self> {
        if group_index + 1 >= self.groups.len() {
            return Cow::Borrowed(self);
        }
        let mut groups = self.groups.clone();
        groups.swap(group_index, group_index + 1);
        Cow::Owned(Self { groups })
    }

    /// Replace a parallel group with one singleton group per member, in
    /// place, preserving order. No-op on a singleton group.
    pub fn ungroup_all(&self, group_index: usize) -> Cow<'_, Self> {
        let Some(group) = self.groups.get(group_index) else {
            return Cow::Borrowed(self);
        };
        if !group.is_parallel() {
            return Cow::Borrowed(self);
        }
        let mut groups = Vec::with_capacity(self.groups.len() + group.len() - 1);
        groups.extend_from_slice(&self.groups[..group_index]);
        groups.extend(group.items().iter().cloned().map(TaskGroup::singleton));
        groups.extend_from_slice(&self.groups[group_index + 1..]);
        Cow::Owned(Self { groups })
    }

    /// Pull one member out of a parallel group into a new singleton group
    /// inserted immediately after it. On a singleton group the split would
    /// reproduce the list as-is, so it is a no-op.
    pub fn split_one(&self, group_index: usize, item_index: usize) -> Cow<'_, Self> {
        let Some(group) = self.groups.get(group_index) else {
            return Cow::Borrowed(self);
        };
        if item_index >= group.len() || !group.is_parallel() {
            return Cow::Borrowed(self);
        }
        let mut groups = self.groups.clone();
        let item = groups[group_index].items.remove(item_index);
        groups.insert(group_index + 1, TaskGroup::singleton(item));
        Cow::Owned(Self { groups })
    }

    /// Move one item into the preceding group, appending it there. Turns a
    /// singleton neighbor into a parallel group; deletes the origin group
    /// when it empties. No-op at the first group.
    pub fn merge_up(&self, group_index: usize, item_index: usize) -> Cow<'_, Self> {
        if group_index == 0 {
            return Cow::Borrowed(self);
        }
        self.merge_into(group_index, item_index, group_index - 1)
    }

    /// Move one item into the following group, appending it there. No-op at
    /// the last group.
    pub fn merge_down(&self, group_index: usize, item_index: usize) -> Cow<'_, Self> {
        if group_index + 1 >= self.groups.len() {
            return Cow::Borrowed(self);
        }
        self.merge_into(group_index, item_index, group_index + 1)
    }

    fn merge_into(
        &self,
        group_index: usize,
        item_index: usize,
        target_index: usize,
    ) -> Cow<'_, Self> {
        let valid = self
            .groups
            .get(group_index)
            .is_some_and(|group| item_index < group.len());
        if !valid {
            return Cow::Borrowed(self);
        }
        let mut groups = self.groups.clone();
        let item = groups[group_index].items.remove(item_index);
        groups[target_index].items.push(item);
        if groups[group_index].is_empty() {
            groups.remove(group_index);
        }
        Cow::Owned(Self { groups })
    }

    /// Delete one item; delete its group too if that leaves it empty.
    pub fn remove_item(&self, group_index: usize, item_index: usize) -> Cow<'_, Self> {
        let valid = self
            .groups
            .get(group_index)
            .is_some_and(|group| item_index < group.len());
        if !valid {
            return Cow::Borrowed(self);
        }
        let mut groups = self.groups.clone();
        groups[group_index].items.remove(item_index);
        if groups[group_index].is_empty() {
            groups.remove(group_index);
        }
        Cow::Owned(Self { groups })
    }

    /// Delete a whole group.
    pub fn remove_group(&self, group_index: usize) -> Cow<'_, Self> {
        if group_index >= self.groups.len() {
            return Cow::Borrowed(self);
        }
        let mut groups = self.groups.clone();
        groups.remove(group_index);
        Cow::Owned(Self { groups })
    }
}

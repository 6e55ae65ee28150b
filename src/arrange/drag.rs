//! The drag gesture state machine.
//!
//! One controller owns the whole gesture: `start` validates and opens a
//! session, every `update` recomputes the drop target and preview from
//! scratch against the geometry the caller supplies, and `stop` turns the
//! final session into at most one new list per affected stage. The
//! controller never holds a list between calls; stages stay single-writer,
//! owned by the caller.

use std::collections::HashSet;

use egui::{Modifiers, Pos2, Rect, Vec2};
use thiserror::Error;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use super::depth::{desired_depth, project_drop_depth};
use super::drop_position::{self, DropDescriptor, DropQuery, DropSlot};
use super::layout::{self, StageMetrics};
use crate::domain::group::GroupedList;
use crate::domain::item::StageItem;

/// Caller-owned view of one stage, rebuilt for every call: an opaque id,
/// absolute bounds, and a borrow of its current arrangement.
pub struct StagePanel<'a, T> {
    pub id: Uuid,
    pub bounds: Rect,
    pub list: &'a GroupedList<T>,
    /// Collapsed stages are skipped by the containment test.
    pub collapsed: bool,
    /// Maximum item count accepted from other stages; `None` = unlimited.
    pub wip_limit: Option<usize>,
}

impl<'a, T> StagePanel<'a, T> {
    pub fn new(id: Uuid, bounds: Rect, list: &'a GroupedList<T>) -> Self {
        Self {
            id,
            bounds,
            list,
            collapsed: false,
            wip_limit: None,
        }
    }
}

/// Dragged-card geometry for one update, in absolute canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragGeometry {
    /// Center of the dragged card.
    pub center: Pos2,
    /// Card footprint.
    pub item_size: Vec2,
    /// Horizontal distance from the card's position at gesture start.
    pub drag_dx: f32,
}

/// Preview slot shown at the prospective drop location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placeholder {
    pub stage: Uuid,
    /// Absolute rect, derived from the same layout walk as committed state.
    pub rect: Rect,
    pub is_parallel: bool,
}

/// Live state of one gesture. Created at `start`, refreshed on every
/// `update`, consumed at `stop`; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub active_item: Uuid,
    pub source_stage: Uuid,
    pub target_stage: Uuid,
    pub copy_mode: bool,
    pub slot: Option<DropSlot>,
    pub descriptor: Option<DropDescriptor>,
    /// Indent the drop would produce; meaningful while target == source.
    pub projected_depth: u8,
    pub placeholder: Option<Placeholder>,
    original_depth: u8,
}

/// What a completed gesture did.
#[derive(Debug, Clone, PartialEq)]
pub enum DragEffect {
    Reorder {
        stage: Uuid,
        item: Uuid,
        descriptor: DropDescriptor,
    },
    Move {
        from: Uuid,
        to: Uuid,
        item: Uuid,
        descriptor: DropDescriptor,
    },
    Copy {
        from: Uuid,
        to: Uuid,
        item: Uuid,
        new_id: Uuid,
        descriptor: DropDescriptor,
    },
}

/// Replacement list for one stage; apply each to your own state, once.
#[derive(Debug, Clone, PartialEq)]
pub struct StageCommit<T> {
    pub stage: Uuid,
    pub list: GroupedList<T>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragOutcome<T> {
    pub effect: DragEffect,
    pub commits: Vec<StageCommit<T>>,
}

#[derive(Error, Debug)]
pub enum DragError {
    #[error("Item not found in any stage: {id}")]
    ItemNotFound { id: Uuid },

    #[error("Item is locked: {id}")]
    ItemLocked { id: Uuid },

    #[error("A drag gesture is already in progress")]
    GestureInProgress,
}

enum DragState {
    Idle,
    Dragging(DragSession),
}

/// Synchronous `start -> update* -> stop` orchestrator for one pointer
/// gesture at a time.
pub struct DragController {
    state: DragState,
    metrics: StageMetrics,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new(StageMetrics::default())
    }
}

impl DragController {
    pub fn new(metrics: StageMetrics) -> Self {
        Self {
            state: DragState::Idle,
            metrics,
        }
    }

    pub fn metrics(&self) -> &StageMetrics {
        &self.metrics
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Dragging(session) => Some(session),
            DragState::Idle => None,
        }
    }

    pub fn placeholder(&self) -> Option<&Placeholder> {
        self.session().and_then(|session| session.placeholder.as_ref())
    }

    /// Open a gesture on `item_id`. Locked and unknown items are rejected,
    /// as is a second gesture while one is active.
    pub fn start<T>(
        &mut self,
        item_id: Uuid,
        panels: &[StagePanel<'_, T>],
        locked: &HashSet<Uuid>,
    ) -> Result<(), DragError> {
        if self.is_dragging() {
            return Err(DragError::GestureInProgress);
        }
        if locked.contains(&item_id) {
            return Err(DragError::ItemLocked { id: item_id });
        }
        let Some((panel, depth)) = panels
            .iter()
            .find_map(|panel| panel.list.depth_of(item_id).map(|depth| (panel, depth)))
        else {
            return Err(DragError::ItemNotFound { id: item_id });
        };

        debug!(item = %item_id, stage = %panel.id, "drag started");
        self.state = DragState::Dragging(DragSession {
            active_item: item_id,
            source_stage: panel.id,
            target_stage: panel.id,
            copy_mode: false,
            slot: None,
            descriptor: None,
            projected_depth: depth,
            placeholder: None,
            original_depth: depth,
        });
        Ok(())
    }

    /// Refresh the session from the current geometry. The previous target
    /// is retained whenever no eligible stage contains the card's center,
    /// so the preview never disappears mid-gesture. Copy mode is
    /// re-sampled from the live modifiers on every call.
    pub fn update<T: Clone>(
        &mut self,
        geometry: DragGeometry,
        panels: &[StagePanel<'_, T>],
        modifiers: Modifiers,
    ) {
        let DragState::Dragging(session) = &mut self.state else {
            trace!("drag update ignored: no active gesture");
            return;
        };
        session.copy_mode = modifiers.alt;

        let hit = panels.iter().find(|panel| {
            panel_accepts(panel, session.source_stage) && panel.bounds.contains(geometry.center)
        });
        match hit {
            Some(panel) => {
                if session.target_stage != panel.id {
                    trace!(stage = %panel.id, "drop target changed");
                }
                session.target_stage = panel.id;
            }
            None => trace!("no stage under pointer; retaining previous target"),
        }

        let Some(target) = panels.iter().find(|panel| panel.id == session.target_stage) else {
            // The caller stopped supplying the retained target; keep the
            // last computed preview rather than blanking it.
            warn!(stage = %session.target_stage, "drop target missing from panel set");
            return;
        };

        let (after_removal, _) = target.list.without_item(session.active_item);
        let query = DropQuery {
            center: geometry.center - target.bounds.min.to_vec2(),
            item_size: geometry.item_size,
            stage_width: target.bounds.width(),
        };
        let (slot, descriptor) = drop_position::drop_target(
            &query,
            &after_removal,
            target.list,
            session.active_item,
            &self.metrics,
        );
        session.slot = Some(slot);
        session.descriptor = Some(descriptor);

        if session.target_stage == session.source_stage {
            let desired =
                desired_depth(session.original_depth, geometry.drag_dx, self.metrics.indent_unit);
            session.projected_depth =
                project_drop_depth(target.list, session.active_item, slot.index, desired);
        } else {
            session.projected_depth = u8::from(descriptor.is_parallel);
        }

        let rect = layout::placeholder_rect(
            &after_removal,
            &descriptor,
            &self.metrics,
            target.bounds.width(),
        )
        .translate(target.bounds.min.to_vec2());
        session.placeholder = Some(Placeholder {
            stage: target.id,
            rect,
            is_parallel: descriptor.is_parallel,
        });
    }

    /// Close the gesture and translate the final session into an effect
    /// plus one replacement list per affected stage. Returns `None` when no
    /// target was ever resolved.
    pub fn stop<T: Clone>(
        &mut self,
        panels: &[StagePanel<'_, T>],
        modifiers: Modifiers,
    ) -> Option<DragOutcome<T>> {
        let DragState::Dragging(mut session) =
            std::mem::replace(&mut self.state, DragState::Idle)
        else {
            trace!("drag stop ignored: no active gesture");
            return None;
        };
        session.copy_mode = modifiers.alt;
        let descriptor = session.descriptor?;

        let source = panels.iter().find(|panel| panel.id == session.source_stage);
        let target = panels.iter().find(|panel| panel.id == session.target_stage);
        let (Some(source), Some(target)) = (source, target) else {
            debug_assert!(false, "gesture stages missing at stop");
            warn!("gesture stages missing at stop; discarding");
            return None;
        };

        if session.source_stage == session.target_stage {
            let (after_removal, removed) = source.list.without_item(session.active_item);
            let Some(item) = removed else {
                debug_assert!(false, "active item vanished from its source stage");
                warn!(item = %session.active_item, "active item vanished; discarding gesture");
                return None;
            };
            let list = drop_position::insert_at(&after_removal, item, &descriptor);
            debug!(item = %session.active_item, stage = %source.id, "reorder committed");
            return Some(DragOutcome {
                effect: DragEffect::Reorder {
                    stage: source.id,
                    item: session.active_item,
                    descriptor,
                },
                commits: vec![StageCommit {
                    stage: source.id,
                    list,
                }],
            });
        }

        if session.copy_mode {
            let Some(original) = source.list.item(session.active_item) else {
                debug_assert!(false, "active item vanished from its source stage");
                warn!(item = %session.active_item, "active item vanished; discarding gesture");
                return None;
            };
            let copy = StageItem::new(original.data.clone());
            let new_id = copy.id;
            let (target_base, _) = target.list.without_item(session.active_item);
            let list = drop_position::insert_at(&target_base, copy, &descriptor);
            debug!(
                item = %session.active_item,
                from = %source.id,
                to = %target.id,
                "copy committed"
            );
            return Some(DragOutcome {
                effect: DragEffect::Copy {
                    from: source.id,
                    to: target.id,
                    item: session.active_item,
                    new_id,
                    descriptor,
                },
                commits: vec![StageCommit {
                    stage: target.id,
                    list,
                }],
            });
        }

        let (source_list, removed) = source.list.without_item(session.active_item);
        let Some(item) = removed else {
            debug_assert!(false, "active item vanished from its source stage");
            warn!(item = %session.active_item, "active item vanished; discarding gesture");
            return None;
        };
        let (target_base, _) = target.list.without_item(session.active_item);
        let target_list = drop_position::insert_at(&target_base, item, &descriptor);
        debug!(
            item = %session.active_item,
            from = %source.id,
            to = %target.id,
            "move committed"
        );
        Some(DragOutcome {
            effect: DragEffect::Move {
                from: source.id,
                to: target.id,
                item: session.active_item,
                descriptor,
            },
            commits: vec![
                StageCommit {
                    stage: source.id,
                    list: source_list,
                },
                StageCommit {
                    stage: target.id,
                    list: target_list,
                },
            ],
        })
    }

    /// Abandon the gesture: identical to a stop with no resolvable target.
    pub fn cancel(&mut self) {
        if let DragState::Dragging(session) = std::mem::replace(&mut self.state, DragState::Idle) {
            debug!(item = %session.active_item, "drag cancelled");
        }
    }
}

/// Collapsed stages never take drops; a stage at its WIP limit only takes
/// drops from itself.
fn panel_accepts<T>(panel: &StagePanel<'_, T>, source_stage: Uuid) -> bool {
    if panel.collapsed {
        return false;
    }
    if panel.id == source_stage {
        return true;
    }
    panel
        .wip_limit
        .is_none_or(|limit| panel.list.item_count() < limit)
}

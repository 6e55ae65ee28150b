//! Full-gesture tests: start, a stream of geometry updates, stop.

use std::collections::HashSet;

use egui::{Modifiers, Pos2, Rect, Vec2};
use uuid::Uuid;

use stagecraft::arrange::drag::{
    DragController, DragEffect, DragError, DragGeometry, StagePanel,
};
use stagecraft::arrange::layout::{self, StageMetrics};
use stagecraft::domain::group::{GroupedList, TaskGroup};
use stagecraft::domain::item::StageItem;

const STAGE_SIZE: Vec2 = Vec2::new(300.0, 600.0);
const CARD_SIZE: Vec2 = Vec2::new(300.0, 80.0);

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn list_of(shape: &[&[&str]]) -> GroupedList<String> {
    GroupedList::from_groups(
        shape
            .iter()
            .map(|labels| {
                TaskGroup::new(
                    labels
                        .iter()
                        .map(|l| StageItem::new(l.to_string()))
                        .collect::<Vec<_>>(),
                )
            })
            .collect::<Vec<_>>(),
    )
}

fn shape_of(list: &GroupedList<String>) -> Vec<Vec<String>> {
    list.groups()
        .iter()
        .map(|g| g.items().iter().map(|i| i.data.clone()).collect())
        .collect()
}

fn id_of(list: &GroupedList<String>, label: &str) -> Uuid {
    list.flatten()
        .into_iter()
        .find(|f| f.item.data == label)
        .map(|f| f.item.id)
        .unwrap()
}

fn geometry_at(center: Pos2) -> DragGeometry {
    DragGeometry {
        center,
        item_size: CARD_SIZE,
        drag_dx: 0.0,
    }
}

struct Board {
    left_id: Uuid,
    right_id: Uuid,
    left_bounds: Rect,
    right_bounds: Rect,
    left: GroupedList<String>,
    right: GroupedList<String>,
}

impl Board {
    fn new(left: GroupedList<String>, right: GroupedList<String>) -> Self {
        Self {
            left_id: Uuid::new_v4(),
            right_id: Uuid::new_v4(),
            left_bounds: Rect::from_min_size(Pos2::new(0.0, 0.0), STAGE_SIZE),
            right_bounds: Rect::from_min_size(Pos2::new(316.0, 0.0), STAGE_SIZE),
            left,
            right,
        }
    }

    fn panels(&self) -> Vec<StagePanel<'_, String>> {
        vec![
            StagePanel::new(self.left_id, self.left_bounds, &self.left),
            StagePanel::new(self.right_id, self.right_bounds, &self.right),
        ]
    }
}

#[test]
fn test_same_stage_reorder_gesture() {
    init_tracing();
    let board = Board::new(list_of(&[&["a"], &["b", "c"]]), list_of(&[&["d"]]));
    let a = id_of(&board.left, "a");

    let mut controller = DragController::default();
    controller
        .start(a, &board.panels(), &HashSet::new())
        .expect("a is draggable");
    assert!(controller.is_dragging());

    // Drag a to the bottom right of its own stage: it joins [b, c].
    controller.update(
        geometry_at(Pos2::new(200.0, 400.0)),
        &board.panels(),
        Modifiers::default(),
    );
    let outcome = controller
        .stop(&board.panels(), Modifiers::default())
        .expect("a resolved target must commit");

    assert!(!controller.is_dragging(), "stop returns the machine to idle");
    assert!(matches!(
        outcome.effect,
        DragEffect::Reorder { stage, item, .. } if stage == board.left_id && item == a
    ));
    assert_eq!(outcome.commits.len(), 1, "one affected stage, one commit");
    assert_eq!(
        shape_of(&outcome.commits[0].list),
        vec![vec!["b".to_string(), "c".to_string(), "a".to_string()]],
    );
}

#[test]
fn test_cross_stage_move_gesture() {
    init_tracing();
    let board = Board::new(list_of(&[&["a"], &["b", "c"]]), list_of(&[&["d"]]));
    let a = id_of(&board.left, "a");

    let mut controller = DragController::default();
    controller.start(a, &board.panels(), &HashSet::new()).unwrap();
    controller.update(
        geometry_at(Pos2::new(460.0, 40.0)),
        &board.panels(),
        Modifiers::default(),
    );
    let outcome = controller
        .stop(&board.panels(), Modifiers::default())
        .expect("target resolved over the right stage");

    assert!(matches!(
        outcome.effect,
        DragEffect::Move { from, to, item, .. }
            if from == board.left_id && to == board.right_id && item == a
    ));
    assert_eq!(outcome.commits.len(), 2, "source and target both commit");
    let source = outcome
        .commits
        .iter()
        .find(|c| c.stage == board.left_id)
        .unwrap();
    let target = outcome
        .commits
        .iter()
        .find(|c| c.stage == board.right_id)
        .unwrap();
    assert_eq!(
        shape_of(&source.list),
        vec![vec!["b".to_string(), "c".to_string()]],
    );
    assert_eq!(
        shape_of(&target.list),
        vec![vec!["a".to_string()], vec!["d".to_string()]],
    );
}

#[test]
fn test_copy_mode_leaves_the_source_untouched() {
    init_tracing();
    let board = Board::new(list_of(&[&["a"], &["b"]]), list_of(&[&["d"]]));
    let a = id_of(&board.left, "a");
    let alt = Modifiers {
        alt: true,
        ..Modifiers::default()
    };

    let mut controller = DragController::default();
    controller.start(a, &board.panels(), &HashSet::new()).unwrap();
    controller.update(geometry_at(Pos2::new(460.0, 40.0)), &board.panels(), alt);
    assert!(controller.session().unwrap().copy_mode);

    let outcome = controller.stop(&board.panels(), alt).unwrap();
    let DragEffect::Copy { item, new_id, .. } = outcome.effect else {
        panic!("alt-drag across stages must copy");
    };
    assert_eq!(item, a);
    assert_ne!(new_id, a, "the copy gets a fresh id");

    assert_eq!(outcome.commits.len(), 1, "only the target stage commits");
    assert_eq!(outcome.commits[0].stage, board.right_id);
    let copied = outcome.commits[0].list.item(new_id).unwrap();
    assert_eq!(copied.data, "a", "payload is cloned onto the copy");
}

#[test]
fn test_copy_mode_is_sampled_at_stop() {
    init_tracing();
    let board = Board::new(list_of(&[&["a"], &["b"]]), list_of(&[&["d"]]));
    let a = id_of(&board.left, "a");

    let mut controller = DragController::default();
    controller.start(a, &board.panels(), &HashSet::new()).unwrap();
    // Alt is not held during the move...
    controller.update(
        geometry_at(Pos2::new(460.0, 40.0)),
        &board.panels(),
        Modifiers::default(),
    );
    // ...only at release.
    let alt = Modifiers {
        alt: true,
        ..Modifiers::default()
    };
    let outcome = controller.stop(&board.panels(), alt).unwrap();
    assert!(matches!(outcome.effect, DragEffect::Copy { .. }));
}

#[test]
fn test_target_is_retained_between_stages() {
    init_tracing();
    let board = Board::new(list_of(&[&["a"], &["b"]]), list_of(&[&["d"]]));
    let a = id_of(&board.left, "a");

    let mut controller = DragController::default();
    controller.start(a, &board.panels(), &HashSet::new()).unwrap();
    controller.update(
        geometry_at(Pos2::new(460.0, 40.0)),
        &board.panels(),
        Modifiers::default(),
    );
    // The pointer wanders into the gutter between the stages.
    controller.update(
        geometry_at(Pos2::new(308.0, 40.0)),
        &board.panels(),
        Modifiers::default(),
    );
    let session = controller.session().unwrap();
    assert_eq!(
        session.target_stage, board.right_id,
        "the last valid target survives a miss"
    );
    assert!(
        session.placeholder.is_some(),
        "the preview never disappears mid-gesture"
    );

    let outcome = controller
        .stop(&board.panels(), Modifiers::default())
        .unwrap();
    assert!(matches!(outcome.effect, DragEffect::Move { .. }));
}

#[test]
fn test_collapsed_and_full_stages_are_not_targets() {
    init_tracing();
    let board = Board::new(list_of(&[&["a"], &["b"]]), list_of(&[&["d"]]));
    let a = id_of(&board.left, "a");

    let mut controller = DragController::default();
    controller.start(a, &board.panels(), &HashSet::new()).unwrap();

    // The right stage is at its WIP limit: hovering it leaves the target on
    // the source stage.
    let mut panels = board.panels();
    panels[1].wip_limit = Some(1);
    controller.update(
        geometry_at(Pos2::new(460.0, 40.0)),
        &panels,
        Modifiers::default(),
    );
    assert_eq!(
        controller.session().unwrap().target_stage,
        board.left_id,
        "a full stage takes no cross-stage drops"
    );

    // Collapsed stages are skipped outright.
    let mut panels = board.panels();
    panels[1].collapsed = true;
    controller.update(
        geometry_at(Pos2::new(460.0, 40.0)),
        &panels,
        Modifiers::default(),
    );
    assert_eq!(controller.session().unwrap().target_stage, board.left_id);
}

#[test]
fn test_cancel_discards_everything() {
    init_tracing();
    let board = Board::new(list_of(&[&["a"], &["b"]]), list_of(&[&["d"]]));
    let a = id_of(&board.left, "a");

    let mut controller = DragController::default();
    controller.start(a, &board.panels(), &HashSet::new()).unwrap();
    controller.update(
        geometry_at(Pos2::new(460.0, 40.0)),
        &board.panels(),
        Modifiers::default(),
    );
    controller.cancel();
    assert!(!controller.is_dragging());
    assert!(controller.placeholder().is_none());
    assert!(
        controller
            .stop(&board.panels(), Modifiers::default())
            .is_none(),
        "a cancelled gesture has nothing left to commit"
    );
}

#[test]
fn test_stop_without_any_update_emits_nothing() {
    init_tracing();
    let board = Board::new(list_of(&[&["a"]]), list_of(&[&["d"]]));
    let a = id_of(&board.left, "a");

    let mut controller = DragController::default();
    controller.start(a, &board.panels(), &HashSet::new()).unwrap();
    assert!(
        controller
            .stop(&board.panels(), Modifiers::default())
            .is_none()
    );
    assert!(!controller.is_dragging());
}

#[test]
fn test_start_rejections() {
    init_tracing();
    let board = Board::new(list_of(&[&["a"]]), list_of(&[&["d"]]));
    let a = id_of(&board.left, "a");
    let d = id_of(&board.right, "d");

    let mut controller = DragController::default();

    let locked = HashSet::from([a]);
    assert!(matches!(
        controller.start(a, &board.panels(), &locked),
        Err(DragError::ItemLocked { .. })
    ));

    assert!(matches!(
        controller.start(Uuid::new_v4(), &board.panels(), &HashSet::new()),
        Err(DragError::ItemNotFound { .. })
    ));

    controller.start(a, &board.panels(), &HashSet::new()).unwrap();
    assert!(matches!(
        controller.start(d, &board.panels(), &HashSet::new()),
        Err(DragError::GestureInProgress)
    ));
}

#[test]
fn test_placeholder_agrees_with_the_committed_layout() {
    init_tracing();
    let metrics = StageMetrics::default();
    let board = Board::new(list_of(&[&["a"], &["b", "c"]]), list_of(&[&["d"]]));
    let a = id_of(&board.left, "a");

    let mut controller = DragController::default();
    controller.start(a, &board.panels(), &HashSet::new()).unwrap();
    controller.update(
        geometry_at(Pos2::new(200.0, 400.0)),
        &board.panels(),
        Modifiers::default(),
    );
    let placeholder = *controller.placeholder().expect("preview present");
    assert_eq!(placeholder.stage, board.left_id);
    assert!(placeholder.is_parallel);

    let outcome = controller
        .stop(&board.panels(), Modifiers::default())
        .unwrap();
    let committed = &outcome.commits[0].list;
    let (group_index, index_in_group) = committed.position_of(a).unwrap();
    let flat_index: usize = committed.groups()[..group_index]
        .iter()
        .map(|g| g.len())
        .sum::<usize>()
        + index_in_group;
    let rects = layout::item_rects(committed, &metrics, board.left_bounds.width());
    let final_rect = rects[flat_index].translate(board.left_bounds.min.to_vec2());
    assert_eq!(
        placeholder.rect, final_rect,
        "the preview slot and the committed card must be pixel-identical"
    );
}

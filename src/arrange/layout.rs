//! Vertical rhythm of a stage.
//!
//! Every card occupies a fixed height, cards are separated by a fixed gap,
//! and each complete group is followed by one extra gap. Both the live drop
//! preview and the committed arrangement are produced by the same shape
//! walk, so the placeholder a user sees is exactly where the card lands.

use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

use super::drop_position::DropDescriptor;
use crate::domain::group::GroupedList;

/// Layout configuration for stage content.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StageMetrics {
    /// Height of one task card.
    pub item_height: f32,
    /// Gap between consecutive cards; groups get one extra on top.
    pub item_gap: f32,
    /// Horizontal indent of a parallel (depth-1) card.
    pub indent_unit: f32,
}

impl Default for StageMetrics {
    fn default() -> Self {
        Self {
            item_height: 80.0,
            item_gap: 8.0,
            indent_unit: 24.0,
        }
    }
}

/// Vertical extent of one card, relative to the stage content origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemSpan {
    pub top: f32,
    pub bottom: f32,
}

/// Group sizes of a list; the only structure the layout walk needs.
pub(crate) fn group_shape<T>(list: &GroupedList<T>) -> Vec<usize> {
    list.groups().iter().map(|group| group.len()).collect()
}

fn spans_for_shape(shape: &[usize], metrics: &StageMetrics) -> Vec<ItemSpan> {
    let mut spans = Vec::with_capacity(shape.iter().sum());
    let mut y = 0.0;
    for &group_len in shape {
        for _ in 0..group_len {
            spans.push(ItemSpan {
                top: y,
                bottom: y + metrics.item_height,
            });
            y += metrics.item_height + metrics.item_gap;
        }
        // one extra gap after each complete group
        y += metrics.item_gap;
    }
    spans
}

fn rects_for_shape(shape: &[usize], metrics: &StageMetrics, stage_width: f32) -> Vec<Rect> {
    let spans = spans_for_shape(shape, metrics);
    let mut rects = Vec::with_capacity(spans.len());
    let mut span_ix = 0;
    for &group_len in shape {
        let indent = if group_len > 1 { metrics.indent_unit } else { 0.0 };
        for _ in 0..group_len {
            let span = spans[span_ix];
            rects.push(Rect::from_min_size(
                Pos2::new(indent, span.top),
                Vec2::new((stage_width - indent).max(0.0), metrics.item_height),
            ));
            span_ix += 1;
        }
    }
    rects
}

/// Top/bottom offsets of every item, in flatten order.
pub fn item_spans<T>(list: &GroupedList<T>, metrics: &StageMetrics) -> Vec<ItemSpan> {
    spans_for_shape(&group_shape(list), metrics)
}

/// Card rectangles of every item, in flatten order, relative to the stage
/// content origin. Parallel cards are indented and narrowed by the indent.
pub fn item_rects<T>(list: &GroupedList<T>, metrics: &StageMetrics, stage_width: f32) -> Vec<Rect> {
    rects_for_shape(&group_shape(list), metrics, stage_width)
}

/// Content height of a stage under these metrics, for the caller's
/// scroll handling.
pub fn content_height<T>(list: &GroupedList<T>, metrics: &StageMetrics) -> f32 {
    item_spans(list, metrics)
        .last()
        .map_or(0.0, |span| span.bottom)
}

/// Rectangle of the preview slot for a drop, relative to the stage content
/// origin.
///
/// The placeholder is laid out by inserting a phantom card into the
/// post-removal shape and running the exact walk used for committed lists,
/// so preview and final geometry agree to the pixel.
pub fn placeholder_rect<T>(
    after_removal: &GroupedList<T>,
    descriptor: &DropDescriptor,
    metrics: &StageMetrics,
    stage_width: f32,
) -> Rect {
    let mut shape = group_shape(after_removal);
    let flat_index;
    if descriptor.is_parallel && descriptor.group_index < shape.len() {
        shape[descriptor.group_index] += 1;
        let slot = descriptor.item_index.min(shape[descriptor.group_index] - 1);
        flat_index = shape[..descriptor.group_index].iter().sum::<usize>() + slot;
    } else {
        let group_index = descriptor.group_index.min(shape.len());
        shape.insert(group_index, 1);
        flat_index = shape[..group_index].iter().sum::<usize>();
    }
    rects_for_shape(&shape, metrics, stage_width)[flat_index]
}

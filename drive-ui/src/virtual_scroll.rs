//! Windowed rendering for large listings.
//!
//! Above [`VIRTUALIZATION_THRESHOLD`] items only the visible rows plus a
//! buffer on both sides are rendered. The slice sits in a block translated
//! down by `offset_y` inside a spacer of `total_height`, so the native
//! scrollbar still reflects the full list.

use std::ops::Range;
use std::time::{Duration, Instant};

pub const VIRTUALIZATION_THRESHOLD: usize = 500;
pub const SCROLL_THROTTLE: Duration = Duration::from_millis(16);
pub const DEFAULT_BUFFER_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    /// One item per fixed-height row.
    List { row_height: f64 },
    /// As many columns as fit at `min_item_width`, fixed-height rows.
    Grid {
        row_height: f64,
        min_item_width: f64,
        gap: f64,
    },
}

impl Geometry {
    pub fn row_height(&self) -> f64 {
        match *self {
            Geometry::List { row_height } | Geometry::Grid { row_height, .. } => row_height,
        }
    }

    /// `max(1, floor((width + gap) / (min_item_width + gap)))`
    pub fn columns(&self, width: f64) -> usize {
        match *self {
            Geometry::List { .. } => 1,
            Geometry::Grid {
                min_item_width,
                gap,
                ..
            } => {
                let columns = ((width + gap) / (min_item_width + gap)).floor();
                if columns.is_finite() && columns >= 1.0 {
                    columns as usize
                } else {
                    1
                }
            }
        }
    }
}

/// Everything needed to lay out one render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollFrame {
    /// Height of the spacer that stands in for the full list.
    pub total_height: f64,
    /// Vertical translation of the rendered slice.
    pub offset_y: f64,
    /// Item indexes to render, `[start, end)`.
    pub range: Range<usize>,
    pub columns: usize,
}

#[derive(Debug, Clone)]
pub struct VirtualScroller {
    geometry: Geometry,
    viewport_width: f64,
    viewport_height: f64,
    buffer_rows: usize,
    item_count: usize,
    scroll_top: f64,
    enabled: bool,
    last_applied: Option<Instant>,
    pending_scroll: Option<f64>,
}

impl VirtualScroller {
    pub fn new(geometry: Geometry, viewport_width: f64, viewport_height: f64) -> Self {
        Self {
            geometry,
            viewport_width,
            viewport_height,
            buffer_rows: DEFAULT_BUFFER_ROWS,
            item_count: 0,
            scroll_top: 0.0,
            enabled: false,
            last_applied: None,
            pending_scroll: None,
        }
    }

    pub fn with_buffer_rows(mut self, buffer_rows: usize) -> Self {
        self.buffer_rows = buffer_rows;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Records a new item count. Below the threshold the scroller switches
    /// itself off and the caller renders everything.
    pub fn update_items(&mut self, count: usize) -> bool {
        self.item_count = count;
        self.enabled = count >= VIRTUALIZATION_THRESHOLD;
        self.scroll_top = self.clamp_scroll(self.scroll_top);
        self.enabled
    }

    pub fn set_geometry(&mut self, geometry: Geometry) -> ScrollFrame {
        self.geometry = geometry;
        self.scroll_top = self.clamp_scroll(self.scroll_top);
        self.frame()
    }

    pub fn resize(&mut self, width: f64, height: f64) -> ScrollFrame {
        self.viewport_width = width;
        self.viewport_height = height;
        self.scroll_top = self.clamp_scroll(self.scroll_top);
        self.frame()
    }

    /// Applies a scroll position at most once per [`SCROLL_THROTTLE`].
    ///
    /// Returns the new frame when applied. A throttled position is kept and
    /// picked up by [`flush`](Self::flush) so the last event is never lost.
    pub fn on_scroll(&mut self, scroll_top: f64, now: Instant) -> Option<ScrollFrame> {
        let throttled = self
            .last_applied
            .is_some_and(|last| now.saturating_duration_since(last) < SCROLL_THROTTLE);
        if throttled {
            self.pending_scroll = Some(scroll_top);
            return None;
        }
        self.apply_scroll(scroll_top, now)
    }

    /// Applies a throttled position once the throttle window has passed.
    pub fn flush(&mut self, now: Instant) -> Option<ScrollFrame> {
        let ready = self
            .last_applied
            .map_or(true, |last| now.saturating_duration_since(last) >= SCROLL_THROTTLE);
        if !ready {
            return None;
        }
        let pending = self.pending_scroll.take()?;
        self.apply_scroll(pending, now)
    }

    fn apply_scroll(&mut self, scroll_top: f64, now: Instant) -> Option<ScrollFrame> {
        self.pending_scroll = None;
        self.last_applied = Some(now);
        self.scroll_top = self.clamp_scroll(scroll_top);
        Some(self.frame())
    }

    fn total_rows(&self) -> usize {
        let columns = self.geometry.columns(self.viewport_width);
        self.item_count.div_ceil(columns)
    }

    fn clamp_scroll(&self, scroll_top: f64) -> f64 {
        let total = self.total_rows() as f64 * self.geometry.row_height();
        let max = (total - self.viewport_height).max(0.0);
        if scroll_top.is_finite() {
            scroll_top.clamp(0.0, max)
        } else {
            0.0
        }
    }

    /// Layout for the current scroll position. When disabled the range
    /// covers every item and nothing is translated.
    pub fn frame(&self) -> ScrollFrame {
        let columns = self.geometry.columns(self.viewport_width);
        let row_height = self.geometry.row_height();
        let total_rows = self.total_rows();
        let total_height = total_rows as f64 * row_height;

        if !self.enabled || row_height <= 0.0 {
            return ScrollFrame {
                total_height,
                offset_y: 0.0,
                range: 0..self.item_count,
                columns,
            };
        }

        let first_visible = (self.scroll_top / row_height).floor() as usize;
        let visible_rows = (self.viewport_height / row_height).ceil() as usize + 1;
        let start_row = first_visible.saturating_sub(self.buffer_rows);
        let end_row = (first_visible + visible_rows + self.buffer_rows).min(total_rows);

        ScrollFrame {
            total_height,
            offset_y: start_row as f64 * row_height,
            range: (start_row * columns).min(self.item_count)
                ..(end_row * columns).min(self.item_count),
            columns,
        }
    }

    /// Markup for the current slice only.
    pub fn render<T>(&self, items: &[T], render_item: impl Fn(usize, &T) -> String) -> String {
        let range = self.frame().range;
        let end = range.end.min(items.len());
        let start = range.start.min(end);
        items[start..end]
            .iter()
            .enumerate()
            .map(|(offset, item)| render_item(start + offset, item))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: Geometry = Geometry::List { row_height: 40.0 };

    fn scroller(count: usize) -> VirtualScroller {
        let mut scroller = VirtualScroller::new(LIST, 800.0, 400.0).with_buffer_rows(5);
        scroller.update_items(count);
        scroller
    }

    #[test]
    fn grid_columns_follow_width() {
        let grid = Geometry::Grid {
            row_height: 180.0,
            min_item_width: 160.0,
            gap: 16.0,
        };
        assert_eq!(grid.columns(800.0), 4);
        assert_eq!(grid.columns(1000.0), 5);
        assert_eq!(grid.columns(100.0), 1);
        assert_eq!(grid.columns(0.0), 1);
    }

    #[test]
    fn below_threshold_everything_renders() {
        let scroller = scroller(499);
        assert!(!scroller.is_enabled());
        assert_eq!(scroller.frame().range, 0..499);
    }

    #[test]
    fn rendered_slice_is_independent_of_list_size() {
        for count in [500, 5_000, 50_000] {
            let scroller = scroller(count);
            let frame = scroller.frame();
            // 10 visible + 1 partial + 5 buffer below; nothing above at the top
            assert_eq!(frame.range, 0..16);
            assert_eq!(frame.total_height, count as f64 * 40.0);
        }
    }

    #[test]
    fn scrolling_to_the_end_exposes_the_last_item() {
        let mut scroller = scroller(1_000);
        let frame = scroller.on_scroll(1e9, Instant::now()).unwrap();

        assert_eq!(frame.range.end, 1_000);
        assert!(frame.range.len() < 30);
        assert_eq!(frame.offset_y, frame.range.start as f64 * 40.0);
    }

    #[test]
    fn scroll_updates_are_throttled_but_not_lost() {
        let mut scroller = scroller(1_000);
        let start = Instant::now();

        assert!(scroller.on_scroll(400.0, start).is_some());
        assert!(scroller.on_scroll(800.0, start + Duration::from_millis(5)).is_none());
        assert!(scroller.flush(start + Duration::from_millis(10)).is_none());

        let frame = scroller.flush(start + Duration::from_millis(20)).unwrap();
        assert_eq!(frame.range.start, 20 - 5);
    }

    #[test]
    fn dropping_below_threshold_disables() {
        let mut scroller = scroller(800);
        assert!(scroller.is_enabled());
        assert!(!scroller.update_items(20));
        assert_eq!(scroller.frame().range, 0..20);
    }

    #[test]
    fn grid_rows_map_to_item_ranges() {
        let mut scroller = VirtualScroller::new(
            Geometry::Grid {
                row_height: 100.0,
                min_item_width: 160.0,
                gap: 16.0,
            },
            800.0,
            300.0,
        )
        .with_buffer_rows(1);
        scroller.update_items(1_000);
        let frame = scroller.on_scroll(1_000.0, Instant::now()).unwrap();

        assert_eq!(frame.columns, 4);
        // row 10 is first visible, one buffer row above
        assert_eq!(frame.range.start, 9 * 4);
        assert_eq!(frame.offset_y, 900.0);
    }

    #[test]
    fn render_emits_only_the_slice() {
        let items: Vec<usize> = (0..2_000).collect();
        let scroller = scroller(items.len());

        let markup = scroller.render(&items, |i, _| format!("<li>{}</li>", i));

        assert_eq!(markup.matches("<li>").count(), 16);
        assert!(markup.starts_with("<li>0</li>"));
    }
}

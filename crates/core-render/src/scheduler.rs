//! Render scheduler.
//!
//! Producers (image diff, scroll, blink timers, overlays) report invalidation
//! intents (`RenderDelta`) via `mark`. On `consume` the queued deltas collapse
//! into one `FramePlan` the engine executes against the canvas.
//!
//! Merge semantics:
//! - Any `Full` in the queue makes the plan full; scrolls and regions are
//!   dropped because a full repaint covers them.
//! - `Scroll` deltas are kept in order. Damage recorded before a scroll moves
//!   with the pixels, so earlier regions are re-added shifted by `dy`.
//! - `Region` and `Cursor` rectangles merge into one normalized dirty region.
//! - When the region covers at least `ESCALATION_AREA_PCT` of the bounds the
//!   plan escalates to a full repaint.
//!
//! Examples:
//! - `Region(a) + Cursor(b)` => region `{a, b}`.
//! - `Region(a) + Scroll{r, -16}` => scroll `r`, region `{a, a - 16}`.
//! - `Scroll + Full` => full.

use crate::dirty::DirtyRegion;
use crate::geometry::Rect;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};

/// Fraction of the bounds area whose damage triggers a full repaint.
pub const ESCALATION_AREA_PCT: f32 = 0.60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderDelta {
    /// Entire widget must be repainted.
    Full,
    /// Pixel rectangle whose content changed.
    Region(Rect),
    /// Blit-scroll: `rect` (destination) receives the pixels at
    /// `rect.translate(0, -dy)`.
    Scroll { rect: Rect, dy: i32 },
    /// Only the cursor cell changed (blink phase, focus).
    Cursor(Rect),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FramePlan {
    pub full: bool,
    pub scrolls: Vec<(Rect, i32)>,
    pub region: Vec<Rect>,
    /// Damage was large enough to switch to a full repaint.
    pub escalated: bool,
}

impl FramePlan {
    pub fn is_noop(&self) -> bool {
        !self.full && self.scrolls.is_empty() && self.region.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct RenderDeltaMetrics {
    full: AtomicU64,
    region: AtomicU64,
    scroll: AtomicU64,
    cursor: AtomicU64,
    /// Scrolls discarded because a full repaint was queued with them.
    suppressed_scroll: AtomicU64,
    escalated: AtomicU64,
    /// Number of consume cycles that produced a plan.
    semantic_frames: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderDeltaMetricsSnapshot {
    pub full: u64,
    pub region: u64,
    pub scroll: u64,
    pub cursor: u64,
    pub suppressed_scroll: u64,
    pub escalated: u64,
    pub semantic_frames: u64,
}

impl RenderDeltaMetrics {
    pub fn snapshot(&self) -> RenderDeltaMetricsSnapshot {
        RenderDeltaMetricsSnapshot {
            full: self.full.load(Relaxed),
            region: self.region.load(Relaxed),
            scroll: self.scroll.load(Relaxed),
            cursor: self.cursor.load(Relaxed),
            suppressed_scroll: self.suppressed_scroll.load(Relaxed),
            escalated: self.escalated.load(Relaxed),
            semantic_frames: self.semantic_frames.load(Relaxed),
        }
    }

    fn incr(&self, delta: &RenderDelta) {
        let counter = match delta {
            RenderDelta::Full => &self.full,
            RenderDelta::Region(_) => &self.region,
            RenderDelta::Scroll { .. } => &self.scroll,
            RenderDelta::Cursor(_) => &self.cursor,
        };
        counter.fetch_add(1, Relaxed);
    }
}

#[derive(Debug, Default)]
pub struct RenderScheduler {
    pending: Vec<RenderDelta>,
    metrics: RenderDeltaMetrics,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics_snapshot(&self) -> RenderDeltaMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Record a delta. Empty rectangles and zero scrolls are dropped.
    pub fn mark(&mut self, delta: RenderDelta) {
        let empty = match &delta {
            RenderDelta::Full => false,
            RenderDelta::Region(r) | RenderDelta::Cursor(r) => r.is_empty(),
            RenderDelta::Scroll { rect, dy } => rect.is_empty() || *dy == 0,
        };
        if empty {
            return;
        }
        tracing::trace!(target: "render.scheduler", ?delta, "render_mark");
        self.metrics.incr(&delta);
        self.pending.push(delta);
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_full_pending(&self) -> bool {
        self.pending.iter().any(|d| matches!(d, RenderDelta::Full))
    }

    /// Collapse queued deltas into a plan clipped to `bounds`.
    pub fn consume(&mut self, bounds: Rect) -> Option<FramePlan> {
        if self.pending.is_empty() {
            return None;
        }
        let mut plan = self.collapse(bounds);
        self.pending.clear();
        if !plan.full {
            let area: i64 = plan
                .region
                .iter()
                .map(|r| r.width as i64 * r.height as i64)
                .sum();
            let total = bounds.width as i64 * bounds.height as i64;
            if total > 0 && area as f32 >= total as f32 * ESCALATION_AREA_PCT {
                plan = FramePlan {
                    full: true,
                    escalated: true,
                    ..FramePlan::default()
                };
                self.metrics.escalated.fetch_add(1, Relaxed);
            }
        }
        self.metrics.semantic_frames.fetch_add(1, Relaxed);
        tracing::trace!(
            target: "render.scheduler",
            full = plan.full,
            scrolls = plan.scrolls.len(),
            rects = plan.region.len(),
            "render_delta_collapse"
        );
        Some(plan)
    }

    fn collapse(&self, bounds: Rect) -> FramePlan {
        if self.is_full_pending() {
            let dropped = self
                .pending
                .iter()
                .filter(|d| matches!(d, RenderDelta::Scroll { .. }))
                .count();
            if dropped > 0 {
                self.metrics.suppressed_scroll.fetch_add(dropped as u64, Relaxed);
            }
            return FramePlan {
                full: true,
                ..FramePlan::default()
            };
        }
        let mut region = DirtyRegion::new();
        let mut scrolls = Vec::new();
        for d in &self.pending {
            match d {
                RenderDelta::Full => {}
                RenderDelta::Region(r) | RenderDelta::Cursor(r) => region.add(*r),
                RenderDelta::Scroll { rect, dy } => {
                    let mut moved = region.clone();
                    moved.translate(*dy);
                    moved.clip(*rect);
                    region.extend(moved.take());
                    scrolls.push((*rect, *dy));
                }
            }
        }
        region.clip(bounds);
        FramePlan {
            full: false,
            scrolls,
            region: region.take(),
            escalated: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: Rect = Rect::new(0, 0, 800, 480);

    #[test]
    fn regions_merge() {
        let mut s = RenderScheduler::new();
        s.mark(RenderDelta::Region(Rect::new(0, 0, 80, 16)));
        s.mark(RenderDelta::Region(Rect::new(0, 16, 80, 16)));
        s.mark(RenderDelta::Cursor(Rect::new(100, 100, 8, 16)));
        let plan = s.consume(BOUNDS).expect("plan");
        assert!(!plan.full);
        assert_eq!(
            plan.region,
            vec![Rect::new(0, 0, 80, 32), Rect::new(100, 100, 8, 16)]
        );
        assert!(s.consume(BOUNDS).is_none(), "second consume empty");
    }

    #[test]
    fn full_overrides_all() {
        let mut s = RenderScheduler::new();
        s.mark(RenderDelta::Region(Rect::new(0, 0, 8, 8)));
        s.mark(RenderDelta::Scroll {
            rect: Rect::new(0, 0, 80, 64),
            dy: -16,
        });
        s.mark(RenderDelta::Full);
        let plan = s.consume(BOUNDS).expect("plan");
        assert!(plan.full);
        assert!(plan.scrolls.is_empty() && plan.region.is_empty());
        assert_eq!(s.metrics_snapshot().suppressed_scroll, 1);
    }

    #[test]
    fn pending_damage_moves_with_scroll() {
        let mut s = RenderScheduler::new();
        s.mark(RenderDelta::Region(Rect::new(0, 32, 80, 16)));
        s.mark(RenderDelta::Scroll {
            rect: Rect::new(0, 0, 80, 48),
            dy: -16,
        });
        let plan = s.consume(BOUNDS).expect("plan");
        assert_eq!(plan.scrolls, vec![(Rect::new(0, 0, 80, 48), -16)]);
        assert_eq!(plan.region, vec![Rect::new(0, 16, 80, 32)]);
    }

    #[test]
    fn empty_marks_ignored() {
        let mut s = RenderScheduler::new();
        s.mark(RenderDelta::Region(Rect::default()));
        s.mark(RenderDelta::Scroll {
            rect: Rect::new(0, 0, 1, 1),
            dy: 0,
        });
        assert!(!s.has_pending());
        assert!(s.consume(BOUNDS).is_none());
    }

    #[test]
    fn large_damage_escalates() {
        let mut s = RenderScheduler::new();
        s.mark(RenderDelta::Region(Rect::new(0, 0, 800, 300)));
        let plan = s.consume(BOUNDS).expect("plan");
        assert!(plan.full && plan.escalated);
        let snap = s.metrics_snapshot();
        assert_eq!(snap.escalated, 1);
        assert_eq!(snap.region, 1);
        assert_eq!(snap.semantic_frames, 1);
    }

    #[test]
    fn region_clipped_to_bounds() {
        let mut s = RenderScheduler::new();
        s.mark(RenderDelta::Region(Rect::new(790, 470, 20, 20)));
        let plan = s.consume(BOUNDS).expect("plan");
        assert_eq!(plan.region, vec![Rect::new(790, 470, 10, 10)]);
    }
}

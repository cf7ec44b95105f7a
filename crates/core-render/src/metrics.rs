//! Render path metrics.
//!
//! Distinct from `RenderDeltaMetrics` (scheduler), which counts invalidation
//! requests. This struct records what the paint path actually did, so the
//! two can be correlated when diagnosing excess repaints.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RenderPathMetrics {
    /// Paint calls that produced any drawing.
    pub frames_painted: AtomicU64,
    /// Frames repainted in full (resize, escalation, explicit invalidation).
    pub full_frames: AtomicU64,
    /// Frames restricted to dirty rectangles and scroll blits.
    pub partial_frames: AtomicU64,
    /// Runs produced by image diffs.
    pub runs_emitted: AtomicU64,
    /// Runs drawn by `paint_contents`.
    pub runs_painted: AtomicU64,
    /// Cells compared by image diffs.
    pub cells_diffed: AtomicU64,
    /// Rows reported dirty by image diffs.
    pub dirty_rows: AtomicU64,
    /// Canvas scrolls executed instead of repainting rows.
    pub scroll_blits: AtomicU64,
    /// Partial frames promoted to full because the damage was large.
    pub escalated_large_region: AtomicU64,
    /// Cache rebuilds caused by grid size changes.
    pub resize_invalidations: AtomicU64,
    /// Duration (ns) of the most recent paint.
    pub last_paint_ns: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderPathMetricsSnapshot {
    pub frames_painted: u64,
    pub full_frames: u64,
    pub partial_frames: u64,
    pub runs_emitted: u64,
    pub runs_painted: u64,
    pub cells_diffed: u64,
    pub dirty_rows: u64,
    pub scroll_blits: u64,
    pub escalated_large_region: u64,
    pub resize_invalidations: u64,
    pub last_paint_ns: u64,
}

impl RenderPathMetrics {
    pub fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RenderPathMetricsSnapshot {
        RenderPathMetricsSnapshot {
            frames_painted: self.frames_painted.load(Ordering::Relaxed),
            full_frames: self.full_frames.load(Ordering::Relaxed),
            partial_frames: self.partial_frames.load(Ordering::Relaxed),
            runs_emitted: self.runs_emitted.load(Ordering::Relaxed),
            runs_painted: self.runs_painted.load(Ordering::Relaxed),
            cells_diffed: self.cells_diffed.load(Ordering::Relaxed),
            dirty_rows: self.dirty_rows.load(Ordering::Relaxed),
            scroll_blits: self.scroll_blits.load(Ordering::Relaxed),
            escalated_large_region: self.escalated_large_region.load(Ordering::Relaxed),
            resize_invalidations: self.resize_invalidations.load(Ordering::Relaxed),
            last_paint_ns: self.last_paint_ns.load(Ordering::Relaxed),
        }
    }
}

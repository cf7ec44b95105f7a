//! RenderEngine: owns the cached grid and turns content updates into canvas
//! operations.
//!
//! Update side (`set_image`, `scroll_image`, geometry and palette changes)
//! never touches the canvas. It diffs, shifts the cache and records
//! invalidations in the `RenderScheduler`. Paint side (`paint`) consumes the
//! collapsed plan: a full repaint erases the margins and repaints the whole
//! grid; a partial frame executes scroll blits first and then repaints the
//! dirty rectangles. Overlays (suspended banner, size indicator) are painted
//! last on every frame they are active.
//!
//! Cache invariant: after `set_image` the cached grid equals the pixels the
//! next paint leaves on the canvas for the used extent. `scroll_image` keeps
//! this true by shifting cache rows exactly as the canvas blit shifts pixels;
//! revealed rows keep their stale content on both sides until the follow-up
//! `set_image` repaints them.

use crate::canvas::{Canvas, TextStyle};
use crate::diff::{Composition, DiffReport, diff_image};
use crate::font::{CellMetrics, FontMeasure};
use crate::geometry::{Geometry, Rect, SCROLLBAR_WIDTH};
use crate::metrics::{RenderPathMetrics, RenderPathMetricsSnapshot};
use crate::paint::{PaintContext, PaintSummary, paint_contents};
use crate::palette::{ColorEntry, Palette, Rgba};
use crate::scheduler::{RenderDelta, RenderDeltaMetricsSnapshot, RenderScheduler};
use crate::scrollbar::ScrollbarState;
use core_config::{BoldMode, ConfigFile, ScrollbarLocation};
use core_grid::{Cell, Image, LineProperties, LineProperty, Rendition};
use std::sync::atomic::Ordering::Relaxed;
use std::time::Instant;
use tracing::{debug, trace};

pub const SUSPENDED_BANNER: &str =
    "Output has been suspended by pressing Ctrl+S. Press Ctrl+Q to resume.";
const BANNER_COLOR: Rgba = Rgba::rgb(255, 250, 150);

/// Blink and focus state sampled by one paint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PaintState {
    pub text_blink_off: bool,
    pub cursor_blink_off: bool,
    pub focused: bool,
}

/// Outcome of `set_image`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageUpdate {
    pub report: DiffReport,
    /// Grid size the resize indicator started showing, if it did.
    pub size_hint: Option<(usize, usize)>,
}

pub struct RenderEngine {
    image: Image,
    props: LineProperties,
    used_columns: usize,
    used_lines: usize,
    geometry: Geometry,
    widget: (i32, i32),
    /// Metrics of the current font without line spacing.
    font: CellMetrics,
    cell: CellMetrics,
    line_spacing: u16,
    scrollbar_location: ScrollbarLocation,
    scrollbar_width: i32,
    fixed_size: Option<(usize, usize)>,
    palette: Palette,
    backdrop: Option<Rgba>,
    bold_mode: BoldMode,
    composition: Option<Composition>,
    scrollbar: ScrollbarState,
    scheduler: RenderScheduler,
    metrics: RenderPathMetrics,
    cursor_rect: Option<Rect>,
    size_hint: Option<(usize, usize)>,
    suspended: bool,
    resize_pending: bool,
    /// No image has completed a resize handshake yet.
    startup: bool,
    terminal_size_hint: bool,
}

impl RenderEngine {
    pub fn new(config: &ConfigFile) -> Self {
        let display = &config.display;
        let translucency = &display.translucency;
        let backdrop = translucency.is_active().then(|| {
            let [r, g, b] = translucency.backdrop;
            Rgba::rgba(r, g, b, translucency.alpha)
        });
        let font = CellMetrics::default();
        let mut engine = Self {
            image: Image::new(0, 0),
            props: LineProperties::new(),
            used_columns: 0,
            used_lines: 0,
            geometry: Geometry::default(),
            widget: (0, 0),
            font,
            cell: font,
            line_spacing: display.line_spacing,
            scrollbar_location: display.scrollbar,
            scrollbar_width: SCROLLBAR_WIDTH,
            fixed_size: None,
            palette: Palette::default(),
            backdrop,
            bold_mode: display.bold,
            composition: None,
            scrollbar: ScrollbarState::default(),
            scheduler: RenderScheduler::new(),
            metrics: RenderPathMetrics::default(),
            cursor_rect: None,
            size_hint: None,
            suspended: false,
            resize_pending: false,
            startup: true,
            terminal_size_hint: display.terminal_size_hint,
        };
        engine.apply_line_spacing();
        engine
    }

    // ---- accessors -------------------------------------------------------

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn cell_metrics(&self) -> &CellMetrics {
        &self.cell
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn line_properties(&self) -> &LineProperties {
        &self.props
    }

    pub fn used_columns(&self) -> usize {
        self.used_columns
    }

    pub fn used_lines(&self) -> usize {
        self.used_lines
    }

    pub fn columns(&self) -> usize {
        self.geometry.columns
    }

    pub fn lines(&self) -> usize {
        self.geometry.lines
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn scrollbar(&self) -> &ScrollbarState {
        &self.scrollbar
    }

    pub fn cursor_rect(&self) -> Option<Rect> {
        self.cursor_rect
    }

    pub fn size_hint(&self) -> Option<(usize, usize)> {
        self.size_hint
    }

    pub fn is_suspended_banner_shown(&self) -> bool {
        self.suspended
    }

    pub fn has_pending(&self) -> bool {
        self.scheduler.has_pending()
    }

    pub fn metrics_snapshot(&self) -> RenderPathMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn delta_metrics_snapshot(&self) -> RenderDeltaMetricsSnapshot {
        self.scheduler.metrics_snapshot()
    }

    // ---- geometry --------------------------------------------------------

    /// Widget resized. Returns the new grid size when it changed.
    pub fn resize(&mut self, width: i32, height: i32) -> Option<(usize, usize)> {
        self.widget = (width, height);
        self.propagate_size()
    }

    /// Take cell metrics from `font`. Returns the new grid size when it
    /// changed.
    pub fn set_font(&mut self, font: &dyn FontMeasure) -> Option<(usize, usize)> {
        self.font = CellMetrics::measure(font, 0);
        self.apply_line_spacing();
        debug!(
            target: "render.geometry",
            width = self.cell.width,
            height = self.cell.height,
            fixed = self.cell.fixed_pitch,
            "font_metrics"
        );
        self.propagate_size()
    }

    pub fn set_line_spacing(&mut self, spacing: u16) -> Option<(usize, usize)> {
        self.line_spacing = spacing;
        self.apply_line_spacing();
        self.propagate_size()
    }

    pub fn set_scrollbar_location(&mut self, location: ScrollbarLocation) -> Option<(usize, usize)> {
        if location == self.scrollbar_location {
            return None;
        }
        self.scrollbar_location = location;
        self.propagate_size()
    }

    pub fn set_scrollbar_width(&mut self, width: i32) -> Option<(usize, usize)> {
        self.scrollbar_width = width.max(1);
        self.propagate_size()
    }

    /// Pin the grid to `columns x lines` regardless of pixel size.
    pub fn set_fixed_size(&mut self, columns: usize, lines: usize) -> Option<(usize, usize)> {
        self.fixed_size = Some((columns.max(1), lines.max(1)));
        self.propagate_size()
    }

    fn apply_line_spacing(&mut self) {
        let ls = self.line_spacing as i32;
        self.cell = CellMetrics {
            height: (self.font.height + ls).max(1),
            line_spacing: ls,
            ..self.font
        };
    }

    fn propagate_size(&mut self) -> Option<(usize, usize)> {
        let (w, h) = self.widget;
        self.geometry = Geometry::calc_with_bar(
            w,
            h,
            &self.cell,
            self.scrollbar_location,
            self.scrollbar_width,
            self.fixed_size,
        );
        self.update_image_size()
    }

    /// Reallocate the cached grid for the current geometry, keeping the
    /// overlapping top-left block.
    fn update_image_size(&mut self) -> Option<(usize, usize)> {
        let (columns, lines) = (self.geometry.columns, self.geometry.lines);
        self.scrollbar.set_page(lines as i32);
        self.scheduler.mark(RenderDelta::Full);
        if self.image.rows() == lines && self.image.columns() == columns {
            return None;
        }
        let mut next = Image::new(lines, columns);
        next.copy_region_from(&self.image, self.used_lines, self.used_columns);
        self.image = next;
        self.used_lines = self.used_lines.min(lines);
        self.used_columns = self.used_columns.min(columns);
        self.resize_pending = true;
        self.metrics.resize_invalidations.fetch_add(1, Relaxed);
        debug!(target: "render.geometry", columns, lines, "image_resized");
        Some((columns, lines))
    }

    /// Cell under a widget pixel, clamped to the used area.
    pub fn character_position(&self, x: i32, y: i32) -> (i32, i32) {
        self.geometry
            .character_position(x, y, self.used_columns, self.used_lines)
    }

    // ---- content ---------------------------------------------------------

    /// Diff `image` against the cache, copy it in and schedule the damage.
    pub fn set_image(&mut self, image: &Image) -> ImageUpdate {
        let lines = image.rows().min(self.image.rows());
        let columns = image.columns().min(self.image.columns());
        let report = diff_image(
            &mut self.image,
            image,
            lines,
            columns,
            &self.props,
            self.composition.as_ref(),
        );

        let g = self.geometry;
        for &row in &report.full_rows {
            let mut r = g.cells_rect(0, row, self.image.columns());
            if self.props.get(row).contains(LineProperty::DOUBLE_HEIGHT) {
                r.height *= 2;
            }
            self.scheduler.mark(RenderDelta::Region(r));
        }
        for run in &report.runs {
            if report.full_rows.contains(&run.row) {
                continue;
            }
            let r = g.cells_rect(run.start, run.row, run.columns);
            self.scheduler.mark(RenderDelta::Region(r));
        }
        // erase whatever the previous, larger image left behind
        if lines < self.used_lines {
            self.scheduler.mark(RenderDelta::Region(Rect::new(
                g.bx,
                g.by + g.cell_height * lines as i32,
                g.cell_width * self.image.columns() as i32,
                g.cell_height * (self.used_lines - lines) as i32,
            )));
        }
        if columns < self.used_columns {
            self.scheduler.mark(RenderDelta::Region(Rect::new(
                g.bx + g.cell_width * columns as i32,
                g.by,
                g.cell_width * (self.used_columns - columns) as i32,
                g.cell_height * self.image.rows() as i32,
            )));
        }
        if lines < self.used_lines || columns < self.used_columns {
            self.blank_outside(lines, columns);
        }
        self.used_lines = lines;
        self.used_columns = columns;

        RenderPathMetrics::add(&self.metrics.runs_emitted, report.runs.len());
        RenderPathMetrics::add(&self.metrics.cells_diffed, report.cells_diffed);
        RenderPathMetrics::add(&self.metrics.dirty_rows, report.dirty_rows.len());

        let mut size_hint = None;
        if self.resize_pending {
            self.resize_pending = false;
            if self.terminal_size_hint {
                if self.startup {
                    self.startup = false;
                } else {
                    let hint = (self.geometry.columns, self.geometry.lines);
                    if let Some(old) = self.size_hint_rect() {
                        self.scheduler.mark(RenderDelta::Region(old));
                    }
                    self.size_hint = Some(hint);
                    size_hint = Some(hint);
                    if let Some(r) = self.size_hint_rect() {
                        self.scheduler.mark(RenderDelta::Region(r));
                    }
                }
            }
        }
        ImageUpdate { report, size_hint }
    }

    /// Blank cached cells outside `lines x columns` so they match the erased
    /// pixels.
    fn blank_outside(&mut self, lines: usize, columns: usize) {
        for row in 0..self.image.rows() {
            let cells = self.image.row_mut(row);
            let from = if row < lines { columns.min(cells.len()) } else { 0 };
            cells[from..].fill(Cell::BLANK);
        }
    }

    pub fn set_line_properties(&mut self, props: LineProperties) {
        self.props = props;
    }

    /// Shift the cached rows by `n` (positive: content moves up) and queue
    /// the matching canvas blit. Returns false when nothing was scrolled.
    pub fn scroll_image(&mut self, n: i32) -> bool {
        let shift = n.unsigned_abs() as usize;
        if n == 0 || self.image.is_empty() || shift >= self.used_lines {
            return false;
        }
        self.image.scroll_rows(n as isize, self.used_lines);
        let g = self.geometry;
        let height = g.cell_height * (self.used_lines - shift) as i32;
        let width = g.cell_width * self.used_columns as i32;
        let rect = if n > 0 {
            Rect::new(g.bx, g.by, width, height)
        } else {
            Rect::new(g.bx, g.by + g.cell_height * shift as i32, width, height)
        };
        let dy = -g.cell_height * n;
        trace!(target: "render.scroll", n, dy, "scroll_image");
        self.scheduler.mark(RenderDelta::Scroll { rect, dy });
        true
    }

    // ---- palette ---------------------------------------------------------

    pub fn set_color_table(&mut self, table: &[ColorEntry]) {
        self.palette.set_table(table);
        self.scheduler.mark(RenderDelta::Full);
    }

    /// Exchange default foreground and background (visual bell).
    pub fn swap_default_colors(&mut self) {
        self.palette.swap_defaults();
        self.scheduler.mark(RenderDelta::Full);
    }

    // ---- composition -----------------------------------------------------

    pub fn set_composition(&mut self, composition: Composition) {
        self.invalidate_composition();
        self.composition = (!composition.is_empty()).then_some(composition);
        self.invalidate_composition();
    }

    pub fn clear_composition(&mut self) {
        self.invalidate_composition();
        self.composition = None;
    }

    fn invalidate_composition(&mut self) {
        if let Some(c) = &self.composition {
            let r = self.geometry.cells_rect(c.start, c.line, c.end - c.start);
            self.scheduler.mark(RenderDelta::Region(r));
        }
    }

    // ---- overlays --------------------------------------------------------

    /// Show or hide the flow-control banner.
    pub fn set_suspended_banner(&mut self, shown: bool) {
        if shown == self.suspended {
            return;
        }
        self.suspended = shown;
        let r = self.banner_rect();
        self.scheduler.mark(RenderDelta::Region(r));
    }

    pub fn hide_size_hint(&mut self) {
        if let Some(r) = self.size_hint_rect() {
            self.scheduler.mark(RenderDelta::Region(r));
        }
        self.size_hint = None;
    }

    fn banner_rect(&self) -> Rect {
        let g = &self.geometry;
        Rect::new(g.bx, g.by, g.cell_width * g.columns as i32, g.cell_height)
    }

    fn size_hint_label(&self) -> Option<String> {
        self.size_hint
            .map(|(columns, lines)| format!("Size: {columns} x {lines}"))
    }

    fn size_hint_rect(&self) -> Option<Rect> {
        let label = self.size_hint_label()?;
        let g = &self.geometry;
        let w = (label.chars().count() as i32 + 4) * g.cell_width;
        let h = 3 * g.cell_height;
        Some(Rect::new(
            (g.widget.width - w) / 2,
            (g.widget.height - h) / 2,
            w,
            h,
        ))
    }

    // ---- scrollbar -------------------------------------------------------

    /// Update the history range. Returns true when the bar changed.
    pub fn set_scroll(&mut self, cursor: i32, lines: i32) -> bool {
        let changed = self.scrollbar.set_scroll(cursor, lines);
        if changed {
            self.invalidate_scrollbar();
        }
        changed
    }

    /// Move the scrollbar by `delta` lines. Returns the new value if it moved.
    pub fn nudge_scroll(&mut self, delta: i32) -> Option<i32> {
        let moved = self.scrollbar.nudge(delta);
        if moved.is_some() {
            self.invalidate_scrollbar();
        }
        moved
    }

    fn invalidate_scrollbar(&mut self) {
        if let Some(bar) = self.geometry.scrollbar {
            self.scheduler.mark(RenderDelta::Region(bar));
        }
    }

    // ---- invalidation ----------------------------------------------------

    pub fn mark_full(&mut self) {
        self.scheduler.mark(RenderDelta::Full);
    }

    pub fn mark_region(&mut self, rect: Rect) {
        self.scheduler.mark(RenderDelta::Region(rect));
    }

    /// Repaint the last painted cursor cell (blink phase or focus change).
    pub fn invalidate_cursor(&mut self) {
        if let Some(r) = self.cursor_rect {
            self.scheduler.mark(RenderDelta::Cursor(r));
        }
    }

    /// Repaint every blinking run (text blink phase change).
    pub fn invalidate_blinking(&mut self) {
        let g = self.geometry;
        for row in 0..self.used_lines {
            let cells = self.image.row(row);
            let mut col = 0;
            while col < self.used_columns {
                if !cells[col].rendition.contains(Rendition::BLINK) {
                    col += 1;
                    continue;
                }
                let start = col;
                while col < self.used_columns && cells[col].rendition.contains(Rendition::BLINK) {
                    col += 1;
                }
                let mut r = g.cells_rect(start, row, col - start);
                let prop = self.props.get(row);
                if prop.contains(LineProperty::DOUBLE_WIDTH) {
                    r = g.cells_rect(0, row, self.image.columns());
                }
                if prop.contains(LineProperty::DOUBLE_HEIGHT) {
                    r.height *= 2;
                }
                self.scheduler.mark(RenderDelta::Region(r));
            }
        }
    }

    // ---- painting --------------------------------------------------------

    fn context(&self, state: PaintState) -> PaintContext<'_> {
        PaintContext {
            geometry: &self.geometry,
            cell: &self.cell,
            palette: &self.palette,
            backdrop: self.backdrop,
            bold_mode: self.bold_mode,
            text_blink_off: state.text_blink_off,
            cursor_blink_off: state.cursor_blink_off,
            focused: state.focused,
            printer_friendly: false,
            printer_bold: false,
            fixed_font: self.cell.fixed_pitch,
            clear: true,
            composition: self.composition.as_ref(),
        }
    }

    /// Execute pending invalidations. Returns `None` when nothing was
    /// pending. The canvas is not flushed.
    pub fn paint(&mut self, canvas: &mut dyn Canvas, state: PaintState) -> Option<PaintSummary> {
        let plan = self.scheduler.consume(self.geometry.widget)?;
        let started = Instant::now();
        let ctx = self.context(state);
        let g = &self.geometry;
        let mut summary = PaintSummary::default();
        let mut absorb = |s: PaintSummary| {
            summary.runs += s.runs;
            if s.cursor.is_some() {
                summary.cursor = s.cursor;
            }
        };

        if plan.full {
            let erase = ctx.erase_color();
            for margin in g.margins() {
                canvas.fill_rect(margin, erase);
            }
            absorb(paint_contents(&ctx, canvas, &self.image, &self.props, g.emulation_area()));
            if let Some(bar) = g.scrollbar {
                self.scrollbar.paint(canvas, bar);
            }
            self.metrics.full_frames.fetch_add(1, Relaxed);
            if plan.escalated {
                self.metrics.escalated_large_region.fetch_add(1, Relaxed);
            }
        } else {
            for &(rect, dy) in &plan.scrolls {
                canvas.scroll(rect, dy);
                self.metrics.scroll_blits.fetch_add(1, Relaxed);
            }
            let mut bar_dirty = false;
            for rect in &plan.region {
                match g.scrollbar {
                    Some(bar) if bar.contains_rect(rect) => bar_dirty = true,
                    Some(bar) => {
                        bar_dirty |= bar.intersects(rect);
                        absorb(paint_contents(&ctx, canvas, &self.image, &self.props, *rect));
                    }
                    None => absorb(paint_contents(&ctx, canvas, &self.image, &self.props, *rect)),
                }
            }
            if let (true, Some(bar)) = (bar_dirty, g.scrollbar) {
                self.scrollbar.paint(canvas, bar);
            }
            self.metrics.partial_frames.fetch_add(1, Relaxed);
        }

        self.paint_overlays(canvas, &ctx);

        if summary.cursor.is_some() {
            self.cursor_rect = summary.cursor;
        }
        let elapsed = started.elapsed().as_nanos() as u64;
        self.metrics.frames_painted.fetch_add(1, Relaxed);
        RenderPathMetrics::add(&self.metrics.runs_painted, summary.runs);
        self.metrics.last_paint_ns.store(elapsed, Relaxed);
        trace!(
            target: "render.paint",
            full = plan.full,
            scrolls = plan.scrolls.len(),
            rects = plan.region.len(),
            runs = summary.runs,
            "paint"
        );
        Some(summary)
    }

    fn paint_overlays(&self, canvas: &mut dyn Canvas, ctx: &PaintContext<'_>) {
        let g = &self.geometry;
        if self.suspended {
            let r = self.banner_rect();
            canvas.fill_rect(r, BANNER_COLOR);
            let style = TextStyle::plain(Rgba::BLACK);
            canvas.draw_text(r, r.y + self.cell.baseline(), SUSPENDED_BANNER, &style);
        }
        if let (Some(label), Some(r)) = (self.size_hint_label(), self.size_hint_rect()) {
            let fg = self.palette.default_foreground();
            canvas.fill_rect(r, ctx.erase_color());
            canvas.draw_rect(r, fg);
            let text = Rect::new(
                r.x + 2 * g.cell_width,
                r.y + g.cell_height,
                r.width - 4 * g.cell_width,
                g.cell_height,
            );
            canvas.draw_text(text, text.y + self.cell.baseline(), &label, &TextStyle::plain(fg));
        }
    }

    /// Paint the used area for printing: no background erase, no blinking,
    /// black text when `friendly`, the canvas' own bold face unless `exact`.
    pub fn print(&self, canvas: &mut dyn Canvas, friendly: bool, exact: bool) -> PaintSummary {
        let ctx = PaintContext {
            printer_friendly: friendly,
            printer_bold: !exact,
            fixed_font: false,
            clear: false,
            ..self.context(PaintState {
                focused: true,
                ..PaintState::default()
            })
        };
        let area = self.geometry.block_rect(self.used_columns, self.used_lines);
        debug!(target: "render.paint", friendly, exact, "print");
        paint_contents(&ctx, canvas, &self.image, &self.props, area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{PaintOp, RecordingCanvas};
    use crate::font::FixedFont;
    use core_grid::CellColor;

    fn engine(cols: i32, lines: i32) -> RenderEngine {
        let mut config = ConfigFile::default();
        config.display.scrollbar = ScrollbarLocation::None;
        let mut e = RenderEngine::new(&config);
        e.set_font(&FixedFont::new("mono", 8, 16, 12));
        // rim on both sides; height carries one spare pixel
        e.resize(cols * 8 + 2, lines * 16 + 1);
        e
    }

    fn painted(e: &mut RenderEngine) -> RecordingCanvas {
        let mut canvas = RecordingCanvas::new();
        e.paint(&mut canvas, PaintState::default());
        canvas
    }

    #[test]
    fn resize_announces_new_size_once() {
        let mut config = ConfigFile::default();
        config.display.scrollbar = ScrollbarLocation::None;
        let mut e = RenderEngine::new(&config);
        e.set_font(&FixedFont::new("mono", 8, 16, 12));
        assert_eq!(e.resize(80 * 8 + 2, 24 * 16 + 1), Some((80, 24)));
        assert_eq!(e.resize(80 * 8 + 2, 24 * 16 + 1), None);
        assert_eq!(e.image().rows(), 24);
        assert_eq!(e.metrics_snapshot().resize_invalidations, 2);
    }

    #[test]
    fn resize_keeps_overlapping_content() {
        let mut e = engine(10, 4);
        e.set_image(&Image::from_lines(10, &["hello", "world"]));
        e.resize(6 * 8 + 2, 2 * 16 + 1);
        assert_eq!(e.image().row_text(0), "hello ");
        assert_eq!(e.image().row_text(1), "world ");
        assert_eq!((e.used_columns(), e.used_lines()), (6, 2));
    }

    #[test]
    fn first_resize_skips_size_hint() {
        let mut e = engine(10, 4);
        let first = e.set_image(&Image::new(4, 10));
        assert_eq!(first.size_hint, None);
        e.resize(12 * 8 + 2, 4 * 16 + 1);
        let second = e.set_image(&Image::new(4, 12));
        assert_eq!(second.size_hint, Some((12, 4)));
        let canvas = painted(&mut e);
        assert!(canvas.texts().contains(&"Size: 12 x 4"));
        e.hide_size_hint();
        assert!(e.size_hint().is_none());
        assert!(e.has_pending());
    }

    #[test]
    fn identical_image_paints_nothing() {
        let mut e = engine(10, 3);
        let img = Image::from_lines(10, &["abc", "def", "ghi"]);
        e.set_image(&img);
        painted(&mut e);
        let update = e.set_image(&img);
        assert!(update.report.runs.is_empty());
        assert!(!e.has_pending());
    }

    #[test]
    fn partial_frame_repaints_only_changed_run() {
        let mut e = engine(10, 3);
        e.set_image(&Image::from_lines(10, &["aaaaaaaaaa"; 3]));
        painted(&mut e);
        let update = e.set_image(&Image::from_lines(10, &["aaaaaaaaaa", "aaaaXaaaaa", "aaaaaaaaaa"]));
        assert_eq!(update.report.dirty_rows, vec![1]);
        let canvas = painted(&mut e);
        assert_eq!(canvas.texts(), vec!["aXa"]);
        let snap = e.metrics_snapshot();
        assert_eq!(snap.partial_frames, 1);
        assert_eq!(snap.full_frames, 1);
    }

    #[test]
    fn scroll_blits_and_repaints_revealed_rows() {
        let rows: Vec<String> = (0..10).map(|i| format!("line{i}")).collect();
        let old: Vec<&str> = rows.iter().map(String::as_str).collect();
        let mut e = engine(10, 10);
        e.set_image(&Image::from_lines(10, &old));
        painted(&mut e);

        assert!(e.scroll_image(2));
        let mut next: Vec<&str> = old[2..].to_vec();
        next.extend(["fresh8", "fresh9"]);
        let update = e.set_image(&Image::from_lines(10, &next));
        assert_eq!(update.report.dirty_rows, vec![8, 9]);

        let canvas = painted(&mut e);
        assert_eq!(canvas.scrolls(), vec![(Rect::new(1, 1, 80, 128), -32)]);
        // dilation pulls the trailing blank into each run
        assert_eq!(canvas.texts(), vec!["fresh8 ", "fresh9 "]);
        assert_eq!(e.metrics_snapshot().scroll_blits, 1);
    }

    #[test]
    fn scroll_rejects_out_of_range() {
        let mut e = engine(10, 4);
        assert!(!e.scroll_image(1), "no content yet");
        e.set_image(&Image::new(4, 10));
        assert!(!e.scroll_image(4));
        assert!(!e.scroll_image(0));
        assert!(e.scroll_image(-3));
    }

    #[test]
    fn shrinking_image_erases_stale_area() {
        let mut e = engine(10, 4);
        e.set_image(&Image::from_lines(10, &["abc", "def", "ghi", "jkl"]));
        painted(&mut e);
        e.set_image(&Image::from_lines(10, &["abc", "def"]));
        let canvas = painted(&mut e);
        let erase = e.palette().default_background();
        assert!(canvas.fills().contains(&(Rect::new(1, 33, 80, 32), erase)));
        assert_eq!(e.used_lines(), 2);
    }

    #[test]
    fn full_repaint_erases_margins_and_paints_scrollbar() {
        let mut config = ConfigFile::default();
        config.display.scrollbar = ScrollbarLocation::Right;
        let mut e = RenderEngine::new(&config);
        e.set_font(&FixedFont::new("mono", 8, 16, 12));
        e.resize(100, 60);
        let canvas = painted(&mut e);
        let bar = e.geometry().scrollbar.expect("scrollbar");
        assert!(canvas.fills().iter().any(|(r, _)| *r == bar));
        assert!(!e.geometry().margins().is_empty());
        assert_eq!(e.metrics_snapshot().full_frames, 1);
    }

    #[test]
    fn scrollbar_change_repaints_only_the_bar() {
        let mut config = ConfigFile::default();
        config.display.scrollbar = ScrollbarLocation::Left;
        let mut e = RenderEngine::new(&config);
        e.set_font(&FixedFont::new("mono", 8, 16, 12));
        e.resize(100, 60);
        painted(&mut e);
        assert!(e.set_scroll(5, 10));
        let canvas = painted(&mut e);
        assert!(canvas.texts().is_empty());
        assert_eq!(canvas.fills().len(), 2);
    }

    #[test]
    fn cursor_rect_tracked_and_invalidated() {
        let mut e = engine(10, 2);
        let mut img = Image::from_lines(10, &["ab"]);
        img.set(0, 2, Cell::BLANK.with_rendition(Rendition::CURSOR));
        e.set_image(&img);
        painted(&mut e);
        assert_eq!(e.cursor_rect(), Some(Rect::new(17, 1, 8, 16)));
        e.invalidate_cursor();
        let canvas = painted(&mut e);
        assert!(canvas.ops().iter().any(|op| matches!(op, PaintOp::Fill { rect, .. } if *rect == Rect::new(17, 1, 8, 16))));
    }

    #[test]
    fn blinking_runs_invalidate() {
        let mut e = engine(10, 2);
        let mut img = Image::from_lines(10, &["abcdef", "ghijkl"]);
        for col in 1..3 {
            img.set(1, col, Cell::new('b').with_rendition(Rendition::BLINK));
        }
        let update = e.set_image(&img);
        assert!(update.report.has_blinker);
        painted(&mut e);
        e.invalidate_blinking();
        let canvas = painted(&mut e);
        assert_eq!(canvas.texts(), vec!["bb"]);
    }

    #[test]
    fn suspended_banner_overlays_text_area() {
        let mut e = engine(80, 4);
        e.set_suspended_banner(true);
        let canvas = painted(&mut e);
        assert!(canvas.texts().contains(&SUSPENDED_BANNER));
        assert!(canvas.fills().contains(&(Rect::new(1, 1, 640, 16), BANNER_COLOR)));
        e.set_suspended_banner(false);
        let canvas = painted(&mut e);
        assert!(!canvas.texts().contains(&SUSPENDED_BANNER));
    }

    #[test]
    fn visual_bell_swap_forces_full_repaint() {
        let mut e = engine(4, 2);
        painted(&mut e);
        e.swap_default_colors();
        let canvas = painted(&mut e);
        assert_eq!(e.palette().default_background(), Rgba::BLACK);
        assert!(!canvas.fills().is_empty());
        assert_eq!(e.metrics_snapshot().full_frames, 2);
    }

    #[test]
    fn print_uses_black_text_without_erase() {
        let mut e = engine(10, 2);
        let mut img = Image::from_lines(10, &["hi"]);
        img.set(0, 0, Cell::new('h').with_fg(CellColor::System(1)));
        e.set_image(&img);
        let mut canvas = RecordingCanvas::new();
        e.print(&mut canvas, true, false);
        assert!(canvas.fills().is_empty());
        let colors: Vec<_> = canvas
            .ops()
            .iter()
            .filter_map(|op| match op {
                PaintOp::Text { style, .. } => Some(style.color),
                _ => None,
            })
            .collect();
        assert!(colors.iter().all(|c| *c == Rgba::BLACK));
    }

    #[test]
    fn character_position_clamps_to_used_area() {
        let mut e = engine(10, 4);
        e.set_image(&Image::new(2, 5));
        assert_eq!(e.character_position(1 + 8 * 3 + 4, 1 + 16), (3, 1));
        assert_eq!(e.character_position(500, 500), (4, 1));
    }
}

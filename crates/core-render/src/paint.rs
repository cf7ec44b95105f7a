//! Run painting.
//!
//! `draw_attr_str` paints one run of same-attribute cells: background,
//! preedit highlight, cursor, glyphs (or line-drawing strokes), bold
//! overstrike and underline, in that order. `paint_contents` walks the cells
//! intersecting a pixel rectangle, regroups them into runs and calls
//! `draw_attr_str` for each.

use crate::canvas::{Canvas, TextStyle};
use crate::diff::Composition;
use crate::font::CellMetrics;
use crate::geometry::{Geometry, Rect};
use crate::palette::{Palette, Rgba, blend};
use core_config::BoldMode;
use core_grid::{Cell, Image, LineProperties, LineProperty, Rendition, is_line_draw};

/// Everything a paint pass reads besides the cells themselves.
#[derive(Clone, Copy, Debug)]
pub struct PaintContext<'a> {
    pub geometry: &'a Geometry,
    pub cell: &'a CellMetrics,
    pub palette: &'a Palette,
    /// Translucency backdrop; `Some` only while translucency is active.
    pub backdrop: Option<Rgba>,
    pub bold_mode: BoldMode,
    /// Cells with the blink rendition are in their hidden phase.
    pub text_blink_off: bool,
    pub cursor_blink_off: bool,
    pub focused: bool,
    pub printer_friendly: bool,
    /// The canvas renders bold faces itself (printing).
    pub printer_bold: bool,
    pub fixed_font: bool,
    /// Erase backgrounds before painting (false while printing).
    pub clear: bool,
    pub composition: Option<&'a Composition>,
}

impl PaintContext<'_> {
    /// Color the widget background is erased with.
    pub fn erase_color(&self) -> Rgba {
        let bg = self.palette.default_background();
        match self.backdrop {
            Some(backdrop) => blend(bg, backdrop),
            None => bg,
        }
    }
}

/// Preedit highlight for one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Highlight {
    pub preedit: bool,
    /// Pixel rectangle of the preedit selection within the run.
    pub selection: Option<Rect>,
}

/// How one run is laid out on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunLayout {
    pub line_draw: bool,
    /// The run holds wide glyphs (each followed by a continuation cell).
    pub wide: bool,
    pub scale_x: u8,
    pub scale_y: u8,
}

impl Default for RunLayout {
    fn default() -> Self {
        Self {
            line_draw: false,
            wide: false,
            scale_x: 1,
            scale_y: 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PaintSummary {
    pub runs: usize,
    /// Where the cursor was drawn, if it was inside the painted area.
    pub cursor: Option<Rect>,
}

/// Paint one run into `rect`. Returns the cursor rectangle when the run
/// carries the cursor rendition.
pub fn draw_attr_str(
    ctx: &PaintContext<'_>,
    canvas: &mut dyn Canvas,
    rect: Rect,
    text: &str,
    attr: &Cell,
    layout: RunLayout,
    highlight: Highlight,
) -> Option<Rect> {
    let mut cell = *attr;
    if cell.rendition.contains(Rendition::REVERSE) {
        std::mem::swap(&mut cell.fg, &mut cell.bg);
    }
    let palette = ctx.palette;
    let bg = palette.resolve(cell.bg);
    let mut fg = if ctx.printer_friendly {
        Rgba::BLACK
    } else {
        palette.resolve(cell.fg)
    };
    let blink_hidden = ctx.text_blink_off && cell.blinks();
    let line_spacing = ctx.cell.line_spacing;
    let baseline = rect.y + ctx.cell.baseline() * layout.scale_y as i32;

    if !palette.is_transparent(&cell)
        && (ctx.clear || blink_hidden || cell.bg == palette.default_background_ref())
    {
        let color = match ctx.backdrop {
            Some(backdrop) => blend(bg, backdrop),
            None => bg,
        };
        canvas.fill_rect(rect, color);
    }

    if highlight.preedit {
        canvas.fill_rect(rect, Rgba::DARK_CYAN);
        if let Some(sel) = highlight.selection {
            canvas.fill_rect(sel, Rgba::DARK_GRAY);
        }
    }

    let mut cursor = None;
    if cell.rendition.contains(Rendition::CURSOR) {
        let r = Rect::new(
            rect.x,
            rect.y + line_spacing / 2,
            rect.width,
            rect.height - line_spacing,
        );
        if ctx.focused {
            if !ctx.cursor_blink_off {
                canvas.fill_rect(r, fg);
                fg = bg;
            }
        } else {
            canvas.draw_rect(r, fg);
        }
        cursor = Some(r);
    }

    if blink_hidden {
        return cursor;
    }

    let bold = palette.is_bold(&cell);
    if layout.line_draw {
        let cell_size = (
            ctx.cell.width * layout.scale_x as i32,
            ctx.cell.height * layout.scale_y as i32,
        );
        canvas.draw_box_glyphs(rect, cell_size, text, fg, bold);
    } else {
        let per_cell = !ctx.fixed_font || layout.wide || layout.scale_x > 1;
        let style = TextStyle {
            color: fg,
            bold: bold && (ctx.bold_mode == BoldMode::Font || ctx.printer_bold),
            scale_x: layout.scale_x,
            scale_y: layout.scale_y,
            advance: per_cell.then_some(ctx.cell.width * layout.scale_x as i32),
        };
        canvas.draw_text(rect, baseline, text, &style);
        if bold && !ctx.printer_bold && ctx.bold_mode == BoldMode::Overstrike {
            canvas.overstrike(rect, baseline, text, &style);
        }
    }

    if cell.rendition.contains(Rendition::UNDERLINE) {
        canvas.underline(rect, baseline, fg);
    }
    cursor
}

/// Paint every cell of `image` intersecting the pixel rectangle `rect`.
pub fn paint_contents(
    ctx: &PaintContext<'_>,
    canvas: &mut dyn Canvas,
    image: &Image,
    props: &LineProperties,
    rect: Rect,
) -> PaintSummary {
    let mut summary = PaintSummary::default();
    if image.is_empty() || rect.is_empty() {
        return summary;
    }
    let g = ctx.geometry;
    if ctx.clear {
        canvas.fill_rect(rect, ctx.erase_color());
    }
    let (fw, fh) = (g.cell_width, g.cell_height);
    let max_x = image.columns() as i32 - 1;
    let max_y = image.rows() as i32 - 1;
    let lux = ((rect.x - g.bx) / fw).clamp(0, max_x) as usize;
    let luy = ((rect.y - g.by) / fh).clamp(0, max_y) as usize;
    let rlx = ((rect.right() - 1 - g.bx) / fw).clamp(0, max_x) as usize;
    let rly = ((rect.bottom() - 1 - g.by) / fh).clamp(0, max_y) as usize;

    let mut y = luy;
    while y <= rly {
        let prop = props.get(y);
        let scale_x: u8 = if prop.contains(LineProperty::DOUBLE_WIDTH) { 2 } else { 1 };
        let scale_y: u8 = if prop.contains(LineProperty::DOUBLE_HEIGHT) { 2 } else { 1 };
        let first = lux / scale_x as usize;
        let last = rlx / scale_x as usize;

        let mut x = first;
        if x > 0 && image.get(y, x).is_continuation() {
            x -= 1;
        }
        while x <= last {
            let head = *image.get(y, x);
            let line_draw = is_line_draw(head.ch);
            let wide = image.get(y, x + 1).is_continuation();
            let step = if wide { 2 } else { 1 };
            let mut text = String::new();
            if !head.is_continuation() {
                text.push(head.ch);
            }
            let mut len = step;
            while x + len <= last {
                let c = image.get(y, x + len);
                if !c.same_attributes(&head)
                    || c.is_continuation()
                    || is_line_draw(c.ch) != line_draw
                    || image.get(y, x + len + 1).is_continuation() != wide
                {
                    break;
                }
                text.push(c.ch);
                len += step;
            }

            let sx = scale_x as i32;
            let run_rect = Rect::new(
                g.bx + fw * x as i32 * sx,
                g.by + fh * y as i32,
                fw * len as i32 * sx,
                fh * scale_y as i32,
            );
            let highlight = highlight_for(ctx, run_rect, y, x, len);
            let layout = RunLayout {
                line_draw,
                wide,
                scale_x,
                scale_y,
            };
            if let Some(c) = draw_attr_str(ctx, canvas, run_rect, &text, &head, layout, highlight) {
                summary.cursor = Some(c);
            }
            summary.runs += 1;
            x += len;
        }
        // the lower half of a double-height pair is covered by the upper one
        y += scale_y as usize;
    }
    tracing::trace!(
        target: "render.paint",
        x = rect.x,
        y = rect.y,
        w = rect.width,
        h = rect.height,
        runs = summary.runs,
        "paint_contents"
    );
    summary
}

fn highlight_for(ctx: &PaintContext<'_>, rect: Rect, row: usize, start: usize, len: usize) -> Highlight {
    let Some(comp) = ctx.composition else {
        return Highlight::default();
    };
    let (preedit, selected) = comp.classify(row, start, len);
    let selection = match (selected, comp.selection) {
        (true, Some((s, e))) => {
            let fw = ctx.geometry.cell_width;
            Some(Rect::new(
                rect.x + fw * (s as i32 - start as i32),
                rect.y,
                fw * (e as i32 - s as i32),
                rect.height,
            ))
        }
        _ => None,
    };
    Highlight { preedit, selection }
}

//! Text selection gestures.
//!
//! The tracker owns the anchor of the current gesture and reports begin /
//! extend / end to the host; the host owns the selected text. Points handed
//! in are viewport cells already clamped to the used area. The anchor and the
//! last extension point are stored with the scroll offset added so a gesture
//! survives history scrolling; reports are viewport relative.
//!
//! Reported ranges are inclusive and use a left boundary convention for the
//! stream end: a stream selection anchored at column 5 and dragged left to
//! column 2 reports begin 2, extend 4; dragged right to column 8 it reports
//! begin 5, extend 7. Begin never lands past extend in reading order, so a
//! leftward drag reports a fresh begin whenever the moving end moves.

use core_events::{DisplayEvent, DisplayHost, KeyModifiers};
use core_grid::{CharClass, Image, LineProperties, Point, WordCharacters};
use tracing::debug;

/// Read-only view of what is on screen, used for boundary expansion.
#[derive(Clone, Copy)]
pub struct SelectionView<'a> {
    pub image: &'a Image,
    pub props: &'a LineProperties,
    /// Used extent of the image.
    pub columns: usize,
    pub lines: usize,
    pub words: &'a WordCharacters,
}

impl<'a> SelectionView<'a> {
    fn last_column(&self) -> i32 {
        self.columns as i32 - 1
    }

    fn last_line(&self) -> i32 {
        self.lines as i32 - 1
    }

    fn wrapped(&self, line: i32) -> bool {
        line >= 0 && self.props.is_wrapped(line as usize)
    }

    /// Class of the glyph covering `p`; the right half of a wide glyph takes
    /// the class of its left half.
    pub fn class_at(&self, p: Point) -> CharClass {
        let cell = self.image.at(p);
        if cell.is_continuation() && p.column > 0 {
            return self.class_at(Point::new(p.column - 1, p.line));
        }
        self.words.classify(cell.ch)
    }

    fn prev(&self, p: Point) -> Option<Point> {
        if p.column > 0 {
            Some(Point::new(p.column - 1, p.line))
        } else if p.line > 0 && self.wrapped(p.line - 1) {
            Some(Point::new(self.last_column(), p.line - 1))
        } else {
            None
        }
    }

    fn next(&self, p: Point) -> Option<Point> {
        if p.column < self.last_column() {
            Some(Point::new(p.column + 1, p.line))
        } else if p.line < self.last_line() && self.wrapped(p.line) {
            Some(Point::new(0, p.line + 1))
        } else {
            None
        }
    }

    /// First cell of the same-class run containing `p`, following soft wraps.
    pub fn word_start(&self, mut p: Point) -> Point {
        let class = self.class_at(p);
        while let Some(prev) = self.prev(p) {
            if self.class_at(prev) != class {
                break;
            }
            p = prev;
        }
        p
    }

    /// Last cell of the same-class run containing `p`, following soft wraps.
    pub fn word_end(&self, mut p: Point) -> Point {
        let class = self.class_at(p);
        while let Some(next) = self.next(p) {
            if self.class_at(next) != class {
                break;
            }
            p = next;
        }
        p
    }

    /// First line of the soft-wrapped logical line containing `line`.
    pub fn line_start(&self, mut line: i32) -> i32 {
        while line > 0 && self.wrapped(line - 1) {
            line -= 1;
        }
        line
    }

    /// Last line of the soft-wrapped logical line containing `line`.
    pub fn line_end(&self, mut line: i32) -> i32 {
        while line < self.last_line() && self.wrapped(line) {
            line += 1;
        }
        line
    }

    /// Word bounds for a double click at `p`. A trailing `@` is left out
    /// unless it is the whole word.
    pub fn word_at(&self, p: Point) -> (Point, Point) {
        let begin = self.word_start(p);
        let mut end = self.word_end(p);
        if self.image.at(end).ch == '@' && end.column - begin.column > 0 {
            end.column -= 1;
        }
        (begin, end)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Granularity {
    #[default]
    Stream,
    Word,
    Line,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Phase {
    #[default]
    Idle,
    /// Button down, nothing reported yet.
    Started,
    /// A range has been reported.
    Extending,
}

#[derive(Debug)]
pub struct SelectionTracker {
    phase: Phase,
    granularity: Granularity,
    column_mode: bool,
    preserve_line_breaks: bool,
    anchor: Point,
    point: Point,
    line_begin: Point,
    /// Begin point last reported, absolute.
    reported_begin: Option<Point>,
}

fn absolute(p: Point, scroll: i32) -> Point {
    Point::new(p.column, p.line + scroll)
}

fn relative(p: Point, scroll: i32) -> Point {
    Point::new(p.column, p.line - scroll)
}

impl Default for SelectionTracker {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            granularity: Granularity::Stream,
            column_mode: false,
            preserve_line_breaks: true,
            anchor: Point::default(),
            point: Point::default(),
            line_begin: Point::default(),
            reported_begin: None,
        }
    }
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selecting(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn column_mode(&self) -> bool {
        self.column_mode
    }

    pub fn preserve_line_breaks(&self) -> bool {
        self.preserve_line_breaks
    }

    /// Anchor in absolute (scroll-inclusive) coordinates.
    pub fn anchor(&self) -> Point {
        self.anchor
    }

    /// Forget the gesture without reporting anything (key press).
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.reported_begin = None;
    }

    /// Modifier state captured at press time: Ctrl alone drops line breaks,
    /// Ctrl+Alt selects a rectangle.
    pub fn set_modifiers(&mut self, mods: KeyModifiers) {
        let ctrl = mods.contains(KeyModifiers::CTRL);
        let alt = mods.contains(KeyModifiers::ALT);
        self.preserve_line_breaks = !(ctrl && !alt);
        self.column_mode = ctrl && alt;
    }

    /// Left press on unselected text: clear and anchor a stream selection.
    pub fn begin(&mut self, here: Point, scroll: i32, host: &mut dyn DisplayHost) {
        host.emit(DisplayEvent::SelectionClear);
        self.granularity = Granularity::Stream;
        self.anchor = absolute(here, scroll);
        self.point = self.anchor;
        self.reported_begin = None;
        self.phase = Phase::Started;
        debug!(target: "input.selection", column = here.column, line = here.line, "selection_begin");
    }

    /// Pointer moved with the button held. `autoscrolled` forces a report
    /// even when the cell under the pointer did not change.
    pub fn extend(
        &mut self,
        here: Point,
        scroll: i32,
        autoscrolled: bool,
        view: &SelectionView<'_>,
        host: &mut dyn DisplayHost,
    ) {
        if self.phase == Phase::Idle {
            return;
        }
        let anchor = relative(self.anchor, scroll);
        let last = relative(self.point, scroll);
        // `here`/`other` are the moving and fixed ends; `lo`/`hi` the
        // inclusive range in reading order.
        let (here, other, swapping, lo, hi) = match self.granularity {
            Granularity::Word => {
                let left_not_right = here < anchor;
                let swapping = left_not_right != (last < anchor);
                let left = view.word_start(if left_not_right { here } else { anchor });
                let right = view.word_end(if left_not_right { anchor } else { here });
                let (here, other) = if left_not_right { (left, right) } else { (right, left) };
                (here, other, swapping, left, right)
            }
            Granularity::Line => {
                let above_not_below = here.line < anchor.line;
                let (above, below) = if above_not_below { (here, anchor) } else { (anchor, here) };
                let above = Point::new(0, view.line_start(above.line));
                let below = Point::new(view.last_column(), view.line_end(below.line));
                let (here, other) = if above_not_below { (above, below) } else { (below, above) };
                let swapping = self.line_begin != other;
                self.line_begin = other;
                (here, other, swapping, above, below)
            }
            Granularity::Stream => {
                let left_not_right = here < anchor;
                let swapping = left_not_right != (last < anchor);
                let left = if left_not_right { here } else { anchor };
                let mut right = if left_not_right { anchor } else { here };
                if right.column > 0 && !self.column_mode {
                    right = self.absorb_trailing_blanks(right, view);
                }
                let (here, other) = if left_not_right { (left, right) } else { (right, left) };
                (here, other, swapping, left, Point::new(right.column - 1, right.line))
            }
        };

        if here == last && !autoscrolled {
            return;
        }
        let other_edge = if self.granularity == Granularity::Stream {
            other
        } else {
            Point::new(other.column + 1, other.line)
        };
        if here == other_edge {
            return;
        }

        let rectangular = self.column_mode && self.granularity == Granularity::Stream;
        let (begin, end) = if rectangular {
            (here.min(other), here.max(other))
        } else {
            (lo, hi)
        };
        let begin_abs = absolute(begin, scroll);
        if self.phase == Phase::Started || swapping || self.reported_begin != Some(begin_abs) {
            host.emit(DisplayEvent::SelectionBegin {
                column: begin.column,
                line: begin.line,
                rectangular,
            });
            self.reported_begin = Some(begin_abs);
        }
        self.phase = Phase::Extending;
        self.point = absolute(here, scroll);
        host.emit(DisplayEvent::SelectionExtend {
            column: end.column,
            line: end.line,
        });
    }

    /// When only blanks follow the pointer up to the end of an unwrapped
    /// line, select through the line end.
    fn absorb_trailing_blanks(&self, right: Point, view: &SelectionView<'_>) -> Point {
        if view.class_at(Point::new(right.column - 1, right.line)) != CharClass::Space {
            return right;
        }
        let mut probe = right;
        while probe.column < view.last_column()
            && view.class_at(Point::new(probe.column + 1, probe.line)) == CharClass::Space
            && probe.line < view.last_line()
            && !view.wrapped(probe.line)
        {
            probe.column += 1;
        }
        if probe.column < view.last_column() {
            right
        } else {
            Point::new(probe.column + 1, probe.line)
        }
    }

    /// Button released. Returns true when a range was closed.
    pub fn release(&mut self, host: &mut dyn DisplayHost) -> bool {
        let closed = self.phase == Phase::Extending;
        if closed {
            host.emit(DisplayEvent::SelectionEnd {
                preserve_line_breaks: self.preserve_line_breaks,
            });
        }
        self.phase = Phase::Idle;
        closed
    }

    /// Double click: select the word under `here` and keep extending by
    /// words while the button stays down.
    pub fn select_word(
        &mut self,
        here: Point,
        scroll: i32,
        view: &SelectionView<'_>,
        host: &mut dyn DisplayHost,
    ) {
        host.emit(DisplayEvent::SelectionClear);
        self.anchor = absolute(here, scroll);
        self.granularity = Granularity::Word;
        let (begin, end) = view.word_at(here);
        self.reported_begin = Some(absolute(begin, scroll));
        host.emit(DisplayEvent::SelectionBegin {
            column: begin.column,
            line: begin.line,
            rectangular: false,
        });
        self.phase = Phase::Extending;
        host.emit(DisplayEvent::SelectionExtend {
            column: end.column,
            line: end.line,
        });
        host.emit(DisplayEvent::SelectionEnd {
            preserve_line_breaks: self.preserve_line_breaks,
        });
        debug!(
            target: "input.selection",
            begin = begin.column,
            end = end.column,
            line = here.line,
            "word_selected"
        );
    }

    /// Triple click: select the whole logical line under `here`. With
    /// `from_word` the selection starts at the clicked word instead of the
    /// line start.
    pub fn select_line(
        &mut self,
        here: Point,
        scroll: i32,
        from_word: bool,
        view: &SelectionView<'_>,
        host: &mut dyn DisplayHost,
    ) {
        host.emit(DisplayEvent::SelectionClear);
        self.granularity = Granularity::Line;
        self.phase = Phase::Extending;
        host.emit(DisplayEvent::BusySelecting(true));

        let top = view.line_start(here.line);
        let begin = if from_word {
            view.word_start(Point::new(here.column, top))
        } else {
            Point::new(0, top)
        };
        host.emit(DisplayEvent::SelectionBegin {
            column: begin.column,
            line: begin.line,
            rectangular: false,
        });
        self.line_begin = begin;
        self.reported_begin = Some(absolute(begin, scroll));

        let bottom = view.line_end(top);
        host.emit(DisplayEvent::SelectionExtend {
            column: view.last_column(),
            line: bottom,
        });
        host.emit(DisplayEvent::SelectionEnd {
            preserve_line_breaks: self.preserve_line_breaks,
        });
        self.anchor = absolute(Point::new(here.column, bottom), scroll);
        self.point = self.anchor;
        debug!(target: "input.selection", top, bottom, "line_selected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::EventQueue;
    use core_grid::LineProperty;

    struct Screen {
        image: Image,
        props: LineProperties,
        words: WordCharacters,
    }

    impl Screen {
        fn new(columns: usize, lines: &[&str]) -> Self {
            Self {
                image: Image::from_lines(columns, lines),
                props: LineProperties::new(),
                words: WordCharacters::default(),
            }
        }

        fn view(&self) -> SelectionView<'_> {
            SelectionView {
                image: &self.image,
                props: &self.props,
                columns: self.image.columns(),
                lines: self.image.rows(),
                words: &self.words,
            }
        }
    }

    fn begin_and_extend(q: &EventQueue) -> Vec<DisplayEvent> {
        q.iter()
            .filter(|e| {
                matches!(
                    e,
                    DisplayEvent::SelectionBegin { .. } | DisplayEvent::SelectionExtend { .. }
                )
            })
            .cloned()
            .collect()
    }

    #[test]
    fn double_click_selects_word() {
        let screen = Screen::new(10, &["foo bar"]);
        let mut q = EventQueue::new();
        let mut t = SelectionTracker::new();
        t.set_modifiers(KeyModifiers::empty());
        t.select_word(Point::new(1, 0), 0, &screen.view(), &mut q);
        assert_eq!(q.selected_span(), Some(((0, 0), (2, 0))));
        assert_eq!(q.iter().last(), Some(&DisplayEvent::SelectionEnd { preserve_line_breaks: true }));
    }

    #[test]
    fn double_click_on_space_selects_only_the_space() {
        let screen = Screen::new(7, &["foo bar"]);
        let mut q = EventQueue::new();
        let mut t = SelectionTracker::new();
        t.select_word(Point::new(3, 0), 0, &screen.view(), &mut q);
        assert_eq!(q.selected_span(), Some(((3, 0), (3, 0))));
    }

    #[test]
    fn trailing_at_is_trimmed() {
        let screen = Screen::new(12, &["mail user@ x"]);
        let mut q = EventQueue::new();
        let mut t = SelectionTracker::new();
        t.select_word(Point::new(6, 0), 0, &screen.view(), &mut q);
        assert_eq!(q.selected_span(), Some(((5, 0), (8, 0))));
    }

    #[test]
    fn word_crosses_soft_wrap_only() {
        let mut screen = Screen::new(4, &["  ab", "cd  ", "ef  "]);
        screen.props.set(0, LineProperty::WRAPPED);
        let view = screen.view();
        assert_eq!(view.word_at(Point::new(3, 0)), (Point::new(2, 0), Point::new(1, 1)));
        // line 1 is not wrapped, so "ef" stays separate
        assert_eq!(view.word_at(Point::new(0, 2)), (Point::new(0, 2), Point::new(1, 2)));
    }

    #[test]
    fn drag_across_anchor_swaps_begin() {
        let screen = Screen::new(12, &["abcdefghijkl"]);
        let view = screen.view();
        let mut q = EventQueue::new();
        let mut t = SelectionTracker::new();
        t.set_modifiers(KeyModifiers::empty());
        t.begin(Point::new(5, 0), 0, &mut q);

        t.extend(Point::new(2, 0), 0, false, &view, &mut q);
        assert_eq!(q.selected_span(), Some(((2, 0), (4, 0))));
        t.extend(Point::new(8, 0), 0, false, &view, &mut q);
        assert_eq!(q.selected_span(), Some(((5, 0), (7, 0))));

        assert_eq!(
            begin_and_extend(&q),
            vec![
                DisplayEvent::SelectionBegin { column: 2, line: 0, rectangular: false },
                DisplayEvent::SelectionExtend { column: 4, line: 0 },
                DisplayEvent::SelectionBegin { column: 5, line: 0, rectangular: false },
                DisplayEvent::SelectionExtend { column: 7, line: 0 },
            ]
        );
        assert!(t.release(&mut q));
        assert!(!t.is_selecting());
    }

    #[test]
    fn unmoved_pointer_reports_nothing() {
        let screen = Screen::new(10, &["abcdefghij"]);
        let view = screen.view();
        let mut q = EventQueue::new();
        let mut t = SelectionTracker::new();
        t.begin(Point::new(3, 0), 0, &mut q);
        t.extend(Point::new(3, 0), 0, false, &view, &mut q);
        assert_eq!(q.len(), 1, "only the clear");
        t.extend(Point::new(6, 0), 0, false, &view, &mut q);
        let n = q.len();
        t.extend(Point::new(6, 0), 0, false, &view, &mut q);
        assert_eq!(q.len(), n);
    }

    #[test]
    fn column_mode_reports_rectangle() {
        let screen = Screen::new(10, &["abcdefghij", "abcdefghij"]);
        let view = screen.view();
        let mut q = EventQueue::new();
        let mut t = SelectionTracker::new();
        t.set_modifiers(KeyModifiers::CTRL | KeyModifiers::ALT);
        assert!(t.column_mode());
        t.begin(Point::new(2, 0), 0, &mut q);
        t.extend(Point::new(6, 1), 0, false, &view, &mut q);
        assert_eq!(
            begin_and_extend(&q),
            vec![
                DisplayEvent::SelectionBegin { column: 2, line: 0, rectangular: true },
                DisplayEvent::SelectionExtend { column: 6, line: 1 },
            ]
        );
    }

    #[test]
    fn ctrl_alone_drops_line_breaks() {
        let mut t = SelectionTracker::new();
        t.set_modifiers(KeyModifiers::CTRL);
        assert!(!t.preserve_line_breaks());
        assert!(!t.column_mode());
    }

    #[test]
    fn trailing_blanks_select_to_line_end() {
        let screen = Screen::new(10, &["ab        ", "cd"]);
        let view = screen.view();
        let mut q = EventQueue::new();
        let mut t = SelectionTracker::new();
        t.begin(Point::new(0, 0), 0, &mut q);
        t.extend(Point::new(4, 0), 0, false, &view, &mut q);
        assert_eq!(
            q.iter().last(),
            Some(&DisplayEvent::SelectionExtend { column: 9, line: 0 })
        );
    }

    #[test]
    fn triple_click_selects_wrapped_line() {
        let mut screen = Screen::new(4, &["one ", "two ", "six "]);
        screen.props.set(0, LineProperty::WRAPPED);
        let mut q = EventQueue::new();
        let mut t = SelectionTracker::new();
        t.select_line(Point::new(2, 1), 0, false, &screen.view(), &mut q);
        assert_eq!(q.selected_span(), Some(((0, 0), (3, 1))));
        assert_eq!(t.granularity(), Granularity::Line);
    }

    #[test]
    fn triple_click_from_word() {
        let screen = Screen::new(10, &["ls  -la x "]);
        let mut q = EventQueue::new();
        let mut t = SelectionTracker::new();
        t.select_line(Point::new(5, 0), 0, true, &screen.view(), &mut q);
        assert_eq!(q.selected_span(), Some(((4, 0), (9, 0))));
    }

    #[test]
    fn anchor_survives_scroll() {
        let screen = Screen::new(10, &["abcdefghij"; 4]);
        let view = screen.view();
        let mut q = EventQueue::new();
        let mut t = SelectionTracker::new();
        t.begin(Point::new(2, 3), 10, &mut q);
        assert_eq!(t.anchor(), Point::new(2, 13));
        // content scrolled one line up under the pointer
        t.extend(Point::new(5, 3), 11, true, &view, &mut q);
        assert_eq!(
            begin_and_extend(&q),
            vec![
                DisplayEvent::SelectionBegin { column: 2, line: 2, rectangular: false },
                DisplayEvent::SelectionExtend { column: 4, line: 3 },
            ]
        );
    }
}

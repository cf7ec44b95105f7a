use core_events::{DisplayEvent, EventQueue, KeyModifiers};
use core_grid::{Image, LineProperties, LineProperty, Point, WordCharacters};
use core_input::{DropAction, DropOutcome, DropPayload, SelectionTracker, SelectionView, resolve_drop};

fn wrapped_screen() -> (Image, LineProperties) {
    let image = Image::from_lines(10, &["hello worl", "d again"]);
    let mut props = LineProperties::new();
    props.set(0, LineProperty::WRAPPED);
    (image, props)
}

#[test]
fn triple_click_takes_the_whole_wrapped_line() {
    let (image, props) = wrapped_screen();
    let words = WordCharacters::new(":@-./_~");
    let view = SelectionView {
        image: &image,
        props: &props,
        columns: 10,
        lines: 2,
        words: &words,
    };
    let mut host = EventQueue::new();
    let mut tracker = SelectionTracker::new();

    tracker.select_line(Point::new(2, 1), 0, false, &view, &mut host);

    assert_eq!(
        host.drain(),
        vec![
            DisplayEvent::SelectionClear,
            DisplayEvent::BusySelecting(true),
            DisplayEvent::SelectionBegin {
                column: 0,
                line: 0,
                rectangular: false
            },
            DisplayEvent::SelectionExtend { column: 9, line: 1 },
            DisplayEvent::SelectionEnd {
                preserve_line_breaks: true
            },
        ]
    );
}

#[test]
fn leftward_drag_reports_left_boundary() {
    let (image, props) = wrapped_screen();
    let words = WordCharacters::new("");
    let view = SelectionView {
        image: &image,
        props: &props,
        columns: 10,
        lines: 2,
        words: &words,
    };
    let mut host = EventQueue::new();
    let mut tracker = SelectionTracker::new();
    tracker.set_modifiers(KeyModifiers::empty());

    tracker.begin(Point::new(5, 0), 0, &mut host);
    tracker.extend(Point::new(2, 0), 0, false, &view, &mut host);
    assert!(tracker.release(&mut host));

    assert_eq!(
        host.drain(),
        vec![
            DisplayEvent::SelectionClear,
            DisplayEvent::SelectionBegin {
                column: 2,
                line: 0,
                rectangular: false
            },
            DisplayEvent::SelectionExtend { column: 4, line: 0 },
            DisplayEvent::SelectionEnd {
                preserve_line_breaks: true
            },
        ]
    );
    assert!(!tracker.is_selecting());
}

#[test]
fn reported_range_never_inverts_while_dragging() {
    let image = Image::from_lines(12, &["abcdefghijkl", "mnopqrstuvwx"]);
    let props = LineProperties::new();
    let words = WordCharacters::new("");
    let view = SelectionView {
        image: &image,
        props: &props,
        columns: 12,
        lines: 2,
        words: &words,
    };
    let mut host = EventQueue::new();
    let mut tracker = SelectionTracker::new();

    tracker.begin(Point::new(5, 1), 0, &mut host);
    for (column, line) in [(2, 1), (1, 1), (9, 0), (8, 1), (10, 1), (3, 1)] {
        tracker.extend(Point::new(column, line), 0, false, &view, &mut host);
    }

    let mut begin = None;
    for event in host.drain() {
        match event {
            DisplayEvent::SelectionBegin { column, line, .. } => begin = Some((line, column)),
            DisplayEvent::SelectionExtend { column, line } => {
                let begin = begin.expect("extend before begin");
                assert!((line, column) >= begin, "extend {line}:{column} before begin {begin:?}");
            }
            _ => {}
        }
    }
    tracker.extend(Point::new(1, 1), 0, false, &view, &mut host);
    assert_eq!(host.selected_span(), Some(((1, 1), (4, 1))));
}

#[test]
fn dropped_file_offers_directory_actions() {
    let outcome = resolve_drop(DropPayload::Urls(vec!["file:///tmp/a%20b.txt".into()]));
    let DropOutcome::Menu(menu) = outcome else {
        panic!("expected a menu, got {outcome:?}");
    };
    assert_eq!(menu.file_count(), 1);
    assert_eq!(
        menu.activate(DropAction::Cd, |_| Some(false)).as_deref(),
        Some("cd '/tmp'\n")
    );
    assert_eq!(
        menu.activate(DropAction::Link, |_| None).as_deref(),
        Some("ln -s '/tmp/a b.txt' .\n")
    );
}

#[test]
fn dropped_mailto_pastes_as_is() {
    let outcome = resolve_drop(DropPayload::Urls(vec!["mailto:someone@example.org".into()]));
    assert_eq!(outcome, DropOutcome::Paste("mailto:someone@example.org".into()));
}

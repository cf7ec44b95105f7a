use core_config::{DisplayConfig, ScrollbarLocation};
use core_events::{DisplayEvent, EventQueue, KeyModifiers, MouseButton, PointerEvent, ReportButton};
use core_grid::Image;
use core_model::{LayoutRegion, ManualClock, Orientation, PaneSplitter, TerminalDisplay};
use core_render::{FixedFont, RecordingCanvas};
use pretty_assertions::assert_eq;

fn pane(region: LayoutRegion, host: &mut EventQueue) -> TerminalDisplay {
    let mut config = DisplayConfig::default();
    config.display.scrollbar = ScrollbarLocation::None;
    let mut d = TerminalDisplay::with_clock(config, ManualClock::new());
    d.set_font(&FixedFont::cell_units(), host);
    d.resize(region.width as i32, region.height as i32, host);
    d
}

#[test]
fn split_panes_get_their_own_grids() {
    let mut tree = PaneSplitter::new(Orientation::Horizontal);
    tree.add_container(0usize, Orientation::Horizontal);
    tree.add_container(1usize, Orientation::Horizontal);
    let layout = tree.layout(LayoutRegion::new(0, 0, 80, 24));

    let mut hosts = [EventQueue::new(), EventQueue::new()];
    let mut displays: Vec<TerminalDisplay> = layout
        .panes()
        .iter()
        .map(|(c, r)| pane(*r, &mut hosts[*c]))
        .collect();

    for (i, host) in hosts.iter_mut().enumerate() {
        let resize = host
            .drain()
            .into_iter()
            .filter(|e| matches!(e, DisplayEvent::ResizeRequest { .. }))
            .last();
        assert_eq!(
            resize,
            Some(DisplayEvent::ResizeRequest {
                columns: 38,
                lines: 23
            }),
            "pane {i}"
        );
    }
    assert_eq!(displays[1].columns(), 38);

    let img = Image::from_lines(38, &["right pane"]);
    displays[1].set_image(&img);
    let mut canvas = RecordingCanvas::new();
    displays[1].paint(&mut canvas).expect("frame");
    assert!(canvas.texts().iter().any(|t| t.starts_with("right pane")));
}

#[test]
fn pointer_routes_to_pane_under_it() {
    let mut tree = PaneSplitter::new(Orientation::Horizontal);
    tree.add_container(0usize, Orientation::Horizontal);
    tree.add_container(1usize, Orientation::Vertical);
    let layout = tree.layout(LayoutRegion::new(0, 0, 80, 24));
    assert_eq!(layout.panes().len(), 2);

    let mut hosts = [EventQueue::new(), EventQueue::new()];
    let mut displays: Vec<TerminalDisplay> = layout
        .panes()
        .iter()
        .map(|(c, r)| pane(*r, &mut hosts[*c]))
        .collect();
    for (d, (_, r)) in displays.iter_mut().zip(layout.panes()) {
        d.set_image(&Image::new(r.height as usize - 1, r.width as usize - 2));
        d.set_selection_mode(false);
    }
    for h in &mut hosts {
        h.drain();
    }

    // cell (5, 14) of the screen lands in the lower pane of the nested split
    let (target, region) = layout.pane_at(5, 14).expect("covered");
    assert_eq!(target, 1);
    let (x, y) = region.local(5, 14);
    displays[target].mouse_press(
        PointerEvent::press(x, y, MouseButton::Left, KeyModifiers::empty()),
        &mut hosts[target],
    );
    assert_eq!(
        hosts[1].drain().into_iter().last(),
        Some(DisplayEvent::Mouse {
            button: ReportButton::Left,
            column: x,
            line: y,
            motion: false
        })
    );
    assert!(hosts[0].is_empty());
}

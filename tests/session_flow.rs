//! Session-level flows: user actions interleaved with catalog replacement,
//! driven the same way the TUI loop drives them.

use detection_watch::catalog::FrameRef;
use detection_watch::filter::{Filters, project};
use detection_watch::model::types::{Snapshot, WireFrame, WireGroup};
use detection_watch::session::{Effect, Session, ViewMode};
use detection_watch::viewport::{Overlay, Viewport};

fn frame(date: &str, time: &str, img: &str) -> WireFrame {
    WireFrame {
        date: date.into(),
        time: time.into(),
        img: img.into(),
        x: Some(25.0),
        y: Some(25.0),
        w: Some(10.0),
        h: Some(10.0),
        conf: Some(0.8),
    }
}

fn two_entity_snapshot() -> Snapshot {
    vec![
        WireGroup {
            name: "Fox".into(),
            history: vec![
                frame("2024-01-01", "10:00:00", "f1"),
                frame("2024-01-01", "11:00:00", "f2"),
                frame("2024-01-01", "12:00:00", "f3"),
            ],
        },
        WireGroup {
            name: "Badger".into(),
            history: vec![frame("2024-01-01", "09:00:00", "b1")],
        },
    ]
}

#[test]
fn full_select_scrub_poll_cycle() {
    let mut session = Session::new();
    session.apply_snapshot(two_entity_snapshot());

    // Select lands pinned on latest.
    assert_eq!(
        session.select_entity("Fox"),
        Effect::RenderFrame(FrameRef {
            entity: "Fox".into(),
            index: 2
        })
    );

    // Scrub back unpins.
    session.move_scrubber(1);
    assert!(!session.selection.pinned);

    // A grown snapshot must not yank the parked cursor forward.
    let mut grown = two_entity_snapshot();
    grown[0]
        .history
        .push(frame("2024-01-01", "13:00:00", "f4"));
    assert_eq!(session.apply_snapshot(grown.clone()), Effect::None);
    assert_eq!(session.selection.cursor, 1);
    assert_eq!(session.selection.history_len, 4);

    // Scrub to the end re-pins; the next growth advances the cursor.
    session.move_scrubber(usize::MAX);
    assert!(session.selection.pinned);
    grown[0]
        .history
        .push(frame("2024-01-01", "14:00:00", "f5"));
    let effect = session.apply_snapshot(grown);
    assert_eq!(
        effect,
        Effect::RenderFrame(FrameRef {
            entity: "Fox".into(),
            index: 4
        })
    );
}

#[test]
fn selection_survives_catalog_reorder() {
    let mut session = Session::new();
    session.apply_snapshot(two_entity_snapshot());
    session.select_entity("Badger");

    // Badger becomes the most recent entity, so the catalog reorders; the
    // selection must follow by name, not by position.
    let mut snap = two_entity_snapshot();
    snap[1]
        .history
        .push(frame("2024-02-01", "08:00:00", "b2"));
    session.apply_snapshot(snap);

    assert_eq!(session.selection.active.as_deref(), Some("Badger"));
    assert_eq!(session.catalog.entities[0].name, "Badger");
    assert_eq!(session.selection.cursor, 1);
}

#[test]
fn reset_clears_catalog_counters_filters_and_selection() {
    let mut session = Session::new();
    session.apply_snapshot(two_entity_snapshot());
    session.select_entity("Fox");
    session.filters.name_query = "fox".into();
    session.filters.date_query = "2024".into();

    session.reset();

    assert!(session.catalog.is_empty());
    assert_eq!(session.catalog.total_frames, 0);
    assert!(session.filters.is_empty());
    assert_eq!(session.selection.mode, ViewMode::Live);
    assert!(session.selection.active.is_none());
    assert_eq!(session.selection.cursor, 0);
}

#[test]
fn filters_project_conjunction_without_touching_state() {
    let mut session = Session::new();
    session.apply_snapshot(two_entity_snapshot());
    session.select_entity("Fox");

    let filters = Filters {
        name_query: "FOX".into(),
        date_query: "2024-01".into(),
        time_query: String::new(),
    };
    let rows = project(&session.catalog, &filters);
    let visible: Vec<&str> = rows
        .iter()
        .filter(|r| r.visible)
        .map(|r| r.entity.name.as_str())
        .collect();
    assert_eq!(visible, ["Fox"]);

    // Projection left the selection alone.
    assert_eq!(session.selection.mode, ViewMode::Historical);
    assert_eq!(session.selection.active.as_deref(), Some("Fox"));
}

#[test]
fn overlay_gate_follows_session_transitions() {
    let mut session = Session::new();
    let mut viewport = Viewport::new();
    session.apply_snapshot(two_entity_snapshot());

    // Render the selected frame: begin clears, complete installs.
    let Effect::RenderFrame(frame_ref) = session.select_entity("Fox") else {
        panic!("expected a frame render");
    };
    let ticket = viewport.begin();
    let entity = session.catalog.entity(&frame_ref.entity).expect("present");
    let wire = &entity.history[frame_ref.index];
    let overlay = wire.region.map(|region| Overlay {
        region,
        label: frame_ref.entity.clone(),
        confidence: wire.confidence_label(),
    });
    assert!(viewport.complete(ticket, overlay));
    assert_eq!(viewport.overlay().map(|o| o.caption()), Some("Fox 0.80".into()));

    // Moving the scrubber starts a new generation; the old ticket is dead.
    session.move_scrubber(0);
    let newer = viewport.begin();
    assert!(!viewport.complete(ticket, None));
    assert!(viewport.complete(newer, None));
    assert!(viewport.overlay().is_none());
}

#[test]
fn empty_snapshot_empties_catalog_but_keeps_live_mode() {
    let mut session = Session::new();
    session.apply_snapshot(two_entity_snapshot());
    assert_eq!(session.catalog.entities.len(), 2);

    session.apply_snapshot(Vec::new());
    assert!(session.catalog.is_empty());
    assert_eq!(session.selection.mode, ViewMode::Live);
}

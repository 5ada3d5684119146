//! End-to-end reconciler properties over the library surface.

use detection_watch::catalog::{FrameRef, reconcile};
use detection_watch::model::history::sort_key;
use detection_watch::model::types::{Snapshot, WireFrame, WireGroup};
use detection_watch::session::{Selection, ViewMode};

fn wire_frame(date: &str, time: &str, img: &str) -> WireFrame {
    WireFrame {
        date: date.into(),
        time: time.into(),
        img: img.into(),
        x: Some(10.0),
        y: Some(10.0),
        w: Some(20.0),
        h: Some(20.0),
        conf: Some(0.9),
    }
}

fn group(name: &str, frames: Vec<WireFrame>) -> WireGroup {
    WireGroup {
        name: name.into(),
        history: frames,
    }
}

fn historical(name: &str, cursor: usize, history_len: usize) -> Selection {
    Selection {
        mode: ViewMode::Historical,
        active: Some(name.into()),
        cursor,
        history_len,
        pinned: cursor + 1 == history_len,
        boxes_visible: false,
    }
}

#[test]
fn spec_scenario_b_before_a() {
    let snap: Snapshot = vec![
        group("A", vec![wire_frame("2024-01-01", "10:00:00", "a1")]),
        group("B", vec![wire_frame("2024-01-02", "09:00:00", "b1")]),
    ];
    let out = reconcile(snap, &Selection::default());
    let order: Vec<&str> = out.catalog.entities.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(order, ["B", "A"]);
}

#[test]
fn spec_scenario_pinned_cursor_follows_growth() {
    let grown: Snapshot = vec![group(
        "A",
        vec![
            wire_frame("2024-01-01", "10:00:00", "a1"),
            wire_frame("2024-01-01", "11:00:00", "a2"),
            wire_frame("2024-01-01", "12:00:00", "a3"),
            wire_frame("2024-01-01", "13:00:00", "a4"),
        ],
    )];
    let out = reconcile(grown, &historical("A", 2, 3));
    assert_eq!(out.selection.cursor, 3);
    assert_eq!(
        out.refresh,
        Some(FrameRef {
            entity: "A".into(),
            index: 3
        })
    );
    let rendered = &out.catalog.entities[0].history[3];
    assert_eq!(rendered.image, "a4");
}

#[test]
fn unpinned_cursor_survives_growth_unchanged() {
    let grown: Snapshot = vec![group(
        "A",
        vec![
            wire_frame("2024-01-01", "10:00:00", "a1"),
            wire_frame("2024-01-01", "11:00:00", "a2"),
            wire_frame("2024-01-01", "12:00:00", "a3"),
            wire_frame("2024-01-01", "13:00:00", "a4"),
        ],
    )];
    let out = reconcile(grown, &historical("A", 0, 3));
    assert_eq!(out.selection.cursor, 0);
    assert!(out.refresh.is_none());
}

#[test]
fn reconciling_twice_is_idempotent() {
    let snap: Snapshot = vec![
        group(
            "A",
            vec![
                wire_frame("2024-01-02", "10:00:00", "a2"),
                wire_frame("2024-01-01", "10:00:00", "a1"),
            ],
        ),
        group("B", vec![wire_frame("2024-01-03", "09:00:00", "b1")]),
    ];
    let first = reconcile(snap.clone(), &Selection::default());
    let second = reconcile(snap, &first.selection);
    assert_eq!(first.catalog, second.catalog);
    assert_eq!(first.selection, second.selection);
    assert!(second.refresh.is_none());
}

#[test]
fn vanished_entity_never_leaves_a_stale_reference() {
    let snap: Snapshot = vec![group("B", vec![wire_frame("2024-01-02", "09:00:00", "b1")])];
    let out = reconcile(snap, &historical("A", 1, 2));
    assert_eq!(out.selection.mode, ViewMode::Live);
    assert!(out.selection.active.is_none());
    assert_eq!(out.selection.cursor, 0);
}

#[test]
fn zero_size_wire_box_yields_no_region() {
    let mut frame = wire_frame("2024-01-01", "10:00:00", "a1");
    frame.w = Some(0.0);
    frame.h = Some(0.0);
    let out = reconcile(vec![group("A", vec![frame])], &Selection::default());
    assert!(out.catalog.entities[0].history[0].region.is_none());
}

mod ordering_property {
    use super::*;
    use proptest::prelude::*;

    fn arb_wire_frame() -> impl Strategy<Value = WireFrame> {
        (0u8..28, 0u8..24, 0u8..60).prop_map(|(day, hour, minute)| WireFrame {
            date: format!("2024-01-{:02}", day + 1),
            time: format!("{hour:02}:{minute:02}:00"),
            img: format!("img-{day}-{hour}-{minute}"),
            x: None,
            y: None,
            w: None,
            h: None,
            conf: None,
        })
    }

    fn arb_snapshot() -> impl Strategy<Value = Snapshot> {
        prop::collection::vec(
            ("[a-e]{1,4}", prop::collection::vec(arb_wire_frame(), 0..8)),
            0..6,
        )
        .prop_map(|groups| {
            groups
                .into_iter()
                .map(|(name, history)| WireGroup { name, history })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn catalog_ordering_invariants_hold(snapshot in arb_snapshot()) {
            let out = reconcile(snapshot, &Selection::default());

            // Every history ascends.
            for entity in &out.catalog.entities {
                prop_assert!(!entity.history.is_empty());
                for pair in entity.history.windows(2) {
                    prop_assert!(sort_key(&pair[0]) <= sort_key(&pair[1]));
                }
            }

            // Entities descend by latest timestamp.
            for pair in out.catalog.entities.windows(2) {
                prop_assert!(sort_key(pair[0].latest()) >= sort_key(pair[1].latest()));
            }

            // Counter matches what survived.
            let total: usize = out.catalog.entities.iter().map(|e| e.history.len()).sum();
            prop_assert_eq!(total, out.catalog.total_frames);
        }
    }
}

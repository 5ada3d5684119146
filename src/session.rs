//! Owned session context and the view-mode state machine.
//!
//! The original problem here is an implicit state machine: which of the live
//! feed and the historical timeline is showing, where the scrubber sits, and
//! whether the cursor should chase new frames. This module makes it explicit:
//! one [`Session`] owns catalog + selection + filters, every user action is
//! one method, and each method returns an [`Effect`] describing the render
//! work instead of doing any rendering. Everything is synchronous; the TUI
//! loop applies snapshots and user actions one at a time on a single thread,
//! which is the serialization the cursor rules depend on.

use tracing::debug;

use crate::catalog::{FrameRef, reconcile};
use crate::filter::Filters;
use crate::model::types::{Catalog, Snapshot};

/// Which of the two mutually exclusive views is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Live stream view. Initial state.
    #[default]
    Live,
    /// Scrubbing one entity's detection history.
    Historical,
    /// Transient post-reset state; `reset` re-enters Live immediately.
    Empty,
}

/// Cursor and selection state. Persists across catalog replacements and is
/// re-validated (never silently reset) by the reconciler.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selection {
    pub mode: ViewMode,
    /// Selected entity, tracked by name; catalog objects don't survive polls.
    pub active: Option<String>,
    /// Index into the active entity's history. Meaningful only in Historical.
    pub cursor: usize,
    /// History length at the last render, the bound the scrubber was built
    /// against. Updated by the reconciler when the history grows.
    pub history_len: usize,
    /// Whether the cursor auto-advances to track new incoming frames.
    pub pinned: bool,
    /// Live-mode annotation toggle. Historical mode always draws the region.
    pub boxes_visible: bool,
}

impl Selection {
    /// Switch to Live, clearing everything that only means something in
    /// Historical. Stale cursor reads are the bug this guards against.
    pub fn enter_live_mode(&mut self) {
        self.mode = ViewMode::Live;
        self.active = None;
        self.cursor = 0;
        self.history_len = 0;
        self.pinned = false;
    }
}

/// Render work requested by a transition. The UI layer interprets these;
/// the state machine itself never touches a terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// (Re-)request the live stream resource with the given annotation flag.
    OpenLiveStream { annotated: bool },
    /// Show one frame of one entity's history.
    RenderFrame(FrameRef),
}

/// The owned context: everything the catalog client knows this session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub catalog: Catalog,
    pub selection: Selection,
    pub filters: Filters,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one full snapshot atomically: reconcile against the current
    /// selection, then install catalog and selection together.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) -> Effect {
        let was_historical = self.selection.mode == ViewMode::Historical;
        let out = reconcile(snapshot, &self.selection);
        let fell_back_to_live = was_historical && out.selection.mode == ViewMode::Live;
        self.catalog = out.catalog;
        self.selection = out.selection;
        if fell_back_to_live {
            return Effect::OpenLiveStream {
                annotated: self.selection.boxes_visible,
            };
        }
        match out.refresh {
            Some(frame) => Effect::RenderFrame(frame),
            None => Effect::None,
        }
    }

    /// Any state → Live.
    pub fn enter_live(&mut self) -> Effect {
        self.selection.enter_live_mode();
        Effect::OpenLiveStream {
            annotated: self.selection.boxes_visible,
        }
    }

    /// Any state → Historical, if the entity exists. Lands on the newest
    /// frame with the cursor pinned.
    pub fn select_entity(&mut self, name: &str) -> Effect {
        let Some(entity) = self.catalog.entity(name) else {
            debug!(name, "select ignored: entity not in catalog");
            return Effect::None;
        };
        let index = entity.last_index();
        let len = entity.history.len();
        let entity_name = entity.name.clone();
        self.selection.mode = ViewMode::Historical;
        self.selection.active = Some(entity_name.clone());
        self.selection.cursor = index;
        self.selection.history_len = len;
        self.selection.pinned = true;
        Effect::RenderFrame(FrameRef {
            entity: entity_name,
            index,
        })
    }

    /// Move the scrubber. Historical only; the index is clamped to the
    /// current history bounds and pinning is recomputed.
    pub fn move_scrubber(&mut self, index: usize) -> Effect {
        if self.selection.mode != ViewMode::Historical {
            return Effect::None;
        }
        let Some(entity) = self
            .selection
            .active
            .as_deref()
            .and_then(|name| self.catalog.entity(name))
        else {
            return Effect::None;
        };
        let clamped = index.min(entity.last_index());
        self.selection.cursor = clamped;
        self.selection.history_len = entity.history.len();
        self.selection.pinned = clamped == entity.last_index();
        Effect::RenderFrame(FrameRef {
            entity: entity.name.clone(),
            index: clamped,
        })
    }

    /// Step the scrubber relative to the current cursor.
    pub fn nudge_scrubber(&mut self, delta: isize) -> Effect {
        if self.selection.mode != ViewMode::Historical {
            return Effect::None;
        }
        let target = self.selection.cursor.saturating_add_signed(delta);
        self.move_scrubber(target)
    }

    /// Toggle live-feed annotations. No-op in Historical, which always shows
    /// the region when one is present.
    pub fn toggle_box_overlay(&mut self) -> Effect {
        if self.selection.mode != ViewMode::Live {
            return Effect::None;
        }
        self.selection.boxes_visible = !self.selection.boxes_visible;
        Effect::OpenLiveStream {
            annotated: self.selection.boxes_visible,
        }
    }

    /// Any state → Empty → Live. Clears catalog, counters, filters, and all
    /// selection state. Call only after the server acknowledged the reset.
    pub fn reset(&mut self) -> Effect {
        self.catalog = Catalog::default();
        self.filters.clear();
        self.selection = Selection {
            mode: ViewMode::Empty,
            ..Selection::default()
        };
        self.enter_live()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{WireFrame, WireGroup};

    fn snapshot_one(name: &str, n: usize) -> Snapshot {
        vec![WireGroup {
            name: name.into(),
            history: (0..n)
                .map(|i| WireFrame {
                    date: "2024-01-01".into(),
                    time: format!("10:00:{i:02}"),
                    img: format!("{name}{i}"),
                    x: None,
                    y: None,
                    w: None,
                    h: None,
                    conf: None,
                })
                .collect(),
        }]
    }

    #[test]
    fn initial_state_is_live() {
        let s = Session::new();
        assert_eq!(s.selection.mode, ViewMode::Live);
        assert!(s.selection.active.is_none());
    }

    #[test]
    fn select_entity_lands_pinned_on_latest() {
        let mut s = Session::new();
        s.apply_snapshot(snapshot_one("Fox", 3));
        let effect = s.select_entity("Fox");
        assert_eq!(s.selection.mode, ViewMode::Historical);
        assert_eq!(s.selection.cursor, 2);
        assert!(s.selection.pinned);
        assert_eq!(
            effect,
            Effect::RenderFrame(FrameRef {
                entity: "Fox".into(),
                index: 2
            })
        );
    }

    #[test]
    fn select_unknown_entity_is_a_no_op() {
        let mut s = Session::new();
        s.apply_snapshot(snapshot_one("Fox", 1));
        assert_eq!(s.select_entity("Badger"), Effect::None);
        assert_eq!(s.selection.mode, ViewMode::Live);
    }

    #[test]
    fn scrubber_clamps_and_recomputes_pinning() {
        let mut s = Session::new();
        s.apply_snapshot(snapshot_one("Fox", 3));
        s.select_entity("Fox");

        let effect = s.move_scrubber(0);
        assert_eq!(s.selection.cursor, 0);
        assert!(!s.selection.pinned);
        assert_eq!(
            effect,
            Effect::RenderFrame(FrameRef {
                entity: "Fox".into(),
                index: 0
            })
        );

        s.move_scrubber(99);
        assert_eq!(s.selection.cursor, 2);
        assert!(s.selection.pinned);
    }

    #[test]
    fn scrubber_outside_historical_is_a_no_op() {
        let mut s = Session::new();
        s.apply_snapshot(snapshot_one("Fox", 3));
        assert_eq!(s.move_scrubber(1), Effect::None);
        assert_eq!(s.nudge_scrubber(-1), Effect::None);
    }

    #[test]
    fn nudge_steps_relative_to_cursor() {
        let mut s = Session::new();
        s.apply_snapshot(snapshot_one("Fox", 3));
        s.select_entity("Fox");
        s.nudge_scrubber(-1);
        assert_eq!(s.selection.cursor, 1);
        s.nudge_scrubber(-5);
        assert_eq!(s.selection.cursor, 0);
        s.nudge_scrubber(1);
        assert_eq!(s.selection.cursor, 1);
    }

    #[test]
    fn box_toggle_only_in_live() {
        let mut s = Session::new();
        s.apply_snapshot(snapshot_one("Fox", 1));
        assert_eq!(
            s.toggle_box_overlay(),
            Effect::OpenLiveStream { annotated: true }
        );
        assert!(s.selection.boxes_visible);

        s.select_entity("Fox");
        assert_eq!(s.toggle_box_overlay(), Effect::None);
        assert!(s.selection.boxes_visible);
    }

    #[test]
    fn entering_live_clears_historical_cursor_state() {
        let mut s = Session::new();
        s.apply_snapshot(snapshot_one("Fox", 3));
        s.select_entity("Fox");
        s.move_scrubber(1);

        let effect = s.enter_live();
        assert_eq!(s.selection.mode, ViewMode::Live);
        assert!(s.selection.active.is_none());
        assert_eq!(s.selection.cursor, 0);
        assert_eq!(s.selection.history_len, 0);
        assert!(!s.selection.pinned);
        assert_eq!(effect, Effect::OpenLiveStream { annotated: false });
    }

    #[test]
    fn reset_clears_everything_and_reenters_live() {
        let mut s = Session::new();
        s.apply_snapshot(snapshot_one("Fox", 3));
        s.select_entity("Fox");
        s.filters.name_query = "fox".into();
        s.toggle_box_overlay();

        let effect = s.reset();
        assert!(s.catalog.is_empty());
        assert_eq!(s.catalog.total_frames, 0);
        assert!(s.filters.is_empty());
        assert_eq!(s.selection.mode, ViewMode::Live);
        assert!(s.selection.active.is_none());
        assert!(!s.selection.boxes_visible);
        assert_eq!(effect, Effect::OpenLiveStream { annotated: false });
    }

    #[test]
    fn snapshot_while_pinned_requests_new_frame_render() {
        let mut s = Session::new();
        s.apply_snapshot(snapshot_one("Fox", 3));
        s.select_entity("Fox");

        let effect = s.apply_snapshot(snapshot_one("Fox", 4));
        assert_eq!(s.selection.cursor, 3);
        assert_eq!(
            effect,
            Effect::RenderFrame(FrameRef {
                entity: "Fox".into(),
                index: 3
            })
        );
        // The rendered frame really is the new fourth entry.
        let entity = s.catalog.entity("Fox").expect("present");
        assert_eq!(entity.history[3].image, "Fox3");
    }

    #[test]
    fn snapshot_dropping_active_entity_reopens_live_stream() {
        let mut s = Session::new();
        s.apply_snapshot(snapshot_one("Fox", 2));
        s.select_entity("Fox");

        let effect = s.apply_snapshot(snapshot_one("Badger", 1));
        assert_eq!(s.selection.mode, ViewMode::Live);
        assert_eq!(effect, Effect::OpenLiveStream { annotated: false });
    }
}

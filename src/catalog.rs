//! Catalog reconciliation.
//!
//! The server sends full state on every poll, so the catalog is rebuilt
//! wholesale here — never patched — and the caller's selection is re-validated
//! against the new data by name. `reconcile` is a pure function: no I/O, no
//! rendering, which is what makes the cursor-resync rules testable on their
//! own.

use tracing::debug;

use crate::model::history::{sort_history, sort_key};
use crate::model::types::{Catalog, Entity, Frame, Snapshot};
use crate::session::{Selection, ViewMode};

/// Identifies one frame of one entity for a render request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRef {
    pub entity: String,
    pub index: usize,
}

/// Output of one reconciliation pass, installed atomically by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub catalog: Catalog,
    pub selection: Selection,
    /// Frame to re-render because a pinned cursor advanced. `None` when the
    /// viewed frame is unchanged (or nothing is being viewed).
    pub refresh: Option<FrameRef>,
}

/// Build a normalized catalog from a raw snapshot and re-synchronize the
/// prior selection against it.
///
/// Cursor rules: a cursor pinned to the newest frame follows history growth;
/// a cursor parked on an older frame stays put. If the active entity is gone
/// from the new snapshot the selection falls back to Live — the alternative
/// would be rendering an object the server just stopped vouching for.
pub fn reconcile(snapshot: Snapshot, prior: &Selection) -> Reconciled {
    let catalog = build_catalog(snapshot);
    let mut selection = prior.clone();
    let mut refresh = None;

    if prior.mode == ViewMode::Historical {
        match prior.active.as_deref().and_then(|name| catalog.entity(name)) {
            Some(entity) => {
                let was_at_latest = prior.history_len > 0 && prior.cursor == prior.history_len - 1;
                selection.history_len = entity.history.len();
                if was_at_latest {
                    selection.cursor = entity.last_index();
                    selection.pinned = true;
                    if selection.cursor != prior.cursor {
                        refresh = Some(FrameRef {
                            entity: entity.name.clone(),
                            index: selection.cursor,
                        });
                    }
                } else {
                    // User is inspecting a fixed point in the past; clamp only
                    // if the new history somehow shrank below the cursor.
                    selection.cursor = prior.cursor.min(entity.last_index());
                }
            }
            None => {
                debug!(
                    entity = prior.active.as_deref().unwrap_or(""),
                    "active entity vanished from snapshot, falling back to live"
                );
                selection.enter_live_mode();
            }
        }
    }

    Reconciled {
        catalog,
        selection,
        refresh,
    }
}

/// Normalize groups into sorted entities and order the catalog by recency.
fn build_catalog(snapshot: Snapshot) -> Catalog {
    let mut total_frames = 0usize;
    let mut entities: Vec<Entity> = snapshot
        .into_iter()
        .filter_map(|group| {
            let mut history: Vec<Frame> = group.history.into_iter().map(Frame::from_wire).collect();
            if history.is_empty() {
                return None;
            }
            sort_history(&mut history);
            total_frames += history.len();
            Some(Entity {
                name: group.name,
                history,
            })
        })
        .collect();

    // Most recently active entity first. Stable, so ties keep snapshot order.
    entities.sort_by(|a, b| sort_key(b.latest()).cmp(&sort_key(a.latest())));

    Catalog {
        entities,
        total_frames,
    }
}

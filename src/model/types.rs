//! Wire and normalized catalog structs.
//!
//! The server replies to `/api/data` with full state every time, so the wire
//! types (`WireGroup`/`WireFrame`) are decode-only and get normalized into
//! `Entity`/`Frame` during reconciliation. Required fields on the wire types
//! mean a schema violation anywhere fails the whole decode, which is exactly
//! the "reject the snapshot wholesale" contract.

use serde::{Deserialize, Serialize};

/// One detection record as the server sends it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireFrame {
    pub date: String,
    pub time: String,
    pub img: String,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub w: Option<f64>,
    #[serde(default)]
    pub h: Option<f64>,
    #[serde(default)]
    pub conf: Option<f64>,
}

/// One named group of detections as the server sends it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireGroup {
    pub name: String,
    pub history: Vec<WireFrame>,
}

/// A full `/api/data` payload. Replaces all prior catalog state on arrival.
pub type Snapshot = Vec<WireGroup>;

/// Bounding region in percentage-of-image units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// One immutable detection frame after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Calendar date string, `%Y-%m-%d`.
    pub date: String,
    /// Time-of-day string, `%H:%M:%S`.
    pub time: String,
    /// Opaque image reference (URL into the server's upload dir).
    pub image: String,
    /// Present only when the wire carried a non-degenerate box.
    pub region: Option<Region>,
    pub confidence: Option<f64>,
}

impl Frame {
    /// Normalize a wire frame. A missing or zero-size box maps to no region.
    pub fn from_wire(w: WireFrame) -> Self {
        let region = match (w.x, w.y, w.w, w.h) {
            (Some(x), Some(y), Some(rw), Some(rh)) if rw > 0.0 && rh > 0.0 => {
                Some(Region { x, y, w: rw, h: rh })
            }
            _ => None,
        };
        Self {
            date: w.date,
            time: w.time,
            image: w.img,
            region,
            confidence: w.conf,
        }
    }

    /// Confidence formatted for box labels, e.g. `0.87`.
    pub fn confidence_label(&self) -> Option<String> {
        self.confidence.map(|c| format!("{c:.2}"))
    }
}

/// A named subject with an ascending-sorted, non-empty detection history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub history: Vec<Frame>,
}

impl Entity {
    /// Most recent frame. History is non-empty by construction
    /// (empty groups are dropped during reconciliation).
    pub fn latest(&self) -> &Frame {
        &self.history[self.history.len() - 1]
    }

    /// Index of the newest frame.
    pub fn last_index(&self) -> usize {
        self.history.len() - 1
    }
}

/// The full, server-replaced collection of entities for the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Sorted descending by each entity's latest timestamp.
    pub entities: Vec<Entity>,
    /// Running detection counter across all entities.
    pub total_frames: usize,
}

impl Catalog {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Cross-poll identity is by name, never by reference: the underlying
    /// objects are replaced wholesale on every snapshot.
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entity(name).is_some()
    }
}

//! Two-phase frame/overlay hand-off.
//!
//! A bounding region must never linger from the previous frame while the next
//! image is still loading, and a slow load that finishes after the user moved
//! on must not paint its overlay over the wrong frame. Instead of wiring that
//! through load callbacks, each render request stamps a generation: `begin`
//! clears the overlay and bumps the generation, `complete` installs the
//! overlay only if its generation is still current. Stale completions fall on
//! the floor.

use crate::model::types::Region;

/// What `complete` installs for the UI to draw over the image.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub region: Region,
    /// Owning entity's name, drawn as the box label.
    pub label: String,
    /// Confidence formatted to two decimals, appended to the label when known.
    pub confidence: Option<String>,
}

impl Overlay {
    /// Label text as rendered: `Fox` or `Fox 0.87`.
    pub fn caption(&self) -> String {
        match &self.confidence {
            Some(conf) => format!("{} {}", self.label, conf),
            None => self.label.clone(),
        }
    }
}

/// A render request in flight, identified by generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

/// Overlay gate for the frame viewport.
#[derive(Debug, Default)]
pub struct Viewport {
    generation: u64,
    overlay: Option<Overlay>,
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase one: a new frame was requested. Clears whatever overlay is
    /// showing and returns the ticket the completion must present.
    pub fn begin(&mut self) -> Ticket {
        self.generation += 1;
        self.overlay = None;
        Ticket {
            generation: self.generation,
        }
    }

    /// Phase two: the frame's image is in place. Installs the overlay only if
    /// no newer request superseded this one. Returns whether it took effect.
    /// `None` for a region-less frame keeps the viewport clear.
    pub fn complete(&mut self, ticket: Ticket, overlay: Option<Overlay>) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        self.overlay = overlay;
        true
    }

    /// The overlay to draw, if any.
    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    /// Drop any overlay without requesting a frame (e.g. entering Live).
    pub fn clear(&mut self) {
        self.overlay = None;
    }
}

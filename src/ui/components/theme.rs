//! Theme definitions for the watch console.
//!
//! Dark-first: the console is meant to sit on a second monitor next to a
//! camera feed, so the base palette is near-black with a single blue accent
//! used sparingly (active entity, pinned cursor, live badge).

use ratatui::style::{Color, Modifier, Style};

/// Console color constants.
pub mod colors {
    use ratatui::style::Color;

    /// Primary canvas, near-black.
    pub const BG_DEEP: Color = Color::Rgb(10, 10, 10); // #0a0a0a

    /// Elevated surface - selected rows, the viewport frame.
    pub const BG_SURFACE: Color = Color::Rgb(26, 26, 26); // #1a1a1a

    /// Primary text.
    pub const TEXT_PRIMARY: Color = Color::Rgb(235, 235, 235);

    /// Muted text - timestamps, hints, dimmed rows.
    pub const TEXT_MUTED: Color = Color::Rgb(85, 85, 85); // #555

    /// Accent - selection, live badge, box outlines.
    pub const ACCENT: Color = Color::Rgb(59, 130, 246); // blue-500

    /// Alert accent - reset, detections counter.
    pub const ALERT: Color = Color::Rgb(239, 68, 68); // red-500

    /// Border gray.
    pub const BORDER: Color = Color::Rgb(51, 51, 51); // #333
}

#[derive(Clone, Copy)]
pub struct ThemePalette {
    pub accent: Color,
    pub alert: Color,
    pub bg: Color,
    pub fg: Color,
    pub surface: Color,
    pub hint: Color,
    pub border: Color,
}

impl ThemePalette {
    pub fn dark() -> Self {
        Self {
            accent: colors::ACCENT,
            alert: colors::ALERT,
            bg: colors::BG_DEEP,
            fg: colors::TEXT_PRIMARY,
            surface: colors::BG_SURFACE,
            hint: colors::TEXT_MUTED,
            border: colors::BORDER,
        }
    }

    /// Title style - accent colored, bold.
    pub fn title(self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    /// Hint text style - secondary/muted information.
    pub fn hint_style(self) -> Style {
        Style::default().fg(self.hint)
    }

    /// Border style for unfocused panes.
    pub fn border_style(self) -> Style {
        Style::default().fg(self.border)
    }

    /// Border style for the focused pane.
    pub fn border_focus_style(self) -> Style {
        Style::default().fg(self.accent)
    }

    /// Dimmed style for filtered-out catalog rows.
    pub fn dimmed(self) -> Style {
        Style::default().fg(self.hint).add_modifier(Modifier::DIM)
    }

    /// Style for the entity name on a bounding-box label.
    pub fn box_label(self) -> Style {
        Style::default()
            .fg(self.bg)
            .bg(self.accent)
            .add_modifier(Modifier::BOLD)
    }
}

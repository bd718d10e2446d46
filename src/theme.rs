//! Kanagawa Dragon theme module.
//!
//! Low-contrast, warm, dark palette plus the deterministic per-sponsor color
//! assignment used by both views. Sponsor colors are a pure function of the
//! company key, memoized for the session.

use std::cell::RefCell;
use std::collections::HashMap;

use ratatui::style::Color;

/// Kanagawa Dragon color palette.
pub mod colors {
    use super::Color;

    // === Background Colors ===
    /// Dragon Black - Primary background
    pub const BG_DARK: Color = Color::Rgb(0x18, 0x16, 0x16);
    /// Slightly lighter background for medium contrast areas
    pub const BG_MEDIUM: Color = Color::Rgb(0x1D, 0x1C, 0x19);
    /// Background for highlighted/selected areas
    pub const BG_HIGHLIGHT: Color = Color::Rgb(0x28, 0x27, 0x27);

    // === Foreground Colors ===
    /// Old White - Primary text color
    pub const FG_PRIMARY: Color = Color::Rgb(0xC5, 0xC9, 0xC5);
    /// Dimmed text for secondary information
    pub const FG_DIM: Color = Color::Rgb(0x72, 0x71, 0x69);
    /// Very dim text for hints and placeholders
    pub const FG_HINT: Color = Color::Rgb(0x54, 0x54, 0x54);

    // === Accent Colors ===
    /// Dragon Red - For errors and warnings
    pub const RED: Color = Color::Rgb(0xC4, 0x74, 0x6E);
    /// Dragon Green - For success, actual (confirmed) milestones
    pub const GREEN: Color = Color::Rgb(0x8A, 0x9A, 0x7B);
    /// Carp Yellow - For warnings and the today marker
    pub const YELLOW: Color = Color::Rgb(0xC4, 0xB2, 0x8A);
    /// Dragon Blue - For info, selected items
    pub const BLUE: Color = Color::Rgb(0x8B, 0xA4, 0xB0);
    /// Purple - For special accents
    pub const PURPLE: Color = Color::Rgb(0x95, 0x7F, 0xB8);

    // === UI Element Colors ===
    /// Wall Gray - For borders and separators
    pub const BORDER: Color = Color::Rgb(0x72, 0x71, 0x69);
    /// Dim border for less important separators
    pub const BORDER_DIM: Color = Color::Rgb(0x3A, 0x3A, 0x3A);
    /// Accent border for focused elements
    pub const BORDER_ACCENT: Color = Color::Rgb(0x8B, 0xA4, 0xB0);

    // === Timeline Colors ===
    /// Today marker line
    pub const TODAY_MARKER: Color = YELLOW;
    /// Readout marker for actual dates
    pub const MARKER_ACTUAL: Color = GREEN;
    /// Readout marker for estimated dates
    pub const MARKER_ESTIMATED: Color = Color::Rgb(0xE8, 0xE8, 0xE8);
}

/// Semantic styling helpers
pub mod styles {
    use super::colors;
    use ratatui::style::{Modifier, Style};

    /// Style for primary text
    pub fn text() -> Style {
        Style::default().fg(colors::FG_PRIMARY)
    }

    /// Style for dimmed/secondary text
    pub fn text_dim() -> Style {
        Style::default().fg(colors::FG_DIM)
    }

    /// Style for hint text
    pub fn text_hint() -> Style {
        Style::default().fg(colors::FG_HINT)
    }

    /// Style for success messages
    pub fn success() -> Style {
        Style::default().fg(colors::GREEN)
    }

    /// Style for error messages
    pub fn error() -> Style {
        Style::default().fg(colors::RED)
    }

    /// Style for warning messages
    pub fn warning() -> Style {
        Style::default().fg(colors::YELLOW)
    }

    /// Style for info messages
    pub fn info() -> Style {
        Style::default().fg(colors::BLUE)
    }

    /// Style for focused borders
    pub fn border_focused() -> Style {
        Style::default().fg(colors::BORDER_ACCENT)
    }

    /// Style for unfocused borders
    pub fn border() -> Style {
        Style::default().fg(colors::BORDER)
    }

    /// Style for dim borders
    pub fn border_dim() -> Style {
        Style::default().fg(colors::BORDER_DIM)
    }

    /// Style for block titles
    pub fn title() -> Style {
        Style::default()
            .fg(colors::FG_PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for accent titles (tabs, headers)
    pub fn title_accent() -> Style {
        Style::default()
            .fg(colors::BLUE)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for tab titles (active)
    pub fn tab_active() -> Style {
        Style::default()
            .fg(colors::BLUE)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for tab titles (inactive)
    pub fn tab_inactive() -> Style {
        Style::default().fg(colors::FG_DIM)
    }

    /// Style for filter field labels
    pub fn form_label() -> Style {
        Style::default().fg(colors::FG_DIM)
    }

    /// Style for a filter input being edited
    pub fn form_input_focused() -> Style {
        Style::default()
            .fg(colors::FG_PRIMARY)
            .bg(colors::BG_HIGHLIGHT)
    }

    /// Style for an idle filter input
    pub fn form_input() -> Style {
        Style::default()
            .fg(colors::FG_PRIMARY)
            .bg(colors::BG_MEDIUM)
    }
}

/// An HSL triple as produced by the sponsor hash. Hue 0..360, saturation
/// 30..60, lightness 40..60 — the constrained "professional" range the
/// dataset producer standardized on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsl {
    pub h: u16,
    pub s: u8,
    pub l: u8,
}

impl Hsl {
    /// Convert to an RGB terminal color. The HSL triple is the contract;
    /// RGB is only the presentation encoding.
    pub fn to_color(self) -> Color {
        let h = f64::from(self.h) / 360.0;
        let s = f64::from(self.s) / 100.0;
        let l = f64::from(self.l) / 100.0;

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;

        let r = hue_to_rgb(p, q, h + 1.0 / 3.0);
        let g = hue_to_rgb(p, q, h);
        let b = hue_to_rgb(p, q, h - 1.0 / 3.0);

        Color::Rgb(
            (r * 255.0).round() as u8,
            (g * 255.0).round() as u8,
            (b * 255.0).round() as u8,
        )
    }
}

fn hue_to_rgb(p: f64, q: f64, t: f64) -> f64 {
    let t = if t < 0.0 {
        t + 1.0
    } else if t > 1.0 {
        t - 1.0
    } else {
        t
    };

    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// The producer's 32-bit string hash: `hash = code + ((hash << 5) - hash)`
/// over UTF-16 code units, with wrapping i32 arithmetic so colors reproduce
/// exactly across environments.
fn company_hash(key: &str) -> i32 {
    let mut hash: i32 = 0;
    for unit in key.encode_utf16() {
        hash = i32::from(unit).wrapping_add((hash << 5).wrapping_sub(hash));
    }
    hash
}

/// Deterministic sponsor color. Collisions between distinct keys are
/// possible and accepted.
pub fn company_hsl(key: &str) -> Hsl {
    let magnitude = company_hash(key).unsigned_abs();
    Hsl {
        h: (magnitude % 360) as u16,
        s: (30 + magnitude % 30) as u8,
        l: (40 + magnitude % 20) as u8,
    }
}

/// Session-scoped memo cache for sponsor colors. Single-threaded by
/// construction (everything runs on the UI thread), so interior mutability
/// via RefCell is enough.
#[derive(Debug, Default)]
pub struct CompanyPalette {
    cache: RefCell<HashMap<String, Hsl>>,
}

impl CompanyPalette {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color_for(&self, key: &str) -> Hsl {
        if let Some(hsl) = self.cache.borrow().get(key) {
            return *hsl;
        }
        let hsl = company_hsl(key);
        self.cache.borrow_mut().insert(key.to_string(), hsl);
        hsl
    }

    /// Terminal color for a sponsor key.
    pub fn terminal_color(&self, key: &str) -> Color {
        self.color_for(key).to_color()
    }
}

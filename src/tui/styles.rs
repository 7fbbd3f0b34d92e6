//! Medical-themed color palette and styles.

use ratatui::style::{Color, Modifier, Style};

use crate::domain::RiskBand;

/// Medical theme color palette.
pub struct MedicalTheme;

impl MedicalTheme {
    // === Primary Colors ===

    /// Cyan - Primary color
    pub const PRIMARY: Color = Color::Rgb(6, 182, 212); // #06B6D4

    /// Lighter cyan for highlights
    pub const PRIMARY_LIGHT: Color = Color::Rgb(103, 232, 249); // #67E8F9

    // === Secondary Colors ===

    /// Light slate for borders
    pub const SECONDARY_LIGHT: Color = Color::Rgb(148, 163, 184); // #94A3B8

    // === Semantic Colors ===

    /// Emerald - success
    pub const SUCCESS: Color = Color::Rgb(16, 185, 129); // #10B981

    /// Red - errors
    pub const DANGER: Color = Color::Rgb(239, 68, 68); // #EF4444

    // === Background Colors ===

    /// Near-black with blue tint
    pub const BG_DARK: Color = Color::Rgb(15, 23, 42); // #0F172A

    // === Text Colors ===

    /// Primary text (white)
    pub const TEXT_PRIMARY: Color = Color::Rgb(248, 250, 252); // #F8FAFC

    /// Secondary text (gray)
    pub const TEXT_SECONDARY: Color = Color::Rgb(203, 213, 225); // #CBD5E1

    /// Muted text
    pub const TEXT_MUTED: Color = Color::Rgb(100, 116, 139); // #64748B

    /// One color per contribution bar, largest first; the last is "Other Factors".
    pub const CHART: [Color; 7] = [
        Color::Rgb(6, 182, 212),  // #06B6D4
        Color::Rgb(59, 130, 246), // #3B82F6
        Color::Rgb(139, 92, 246), // #8B5CF6
        Color::Rgb(16, 185, 129), // #10B981
        Color::Rgb(245, 158, 11), // #F59E0B
        Color::Rgb(239, 68, 68),  // #EF4444
        Color::Rgb(107, 114, 128), // #6B7280
    ];

    // === Preset Styles ===

    /// Style for titles
    #[must_use]
    pub fn title() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for subtitles
    #[must_use]
    pub fn subtitle() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn text() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY)
    }

    #[must_use]
    pub fn text_secondary() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    #[must_use]
    pub fn text_muted() -> Style {
        Style::default().fg(Self::TEXT_MUTED)
    }

    #[must_use]
    pub fn success() -> Style {
        Style::default().fg(Self::SUCCESS)
    }

    #[must_use]
    pub fn danger() -> Style {
        Style::default().fg(Self::DANGER)
    }

    /// Style for the selected form row
    #[must_use]
    pub fn selected() -> Style {
        Style::default()
            .fg(Self::BG_DARK)
            .bg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for focused elements
    #[must_use]
    pub fn focused() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn border() -> Style {
        Style::default().fg(Self::SECONDARY_LIGHT)
    }

    #[must_use]
    pub fn border_focused() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    /// Style for key hints
    #[must_use]
    pub fn key_hint() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for key descriptions
    #[must_use]
    pub fn key_desc() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    /// Get risk band style
    #[must_use]
    pub fn risk_band(band: RiskBand) -> Style {
        let (r, g, b) = band.color();
        Style::default().fg(Color::Rgb(r, g, b))
    }

    /// Bar color for the `rank`-th chart entry.
    #[must_use]
    pub fn chart(rank: usize) -> Style {
        Style::default().fg(Self::CHART[rank.min(Self::CHART.len() - 1)])
    }
}

/// Smaller inline logo
pub const LOGO_SMALL: &str = "HoloMed";

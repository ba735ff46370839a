// Screen layout: panel arrangement and sizing.
//
// Divides the terminal area into fixed zones for the wizard:
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +--------------------------------------------------+
// |                                                   |
// | Body (question / review / report content)        |
// |                                                   |
// +--------------------------------------------------+
// | Notice (1 row)                                    |
// +--------------------------------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Resolved screen areas for each zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: advisor, step progress, request status.
    pub status_bar: Rect,
    /// Central content area, switched per screen.
    pub body: Rect,
    /// One-line transient notice above the help bar.
    pub notice: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

/// Build the wizard layout from the available terminal area.
pub fn build_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(8),    // body
            Constraint::Length(1), // notice
            Constraint::Length(1), // help bar
        ])
        .split(area);

    AppLayout {
        status_bar: vertical[0],
        body: vertical[1],
        notice: vertical[2],
        help_bar: vertical[3],
    }
}

/// Compute a centered rectangle of the given size within `area`, clamped to
/// the available space. Used for modal overlays.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    use ratatui::layout::Flex;

    let clamped_width = width.min(area.width);
    let clamped_height = height.min(area.height);

    let vertical = Layout::vertical([Constraint::Length(clamped_height)])
        .flex(Flex::Center)
        .split(area);

    let horizontal = Layout::horizontal([Constraint::Length(clamped_width)])
        .flex(Flex::Center)
        .split(vertical[0]);

    horizontal[0]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! UI rendering for the dashboard

mod containers;
mod header_footer;

use crate::app::App;
use dockview_core::Freshness;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
};

use containers::*;
use header_footer::*;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
    let area = frame.size();

    // Main layout: header, project tree, footer with status
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    draw_header(frame, app, chunks[0]);
    draw_containers(frame, app, chunks[1]);
    draw_footer(frame, app, chunks[2]);

    if app.show_help {
        let popup = popup_rect(60, 80, 52, 24, chunks[1]);
        frame.render_widget(Clear, popup);
        draw_help(frame, popup);
    }
}

/// Calculate a popup rectangle centered in the given area with percentage-based sizing and minimums
fn popup_rect(pct_w: u16, pct_h: u16, min_w: u16, min_h: u16, area: Rect) -> Rect {
    let w = ((area.width as u32 * pct_w as u32) / 100) as u16;
    let h = ((area.height as u32 * pct_h as u32) / 100) as u16;
    let w = w.max(min_w).min(area.width);
    let h = h.max(min_h).min(area.height);
    centered_rect(w, h, area)
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_respects_area_origin() {
        let area = Rect::new(0, 3, 100, 20);
        assert_eq!(centered_rect(40, 10, area), Rect::new(30, 8, 40, 10));
    }

    #[test]
    fn test_popup_rect_clamps_to_area() {
        let area = Rect::new(0, 0, 30, 10);
        let popup = popup_rect(60, 80, 52, 24, area);
        assert_eq!(popup, Rect::new(0, 0, 30, 10));
    }
}

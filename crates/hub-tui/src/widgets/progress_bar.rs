//! Smooth Unicode progress bar widget.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_MUTED, C_OK, C_SECONDARY};

/// Render a progress bar in `area`. `progress` is 0.0..=1.0; the labels sit
/// left and right of the bar and may be empty.
pub fn draw_progress(frame: &mut Frame, area: Rect, progress: f64, left: &str, right: &str) {
    if area.width < 4 || area.height == 0 {
        return;
    }

    let label_w = (left.chars().count() + right.chars().count() + 2) as u16;
    let bar_w = area.width.saturating_sub(label_w).max(4) as usize;

    let mut spans = Vec::new();
    if !left.is_empty() {
        spans.push(Span::styled(
            format!("{} ", left),
            Style::default().fg(C_SECONDARY),
        ));
    }
    spans.push(Span::styled(bar(progress, bar_w), Style::default().fg(C_OK)));
    if !right.is_empty() {
        spans.push(Span::styled(format!(" {}", right), Style::default().fg(C_MUTED)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// 8 eighths per cell.
fn bar(progress: f64, width: usize) -> String {
    const BLOCKS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];

    let eighths = (progress.clamp(0.0, 1.0) * width as f64 * 8.0) as usize;
    let full_blocks = eighths / 8;
    let partial = eighths % 8;

    let mut out = String::with_capacity(width + 4);
    for _ in 0..full_blocks {
        out.push('█');
    }
    if full_blocks < width {
        out.push(BLOCKS[partial]);
        for _ in (full_blocks + 1)..width {
            out.push(' ');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_width_is_stable() {
        for p in [0.0, 0.01, 0.5, 0.999, 1.0, 2.0] {
            assert_eq!(bar(p, 10).chars().count(), 10);
        }
        assert_eq!(bar(1.0, 4), "████");
        assert_eq!(bar(0.5, 4), "██  ");
    }
}

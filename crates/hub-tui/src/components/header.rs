//! Header: one-row top bar with hub address, live channel state, client count
//! and the last like result. Not focusable.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{
    app_state::AppState,
    theme::{connection_color, C_ACCENT, C_LIKE, C_MUTED, C_PRIMARY, C_SECONDARY},
};

pub fn draw_header(frame: &mut Frame, area: Rect, state: &AppState) {
    if area.height == 0 {
        return;
    }
    let mut spans = vec![
        Span::styled(
            " hub ",
            Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled(state.base_url.clone(), Style::default().fg(C_PRIMARY)),
        Span::styled("  ", Style::default()),
        Span::styled("● ", Style::default().fg(connection_color(state.connection))),
        Span::styled(state.connection.label(), Style::default().fg(C_SECONDARY)),
    ];

    if let Some(n) = state.live_clients {
        spans.push(Span::styled(
            format!("  {} live", n),
            Style::default().fg(C_MUTED),
        ));
    }

    if let Some((id, like)) = &state.like {
        let heart = if like.liked { "♥" } else { "♡" };
        spans.push(Span::styled("  ", Style::default()));
        spans.push(Span::styled(
            format!("{} {} #{}", heart, like.likes, id),
            Style::default().fg(C_LIKE),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

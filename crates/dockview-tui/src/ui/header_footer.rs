use super::*;

pub(super) fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(" dockview ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("[{}]", app.runtime_kind),
            Style::default().fg(Color::Yellow),
        ),
    ];
    if let Some(fetched_at) = app.published.fetched_at {
        spans.push(Span::styled(
            format!("  updated {}", fetched_at.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    frame.render_widget(header, area);
}

/// Running/total counts, the active filter, and staleness
pub(super) fn summary_line(app: &App) -> Vec<Span<'static>> {
    let snapshot = &app.published.snapshot;
    let filter = if app.show_stopped {
        "all"
    } else {
        "running only"
    };

    let mut spans = vec![Span::raw(format!(
        " {}/{} running | filter: {}",
        snapshot.running_count(),
        snapshot.container_count(),
        filter
    ))];

    if app.pending_tasks > 0 {
        spans.push(Span::styled(
            format!(" | {} pending", app.pending_tasks),
            Style::default().fg(Color::Yellow),
        ));
    }

    if let Freshness::Stale {
        error,
        consecutive_failures,
    } = &app.published.freshness
    {
        spans.push(Span::styled(
            format!(" | STALE ({} failed polls): {}", consecutive_failures, error),
            Style::default().fg(Color::Red).bold(),
        ));
    }

    spans
}

pub(super) fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = summary_line(app);
    spans.push(Span::raw(" | "));

    match &app.status {
        Some(status) => {
            let color = if status.is_error {
                Color::Red
            } else {
                Color::Green
            };
            spans.push(Span::styled(status.text.clone(), Style::default().fg(color)));
        }
        None => spans.push(Span::styled(
            "j/k: Move  s/c/r: Start/Stop/Restart  R: Restart project  l: Logs  ?: Help  q: Quit",
            Style::default().fg(Color::DarkGray),
        )),
    }

    let footer = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));

    frame.render_widget(footer, area);
}

pub(super) fn draw_help(frame: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(Span::styled("Navigation", Style::default().bold().underlined())),
        Line::from(""),
        Line::from("  j/Down      Move selection down"),
        Line::from("  k/Up        Move selection up"),
        Line::from("  gg/Home     Go to first container"),
        Line::from("  G/End       Go to last container"),
        Line::from(""),
        Line::from(Span::styled("Containers", Style::default().bold().underlined())),
        Line::from(""),
        Line::from("  s           Start container"),
        Line::from("  c           Stop container"),
        Line::from("  r           Restart container"),
        Line::from("  S/C/R       Start/Stop/Restart every container in the project"),
        Line::from("  l           Open live logs"),
        Line::from(""),
        Line::from(Span::styled("View", Style::default().bold().underlined())),
        Line::from(""),
        Line::from("  F5          Refresh now"),
        Line::from("  h           Show/hide stopped containers"),
        Line::from("  ?           Toggle this help"),
        Line::from("  q/Ctrl-C    Quit"),
    ];

    let help = Paragraph::new(text)
        .block(
            Block::default()
                .title(" Help (any key to close) ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(help, area);
}

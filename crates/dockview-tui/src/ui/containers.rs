use super::*;
use dockview_core::ProjectGroup;
use dockview_runtime::{ContainerRecord, ContainerStatus};

pub(super) fn draw_containers(frame: &mut Frame, app: &mut App, area: Rect) {
    let snapshot = app.published.snapshot.clone();
    let rows = snapshot.rows(app.row_filter());
    let title = if app.show_stopped {
        " Containers ".to_string()
    } else {
        " Containers (running only) ".to_string()
    };

    if rows.is_empty() {
        let message = match (&app.published.freshness, snapshot.is_empty()) {
            (Freshness::Loading, _) => "Loading containers...",
            (Freshness::Stale { .. }, true) => {
                "Container runtime unavailable.\n\nRetrying on the next refresh."
            }
            (_, true) => "No containers found.",
            (_, false) => "No running containers.\n\nPress 'h' to show stopped containers.",
        };
        let empty = Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().title(title).borders(Borders::ALL))
            .wrap(Wrap { trim: true });

        app.table_state.select(None);
        frame.render_widget(empty, area);
        return;
    }

    // Define header row
    let header = Row::new(vec![
        Cell::from("Name"),
        Cell::from("Status"),
        Cell::from("Ports"),
        Cell::from("Image"),
    ])
    .style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
    .bottom_margin(1);

    // One line per project, followed by its visible containers
    let selected = app.cursor.row(&rows);
    let mut lines: Vec<Row> = Vec::with_capacity(rows.len() + snapshot.groups().len());
    let mut selected_line = None;
    let mut current_group = None;
    for (i, row) in rows.iter().enumerate() {
        if current_group != Some(row.group) {
            current_group = Some(row.group);
            lines.push(project_line(&snapshot.groups()[row.group]));
        }
        if selected == Some(i) {
            selected_line = Some(lines.len());
        }
        lines.push(container_line(row.container));
    }
    app.table_state.select(selected_line);

    // Define column widths
    let widths = [
        Constraint::Length(32), // Name
        Constraint::Length(26), // Status
        Constraint::Length(16), // Ports
        Constraint::Min(10),    // Image (takes remaining)
    ];

    let table = Table::new(lines, widths)
        .header(header)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White))
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(table, area, &mut app.table_state);
}

fn project_line(group: &ProjectGroup) -> Row<'static> {
    let running = group.running_count();
    let total = group.containers.len();
    let color = if running == total {
        Color::Green
    } else if running == 0 {
        Color::DarkGray
    } else {
        Color::Yellow
    };

    Row::new(vec![
        Cell::from(format!("▾ {}", group.project)).style(Style::default().fg(Color::Cyan).bold()),
        Cell::from(format!("{}/{} running", running, total)).style(Style::default().fg(color)),
        Cell::from(""),
        Cell::from(""),
    ])
}

fn container_line(container: &ContainerRecord) -> Row<'static> {
    let (symbol, color) = match &container.status {
        ContainerStatus::Running => ("●", Color::Green),
        ContainerStatus::Exited => ("○", Color::DarkGray),
        ContainerStatus::Other(_) => ("◐", Color::Yellow),
    };

    let status = if container.status_text.is_empty() {
        container.status.to_string()
    } else {
        container.status_text.clone()
    };

    Row::new(vec![
        Cell::from(Line::from(vec![
            Span::raw("  "),
            Span::styled(symbol, Style::default().fg(color)),
            Span::raw(" "),
            Span::styled(container.name.clone(), Style::default().bold()),
        ])),
        Cell::from(status).style(Style::default().fg(color)),
        Cell::from(container.ports_display()),
        Cell::from(container.image.clone()).style(Style::default().fg(Color::DarkGray)),
    ])
}

//! Filterable lists of work orders and tickets.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::Line,
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::app::{App, record_label, ticket_label};

pub fn draw_maintenance(f: &mut Frame, area: Rect, app: &App) {
  let rows: Vec<String> = app.filtered_records().into_iter().map(record_label).collect();
  draw_list(f, area, app, "Work orders", rows, app.records.len());
}

pub fn draw_tickets(f: &mut Frame, area: Rect, app: &App) {
  let title = match app.identity() {
    Some(identity) if identity.is_admin() => "Open tickets",
    _ => "My tickets",
  };
  let rows: Vec<String> = app.filtered_tickets().into_iter().map(ticket_label).collect();
  draw_list(f, area, app, title, rows, app.tickets.len());
}

/// Render `rows` with the cursor row highlighted and the filter bar at the
/// bottom while a query is set.
fn draw_list(f: &mut Frame, area: Rect, app: &App, title: &str, rows: Vec<String>, total: usize) {
  let title = if app.filter_active || !app.filter.is_empty() {
    format!(" {title} ({}/{total}) ", rows.len())
  } else {
    format!(" {title} ({total}) ")
  };

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let mut inner = block.inner(area);
  f.render_widget(block, area);

  if (app.filter_active || !app.filter.is_empty()) && inner.height > 2 {
    let filter_area = Rect { y: inner.y + inner.height - 1, height: 1, ..inner };
    inner.height = inner.height.saturating_sub(1);

    let cursor = if app.filter_active { "_" } else { "" };
    f.render_widget(
      Paragraph::new(format!("/{}{cursor}", app.filter)).style(Style::default().fg(Color::Yellow)),
      filter_area,
    );
  }

  let mut state = ListState::default();
  state.select((!rows.is_empty()).then_some(app.cursor));

  let items: Vec<ListItem> = rows.into_iter().map(|r| ListItem::new(Line::from(r))).collect();
  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default().bg(Color::Blue).fg(Color::White).add_modifier(Modifier::BOLD),
    ),
    inner,
    &mut state,
  );
}

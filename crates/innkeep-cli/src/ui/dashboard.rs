//! Dashboard: backend counters on the left, upcoming work on the right.

use innkeep_core::report;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use super::hint;
use crate::app::{App, record_label};

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
    .split(area);

  draw_counters(f, cols[0], app);
  draw_upcoming(f, cols[1], app);
}

fn block(title: &str) -> Block<'_> {
  Block::default()
    .title(format!(" {title} "))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray))
}

fn counter(label: &str, value: String) -> Line<'static> {
  Line::from(vec![
    Span::styled(format!("{label:<22}"), Style::default().fg(Color::Cyan)),
    Span::raw(value),
  ])
}

fn draw_counters(f: &mut Frame, area: Rect, app: &App) {
  let block = block("Overview");
  let inner = block.inner(area);
  f.render_widget(block, area);

  let mut lines = match &app.stats {
    Some(s) => vec![
      counter("Equipment", s.total_equipment.to_string()),
      counter("  operational", s.operational.to_string()),
      counter("  out of service", s.out_of_service.to_string()),
      counter("Scheduled", s.maintenance_scheduled.to_string()),
      counter("Pending", s.maintenance_pending.to_string()),
      counter("Done", s.maintenance_done.to_string()),
      counter("Total cost", format!("${}", s.total_cost.round_dp(2))),
    ],
    None => vec![Line::from(Span::styled(
      "Counters unavailable.",
      Style::default().fg(Color::DarkGray),
    ))],
  };

  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled(
    "By kind",
    Style::default().add_modifier(Modifier::BOLD),
  )));
  for (kind, count) in report::counts_by_kind(&app.records) {
    lines.push(counter(&format!("  {kind}"), count.to_string()));
  }

  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled(
    "By area",
    Style::default().add_modifier(Modifier::BOLD),
  )));
  for (area, count) in report::counts_by_area(&app.records) {
    lines.push(counter(&format!("  {area}"), count.to_string()));
  }
  f.render_widget(Paragraph::new(lines), inner);
}

fn draw_upcoming(f: &mut Frame, area: Rect, app: &App) {
  let block = block("Upcoming work");
  let inner = block.inner(area);
  f.render_widget(block, area);

  let upcoming = app.upcoming();
  if upcoming.is_empty() {
    f.render_widget(hint("Nothing scheduled."), inner);
    return;
  }
  let lines: Vec<Line> = upcoming.into_iter().map(|r| Line::from(record_label(r))).collect();
  f.render_widget(Paragraph::new(lines), inner);
}

//! Today's tickets, fed by the background poller.

use innkeep_core::ticket::{CUTOFF_HOUR, Priority};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use super::hint;
use crate::app::{App, ticket_label};

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(1), Constraint::Min(0)])
    .split(area);

  let snapshot = app.today.as_ref().and_then(|h| h.latest());
  let banner = match &snapshot {
    None => Line::from(Span::styled(" Loading...", Style::default().fg(Color::DarkGray))),
    Some(s) if s.can_complete => Line::from(Span::styled(
      format!(" Refreshed {}  Completion closes at {CUTOFF_HOUR}:00", s.refreshed_at.format("%H:%M")),
      Style::default().fg(Color::DarkGray),
    )),
    Some(s) => Line::from(Span::styled(
      format!(
        " Refreshed {}  Completion closed after {CUTOFF_HOUR}:00",
        s.refreshed_at.format("%H:%M")
      ),
      Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )),
  };
  f.render_widget(Paragraph::new(banner), rows[0]);

  let block = Block::default()
    .title(" For today ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(rows[1]);
  f.render_widget(block, rows[1]);

  let tickets = snapshot.map(|s| s.tickets).unwrap_or_default();
  if tickets.is_empty() {
    f.render_widget(hint("Nothing due today."), inner);
    return;
  }

  let items: Vec<ListItem> = tickets
    .iter()
    .map(|t| {
      let style = match t.priority {
        Priority::Urgent => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        Priority::High => Style::default().fg(Color::Yellow),
        Priority::Medium | Priority::Low => Style::default(),
      };
      ListItem::new(Line::from(Span::styled(ticket_label(t), style)))
    })
    .collect();

  let mut state = ListState::default();
  state.select(Some(app.cursor.min(tickets.len() - 1)));
  f.render_stateful_widget(
    List::new(items).highlight_style(Style::default().bg(Color::Blue).fg(Color::White)),
    inner,
    &mut state,
  );
}

//! TUI rendering: header, the open screen, status bar.

pub mod dashboard;
pub mod login;
pub mod today;
pub mod work_list;

use innkeep_client::Level;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};

use crate::app::{App, Screen};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);
  match app.screen {
    Screen::Login => login::draw(f, rows[1], app),
    Screen::Dashboard => dashboard::draw(f, rows[1], app),
    Screen::Maintenance => work_list::draw_maintenance(f, rows[1], app),
    Screen::Tickets => work_list::draw_tickets(f, rows[1], app),
    Screen::Today => today::draw(f, rows[1], app),
  }
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let date = app.now().format("%Y-%m-%d %H:%M").to_string();

  let mut left = vec![Span::styled(
    format!(" innkeep  {}", app.screen.title()),
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
  )];
  if let Some(identity) = app.identity() {
    left.push(Span::styled(
      format!("  {} ({})", identity.display_name, App::role_label(&identity)),
      Style::default().fg(Color::Gray),
    ));
  }
  if app.editor_on {
    left.push(Span::styled(
      "  EDITOR",
      Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    ));
  }
  let right = Span::styled(format!("{date} "), Style::default().fg(Color::Gray));

  let used: usize = left.iter().map(|s| s.content.chars().count()).sum();
  let pad = (area.width as usize)
    .saturating_sub(used)
    .saturating_sub(right.content.len());
  left.push(Span::raw(" ".repeat(pad)));
  left.push(right);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(Line::from(left)), inner);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (mode_label, hints) = match app.screen {
    Screen::Login => ("LOGIN", "Tab switch field  Enter submit  Esc quit"),
    _ if app.filter_active => ("SEARCH", "Type to filter  Esc cancel  Enter keep"),
    Screen::Dashboard => ("NORMAL", "1-4 screens  r reload  L logout  q quit"),
    Screen::Maintenance => (
      "NORMAL",
      "jk move  / search  s start  f finish  c cancel  o reopen  e editor  q quit",
    ),
    Screen::Today => ("NORMAL", "jk move  s start  d done  r refresh  q quit"),
    Screen::Tickets => ("NORMAL", "jk move  / search  x cancel  r reload  q quit"),
  };

  let (text, color) = match app.notifier.current() {
    Some(notice) => (notice.message, level_color(notice.level)),
    None => (hints.to_string(), Color::DarkGray),
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
  );
  let text_span = Span::styled(format!("  {text}"), Style::default().fg(color));

  f.render_widget(
    Paragraph::new(Line::from(vec![mode_span, text_span])).style(Style::default().bg(Color::Black)),
    area,
  );
}

fn level_color(level: Level) -> Color {
  match level {
    Level::Success => Color::Green,
    Level::Error => Color::Red,
    Level::Warning => Color::Yellow,
    Level::Info => Color::Cyan,
  }
}

/// Greyed one-liner used by panes with nothing to show.
pub(crate) fn hint(text: &str) -> Paragraph<'_> {
  Paragraph::new(text).style(Style::default().fg(Color::DarkGray))
}

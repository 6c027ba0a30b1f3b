//! Login form.

use ratatui::{
  Frame,
  layout::{Constraint, Flex, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use crate::app::{App, LoginField};

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let [row] = Layout::vertical([Constraint::Length(8)]).flex(Flex::Center).areas(area);
  let [form] = Layout::horizontal([Constraint::Length(48)]).flex(Flex::Center).areas(row);

  let block = Block::default()
    .title(" Sign in ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));
  let inner = block.inner(form);
  f.render_widget(block, form);

  let form = &app.login;
  let masked = "*".repeat(form.password.chars().count());
  let mut lines = vec![
    field_line("Username", &form.username, form.focus == LoginField::Username),
    field_line("Password", &masked, form.focus == LoginField::Password),
    Line::from(""),
  ];
  if let Some(path) = &form.return_to {
    lines.push(Line::from(Span::styled(
      format!("Continue to {path}"),
      Style::default().fg(Color::DarkGray),
    )));
  }
  f.render_widget(Paragraph::new(lines), inner);
}

fn field_line<'a>(label: &'a str, value: &str, focused: bool) -> Line<'a> {
  let label_style = if focused {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
  } else {
    Style::default().fg(Color::Cyan)
  };
  let cursor = if focused { "_" } else { "" };
  Line::from(vec![
    Span::styled(format!("{label:<10}"), label_style),
    Span::raw(format!("{value}{cursor}")),
  ])
}

//! Board state machine and key dispatcher.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use innkeep_client::{
  Context, HttpGateway, Notifier, PollHandle, Subscription, TodayPoller,
  workflow::{MaintenanceWorkflow, TicketWorkflow},
};
use innkeep_core::{
  Identity, Role,
  access::{self, Decision, Target},
  clock::Clock,
  gateway::Gateway,
  maintenance::MaintenanceRecord,
  report::{self, Stats},
  ticket::Ticket,
};
use tracing::debug;

/// Rows shown in the dashboard's "upcoming" panel.
const UPCOMING: usize = 5;

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  Login,
  Dashboard,
  Maintenance,
  Today,
  Tickets,
}

impl Screen {
  pub fn target(self) -> Target {
    match self {
      Self::Login => Target::Login,
      Self::Dashboard => Target::Dashboard,
      Self::Maintenance => Target::Maintenance,
      Self::Today => Target::TicketsToday,
      Self::Tickets => Target::Tickets,
    }
  }

  /// The board screen showing `target`; targets without one land on the
  /// dashboard.
  pub fn for_target(target: Target) -> Self {
    match target {
      Target::Login => Self::Login,
      Target::Maintenance => Self::Maintenance,
      Target::TicketsToday => Self::Today,
      Target::Tickets | Target::TicketReport => Self::Tickets,
      _ => Self::Dashboard,
    }
  }

  pub fn title(self) -> &'static str {
    match self {
      Self::Login => "Login",
      Self::Dashboard => "Dashboard",
      Self::Maintenance => "Maintenance",
      Self::Today => "Today",
      Self::Tickets => "Tickets",
    }
  }
}

// ─── Login form ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
  #[default]
  Username,
  Password,
}

#[derive(Debug, Default)]
pub struct LoginForm {
  pub username:  String,
  pub password:  String,
  pub focus:     LoginField,
  /// Path the user was heading to when the session was missing.
  pub return_to: Option<String>,
}

impl LoginForm {
  fn field(&mut self) -> &mut String {
    match self.focus {
      LoginField::Username => &mut self.username,
      LoginField::Password => &mut self.password,
    }
  }

  fn toggle_focus(&mut self) {
    self.focus = match self.focus {
      LoginField::Username => LoginField::Password,
      LoginField::Password => LoginField::Username,
    };
  }
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level board state.
pub struct App {
  pub screen: Screen,

  pub login: LoginForm,

  /// Backend counters for the dashboard, when they loaded.
  pub stats: Option<Stats>,

  /// Work orders visible to the current user.
  pub records: Vec<MaintenanceRecord>,

  /// Tickets for the Tickets screen.
  pub tickets: Vec<Ticket>,

  /// Running only while the Today screen is open.
  pub today: Option<PollHandle>,

  /// Current fuzzy-filter string.
  pub filter: String,

  /// Whether the user is typing a filter query.
  pub filter_active: bool,

  /// Cursor position within the *filtered* list.
  pub cursor: usize,

  /// Whether the current admin holds an editor grant.
  pub editor_on: bool,

  pub notifier: Notifier,

  cx:          Context<HttpGateway>,
  /// Held for the life of the board; every identity read goes through it.
  session:     Subscription,
  clock:       Arc<dyn Clock>,
  maintenance: MaintenanceWorkflow<HttpGateway>,
  ticket_flow: TicketWorkflow<HttpGateway>,
  refresh:     std::time::Duration,
}

impl App {
  pub fn new(
    cx: Context<HttpGateway>,
    clock: Arc<dyn Clock>,
    notifier: Notifier,
    refresh: std::time::Duration,
  ) -> Self {
    Self {
      screen: Screen::Login,
      login: LoginForm::default(),
      stats: None,
      records: Vec::new(),
      tickets: Vec::new(),
      today: None,
      filter: String::new(),
      filter_active: false,
      cursor: 0,
      editor_on: false,
      notifier,
      maintenance: MaintenanceWorkflow::new(cx.clone()),
      ticket_flow: TicketWorkflow::new(cx.clone()),
      session: cx.session().subscribe(),
      cx,
      clock,
      refresh,
    }
  }

  pub fn identity(&self) -> Option<Identity> { self.session.current() }

  pub fn now(&self) -> chrono::DateTime<chrono::FixedOffset> { self.clock.now() }

  // ── Navigation ────────────────────────────────────────────────────────────

  /// Open `screen` if the access policy allows it, otherwise follow the
  /// redirect. Nothing is fetched for a denied screen.
  pub async fn navigate(&mut self, screen: Screen) {
    let identity = self.identity();
    match access::guard(identity.as_ref(), screen.target()) {
      Decision::Allow => self.enter(screen).await,
      Decision::RedirectToLogin { return_to } => self.show_login(Some(return_to)),
      Decision::RedirectToDashboard => {
        self.notifier.warning(format!("{} is not available to your role", screen.title()));
        self.enter(Screen::Dashboard).await;
      }
    }
  }

  /// React to identity changes published by the session since the last
  /// call, wherever they came from.
  pub async fn follow_session(&mut self) {
    if let Some(identity) = self.session.take_change() {
      debug!(username = ?identity.as_ref().map(|i| &i.username), "identity changed");
      self.recheck().await;
    }
  }

  /// Re-run the policy for the open screen against the latest identity.
  async fn recheck(&mut self) {
    let identity = self.identity();
    if !access::guard(identity.as_ref(), self.screen.target()).is_allowed() {
      self.navigate(self.screen).await;
    }
  }

  fn show_login(&mut self, return_to: Option<String>) {
    self.leave();
    self.login = LoginForm { return_to, ..Default::default() };
    self.screen = Screen::Login;
  }

  /// Tear down whatever the current screen owns.
  fn leave(&mut self) {
    if self.today.take().is_some() {
      debug!("today poller released");
    }
    self.filter.clear();
    self.filter_active = false;
    self.cursor = 0;
  }

  async fn enter(&mut self, screen: Screen) {
    self.leave();
    self.screen = screen;
    self.reload().await;
  }

  /// Fetch the data for the current screen.
  pub async fn reload(&mut self) {
    let Some(identity) = self.identity() else {
      return;
    };
    self.editor_on = identity.is_admin()
      && matches!(self.cx.grant_for(&identity), Ok(Some(_)));

    let loaded = match self.screen {
      Screen::Login => Ok(()),
      Screen::Dashboard => self.load_dashboard().await,
      Screen::Maintenance => self.maintenance.list_visible().await.map(|r| self.records = r),
      Screen::Tickets if identity.is_admin() => {
        self.ticket_flow.incomplete().await.map(|t| self.tickets = t)
      }
      Screen::Tickets => self.ticket_flow.created_by_me().await.map(|t| self.tickets = t),
      Screen::Today => {
        match &self.today {
          Some(handle) => handle.refresh(),
          None => {
            let gateway = self.cx.session().gateway().clone();
            let session = self.cx.session().subscribe();
            self.today = Some(TodayPoller::spawn(gateway, session, self.clock.clone(), self.refresh));
          }
        }
        Ok(())
      }
    };
    if let Err(e) = loaded {
      self.notifier.report(&e);
    }
  }

  async fn load_dashboard(&mut self) -> innkeep_client::Result<()> {
    self.records = self.maintenance.list_visible().await?;
    // Counters are a nicety; the dashboard still works without them.
    self.stats = self.cx.gateway().stats().await.ok();
    Ok(())
  }

  pub fn upcoming(&self) -> Vec<&MaintenanceRecord> { report::upcoming(&self.records, UPCOMING) }

  // ── Filtered lists ────────────────────────────────────────────────────────

  pub fn filtered_records(&self) -> Vec<&MaintenanceRecord> {
    fuzzy_filter(&self.records, &self.filter, record_label)
  }

  pub fn filtered_tickets(&self) -> Vec<&Ticket> {
    fuzzy_filter(&self.tickets, &self.filter, ticket_label)
  }

  pub fn today_tickets(&self) -> Vec<Ticket> {
    self.today.as_ref().and_then(PollHandle::latest).map(|s| s.tickets).unwrap_or_default()
  }

  fn list_len(&self) -> usize {
    match self.screen {
      Screen::Maintenance => self.filtered_records().len(),
      Screen::Tickets => self.filtered_tickets().len(),
      Screen::Today => self.today_tickets().len(),
      Screen::Login | Screen::Dashboard => 0,
    }
  }

  fn cursor_record_id(&self) -> Option<i64> {
    self.filtered_records().get(self.cursor).map(|r| r.id)
  }

  fn cursor_ticket_id(&self) -> Option<i64> {
    match self.screen {
      Screen::Today => self.today_tickets().get(self.cursor).map(|t| t.id),
      _ => self.filtered_tickets().get(self.cursor).map(|t| t.id),
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }
    if self.screen == Screen::Login {
      return Ok(self.handle_login_key(key).await);
    }
    if self.filter_active {
      self.handle_filter_key(key);
      return Ok(true);
    }

    match key.code {
      KeyCode::Char('q') => return Ok(false),

      KeyCode::Char('1') => self.navigate(Screen::Dashboard).await,
      KeyCode::Char('2') => self.navigate(Screen::Maintenance).await,
      KeyCode::Char('3') => self.navigate(Screen::Today).await,
      KeyCode::Char('4') => self.navigate(Screen::Tickets).await,
      KeyCode::Char('r') => self.reload().await,
      KeyCode::Char('L') => self.logout(),

      KeyCode::Down | KeyCode::Char('j') => {
        if self.cursor + 1 < self.list_len() {
          self.cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => self.cursor = self.cursor.saturating_sub(1),
      KeyCode::Char('/') if matches!(self.screen, Screen::Maintenance | Screen::Tickets) => {
        self.filter_active = true;
        self.filter.clear();
        self.cursor = 0;
      }

      KeyCode::Char(c) => self.handle_action(c).await,
      _ => {}
    }
    Ok(true)
  }

  async fn handle_login_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Esc => return false,
      KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => self.login.toggle_focus(),
      KeyCode::Backspace => {
        self.login.field().pop();
      }
      KeyCode::Enter if self.login.focus == LoginField::Username => self.login.toggle_focus(),
      KeyCode::Enter => self.submit_login().await,
      KeyCode::Char(c) => self.login.field().push(c),
      _ => {}
    }
    true
  }

  async fn submit_login(&mut self) {
    let (username, password) = (self.login.username.clone(), self.login.password.clone());
    match self.cx.session().login(&username, &password).await {
      Ok(identity) => {
        let landing = access::landing_after_login(&identity, self.login.return_to.as_deref());
        self.notifier.success(format!("Welcome, {}", identity.display_name));
        self.login = LoginForm::default();
        self.navigate(Screen::for_target(landing)).await;
      }
      Err(e) => {
        self.login.password.clear();
        self.notifier.report(&e);
      }
    }
  }

  fn logout(&mut self) {
    let path = self.screen.target().path().to_owned();
    if let Err(e) = self.cx.session().logout() {
      self.notifier.report(&e);
    }
    self.records.clear();
    self.tickets.clear();
    self.stats = None;
    self.show_login(Some(path));
  }

  fn handle_filter_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
      }
      KeyCode::Enter => self.filter_active = false,
      KeyCode::Backspace => {
        self.filter.pop();
      }
      KeyCode::Char(c) => self.filter.push(c),
      _ => return,
    }
    self.cursor = 0;
  }

  /// Single-letter actions on the row under the cursor.
  async fn handle_action(&mut self, c: char) {
    let result = match (self.screen, c) {
      (Screen::Maintenance, 's') => self.on_record(RecordAction::Start).await,
      (Screen::Maintenance, 'f') => self.on_record(RecordAction::Finish).await,
      (Screen::Maintenance, 'c') => self.on_record(RecordAction::Cancel).await,
      (Screen::Maintenance, 'o') => self.on_record(RecordAction::Reopen).await,
      (Screen::Maintenance, 'e') => self.toggle_editor().await,
      (Screen::Today, 's') => self.on_ticket(TicketAction::Start).await,
      (Screen::Today, 'd') => self.on_ticket(TicketAction::Complete).await,
      (Screen::Tickets, 'x') => self.on_ticket(TicketAction::Cancel).await,
      _ => return,
    };
    match result {
      Ok(Some(message)) => {
        self.notifier.success(message);
        self.reload().await;
      }
      Ok(None) => {}
      Err(e) => {
        self.notifier.report(&e);
      }
    }
  }

  async fn on_record(&self, action: RecordAction) -> innkeep_client::Result<Option<String>> {
    let Some(id) = self.cursor_record_id() else {
      return Ok(None);
    };
    let (record, verb) = match action {
      RecordAction::Start => (self.maintenance.start(id).await?, "started"),
      RecordAction::Finish => (self.maintenance.finish(id).await?, "finished"),
      RecordAction::Cancel => (self.maintenance.cancel(id).await?, "cancelled"),
      RecordAction::Reopen => (self.maintenance.reopen(id).await?, "reopened"),
    };
    Ok(Some(format!("Work order #{} {verb} ({})", record.id, record.status)))
  }

  async fn on_ticket(&self, action: TicketAction) -> innkeep_client::Result<Option<String>> {
    let Some(id) = self.cursor_ticket_id() else {
      return Ok(None);
    };
    let ticket = match action {
      TicketAction::Start => self.ticket_flow.start(id).await?,
      TicketAction::Complete => self.ticket_flow.complete(id).await?,
      TicketAction::Cancel => self.ticket_flow.cancel(id).await?,
    };
    Ok(Some(format!("Ticket #{} is now {}", ticket.id, ticket.status)))
  }

  async fn toggle_editor(&mut self) -> innkeep_client::Result<Option<String>> {
    let actor = self.cx.actor()?;
    if self.editor_on {
      self.cx.editor().deactivate()?;
      Ok(Some("Editor mode off".into()))
    } else {
      self.cx.editor().activate(&actor).await?;
      Ok(Some("Editor mode on".into()))
    }
  }

  /// English role name for the header.
  pub fn role_label(identity: &Identity) -> &'static str {
    match identity.role {
      Role::Admin => "admin",
      Role::Maintenance => "maintenance",
      Role::Housekeeping => "housekeeping",
    }
  }
}

#[derive(Debug, Clone, Copy)]
enum RecordAction {
  Start,
  Finish,
  Cancel,
  Reopen,
}

#[derive(Debug, Clone, Copy)]
enum TicketAction {
  Start,
  Complete,
  Cancel,
}

// ─── Row labels and filtering ─────────────────────────────────────────────────

pub fn record_label(r: &MaintenanceRecord) -> String {
  let place = r.serial_number.as_deref().or(r.area_name.as_deref()).unwrap_or_default();
  format!(
    "#{:<4} {}  {:<11} {:<11} {:<12} {place}",
    r.id,
    r.scheduled_for.format("%Y-%m-%d"),
    r.kind.to_string(),
    r.status.to_string(),
    r.assignee,
  )
}

pub fn ticket_label(t: &Ticket) -> String {
  let room = t.room.as_deref().map(|r| format!(" hab. {r}")).unwrap_or_default();
  format!(
    "#{:<4} {:<8} {:<10} {} piso {}{room}  {}",
    t.id,
    t.priority.to_string(),
    t.status.to_string(),
    t.area,
    t.floor,
    t.description,
  )
}

/// Items whose label fuzzy-matches `query`; everything when it is empty.
pub fn fuzzy_filter<'a, T>(items: &'a [T], query: &str, label: impl Fn(&T) -> String) -> Vec<&'a T> {
  if query.is_empty() {
    return items.iter().collect();
  }
  let matcher = SkimMatcherV2::default();
  items.iter().filter(|item| matcher.fuzzy_match(&label(*item), query).is_some()).collect()
}

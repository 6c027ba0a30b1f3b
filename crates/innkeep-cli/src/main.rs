//! `innkeep`: terminal client for the hotel maintenance backend.
//!
//! # Usage
//!
//! ```
//! innkeep login mlopez                     # prompts for the password
//! innkeep                                  # opens the board
//! innkeep tickets today
//! innkeep --url http://hotel.local:3000 report --period week --week 2
//! ```

mod app;
mod commands;
mod config;
mod ui;

use std::{
  fs::OpenOptions,
  io,
  sync::{Arc, Mutex},
  time::Duration,
};

use anyhow::{Context as _, Result};
use app::{App, Screen};
use clap::{Parser, Subcommand};
use commands::{CatalogCmd, Commands, EditorCmd, MaintenanceCmd, ReportArgs, ScheduleCmd, TicketCmd};
use config::{ConfigFile, GlobalArgs, Settings};
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use innkeep_client::{Context, EditorMode, FileStorage, HttpGateway, Notifier, SessionStore};
use innkeep_core::clock::{Clock, SystemClock};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "innkeep", version, about = "Terminal client for hotel maintenance")]
struct Args {
  #[command(flatten)]
  global: GlobalArgs,

  /// Defaults to `board`.
  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Full-screen board.
  Board,
  Login {
    username: String,
    /// Read from stdin when omitted.
    #[arg(long, env = "INNKEEP_PASSWORD", hide_env_values = true)]
    password: Option<String>,
  },
  Logout,
  Whoami,
  /// Ask the backend whether the saved session is still good.
  Verify,
  #[command(subcommand)]
  Editor(EditorCmd),
  #[command(subcommand, alias = "mant")]
  Maintenance(MaintenanceCmd),
  #[command(subcommand)]
  Tickets(TicketCmd),
  #[command(subcommand)]
  Schedule(ScheduleCmd),
  #[command(subcommand)]
  Catalog(CatalogCmd),
  Report(ReportArgs),
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let file = ConfigFile::load(args.global.config.as_deref())?;
  let settings = Settings::resolve(&args.global, file);
  let command = args.command.unwrap_or(Command::Board);

  init_tracing(&settings, matches!(command, Command::Board))?;

  let clock: Arc<dyn Clock> = Arc::new(SystemClock);
  let cx = connect(&settings, clock.clone())?;
  let commands = Commands::new(cx.clone());

  match command {
    Command::Board => run_board(cx, clock, &settings).await,
    Command::Login { username, password } => {
      let password = match password {
        Some(p) => p,
        None => read_password()?,
      };
      commands.login(&username, &password).await
    }
    Command::Logout => commands.logout(),
    Command::Whoami => {
      commands.whoami();
      Ok(())
    }
    Command::Verify => commands.verify().await,
    Command::Editor(cmd) => commands.editor(cmd).await,
    Command::Maintenance(cmd) => commands.maintenance(cmd).await,
    Command::Tickets(cmd) => commands.tickets(cmd).await,
    Command::Schedule(cmd) => commands.schedule(cmd).await,
    Command::Catalog(cmd) => commands.catalog(cmd).await,
    Command::Report(report) => commands.report(report).await,
  }
}

/// The board owns the terminal, so its log goes to a file in the state
/// directory; one-shot commands log to stderr.
fn init_tracing(settings: &Settings, board: bool) -> Result<()> {
  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy();

  if board {
    std::fs::create_dir_all(&settings.state_dir)
      .with_context(|| format!("creating {}", settings.state_dir.display()))?;
    let path = settings.state_dir.join("innkeep.log");
    let file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(&path)
      .with_context(|| format!("opening log file {}", path.display()))?;
    tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_ansi(false)
      .with_writer(Mutex::new(file))
      .init();
  } else {
    tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_writer(io::stderr)
      .init();
  }
  Ok(())
}

fn connect(settings: &Settings, clock: Arc<dyn Clock>) -> Result<Context<HttpGateway>> {
  let gateway = Arc::new(HttpGateway::new(&settings.http)?);
  let storage = Arc::new(FileStorage::open(&settings.state_dir)?);
  let session = Arc::new(SessionStore::open(gateway.clone(), storage.clone())?);
  let editor = Arc::new(EditorMode::new(gateway, storage));
  info!(url = %settings.http.base_url, state_dir = %settings.state_dir.display(), "client ready");
  Ok(Context::new(session, editor, clock))
}

fn read_password() -> Result<String> {
  use std::io::{BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches('\n').trim_end_matches('\r').to_string())
}

// ─── Board ────────────────────────────────────────────────────────────────────

async fn run_board(cx: Context<HttpGateway>, clock: Arc<dyn Clock>, settings: &Settings) -> Result<()> {
  // A saved session may have expired since the last run.
  let verified = match cx.session().current() {
    Some(_) => Some(cx.session().verify_session().await),
    None => None,
  };
  let mut app = App::new(cx, clock, Notifier::new(settings.notice), settings.refresh);
  match verified {
    Some(Ok(false)) => {
      app.notifier.warning("Session expired, please log in again");
    }
    Some(Err(e)) => {
      app.notifier.report(&e);
    }
    Some(Ok(true)) | None => {}
  }
  app.navigate(Screen::Dashboard).await;

  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let run_result = run_event_loop(&mut terminal, &mut app).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event {
      if !app.handle_key(key).await? {
        break;
      }
    }
    app.follow_session().await;
  }
  Ok(())
}

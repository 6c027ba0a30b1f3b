//! One-shot subcommands. Each checks the access policy for the view it
//! stands in for, runs a workflow, and prints plain text.

use std::fmt::{Debug, Display};

use anyhow::{Result, bail};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use clap::{Subcommand, ValueEnum};
use innkeep_client::{
  Context, HttpGateway,
  workflow::{CatalogWorkflow, MaintenanceWorkflow, ScheduleWorkflow, TicketWorkflow},
};
use innkeep_core::{
  Identity,
  access::{self, Decision, Target},
  catalog::AreaDraft,
  gateway::Gateway,
  maintenance::{MaintenanceKind, MaintenanceStatus, SparePartDraft},
  report::{self, DatePreset, DateRange, ReportFilter, ReportSummary},
  schedule::{self, ScheduleDraft, WeekEmployee, WeekPlan},
  ticket::{Priority, TicketDraft},
};
use rust_decimal::Decimal;
use strum::IntoEnumIterator;

use crate::app::{record_label, ticket_label};

// ─── Subcommand trees ─────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum EditorCmd {
  /// Request an editor grant from the backend.
  On,
  /// Drop the stored grant.
  Off,
}

#[derive(Subcommand, Debug)]
pub enum MaintenanceCmd {
  /// Work orders visible to you.
  List {
    #[arg(long, value_parser = parse_choice::<MaintenanceStatus>)]
    status: Option<MaintenanceStatus>,
  },
  /// Work orders scheduled on a day, or across a month.
  Calendar {
    #[arg(long, value_parser = parse_date, conflicts_with_all = ["month", "year"])]
    day:   Option<NaiveDate>,
    /// Defaults to the current month.
    #[arg(long)]
    month: Option<u32>,
    #[arg(long)]
    year:  Option<i32>,
  },
  Start { id: i64 },
  Finish { id: i64 },
  Cancel { id: i64 },
  /// Put a finished or cancelled order back to scheduled (editor mode).
  Reopen { id: i64 },
  /// Replace the observations of a work order.
  Note { id: i64, text: String },
  /// Spare parts used on a work order, with the total.
  Parts { id: i64 },
  AddPart {
    id:        i64,
    #[arg(long)]
    name:      String,
    #[arg(long, default_value_t = 1)]
    quantity:  i32,
    #[arg(long)]
    unit_cost: Decimal,
    #[arg(long)]
    supplier:  Option<String>,
  },
  RemovePart { id: i64, part_id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum TicketCmd {
  /// Tickets you opened.
  Mine,
  /// Tickets assigned to you for today.
  Today,
  /// Every pending or in-progress ticket.
  Incomplete,
  Create {
    #[arg(long)]
    area:        String,
    #[arg(long)]
    floor:       String,
    #[arg(long)]
    room:        Option<String>,
    #[arg(long)]
    description: String,
    #[arg(long, value_parser = parse_choice::<Priority>)]
    priority:    Option<Priority>,
    #[arg(long)]
    assignee:    Option<String>,
    /// RFC 3339 deadline, e.g. 2025-06-02T18:00:00-06:00.
    #[arg(long, value_parser = parse_timestamp)]
    due:         Option<DateTime<Utc>>,
  },
  Start { id: i64 },
  Complete { id: i64 },
  Cancel { id: i64 },
  Note { id: i64, text: String },
}

#[derive(Subcommand, Debug)]
pub enum ScheduleCmd {
  List {
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
  },
  Add {
    #[arg(long)]
    user:   String,
    #[arg(long, value_parser = parse_date)]
    date:   NaiveDate,
    /// Mark the employee as off duty.
    #[arg(long)]
    off:    bool,
    #[arg(long)]
    reason: Option<String>,
  },
  /// The same entry for several employees over seven days.
  Week {
    #[arg(long, value_parser = parse_date)]
    start:  NaiveDate,
    #[arg(long, value_delimiter = ',', required = true)]
    users:  Vec<String>,
    #[arg(long)]
    off:    bool,
    #[arg(long)]
    reason: Option<String>,
  },
  Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum CatalogCmd {
  Areas,
  AddArea {
    name:        String,
    #[arg(long)]
    description: Option<String>,
  },
  DeleteArea { id: i64 },
  Types,
  Equipment,
  Suppliers,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
  Today,
  Week,
  #[default]
  Month,
  Year,
  Custom,
  All,
}

#[derive(clap::Args, Debug, Default)]
pub struct ReportArgs {
  #[arg(long, value_enum, default_value_t)]
  pub period:    Period,
  /// Month for `week` and `month`; defaults to the current one.
  #[arg(long)]
  pub month:     Option<u32>,
  #[arg(long)]
  pub week:      Option<u32>,
  #[arg(long, value_parser = parse_date)]
  pub from:      Option<NaiveDate>,
  #[arg(long, value_parser = parse_date)]
  pub to:        Option<NaiveDate>,
  #[arg(long)]
  pub area:      Option<i64>,
  #[arg(long = "type")]
  pub type_id:   Option<i64>,
  #[arg(long, value_parser = parse_choice::<MaintenanceStatus>)]
  pub status:    Option<MaintenanceStatus>,
  #[arg(long, value_parser = parse_choice::<MaintenanceKind>)]
  pub kind:      Option<MaintenanceKind>,
  /// Also print spending per supplier for the period.
  #[arg(long)]
  pub suppliers: bool,
}

impl ReportArgs {
  fn preset(&self, today: NaiveDate) -> Result<Option<DatePreset>> {
    let month = self.month.unwrap_or_else(|| today.month());
    Ok(Some(match self.period {
      Period::All => return Ok(None),
      Period::Today => DatePreset::Today,
      Period::Week => {
        let Some(week) = self.week else {
          bail!("--week is required with --period week");
        };
        DatePreset::Week { month, week }
      }
      Period::Month => DatePreset::Month(month),
      Period::Year => DatePreset::Year,
      Period::Custom => {
        let (Some(from), Some(to)) = (self.from, self.to) else {
          bail!("--from and --to are required with --period custom");
        };
        DatePreset::Custom(DateRange { from, to })
      }
    }))
  }

  fn filter(&self, today: NaiveDate) -> Result<ReportFilter> {
    let range = self.preset(today)?.map(|p| p.resolve(today)).transpose()?;
    Ok(ReportFilter {
      range,
      area_id: self.area,
      type_id: self.type_id,
      status: self.status,
      kind: self.kind,
    })
  }
}

// ─── Value parsers ────────────────────────────────────────────────────────────

fn normalise(s: &str) -> String {
  s.chars().filter(|c| c.is_alphanumeric()).flat_map(char::to_lowercase).collect()
}

/// Accept either the backend's label ("Alta", "En Proceso") or the English
/// variant name ("high", "in-progress"), ignoring case and separators.
pub fn parse_choice<T>(raw: &str) -> Result<T, String>
where
  T: IntoEnumIterator + Display + Debug,
{
  let wanted = normalise(raw);
  T::iter()
    .find(|v| normalise(&v.to_string()) == wanted || normalise(&format!("{v:?}")) == wanted)
    .ok_or_else(|| {
      let choices: Vec<String> = T::iter().map(|v| v.to_string()).collect();
      format!("expected one of: {}", choices.join(", "))
    })
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
  NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| format!("{e} (expected YYYY-MM-DD)"))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
  DateTime::parse_from_rfc3339(raw.trim()).map(|t| t.to_utc()).map_err(|e| e.to_string())
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

pub struct Commands {
  cx: Context<HttpGateway>,
}

impl Commands {
  pub fn new(cx: Context<HttpGateway>) -> Self { Self { cx } }

  /// Apply the access policy for `target` to the saved session.
  fn guard(&self, target: Target) -> Result<Identity> {
    let identity = self.cx.session().current();
    match access::guard(identity.as_ref(), target) {
      Decision::Allow => match identity {
        Some(identity) => Ok(identity),
        None => bail!("not logged in; run `innkeep login <username>` first"),
      },
      Decision::RedirectToLogin { return_to } => {
        bail!("not logged in; run `innkeep login <username>` first (wanted {return_to})")
      }
      Decision::RedirectToDashboard => {
        bail!("{} is not available to your role", target.path())
      }
    }
  }

  // ── Session ───────────────────────────────────────────────────────────────

  pub async fn login(&self, username: &str, password: &str) -> Result<()> {
    let identity = self.cx.session().login(username, password).await?;
    let landing = access::landing_after_login(&identity, None);
    println!(
      "Logged in as {} ({}). Start at {}.",
      identity.display_name,
      identity.role,
      landing.path()
    );
    Ok(())
  }

  pub fn logout(&self) -> Result<()> {
    self.cx.session().logout()?;
    println!("Logged out.");
    Ok(())
  }

  pub fn whoami(&self) {
    match self.cx.session().current() {
      Some(identity) => {
        let area = identity.area.as_deref().map(|a| format!(", area {a}")).unwrap_or_default();
        println!("{} <{}> ({}{area})", identity.display_name, identity.username, identity.role);
      }
      None => println!("Not logged in."),
    }
  }

  pub async fn verify(&self) -> Result<()> {
    if self.cx.session().verify_session().await? {
      println!("Session is valid.");
    } else {
      println!("Session expired; log in again.");
    }
    Ok(())
  }

  pub async fn editor(&self, cmd: EditorCmd) -> Result<()> {
    let actor = self.guard(Target::Dashboard)?;
    match cmd {
      EditorCmd::On => {
        let grant = self.cx.editor().activate(&actor).await?;
        match grant.expires_at {
          Some(at) => println!("Editor mode on until {}.", at.with_timezone(&self.cx.clock().now().timezone())),
          None => println!("Editor mode on."),
        }
      }
      EditorCmd::Off => {
        self.cx.editor().deactivate()?;
        println!("Editor mode off.");
      }
    }
    Ok(())
  }

  // ── Maintenance ───────────────────────────────────────────────────────────

  pub async fn maintenance(&self, cmd: MaintenanceCmd) -> Result<()> {
    let target = match cmd {
      MaintenanceCmd::Calendar { .. } => Target::Calendar,
      _ => Target::Maintenance,
    };
    self.guard(target)?;
    let wf = MaintenanceWorkflow::new(self.cx.clone());
    let changed = match cmd {
      MaintenanceCmd::List { status } => {
        let records = wf.list_visible().await?;
        let mut shown = 0;
        for r in records.iter().filter(|r| status.is_none_or(|s| r.status == s)) {
          println!("{}", record_label(r));
          shown += 1;
        }
        println!("{shown} work order(s)");
        return Ok(());
      }
      MaintenanceCmd::Calendar { day, month, year } => {
        let records = wf.list_visible().await?;
        let today = self.cx.clock().now().date_naive();
        let rows = match day {
          Some(day) => report::on_day(&records, day),
          None => report::in_month(
            &records,
            year.unwrap_or_else(|| today.year()),
            month.unwrap_or_else(|| today.month()),
          ),
        };
        for r in &rows {
          println!("{}", record_label(r));
        }
        println!("{} work order(s)", rows.len());
        return Ok(());
      }
      MaintenanceCmd::Start { id } => wf.start(id).await?,
      MaintenanceCmd::Finish { id } => wf.finish(id).await?,
      MaintenanceCmd::Cancel { id } => wf.cancel(id).await?,
      MaintenanceCmd::Reopen { id } => wf.reopen(id).await?,
      MaintenanceCmd::Note { id, text } => {
        let current = wf.get(id).await?;
        wf.update_observations(id, current.description, Some(text)).await?
      }
      MaintenanceCmd::Parts { id } => {
        let parts = wf.spare_parts(id).await?;
        for p in &parts {
          let supplier = p.supplier.as_deref().unwrap_or("-");
          println!("#{:<4} {:<24} x{:<3} {:>10}  {supplier}", p.id, p.name, p.quantity, p.subtotal().to_string());
        }
        println!("Total: {}", innkeep_core::maintenance::total_cost(&parts));
        return Ok(());
      }
      MaintenanceCmd::AddPart { id, name, quantity, unit_cost, supplier } => {
        wf.add_spare_part(SparePartDraft { maintenance_id: id, name, quantity, unit_cost, supplier })
          .await?;
        println!("Recorded. Parts total is now {}.", wf.total_cost(id).await?);
        return Ok(());
      }
      MaintenanceCmd::RemovePart { id, part_id } => {
        wf.remove_spare_part(id, part_id).await?;
        println!("Removed. Parts total is now {}.", wf.total_cost(id).await?);
        return Ok(());
      }
    };
    println!("{}", record_label(&changed));
    Ok(())
  }

  // ── Tickets ───────────────────────────────────────────────────────────────

  pub async fn tickets(&self, cmd: TicketCmd) -> Result<()> {
    let target = match &cmd {
      TicketCmd::Mine | TicketCmd::Create { .. } | TicketCmd::Cancel { .. } => Target::Tickets,
      TicketCmd::Incomplete => Target::TicketReport,
      TicketCmd::Today
      | TicketCmd::Start { .. }
      | TicketCmd::Complete { .. }
      | TicketCmd::Note { .. } => Target::TicketsToday,
    };
    self.guard(target)?;
    let wf = TicketWorkflow::new(self.cx.clone());

    let changed = match cmd {
      TicketCmd::Mine => return print_tickets(&wf.created_by_me().await?),
      TicketCmd::Today => return print_tickets(&wf.today().await?),
      TicketCmd::Incomplete => return print_tickets(&wf.incomplete().await?),
      TicketCmd::Create { area, floor, room, description, priority, assignee, due } => {
        let draft = TicketDraft {
          area,
          floor,
          room,
          description,
          priority: priority.unwrap_or_default(),
          assignee,
          due_at: due,
        };
        let new = wf.create(&draft).await?;
        println!("Ticket opened for {} piso {} ({}).", new.area, new.floor, new.priority);
        return Ok(());
      }
      TicketCmd::Start { id } => wf.start(id).await?,
      TicketCmd::Complete { id } => wf.complete(id).await?,
      TicketCmd::Cancel { id } => wf.cancel(id).await?,
      TicketCmd::Note { id, text } => wf.save_notes(id, &text).await?,
    };
    println!("{}", ticket_label(&changed));
    Ok(())
  }

  // ── Schedules ─────────────────────────────────────────────────────────────

  pub async fn schedule(&self, cmd: ScheduleCmd) -> Result<()> {
    self.guard(Target::Schedules)?;
    let wf = ScheduleWorkflow::new(self.cx.clone());
    match cmd {
      ScheduleCmd::List { date } => {
        let all = match date {
          Some(date) => wf.on_date(date).await?,
          None => wf.list().await?,
        };
        let mut dates: Vec<NaiveDate> = all.iter().map(|s| s.date).collect();
        dates.sort();
        dates.dedup();
        for date in dates {
          println!("{date}");
          for s in schedule::on_date(&all, date) {
            let state = if s.available { "on duty" } else { "off" };
            let reason = s.reason.as_deref().map(|r| format!(" ({r})")).unwrap_or_default();
            println!("  [{}] {:<16} {state}{reason}", s.id, s.username);
          }
        }
      }
      ScheduleCmd::Add { user, date, off, reason } => {
        wf.create(ScheduleDraft { username: user, date: Some(date), available: !off, reason })
          .await?;
        println!("Saved.");
      }
      ScheduleCmd::Week { start, users, off, reason } => {
        let plan = WeekPlan {
          start,
          employees: users
            .into_iter()
            .map(|username| WeekEmployee { username, available: !off, reason: reason.clone() })
            .collect(),
        };
        let outcome = wf.create_week(&plan).await?;
        println!("Created {} of {} entries.", outcome.created, outcome.attempted());
        for failure in &outcome.failed {
          println!("  {} {}: {}", failure.date, failure.username, failure.reason);
        }
        if !outcome.is_complete() {
          bail!("{} entries were not created", outcome.failed.len());
        }
      }
      ScheduleCmd::Delete { id } => {
        wf.delete(&id).await?;
        println!("Deleted.");
      }
    }
    Ok(())
  }

  // ── Catalog ───────────────────────────────────────────────────────────────

  pub async fn catalog(&self, cmd: CatalogCmd) -> Result<()> {
    let target = match cmd {
      CatalogCmd::Equipment => Target::Equipment,
      CatalogCmd::Suppliers => Target::Reports,
      _ => Target::Settings,
    };
    self.guard(target)?;
    let wf = CatalogWorkflow::new(self.cx.clone());
    match cmd {
      CatalogCmd::Areas => {
        for a in wf.areas().await? {
          println!("#{:<4} {}", a.id, a.name);
        }
      }
      CatalogCmd::AddArea { name, description } => {
        wf.save_area(None, AreaDraft { name, description }).await?;
        println!("Saved.");
      }
      CatalogCmd::DeleteArea { id } => {
        wf.delete_area(id).await?;
        println!("Deleted.");
      }
      CatalogCmd::Types => {
        for t in wf.types().await? {
          println!("#{:<4} {}", t.id, t.name);
        }
      }
      CatalogCmd::Equipment => {
        for e in wf.equipment().await? {
          let area = e.area_name.as_deref().unwrap_or("-");
          let kind = e.type_name.as_deref().unwrap_or("-");
          println!(
            "#{:<4} {:<24} {:<18} {:<16} {area}",
            e.id,
            e.display_name(),
            e.status.to_string(),
            kind
          );
        }
      }
      CatalogCmd::Suppliers => {
        for supplier in self.cx.gateway().list_suppliers().await? {
          println!("{supplier}");
        }
      }
    }
    Ok(())
  }

  // ── Report ────────────────────────────────────────────────────────────────

  pub async fn report(&self, args: ReportArgs) -> Result<()> {
    self.guard(Target::Reports)?;
    let today = self.cx.clock().now().date_naive();
    let filter = args.filter(today)?;

    let gateway = self.cx.gateway();
    let (records, equipment) = tokio::try_join!(gateway.list_maintenance(), gateway.list_equipment())?;
    let rows = filter.apply(&records, &equipment);

    if let Some(range) = filter.range {
      println!("{} to {}", range.from, range.to);
    }
    for r in &rows {
      println!("{}", record_label(r));
    }
    let summary = ReportSummary::of(rows.iter().copied());
    println!(
      "{} total, {} completed, {} in progress, {} cancelled, cost {}",
      summary.total, summary.completed, summary.in_progress, summary.cancelled, summary.total_cost,
    );
    if let Some(hours) = summary.mean_duration_hours {
      println!("Mean duration {hours:.1} h");
    }

    if args.suppliers {
      for row in gateway.supplier_spending(filter.range).await? {
        println!("{row}");
      }
    }
    Ok(())
  }
}

fn print_tickets(tickets: &[innkeep_core::ticket::Ticket]) -> Result<()> {
  for t in tickets {
    println!("{}", ticket_label(t));
  }
  println!("{} ticket(s)", tickets.len());
  Ok(())
}

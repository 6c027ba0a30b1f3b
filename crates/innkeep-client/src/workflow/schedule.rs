//! Staff availability schedules, one entry at a time or a week at once.

use chrono::NaiveDate;
use innkeep_core::{
  gateway::Gateway,
  schedule::{self, BatchFailure, BatchOutcome, Schedule, ScheduleDraft, WeekPlan},
};
use tracing::{info, warn};

use super::{Context, require_admin};
use crate::Result;

pub struct ScheduleWorkflow<G> {
  cx: Context<G>,
}

impl<G: Gateway> ScheduleWorkflow<G> {
  pub fn new(cx: Context<G>) -> Self { Self { cx } }

  pub async fn list(&self) -> Result<Vec<Schedule>> {
    self.cx.actor()?;
    Ok(self.cx.gateway().list_schedules().await?)
  }

  pub async fn on_date(&self, date: NaiveDate) -> Result<Vec<Schedule>> {
    self.cx.actor()?;
    let entries = self.cx.gateway().schedules_on(date).await?;
    Ok(schedule::on_date(&entries, date).into_iter().cloned().collect())
  }

  pub async fn create(&self, draft: ScheduleDraft) -> Result<()> {
    draft.validate()?;
    require_admin(&self.cx.actor()?, "edit schedules")?;
    let username = draft.username.clone();
    self.cx.gateway().create_schedule(draft).await?;
    info!(%username, "schedule entry created");
    Ok(())
  }

  pub async fn update(&self, id: &str, draft: ScheduleDraft) -> Result<()> {
    draft.validate()?;
    require_admin(&self.cx.actor()?, "edit schedules")?;
    self.cx.gateway().update_schedule(id, draft).await?;
    info!(schedule_id = id, "schedule entry updated");
    Ok(())
  }

  pub async fn delete(&self, id: &str) -> Result<()> {
    require_admin(&self.cx.actor()?, "edit schedules")?;
    self.cx.gateway().delete_schedule(id).await?;
    info!(schedule_id = id, "schedule entry deleted");
    Ok(())
  }

  /// One entry per employee per day for seven days from `plan.start`.
  ///
  /// Entries are created one by one; a refusal is recorded and the rest
  /// still go through.
  pub async fn create_week(&self, plan: &WeekPlan) -> Result<BatchOutcome> {
    plan.validate()?;
    require_admin(&self.cx.actor()?, "edit schedules")?;

    let mut outcome = BatchOutcome::default();
    for draft in plan.entries() {
      let (username, date) = (draft.username.clone(), draft.date.unwrap_or(plan.start));
      match self.cx.gateway().create_schedule(draft).await {
        Ok(()) => outcome.created += 1,
        Err(e) => {
          warn!(%username, %date, error = %e, "schedule entry refused");
          outcome.failed.push(BatchFailure { username, date, reason: e.to_string() });
        }
      }
    }
    info!(
      start = %plan.start,
      created = outcome.created,
      failed = outcome.failed.len(),
      "week schedule submitted"
    );
    Ok(outcome)
  }
}

#[cfg(test)]
mod tests {
  use innkeep_core::{Category, Role, schedule::WeekEmployee};

  use super::*;
  use crate::workflow::testing::logged_in;

  fn employee(username: &str) -> WeekEmployee {
    WeekEmployee { username: username.into(), available: true, reason: None }
  }

  fn monday() -> NaiveDate { NaiveDate::from_ymd_opt(2025, 6, 2).unwrap() }

  #[tokio::test]
  async fn week_creates_one_entry_per_employee_day() {
    let wf = ScheduleWorkflow::new(logged_in("root", Role::Admin).await);
    let plan = WeekPlan { start: monday(), employees: vec![employee("mlopez"), employee("ana")] };

    let outcome = wf.create_week(&plan).await.unwrap();
    assert!(outcome.is_complete());
    assert_eq!(outcome.created, 14);

    let sunday = NaiveDate::from_ymd_opt(2025, 6, 8).unwrap();
    assert_eq!(wf.on_date(sunday).await.unwrap().len(), 2);
    assert_eq!(wf.list().await.unwrap().len(), 14);
  }

  #[tokio::test]
  async fn refused_entries_do_not_stop_the_batch() {
    let wf = ScheduleWorkflow::new(logged_in("root", Role::Admin).await);
    wf.cx.gateway().refuse_schedules_for("ana");
    let plan = WeekPlan { start: monday(), employees: vec![employee("mlopez"), employee("ana")] };

    let outcome = wf.create_week(&plan).await.unwrap();
    assert_eq!(outcome.created, 7);
    assert_eq!(outcome.failed.len(), 7);
    assert_eq!(outcome.attempted(), 14);
    assert!(outcome.failed.iter().all(|f| f.username == "ana"));
    assert_eq!(wf.cx.gateway().schedules().len(), 7);
  }

  #[tokio::test]
  async fn empty_week_is_a_validation_error() {
    let wf = ScheduleWorkflow::new(logged_in("root", Role::Admin).await);
    let plan = WeekPlan { start: monday(), employees: Vec::new() };
    let err = wf.create_week(&plan).await.unwrap_err();
    assert_eq!(err.category(), Category::Validation);
    assert_eq!(wf.cx.gateway().calls("create_schedule"), 0);
  }

  #[tokio::test]
  async fn single_entries_round_trip() {
    let wf = ScheduleWorkflow::new(logged_in("root", Role::Admin).await);
    wf.create(ScheduleDraft {
      username: "mlopez".into(),
      date: Some(monday()),
      available: false,
      reason: Some("Vacaciones".into()),
    })
    .await
    .unwrap();
    let entry = wf.on_date(monday()).await.unwrap().remove(0);
    assert!(!entry.available);

    let mut draft = ScheduleDraft::from(&entry);
    draft.available = true;
    wf.update(&entry.id, draft).await.unwrap();
    assert!(wf.on_date(monday()).await.unwrap()[0].available);

    wf.delete(&entry.id).await.unwrap();
    assert!(wf.list().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn staff_cannot_edit_schedules() {
    let wf = ScheduleWorkflow::new(logged_in("mlopez", Role::Maintenance).await);
    let draft = ScheduleDraft { username: "mlopez".into(), date: Some(monday()), ..Default::default() };
    assert_eq!(wf.create(draft).await.unwrap_err().category(), Category::Rule);
  }
}

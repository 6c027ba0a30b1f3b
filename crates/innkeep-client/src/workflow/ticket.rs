//! Housekeeping tickets: opening, the assignee's start/complete flow, and
//! the per-role listings.

use innkeep_core::{
  gateway::Gateway,
  ticket::{self, NewTicket, Ticket, TicketDraft, TicketPatch},
};
use tracing::info;

use super::Context;
use crate::Result;

pub struct TicketWorkflow<G> {
  cx: Context<G>,
}

impl<G: Gateway> TicketWorkflow<G> {
  pub fn new(cx: Context<G>) -> Self { Self { cx } }

  /// Open a ticket as the current housekeeping user.
  pub async fn create(&self, draft: &TicketDraft) -> Result<NewTicket> {
    let actor = self.cx.actor()?;
    let new = ticket::open(draft, &actor, self.cx.clock().now_utc())?;
    self.cx.gateway().create_ticket(new.clone()).await?;
    info!(area = %new.area, floor = %new.floor, priority = %new.priority, "ticket opened");
    Ok(new)
  }

  pub async fn created_by_me(&self) -> Result<Vec<Ticket>> {
    let actor = self.cx.actor()?;
    let all = self.cx.gateway().list_tickets().await?;
    Ok(ticket::created_by(&all, &actor.username).into_iter().cloned().collect())
  }

  /// Unfinished tickets assigned to the actor and opened today.
  pub async fn today(&self) -> Result<Vec<Ticket>> {
    let actor = self.cx.actor()?;
    let mine = self.cx.gateway().tickets_assigned_to(&actor.username).await?;
    let now = self.cx.clock().now();
    Ok(ticket::due_today(&mine, &actor, &now).into_iter().cloned().collect())
  }

  /// Pending and in-progress tickets, most urgent first.
  pub async fn incomplete(&self) -> Result<Vec<Ticket>> {
    let open = self.cx.gateway().incomplete_tickets().await?;
    Ok(ticket::incomplete(&open).into_iter().cloned().collect())
  }

  pub async fn start(&self, id: i64) -> Result<Ticket> {
    self.transition(id, ticket::start).await
  }

  /// Refused from the cutoff hour on, whoever asks.
  pub async fn complete(&self, id: i64) -> Result<Ticket> {
    let now = self.cx.clock().now();
    self.transition(id, |t, actor| ticket::complete(t, actor, &now)).await
  }

  pub async fn cancel(&self, id: i64) -> Result<Ticket> {
    self.transition(id, ticket::cancel).await
  }

  pub async fn save_notes(&self, id: i64, notes: &str) -> Result<Ticket> {
    self.transition(id, |t, actor| ticket::save_notes(t, actor, notes)).await
  }

  async fn transition<F>(&self, id: i64, rule: F) -> Result<Ticket>
  where
    F: FnOnce(&Ticket, &innkeep_core::Identity) -> innkeep_core::Result<TicketPatch>,
  {
    let actor = self.cx.actor()?;
    let current = self.cx.gateway().get_ticket(id).await?;
    let patch = rule(&current, &actor)?;
    let next = patch.apply(&current);
    self.cx.gateway().update_ticket(id, patch).await?;
    info!(ticket_id = id, from = %current.status, to = %next.status, "ticket updated");
    Ok(next)
  }
}

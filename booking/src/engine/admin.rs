//! Administration: slots, outcomes and result publication.

use super::guard::finish;
use crate::environment::BookingEnvironment;
use crate::error::{BookingError, Result};
use crate::providers::{
    CandidateRepository, Notice, Notifier, SlotLock, SlotRepository, SlotTransaction,
};
use crate::providers::notifier::DEFAULT_SUBJECT;
use crate::state::{Candidate, NewSlot, OutcomeRecord, Publication, Slot, SlotRoster};
use chrono::{DateTime, Utc};
use interview_booking_core::environment::Clock;
use interview_booking_core::{AdminId, CandidateId, Round, RoundOutcome, SlotId};
use tokio::task::JoinHandle;

/// Administrator-facing operations.
///
/// Callers are trusted; authentication happens upstream.
#[derive(Clone)]
pub struct AdminService<L, S, C, N, K>
where
    L: SlotLock + Clone,
    S: SlotRepository + Clone,
    C: CandidateRepository + Clone,
    N: Notifier + Clone,
    K: Clock + Clone,
{
    env: BookingEnvironment<L, S, C, N, K>,
}

impl<L, S, C, N, K> AdminService<L, S, C, N, K>
where
    L: SlotLock + Clone,
    S: SlotRepository + Clone,
    C: CandidateRepository + Clone,
    N: Notifier + Clone + 'static,
    K: Clock + Clone,
{
    /// Create a service over an environment.
    #[must_use]
    pub const fn new(env: BookingEnvironment<L, S, C, N, K>) -> Self {
        Self { env }
    }

    /// Validate and persist a new, empty slot.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::InvalidSlot` if the round is unknown, the
    /// window is empty or the capacity is outside `1..=max_capacity`.
    pub async fn create_slot(
        &self,
        round: i16,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        capacity: u32,
    ) -> Result<Slot> {
        let new = NewSlot::new(
            round,
            start_time,
            end_time,
            capacity,
            self.env.config.max_capacity,
        )
        .inspect_err(|e| tracing::debug!(error = %e, "Rejected slot"))?;

        let slot = self.env.slots.create_slot(&new).await?;
        tracing::info!(
            slot_id = %slot.id,
            round = %slot.round,
            start_time = %slot.start_time,
            capacity = slot.capacity,
            "Created interview slot"
        );
        Ok(slot)
    }

    /// A slot with its active and completed assignments.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::SlotNotFound` if the slot does not exist.
    pub async fn slot_roster(&self, slot: SlotId) -> Result<SlotRoster> {
        let slot = self.env.slots.get_slot(slot).await?;
        let assignments = self.env.slots.list_slot_assignments(slot.id).await?;
        Ok(SlotRoster { slot, assignments })
    }

    /// Record a round decision.
    ///
    /// The candidate's outcome, the audit row and the completion of the
    /// candidate's active assignment for `round` commit together. Recording
    /// `NotInterviewed` resets the outcome and leaves the assignment alone.
    ///
    /// # Errors
    ///
    /// - `RoundNotEligible` for a round-2 decision on a candidate who failed round 1
    /// - `CandidateNotFound` if the candidate does not exist
    /// - `StorageUnavailable` on database failure
    pub async fn record_outcome(
        &self,
        admin: AdminId,
        candidate: CandidateId,
        round: Round,
        outcome: RoundOutcome,
    ) -> Result<()> {
        if let Some(previous) = round.previous() {
            let record = self.env.candidates.get_candidate(candidate).await?;
            if record.outcome(previous) == RoundOutcome::Failed {
                tracing::debug!(
                    candidate_id = %candidate,
                    round = %round,
                    "Refused decision for a round the candidate cannot reach"
                );
                return Err(BookingError::RoundNotEligible);
            }
        }

        let record = OutcomeRecord {
            candidate,
            round,
            outcome,
            admin,
            recorded_at: self.env.clock.now(),
        };

        let mut tx = self.env.slots.begin().await?;
        let applied = async {
            tx.record_outcome(record).await?;
            if outcome == RoundOutcome::NotInterviewed {
                Ok(false)
            } else {
                tx.complete_assignment(candidate, round).await
            }
        }
        .await;
        let completed = finish(tx, applied).await?;

        tracing::info!(
            admin_id = %admin,
            candidate_id = %candidate,
            round = %round,
            outcome = ?outcome,
            assignment_completed = completed,
            "Recorded interview outcome"
        );
        Ok(())
    }

    /// Candidates who passed `round`, by ID.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    pub async fn passed_candidates(&self, round: Round) -> Result<Vec<Candidate>> {
        self.env.candidates.passed_candidates(round).await
    }

    /// Notify every candidate who passed `round`.
    ///
    /// Each notice goes out on its own task. Delivery failures are logged
    /// and never fail this call; the returned [`Dispatch`] reports how many
    /// notices were handed off and can be awaited for delivery.
    ///
    /// # Errors
    ///
    /// Returns error if the passed-candidate query fails.
    pub async fn publish_results(&self, round: Round, publication: &Publication) -> Result<Dispatch> {
        let candidates = self.env.candidates.passed_candidates(round).await?;

        let tasks: Vec<JoinHandle<bool>> = candidates
            .into_iter()
            .map(|candidate| {
                let notice = compose(&candidate, round, publication);
                let notifier = self.env.notifier.clone();
                tokio::spawn(async move {
                    match notifier.send(notice).await {
                        Ok(()) => true,
                        Err(e) => {
                            tracing::warn!(
                                candidate_id = %candidate.id,
                                error = %e,
                                "Result notice not delivered"
                            );
                            false
                        }
                    }
                })
            })
            .collect();

        tracing::info!(round = %round, dispatched = tasks.len(), "Publishing results");
        Ok(Dispatch { tasks })
    }
}

fn compose(candidate: &Candidate, round: Round, publication: &Publication) -> Notice {
    match publication {
        Publication::Default => Notice::passed(candidate.email.clone(), &candidate.name, round),
        Publication::Custom { subject, body } => Notice {
            to: candidate.email.clone(),
            subject: subject.clone().unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            body: body.clone(),
        },
    }
}

/// Notices handed off by [`AdminService::publish_results`].
#[derive(Debug)]
pub struct Dispatch {
    tasks: Vec<JoinHandle<bool>>,
}

impl Dispatch {
    /// Number of notices dispatched.
    #[must_use]
    pub fn dispatched(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every send to finish; returns how many were delivered.
    pub async fn delivered(self) -> usize {
        let mut delivered = 0;
        for result in futures::future::join_all(self.tasks).await {
            match result {
                Ok(true) => delivered += 1,
                Ok(false) => {}
                Err(e) => tracing::error!(error = %e, "Notice task failed"),
            }
        }
        delivered
    }
}

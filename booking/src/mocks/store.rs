//! Mock booking store for testing.
//!
//! One in-memory database backs both [`SlotRepository`] and
//! [`CandidateRepository`], so an outcome recorded through a transaction is
//! visible to the eligibility gate, as it would be in `PostgreSQL`.
//!
//! Transactions apply each mutation immediately under the mutex and keep an
//! undo journal. Rolling back, or dropping without commit, replays the
//! journal backwards. Concurrent transactions can therefore observe each
//! other's uncommitted writes; the guarded counter and the uniqueness checks
//! are still atomic, which is what the booking invariants rely on.

use crate::error::{BookingError, Result};
use crate::providers::{CandidateRepository, SlotRepository, SlotTransaction};
use crate::state::{Assignment, Candidate, InterviewResult, NewSlot, OutcomeRecord, Slot};
use chrono::Utc;
use interview_booking_core::{
    AssignmentId, AssignmentStatus, CandidateId, Round, RoundOutcome, SlotId, Track,
};
use std::collections::BTreeMap;
use std::future::{Future, ready};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tables {
    slots: BTreeMap<SlotId, Slot>,
    assignments: BTreeMap<AssignmentId, Assignment>,
    candidates: BTreeMap<CandidateId, Candidate>,
    results: Vec<InterviewResult>,
    next_slot_id: i64,
    next_assignment_id: i64,
    fail_assignment_updates: bool,
}

impl Tables {
    fn active_assignment(&self, candidate: CandidateId) -> Option<&Assignment> {
        self.assignments
            .values()
            .find(|a| a.candidate_id == candidate && a.status.is_active())
    }
}

fn lock(tables: &Mutex<Tables>) -> Result<MutexGuard<'_, Tables>> {
    tables
        .lock()
        .map_err(|_| BookingError::StorageUnavailable("Mutex lock failed".to_string()))
}

/// Mock booking store.
///
/// Uses in-memory storage for testing. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MockBookingStore {
    tables: Arc<Mutex<Tables>>,
}

impl MockBookingStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a slot as-is, bypassing validation (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn insert_slot(&self, slot: Slot) -> Result<()> {
        let mut tables = lock(&self.tables)?;
        tables.next_slot_id = tables.next_slot_id.max(slot.id.0);
        tables.slots.insert(slot.id, slot);
        Ok(())
    }

    /// Insert or replace a candidate (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn insert_candidate(&self, candidate: Candidate) -> Result<()> {
        lock(&self.tables)?.candidates.insert(candidate.id, candidate);
        Ok(())
    }

    /// Current state of a slot (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn slot(&self, slot: SlotId) -> Result<Option<Slot>> {
        Ok(lock(&self.tables)?.slots.get(&slot).cloned())
    }

    /// Every assignment ever created, including cancelled ones (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn all_assignments(&self) -> Result<Vec<Assignment>> {
        Ok(lock(&self.tables)?.assignments.values().cloned().collect())
    }

    /// Make every subsequent `update_assignment_slot` fail with
    /// `StorageUnavailable` (for testing rollback).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn fail_assignment_updates(&self, fail: bool) -> Result<()> {
        lock(&self.tables)?.fail_assignment_updates = fail;
        Ok(())
    }
}

impl SlotRepository for MockBookingStore {
    type Transaction = MockSlotTransaction;

    fn begin(&self) -> impl Future<Output = Result<MockSlotTransaction>> + Send {
        ready(Ok(MockSlotTransaction {
            tables: Arc::clone(&self.tables),
            journal: Vec::new(),
            finished: false,
        }))
    }

    fn create_slot(&self, slot: &NewSlot) -> impl Future<Output = Result<Slot>> + Send {
        let result = lock(&self.tables).map(|mut tables| {
            tables.next_slot_id += 1;
            let created = Slot {
                id: SlotId(tables.next_slot_id),
                round: slot.round(),
                start_time: slot.start_time(),
                end_time: slot.end_time(),
                occupied: 0,
                capacity: slot.capacity(),
            };
            tables.slots.insert(created.id, created.clone());
            created
        });
        ready(result)
    }

    fn get_slot(&self, slot: SlotId) -> impl Future<Output = Result<Slot>> + Send {
        ready(lock(&self.tables).and_then(|tables| {
            tables.slots.get(&slot).cloned().ok_or(BookingError::SlotNotFound)
        }))
    }

    fn list_slots(&self, round: Round) -> impl Future<Output = Result<Vec<Slot>>> + Send {
        ready(lock(&self.tables).map(|tables| {
            let mut slots: Vec<Slot> = tables
                .slots
                .values()
                .filter(|s| s.round == round)
                .cloned()
                .collect();
            slots.sort_by_key(|s| (s.start_time, s.id));
            slots
        }))
    }

    fn find_assignment_by_candidate(
        &self,
        candidate: CandidateId,
    ) -> impl Future<Output = Result<Assignment>> + Send {
        ready(lock(&self.tables).and_then(|tables| {
            tables
                .active_assignment(candidate)
                .cloned()
                .ok_or(BookingError::AssignmentNotFound)
        }))
    }

    fn list_slot_assignments(
        &self,
        slot: SlotId,
    ) -> impl Future<Output = Result<Vec<Assignment>>> + Send {
        ready(lock(&self.tables).map(|tables| {
            tables
                .assignments
                .values()
                .filter(|a| a.slot_id == slot && a.status != AssignmentStatus::Cancelled)
                .cloned()
                .collect()
        }))
    }
}

impl CandidateRepository for MockBookingStore {
    fn get_candidate(&self, candidate: CandidateId) -> impl Future<Output = Result<Candidate>> + Send {
        ready(lock(&self.tables).and_then(|tables| {
            tables
                .candidates
                .get(&candidate)
                .cloned()
                .ok_or(BookingError::CandidateNotFound)
        }))
    }

    fn passed_candidates(&self, round: Round) -> impl Future<Output = Result<Vec<Candidate>>> + Send {
        ready(lock(&self.tables).map(|tables| {
            tables
                .candidates
                .values()
                .filter(|c| c.outcome(round).is_passed())
                .cloned()
                .collect()
        }))
    }

    fn result_history(
        &self,
        candidate: CandidateId,
    ) -> impl Future<Output = Result<Vec<InterviewResult>>> + Send {
        ready(lock(&self.tables).map(|tables| {
            tables
                .results
                .iter()
                .filter(|r| r.candidate_id == candidate)
                .cloned()
                .collect()
        }))
    }
}

/// How to reverse one applied mutation.
#[derive(Debug)]
enum Undo {
    Occupied { slot: SlotId, by: i32 },
    Inserted(AssignmentId),
    Replaced(Assignment),
    Candidate(Candidate),
    ResultAppended,
}

/// Mock transaction over [`MockBookingStore`].
#[derive(Debug)]
pub struct MockSlotTransaction {
    tables: Arc<Mutex<Tables>>,
    journal: Vec<Undo>,
    finished: bool,
}

impl MockSlotTransaction {
    fn apply_increment(&mut self, slot: SlotId, by: i32) -> Result<()> {
        let mut tables = lock(&self.tables)?;
        let row = tables.slots.get_mut(&slot).ok_or(BookingError::SlotNotFound)?;

        let next = i64::from(row.occupied) + i64::from(by);
        if next > i64::from(row.capacity) {
            return Err(BookingError::CapacityExceeded);
        }
        let next = u32::try_from(next).map_err(|_| {
            BookingError::StorageInconsistency(format!(
                "slot {slot}: occupied would drop below zero (delta {by})"
            ))
        })?;

        row.occupied = next;
        self.journal.push(Undo::Occupied { slot, by });
        Ok(())
    }

    fn apply_create(
        &mut self,
        candidate: CandidateId,
        slot: SlotId,
        round: Round,
        track: Track,
    ) -> Result<Assignment> {
        let mut tables = lock(&self.tables)?;
        if !tables.candidates.contains_key(&candidate) {
            return Err(BookingError::CandidateNotFound);
        }
        if !tables.slots.contains_key(&slot) {
            return Err(BookingError::SlotNotFound);
        }
        if tables.active_assignment(candidate).is_some() {
            return Err(BookingError::AlreadyBooked);
        }

        tables.next_assignment_id += 1;
        let now = Utc::now();
        let assignment = Assignment {
            id: AssignmentId(tables.next_assignment_id),
            candidate_id: candidate,
            slot_id: slot,
            round,
            track,
            status: AssignmentStatus::Active,
            created_at: now,
            updated_at: now,
        };
        tables.assignments.insert(assignment.id, assignment.clone());
        self.journal.push(Undo::Inserted(assignment.id));
        Ok(assignment)
    }

    /// Apply `change` to the candidate's active assignment, journaling the prior row.
    fn apply_to_active(
        &mut self,
        candidate: CandidateId,
        change: impl FnOnce(&mut Assignment),
    ) -> Result<Assignment> {
        let mut tables = lock(&self.tables)?;
        let id = tables
            .active_assignment(candidate)
            .map(|a| a.id)
            .ok_or(BookingError::AssignmentNotFound)?;
        let row = tables
            .assignments
            .get_mut(&id)
            .ok_or(BookingError::AssignmentNotFound)?;

        let before = row.clone();
        change(row);
        row.updated_at = Utc::now();
        let after = row.clone();
        self.journal.push(Undo::Replaced(before));
        Ok(after)
    }

    fn apply_outcome(&mut self, record: OutcomeRecord) -> Result<()> {
        let mut tables = lock(&self.tables)?;
        let row = tables
            .candidates
            .get_mut(&record.candidate)
            .ok_or(BookingError::CandidateNotFound)?;

        let before = row.clone();
        match record.round {
            Round::First => row.round1 = record.outcome,
            Round::Second => row.round2 = record.outcome,
        }
        tables.results.push(InterviewResult {
            candidate_id: record.candidate,
            round: record.round,
            outcome: record.outcome,
            admin_id: record.admin,
            recorded_at: record.recorded_at,
        });
        self.journal.push(Undo::Candidate(before));
        self.journal.push(Undo::ResultAppended);
        Ok(())
    }

    fn undo_all(&mut self) {
        let Ok(mut tables) = self.tables.lock() else {
            return;
        };
        while let Some(undo) = self.journal.pop() {
            match undo {
                Undo::Occupied { slot, by } => {
                    if let Some(row) = tables.slots.get_mut(&slot) {
                        row.occupied = row.occupied.saturating_add_signed(-by);
                    }
                }
                Undo::Inserted(id) => {
                    tables.assignments.remove(&id);
                }
                Undo::Replaced(before) => {
                    tables.assignments.insert(before.id, before);
                }
                Undo::Candidate(before) => {
                    tables.candidates.insert(before.id, before);
                }
                Undo::ResultAppended => {
                    tables.results.pop();
                }
            }
        }
    }
}

impl SlotTransaction for MockSlotTransaction {
    fn increment_occupied(&mut self, slot: SlotId, by: i32) -> impl Future<Output = Result<()>> + Send {
        ready(self.apply_increment(slot, by))
    }

    fn create_assignment(
        &mut self,
        candidate: CandidateId,
        slot: SlotId,
        round: Round,
        track: Track,
    ) -> impl Future<Output = Result<Assignment>> + Send {
        ready(self.apply_create(candidate, slot, round, track))
    }

    fn delete_assignment(
        &mut self,
        candidate: CandidateId,
    ) -> impl Future<Output = Result<Assignment>> + Send {
        ready(self.apply_to_active(candidate, |a| a.status = AssignmentStatus::Cancelled))
    }

    fn update_assignment_slot(
        &mut self,
        candidate: CandidateId,
        new_slot: SlotId,
        new_track: Track,
    ) -> impl Future<Output = Result<()>> + Send {
        let result = match lock(&self.tables).map(|t| t.fail_assignment_updates) {
            Ok(true) => Err(BookingError::StorageUnavailable("injected failure".to_string())),
            Ok(false) => self
                .apply_to_active(candidate, |a| {
                    a.slot_id = new_slot;
                    a.track = new_track;
                })
                .map(|_| ()),
            Err(e) => Err(e),
        };
        ready(result)
    }

    fn complete_assignment(
        &mut self,
        candidate: CandidateId,
        round: Round,
    ) -> impl Future<Output = Result<bool>> + Send {
        let active_round = lock(&self.tables)
            .map(|tables| tables.active_assignment(candidate).map(|a| a.round));
        let result = match active_round {
            Ok(Some(r)) if r == round => self
                .apply_to_active(candidate, |a| a.status = AssignmentStatus::Completed)
                .map(|_| true),
            Ok(_) => Ok(false),
            Err(e) => Err(e),
        };
        ready(result)
    }

    fn record_outcome(&mut self, record: OutcomeRecord) -> impl Future<Output = Result<()>> + Send {
        ready(self.apply_outcome(record))
    }

    fn commit(mut self) -> impl Future<Output = Result<()>> + Send {
        self.journal.clear();
        self.finished = true;
        ready(Ok(()))
    }

    fn rollback(mut self) -> impl Future<Output = Result<()>> + Send {
        self.undo_all();
        self.finished = true;
        ready(Ok(()))
    }
}

impl Drop for MockSlotTransaction {
    fn drop(&mut self) {
        if !self.finished {
            self.undo_all();
        }
    }
}

/// Candidate with the given round outcomes (for testing).
#[must_use]
pub fn candidate(id: i64, round1: RoundOutcome, round2: RoundOutcome) -> Candidate {
    Candidate {
        id: CandidateId(id),
        name: format!("candidate-{id}"),
        email: format!("candidate{id}@example.com"),
        round1,
        round2,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use chrono::Duration;

    fn seeded() -> MockBookingStore {
        let store = MockBookingStore::new();
        let start = Utc::now() + Duration::days(1);
        store
            .insert_slot(Slot {
                id: SlotId(1),
                round: Round::First,
                start_time: start,
                end_time: start + Duration::hours(1),
                occupied: 0,
                capacity: 2,
            })
            .unwrap();
        store
            .insert_candidate(candidate(7, RoundOutcome::NotInterviewed, RoundOutcome::NotInterviewed))
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_rollback_restores_every_mutation() {
        let store = seeded();

        let mut tx = store.begin().await.unwrap();
        tx.increment_occupied(SlotId(1), 1).await.unwrap();
        tx.create_assignment(CandidateId(7), SlotId(1), Round::First, Track::Go)
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(store.slot(SlotId(1)).unwrap().unwrap().occupied, 0);
        assert!(store.all_assignments().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_drop_without_commit_rolls_back() {
        let store = seeded();

        {
            let mut tx = store.begin().await.unwrap();
            tx.increment_occupied(SlotId(1), 2).await.unwrap();
        }

        assert_eq!(store.slot(SlotId(1)).unwrap().unwrap().occupied, 0);
    }

    #[tokio::test]
    async fn test_guard_bounds() {
        let store = seeded();
        let mut tx = store.begin().await.unwrap();

        assert_eq!(
            tx.increment_occupied(SlotId(1), 3).await,
            Err(BookingError::CapacityExceeded)
        );
        assert!(matches!(
            tx.increment_occupied(SlotId(1), -1).await,
            Err(BookingError::StorageInconsistency(_))
        ));
        assert_eq!(
            tx.increment_occupied(SlotId(9), 1).await,
            Err(BookingError::SlotNotFound)
        );
    }

    #[tokio::test]
    async fn test_commit_keeps_outcome_and_history() {
        let store = seeded();

        let mut tx = store.begin().await.unwrap();
        tx.record_outcome(OutcomeRecord {
            candidate: CandidateId(7),
            round: Round::First,
            outcome: RoundOutcome::Passed,
            admin: interview_booking_core::AdminId(1),
            recorded_at: Utc::now(),
        })
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let stored = store.get_candidate(CandidateId(7)).await.unwrap();
        assert_eq!(stored.round1, RoundOutcome::Passed);
        assert_eq!(store.result_history(CandidateId(7)).await.unwrap().len(), 1);
    }
}

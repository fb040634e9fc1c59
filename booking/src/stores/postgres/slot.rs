//! PostgreSQL slot repository implementation.
//!
//! # Example
//!
//! ```no_run
//! use interview_booking::stores::postgres::PostgresSlotRepository;
//! use sqlx::PgPool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = PgPool::connect("postgresql://localhost/interviews").await?;
//! let repo = PostgresSlotRepository::new(pool);
//! repo.migrate().await?;
//! # Ok(())
//! # }
//! ```

use super::storage_error;
use crate::error::{BookingError, Result};
use crate::providers::{SlotRepository, SlotTransaction};
use crate::state::{Assignment, NewSlot, OutcomeRecord, Slot};
use chrono::{DateTime, Utc};
use interview_booking_core::{
    AssignmentId, AssignmentStatus, CandidateId, Round, SlotId, Track,
};
use sqlx::{PgPool, Postgres, Transaction};

const SLOT_COLUMNS: &str = "id, round, start_time, end_time, occupied, capacity";
const ASSIGNMENT_COLUMNS: &str =
    "id, candidate_id, slot_id, round, track, status, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct SlotRow {
    id: i64,
    round: i16,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    occupied: i32,
    capacity: i32,
}

impl TryFrom<SlotRow> for Slot {
    type Error = BookingError;

    fn try_from(row: SlotRow) -> Result<Self> {
        let corrupt = |what: String| {
            BookingError::StorageInconsistency(format!("slot {}: {what}", row.id))
        };

        Ok(Self {
            id: SlotId(row.id),
            round: Round::try_from(row.round).map_err(|e| corrupt(e.to_string()))?,
            start_time: row.start_time,
            end_time: row.end_time,
            occupied: u32::try_from(row.occupied)
                .map_err(|_| corrupt(format!("negative occupied {}", row.occupied)))?,
            capacity: u32::try_from(row.capacity)
                .map_err(|_| corrupt(format!("negative capacity {}", row.capacity)))?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AssignmentRow {
    id: i64,
    candidate_id: i64,
    slot_id: i64,
    round: i16,
    track: i16,
    status: i16,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AssignmentRow> for Assignment {
    type Error = BookingError;

    fn try_from(row: AssignmentRow) -> Result<Self> {
        let corrupt = |e: interview_booking_core::InvalidValue| {
            BookingError::StorageInconsistency(format!("assignment {}: {e}", row.id))
        };

        Ok(Self {
            id: AssignmentId(row.id),
            candidate_id: CandidateId(row.candidate_id),
            slot_id: SlotId(row.slot_id),
            round: Round::try_from(row.round).map_err(corrupt)?,
            track: Track::try_from(row.track).map_err(corrupt)?,
            status: AssignmentStatus::try_from(row.status).map_err(corrupt)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// PostgreSQL slot repository.
#[derive(Clone)]
pub struct PostgresSlotRepository {
    /// PostgreSQL connection pool.
    pool: PgPool,
}

impl PostgresSlotRepository {
    /// Create a new PostgreSQL slot repository.
    ///
    /// # Arguments
    ///
    /// * `pool` - PostgreSQL connection pool
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns error if migrations fail.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| BookingError::StorageUnavailable(format!("Migration failed: {e}")))?;
        Ok(())
    }
}

impl SlotRepository for PostgresSlotRepository {
    type Transaction = PostgresSlotTransaction;

    async fn begin(&self) -> Result<PostgresSlotTransaction> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error("begin transaction", &e))?;
        Ok(PostgresSlotTransaction { tx })
    }

    async fn create_slot(&self, slot: &NewSlot) -> Result<Slot> {
        let row: SlotRow = sqlx::query_as(&format!(
            r"
            INSERT INTO interview_slots (round, start_time, end_time, occupied, capacity)
            VALUES ($1, $2, $3, 0, $4)
            RETURNING {SLOT_COLUMNS}
            "
        ))
        .bind(slot.round().as_i16())
        .bind(slot.start_time())
        .bind(slot.end_time())
        .bind(i32::try_from(slot.capacity()).map_err(|_| {
            BookingError::InvalidSlot(format!("capacity {} too large", slot.capacity()))
        })?)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("create slot", &e))?;

        row.try_into()
    }

    async fn get_slot(&self, slot: SlotId) -> Result<Slot> {
        let row: SlotRow =
            sqlx::query_as(&format!("SELECT {SLOT_COLUMNS} FROM interview_slots WHERE id = $1"))
                .bind(slot.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| storage_error("get slot", &e))?
                .ok_or(BookingError::SlotNotFound)?;

        row.try_into()
    }

    async fn list_slots(&self, round: Round) -> Result<Vec<Slot>> {
        let rows: Vec<SlotRow> = sqlx::query_as(&format!(
            r"
            SELECT {SLOT_COLUMNS}
            FROM interview_slots
            WHERE round = $1
            ORDER BY start_time, id
            "
        ))
        .bind(round.as_i16())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("list slots", &e))?;

        rows.into_iter().map(Slot::try_from).collect()
    }

    async fn find_assignment_by_candidate(&self, candidate: CandidateId) -> Result<Assignment> {
        let row: AssignmentRow = sqlx::query_as(&format!(
            r"
            SELECT {ASSIGNMENT_COLUMNS}
            FROM interview_assignments
            WHERE candidate_id = $1 AND status = 0
            "
        ))
        .bind(candidate.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("find assignment", &e))?
        .ok_or(BookingError::AssignmentNotFound)?;

        row.try_into()
    }

    async fn list_slot_assignments(&self, slot: SlotId) -> Result<Vec<Assignment>> {
        let rows: Vec<AssignmentRow> = sqlx::query_as(&format!(
            r"
            SELECT {ASSIGNMENT_COLUMNS}
            FROM interview_assignments
            WHERE slot_id = $1 AND status IN (0, 2)
            ORDER BY created_at, id
            "
        ))
        .bind(slot.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("list slot assignments", &e))?;

        rows.into_iter().map(Assignment::try_from).collect()
    }
}

/// One PostgreSQL transaction.
///
/// Dropping it without [`SlotTransaction::commit`] rolls it back.
pub struct PostgresSlotTransaction {
    tx: Transaction<'static, Postgres>,
}

impl SlotTransaction for PostgresSlotTransaction {
    async fn increment_occupied(&mut self, slot: SlotId, by: i32) -> Result<()> {
        let result = sqlx::query(
            r"
            UPDATE interview_slots
            SET occupied = occupied + $2
            WHERE id = $1 AND occupied + $2 BETWEEN 0 AND capacity
            ",
        )
        .bind(slot.0)
        .bind(by)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| storage_error("update occupied", &e))?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // Guard rejected the write; tell a missing slot apart from a full or empty one
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM interview_slots WHERE id = $1")
            .bind(slot.0)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| storage_error("check slot", &e))?;

        match exists {
            None => Err(BookingError::SlotNotFound),
            Some(_) if by > 0 => Err(BookingError::CapacityExceeded),
            Some(_) => Err(BookingError::StorageInconsistency(format!(
                "slot {slot}: occupied would drop below zero (delta {by})"
            ))),
        }
    }

    async fn create_assignment(
        &mut self,
        candidate: CandidateId,
        slot: SlotId,
        round: Round,
        track: Track,
    ) -> Result<Assignment> {
        let row: AssignmentRow = sqlx::query_as(&format!(
            r"
            INSERT INTO interview_assignments (candidate_id, slot_id, round, track, status)
            VALUES ($1, $2, $3, $4, 0)
            RETURNING {ASSIGNMENT_COLUMNS}
            "
        ))
        .bind(candidate.0)
        .bind(slot.0)
        .bind(round.as_i16())
        .bind(track.as_i16())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return BookingError::AlreadyBooked;
                }
                if db_err.is_foreign_key_violation() {
                    return match db_err.constraint() {
                        Some("interview_assignments_candidate_fkey") => {
                            BookingError::CandidateNotFound
                        }
                        _ => BookingError::SlotNotFound,
                    };
                }
            }
            storage_error("create assignment", &e)
        })?;

        row.try_into()
    }

    async fn delete_assignment(&mut self, candidate: CandidateId) -> Result<Assignment> {
        let row: AssignmentRow = sqlx::query_as(&format!(
            r"
            UPDATE interview_assignments
            SET status = 1, updated_at = now()
            WHERE candidate_id = $1 AND status = 0
            RETURNING {ASSIGNMENT_COLUMNS}
            "
        ))
        .bind(candidate.0)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| storage_error("cancel assignment", &e))?
        .ok_or(BookingError::AssignmentNotFound)?;

        row.try_into()
    }

    async fn update_assignment_slot(
        &mut self,
        candidate: CandidateId,
        new_slot: SlotId,
        new_track: Track,
    ) -> Result<()> {
        let result = sqlx::query(
            r"
            UPDATE interview_assignments
            SET slot_id = $2, track = $3, updated_at = now()
            WHERE candidate_id = $1 AND status = 0
            ",
        )
        .bind(candidate.0)
        .bind(new_slot.0)
        .bind(new_track.as_i16())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| storage_error("move assignment", &e))?;

        if result.rows_affected() == 0 {
            return Err(BookingError::AssignmentNotFound);
        }
        Ok(())
    }

    async fn complete_assignment(&mut self, candidate: CandidateId, round: Round) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE interview_assignments
            SET status = 2, updated_at = now()
            WHERE candidate_id = $1 AND round = $2 AND status = 0
            ",
        )
        .bind(candidate.0)
        .bind(round.as_i16())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| storage_error("complete assignment", &e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_outcome(&mut self, record: OutcomeRecord) -> Result<()> {
        let result = sqlx::query(
            r"
            UPDATE candidates
            SET round1 = CASE WHEN $2 = 1 THEN $3 ELSE round1 END,
                round2 = CASE WHEN $2 = 2 THEN $3 ELSE round2 END,
                updated_at = $4
            WHERE id = $1
            ",
        )
        .bind(record.candidate.0)
        .bind(record.round.as_i16())
        .bind(record.outcome.as_i16())
        .bind(record.recorded_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| storage_error("update candidate outcome", &e))?;

        if result.rows_affected() == 0 {
            return Err(BookingError::CandidateNotFound);
        }

        sqlx::query(
            r"
            INSERT INTO interview_results (candidate_id, round, outcome, admin_id, recorded_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(record.candidate.0)
        .bind(record.round.as_i16())
        .bind(record.outcome.as_i16())
        .bind(record.admin.0)
        .bind(record.recorded_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| storage_error("append interview result", &e))?;

        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| storage_error("commit transaction", &e))
    }

    async fn rollback(self) -> Result<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| storage_error("roll back transaction", &e))
    }
}

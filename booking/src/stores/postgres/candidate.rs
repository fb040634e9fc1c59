//! PostgreSQL candidate repository implementation.

use super::storage_error;
use crate::error::{BookingError, Result};
use crate::providers::CandidateRepository;
use crate::state::{Candidate, InterviewResult};
use chrono::{DateTime, Utc};
use interview_booking_core::{AdminId, CandidateId, InvalidValue, Round, RoundOutcome};
use sqlx::PgPool;

#[derive(sqlx::FromRow)]
struct CandidateRow {
    id: i64,
    name: String,
    email: String,
    round1: i16,
    round2: i16,
}

impl TryFrom<CandidateRow> for Candidate {
    type Error = BookingError;

    fn try_from(row: CandidateRow) -> Result<Self> {
        let corrupt = |e: InvalidValue| {
            BookingError::StorageInconsistency(format!("candidate {}: {e}", row.id))
        };

        Ok(Self {
            id: CandidateId(row.id),
            round1: RoundOutcome::try_from(row.round1).map_err(corrupt)?,
            round2: RoundOutcome::try_from(row.round2).map_err(corrupt)?,
            name: row.name,
            email: row.email,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ResultRow {
    candidate_id: i64,
    round: i16,
    outcome: i16,
    admin_id: i64,
    recorded_at: DateTime<Utc>,
}

impl TryFrom<ResultRow> for InterviewResult {
    type Error = BookingError;

    fn try_from(row: ResultRow) -> Result<Self> {
        let corrupt = |e: InvalidValue| {
            BookingError::StorageInconsistency(format!(
                "result for candidate {}: {e}",
                row.candidate_id
            ))
        };

        Ok(Self {
            candidate_id: CandidateId(row.candidate_id),
            round: Round::try_from(row.round).map_err(corrupt)?,
            outcome: RoundOutcome::try_from(row.outcome).map_err(corrupt)?,
            admin_id: AdminId(row.admin_id),
            recorded_at: row.recorded_at,
        })
    }
}

/// PostgreSQL candidate repository.
///
/// Reads the `candidates` table provisioned by the identity service.
#[derive(Clone)]
pub struct PostgresCandidateRepository {
    /// PostgreSQL connection pool.
    pool: PgPool,
}

impl PostgresCandidateRepository {
    /// Create a new PostgreSQL candidate repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CandidateRepository for PostgresCandidateRepository {
    async fn get_candidate(&self, candidate: CandidateId) -> Result<Candidate> {
        let row: CandidateRow = sqlx::query_as(
            "SELECT id, name, email, round1, round2 FROM candidates WHERE id = $1",
        )
        .bind(candidate.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("get candidate", &e))?
        .ok_or(BookingError::CandidateNotFound)?;

        row.try_into()
    }

    async fn passed_candidates(&self, round: Round) -> Result<Vec<Candidate>> {
        let rows: Vec<CandidateRow> = sqlx::query_as(
            r"
            SELECT id, name, email, round1, round2
            FROM candidates
            WHERE CASE WHEN $1 = 1 THEN round1 ELSE round2 END = 1
            ORDER BY id
            ",
        )
        .bind(round.as_i16())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("list passed candidates", &e))?;

        rows.into_iter().map(Candidate::try_from).collect()
    }

    async fn result_history(&self, candidate: CandidateId) -> Result<Vec<InterviewResult>> {
        let rows: Vec<ResultRow> = sqlx::query_as(
            r"
            SELECT candidate_id, round, outcome, admin_id, recorded_at
            FROM interview_results
            WHERE candidate_id = $1
            ORDER BY recorded_at, id
            ",
        )
        .bind(candidate.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("load result history", &e))?;

        rows.into_iter().map(InterviewResult::try_from).collect()
    }
}

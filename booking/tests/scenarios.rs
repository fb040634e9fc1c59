//! End-to-end booking flows against the in-memory providers.

#![allow(clippy::unwrap_used)]

mod common;

use chrono::Duration;
use common::{Fixture, book_retrying, request};
use interview_booking::providers::SlotLock;
use interview_booking::{BookingError, BookingReply, Publication, RebookRequest};
use interview_booking_core::{AdminId, CandidateId, Round, RoundOutcome, Track};

#[tokio::test]
async fn test_last_seat_goes_to_exactly_one_candidate() {
    let fx = Fixture::new();
    let slot = fx.slot(1, Round::First, 1);
    let a = fx.candidate(1, RoundOutcome::NotInterviewed);
    let b = fx.candidate(2, RoundOutcome::NotInterviewed);

    let (ra, rb) = tokio::join!(
        book_retrying(&fx.engine, a, slot),
        book_retrying(&fx.engine, b, slot)
    );

    let mut outcomes = [ra, rb];
    outcomes.sort_by_key(Result::is_err);
    assert_eq!(outcomes[0], Ok(()));
    assert_eq!(outcomes[1], Err(BookingError::CapacityExceeded));
    assert_eq!(fx.occupied(slot), 1);
}

#[tokio::test]
async fn test_cancel_returns_the_seat() {
    let fx = Fixture::new();
    let slot = fx.slot(1, Round::First, 3);
    let a = fx.candidate(1, RoundOutcome::NotInterviewed);

    fx.engine.book(a, request(slot)).await.unwrap();
    assert_eq!(fx.occupied(slot), 1);

    fx.engine.cancel(a).await.unwrap();
    assert_eq!(fx.occupied(slot), 0);
    assert_eq!(fx.engine.cancel(a).await, Err(BookingError::AssignmentNotFound));
}

#[tokio::test]
async fn test_failed_first_round_blocks_second_round() {
    let fx = Fixture::new();
    let slot = fx.slot(2, Round::Second, 3);
    let a = fx.candidate(1, RoundOutcome::Failed);

    let result = fx.engine.book(a, request(slot)).await;

    assert_eq!(result, Err(BookingError::RoundNotEligible));
    assert_eq!(fx.occupied(slot), 0);
}

#[tokio::test]
async fn test_rebook_into_full_slot_keeps_original() {
    let fx = Fixture::new();
    let original = fx.slot(1, Round::First, 3);
    let full = fx.slot(2, Round::First, 1);
    let a = fx.candidate(1, RoundOutcome::NotInterviewed);
    let b = fx.candidate(2, RoundOutcome::NotInterviewed);
    fx.engine.book(a, request(original)).await.unwrap();
    fx.engine.book(b, request(full)).await.unwrap();
    let before = fx.occupied(original);

    let result = fx
        .engine
        .rebook(a, RebookRequest { new_slot: full, track: Track::Go })
        .await;

    assert_eq!(result, Err(BookingError::CapacityExceeded));
    assert_eq!(fx.occupied(original), before);
    assert_eq!(fx.occupied(full), 1);
}

#[tokio::test]
async fn test_second_lock_acquire_is_busy() {
    let fx = Fixture::new();
    let ttl = std::time::Duration::from_secs(10);

    let first = fx.lock.acquire("lock:slot:5", ttl).await.unwrap();
    let second = fx.lock.acquire("lock:slot:5", ttl).await.unwrap();

    assert!(first.is_some());
    assert!(second.is_none());
}

#[tokio::test]
async fn test_window_closes_at_start_time() {
    let fx = Fixture::new();
    let slot = fx.slot(1, Round::First, 3);
    let a = fx.candidate(1, RoundOutcome::NotInterviewed);
    let b = fx.candidate(2, RoundOutcome::NotInterviewed);

    // Exactly at the start time booking is still open
    fx.clock.advance(Duration::days(1));
    fx.engine.book(a, request(slot)).await.unwrap();

    fx.clock.advance(Duration::seconds(1));
    assert_eq!(
        fx.engine.book(b, request(slot)).await,
        Err(BookingError::BookingWindowClosed)
    );
    assert_eq!(fx.occupied(slot), 1);
}

#[tokio::test]
async fn test_full_pipeline_through_second_round() {
    let fx = Fixture::new();
    let first = fx.slot(1, Round::First, 2);
    let second = fx.slot(2, Round::Second, 2);
    let a = fx.candidate(1, RoundOutcome::NotInterviewed);

    // Not yet decided: round 2 is gated
    assert_eq!(
        fx.engine.book(a, request(second)).await,
        Err(BookingError::RoundNotEligible)
    );

    fx.engine.book(a, request(first)).await.unwrap();
    fx.admin
        .record_outcome(AdminId(1), a, Round::First, RoundOutcome::Passed)
        .await
        .unwrap();

    // The completed round-1 assignment no longer counts as a booking
    fx.engine.book(a, request(second)).await.unwrap();
    let (assignment, slot) = fx.engine.current_booking(a).await.unwrap().unwrap();
    assert_eq!(assignment.round, Round::Second);
    assert_eq!(slot.id, second);
    // The round-1 seat stays taken by the interview that happened
    assert_eq!(fx.occupied(first), 1);

    let dispatch = fx
        .admin
        .publish_results(Round::First, &Publication::Default)
        .await
        .unwrap();
    assert_eq!(dispatch.delivered().await, 1);
    assert_eq!(fx.notifier.sent().unwrap()[0].to, "candidate1@example.com");
}

#[tokio::test]
async fn test_rejections_map_to_distinct_replies() {
    let fx = Fixture::new();
    let slot = fx.slot(1, Round::First, 1);
    let a = fx.candidate(1, RoundOutcome::NotInterviewed);
    let b = fx.candidate(2, RoundOutcome::NotInterviewed);
    fx.engine.book(a, request(slot)).await.unwrap();

    let full = BookingReply::from(&fx.engine.book(b, request(slot)).await);
    let again = BookingReply::from(&fx.engine.book(a, request(slot)).await);

    assert_ne!(
        serde_json::to_value(&full).unwrap()["message"],
        serde_json::to_value(&again).unwrap()["message"]
    );
    assert_eq!(serde_json::to_value(&full).unwrap()["retryable"], false);
    assert_eq!(
        serde_json::to_value(BookingReply::from(&Ok::<(), BookingError>(()))).unwrap(),
        serde_json::json!({"status": "ok"})
    );
}

#[tokio::test]
async fn test_unknown_candidate_cannot_book() {
    let fx = Fixture::new();
    let slot = fx.slot(1, Round::First, 1);

    assert_eq!(
        fx.engine.book(CandidateId(404), request(slot)).await,
        Err(BookingError::CandidateNotFound)
    );
    assert_eq!(fx.occupied(slot), 0);
}

#[tokio::test]
async fn test_decided_round_cannot_be_booked_again() {
    let fx = Fixture::new();
    let first = fx.slot(1, Round::First, 2);
    let retry = fx.slot(2, Round::First, 2);
    let failed = fx.candidate(1, RoundOutcome::NotInterviewed);
    let passed = fx.candidate(2, RoundOutcome::NotInterviewed);

    for (candidate, outcome) in [(failed, RoundOutcome::Failed), (passed, RoundOutcome::Passed)] {
        fx.engine.book(candidate, request(first)).await.unwrap();
        fx.admin
            .record_outcome(AdminId(1), candidate, Round::First, outcome)
            .await
            .unwrap();

        assert_eq!(
            fx.engine.book(candidate, request(retry)).await,
            Err(BookingError::RoundAlreadyDecided)
        );
        assert_eq!(fx.engine.result(candidate, Round::First).await, Ok(outcome));
    }

    assert_eq!(fx.occupied(first), 2);
    assert_eq!(fx.occupied(retry), 0);
}

#[tokio::test]
async fn test_undecided_round_can_be_booked_again() {
    let fx = Fixture::new();
    let first = fx.slot(1, Round::First, 1);
    let retry = fx.slot(2, Round::First, 1);
    let a = fx.candidate(1, RoundOutcome::NotInterviewed);

    fx.engine.book(a, request(first)).await.unwrap();
    fx.admin
        .record_outcome(AdminId(1), a, Round::First, RoundOutcome::Undecided)
        .await
        .unwrap();

    fx.engine.book(a, request(retry)).await.unwrap();
    assert_eq!(fx.occupied(retry), 1);
    assert_eq!(fx.engine.result_history(a).await.unwrap().len(), 1);
}

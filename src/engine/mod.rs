mod cache;
mod conflict;
mod error;
mod suggest;

pub use cache::{month_days, AvailabilityCache};
pub use conflict::{conflicting_reservations, range_check};
pub use error::EngineError;

pub(crate) use conflict::validate_stay;

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::store::ReservationStore;

/// What to record for a day whose remote conflict check failed.
///
/// Applies only to the per-day fetches of a month fill. The range check at
/// reservation-submit time is authoritative and never fails open, so a day
/// recorded as available here can still be rejected at submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchErrorPolicy {
    /// Record the day as available with zero conflicts (source behavior:
    /// keep the calendar bookable through transient backend errors).
    #[default]
    AssumeAvailable,
    /// Record the day as unavailable.
    AssumeUnavailable,
    /// Fail the whole populate call.
    Propagate,
}

/// Query surface over an externally supplied reservation store.
///
/// Holds no state beyond configuration: every answer is deterministic
/// given a fixed store snapshot, and the only suspending operation is the
/// batched day fetch inside [`AvailabilityEngine::populate_month_cache`].
pub struct AvailabilityEngine {
    store: Arc<dyn ReservationStore>,
    on_fetch_error: FetchErrorPolicy,
}

impl AvailabilityEngine {
    pub fn new(store: Arc<dyn ReservationStore>) -> Self {
        Self {
            store,
            on_fetch_error: FetchErrorPolicy::default(),
        }
    }

    pub fn with_fetch_error_policy(mut self, policy: FetchErrorPolicy) -> Self {
        self.on_fetch_error = policy;
        self
    }

    pub fn fetch_error_policy(&self) -> FetchErrorPolicy {
        self.on_fetch_error
    }

    /// Is room `room_id` free for `[check_in, check_out)`?
    ///
    /// Callers must pass `check_in < check_out`; violating this is a
    /// programmer error, not a recoverable condition. Store errors
    /// propagate — this is the path that backstops the fail-open calendar,
    /// so it must not fail open itself.
    pub async fn is_range_available(
        &self,
        room_id: Ulid,
        check_in: NaiveDate,
        check_out: NaiveDate,
        exclude_reservation_id: Option<Ulid>,
    ) -> Result<RangeCheck, EngineError> {
        debug_assert!(check_in < check_out, "check_in must be before check_out");
        if (check_out - check_in).num_days() > MAX_QUERY_WINDOW_DAYS {
            return Err(EngineError::LimitExceeded("query window too wide"));
        }

        let start = Instant::now();
        let result = self
            .store
            .check_room_availability(room_id, check_in, check_out, exclude_reservation_id)
            .await
            .map_err(|e| EngineError::Store(e.to_string()));
        metrics::histogram!(crate::observability::RANGE_CHECK_DURATION_SECONDS)
            .record(start.elapsed().as_secs_f64());

        let outcome = match &result {
            Ok(check) if check.available => "available",
            Ok(_) => "conflict",
            Err(_) => "error",
        };
        metrics::counter!(crate::observability::RANGE_CHECKS_TOTAL, "outcome" => outcome)
            .increment(1);
        result
    }

    /// Single-day form of [`AvailabilityEngine::is_range_available`]:
    /// whether the night starting on `date` is free.
    pub async fn is_day_available(
        &self,
        room_id: Ulid,
        date: NaiveDate,
    ) -> Result<bool, EngineError> {
        let range = StayRange::single_night(date)
            .ok_or(EngineError::LimitExceeded("date out of range"))?;
        let check = self
            .is_range_available(room_id, range.check_in, range.check_out, None)
            .await?;
        Ok(check.available)
    }

    /// Day fetch used by the month fill. Store failures resolve per the
    /// configured [`FetchErrorPolicy`] instead of propagating.
    pub(super) async fn fetch_day(
        &self,
        room_id: Ulid,
        date: NaiveDate,
    ) -> Result<DayAvailability, EngineError> {
        let range = StayRange::single_night(date)
            .ok_or(EngineError::LimitExceeded("date out of range"))?;
        match self
            .store
            .check_room_availability(room_id, range.check_in, range.check_out, None)
            .await
        {
            Ok(check) => Ok(DayAvailability {
                date,
                is_available: check.available,
                conflict_count: check.conflicts.len(),
            }),
            Err(e) => match self.on_fetch_error {
                FetchErrorPolicy::AssumeAvailable => {
                    tracing::warn!("day check failed for room {room_id} on {date}, assuming available: {e}");
                    metrics::counter!(
                        crate::observability::DAY_FETCH_FAILURES_TOTAL,
                        "policy" => "assume_available"
                    )
                    .increment(1);
                    Ok(DayAvailability {
                        date,
                        is_available: true,
                        conflict_count: 0,
                    })
                }
                FetchErrorPolicy::AssumeUnavailable => {
                    tracing::warn!("day check failed for room {room_id} on {date}, assuming unavailable: {e}");
                    metrics::counter!(
                        crate::observability::DAY_FETCH_FAILURES_TOTAL,
                        "policy" => "assume_unavailable"
                    )
                    .increment(1);
                    Ok(DayAvailability {
                        date,
                        is_available: false,
                        conflict_count: 0,
                    })
                }
                FetchErrorPolicy::Propagate => Err(EngineError::Store(e.to_string())),
            },
        }
    }
}

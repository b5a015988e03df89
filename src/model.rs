use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Half-open stay interval `[check_in, check_out)` at day granularity.
///
/// The guest occupies the nights `check_in..check_out`; the check-out day
/// itself is not occupied, so a new stay may begin on another stay's
/// check-out day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayRange {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl StayRange {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Self {
        debug_assert!(
            check_in < check_out,
            "StayRange check_in must be before check_out"
        );
        Self { check_in, check_out }
    }

    /// One-night range covering exactly `date`. `None` only at the end of
    /// the calendar (`NaiveDate::MAX`).
    pub fn single_night(date: NaiveDate) -> Option<Self> {
        date.succ_opt().map(|next| Self::new(date, next))
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }

    /// Whether the guest occupies the night starting on `date`.
    pub fn contains_night(&self, date: NaiveDate) -> bool {
        self.check_in <= date && date < self.check_out
    }
}

/// Reservation lifecycle. Bookings are never physically removed — a
/// cancellation is a status transition to `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
}

impl ReservationStatus {
    /// Every status except `Cancelled` holds the room.
    pub fn blocks_availability(&self) -> bool {
        !matches!(self, ReservationStatus::Cancelled)
    }
}

/// Where a reservation came from. Channel bookings are ingested from an
/// external channel manager and conflict exactly like direct ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationSource {
    Direct,
    Channel { channel: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Ulid,
    pub room_id: Ulid,
    pub range: StayRange,
    pub status: ReservationStatus,
    pub source: ReservationSource,
    pub guest_name: Option<String>,
}

impl Reservation {
    pub fn blocks(&self) -> bool {
        self.status.blocks_availability()
    }

    pub fn is_channel(&self) -> bool {
        matches!(self.source, ReservationSource::Channel { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: Ulid,
    pub property_id: Ulid,
    pub name: Option<String>,
}

// ── Query result types ───────────────────────────────────────────

/// Result of a room/range conflict check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeCheck {
    pub available: bool,
    pub conflicts: Vec<Reservation>,
}

impl RangeCheck {
    pub fn clear() -> Self {
        Self {
            available: true,
            conflicts: Vec::new(),
        }
    }
}

/// Derived, session-scoped fact: availability of one room on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub is_available: bool,
    pub conflict_count: usize,
}

/// Rooms free for a requested range, partitioned relative to the original
/// room's property. Same-property rooms come first; no further ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlternativeRooms {
    pub same_property: Vec<Room>,
    pub other_property: Vec<Room>,
}

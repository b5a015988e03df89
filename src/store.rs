use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use ulid::Ulid;

use crate::engine::{conflicting_reservations, range_check, validate_stay, EngineError};
use crate::model::*;

/// The remote conflict-check primitive the engine consumes.
///
/// Backed by the property-management backend in production. The engine
/// treats it as a black box that may fail or be slow, and tolerates both.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn check_room_availability(
        &self,
        room_id: Ulid,
        check_in: NaiveDate,
        check_out: NaiveDate,
        exclude_reservation_id: Option<Ulid>,
    ) -> Result<RangeCheck, StoreError>;
}

/// Store-boundary failure (network, backend, timeout).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError(pub String);

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for StoreError {}

/// In-memory reservation set keyed by room. Reference backend for tests
/// and single-node deployments; per-room lists stay sorted by check-in.
pub struct InMemoryReservationStore {
    by_room: DashMap<Ulid, Vec<Reservation>>,
    /// Reverse lookup: reservation id → room id.
    room_of: DashMap<Ulid, Ulid>,
}

impl Default for InMemoryReservationStore {
    fn default() -> Self {
        Self::new()
    }
}

fn insert_sorted(room: &mut Vec<Reservation>, reservation: Reservation) {
    let pos = room
        .binary_search_by_key(&reservation.range.check_in, |r| r.range.check_in)
        .unwrap_or_else(|e| e);
    room.insert(pos, reservation);
}

impl InMemoryReservationStore {
    pub fn new() -> Self {
        Self {
            by_room: DashMap::new(),
            room_of: DashMap::new(),
        }
    }

    // ── Mutations ────────────────────────────────────────────

    /// Authoritative submit-time insert: rejects any stay that conflicts
    /// with a blocking reservation already on the room. This is the check
    /// that backstops a fail-open calendar.
    pub fn commit(&self, reservation: Reservation) -> Result<(), EngineError> {
        validate_stay(&reservation)?;
        if self.room_of.contains_key(&reservation.id) {
            return Err(EngineError::AlreadyExists(reservation.id));
        }
        let mut room = self.by_room.entry(reservation.room_id).or_default();
        let conflicts = conflicting_reservations(&room, &reservation.range, None);
        if let Some(first) = conflicts.first() {
            return Err(EngineError::Conflict(first.id));
        }
        self.room_of.insert(reservation.id, reservation.room_id);
        insert_sorted(&mut room, reservation);
        Ok(())
    }

    /// Move a reservation to new dates. The reservation itself is excluded
    /// from the conflict check — an edit must not conflict with the stay
    /// being edited.
    pub fn reschedule(&self, id: Ulid, new_range: StayRange) -> Result<(), EngineError> {
        let room_id = self
            .room_of
            .get(&id)
            .map(|e| *e.value())
            .ok_or(EngineError::NotFound(id))?;
        let mut room = self
            .by_room
            .get_mut(&room_id)
            .ok_or(EngineError::NotFound(room_id))?;
        let pos = room
            .iter()
            .position(|r| r.id == id)
            .ok_or(EngineError::NotFound(id))?;

        let mut updated = room[pos].clone();
        updated.range = new_range;
        validate_stay(&updated)?;

        let conflicts = conflicting_reservations(&room, &new_range, Some(id));
        if let Some(first) = conflicts.first() {
            return Err(EngineError::Conflict(first.id));
        }

        room.remove(pos);
        insert_sorted(&mut room, updated);
        Ok(())
    }

    pub fn set_status(&self, id: Ulid, status: ReservationStatus) -> Result<(), EngineError> {
        let room_id = self
            .room_of
            .get(&id)
            .map(|e| *e.value())
            .ok_or(EngineError::NotFound(id))?;
        let mut room = self
            .by_room
            .get_mut(&room_id)
            .ok_or(EngineError::NotFound(room_id))?;
        let reservation = room
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(EngineError::NotFound(id))?;
        reservation.status = status;
        Ok(())
    }

    /// Cancelled reservations stay in the set — they stop blocking, they
    /// are not removed.
    pub fn cancel(&self, id: Ulid) -> Result<(), EngineError> {
        self.set_status(id, ReservationStatus::Cancelled)
    }

    /// Replace one channel's bookings for a room with a fresh snapshot
    /// from the channel manager. The channel is authoritative for its own
    /// bookings, so no conflict check is applied here.
    pub fn sync_channel(
        &self,
        room_id: Ulid,
        channel: &str,
        bookings: Vec<Reservation>,
    ) -> Result<(), EngineError> {
        for booking in &bookings {
            validate_stay(booking)?;
        }
        let mut room = self.by_room.entry(room_id).or_default();
        let from_this_channel = |r: &Reservation| {
            matches!(&r.source, ReservationSource::Channel { channel: c } if c == channel)
        };
        for old in room.iter().filter(|r| from_this_channel(r)) {
            self.room_of.remove(&old.id);
        }
        room.retain(|r| !from_this_channel(r));
        for mut booking in bookings {
            booking.room_id = room_id;
            booking.source = ReservationSource::Channel {
                channel: channel.to_string(),
            };
            self.room_of.insert(booking.id, room_id);
            insert_sorted(&mut room, booking);
        }
        Ok(())
    }

    /// Insert without the submit-time conflict check. Seed/test path.
    pub fn insert_unchecked(&self, reservation: Reservation) {
        self.room_of.insert(reservation.id, reservation.room_id);
        let mut room = self.by_room.entry(reservation.room_id).or_default();
        insert_sorted(&mut room, reservation);
    }

    // ── Queries ──────────────────────────────────────────────

    pub fn get(&self, id: &Ulid) -> Option<Reservation> {
        let room_id = self.room_of.get(id).map(|e| *e.value())?;
        self.by_room
            .get(&room_id)
            .and_then(|room| room.iter().find(|r| r.id == *id).cloned())
    }

    pub fn reservations_for_room(&self, room_id: &Ulid) -> Vec<Reservation> {
        self.by_room
            .get(room_id)
            .map(|room| room.value().clone())
            .unwrap_or_default()
    }

    pub fn reservation_count(&self) -> usize {
        self.room_of.len()
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn check_room_availability(
        &self,
        room_id: Ulid,
        check_in: NaiveDate,
        check_out: NaiveDate,
        exclude_reservation_id: Option<Ulid>,
    ) -> Result<RangeCheck, StoreError> {
        let range = StayRange::new(check_in, check_out);
        Ok(match self.by_room.get(&room_id) {
            Some(room) => range_check(&room, &range, exclude_reservation_id),
            None => RangeCheck::clear(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn booking(room_id: Ulid, check_in: NaiveDate, check_out: NaiveDate) -> Reservation {
        Reservation {
            id: Ulid::new(),
            room_id,
            range: StayRange::new(check_in, check_out),
            status: ReservationStatus::Confirmed,
            source: ReservationSource::Direct,
            guest_name: Some("Guest".into()),
        }
    }

    #[test]
    fn commit_then_conflicting_commit_rejected() {
        let store = InMemoryReservationStore::new();
        let room = Ulid::new();
        let first = booking(room, d(2025, 9, 10), d(2025, 9, 15));
        let first_id = first.id;
        store.commit(first).unwrap();

        let overlapping = booking(room, d(2025, 9, 14), d(2025, 9, 16));
        let err = store.commit(overlapping).unwrap_err();
        assert!(matches!(err, EngineError::Conflict(id) if id == first_id));
    }

    #[test]
    fn commit_back_to_back_allowed() {
        let store = InMemoryReservationStore::new();
        let room = Ulid::new();
        store.commit(booking(room, d(2025, 9, 10), d(2025, 9, 15))).unwrap();
        store.commit(booking(room, d(2025, 9, 15), d(2025, 9, 18))).unwrap();
        store.commit(booking(room, d(2025, 9, 1), d(2025, 9, 10))).unwrap();
        assert_eq!(store.reservation_count(), 3);
    }

    #[test]
    fn commit_duplicate_id_rejected() {
        let store = InMemoryReservationStore::new();
        let room = Ulid::new();
        let r = booking(room, d(2025, 9, 10), d(2025, 9, 15));
        store.commit(r.clone()).unwrap();
        let mut again = r;
        again.range = StayRange::new(d(2025, 10, 1), d(2025, 10, 5));
        assert!(matches!(
            store.commit(again),
            Err(EngineError::AlreadyExists(_))
        ));
    }

    #[test]
    fn cancel_frees_the_dates_without_removal() {
        let store = InMemoryReservationStore::new();
        let room = Ulid::new();
        let r = booking(room, d(2025, 9, 10), d(2025, 9, 15));
        let id = r.id;
        store.commit(r).unwrap();
        store.cancel(id).unwrap();

        // Same dates are bookable again
        store.commit(booking(room, d(2025, 9, 10), d(2025, 9, 15))).unwrap();
        // The cancelled reservation is still in the set
        assert_eq!(store.get(&id).unwrap().status, ReservationStatus::Cancelled);
        assert_eq!(store.reservations_for_room(&room).len(), 2);
    }

    #[test]
    fn reschedule_does_not_conflict_with_itself() {
        let store = InMemoryReservationStore::new();
        let room = Ulid::new();
        let r = booking(room, d(2025, 9, 10), d(2025, 9, 15));
        let id = r.id;
        store.commit(r).unwrap();

        // Shift by one day — overlaps the old dates, which must not matter
        store.reschedule(id, StayRange::new(d(2025, 9, 11), d(2025, 9, 16))).unwrap();
        assert_eq!(store.get(&id).unwrap().range.check_in, d(2025, 9, 11));
    }

    #[test]
    fn reschedule_into_other_reservation_rejected() {
        let store = InMemoryReservationStore::new();
        let room = Ulid::new();
        let a = booking(room, d(2025, 9, 1), d(2025, 9, 5));
        let b = booking(room, d(2025, 9, 10), d(2025, 9, 15));
        let a_id = a.id;
        let b_id = b.id;
        store.commit(a).unwrap();
        store.commit(b).unwrap();

        let err = store
            .reschedule(a_id, StayRange::new(d(2025, 9, 12), d(2025, 9, 14)))
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(id) if id == b_id));
    }

    #[test]
    fn reschedule_unknown_id_not_found() {
        let store = InMemoryReservationStore::new();
        assert!(matches!(
            store.reschedule(Ulid::new(), StayRange::new(d(2025, 9, 1), d(2025, 9, 2))),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn sync_channel_replaces_only_that_channel() {
        let store = InMemoryReservationStore::new();
        let room = Ulid::new();
        let direct = booking(room, d(2025, 9, 1), d(2025, 9, 3));
        let direct_id = direct.id;
        store.commit(direct).unwrap();

        let first_sync = vec![booking(room, d(2025, 9, 10), d(2025, 9, 12))];
        let stale_id = first_sync[0].id;
        store.sync_channel(room, "booking.com", first_sync).unwrap();

        let second_sync = vec![
            booking(room, d(2025, 9, 20), d(2025, 9, 22)),
            booking(room, d(2025, 9, 25), d(2025, 9, 27)),
        ];
        store.sync_channel(room, "booking.com", second_sync).unwrap();

        let on_room = store.reservations_for_room(&room);
        assert_eq!(on_room.len(), 3); // direct + 2 fresh channel bookings
        assert!(on_room.iter().any(|r| r.id == direct_id));
        assert!(on_room.iter().all(|r| r.id != stale_id));
        assert!(store.get(&stale_id).is_none());
    }

    #[test]
    fn check_room_availability_matches_pure_scan() {
        let store = InMemoryReservationStore::new();
        let room = Ulid::new();
        store.commit(booking(room, d(2025, 9, 10), d(2025, 9, 15))).unwrap();

        let check = tokio_test::block_on(store.check_room_availability(
            room,
            d(2025, 9, 14),
            d(2025, 9, 16),
            None,
        ))
        .unwrap();
        assert!(!check.available);
        assert_eq!(check.conflicts.len(), 1);

        let clear = tokio_test::block_on(store.check_room_availability(
            room,
            d(2025, 9, 15),
            d(2025, 9, 18),
            None,
        ))
        .unwrap();
        assert!(clear.available);
    }

    #[test]
    fn unknown_room_is_clear() {
        let store = InMemoryReservationStore::new();
        let check = tokio_test::block_on(store.check_room_availability(
            Ulid::new(),
            d(2025, 9, 1),
            d(2025, 9, 2),
            None,
        ))
        .unwrap();
        assert_eq!(check, RangeCheck::clear());
    }
}

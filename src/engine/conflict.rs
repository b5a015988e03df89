use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::EngineError;

// ── Conflict detection ───────────────────────────────────────────

/// Collect the reservations holding the room for some night of `range`.
///
/// A reservation `[s, e)` conflicts with `[check_in, check_out)` iff
/// `s < check_out && e > check_in` (half-open overlap). Cancelled
/// reservations never conflict. `exclude` removes one reservation from
/// consideration — a reservation being edited must not conflict with
/// itself.
pub fn conflicting_reservations(
    reservations: &[Reservation],
    range: &StayRange,
    exclude: Option<Ulid>,
) -> Vec<Reservation> {
    reservations
        .iter()
        .filter(|r| r.blocks())
        .filter(|r| exclude != Some(r.id))
        .filter(|r| r.range.overlaps(range))
        .cloned()
        .collect()
}

/// Conflict check over a reservation snapshot as a [`RangeCheck`].
/// Deterministic and side-effect free.
pub fn range_check(
    reservations: &[Reservation],
    range: &StayRange,
    exclude: Option<Ulid>,
) -> RangeCheck {
    let conflicts = conflicting_reservations(reservations, range, exclude);
    RangeCheck {
        available: conflicts.is_empty(),
        conflicts,
    }
}

pub(crate) fn validate_stay(reservation: &Reservation) -> Result<(), EngineError> {
    if reservation.range.nights() > MAX_STAY_NIGHTS {
        return Err(EngineError::LimitExceeded("stay too long"));
    }
    if let Some(ref name) = reservation.guest_name
        && name.len() > MAX_GUEST_NAME_LEN {
            return Err(EngineError::LimitExceeded("guest name too long"));
        }
    Ok(())
}

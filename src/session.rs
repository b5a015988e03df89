use std::sync::atomic::{AtomicU64, Ordering};

use ulid::Ulid;

use crate::engine::AvailabilityCache;

/// Tracks which room one date-picker session is currently looking at.
///
/// A month fill that resolves after the user has switched rooms must not
/// be merged into the new room's view. Callers take a token via
/// [`PickerSession::switch_to`] before starting a fill and hand the
/// resolved result to [`PickerSession::adopt`]; a stale token leaves the
/// previous cache in place.
#[derive(Debug, Default)]
pub struct PickerSession {
    generation: AtomicU64,
}

/// Proof of which focus a fill was started under. Invalidated by the next
/// `switch_to` on the session that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionToken {
    room_id: Ulid,
    generation: u64,
}

impl SessionToken {
    pub fn room_id(&self) -> Ulid {
        self.room_id
    }
}

impl PickerSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Focus the session on a room. Every previously issued token becomes
    /// stale.
    pub fn switch_to(&self, room_id: Ulid) -> SessionToken {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        SessionToken { room_id, generation }
    }

    pub fn is_current(&self, token: &SessionToken) -> bool {
        self.generation.load(Ordering::SeqCst) == token.generation
    }

    /// Keep `fresh` when the token is still current, otherwise discard it
    /// and keep `previous`.
    pub fn adopt(
        &self,
        token: &SessionToken,
        previous: AvailabilityCache,
        fresh: AvailabilityCache,
    ) -> AvailabilityCache {
        if self.is_current(token) {
            fresh
        } else {
            tracing::debug!("discarding stale month fill for room {}", token.room_id);
            metrics::counter!(crate::observability::STALE_FILLS_DISCARDED_TOTAL).increment(1);
            previous
        }
    }
}

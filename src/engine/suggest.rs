use chrono::NaiveDate;
use futures::future::join_all;

use crate::limits::*;
use crate::model::*;

use super::{AvailabilityEngine, EngineError};

impl AvailabilityEngine {
    /// Rooms from `candidates` that are free for `[check_in, check_out)`,
    /// partitioned by property relative to `original`.
    ///
    /// The original room is never suggested. A candidate is included only
    /// when its availability check positively succeeded — a room whose
    /// check errored is omitted rather than suggested unverified. Within
    /// each partition candidates keep their input order; no price or
    /// rating ranking is applied.
    pub async fn suggest_alternatives(
        &self,
        original: &Room,
        check_in: NaiveDate,
        check_out: NaiveDate,
        candidates: &[Room],
    ) -> Result<AlternativeRooms, EngineError> {
        if candidates.len() > MAX_CANDIDATE_ROOMS {
            return Err(EngineError::LimitExceeded("too many candidate rooms"));
        }

        let checks = join_all(
            candidates
                .iter()
                .filter(|room| room.id != original.id)
                .map(|room| async move {
                    let check = self
                        .is_range_available(room.id, check_in, check_out, None)
                        .await;
                    (room, check)
                }),
        )
        .await;

        let mut result = AlternativeRooms::default();
        for (room, check) in checks {
            match check {
                Ok(rc) if rc.available => {
                    if room.property_id == original.property_id {
                        result.same_property.push(room.clone());
                    } else {
                        result.other_property.push(room.clone());
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("skipping candidate room {}: {e}", room.id);
                }
            }
        }

        metrics::counter!(crate::observability::ALTERNATIVE_SUGGESTIONS_TOTAL)
            .increment((result.same_property.len() + result.other_property.len()) as u64);
        Ok(result)
    }
}

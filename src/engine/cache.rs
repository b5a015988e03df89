use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use futures::future::join_all;
use ulid::Ulid;

use crate::limits::*;
use crate::model::DayAvailability;

use super::{AvailabilityEngine, EngineError};

/// Session-scoped cache of per-day availability, keyed by `(room, date)`.
///
/// Owned by the picker session that built it; never shared across rooms,
/// users, or page loads. An entry, once written, is authoritative for the
/// session. The fill path merges into a clone and returns the clone — the
/// input cache is never mutated, so a reader of the old value stays valid
/// while a fill is in flight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvailabilityCache {
    entries: HashMap<(Ulid, NaiveDate), DayAvailability>,
}

impl AvailabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, room_id: Ulid, date: NaiveDate) -> Option<&DayAvailability> {
        self.entries.get(&(room_id, date))
    }

    pub fn contains(&self, room_id: Ulid, date: NaiveDate) -> bool {
        self.entries.contains_key(&(room_id, date))
    }

    pub fn insert(&mut self, room_id: Ulid, day: DayAvailability) {
        self.entries.insert((room_id, day.date), day);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All days of `month` in `year`, in order. Empty for an invalid month.
pub fn month_days(year: i32, month: u32) -> Vec<NaiveDate> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    let mut days = Vec::with_capacity(31);
    let mut d = first;
    while d.month() == month && d.year() == year {
        days.push(d);
        match d.succ_opt() {
            Some(next) => d = next,
            None => break,
        }
    }
    days
}

/// Days of the month a picker can still book: today or later. Past days
/// are never queried.
fn bookable_days(year: i32, month: u32, today: NaiveDate) -> Vec<NaiveDate> {
    month_days(year, month)
        .into_iter()
        .filter(|d| *d >= today)
        .collect()
}

impl AvailabilityEngine {
    /// Fill `cache` with per-day availability for every still-bookable day
    /// of the month, and return the merged copy.
    ///
    /// Already-cached days are not re-fetched, and when at least
    /// [`CACHE_SKIP_RATIO`] of the month's bookable days is cached the fill
    /// is skipped entirely and the input comes back unchanged. Callers must
    /// not assume freshness after this call — the cache trades staleness
    /// within one picker session for not re-querying on every render.
    ///
    /// Missing days are fetched in batches of [`DAY_FETCH_BATCH_SIZE`], all
    /// batches in flight at once. Per-day failures resolve through the
    /// engine's [`FetchErrorPolicy`](super::FetchErrorPolicy); completion
    /// order cannot corrupt the merge since each day is keyed by its own
    /// date.
    pub async fn populate_month_cache(
        &self,
        room_id: Ulid,
        year: i32,
        month: u32,
        today: NaiveDate,
        cache: &AvailabilityCache,
    ) -> Result<AvailabilityCache, EngineError> {
        let wanted = bookable_days(year, month, today);
        if wanted.is_empty() {
            return Ok(cache.clone());
        }

        let missing: Vec<NaiveDate> = wanted
            .iter()
            .copied()
            .filter(|d| !cache.contains(room_id, *d))
            .collect();
        let cached = wanted.len() - missing.len();
        if cached as f64 / wanted.len() as f64 >= CACHE_SKIP_RATIO {
            tracing::debug!(
                "month fill skipped for room {room_id} {year}-{month:02}: {cached}/{} days cached",
                wanted.len()
            );
            metrics::counter!(crate::observability::CACHE_FILLS_SKIPPED_TOTAL).increment(1);
            return Ok(cache.clone());
        }

        let batches = missing.chunks(DAY_FETCH_BATCH_SIZE).map(|chunk| {
            let days = chunk.to_vec();
            async move { join_all(days.into_iter().map(|d| self.fetch_day(room_id, d))).await }
        });
        let settled = join_all(batches).await;

        let mut merged = cache.clone();
        let mut filled = 0usize;
        for fetched in settled.into_iter().flatten() {
            let day = fetched?;
            merged.insert(room_id, day);
            filled += 1;
        }
        metrics::histogram!(crate::observability::CACHE_FILL_DAYS).record(filled as f64);
        Ok(merged)
    }
}

//! Hard limits enforced at engine and store entry points.

/// Widest allowed conflict-check window, in days.
pub const MAX_QUERY_WINDOW_DAYS: i64 = 366;

/// Longest allowed stay, in nights.
pub const MAX_STAY_NIGHTS: i64 = 90;

/// Maximum candidate rooms per alternatives query.
pub const MAX_CANDIDATE_ROOMS: usize = 512;

pub const MAX_GUEST_NAME_LEN: usize = 256;

/// Days per remote fetch batch during a month fill.
pub const DAY_FETCH_BATCH_SIZE: usize = 5;

/// Skip a month fill when at least this share of its bookable days is
/// already cached. A latency trade-off, not a freshness guarantee.
pub const CACHE_SKIP_RATIO: f64 = 0.8;

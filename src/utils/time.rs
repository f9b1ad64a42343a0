use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Whole seconds between two instants, floored. `None` when either end is
/// missing or the interval runs backwards.
pub fn elapsed_seconds(
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
) -> Option<i64> {
    let millis = (finished_at? - started_at?).num_milliseconds();
    if millis < 0 {
        return None;
    }
    Some(millis.div_euclid(1000))
}

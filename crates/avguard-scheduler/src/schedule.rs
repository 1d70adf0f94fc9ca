use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};

use crate::types::Schedule;

/// Compute the next UTC firing time for `schedule` strictly after `from`.
///
/// Both variants are recurring, so there is always a next run.
pub fn compute_next_run(schedule: &Schedule, from: DateTime<Utc>) -> DateTime<Utc> {
    match schedule {
        Schedule::Interval { every_secs } => from + Duration::seconds(*every_secs as i64),

        Schedule::Daily { hour, minute } => {
            // Today's candidate at HH:MM:00 UTC. Out-of-range hour/minute
            // values clamp rather than skipping the job entirely.
            let hour = (*hour).min(23) as u32;
            let minute = (*minute).min(59) as u32;
            let candidate = Utc
                .with_ymd_and_hms(from.year(), from.month(), from.day(), hour, minute, 0)
                .single()
                // Jan 1 00:00 of any year is always a valid UTC instant, so
                // with_ymd_and_hms on an existing date never returns None.
                .unwrap_or(from);
            if candidate > from {
                candidate
            } else {
                // Today's window has passed; fire tomorrow.
                candidate + Duration::days(1)
            }
        }
    }
}

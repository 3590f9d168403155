//! When to poll for a new picture.

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::America::New_York;

/// New pictures appear shortly after midnight US/Eastern. Polling is
/// only useful for the first couple of hours after that.
const PUBLICATION_WINDOW_HOURS: u32 = 2;

/// True if `now` falls inside the nightly publication window.
///
/// The window follows US/Eastern wall-clock time, so it stays aligned
/// with the publisher across daylight-saving transitions.
pub fn in_publication_window(now: DateTime<Utc>) -> bool {
    now.with_timezone(&New_York).hour() < PUBLICATION_WINDOW_HOURS
}

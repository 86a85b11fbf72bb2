//! age.rs
//!
//! How long ago a repository was last pushed, in whole days.
//!
//! Days are floored, so a push 30 days and 23 hours ago is 30 days old and
//! still counts as active. A push timestamp slightly in the future (clock
//! skew between host and runner) comes out negative and also counts.

use crate::stats::Repository;
use chrono::{DateTime, Utc};

/// A repository pushed within this many days counts as active.
pub const ACTIVE_WINDOW_DAYS: i64 = 30;

const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days from `then` to `now`, rounded toward negative infinity.
pub fn days_since(then: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - then).num_seconds().div_euclid(SECONDS_PER_DAY)
}

pub fn is_active(pushed_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    pushed_at.is_some_and(|t| days_since(t, now) <= ACTIVE_WINDOW_DAYS)
}

/// Number of repositories pushed within the active window.
pub fn count_active(repos: &[Repository], now: DateTime<Utc>) -> usize {
    repos.iter().filter(|r| is_active(r.pushed_at, now)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::pushed_repo;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap()
    }

    #[test]
    fn days_are_floored() {
        let n = now();
        assert_eq!(days_since(n - Duration::hours(23), n), 0);
        assert_eq!(days_since(n - Duration::hours(25), n), 1);
        assert_eq!(days_since(n + Duration::hours(1), n), -1);
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let n = now();
        assert!(is_active(Some(n - Duration::days(30) - Duration::hours(23)), n));
        assert!(!is_active(Some(n - Duration::days(31)), n));
        assert!(!is_active(None, n));
    }

    #[test]
    fn counts_active_repos_and_skips_missing_push_dates() {
        let repos = vec![
            pushed_repo("fresh", Some("2024-03-30T08:00:00Z")),
            pushed_repo("month", Some("2024-03-02T12:00:00Z")),
            pushed_repo("stale", Some("2023-12-01T00:00:00Z")),
            pushed_repo("empty", None),
        ];
        assert_eq!(count_active(&repos, now()), 2);
    }
}

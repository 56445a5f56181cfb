use chrono::{Duration as TimeDelta, NaiveDateTime, NaiveTime};
use std::time::Duration;

/// The daily collection window: opens at `start` and stays open for `length`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyWindow {
    start: NaiveTime,
    length: TimeDelta,
}

impl DailyWindow {
    pub fn new(start: NaiveTime, length: Duration) -> Self {
        Self {
            start,
            length: TimeDelta::from_std(length).unwrap_or_else(|_| TimeDelta::days(1)),
        }
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    /// Next opening at or after `now`. Once today's start has passed, the
    /// next opening is tomorrow, even if today's window is still open.
    pub fn next_start(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().and_time(self.start);
        if now > today {
            today + TimeDelta::days(1)
        } else {
            today
        }
    }

    /// Next opening once the window that opened at `previous` has closed.
    /// A window that closes at or after the following day's opening hands
    /// straight over to it, even though the clock is already past that
    /// opening by the time the close is observed.
    pub fn next_start_after(&self, previous: NaiveDateTime, now: NaiveDateTime) -> NaiveDateTime {
        let following = previous + TimeDelta::days(1);
        if self.end_for(previous) >= following && now < self.end_for(following) {
            following
        } else {
            self.next_start(now)
        }
    }

    pub fn end_for(&self, start: NaiveDateTime) -> NaiveDateTime {
        start + self.length
    }

    /// Start and end of the window containing `now`, if one is open. Checks
    /// yesterday's opening too, for windows that run past midnight.
    pub fn open_window(&self, now: NaiveDateTime) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let today = now.date().and_time(self.start);
        [today - TimeDelta::days(1), today]
            .into_iter()
            .map(|start| (start, self.end_for(start)))
            .find(|(start, end)| *start <= now && now < *end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 10, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn six_to_ten() -> DailyWindow {
        DailyWindow::new(
            NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            Duration::from_secs(4 * 3600),
        )
    }

    #[test]
    fn test_next_start_same_day() {
        assert_eq!(six_to_ten().next_start(at(25, 2, 30)), at(25, 6, 0));
        assert_eq!(six_to_ten().next_start(at(25, 6, 0)), at(25, 6, 0));
    }

    #[test]
    fn test_next_start_rolls_to_tomorrow() {
        assert_eq!(six_to_ten().next_start(at(25, 6, 1)), at(26, 6, 0));
        assert_eq!(six_to_ten().next_start(at(25, 10, 5)), at(26, 6, 0));
    }

    #[test]
    fn test_next_start_crosses_month() {
        let now = NaiveDate::from_ymd_opt(2021, 10, 31)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let expected = NaiveDate::from_ymd_opt(2021, 11, 1)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        assert_eq!(six_to_ten().next_start(now), expected);
    }

    #[test]
    fn test_end_for() {
        assert_eq!(six_to_ten().end_for(at(25, 6, 0)), at(25, 10, 0));
    }

    #[test]
    fn test_open_window() {
        let window = six_to_ten();
        assert_eq!(window.open_window(at(25, 5, 59)), None);
        assert_eq!(
            window.open_window(at(25, 6, 0)),
            Some((at(25, 6, 0), at(25, 10, 0)))
        );
        assert_eq!(
            window.open_window(at(25, 9, 59)),
            Some((at(25, 6, 0), at(25, 10, 0)))
        );
        assert_eq!(window.open_window(at(25, 10, 0)), None);
    }

    #[test]
    fn test_open_window_past_midnight() {
        let window = DailyWindow::new(
            NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            Duration::from_secs(4 * 3600),
        );
        assert_eq!(
            window.open_window(at(26, 1, 0)),
            Some((at(25, 22, 0), at(26, 2, 0)))
        );
        assert_eq!(window.open_window(at(26, 3, 0)), None);
    }

    #[test]
    fn test_next_start_after_short_window() {
        let window = six_to_ten();
        assert_eq!(window.next_start_after(at(25, 6, 0), at(25, 10, 1)), at(26, 6, 0));
        // A stalled process still skips to the next opening it can wait for.
        assert_eq!(window.next_start_after(at(25, 6, 0), at(26, 7, 0)), at(27, 6, 0));
    }

    #[test]
    fn test_next_start_after_full_day_window() {
        let window = DailyWindow::new(
            NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            Duration::from_secs(24 * 3600),
        );
        let late = at(26, 6, 0) + TimeDelta::milliseconds(1);
        assert_eq!(window.next_start(late), at(27, 6, 0));
        assert_eq!(window.next_start_after(at(25, 6, 0), late), at(26, 6, 0));
        assert_eq!(window.next_start_after(at(25, 6, 0), at(27, 7, 0)), at(28, 6, 0));
    }
}

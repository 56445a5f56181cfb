use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use std::time::Duration;

/// Wall-clock time and suspension, injectable so schedules can be simulated.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Local wall-clock time.
    fn now(&self) -> NaiveDateTime;
    async fn sleep(&self, duration: Duration);
}

pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Non-negative time left until `target`.
pub fn until(now: NaiveDateTime, target: NaiveDateTime) -> Duration {
    (target - now).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
pub use manual::ManualClock;


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 10, 25)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_until_is_never_negative() {
        assert_eq!(until(at(6, 0), at(6, 10)), Duration::from_secs(600));
        assert_eq!(until(at(6, 10), at(6, 0)), Duration::ZERO);
        assert_eq!(until(at(6, 0), at(6, 0)), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_manual_clock_advances_on_sleep() {
        let clock = ManualClock::new(at(5, 0));
        clock.sleep(Duration::from_secs(3600)).await;
        assert_eq!(clock.now(), at(6, 0));
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(3600)]);
    }
}

//! Polling scheduler for the daily alert
//!
//! Samples the clock at a fixed cadence and runs the job when the local
//! time matches the trigger's hour and minute. After firing it sleeps for a
//! guard interval so the same minute does not fire twice. There is no
//! catch-up: a missed minute is simply skipped.

use crate::clock::Clock;
use crate::config::ScheduleConfig;
use chrono::{NaiveDateTime, Timelike};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Local time of day at which the alert fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyTrigger {
    pub hour: u32,
    pub minute: u32,
}

impl DailyTrigger {
    #[must_use]
    pub fn new(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }

    #[must_use]
    pub fn matches(&self, now: NaiveDateTime) -> bool {
        now.hour() == self.hour && now.minute() == self.minute
    }
}

pub struct PollingScheduler {
    trigger: DailyTrigger,
    poll_interval: Duration,
    guard: Duration,
    clock: Arc<dyn Clock>,
}

impl PollingScheduler {
    pub fn new(
        trigger: DailyTrigger,
        poll_interval: Duration,
        guard: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            trigger,
            poll_interval,
            guard,
            clock,
        }
    }

    pub fn from_config(config: &ScheduleConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            DailyTrigger::new(config.hour, config.minute),
            config.poll_interval(),
            config.guard(),
            clock,
        )
    }

    /// Poll until `token` is cancelled, returning how many times the job ran
    pub async fn run<F, Fut>(&self, token: &CancellationToken, mut job: F) -> u64
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        info!(
            "Waiting for daily trigger at {:02}:{:02} (polling every {}s)",
            self.trigger.hour,
            self.trigger.minute,
            self.poll_interval.as_secs()
        );

        let mut fired = 0;
        loop {
            if token.is_cancelled() {
                break;
            }

            let now = self.clock.now();
            if self.trigger.matches(now) {
                info!("Daily trigger reached at {}", now.format("%Y-%m-%d %H:%M:%S"));
                job().await;
                fired += 1;

                if !self.pause(token, self.guard).await {
                    break;
                }
            }

            if !self.pause(token, self.poll_interval).await {
                break;
            }
        }

        debug!("Polling stopped after {} runs", fired);
        fired
    }

    /// Sleep unless cancelled first; `false` means stop
    async fn pause(&self, token: &CancellationToken, duration: Duration) -> bool {
        tokio::select! {
            () = token.cancelled() => false,
            () = self.clock.sleep(duration) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimulatedClock;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    fn at(day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    /// Runs the scheduler over simulated time, returning when each run happened
    async fn simulate(start: NaiveDateTime, stop: NaiveDateTime) -> Vec<NaiveDateTime> {
        let token = CancellationToken::new();
        let clock = Arc::new(SimulatedClock::starting_at(start));
        clock.cancel_at(stop, token.clone());

        let scheduler = PollingScheduler::new(
            DailyTrigger::new(8, 0),
            Duration::from_secs(30),
            Duration::from_secs(60),
            clock.clone(),
        );

        let runs = Arc::new(Mutex::new(Vec::new()));
        let fired = scheduler
            .run(&token, || {
                let runs = Arc::clone(&runs);
                let clock = Arc::clone(&clock);
                async move {
                    runs.lock().unwrap().push(clock.now());
                }
            })
            .await;

        let runs = runs.lock().unwrap().clone();
        assert_eq!(fired, runs.len() as u64);
        runs
    }

    #[test]
    fn test_trigger_matches_hour_and_minute_only() {
        let trigger = DailyTrigger::new(8, 0);
        assert!(trigger.matches(at(1, 8, 0, 0)));
        assert!(trigger.matches(at(1, 8, 0, 59)));
        assert!(!trigger.matches(at(1, 8, 1, 0)));
        assert!(!trigger.matches(at(1, 20, 0, 0)));
    }

    #[tokio::test]
    async fn test_fires_once_in_matching_minute() {
        let runs = simulate(at(1, 7, 58, 0), at(1, 8, 10, 0)).await;
        assert_eq!(runs, vec![at(1, 8, 0, 0)]);
    }

    #[tokio::test]
    async fn test_fires_once_when_first_sample_is_late_in_minute() {
        let runs = simulate(at(1, 7, 59, 59), at(1, 8, 10, 0)).await;
        assert_eq!(runs, vec![at(1, 8, 0, 29)]);
    }

    #[tokio::test]
    async fn test_fires_once_per_day() {
        let runs = simulate(at(1, 6, 0, 0), at(3, 9, 0, 0)).await;
        assert_eq!(
            runs,
            vec![at(1, 8, 0, 0), at(2, 8, 0, 0), at(3, 8, 0, 0)]
        );
    }

    #[tokio::test]
    async fn test_no_catch_up_after_missed_minute() {
        let runs = simulate(at(1, 8, 1, 0), at(1, 12, 0, 0)).await;
        assert!(runs.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_immediately() {
        let token = CancellationToken::new();
        token.cancel();
        let clock = Arc::new(SimulatedClock::starting_at(at(1, 8, 0, 0)));
        let scheduler = PollingScheduler::new(
            DailyTrigger::new(8, 0),
            Duration::from_secs(30),
            Duration::from_secs(60),
            clock,
        );

        let fired = scheduler.run(&token, || async {}).await;
        assert_eq!(fired, 0);
    }
}

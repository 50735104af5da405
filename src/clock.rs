//! Wall-clock access for message timestamps and the polling loop

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Source of local time and of sleeping
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current local date and time
    fn now(&self) -> NaiveDateTime;

    /// Suspend for the given duration
    async fn sleep(&self, duration: Duration);
}

/// The machine's local clock
#[derive(Debug, Default, Clone, Copy)]
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

/// Clock whose sleeps advance time instantly, for driving the scheduler in tests
#[derive(Debug)]
pub struct SimulatedClock {
    now: Mutex<NaiveDateTime>,
    deadline: Mutex<Option<(NaiveDateTime, CancellationToken)>>,
}

impl SimulatedClock {
    #[must_use]
    pub fn starting_at(start: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(start),
            deadline: Mutex::new(None),
        }
    }

    /// Cancel `token` as soon as simulated time reaches `at`
    pub fn cancel_at(&self, at: NaiveDateTime, token: CancellationToken) {
        *self.deadline.lock().unwrap_or_else(PoisonError::into_inner) = Some((at, token));
    }

    pub fn advance(&self, duration: Duration) {
        let now = {
            let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
            *now += chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero());
            *now
        };

        if let Some((at, token)) = &*self.deadline.lock().unwrap_or_else(PoisonError::into_inner) {
            if now >= *at {
                token.cancel();
            }
        }
    }
}

#[async_trait]
impl Clock for SimulatedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
        tokio::task::yield_now().await;
    }
}

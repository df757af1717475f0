//! Sliding-window call admission shared by concurrent callers

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

const WINDOW: Duration = Duration::from_secs(1);

/// Caps the calls admitted to a backend per rolling one-second window.
///
/// Callers over the limit suspend until the oldest admission ages out of
/// the window; calls are never dropped. Admission state is shared by all
/// concurrent callers on one connector and mutated under a mutex.
#[derive(Debug)]
pub struct RateLimiter {
    max_per_second: Option<u32>,
    admissions: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Limiter admitting at most `max_per_second` calls per window.
    /// `None` or zero disables limiting.
    pub fn new(max_per_second: Option<u32>) -> Self {
        Self {
            max_per_second: max_per_second.filter(|&rate| rate > 0),
            admissions: Mutex::new(VecDeque::new()),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(None)
    }

    /// Suspend until this call may enter the backend.
    pub async fn acquire(&self) {
        let Some(limit) = self.max_per_second else {
            return;
        };

        loop {
            let wait = {
                let mut admissions = self.admissions.lock();
                let now = Instant::now();
                while admissions
                    .front()
                    .is_some_and(|&t| now.duration_since(t) >= WINDOW)
                {
                    admissions.pop_front();
                }

                if (admissions.len() as u32) < limit {
                    admissions.push_back(now);
                    None
                } else {
                    // A slot frees up when the oldest admission leaves the window.
                    admissions.front().map(|&t| WINDOW - now.duration_since(t))
                }
            };

            match wait {
                None => return,
                Some(delay) => tokio::time::sleep(delay).await,
            }
        }
    }
}

//! Rate limiter admission tests

use connector_gateway::connector::RateLimiter;
use futures::future::join_all;
use std::sync::{Arc, Mutex};
use tokio::time::{Duration, Instant};

#[tokio::test(start_paused = true)]
async fn admissions_stay_within_the_rolling_window() {
    let limiter = Arc::new(RateLimiter::new(Some(3)));
    let admissions = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let limiter = limiter.clone();
            let admissions = admissions.clone();
            tokio::spawn(async move {
                limiter.acquire().await;
                admissions.lock().unwrap().push(Instant::now());
            })
        })
        .collect();
    for result in join_all(handles).await {
        result.unwrap();
    }

    let admissions = admissions.lock().unwrap();
    assert_eq!(admissions.len(), 10);

    for (i, &start) in admissions.iter().enumerate() {
        let in_window = admissions
            .iter()
            .filter(|&&t| t >= start && t.duration_since(start) < Duration::from_secs(1))
            .count();
        assert!(
            in_window <= 3,
            "window starting at admission {i} saw {in_window} calls"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn waiting_callers_are_eventually_admitted() {
    let limiter = Arc::new(RateLimiter::new(Some(1)));
    let start = Instant::now();

    for _ in 0..4 {
        limiter.acquire().await;
    }

    // One admission per window after the first
    assert!(Instant::now().duration_since(start) >= Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn unlimited_limiter_admits_everything_at_once() {
    let limiter = RateLimiter::unlimited();
    let start = Instant::now();

    for _ in 0..100 {
        limiter.acquire().await;
    }

    assert_eq!(Instant::now(), start);
}

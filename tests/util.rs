#![allow(dead_code)]

use std::future::Future;

pub fn trace_init() {
    use tracing_subscriber::filter::LevelFilter;
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .try_init();
}

/// Runs `future` inside a `LocalSet` on a current-thread runtime.
pub fn run<F: Future>(future: F) -> F::Output {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("failed to build runtime");
    tokio::task::LocalSet::new().block_on(&rt, future)
}

/// Lets every other runnable task run until it blocks.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

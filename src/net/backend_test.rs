use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::executor::block_on;

use super::*;

#[test]
fn bounded_returns_output_when_work_is_ready() {
    let out = block_on(bounded(async { 7 }, Box::pin(futures::future::pending())));
    assert_eq!(out, Ok(7));
}

#[test]
fn bounded_prefers_work_when_both_are_ready() {
    let out = block_on(bounded(async { "done" }, Box::pin(async {})));
    assert_eq!(out, Ok("done"));
}

#[test]
fn bounded_times_out_on_hung_work() {
    let out = block_on(bounded(futures::future::pending::<()>(), Box::pin(async {})));
    assert_eq!(out, Err(TimedOut));
}

#[test]
fn unsubscribe_runs_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let mut sub = AuthSubscription::new(Box::pin(futures::stream::empty()), move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    sub.unsubscribe.unsubscribe();
    sub.unsubscribe.unsubscribe();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

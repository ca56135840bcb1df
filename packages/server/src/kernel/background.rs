//! Helpers for work spawned off the request path.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use anyhow::anyhow;
use futures::FutureExt;

/// Await `task`, turning a panic inside it into an error.
pub async fn catch_panic<F: Future>(task: F) -> anyhow::Result<F::Output> {
    AssertUnwindSafe(task)
        .catch_unwind()
        .await
        .map_err(|payload| anyhow!("task panicked: {}", panic_message(payload.as_ref())))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string payload")
}

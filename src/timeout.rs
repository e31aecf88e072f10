//! Deadline promises. A timeout promise never resolves; it rejects with
//! [`TimedOut`] once its duration has elapsed. Racing one against real work
//! with [`await_any`](crate::await_any) gives the work a deadline. The
//! losing producer is not stopped and runs to completion unobserved.
use crate::Promise;
use std::{thread, time::Duration};

/// The error a timeout promise rejects with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("promise timed out after {after:?}")]
pub struct TimedOut {
    pub after: Duration,
}

/// A promise that rejects with `TimedOut` after `after` has elapsed.
///
/// # Examples
///
/// ```
/// use promised::{await_any, timeout_promise, Error, Promise, TimedOut};
/// use std::{thread, time::Duration};
///
/// #[derive(Debug, Clone, PartialEq, thiserror::Error)]
/// enum FetchError {
///     #[error(transparent)]
///     TimedOut(#[from] TimedOut),
/// }
///
/// let slow = Promise::<u32, FetchError>::new(|resolve, _reject| {
///     thread::sleep(Duration::from_secs(2));
///     resolve.resolve(1);
/// });
/// let deadline = timeout_promise(Duration::from_millis(20));
/// let err = await_any([&slow, &deadline]).unwrap_err();
/// assert!(matches!(err, Error::Rejected(FetchError::TimedOut(_))));
/// ```
pub fn timeout_promise<T, E>(after: Duration) -> Promise<T, E>
where
    T: Send + 'static,
    E: From<TimedOut> + Send + 'static,
{
    Promise::new(move |_resolve, reject| {
        thread::sleep(after);
        reject.reject(TimedOut { after }.into());
    })
}

//! Single-settlement promises.
//!
//! A [`Promise`] starts its producer on a new thread as soon as it is
//! created. The producer gets a [`Resolve`] and a [`Reject`] handle; the
//! first call on either fixes the outcome, and every later call is ignored.
//! Any number of threads may [`wait`](Promise::wait) on the same promise
//! and all of them see the same outcome.
//!
//! [`Promise::new`] itself never returns an error. It panics only if the OS
//! cannot create the producer thread, like [`std::thread::spawn`];
//! [`Promise::builder`] reports that case as an `io::Error` instead.
//!
//! # Examples
//!
//! ```
//! use promised::{await_all, Promise};
//! use std::{thread, time::Duration};
//! let slow = Promise::<u32, String>::new(|resolve, _reject| {
//!     thread::sleep(Duration::from_millis(20));
//!     resolve.resolve(1);
//! });
//! let fast = Promise::<u32, String>::new(|resolve, _reject| resolve.resolve(2));
//! let values: Vec<_> = await_all([&slow, &fast]).into_iter().map(|r| r.value).collect();
//! assert_eq!(values, [1, 2]);
//! ```
pub mod cell;
pub mod combinators;
mod error;
pub mod promise;
pub mod timeout;

pub use cell::{Settled, SettlementCell};
pub use combinators::{await_all, await_any, await_any_success};
pub use error::{Error, Rejections};
pub use promise::{Builder, Promise, Reject, Resolve};
pub use timeout::{timeout_promise, TimedOut};

/// One promise's outcome as a value/error pair. When `error` is set, `value`
/// is `T::default()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromiseResult<T, E> {
    pub value: T,
    pub error: Option<E>,
}

impl<T, E> PromiseResult<T, E> {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<T, E> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.value),
        }
    }
}

impl<T: Default, E> From<Result<T, E>> for PromiseResult<T, E> {
    fn from(outcome: Result<T, E>) -> Self {
        match outcome {
            Ok(value) => Self { value, error: None },
            Err(err) => Self {
                value: T::default(),
                error: Some(err),
            },
        }
    }
}

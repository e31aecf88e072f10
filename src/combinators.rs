//! Waiting on several promises at once.
//!
//! Each combinator comes in two forms: an `async fn` for callers that are
//! already running inside an executor, and a blocking `await_*` function
//! that drives it on the calling thread. None of them cancel or otherwise
//! affect the promises they wait on.
use crate::{Error, Promise, PromiseResult, Rejections};
use futures::{executor::block_on, future, stream::FuturesUnordered, FutureExt, StreamExt};

/// Waits for every promise to settle. Result `i` belongs to promise `i`,
/// whatever order they settled in.
pub async fn all<'a, T, E, I>(promises: I) -> Vec<PromiseResult<T, E>>
where
    I: IntoIterator<Item = &'a Promise<T, E>>,
    T: Clone + Default + 'a,
    E: Clone + 'a,
{
    future::join_all(promises.into_iter().map(Promise::settled))
        .await
        .into_iter()
        .map(PromiseResult::from)
        .collect()
}

/// The outcome of whichever promise settles first, success or failure.
pub async fn any<'a, T, E, I>(promises: I) -> Result<T, Error<E>>
where
    I: IntoIterator<Item = &'a Promise<T, E>>,
    T: Clone + 'a,
    E: Clone + 'a,
{
    let pending: Vec<_> = promises.into_iter().map(Promise::settled).collect();
    // select_all panics on an empty set
    if pending.is_empty() {
        return Err(Error::EmptyInput);
    }
    let (outcome, _, _) = future::select_all(pending).await;
    outcome.map_err(Error::Rejected)
}

/// The value of the first promise to resolve. Rejections are held back
/// until every promise has settled; only then, if none resolved, are they
/// returned together in input order.
pub async fn any_success<'a, T, E, I>(promises: I) -> Result<T, Error<E>>
where
    I: IntoIterator<Item = &'a Promise<T, E>>,
    T: Clone + 'a,
    E: Clone + 'a,
{
    let mut pending: FuturesUnordered<_> = promises
        .into_iter()
        .enumerate()
        .map(|(index, promise)| promise.settled().map(move |outcome| (index, outcome)))
        .collect();
    if pending.is_empty() {
        return Err(Error::EmptyInput);
    }
    let mut errs: Vec<Option<E>> = std::iter::repeat_with(|| None).take(pending.len()).collect();
    while let Some((index, outcome)) = pending.next().await {
        match outcome {
            Ok(value) => return Ok(value),
            Err(err) => errs[index] = Some(err),
        }
    }
    Err(Error::Aggregate(Rejections::new(errs.into_iter().flatten().collect())))
}

/// Blocking form of [`all`].
///
/// # Examples
///
/// ```
/// use promised::{await_all, Promise};
/// let p1 = Promise::<i32, String>::new(|_resolve, reject| reject.reject("reject1".into()));
/// let p2 = Promise::<i32, String>::new(|resolve, _reject| resolve.resolve(1));
/// let results = await_all([&p1, &p2]);
/// assert_eq!(results[0].error.as_deref(), Some("reject1"));
/// assert_eq!(results[0].value, 0);
/// assert_eq!(results[1].value, 1);
/// ```
pub fn await_all<'a, T, E, I>(promises: I) -> Vec<PromiseResult<T, E>>
where
    I: IntoIterator<Item = &'a Promise<T, E>>,
    T: Clone + Default + 'a,
    E: Clone + 'a,
{
    block_on(all(promises))
}

/// Blocking form of [`any`].
pub fn await_any<'a, T, E, I>(promises: I) -> Result<T, Error<E>>
where
    I: IntoIterator<Item = &'a Promise<T, E>>,
    T: Clone + 'a,
    E: Clone + 'a,
{
    block_on(any(promises))
}

/// Blocking form of [`any_success`].
///
/// # Examples
///
/// ```
/// use promised::{await_any_success, Promise};
/// use std::{thread, time::Duration};
/// let p1 = Promise::<i32, String>::new(|_resolve, reject| reject.reject("reject4".into()));
/// let p2 = Promise::<i32, String>::new(|resolve, _reject| {
///     thread::sleep(Duration::from_millis(50));
///     resolve.resolve(3);
/// });
/// assert_eq!(await_any_success([&p1, &p2]), Ok(3));
/// ```
pub fn await_any_success<'a, T, E, I>(promises: I) -> Result<T, Error<E>>
where
    I: IntoIterator<Item = &'a Promise<T, E>>,
    T: Clone + 'a,
    E: Clone + 'a,
{
    block_on(any_success(promises))
}

#[cfg(test)]
mod tests {
    use super::{all, any, any_success, await_all, await_any, await_any_success};
    use crate::{Error, Promise};
    use futures::executor::block_on;

    #[test]
    fn test_empty_input() {
        let none: [&Promise<u8, String>; 0] = [];
        assert!(await_all(none).is_empty());
        assert_eq!(await_any(none), Err(Error::EmptyInput));
        assert_eq!(await_any_success(none), Err(Error::EmptyInput));
    }

    #[test]
    fn test_async_forms_over_presettled() {
        let ok = Promise::<u8, String>::resolved(1);
        let err = Promise::<u8, String>::rejected("e".into());
        block_on(async {
            let results = all([&ok, &err]).await;
            assert_eq!(results[0].clone().into_result(), Ok(1));
            assert_eq!(results[1].clone().into_result(), Err("e".to_string()));
            assert_eq!(any([&err]).await, Err(Error::Rejected("e".to_string())));
            assert_eq!(any_success([&err, &ok]).await, Ok(1));
        });
    }

    #[test]
    fn test_same_promise_twice() {
        let promise = Promise::<u8, String>::new(|resolve, _reject| resolve.resolve(9));
        let results = await_all([&promise, &promise]);
        assert_eq!(results[0], results[1]);
        assert_eq!(await_any([&promise, &promise]), Ok(9));
    }
}

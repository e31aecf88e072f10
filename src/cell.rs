//! The settlement cell is the one piece of shared state behind every
//! promise. It holds at most one outcome, lets the first `resolve` or
//! `reject` win, and broadcasts that outcome to any number of waiters.
//!
use parking_lot::Mutex;
use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::atomic::{AtomicBool, Ordering},
    task::{Context, Poll, Waker},
};

/// A write-once slot that many waiters can observe.
///
/// # Examples
///
/// ```
/// use promised::SettlementCell;
/// use futures::executor::block_on;
/// use std::{sync::Arc, thread};
/// let cell = Arc::new(SettlementCell::<u32, String>::new());
/// let waiter = cell.clone();
/// let task1 = thread::spawn(move || block_on(waiter.settled()));
/// assert!(cell.resolve(7));
/// assert!(!cell.reject("too late".into()));
/// assert_eq!(task1.join().expect("The task1 thread has panicked."), Ok(7));
/// ```
pub struct SettlementCell<T, E> {
    settled: AtomicBool,
    inner: Mutex<Inner<T, E>>,
}

struct Inner<T, E> {
    outcome: Option<Result<T, E>>,
    // Keyed so a dropped `Settled` can take its own waker back out.
    wakers: Vec<(u64, Waker)>,
    next_key: u64,
}

impl<T, E> SettlementCell<T, E> {
    /// An empty, unsettled cell.
    pub fn new() -> Self {
        Self {
            settled: AtomicBool::new(false),
            inner: Mutex::new(Inner {
                outcome: None,
                wakers: vec![],
                next_key: 0,
            }),
        }
    }

    /// Settles the cell with a value. Returns `false` when the cell had
    /// already been settled, in which case `value` is dropped.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settles the cell with an error. Returns `false` when the cell had
    /// already been settled, in which case `err` is dropped.
    pub fn reject(&self, err: E) -> bool {
        self.settle(Err(err))
    }

    fn settle(&self, outcome: Result<T, E>) -> bool {
        let wakers = {
            let mut inner = self.inner.lock();
            if inner.outcome.is_some() {
                tracing::trace!("ignoring settlement of an already settled cell");
                return false;
            }
            inner.outcome = Some(outcome);
            // Published while the lock is held: anyone who sees `true` and
            // then locks will find the outcome.
            self.settled.store(true, Ordering::Release);
            std::mem::take(&mut inner.wakers)
        };
        tracing::trace!(waiters = wakers.len(), "cell settled");
        for (_, waker) in wakers {
            waker.wake()
        }
        true
    }

    /// Non-blocking snapshot of whether an outcome has been stored.
    pub fn is_settled(&self) -> bool {
        self.settled.load(Ordering::Acquire)
    }

    /// A future that completes with a copy of the outcome once the cell is
    /// settled. Any number of these may be outstanding at once.
    pub fn settled(&self) -> Settled<'_, T, E> {
        Settled {
            cell: self,
            key: None,
        }
    }

    #[cfg(test)]
    fn registered_wakers(&self) -> usize {
        self.inner.lock().wakers.len()
    }
}

impl<T: Clone, E: Clone> SettlementCell<T, E> {
    /// The outcome, if there is one yet.
    pub fn try_get(&self) -> Option<Result<T, E>> {
        self.inner.lock().outcome.clone()
    }

    /// Blocks the calling thread until the cell is settled.
    pub fn wait(&self) -> Result<T, E> {
        futures::executor::block_on(self.settled())
    }
}

impl<T, E> Default for SettlementCell<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for SettlementCell<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettlementCell")
            .field("settled", &self.is_settled())
            .finish_non_exhaustive()
    }
}

/// Future returned by [`SettlementCell::settled`].
#[must_use = "futures do nothing unless polled"]
pub struct Settled<'a, T, E> {
    cell: &'a SettlementCell<T, E>,
    key: Option<u64>,
}

impl<T: Clone, E: Clone> Future for Settled<'_, T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let mut inner = this.cell.inner.lock();
        if let Some(ref outcome) = inner.outcome {
            return Poll::Ready(outcome.clone());
        }
        let waker = cx.waker();
        let slot = this
            .key
            .and_then(|key| inner.wakers.iter().position(|(k, _)| *k == key));
        match slot {
            Some(index) => {
                let registered = &mut inner.wakers[index].1;
                if !registered.will_wake(waker) {
                    *registered = waker.clone();
                }
            }
            None => {
                let key = inner.next_key;
                inner.next_key += 1;
                inner.wakers.push((key, waker.clone()));
                this.key = Some(key);
            }
        }
        Poll::Pending
    }
}

impl<T, E> Drop for Settled<'_, T, E> {
    fn drop(&mut self) {
        if let Some(key) = self.key {
            self.cell.inner.lock().wakers.retain(|(k, _)| *k != key);
        }
    }
}

impl<T, E> fmt::Debug for Settled<'_, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settled")
            .field("cell", self.cell)
            .field("key", &self.key)
            .finish()
    }
}

//! A [`Promise`] pairs a [`SettlementCell`] with a producer that starts
//! running on its own thread the moment the promise is created.
//!
//! There is no cancellation. A producer that never settles its promise and
//! never returns keeps every waiter blocked, and a producer that returns or
//! panics without settling leaves the promise pending for good.
use crate::cell::{Settled, SettlementCell};
use std::{
    fmt, io,
    marker::PhantomData,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread,
};

/// A shared handle to an eventual `Result<T, E>`.
///
/// Cloning a `Promise` gives another handle to the same outcome.
///
/// # Examples
///
/// ```
/// use promised::Promise;
/// let promise = Promise::<i32, String>::new(|resolve, reject| {
///     if true {
///         resolve.resolve(10);
///     } else {
///         reject.reject("failed to get value".into());
///     }
/// });
/// assert_eq!(promise.wait(), Ok(10));
/// assert!(promise.is_finished());
/// ```
pub struct Promise<T, E> {
    cell: Arc<SettlementCell<T, E>>,
}

/// Handed to the producer; settles the promise with a value.
pub struct Resolve<T, E> {
    cell: Arc<SettlementCell<T, E>>,
}

/// Handed to the producer; settles the promise with an error.
pub struct Reject<T, E> {
    cell: Arc<SettlementCell<T, E>>,
}

impl<T, E> Resolve<T, E> {
    /// Only the first `resolve` or `reject` on a promise counts; later calls
    /// do nothing.
    pub fn resolve(&self, value: T) {
        self.cell.resolve(value);
    }
}

impl<T, E> Reject<T, E> {
    /// Only the first `resolve` or `reject` on a promise counts; later calls
    /// do nothing.
    pub fn reject(&self, err: E) {
        self.cell.reject(err);
    }
}

impl<T, E> Promise<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Creates a promise and starts `producer` on a new thread before
    /// returning.
    ///
    /// Panics only if the OS refuses to create a thread, like
    /// [`thread::spawn`]. Use [`Promise::builder`] to handle that instead.
    pub fn new<F>(producer: F) -> Self
    where
        F: FnOnce(Resolve<T, E>, Reject<T, E>) + Send + 'static,
    {
        let cell = Arc::new(SettlementCell::new());
        thread::spawn(run_producer(cell.clone(), producer));
        Self { cell }
    }

    /// Configure the producer thread before starting it.
    pub fn builder() -> Builder<T, E> {
        Builder::new()
    }
}

impl<T, E> Promise<T, E> {
    /// A promise that is already resolved. No thread is started.
    pub fn resolved(value: T) -> Self {
        let cell = SettlementCell::new();
        cell.resolve(value);
        Self {
            cell: Arc::new(cell),
        }
    }

    /// A promise that is already rejected. No thread is started.
    pub fn rejected(err: E) -> Self {
        let cell = SettlementCell::new();
        cell.reject(err);
        Self {
            cell: Arc::new(cell),
        }
    }

    /// Whether the producer has settled the promise yet. Never blocks.
    pub fn is_finished(&self) -> bool {
        self.cell.is_settled()
    }

    /// A future resolving to the outcome, for callers already inside an
    /// executor.
    pub fn settled(&self) -> Settled<'_, T, E> {
        self.cell.settled()
    }
}

impl<T: Clone, E: Clone> Promise<T, E> {
    /// Blocks until the promise settles. Every call, from any thread, sees
    /// the same outcome.
    ///
    /// Inside an executor, await [`Promise::settled`] instead; this drives a
    /// nested `block_on`.
    pub fn wait(&self) -> Result<T, E> {
        self.cell.wait()
    }

    /// The outcome if the promise has settled, without blocking.
    pub fn try_get(&self) -> Option<Result<T, E>> {
        self.cell.try_get()
    }
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T, E> Clone for Resolve<T, E> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T, E> Clone for Reject<T, E> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("finished", &self.is_finished())
            .finish()
    }
}

fn run_producer<T, E, F>(cell: Arc<SettlementCell<T, E>>, producer: F) -> impl FnOnce() + Send + 'static
where
    T: Send + 'static,
    E: Send + 'static,
    F: FnOnce(Resolve<T, E>, Reject<T, E>) + Send + 'static,
{
    move || {
        tracing::trace!(thread = ?thread::current().name(), "producer started");
        let resolve = Resolve { cell: cell.clone() };
        let reject = Reject { cell: cell.clone() };
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| producer(resolve, reject)));
        if outcome.is_err() && !cell.is_settled() {
            tracing::error!(
                thread = ?thread::current().name(),
                "producer panicked before settling its promise; waiters will block"
            );
        }
    }
}

/// Producer thread configuration, mirroring [`thread::Builder`].
///
/// # Examples
///
/// ```
/// use promised::Promise;
/// use std::thread;
/// let promise = Promise::<String, ()>::builder()
///     .name("fetch".into())
///     .spawn(|resolve, _reject| {
///         resolve.resolve(thread::current().name().unwrap_or_default().to_string());
///     })
///     .expect("failed to start the producer thread");
/// assert_eq!(promise.wait(), Ok("fetch".to_string()));
/// ```
pub struct Builder<T, E> {
    name: Option<String>,
    stack_size: Option<usize>,
    _outcome: PhantomData<fn() -> (T, E)>,
}

impl<T, E> Builder<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    pub fn new() -> Self {
        Self {
            name: None,
            stack_size: None,
            _outcome: PhantomData,
        }
    }

    /// Names the producer thread.
    pub fn name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    /// Stack size of the producer thread, in bytes.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Creates the promise and starts `producer`, reporting thread creation
    /// failure instead of panicking.
    pub fn spawn<F>(self, producer: F) -> io::Result<Promise<T, E>>
    where
        F: FnOnce(Resolve<T, E>, Reject<T, E>) + Send + 'static,
    {
        let mut builder = thread::Builder::new();
        if let Some(name) = self.name {
            builder = builder.name(name);
        }
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }
        let cell = Arc::new(SettlementCell::new());
        builder.spawn(run_producer(cell.clone(), producer))?;
        Ok(Promise { cell })
    }
}

impl<T, E> Default for Builder<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for Builder<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("name", &self.name)
            .field("stack_size", &self.stack_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Promise;
    use std::{
        sync::{mpsc, Arc, Barrier},
        thread,
        time::Duration,
    };

    #[test]
    fn test_producer_starts_without_wait() {
        let (tx, rx) = mpsc::channel();
        let promise = Promise::<(), ()>::new(move |resolve, _reject| {
            tx.send(()).expect("receiver dropped");
            resolve.resolve(());
        });
        rx.recv_timeout(Duration::from_secs(5))
            .expect("producer did not start before wait");
        assert_eq!(promise.wait(), Ok(()));
    }

    #[test]
    fn test_promise_resolve() {
        let promise = Promise::<String, String>::new(|resolve, _reject| {
            thread::sleep(Duration::from_millis(20));
            resolve.resolve(String::from("🍓"));
        });
        assert_eq!(promise.wait(), Ok(String::from("🍓")));
        assert_eq!(promise.wait(), Ok(String::from("🍓")));
    }

    #[test]
    fn test_promise_reject() {
        let promise = Promise::<String, String>::new(|_resolve, reject| {
            reject.reject(String::from("reject!!"));
        });
        assert_eq!(promise.wait(), Err(String::from("reject!!")));
    }

    #[test]
    fn test_resolve_after_reject_is_ignored() {
        let promise = Promise::<u32, String>::new(|resolve, reject| {
            reject.reject("first".into());
            resolve.resolve(1);
            reject.reject("second".into());
        });
        assert_eq!(promise.wait(), Err("first".to_string()));
        thread::sleep(Duration::from_millis(20));
        assert_eq!(promise.wait(), Err("first".to_string()));
    }

    #[test]
    fn test_racing_handles_settle_once() {
        let promise = Promise::<usize, usize>::new(|resolve, reject| {
            let barrier = Arc::new(Barrier::new(6));
            let racers: Vec<_> = (0..6)
                .map(|i| {
                    let resolve = resolve.clone();
                    let reject = reject.clone();
                    let barrier = barrier.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        if i % 2 == 0 {
                            resolve.resolve(i)
                        } else {
                            reject.reject(i)
                        }
                    })
                })
                .collect();
            for racer in racers {
                racer.join().expect("The racer thread has panicked");
            }
        });
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let promise = promise.clone();
                thread::spawn(move || promise.wait())
            })
            .collect();
        let first = promise.wait();
        for waiter in waiters {
            assert_eq!(waiter.join().expect("The waiter thread has panicked"), first);
        }
    }

    #[test]
    fn test_presettled_promises() {
        let ok = Promise::<u8, ()>::resolved(4);
        let err = Promise::<u8, &str>::rejected("nope");
        assert!(ok.is_finished());
        assert_eq!(ok.try_get(), Some(Ok(4)));
        assert_eq!(err.wait(), Err("nope"));
    }

    #[test]
    fn test_is_finished_tracks_settlement() {
        let (tx, rx) = mpsc::channel::<()>();
        let promise = Promise::<u8, ()>::new(move |resolve, _reject| {
            let _ = rx.recv();
            resolve.resolve(1);
        });
        assert!(!promise.is_finished());
        assert_eq!(promise.try_get(), None);
        tx.send(()).expect("producer dropped");
        assert_eq!(promise.wait(), Ok(1));
        assert!(promise.is_finished());
    }

    #[test]
    fn test_panicking_producer_stays_pending() {
        struct Signal(mpsc::Sender<()>);
        impl Drop for Signal {
            fn drop(&mut self) {
                let _ = self.0.send(());
            }
        }

        let (tx, rx) = mpsc::channel();
        let promise = Promise::<u8, ()>::new(move |_resolve, _reject| {
            let _signal = Signal(tx);
            panic!("producer blew up");
        });
        rx.recv_timeout(Duration::from_secs(5))
            .expect("producer never ran");
        assert!(!promise.is_finished());
        assert_eq!(promise.try_get(), None);
    }

    #[test]
    fn test_builder_names_thread() {
        let promise = Promise::<Option<String>, ()>::builder()
            .name("promise-producer".into())
            .stack_size(256 * 1024)
            .spawn(|resolve, _reject| {
                resolve.resolve(thread::current().name().map(str::to_string));
            })
            .expect("failed to start the producer thread");
        assert_eq!(promise.wait(), Ok(Some("promise-producer".to_string())));
    }

    #[test]
    fn test_builder_keeps_declared_types() {
        let promise = Promise::<u32, String>::builder()
            .spawn(|resolve, _reject| resolve.resolve(3))
            .expect("failed to start the producer thread");
        assert_eq!(promise.wait(), Ok(3));

        let failing = Promise::<u32, String>::builder()
            .name("failing".into())
            .spawn(|_resolve, reject| reject.reject("nope".into()))
            .expect("failed to start the producer thread");
        assert_eq!(failing.wait(), Err("nope".to_string()));
    }
}

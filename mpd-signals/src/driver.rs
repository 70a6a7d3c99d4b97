//! Trigger → debounce → fetch pipeline that backs every router signal.
//!
//! A [`Pipeline`] describes one signal: where its triggers come from, which
//! upstream items count as triggers, whether triggers are debounced, and how
//! a trigger is resolved into the emitted value. [`Pipeline::into_signal`]
//! turns the description into a lazily started [`Signal`].

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::{BoxStream, FuturesUnordered};
use futures::{FutureExt, StreamExt};
use tokio::time::Instant;
use tracing::debug;

use crate::config::FetchOrdering;
use crate::error::{FetchResult, SignalError};
use crate::signal::{Publisher, Signal, SignalTask};

/// Decision taken by a selector for one upstream item.
pub(crate) enum Selection<K> {
    /// Not a trigger for this signal
    Skip,
    /// Trigger with the given key
    Trigger(K),
    /// Relay an upstream error unchanged
    Forward(SignalError),
}

/// Opens the upstream sequence; called once per start of the signal.
pub(crate) type Upstream<U> = Arc<dyn Fn() -> BoxStream<'static, U> + Send + Sync>;

/// Stateful per-start item filter.
pub(crate) type Selector<U, K> = Box<dyn FnMut(U) -> Selection<K> + Send>;

/// Builds a fresh selector for each start, so de-duplication state does not
/// survive a restart.
pub(crate) type SelectorFactory<U, K> = Arc<dyn Fn() -> Selector<U, K> + Send + Sync>;

/// Turns a trigger key into the emitted value.
pub(crate) enum Resolver<K, T> {
    /// Synchronous mapping, emitted immediately
    Map(Arc<dyn Fn(K) -> T + Send + Sync>),
    /// Asynchronous request; several may be in flight at once
    Fetch(Arc<dyn Fn(K) -> BoxFuture<'static, FetchResult<T>> + Send + Sync>),
}

pub(crate) struct Pipeline<U, K, T> {
    pub name: &'static str,
    pub upstream: Upstream<U>,
    pub select: SelectorFactory<U, K>,
    pub resolver: Resolver<K, T>,
    pub debounce: Option<Duration>,
    pub ordering: FetchOrdering,
}

type InFlight<T> = FuturesUnordered<BoxFuture<'static, (u64, FetchResult<T>)>>;

/// Sequence bookkeeping for concurrent fetches of one signal.
struct FetchTracker {
    next_seq: u64,
    applied: Option<u64>,
}

impl FetchTracker {
    fn new() -> Self {
        Self {
            next_seq: 0,
            applied: None,
        }
    }

    fn issue(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Returns false if a result for `seq` must be discarded.
    fn accept(&mut self, seq: u64, ordering: FetchOrdering) -> bool {
        if ordering == FetchOrdering::LatestWins && self.applied.is_some_and(|applied| seq < applied) {
            return false;
        }
        self.applied = Some(self.applied.map_or(seq, |applied| applied.max(seq)));
        true
    }
}

impl<U, K, T> Pipeline<U, K, T>
where
    U: Send + 'static,
    K: Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Declare the signal. The pipeline runs only while it has subscribers.
    pub fn into_signal(self, capacity: usize) -> Signal<T> {
        let name = self.name;
        let pipeline = Arc::new(self);
        let task: SignalTask<T> = Arc::new(move |publisher: Publisher<T>| {
            let pipeline = Arc::clone(&pipeline);
            async move { pipeline.run(publisher).await }.boxed()
        });
        Signal::new(name, capacity, task)
    }

    async fn run(&self, publisher: Publisher<T>) {
        let mut upstream = (self.upstream)();
        let mut select = (self.select)();
        let mut upstream_done = false;

        let mut pending: Option<K> = None;
        let timer = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(timer);

        let mut in_flight: InFlight<T> = FuturesUnordered::new();
        let mut tracker = FetchTracker::new();

        loop {
            tokio::select! {
                item = upstream.next(), if !upstream_done => {
                    match item {
                        Some(item) => match select(item) {
                            Selection::Skip => {}
                            Selection::Forward(error) => publisher.publish(Err(error)),
                            Selection::Trigger(key) => match self.debounce {
                                Some(window) => {
                                    debug!(signal = self.name, "Trigger received, debouncing");
                                    pending = Some(key);
                                    timer.as_mut().reset(Instant::now() + window);
                                }
                                None => {
                                    debug!(signal = self.name, "Trigger received");
                                    self.resolve(key, &publisher, &mut in_flight, &mut tracker);
                                }
                            },
                        },
                        None => {
                            upstream_done = true;
                            // A trigger still waiting out its window fires now.
                            if let Some(key) = pending.take() {
                                self.resolve(key, &publisher, &mut in_flight, &mut tracker);
                            }
                        }
                    }
                }

                () = &mut timer, if pending.is_some() => {
                    if let Some(key) = pending.take() {
                        debug!(signal = self.name, "Debounce window settled");
                        self.resolve(key, &publisher, &mut in_flight, &mut tracker);
                    }
                }

                Some((seq, result)) = in_flight.next(), if !in_flight.is_empty() => {
                    if !tracker.accept(seq, self.ordering) {
                        debug!(signal = self.name, seq, "Discarding stale fetch result");
                        continue;
                    }
                    match result {
                        Ok(value) => {
                            debug!(signal = self.name, seq, "Fetch completed");
                            publisher.emit(value);
                        }
                        Err(error) => publisher.publish(Err(SignalError::fetch(self.name, &error))),
                    }
                }

                else => break,
            }
        }

        debug!(signal = self.name, "Upstream completed, signal finished");
    }

    fn resolve(
        &self,
        key: K,
        publisher: &Publisher<T>,
        in_flight: &mut InFlight<T>,
        tracker: &mut FetchTracker,
    ) {
        match &self.resolver {
            Resolver::Map(map) => publisher.emit(map(key)),
            Resolver::Fetch(fetch) => {
                let seq = tracker.issue();
                debug!(signal = self.name, seq, "Issuing fetch");
                let request = fetch(key);
                in_flight.push(request.map(move |result| (seq, result)).boxed());
            }
        }
    }
}

//! Reference-counted, multicast signals.
//!
//! A [`Signal`] is a declared but idle computation. The first
//! [`Signal::subscribe`] spawns its task; further subscribers share that task
//! and first receive the latest item it emitted. When the last
//! [`Subscription`] is dropped the task is aborted, which drops its own
//! upstream subscriptions, timers and in-flight fetches in turn. This is the
//! refCount pattern: work exists only while somebody is listening.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::error::SignalError;

/// Item delivered to subscribers.
pub type SignalItem<T> = Result<T, SignalError>;

/// Body of a signal: runs until its upstream completes, publishing items.
pub type SignalTask<T> = Arc<dyn Fn(Publisher<T>) -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Debug, Clone)]
enum Frame<T> {
    Item(SignalItem<T>),
    Complete,
}

/// Channel shared by a running task's publisher and its subscribers.
struct Channel<T> {
    sender: broadcast::Sender<Frame<T>>,
    replay: Mutex<Replay<T>>,
}

struct Replay<T> {
    latest: Option<SignalItem<T>>,
    completed: bool,
}

struct Running<T> {
    channel: Arc<Channel<T>>,
    task: JoinHandle<()>,
}

struct SignalState<T> {
    running: Option<Running<T>>,
    subscribers: usize,
}

struct SignalInner<T> {
    name: &'static str,
    capacity: usize,
    task: SignalTask<T>,
    state: Mutex<SignalState<T>>,
}

/// A named, lazily started, multicast signal.
pub struct Signal<T> {
    inner: Arc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.inner.name)
            .field("subscribers", &self.inner.state.lock().subscribers)
            .finish()
    }
}

impl<T> Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Declare a signal. Nothing runs until the first subscription.
    pub fn new(name: &'static str, capacity: usize, task: SignalTask<T>) -> Self {
        Self {
            inner: Arc::new(SignalInner {
                name,
                capacity: capacity.max(1),
                task,
                state: Mutex::new(SignalState {
                    running: None,
                    subscribers: 0,
                }),
            }),
        }
    }

    /// Signal name, used in logs and errors.
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.state.lock().subscribers
    }

    /// Returns true while the signal's task is running.
    pub fn is_running(&self) -> bool {
        self.inner
            .state
            .lock()
            .running
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }

    fn start(&self) -> Running<T> {
        let (sender, _) = broadcast::channel(self.inner.capacity);
        let channel = Arc::new(Channel {
            sender,
            replay: Mutex::new(Replay {
                latest: None,
                completed: false,
            }),
        });
        let publisher = Publisher {
            name: self.inner.name,
            channel: Arc::clone(&channel),
        };
        let task = tokio::spawn((self.inner.task)(publisher));
        debug!(signal = self.inner.name, "Signal started");
        Running { channel, task }
    }

    /// Subscribe, starting the signal if this is the first subscriber.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe(&self) -> Subscription<T> {
        let mut state = self.inner.state.lock();

        let channel = match state.running.as_ref() {
            Some(running) => Arc::clone(&running.channel),
            None => {
                let running = self.start();
                let channel = Arc::clone(&running.channel);
                state.running = Some(running);
                channel
            }
        };

        state.subscribers += 1;

        let (receiver, replay, completed) = {
            let replay = channel.replay.lock();
            (
                channel.sender.subscribe(),
                replay.latest.clone(),
                replay.completed,
            )
        };

        Subscription {
            name: self.inner.name,
            replay,
            completed_after_replay: completed,
            finished: false,
            receiver,
            _lease: SignalLease {
                inner: Arc::clone(&self.inner),
            },
        }
    }
}

/// Publishing side handed to a signal's task.
pub struct Publisher<T> {
    name: &'static str,
    channel: Arc<Channel<T>>,
}

impl<T: Clone> Publisher<T> {
    /// Name of the signal this publisher feeds.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Emit an item to every current subscriber and remember it for late ones.
    pub fn publish(&self, item: SignalItem<T>) {
        if let Err(err) = &item {
            warn!(signal = self.name, error = %err, "Signal emitted error");
        }
        let mut replay = self.channel.replay.lock();
        replay.latest = Some(item.clone());
        let _ = self.channel.sender.send(Frame::Item(item));
    }

    /// Emit a value.
    pub fn emit(&self, value: T) {
        self.publish(Ok(value));
    }
}

impl<T> Drop for Publisher<T> {
    fn drop(&mut self) {
        let mut replay = self.channel.replay.lock();
        if !replay.completed {
            replay.completed = true;
            let _ = self.channel.sender.send(Frame::Complete);
            trace!(signal = self.name, "Signal completed");
        }
    }
}

/// Decrements the subscriber count; the last lease stops the task.
struct SignalLease<T> {
    inner: Arc<SignalInner<T>>,
}

impl<T> Drop for SignalLease<T> {
    fn drop(&mut self) {
        let running = {
            let mut state = self.inner.state.lock();
            state.subscribers = state.subscribers.saturating_sub(1);
            if state.subscribers == 0 {
                state.running.take()
            } else {
                None
            }
        };

        if let Some(running) = running {
            running.task.abort();
            debug!(signal = self.inner.name, "Last subscriber left, signal stopped");
        }
    }
}

/// One subscriber's view of a signal.
pub struct Subscription<T> {
    name: &'static str,
    replay: Option<SignalItem<T>>,
    completed_after_replay: bool,
    finished: bool,
    receiver: broadcast::Receiver<Frame<T>>,
    _lease: SignalLease<T>,
}

impl<T: Clone> Subscription<T> {
    /// Name of the subscribed signal.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Receive the next item, or `None` once the signal completed.
    pub async fn recv(&mut self) -> Option<SignalItem<T>> {
        if let Some(item) = self.replay.take() {
            return Some(item);
        }
        if self.finished || self.completed_after_replay {
            self.finished = true;
            return None;
        }

        loop {
            match self.receiver.recv().await {
                Ok(Frame::Item(item)) => return Some(item),
                Ok(Frame::Complete) | Err(broadcast::error::RecvError::Closed) => {
                    self.finished = true;
                    return None;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(signal = self.name, skipped, "Subscription lagged; skipping items");
                }
            }
        }
    }

    /// Receive an item if one is ready, without waiting.
    pub fn try_recv(&mut self) -> Option<SignalItem<T>> {
        if let Some(item) = self.replay.take() {
            return Some(item);
        }
        if self.finished || self.completed_after_replay {
            return None;
        }

        loop {
            match self.receiver.try_recv() {
                Ok(Frame::Item(item)) => return Some(item),
                Ok(Frame::Complete) | Err(broadcast::error::TryRecvError::Closed) => {
                    self.finished = true;
                    return None;
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(signal = self.name, skipped, "Subscription lagged; skipping items");
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
            }
        }
    }

    /// Returns true once the signal completed for this subscriber.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl<T: Clone + Send + 'static> Subscription<T> {
    /// Convert into a [`Stream`] of items.
    pub fn into_stream(self) -> impl Stream<Item = SignalItem<T>> + Send + Unpin {
        Box::pin(futures::stream::unfold(self, |mut subscription| async move {
            subscription.recv().await.map(|item| (item, subscription))
        }))
    }
}

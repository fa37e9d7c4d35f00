//! Ordered multi-subscriber fan-out with a one-time terminal signal.
//!
//! Each subscriber gets a bounded message channel plus a separate one-shot
//! terminal cell. Closing never waits on a subscriber, so the terminal
//! signal is observable even when a message buffer is full.

use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::{Stream, StreamExt};

use crate::stream::OutgoingMessage;

/// Default per-subscriber buffer size.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 256;

/// Default time a subscriber may keep its buffer full before it is dropped.
pub const DEFAULT_STALL_TIMEOUT_MS: u64 = 5_000;

/// Terminal signal of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Process exited with code 0 and the run was not cancelled.
    Completed,
    /// A fatal error ended the run.
    Failed {
        /// Human-readable cause.
        cause: String,
    },
    /// The run was cancelled by the caller.
    Cancelled,
}

impl RunOutcome {
    /// Returns true for [`RunOutcome::Completed`].
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Item received by a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamItem {
    /// A streamed message.
    Message(OutgoingMessage),
    /// The terminal signal; nothing follows it.
    Finished(RunOutcome),
}

/// Cause delivered to a subscriber dropped for not reading.
#[must_use]
pub fn stalled_cause(timeout: Duration) -> String {
    format!(
        "Subscriber stopped reading for {} ms and was dropped",
        timeout.as_millis()
    )
}

/// Publisher-side half of a subscription.
#[derive(Debug)]
pub struct SubscriberSink {
    messages: mpsc::Sender<OutgoingMessage>,
    terminal: oneshot::Sender<RunOutcome>,
}

impl SubscriberSink {
    /// Send the terminal signal and close the message channel.
    fn finish(self, outcome: RunOutcome) {
        // The subscription may already be gone.
        let _ = self.terminal.send(outcome);
    }
}

/// Receiving end of a publisher subscription.
///
/// Yields every buffered message in order, then exactly one
/// [`StreamItem::Finished`], then `None`. A publisher that disappears
/// without closing reads as [`RunOutcome::Cancelled`].
#[derive(Debug)]
pub struct Subscription {
    messages: mpsc::Receiver<OutgoingMessage>,
    terminal: Option<oneshot::Receiver<RunOutcome>>,
}

/// Create a connected sink/subscription pair.
#[must_use]
pub fn subscription_channel(buffer: usize) -> (SubscriberSink, Subscription) {
    let (messages_tx, messages_rx) = mpsc::channel(buffer.max(1));
    let (terminal_tx, terminal_rx) = oneshot::channel();
    (
        SubscriberSink {
            messages: messages_tx,
            terminal: terminal_tx,
        },
        Subscription {
            messages: messages_rx,
            terminal: Some(terminal_rx),
        },
    )
}

impl Subscription {
    /// Receive the next item, or `None` after the terminal signal.
    pub async fn recv(&mut self) -> Option<StreamItem> {
        self.next().await
    }

    /// Drain every message and the terminal signal.
    pub async fn collect(mut self) -> (Vec<OutgoingMessage>, RunOutcome) {
        let mut messages = Vec::new();
        while let Some(item) = self.next().await {
            match item {
                StreamItem::Message(message) => messages.push(message),
                StreamItem::Finished(outcome) => return (messages, outcome),
            }
        }
        (messages, RunOutcome::Cancelled)
    }
}

impl Stream for Subscription {
    type Item = StreamItem;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<StreamItem>> {
        if let Some(message) = ready!(self.messages.poll_recv(cx)) {
            return Poll::Ready(Some(StreamItem::Message(message)));
        }

        // Message channel is closed and drained.
        let Some(terminal) = self.terminal.as_mut() else {
            return Poll::Ready(None);
        };
        let outcome = ready!(Pin::new(terminal).poll(cx)).unwrap_or(RunOutcome::Cancelled);
        self.terminal = None;
        Poll::Ready(Some(StreamItem::Finished(outcome)))
    }
}

/// Broadcasts messages to subscribers in submission order.
///
/// Delivery awaits each subscriber's buffer, so a slow subscriber applies
/// backpressure to the run. A subscriber whose buffer stays full for longer
/// than the stall timeout is dropped: it keeps what was already buffered
/// and then receives a `Failed` terminal signal. Subscribers whose receiver
/// was dropped are pruned. The first close call wins; later ones are no-ops.
///
/// `submit` may be abandoned mid-fan-out (for example when raced against a
/// cancellation token). Subscribers earlier in the list may then have the
/// message while later ones do not; none of them is lost.
#[derive(Debug)]
pub struct StreamPublisher {
    subscribers: Vec<SubscriberSink>,
    stall_timeout: Duration,
    outcome: Option<RunOutcome>,
    submitted: u64,
}

impl Default for StreamPublisher {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl StreamPublisher {
    /// Create a publisher delivering to the given subscriber sinks.
    #[must_use]
    pub fn new(subscribers: Vec<SubscriberSink>) -> Self {
        Self {
            subscribers,
            stall_timeout: Duration::from_millis(DEFAULT_STALL_TIMEOUT_MS),
            outcome: None,
            submitted: 0,
        }
    }

    /// Set how long a full subscriber buffer may block delivery.
    #[must_use]
    pub fn with_stall_timeout(mut self, timeout: Duration) -> Self {
        self.stall_timeout = timeout;
        self
    }

    /// Register a new subscriber. Messages submitted earlier are not replayed;
    /// after close the subscription only sees the terminal signal.
    pub fn subscribe(&mut self, buffer: usize) -> Subscription {
        let (sink, subscription) = subscription_channel(buffer);
        match &self.outcome {
            Some(outcome) => sink.finish(outcome.clone()),
            None => self.subscribers.push(sink),
        }
        subscription
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Number of messages accepted so far.
    #[must_use]
    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    /// The terminal outcome, once closed.
    #[must_use]
    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    /// Returns true once a terminal signal has been sent.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.outcome.is_some()
    }

    /// Deliver a message to every subscriber.
    ///
    /// Returns false (and drops the message) if the publisher is closed.
    pub async fn submit(&mut self, message: OutgoingMessage) -> bool {
        if self.is_closed() {
            tracing::debug!("Message submitted after close, dropping");
            return false;
        }
        self.submitted += 1;
        self.deliver(message).await;
        true
    }

    /// Close with [`RunOutcome::Completed`].
    pub fn close_normally(&mut self) -> bool {
        self.close(RunOutcome::Completed)
    }

    /// Close with [`RunOutcome::Failed`].
    pub fn close_with_error(&mut self, cause: impl Into<String>) -> bool {
        self.close(RunOutcome::Failed {
            cause: cause.into(),
        })
    }

    /// Close with [`RunOutcome::Cancelled`].
    pub fn close_cancelled(&mut self) -> bool {
        self.close(RunOutcome::Cancelled)
    }

    /// Perform the terminal transition. Never waits on a subscriber.
    ///
    /// Returns true if this call closed the publisher.
    pub fn close(&mut self, outcome: RunOutcome) -> bool {
        if let Some(existing) = &self.outcome {
            tracing::debug!(?existing, ignored = ?outcome, "Publisher already closed");
            return false;
        }
        for sink in self.subscribers.drain(..) {
            sink.finish(outcome.clone());
        }
        self.outcome = Some(outcome);
        true
    }

    async fn deliver(&mut self, message: OutgoingMessage) {
        let mut index = 0;
        while index < self.subscribers.len() {
            let sent = self.subscribers[index]
                .messages
                .send_timeout(message.clone(), self.stall_timeout)
                .await;
            match sent {
                Ok(()) => index += 1,
                Err(SendTimeoutError::Closed(_)) => {
                    tracing::debug!("Subscriber dropped, pruning");
                    self.subscribers.remove(index);
                }
                Err(SendTimeoutError::Timeout(_)) => {
                    tracing::warn!(
                        timeout = ?self.stall_timeout,
                        "Subscriber stopped reading, dropping it"
                    );
                    let sink = self.subscribers.remove(index);
                    sink.finish(RunOutcome::Failed {
                        cause: stalled_cause(self.stall_timeout),
                    });
                }
            }
        }
    }
}

impl Drop for StreamPublisher {
    fn drop(&mut self) {
        if self.outcome.is_some() || self.subscribers.is_empty() {
            return;
        }
        tracing::warn!("Publisher dropped without a terminal signal, sending cancellation");
        for sink in self.subscribers.drain(..) {
            sink.finish(RunOutcome::Cancelled);
        }
    }
}

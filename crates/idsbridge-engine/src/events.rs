//! Deep-link event bus.
//!
//! Inbound deep links are the one asynchronous input the flow layer cannot
//! poll for: the OS delivers them whenever the companion app or browser
//! bounces back to the host app. [`DeepLinkBus`] is a lightweight
//! publish/subscribe fan-out built on [`tokio::sync::broadcast`]; platform
//! glue publishes every inbound link, and each in-flight attempt holds its
//! own subscription.
//!
//! Links published *before* a subscription exist only for earlier
//! subscribers. This is exactly why strategies subscribe before they launch
//! anything: a callback that races the launch is buffered for the
//! already-armed listener instead of being lost.
//!
//! # Usage
//!
//! ```rust,no_run
//! # use idsbridge_engine::events::DeepLinkBus;
//! # async fn example() {
//! let bus = DeepLinkBus::new(16);
//! let mut rx = bus.subscribe();
//!
//! bus.publish("no.example.app://auth/idshub/callback?code=c&state=s");
//!
//! let url = rx.recv().await.unwrap();
//! # }
//! ```

use std::sync::Arc;

use tokio::sync::broadcast;

/// Publish/subscribe fan-out for inbound deep-link URLs.
///
/// The bus is cheaply cloneable (`Arc`-backed) and `Send + Sync`, so the
/// platform glue and any number of concurrent attempts can share one
/// instance.
#[derive(Clone)]
pub struct DeepLinkBus {
    inner: Arc<DeepLinkBusInner>,
}

struct DeepLinkBusInner {
    sender: broadcast::Sender<String>,
}

impl DeepLinkBus {
    /// Create a new bus with the given channel capacity.
    ///
    /// If a subscriber falls behind by more than `capacity` links, it
    /// observes a lag error and skips the missed ones; listeners treat that
    /// as "keep waiting".
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(DeepLinkBusInner { sender }),
        }
    }

    /// Publish an inbound deep link to all current subscribers.
    ///
    /// Returns the number of subscribers that will observe the link. Zero is
    /// not an error: links routinely arrive when no attempt is in flight.
    pub fn publish(&self, url: impl Into<String>) -> usize {
        let url = url.into();
        match self.inner.sender.send(url) {
            Ok(n) => {
                tracing::trace!(receivers = n, "deep link published");
                n
            }
            Err(_) => {
                tracing::trace!("deep link published with no active listeners");
                0
            }
        }
    }

    /// Create a new subscriber that receives all future links.
    ///
    /// Links published *before* this call are **not** replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.inner.sender.subscribe()
    }

    /// The current number of active subscribers.
    ///
    /// Every resolved attempt releases its subscription, so this returning
    /// to zero after a flow is the listener-teardown signal tests assert on.
    pub fn subscriber_count(&self) -> usize {
        self.inner.sender.receiver_count()
    }
}

impl Default for DeepLinkBus {
    fn default() -> Self {
        Self::new(16)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

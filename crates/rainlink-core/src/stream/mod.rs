// ── Reactive zone streams ──
//
// Subscription types for consuming zone changes from the dashboard.

mod filter;

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::ZoneStore;

pub use filter::ZoneFilter;

/// A subscription to the zone store.
///
/// Provides both point-in-time snapshot access and reactive change
/// notification via [`changed()`](Self::changed) or by converting to a
/// `Stream`.
pub struct ZoneStream {
    current: Arc<ZoneStore>,
    receiver: watch::Receiver<Arc<ZoneStore>>,
}

impl ZoneStream {
    pub(crate) fn new(mut receiver: watch::Receiver<Arc<ZoneStore>>) -> Self {
        let current = Arc::clone(&receiver.borrow_and_update());
        Self { current, receiver }
    }

    /// The snapshot captured at creation time, or at the last `changed()`.
    pub fn current(&self) -> &Arc<ZoneStore> {
        &self.current
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` once the dashboard has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<ZoneStore>> {
        self.receiver.changed().await.ok()?;
        let snap = Arc::clone(&self.receiver.borrow_and_update());
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    ///
    /// The stream yields the current snapshot first, then one item per
    /// change.
    pub fn into_stream(self) -> ZoneWatchStream {
        ZoneWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct ZoneWatchStream {
    inner: WatchStream<Arc<ZoneStore>>,
}

impl Stream for ZoneWatchStream {
    type Item = Arc<ZoneStore>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

//! Progress-callback trait and event-stream adapter for batch conversion.
//!
//! Inject an [`Arc<dyn ConversionProgress>`] via
//! [`crate::config::SessionConfigBuilder::progress`] to receive real-time
//! events as the pipeline processes each item. The callback is the sole
//! coupling a host UI needs: `(item id, progress)` updates plus status
//! transitions.
//!
//! Callers that prefer pull-style consumption can use [`channel`], which
//! wraps the callback in an unbounded mpsc channel and exposes the events
//! as a [`tokio_stream`] stream.
//!
//! # Thread safety
//!
//! Items are processed concurrently, so `on_item_*` methods may be called
//! from different tasks at once. Implementations must protect shared
//! mutable state with appropriate synchronisation primitives (e.g.
//! `Mutex`, `AtomicUsize`). All methods have default no-op implementations
//! so callers only override what they care about.

use crate::item::ItemId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Called by the batch pipeline as it processes each item.
pub trait ConversionProgress: Send + Sync {
    /// Called once when the batch starts processing.
    fn on_batch_start(&self, total_items: usize) {
        let _ = total_items;
    }

    /// Called when an item's transform is dispatched.
    fn on_item_start(&self, id: ItemId) {
        let _ = id;
    }

    /// Called on every observable progress update for an item.
    ///
    /// `progress` is in `[0, 100]`. Updates for one item are monotonic;
    /// no ordering holds between different items.
    fn on_item_progress(&self, id: ItemId, progress: f32) {
        let _ = (id, progress);
    }

    /// Called when an item resolves successfully.
    fn on_item_complete(&self, id: ItemId, output_len: usize) {
        let _ = (id, output_len);
    }

    /// Called when an item's transform fails.
    fn on_item_error(&self, id: ItemId, error: &str) {
        let _ = (id, error);
    }

    /// Called once after every item has resolved.
    fn on_batch_complete(&self, total_items: usize, succeeded: usize) {
        let _ = (total_items, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgress;

impl ConversionProgress for NoopProgress {}

/// Convenience alias matching the type stored in [`crate::config::SessionConfig`].
pub type ProgressHandle = Arc<dyn ConversionProgress>;

// ── Event-stream adapter ─────────────────────────────────────────────────

/// A progress event as carried by the [`channel`] adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemEvent {
    BatchStarted { total_items: usize },
    Started { id: ItemId },
    Progress { id: ItemId, progress: f32 },
    Completed { id: ItemId, output_len: usize },
    Failed { id: ItemId, error: String },
    BatchCompleted { total_items: usize, succeeded: usize },
}

/// Stream side of the [`channel`] adapter.
pub type ItemEventStream = UnboundedReceiverStream<ItemEvent>;

struct ChannelProgress {
    tx: mpsc::UnboundedSender<ItemEvent>,
}

impl ChannelProgress {
    fn emit(&self, event: ItemEvent) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.tx.send(event);
    }
}

impl ConversionProgress for ChannelProgress {
    fn on_batch_start(&self, total_items: usize) {
        self.emit(ItemEvent::BatchStarted { total_items });
    }

    fn on_item_start(&self, id: ItemId) {
        self.emit(ItemEvent::Started { id });
    }

    fn on_item_progress(&self, id: ItemId, progress: f32) {
        self.emit(ItemEvent::Progress { id, progress });
    }

    fn on_item_complete(&self, id: ItemId, output_len: usize) {
        self.emit(ItemEvent::Completed { id, output_len });
    }

    fn on_item_error(&self, id: ItemId, error: &str) {
        self.emit(ItemEvent::Failed {
            id,
            error: error.to_string(),
        });
    }

    fn on_batch_complete(&self, total_items: usize, succeeded: usize) {
        self.emit(ItemEvent::BatchCompleted {
            total_items,
            succeeded,
        });
    }
}

/// Create a callback handle plus a stream of the events it receives.
///
/// Pass the handle to [`crate::config::SessionConfigBuilder::progress`] and
/// consume the stream from any task:
///
/// ```rust
/// use fileforge::{progress, SessionConfig};
/// use tokio_stream::StreamExt;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (handle, mut events) = progress::channel();
/// let config = SessionConfig::builder().progress(handle).build().unwrap();
/// # drop(config);
/// # let next = events.next(); // stream ends when all handles are dropped
/// # }
/// ```
pub fn channel() -> (ProgressHandle, ItemEventStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        Arc::new(ChannelProgress { tx }),
        UnboundedReceiverStream::new(rx),
    )
}

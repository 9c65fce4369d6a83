//! Sinks for progress events.
//!
//! Reporters are observers only. They must never block the collection, so a
//! sink that cannot accept an event drops it.

use crate::core::domain::model::progress::ProgressEvent;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::trace;

/// Receives progress events while a report is being built.
pub trait ProgressReporter: Send + Sync {
    fn send(&self, event: ProgressEvent);
}

/// Any thread-safe closure is a reporter.
impl<F> ProgressReporter for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn send(&self, event: ProgressEvent) {
        self(event)
    }
}

/// Forwards events into a bounded channel, dropping them when the channel is
/// full or the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelProgressReporter {
    sender: mpsc::Sender<ProgressEvent>,
}

impl ChannelProgressReporter {
    pub fn new(sender: mpsc::Sender<ProgressEvent>) -> Self {
        Self { sender }
    }

    /// Creates a reporter together with the receiving end of its channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self::new(sender), receiver)
    }
}

impl ProgressReporter for ChannelProgressReporter {
    fn send(&self, event: ProgressEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                trace!(kind = ?event.kind, "progress channel full, event dropped");
            }
            Err(TrySendError::Closed(event)) => {
                trace!(kind = ?event.kind, "progress receiver gone, event dropped");
            }
        }
    }
}

/// Optional reporter handle used by the aggregator.
#[derive(Clone, Copy)]
pub(crate) struct Progress<'a>(Option<&'a dyn ProgressReporter>);

impl<'a> Progress<'a> {
    pub fn new(reporter: Option<&'a dyn ProgressReporter>) -> Self {
        Self(reporter)
    }

    pub fn emit(&self, event: ProgressEvent) {
        if let Some(reporter) = self.0 {
            reporter.send(event);
        }
    }
}

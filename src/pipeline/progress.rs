//! Progress publication from the pipeline worker to presentation layers.

use crate::pipeline::types::ProgressEvent;
use crossbeam_channel::{Receiver, Sender};
use std::sync::{Arc, Mutex};

/// Receives progress events in order. Implementations must not block.
pub trait ProgressSink: Send + Sync {
    fn publish(&self, event: ProgressEvent);
}

/// Forwards events over a crossbeam channel.
///
/// A disconnected receiver is ignored; the run does not depend on anyone
/// listening.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new(tx: Sender<ProgressEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelSink {
    fn publish(&self, event: ProgressEvent) {
        self.tx.try_send(event).ok();
    }
}

/// Keeps every event, for tests and batch callers.
#[derive(Debug, Clone, Default)]
pub struct CollectorSink {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl ProgressSink for CollectorSink {
    fn publish(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn publish(&self, _event: ProgressEvent) {}
}

/// Drain `rx` without blocking and keep only the newest event.
pub fn latest(rx: &Receiver<ProgressEvent>) -> Option<ProgressEvent> {
    rx.try_iter().last()
}

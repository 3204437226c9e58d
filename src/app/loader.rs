//! Background document loading.
//!
//! Each request runs the fetch on its own worker thread and reports back
//! through a channel as a [`Message::DocumentLoaded`]. Nothing is cancelled;
//! the model drops results for superseded generations.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crate::app::Message;
use crate::fetch::{Fetcher, Transport};
use crate::site::DocumentDescriptor;

pub struct Loader<T: Transport> {
    fetcher: Arc<Fetcher<T>>,
    tx: Sender<Message>,
    rx: Receiver<Message>,
    in_flight: usize,
}

impl<T: Transport + 'static> Loader<T> {
    pub fn new(fetcher: Fetcher<T>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            fetcher: Arc::new(fetcher),
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn fetcher(&self) -> &Fetcher<T> {
        &self.fetcher
    }

    /// Number of requests whose results have not been received yet.
    pub const fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Start fetching `doc` for `generation`.
    pub fn request(&mut self, generation: u64, doc: &DocumentDescriptor) {
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();
        let doc_id = doc.id.clone();
        let path = doc.path.clone();
        let is_root = doc.is_root;
        tracing::debug!(doc = %doc_id, generation, "requesting document");

        self.in_flight += 1;
        thread::spawn(move || {
            let result = fetcher.fetch(&path, is_root);
            // The receiver only goes away when the viewer does.
            let _ = tx.send(Message::DocumentLoaded {
                generation,
                doc_id,
                result,
            });
        });
    }

    /// Next finished load, if any, without blocking.
    pub fn try_next(&mut self) -> Option<Message> {
        let msg = self.rx.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(msg)
    }

    /// Wait up to `timeout` for the next finished load.
    pub fn next_timeout(&mut self, timeout: Duration) -> Option<Message> {
        match self.rx.recv_timeout(timeout) {
            Ok(msg) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(msg)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

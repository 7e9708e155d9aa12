//! Periodic expiry sweep: a single cooperative background worker that
//! wakes on a timer, sweeps the key/value store for expired entries,
//! and exits on a shutdown signal.
//!
//! The sleep and the shutdown wait are the same operation:
//! `Receiver::recv_timeout` blocks for the sweep interval unless a
//! shutdown message arrives first, in which case it returns early and
//! the worker exits instead of sweeping once more.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use crate::kv::store::KvStore;

pub struct ExpiryWorker {
    shutdown: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl ExpiryWorker {
    pub fn spawn(kv: Arc<KvStore>, interval: Duration) -> Self {
        let (shutdown, rx): (Sender<()>, Receiver<()>) = bounded(1);
        let handle = std::thread::spawn(move || run(kv, interval, rx));
        ExpiryWorker {
            shutdown,
            handle: Some(handle),
        }
    }

    /// Signals the worker to stop and blocks until it exits.
    pub fn stop(&mut self) {
        let _ = self.shutdown.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ExpiryWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(kv: Arc<KvStore>, interval: Duration, shutdown: Receiver<()>) {
    loop {
        match shutdown.recv_timeout(interval) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                tracing::debug!("expiry worker shutting down");
                return;
            }
            Err(RecvTimeoutError::Timeout) => {
                let removed = kv.sweep_expired(Instant::now());
                if removed > 0 {
                    tracing::debug!(removed, "expiry sweep removed entries");
                } else {
                    tracing::trace!("expiry sweep found nothing to remove");
                }
            }
        }
    }
}

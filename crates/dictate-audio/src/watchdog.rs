use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Detects a capture subprocess that is alive but has stopped producing
/// data (e.g. the device went silent/disconnected without the process
/// exiting) — distinct from the EOF case the pipeline actor already
/// handles directly by noticing `read()` return `Ok(0)`.
#[derive(Clone)]
pub struct WatchdogTimer {
    timeout: Duration,
    last_feed: Arc<RwLock<Option<Instant>>>,
    triggered: Arc<AtomicBool>,
    handle: Arc<RwLock<Option<JoinHandle<()>>>>,
}

impl WatchdogTimer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_feed: Arc::new(RwLock::new(None)),
            triggered: Arc::new(AtomicBool::new(false)),
            handle: Arc::new(RwLock::new(None)),
        }
    }

    pub fn start(&mut self, running: Arc<AtomicBool>) {
        let timeout = self.timeout;
        let last_feed = Arc::clone(&self.last_feed);
        let triggered = Arc::clone(&self.triggered);

        *last_feed.write() = Some(Instant::now());

        let handle = thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(250));

                let now = Instant::now();
                let should_trigger = {
                    let guard = last_feed.read();
                    guard
                        .map(|last| now.duration_since(last) > timeout)
                        .unwrap_or(false)
                        && !triggered.load(Ordering::SeqCst)
                };

                if should_trigger {
                    tracing::error!("capture watchdog: no audio for over {:?}", timeout);
                    triggered.store(true, Ordering::SeqCst);
                }
            }
        });

        *self.handle.write() = Some(handle);
    }

    pub fn feed(&self) {
        *self.last_feed.write() = Some(Instant::now());
        self.triggered.store(false, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.write().take() {
            let _ = handle.join();
        }
        self.triggered.store(false, Ordering::SeqCst);
        *self.last_feed.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triggers_after_timeout_elapses() {
        let mut watchdog = WatchdogTimer::new(Duration::from_millis(50));
        let running = Arc::new(AtomicBool::new(true));
        watchdog.start(running.clone());
        thread::sleep(Duration::from_millis(400));
        assert!(watchdog.is_triggered());
        running.store(false, Ordering::SeqCst);
        watchdog.stop();
    }

    #[test]
    fn feed_clears_trigger() {
        let mut watchdog = WatchdogTimer::new(Duration::from_millis(50));
        let running = Arc::new(AtomicBool::new(true));
        watchdog.start(running.clone());
        thread::sleep(Duration::from_millis(400));
        assert!(watchdog.is_triggered());
        watchdog.feed();
        assert!(!watchdog.is_triggered());
        running.store(false, Ordering::SeqCst);
        watchdog.stop();
    }
}

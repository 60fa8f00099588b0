//! Interval poller - background tick thread for poll-mode bindings

use crossbeam_channel::{bounded, select, tick, Sender};
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Runs a poll step on a fixed interval until stopped
///
/// The step returns `false` once its binding is gone, which ends the thread.
pub(crate) struct Poller {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    pub(crate) fn spawn<F>(name: String, interval: Duration, mut step: F) -> io::Result<Self>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let handle = thread::Builder::new().name(name).spawn(move || {
            let ticker = tick(interval);
            loop {
                select! {
                    recv(stop_rx) -> _ => break,
                    recv(ticker) -> _ => {
                        if !step() {
                            break;
                        }
                    }
                }
            }
        })?;
        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Stop ticking and wait for the thread to exit
    pub(crate) fn stop(&mut self) {
        // Disconnecting the channel wakes the select
        self.stop_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn test_ticks_until_stopped() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let mut poller = Poller::spawn("test-poll".into(), Duration::from_millis(2), move || {
            c.fetch_add(1, Ordering::SeqCst);
            true
        })
        .unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while count.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(count.load(Ordering::SeqCst) >= 3);

        poller.stop();
        let after_stop = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(count.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_step_returning_false_ends_thread() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let mut poller = Poller::spawn("test-poll".into(), Duration::from_millis(1), move || {
            c.fetch_add(1, Ordering::SeqCst);
            false
        })
        .unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while count.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        thread::sleep(Duration::from_millis(10));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        poller.stop();
    }
}

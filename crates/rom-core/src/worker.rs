//! Driver worker
//!
//! Runs one [`ObservingConditions`] on a dedicated OS thread and feeds it jobs
//! one at a time, so only one request/response is ever on the wire. Callers
//! get a hard deadline per job; a missed deadline counts as a transport fault
//! and the driver is disconnected before the next job runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

use crate::driver::ObservingConditions;
use crate::error::DriverError;
use crate::protocol::ProtocolError;

type Job = Box<dyn FnOnce(&mut ObservingConditions) + Send>;

/// Single-threaded owner of a driver
pub struct DriverWorker {
    jobs: Option<mpsc::Sender<Job>>,
    /// Set when a caller gave up on a job
    faulted: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl DriverWorker {
    /// Move the driver onto its own thread
    pub fn spawn(driver: ObservingConditions) -> Result<Self, DriverError> {
        let (tx, rx) = mpsc::channel::<Job>();
        let faulted = Arc::new(AtomicBool::new(false));
        let thread_faulted = Arc::clone(&faulted);

        let handle = thread::Builder::new()
            .name("rom-driver".to_string())
            .spawn(move || {
                let mut driver = driver;
                for job in rx {
                    if thread_faulted.swap(false, Ordering::SeqCst) {
                        warn!("previous call missed its deadline, dropping the link");
                        driver.disconnect();
                    }
                    job(&mut driver);
                }
                debug!("driver worker shutting down");
                driver.disconnect();
            })
            .map_err(|e| DriverError::Transport(ProtocolError::IoError(e)))?;

        Ok(Self {
            jobs: Some(tx),
            faulted,
            handle: Some(handle),
        })
    }

    /// Run `f` on the driver thread and wait at most `deadline` for its result.
    pub fn call<T, F>(&self, deadline: Duration, f: F) -> Result<T, DriverError>
    where
        T: Send + 'static,
        F: FnOnce(&mut ObservingConditions) -> Result<T, DriverError> + Send + 'static,
    {
        let (reply_tx, reply_rx) = mpsc::channel();
        let job: Job = Box::new(move |driver| {
            // The caller may have stopped waiting
            let _ = reply_tx.send(f(driver));
        });

        let jobs = self
            .jobs
            .as_ref()
            .ok_or_else(|| DriverError::not_connected("driver worker"))?;
        jobs.send(job)
            .map_err(|_| DriverError::not_connected("driver worker"))?;

        match reply_rx.recv_timeout(deadline) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                warn!("driver call exceeded {}ms", deadline.as_millis());
                self.faulted.store(true, Ordering::SeqCst);
                Err(DriverError::Transport(ProtocolError::Timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(DriverError::not_connected("driver worker")),
        }
    }
}

impl Drop for DriverWorker {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("driver worker panicked");
            }
        }
    }
}

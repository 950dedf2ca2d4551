//! Background snapshotting with an explicit stop signal.

use crate::brain::Brain;
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{error, info, warn};

/// Periodically saves a [`Brain`] until stopped
pub struct Autosaver;

impl Autosaver {
    /// Starts the timer thread using the brain's configured interval
    pub fn spawn(brain: Arc<Brain>) -> std::io::Result<AutosaverHandle> {
        let interval = brain.config().autosave_interval;
        Self::spawn_with_interval(brain, interval)
    }

    pub fn spawn_with_interval(
        brain: Arc<Brain>,
        interval: Duration,
    ) -> std::io::Result<AutosaverHandle> {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let ticks = Arc::new(AtomicU64::new(0));
        let thread_ticks = Arc::clone(&ticks);

        let thread = thread::Builder::new()
            .name("neuromem-autosave".into())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            run_cycle(&brain);
                            thread_ticks.fetch_add(1, Ordering::SeqCst);
                        }
                        // Stop requested or handle dropped
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }

                match brain.save() {
                    Ok(_) => info!("final snapshot flushed"),
                    Err(e) => error!(error = %e, "final snapshot failed"),
                }
            })?;

        Ok(AutosaverHandle {
            stop_tx: Some(stop_tx),
            thread: Some(thread),
            ticks,
        })
    }
}

/// One autosave cycle: size check, save, diagnostics
fn run_cycle(brain: &Brain) {
    if brain.memory_limit_exceeded() {
        warn!(
            limit_mb = brain.config().memory_limit_mb,
            "memory above threshold, saving early"
        );
    }
    if let Err(e) = brain.save() {
        error!(error = %e, "autosave failed, retrying next cycle");
    }
    let diagnostics = brain.take_diagnostics();
    info!(%diagnostics, "diagnostics");
}

/// Stops the autosaver and flushes a final snapshot, on [`stop`](Self::stop)
/// or on drop
pub struct AutosaverHandle {
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
    ticks: Arc<AtomicU64>,
}

impl AutosaverHandle {
    /// Completed periodic cycles, excluding the final flush
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    /// Signals the thread and waits for the final flush
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("autosave thread panicked");
            }
        }
    }
}

impl Drop for AutosaverHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

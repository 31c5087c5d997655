//! Progress reporting for bt-tally.

use bt_cli_common::{format_bytes, format_number};
use bt_tally::TallyProgress;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Periodically prints the live counters of a running tally to stderr.
pub struct ProgressReporter {
    interval: Duration,
    progress: Arc<TallyProgress>,
    start_time: Instant,
    stop: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressReporter {
    /// Create a reporter over a tally's live counters.
    pub fn new(progress: Arc<TallyProgress>, interval_secs: u64) -> Self {
        Self {
            interval: Duration::from_secs(interval_secs.max(1)),
            progress,
            start_time: Instant::now(),
            stop: None,
            handle: None,
        }
    }

    /// Start the background reporter.
    pub fn start(&mut self) {
        let (stop, mut stopped) = watch::channel(false);
        let progress = Arc::clone(&self.progress);
        let interval = self.interval;
        let start_time = self.start_time;

        let handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.tick().await; // first tick is immediate

            loop {
                tokio::select! {
                    _ = timer.tick() => report(&progress, start_time, "Progress"),
                    _ = stopped.changed() => break,
                }
            }
        });

        self.stop = Some(stop);
        self.handle = Some(handle);
    }

    /// Stop the reporter and print a last line.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(true);
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        report(&self.progress, self.start_time, "Done");
    }
}

fn report(progress: &TallyProgress, start_time: Instant, label: &str) {
    let _ = writeln!(
        io::stderr(),
        "[{label}] {} objects, {} tallied, {} snapshots ({:.1}s elapsed)",
        format_number(progress.entries()),
        format_bytes(progress.bytes()),
        progress.snapshots(),
        start_time.elapsed().as_secs_f64()
    );
}

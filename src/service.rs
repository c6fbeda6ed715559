//! Main watch loop: poll the active window title, speak on every change.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::WatcherConfig;
use crate::detector::ChangeDetector;
use crate::history::TitleHistory;
use crate::pipeline::{NotificationPipeline, PipelineStage};
use crate::platform::WindowObserver;

/// Substituted when the platform cannot name the active window.
pub const UNKNOWN_TITLE: &str = "Unknown";

pub struct CoachService {
    watcher: WatcherConfig,
    observer: Box<dyn WindowObserver>,
    detector: ChangeDetector,
    history: TitleHistory,
    pipeline: NotificationPipeline,
}

impl CoachService {
    pub fn new(
        watcher: WatcherConfig,
        history_size: usize,
        observer: Box<dyn WindowObserver>,
        pipeline: NotificationPipeline,
    ) -> Self {
        Self {
            watcher,
            observer,
            detector: ChangeDetector::new(),
            history: TitleHistory::new(history_size),
            pipeline,
        }
    }

    /// Poll forever. A failed tick is logged and retried after a longer
    /// backoff; the loop itself never exits.
    pub async fn run(&mut self) {
        info!(
            "Watching the active window every {}ms",
            self.watcher.poll_interval_ms
        );

        loop {
            if let Err(e) = self.tick().await {
                error!("Watch loop error: {e:#}");
                tokio::time::sleep(Duration::from_millis(self.watcher.error_backoff_ms)).await;
                continue;
            }
            tokio::time::sleep(Duration::from_millis(self.watcher.poll_interval_ms)).await;
        }
    }

    /// One poll iteration: read the title, and on a change push it to the
    /// history and speak. All expected failures are recovered inline.
    pub async fn tick(&mut self) -> anyhow::Result<()> {
        let current = match self.observer.active_window_title() {
            Ok(title) => title,
            Err(e) => {
                warn!("Window introspection failed: {e:#}");
                UNKNOWN_TITLE.to_string()
            }
        };
        debug!("Current window: {current}");

        if self.detector.check(&current) {
            info!("Window changed: {current}");
            self.history.push(&current);
            let outcome = self
                .pipeline
                .notify(&current, &self.history.snapshot())
                .await;
            if outcome.stage != PipelineStage::Done {
                warn!("Notification ended at {}", outcome.stage);
            }
        }

        Ok(())
    }
}

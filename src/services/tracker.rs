use crate::services::analyzer::{AnalysisResult, AnalyzerSession};
use crate::services::capture::FrameSource;
use crate::services::ocr::OcrEngine;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Counters for one tracking run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrackerStats {
    pub passes: u64,
    pub capture_failures: u64,
    pub analysis_failures: u64,
}

struct Shared {
    session: Mutex<AnalyzerSession>,
    latest: parking_lot::Mutex<Option<AnalysisResult>>,
    running: AtomicBool,
    passes: AtomicU64,
    capture_failures: AtomicU64,
    analysis_failures: AtomicU64,
}

/// Background tracking loop: grab a frame, analyze it, publish the result,
/// sleep, repeat until stopped.
pub struct ScoreTracker {
    shared: Arc<Shared>,
    startup_delay: Duration,
    pass_interval: Duration,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl ScoreTracker {
    pub fn new(session: AnalyzerSession, startup_delay_ms: u64, pass_interval_ms: u64) -> Self {
        Self {
            shared: Arc::new(Shared {
                session: Mutex::new(session),
                latest: parking_lot::Mutex::new(None),
                running: AtomicBool::new(false),
                passes: AtomicU64::new(0),
                capture_failures: AtomicU64::new(0),
                analysis_failures: AtomicU64::new(0),
            }),
            startup_delay: Duration::from_millis(startup_delay_ms),
            pass_interval: Duration::from_millis(pass_interval_ms),
            handle: None,
        }
    }

    /// Spawn the tracking loop. Does nothing if it is already running.
    pub fn start<S, O>(&mut self, mut source: S, ocr: O)
    where
        S: FrameSource + 'static,
        O: OcrEngine + 'static,
    {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("tracking started");

        let shared = self.shared.clone();
        let startup_delay = self.startup_delay;
        let pass_interval = self.pass_interval;

        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(startup_delay).await;

            while shared.running.load(Ordering::SeqCst) {
                match source.frame() {
                    Ok(frame) => {
                        let mut session = shared.session.lock().await;
                        match session.analyze(&frame, &ocr) {
                            Ok(result) => {
                                shared.passes.fetch_add(1, Ordering::SeqCst);
                                *shared.latest.lock() = Some(result);
                            }
                            Err(e) => {
                                shared.analysis_failures.fetch_add(1, Ordering::SeqCst);
                                warn!(error = %e, "analysis pass failed");
                            }
                        }
                    }
                    Err(e) => {
                        shared.capture_failures.fetch_add(1, Ordering::SeqCst);
                        warn!(error = %e, "frame capture failed");
                    }
                }
                tokio::time::sleep(pass_interval).await;
            }
            info!("tracking stopped");
        }));
    }

    /// Signal the loop to stop and wait for the in-flight pass to finish.
    pub async fn stop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Most recent completed analysis, if any.
    pub fn latest(&self) -> Option<AnalysisResult> {
        self.shared.latest.lock().clone()
    }

    pub fn stats(&self) -> TrackerStats {
        TrackerStats {
            passes: self.shared.passes.load(Ordering::SeqCst),
            capture_failures: self.shared.capture_failures.load(Ordering::SeqCst),
            analysis_failures: self.shared.analysis_failures.load(Ordering::SeqCst),
        }
    }

    /// Stop the loop, clear the published result and the session caches.
    pub async fn reset(&mut self) {
        self.stop().await;
        self.shared.session.lock().await.reset();
        *self.shared.latest.lock() = None;
    }
}

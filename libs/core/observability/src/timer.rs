use metrics::histogram;
use std::time::Instant;

/// Timer guard for automatic duration recording.
///
/// Records into `analysis_duration_seconds` when `stop()` is called or when
/// dropped.
pub struct AnalysisTimer {
    start: Instant,
    stage: &'static str,
    stopped: bool,
}

impl AnalysisTimer {
    /// Start a new timer for a pipeline stage (`normalize`, `estimate`, `evaluate`)
    pub fn start(stage: &'static str) -> Self {
        Self {
            start: Instant::now(),
            stage,
            stopped: false,
        }
    }

    /// Stop the timer and record the duration. Returns duration in milliseconds.
    pub fn stop(&mut self) -> u64 {
        if self.stopped {
            return 0;
        }
        self.stopped = true;

        let duration = self.start.elapsed();
        histogram!("analysis_duration_seconds", "stage" => self.stage)
            .record(duration.as_secs_f64());

        duration.as_millis() as u64
    }
}

impl Drop for AnalysisTimer {
    fn drop(&mut self) {
        if !self.stopped {
            self.stop();
        }
    }
}

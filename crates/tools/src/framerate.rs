use std::time::Duration;

/// Length of the frame the motion constants are tuned for, in milliseconds.
pub const NOMINAL_FRAME_MS: f32 = 16.667;

/// How often a frame-rate report is produced.
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// A once-per-second frame-rate measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub fps: u32,
    /// Frame time the next second of motion will assume.
    pub frame_time_ms: f32,
}

impl FrameReport {
    /// Window title carrying the measurement.
    pub fn title(&self) -> String {
        format!("Running at {} fps.", self.fps)
    }
}

/// Counts frames and turns the measured rate into a motion `rate` factor.
///
/// The frame time is refreshed once per second as `1000 / max(target, fps)`
/// milliseconds. Above the target rate motion per second stays constant;
/// below it the frame time is held at the target, so motion slows down with
/// the frame rate.
#[derive(Debug, Clone)]
pub struct FrameRateCounter {
    target_fps: u32,
    last_report: Duration,
    frames: u32,
    frame_time_ms: f32,
}

impl FrameRateCounter {
    /// `now` is the current time on the same clock later passed to `tick`.
    pub fn new(target_fps: u32, now: Duration) -> Self {
        let target_fps = target_fps.max(1);
        Self {
            target_fps,
            last_report: now,
            frames: 0,
            frame_time_ms: 1000.0 / target_fps as f32,
        }
    }

    /// Count one presented frame. Returns a report when at least a second
    /// has passed since the previous one.
    pub fn tick(&mut self, now: Duration) -> Option<FrameReport> {
        let delta = now.saturating_sub(self.last_report);
        if delta < REPORT_INTERVAL {
            self.frames += 1;
            return None;
        }

        let fps = (self.frames as f64 / delta.as_secs_f64()) as u32;
        self.frame_time_ms = 1000.0 / fps.max(self.target_fps) as f32;
        self.last_report = now;
        self.frames = 0;

        let report = FrameReport {
            fps,
            frame_time_ms: self.frame_time_ms,
        };
        tracing::debug!(fps, frame_time_ms = report.frame_time_ms, "frame rate");
        Some(report)
    }

    pub fn frame_time_ms(&self) -> f32 {
        self.frame_time_ms
    }

    /// Frame time over the nominal frame time.
    pub fn rate(&self) -> f32 {
        self.frame_time_ms / NOMINAL_FRAME_MS
    }
}

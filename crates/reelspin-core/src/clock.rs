use serde::{Deserialize, Serialize};

/// Default ceiling applied to a single frame's delta time (seconds).
pub const DEFAULT_MAX_DT: f32 = 0.050;

/// Timing information for one simulation frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameTime {
    /// Seconds since the clock's first tick. Monotonic.
    pub elapsed: f32,
    /// Raw seconds since the previous tick (unclamped).
    pub dt: f32,
}

impl FrameTime {
    pub const fn new(elapsed: f32, dt: f32) -> Self {
        Self { elapsed, dt }
    }

    /// Delta time with NaN/Infinity/negative values replaced by 0 and
    /// hitches clamped to `max_dt`.
    pub fn clamped_dt(&self, max_dt: f32) -> f32 {
        sanitize_dt(self.dt, max_dt)
    }
}

/// Clamp a raw delta time into `[0, max_dt]`, mapping non-finite input to 0.
pub fn sanitize_dt(dt: f32, max_dt: f32) -> f32 {
    if !dt.is_finite() || dt <= 0.0 {
        return 0.0;
    }
    dt.min(max_dt.max(0.0))
}

/// Per-frame time source shared by every running simulation.
///
/// Converts host timestamps (milliseconds, e.g. `performance.now()`) into
/// [`FrameTime`] values. Apart from time bookkeeping its only state is
/// whether anything is still running.
#[derive(Debug, Clone, Default)]
pub struct PhysicsClock {
    origin_ms: Option<f64>,
    last_ms: Option<f64>,
    running: bool,
}

impl PhysicsClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any simulation driven by this clock is still animating.
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_running(&mut self, running: bool) {
        if running && !self.running {
            tracing::debug!("Physics clock woke up");
        }
        self.running = running;
    }

    /// Forget the time origin so the next tick starts at `elapsed = 0`.
    pub fn reset(&mut self) {
        self.origin_ms = None;
        self.last_ms = None;
    }

    /// Advance the clock to `now_ms` and return the frame timing.
    ///
    /// The first tick yields `dt = 0`. Timestamps that are not finite or that
    /// go backwards also yield `dt = 0` and leave the clock where it was.
    pub fn tick(&mut self, now_ms: f64) -> FrameTime {
        let (Some(origin), Some(last)) = (self.origin_ms, self.last_ms) else {
            if now_ms.is_finite() {
                self.origin_ms = Some(now_ms);
                self.last_ms = Some(now_ms);
            }
            return FrameTime::new(0.0, 0.0);
        };

        if !now_ms.is_finite() || now_ms < last {
            tracing::warn!(now_ms, last_ms = last, "Ignoring non-monotonic frame timestamp");
            return FrameTime::new(((last - origin) / 1000.0) as f32, 0.0);
        }

        self.last_ms = Some(now_ms);
        FrameTime::new(
            ((now_ms - origin) / 1000.0) as f32,
            ((now_ms - last) / 1000.0) as f32,
        )
    }
}

/// Endless sequence of evenly spaced frames, for headless driving and tests.
///
/// The first frame has `elapsed = 0, dt = 0` like a freshly started clock.
pub fn fixed_frames(frame_ms: f64) -> impl Iterator<Item = FrameTime> {
    let mut clock = PhysicsClock::new();
    (0u64..).map(move |i| clock.tick(i as f64 * frame_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_has_zero_dt() {
        let mut clock = PhysicsClock::new();
        let frame = clock.tick(12_345.0);
        assert_eq!(frame, FrameTime::new(0.0, 0.0));
    }

    #[test]
    fn tick_reports_elapsed_and_dt() {
        let mut clock = PhysicsClock::new();
        clock.tick(1000.0);
        clock.tick(1016.0);
        let frame = clock.tick(1048.0);
        assert!((frame.elapsed - 0.048).abs() < 1e-5);
        assert!((frame.dt - 0.032).abs() < 1e-5);
    }

    #[test]
    fn backwards_timestamp_yields_zero_dt() {
        let mut clock = PhysicsClock::new();
        clock.tick(0.0);
        clock.tick(100.0);
        let frame = clock.tick(50.0);
        assert_eq!(frame.dt, 0.0);
        assert!((frame.elapsed - 0.1).abs() < 1e-5);

        // Clock continues from the last good timestamp
        let frame = clock.tick(116.0);
        assert!((frame.dt - 0.016).abs() < 1e-5);
    }

    #[test]
    fn nan_timestamp_is_ignored() {
        let mut clock = PhysicsClock::new();
        assert_eq!(clock.tick(f64::NAN).dt, 0.0);
        clock.tick(10.0);
        assert_eq!(clock.tick(f64::INFINITY).dt, 0.0);
        let frame = clock.tick(20.0);
        assert!((frame.dt - 0.010).abs() < 1e-5);
    }

    #[test]
    fn clamped_dt_caps_hitches() {
        let frame = FrameTime::new(3.0, 5.0);
        assert_eq!(frame.clamped_dt(DEFAULT_MAX_DT), DEFAULT_MAX_DT);
    }

    #[test]
    fn clamped_dt_sanitizes_garbage() {
        assert_eq!(sanitize_dt(f32::NAN, 0.05), 0.0);
        assert_eq!(sanitize_dt(f32::INFINITY, 0.05), 0.0);
        assert_eq!(sanitize_dt(-0.2, 0.05), 0.0);
        assert_eq!(sanitize_dt(0.01, 0.05), 0.01);
    }

    #[test]
    fn fixed_frames_are_evenly_spaced() {
        let frames: Vec<_> = fixed_frames(20.0).take(4).collect();
        assert_eq!(frames[0].dt, 0.0);
        for f in &frames[1..] {
            assert!((f.dt - 0.02).abs() < 1e-6);
        }
        assert!((frames[3].elapsed - 0.06).abs() < 1e-5);
    }

    #[test]
    fn running_flag_roundtrip() {
        let mut clock = PhysicsClock::new();
        assert!(!clock.is_running());
        clock.set_running(true);
        assert!(clock.is_running());
        clock.set_running(false);
        assert!(!clock.is_running());
    }
}

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Session clock driving trials; time zero is when the timer was created.
pub trait Timer: Clone {
    fn now(&self) -> Duration;
    fn sleep(&self, d: Duration);
    fn record_frame(&mut self, d: Duration);
    fn frame_stats(&self) -> FrameStats;

    fn now_secs(&self) -> f64 {
        self.now().as_secs_f64()
    }

    fn elapsed(&self, since: Duration) -> Duration {
        self.now().saturating_sub(since)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    pub frames: usize,
    pub average_frame_time_ns: f64,
    pub jitter_ns: f64,
    pub min_frame_time_ns: f64,
    pub max_frame_time_ns: f64,
    pub effective_fps: f64,
}

/// Bounded window of recent frame durations.
#[derive(Debug, Clone)]
pub struct FrameHistory {
    times: VecDeque<Duration>,
    max_samples: usize,
}

impl FrameHistory {
    pub fn new(max_samples: usize) -> Self {
        Self {
            times: VecDeque::with_capacity(max_samples),
            max_samples,
        }
    }

    pub fn record(&mut self, d: Duration) {
        if self.times.len() >= self.max_samples {
            self.times.pop_front();
        }
        self.times.push_back(d);
    }

    pub fn stats(&self) -> FrameStats {
        if self.times.is_empty() {
            return FrameStats::default();
        }
        let n = self.times.len() as f64;
        let ns = || self.times.iter().map(|d| d.as_nanos() as f64);
        let avg = ns().sum::<f64>() / n;
        let var = ns().map(|x| (x - avg).powi(2)).sum::<f64>() / n;
        FrameStats {
            frames: self.times.len(),
            average_frame_time_ns: avg,
            jitter_ns: var.sqrt(),
            min_frame_time_ns: ns().fold(f64::INFINITY, f64::min),
            max_frame_time_ns: ns().fold(f64::NEG_INFINITY, f64::max),
            effective_fps: if avg > 0.0 { 1e9 / avg } else { 0.0 },
        }
    }
}

impl Default for FrameHistory {
    fn default() -> Self {
        Self::new(1000)
    }
}

/// Monotonic wall clock with a precise sleep.
#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    pub start: Instant,
    pub frames: FrameHistory,
}

impl Timer for HighPrecisionTimer {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn sleep(&self, d: Duration) {
        self.high_precision_sleep(d)
    }

    fn record_frame(&mut self, d: Duration) {
        self.frames.record(d);
    }

    fn frame_stats(&self) -> FrameStats {
        self.frames.stats()
    }
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            frames: FrameHistory::default(),
        }
    }

    pub fn high_precision_sleep(&self, duration: Duration) {
        #[cfg(target_os = "linux")]
        self.linux_sleep(duration);
        #[cfg(not(target_os = "linux"))]
        std::thread::sleep(duration);
    }

    #[cfg(target_os = "linux")]
    fn linux_sleep(&self, duration: Duration) {
        use libc::{CLOCK_MONOTONIC, clock_nanosleep, timespec};

        let req = timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };

        // SAFETY: `req` is a valid timespec and a null remainder pointer is allowed.
        unsafe {
            clock_nanosleep(CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut());
        }
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Clock that only moves when told to; clones share the same time.
///
/// Used for replaying recorded trajectories and for deterministic tests.
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    now: Rc<Cell<Duration>>,
    frames: FrameHistory,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, t: Duration) {
        self.now.set(t);
    }

    pub fn set_secs(&self, secs: f64) {
        self.set(Duration::from_secs_f64(secs.max(0.0)));
    }

    pub fn advance(&self, d: Duration) {
        self.now.set(self.now.get() + d);
    }
}

impl Timer for ManualTimer {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }

    fn record_frame(&mut self, d: Duration) {
        self.frames.record(d);
    }

    fn frame_stats(&self) -> FrameStats {
        self.frames.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_drops_oldest() {
        let mut h = FrameHistory::new(2);
        h.record(Duration::from_millis(10));
        h.record(Duration::from_millis(20));
        h.record(Duration::from_millis(30));
        let stats = h.stats();
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.min_frame_time_ns, 20e6);
        assert_eq!(stats.max_frame_time_ns, 30e6);
        assert_eq!(stats.average_frame_time_ns, 25e6);
        assert!((stats.effective_fps - 40.0).abs() < 1e-9);
    }

    #[test]
    fn empty_history_has_zero_stats() {
        assert_eq!(FrameHistory::default().stats(), FrameStats::default());
    }

    #[test]
    fn manual_clones_share_time() {
        let a = ManualTimer::new();
        let b = a.clone();
        a.advance(Duration::from_millis(250));
        assert_eq!(b.now(), Duration::from_millis(250));
        b.sleep(Duration::from_millis(750));
        assert_eq!(a.now_secs(), 1.0);
    }

    #[test]
    fn wall_clock_is_monotonic() {
        let t = HighPrecisionTimer::new();
        let first = t.now();
        t.sleep(Duration::from_millis(1));
        assert!(t.now() > first);
        assert!(t.elapsed(first) >= Duration::from_millis(1));
    }
}

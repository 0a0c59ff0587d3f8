//! Tick timing statistics for the host loop.
//!
//! # Usage
//!
//! ```ignore
//! let mut metrics = TickMetrics::new();
//!
//! // In the host loop:
//! let tick_start = Instant::now();
//! let report = ui.tick(&mut source, now);
//! let work = tick_start.elapsed();
//! // ... sleep for the remainder of the period ...
//! metrics.record_tick(tick_start.elapsed(), work, sleep);
//! ```

use std::time::{Duration, Instant};

/// Per-tick timing with min/max and a smoothed average.
#[derive(Debug)]
pub struct TickMetrics {
    /// Total tick time (work + sleep + overhead)
    pub tick_time_us: u32,
    /// Time spent in the pipeline
    pub work_time_us: u32,
    /// Time spent waiting for the next tick
    pub sleep_time_us: u32,

    pub tick_time_min_us: u32,
    pub tick_time_max_us: u32,
    tick_time_avg_us: f32,
    work_time_avg_us: f32,

    pub total_ticks: u64,
    /// Ticks that ran while onroad
    pub onroad_ticks: u64,

    start_time: Instant,
}

impl TickMetrics {
    /// Smoothing factor of the moving averages.
    const EMA_ALPHA: f32 = 0.1;

    /// Create empty metrics, starting the uptime clock.
    pub fn new() -> Self {
        Self {
            tick_time_us: 0,
            work_time_us: 0,
            sleep_time_us: 0,
            tick_time_min_us: u32::MAX,
            tick_time_max_us: 0,
            tick_time_avg_us: 0.0,
            work_time_avg_us: 0.0,
            total_ticks: 0,
            onroad_ticks: 0,
            start_time: Instant::now(),
        }
    }

    /// Record one tick's timings.
    pub fn record_tick(&mut self, total: Duration, work: Duration, sleep: Duration) {
        let total_us = saturating_micros(total);
        let work_us = saturating_micros(work);

        self.tick_time_us = total_us;
        self.work_time_us = work_us;
        self.sleep_time_us = saturating_micros(sleep);

        self.tick_time_min_us = self.tick_time_min_us.min(total_us);
        self.tick_time_max_us = self.tick_time_max_us.max(total_us);

        if self.total_ticks == 0 {
            self.tick_time_avg_us = total_us as f32;
            self.work_time_avg_us = work_us as f32;
        } else {
            self.tick_time_avg_us = ema(self.tick_time_avg_us, total_us);
            self.work_time_avg_us = ema(self.work_time_avg_us, work_us);
        }

        self.total_ticks += 1;
    }

    #[inline]
    pub const fn inc_onroad_ticks(&mut self) {
        self.onroad_ticks += 1;
    }

    #[inline]
    pub const fn tick_time_avg_us(&self) -> u32 {
        self.tick_time_avg_us as u32
    }

    #[inline]
    pub const fn work_time_avg_us(&self) -> u32 {
        self.work_time_avg_us as u32
    }

    #[inline]
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Uptime as `HH:MM:SS`.
    pub fn uptime_string(&self) -> String {
        let secs = self.uptime().as_secs();
        format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

impl Default for TickMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn ema(avg: f32, sample_us: u32) -> f32 {
    TickMetrics::EMA_ALPHA.mul_add(sample_us as f32, (1.0 - TickMetrics::EMA_ALPHA) * avg)
}

fn saturating_micros(d: Duration) -> u32 {
    u32::try_from(d.as_micros()).unwrap_or(u32::MAX)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_new_metrics_are_empty() {
        let metrics = TickMetrics::new();
        assert_eq!(metrics.total_ticks, 0);
        assert_eq!(metrics.tick_time_min_us, u32::MAX);
        assert_eq!(metrics.tick_time_max_us, 0);
    }

    #[test]
    fn test_record_tick_tracks_min_max() {
        let mut metrics = TickMetrics::new();
        metrics.record_tick(ms(50), ms(5), ms(45));
        metrics.record_tick(ms(40), ms(4), ms(36));
        metrics.record_tick(ms(70), ms(20), ms(50));

        assert_eq!(metrics.total_ticks, 3);
        assert_eq!(metrics.tick_time_min_us, 40_000);
        assert_eq!(metrics.tick_time_max_us, 70_000);
        assert_eq!(metrics.work_time_us, 20_000, "latest tick is kept");
        assert_eq!(metrics.sleep_time_us, 50_000);
    }

    #[test]
    fn test_average_seeds_then_smooths() {
        let mut metrics = TickMetrics::new();
        metrics.record_tick(ms(50), ms(10), ms(40));
        assert_eq!(metrics.tick_time_avg_us(), 50_000, "first sample seeds the average");

        metrics.record_tick(ms(150), ms(10), ms(140));
        // 0.1 * 150000 + 0.9 * 50000
        assert_eq!(metrics.tick_time_avg_us(), 60_000);
        assert_eq!(metrics.work_time_avg_us(), 10_000);
    }

    #[test]
    fn test_huge_durations_saturate() {
        let mut metrics = TickMetrics::new();
        metrics.record_tick(Duration::from_secs(10_000), ms(0), ms(0));
        assert_eq!(metrics.tick_time_us, u32::MAX);
    }

    #[test]
    fn test_uptime_string_format() {
        let metrics = TickMetrics::new();
        let uptime = metrics.uptime_string();
        assert_eq!(uptime.len(), 8);
        assert!(uptime.starts_with("00:00:"));
    }
}

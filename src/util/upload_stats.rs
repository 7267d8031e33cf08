//! Upload timing aggregates, one bucket per path an upload can take.

use std::fmt;

use web_time::{Duration, Instant};

use crate::upload::{UploadHandle, UploadPath};

/// Bucket an upload is counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Through a transfer slot.
    Staged,
    /// Direct by configuration.
    Direct,
    /// Direct because staging failed.
    Fallback,
}

impl From<&UploadPath> for PathKind {
    fn from(path: &UploadPath) -> Self {
        match path {
            UploadPath::Staged => Self::Staged,
            UploadPath::Direct => Self::Direct,
            UploadPath::Fallback(_) => Self::Fallback,
        }
    }
}

/// Running totals for one path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathStats {
    /// Uploads recorded.
    pub count: u64,
    /// Sum of CPU time.
    pub total: Duration,
    /// Fastest upload, zero if none.
    pub min: Duration,
    /// Slowest upload.
    pub max: Duration,
    /// Bytes moved.
    pub bytes: u64,
}

impl PathStats {
    fn record(&mut self, elapsed: Duration, bytes: usize) {
        self.min = if self.count == 0 {
            elapsed
        } else {
            self.min.min(elapsed)
        };
        self.max = self.max.max(elapsed);
        self.count += 1;
        self.total += elapsed;
        self.bytes += bytes as u64;
    }

    /// Mean CPU time per upload, zero if none.
    pub fn mean(&self) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }
        self.total / u32::try_from(self.count).unwrap_or(u32::MAX)
    }

    /// Bytes per second of CPU time, in MB/s.
    pub fn throughput_mb_s(&self) -> f64 {
        let secs = self.total.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.bytes as f64 / secs / 1.0e6
    }
}

impl fmt::Display for PathStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            return write!(f, "-");
        }
        write!(
            f,
            "{:>5} uploads  mean {:>8.3} ms  min {:>8.3} ms  max {:>8.3} ms  {:>9.1} MB/s",
            self.count,
            self.mean().as_secs_f64() * 1e3,
            self.min.as_secs_f64() * 1e3,
            self.max.as_secs_f64() * 1e3,
            self.throughput_mb_s()
        )
    }
}

/// Per-path upload statistics with a periodic log report.
pub struct UploadStats {
    staged: PathStats,
    direct: PathStats,
    fallback: PathStats,
    interval: Duration,
    last_report: Instant,
}

impl UploadStats {
    /// New empty statistics reporting every `interval_secs` seconds
    /// (`0` or negative disables periodic reports).
    pub fn new(interval_secs: f32) -> Self {
        Self {
            staged: PathStats::default(),
            direct: PathStats::default(),
            fallback: PathStats::default(),
            interval: Duration::from_secs_f32(interval_secs.max(0.0)),
            last_report: Instant::now(),
        }
    }

    /// Count one finished upload.
    pub fn record(&mut self, handle: &UploadHandle) {
        self.bucket_mut(PathKind::from(&handle.path))
            .record(handle.elapsed, handle.bytes);
    }

    /// Totals for one path.
    pub fn path(&self, kind: PathKind) -> &PathStats {
        match kind {
            PathKind::Staged => &self.staged,
            PathKind::Direct => &self.direct,
            PathKind::Fallback => &self.fallback,
        }
    }

    /// Uploads recorded over all paths.
    pub fn total_uploads(&self) -> u64 {
        self.staged.count + self.direct.count + self.fallback.count
    }

    /// Log the report at info level if the interval has elapsed. Returns
    /// whether it logged.
    pub fn maybe_log(&mut self) -> bool {
        if self.interval.is_zero() || self.last_report.elapsed() < self.interval {
            return false;
        }
        self.last_report = Instant::now();
        log::info!("upload statistics\n{self}");
        true
    }

    fn bucket_mut(&mut self, kind: PathKind) -> &mut PathStats {
        match kind {
            PathKind::Staged => &mut self.staged,
            PathKind::Direct => &mut self.direct,
            PathKind::Fallback => &mut self.fallback,
        }
    }
}

impl fmt::Display for UploadStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  staged:   {}", self.staged)?;
        writeln!(f, "  direct:   {}", self.direct)?;
        write!(f, "  fallback: {}", self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::{MapError, TextureSlot};

    fn handle(path: UploadPath, millis: u64, bytes: usize) -> UploadHandle {
        UploadHandle {
            texture: TextureSlot(0),
            transfer_slot: 0,
            path,
            bytes,
            elapsed: Duration::from_millis(millis),
        }
    }

    #[test]
    fn buckets_by_path() {
        let mut stats = UploadStats::new(0.0);
        stats.record(&handle(UploadPath::Staged, 2, 100));
        stats.record(&handle(UploadPath::Staged, 4, 100));
        stats.record(&handle(UploadPath::Direct, 1, 100));
        stats.record(&handle(UploadPath::Fallback(MapError::SlotBusy), 3, 100));

        assert_eq!(stats.path(PathKind::Staged).count, 2);
        assert_eq!(stats.path(PathKind::Direct).count, 1);
        assert_eq!(stats.path(PathKind::Fallback).count, 1);
        assert_eq!(stats.total_uploads(), 4);
    }

    #[test]
    fn min_mean_max() {
        let mut stats = UploadStats::new(0.0);
        for millis in [3, 1, 5] {
            stats.record(&handle(UploadPath::Staged, millis, 1_000_000));
        }
        let staged = stats.path(PathKind::Staged);
        assert_eq!(staged.min, Duration::from_millis(1));
        assert_eq!(staged.max, Duration::from_millis(5));
        assert_eq!(staged.mean(), Duration::from_millis(3));
        assert_eq!(staged.bytes, 3_000_000);
        // 3 MB in 9 ms
        assert!((staged.throughput_mb_s() - 333.333).abs() < 0.01);
    }

    #[test]
    fn empty_bucket_reports_dash() {
        let stats = UploadStats::new(0.0);
        assert_eq!(stats.path(PathKind::Direct).to_string(), "-");
        assert_eq!(stats.path(PathKind::Direct).mean(), Duration::ZERO);
    }

    #[test]
    fn disabled_interval_never_logs() {
        let mut stats = UploadStats::new(0.0);
        assert!(!stats.maybe_log());
    }
}

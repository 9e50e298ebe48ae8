//! Frame-rate limiter for incoming observations.

/// Admits at most one observation per `interval_ms` of caller time.
///
/// The first observation is always admitted. A timestamp older than the
/// last admitted one is taken as a clock reset and admitted too.
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    interval_ms: u64,
    last_ms: Option<u64>,
}

impl FrameThrottle {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_ms: None,
        }
    }

    pub fn admit(&mut self, timestamp_ms: u64) -> bool {
        let due = match self.last_ms {
            None => true,
            Some(last) if timestamp_ms < last => true,
            Some(last) => timestamp_ms - last >= self.interval_ms,
        };
        if due {
            self.last_ms = Some(timestamp_ms);
        }
        due
    }

    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

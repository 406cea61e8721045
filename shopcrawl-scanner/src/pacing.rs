use crate::error::{Result, ScanError};
use rand::Rng;
use std::time::Duration;
use tracing::debug;

/// Uniform random pause between page visits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacing {
    min: Duration,
    max: Duration,
}

impl Pacing {
    pub fn new(min: Duration, max: Duration) -> Result<Self> {
        if min > max {
            return Err(ScanError::InvalidConfig(format!(
                "minimum delay {:?} exceeds maximum delay {:?}",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    pub fn from_secs_f64(min_secs: f64, max_secs: f64) -> Result<Self> {
        let to_duration = |secs: f64| {
            Duration::try_from_secs_f64(secs)
                .map_err(|e| ScanError::InvalidConfig(format!("delay {}: {}", secs, e)))
        };
        Self::new(to_duration(min_secs)?, to_duration(max_secs)?)
    }

    /// No pause at all.
    pub fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn next_delay(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let secs = rand::thread_rng().gen_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    pub async fn pause(&self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }
        debug!("Pausing {:.2}s", delay.as_secs_f64());
        tokio::time::sleep(delay).await;
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(3),
            max: Duration::from_secs(8),
        }
    }
}

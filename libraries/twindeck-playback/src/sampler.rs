//! Progress samples reported by the decks

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cadence at which decks report their position while playing
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(150);

/// Raw position report from a deck
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSample {
    /// Current play position
    pub elapsed: Duration,

    /// Total media duration; `None` until the deck knows it
    pub duration: Option<Duration>,

    /// Upper bound of the seekable range (zero when nothing is seekable yet)
    pub seekable_end: Duration,
}

impl ProgressSample {
    pub fn new(elapsed: Duration, duration: Option<Duration>, seekable_end: Duration) -> Self {
        Self {
            elapsed,
            duration,
            seekable_end,
        }
    }
}

/// Derived position published for the now-playing view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub elapsed: Duration,

    /// `duration - elapsed`; `None` while the duration is unknown
    pub remaining: Option<Duration>,

    pub seekable_end: Duration,
}

impl Progress {
    pub fn from_sample(sample: &ProgressSample) -> Self {
        let remaining = sample
            .duration
            .filter(|d| !d.is_zero())
            .map(|d| d.saturating_sub(sample.elapsed));

        Self {
            elapsed: sample.elapsed,
            remaining,
            seekable_end: sample.seekable_end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_is_duration_minus_elapsed() {
        let sample = ProgressSample::new(
            Duration::from_secs(26),
            Some(Duration::from_secs(30)),
            Duration::from_secs(30),
        );
        let progress = Progress::from_sample(&sample);
        assert_eq!(progress.elapsed, Duration::from_secs(26));
        assert_eq!(progress.remaining, Some(Duration::from_secs(4)));
        assert_eq!(progress.seekable_end, Duration::from_secs(30));
    }

    #[test]
    fn unknown_duration_has_no_remaining() {
        let sample = ProgressSample::new(Duration::from_secs(1), None, Duration::ZERO);
        assert_eq!(Progress::from_sample(&sample).remaining, None);

        let sample = ProgressSample::new(Duration::from_secs(1), Some(Duration::ZERO), Duration::ZERO);
        assert_eq!(Progress::from_sample(&sample).remaining, None);
    }

    #[test]
    fn elapsed_past_duration_saturates() {
        let sample = ProgressSample::new(
            Duration::from_millis(30_100),
            Some(Duration::from_secs(30)),
            Duration::from_secs(30),
        );
        assert_eq!(Progress::from_sample(&sample).remaining, Some(Duration::ZERO));
    }
}

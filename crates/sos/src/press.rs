//! Hardware key press pattern detection

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Presses needed to fire
pub const DEFAULT_PRESS_THRESHOLD: usize = 3;

/// Span the presses must fall within
pub const DEFAULT_PRESS_WINDOW: Duration = Duration::from_secs(3);

/// Keys that can take part in the pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HardwareKey {
    VolumeDown,
    VolumeUp,
    ArrowDown,
    Power,
}

/// Press pattern settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressConfig {
    pub threshold: usize,
    pub window: Duration,
    pub key: HardwareKey,
}

impl Default for PressConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_PRESS_THRESHOLD,
            window: DEFAULT_PRESS_WINDOW,
            key: HardwareKey::VolumeDown,
        }
    }
}

impl PressConfig {
    pub fn with_threshold(mut self, value: usize) -> Self {
        self.threshold = value.max(1);
        self
    }

    pub fn with_window(mut self, value: Duration) -> Self {
        self.window = value;
        self
    }

    pub fn with_key(mut self, value: HardwareKey) -> Self {
        self.key = value;
        self
    }
}

/// Sliding-window counter of qualifying presses.
///
/// Holds at most `threshold` timestamps, none older than `window` relative to
/// the latest event seen.
#[derive(Debug, Clone)]
pub struct PressDetector {
    config: PressConfig,
    presses: VecDeque<Instant>,
}

impl PressDetector {
    pub fn new(config: PressConfig) -> Self {
        Self {
            config,
            presses: VecDeque::with_capacity(config.threshold),
        }
    }

    pub fn config(&self) -> &PressConfig {
        &self.config
    }

    /// Record a key event. Returns `true` when the pattern completes, after
    /// which the detector starts over.
    pub fn record(&mut self, key: HardwareKey, at: Instant) -> bool {
        if key != self.config.key {
            return false;
        }

        self.prune(at);
        self.presses.push_back(at);

        if self.presses.len() >= self.config.threshold {
            self.presses.clear();
            return true;
        }
        false
    }

    /// Presses still inside the window at `now`
    pub fn pending(&mut self, now: Instant) -> usize {
        self.prune(now);
        self.presses.len()
    }

    pub fn reset(&mut self) {
        self.presses.clear();
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.presses.front() {
            if now.saturating_duration_since(oldest) > self.config.window {
                self.presses.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> PressDetector {
        PressDetector::new(PressConfig::default().with_window(Duration::from_secs(5)))
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_three_presses_within_window_fire_once() {
        let mut detector = detector();
        let t0 = Instant::now();

        assert!(!detector.record(HardwareKey::VolumeDown, t0));
        assert!(!detector.record(HardwareKey::VolumeDown, t0 + secs(1)));
        assert!(detector.record(HardwareKey::VolumeDown, t0 + secs(2)));
        assert_eq!(detector.pending(t0 + secs(2)), 0);
    }

    #[test]
    fn test_elapsed_window_resets_sequence() {
        let mut detector = detector();
        let t0 = Instant::now();

        assert!(!detector.record(HardwareKey::VolumeDown, t0));
        assert!(!detector.record(HardwareKey::VolumeDown, t0 + secs(6)));
        assert!(!detector.record(HardwareKey::VolumeDown, t0 + secs(7)));
        assert_eq!(detector.pending(t0 + secs(7)), 2);

        // the partial sequence drains once its window passes
        assert_eq!(detector.pending(t0 + secs(13)), 0);
    }

    #[test]
    fn test_other_keys_are_ignored() {
        let mut detector = detector();
        let t0 = Instant::now();

        assert!(!detector.record(HardwareKey::VolumeDown, t0));
        assert!(!detector.record(HardwareKey::VolumeUp, t0 + secs(1)));
        assert!(!detector.record(HardwareKey::VolumeDown, t0 + secs(1)));
        assert_eq!(detector.pending(t0 + secs(1)), 2);
        assert!(detector.record(HardwareKey::VolumeDown, t0 + secs(2)));
    }

    #[test]
    fn test_fourth_press_starts_new_sequence() {
        let mut detector = detector();
        let t0 = Instant::now();

        for i in 0..3 {
            detector.record(HardwareKey::VolumeDown, t0 + secs(i));
        }
        assert!(!detector.record(HardwareKey::VolumeDown, t0 + secs(3)));
        assert_eq!(detector.pending(t0 + secs(3)), 1);
    }

    #[test]
    fn test_press_at_window_edge_counts() {
        let mut detector = detector();
        let t0 = Instant::now();

        detector.record(HardwareKey::VolumeDown, t0);
        detector.record(HardwareKey::VolumeDown, t0 + secs(4));
        assert!(detector.record(HardwareKey::VolumeDown, t0 + secs(5)));
    }

    #[test]
    fn test_custom_threshold() {
        let mut detector = PressDetector::new(
            PressConfig::default()
                .with_threshold(2)
                .with_key(HardwareKey::ArrowDown),
        );
        let t0 = Instant::now();
        assert!(!detector.record(HardwareKey::ArrowDown, t0));
        assert!(detector.record(HardwareKey::ArrowDown, t0 + Duration::from_millis(300)));
    }
}

//! Human-like pacing derived from `[timing]`.

use std::time::Duration;

use parrot_config::TimingConfig;
use parrot_core::RandomSource;

#[derive(Debug, Clone)]
pub struct Pacing {
    timing: TimingConfig,
}

impl Pacing {
    pub fn new(timing: TimingConfig) -> Self {
        Self { timing }
    }

    /// Idle wait before each cycle, uniform in the configured second range.
    pub fn cycle_delay(&self, rng: &mut dyn RandomSource) -> Duration {
        let min_ms = self.timing.reply_delay_min_secs as f64 * 1000.0;
        let max_ms = self.timing.reply_delay_max_secs as f64 * 1000.0;
        Duration::from_millis(rng.range_f64(min_ms, max_ms) as u64)
    }

    pub fn read_delay(&self) -> Duration {
        Duration::from_secs(self.timing.read_delay_secs)
    }

    /// Time spent "typing" `text`: length over a random speed, clamped.
    pub fn typing_duration(&self, text: &str, rng: &mut dyn RandomSource) -> Duration {
        let t = &self.timing;
        let cps = rng.range_f64(t.typing_cps_min, t.typing_cps_max);
        let ms = text.chars().count() as f64 / cps * 1000.0;
        let ms = ms.clamp(t.typing_min_ms as f64, t.typing_max_ms as f64);
        Duration::from_millis(ms as u64)
    }

    /// Extra pause between typing and sending, uniform integer milliseconds.
    pub fn human_delay(&self, rng: &mut dyn RandomSource) -> Duration {
        let t = &self.timing;
        Duration::from_millis(rng.range_inclusive(t.human_delay_min_ms, t.human_delay_max_ms))
    }
}

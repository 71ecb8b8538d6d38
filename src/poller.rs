use std::time::Duration;

use crate::config::Config;
use crate::search_info::SearchInfo;

/// How long to wait between two search progress polls.
///
/// Starts short when a search begins and backs off a step every time a
/// poll finds something new, since deeper iterations arrive more slowly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollCadence {
    start: Duration,
    step: Duration,
    max: Duration,
    delay: Duration,
}

impl PollCadence {
    pub fn new(start: Duration, step: Duration, max: Duration) -> PollCadence {
        PollCadence { start, step, max, delay: start }
    }

    pub fn from_config(config: &Config) -> PollCadence {
        PollCadence::new(config.poll_start, config.poll_step, config.poll_max)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn reset(&mut self) {
        self.delay = self.start;
    }

    pub fn record(&mut self, info: &SearchInfo) {
        if info.is_new {
            self.delay = (self.delay + self.step).min(self.max);
        }
    }
}

#[test]
fn backs_off_on_new_info_up_to_max() {
    let mut cadence = PollCadence::new(Duration::from_millis(50), Duration::from_millis(10), Duration::from_millis(70));
    let fresh = SearchInfo { is_new: true, ..SearchInfo::default() };

    cadence.record(&SearchInfo::default());
    assert_eq!(cadence.delay(), Duration::from_millis(50));

    cadence.record(&fresh);
    assert_eq!(cadence.delay(), Duration::from_millis(60));

    for _ in 0..5 {
        cadence.record(&fresh);
    }
    assert_eq!(cadence.delay(), Duration::from_millis(70));

    cadence.reset();
    assert_eq!(cadence.delay(), Duration::from_millis(50));
}

/// Tracks simulation time as a monotonic tick counter.
///
/// Every timestamp in the simulation (request issue times, cooldowns,
/// stun deadlines, respawn cycles) is expressed in ticks of this clock.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    tick: u64,
}

impl SimClock {
    /// Create a clock at tick 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock that resumes from `tick`.
    pub fn starting_at(tick: u64) -> Self {
        Self { tick }
    }

    /// Advance the clock by one tick. Returns the new tick number.
    pub fn advance(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Ticks elapsed since `earlier`, or 0 if `earlier` lies in the future.
    pub fn since(&self, earlier: u64) -> u64 {
        self.tick.saturating_sub(earlier)
    }

    /// True on ticks that are a multiple of `interval`. An interval of 0
    /// never fires.
    pub fn every(&self, interval: u64) -> bool {
        interval > 0 && self.tick % interval == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_initial_state() {
        let clock = SimClock::new();
        assert_eq!(clock.tick(), 0);
    }

    #[test]
    fn clock_advance_increments() {
        let mut clock = SimClock::new();
        clock.advance();
        clock.advance();
        assert_eq!(clock.advance(), 3);
        assert_eq!(clock.tick(), 3);
    }

    #[test]
    fn since_saturates() {
        let clock = SimClock::starting_at(10);
        assert_eq!(clock.since(4), 6);
        assert_eq!(clock.since(12), 0);
    }

    #[test]
    fn every_fires_on_multiples() {
        let mut clock = SimClock::new();
        let fired: Vec<u64> = (0..10)
            .filter_map(|_| {
                clock.advance();
                clock.every(3).then_some(clock.tick())
            })
            .collect();
        assert_eq!(fired, vec![3, 6, 9]);
        assert!(!clock.every(0));
    }
}

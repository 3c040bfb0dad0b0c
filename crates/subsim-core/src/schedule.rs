//! Engine timers.
//!
//! The tick interval runs on wall-clock time; event spawns and the autosave
//! throttle run on the simulation clock so a stalled tab does not fire them
//! all at once. Arming replaces any existing timers and cancelling clears
//! them as a group.

/// Wall-clock seconds between ticks.
pub const TICK_INTERVAL: f64 = 0.12;

/// Longest step a single tick may apply.
pub const MAX_TICK_DT: f64 = 0.5;

/// Simulation seconds between autosaves.
pub const AUTOSAVE_INTERVAL: f64 = 2.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    /// Wall-clock time of the last tick while the tick interval is armed
    last_tick_wall: Option<f64>,
    /// Simulation-clock time of the next random event
    next_event_at: Option<f64>,
    last_autosave_at: Option<f64>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the tick interval and the next-event timer, replacing any
    /// previous ones.
    pub fn arm(&mut self, wall_now: f64, next_event_at: f64) {
        self.last_tick_wall = Some(wall_now);
        self.next_event_at = Some(next_event_at);
    }

    pub fn cancel_all(&mut self) {
        self.last_tick_wall = None;
        self.next_event_at = None;
    }

    pub fn is_armed(&self) -> bool {
        self.last_tick_wall.is_some()
    }

    /// If a tick is due at `wall_now`, consume it and return its clamped dt.
    pub fn take_tick(&mut self, wall_now: f64) -> Option<f64> {
        let last = self.last_tick_wall?;
        let elapsed = wall_now - last;
        if elapsed < 0.0 {
            // Clock went backwards; start counting again from here
            self.last_tick_wall = Some(wall_now);
            return None;
        }
        if elapsed < TICK_INTERVAL {
            return None;
        }
        self.last_tick_wall = Some(wall_now);
        Some(elapsed.min(MAX_TICK_DT))
    }

    pub fn next_event_at(&self) -> Option<f64> {
        self.next_event_at
    }

    /// Re-arm the next-event timer; ignored while cancelled.
    pub fn reschedule_event(&mut self, at: f64) {
        if self.is_armed() {
            self.next_event_at = Some(at);
        }
    }

    pub fn event_due(&self, clock: f64) -> bool {
        self.next_event_at.map_or(false, |at| clock >= at)
    }

    pub fn autosave_due(&self, clock: f64) -> bool {
        self.last_autosave_at
            .map_or(true, |at| clock - at >= AUTOSAVE_INTERVAL || clock < at)
    }

    pub fn mark_saved(&mut self, clock: f64) {
        self.last_autosave_at = Some(clock);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_cadence_and_clamp() {
        let mut schedule = Schedule::new();
        assert_eq!(schedule.take_tick(1.0), None);

        schedule.arm(10.0, 30.0);
        assert_eq!(schedule.take_tick(10.05), None);
        let dt = schedule.take_tick(10.13).unwrap();
        assert!((dt - 0.13).abs() < 1e-9);

        // A long stall is clamped
        assert_eq!(schedule.take_tick(100.0), Some(MAX_TICK_DT));
    }

    #[test]
    fn test_backwards_clock_does_not_tick() {
        let mut schedule = Schedule::new();
        schedule.arm(50.0, 0.0);
        assert_eq!(schedule.take_tick(40.0), None);
        assert_eq!(schedule.take_tick(40.06), None);
        assert!(schedule.take_tick(40.2).is_some());
    }

    #[test]
    fn test_rearm_replaces_and_cancel_clears() {
        let mut schedule = Schedule::new();
        schedule.arm(0.0, 20.0);
        schedule.arm(5.0, 40.0);
        assert_eq!(schedule.next_event_at(), Some(40.0));
        assert!(!schedule.event_due(39.0));
        assert!(schedule.event_due(40.0));

        schedule.cancel_all();
        assert!(!schedule.is_armed());
        assert!(!schedule.event_due(1000.0));
        schedule.reschedule_event(10.0);
        assert_eq!(schedule.next_event_at(), None);
    }

    #[test]
    fn test_autosave_throttle() {
        let mut schedule = Schedule::new();
        assert!(schedule.autosave_due(0.0));
        schedule.mark_saved(1.0);
        assert!(!schedule.autosave_due(2.5));
        assert!(schedule.autosave_due(3.0));
    }
}

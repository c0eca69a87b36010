/// Debounces one boolean signal with asymmetric ON/OFF thresholds.
///
/// The output turns on after `on_threshold` consecutive true readings and off
/// after `off_threshold` consecutive false readings. Both streaks saturate at
/// their threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HysteresisGate {
    on_threshold: u32,
    off_threshold: u32,
    good_streak: u32,
    bad_streak: u32,
    state: bool,
}

impl HysteresisGate {
    /// Create a gate in the off state
    ///
    /// Thresholds of 0 are treated as 1.
    #[must_use]
    pub fn new(on_threshold: u32, off_threshold: u32) -> Self {
        Self {
            on_threshold: on_threshold.max(1),
            off_threshold: off_threshold.max(1),
            good_streak: 0,
            bad_streak: 0,
            state: false,
        }
    }

    /// Feed one raw reading and return the stabilized state
    pub fn apply(&mut self, raw: bool) -> bool {
        if raw {
            self.good_streak = (self.good_streak + 1).min(self.on_threshold);
            self.bad_streak = 0;
            if self.good_streak >= self.on_threshold {
                self.state = true;
            }
        } else {
            self.bad_streak = (self.bad_streak + 1).min(self.off_threshold);
            self.good_streak = 0;
            if self.bad_streak >= self.off_threshold {
                self.state = false;
            }
        }
        self.state
    }

    /// Turn the output off and discard progress toward turning on
    pub fn force_off(&mut self) {
        self.state = false;
        self.good_streak = 0;
    }

    /// Return to the initial off state
    pub fn reset(&mut self) {
        self.good_streak = 0;
        self.bad_streak = 0;
        self.state = false;
    }

    /// Current stabilized state
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.state
    }

    /// Whether the bad streak has reached the OFF threshold
    #[must_use]
    pub fn is_lost(&self) -> bool {
        self.bad_streak >= self.off_threshold
    }

    /// Consecutive true readings, capped at the ON threshold
    #[must_use]
    pub fn good_streak(&self) -> u32 {
        self.good_streak
    }

    /// Consecutive false readings, capped at the OFF threshold
    #[must_use]
    pub fn bad_streak(&self) -> u32 {
        self.bad_streak
    }
}

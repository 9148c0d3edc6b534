//! Client Balance Cache
//!
//! The displayed coin count is a cached view of the server balance, never
//! authoritative. Refresh is explicit: after a spend completes, after
//! returning from a checkout redirect, and on sign-in. When the cached
//! value changes, the display counts toward the new value one coin per
//! tick instead of jumping.
//!
//! The stepper itself is plain state so it can be tested off the DOM; the
//! interval driving it lives in the `CoinCounter` component.

/// Milliseconds between animation ticks for a change of `diff` coins.
///
/// Gains count up slowly (400ms spread over the difference, never faster
/// than 15ms a tick); losses snap down quicker (100ms spread, floor 10ms).
pub fn step_interval_ms(from: u64, to: u64) -> u64 {
    let diff = from.abs_diff(to);
    if diff == 0 {
        return 0;
    }
    if to > from {
        (400 / diff).max(15)
    } else {
        (100 / diff).max(10)
    }
}

/// One-coin-per-tick reconciliation toward a target balance
#[derive(Clone, Copy, Debug)]
pub struct CoinAnimation {
    displayed: u64,
    target: u64,
}

impl CoinAnimation {
    pub fn new(value: u64) -> Self {
        Self {
            displayed: value,
            target: value,
        }
    }

    /// Value currently shown
    pub fn displayed(&self) -> u64 {
        self.displayed
    }

    pub fn done(&self) -> bool {
        self.displayed == self.target
    }

    /// Aim at a new balance. Returns the tick interval to drive the
    /// animation with, or `None` when there is nothing to animate.
    /// Retargeting mid-flight continues from the displayed value.
    pub fn retarget(&mut self, target: u64) -> Option<u64> {
        self.target = target;
        if self.done() {
            None
        } else {
            Some(step_interval_ms(self.displayed, target))
        }
    }

    /// Jump straight to `value` with no animation (user switch, sign-out)
    pub fn snap(&mut self, value: u64) {
        self.displayed = value;
        self.target = value;
    }

    /// Move one coin toward the target; returns the new displayed value
    pub fn tick(&mut self) -> u64 {
        if self.displayed < self.target {
            self.displayed += 1;
        } else if self.displayed > self.target {
            self.displayed -= 1;
        }
        self.displayed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gains_are_slower_than_losses() {
        assert_eq!(step_interval_ms(0, 10), 40); // 400 / 10
        assert_eq!(step_interval_ms(10, 5), 20); // 100 / 5
    }

    #[test]
    fn intervals_are_floored_for_large_diffs() {
        assert_eq!(step_interval_ms(0, 3000), 15);
        assert_eq!(step_interval_ms(3000, 0), 10);
    }

    #[test]
    fn no_change_means_no_interval() {
        assert_eq!(step_interval_ms(500, 500), 0);
        let mut anim = CoinAnimation::new(500);
        assert_eq!(anim.retarget(500), None);
    }

    #[test]
    fn counts_up_one_coin_per_tick() {
        let mut anim = CoinAnimation::new(400);
        assert_eq!(anim.retarget(403), Some(step_interval_ms(400, 403)));

        assert_eq!(anim.tick(), 401);
        assert_eq!(anim.tick(), 402);
        assert!(!anim.done());
        assert_eq!(anim.tick(), 403);
        assert!(anim.done());

        // Further ticks hold steady.
        assert_eq!(anim.tick(), 403);
    }

    #[test]
    fn counts_down_after_a_spend() {
        let mut anim = CoinAnimation::new(500);
        anim.retarget(497);
        for expected in [499, 498, 497] {
            assert_eq!(anim.tick(), expected);
        }
        assert!(anim.done());
    }

    #[test]
    fn retarget_mid_flight_continues_from_displayed() {
        let mut anim = CoinAnimation::new(0);
        anim.retarget(10);
        anim.tick();
        anim.tick();

        // A refresh lands while the count-up is still running.
        anim.retarget(1);
        assert_eq!(anim.tick(), 1);
        assert!(anim.done());
    }

    #[test]
    fn snap_skips_the_animation() {
        let mut anim = CoinAnimation::new(3400);
        anim.snap(0);
        assert_eq!(anim.displayed(), 0);
        assert!(anim.done());
    }
}

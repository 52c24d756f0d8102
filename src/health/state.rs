//! Per-host sample state for the uptime checker.
//!
//! # State Transitions
//! ```text
//! Up   → Down: consecutive failures >= failure_trigger_sample_size
//! Down → Down: every further failure re-fires (refreshes the sentinel)
//! Down → Up:   first success
//! ```
//!
//! The sentinel written on `Down` lives for one round, so a host that stays
//! unreachable must re-report every round to keep reading as down.

/// Transition produced by recording a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostSampleState {
    consecutive_failures: u32,
    down: bool,
}

impl HostSampleState {
    pub fn is_down(&self) -> bool {
        self.down
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Record a failed probe.
    pub fn mark_failure(&mut self, threshold: u32) -> Transition {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.consecutive_failures < threshold.max(1) {
            return Transition::None;
        }
        self.down = true;
        Transition::Down
    }

    /// Record a successful probe.
    pub fn mark_success(&mut self) -> Transition {
        self.consecutive_failures = 0;
        if !self.down {
            return Transition::None;
        }
        self.down = false;
        Transition::Up
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_then_refire_every_failure() {
        let mut state = HostSampleState::default();
        assert_eq!(state.mark_failure(3), Transition::None);
        assert_eq!(state.mark_failure(3), Transition::None);
        assert_eq!(state.mark_failure(3), Transition::Down);
        assert!(state.is_down());

        for _ in 0..5 {
            assert_eq!(state.mark_failure(3), Transition::Down);
        }
        assert_eq!(state.consecutive_failures(), 8);
    }

    #[test]
    fn test_success_resets_and_recovers() {
        let mut state = HostSampleState::default();
        state.mark_failure(2);
        assert_eq!(state.mark_success(), Transition::None);
        assert_eq!(state.mark_failure(2), Transition::None);
        assert_eq!(state.mark_failure(2), Transition::Down);
        assert_eq!(state.mark_success(), Transition::Up);
        assert_eq!(state.mark_success(), Transition::None);
    }
}

//! Autoplay unlock gate.
//!
//! Browsers refuse audio that is not started from a user gesture. The first
//! pointer interaction triggers a muted probe play; its result decides whether
//! gated audio (welcome clip, celebration) may start on its own.
//!
//! ```text
//! Locked --gesture--> Unlocking --probe ok--> Unlocked
//!                         |
//!                     probe failed
//!                         v
//!                      Blocked --retry--> Unlocking
//! ```
//! A policy rejection seen on a play only blocks an `Unlocked` gate. While
//! `Locked` the next gesture still probes, and while `Unlocking` the probe in
//! flight decides.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateState {
    #[default]
    Locked,
    Unlocking,
    Unlocked,
    Blocked,
}

#[derive(Debug, Clone, Default)]
pub struct AutoplayGate {
    state: GateState,
}

impl AutoplayGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == GateState::Unlocked
    }

    /// A pointer/tap anywhere. Returns true when the caller must start the probe.
    pub fn on_gesture(&mut self) -> bool {
        if self.state == GateState::Locked {
            self.transition(GateState::Unlocking);
            true
        } else {
            false
        }
    }

    /// The manual "enable sound" affordance. Only meaningful while blocked.
    pub fn retry(&mut self) -> bool {
        if self.state == GateState::Blocked {
            self.transition(GateState::Unlocking);
            true
        } else {
            false
        }
    }

    /// Outcome of the muted probe. Ignored unless a probe is in flight.
    pub fn probe_resolved(&mut self, ok: bool) {
        if self.state != GateState::Unlocking {
            log::debug!("autoplay: late probe result ({}) in {:?}", ok, self.state);
            return;
        }
        self.transition(if ok { GateState::Unlocked } else { GateState::Blocked });
    }

    /// Platform refused a play for lack of a gesture.
    pub fn reject(&mut self) {
        match self.state {
            GateState::Unlocked => self.transition(GateState::Blocked),
            GateState::Locked | GateState::Unlocking => {
                log::debug!("autoplay: play refused in {:?}, waiting for probe", self.state);
            }
            GateState::Blocked => {}
        }
    }

    fn transition(&mut self, to: GateState) {
        if self.state != to {
            log::info!("autoplay: {:?} -> {:?}", self.state, to);
            self.state = to;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_gesture_starts_probe_only_once() {
        let mut gate = AutoplayGate::new();
        assert!(gate.on_gesture());
        assert_eq!(gate.state(), GateState::Unlocking);
        assert!(!gate.on_gesture());
        gate.probe_resolved(true);
        assert!(gate.is_unlocked());
        assert!(!gate.on_gesture());
    }

    #[test]
    fn test_failed_probe_blocks_until_retry() {
        let mut gate = AutoplayGate::new();
        gate.on_gesture();
        gate.probe_resolved(false);
        assert_eq!(gate.state(), GateState::Blocked);
        // ordinary gestures do not retry on their own
        assert!(!gate.on_gesture());
        assert_eq!(gate.state(), GateState::Blocked);
        assert!(gate.retry());
        gate.probe_resolved(true);
        assert_eq!(gate.state(), GateState::Unlocked);
    }

    #[test]
    fn test_retry_outside_blocked_is_noop() {
        let mut gate = AutoplayGate::new();
        assert!(!gate.retry());
        assert_eq!(gate.state(), GateState::Locked);
    }

    #[test]
    fn test_probe_result_without_probe_ignored() {
        let mut gate = AutoplayGate::new();
        gate.probe_resolved(true);
        assert_eq!(gate.state(), GateState::Locked);
    }

    #[test]
    fn test_policy_rejection_blocks_unlocked_gate() {
        let mut gate = AutoplayGate::new();
        gate.on_gesture();
        gate.probe_resolved(true);
        gate.reject();
        assert_eq!(gate.state(), GateState::Blocked);
    }

    #[test]
    fn test_rejection_before_gesture_keeps_gate_locked() {
        let mut gate = AutoplayGate::new();
        gate.reject();
        assert_eq!(gate.state(), GateState::Locked);
        assert!(gate.on_gesture());
    }

    #[test]
    fn test_rejection_during_probe_defers_to_probe() {
        let mut gate = AutoplayGate::new();
        gate.on_gesture();
        gate.reject();
        assert_eq!(gate.state(), GateState::Unlocking);
        gate.probe_resolved(true);
        assert_eq!(gate.state(), GateState::Unlocked);
    }
}

//! Pure refresh-scheduling policy.
//!
//! The store probe that feeds the decision is fallible, so its result is
//! carried as a tri-state [`CommissionPresence`] instead of a bare `bool`; an
//! unknown probe never turns into a bootstrap refresh and never blocks a
//! scheduled one.

use anyhow::Result;

/// What the store said when asked whether any commission snapshot exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommissionPresence {
    Present,
    Absent,
    /// The probe failed; only height alignment can trigger a refresh.
    Unknown,
}

impl CommissionPresence {
    pub fn from_probe(result: &Result<bool>) -> Self {
        match result {
            Ok(true) => Self::Present,
            Ok(false) => Self::Absent,
            Err(_) => Self::Unknown,
        }
    }
}

impl From<bool> for CommissionPresence {
    fn from(present: bool) -> Self {
        if present {
            Self::Present
        } else {
            Self::Absent
        }
    }
}

/// Why a refresh cycle runs or does not run at a given height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshDecision {
    /// The configured interval is zero.
    Disabled,
    /// The store holds no commission at all; refresh regardless of height.
    Bootstrap,
    /// The height is a multiple of the interval.
    Scheduled,
    NotDue,
}

impl RefreshDecision {
    pub fn should_run(self) -> bool {
        matches!(self, Self::Bootstrap | Self::Scheduled)
    }
}

pub fn decide(height: u64, interval: u64, presence: CommissionPresence) -> RefreshDecision {
    if interval == 0 {
        return RefreshDecision::Disabled;
    }

    if presence == CommissionPresence::Absent {
        return RefreshDecision::Bootstrap;
    }

    if height % interval == 0 {
        RefreshDecision::Scheduled
    } else {
        RefreshDecision::NotDue
    }
}

pub fn should_refresh(height: u64, interval: u64, presence: CommissionPresence) -> bool {
    decide(height, interval, presence).should_run()
}

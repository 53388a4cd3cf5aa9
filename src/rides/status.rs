use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Lifecycle of a ride.
///
/// ```text
/// pending ──► accepted ──► picked_up ──► completed
///    │           │             │
///    └───────────┴─────────────┴──► cancelled
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    Pending,
    Accepted,
    PickedUp,
    Completed,
    Cancelled,
}

impl RideStatus {
    pub const ACTIVE: [RideStatus; 3] = [RideStatus::Pending, RideStatus::Accepted, RideStatus::PickedUp];

    pub fn as_str(self) -> &'static str {
        match self {
            RideStatus::Pending => "pending",
            RideStatus::Accepted => "accepted",
            RideStatus::PickedUp => "picked_up",
            RideStatus::Completed => "completed",
            RideStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Cancelled)
    }

    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    pub fn can_transition_to(self, next: RideStatus) -> bool {
        use RideStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted)
                | (Accepted, PickedUp)
                | (PickedUp, Completed)
                | (Pending, Cancelled)
                | (Accepted, Cancelled)
                | (PickedUp, Cancelled)
        )
    }

    /// Moves a driver may request through the status endpoint.
    pub fn driver_settable(self) -> bool {
        matches!(self, RideStatus::PickedUp | RideStatus::Completed | RideStatus::Cancelled)
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RideStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RideStatus::Pending),
            "accepted" => Ok(RideStatus::Accepted),
            "picked_up" => Ok(RideStatus::PickedUp),
            "completed" => Ok(RideStatus::Completed),
            "cancelled" => Ok(RideStatus::Cancelled),
            other => Err(format!("unknown ride status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RideStatus::{self, *};

    const ALL: [RideStatus; 5] = [Pending, Accepted, PickedUp, Completed, Cancelled];

    #[test]
    fn exactly_six_legal_transitions() {
        let legal: Vec<_> = ALL
            .iter()
            .flat_map(|a| ALL.iter().map(move |b| (*a, *b)))
            .filter(|(a, b)| a.can_transition_to(*b))
            .collect();
        assert_eq!(legal.len(), 6);
        assert!(legal.contains(&(Pending, Accepted)));
        assert!(legal.contains(&(PickedUp, Completed)));
        assert!(!legal.contains(&(Pending, Completed)));
        assert!(!legal.contains(&(Accepted, Completed)));
    }

    #[test]
    fn terminal_states_are_dead_ends() {
        for next in ALL {
            assert!(!Completed.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
        assert!(RideStatus::ACTIVE.iter().all(|s| s.is_active()));
    }

    #[test]
    fn wire_names_match_storage() {
        for s in ALL {
            assert_eq!(s.as_str().parse::<RideStatus>().unwrap(), s);
            assert_eq!(serde_json::to_value(s).unwrap(), s.as_str());
        }
        assert!("in_progress".parse::<RideStatus>().is_err());
    }
}

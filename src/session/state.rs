use std::fmt;

use serde::{Deserialize, Serialize};

use crate::camera::AcquisitionError;

/// Lifecycle of one navigation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// Created, safety flag not yet consulted
    Idle,
    /// Waiting for the user to accept the safety notice
    SafetyPending,
    /// Camera requested, waiting for the stream and its first frame
    Acquiring,
    /// Camera live; guidance and hazard sampling running
    Active,
    /// Acquisition failed; waiting for an explicit retry
    Error(AcquisitionError),
    /// Terminal
    Closed,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::SafetyPending => "safety_pending",
            SessionState::Acquiring => "acquiring",
            SessionState::Active => "active",
            SessionState::Error(_) => "error",
            SessionState::Closed => "closed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active)
    }

    pub fn error(&self) -> Option<&AcquisitionError> {
        match self {
            SessionState::Error(error) => Some(error),
            _ => None,
        }
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// Every non-terminal state may close.
    pub fn can_transition_to(&self, next: &SessionState) -> bool {
        use SessionState::*;

        if matches!(next, Closed) {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Idle, SafetyPending)
                | (Idle, Acquiring)
                | (SafetyPending, Acquiring)
                | (Acquiring, Active)
                | (Acquiring, Error(_))
                | (Error(_), Acquiring)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Error(error) => write!(f, "error ({})", error.category),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::AcquisitionErrorKind;

    fn error_state() -> SessionState {
        SessionState::Error(AcquisitionError::of_kind(
            AcquisitionErrorKind::PermissionDenied,
        ))
    }

    #[test]
    fn test_allowed_transitions() {
        use SessionState::*;
        assert!(Idle.can_transition_to(&SafetyPending));
        assert!(Idle.can_transition_to(&Acquiring));
        assert!(SafetyPending.can_transition_to(&Acquiring));
        assert!(Acquiring.can_transition_to(&Active));
        assert!(Acquiring.can_transition_to(&error_state()));
        assert!(error_state().can_transition_to(&Acquiring));
    }

    #[test]
    fn test_rejected_transitions() {
        use SessionState::*;
        assert!(!SafetyPending.can_transition_to(&Active));
        assert!(!Active.can_transition_to(&Acquiring));
        assert!(!error_state().can_transition_to(&Active));
        assert!(!Idle.can_transition_to(&Active));
    }

    #[test]
    fn test_closed_is_terminal() {
        use SessionState::*;
        for state in [Idle, SafetyPending, Acquiring, Active, error_state()] {
            assert!(state.can_transition_to(&Closed), "{} should close", state);
        }
        for next in [Idle, SafetyPending, Acquiring, Active, error_state(), Closed] {
            assert!(!Closed.can_transition_to(&next));
        }
    }

    #[test]
    fn test_display_and_serde() {
        assert_eq!(error_state().to_string(), "error (permission_denied)");
        assert_eq!(SessionState::SafetyPending.to_string(), "safety_pending");

        let json = serde_json::to_value(error_state()).unwrap();
        assert_eq!(json["state"], "error");
        assert_eq!(json["category"], "permission_denied");
    }
}

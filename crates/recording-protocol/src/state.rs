//! Recording session state machine

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ProtocolError, ProtocolResult};

/// Identifier of one capture session, used to correlate log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First block of the UUID, enough to tell sessions apart in logs
    pub fn short(&self) -> String {
        let mut s = self.0.simple().to_string();
        s.truncate(8);
        s
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short())
    }
}

/// Recording state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordingState {
    /// No capture session
    Idle,
    /// Permission prompt issued, waiting for the platform result
    AwaitingPermission,
    /// Capture and encoder running
    Active,
    /// Encoder and capture being torn down
    Stopping,
}

impl Default for RecordingState {
    fn default() -> Self {
        Self::Idle
    }
}

impl RecordingState {
    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: RecordingState) -> bool {
        use RecordingState::*;
        matches!(
            (self, next),
            (Idle, AwaitingPermission)
                | (AwaitingPermission, Active)
                | (AwaitingPermission, Idle)
                | (Active, Stopping)
                | (Stopping, Idle)
        )
    }

    pub fn validate_transition(&self, next: RecordingState) -> ProtocolResult<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(ProtocolError::InvalidStateTransition {
                from: *self,
                to: next,
            })
        }
    }

    /// A session occupies the single slot in every state but `Idle`
    pub fn is_busy(&self) -> bool {
        !matches!(self, RecordingState::Idle)
    }
}

impl std::fmt::Display for RecordingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RecordingState::Idle => "idle",
            RecordingState::AwaitingPermission => "awaiting-permission",
            RecordingState::Active => "active",
            RecordingState::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_transitions() {
        let mut state = RecordingState::default();
        for next in [
            RecordingState::AwaitingPermission,
            RecordingState::Active,
            RecordingState::Stopping,
            RecordingState::Idle,
        ] {
            state.validate_transition(next).unwrap();
            state = next;
        }
        assert_eq!(state, RecordingState::Idle);
    }

    #[test]
    fn test_denial_returns_to_idle() {
        assert!(RecordingState::AwaitingPermission.can_transition_to(RecordingState::Idle));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!RecordingState::Idle.can_transition_to(RecordingState::Active));
        assert!(!RecordingState::Active.can_transition_to(RecordingState::Idle));
        assert!(!RecordingState::Stopping.can_transition_to(RecordingState::Active));
        assert!(matches!(
            RecordingState::Idle.validate_transition(RecordingState::Stopping),
            Err(ProtocolError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_session_id_short_form() {
        let id = SessionId::new();
        assert_eq!(id.short().len(), 8);
        assert_eq!(id.to_string(), id.short());
    }
}
